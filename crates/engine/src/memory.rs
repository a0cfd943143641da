//! In-memory channel source.
//!
//! Backs the demo binary and the test suite. A lineup can be built in code,
//! loaded from a JSON schedule file or generated from a fixed pattern.
//! Channels can be told to fail or to wait on a gate before answering, which
//! is how tests drive failure and rescan races.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tracing::debug;

use crate::core::{Program, RawProgram, StreamHandle};
use crate::source::{Channel, ChannelItem, ChannelSource, ProgramQuery, SourceError};
use crate::types::Millis;

pub struct StaticChannel {
    number: String,
    name: String,
    programs: Vec<Arc<Program>>,
    failure: Option<String>,
    gate: Option<Arc<Notify>>,
    fetches: AtomicUsize,
}

impl StaticChannel {
    pub fn new(number: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            name: name.into(),
            programs: Vec::new(),
            failure: None,
            gate: None,
            fetches: AtomicUsize::new(0),
        }
    }

    /// Set the schedule. Programs are kept sorted by start time.
    pub fn with_programs(mut self, programs: Vec<Program>) -> Self {
        let mut programs: Vec<Arc<Program>> = programs.into_iter().map(Arc::new).collect();
        programs.sort_by_key(|p| p.start_time);
        self.programs = programs;
        self
    }

    /// Make every fetch fail with `reason`.
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    /// Hold every fetch until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn programs(&self) -> &[Arc<Program>] {
        &self.programs
    }
}

#[async_trait]
impl Channel for StaticChannel {
    fn number(&self) -> &str {
        &self.number
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn get_programs(&self, query: ProgramQuery) -> Result<Vec<Arc<Program>>, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(reason) = &self.failure {
            return Err(SourceError::Unavailable {
                channel: self.number.clone(),
                reason: reason.clone(),
            });
        }

        let end = query.end_time();
        Ok(self
            .programs
            .iter()
            .filter(|p| {
                if p.duration == 0 {
                    p.start_time >= query.start_time && p.start_time < end
                } else {
                    p.start_time < end && p.end_time() > query.start_time
                }
            })
            .cloned()
            .collect())
    }
}

/// JSON schedule file layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleFile {
    #[serde(default)]
    pub stream: Option<String>,
    pub channels: Vec<ScheduleChannel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleChannel {
    pub number: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub programs: Vec<RawProgram>,
}

pub struct StaticSource {
    lineup: RwLock<Vec<Arc<StaticChannel>>>,
    stream: Option<StreamHandle>,
    playing: RwLock<Option<String>>,
    scans: AtomicUsize,
}

impl StaticSource {
    pub fn new(channels: Vec<StaticChannel>) -> Self {
        Self {
            lineup: RwLock::new(channels.into_iter().map(Arc::new).collect()),
            stream: Some(StreamHandle("tuner0".to_string())),
            playing: RwLock::new(None),
            scans: AtomicUsize::new(0),
        }
    }

    pub fn with_stream(mut self, stream: Option<StreamHandle>) -> Self {
        self.stream = stream;
        self
    }

    /// Build a source from a JSON schedule, validating every program.
    pub fn from_json_str(json: &str) -> Result<Self, SourceError> {
        let file: ScheduleFile =
            serde_json::from_str(json).map_err(|e| SourceError::Schedule(e.to_string()))?;

        let mut channels = Vec::with_capacity(file.channels.len());
        for entry in file.channels {
            let programs = entry
                .programs
                .into_iter()
                .map(Program::try_from)
                .collect::<Result<Vec<_>, _>>()?;
            channels.push(StaticChannel::new(entry.number, entry.name).with_programs(programs));
        }

        let stream = file.stream.map(StreamHandle);
        Ok(Self::new(channels).with_stream(stream.or_else(|| Some(StreamHandle("tuner0".into())))))
    }

    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| SourceError::Schedule(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// A generated lineup around `anchor_ms`: six channels, programs of 30 to
    /// 120 minutes from six hours before the anchor to a day after it.
    pub fn demo(anchor_ms: Millis) -> Self {
        const MINUTE: Millis = 60 * 1000;
        const NAMES: [(&str, &str); 6] = [
            ("1", "News One"),
            ("2", "Kids Zone"),
            ("4", "Cinema"),
            ("5", "Sports Live"),
            ("7", "Nature"),
            ("9", "Music Box"),
        ];
        const SHOWS: [&str; 8] = [
            "Morning Report",
            "Cartoon Hour",
            "Feature Film",
            "Match Day",
            "Wild Planet",
            "Top Tracks",
            "Late Talk",
            "Documentary",
        ];
        const LENGTHS: [Millis; 5] = [30, 60, 45, 90, 120];

        let start = (anchor_ms - 6 * 60 * MINUTE).div_euclid(30 * MINUTE) * 30 * MINUTE;
        let end = anchor_ms + 24 * 60 * MINUTE;

        let channels = NAMES
            .iter()
            .enumerate()
            .map(|(row, (number, name))| {
                let mut programs = Vec::new();
                let mut t = start;
                let mut i = row;
                while t < end {
                    let length = LENGTHS[i % LENGTHS.len()] * MINUTE;
                    let title = SHOWS[(i * 3 + row) % SHOWS.len()];
                    if let Ok(p) = Program::new(title, t, length) {
                        programs.push(p);
                    }
                    t += length;
                    i += 1;
                }
                StaticChannel::new(*number, *name).with_programs(programs)
            })
            .collect();
        Self::new(channels)
    }

    /// Swap in a new lineup, as a rescan that found different channels would.
    pub fn replace_lineup(&self, channels: Vec<StaticChannel>) {
        *self.lineup.write() = channels.into_iter().map(Arc::new).collect();
    }

    pub fn channel(&self, index: usize) -> Option<Arc<StaticChannel>> {
        self.lineup.read().get(index).cloned()
    }

    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    pub fn playing(&self) -> Option<String> {
        self.playing.read().clone()
    }
}

#[async_trait]
impl ChannelSource for StaticSource {
    async fn scan_tuners(&self) -> Result<(), SourceError> {
        let n = self.scans.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(scan = n, channels = self.lineup.read().len(), "tuner scan");
        Ok(())
    }

    fn channels(&self) -> Vec<ChannelItem> {
        self.lineup
            .read()
            .iter()
            .enumerate()
            .map(|(index, channel)| ChannelItem {
                channel: Arc::clone(channel) as Arc<dyn Channel>,
                index,
            })
            .collect()
    }

    fn tuner_stream(&self) -> Option<StreamHandle> {
        self.stream.clone()
    }

    async fn set_playing_source(&self) -> Result<(), SourceError> {
        let first = self.lineup.read().first().map(|c| c.number.clone());
        let mut playing = self.playing.write();
        if playing.is_none() {
            *playing = first;
        }
        Ok(())
    }

    async fn set_playing_channel(&self, number: &str) -> Result<(), SourceError> {
        let known = self.lineup.read().iter().any(|c| c.number == number);
        if !known {
            return Err(SourceError::Playback(format!("unknown channel {number}")));
        }
        *self.playing.write() = Some(number.to_string());
        Ok(())
    }

    fn current_hash(&self) -> String {
        let stream = self.stream.as_ref().map_or("none", |s| s.0.as_str());
        match self.playing.read().as_deref() {
            Some(number) => format!("#/{stream}/{number}"),
            None => format!("#/{stream}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(title: &str, start: Millis, duration: Millis) -> Program {
        Program::new(title, start, duration).unwrap()
    }

    #[tokio::test]
    async fn get_programs_returns_overlapping_in_order() {
        let channel = StaticChannel::new("1", "One").with_programs(vec![
            program("C", 20, 10),
            program("A", 0, 10),
            program("B", 10, 10),
            program("D", 30, 10),
        ]);

        let got = channel
            .get_programs(ProgramQuery {
                start_time: 5,
                duration: 20,
            })
            .await
            .unwrap();
        let titles: Vec<&str> = got.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
        assert_eq!(channel.fetch_count(), 1);
    }

    #[tokio::test]
    async fn failing_channel_reports_unavailable() {
        let channel = StaticChannel::new("3", "Three").failing("no signal");
        let err = channel
            .get_programs(ProgramQuery {
                start_time: 0,
                duration: 1,
            })
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SourceError::Unavailable {
                channel: "3".into(),
                reason: "no signal".into()
            }
        );
    }

    #[test]
    fn schedule_json_is_validated() {
        let ok = StaticSource::from_json_str(
            r#"{"stream":"dvb0","channels":[{"number":"1","name":"One","programs":[
                {"title":"A","startTime":0,"duration":10}]}]}"#,
        )
        .unwrap();
        assert_eq!(ok.channels().len(), 1);
        assert_eq!(ok.tuner_stream(), Some(StreamHandle("dvb0".into())));

        let bad = StaticSource::from_json_str(
            r#"{"channels":[{"number":"1","programs":[{"title":"A","duration":10}]}]}"#,
        );
        assert!(matches!(
            bad,
            Err(SourceError::InvalidProgram(crate::core::GridError::MissingField {
                field: "startTime",
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn playback_tracks_current_hash() {
        let source = StaticSource::new(vec![
            StaticChannel::new("1", "One"),
            StaticChannel::new("2", "Two"),
        ]);
        assert_eq!(source.current_hash(), "#/tuner0");

        source.set_playing_source().await.unwrap();
        assert_eq!(source.current_hash(), "#/tuner0/1");

        source.set_playing_channel("2").await.unwrap();
        assert_eq!(source.playing().as_deref(), Some("2"));
        assert!(source.set_playing_channel("99").await.is_err());
    }

    #[test]
    fn demo_lineup_is_contiguous_per_channel() {
        let source = StaticSource::demo(1_700_000_000_000);
        for row in 0..source.channels().len() {
            let channel = source.channel(row).unwrap();
            for pair in channel.programs().windows(2) {
                assert_eq!(pair[0].end_time(), pair[1].start_time);
            }
        }
    }
}
