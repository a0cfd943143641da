//! EPG controller - drives the grid from a channel source
//!
//! The controller owns the [`ProgramGrid`] and the [`EventBus`] behind one
//! mutex. Grid mutations happen inside a single lock scope and never across an
//! `.await`; the only suspension points are the source calls.
//!
//! Every full reset bumps a generation counter. A fetch remembers the
//! generation it started in, and a result that arrives after a reset is
//! dropped as stale instead of being written into the new grid.
//!
//! Event handlers run while the grid lock is held. They must not call back
//! into the controller.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::EpgConfig;
use crate::core::{
    EventBus, EventKind, GridEvent, LabelClock, ProgramGrid, SubscriptionId, TimelineUnit,
};
use crate::error::EngineError;
use crate::fetch::{fetch_channels, ChannelOutcome, FetchReport};
use crate::source::{ChannelSource, ProgramQuery};
use crate::types::Slot;

struct GuideState {
    grid: ProgramGrid,
    bus: EventBus,
    generation: u64,
    anchor: Slot,
    location: Option<String>,
}

pub struct EpgController<S> {
    source: Arc<S>,
    state: Arc<Mutex<GuideState>>,
}

impl<S> Clone for EpgController<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            state: Arc::clone(&self.state),
        }
    }
}

impl<S: ChannelSource> EpgController<S> {
    pub fn new(source: Arc<S>, config: &EpgConfig) -> Result<Self, EngineError> {
        let unit = TimelineUnit::new(config.timeline_unit_ms)?;
        let clock = LabelClock::from_offset_minutes(config.label_utc_offset_minutes).ok_or_else(
            || {
                EngineError::InvalidConfig(format!(
                    "label UTC offset {} minutes",
                    config.label_utc_offset_minutes
                ))
            },
        )?;

        let grid = ProgramGrid::new(unit, config.timeline_offset).with_clock(clock);
        Ok(Self {
            source,
            state: Arc::new(Mutex::new(GuideState {
                grid,
                bus: EventBus::new(),
                generation: 0,
                anchor: config.timeline_offset,
                location: None,
            })),
        })
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn on<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: FnMut(&GridEvent) + Send + 'static,
    {
        self.state.lock().bus.on(kind, handler)
    }

    pub fn on_any<F>(&self, handler: F) -> SubscriptionId
    where
        F: FnMut(&GridEvent) + Send + 'static,
    {
        self.state.lock().bus.on_any(handler)
    }

    pub fn off(&self, id: SubscriptionId) -> bool {
        self.state.lock().bus.off(id)
    }

    /// Fire an event to every subscriber.
    pub fn fire(&self, event: &GridEvent) {
        self.state.lock().bus.fire(event);
    }

    pub fn unit(&self) -> TimelineUnit {
        self.state.lock().grid.unit()
    }

    pub fn timeline_offset(&self) -> Slot {
        self.state.lock().grid.timeline_offset()
    }

    pub fn total_timeslot_count(&self) -> usize {
        self.state.lock().grid.total_timeslot_count()
    }

    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// Navigation location recorded after the last playback change.
    pub fn location(&self) -> Option<String> {
        self.state.lock().location.clone()
    }

    /// Read the grid under the lock.
    pub fn with_grid<R>(&self, f: impl FnOnce(&ProgramGrid) -> R) -> R {
        f(&self.state.lock().grid)
    }

    /// The current guide as an event sequence, for a subscriber that joined
    /// late. Starts with `reset` so the receiver drops whatever it held.
    pub fn replay_events(&self) -> Vec<GridEvent> {
        let channels = self.source.channels();
        let stream = self.source.tuner_stream();
        let state = self.state.lock();

        let mut events = Vec::with_capacity(channels.len() + 3);
        events.push(GridEvent::Reset {
            generation: state.generation,
        });
        events.extend(channels.iter().map(|item| GridEvent::AppendChannel {
            channel: item.channel.info(),
            index: item.index,
        }));
        events.push(GridEvent::AllChannelFetched);
        events.push(GridEvent::Scanned { stream });
        state.grid.replay(&mut |e| events.push(e));
        events
    }

    /// Scan tuners, then rebuild the guide from the resulting lineup.
    pub async fn start(&self) -> Result<(), EngineError> {
        self.source.scan_tuners().await?;
        self.on_scanned().await
    }

    /// Rebuild after a channel scan.
    ///
    /// Fires `reset`, one `appendChannel` per channel, `allChannelFetched` and
    /// `scanned`, then starts playback of the current source.
    pub async fn on_scanned(&self) -> Result<(), EngineError> {
        let channels = self.source.channels();
        let stream = self.source.tuner_stream();
        {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            state.generation += 1;
            state.grid.reset(state.anchor);

            let bus = &mut state.bus;
            bus.fire(&GridEvent::Reset {
                generation: state.generation,
            });
            for item in &channels {
                bus.fire(&GridEvent::AppendChannel {
                    channel: item.channel.info(),
                    index: item.index,
                });
            }
            bus.fire(&GridEvent::AllChannelFetched);
            bus.fire(&GridEvent::Scanned { stream });
            info!(
                generation = state.generation,
                channels = channels.len(),
                "channel scan applied"
            );
        }

        self.source.set_playing_source().await?;
        self.record_location();
        Ok(())
    }

    /// Grow the timeline to `[start, start + duration)` slots and fetch
    /// programs for that range from every channel.
    ///
    /// Resolves once every channel has settled. Failed channels are logged and
    /// listed in the report; they do not stop the others.
    pub async fn fetch_programs(
        &self,
        start: Slot,
        duration: i64,
    ) -> Result<FetchReport, EngineError> {
        let (generation, query) = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let bus = &mut state.bus;
            state
                .grid
                .extend_timeline(start, duration, &mut |e| bus.fire(&e))?;
            bus.fire(&GridEvent::AllTimelineAdded);

            let unit = state.grid.unit();
            let query = ProgramQuery {
                start_time: unit.time_of(start),
                duration: unit.duration_of(duration),
            };
            (state.generation, query)
        };

        let channels = self.source.channels();
        debug!(
            generation,
            start,
            duration,
            channels = channels.len(),
            "fetching programs"
        );

        let state = &self.state;
        let tally = fetch_channels(channels, query, |row, result| {
            let mut guard = state.lock();
            let current = &mut *guard;
            if current.generation != generation {
                debug!(
                    row,
                    fetched = generation,
                    current = current.generation,
                    "dropping stale program batch"
                );
                return ChannelOutcome::Stale { row };
            }
            match result {
                Ok(programs) => {
                    let bus = &mut current.bus;
                    let report = current
                        .grid
                        .place_programs(row, &programs, &mut |e| bus.fire(&e));
                    ChannelOutcome::Placed { row, report }
                }
                Err(error) => {
                    warn!(row, %error, "channel program fetch failed");
                    ChannelOutcome::Failed { row, error }
                }
            }
        })
        .await;

        Ok(tally.into_report(generation))
    }

    /// Tune to the channel at `index` and return the new navigation location.
    pub async fn switch_channel(&self, index: usize) -> Result<String, EngineError> {
        let channels = self.source.channels();
        let item = channels
            .get(index)
            .ok_or(EngineError::ChannelOutOfRange {
                index,
                count: channels.len(),
            })?;
        let number = item.channel.number().to_string();

        self.source.set_playing_channel(&number).await?;
        let location = self.record_location();
        info!(index, %number, %location, "switched channel");
        Ok(location)
    }

    fn record_location(&self) -> String {
        let location = self.source.current_hash();
        self.state.lock().location = Some(location.clone());
        location
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Program;
    use crate::memory::{StaticChannel, StaticSource};

    fn config(unit: i64) -> EpgConfig {
        EpgConfig {
            timeline_unit_ms: unit,
            timeline_offset: 0,
            ..EpgConfig::default()
        }
    }

    #[test]
    fn rejects_bad_configuration() {
        let source = Arc::new(StaticSource::new(Vec::new()));
        assert!(matches!(
            EpgController::new(Arc::clone(&source), &config(0)),
            Err(EngineError::Grid(_))
        ));

        let bad_offset = EpgConfig {
            label_utc_offset_minutes: 25 * 60,
            ..config(1)
        };
        assert!(matches!(
            EpgController::new(source, &bad_offset),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn fetch_places_each_channel_in_its_row() {
        let source = Arc::new(StaticSource::new(vec![
            StaticChannel::new("1", "One")
                .with_programs(vec![Program::new("A", 0, 2).unwrap()]),
            StaticChannel::new("2", "Two")
                .with_programs(vec![Program::new("B", 1, 1).unwrap()]),
        ]));
        let controller = EpgController::new(source, &config(1)).unwrap();
        controller.start().await.unwrap();

        let report = controller.fetch_programs(0, 2).await.unwrap();
        assert!(report.is_complete());
        assert_eq!(report.cells_written, 3);

        controller.with_grid(|grid| {
            assert_eq!(grid.cell(0, 0).unwrap().program.title, "A");
            assert_eq!(grid.cell(1, 1).unwrap().program.title, "B");
            assert!(grid.cell(1, 0).is_none());
        });
    }

    #[tokio::test]
    async fn switch_channel_records_location() {
        let source = Arc::new(StaticSource::new(vec![
            StaticChannel::new("1", "One"),
            StaticChannel::new("5", "Five"),
        ]));
        let controller = EpgController::new(Arc::clone(&source), &config(1)).unwrap();
        controller.start().await.unwrap();
        assert_eq!(controller.location().as_deref(), Some("#/tuner0/1"));

        let location = controller.switch_channel(1).await.unwrap();
        assert_eq!(location, "#/tuner0/5");
        assert_eq!(controller.location(), Some(location));

        assert_eq!(
            controller.switch_channel(2).await,
            Err(EngineError::ChannelOutOfRange { index: 2, count: 2 })
        );
    }

    #[tokio::test]
    async fn start_bumps_generation_and_resets_grid() {
        let source = Arc::new(StaticSource::new(vec![StaticChannel::new("1", "One")]));
        let controller = EpgController::new(Arc::clone(&source), &config(1)).unwrap();

        controller.start().await.unwrap();
        controller.fetch_programs(0, 4).await.unwrap();
        assert_eq!(controller.total_timeslot_count(), 4);

        controller.start().await.unwrap();
        assert_eq!(controller.generation(), 2);
        assert_eq!(controller.total_timeslot_count(), 0);
        assert_eq!(source.scan_count(), 2);
    }

    #[tokio::test]
    async fn replay_matches_live_event_stream() {
        use crate::core::GuideSnapshot;

        let source = Arc::new(StaticSource::new(vec![
            StaticChannel::new("1", "One")
                .with_programs(vec![Program::new("A", 0, 3).unwrap()]),
            StaticChannel::new("2", "Two")
                .with_programs(vec![Program::new("B", 2, 2).unwrap()]),
        ]));
        let controller = EpgController::new(source, &config(1)).unwrap();
        let live = Arc::new(Mutex::new(GuideSnapshot::new()));
        let sink = Arc::clone(&live);
        controller.on_any(move |e| sink.lock().apply(e));

        controller.start().await.unwrap();
        controller.fetch_programs(0, 4).await.unwrap();

        let mut caught_up = GuideSnapshot::new();
        for e in controller.replay_events() {
            caught_up.apply(&e);
        }
        let live = live.lock();
        assert_eq!(caught_up.generation, live.generation);
        assert_eq!(caught_up.channels, live.channels);
        assert_eq!(caught_up.timeline, live.timeline);
        assert!(caught_up.channels_ready && caught_up.timeline_ready);
        for row in 0..2 {
            for column in 0..4 {
                assert_eq!(caught_up.cell(row, column), live.cell(row, column));
            }
        }
    }
}
