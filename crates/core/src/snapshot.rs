//! Renderer-side guide model, rebuilt purely from [`GridEvent`]s.
//!
//! A renderer never sees the grid itself. It folds the event stream into a
//! `GuideSnapshot`: channel rows, column times, which element covers each
//! (row, column) and the label of every visible element.

use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::events::{ChannelInfo, ElementId, GridEvent, StreamHandle};
use crate::types::Millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotCell {
    pub element: ElementId,
    pub visible: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuideSnapshot {
    pub generation: u64,
    pub channels: Vec<ChannelInfo>,
    pub channels_ready: bool,
    /// Absolute start time of each column, left to right.
    pub timeline: VecDeque<Millis>,
    pub timeline_ready: bool,
    pub stream: Option<StreamHandle>,
    coverage: BTreeMap<(usize, Millis), SnapshotCell>,
    labels: HashMap<ElementId, String>,
    revision: u64,
}

impl GuideSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &GridEvent) {
        let revision = self.revision.wrapping_add(1);
        self.apply_inner(event);
        self.revision = revision;
    }

    fn apply_inner(&mut self, event: &GridEvent) {
        match event {
            GridEvent::Reset { generation } => {
                *self = Self {
                    generation: *generation,
                    ..Self::default()
                };
            }
            GridEvent::Scanned { stream } => {
                self.stream = stream.clone();
            }
            GridEvent::AppendChannel { channel, index } => {
                if *index < self.channels.len() {
                    self.channels[*index] = channel.clone();
                } else {
                    self.channels.push(channel.clone());
                }
            }
            GridEvent::AllChannelFetched => self.channels_ready = true,
            GridEvent::AddTimeline { column, time } => {
                if *column >= self.timeline.len() {
                    self.timeline.push_back(*time);
                } else {
                    self.timeline.insert(*column, *time);
                }
            }
            GridEvent::AllTimelineAdded => self.timeline_ready = true,
            GridEvent::UpdateProgram(update) => {
                let Some(time) = self.timeline.get(update.column).copied() else {
                    return;
                };
                self.coverage.insert(
                    (update.row, time),
                    SnapshotCell {
                        element: update.element,
                        visible: update.is_visible,
                    },
                );
                if let Some(title) = &update.title {
                    self.labels.insert(update.element, title.clone());
                }
            }
        }
    }

    pub fn column_count(&self) -> usize {
        self.timeline.len()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<SnapshotCell> {
        let time = self.timeline.get(column)?;
        self.coverage.get(&(row, *time)).copied()
    }

    pub fn label(&self, element: ElementId) -> Option<&str> {
        self.labels.get(&element).map(String::as_str)
    }

    /// Number of events applied so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Cheap change detector for render throttling.
    pub fn fingerprint(&self) -> u64 {
        let mut h = self.generation;
        h = h.wrapping_mul(31).wrapping_add(self.revision);
        h = h.wrapping_mul(31).wrapping_add(self.channels.len() as u64);
        h = h.wrapping_mul(31).wrapping_add(self.timeline.len() as u64);
        h = h.wrapping_mul(31).wrapping_add(self.coverage.len() as u64);
        h = h.wrapping_mul(31).wrapping_add(self.labels.len() as u64);
        h
    }
}
