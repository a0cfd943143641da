//! Grid events and the observer registry that delivers them.
//!
//! Every change the engine makes is announced as a [`GridEvent`]. Renderers
//! never read the grid directly; replaying the event stream into a
//! [`GuideSnapshot`](crate::snapshot::GuideSnapshot) reconstructs it.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::program::Program;
use crate::types::{Millis, Slot};

/// Renderer-facing description of a channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub number: String,
    pub name: String,
}

/// Opaque handle of the tuner stream announced after a scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamHandle(pub String);

/// Render handle of a placed program.
///
/// Names the leftmost (visible) cell of a placement by row and absolute
/// slot, so it stays valid when columns are prepended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId {
    pub row: usize,
    pub slot: Slot,
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}@{}", self.row, self.slot)
    }
}

/// Payload of an `updateProgram` event.
///
/// `title` and `item` are only present on the visible (leftmost) cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramUpdate {
    pub row: usize,
    pub column: usize,
    pub slot: Slot,
    /// Slots from this column to the (clamped) end of the program.
    pub duration: usize,
    pub is_visible: bool,
    pub element: ElementId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<Arc<Program>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum GridEvent {
    /// The grid was dropped wholesale; a new generation starts.
    Reset { generation: u64 },
    Scanned { stream: Option<StreamHandle> },
    AppendChannel { channel: ChannelInfo, index: usize },
    AllChannelFetched,
    AddTimeline { column: usize, time: Millis },
    AllTimelineAdded,
    UpdateProgram(ProgramUpdate),
}

/// Discriminant of [`GridEvent`], used to filter subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Reset,
    Scanned,
    AppendChannel,
    AllChannelFetched,
    AddTimeline,
    AllTimelineAdded,
    UpdateProgram,
}

impl EventKind {
    pub fn of(event: &GridEvent) -> Self {
        match event {
            GridEvent::Reset { .. } => EventKind::Reset,
            GridEvent::Scanned { .. } => EventKind::Scanned,
            GridEvent::AppendChannel { .. } => EventKind::AppendChannel,
            GridEvent::AllChannelFetched => EventKind::AllChannelFetched,
            GridEvent::AddTimeline { .. } => EventKind::AddTimeline,
            GridEvent::AllTimelineAdded => EventKind::AllTimelineAdded,
            GridEvent::UpdateProgram(_) => EventKind::UpdateProgram,
        }
    }

    /// Wire name of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Reset => "reset",
            EventKind::Scanned => "scanned",
            EventKind::AppendChannel => "appendChannel",
            EventKind::AllChannelFetched => "allChannelFetched",
            EventKind::AddTimeline => "addTimeline",
            EventKind::AllTimelineAdded => "allTimelineAdded",
            EventKind::UpdateProgram => "updateProgram",
        }
    }
}

impl GridEvent {
    pub fn kind(&self) -> EventKind {
        EventKind::of(self)
    }
}

type Handler = Box<dyn FnMut(&GridEvent) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Observer {
    id: SubscriptionId,
    filter: Option<EventKind>,
    handler: Handler,
}

/// Observer registry owned by the controller.
///
/// Handlers run synchronously, in subscription order, on the thread that
/// fires the event.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    observers: Vec<Observer>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to one kind of event.
    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: FnMut(&GridEvent) + Send + 'static,
    {
        self.register(Some(kind), Box::new(handler))
    }

    /// Subscribe to every event.
    pub fn on_any<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&GridEvent) + Send + 'static,
    {
        self.register(None, Box::new(handler))
    }

    /// Remove a subscription. Returns false if it was already gone.
    pub fn off(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|o| o.id != id);
        self.observers.len() != before
    }

    pub fn fire(&mut self, event: &GridEvent) {
        let kind = event.kind();
        for observer in &mut self.observers {
            if observer.filter.map_or(true, |f| f == kind) {
                (observer.handler)(event);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    fn register(&mut self, filter: Option<EventKind>, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push(Observer {
            id,
            filter,
            handler,
        });
        id
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.observers.len())
            .finish()
    }
}
