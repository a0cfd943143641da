//! Terminal program guide (default binary).
//!
//! Drives an [`EpgController`] over the in-memory source, folds its events
//! into a [`GuideSnapshot`] and draws that with the framebuffer renderer.
//! When the event adapter is enabled, the same events are streamed to TCP
//! clients and their commands are executed between frames.

use std::fs::File;
use std::sync::{mpsc, Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use tokio::runtime::Runtime;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use tv_epg::adapter::{execute, reply, Adapter, InboundPayload};
use tv_epg::core::{GridEvent, GuideSnapshot, LabelClock};
use tv_epg::engine::{now_ms, EpgConfig, EpgController, FetchReport, StaticSource};
use tv_epg::input::ActionBatch;
use tv_epg::term::{
    CursorOutcome, Edge, FrameBuffer, GuideCursor, GuideView, RenderThrottle, StatusLine,
    TerminalRenderer, Viewport,
};
use tv_epg::types::GuideAction;

const FRAME_MS: u64 = 50;
const STATIC_REDRAW_MS: u64 = 1000;

fn main() -> Result<()> {
    init_tracing()?;

    let config = EpgConfig::from_env();
    let source = match &config.schedule_path {
        Some(path) => StaticSource::from_path(path)
            .with_context(|| format!("failed to load schedule {}", path.display()))?,
        None => StaticSource::demo(config.anchor_ms()),
    };
    let controller = EpgController::new(Arc::new(source), &config)?;

    // The adapter owns its own runtime; start it before entering ours.
    let adapter = Adapter::start_from_env()?;
    if let Some(adapter) = &adapter {
        adapter.forwarder().attach(&controller);
        info!(addr = %adapter.local_addr(), "event adapter listening");
    }

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("failed to create guide runtime")?;

    let mut term = TerminalRenderer::new();
    term.enter()?;

    let result = Guide::new(controller, &config, adapter, rt).run(&mut term);

    // Always try to restore terminal state.
    let _ = term.exit();
    result
}

/// Logs go to `EPG_LOG_PATH` when set; the terminal belongs to the guide.
fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = match std::env::var("EPG_LOG_PATH") {
        Ok(path) if !path.trim().is_empty() => {
            let file = File::create(path.trim())
                .with_context(|| format!("failed to open log file {path}"))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        _ => None,
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();
    Ok(())
}

struct Guide {
    controller: EpgController<StaticSource>,
    events: mpsc::Receiver<GridEvent>,
    adapter: Option<Adapter>,
    rt: Runtime,
    fetch_slots: i64,
    snapshot: GuideSnapshot,
    cursor: GuideCursor,
    view: GuideView,
    location: Option<String>,
    note: Option<String>,
}

impl Guide {
    fn new(
        controller: EpgController<StaticSource>,
        config: &EpgConfig,
        adapter: Option<Adapter>,
        rt: Runtime,
    ) -> Self {
        let (tx, events) = mpsc::channel();
        controller.on_any(move |event| {
            let _ = tx.send(event.clone());
        });
        let clock = LabelClock::from_offset_minutes(config.label_utc_offset_minutes)
            .unwrap_or_default();
        let note = adapter
            .as_ref()
            .map(|a| format!("event adapter on {}", a.local_addr()));

        Self {
            controller,
            events,
            adapter,
            rt,
            fetch_slots: config.fetch_slots.max(1),
            snapshot: GuideSnapshot::new(),
            cursor: GuideCursor::new(),
            view: GuideView::new(clock),
            location: None,
            note,
        }
    }

    fn run(mut self, term: &mut TerminalRenderer) -> Result<()> {
        self.rescan();
        self.cursor.focus_time(&self.snapshot, now_ms());

        let mut fb = FrameBuffer::new(0, 0);
        let mut throttle = RenderThrottle::new(STATIC_REDRAW_MS);
        let mut batch = ActionBatch::new();
        let started = Instant::now();

        loop {
            self.drain_events();
            self.serve_adapter();

            let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
            let viewport = Viewport::new(w, h);
            let (rows, columns) = self.view.layout(viewport);
            self.cursor.sync(&self.snapshot, rows, columns);

            let elapsed = started.elapsed().as_millis() as u64;
            if throttle.should_render(elapsed, self.fingerprint()) {
                let status = StatusLine {
                    location: self.location.as_deref(),
                    note: self.note.as_deref(),
                };
                self.view
                    .render_into(&self.snapshot, &self.cursor, status, viewport, &mut fb);
                term.draw_swap(&mut fb)?;
            }

            batch.clear();
            if event::poll(Duration::from_millis(FRAME_MS))? {
                loop {
                    match event::read()? {
                        Event::Key(key) => batch.push_key(key),
                        Event::Resize(..) => {
                            throttle.invalidate();
                            term.invalidate();
                        }
                        _ => {}
                    }
                    if !event::poll(Duration::ZERO)? {
                        break;
                    }
                }
            }
            if batch.quit() {
                return Ok(());
            }
            if batch.dropped() > 0 {
                warn!(dropped = batch.dropped(), "input burst truncated");
            }
            for action in batch.actions() {
                self.apply(*action, rows, columns);
            }
        }
    }

    fn apply(&mut self, action: GuideAction, rows: usize, columns: usize) {
        match self.cursor.apply(action, &self.snapshot, rows, columns) {
            CursorOutcome::Unchanged | CursorOutcome::Moved => {}
            CursorOutcome::Fetch(edge) => {
                let offset = self.controller.timeline_offset();
                let start = match edge {
                    Edge::Left => offset - self.fetch_slots,
                    Edge::Right => offset + self.controller.total_timeslot_count() as i64,
                };
                if self.fetch(start) {
                    // One retry only; an edge that did not grow stays put.
                    let _ = self.cursor.apply(action, &self.snapshot, rows, columns);
                }
            }
            CursorOutcome::Select(index) => {
                match self.rt.block_on(self.controller.switch_channel(index)) {
                    Ok(location) => self.location = Some(location),
                    Err(e) => self.note = Some(format!("tune failed: {e}")),
                }
            }
            CursorOutcome::Rescan => self.rescan(),
        }
    }

    fn rescan(&mut self) {
        if let Err(e) = self.rt.block_on(self.controller.start()) {
            warn!(error = %e, "channel scan failed");
            self.note = Some(format!("scan failed: {e}"));
            self.drain_events();
            return;
        }
        self.location = self.controller.location();
        self.cursor = GuideCursor::new();
        let offset = self.controller.timeline_offset();
        self.fetch(offset);
    }

    /// Fetch `fetch_slots` slots from `start`; true when the grid changed.
    fn fetch(&mut self, start: i64) -> bool {
        let before = self.controller.total_timeslot_count();
        let result = self
            .rt
            .block_on(self.controller.fetch_programs(start, self.fetch_slots));
        self.drain_events();
        match result {
            Ok(report) => self.note_report(&report),
            Err(e) => {
                warn!(start, error = %e, "fetch rejected");
                self.note = Some(format!("fetch failed: {e}"));
            }
        }
        self.controller.total_timeslot_count() != before
    }

    fn note_report(&mut self, report: &FetchReport) {
        if !report.failed.is_empty() {
            self.note = Some(format!(
                "no listings for {} of {} channels",
                report.failed.len(),
                report.requested
            ));
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.snapshot.apply(&event);
        }
    }

    fn serve_adapter(&mut self) {
        let Some(adapter) = self.adapter.as_mut() else {
            return;
        };
        while let Some(inbound) = adapter.try_recv() {
            match inbound.payload {
                InboundPayload::SyncRequest => {
                    let events = self.controller.replay_events();
                    adapter.forwarder().replay_to(inbound.client_id, &events);
                }
                InboundPayload::Command(command) => {
                    let result = self.rt.block_on(execute(&self.controller, command));
                    if let Err(e) = &result {
                        warn!(client_id = inbound.client_id, error = %e, "adapter command failed");
                    }
                    adapter.send(reply(inbound.client_id, inbound.seq, &result));
                }
            }
        }
        self.location = self.controller.location().or(self.location.take());
    }

    fn fingerprint(&self) -> u64 {
        let mut h = self.snapshot.fingerprint();
        h = h.wrapping_mul(31).wrapping_add(self.cursor.row as u64);
        h = h.wrapping_mul(31).wrapping_add(self.cursor.first_row as u64);
        h = h
            .wrapping_mul(31)
            .wrapping_add(self.cursor.time.unwrap_or(-1) as u64);
        h = h
            .wrapping_mul(31)
            .wrapping_add(self.cursor.first_time.unwrap_or(-1) as u64);
        h = h
            .wrapping_mul(31)
            .wrapping_add(self.note.as_ref().map_or(0, |n| n.len() as u64));
        h.wrapping_mul(31)
            .wrapping_add(self.location.as_ref().map_or(0, |l| l.len() as u64))
    }
}
