//! End-to-end render path: controller events -> snapshot -> framebuffer.

use std::sync::Arc;

use parking_lot::Mutex;

use tv_epg::core::{GuideSnapshot, LabelClock, Program};
use tv_epg::engine::{EpgConfig, EpgController, StaticChannel, StaticSource};
use tv_epg::term::{
    encode_changes, CursorOutcome, Edge, FrameBuffer, GuideCursor, GuideView, StatusLine,
    Viewport,
};
use tv_epg::types::GuideAction;

const MINUTE: i64 = 60_000;

fn guide() -> (EpgController<StaticSource>, Arc<Mutex<GuideSnapshot>>) {
    let half_hour = 30 * MINUTE;
    let source = StaticSource::new(vec![
        StaticChannel::new("1", "News").with_programs(vec![
            Program::new("Morning News", 0, 2 * half_hour).unwrap(),
            Program::new("Weather", 2 * half_hour, half_hour).unwrap(),
        ]),
        StaticChannel::new("2", "Films")
            .with_programs(vec![Program::new("Matinee", half_hour, 4 * half_hour).unwrap()]),
    ]);
    let config = EpgConfig {
        timeline_unit_ms: half_hour,
        timeline_offset: 0,
        ..EpgConfig::default()
    };
    let controller = EpgController::new(Arc::new(source), &config).unwrap();
    let snapshot = Arc::new(Mutex::new(GuideSnapshot::new()));
    let sink = Arc::clone(&snapshot);
    controller.on_any(move |event| sink.lock().apply(event));
    (controller, snapshot)
}

#[tokio::test]
async fn fetched_programs_appear_on_screen() {
    let (controller, snapshot) = guide();
    controller.start().await.unwrap();
    controller.fetch_programs(0, 4).await.unwrap();

    let snap = snapshot.lock().clone();
    let view = GuideView::new(LabelClock::utc()).with_widths(16, 20);
    let viewport = Viewport::new(100, 6);
    let (rows, columns) = view.layout(viewport);
    let mut cursor = GuideCursor::new();
    cursor.sync(&snap, rows, columns);

    let mut fb = FrameBuffer::new(0, 0);
    let location = controller.location();
    let status = StatusLine {
        location: location.as_deref(),
        note: None,
    };
    view.render_into(&snap, &cursor, status, viewport, &mut fb);

    let header = fb.row_text(1);
    assert!(header.contains("00:00"), "header was {header:?}");
    assert!(header.contains("01:30"), "header was {header:?}");

    let news = fb.row_text(2);
    assert!(news.contains("1 News"));
    assert!(news.contains("Morning News"), "row was {news:?}");
    assert!(news.contains("Weather"), "row was {news:?}");

    let films = fb.row_text(3);
    assert!(films.contains("2 Films"));
    assert!(films.contains("Matinee"), "row was {films:?}");
}

#[tokio::test]
async fn scrolling_past_the_right_edge_grows_the_guide() {
    let (controller, snapshot) = guide();
    controller.start().await.unwrap();
    controller.fetch_programs(0, 2).await.unwrap();

    let mut cursor = GuideCursor::new();
    let snap = snapshot.lock().clone();
    cursor.sync(&snap, 4, 4);
    assert_eq!(
        cursor.apply(GuideAction::ScrollRight, &snap, 4, 4),
        CursorOutcome::Moved
    );
    assert_eq!(
        cursor.apply(GuideAction::ScrollRight, &snap, 4, 4),
        CursorOutcome::Fetch(Edge::Right)
    );

    let next = controller.timeline_offset() + controller.total_timeslot_count() as i64;
    controller.fetch_programs(next, 2).await.unwrap();
    let snap = snapshot.lock().clone();
    assert_eq!(snap.column_count(), 4);
    assert_eq!(
        cursor.apply(GuideAction::ScrollRight, &snap, 4, 4),
        CursorOutcome::Moved
    );
    assert_eq!(cursor.column(&snap), Some(2));
}

#[tokio::test]
async fn left_growth_keeps_the_selected_slot() {
    let (controller, snapshot) = guide();
    controller.start().await.unwrap();
    controller.fetch_programs(2, 2).await.unwrap();

    let mut cursor = GuideCursor::new();
    let snap = snapshot.lock().clone();
    cursor.sync(&snap, 4, 4);
    let selected = cursor.time;
    assert_eq!(
        cursor.apply(GuideAction::ScrollLeft, &snap, 4, 4),
        CursorOutcome::Fetch(Edge::Left)
    );

    controller.fetch_programs(0, 2).await.unwrap();
    let snap = snapshot.lock().clone();
    assert_eq!(cursor.time, selected);
    assert_eq!(cursor.column(&snap), Some(2));
}

#[tokio::test]
async fn unchanged_guide_redraws_nothing() {
    let (controller, snapshot) = guide();
    controller.start().await.unwrap();
    controller.fetch_programs(0, 4).await.unwrap();

    let snap = snapshot.lock().clone();
    let view = GuideView::default();
    let viewport = Viewport::new(60, 6);
    let cursor = GuideCursor::new();

    let mut a = FrameBuffer::new(0, 0);
    let mut b = FrameBuffer::new(0, 0);
    view.render_into(&snap, &cursor, StatusLine::default(), viewport, &mut a);
    view.render_into(&snap, &cursor, StatusLine::default(), viewport, &mut b);

    let mut out = Vec::new();
    let stats = encode_changes(&a, &b, &mut out).unwrap();
    assert_eq!(stats.lines, 0);
    assert!(out.is_empty());
}
