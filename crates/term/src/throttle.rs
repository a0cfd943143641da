//! Redraw throttling.
//!
//! The guide only changes when events arrive or the cursor moves, so frames
//! are drawn on a fingerprint change and otherwise refreshed at a slow fixed
//! interval (to keep the header clock honest).

#[derive(Debug, Clone)]
pub struct RenderThrottle {
    min_static_interval_ms: u64,
    last_render_ms: u64,
    last_fingerprint: u64,
    has_rendered: bool,
}

impl RenderThrottle {
    pub fn new(min_static_interval_ms: u64) -> Self {
        Self {
            min_static_interval_ms,
            last_render_ms: 0,
            last_fingerprint: 0,
            has_rendered: false,
        }
    }

    /// Force the next call to render.
    pub fn invalidate(&mut self) {
        self.has_rendered = false;
    }

    /// Render on the first call, on a fingerprint change, or once the static
    /// interval has elapsed.
    pub fn should_render(&mut self, now_ms: u64, fingerprint: u64) -> bool {
        let due = !self.has_rendered
            || fingerprint != self.last_fingerprint
            || now_ms.saturating_sub(self.last_render_ms) >= self.min_static_interval_ms;
        if due {
            self.has_rendered = true;
            self.last_render_ms = now_ms;
            self.last_fingerprint = fingerprint;
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_on_change_or_interval() {
        let mut t = RenderThrottle::new(1000);
        assert!(t.should_render(0, 7));
        assert!(!t.should_render(10, 7));
        assert!(t.should_render(20, 8));
        assert!(!t.should_render(500, 8));
        assert!(t.should_render(1020, 8));

        t.invalidate();
        assert!(t.should_render(1021, 8));
    }
}
