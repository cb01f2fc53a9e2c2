use std::time::Duration;
use std::time::Instant;

/// Which panes a highlighting pass should cover.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisiblePanes {
    /// The full-width preview.
    Preview,
    /// The live preview on the right of the edit layout.
    LivePreview,
}

/// Runs syntax highlighting only after the new content has been painted.
///
/// A pass becomes due as soon as the surface reports a completed paint, or once the settle
/// delay has elapsed if no paint is reported.
#[derive(Clone, Debug)]
pub struct HighlightSchedule {
    settle: Duration,
    pending: Option<Pending>,
}

#[derive(Clone, Copy, Debug)]
struct Pending {
    panes: VisiblePanes,
    deadline: Instant,
    painted: bool,
}

impl HighlightSchedule {
    pub fn new(settle: Duration) -> Self {
        Self {
            settle,
            pending: None,
        }
    }

    /// Replaces any pending pass; new content always needs a fresh one.
    pub fn schedule(&mut self, panes: VisiblePanes, now: Instant) {
        self.pending = Some(Pending {
            panes,
            deadline: now + self.settle,
            painted: false,
        });
    }

    pub fn on_painted(&mut self) {
        if let Some(pending) = &mut self.pending {
            pending.painted = true;
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// `None` when nothing is pending. A painted pass is due immediately.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.deadline)
    }

    pub fn take_due(&mut self, now: Instant) -> Option<VisiblePanes> {
        match self.pending {
            Some(p) if p.painted || p.deadline <= now => {
                self.pending = None;
                Some(p.panes)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTLE: Duration = Duration::from_millis(50);

    #[test]
    fn paint_signal_makes_pass_due() {
        let t0 = Instant::now();
        let mut h = HighlightSchedule::new(SETTLE);
        h.schedule(VisiblePanes::Preview, t0);
        assert_eq!(h.take_due(t0), None);
        h.on_painted();
        assert_eq!(h.take_due(t0), Some(VisiblePanes::Preview));
        assert!(!h.is_pending());
    }

    #[test]
    fn settle_delay_is_the_fallback() {
        let t0 = Instant::now();
        let mut h = HighlightSchedule::new(SETTLE);
        h.schedule(VisiblePanes::LivePreview, t0);
        assert_eq!(h.take_due(t0 + Duration::from_millis(49)), None);
        assert_eq!(h.take_due(t0 + SETTLE), Some(VisiblePanes::LivePreview));
    }

    #[test]
    fn reschedule_forgets_earlier_paint() {
        let t0 = Instant::now();
        let mut h = HighlightSchedule::new(SETTLE);
        h.schedule(VisiblePanes::Preview, t0);
        h.on_painted();
        h.schedule(VisiblePanes::LivePreview, t0);
        assert_eq!(h.take_due(t0), None);
    }

    #[test]
    fn paint_without_pending_pass_is_a_no_op() {
        let mut h = HighlightSchedule::new(SETTLE);
        h.on_painted();
        assert_eq!(h.take_due(Instant::now()), None);
    }
}
