//! Display-side state: what the surface mirrors, which layout it shows, and when it talks back.
//!
//! [`SurfaceState`] is independent of any terminal. The app feeds it snapshots, editor input
//! and pointer events together with the current time, and drains [`SurfaceEffect`]s from
//! [`SurfaceState::poll`].
mod debounce;
mod highlight;
mod split;

pub use debounce::Debounce;
pub use highlight::HighlightSchedule;
pub use highlight::VisiblePanes;
pub use split::MAX_LEFT_PERCENT;
pub use split::MIN_LEFT_PERCENT;
pub use split::SplitPane;
pub use split::clamp_percent;

use std::time::Duration;
use std::time::Instant;

use tracing::debug;

use crate::protocol::RenderSnapshot;
use crate::protocol::SurfaceMessage;
use crate::protocol::ViewMode;

pub const DEFAULT_EDIT_DEBOUNCE: Duration = Duration::from_millis(500);
pub const DEFAULT_HIGHLIGHT_SETTLE: Duration = Duration::from_millis(50);

/// The last snapshot received from the controller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SurfaceMirror {
    pub text: String,
    pub html: String,
    pub mode: ViewMode,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SurfaceLayout {
    Preview,
    Edit { left_percent: f32 },
}

impl SurfaceLayout {
    pub fn is_edit(&self) -> bool {
        matches!(self, SurfaceLayout::Edit { .. })
    }

    fn visible_panes(&self) -> VisiblePanes {
        match self {
            SurfaceLayout::Preview => VisiblePanes::Preview,
            SurfaceLayout::Edit { .. } => VisiblePanes::LivePreview,
        }
    }
}

/// What the app has to redraw after an update.
#[derive(Clone, Debug, PartialEq)]
pub struct Repaint {
    pub layout: SurfaceLayout,
    /// New editor content. `None` leaves the editor (and its cursor) alone.
    pub editor_value: Option<String>,
    pub html: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceEffect {
    Post(SurfaceMessage),
    Highlight(VisiblePanes),
}

#[derive(Clone, Copy, Debug)]
pub struct SurfaceOptions {
    pub edit_debounce: Duration,
    pub highlight_settle: Duration,
    pub initial_split_percent: f32,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            edit_debounce: DEFAULT_EDIT_DEBOUNCE,
            highlight_settle: DEFAULT_HIGHLIGHT_SETTLE,
            initial_split_percent: 50.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SurfaceState {
    mirror: Option<SurfaceMirror>,
    layout: SurfaceLayout,
    split: SplitPane,
    editor_text: String,
    edit: Debounce<String>,
    /// Text of the last posted edit until a snapshot carrying it comes back.
    in_flight: Option<String>,
    highlight: HighlightSchedule,
    outbox: Vec<SurfaceMessage>,
}

impl Default for SurfaceState {
    fn default() -> Self {
        Self::new(SurfaceOptions::default())
    }
}

impl SurfaceState {
    pub fn new(options: SurfaceOptions) -> Self {
        Self {
            mirror: None,
            layout: SurfaceLayout::Preview,
            split: SplitPane::new(options.initial_split_percent),
            editor_text: String::new(),
            edit: Debounce::new(options.edit_debounce),
            in_flight: None,
            highlight: HighlightSchedule::new(options.highlight_settle),
            outbox: Vec::new(),
        }
    }

    /// `None` until the first update arrives.
    pub fn mirror(&self) -> Option<&SurfaceMirror> {
        self.mirror.as_ref()
    }

    pub fn layout(&self) -> SurfaceLayout {
        self.layout
    }

    pub fn split(&self) -> &SplitPane {
        &self.split
    }

    pub fn has_pending_edit(&self) -> bool {
        self.edit.is_pending()
    }

    pub fn apply_update(&mut self, snapshot: RenderSnapshot, now: Instant) -> Repaint {
        let was_edit = self.layout.is_edit();
        self.layout = if snapshot.mode.is_edit() {
            SurfaceLayout::Edit {
                left_percent: self.split.left_percent(),
            }
        } else {
            SurfaceLayout::Preview
        };

        // Snapshots older than the last posted edit would roll the editor back.
        if self.in_flight.as_deref() == Some(snapshot.text.as_str()) {
            self.in_flight = None;
        }
        let awaiting_echo = self.in_flight.is_some();

        let editor_value = if !self.layout.is_edit() {
            self.in_flight = None;
            None
        } else if !was_edit {
            self.in_flight = None;
            Some(snapshot.text.clone())
        } else if !self.edit.is_pending() && !awaiting_echo && snapshot.text != self.editor_text {
            Some(snapshot.text.clone())
        } else {
            None
        };
        if let Some(text) = &editor_value {
            self.editor_text.clone_from(text);
        }

        debug!(
            layout = ?self.layout,
            editor_refreshed = editor_value.is_some(),
            "applied update"
        );
        self.highlight.schedule(self.layout.visible_panes(), now);
        let html = snapshot.html.clone();
        self.mirror = Some(SurfaceMirror {
            text: snapshot.text,
            html: snapshot.html,
            mode: snapshot.mode,
        });

        Repaint {
            layout: self.layout,
            editor_value,
            html,
        }
    }

    /// The user changed the editor. The edit is posted once typing pauses.
    pub fn on_editor_input(&mut self, text: String, now: Instant) {
        if !self.layout.is_edit() {
            return;
        }
        self.editor_text.clone_from(&text);
        self.edit.schedule(text, now);
    }

    /// Asks the controller to switch modes. The layout only changes when the resulting update
    /// arrives. A pending edit is sent first so the toggled render sees it.
    pub fn toggle_request(&mut self) {
        if let Some(text) = self.edit.cancel() {
            self.in_flight = Some(text.clone());
            self.outbox.push(SurfaceMessage::Edit { text });
        }
        self.outbox.push(SurfaceMessage::ToggleMode);
    }

    /// Pointer pressed on the divider. Ignored outside the edit layout.
    pub fn pointer_down(&mut self) -> bool {
        if !self.layout.is_edit() {
            return false;
        }
        self.split.begin_drag();
        true
    }

    /// Returns the new layout when an active drag moved the divider.
    pub fn pointer_move(&mut self, offset: f32, container_width: f32) -> Option<SurfaceLayout> {
        if !self.layout.is_edit() {
            return None;
        }
        let left_percent = self.split.drag_to(offset, container_width)?;
        self.layout = SurfaceLayout::Edit { left_percent };
        Some(self.layout)
    }

    pub fn pointer_up(&mut self) {
        self.split.end_drag();
    }

    pub fn on_painted(&mut self) {
        self.highlight.on_painted();
    }

    pub fn poll(&mut self, now: Instant) -> Vec<SurfaceEffect> {
        let mut effects: Vec<SurfaceEffect> = self
            .outbox
            .drain(..)
            .map(SurfaceEffect::Post)
            .collect();
        if let Some(text) = self.edit.take_due(now) {
            self.in_flight = Some(text.clone());
            effects.push(SurfaceEffect::Post(SurfaceMessage::Edit { text }));
        }
        if let Some(panes) = self.highlight.take_due(now) {
            effects.push(SurfaceEffect::Highlight(panes));
        }
        effects
    }

    /// The earliest time [`SurfaceState::poll`] has something to do, if anything is waiting.
    pub fn next_deadline(&self) -> Option<Instant> {
        [self.edit.deadline(), self.highlight.deadline()]
            .into_iter()
            .flatten()
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(text: &str, mode: ViewMode) -> RenderSnapshot {
        RenderSnapshot {
            html: format!("<p>{text}</p>\n"),
            text: text.to_string(),
            mode,
        }
    }

    fn posts(effects: Vec<SurfaceEffect>) -> Vec<SurfaceMessage> {
        effects
            .into_iter()
            .filter_map(|e| match e {
                SurfaceEffect::Post(m) => Some(m),
                SurfaceEffect::Highlight(_) => None,
            })
            .collect()
    }

    #[test]
    fn preview_update_uses_single_pane() {
        let t0 = Instant::now();
        let mut s = SurfaceState::default();
        let repaint = s.apply_update(snapshot("a", ViewMode::Preview), t0);
        assert_eq!(repaint.layout, SurfaceLayout::Preview);
        assert_eq!(repaint.editor_value, None);
        assert_eq!(repaint.html, "<p>a</p>\n");
        assert_eq!(s.mirror().map(|m| m.text.as_str()), Some("a"));
    }

    #[test]
    fn entering_edit_layout_fills_editor() {
        let t0 = Instant::now();
        let mut s = SurfaceState::default();
        s.apply_update(snapshot("a", ViewMode::Preview), t0);
        let repaint = s.apply_update(snapshot("a", ViewMode::Edit), t0);
        assert_eq!(repaint.layout, SurfaceLayout::Edit { left_percent: 50.0 });
        assert_eq!(repaint.editor_value.as_deref(), Some("a"));
    }

    #[test]
    fn echo_of_own_edit_keeps_editor() {
        let t0 = Instant::now();
        let mut s = SurfaceState::default();
        s.apply_update(snapshot("a", ViewMode::Edit), t0);

        s.on_editor_input("ab".to_string(), t0);
        let t1 = t0 + DEFAULT_EDIT_DEBOUNCE;
        assert_eq!(
            posts(s.poll(t1)),
            vec![SurfaceMessage::Edit {
                text: "ab".to_string()
            }]
        );
        let repaint = s.apply_update(snapshot("ab", ViewMode::Edit), t1);
        assert_eq!(repaint.editor_value, None);
    }

    #[test]
    fn late_echo_of_older_edit_keeps_editor() {
        let t0 = Instant::now();
        let mut s = SurfaceState::default();
        s.apply_update(snapshot("", ViewMode::Edit), t0);

        s.on_editor_input("a".to_string(), t0);
        let t1 = t0 + DEFAULT_EDIT_DEBOUNCE;
        assert_eq!(posts(s.poll(t1)).len(), 1);
        s.on_editor_input("ab".to_string(), t1);
        let t2 = t1 + DEFAULT_EDIT_DEBOUNCE;
        assert_eq!(
            posts(s.poll(t2)),
            vec![SurfaceMessage::Edit {
                text: "ab".to_string()
            }]
        );

        let repaint = s.apply_update(snapshot("a", ViewMode::Edit), t2);
        assert_eq!(repaint.editor_value, None);
        let repaint = s.apply_update(snapshot("ab", ViewMode::Edit), t2);
        assert_eq!(repaint.editor_value, None);

        // Once the latest edit came back, outside changes show up again.
        let repaint = s.apply_update(snapshot("from disk", ViewMode::Edit), t2);
        assert_eq!(repaint.editor_value.as_deref(), Some("from disk"));
    }

    #[test]
    fn update_during_pending_edit_keeps_editor() {
        let t0 = Instant::now();
        let mut s = SurfaceState::default();
        s.apply_update(snapshot("a", ViewMode::Edit), t0);
        s.on_editor_input("abc".to_string(), t0);
        let repaint = s.apply_update(snapshot("outside", ViewMode::Edit), t0);
        assert_eq!(repaint.editor_value, None);
        assert!(s.has_pending_edit());
    }

    #[test]
    fn external_change_refreshes_idle_editor() {
        let t0 = Instant::now();
        let mut s = SurfaceState::default();
        s.apply_update(snapshot("a", ViewMode::Edit), t0);
        let repaint = s.apply_update(snapshot("from disk", ViewMode::Edit), t0);
        assert_eq!(repaint.editor_value.as_deref(), Some("from disk"));
    }

    #[test]
    fn typing_burst_posts_one_edit_with_last_value() {
        let t0 = Instant::now();
        let mut s = SurfaceState::default();
        s.apply_update(snapshot("", ViewMode::Edit), t0);

        let mut now = t0;
        for text in ["a", "ab", "abc"] {
            s.on_editor_input(text.to_string(), now);
            assert!(posts(s.poll(now)).is_empty());
            now += Duration::from_millis(120);
        }
        assert_eq!(s.next_deadline(), Some(t0 + Duration::from_millis(240) + DEFAULT_EDIT_DEBOUNCE));

        let later = now + DEFAULT_EDIT_DEBOUNCE;
        assert_eq!(
            posts(s.poll(later)),
            vec![SurfaceMessage::Edit {
                text: "abc".to_string()
            }]
        );
        assert!(posts(s.poll(later + DEFAULT_EDIT_DEBOUNCE)).is_empty());
    }

    #[test]
    fn toggle_waits_for_controller() {
        let t0 = Instant::now();
        let mut s = SurfaceState::default();
        s.apply_update(snapshot("a", ViewMode::Preview), t0);
        s.toggle_request();
        assert_eq!(s.layout(), SurfaceLayout::Preview);
        assert_eq!(posts(s.poll(t0)), vec![SurfaceMessage::ToggleMode]);
    }

    #[test]
    fn toggle_flushes_pending_edit_first() {
        let t0 = Instant::now();
        let mut s = SurfaceState::default();
        s.apply_update(snapshot("", ViewMode::Edit), t0);
        s.on_editor_input("x".to_string(), t0);
        s.toggle_request();
        assert_eq!(
            posts(s.poll(t0)),
            vec![
                SurfaceMessage::Edit {
                    text: "x".to_string()
                },
                SurfaceMessage::ToggleMode
            ]
        );
        assert!(!s.has_pending_edit());
    }

    #[test]
    fn divider_drag_updates_layout_within_bounds() {
        let t0 = Instant::now();
        let mut s = SurfaceState::default();
        assert!(!s.pointer_down());

        s.apply_update(snapshot("", ViewMode::Edit), t0);
        assert!(s.pointer_down());
        assert_eq!(
            s.pointer_move(90.0, 100.0),
            Some(SurfaceLayout::Edit { left_percent: 80.0 })
        );
        assert_eq!(
            s.pointer_move(10.0, 100.0),
            Some(SurfaceLayout::Edit { left_percent: 20.0 })
        );
        assert_eq!(s.pointer_move(30.0, 0.0), None);
        s.pointer_up();
        assert_eq!(s.pointer_move(50.0, 100.0), None);

        let repaint = s.apply_update(snapshot("", ViewMode::Edit), t0);
        assert_eq!(repaint.layout, SurfaceLayout::Edit { left_percent: 20.0 });
    }

    #[test]
    fn highlight_follows_paint() {
        let t0 = Instant::now();
        let mut s = SurfaceState::default();
        s.apply_update(snapshot("a", ViewMode::Preview), t0);
        assert!(s.poll(t0).is_empty());
        s.on_painted();
        assert_eq!(s.poll(t0), vec![SurfaceEffect::Highlight(VisiblePanes::Preview)]);
        assert_eq!(s.next_deadline(), None);
    }

    #[test]
    fn editor_input_outside_edit_layout_is_ignored() {
        let t0 = Instant::now();
        let mut s = SurfaceState::default();
        s.apply_update(snapshot("a", ViewMode::Preview), t0);
        s.on_editor_input("b".to_string(), t0);
        assert!(!s.has_pending_edit());
    }
}
