pub const MIN_LEFT_PERCENT: f32 = 20.0;
pub const MAX_LEFT_PERCENT: f32 = 80.0;

/// Width of the left pane of the edit layout, as a percentage of the container.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplitPane {
    left_percent: f32,
    dragging: bool,
}

impl Default for SplitPane {
    fn default() -> Self {
        Self::new(50.0)
    }
}

impl SplitPane {
    pub fn new(left_percent: f32) -> Self {
        Self {
            left_percent: clamp_percent(left_percent),
            dragging: false,
        }
    }

    pub fn left_percent(&self) -> f32 {
        self.left_percent
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn begin_drag(&mut self) {
        self.dragging = true;
    }

    /// Moves the divider to `offset` columns from the container's left edge. Returns the new
    /// percentage, or `None` when no drag is active or the container has no width.
    pub fn drag_to(&mut self, offset: f32, container_width: f32) -> Option<f32> {
        if !self.dragging || container_width <= 0.0 {
            return None;
        }
        self.left_percent = clamp_percent(offset / container_width * 100.0);
        Some(self.left_percent)
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    /// Column split for a container `width` cells wide, leaving one column for the divider.
    pub fn columns(&self, width: u16) -> (u16, u16) {
        if width < 3 {
            return (width, 0);
        }
        let usable = width - 1;
        let left = ((usable as f32) * self.left_percent / 100.0).round() as u16;
        let left = left.clamp(1, usable - 1);
        (left, usable - left)
    }
}

pub fn clamp_percent(percent: f32) -> f32 {
    if percent.is_nan() {
        return 50.0;
    }
    percent.clamp(MIN_LEFT_PERCENT, MAX_LEFT_PERCENT)
}
