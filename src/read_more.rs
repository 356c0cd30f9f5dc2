//! Read-more truncation of post bodies.
//!
//! Truncation is decided in two phases.  Rendering creates one
//! [`BodyState`] per card without knowing how tall the body will be.  Once
//! the cards have been laid out, [`recompute`] receives the measured full
//! height of every body and decides which ones overflow the collapsed
//! height.  Only overflowing bodies get a toggle.

/// Rows a body may occupy before it is truncated.
pub const DEFAULT_COLLAPSED_ROWS: u16 = 6;

pub const READ_MORE_LABEL: &str = "Leer Mas";
pub const READ_LESS_LABEL: &str = "Leer Menos";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Truncation {
    #[default]
    Truncated,
    Expanded,
}

/// Visual state of one rendered body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BodyState {
    pub truncation: Truncation,
    /// Set by [`recompute`]; `false` until the body has been measured.
    pub overflowing: bool,
    pub measured: bool,
}

impl BodyState {
    /// Label for the toggle, or `None` when no toggle is shown.
    pub fn toggle_label(&self) -> Option<&'static str> {
        if !self.overflowing {
            return None;
        }
        Some(match self.truncation {
            Truncation::Truncated => READ_MORE_LABEL,
            Truncation::Expanded => READ_LESS_LABEL,
        })
    }

    /// Rows to show, or `None` for the whole body.
    ///
    /// Unmeasured bodies are shown collapsed, matching their default state.
    pub fn visible_rows(&self, collapsed_rows: u16) -> Option<u16> {
        let truncated = self.truncation == Truncation::Truncated;
        match (self.measured, self.overflowing) {
            (false, _) => Some(collapsed_rows),
            (true, true) if truncated => Some(collapsed_rows),
            _ => None,
        }
    }
}

/// Measurement pass.  `full_heights[i]` is the untruncated height of body
/// `i`.  Overflowing bodies keep the truncation they had before; the rest
/// are shown in full without a toggle and forget any expansion, so a body
/// that overflows again starts truncated.  Bodies without a measurement are
/// left untouched.
pub fn recompute(bodies: &mut [BodyState], full_heights: &[u16], collapsed_rows: u16) {
    for (body, &height) in bodies.iter_mut().zip(full_heights) {
        body.measured = true;
        body.overflowing = height > collapsed_rows;
        if !body.overflowing {
            body.truncation = Truncation::Truncated;
        }
    }
}

/// Flip body `index` between truncated and expanded.  Returns `false` (and
/// changes nothing) when the body has no toggle.
pub fn toggle(bodies: &mut [BodyState], index: usize) -> bool {
    match bodies.get_mut(index) {
        Some(body) if body.overflowing => {
            body.truncation = match body.truncation {
                Truncation::Truncated => Truncation::Expanded,
                Truncation::Expanded => Truncation::Truncated,
            };
            true
        }
        _ => false,
    }
}
