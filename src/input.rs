//! Terminal pointer input mapped onto the unit target square.

use ratatui::layout::Rect;
use std::time::Duration;

/// Map a terminal cell to normalized `(x, y)` within `area`, using the
/// centre of the cell. Cells outside `area` give `None`.
pub fn normalize(area: Rect, column: u16, row: u16) -> Option<(f64, f64)> {
    if area.width == 0 || area.height == 0 {
        return None;
    }
    let inside_x = column >= area.x && column < area.x.saturating_add(area.width);
    let inside_y = row >= area.y && row < area.y.saturating_add(area.height);
    if !inside_x || !inside_y {
        return None;
    }

    let x = (f64::from(column - area.x) + 0.5) / f64::from(area.width);
    let y = (f64::from(row - area.y) + 0.5) / f64::from(area.height);
    Some((x, y))
}

/// Drops hits arriving within `cooldown` of the last accepted one
#[derive(Debug, Clone)]
pub struct HitFilter {
    cooldown: Duration,
    last_accepted: Option<Duration>,
}

impl HitFilter {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_accepted: None,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn accept(&mut self, now: Duration) -> bool {
        if let Some(last) = self.last_accepted {
            if now.saturating_sub(last) < self.cooldown {
                return false;
            }
        }
        self.last_accepted = Some(now);
        true
    }

    pub fn reset(&mut self) {
        self.last_accepted = None;
    }
}
