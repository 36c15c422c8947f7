use super::{finish, HitResult};
use crate::event_log::{EventKind, HitDetail};
use crate::round::Round;

/// Ring radii (normalized distance from centre) and their scores
pub const RINGS: [(f64, u8); 5] = [(0.08, 10), (0.16, 9), (0.24, 8), (0.32, 7), (0.40, 6)];

pub fn score_for(x: f64, y: f64) -> u8 {
    let r = (x - 0.5).hypot(y - 0.5);
    RINGS
        .iter()
        .find(|(radius, _)| r <= *radius)
        .map_or(0, |(_, score)| *score)
}

pub fn on_hit(round: &mut Round, x: f64, y: f64, now: f64) -> HitResult {
    if round.shots >= round.shots_goal {
        return HitResult::Ignored;
    }

    let score = score_for(x, y);
    round.shots += 1;
    round.add_event(
        EventKind::Hit {
            x,
            y,
            detail: HitDetail::Bullseye {
                score,
                shot: round.shots,
            },
        },
        now,
    );

    if round.shots == round.shots_goal {
        finish(round, EventKind::finish(), now)
    } else {
        HitResult::Recorded
    }
}
