use super::{finish, reaction_time, HitResult};
use crate::event_log::{EventKind, HitDetail};
use crate::round::{Round, Winner};

/// Reflex drill: any hit after `go` is a win for the shooter
pub fn on_hit(round: &mut Round, x: f64, y: f64, now: f64) -> HitResult {
    if round.winner.is_some() || round.is_finished() {
        round.add_event(EventKind::HitAfterFinish { x, y }, now);
        return HitResult::AfterFinish;
    }

    let reaction = reaction_time(round, now);
    round.winner = Some(Winner::User);
    round.add_event(
        EventKind::Hit {
            x,
            y,
            detail: HitDetail::Intruder { reaction },
        },
        now,
    );
    finish(
        round,
        EventKind::Finish {
            manual: false,
            winner: Some(Winner::User),
            reaction,
        },
        now,
    )
}
