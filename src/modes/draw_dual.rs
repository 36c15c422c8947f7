use super::{finish, reaction_time, HitResult};
use crate::event_log::{EventKind, HitDetail};
use crate::round::{Lane, Round, Winner};

/// First valid hit wins for the lane it landed in
pub fn on_hit(round: &mut Round, x: f64, y: f64, now: f64) -> HitResult {
    if round.winner.is_some() || round.is_finished() {
        round.add_event(EventKind::HitAfterFinish { x, y }, now);
        return HitResult::AfterFinish;
    }

    let lane = Lane::from_x(x);
    let reaction = reaction_time(round, now);
    let winner = Winner::from(lane);

    round.winner = Some(winner);
    round.add_event(
        EventKind::Hit {
            x,
            y,
            detail: HitDetail::DrawDual { lane, reaction },
        },
        now,
    );
    finish(
        round,
        EventKind::Finish {
            manual: false,
            winner: Some(winner),
            reaction,
        },
        now,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::apply_hit;
    use crate::modes::test_support::active_round;
    use crate::round::{Mode, RoundState};

    #[test]
    fn left_half_is_lane_a() {
        let mut round = active_round(Mode::DrawDual, 1, 2.0);

        assert_eq!(on_hit(&mut round, 0.3, 0.5, 2.25), HitResult::Finished);
        assert_eq!(round.winner, Some(Winner::A));
        assert_eq!(round.state, RoundState::Finished);
        let hit = round.events.hits().next().unwrap();
        let reaction = hit.detail.reaction().unwrap();
        assert!((reaction - 0.25).abs() < 1e-9);
    }

    #[test]
    fn midline_is_lane_b() {
        let mut round = active_round(Mode::DrawDual, 1, 0.0);
        on_hit(&mut round, 0.5, 0.5, 1.0);
        assert_eq!(round.winner, Some(Winner::B));
    }

    #[test]
    fn later_hits_only_log() {
        let mut round = active_round(Mode::DrawDual, 1, 0.0);
        apply_hit(&mut round, 0.9, 0.5, 0.4);
        let events_before = round.events.len();

        assert_eq!(apply_hit(&mut round, 0.1, 0.5, 0.6), HitResult::AfterFinish);
        assert_eq!(round.winner, Some(Winner::B));
        assert_eq!(round.events.len(), events_before + 1);
        assert_eq!(
            round.events.last().unwrap().kind,
            EventKind::HitAfterFinish { x: 0.1, y: 0.5 }
        );
        assert_eq!(round.events.hits().count(), 1);
    }

    #[test]
    fn missing_go_gives_no_reaction() {
        let mut round = active_round(Mode::DrawDual, 1, 0.0);
        round.go_time = None;
        on_hit(&mut round, 0.2, 0.2, 3.0);
        assert_eq!(round.events.hits().next().unwrap().detail.reaction(), None);
    }
}
