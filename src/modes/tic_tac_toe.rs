use super::{finish, HitResult};
use crate::event_log::{EventKind, HitDetail};
use crate::round::{Board, Round, Winner};

pub fn on_hit(round: &mut Round, x: f64, y: f64, now: f64) -> HitResult {
    let (row, col) = Board::cell_for(x, y);

    if round.board.get(row, col).is_some() {
        round.add_event(EventKind::InvalidHit { x, y, row, col }, now);
        return HitResult::Invalid;
    }

    let player = round.current_player;
    round.board.set(row, col, player);
    round.add_event(
        EventKind::Hit {
            x,
            y,
            detail: HitDetail::TicTacToe { row, col, player },
        },
        now,
    );

    let decided = match round.board.line_winner() {
        Some(mark) => Some(Winner::from(mark)),
        None if round.board.is_full() => Some(Winner::Draw),
        None => None,
    };

    match decided {
        Some(winner) => {
            round.winner = Some(winner);
            finish(
                round,
                EventKind::Finish {
                    manual: false,
                    winner: Some(winner),
                    reaction: None,
                },
                now,
            )
        }
        None => {
            round.current_player = player.other();
            HitResult::Recorded
        }
    }
}
