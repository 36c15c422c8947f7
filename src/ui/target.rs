use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols::Marker,
    text::Span,
    widgets::{
        canvas::{Canvas, Circle, Context, Line, Rectangle},
        Block, Borders,
    },
    Frame,
};

use crate::modes::bullseye::RINGS;
use crate::round::{Board, Mode, Player, StartZone};

const HIT_RADIUS: f64 = 0.018;

/// Everything needed to paint one target frame
pub struct TargetView<'a> {
    pub title: String,
    pub mode: Mode,
    pub board: Option<&'a Board>,
    pub hits: &'a [(f64, f64)],
    /// Drawn while a round waits to be armed
    pub start_zone: Option<StartZone>,
}

/// Largest area inside `area` that looks square on a terminal with cells
/// twice as tall as they are wide
pub fn square_area(area: Rect) -> Rect {
    let width = area.width.min(area.height.saturating_mul(2));
    let height = area.height.min(area.width / 2).max(1).min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

// canvas y grows upwards, hit y grows downwards
fn flip(y: f64) -> f64 {
    1.0 - y
}

/// Draw the target into `area` and return the inner rect hits map onto
pub fn render_target(f: &mut Frame, area: Rect, view: &TargetView<'_>) -> Rect {
    let outer = square_area(area);
    let block = Block::default().borders(Borders::ALL).title(view.title.clone());
    let inner = block.inner(outer);

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([0.0, 1.0])
        .y_bounds([0.0, 1.0])
        .paint(|ctx| {
            draw_face(ctx, view.mode, view.board);
            ctx.layer();
            if let Some(zone) = view.start_zone {
                draw_start_zone(ctx, zone);
            }
            draw_hits(ctx, view.hits);
        });

    f.render_widget(canvas, outer);
    inner
}

fn draw_face(ctx: &mut Context<'_>, mode: Mode, board: Option<&Board>) {
    match mode {
        Mode::Bullseye => {
            for (radius, _) in RINGS {
                ctx.draw(&Circle {
                    x: 0.5,
                    y: 0.5,
                    radius,
                    color: Color::White,
                });
            }
            ctx.print(0.49, 0.5, Span::styled("·", Style::default().fg(Color::Red)));
        }
        Mode::TicTacToe => {
            for third in [1.0 / 3.0, 2.0 / 3.0] {
                ctx.draw(&Line {
                    x1: third,
                    y1: 0.0,
                    x2: third,
                    y2: 1.0,
                    color: Color::White,
                });
                ctx.draw(&Line {
                    x1: 0.0,
                    y1: third,
                    x2: 1.0,
                    y2: third,
                    color: Color::White,
                });
            }
            if let Some(board) = board {
                for (row, col, player) in board.marks() {
                    let x = (col as f64 + 0.5) / 3.0;
                    let y = flip((row as f64 + 0.5) / 3.0);
                    let color = match player {
                        Player::X => Color::Cyan,
                        Player::O => Color::Magenta,
                    };
                    ctx.print(x, y, Span::styled(player.to_string(), Style::default().fg(color)));
                }
            }
        }
        Mode::DrawDual => {
            ctx.draw(&Line {
                x1: 0.5,
                y1: 0.0,
                x2: 0.5,
                y2: 1.0,
                color: Color::White,
            });
            ctx.print(0.24, 0.92, "A");
            ctx.print(0.74, 0.92, "B");
        }
        Mode::Intruder => {
            ctx.draw(&Circle {
                x: 0.5,
                y: 0.68,
                radius: 0.08,
                color: Color::Red,
            });
            ctx.draw(&Rectangle {
                x: 0.38,
                y: 0.3,
                width: 0.24,
                height: 0.28,
                color: Color::Red,
            });
        }
    }
}

fn draw_start_zone(ctx: &mut Context<'_>, zone: StartZone) {
    ctx.draw(&Rectangle {
        x: zone.x,
        y: flip(zone.y + zone.h),
        width: zone.w,
        height: zone.h,
        color: Color::Green,
    });
    ctx.print(
        zone.x + zone.w / 2.0 - 0.04,
        flip(zone.y + zone.h / 2.0),
        Span::styled("PLAY", Style::default().fg(Color::Green)),
    );
}

fn draw_hits(ctx: &mut Context<'_>, hits: &[(f64, f64)]) {
    let last = hits.len().saturating_sub(1);
    for (i, &(x, y)) in hits.iter().enumerate() {
        ctx.draw(&Circle {
            x,
            y: flip(y),
            radius: HIT_RADIUS,
            color: if i == last { Color::Yellow } else { Color::Red },
        });
    }
}
