use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::app::{App, PlayState};
use crate::engine::surface::{Shape, Surface};

const FIELD_BG: Color = Color::Rgb(0, 10, 0);

pub fn render_player(frame: &mut Frame, area: Rect, app: &App) {
    let Some(session) = app.session.as_ref() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(8),    // Game field / status
            Constraint::Length(1), // Help
        ])
        .split(area);

    let header = Line::from(vec![
        Span::styled(" ← ESC BACK ", Style::default().fg(Color::DarkGray)),
        Span::styled("│ ", Style::default().fg(Color::Rgb(60, 60, 60))),
        Span::styled("NOW PLAYING: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            session.info.name,
            Style::default()
                .fg(Color::Rgb(0, 255, 0))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" │ ", Style::default().fg(Color::Rgb(60, 60, 60))),
        Span::styled(
            format!("SCORE: {}", session.live_score.borrow()),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
    ]);
    frame.render_widget(Paragraph::new(header), chunks[0]);

    match &session.state {
        PlayState::Running => {
            render_surface(frame, chunks[1], &session.target.view());
            let help = Line::from(Span::styled(
                " ↑↓←→/WASD Move │ 1-5 Lanes │ R Restart │ Esc Back to hub",
                Style::default().fg(Color::DarkGray),
            ));
            frame.render_widget(Paragraph::new(help), chunks[2]);
        }
        PlayState::Failed => {
            let lines = vec![
                Line::from(""),
                Line::from(Span::styled(
                    "  ERROR LOADING GAME",
                    Style::default()
                        .fg(Color::Red)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    format!("  Failed to load {}", session.info.name),
                    Style::default().fg(Color::Rgb(255, 120, 120)),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "  Press R to retry, Esc for the hub",
                    Style::default().fg(Color::Gray),
                )),
            ];
            frame.render_widget(Paragraph::new(lines), chunks[1]);
        }
        PlayState::Complete {
            final_score,
            tokens_earned,
        } => {
            let lines = vec![
                Line::from(""),
                Line::from(Span::styled(
                    "  GAME COMPLETE!",
                    Style::default()
                        .fg(Color::Rgb(0, 255, 0))
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    format!("  FINAL SCORE: {final_score}"),
                    Style::default().fg(Color::Yellow),
                )),
                Line::from(Span::styled(
                    format!("  TOKENS EARNED: {tokens_earned} 🪙"),
                    Style::default().fg(Color::Rgb(255, 215, 0)),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "  Press ENTER to return to the hub",
                    Style::default().fg(Color::Gray),
                )),
            ];
            frame.render_widget(Paragraph::new(lines), chunks[1]);
        }
    }
}

/// Rasterize the game's retained surface into terminal cells, scaled to the
/// available region.
fn render_surface(frame: &mut Frame, area: Rect, surface: &Surface) {
    let w = area.width as usize;
    let h = area.height as usize;
    if w == 0 || h == 0 || surface.is_blank() || surface.width() <= 0.0 || surface.height() <= 0.0 {
        return;
    }
    let sx = w as f32 / surface.width();
    let sy = h as f32 / surface.height();

    let mut grid: Vec<Vec<(char, Style)>> =
        vec![vec![(' ', Style::default().bg(FIELD_BG)); w]; h];

    for shape in surface.shapes() {
        match shape {
            Shape::Fill { x, y, w: sw, h: sh, color } => {
                let (Some((x0, x1)), Some((y0, y1))) =
                    (span(*x, *sw, sx, w), span(*y, *sh, sy, h))
                else {
                    continue;
                };
                for row in grid.iter_mut().take(y1).skip(y0) {
                    for cell in row.iter_mut().take(x1).skip(x0) {
                        *cell = ('█', Style::default().fg(*color).bg(FIELD_BG));
                    }
                }
            }
            Shape::Frame { x, y, w: sw, h: sh, color } => {
                let (Some((x0, x1)), Some((y0, y1))) =
                    (span(*x, *sw, sx, w), span(*y, *sh, sy, h))
                else {
                    continue;
                };
                for row in y0..y1 {
                    for col in x0..x1 {
                        if row == y0 || row + 1 == y1 || col == x0 || col + 1 == x1 {
                            grid[row][col] = ('█', Style::default().fg(*color).bg(FIELD_BG));
                        }
                    }
                }
            }
            Shape::HLine { y, color } => {
                let row = ((*y * sy) as usize).min(h - 1);
                for cell in &mut grid[row] {
                    if cell.0 == ' ' {
                        *cell = ('─', Style::default().fg(*color).bg(FIELD_BG));
                    }
                }
            }
            Shape::VLine { x, color } => {
                let col = ((*x * sx) as usize).min(w - 1);
                for row in &mut grid {
                    if row[col].0 == ' ' {
                        row[col] = ('│', Style::default().fg(*color).bg(FIELD_BG));
                    }
                }
            }
            Shape::Label { x, y, text, color } => {
                let row = ((*y * sy) as usize).min(h - 1);
                let start = (*x * sx) as usize;
                for (i, ch) in text.chars().enumerate() {
                    let col = start + i;
                    if col < w {
                        grid[row][col] = (
                            ch,
                            Style::default()
                                .fg(*color)
                                .bg(FIELD_BG)
                                .add_modifier(Modifier::BOLD),
                        );
                    }
                }
            }
        }
    }

    let lines: Vec<Line<'static>> = grid
        .into_iter()
        .map(|row| {
            let spans: Vec<Span<'static>> = row
                .into_iter()
                .map(|(ch, style)| Span::styled(String::from(ch), style))
                .collect();
            Line::from(spans)
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

/// Scale a pixel-space extent to a half-open cell range at least one cell
/// wide, clipped to the grid. None when the shape lies fully outside.
fn span(start: f32, extent: f32, scale: f32, limit: usize) -> Option<(usize, usize)> {
    let end = start + extent;
    if end <= 0.0 {
        return None;
    }
    let a = (start.max(0.0) * scale) as usize;
    if a >= limit {
        return None;
    }
    let b = ((end * scale).ceil() as usize).clamp(a + 1, limit);
    Some((a, b))
}
