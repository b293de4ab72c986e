use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::app::App;
use crate::registry;
use crate::tokens::MAX_TOKENS;

pub fn render_hub(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header
            Constraint::Min(10),   // Game tiles
            Constraint::Length(1), // Notice
            Constraint::Length(1), // Help
        ])
        .split(area);

    render_header(frame, chunks[0], app);
    render_tiles(frame, chunks[1], app);

    if let Some(notice) = &app.notice {
        let msg = Paragraph::new(Line::from(Span::styled(
            format!(" 🪙 {notice} "),
            Style::default()
                .fg(Color::Rgb(255, 80, 80))
                .add_modifier(Modifier::BOLD),
        )));
        frame.render_widget(msg, chunks[2]);
    }

    let enter_hint = if app.ledger.has_tokens() {
        Span::styled("ENTER Insert token & play ", Style::default().fg(Color::Yellow))
    } else {
        Span::styled(
            "ENTER Insert token & play (none left!) ",
            Style::default().fg(Color::Rgb(255, 80, 80)),
        )
    };
    let mut help = vec![
        Span::styled(" ←→ Select ", Style::default().fg(Color::DarkGray)),
        Span::styled("│ ", Style::default().fg(Color::Rgb(60, 60, 60))),
        enter_hint,
        Span::styled("│ ", Style::default().fg(Color::Rgb(60, 60, 60))),
        Span::styled("D Dev mode ", Style::default().fg(Color::DarkGray)),
        Span::styled("│ ", Style::default().fg(Color::Rgb(60, 60, 60))),
        Span::styled("Q Quit", Style::default().fg(Color::DarkGray)),
    ];
    if app.dev_mode {
        help.push(Span::styled(
            "  │ DEV: + add 5 │ - remove │ 0 reset",
            Style::default().fg(Color::Rgb(255, 170, 0)),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(help)), chunks[3]);
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let token_meter: String = (0..MAX_TOKENS)
        .map(|i| if i < app.ledger.tokens() { '●' } else { '○' })
        .collect();
    let lines = vec![
        Line::from(Span::styled(
            "  ▄▄▄ TOKENCADE ▄▄▄   SELECT YOUR GAME",
            Style::default()
                .fg(Color::Rgb(0, 255, 0))
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  PLAYER: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                &app.player_name,
                Style::default()
                    .fg(Color::Rgb(80, 200, 255))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("   TOKENS: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("{} {}", app.ledger.tokens(), token_meter),
                Style::default()
                    .fg(Color::Rgb(255, 215, 0))
                    .add_modifier(Modifier::BOLD),
            ),
            if app.dev_mode {
                Span::styled(
                    "   [DEV]",
                    Style::default().fg(Color::Rgb(255, 170, 0)),
                )
            } else {
                Span::raw("")
            },
        ]),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_tiles(frame: &mut Frame, area: Rect, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![
            Constraint::Ratio(1, registry::GAMES.len() as u32);
            registry::GAMES.len()
        ])
        .split(area);

    for (idx, info) in registry::GAMES.iter().enumerate() {
        let selected = idx == app.selected_game;
        let border_color = if selected {
            Color::Rgb(0, 255, 0)
        } else {
            Color::Rgb(0, 90, 0)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(if selected {
                BorderType::Double
            } else {
                BorderType::Rounded
            })
            .border_style(Style::default().fg(border_color))
            .title(format!(" {} ", info.name))
            .title_style(
                Style::default()
                    .fg(border_color)
                    .add_modifier(Modifier::BOLD),
            );
        let inner = block.inner(columns[idx]);
        frame.render_widget(block, columns[idx]);

        let stars = "⭐".repeat(info.difficulty as usize);
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("   {}", info.preview),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                format!(" {}", info.description),
                Style::default().fg(Color::Rgb(0, 180, 0)),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled(" by ", Style::default().fg(Color::DarkGray)),
                Span::styled(info.developer, Style::default().fg(Color::Rgb(80, 200, 255))),
            ]),
            Line::from(Span::styled(
                format!(" {stars} {}/5", info.difficulty),
                Style::default().fg(Color::Yellow),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled(" COST 1 🪙", Style::default().fg(Color::Rgb(255, 120, 120))),
                Span::styled("  WIN ", Style::default().fg(Color::DarkGray)),
                Span::styled(
                    format!("{} 🪙", info.tokens_on_win),
                    Style::default()
                        .fg(Color::Rgb(255, 215, 0))
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
        ];
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
    }
}
