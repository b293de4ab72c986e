use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::app::App;

const MAX_NAME_LEN: usize = 12;

pub fn render_login(frame: &mut Frame, area: Rect, app: &App) {
    let overlay_w = 52u16.min(area.width.saturating_sub(4));
    let overlay_h = 15u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(overlay_w)) / 2;
    let y = area.y + (area.height.saturating_sub(overlay_h)) / 2;
    let overlay_area = Rect::new(x, y, overlay_w, overlay_h);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::Rgb(0, 255, 0)))
        .title(" TOKENCADE v1.0 ")
        .title_style(
            Style::default()
                .fg(Color::Rgb(0, 255, 0))
                .add_modifier(Modifier::BOLD),
        )
        .style(Style::default().bg(Color::Rgb(0, 15, 0)));
    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let typed = app.name_buffer.chars().count();
    let display_name = format!("{}{}", app.name_buffer, "_".repeat(MAX_NAME_LEN - typed));

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   ████ WELCOME TO THE ARCADE ████",
            Style::default().fg(Color::Rgb(0, 255, 0)),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "   Spend a token to play. Win games",
            Style::default().fg(Color::Rgb(0, 180, 0)),
        )),
        Line::from(Span::styled(
            "   to earn tokens back.",
            Style::default().fg(Color::Rgb(0, 180, 0)),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "   ENTER PLAYER NAME:",
            Style::default().fg(Color::Rgb(150, 255, 150)),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("     [ ", Style::default().fg(Color::Rgb(0, 120, 0))),
            Span::styled(
                display_name,
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" ]", Style::default().fg(Color::Rgb(0, 120, 0))),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "   Enter",
                Style::default()
                    .fg(Color::Rgb(0, 255, 0))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" start  ", Style::default().fg(Color::Rgb(0, 120, 0))),
            Span::styled(
                "Esc",
                Style::default()
                    .fg(Color::Rgb(0, 255, 0))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" quit", Style::default().fg(Color::Rgb(0, 120, 0))),
        ]),
    ];

    let p = Paragraph::new(lines).style(Style::default().bg(Color::Rgb(0, 15, 0)));
    frame.render_widget(p, inner);
}
