use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::planner::{EventKind, PlanEvent};
use crate::theme;

/// Centered popup with the full record: time range, type, note, and for
/// tasks the checklist (digit keys toggle items).
pub fn render_detail_popup(frame: &mut Frame, area: Rect, event: &PlanEvent) {
    let popup_w = area.width.min(60).max(30);
    let popup_h = area.height.min(18).max(8);
    let x = area.x + (area.width.saturating_sub(popup_w)) / 2;
    let y = area.y + (area.height.saturating_sub(popup_h)) / 2;
    let popup_area = Rect::new(x, y, popup_w, popup_h);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(format!(" {} ", event.title))
        .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(vec![
        Span::styled("  ", Style::default().bg(event.color())),
        Span::styled(
            format!(
                " {}",
                match event.kind {
                    EventKind::Event => "Event",
                    EventKind::Status => "Status",
                    EventKind::Task => "Task",
                }
            ),
            Style::default(),
        ),
    ]));

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("Date: ", theme::current().dim),
        Span::styled(
            event.start.format("%A, %B %d, %Y").to_string(),
            Style::default(),
        ),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Time: ", theme::current().dim),
        Span::styled(event.duration_display(), Style::default()),
    ]));
    if event.start.date_naive() != event.end.date_naive() {
        lines.push(Line::from(vec![
            Span::styled("Until: ", theme::current().dim),
            Span::styled(event.end.format("%A, %B %d").to_string(), Style::default()),
        ]));
    }

    if let Some(note) = &event.note {
        if !note.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Note:", theme::current().dim)));
            for line in note.lines() {
                lines.push(Line::from(line.to_string()));
            }
        }
    }

    if let Some(items) = &event.checklist {
        if !items.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Checklist:", theme::current().dim)));
            for (i, item) in items.iter().enumerate() {
                let mark = if item.completed { "[x]" } else { "[ ]" };
                let style = if item.completed {
                    Style::default().add_modifier(Modifier::DIM | Modifier::CROSSED_OUT)
                } else {
                    Style::default()
                };
                lines.push(Line::from(vec![
                    Span::styled(format!("{} ", i + 1), theme::current().dim),
                    Span::raw(format!("{mark} ")),
                    Span::styled(item.text.clone(), style),
                ]));
            }
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        if event.kind == EventKind::Task {
            "1-9:Toggle item  e:Edit  d:Delete  Esc:Close"
        } else {
            "e:Edit  d:Delete  Esc:Close"
        },
        theme::current().dim,
    )));

    let para = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(para, inner);
}
