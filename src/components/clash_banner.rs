use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::planner::clash::{unique_pairs, Clash};
use crate::planner::PlanEvent;

/// Rows the banner wants for `clashes`: a heading plus one line per
/// unordered pair, capped so the timeline keeps most of the screen.
pub fn banner_height(clashes: &[Clash]) -> u16 {
    if clashes.is_empty() {
        0
    } else {
        (unique_pairs(clashes).len() as u16 + 1).min(4)
    }
}

pub struct ClashBanner;

impl ClashBanner {
    pub fn render(frame: &mut Frame, area: Rect, clashes: &[Clash], events: &[PlanEvent]) {
        if area.height == 0 {
            return;
        }

        let pairs = unique_pairs(clashes);
        let title_of = |id: &str| {
            events
                .iter()
                .find(|e| e.id == id)
                .map(|e| e.title.clone())
                .unwrap_or_else(|| "Unknown Event".to_string())
        };

        let warn = Style::default().fg(Color::Red).add_modifier(Modifier::BOLD);
        let mut lines = vec![Line::from(Span::styled(
            format!(
                " \u{26a0} Schedule conflict{} detected \u{2014} c:jump",
                if pairs.len() == 1 { "" } else { "s" }
            ),
            warn,
        ))];

        let visible = (area.height as usize).saturating_sub(1);
        for clash in pairs.iter().take(visible) {
            lines.push(Line::from(vec![
                Span::styled("   \u{2022} ", Style::default().fg(Color::Red)),
                Span::styled(title_of(&clash.event_id), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" overlaps "),
                Span::styled(title_of(&clash.clash_with_id), Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(
                    format!(
                        "  {} {}-{} ({} min)",
                        clash.start.format("%b %d"),
                        clash.start.format("%H:%M"),
                        clash.end.format("%H:%M"),
                        clash.overlap_minutes
                    ),
                    Style::default().fg(Color::Red),
                ),
            ]));
        }

        frame.render_widget(Paragraph::new(lines), area);
    }
}
