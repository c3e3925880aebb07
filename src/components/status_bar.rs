use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, InputMode};
use crate::theme;

pub struct StatusBar;

impl StatusBar {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let w = area.width as usize;

        let mode_str = match app.input_mode {
            InputMode::Form if app.form.as_ref().is_some_and(|f| f.is_editing()) => "[Edit Event]",
            InputMode::Form => "[New Event]",
            InputMode::Normal => "Timeline",
        };
        let pending = if app.has_pending_save() { " \u{25cf}" } else { "" };

        // Show the transient message if present, otherwise key hints.
        let right_text = if let Some(ref msg) = app.status_message {
            format!(" {} ", msg)
        } else if app.input_mode == InputMode::Form {
            " Tab:Next Space:Cycle Enter:Save Esc:Cancel".to_string()
        } else if w >= 90 {
            " drag:Move jk:Scroll [/]:2M t:Today n:New c:Clash E:Export I:Import ?:Help q:Quit"
                .to_string()
        } else if w >= 50 {
            " jk:Scroll t:Today n:New c:Clash q:Quit".to_string()
        } else {
            " ?:Help q:Quit".to_string()
        };

        let left = format!(" {}{} {} events ", mode_str, pending, app.events.len());
        // Char count, not byte length: the pending marker is multibyte.
        let padding_len = w.saturating_sub(left.chars().count() + right_text.chars().count());
        let padding = " ".repeat(padding_len);

        let line = Line::from(vec![
            Span::styled(left, theme::current().status),
            Span::styled(padding, theme::current().status),
            Span::styled(right_text, theme::current().status),
        ]);

        let bar = Paragraph::new(line).style(theme::current().status);
        frame.render_widget(bar, area);
    }
}
