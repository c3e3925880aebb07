use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::planner::event::{EventKind, PlanEvent, MAX_TITLE_LEN, PALETTE};
use crate::planner::recur::Repeat;
use crate::theme;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormField {
    Title,
    Date,
    StartTime,
    EndTime,
    Kind,
    Color,
    Note,
    Repeat,
    Count,
}

impl FormField {
    pub fn next(&self) -> Self {
        match self {
            FormField::Title => FormField::Date,
            FormField::Date => FormField::StartTime,
            FormField::StartTime => FormField::EndTime,
            FormField::EndTime => FormField::Kind,
            FormField::Kind => FormField::Color,
            FormField::Color => FormField::Note,
            FormField::Note => FormField::Repeat,
            FormField::Repeat => FormField::Count,
            FormField::Count => FormField::Title,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            FormField::Title => FormField::Count,
            FormField::Date => FormField::Title,
            FormField::StartTime => FormField::Date,
            FormField::EndTime => FormField::StartTime,
            FormField::Kind => FormField::EndTime,
            FormField::Color => FormField::Kind,
            FormField::Note => FormField::Color,
            FormField::Repeat => FormField::Note,
            FormField::Count => FormField::Repeat,
        }
    }
}

/// Modal add/edit form state. When `editing` is set, saving updates that
/// event in place (keeping its checklist); otherwise a new event is built,
/// optionally expanded into a recurring series.
#[derive(Debug, Clone)]
pub struct EventFormState {
    pub title: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub kind: EventKind,
    pub color_id: u8,
    pub note: String,
    pub repeat: Repeat,
    pub count: String,
    pub active_field: FormField,
    editing: Option<PlanEvent>,
}

impl EventFormState {
    /// Blank form for a new event starting at `start` (one hour long).
    pub fn new(start: DateTime<Local>) -> Self {
        let end = start + chrono::Duration::hours(1);
        Self {
            title: String::new(),
            date: start.format("%Y-%m-%d").to_string(),
            start_time: start.format("%H:%M").to_string(),
            end_time: end.format("%H:%M").to_string(),
            kind: EventKind::Event,
            color_id: 0,
            note: String::new(),
            repeat: Repeat::None,
            count: "1".to_string(),
            active_field: FormField::Title,
            editing: None,
        }
    }

    /// Form pre-filled from an existing event.
    pub fn edit(event: &PlanEvent) -> Self {
        Self {
            title: event.title.clone(),
            date: event.start.format("%Y-%m-%d").to_string(),
            start_time: event.start.format("%H:%M").to_string(),
            end_time: event.end.format("%H:%M").to_string(),
            kind: event.kind,
            color_id: event.color_id,
            note: event.note.clone().unwrap_or_default(),
            repeat: Repeat::None,
            count: "1".to_string(),
            active_field: FormField::Title,
            editing: Some(event.clone()),
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn input_char(&mut self, c: char) {
        match self.active_field {
            FormField::Title => {
                if self.title.chars().count() < MAX_TITLE_LEN {
                    self.title.push(c);
                }
            }
            FormField::Date => self.date.push(c),
            FormField::StartTime => self.start_time.push(c),
            FormField::EndTime => self.end_time.push(c),
            FormField::Note => self.note.push(c),
            FormField::Count => {
                if c.is_ascii_digit() && self.count.len() < 3 {
                    self.count.push(c);
                }
            }
            _ => {}
        }
    }

    pub fn backspace(&mut self) {
        match self.active_field {
            FormField::Title => {
                self.title.pop();
            }
            FormField::Date => {
                self.date.pop();
            }
            FormField::StartTime => {
                self.start_time.pop();
            }
            FormField::EndTime => {
                self.end_time.pop();
            }
            FormField::Note => {
                self.note.pop();
            }
            FormField::Count => {
                self.count.pop();
            }
            _ => {}
        }
    }

    /// Space cycles the choice fields; elsewhere it types a space.
    pub fn cycle_or_space(&mut self) {
        match self.active_field {
            FormField::Kind => {
                self.kind = match self.kind {
                    EventKind::Event => EventKind::Status,
                    EventKind::Status => EventKind::Task,
                    EventKind::Task => EventKind::Event,
                };
            }
            FormField::Color => {
                self.color_id = (self.color_id + 1) % PALETTE.len() as u8;
            }
            FormField::Repeat => {
                self.repeat = self.repeat.next();
            }
            _ => self.input_char(' '),
        }
    }

    fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }

    fn parsed_time(s: &str) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(s, "%H:%M").ok()
    }

    pub fn is_valid(&self) -> bool {
        !self.title.is_empty()
            && self.parsed_date().is_some()
            && Self::parsed_time(&self.start_time).is_some()
            && Self::parsed_time(&self.end_time).is_some()
    }

    /// Build the result: the event plus the recurrence request (recurrence
    /// only applies to newly created events).
    pub fn build(&self) -> Option<(PlanEvent, Repeat, usize)> {
        let date = self.parsed_date()?;
        let start_t = Self::parsed_time(&self.start_time)?;
        let end_t = Self::parsed_time(&self.end_time)?;
        let start = Local.from_local_datetime(&date.and_time(start_t)).earliest()?;
        let end = Local.from_local_datetime(&date.and_time(end_t)).earliest()?;

        let mut event = match &self.editing {
            Some(orig) => orig.clone(),
            None => PlanEvent::new(self.title.clone(), start, end),
        };
        event.title = self.title.chars().take(MAX_TITLE_LEN).collect();
        event.start = start;
        event.end = end;
        event.kind = self.kind;
        event.color_id = self.color_id;
        event.note = if self.note.is_empty() {
            None
        } else {
            Some(self.note.clone())
        };

        let (repeat, count) = if self.editing.is_some() {
            (Repeat::None, 1)
        } else {
            (self.repeat, self.count.parse().unwrap_or(1))
        };
        Some((event, repeat, count))
    }
}

pub struct EventForm;

impl EventForm {
    pub fn render(frame: &mut Frame, area: Rect, state: &EventFormState) {
        let form_w = area.width.min(52).max(32);
        let form_h = area.height.min(16).max(12);
        let x = area.x + (area.width.saturating_sub(form_w)) / 2;
        let y = area.y + (area.height.saturating_sub(form_h)) / 2;
        let form_area = Rect::new(x, y, form_w, form_h);

        frame.render_widget(Clear, form_area);

        let title = if state.is_editing() { " Edit Event " } else { " New Event " };
        let block = Block::default()
            .title(title)
            .title_style(
                Style::default()
                    .fg(ratatui::style::Color::Green)
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_style(Style::default().fg(ratatui::style::Color::Green));

        let inner = block.inner(form_area);
        frame.render_widget(block, form_area);

        let rows = Layout::vertical([
            Constraint::Length(1), // title
            Constraint::Length(1), // date
            Constraint::Length(1), // start time
            Constraint::Length(1), // end time
            Constraint::Length(1), // kind
            Constraint::Length(1), // color
            Constraint::Length(1), // note
            Constraint::Length(1), // repeat
            Constraint::Length(1), // count
            Constraint::Length(1), // spacer
            Constraint::Length(1), // help
            Constraint::Min(0),
        ])
        .split(inner);

        let active = state.active_field;
        render_field(frame, rows[0], "Title:", &state.title, active == FormField::Title);
        render_field(frame, rows[1], "Date:", &state.date, active == FormField::Date);
        render_field(frame, rows[2], "Start:", &state.start_time, active == FormField::StartTime);
        render_field(frame, rows[3], "End:", &state.end_time, active == FormField::EndTime);

        let kind_label = match state.kind {
            EventKind::Event => "event",
            EventKind::Status => "status",
            EventKind::Task => "task",
        };
        render_choice(frame, rows[4], "Type:", kind_label, active == FormField::Kind);

        let color_area = rows[5];
        render_choice(
            frame,
            color_area,
            "Color:",
            &format!("{}", state.color_id),
            active == FormField::Color,
        );
        // Swatch next to the index.
        let swatch_x = color_area.x + 10;
        if swatch_x + 2 < color_area.x + color_area.width {
            frame.buffer_mut().set_string(
                swatch_x,
                color_area.y,
                "  ",
                Style::default().bg(PALETTE[state.color_id as usize % PALETTE.len()]),
            );
        }

        render_field(frame, rows[6], "Note:", &state.note, active == FormField::Note);
        render_choice(frame, rows[7], "Repeat:", state.repeat.label(), active == FormField::Repeat);

        if state.repeat != Repeat::None {
            render_field(frame, rows[8], "Count:", &state.count, active == FormField::Count);
        }

        let help = Line::from(vec![
            Span::styled("Tab", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":Next ", theme::current().dim),
            Span::styled("Space", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":Cycle ", theme::current().dim),
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":Save ", theme::current().dim),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":Cancel", theme::current().dim),
        ]);
        frame.render_widget(Paragraph::new(help), rows[10]);
    }
}

fn render_field(frame: &mut Frame, area: Rect, label: &str, value: &str, active: bool) {
    let cursor = if active { "_" } else { "" };
    let style = if active {
        Style::default().fg(ratatui::style::Color::Cyan)
    } else {
        Style::default()
    };

    let line = Line::from(vec![
        Span::styled(format!("{:<8}", label), theme::current().dim),
        Span::styled(format!("{}{}", value, cursor), style),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_choice(frame: &mut Frame, area: Rect, label: &str, value: &str, active: bool) {
    let style = if active {
        Style::default().fg(ratatui::style::Color::Cyan)
    } else {
        Style::default()
    };
    let line = Line::from(vec![
        Span::styled(format!("{:<8}", label), theme::current().dim),
        Span::styled(format!("\u{2039}{value}\u{203a}"), style),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 10, h, m, 0).unwrap()
    }

    #[test]
    fn new_form_defaults_to_one_hour() {
        let form = EventFormState::new(at(9, 30));
        assert_eq!(form.start_time, "09:30");
        assert_eq!(form.end_time, "10:30");
        assert!(!form.is_valid()); // empty title
    }

    #[test]
    fn build_produces_the_typed_interval() {
        let mut form = EventFormState::new(at(9, 0));
        for c in "lunch".chars() {
            form.input_char(c);
        }
        let (event, repeat, count) = form.build().unwrap();
        assert_eq!(event.title, "lunch");
        assert_eq!(event.start, at(9, 0));
        assert_eq!(event.end, at(10, 0));
        assert_eq!(repeat, Repeat::None);
        assert_eq!(count, 1);
    }

    #[test]
    fn editing_keeps_id_and_checklist() {
        let mut orig = PlanEvent::new("trip", at(9, 0), at(10, 0));
        orig.kind = EventKind::Task;
        orig.checklist = Some(vec![crate::planner::ChecklistItem::new("tickets")]);

        let mut form = EventFormState::edit(&orig);
        form.active_field = FormField::Title;
        form.input_char('!');
        let (event, repeat, _) = form.build().unwrap();

        assert_eq!(event.id, orig.id);
        assert_eq!(event.title, "trip!");
        assert!(event.checklist.is_some());
        assert_eq!(repeat, Repeat::None);
    }

    #[test]
    fn title_input_respects_the_bound() {
        let mut form = EventFormState::new(at(9, 0));
        for _ in 0..(MAX_TITLE_LEN + 10) {
            form.input_char('x');
        }
        assert_eq!(form.title.chars().count(), MAX_TITLE_LEN);
    }

    #[test]
    fn space_cycles_choice_fields() {
        let mut form = EventFormState::new(at(9, 0));
        form.active_field = FormField::Kind;
        form.cycle_or_space();
        assert_eq!(form.kind, EventKind::Status);

        form.active_field = FormField::Repeat;
        form.cycle_or_space();
        assert_eq!(form.repeat, Repeat::Daily);

        form.active_field = FormField::Title;
        form.cycle_or_space();
        assert_eq!(form.title, " ");
    }

    #[test]
    fn invalid_time_fails_validation() {
        let mut form = EventFormState::new(at(9, 0));
        form.input_char('t');
        form.start_time = "9am".to_string();
        assert!(!form.is_valid());
        assert!(form.build().is_none());
    }
}
