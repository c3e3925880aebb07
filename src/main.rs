mod app;
mod components;
mod event;
mod logging;
mod planner;
mod theme;
mod tui;

use std::time::{Duration, Instant};

use app::{App, InputMode};
use color_eyre::Result;
use crossterm::event::{
    Event, KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::{Constraint, Layout, Rect};

use components::clash_banner::banner_height;
use components::event_form::EventFormState;
use components::timeline::Geometry;
use components::{ClashBanner, EventForm, StatusBar, Timeline};
use planner::drag::{snap_to_step, DragOutcome};
use planner::EventStore;

fn main() -> Result<()> {
    color_eyre::install()?;

    let store = EventStore::open_default()?;
    if let Some(dir) = store.path().parent() {
        logging::init(dir);
    }
    let mut app = App::new(store);

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app);
    // Quitting inside the debounce window must not lose the last edit.
    app.flush_save();
    tui::restore()?;
    result
}

fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    let mut geometry = Geometry::default();

    while app.running {
        app.tick(Instant::now());

        terminal.draw(|frame| {
            let area = frame.area();

            let layout = Layout::vertical([
                Constraint::Length(banner_height(&app.clashes)),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(area);

            ClashBanner::render(frame, layout[0], &app.clashes, &app.events);
            geometry = Timeline::render(frame, layout[1], app);

            if let Some(ref form) = app.form {
                EventForm::render(frame, area, form);
            }

            if let Some(id) = app.detail.as_deref() {
                if let Some(ev) = app.event_by_id(id) {
                    components::detail::render_detail_popup(frame, area, ev);
                }
            }

            if app.show_help {
                render_help(frame, area);
            }

            StatusBar::render(frame, layout[2], app);
        })?;

        if let Some(ev) = event::poll_event(Duration::from_millis(100))? {
            match ev {
                Event::Key(key) => {
                    // Clear status message on any key
                    app.status_message = None;

                    // Help overlay takes priority
                    if app.show_help {
                        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
                            app.show_help = false;
                        }
                        continue;
                    }

                    // Detail popup takes priority
                    if app.detail.is_some() {
                        handle_detail_input(app, key.code);
                        continue;
                    }

                    match app.input_mode {
                        InputMode::Form => handle_form_input(app, key.code),
                        InputMode::Normal => {
                            handle_normal_input(app, key.code, key.modifiers)
                        }
                    }
                }
                Event::Mouse(mouse) => handle_mouse(app, mouse, &geometry),
                _ => {}
            }
        }
    }

    Ok(())
}

fn handle_normal_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match (code, modifiers) {
        (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
            app.running = false;
        }
        (KeyCode::Char('n'), _) => {
            let start = snap_to_step(chrono::Local::now());
            app.form = Some(EventFormState::new(start));
            app.input_mode = InputMode::Form;
        }
        (KeyCode::Char('t'), _) => app.go_to_today(),
        (KeyCode::Char('c'), _) => app.jump_next_clash(),
        (KeyCode::Char('E'), _) => app.export(),
        (KeyCode::Char('I'), _) => app.import(),
        (KeyCode::Char('['), _) => app.page_prev(),
        (KeyCode::Char(']'), _) => app.page_next(),
        (KeyCode::Up, _) | (KeyCode::Char('k'), _) => app.scroll_up(1),
        (KeyCode::Down, _) | (KeyCode::Char('j'), _) => app.scroll_down(1),
        (KeyCode::PageUp, _) => app.scroll_up(7),
        (KeyCode::PageDown, _) => app.scroll_down(7),
        (KeyCode::Char('?'), _) => app.show_help = true,
        _ => {}
    }
}

fn handle_form_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => {
            app.form = None;
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => submit_form(app),
        KeyCode::Tab => {
            if let Some(form) = app.form.as_mut() {
                form.active_field = form.active_field.next();
            }
        }
        KeyCode::BackTab => {
            if let Some(form) = app.form.as_mut() {
                form.active_field = form.active_field.prev();
            }
        }
        KeyCode::Backspace => {
            if let Some(form) = app.form.as_mut() {
                form.backspace();
            }
        }
        KeyCode::Char(' ') => {
            if let Some(form) = app.form.as_mut() {
                form.cycle_or_space();
            }
        }
        KeyCode::Char(c) => {
            if let Some(form) = app.form.as_mut() {
                form.input_char(c);
            }
        }
        _ => {}
    }
}

fn submit_form(app: &mut App) {
    let Some(form) = app.form.as_ref() else { return };
    if !form.is_valid() {
        app.status_message = Some("Title, date and times are required".to_string());
        return;
    }
    if let Some((event, repeat, count)) = form.build() {
        if form.is_editing() {
            app.update_event(event);
        } else {
            app.add_event(event, repeat, count);
        }
        app.form = None;
        app.input_mode = InputMode::Normal;
    }
}

fn handle_detail_input(app: &mut App, code: KeyCode) {
    let Some(id) = app.detail.clone() else { return };
    match code {
        KeyCode::Esc => app.detail = None,
        KeyCode::Char('d') => app.delete_event(&id),
        KeyCode::Char('e') => {
            if let Some(ev) = app.event_by_id(&id) {
                app.form = Some(EventFormState::edit(ev));
                app.input_mode = InputMode::Form;
                app.detail = None;
            }
        }
        KeyCode::Char(c) if c.is_ascii_digit() && c != '0' => {
            let idx = c.to_digit(10).unwrap_or(1) as usize - 1;
            app.toggle_checklist_item(&id, idx);
        }
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent, geometry: &Geometry) {
    // Popups are keyboard-driven; ignore pointer input while one is open.
    let popup_open = app.form.is_some() || app.detail.is_some() || app.show_help;
    let now = Instant::now();
    let cell = (mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if popup_open {
                return;
            }
            if let Some(id) = geometry.event_at(cell.0, cell.1) {
                let instant = geometry.instant_at(cell.0, cell.1);
                if let (Some(ev), Some(at)) = (app.event_by_id(id), instant) {
                    let ev = ev.clone();
                    app.drag.press(&ev, cell, at);
                }
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.drag.motion(cell, geometry.instant_at(cell.0, cell.1));
        }
        MouseEventKind::Up(MouseButton::Left) => match app.drag.release(now) {
            DragOutcome::Drop { event_id, start, end } => {
                app.commit_drop(&event_id, start, end);
            }
            DragOutcome::Click { event_id } => {
                if !popup_open && !app.drag.clicks_suppressed(now) {
                    app.detail = Some(event_id);
                }
            }
            DragOutcome::None => {
                // Release over empty grid without a gesture: click-create.
                if popup_open
                    || app.drag.clicks_suppressed(now)
                    || geometry.event_at(cell.0, cell.1).is_some()
                {
                    return;
                }
                if let Some(at) = geometry.instant_at(cell.0, cell.1) {
                    app.form = Some(EventFormState::new(snap_to_step(at)));
                    app.input_mode = InputMode::Form;
                }
            }
        },
        MouseEventKind::ScrollUp => app.scroll_up(1),
        MouseEventKind::ScrollDown => app.scroll_down(1),
        _ => {}
    }
}

fn render_help(frame: &mut ratatui::Frame, area: Rect) {
    use ratatui::style::{Color, Modifier, Style};
    use ratatui::text::{Line, Span};
    use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

    let popup_w = area.width.min(56).max(30);
    let popup_h = area.height.min(22).max(12);
    let x = area.x + (area.width.saturating_sub(popup_w)) / 2;
    let y = area.y + (area.height.saturating_sub(popup_h)) / 2;
    let popup_area = Rect::new(x, y, popup_w, popup_h);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Keybindings ")
        .title_style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let key_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let desc_style = Style::default();
    let section_style = Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED);

    let lines = vec![
        Line::from(Span::styled("Navigation", section_style)),
        Line::from(vec![
            Span::styled("  j/k ", key_style),
            Span::styled("or ", theme::current().dim),
            Span::styled("\u{2191}/\u{2193}  ", key_style),
            Span::styled("Scroll days", desc_style),
        ]),
        Line::from(vec![
            Span::styled("  [/]       ", key_style),
            Span::styled("Previous/next two months", desc_style),
        ]),
        Line::from(vec![
            Span::styled("  t         ", key_style),
            Span::styled("Jump to today", desc_style),
        ]),
        Line::from(vec![
            Span::styled("  c         ", key_style),
            Span::styled("Jump to next clash", desc_style),
        ]),
        Line::from(""),
        Line::from(Span::styled("Mouse", section_style)),
        Line::from(vec![
            Span::styled("  click     ", key_style),
            Span::styled("Open event / create at that time", desc_style),
        ]),
        Line::from(vec![
            Span::styled("  drag      ", key_style),
            Span::styled("Reschedule (snaps to 10 min)", desc_style),
        ]),
        Line::from(""),
        Line::from(Span::styled("Actions", section_style)),
        Line::from(vec![
            Span::styled("  n         ", key_style),
            Span::styled("Create new event", desc_style),
        ]),
        Line::from(vec![
            Span::styled("  E / I     ", key_style),
            Span::styled("Export / import JSON", desc_style),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  q", key_style),
            Span::styled(" / ", theme::current().dim),
            Span::styled("Esc     ", key_style),
            Span::styled("Quit / close popup", desc_style),
        ]),
    ];

    let para = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(para, inner);
}
