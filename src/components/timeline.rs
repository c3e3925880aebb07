use chrono::{DateTime, Datelike, Local, NaiveDate, Weekday};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, HighlightKind, RANGE_DAYS};
use crate::planner::drag::at_day_minutes;
use crate::planner::layout::{day_bounds, lay_out_day, DayBlock, DAY_MINUTES};
use crate::theme;

/// Width of the sticky date column.
const DATE_COL_W: u16 = 11;

/// Timed blocks stack at most this deep; deeper slots share the last line.
const MAX_SLOT_LINES: usize = 3;

/// Screen placement of one rendered day row.
#[derive(Debug, Clone)]
pub struct DayRowGeom {
    pub date: NaiveDate,
    pub y: u16,
    pub height: u16,
    pub grid: Rect,
}

/// Hit-testing table produced by one render pass. Blocks are recorded in
/// draw order, so reverse iteration finds the topmost block first.
#[derive(Debug, Default)]
pub struct Geometry {
    pub rows: Vec<DayRowGeom>,
    pub blocks: Vec<(Rect, String)>,
}

impl Geometry {
    fn row_at(&self, x: u16, y: u16) -> Option<&DayRowGeom> {
        self.rows.iter().find(|r| {
            y >= r.y && y < r.y + r.height && x >= r.grid.x && x < r.grid.x + r.grid.width
        })
    }

    /// Timeline instant under a screen cell: interpolate the cell's position
    /// across the row's 24-hour grid width.
    pub fn instant_at(&self, x: u16, y: u16) -> Option<DateTime<Local>> {
        let row = self.row_at(x, y)?;
        let ratio = (x - row.grid.x) as f64 / row.grid.width.max(1) as f64;
        let minute = ((ratio * DAY_MINUTES as f64) as u32).min(DAY_MINUTES - 1);
        Some(at_day_minutes(row.date, minute))
    }

    pub fn event_at(&self, x: u16, y: u16) -> Option<&str> {
        self.blocks
            .iter()
            .rev()
            .find(|(rect, _)| {
                x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
            })
            .map(|(_, id)| id.as_str())
    }
}

pub struct Timeline;

impl Timeline {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) -> Geometry {
        let range_end = app.range_start + chrono::Duration::days(RANGE_DAYS - 1);
        let title = format!(
            " Timeline  {} \u{2013} {} ",
            app.range_start.format("%b %d, %Y"),
            range_end.format("%b %d, %Y")
        );
        let block = Block::default()
            .title(title)
            .title_style(theme::current().header)
            .borders(Borders::ALL)
            .border_style(theme::current().border);

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut geometry = Geometry::default();
        if inner.width <= DATE_COL_W + 24 || inner.height < 3 {
            return geometry;
        }

        let grid_x = inner.x + DATE_COL_W;
        let grid_w = inner.width - DATE_COL_W;

        render_hour_axis(frame, Rect::new(grid_x, inner.y, grid_w, 1));

        let mut y = inner.y + 1;
        let bottom = inner.y + inner.height;
        let mut day_idx = app.scroll_day;

        while y < bottom && (day_idx as i64) < RANGE_DAYS {
            let date = app.day_at(day_idx);
            let layout = lay_out_day(&app.events, date);

            let lanes = layout.status_lanes.len() as u16;
            let timed_lines = if layout.blocks.is_empty() {
                1
            } else {
                (layout.max_slot() + 1).min(MAX_SLOT_LINES) as u16
            };
            let height = (lanes + timed_lines).min(bottom - y);
            if height == 0 {
                break;
            }

            let grid = Rect::new(grid_x, y, grid_w, height);
            render_day_background(frame, date, app.today, grid);
            render_date_column(frame, date, Rect::new(inner.x, y, DATE_COL_W, height));

            for (lane_idx, lane) in layout.status_lanes.iter().enumerate() {
                let line_y = y + lane_idx as u16;
                if line_y >= y + height {
                    break;
                }
                for b in lane {
                    draw_block(frame, app, b, grid, line_y, theme::current().lane, &mut geometry);
                }
            }

            for b in &layout.blocks {
                let line = lanes + (b.slot.min(MAX_SLOT_LINES - 1) as u16);
                let line_y = y + line.min(height - 1);
                let style = block_style(app, b);
                draw_block(frame, app, b, grid, line_y, style, &mut geometry);
            }

            render_highlight(frame, app, date, grid);
            render_ghost(frame, app, date, grid);

            geometry.rows.push(DayRowGeom {
                date,
                y,
                height,
                grid,
            });

            y += height;
            day_idx += 1;
        }

        geometry
    }
}

fn render_hour_axis(frame: &mut Frame, area: Rect) {
    let buf = frame.buffer_mut();
    for hour in (0u32..24).step_by(3) {
        let x = area.x + (hour * 60 * area.width as u32 / DAY_MINUTES) as u16;
        let label = format!("{hour:>2}:00");
        if x + label.len() as u16 <= area.x + area.width {
            buf.set_string(x, area.y, &label, theme::current().dim);
        }
    }
}

fn render_date_column(frame: &mut Frame, date: NaiveDate, area: Rect) {
    let weekend = is_weekend(date);
    let day_style = if weekend {
        theme::current().dim
    } else {
        theme::current().header
    };

    let label = format!("{:<3} {:>2} {}", date.format("%a"), date.day(), date.format("%b"));
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(label, day_style))),
        Rect::new(area.x, area.y, area.width.min(DATE_COL_W), 1),
    );
}

fn render_day_background(frame: &mut Frame, date: NaiveDate, today: NaiveDate, grid: Rect) {
    let buf = frame.buffer_mut();
    if is_weekend(date) {
        buf.set_style(grid, theme::current().weekend);
    }
    // Hour gridlines every three hours.
    for hour in (3u32..24).step_by(3) {
        let x = grid.x + (hour * 60 * grid.width as u32 / DAY_MINUTES) as u16;
        for dy in 0..grid.height {
            buf.set_string(x, grid.y + dy, "\u{2502}", theme::current().dim);
        }
    }
    if date == today {
        buf.set_string(grid.x, grid.y, "\u{25b8}", theme::current().today);
    }
}

fn block_style(app: &App, b: &DayBlock) -> Style {
    let color = app
        .event_by_id(&b.event_id)
        .map(|ev| ev.color())
        .unwrap_or(ratatui::style::Color::Gray);
    let mut style = Style::default().fg(ratatui::style::Color::Black).bg(color);
    if b.conflicting {
        style = style.add_modifier(Modifier::UNDERLINED | Modifier::BOLD);
    }
    if app.drag.dragged_event() == Some(b.event_id.as_str()) {
        style = style.add_modifier(Modifier::DIM);
    }
    style
}

fn draw_block(
    frame: &mut Frame,
    app: &App,
    b: &DayBlock,
    grid: Rect,
    y: u16,
    style: Style,
    geometry: &mut Geometry,
) {
    let Some(rect) = minutes_to_rect(b.start_min, b.end_min, grid, y) else {
        return;
    };

    let title = app
        .event_by_id(&b.event_id)
        .map(|ev| ev.title.as_str())
        .unwrap_or("?");
    let text: String = title
        .chars()
        .take(rect.width as usize)
        .collect::<String>();
    let padded = format!("{:<width$}", text, width = rect.width as usize);

    frame.buffer_mut().set_string(rect.x, rect.y, &padded, style);
    geometry.blocks.push((rect, b.event_id.clone()));
}

fn render_highlight(frame: &mut Frame, app: &App, date: NaiveDate, grid: Rect) {
    let Some(h) = &app.highlight else { return };
    let (day_start, day_end) = day_bounds(date);
    if h.end <= day_start || h.start >= day_end {
        return;
    }

    match h.kind {
        HighlightKind::Today => {
            frame.buffer_mut().set_style(grid, theme::current().today);
        }
        HighlightKind::Clash => {
            let start_min = clamp_minutes(h.start, date);
            let end_min = clamp_minutes_end(h.end, date);
            if let Some(rect) = minutes_to_rect(start_min, end_min, grid, grid.y) {
                let full = Rect::new(rect.x, grid.y, rect.width, grid.height);
                frame.buffer_mut().set_style(full, theme::current().clash);
            }
        }
    }
}

fn render_ghost(frame: &mut Frame, app: &App, date: NaiveDate, grid: Rect) {
    let Some(ghost) = app.drag.ghost() else { return };
    let (day_start, day_end) = day_bounds(date);
    if ghost.end <= day_start || ghost.start >= day_end {
        return;
    }

    let start_min = clamp_minutes(ghost.start, date);
    let end_min = clamp_minutes_end(ghost.end, date);
    let Some(rect) = minutes_to_rect(start_min, end_min, grid, grid.y) else {
        return;
    };

    let label = format!(
        "{} \u{2192} {}",
        ghost.start.format("%H:%M"),
        ghost.end.format("%H:%M")
    );
    let text: String = label.chars().take(rect.width as usize).collect();
    let padded = format!("{:<width$}", text, width = rect.width as usize);
    frame
        .buffer_mut()
        .set_string(rect.x, rect.y, &padded, theme::current().ghost);
}

fn clamp_minutes(t: DateTime<Local>, date: NaiveDate) -> u32 {
    use chrono::Timelike;
    if t.date_naive() < date {
        0
    } else {
        t.hour() * 60 + t.minute()
    }
}

fn clamp_minutes_end(t: DateTime<Local>, date: NaiveDate) -> u32 {
    use chrono::Timelike;
    if t.date_naive() > date {
        DAY_MINUTES
    } else {
        t.hour() * 60 + t.minute()
    }
}

/// Map a minute span onto grid columns; at least one cell wide.
fn minutes_to_rect(start_min: u32, end_min: u32, grid: Rect, y: u16) -> Option<Rect> {
    if end_min <= start_min {
        return None;
    }
    let x0 = grid.x + (start_min * grid.width as u32 / DAY_MINUTES) as u16;
    let x1 = grid.x + (end_min * grid.width as u32 / DAY_MINUTES) as u16;
    let width = (x1.saturating_sub(x0)).max(1);
    let width = width.min(grid.x + grid.width - x0);
    if width == 0 {
        return None;
    }
    Some(Rect::new(x0, y, width, 1))
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
