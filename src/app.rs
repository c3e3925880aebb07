use std::time::{Duration, Instant};

use chrono::{DateTime, Local, NaiveDate};
use log::{info, warn};

use crate::components::event_form::EventFormState;
use crate::planner::{
    clash::{detect_clashes, unique_pairs},
    drag::apply_drop,
    recur::{add_months, expand, Repeat},
    store::{export_events, import_events},
    Clash, DragController, EventStore, PlanEvent,
};

/// Days shown per timeline page (roughly two months).
pub const RANGE_DAYS: i64 = 60;

/// Debounce window between a mutation and the save that persists it.
const SAVE_DEBOUNCE: Duration = Duration::from_secs(1);

/// How long a clash/today highlight stays on screen.
const HIGHLIGHT_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    Form,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HighlightKind {
    Clash,
    Today,
}

/// A transient emphasis window on the timeline, cleared after a few seconds.
#[derive(Debug, Clone)]
pub struct Highlight {
    pub kind: HighlightKind,
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
    pub until: Instant,
}

pub struct App {
    pub running: bool,
    pub input_mode: InputMode,
    pub events: Vec<PlanEvent>,
    pub clashes: Vec<Clash>,
    pub range_start: NaiveDate,
    pub today: NaiveDate,
    /// Index of the first visible day row within the range.
    pub scroll_day: usize,
    pub drag: DragController,
    pub form: Option<EventFormState>,
    /// Id of the event shown in the detail popup.
    pub detail: Option<String>,
    pub highlight: Option<Highlight>,
    pub status_message: Option<String>,
    pub show_help: bool,
    clash_cursor: usize,
    /// Saving stays off until the initial load has happened, so a failed
    /// startup cannot clobber the persisted document with an empty list.
    loaded: bool,
    dirty_since: Option<Instant>,
    store: EventStore,
}

impl App {
    pub fn new(store: EventStore) -> Self {
        let events = store.load();
        let today = Local::now().date_naive();
        let range_start = anchor_date(&events, today);
        let clashes = detect_clashes(&events);
        info!("loaded {} events, {} clash records", events.len(), clashes.len());

        Self {
            running: true,
            input_mode: InputMode::Normal,
            events,
            clashes,
            range_start,
            today,
            scroll_day: 0,
            drag: DragController::new(),
            form: None,
            detail: None,
            highlight: None,
            status_message: None,
            show_help: false,
            clash_cursor: 0,
            loaded: true,
            dirty_since: None,
            store,
        }
    }

    pub fn event_by_id(&self, id: &str) -> Option<&PlanEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn day_at(&self, index: usize) -> NaiveDate {
        self.range_start + chrono::Duration::days(index as i64)
    }

    // ── Mutations ──

    pub fn add_event(&mut self, event: PlanEvent, repeat: Repeat, count: usize) {
        let series = expand(event, repeat, count);
        let n = series.len();
        self.events.extend(series);
        self.after_change();
        self.status_message = Some(if n == 1 {
            "Event added".to_string()
        } else {
            format!("{n} events added")
        });
    }

    pub fn update_event(&mut self, updated: PlanEvent) {
        if let Some(ev) = self.events.iter_mut().find(|e| e.id == updated.id) {
            *ev = updated;
            self.after_change();
            self.status_message = Some("Event updated".to_string());
        }
    }

    pub fn delete_event(&mut self, id: &str) {
        let before = self.events.len();
        self.events.retain(|e| e.id != id);
        if self.events.len() != before {
            self.detail = None;
            self.after_change();
            self.status_message = Some("Event deleted".to_string());
        }
    }

    pub fn toggle_checklist_item(&mut self, id: &str, idx: usize) {
        if let Some(ev) = self.events.iter_mut().find(|e| e.id == id) {
            ev.toggle_checklist_item(idx);
            self.after_change();
        }
    }

    pub fn commit_drop(&mut self, id: &str, start: DateTime<Local>, end: DateTime<Local>) {
        if apply_drop(&mut self.events, id, start, end) {
            self.after_change();
            self.status_message = Some(format!("Moved to {}", start.format("%b %d %H:%M")));
        }
    }

    fn after_change(&mut self) {
        self.clashes = detect_clashes(&self.events);
        self.mark_dirty();
    }

    /// Arm (or re-arm) the debounced save.
    fn mark_dirty(&mut self) {
        if self.loaded {
            self.dirty_since = Some(Instant::now());
        }
    }

    /// Housekeeping between repaints: flush a due save, expire the highlight.
    pub fn tick(&mut self, now: Instant) {
        if let Some(since) = self.dirty_since {
            if now.duration_since(since) >= SAVE_DEBOUNCE {
                self.flush_save();
            }
        }
        if let Some(h) = &self.highlight {
            if now >= h.until {
                self.highlight = None;
            }
        }
    }

    pub fn flush_save(&mut self) {
        if self.dirty_since.take().is_none() {
            return;
        }
        if let Err(err) = self.store.save(&self.events) {
            warn!("failed to save events: {err}");
        }
    }

    pub fn has_pending_save(&self) -> bool {
        self.dirty_since.is_some()
    }

    // ── Navigation ──

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_day = self.scroll_day.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        let max = (RANGE_DAYS as usize).saturating_sub(1);
        self.scroll_day = (self.scroll_day + lines).min(max);
    }

    pub fn page_prev(&mut self) {
        self.range_start = add_months(self.range_start, -2);
        self.scroll_day = 0;
    }

    pub fn page_next(&mut self) {
        self.range_start = add_months(self.range_start, 2);
        self.scroll_day = 0;
    }

    pub fn go_to_today(&mut self) {
        self.today = Local::now().date_naive();
        self.scroll_to(self.today);
        let (start, end) = crate::planner::layout::day_bounds(self.today);
        self.highlight = Some(Highlight {
            kind: HighlightKind::Today,
            start,
            end,
            until: Instant::now() + HIGHLIGHT_TTL,
        });
    }

    /// Jump to the next unordered clash pair and highlight its window.
    pub fn jump_next_clash(&mut self) {
        let pairs = unique_pairs(&self.clashes);
        if pairs.is_empty() {
            self.status_message = Some("No clashes".to_string());
            return;
        }
        let clash = pairs[self.clash_cursor % pairs.len()].clone();
        self.clash_cursor = (self.clash_cursor + 1) % pairs.len();

        self.scroll_to(clash.start.date_naive());
        self.highlight = Some(Highlight {
            kind: HighlightKind::Clash,
            start: clash.start,
            end: clash.end,
            until: Instant::now() + HIGHLIGHT_TTL,
        });
    }

    fn scroll_to(&mut self, date: NaiveDate) {
        let offset = (date - self.range_start).num_days();
        if !(0..RANGE_DAYS).contains(&offset) {
            self.range_start = date;
            self.scroll_day = 0;
        } else {
            self.scroll_day = offset as usize;
        }
    }

    // ── Import / export ──

    pub fn export_path(&self) -> std::path::PathBuf {
        self.store
            .path()
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_default()
            .join("tplanner-export.json")
    }

    pub fn export(&mut self) {
        let path = self.export_path();
        match export_events(&path, &self.events) {
            Ok(()) => self.status_message = Some(format!("Exported to {}", path.display())),
            Err(err) => {
                warn!("export failed: {err}");
                self.status_message = Some("Export failed".to_string());
            }
        }
    }

    pub fn import(&mut self) {
        let path = self.export_path();
        match import_events(&path) {
            Ok(events) => {
                self.status_message = Some(format!("Imported {} events", events.len()));
                self.events = events;
                self.range_start = anchor_date(&self.events, self.today);
                self.scroll_day = 0;
                self.after_change();
            }
            Err(err) => {
                warn!("import from {} failed: {err}", path.display());
                self.status_message = Some("Import failed".to_string());
            }
        }
    }
}

/// First day of the visible range: the earliest event's day, or today when
/// the list is empty.
fn anchor_date(events: &[PlanEvent], today: NaiveDate) -> NaiveDate {
    events
        .iter()
        .map(|e| e.start.date_naive())
        .min()
        .unwrap_or(today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn app_with(events: Vec<PlanEvent>) -> (App, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = EventStore::open(dir.path().join("data.json")).unwrap();
        store.save(&events).unwrap();
        (App::new(store), dir)
    }

    fn at(d: u32, h: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, d, h, 0, 0).unwrap()
    }

    #[test]
    fn range_anchors_to_earliest_event() {
        let mut a = PlanEvent::new("a", at(20, 9), at(20, 10));
        a.id = "a".into();
        let (app, _dir) = app_with(vec![a]);
        assert_eq!(app.range_start, NaiveDate::from_ymd_opt(2025, 6, 20).unwrap());
    }

    #[test]
    fn paging_moves_two_months() {
        let (mut app, _dir) = app_with(vec![]);
        let start = app.range_start;
        app.page_next();
        assert_eq!(app.range_start, add_months(start, 2));
        app.page_prev();
        app.page_prev();
        assert_eq!(app.range_start, add_months(start, -2));
    }

    #[test]
    fn mutations_rearm_the_debounce_and_recompute_clashes() {
        let (mut app, _dir) = app_with(vec![]);
        assert!(!app.has_pending_save());

        app.add_event(PlanEvent::new("a", at(10, 9), at(10, 11)), Repeat::None, 1);
        app.add_event(PlanEvent::new("b", at(10, 10), at(10, 12)), Repeat::None, 1);
        assert!(app.has_pending_save());
        assert_eq!(app.clashes.len(), 2);

        // Not yet due: nothing flushes.
        app.tick(Instant::now());
        assert!(app.has_pending_save());

        app.tick(Instant::now() + SAVE_DEBOUNCE);
        assert!(!app.has_pending_save());
    }

    #[test]
    fn delete_clears_detail_and_clashes() {
        let (mut app, _dir) = app_with(vec![]);
        app.add_event(PlanEvent::new("a", at(10, 9), at(10, 11)), Repeat::None, 1);
        app.add_event(PlanEvent::new("b", at(10, 10), at(10, 12)), Repeat::None, 1);
        let id = app.events[0].id.clone();
        app.detail = Some(id.clone());

        app.delete_event(&id);
        assert_eq!(app.events.len(), 1);
        assert!(app.detail.is_none());
        assert!(app.clashes.is_empty());
    }

    #[test]
    fn recurrence_adds_a_series() {
        let (mut app, _dir) = app_with(vec![]);
        app.add_event(PlanEvent::new("gym", at(10, 7), at(10, 8)), Repeat::Daily, 5);
        assert_eq!(app.events.len(), 5);
    }

    #[test]
    fn drop_commit_persists_through_the_debounce() {
        let (mut app, _dir) = app_with(vec![]);
        app.add_event(PlanEvent::new("a", at(10, 9), at(10, 10)), Repeat::None, 1);
        let id = app.events[0].id.clone();

        app.commit_drop(&id, at(12, 9), at(12, 10));
        app.tick(Instant::now() + SAVE_DEBOUNCE);

        let reloaded = app.store.load();
        assert_eq!(reloaded[0].start, at(12, 9));
    }
}
