use std::time::{Duration, Instant};

use chrono::{DateTime, Local, NaiveDate, Timelike};

use super::clash::intervals_overlap;
use super::event::{EventKind, PlanEvent};
use super::layout::{resolve_local, DAY_MINUTES};

/// Drag positions snap to this grid.
pub const SNAP_MINUTES: u32 = 10;

/// After a drop, grid/event clicks are ignored for this long so the release
/// half of the gesture cannot fire a click-create or click-open.
pub const CLICK_SUPPRESS: Duration = Duration::from_millis(200);

/// Snapped preview interval shown while dragging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ghost {
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
}

/// Pointer gesture state. A press enters `Pending`; leaving the press cell
/// promotes it to `Dragging`; release always resolves back to `Idle`.
#[derive(Debug, Clone)]
enum DragState {
    Idle,
    Pending {
        event_id: String,
        press_cell: (u16, u16),
        grab_offset: chrono::Duration,
        duration: chrono::Duration,
    },
    Dragging {
        event_id: String,
        grab_offset: chrono::Duration,
        duration: chrono::Duration,
        ghost: Option<Ghost>,
    },
}

/// What a pointer release amounts to.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    None,
    /// Press and release without crossing the drag threshold.
    Click { event_id: String },
    /// Finalize at the last snapped ghost interval.
    Drop {
        event_id: String,
        start: DateTime<Local>,
        end: DateTime<Local>,
    },
}

pub struct DragController {
    state: DragState,
    suppress_until: Option<Instant>,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new()
    }
}

impl DragController {
    pub fn new() -> Self {
        Self {
            state: DragState::Idle,
            suppress_until: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn dragged_event(&self) -> Option<&str> {
        match &self.state {
            DragState::Dragging { event_id, .. } => Some(event_id),
            _ => None,
        }
    }

    pub fn ghost(&self) -> Option<Ghost> {
        match &self.state {
            DragState::Dragging { ghost, .. } => *ghost,
            _ => None,
        }
    }

    /// Pointer press on an event block. `instant` is the timeline instant
    /// under the pointer; the grab offset keeps the grab point stable while
    /// the event moves.
    pub fn press(&mut self, event: &PlanEvent, cell: (u16, u16), instant: DateTime<Local>) {
        self.state = DragState::Pending {
            event_id: event.id.clone(),
            press_cell: cell,
            grab_offset: event.start - instant,
            duration: event.duration(),
        };
    }

    /// Pointer movement. `instant` is `None` while the pointer is off the
    /// day grid, in which case the previous ghost stays put.
    pub fn motion(&mut self, cell: (u16, u16), instant: Option<DateTime<Local>>) {
        if let DragState::Pending {
            event_id,
            press_cell,
            grab_offset,
            duration,
        } = &self.state
        {
            // One cell of travel in either axis distinguishes a drag from a
            // click (the cell is the terminal analogue of a pixel threshold).
            if cell == *press_cell {
                return;
            }
            self.state = DragState::Dragging {
                event_id: event_id.clone(),
                grab_offset: *grab_offset,
                duration: *duration,
                ghost: None,
            };
        }

        if let DragState::Dragging {
            grab_offset,
            duration,
            ghost,
            ..
        } = &mut self.state
        {
            if let Some(at) = instant {
                let start = snap_to_step(at + *grab_offset);
                *ghost = Some(Ghost {
                    start,
                    end: start + *duration,
                });
            }
        }
    }

    /// Pointer release: finalize the gesture. There is no cancel; a drag
    /// always drops at the last snapped position.
    pub fn release(&mut self, now: Instant) -> DragOutcome {
        let state = std::mem::replace(&mut self.state, DragState::Idle);
        match state {
            DragState::Idle => DragOutcome::None,
            DragState::Pending { event_id, .. } => DragOutcome::Click { event_id },
            DragState::Dragging { event_id, ghost, .. } => match ghost {
                Some(g) => {
                    self.suppress_until = Some(now + CLICK_SUPPRESS);
                    DragOutcome::Drop {
                        event_id,
                        start: g.start,
                        end: g.end,
                    }
                }
                None => DragOutcome::None,
            },
        }
    }

    pub fn clicks_suppressed(&self, now: Instant) -> bool {
        self.suppress_until.is_some_and(|t| now < t)
    }
}

/// Round to the nearest 10-minute boundary, carrying over midnight.
pub fn snap_to_step(dt: DateTime<Local>) -> DateTime<Local> {
    let step_secs = SNAP_MINUTES * 60;
    let secs = dt.num_seconds_from_midnight();
    let snapped = (secs + step_secs / 2) / step_secs * SNAP_MINUTES;
    at_day_minutes(dt.date_naive(), snapped)
}

/// Instant at `minutes` past local midnight of `date`; 1440 rolls over.
/// Times inside a DST gap resolve forward to the next valid minute.
pub fn at_day_minutes(date: NaiveDate, minutes: u32) -> DateTime<Local> {
    let (date, minutes) = if minutes >= DAY_MINUTES {
        (date.succ_opt().unwrap_or(date), minutes - DAY_MINUTES)
    } else {
        (date, minutes)
    };
    resolve_local(date.and_hms_opt(minutes / 60, minutes % 60, 0).expect("valid time"))
}

/// Commit a drop: relocate the moved event and, when it is a task, split
/// every task it now overlaps around the moved interval. Status events are
/// never split candidates. Returns false when the id is unknown.
pub fn apply_drop(
    events: &mut Vec<PlanEvent>,
    event_id: &str,
    new_start: DateTime<Local>,
    new_end: DateTime<Local>,
) -> bool {
    let Some(idx) = events.iter().position(|e| e.id == event_id) else {
        return false;
    };
    events[idx].start = new_start;
    events[idx].end = new_end;

    if events[idx].kind == EventKind::Task {
        split_colliding_tasks(events, event_id, new_start, new_end);
    }
    true
}

fn split_colliding_tasks(
    events: &mut Vec<PlanEvent>,
    moved_id: &str,
    t_start: DateTime<Local>,
    t_end: DateTime<Local>,
) {
    let mut created: Vec<PlanEvent> = Vec::new();
    let mut removed: Vec<String> = Vec::new();

    for ev in events.iter_mut() {
        if ev.id == moved_id || ev.kind != EventKind::Task {
            continue;
        }
        if !intervals_overlap(ev.start, ev.end, t_start, t_end) {
            continue;
        }

        let has_before = ev.start < t_start;
        let has_after = ev.end > t_end;

        match (has_before, has_after) {
            (true, true) => {
                // Middle covered: original keeps the head, a fresh task gets
                // the tail with its remaining duration intact.
                let remainder = ev.end - t_end;
                let mut tail = PlanEvent::new(ev.title.clone(), t_end, t_end + remainder);
                tail.kind = EventKind::Task;
                tail.color_id = ev.color_id;
                tail.note = ev.note.clone();
                created.push(tail);
                ev.end = t_start;
            }
            (true, false) => ev.end = t_start,
            (false, true) => {
                // Head covered: truncate from the front, keeping the record
                // (and its checklist) on the remainder.
                let remainder = ev.end - t_end;
                ev.start = t_end;
                ev.end = t_end + remainder;
            }
            (false, false) => removed.push(ev.id.clone()),
        }
    }

    events.retain(|e| !removed.contains(&e.id));
    events.extend(created);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::event::ChecklistItem;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 10, h, m, 0).unwrap()
    }

    fn task(id: &str, start: DateTime<Local>, end: DateTime<Local>) -> PlanEvent {
        let mut ev = PlanEvent::new(id, start, end);
        ev.id = id.to_string();
        ev.kind = EventKind::Task;
        ev
    }

    #[test]
    fn snap_rounds_to_nearest_ten_minutes() {
        assert_eq!(snap_to_step(at(9, 4)), at(9, 0));
        assert_eq!(snap_to_step(at(9, 5)), at(9, 10));
        assert_eq!(snap_to_step(at(9, 57)), at(10, 0));
        assert_eq!(snap_to_step(at(9, 20)), at(9, 20));
    }

    #[test]
    fn snap_carries_over_midnight() {
        let snapped = snap_to_step(at(23, 58));
        assert_eq!(snapped, Local.with_ymd_and_hms(2025, 6, 11, 0, 0, 0).unwrap());
    }

    #[test]
    fn spring_forward_gap_resolves_to_the_next_valid_minute() {
        std::env::set_var("TZ", "America/New_York");
        // 02:30 does not exist on this date; it resolves forward to 03:00.
        let date = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();
        let t = at_day_minutes(date, 150);
        assert_eq!(t.naive_local(), date.and_hms_opt(3, 0, 0).unwrap());

        // Day bounds on the transition day stay well formed.
        let (start, end) = crate::planner::layout::day_bounds(date);
        assert!(start < end);
        assert_eq!(start.date_naive(), date);
    }

    #[test]
    fn release_without_movement_is_a_click() {
        let ev = task("t", at(9, 0), at(10, 0));
        let mut ctl = DragController::new();
        ctl.press(&ev, (10, 5), at(9, 15));
        ctl.motion((10, 5), Some(at(9, 15)));
        assert!(!ctl.is_dragging());

        let outcome = ctl.release(Instant::now());
        assert_eq!(outcome, DragOutcome::Click { event_id: "t".into() });
        assert!(!ctl.clicks_suppressed(Instant::now()));
    }

    #[test]
    fn drag_snaps_and_preserves_duration() {
        // 90-minute event grabbed 15 minutes in.
        let ev = task("t", at(9, 0), at(10, 30));
        let mut ctl = DragController::new();
        ctl.press(&ev, (10, 5), at(9, 15));

        ctl.motion((14, 6), Some(at(13, 2)));
        assert!(ctl.is_dragging());
        let ghost = ctl.ghost().unwrap();
        // 13:02 - 15min grab offset = 12:47, snapped to 12:50.
        assert_eq!(ghost.start, at(12, 50));
        assert_eq!(ghost.end - ghost.start, ev.duration());
        assert_eq!(ghost.start.minute() % SNAP_MINUTES, 0);

        let now = Instant::now();
        match ctl.release(now) {
            DragOutcome::Drop { event_id, start, end } => {
                assert_eq!(event_id, "t");
                assert_eq!(start, at(12, 50));
                assert_eq!(end, at(14, 20));
            }
            other => panic!("expected drop, got {other:?}"),
        }
        assert!(ctl.clicks_suppressed(now));
        assert!(!ctl.clicks_suppressed(now + CLICK_SUPPRESS));
    }

    #[test]
    fn ghost_holds_position_while_pointer_is_off_grid() {
        let ev = task("t", at(9, 0), at(10, 0));
        let mut ctl = DragController::new();
        ctl.press(&ev, (10, 5), at(9, 0));
        ctl.motion((12, 6), Some(at(11, 0)));
        let before = ctl.ghost().unwrap();
        ctl.motion((12, 0), None);
        assert_eq!(ctl.ghost().unwrap(), before);
    }

    #[test]
    fn drop_splits_a_task_covered_through_the_middle() {
        // U [9:00,12:00), T dropped onto [10:00,11:00).
        let mut events = vec![task("u", at(9, 0), at(12, 0)), task("t", at(14, 0), at(15, 0))];
        assert!(apply_drop(&mut events, "t", at(10, 0), at(11, 0)));

        let u_head = events.iter().find(|e| e.id == "u").unwrap();
        assert_eq!((u_head.start, u_head.end), (at(9, 0), at(10, 0)));

        let tail = events
            .iter()
            .find(|e| e.id != "u" && e.id != "t")
            .expect("tail segment created");
        assert_eq!((tail.start, tail.end), (at(11, 0), at(12, 0)));
        assert_eq!(tail.kind, EventKind::Task);

        // Head + tail + removed overlap add up to U's original 3 hours.
        let total = (u_head.end - u_head.start) + (tail.end - tail.start) + (at(11, 0) - at(10, 0));
        assert_eq!(total.num_minutes(), 180);
    }

    #[test]
    fn fully_covered_task_is_removed() {
        let mut events = vec![task("u", at(10, 0), at(10, 30)), task("t", at(14, 0), at(15, 0))];
        apply_drop(&mut events, "t", at(9, 30), at(11, 0));
        assert!(events.iter().all(|e| e.id != "u"));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn front_truncation_keeps_the_record_and_checklist() {
        let mut u = task("u", at(9, 0), at(11, 0));
        u.checklist = Some(vec![ChecklistItem::new("book hotel")]);
        let mut events = vec![u, task("t", at(14, 0), at(15, 0))];

        apply_drop(&mut events, "t", at(8, 30), at(10, 0));
        let u = events.iter().find(|e| e.id == "u").unwrap();
        assert_eq!((u.start, u.end), (at(10, 0), at(11, 0)));
        assert!(u.checklist.is_some());
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn status_and_plain_events_are_not_split() {
        let mut status = PlanEvent::new("s", at(9, 0), at(12, 0));
        status.id = "s".into();
        status.kind = EventKind::Status;
        let mut plain = PlanEvent::new("p", at(9, 0), at(12, 0));
        plain.id = "p".into();

        let mut events = vec![status, plain, task("t", at(14, 0), at(15, 0))];
        apply_drop(&mut events, "t", at(10, 0), at(11, 0));

        assert_eq!(events.len(), 3);
        let s = events.iter().find(|e| e.id == "s").unwrap();
        let p = events.iter().find(|e| e.id == "p").unwrap();
        assert_eq!((s.start, s.end), (at(9, 0), at(12, 0)));
        assert_eq!((p.start, p.end), (at(9, 0), at(12, 0)));
    }

    #[test]
    fn non_task_mover_relocates_without_splitting() {
        let mut events = vec![
            PlanEvent::new("m", at(14, 0), at(15, 0)),
            task("u", at(9, 0), at(12, 0)),
        ];
        events[0].id = "m".into();
        apply_drop(&mut events, "m", at(10, 0), at(11, 0));

        let u = events.iter().find(|e| e.id == "u").unwrap();
        assert_eq!((u.start, u.end), (at(9, 0), at(12, 0)));
        let m = events.iter().find(|e| e.id == "m").unwrap();
        assert_eq!((m.start, m.end), (at(10, 0), at(11, 0)));
    }

    #[test]
    fn drop_onto_two_tasks_splits_both() {
        let mut events = vec![
            task("u1", at(9, 0), at(10, 30)),
            task("u2", at(10, 30), at(12, 0)),
            task("t", at(14, 0), at(15, 0)),
        ];
        apply_drop(&mut events, "t", at(10, 0), at(11, 0));

        let u1 = events.iter().find(|e| e.id == "u1").unwrap();
        assert_eq!((u1.start, u1.end), (at(9, 0), at(10, 0)));
        let u2 = events.iter().find(|e| e.id == "u2").unwrap();
        assert_eq!((u2.start, u2.end), (at(11, 0), at(12, 0)));
    }
}
