use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike};

use super::clash::intervals_overlap;
use super::event::{EventKind, PlanEvent};

/// Minutes in a rendered day row.
pub const DAY_MINUTES: u32 = 1440;

/// An event's placement within one day row, in minutes from midnight.
#[derive(Debug, Clone, PartialEq)]
pub struct DayBlock {
    pub event_id: String,
    /// Display start, clamped to the day.
    pub start_min: u32,
    /// Display end, clamped to the day; `DAY_MINUTES` means "runs to midnight".
    pub end_min: u32,
    /// Stacking position within the block's cluster (timed events) or the
    /// lane index (status events).
    pub slot: usize,
    /// True when the block's cluster holds more than one member.
    pub conflicting: bool,
}

/// Layout result for one visible day: timed blocks with stacking slots and
/// status events packed into lanes.
#[derive(Debug, Default)]
pub struct DayLayout {
    pub blocks: Vec<DayBlock>,
    pub status_lanes: Vec<Vec<DayBlock>>,
}

impl DayLayout {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.status_lanes.is_empty()
    }

    /// Highest stacking slot in use by timed blocks.
    pub fn max_slot(&self) -> usize {
        self.blocks.iter().map(|b| b.slot).max().unwrap_or(0)
    }
}

/// Resolve a wall-clock time to an instant. Ambiguous times (DST fall-back)
/// take the earlier instant; times inside a spring-forward gap advance to
/// the first valid minute after it.
pub(crate) fn resolve_local(naive: NaiveDateTime) -> DateTime<Local> {
    let mut probe = naive;
    for _ in 0..DAY_MINUTES {
        if let Some(t) = Local.from_local_datetime(&probe).earliest() {
            return t;
        }
        probe += chrono::Duration::minutes(1);
    }
    Local.from_utc_datetime(&naive)
}

pub fn day_bounds(date: NaiveDate) -> (DateTime<Local>, DateTime<Local>) {
    let start = resolve_local(date.and_hms_opt(0, 0, 0).expect("valid time"));
    let end = resolve_local(
        date.succ_opt()
            .unwrap_or(date)
            .and_hms_opt(0, 0, 0)
            .expect("valid time"),
    );
    (start, end)
}

/// Compute the stacked layout for one day.
///
/// Timed events overlapping the day are clamped to it, sorted by clamped
/// start, and greedily clustered: an event joins the open cluster when its
/// start precedes the cluster's running end, which then extends to the max
/// of the two ends. Members get slot indices in sort order, and clusters
/// with more than one member are flagged conflicting. Status events go
/// through first-fit lane packing instead and never conflict.
pub fn lay_out_day(events: &[PlanEvent], date: NaiveDate) -> DayLayout {
    let (day_start, day_end) = day_bounds(date);

    let mut timed: Vec<DayBlock> = Vec::new();
    let mut status: Vec<DayBlock> = Vec::new();

    for ev in events {
        if !intervals_overlap(ev.start, ev.end, day_start, day_end) {
            continue;
        }
        let block = DayBlock {
            event_id: ev.id.clone(),
            start_min: clamp_start(ev.start, day_start),
            end_min: clamp_end(ev.end, day_start, day_end),
            slot: 0,
            conflicting: false,
        };
        if ev.kind == EventKind::Status {
            status.push(block);
        } else {
            timed.push(block);
        }
    }

    timed.sort_by_key(|b| (b.start_min, b.end_min));
    status.sort_by_key(|b| (b.start_min, b.end_min));

    assign_cluster_slots(&mut timed);

    DayLayout {
        blocks: timed,
        status_lanes: pack_lanes(status),
    }
}

fn clamp_start(start: DateTime<Local>, day_start: DateTime<Local>) -> u32 {
    if start <= day_start {
        0
    } else {
        start.hour() * 60 + start.minute()
    }
}

fn clamp_end(end: DateTime<Local>, day_start: DateTime<Local>, day_end: DateTime<Local>) -> u32 {
    if end >= day_end {
        // Ends at or past the next midnight: render to the full mark rather
        // than collapsing to a zero-width block at minute 0.
        DAY_MINUTES
    } else if end <= day_start {
        0
    } else {
        end.hour() * 60 + end.minute()
    }
}

fn assign_cluster_slots(blocks: &mut [DayBlock]) {
    let mut i = 0;
    while i < blocks.len() {
        // Grow the cluster while the next block starts before the running end.
        let mut cluster_end = blocks[i].end_min;
        let mut j = i + 1;
        while j < blocks.len() && blocks[j].start_min < cluster_end {
            cluster_end = cluster_end.max(blocks[j].end_min);
            j += 1;
        }

        let conflicting = j - i > 1;
        for (slot, block) in blocks[i..j].iter_mut().enumerate() {
            block.slot = slot;
            block.conflicting = conflicting;
        }
        i = j;
    }
}

fn pack_lanes(blocks: Vec<DayBlock>) -> Vec<Vec<DayBlock>> {
    let mut lanes: Vec<Vec<DayBlock>> = Vec::new();

    'next: for mut block in blocks {
        for (lane_idx, lane) in lanes.iter_mut().enumerate() {
            let free = lane
                .iter()
                .all(|b| block.start_min >= b.end_min || block.end_min <= b.start_min);
            if free {
                block.slot = lane_idx;
                lane.push(block);
                continue 'next;
            }
        }
        block.slot = lanes.len();
        lanes.push(vec![block]);
    }

    lanes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    fn event(id: &str, sh: u32, sm: u32, eh: u32, em: u32) -> PlanEvent {
        let mut ev = PlanEvent::new(
            id,
            Local.with_ymd_and_hms(2025, 6, 10, sh, sm, 0).unwrap(),
            Local.with_ymd_and_hms(2025, 6, 10, eh, em, 0).unwrap(),
        );
        ev.id = id.to_string();
        ev
    }

    fn status(id: &str, sh: u32, sm: u32, eh: u32, em: u32) -> PlanEvent {
        let mut ev = event(id, sh, sm, eh, em);
        ev.kind = EventKind::Status;
        ev
    }

    #[test]
    fn clusters_and_slots_follow_sort_order() {
        // [9,10) and [9:30,11) share a cluster; [12,13) stands alone.
        let events = vec![
            event("a", 9, 0, 10, 0),
            event("b", 9, 30, 11, 0),
            event("c", 12, 0, 13, 0),
        ];
        let layout = lay_out_day(&events, day());
        assert_eq!(layout.blocks.len(), 3);

        let a = &layout.blocks[0];
        let b = &layout.blocks[1];
        let c = &layout.blocks[2];
        assert_eq!((a.slot, a.conflicting), (0, true));
        assert_eq!((b.slot, b.conflicting), (1, true));
        assert_eq!((c.slot, c.conflicting), (0, false));
    }

    #[test]
    fn chained_overlap_extends_the_cluster() {
        // b overlaps a, c overlaps b but not a: still one cluster of three.
        let events = vec![
            event("a", 9, 0, 10, 0),
            event("b", 9, 30, 11, 0),
            event("c", 10, 30, 12, 0),
        ];
        let layout = lay_out_day(&events, day());
        assert_eq!(layout.max_slot(), 2);
        assert!(layout.blocks.iter().all(|b| b.conflicting));
    }

    #[test]
    fn multi_day_event_is_clamped_to_the_row() {
        let mut ev = event("span", 22, 0, 23, 0);
        ev.end = Local.with_ymd_and_hms(2025, 6, 12, 8, 0, 0).unwrap();

        let layout = lay_out_day(std::slice::from_ref(&ev), day());
        assert_eq!(layout.blocks[0].start_min, 22 * 60);
        assert_eq!(layout.blocks[0].end_min, DAY_MINUTES);

        // On the middle day it fills the whole row.
        let next = lay_out_day(std::slice::from_ref(&ev), day().succ_opt().unwrap());
        assert_eq!(next.blocks[0].start_min, 0);
        assert_eq!(next.blocks[0].end_min, DAY_MINUTES);
    }

    #[test]
    fn event_ending_at_midnight_reaches_the_full_mark() {
        let mut ev = event("late", 23, 0, 23, 30);
        ev.end = Local.with_ymd_and_hms(2025, 6, 11, 0, 0, 0).unwrap();
        let layout = lay_out_day(std::slice::from_ref(&ev), day());
        assert_eq!(layout.blocks[0].end_min, DAY_MINUTES);
        // And it no longer appears on the following day.
        let next = lay_out_day(std::slice::from_ref(&ev), day().succ_opt().unwrap());
        assert!(next.is_empty());
    }

    #[test]
    fn status_events_pack_into_first_free_lane() {
        let events = vec![
            status("s1", 9, 0, 11, 0),
            status("s2", 10, 0, 12, 0),
            status("s3", 11, 0, 13, 0),
        ];
        let layout = lay_out_day(&events, day());
        assert!(layout.blocks.is_empty());
        assert_eq!(layout.status_lanes.len(), 2);
        // s3 touches s1's end, so it reuses lane 0.
        assert_eq!(layout.status_lanes[0][0].event_id, "s1");
        assert_eq!(layout.status_lanes[0][1].event_id, "s3");
        assert_eq!(layout.status_lanes[1][0].event_id, "s2");
    }

    #[test]
    fn status_events_do_not_join_timed_clusters() {
        let events = vec![event("a", 9, 0, 10, 0), status("s", 9, 0, 10, 0)];
        let layout = lay_out_day(&events, day());
        assert_eq!(layout.blocks.len(), 1);
        assert!(!layout.blocks[0].conflicting);
        assert_eq!(layout.status_lanes.len(), 1);
    }

    #[test]
    fn days_outside_the_event_are_empty() {
        let events = vec![event("a", 9, 0, 10, 0)];
        let layout = lay_out_day(&events, day().pred_opt().unwrap());
        assert!(layout.is_empty());
    }
}
