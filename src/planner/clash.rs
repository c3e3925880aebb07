use chrono::{DateTime, Local};

use super::event::PlanEvent;

/// One direction of a detected overlap between two events.
///
/// Every overlapping pair produces two records, (A,B) and (B,A), so that
/// "clashes for event X" is a simple linear scan. Both directions carry the
/// full overlap window. Callers that display pairs should dedupe with
/// [`unique_pairs`].
#[derive(Debug, Clone, PartialEq)]
pub struct Clash {
    pub event_id: String,
    pub clash_with_id: String,
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
    pub overlap_minutes: i64,
}

/// Closed-open interval intersection: touching endpoints do not overlap.
pub fn intervals_overlap(
    a_start: DateTime<Local>,
    a_end: DateTime<Local>,
    b_start: DateTime<Local>,
    b_end: DateTime<Local>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Pairwise scan of the whole list. O(n²), fine at personal scale.
pub fn detect_clashes(events: &[PlanEvent]) -> Vec<Clash> {
    let mut clashes = Vec::new();

    for i in 0..events.len() {
        for j in (i + 1)..events.len() {
            let a = &events[i];
            let b = &events[j];
            if !intervals_overlap(a.start, a.end, b.start, b.end) {
                continue;
            }

            let start = a.start.max(b.start);
            let end = a.end.min(b.end);
            let overlap_minutes = (end - start).num_minutes();

            clashes.push(Clash {
                event_id: a.id.clone(),
                clash_with_id: b.id.clone(),
                start,
                end,
                overlap_minutes,
            });
            clashes.push(Clash {
                event_id: b.id.clone(),
                clash_with_id: a.id.clone(),
                start,
                end,
                overlap_minutes,
            });
        }
    }

    clashes
}

/// Drop the reciprocal records so each unordered pair appears once,
/// in first-seen order.
pub fn unique_pairs(clashes: &[Clash]) -> Vec<&Clash> {
    let mut seen: Vec<(&str, &str)> = Vec::new();
    let mut unique = Vec::new();

    for c in clashes {
        let key = if c.event_id <= c.clash_with_id {
            (c.event_id.as_str(), c.clash_with_id.as_str())
        } else {
            (c.clash_with_id.as_str(), c.event_id.as_str())
        };
        if !seen.contains(&key) {
            seen.push(key);
            unique.push(c);
        }
    }

    unique
}
