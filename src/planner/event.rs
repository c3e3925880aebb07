use chrono::{DateTime, Local};
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum accepted title length (characters).
pub const MAX_TITLE_LEN: usize = 50;

/// The event color palette. `color_id` indexes into this.
pub const PALETTE: [Color; 8] = [
    Color::Rgb(0x37, 0x7e, 0xb8), // blue
    Color::Rgb(0xff, 0x7f, 0x00), // orange
    Color::Rgb(0xe4, 0x1a, 0x1c), // red
    Color::Rgb(0x4d, 0xaf, 0x4a), // green
    Color::Rgb(0x98, 0x4e, 0xa3), // purple
    Color::Rgb(0xa6, 0x56, 0x28), // brown
    Color::Rgb(0xf7, 0x81, 0xbf), // pink
    Color::Rgb(0x99, 0x99, 0x99), // grey
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    #[default]
    Event,
    Status,
    Task,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub text: String,
    pub completed: bool,
}

impl ChecklistItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            completed: false,
        }
    }
}

/// A time-bound planner entry. Field names on the wire match the persisted
/// JSON document (`colorId`, `type`), so pre-existing data files load as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEvent {
    pub id: String,
    pub title: String,
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
    #[serde(rename = "colorId", default)]
    pub color_id: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checklist: Option<Vec<ChecklistItem>>,
}

impl PlanEvent {
    pub fn new(title: impl Into<String>, start: DateTime<Local>, end: DateTime<Local>) -> Self {
        let title: String = title.into().chars().take(MAX_TITLE_LEN).collect();
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            start,
            end,
            color_id: 0,
            note: None,
            kind: EventKind::Event,
            checklist: None,
        }
    }

    pub fn color(&self) -> Color {
        PALETTE[self.color_id as usize % PALETTE.len()]
    }

    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }

    pub fn duration_display(&self) -> String {
        format!("{} - {}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }

    /// Toggle the checklist item at `idx`. No-op for non-task events or an
    /// out-of-range index.
    pub fn toggle_checklist_item(&mut self, idx: usize) {
        if self.kind != EventKind::Task {
            return;
        }
        if let Some(items) = self.checklist.as_mut() {
            if let Some(item) = items.get_mut(idx) {
                item.completed = !item.completed;
            }
        }
    }
}
