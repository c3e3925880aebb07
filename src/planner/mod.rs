pub mod clash;
pub mod drag;
pub mod event;
pub mod layout;
pub mod recur;
pub mod store;

pub use clash::Clash;
pub use drag::DragController;
pub use event::{ChecklistItem, EventKind, PlanEvent};
pub use store::EventStore;
