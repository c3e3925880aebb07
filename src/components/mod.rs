pub mod clash_banner;
pub mod detail;
pub mod event_form;
pub mod status_bar;
pub mod timeline;

pub use clash_banner::ClashBanner;
pub use event_form::EventForm;
pub use status_bar::StatusBar;
pub use timeline::Timeline;
