use std::time::Duration;

use crossterm::event::{self, Event};

/// Poll for the next terminal event (key, mouse, resize) within `timeout`.
pub fn poll_event(timeout: Duration) -> color_eyre::Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}
