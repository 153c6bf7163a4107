use crate::error::Result;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind, MouseEvent};
use std::time::Duration;

/// Also the pace at which background progress reaches the screen.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// No input this interval; background updates are drained and the screen redrawn.
    Tick,
}

impl From<Event> for AppEvent {
    fn from(event: Event) -> Self {
        match event {
            // Windows terminals also report key releases.
            Event::Key(key) if key.kind == KeyEventKind::Press => Self::Key(key),
            Event::Mouse(mouse) => Self::Mouse(mouse),
            // The next draw picks up the new size.
            Event::Resize(_, _) => Self::Tick,
            _ => Self::Tick,
        }
    }
}

pub struct EventHandler {
    poll_interval: Duration,
}

impl EventHandler {
    pub fn new() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
        }
    }

    pub fn next_event(&self) -> Result<AppEvent> {
        if event::poll(self.poll_interval)? {
            Ok(event::read()?.into())
        } else {
            Ok(AppEvent::Tick)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn key(kind: KeyEventKind) -> KeyEvent {
        KeyEvent::new_with_kind(KeyCode::Char('e'), KeyModifiers::NONE, kind)
    }

    #[test]
    fn only_key_presses_reach_the_app() {
        assert_eq!(
            AppEvent::from(Event::Key(key(KeyEventKind::Press))),
            AppEvent::Key(key(KeyEventKind::Press))
        );
        assert_eq!(AppEvent::from(Event::Key(key(KeyEventKind::Release))), AppEvent::Tick);
    }

    #[test]
    fn resizing_and_focus_changes_only_redraw() {
        assert_eq!(AppEvent::from(Event::Resize(80, 24)), AppEvent::Tick);
        assert_eq!(AppEvent::from(Event::FocusGained), AppEvent::Tick);
    }
}
