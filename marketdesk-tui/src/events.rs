//! Event types for the console.

use crossterm::event::KeyEvent;

#[derive(Debug, Clone)]
pub enum TuiEvent {
    Input(KeyEvent),
    Resize(u16, u16),
    /// A background request finished; screens have outcomes to drain.
    Settled,
    /// Login attempt finished. `Err` carries the text to surface.
    LoginFinished(Result<(), String>),
}
