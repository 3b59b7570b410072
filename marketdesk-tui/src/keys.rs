//! Keybinding definitions for the console.
//!
//! Only normal mode goes through [`map_key`]; text prompts consume raw keys.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    NextScreen,
    PrevScreen,
    SwitchScreen(usize),
    MoveUp,
    MoveDown,
    PrevPage,
    NextPage,
    GrowPageSize,
    ShrinkPageSize,
    ToggleSort,
    CycleStatus,
    ClearFilters,
    OpenSearch,
    Refresh,
    Open,
    Close,
    Primary,
    Delete,
    Confirm,
    SignOut,
}

pub fn map_key(event: KeyEvent) -> Option<Action> {
    let KeyEvent { code, modifiers, .. } = event;

    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') => Some(Action::Quit),
            KeyCode::Char('r') => Some(Action::Refresh),
            _ => None,
        };
    }

    match code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('/') => Some(Action::OpenSearch),
        KeyCode::Char('r') => Some(Action::Refresh),
        KeyCode::Char('s') => Some(Action::ToggleSort),
        KeyCode::Char('f') => Some(Action::CycleStatus),
        KeyCode::Char('c') => Some(Action::ClearFilters),
        KeyCode::Char('a') => Some(Action::Primary),
        KeyCode::Char('d') => Some(Action::Delete),
        KeyCode::Char('y') => Some(Action::Confirm),
        KeyCode::Char('L') => Some(Action::SignOut),
        KeyCode::Char('+') | KeyCode::Char('=') => Some(Action::GrowPageSize),
        KeyCode::Char('-') => Some(Action::ShrinkPageSize),
        KeyCode::Enter => Some(Action::Open),
        KeyCode::Esc => Some(Action::Close),
        KeyCode::Tab => Some(Action::NextScreen),
        KeyCode::BackTab => Some(Action::PrevScreen),
        KeyCode::Up | KeyCode::Char('k') => Some(Action::MoveUp),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::MoveDown),
        KeyCode::Left | KeyCode::Char('h') => Some(Action::PrevPage),
        KeyCode::Right | KeyCode::Char('l') => Some(Action::NextPage),
        KeyCode::Char(c @ '1'..='9') => {
            let idx = (c as u8 - b'1') as usize;
            Some(Action::SwitchScreen(idx))
        }
        _ => None,
    }
}
