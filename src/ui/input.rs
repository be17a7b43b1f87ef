/// Keyboard input.
///
/// Key events are read with crossterm and translated into [`Action`]s. The
/// same key means different things depending on what is on screen, so the
/// translation takes a [`KeyMode`]:
///
///   Menu: W/S/arrows move, digits jump (0 = last), Space/Enter/Y select, Q/Esc back
///   Game: WASD/arrows move, Q/Esc pause
///   Text: printable characters are typed, Enter submits, Esc cancels
///   AnyKey: every key press continues
///
/// Ctrl+C always interrupts.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use conmaze::domain::entity::MoveDir;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum KeyMode {
    Menu,
    Game,
    Text,
    AnyKey,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    Move(MoveDir),
    Select,
    Back,
    /// Menu entry by number, 1-based as shown on screen; 0 is the last entry.
    Jump(usize),
    Type(char),
    Erase,
    Interrupt,
}

/// Wait up to `timeout` for a key and translate it. `None` on timeout or
/// when the key means nothing in `mode`. A `None` timeout blocks.
pub fn read_action(mode: KeyMode, timeout: Option<Duration>) -> io::Result<Option<Action>> {
    if let Some(t) = timeout {
        if !event::poll(t)? {
            return Ok(None);
        }
    }
    match event::read()? {
        Event::Key(key) => Ok(translate(&key, mode)),
        _ => Ok(None),
    }
}

/// Drop everything typed so far (keys pressed during an animation).
pub fn flush_pending() -> io::Result<()> {
    while event::poll(Duration::ZERO)? {
        event::read()?;
    }
    Ok(())
}

pub fn translate(key: &KeyEvent, mode: KeyMode) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
    {
        return Some(Action::Interrupt);
    }

    match mode {
        KeyMode::AnyKey => Some(Action::Select),
        KeyMode::Text => match key.code {
            KeyCode::Enter => Some(Action::Select),
            KeyCode::Esc => Some(Action::Back),
            KeyCode::Backspace => Some(Action::Erase),
            KeyCode::Char(c) if !c.is_control() => Some(Action::Type(c)),
            _ => None,
        },
        KeyMode::Menu => match key.code {
            KeyCode::Up => Some(Action::Move(MoveDir::Up)),
            KeyCode::Down => Some(Action::Move(MoveDir::Down)),
            KeyCode::Enter => Some(Action::Select),
            KeyCode::Esc => Some(Action::Back),
            KeyCode::Char(c) => match c.to_ascii_lowercase() {
                'w' => Some(Action::Move(MoveDir::Up)),
                's' => Some(Action::Move(MoveDir::Down)),
                ' ' | 'y' => Some(Action::Select),
                'q' => Some(Action::Back),
                d @ '0'..='9' => d.to_digit(10).map(|n| Action::Jump(n as usize)),
                _ => None,
            },
            _ => None,
        },
        KeyMode::Game => match key.code {
            KeyCode::Up => Some(Action::Move(MoveDir::Up)),
            KeyCode::Down => Some(Action::Move(MoveDir::Down)),
            KeyCode::Left => Some(Action::Move(MoveDir::Left)),
            KeyCode::Right => Some(Action::Move(MoveDir::Right)),
            KeyCode::Esc => Some(Action::Back),
            KeyCode::Enter => Some(Action::Select),
            KeyCode::Char(c) => match c.to_ascii_lowercase() {
                'q' => Some(Action::Back),
                ' ' => Some(Action::Select),
                k => MoveDir::from_key(k).map(Action::Move),
            },
            _ => None,
        },
    }
}
