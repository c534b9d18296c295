use crate::round::{Mode, Player};
use crate::snake::Direction::{self, *};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Steer(Player, Direction),
    Pause,
    ToggleDebug,
    Quit,
}

impl Command {
    /// In single player mode both key sets steer player one.
    pub fn from_key_event(ev: &KeyEvent, mode: Mode) -> Option<Command> {
        if is_quit(ev) {
            return Some(Command::Quit);
        }

        let wasd_player = match mode {
            Mode::Single => Player::One,
            Mode::Dual => Player::Two,
        };

        let cmd = match ev.code {
            KeyCode::Up => Command::Steer(Player::One, Up),
            KeyCode::Left => Command::Steer(Player::One, Left),
            KeyCode::Down => Command::Steer(Player::One, Down),
            KeyCode::Right => Command::Steer(Player::One, Right),
            KeyCode::Char('w') => Command::Steer(wasd_player, Up),
            KeyCode::Char('a') => Command::Steer(wasd_player, Left),
            KeyCode::Char('s') => Command::Steer(wasd_player, Down),
            KeyCode::Char('d') => Command::Steer(wasd_player, Right),
            KeyCode::Esc => Command::Pause,
            KeyCode::Tab => Command::ToggleDebug,
            _ => return None,
        };

        Some(cmd)
    }
}

pub fn is_quit(ev: &KeyEvent) -> bool {
    matches!(ev, KeyEvent { code: KeyCode::Char('c'), modifiers: KeyModifiers::CONTROL })
        || matches!(ev.code, KeyCode::Char('q'))
}
