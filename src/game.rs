use std::{thread::sleep, time::{Duration, Instant}};

use crate::config::Settings;
use crate::input::{is_quit, Command};
use crate::round::{Bounds, Intents, Mode, Player, Round, RoundConfig, RoundState};
use crate::term::TermManager;

use color_eyre::eyre::Context as _;
use crossterm::event::KeyCode;
use tracing::{info, warn};

/// How long to wait before retrying when the terminal is too small to play.
const SKIPPED_TICK_DELAY: Duration = Duration::from_millis(100);

const MENU_ENTRIES: [(Mode, &str); 2] = [(Mode::Single, "1 player"), (Mode::Dual, "2 players")];

/// How a played round handed control back to the menu.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlayOutcome {
    Finished { state: RoundState, scores: Vec<u32> },
    /// The terminal was too small to start; back to the menu.
    Skipped,
    Quit,
}

pub struct SnakeGame {
    settings: Settings,
    term: TermManager,
    paused: bool,
    debug: bool,
}

impl SnakeGame {
    pub fn new(settings: Settings) -> color_eyre::Result<Self> {
        let term = TermManager::new().wrap_err("Failed to read terminal size")?;
        Ok(SnakeGame { settings, term, paused: false, debug: false })
    }

    /// Menu, round, outcome screen, repeat until the player quits.
    pub fn run(&mut self) -> color_eyre::Result<()> {
        self.term.setup().wrap_err("Failed to set up terminal")?;

        let result = self.session();

        self.term.restore().wrap_err("Failed to restore terminal")?;
        result
    }

    ///////////////////////////////////////////////////////////////////////////

    fn session(&mut self) -> color_eyre::Result<()> {
        let mut selected = self.settings.default_mode();

        while let Some(mode) = self.menu(selected)? {
            selected = mode;
            match self.play(mode)? {
                PlayOutcome::Quit => break,
                PlayOutcome::Skipped => {
                    if !self.too_small()? {
                        break;
                    }
                }
                PlayOutcome::Finished { state, scores } => {
                    if !self.game_over(mode, state, &scores)? {
                        break;
                    }
                }
            }
        }

        info!("session ended");
        Ok(())
    }

    /// Returns the chosen mode, or `None` if the player quit.
    fn menu(&mut self, selected: Mode) -> color_eyre::Result<Option<Mode>> {
        let mut cursor = MENU_ENTRIES.iter().position(|(mode, _)| *mode == selected).unwrap_or(0);

        self.term.clear()?;
        loop {
            let entries: Vec<String> = MENU_ENTRIES
                .iter()
                .enumerate()
                .map(|(i, (_, label))| {
                    if i == cursor { format!("> {} <", label) } else { label.to_string() }
                })
                .collect();

            let mut lines = vec!["SSSNAKE", ""];
            lines.extend(entries.iter().map(String::as_str));
            lines.extend(["", "Up/Down to choose, Enter to play", "q to quit"]);
            self.term.show_message(&lines)?;

            let ev = self.term.read_key_blocking()?;
            if is_quit(&ev) {
                return Ok(None);
            }

            match ev.code {
                KeyCode::Up | KeyCode::Char('w') => cursor = cursor.saturating_sub(1),
                KeyCode::Down | KeyCode::Char('s') => {
                    cursor = (cursor + 1).min(MENU_ENTRIES.len() - 1)
                }
                KeyCode::Char('1') => return Ok(Some(Mode::Single)),
                KeyCode::Char('2') => return Ok(Some(Mode::Dual)),
                KeyCode::Enter | KeyCode::Char(' ') => return Ok(Some(MENU_ENTRIES[cursor].0)),
                _ => {}
            }
        }
    }

    fn play(&mut self, mode: Mode) -> color_eyre::Result<PlayOutcome> {
        let config = self.settings.round_config(mode)?;
        self.term.clear()?;
        self.paused = false;

        let mut round = match start_round(config, self.term.playable_bounds())? {
            Some(round) => round,
            None => return Ok(PlayOutcome::Skipped),
        };
        self.term.render(&round.snapshot(), self.debug)?;

        loop {
            let started = Instant::now();
            let mut intents: Intents = [None, None];

            for key_ev in self.term.read_key_events_queue()? {
                match Command::from_key_event(&key_ev, mode) {
                    Some(Command::Quit) => return Ok(PlayOutcome::Quit),
                    Some(Command::Pause) => self.toggle_pause(&round)?,
                    Some(Command::ToggleDebug) => self.debug = !self.debug,
                    Some(Command::Steer(player, dir)) => intents[player.index()] = Some(dir),
                    None => {}
                }
            }

            if self.paused {
                sleep(SKIPPED_TICK_DELAY);
                continue;
            }

            let state = match round.tick(self.term.playable_bounds(), intents) {
                Ok(state) => state,
                Err(err) if err.is_recoverable() => {
                    warn!(%err, "skipping tick");
                    sleep(SKIPPED_TICK_DELAY);
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            self.term.render(&round.snapshot(), self.debug)?;

            if state.is_terminal() {
                let scores = round.snapshot().snakes.iter().map(|view| view.score).collect();
                return Ok(PlayOutcome::Finished { state, scores });
            }

            sleep(round.interval().saturating_sub(started.elapsed()));
        }
    }

    /// Shows the outcome. Returns whether the player wants another round.
    fn game_over(
        &mut self,
        mode: Mode,
        state: RoundState,
        scores: &[u32],
    ) -> color_eyre::Result<bool> {
        let headline = outcome_message(mode, state);
        let score_line = score_line(scores);
        self.term.show_message(&[
            headline.as_str(),
            score_line.as_str(),
            "",
            "Press any key to play again,",
            "or q to quit.",
        ])?;

        let ev = self.term.read_key_blocking()?;
        Ok(!is_quit(&ev))
    }

    /// Returns whether the player wants to go back to the menu.
    fn too_small(&mut self) -> color_eyre::Result<bool> {
        self.term.show_message(&[
            "Terminal too small to play",
            "",
            "Enlarge it and press any key,",
            "or q to quit.",
        ])?;

        let ev = self.term.read_key_blocking()?;
        Ok(!is_quit(&ev))
    }

    fn toggle_pause(&mut self, round: &Round) -> color_eyre::Result<()> {
        if !self.paused {
            self.term.show_message(&["Paused", "Press Esc to resume", "or q to quit"])?;
        } else {
            self.term.hide_message()?;
            self.term.render(&round.snapshot(), self.debug)?;
        }

        self.paused = !self.paused;
        Ok(())
    }
}

/// `None` when the bounds are unusable right now; other errors are fatal.
fn start_round(config: RoundConfig, bounds: Bounds) -> color_eyre::Result<Option<Round>> {
    match Round::new(config, bounds) {
        Ok(round) => Ok(Some(round)),
        Err(err) if err.is_recoverable() => {
            warn!(%err, "not starting a round");
            Ok(None)
        }
        Err(err) => Err(err).wrap_err("Failed to start a round"),
    }
}

pub fn outcome_message(mode: Mode, state: RoundState) -> String {
    match (mode, state) {
        (_, RoundState::Running) => "Round in progress".to_string(),
        (Mode::Single, RoundState::PlayerWon(_)) => "You won!".to_string(),
        (Mode::Single, RoundState::GameOver) => "Game over!".to_string(),
        (Mode::Dual, RoundState::PlayerWon(player)) => {
            format!("Player {} wins!", player_name(player))
        }
        (Mode::Dual, RoundState::GameOver) => "Draw!".to_string(),
    }
}

fn score_line(scores: &[u32]) -> String {
    match scores {
        [score] => format!("Score: {}", score),
        _ => scores
            .iter()
            .enumerate()
            .map(|(i, score)| format!("P{}: {}", i + 1, score))
            .collect::<Vec<_>>()
            .join("  "),
    }
}

fn player_name(player: Player) -> &'static str {
    match player {
        Player::One => "1 (arrows)",
        Player::Two => "2 (WASD)",
    }
}
