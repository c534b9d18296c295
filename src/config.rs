use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::error::EngineError;
use crate::round::{Mode, RoundConfig};

#[derive(Debug, Parser)]
#[command(name = "sssnake")]
#[command(about = "Terminal snake for one or two players", long_about = None)]
pub struct Settings {
    /// Score needed to win a round
    #[arg(long, default_value_t = 20)]
    pub win_score: u32,

    /// Tick interval at the start of a round, in milliseconds
    #[arg(long, default_value_t = 150)]
    pub start_interval_ms: u64,

    /// Fastest tick interval the game speeds up to, in milliseconds
    #[arg(long, default_value_t = 50)]
    pub min_interval_ms: u64,

    /// Player count preselected in the menu
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
    pub players: u8,

    /// Running into the other snake counts as a crash
    #[arg(long)]
    pub solid_opponents: bool,

    /// Write logs to this file (filtered by RUST_LOG)
    #[arg(long, env = "SSSNAKE_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl Settings {
    pub fn default_mode(&self) -> Mode {
        if self.players == 2 { Mode::Dual } else { Mode::Single }
    }

    pub fn round_config(&self, mode: Mode) -> Result<RoundConfig, EngineError> {
        let config = RoundConfig {
            mode,
            win_score: self.win_score,
            start_interval: Duration::from_millis(self.start_interval_ms),
            min_interval: Duration::from_millis(self.min_interval_ms),
            solid_opponents: self.solid_opponents,
        };
        config.validate()?;
        Ok(config)
    }
}
