mod config;
mod difficulty;
mod error;
mod food;
mod game;
mod input;
mod round;
mod snake;
mod term;

use std::{fs::File, sync::Mutex};

use clap::Parser;
use color_eyre::eyre::Context as _;
use tracing_subscriber::EnvFilter;

/// Grid cell address. Signed so that parked and out-of-bounds cells are representable.
pub type Coords = (i32, i32);

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let settings = config::Settings::parse();

    if let Some(path) = &settings.log_file {
        let file = File::create(path)
            .wrap_err_with(|| format!("Failed to create log file: {}", path.display()))?;
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    }

    // The session takes care of restoring the terminal before returning
    let mut game = game::SnakeGame::new(settings)?;
    game.run()
}
