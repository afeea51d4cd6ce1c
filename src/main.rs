use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use quickcart::asset;
use quickcart::config::RuntimeConfig;
use quickcart::game::GameSession;
use quickcart::input::Button;
use quickcart::logging::setup_logging;
use tracing::{info, warn};

/// Runs a game headlessly at 60 Hz and optionally saves the last frame.
#[derive(Parser)]
#[command(name = "quickcart", version)]
struct Cli {
    /// A bundled game name, or a path to a guest source file.
    #[arg(default_value = "pong")]
    game: String,

    /// Stop after this many update frames.
    #[arg(short, long, default_value_t = 600)]
    frames: u64,

    /// Configuration file (defaults to ./quickcart.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scripted input as FRAME:BUTTON:down|up, e.g. `30:start:down`. May be repeated.
    #[arg(long = "input", value_parser = ScriptedInput::from_str)]
    inputs: Vec<ScriptedInput>,

    /// Write the last composed frame to this PNG file.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Advance simulated time instead of waiting in real time.
    #[arg(long)]
    fast: bool,

    /// List the bundled games and exit.
    #[arg(long)]
    list: bool,
}

#[derive(Debug, Clone, Copy)]
struct ScriptedInput {
    frame: u64,
    button: Button,
    down: bool,
}

impl FromStr for ScriptedInput {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let mut parts = value.split(':');
        let (Some(frame), Some(button), Some(action), None) = (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(anyhow!("expected FRAME:BUTTON:down|up, got {value:?}"));
        };

        Ok(Self {
            frame: frame.parse().with_context(|| format!("invalid frame in {value:?}"))?,
            button: Button::from_str(button).with_context(|| format!("unknown button {button:?}"))?,
            down: match action {
                "down" => true,
                "up" => false,
                other => return Err(anyhow!("expected down or up, got {other:?}")),
            },
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.list {
        for name in asset::bundled_games() {
            println!("{name}");
        }
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => RuntimeConfig::load_from(path)?,
        None => RuntimeConfig::load()?,
    };
    setup_logging(&config.log_level);

    let mut session = GameSession::new(config);
    session.initialize()?;

    let source = match asset::bundled_game(&cli.game) {
        Ok(source) => source.into_owned(),
        Err(_) => std::fs::read_to_string(&cli.game).with_context(|| format!("failed to read game {:?}", cli.game))?,
    };
    let title = session.load_source(&source)?.metadata.title.clone();
    info!(title = %title, frames = cli.frames, "Running");

    let period = session.scheduler().period();
    let mut now = Instant::now();
    session.start_at(now);

    while session.scheduler().frame_count() < cli.frames {
        let frame = session.scheduler().frame_count();
        for input in cli.inputs.iter().filter(|input| input.frame == frame) {
            if input.down {
                session.press(input.button);
            } else {
                session.release(input.button);
            }
        }

        session.poll_at(now);
        if !session.scheduler().is_running() && !session.has_pending_work() {
            break;
        }

        if cli.fast {
            now += period;
        } else {
            if let Some(wait) = session.scheduler().time_until_next(Instant::now()) {
                spin_sleep::sleep(wait);
            }
            now = Instant::now();
        }
    }

    // Let deferred work (score submission, leaderboard) finish.
    session.stop();
    session.poll_at(now + period);

    let screen = session.display();
    info!(
        frames = session.scheduler().frame_count(),
        score = screen.score(),
        game_over = screen.is_game_over(),
        faults = session.runtime().fault_count(),
        "Finished"
    );

    if let Some(path) = &cli.output {
        match session.last_frame() {
            Some(frame) => frame
                .save_with_format(path, image::ImageFormat::Png)
                .with_context(|| format!("failed to write {}", path.display()))?,
            None => warn!("No frame was rendered, nothing to write"),
        }
    }

    session.dispose();
    Ok(())
}
