/// Entry point and game loop.

mod app;
mod ui;

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use log::LevelFilter;
use thiserror::Error;

use conmaze::config::GameConfig;
use conmaze::logging::{self, LOG_DIR};
use conmaze::sim::level::{install_embedded_levels, parse_level, ParseError};
use conmaze::sim::replay::{replay, Replay, ReplayPolicy};
use conmaze::sim::save::{decode_moves, SaveError};
use conmaze::sim::session::SessionError;
use conmaze::store::{FsStorage, StoreError};

use app::{App, Phase};
use ui::gamepad::GamepadInput;
use ui::input;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

/// How long one loop iteration waits for a key before polling the pad.
const INPUT_POLL: Duration = Duration::from_millis(30);
const FRAME_SLEEP: Duration = Duration::from_millis(5);

#[derive(Parser)]
#[command(name = "conmaze")]
#[command(about = "Room-based terminal maze with replayable saves")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Configuration file (default: search for config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding levels/, games/ and logs/
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a save file on a level file and print the final state
    Verify {
        level: PathBuf,
        save: PathBuf,
        /// Fail on the first illegal recorded move instead of skipping it
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Debug, Error)]
enum GameError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("level {}: {source}", path.display())]
    Level {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Save(#[from] SaveError),

    #[error(transparent)]
    Replay(#[from] SessionError),
}

fn main() {
    let cli = Cli::parse();

    let mut config = GameConfig::load(cli.config.as_deref());
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    config.log_level = match cli.verbose {
        0 => config.log_level,
        1 => config.log_level.max(LevelFilter::Debug),
        _ => LevelFilter::Trace,
    };

    let log_session = match logging::init(&config.data_dir.join(LOG_DIR), config.log_level) {
        Ok(s) => Some(s),
        Err(e) => {
            eprintln!("Logging disabled: {e}");
            None
        }
    };
    for w in &config.warnings {
        log::warn!("Config: {}", w);
    }
    log::info!("Data directory: {}", config.data_dir.display());

    let result = match cli.command {
        Some(Command::Verify { level, save, strict }) => {
            let policy = if strict { ReplayPolicy::Strict } else { config.replay.policy() };
            verify(&level, &save, policy)
        }
        None => play(&config),
    };

    if let Err(e) = &result {
        log::error!("{}", e);
        eprintln!("Error: {e}");
    }
    if let Some(s) = log_session {
        s.finish();
    }
    if result.is_err() {
        std::process::exit(1);
    }
}

// ══════════════════════════════════════════════════════════════
// Interactive game
// ══════════════════════════════════════════════════════════════

fn play(config: &GameConfig) -> Result<(), GameError> {
    let mut store = FsStorage::new(&config.data_dir);
    let installed = install_embedded_levels(&mut store)?;
    if installed > 0 {
        log::info!("Installed {} bundled levels", installed);
    }

    let mut app = App::new(Box::new(store), config.replay.policy());
    let mut renderer = Renderer::new();
    renderer.init()?;

    let sound = SoundEngine::new();
    let mut gamepad = GamepadInput::new(&config.gamepad);

    let result = game_loop(&mut app, &mut renderer, sound.as_ref(), &mut gamepad, config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    result?;

    println!("Good bye!");
    Ok(())
}

fn game_loop(
    app: &mut App,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    gamepad: &mut GamepadInput,
    config: &GameConfig,
) -> io::Result<()> {
    let step_ms = config.animation.victory_step_ms;
    let hold = Duration::from_millis(config.animation.victory_hold_ms);
    let mut next_frame = Instant::now();

    while !app.quit {
        renderer.render(app)?;
        if let Some(sfx) = sound {
            for s in app.sounds.drain(..) {
                sfx.play(s);
            }
        } else {
            app.sounds.clear();
        }

        if app.phase == Phase::Victory {
            let now = Instant::now();
            if now >= next_frame {
                match app.tick() {
                    // Outer rings draw faster.
                    Some(ring) => next_frame = now + Duration::from_millis(step_ms / ring as u64 + 1),
                    None => {
                        renderer.render(app)?;
                        std::thread::sleep(hold);
                        // Anything pressed during the animation is dropped.
                        input::flush_pending()?;
                        gamepad.poll();
                    }
                }
            }
            std::thread::sleep(FRAME_SLEEP);
            continue;
        }

        let mut actions = gamepad.poll();
        if let Some(a) = input::read_action(app.key_mode(), Some(INPUT_POLL))? {
            actions.push(a);
        }
        for a in actions {
            app.handle(a);
            if app.quit || app.phase == Phase::Victory {
                break;
            }
        }
    }

    log::info!("Leaving game loop");
    Ok(())
}

// ══════════════════════════════════════════════════════════════
// Headless replay
// ══════════════════════════════════════════════════════════════

fn verify(level_path: &Path, save_path: &Path, policy: ReplayPolicy) -> Result<(), GameError> {
    let text = std::fs::read_to_string(level_path)?;
    let parsed = parse_level(&text).map_err(|source| GameError::Level {
        path: level_path.to_path_buf(),
        source,
    })?;
    for w in &parsed.warnings {
        println!("warning: {}", w);
    }
    let moves = decode_moves(&std::fs::read(save_path)?)?;
    let result = replay(&parsed.level, &moves, policy)?;
    print!("{}", report(&result));
    Ok(())
}

/// Human-readable final state of a replay: counts, position and the room
/// the player ends in, with the player drawn as `P`.
fn report(result: &Replay) -> String {
    let s = &result.session;
    let level = s.level();
    let p = s.player();
    let mut out = String::new();
    out.push_str(&format!(
        "level: {} room(s) of {}x{}\n",
        level.room_count, level.room_width, level.room_width
    ));
    out.push_str(&format!(
        "moves: {} accepted, {} skipped, {} after victory\n",
        s.move_count(),
        result.skipped.len(),
        result.after_victory
    ));
    out.push_str(&format!("player: room {}, row {}, col {}\n", p.room, p.row, p.col));
    out.push_str(&format!("victory: {}\n", if s.victory() { "yes" } else { "no" }));
    let w = level.room_width;
    for (i, tile) in s.room_tiles().iter().enumerate() {
        let ch = if i == p.row * w + p.col { 'P' } else { tile.to_char() };
        out.push(ch);
        if i % w == w - 1 {
            out.push('\n');
        }
    }
    out
}
