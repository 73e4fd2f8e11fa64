//! Candy Seller entry point
//!
//! Runs the game headless: a scripted walk through the street and the shop,
//! drawn every frame into a software surface.
//!
//! Usage: `candy-seller [settings.json] [--realtime]`
//!
//! With `--realtime` each frame is held to the configured frame rate.

use std::thread;
use std::time::{Duration, Instant};

use candy_engine::candy::{CandySeller, InputEvent};
use candy_engine::engine::{Key, Surface};
use candy_engine::{EngineSettings, Result};
use glam::IVec2;

const DEFAULT_SETTINGS_PATH: &str = "candy-seller.json";

/// One scripted step: inputs at the start of a frame, then frames to run.
struct Cue {
    inputs: &'static [InputEvent],
    frames: usize,
}

const SCRIPT: &[Cue] = &[
    Cue {
        inputs: &[],
        frames: 5,
    },
    // Down to where the coins lie, then sweep the street both ways.
    Cue {
        inputs: &[InputEvent::KeyDown(Key::Down)],
        frames: 14,
    },
    Cue {
        inputs: &[InputEvent::KeyUp(Key::Down), InputEvent::KeyDown(Key::Left)],
        frames: 30,
    },
    Cue {
        inputs: &[InputEvent::KeyUp(Key::Left), InputEvent::KeyDown(Key::Right)],
        frames: 60,
    },
    // Back to the middle and up through the shop door.
    Cue {
        inputs: &[InputEvent::KeyUp(Key::Right), InputEvent::KeyDown(Key::Left)],
        frames: 14,
    },
    Cue {
        inputs: &[InputEvent::KeyUp(Key::Left), InputEvent::KeyDown(Key::Up)],
        frames: 30,
    },
    // Inside: look around the floor, then out the way we came.
    Cue {
        inputs: &[InputEvent::KeyUp(Key::Up), InputEvent::KeyDown(Key::Char('a'))],
        frames: 10,
    },
    Cue {
        inputs: &[InputEvent::KeyUp(Key::Char('a')), InputEvent::KeyDown(Key::Char('d'))],
        frames: 10,
    },
    Cue {
        inputs: &[InputEvent::KeyUp(Key::Char('d')), InputEvent::KeyDown(Key::Char('s'))],
        frames: 40,
    },
    // Pan the camera along the street and back.
    Cue {
        inputs: &[
            InputEvent::KeyUp(Key::Char('s')),
            InputEvent::KeyDown(Key::Char('c')),
            InputEvent::KeyDown(Key::Right),
        ],
        frames: 20,
    },
    Cue {
        inputs: &[
            InputEvent::KeyUp(Key::Right),
            InputEvent::KeyUp(Key::Char('c')),
            InputEvent::KeyUp(Key::F12),
        ],
        frames: 5,
    },
    // Carry the player by hand, then take a break.
    Cue {
        inputs: &[
            InputEvent::KeyUp(Key::F12),
            InputEvent::MouseDown(IVec2::new(400, 300)),
            InputEvent::MouseMove(IVec2::new(300, 330)),
        ],
        frames: 5,
    },
    Cue {
        inputs: &[InputEvent::MouseUp(IVec2::new(300, 330)), InputEvent::KeyUp(Key::Pause)],
        frames: 10,
    },
    Cue {
        inputs: &[InputEvent::KeyUp(Key::Pause)],
        frames: 5,
    },
    // A fright on the way home.
    Cue {
        inputs: &[InputEvent::KeyDown(Key::Char('q'))],
        frames: 3,
    },
    Cue {
        inputs: &[InputEvent::KeyUp(Key::Char('q'))],
        frames: 3,
    },
];

fn run(game: &mut CandySeller, realtime: bool) -> Result<()> {
    let view = game.viewport();
    let mut canvas = Surface::new(view.width(), view.height());
    let frame_time = Duration::from_millis(game.settings().frame_millis());

    for cue in SCRIPT {
        for input in cue.inputs {
            game.handle_input(*input)?;
        }
        for _ in 0..cue.frames {
            let started = Instant::now();
            let drawn = game.frame(&mut canvas)?;
            log::debug!(
                "frame {}: {drawn} drawn in '{}'",
                game.frame_count(),
                game.map().current_scene().name()
            );
            if game.is_finished() {
                return Ok(());
            }
            if realtime {
                thread::sleep(frame_time.saturating_sub(started.elapsed()));
            }
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    log::info!("Candy Seller (headless) starting...");

    let (flags, paths): (Vec<String>, Vec<String>) = std::env::args().skip(1).partition(|arg| arg.starts_with("--"));
    let realtime = flags.iter().any(|flag| flag == "--realtime");
    let path = paths
        .into_iter()
        .next()
        .unwrap_or_else(|| DEFAULT_SETTINGS_PATH.to_string());
    let settings = EngineSettings::load_or_default(&path);
    log::info!(
        "{}x{} at {} fps, seed {:#x}",
        settings.width,
        settings.height,
        settings.fps,
        settings.seed
    );

    let outcome = CandySeller::with_placeholders(settings).and_then(|mut game| {
        run(&mut game, realtime)?;
        Ok(game)
    });
    match outcome {
        Ok(game) => log::info!(
            "Finished after {} frames ({} ms of game time) in '{}' with {} money{}",
            game.frame_count(),
            game.frame_count() * game.settings().frame_millis(),
            game.map().current_scene().name(),
            game.score(),
            if game.has_won() { ", a winner" } else { "" }
        ),
        Err(err) => {
            log::error!("Candy Seller stopped: {err}");
            std::process::exit(1);
        }
    }
}
