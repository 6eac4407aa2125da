//! Terminal demo: an hourglass-ish scene stepped at a fixed cadence.
//!
//! Usage: tephra-demo [steps] [mode]
//!   steps  total ticks to run (default 120)
//!   mode   serial | chunk | parallel (default parallel)

use std::io::{self, Write};
#[cfg(feature = "parallel")]
use std::sync::Arc;

use tephra::{CellCoord, Config, StepMode, StepOptions, World};

const VIEW_W: i32 = 64;
const VIEW_H: i32 = 32;

const PALETTE: &str = r#"{
    "materials": [
        { "name": "stone", "flags": ["static"], "density": 100.0 },
        { "name": "sand", "flags": ["powder"], "density": 10.0, "friction": 0.4 },
        { "name": "water", "flags": ["liquid"], "density": 5.0, "dispersion": 2.0 },
        { "name": "steam", "flags": ["gas"], "density": 1.0 }
    ]
}"#;

fn parse_args() -> (u32, StepMode) {
    let mut steps = 120u32;
    let mut mode = StepMode::CheckerboardParallel;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "serial" => mode = StepMode::FullScanSerial,
            "chunk" => mode = StepMode::ChunkScanSerial,
            "parallel" => mode = StepMode::CheckerboardParallel,
            other => {
                if let Ok(n) = other.parse() {
                    steps = n;
                } else {
                    eprintln!("unrecognized argument {other:?}");
                    std::process::exit(2);
                }
            }
        }
    }
    (steps, mode)
}

fn build_world(mode: StepMode) -> tephra::Result<World> {
    let mut config = Config {
        chunk_width: 16,
        chunk_height: 16,
        deterministic_seed: 0xC0FFEE,
        deterministic_mode: true,
        default_step_mode: mode,
        ..Config::default()
    };
    #[cfg(feature = "parallel")]
    {
        config.runner = Some(Arc::new(tephra::RayonRunner::new()));
    }

    let mut world = World::new(config)?;
    let ids = world.register_palette(PALETTE)?;
    let (stone, sand, water) = (ids[0], ids[1], ids[2]);

    for cy in 0..VIEW_H / 16 {
        for cx in 0..VIEW_W / 16 {
            world.load_chunk(cx, cy)?;
        }
    }

    // Floor and walls.
    for x in 0..VIEW_W {
        world.cell_set(CellCoord::new(x, VIEW_H - 1), stone, None)?;
    }
    for y in 0..VIEW_H {
        world.cell_set(CellCoord::new(0, y), stone, None)?;
        world.cell_set(CellCoord::new(VIEW_W - 1, y), stone, None)?;
    }
    // A funnel ledge with a gap in the middle.
    for x in 8..VIEW_W - 8 {
        if (x - VIEW_W / 2).abs() > 2 {
            world.cell_set(CellCoord::new(x, VIEW_H / 2), stone, None)?;
        }
    }
    // Sand heap above the funnel, water pooled to the side.
    for y in 3..10 {
        for x in VIEW_W / 2 - 6..VIEW_W / 2 + 6 {
            world.cell_set(CellCoord::new(x, y), sand, None)?;
        }
    }
    for y in 11..14 {
        for x in 4..16 {
            world.cell_set(CellCoord::new(x, y), water, None)?;
        }
    }
    Ok(world)
}

fn glyph(world: &World, x: i32, y: i32) -> char {
    let id = world
        .cell_get(CellCoord::new(x, y))
        .map(|cell| cell.material_id())
        .unwrap_or_default();
    match world.material_name(id) {
        Some("stone") => '#',
        Some("sand") => '.',
        Some("water") => '~',
        Some("steam") => '^',
        _ => ' ',
    }
}

fn render(world: &World) -> String {
    let mut frame = String::with_capacity(((VIEW_W + 1) * VIEW_H) as usize);
    for y in 0..VIEW_H {
        for x in 0..VIEW_W {
            frame.push(glyph(world, x, y));
        }
        frame.push('\n');
    }
    frame
}

fn main() -> tephra::Result<()> {
    let (steps, mode) = parse_args();
    let mut world = build_world(mode)?;

    let mut stdout = io::stdout();
    for _ in 0..steps {
        world.step(StepOptions::default())?;
        let stats = world.stats();
        // Clear screen and repaint.
        let _ = write!(
            stdout,
            "\x1b[2J\x1b[H{}tick {:>4}  live {:>5}  awake {:>2}/{}  intents {:>4}  conflicts {:>3}\n",
            render(&world),
            stats.step_index,
            stats.live_cells,
            stats.awake_chunks,
            stats.loaded_chunks,
            stats.intents_emitted_last_step,
            stats.intent_conflicts_last_step,
        );
        let _ = stdout.flush();
        std::thread::sleep(std::time::Duration::from_millis(30));
    }

    let stats = world.stats();
    println!(
        "done after {} ticks: {} live cells, {} awake of {} chunks",
        stats.step_index, stats.live_cells, stats.awake_chunks, stats.loaded_chunks
    );
    Ok(())
}
