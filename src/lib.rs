//! tephra - deterministic chunked falling-sand simulation engine
//!
//! A sparse, chunked 2D grid of typed cells advanced in discrete steps.
//! Cells move, swap or transform according to rules attached to their
//! material; given a fixed seed the end-of-tick state is a pure function of
//! the inputs, independent of worker count or task scheduling.
//!
//! Layout:
//! - `coords.rs`    - coordinate algebra (absolute -> chunk/local, wrapping)
//! - `rng.rs`       - stateless per-cell PRNG
//! - `material.rs`  - material flags, descriptors, registry
//! - `chunk.rs`     - per-chunk arrays and the updated-mask
//! - `intent.rs`    - cross-chunk intents and per-task outputs
//! - `behaviors.rs` - builtin powder/liquid/gas movement
//! - `runner.rs`    - parallel-for capability plus the rayon adaptor
//! - `palette.rs`   - JSON material bundles
//! - `world.rs`     - the world root and its orchestration submodules
//!
//! ```
//! use tephra::{CellCoord, Config, MaterialDesc, MaterialFlags, StepOptions, World};
//!
//! let mut world = World::new(Config {
//!     chunk_width: 8,
//!     chunk_height: 8,
//!     deterministic_mode: true,
//!     ..Config::default()
//! })?;
//! let sand = world.register_material(MaterialDesc {
//!     name: "sand".into(),
//!     flags: MaterialFlags::POWDER,
//!     density: 10.0,
//!     ..MaterialDesc::default()
//! })?;
//! world.load_chunk(0, 0)?;
//! world.cell_set(CellCoord::new(3, 1), sand, None)?;
//! world.step(StepOptions::default())?;
//! assert_eq!(world.cell_get(CellCoord::new(3, 2))?.material_id(), sand);
//! # Ok::<(), tephra::Error>(())
//! ```

mod behaviors;
mod chunk;
mod coords;
mod error;
mod intent;
mod material;
mod palette;
mod rng;
mod runner;
mod world;


pub use coords::CellCoord;
pub use error::{Error, Result};
pub use material::{
    BehaviorKind, MaterialDesc, MaterialFlags, MaterialId, MaterialProps, PayloadCtor, PayloadDtor,
    PayloadMove, UpdateHook, EMPTY,
};
pub use palette::{PaletteBundle, PaletteMaterial};
pub use rng::step_random;
pub use runner::ParallelRunner;
#[cfg(feature = "parallel")]
pub use runner::RayonRunner;
pub use world::cells::CellRef;
pub use world::ctx::UpdateCtx;
pub use world::{Config, StepMode, StepOptions, World, WorldStats};
