//! World - the root container and orchestration surface.
//!
//! The world owns the material table, the sorted chunk registry and the
//! aggregate counters; everything heavier is delegated:
//! - chunk/cell I/O lives in `world/cells.rs`
//! - step modes and the checkerboard phases in `world/step.rs`
//! - the per-chunk scan in `world/stepper.rs`
//! - displacement and intent emission in `world/moves.rs`
//! - the cross-chunk intent merge in `world/resolve.rs`
//! - the custom-update handle in `world/ctx.rs`

pub(crate) mod cells;
pub mod ctx;
pub(crate) mod moves;
pub(crate) mod resolve;
pub(crate) mod step;
pub(crate) mod stepper;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::chunk::ChunkSlot;
use crate::error::{Error, Result};
use crate::material::{MaterialDesc, MaterialFlags, MaterialId, MaterialProps, MaterialTable};
use crate::rng::mix64;
use crate::runner::ParallelRunner;

/// How one tick selects and executes chunks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepMode {
    /// Step every loaded chunk serially, mutating state directly.
    #[default]
    FullScanSerial,
    /// Step only awake chunks serially, mutating state directly.
    ChunkScanSerial,
    /// Four-colour checkerboard phases over the injected runner; cross-chunk
    /// effects go through intents.
    CheckerboardParallel,
}

/// World construction options. Zero geometry/capacity values fall back to
/// the documented defaults; negative chunk extents are rejected.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub chunk_width: i32,
    pub chunk_height: i32,
    /// Inline payload bytes per cell (`P`); every registered material's
    /// payload must fit.
    pub inline_payload_bytes: u16,
    pub max_materials: u16,
    pub initial_chunk_capacity: u32,
    pub deterministic_seed: u64,
    /// When false, the effective seed additionally depends on the world's
    /// runtime identity. Explicitly not reproducible; keep it out of tests.
    pub deterministic_mode: bool,
    pub default_step_mode: StepMode,
    #[serde(skip)]
    pub runner: Option<Arc<dyn ParallelRunner>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_width: 64,
            chunk_height: 64,
            inline_payload_bytes: 16,
            max_materials: 256,
            initial_chunk_capacity: 16,
            deterministic_seed: 0,
            deterministic_mode: false,
            default_step_mode: StepMode::FullScanSerial,
            runner: None,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("chunk_width", &self.chunk_width)
            .field("chunk_height", &self.chunk_height)
            .field("inline_payload_bytes", &self.inline_payload_bytes)
            .field("max_materials", &self.max_materials)
            .field("initial_chunk_capacity", &self.initial_chunk_capacity)
            .field("deterministic_seed", &self.deterministic_seed)
            .field("deterministic_mode", &self.deterministic_mode)
            .field("default_step_mode", &self.default_step_mode)
            .field("runner", &self.runner.is_some())
            .finish()
    }
}

/// Per-call stepping options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepOptions {
    /// Mode override; `None` uses the world default.
    pub mode: Option<StepMode>,
    /// Ticks to run; `0` is treated as `1`.
    pub substeps: u32,
}

impl Default for StepOptions {
    fn default() -> Self {
        Self { mode: None, substeps: 1 }
    }
}

/// Aggregate counters snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WorldStats {
    pub loaded_chunks: u32,
    pub awake_chunks: u32,
    pub live_cells: u64,
    pub step_index: u64,
    /// Successful direct moves plus emitted intents for the last `step`
    /// call, not resolver applications.
    pub intents_emitted_last_step: u64,
    pub intent_conflicts_last_step: u64,
    /// Reserved large-payload path; always zero in this core.
    pub payload_overflow_allocs: u64,
    pub payload_overflow_frees: u64,
}

#[derive(Default)]
pub(crate) struct Counters {
    pub awake_chunks: u32,
    pub live_cells: u64,
    pub step_index: u64,
    pub intents_emitted: u64,
    pub intent_conflicts: u64,
}

/// The unit of state: a sparse, chunked grid of typed cells advanced in
/// discrete, deterministic ticks. Worlds are independent; many can coexist.
pub struct World {
    pub(crate) chunk_width: i32,
    pub(crate) chunk_height: i32,
    pub(crate) cells_per_chunk: u32,
    pub(crate) payload_bytes: u16,
    pub(crate) seed: u64,
    pub(crate) default_mode: StepMode,
    pub(crate) runner: Option<Arc<dyn ParallelRunner>>,
    pub(crate) materials: MaterialTable,
    pub(crate) chunks: Vec<ChunkSlot>,
    pub(crate) counters: Counters,
    /// Swap scratch for the single-threaded resolver and serial paths;
    /// never touched from parallel tasks.
    pub(crate) scratch: Vec<u8>,
}

impl World {
    pub fn new(config: Config) -> Result<Self> {
        let chunk_width = if config.chunk_width == 0 { 64 } else { config.chunk_width };
        let chunk_height = if config.chunk_height == 0 { 64 } else { config.chunk_height };
        if chunk_width < 0 || chunk_height < 0 {
            return Err(Error::InvalidArgument);
        }
        let cells = chunk_width as u64 * chunk_height as u64;
        if cells > u64::from(u32::MAX) {
            return Err(Error::CapacityReached);
        }

        let payload_bytes = if config.inline_payload_bytes == 0 { 16 } else { config.inline_payload_bytes };
        let max_materials = if config.max_materials == 0 { 256 } else { config.max_materials };
        let initial_chunks = if config.initial_chunk_capacity == 0 { 16 } else { config.initial_chunk_capacity };

        let mut seed = config.deterministic_seed;
        if !config.deterministic_mode {
            seed ^= world_nonce();
        }

        let mut chunks = Vec::new();
        chunks.try_reserve(initial_chunks as usize)?;

        Ok(Self {
            chunk_width,
            chunk_height,
            cells_per_chunk: cells as u32,
            payload_bytes,
            seed,
            default_mode: config.default_step_mode,
            runner: config.runner,
            materials: MaterialTable::new(max_materials)?,
            chunks,
            counters: Counters::default(),
            scratch: vec![0; payload_bytes as usize],
        })
    }

    /// Register a material; ids are handed out sequentially and never
    /// reused.
    pub fn register_material(&mut self, desc: MaterialDesc) -> Result<MaterialId> {
        let name = desc.name.clone();
        let id = self.materials.register(desc, self.payload_bytes)?;
        log::debug!("registered material {name:?} as id {id}");
        Ok(id)
    }

    pub fn material_id(&self, name: &str) -> Option<MaterialId> {
        self.materials.id_by_name(name)
    }

    pub fn material_name(&self, id: MaterialId) -> Option<&str> {
        self.materials.get(id).map(|record| record.name.as_str())
    }

    pub fn material_flags(&self, id: MaterialId) -> Option<MaterialFlags> {
        self.materials.get(id).map(|record| record.flags)
    }

    pub fn material_props(&self, id: MaterialId) -> Option<MaterialProps> {
        self.materials.get(id).map(|record| record.props())
    }

    pub fn chunk_width(&self) -> i32 {
        self.chunk_width
    }

    pub fn chunk_height(&self) -> i32 {
        self.chunk_height
    }

    pub fn inline_payload_bytes(&self) -> u16 {
        self.payload_bytes
    }

    pub fn stats(&self) -> WorldStats {
        WorldStats {
            loaded_chunks: self.chunks.len() as u32,
            awake_chunks: self.counters.awake_chunks,
            live_cells: self.counters.live_cells,
            step_index: self.counters.step_index,
            intents_emitted_last_step: self.counters.intents_emitted,
            intent_conflicts_last_step: self.counters.intent_conflicts,
            payload_overflow_allocs: 0,
            payload_overflow_frees: 0,
        }
    }
}

/// Per-instance entropy for non-deterministic mode.
fn world_nonce() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    let ordinal = COUNTER.fetch_add(1, Ordering::Relaxed);
    mix64(ordinal ^ ((std::process::id() as u64) << 32))
}
