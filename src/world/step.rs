//! Step modes and the checkerboard phase executor.
//!
//! A tick always starts with every updated-mask cleared. Serial modes walk
//! the registry in `(cy, cx)` order and mutate directly; the checkerboard
//! mode runs four colour phases in the fixed order 00, 10, 01, 11, each over
//! the awake chunks of that parity. Two chunks in one phase differ by at
//! least two in some axis, so their 3x3 influence regions never overlap and
//! tasks only ever write their own chunk.

use parking_lot::Mutex;

use crate::error::Result;
use crate::intent::TaskOutput;
use crate::world::stepper::step_chunk;
use crate::world::{StepMode, StepOptions, World};

impl World {
    /// Advance the world by `options.substeps` ticks. Per-step intent and
    /// conflict counters reset at the start of the call and accumulate
    /// across its substeps; `step_index` advances only on full success.
    pub fn step(&mut self, options: StepOptions) -> Result<()> {
        let mode = options.mode.unwrap_or(self.default_mode);
        let substeps = options.substeps.max(1);

        self.counters.intents_emitted = 0;
        self.counters.intent_conflicts = 0;

        for substep in 0..substeps {
            let tick = self.counters.step_index + u64::from(substep) + 1;
            match mode {
                StepMode::FullScanSerial => self.tick_serial(tick, false),
                StepMode::ChunkScanSerial => self.tick_serial(tick, true),
                StepMode::CheckerboardParallel => self.tick_checkerboard(tick)?,
            }
        }

        self.counters.step_index += u64::from(substeps);
        log::trace!(
            "stepped {substeps} tick(s), {} intents, {} conflicts",
            self.counters.intents_emitted,
            self.counters.intent_conflicts
        );
        Ok(())
    }

    fn tick_serial(&mut self, tick: u64, awake_only: bool) {
        self.clear_masks();
        for index in 0..self.chunks.len() {
            if awake_only && !self.chunks[index].data.get_mut().awake {
                continue;
            }
            let mut out = TaskOutput::new(self.payload_bytes);
            step_chunk(self, index, tick, false, &mut out);
            self.counters.intents_emitted += out.emitted_moves;
        }
        self.recompute_aggregates();
    }

    fn tick_checkerboard(&mut self, tick: u64) -> Result<()> {
        self.clear_masks();
        for colour in 0..4u32 {
            let colour_x = (colour & 1) as i32;
            let colour_y = ((colour >> 1) & 1) as i32;
            self.run_phase(tick, colour_x, colour_y)?;
        }
        Ok(())
    }

    /// One colour phase: gather awake chunks of this parity, step them as
    /// independent tasks, then merge their intents single-threaded.
    fn run_phase(&mut self, tick: u64, colour_x: i32, colour_y: i32) -> Result<()> {
        let mut indices: Vec<u32> = Vec::new();
        for (index, slot) in self.chunks.iter_mut().enumerate() {
            let data = slot.data.get_mut();
            if data.live_cells == 0 || !data.awake {
                continue;
            }
            if (slot.cx & 1) != colour_x || (slot.cy & 1) != colour_y {
                continue;
            }
            indices.push(index as u32);
        }
        if indices.is_empty() {
            return Ok(());
        }

        let outputs: Vec<Mutex<TaskOutput>> = indices
            .iter()
            .map(|_| Mutex::new(TaskOutput::new(self.payload_bytes)))
            .collect();
        {
            let world: &World = self;
            let indices = &indices;
            let outputs = &outputs;
            let task = move |task_index: u32, _worker: u32| {
                let chunk_index = indices[task_index as usize] as usize;
                let mut out = outputs[task_index as usize].lock();
                step_chunk(world, chunk_index, tick, true, &mut out);
            };
            match world.runner.as_deref() {
                Some(runner) => runner.parallel_for(indices.len() as u32, &task),
                None => {
                    for task_index in 0..indices.len() as u32 {
                        task(task_index, 0);
                    }
                }
            }
        }

        let outputs: Vec<TaskOutput> = outputs.into_iter().map(Mutex::into_inner).collect();
        for out in &outputs {
            self.counters.intents_emitted += out.emitted_moves;
        }
        self.resolve_intents(outputs)?;
        self.recompute_aggregates();
        Ok(())
    }

    /// Invariant: every updated-mask is all-zero at the start of a tick.
    fn clear_masks(&mut self) {
        for slot in &mut self.chunks {
            slot.data.get_mut().clear_updated();
        }
    }

    /// Republish world aggregates from per-chunk state. A sleeping empty
    /// chunk can never stay awake (I3), so flags are already consistent.
    pub(crate) fn recompute_aggregates(&mut self) {
        let mut awake = 0u32;
        let mut live = 0u64;
        for slot in &mut self.chunks {
            let data = slot.data.get_mut();
            if data.awake {
                awake += 1;
            }
            live += u64::from(data.live_cells);
        }
        self.counters.awake_chunks = awake;
        self.counters.live_cells = live;
    }
}
