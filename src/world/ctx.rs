//! Transient handle handed to custom update hooks.
//!
//! The context borrows the world, the source chunk's write guard and the
//! task's output for the duration of one hook invocation; it cannot outlive
//! the call. At most one mutating operation may succeed per invocation;
//! every later attempt reports `Conflict`.

use crate::chunk::ChunkData;
use crate::coords::CellCoord;
use crate::error::{Error, Result};
use crate::intent::{Intent, TaskOutput};
use crate::material::{MaterialId, EMPTY};
use crate::rng::{step_random, SALT_CONTEXT_BASE};
use crate::world::moves::{attempt_move, resolve_target, SourceCell};
use crate::world::World;

pub struct UpdateCtx<'a> {
    pub(crate) world: &'a World,
    pub(crate) chunk_index: usize,
    pub(crate) chunk: &'a mut ChunkData,
    pub(crate) chunk_x: i32,
    pub(crate) chunk_y: i32,
    pub(crate) local_x: i32,
    pub(crate) local_y: i32,
    pub(crate) cell: u32,
    pub(crate) cell_coord: CellCoord,
    pub(crate) material_id: MaterialId,
    pub(crate) tick: u64,
    pub(crate) emit_intents: bool,
    pub(crate) out: &'a mut TaskOutput,
    pub(crate) random_counter: u32,
    pub(crate) operation_done: bool,
    pub(crate) changed: bool,
}

impl UpdateCtx<'_> {
    /// Absolute coordinate of the cell this hook runs for.
    pub fn cell(&self) -> CellCoord {
        self.cell_coord
    }

    /// Material id the hook was dispatched for.
    pub fn material_id(&self) -> MaterialId {
        self.material_id
    }

    /// Current tick number.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Read the source cell's current payload slot, `None` when the cell is
    /// empty or its material carries no payload. Rewrites go through a
    /// same-id [`UpdateCtx::transform`] with bytes.
    pub fn payload(&self) -> Option<&[u8]> {
        let id = self.chunk.material(self.cell);
        let material = self.world.materials.get(id)?;
        if material.payload_size == 0 {
            return None;
        }
        Some(&self.chunk.payload(self.cell)[..material.payload_size as usize])
    }

    /// Move the source cell to a unit neighbor, with lateral displacement
    /// enabled. `Conflict` when no move is possible or an operation already
    /// succeeded this invocation.
    pub fn try_move(&mut self, from: CellCoord, to: CellCoord) -> Result<()> {
        self.validate()?;
        if from != self.cell_coord {
            return Err(Error::InvalidArgument);
        }
        let (dx, dy) = unit_delta(from, to)?;

        let source_id = self.chunk.material(self.cell);
        if source_id == EMPTY {
            return Err(Error::NotFound);
        }
        let material = self.world.materials.get(source_id).ok_or(Error::NotFound)?;
        // Unloaded target chunk is reported as such, not as a mere conflict.
        resolve_target(self.world, self.chunk_index, self.local_x, self.local_y, dx, dy)
            .ok_or(Error::NotFound)?;

        let source = SourceCell {
            chunk_index: self.chunk_index,
            local_x: self.local_x,
            local_y: self.local_y,
            cell: self.cell,
            material_id: source_id,
            material,
        };
        if !attempt_move(self.world, &source, self.chunk, dx, dy, true, self.emit_intents, self.out) {
            return Err(Error::Conflict);
        }

        self.operation_done = true;
        self.changed = true;
        Ok(())
    }

    /// Swap the source cell with a non-empty, non-STATIC unit neighbor.
    pub fn try_swap(&mut self, a: CellCoord, b: CellCoord) -> Result<()> {
        self.validate()?;
        if a != self.cell_coord {
            return Err(Error::InvalidArgument);
        }
        let (dx, dy) = unit_delta(a, b)?;

        let source_id = self.chunk.material(self.cell);
        if source_id == EMPTY {
            return Err(Error::NotFound);
        }
        let (target_index, target_cell) =
            resolve_target(self.world, self.chunk_index, self.local_x, self.local_y, dx, dy)
                .ok_or(Error::NotFound)?;

        if target_index == self.chunk_index {
            let target_id = self.chunk.material(target_cell);
            self.check_swap_target(target_id)?;
            self.chunk.set_material(target_cell, source_id);
            self.chunk.set_material(self.cell, target_id);
            self.chunk.swap_payload_within(self.cell, target_cell, &mut self.out.scratch);
            self.chunk.idle_ticks = 0;
            self.chunk.awake = self.chunk.live_cells > 0;
            self.chunk.updated_set(target_cell);
            self.out.emitted_moves += 1;
        } else if self.emit_intents {
            let target_id = self.world.chunks[target_index].data.read().material(target_cell);
            self.check_swap_target(target_id)?;
            self.out.push(Intent {
                src_chunk: self.chunk_index as u32,
                tgt_chunk: target_index as u32,
                src_cell: self.cell,
                tgt_cell: target_cell,
                src_material: source_id,
                tgt_material: target_id,
            });
            self.out.emitted_moves += 1;
        } else {
            let mut target = self.world.chunks[target_index].data.write();
            let target_id = target.material(target_cell);
            self.check_swap_target(target_id)?;
            target.set_material(target_cell, source_id);
            self.chunk.set_material(self.cell, target_id);
            self.chunk.swap_payload_with(self.cell, &mut target, target_cell, &mut self.out.scratch);
            self.chunk.idle_ticks = 0;
            target.idle_ticks = 0;
            self.chunk.awake = self.chunk.live_cells > 0;
            target.awake = target.live_cells > 0;
            target.updated_set(target_cell);
            self.out.emitted_moves += 1;
        }

        self.operation_done = true;
        self.changed = true;
        Ok(())
    }

    /// Replace the source cell's material. The destructor runs iff the id
    /// changes; a same-id call without bytes only marks the updated-mask;
    /// `new_id == EMPTY` clears the cell.
    pub fn transform(&mut self, cell: CellCoord, new_id: MaterialId, bytes: Option<&[u8]>) -> Result<()> {
        self.validate()?;
        if cell != self.cell_coord {
            return Err(Error::InvalidArgument);
        }

        let old_id = self.chunk.material(self.cell);
        if old_id == EMPTY {
            return Err(Error::NotFound);
        }
        let old = self.world.materials.get(old_id).ok_or(Error::NotFound)?;

        if new_id == EMPTY {
            self.chunk.release_payload(self.cell, old);
            self.chunk.set_material(self.cell, EMPTY);
            self.chunk.live_cells = self.chunk.live_cells.saturating_sub(1);
        } else {
            let new = self.world.materials.get(new_id).ok_or(Error::NotFound)?;
            if new_id != old_id {
                self.chunk.release_payload(self.cell, old);
            } else if bytes.is_none() {
                self.chunk.updated_set(self.cell);
                self.operation_done = true;
                self.changed = true;
                return Ok(());
            }
            self.chunk.write_payload(self.cell, new, bytes);
            self.chunk.set_material(self.cell, new_id);
        }

        self.chunk.idle_ticks = 0;
        self.chunk.awake = self.chunk.live_cells > 0;
        self.chunk.updated_set(self.cell);
        self.operation_done = true;
        self.changed = true;
        Ok(())
    }

    /// Fresh deterministic draw for this cell and tick; the salt counter
    /// makes repeated draws within one invocation independent while staying
    /// stable across reruns with an equal seed.
    pub fn random_u32(&mut self) -> u32 {
        let salt = SALT_CONTEXT_BASE.wrapping_add(self.random_counter);
        self.random_counter += 1;
        step_random(self.world.seed, self.tick, self.chunk_x, self.chunk_y, self.local_x, self.local_y, salt)
    }

    fn validate(&self) -> Result<()> {
        if self.operation_done {
            return Err(Error::Conflict);
        }
        Ok(())
    }

    fn check_swap_target(&self, target_id: MaterialId) -> Result<()> {
        if target_id == EMPTY {
            return Err(Error::Conflict);
        }
        let target = self.world.materials.get(target_id).ok_or(Error::NotFound)?;
        if target.is_static() {
            return Err(Error::Conflict);
        }
        Ok(())
    }
}

fn unit_delta(from: CellCoord, to: CellCoord) -> Result<(i32, i32)> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if (dx == 0 && dy == 0) || dx.abs() > 1 || dy.abs() > 1 {
        return Err(Error::InvalidArgument);
    }
    Ok((dx, dy))
}
