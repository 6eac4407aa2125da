//! Displacement rules and the single move/swap primitive.
//!
//! `attempt_move` is the only way cells change place. Intra-chunk effects
//! always mutate directly; cross-chunk effects mutate directly in serial
//! modes and become intents under a checkerboard phase. The caller holds the
//! source chunk's write guard, so targets resolving into the source chunk
//! must go through that guard and never back through the lock.

use crate::chunk::ChunkData;
use crate::coords::wrap_neighbor;
use crate::intent::{Intent, TaskOutput};
use crate::material::{MaterialId, MaterialRecord, EMPTY};
use crate::world::World;

/// The cell a stepper or update hook is currently acting for.
pub(crate) struct SourceCell<'m> {
    pub chunk_index: usize,
    pub local_x: i32,
    pub local_y: i32,
    pub cell: u32,
    pub material_id: MaterialId,
    pub material: &'m MaterialRecord,
}

/// Density predicate for moving into an occupied cell.
pub(crate) fn can_displace(
    source: &MaterialRecord,
    target: &MaterialRecord,
    dy: i32,
    allow_lateral: bool,
) -> bool {
    if target.is_static() {
        return false;
    }
    if dy > 0 {
        source.density > target.density
    } else if dy < 0 {
        source.density < target.density
    } else if allow_lateral {
        source.density != target.density
    } else {
        false
    }
}

/// Resolve a unit-neighbor target to (registry index, cell index), or `None`
/// when the owning chunk is not loaded.
pub(crate) fn resolve_target(
    world: &World,
    chunk_index: usize,
    local_x: i32,
    local_y: i32,
    dx: i32,
    dy: i32,
) -> Option<(usize, u32)> {
    let slot = &world.chunks[chunk_index];
    let (target_cx, target_lx) = wrap_neighbor(slot.cx, local_x, dx, world.chunk_width);
    let (target_cy, target_ly) = wrap_neighbor(slot.cy, local_y, dy, world.chunk_height);
    let target_index = world.find_chunk(target_cx, target_cy)?;
    Some((target_index, (target_ly * world.chunk_width + target_lx) as u32))
}

/// Try to move or displace `source` by `(dx, dy)`. Returns whether the
/// candidate succeeded (including by emitting an intent).
pub(crate) fn attempt_move(
    world: &World,
    source: &SourceCell<'_>,
    chunk: &mut ChunkData,
    dx: i32,
    dy: i32,
    allow_lateral: bool,
    emit_intents: bool,
    out: &mut TaskOutput,
) -> bool {
    let Some((target_index, target_cell)) =
        resolve_target(world, source.chunk_index, source.local_x, source.local_y, dx, dy)
    else {
        return false;
    };

    if target_index == source.chunk_index {
        return move_within_chunk(world, source, chunk, target_cell, dy, allow_lateral, out);
    }

    if emit_intents {
        // Foreign chunks are read-only inside a phase: record the observed
        // materials and let the resolver re-check them.
        let target_id = world.chunks[target_index].data.read().material(target_cell);
        if target_id != EMPTY {
            let Some(target_material) = world.materials.get(target_id) else {
                return false;
            };
            if !can_displace(source.material, target_material, dy, allow_lateral) {
                return false;
            }
        }
        out.push(Intent {
            src_chunk: source.chunk_index as u32,
            tgt_chunk: target_index as u32,
            src_cell: source.cell,
            tgt_cell: target_cell,
            src_material: source.material_id,
            tgt_material: target_id,
        });
        out.emitted_moves += 1;
        return true;
    }

    let mut target = world.chunks[target_index].data.write();
    let target_id = target.material(target_cell);
    if target_id != EMPTY {
        let Some(target_material) = world.materials.get(target_id) else {
            return false;
        };
        if !can_displace(source.material, target_material, dy, allow_lateral) {
            return false;
        }
        target.set_material(target_cell, source.material_id);
        chunk.set_material(source.cell, target_id);
        chunk.swap_payload_with(source.cell, &mut target, target_cell, &mut out.scratch);
    } else {
        target.set_material(target_cell, source.material_id);
        chunk.set_material(source.cell, EMPTY);
        chunk.move_payload_to(source.cell, &mut target, target_cell, source.material);
        chunk.live_cells = chunk.live_cells.saturating_sub(1);
        target.live_cells += 1;
    }

    chunk.idle_ticks = 0;
    target.idle_ticks = 0;
    chunk.awake = chunk.live_cells > 0;
    target.awake = target.live_cells > 0;
    target.updated_set(target_cell);
    out.emitted_moves += 1;
    true
}

fn move_within_chunk(
    world: &World,
    source: &SourceCell<'_>,
    chunk: &mut ChunkData,
    target_cell: u32,
    dy: i32,
    allow_lateral: bool,
    out: &mut TaskOutput,
) -> bool {
    let target_id = chunk.material(target_cell);
    if target_id != EMPTY {
        let Some(target_material) = world.materials.get(target_id) else {
            return false;
        };
        if !can_displace(source.material, target_material, dy, allow_lateral) {
            return false;
        }
        chunk.set_material(target_cell, source.material_id);
        chunk.set_material(source.cell, target_id);
        chunk.swap_payload_within(source.cell, target_cell, &mut out.scratch);
    } else {
        chunk.set_material(target_cell, source.material_id);
        chunk.set_material(source.cell, EMPTY);
        chunk.move_payload_within(source.cell, target_cell, source.material, &mut out.scratch);
    }

    chunk.idle_ticks = 0;
    chunk.awake = chunk.live_cells > 0;
    chunk.updated_set(target_cell);
    out.emitted_moves += 1;
    true
}
