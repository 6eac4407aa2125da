//! One tick of a single chunk.
//!
//! Rows scan bottom-to-top; the horizontal direction of each row and the
//! primary side of each cell come from the deterministic PRNG, so the scan
//! is reproducible for a fixed seed regardless of scheduling. Cells already
//! written this tick (updated-mask), empty cells and STATIC materials are
//! skipped.

use crate::behaviors::{step_gas, step_liquid, step_powder};
use crate::chunk::SLEEP_THRESHOLD;
use crate::coords::CellCoord;
use crate::intent::TaskOutput;
use crate::material::{BehaviorKind, EMPTY};
use crate::rng::{step_random, SALT_PRIMARY_SIDE, SALT_ROW_DIRECTION};
use crate::world::ctx::UpdateCtx;
use crate::world::moves::SourceCell;
use crate::world::World;

/// Step one chunk for `tick`. Under a parallel phase (`emit_intents`) the
/// chunk's awake flag is written raw and cross-chunk effects land in `out`;
/// the scheduler republishes world aggregates afterwards. Returns whether
/// anything changed.
pub(crate) fn step_chunk(
    world: &World,
    chunk_index: usize,
    tick: u64,
    emit_intents: bool,
    out: &mut TaskOutput,
) -> bool {
    let slot = &world.chunks[chunk_index];
    let (chunk_x, chunk_y) = (slot.cx, slot.cy);
    let mut chunk = slot.data.write();

    if chunk.live_cells == 0 {
        chunk.idle_ticks = 0;
        chunk.awake = false;
        out.changed = false;
        return false;
    }

    let mut changed = false;
    let width = world.chunk_width;

    for y in (0..world.chunk_height).rev() {
        let left_to_right =
            step_random(world.seed, tick, chunk_x, chunk_y, 0, y, SALT_ROW_DIRECTION) & 1 != 0;
        for step_x in 0..width {
            let x = if left_to_right { step_x } else { width - 1 - step_x };
            let cell = (y * width + x) as u32;

            if chunk.updated_test(cell) {
                continue;
            }
            let material_id = chunk.material(cell);
            if material_id == EMPTY {
                continue;
            }
            let Some(material) = world.materials.get(material_id) else {
                continue;
            };
            if material.is_static() {
                continue;
            }

            let primary_left =
                step_random(world.seed, tick, chunk_x, chunk_y, x, y, SALT_PRIMARY_SIDE) & 1 != 0;

            let moved = match material.behavior {
                BehaviorKind::Custom => {
                    let hook = material.update.as_ref();
                    let mut ctx = UpdateCtx {
                        world,
                        chunk_index,
                        chunk: &mut *chunk,
                        chunk_x,
                        chunk_y,
                        local_x: x,
                        local_y: y,
                        cell,
                        cell_coord: CellCoord::new(chunk_x * width + x, chunk_y * world.chunk_height + y),
                        material_id,
                        tick,
                        emit_intents,
                        out: &mut *out,
                        random_counter: 0,
                        operation_done: false,
                        changed: false,
                    };
                    if let Some(hook) = hook {
                        hook(&mut ctx);
                    }
                    ctx.changed
                }
                BehaviorKind::Gas | BehaviorKind::Liquid | BehaviorKind::Powder => {
                    let source = SourceCell {
                        chunk_index,
                        local_x: x,
                        local_y: y,
                        cell,
                        material_id,
                        material,
                    };
                    match material.behavior {
                        BehaviorKind::Gas => step_gas(world, &source, &mut chunk, primary_left, emit_intents, out),
                        BehaviorKind::Liquid => step_liquid(world, &source, &mut chunk, primary_left, emit_intents, out),
                        _ => step_powder(world, &source, &mut chunk, primary_left, emit_intents, out),
                    }
                }
                BehaviorKind::Inert => false,
            };

            if moved {
                changed = true;
            }
        }
    }

    if emit_intents && !out.intents.is_empty() {
        changed = true;
    }

    if chunk.live_cells == 0 {
        chunk.idle_ticks = 0;
        chunk.awake = false;
    } else if changed {
        chunk.idle_ticks = 0;
        chunk.awake = true;
    } else {
        chunk.idle_ticks = chunk.idle_ticks.saturating_add(1);
        if chunk.idle_ticks >= SLEEP_THRESHOLD {
            chunk.awake = false;
        }
    }

    out.changed = changed;
    changed
}
