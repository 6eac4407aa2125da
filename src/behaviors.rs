//! Builtin movement behaviors for powder, liquid and gas materials.
//!
//! Each behavior is a fixed candidate-delta order probed through
//! `attempt_move`; the first successful candidate wins. The primary side is
//! a per-cell PRNG parity bit drawn by the stepper, so streams of the same
//! material spread symmetrically over time without any per-cell state.

use crate::chunk::ChunkData;
use crate::intent::TaskOutput;
use crate::world::moves::{attempt_move, SourceCell};
use crate::world::World;

/// Powder: straight down, then the primary diagonal, then the other.
pub(crate) fn step_powder(
    world: &World,
    source: &SourceCell<'_>,
    chunk: &mut ChunkData,
    primary_left: bool,
    emit_intents: bool,
    out: &mut TaskOutput,
) -> bool {
    let first = if primary_left { -1 } else { 1 };
    attempt_move(world, source, chunk, 0, 1, false, emit_intents, out)
        || attempt_move(world, source, chunk, first, 1, false, emit_intents, out)
        || attempt_move(world, source, chunk, -first, 1, false, emit_intents, out)
}

/// Liquid: down, then sideways (primary side first), then the diagonals.
pub(crate) fn step_liquid(
    world: &World,
    source: &SourceCell<'_>,
    chunk: &mut ChunkData,
    primary_left: bool,
    emit_intents: bool,
    out: &mut TaskOutput,
) -> bool {
    let first = if primary_left { -1 } else { 1 };
    attempt_move(world, source, chunk, 0, 1, false, emit_intents, out)
        || attempt_move(world, source, chunk, first, 0, false, emit_intents, out)
        || attempt_move(world, source, chunk, -first, 0, false, emit_intents, out)
        || attempt_move(world, source, chunk, first, 1, false, emit_intents, out)
        || attempt_move(world, source, chunk, -first, 1, false, emit_intents, out)
}

/// Gas: up, then sideways (primary side first), then the rising diagonals.
pub(crate) fn step_gas(
    world: &World,
    source: &SourceCell<'_>,
    chunk: &mut ChunkData,
    primary_left: bool,
    emit_intents: bool,
    out: &mut TaskOutput,
) -> bool {
    let first = if primary_left { -1 } else { 1 };
    attempt_move(world, source, chunk, 0, -1, false, emit_intents, out)
        || attempt_move(world, source, chunk, first, 0, false, emit_intents, out)
        || attempt_move(world, source, chunk, -first, 0, false, emit_intents, out)
        || attempt_move(world, source, chunk, first, -1, false, emit_intents, out)
        || attempt_move(world, source, chunk, -first, -1, false, emit_intents, out)
}
