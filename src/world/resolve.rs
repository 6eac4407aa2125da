//! Cross-chunk intent merge.
//!
//! Runs single-threaded after each checkerboard phase. All task buffers are
//! concatenated in task order and stably sorted by
//! `(target chunk, target cell, source chunk, source cell)`; that key is a
//! total order over a snapshot taken before resolution, so the surviving
//! intent per target does not depend on task completion order.

use crate::chunk::ChunkSlot;
use crate::error::Result;
use crate::intent::{Intent, TaskOutput};
use crate::material::EMPTY;
use crate::world::World;

impl World {
    /// Merge per-task intents and apply at most one per target cell; every
    /// further intent in a target-run counts as a conflict.
    pub(crate) fn resolve_intents(&mut self, outputs: Vec<TaskOutput>) -> Result<()> {
        let total: usize = outputs.iter().map(|output| output.intents.len()).sum();
        if total == 0 {
            return Ok(());
        }

        let mut merged: Vec<Intent> = Vec::new();
        merged.try_reserve_exact(total)?;
        for output in &outputs {
            merged.extend_from_slice(&output.intents);
        }
        merged.sort_by_key(Intent::sort_key);

        let mut applied_total = 0u64;
        let mut index = 0;
        while index < merged.len() {
            let mut run_end = index + 1;
            while run_end < merged.len()
                && merged[run_end].tgt_chunk == merged[index].tgt_chunk
                && merged[run_end].tgt_cell == merged[index].tgt_cell
            {
                run_end += 1;
            }
            self.counters.intent_conflicts += (run_end - index - 1) as u64;

            // First viable intent of the run wins; later ones are only
            // tried when an earlier one fails its precondition re-check.
            let mut applied = false;
            for intent in &merged[index..run_end] {
                if !applied && self.apply_intent(intent) {
                    applied = true;
                    applied_total += 1;
                }
            }
            index = run_end;
        }

        log::trace!("resolved {total} intents, applied {applied_total}");
        Ok(())
    }

    /// Apply one intent if its emission-time snapshot still holds. Both
    /// chunks are woken and the target cell is masked for the rest of the
    /// tick.
    fn apply_intent(&mut self, intent: &Intent) -> bool {
        let src_index = intent.src_chunk as usize;
        let tgt_index = intent.tgt_chunk as usize;
        if src_index >= self.chunks.len() || tgt_index >= self.chunks.len() || src_index == tgt_index {
            return false;
        }
        if intent.src_cell >= self.cells_per_chunk || intent.tgt_cell >= self.cells_per_chunk {
            return false;
        }

        let (src_slot, tgt_slot) = two_slots_mut(&mut self.chunks, src_index, tgt_index);
        let src = src_slot.data.get_mut();
        let tgt = tgt_slot.data.get_mut();

        if src.material(intent.src_cell) != intent.src_material
            || tgt.material(intent.tgt_cell) != intent.tgt_material
        {
            return false;
        }

        if intent.tgt_material == EMPTY {
            let Some(material) = self.materials.get(intent.src_material) else {
                return false;
            };
            tgt.set_material(intent.tgt_cell, intent.src_material);
            src.set_material(intent.src_cell, EMPTY);
            src.move_payload_to(intent.src_cell, tgt, intent.tgt_cell, material);
            src.live_cells = src.live_cells.saturating_sub(1);
            tgt.live_cells += 1;
        } else {
            tgt.set_material(intent.tgt_cell, intent.src_material);
            src.set_material(intent.src_cell, intent.tgt_material);
            src.swap_payload_with(intent.src_cell, tgt, intent.tgt_cell, &mut self.scratch);
        }

        tgt.updated_set(intent.tgt_cell);
        src.idle_ticks = 0;
        tgt.idle_ticks = 0;
        src.awake = src.live_cells > 0;
        tgt.awake = tgt.live_cells > 0;
        true
    }
}

/// Disjoint mutable access to two registry slots.
fn two_slots_mut(chunks: &mut [ChunkSlot], a: usize, b: usize) -> (&mut ChunkSlot, &mut ChunkSlot) {
    if a < b {
        let (left, right) = chunks.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = chunks.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}
