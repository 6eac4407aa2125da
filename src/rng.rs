//! Deterministic per-cell randomness.
//!
//! Every draw is a pure function of (seed, tick, chunk, local cell, salt), so
//! the simulation replays identically for a fixed seed no matter how chunks
//! are scheduled across workers.

/// Salt for the per-row scan-direction draw.
pub(crate) const SALT_ROW_DIRECTION: u32 = 0x71;
/// Salt for the per-cell primary-side draw.
pub(crate) const SALT_PRIMARY_SIDE: u32 = 0xAB;
/// Base salt for update-context draws; the per-invocation counter is added.
pub(crate) const SALT_CONTEXT_BASE: u32 = 0xC001;

const TICK_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;
const SALT_GAMMA: u64 = 0xd6e8_feb8_6659_fd93;
const MIX_1: u64 = 0xbf58_476d_1ce4_e5b9;
const MIX_2: u64 = 0x94d0_49bb_1331_11eb;

/// splitmix64 finalizer.
#[inline]
pub(crate) fn mix64(mut value: u64) -> u64 {
    value ^= value >> 30;
    value = value.wrapping_mul(MIX_1);
    value ^= value >> 27;
    value = value.wrapping_mul(MIX_2);
    value ^= value >> 31;
    value
}

/// Stateless draw for one cell at one tick.
#[inline]
pub fn step_random(seed: u64, tick: u64, chunk_x: i32, chunk_y: i32, local_x: i32, local_y: i32, salt: u32) -> u32 {
    let mut key = seed;
    key ^= tick.wrapping_mul(TICK_GAMMA);
    key ^= ((chunk_x as u32 as u64) << 32) ^ (chunk_y as u32 as u64);
    key ^= ((local_x as u32 as u64) << 32) ^ (local_y as u32 as u64);
    key ^= (salt as u64).wrapping_mul(SALT_GAMMA);
    mix64(key) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_inputs_identical_outputs() {
        let a = step_random(42, 7, -3, 1, 10, 20, SALT_PRIMARY_SIDE);
        let b = step_random(42, 7, -3, 1, 10, 20, SALT_PRIMARY_SIDE);
        assert_eq!(a, b);
    }

    #[test]
    fn fields_separate_the_streams() {
        let base = step_random(1, 1, 0, 0, 0, 0, 0);
        assert_ne!(base, step_random(2, 1, 0, 0, 0, 0, 0));
        assert_ne!(base, step_random(1, 2, 0, 0, 0, 0, 0));
        assert_ne!(base, step_random(1, 1, 1, 0, 0, 0, 0));
        assert_ne!(base, step_random(1, 1, 0, 0, 1, 0, 0));
        assert_ne!(base, step_random(1, 1, 0, 0, 0, 0, 1));
    }

    #[test]
    fn salts_do_not_collide_across_counter_range() {
        let row = step_random(9, 3, 0, 0, 0, 5, SALT_ROW_DIRECTION);
        let side = step_random(9, 3, 0, 0, 0, 5, SALT_PRIMARY_SIDE);
        let ctx = step_random(9, 3, 0, 0, 0, 5, SALT_CONTEXT_BASE);
        assert_ne!(row, side);
        assert_ne!(side, ctx);
    }
}
