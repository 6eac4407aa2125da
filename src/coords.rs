//! Coordinate algebra: splitting absolute cell coordinates into
//! (chunk, local) pairs and stepping to unit neighbors across chunk seams.

use serde::{Deserialize, Serialize};

/// Absolute cell position on the unbounded grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
}

impl CellCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Neighbor at the given delta.
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }
}

/// Split an absolute coordinate into (chunk, local) for a chunk extent.
///
/// The local part is always in `0..extent`, also for negative coordinates:
/// `split_coord(-1, 64)` is chunk `-1`, local `63`.
#[inline]
pub(crate) fn split_coord(value: i32, extent: i32) -> (i32, i32) {
    let mut local = value % extent;
    if local < 0 {
        local += extent;
    }
    ((value - local) / extent, local)
}

/// Step one chunk-relative coordinate by a unit delta, wrapping through the
/// chunk boundary. Returns the adjusted (chunk, local) pair.
#[inline]
pub(crate) fn wrap_neighbor(chunk: i32, local: i32, delta: i32, extent: i32) -> (i32, i32) {
    let mut chunk = chunk;
    let mut local = local + delta;
    if local < 0 {
        chunk -= 1;
        local += extent;
    } else if local >= extent {
        chunk += 1;
        local -= extent;
    }
    (chunk, local)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_handles_negative_coordinates() {
        assert_eq!(split_coord(0, 64), (0, 0));
        assert_eq!(split_coord(63, 64), (0, 63));
        assert_eq!(split_coord(64, 64), (1, 0));
        assert_eq!(split_coord(-1, 64), (-1, 63));
        assert_eq!(split_coord(-64, 64), (-1, 0));
        assert_eq!(split_coord(-65, 64), (-2, 63));
    }

    #[test]
    fn split_round_trips() {
        for v in -200..200 {
            let (chunk, local) = split_coord(v, 8);
            assert!((0..8).contains(&local));
            assert_eq!(chunk * 8 + local, v);
        }
    }

    #[test]
    fn wrap_steps_through_chunk_seams() {
        assert_eq!(wrap_neighbor(0, 0, -1, 8), (-1, 7));
        assert_eq!(wrap_neighbor(0, 7, 1, 8), (1, 0));
        assert_eq!(wrap_neighbor(3, 4, 0, 8), (3, 4));
        assert_eq!(wrap_neighbor(-1, 0, -1, 8), (-2, 7));
    }
}
