//! Chunk registry and point cell I/O.
//!
//! The registry is kept strictly sorted by `(cy, cx)` so lookup is a binary
//! search and iteration order is stable. Cell writes follow the payload
//! discipline: any change of material id runs the old destructor before the
//! new write; a same-id overwrite with supplied bytes is a fresh write
//! without a destructor.

use parking_lot::{RwLock, RwLockReadGuard};

use crate::chunk::{ChunkData, ChunkSlot};
use crate::coords::{split_coord, CellCoord};
use crate::error::{Error, Result};
use crate::material::{MaterialId, EMPTY};
use crate::world::{Counters, World};

/// Read-only view of one cell, holding the chunk read lock for its
/// lifetime.
pub struct CellRef<'a> {
    guard: RwLockReadGuard<'a, ChunkData>,
    cell: u32,
    payload_size: u16,
}

impl CellRef<'_> {
    pub fn material_id(&self) -> MaterialId {
        self.guard.material(self.cell)
    }

    /// The payload slot, `None` for empty cells and payloadless materials.
    pub fn payload(&self) -> Option<&[u8]> {
        if self.payload_size == 0 {
            return None;
        }
        Some(&self.guard.payload(self.cell)[..self.payload_size as usize])
    }
}

/// Flip a chunk's awake flag while keeping the world-level count in sync.
/// Only for paths that already hold `&mut World`; parallel tasks write the
/// flag alone and the scheduler recomputes the count.
pub(crate) fn set_awake_counted(counters: &mut Counters, chunk: &mut ChunkData, awake: bool) {
    if chunk.awake == awake {
        return;
    }
    chunk.awake = awake;
    if awake {
        counters.awake_chunks += 1;
    } else {
        counters.awake_chunks = counters.awake_chunks.saturating_sub(1);
    }
}

impl World {
    /// Registry position of a loaded chunk.
    pub(crate) fn find_chunk(&self, cx: i32, cy: i32) -> Option<usize> {
        self.chunks.binary_search_by_key(&(cy, cx), ChunkSlot::key).ok()
    }

    pub fn is_chunk_loaded(&self, cx: i32, cy: i32) -> bool {
        self.find_chunk(cx, cy).is_some()
    }

    /// Resolve an absolute coordinate to (registry index, cell index).
    pub(crate) fn locate(&self, cell: CellCoord) -> Result<(usize, u32)> {
        let (chunk_x, local_x) = split_coord(cell.x, self.chunk_width);
        let (chunk_y, local_y) = split_coord(cell.y, self.chunk_height);
        let index = self.find_chunk(chunk_x, chunk_y).ok_or(Error::NotFound)?;
        Ok((index, (local_y * self.chunk_width + local_x) as u32))
    }

    /// Load a zeroed chunk at the given chunk coordinates.
    pub fn load_chunk(&mut self, cx: i32, cy: i32) -> Result<()> {
        let position = match self.chunks.binary_search_by_key(&(cy, cx), ChunkSlot::key) {
            Ok(_) => return Err(Error::AlreadyExists),
            Err(position) => position,
        };
        if self.chunks.len() >= u32::MAX as usize {
            return Err(Error::CapacityReached);
        }
        self.chunks.try_reserve(1)?;

        let data = ChunkData::new(self.cells_per_chunk, self.payload_bytes)?;
        self.chunks.insert(position, ChunkSlot { cx, cy, data: RwLock::new(data) });
        log::debug!("loaded chunk ({cx}, {cy})");
        Ok(())
    }

    /// Unload a chunk, running destructors on every live payload.
    pub fn unload_chunk(&mut self, cx: i32, cy: i32) -> Result<()> {
        let index = self.find_chunk(cx, cy).ok_or(Error::NotFound)?;
        let slot = self.chunks.remove(index);
        let mut data = slot.data.into_inner();

        for cell in 0..self.cells_per_chunk {
            let id = data.material(cell);
            if id == EMPTY {
                continue;
            }
            if let Some(material) = self.materials.get(id) {
                data.release_payload(cell, material);
            }
        }

        self.counters.live_cells = self.counters.live_cells.saturating_sub(u64::from(data.live_cells));
        if data.awake {
            self.counters.awake_chunks = self.counters.awake_chunks.saturating_sub(1);
        }
        log::debug!("unloaded chunk ({cx}, {cy}) with {} live cells", data.live_cells);
        Ok(())
    }

    /// Read one cell. Fails with `NotFound` when the owning chunk is not
    /// loaded.
    pub fn cell_get(&self, cell: CellCoord) -> Result<CellRef<'_>> {
        let (index, cell_index) = self.locate(cell)?;
        let guard = self.chunks[index].data.read();
        let id = guard.material(cell_index);
        let payload_size = if id == EMPTY {
            0
        } else {
            self.materials.get(id).ok_or(Error::NotFound)?.payload_size
        };
        Ok(CellRef { guard, cell: cell_index, payload_size })
    }

    /// Write one cell. `EMPTY` delegates to [`World::cell_clear`]; supplied
    /// bytes are copied (payload-size prefix, zero-extended), absent bytes
    /// run the material's constructor or leave zeros.
    pub fn cell_set(&mut self, cell: CellCoord, id: MaterialId, payload: Option<&[u8]>) -> Result<()> {
        if id == EMPTY {
            return self.cell_clear(cell);
        }
        let material = self.materials.get(id).ok_or(Error::NotFound)?;
        let (index, cell_index) = self.locate(cell)?;

        let data = self.chunks[index].data.get_mut();
        let old_id = data.material(cell_index);
        if old_id != id {
            if let Some(old) = self.materials.get(old_id) {
                data.release_payload(cell_index, old);
            }
        } else if payload.is_none() {
            // Same-id overwrite with supplied bytes is a fresh write without
            // the destructor; a same-id reset reconstructs.
            data.release_payload(cell_index, material);
        }

        data.write_payload(cell_index, material, payload);
        data.set_material(cell_index, id);

        if old_id == EMPTY {
            data.live_cells += 1;
            self.counters.live_cells += 1;
        }
        data.idle_ticks = 0;
        let awake = data.live_cells > 0;
        set_awake_counted(&mut self.counters, data, awake);
        Ok(())
    }

    /// Clear one cell, destructing its payload. Clearing an already empty
    /// cell is a no-op.
    pub fn cell_clear(&mut self, cell: CellCoord) -> Result<()> {
        let (index, cell_index) = self.locate(cell)?;
        let slot = &mut self.chunks[index];
        let data = slot.data.get_mut();

        let old_id = data.material(cell_index);
        if old_id == EMPTY {
            return Ok(());
        }
        if let Some(old) = self.materials.get(old_id) {
            data.release_payload(cell_index, old);
        }
        data.set_material(cell_index, EMPTY);
        data.live_cells = data.live_cells.saturating_sub(1);
        self.counters.live_cells = self.counters.live_cells.saturating_sub(1);
        data.idle_ticks = 0;
        let awake = data.live_cells > 0;
        set_awake_counted(&mut self.counters, data, awake);
        Ok(())
    }
}
