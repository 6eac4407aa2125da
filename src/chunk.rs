//! Chunk storage: dense per-chunk arrays plus the updated-mask bitmap.
//!
//! A chunk owns three parallel arrays sized `W·H`: material ids, inline
//! payload bytes (cell `i` occupies `[i·P, i·P+P)`), and one bit per cell
//! marking cells that were already the destination of a move or transform
//! this tick. Cell data sits behind a `RwLock` so a checkerboard task can
//! write its own chunk while neighbors probe it read-only.

use parking_lot::RwLock;

use crate::error::Result;
use crate::material::{MaterialId, MaterialRecord, EMPTY};

/// Consecutive no-change ticks before a chunk goes to sleep.
pub(crate) const SLEEP_THRESHOLD: u32 = 8;

pub(crate) struct ChunkData {
    payload_stride: u16,
    materials: Vec<MaterialId>,
    payload: Vec<u8>,
    updated: Vec<u8>,
    pub live_cells: u32,
    pub idle_ticks: u32,
    pub awake: bool,
}

impl ChunkData {
    pub fn new(cells: u32, payload_stride: u16) -> Result<Self> {
        let cells = cells as usize;
        let mask_bytes = cells.div_ceil(8);
        let payload_bytes = cells * payload_stride as usize;

        let mut materials = Vec::new();
        materials.try_reserve_exact(cells)?;
        materials.resize(cells, EMPTY);

        let mut payload = Vec::new();
        payload.try_reserve_exact(payload_bytes)?;
        payload.resize(payload_bytes, 0);

        let mut updated = Vec::new();
        updated.try_reserve_exact(mask_bytes)?;
        updated.resize(mask_bytes, 0);

        Ok(Self {
            payload_stride,
            materials,
            payload,
            updated,
            live_cells: 0,
            idle_ticks: 0,
            awake: false,
        })
    }

    #[inline]
    pub fn material(&self, cell: u32) -> MaterialId {
        self.materials[cell as usize]
    }

    #[inline]
    pub fn set_material(&mut self, cell: u32, id: MaterialId) {
        self.materials[cell as usize] = id;
    }

    // === Updated-mask bits ===

    #[inline]
    pub fn updated_test(&self, cell: u32) -> bool {
        let byte = (cell >> 3) as usize;
        let bit = cell & 7;
        (self.updated[byte] >> bit) & 1 != 0
    }

    #[inline]
    pub fn updated_set(&mut self, cell: u32) {
        let byte = (cell >> 3) as usize;
        let bit = cell & 7;
        self.updated[byte] |= 1 << bit;
    }

    #[inline]
    pub fn clear_updated(&mut self) {
        self.updated.fill(0);
    }

    // === Payload slots ===

    #[inline]
    pub fn payload(&self, cell: u32) -> &[u8] {
        let stride = self.payload_stride as usize;
        let start = cell as usize * stride;
        &self.payload[start..start + stride]
    }

    #[inline]
    pub fn payload_mut(&mut self, cell: u32) -> &mut [u8] {
        let stride = self.payload_stride as usize;
        let start = cell as usize * stride;
        &mut self.payload[start..start + stride]
    }

    /// Run the destructor (if any) and zero the slot. No-op for payloadless
    /// materials, whose slots are already zero.
    pub fn release_payload(&mut self, cell: u32, material: &MaterialRecord) {
        if self.payload_stride == 0 || material.payload_size == 0 {
            return;
        }
        let slot = self.payload_mut(cell);
        if let Some(dtor) = &material.payload_dtor {
            dtor(slot);
        }
        slot.fill(0);
    }

    /// Zero the slot, then fill it from the supplied bytes (truncated to the
    /// material's payload size, zero-extended to the stride) or from the
    /// material's constructor.
    pub fn write_payload(&mut self, cell: u32, material: &MaterialRecord, bytes: Option<&[u8]>) {
        if self.payload_stride == 0 || material.payload_size == 0 {
            return;
        }
        let size = material.payload_size as usize;
        let slot = self.payload_mut(cell);
        slot.fill(0);
        match bytes {
            Some(bytes) => {
                let n = bytes.len().min(size);
                slot[..n].copy_from_slice(&bytes[..n]);
            }
            None => {
                if let Some(ctor) = &material.payload_ctor {
                    ctor(slot);
                }
            }
        }
    }

    /// Relocate a payload image between two cells of this chunk: zero the
    /// target, run the move hook (or byte-copy), zero the source.
    pub fn move_payload_within(&mut self, from: u32, to: u32, material: &MaterialRecord, scratch: &mut [u8]) {
        if self.payload_stride == 0 || material.payload_size == 0 {
            return;
        }
        let stride = self.payload_stride as usize;
        scratch[..stride].copy_from_slice(self.payload(from));
        self.payload_mut(from).fill(0);
        let target = self.payload_mut(to);
        target.fill(0);
        match &material.payload_move {
            Some(mv) => mv(target, &scratch[..stride]),
            None => target[..material.payload_size as usize]
                .copy_from_slice(&scratch[..material.payload_size as usize]),
        }
    }

    /// Relocate a payload image into another chunk.
    pub fn move_payload_to(&mut self, from: u32, other: &mut ChunkData, to: u32, material: &MaterialRecord) {
        if self.payload_stride == 0 || material.payload_size == 0 {
            return;
        }
        let source = self.payload_mut(from);
        let target = other.payload_mut(to);
        target.fill(0);
        match &material.payload_move {
            Some(mv) => mv(target, source),
            None => target[..material.payload_size as usize]
                .copy_from_slice(&source[..material.payload_size as usize]),
        }
        source.fill(0);
    }

    /// Exchange two payload slots of this chunk through a scratch buffer.
    pub fn swap_payload_within(&mut self, a: u32, b: u32, scratch: &mut [u8]) {
        if self.payload_stride == 0 {
            return;
        }
        let stride = self.payload_stride as usize;
        scratch[..stride].copy_from_slice(self.payload(a));
        let (a_start, b_start) = (a as usize * stride, b as usize * stride);
        self.payload.copy_within(b_start..b_start + stride, a_start);
        self.payload[b_start..b_start + stride].copy_from_slice(&scratch[..stride]);
    }

    /// Exchange a payload slot with one in another chunk.
    pub fn swap_payload_with(&mut self, own: u32, other: &mut ChunkData, theirs: u32, scratch: &mut [u8]) {
        if self.payload_stride == 0 {
            return;
        }
        let stride = self.payload_stride as usize;
        let a = self.payload_mut(own);
        let b = other.payload_mut(theirs);
        scratch[..stride].copy_from_slice(a);
        a.copy_from_slice(b);
        b.copy_from_slice(&scratch[..stride]);
    }
}

/// Registry entry: chunk coordinates plus the locked cell data. The registry
/// stays strictly sorted by `(cy, cx)`.
pub(crate) struct ChunkSlot {
    pub cx: i32,
    pub cy: i32,
    pub data: RwLock<ChunkData>,
}

impl ChunkSlot {
    /// Registry sort key.
    #[inline]
    pub fn key(&self) -> (i32, i32) {
        (self.cy, self.cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{BehaviorKind, MaterialFlags};

    fn record(size: u16) -> MaterialRecord {
        MaterialRecord {
            name: "probe".into(),
            flags: MaterialFlags::SOLID,
            density: 1.0,
            friction: 0.0,
            dispersion: 0.0,
            payload_size: size,
            payload_align: 1,
            payload_ctor: None,
            payload_dtor: None,
            payload_move: None,
            update: None,
            behavior: BehaviorKind::Inert,
        }
    }

    #[test]
    fn mask_bits_round_trip() {
        let mut chunk = ChunkData::new(64, 0).unwrap();
        assert!(!chunk.updated_test(13));
        chunk.updated_set(13);
        chunk.updated_set(63);
        assert!(chunk.updated_test(13));
        assert!(chunk.updated_test(63));
        assert!(!chunk.updated_test(14));
        chunk.clear_updated();
        assert!(!chunk.updated_test(13));
    }

    #[test]
    fn write_payload_zero_extends() {
        let mut chunk = ChunkData::new(4, 8).unwrap();
        chunk.payload_mut(1).fill(0xFF);
        chunk.write_payload(1, &record(4), Some(&[1, 2]));
        assert_eq!(chunk.payload(1), &[1, 2, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn swap_within_exchanges_full_slots() {
        let mut chunk = ChunkData::new(4, 4).unwrap();
        chunk.payload_mut(0).copy_from_slice(&[1, 1, 1, 1]);
        chunk.payload_mut(3).copy_from_slice(&[2, 2, 2, 2]);
        let mut scratch = vec![0u8; 4];
        chunk.swap_payload_within(0, 3, &mut scratch);
        assert_eq!(chunk.payload(0), &[2, 2, 2, 2]);
        assert_eq!(chunk.payload(3), &[1, 1, 1, 1]);
    }

    #[test]
    fn move_between_chunks_clears_source() {
        let mut a = ChunkData::new(4, 4).unwrap();
        let mut b = ChunkData::new(4, 4).unwrap();
        a.payload_mut(2).copy_from_slice(&[7, 8, 0, 0]);
        a.move_payload_to(2, &mut b, 1, &record(2));
        assert_eq!(a.payload(2), &[0, 0, 0, 0]);
        assert_eq!(b.payload(1), &[7, 8, 0, 0]);
    }
}
