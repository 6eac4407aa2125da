//! Material registry: stable 16-bit ids mapped to behavior descriptors.
//!
//! Materials are create-only within a world. Id `0` is reserved for empty
//! cells and never registered. Chunks refer to materials exclusively by id,
//! so records can own their hooks without any back-references.

use bitflags::bitflags;

use crate::error::{Error, Result};
use crate::world::ctx::UpdateCtx;

/// Dense material id. `0` means "empty cell".
pub type MaterialId = u16;

/// The reserved empty id.
pub const EMPTY: MaterialId = 0;

bitflags! {
    /// Behavior flag set. Flags are not mutually exclusive; builtin movement
    /// dispatch picks one `BehaviorKind` from them at registration.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MaterialFlags: u32 {
        /// Never moves and can never be displaced.
        const STATIC = 1 << 0;
        /// Occupies its cell but has no builtin motion.
        const SOLID = 1 << 1;
        /// Falls and rolls diagonally.
        const POWDER = 1 << 2;
        /// Falls and spreads sideways.
        const LIQUID = 1 << 3;
        /// Rises and spreads sideways.
        const GAS = 1 << 4;
        /// Stepped through the registered update hook instead of the
        /// builtin movement kernel.
        const CUSTOM_UPDATE = 1 << 5;
    }
}

/// Fills a freshly claimed payload slot.
pub type PayloadCtor = Box<dyn Fn(&mut [u8]) + Send + Sync>;
/// Tears a payload slot down before the cell changes material or unloads.
pub type PayloadDtor = Box<dyn Fn(&mut [u8]) + Send + Sync>;
/// Relocates a payload image; `(destination, source)`. Absent hooks fall
/// back to a byte copy of the payload size.
pub type PayloadMove = Box<dyn Fn(&mut [u8], &[u8]) + Send + Sync>;
/// Per-cell update hook for `CUSTOM_UPDATE` materials.
pub type UpdateHook = Box<dyn Fn(&mut UpdateCtx<'_>) + Send + Sync>;

/// Registration-time description of a material.
pub struct MaterialDesc {
    /// Unique, non-empty display name.
    pub name: String,
    pub flags: MaterialFlags,
    pub density: f32,
    pub friction: f32,
    pub dispersion: f32,
    /// Inline payload bytes per cell; must not exceed the world's budget.
    pub payload_size: u16,
    /// Power-of-two payload alignment; `0` is treated as `1`.
    pub payload_align: u16,
    pub payload_ctor: Option<PayloadCtor>,
    pub payload_dtor: Option<PayloadDtor>,
    pub payload_move: Option<PayloadMove>,
    pub update: Option<UpdateHook>,
}

impl Default for MaterialDesc {
    fn default() -> Self {
        Self {
            name: String::new(),
            flags: MaterialFlags::empty(),
            density: 0.0,
            friction: 0.0,
            dispersion: 0.0,
            payload_size: 0,
            payload_align: 0,
            payload_ctor: None,
            payload_dtor: None,
            payload_move: None,
            update: None,
        }
    }
}

/// Read-only attribute snapshot of a registered material.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaterialProps {
    pub flags: MaterialFlags,
    pub density: f32,
    pub friction: f32,
    pub dispersion: f32,
    pub payload_size: u16,
    pub payload_align: u16,
    pub behavior: BehaviorKind,
}

/// Builtin dispatch tag, derived once at registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BehaviorKind {
    /// No builtin motion (SOLID, bare STATIC, or no motion flag at all).
    Inert,
    Powder,
    Liquid,
    Gas,
    /// Stepped through the update hook; never enters the builtin kernel.
    Custom,
}

pub(crate) struct MaterialRecord {
    pub name: String,
    pub flags: MaterialFlags,
    pub density: f32,
    pub friction: f32,
    pub dispersion: f32,
    pub payload_size: u16,
    pub payload_align: u16,
    pub payload_ctor: Option<PayloadCtor>,
    pub payload_dtor: Option<PayloadDtor>,
    pub payload_move: Option<PayloadMove>,
    pub update: Option<UpdateHook>,
    pub behavior: BehaviorKind,
}

impl MaterialRecord {
    pub fn is_static(&self) -> bool {
        self.flags.contains(MaterialFlags::STATIC)
    }

    pub fn props(&self) -> MaterialProps {
        MaterialProps {
            flags: self.flags,
            density: self.density,
            friction: self.friction,
            dispersion: self.dispersion,
            payload_size: self.payload_size,
            payload_align: self.payload_align,
            behavior: self.behavior,
        }
    }
}

fn behavior_kind(flags: MaterialFlags, has_hook: bool) -> BehaviorKind {
    if flags.contains(MaterialFlags::CUSTOM_UPDATE) {
        // A CUSTOM_UPDATE material without a hook is inert rather than being
        // handed to the builtin kernel.
        return if has_hook { BehaviorKind::Custom } else { BehaviorKind::Inert };
    }
    if flags.contains(MaterialFlags::GAS) {
        BehaviorKind::Gas
    } else if flags.contains(MaterialFlags::LIQUID) {
        BehaviorKind::Liquid
    } else if flags.contains(MaterialFlags::POWDER) {
        BehaviorKind::Powder
    } else {
        BehaviorKind::Inert
    }
}

/// Fixed-capacity id-indexed table. Slot 0 holds a sentinel for "empty" and
/// is never returned by lookups.
pub(crate) struct MaterialTable {
    records: Vec<MaterialRecord>,
    max_materials: u16,
}

impl MaterialTable {
    pub fn new(max_materials: u16) -> Result<Self> {
        let mut records = Vec::new();
        records.try_reserve_exact(max_materials as usize + 1)?;
        records.push(MaterialRecord {
            name: String::new(),
            flags: MaterialFlags::empty(),
            density: 0.0,
            friction: 0.0,
            dispersion: 0.0,
            payload_size: 0,
            payload_align: 1,
            payload_ctor: None,
            payload_dtor: None,
            payload_move: None,
            update: None,
            behavior: BehaviorKind::Inert,
        });
        Ok(Self { records, max_materials })
    }

    /// Number of registered materials (the empty sentinel excluded).
    pub fn count(&self) -> u16 {
        (self.records.len() - 1) as u16
    }

    pub fn get(&self, id: MaterialId) -> Option<&MaterialRecord> {
        if id == EMPTY {
            return None;
        }
        self.records.get(id as usize)
    }

    pub fn id_by_name(&self, name: &str) -> Option<MaterialId> {
        self.records
            .iter()
            .position(|record| !record.name.is_empty() && record.name == name)
            .map(|index| index as MaterialId)
    }

    pub fn register(&mut self, desc: MaterialDesc, payload_limit: u16) -> Result<MaterialId> {
        if desc.name.is_empty() {
            return Err(Error::InvalidArgument);
        }
        if self.count() >= self.max_materials {
            return Err(Error::CapacityReached);
        }
        if self.id_by_name(&desc.name).is_some() {
            return Err(Error::AlreadyExists);
        }

        let align = if desc.payload_align == 0 { 1 } else { desc.payload_align };
        if !align.is_power_of_two() {
            return Err(Error::InvalidArgument);
        }
        if desc.payload_size > payload_limit {
            return Err(Error::Unsupported);
        }

        let behavior = behavior_kind(desc.flags, desc.update.is_some());
        let id = self.records.len() as MaterialId;
        self.records.push(MaterialRecord {
            name: desc.name,
            flags: desc.flags,
            density: desc.density,
            friction: desc.friction,
            dispersion: desc.dispersion,
            payload_size: desc.payload_size,
            payload_align: align,
            payload_ctor: desc.payload_ctor,
            payload_dtor: desc.payload_dtor,
            payload_move: desc.payload_move,
            update: desc.update,
            behavior,
        });
        Ok(id)
    }
}
