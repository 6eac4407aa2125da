//! Material palette bundles.
//!
//! A palette is a JSON document describing data-only materials (name, flags,
//! density, payload size) registered in order. Hooks are code, not data, so
//! hooked materials are registered through [`World::register_material`]
//! directly; a bundled `custom_update` flag without a hook is inert.

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::material::{MaterialDesc, MaterialFlags, MaterialId};
use crate::world::World;

#[derive(Debug, Deserialize)]
pub struct PaletteBundle {
    pub materials: Vec<PaletteMaterial>,
}

#[derive(Debug, Deserialize)]
pub struct PaletteMaterial {
    pub name: String,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub density: f32,
    #[serde(default)]
    pub friction: f32,
    #[serde(default)]
    pub dispersion: f32,
    #[serde(default)]
    pub payload_size: u16,
    #[serde(default)]
    pub payload_align: u16,
}

impl PaletteBundle {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| {
            log::debug!("palette parse failed: {err}");
            Error::InvalidArgument
        })
    }
}

fn flag_by_name(name: &str) -> Result<MaterialFlags> {
    Ok(match name {
        "static" => MaterialFlags::STATIC,
        "solid" => MaterialFlags::SOLID,
        "powder" => MaterialFlags::POWDER,
        "liquid" => MaterialFlags::LIQUID,
        "gas" => MaterialFlags::GAS,
        "custom_update" => MaterialFlags::CUSTOM_UPDATE,
        _ => return Err(Error::InvalidArgument),
    })
}

impl PaletteMaterial {
    fn into_desc(self) -> Result<MaterialDesc> {
        let mut flags = MaterialFlags::empty();
        for name in &self.flags {
            flags |= flag_by_name(name)?;
        }
        Ok(MaterialDesc {
            name: self.name,
            flags,
            density: self.density,
            friction: self.friction,
            dispersion: self.dispersion,
            payload_size: self.payload_size,
            payload_align: self.payload_align,
            ..MaterialDesc::default()
        })
    }
}

impl World {
    /// Parse and register a palette bundle, returning the new ids in bundle
    /// order. Fails without registering anything when the document itself is
    /// malformed; per-material registration failures abort at the offending
    /// entry with earlier entries kept (ids are never reused).
    pub fn register_palette(&mut self, json: &str) -> Result<Vec<MaterialId>> {
        let bundle = PaletteBundle::from_json(json)?;
        let mut ids = Vec::with_capacity(bundle.materials.len());
        for material in bundle.materials {
            ids.push(self.register_material(material.into_desc()?)?);
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Config;

    const BUNDLE: &str = r#"{
        "materials": [
            { "name": "stone", "flags": ["static"], "density": 100.0 },
            { "name": "sand", "flags": ["powder"], "density": 10.0, "friction": 0.4 },
            { "name": "water", "flags": ["liquid"], "density": 5.0, "dispersion": 2.0 }
        ]
    }"#;

    fn world() -> World {
        World::new(Config { deterministic_mode: true, ..Config::default() }).unwrap()
    }

    #[test]
    fn bundle_registers_in_order() {
        let mut world = world();
        let ids = world.register_palette(BUNDLE).unwrap();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(world.material_id("water"), Some(3));
        assert_eq!(world.material_flags(2), Some(MaterialFlags::POWDER));

        let sand = world.material_props(2).unwrap();
        assert_eq!(sand.behavior, crate::BehaviorKind::Powder);
        assert_eq!(sand.friction, 0.4);
        let water = world.material_props(3).unwrap();
        assert_eq!(water.dispersion, 2.0);
    }

    #[test]
    fn malformed_document_is_invalid() {
        let mut world = world();
        assert_eq!(world.register_palette("{"), Err(Error::InvalidArgument));
        assert_eq!(
            world.register_palette(r#"{ "materials": [{ "name": "x", "flags": ["wet"] }] }"#),
            Err(Error::InvalidArgument)
        );
    }

    #[test]
    fn duplicate_name_aborts_at_offender() {
        let mut world = world();
        world.register_palette(BUNDLE).unwrap();
        assert_eq!(world.register_palette(BUNDLE), Err(Error::AlreadyExists));
    }
}
