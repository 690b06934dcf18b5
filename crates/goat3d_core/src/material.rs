//! Material definitions.
//!
//! A material is a named bag of shading attributes keyed by a fixed set of
//! semantic slots. Each slot holds either a numeric value or a texture path.

use glam::{Vec3, Vec4};

/// Semantic slots a material can populate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MaterialAttrib {
    Diffuse,
    Specular,
    Shininess,
    Normal,
    Bump,
    Reflection,
    Transmission,
    Ior,
    Alpha,
}

impl MaterialAttrib {
    /// All attribute kinds in serialization order.
    pub const ALL: [MaterialAttrib; 9] = [
        MaterialAttrib::Diffuse,
        MaterialAttrib::Specular,
        MaterialAttrib::Shininess,
        MaterialAttrib::Normal,
        MaterialAttrib::Bump,
        MaterialAttrib::Reflection,
        MaterialAttrib::Transmission,
        MaterialAttrib::Ior,
        MaterialAttrib::Alpha,
    ];

    /// Canonical name used in scene files.
    pub fn name(self) -> &'static str {
        match self {
            MaterialAttrib::Diffuse => "diffuse",
            MaterialAttrib::Specular => "specular",
            MaterialAttrib::Shininess => "shininess",
            MaterialAttrib::Normal => "normal",
            MaterialAttrib::Bump => "bump",
            MaterialAttrib::Reflection => "reflection",
            MaterialAttrib::Transmission => "transmission",
            MaterialAttrib::Ior => "ior",
            MaterialAttrib::Alpha => "alpha",
        }
    }

    /// Look up an attribute kind by its file name.
    pub fn from_name(name: &str) -> Option<MaterialAttrib> {
        Self::ALL.iter().copied().find(|a| a.name() == name)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// A single material attribute value.
#[derive(Clone, Debug, PartialEq)]
pub enum AttribValue {
    /// A scalar, e.g. shininess or index of refraction.
    Scalar(f32),
    /// An RGB color.
    Vec3(Vec3),
    /// An RGBA color.
    Vec4(Vec4),
    /// Path to a texture map.
    Map(String),
}

/// A named bag of shading attributes.
///
/// At most one value per attribute kind; setting a kind twice replaces the
/// previous value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Material {
    /// Material name, referenced by meshes.
    pub name: String,

    attribs: [Option<AttribValue>; MaterialAttrib::ALL.len()],
}

impl Material {
    /// Create a new named material with no attributes set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set an attribute value, replacing any previous value for that kind.
    pub fn set_attrib(&mut self, kind: MaterialAttrib, value: AttribValue) {
        self.attribs[kind.index()] = Some(value);
    }

    /// Get the value set for an attribute kind, if any.
    pub fn attrib(&self, kind: MaterialAttrib) -> Option<&AttribValue> {
        self.attribs[kind.index()].as_ref()
    }

    /// Remove the value for an attribute kind.
    pub fn clear_attrib(&mut self, kind: MaterialAttrib) {
        self.attribs[kind.index()] = None;
    }

    /// Number of attribute kinds with a value set.
    pub fn attrib_count(&self) -> usize {
        self.attribs.iter().filter(|a| a.is_some()).count()
    }

    /// Iterate over populated attributes in serialization order.
    pub fn iter(&self) -> impl Iterator<Item = (MaterialAttrib, &AttribValue)> {
        MaterialAttrib::ALL
            .iter()
            .filter_map(move |&kind| self.attrib(kind).map(|v| (kind, v)))
    }

    /// Check if this material references any texture maps.
    pub fn has_maps(&self) -> bool {
        self.attribs
            .iter()
            .flatten()
            .any(|v| matches!(v, AttribValue::Map(_)))
    }
}
