use glam::Vec3;

/// A point light source.
#[derive(Clone, Debug, PartialEq)]
pub struct Light {
    /// Light name, referenced by nodes.
    pub name: String,

    /// Emitted color (RGB).
    pub color: Vec3,

    /// Constant/linear/quadratic attenuation coefficients.
    pub attenuation: Vec3,

    /// Range beyond which the light contributes nothing.
    pub max_dist: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: Vec3::ONE,
            attenuation: Vec3::new(1.0, 0.0, 0.0),
            max_dist: 0.0,
        }
    }
}

impl Light {
    /// Create a new named light with default parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}
