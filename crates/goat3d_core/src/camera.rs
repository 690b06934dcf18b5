/// A camera viewpoint.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    /// Camera name, referenced by nodes.
    pub name: String,

    /// Near clipping plane distance.
    pub near_clip: f32,

    /// Far clipping plane distance.
    pub far_clip: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            name: String::new(),
            near_clip: 0.5,
            far_clip: 500.0,
        }
    }
}

impl Camera {
    /// Create a new named camera with default clip planes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}
