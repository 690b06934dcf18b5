//! Hierarchical transform nodes.
//!
//! A node names a point in the scene hierarchy, optionally references one
//! scene object, and carries keyframe tracks for position, rotation and
//! scaling plus a pivot point. Parent/child links are arena indices owned
//! by the [`Scene`](crate::Scene); use `Scene::add_child` to edit the tree.

use glam::{Mat4, Quat, Vec3};

use crate::scene::{CameraId, LightId, MeshId, NodeId};
use crate::track::Track;

/// The scene object a node renders, if any.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NodeObject {
    #[default]
    None,
    Mesh(MeshId),
    Light(LightId),
    Camera(CameraId),
}

/// A named transform unit in the scene hierarchy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Node {
    pub name: String,
    pub object: NodeObject,

    pub position: Track<Vec3>,
    pub rotation: Track<Quat>,
    pub scaling: Track<Vec3>,
    pub pivot: Vec3,

    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
}

impl Node {
    /// Create a new named node with no object and empty tracks.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Reference a scene object (or `NodeObject::None` to detach).
    pub fn set_object(&mut self, object: NodeObject) {
        self.object = object;
    }

    /// Set the position sample at `tmsec`, overwriting an existing key at
    /// that exact timestamp.
    pub fn set_position(&mut self, pos: Vec3, tmsec: i64) {
        self.position.set_key(pos, tmsec);
    }

    /// Set the rotation sample at `tmsec`.
    pub fn set_rotation(&mut self, rot: Quat, tmsec: i64) {
        self.rotation.set_key(rot, tmsec);
    }

    /// Set the scaling sample at `tmsec`.
    pub fn set_scaling(&mut self, scale: Vec3, tmsec: i64) {
        self.scaling.set_key(scale, tmsec);
    }

    pub fn set_pivot(&mut self, pivot: Vec3) {
        self.pivot = pivot;
    }

    /// Position at `tmsec`; origin when the track is empty.
    pub fn position_at(&self, tmsec: i64) -> Vec3 {
        self.position.value_at(tmsec).unwrap_or(Vec3::ZERO)
    }

    /// Rotation at `tmsec`; identity when the track is empty.
    pub fn rotation_at(&self, tmsec: i64) -> Quat {
        self.rotation.value_at(tmsec).unwrap_or(Quat::IDENTITY)
    }

    /// Scaling at `tmsec`; unit scale when the track is empty.
    pub fn scaling_at(&self, tmsec: i64) -> Vec3 {
        self.scaling.value_at(tmsec).unwrap_or(Vec3::ONE)
    }

    /// Child node ids in insertion order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Parent node id, `None` for roots.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Local transform at `tmsec`: rotation and scaling about the pivot,
    /// then translation.
    pub fn local_matrix(&self, tmsec: i64) -> Mat4 {
        let trs = Mat4::from_scale_rotation_translation(
            self.scaling_at(tmsec),
            self.rotation_at(tmsec),
            self.position_at(tmsec),
        );
        Mat4::from_translation(self.pivot) * trs * Mat4::from_translation(-self.pivot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_transform_is_identity() {
        let node = Node::new("n");
        let m = node.local_matrix(0);
        assert!((m.transform_point3(Vec3::new(1.0, 2.0, 3.0)) - Vec3::new(1.0, 2.0, 3.0))
            .length()
            < 1e-6);
    }

    #[test]
    fn test_local_matrix_translation() {
        let mut node = Node::new("n");
        node.set_position(Vec3::new(5.0, 0.0, 0.0), 0);

        let p = node.local_matrix(0).transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_pivot_offsets_rotation() {
        let mut node = Node::new("n");
        node.set_pivot(Vec3::new(1.0, 0.0, 0.0));
        node.set_rotation(Quat::from_rotation_z(std::f32::consts::PI), 0);

        // rotating the pivot point about itself leaves it in place
        let p = node.local_matrix(0).transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert!((p - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);

        // the origin swings to the far side of the pivot
        let o = node.local_matrix(0).transform_point3(Vec3::ZERO);
        assert!((o - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_animated_position() {
        let mut node = Node::new("n");
        node.set_position(Vec3::ZERO, 0);
        node.set_position(Vec3::new(10.0, 0.0, 0.0), 1000);

        assert_eq!(node.position_at(500), Vec3::new(5.0, 0.0, 0.0));
    }
}
