//! Scene container.
//!
//! The [`Scene`] owns every entity: materials, meshes, lights, cameras and
//! the node hierarchy. Cross-references between entities are arena indices
//! into the owning scene, never pointers, so a reference is only meaningful
//! together with the scene that produced it. Entities are added once and
//! live until the scene is dropped or cleared.

use std::io::{Read, Write};
use std::path::Path;

use glam::{Mat4, Vec3};

use crate::aabb::Aabb;
use crate::camera::Camera;
use crate::error::{Error, Result};
use crate::format;
use crate::light::Light;
use crate::material::Material;
use crate::mesh::Mesh;
use crate::node::{Node, NodeObject};

pub type MaterialId = usize;
pub type MeshId = usize;
pub type LightId = usize;
pub type CameraId = usize;
pub type NodeId = usize;

/// Top-level owning container of all scene entities.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Scene name.
    pub name: String,

    /// Global ambient lighting color.
    pub ambient: Vec3,

    materials: Vec<Material>,
    meshes: Vec<Mesh>,
    lights: Vec<Light>,
    cameras: Vec<Camera>,

    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            name: "unnamed".to_string(),
            ambient: Vec3::splat(0.05),
            materials: Vec::new(),
            meshes: Vec::new(),
            lights: Vec::new(),
            cameras: Vec::new(),
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }
}

impl Scene {
    /// Create an empty scene with default name and ambient color.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all owned entities and reset name and ambient to defaults.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_ambient(&mut self, ambient: Vec3) {
        self.ambient = ambient;
    }

    // --- materials ---

    /// Add a material to the scene, taking ownership. Returns its id.
    pub fn add_material(&mut self, mtl: Material) -> MaterialId {
        let id = self.materials.len();
        self.materials.push(mtl);
        id
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id)
    }

    /// Find a material id by name (first match in insertion order).
    pub fn material_by_name(&self, name: &str) -> Option<MaterialId> {
        self.materials.iter().position(|m| m.name == name)
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    // --- meshes ---

    /// Add a mesh to the scene, taking ownership. Returns its id.
    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        let id = self.meshes.len();
        self.meshes.push(mesh);
        id
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id)
    }

    pub fn mesh_mut(&mut self, id: MeshId) -> Option<&mut Mesh> {
        self.meshes.get_mut(id)
    }

    pub fn mesh_by_name(&self, name: &str) -> Option<MeshId> {
        self.meshes.iter().position(|m| m.name == name)
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    // --- lights ---

    /// Add a light to the scene, taking ownership. Returns its id.
    pub fn add_light(&mut self, light: Light) -> LightId {
        let id = self.lights.len();
        self.lights.push(light);
        id
    }

    pub fn light(&self, id: LightId) -> Option<&Light> {
        self.lights.get(id)
    }

    pub fn light_by_name(&self, name: &str) -> Option<LightId> {
        self.lights.iter().position(|l| l.name == name)
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    // --- cameras ---

    /// Add a camera to the scene, taking ownership. Returns its id.
    pub fn add_camera(&mut self, cam: Camera) -> CameraId {
        let id = self.cameras.len();
        self.cameras.push(cam);
        id
    }

    pub fn camera(&self, id: CameraId) -> Option<&Camera> {
        self.cameras.get(id)
    }

    pub fn camera_by_name(&self, name: &str) -> Option<CameraId> {
        self.cameras.iter().position(|c| c.name == name)
    }

    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    pub fn camera_count(&self) -> usize {
        self.cameras.len()
    }

    // --- nodes ---

    /// Add a node to the scene as a new root, taking ownership.
    ///
    /// Any child/parent links the node may claim are discarded; use
    /// [`Scene::add_child`] to build the hierarchy.
    pub fn add_node(&mut self, mut node: Node) -> NodeId {
        node.children.clear();
        node.parent = None;
        let id = self.nodes.len();
        self.nodes.push(node);
        self.roots.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Root node ids in insertion order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Make `child` the last child of `parent`, reparenting if needed.
    ///
    /// The child is removed from its previous parent's child list (or from
    /// the root list) first, so it ends up in exactly one place. Attaching
    /// a node to itself or beneath one of its own descendants fails with
    /// `HierarchyCycle` and changes nothing.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_node(parent)?;
        self.check_node(child)?;

        // reject if child is parent itself or one of parent's ancestors
        let mut cur = Some(parent);
        while let Some(id) = cur {
            if id == child {
                return Err(Error::HierarchyCycle {
                    node: self.nodes[child].name.clone(),
                });
            }
            cur = self.nodes[id].parent;
        }

        match self.nodes[child].parent {
            Some(prev) => self.nodes[prev].children.retain(|&c| c != child),
            None => self.roots.retain(|&r| r != child),
        }
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        Ok(())
    }

    /// Detach `child` from its parent and make it a root again.
    pub fn remove_child(&mut self, child: NodeId) -> Result<()> {
        self.check_node(child)?;
        if let Some(prev) = self.nodes[child].parent {
            self.nodes[prev].children.retain(|&c| c != child);
            self.nodes[child].parent = None;
            self.roots.push(child);
        }
        Ok(())
    }

    /// World transform of a node at `tmsec`, composed along the parent
    /// chain. `None` for an unknown id.
    pub fn node_matrix(&self, id: NodeId, tmsec: i64) -> Option<Mat4> {
        let mut node = self.nodes.get(id)?;
        let mut matrix = node.local_matrix(tmsec);
        while let Some(pid) = node.parent {
            node = &self.nodes[pid];
            matrix = node.local_matrix(tmsec) * matrix;
        }
        Some(matrix)
    }

    /// World-space bounding box of all mesh-bearing nodes at `tmsec`.
    pub fn bounds(&self, tmsec: i64) -> Aabb {
        let mut bounds = Aabb::empty();
        for (id, node) in self.nodes.iter().enumerate() {
            let NodeObject::Mesh(mid) = node.object else {
                continue;
            };
            let Some(mesh) = self.mesh(mid) else {
                continue;
            };
            let local = mesh.bounds();
            if local.is_empty() {
                continue;
            }
            // node_matrix always resolves for an id from the arena walk
            let matrix = match self.node_matrix(id, tmsec) {
                Some(m) => m,
                None => continue,
            };
            for corner in local.corners() {
                bounds = bounds.grow(matrix.transform_point3(corner));
            }
        }
        bounds
    }

    /// Check that every cross-reference resolves within this scene.
    ///
    /// Called by `save` before any byte is written.
    pub fn validate(&self) -> Result<()> {
        for mesh in &self.meshes {
            if let Some(mtl) = mesh.material {
                if mtl >= self.materials.len() {
                    return Err(Error::UnresolvedReference {
                        kind: "material",
                        name: format!("{} (referenced by mesh \"{}\")", mtl, mesh.name),
                    });
                }
            }
        }
        for node in &self.nodes {
            let (kind, id, count) = match node.object {
                NodeObject::None => continue,
                NodeObject::Mesh(id) => ("mesh", id, self.meshes.len()),
                NodeObject::Light(id) => ("light", id, self.lights.len()),
                NodeObject::Camera(id) => ("camera", id, self.cameras.len()),
            };
            if id >= count {
                return Err(Error::UnresolvedReference {
                    kind,
                    name: format!("{} (referenced by node \"{}\")", id, node.name),
                });
            }
        }
        Ok(())
    }

    // --- serialization ---

    /// Save the scene to a file.
    ///
    /// Validates all references first, then writes to a temporary file
    /// beside `path` and renames it into place, so a failure mid-write
    /// leaves any previous file at `path` untouched.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        format::save(self, path.as_ref())
    }

    /// Load a scene from a file.
    ///
    /// Either a fully constructed scene is returned or an error; no
    /// partially populated scene is ever observable.
    pub fn load(path: impl AsRef<Path>) -> Result<Scene> {
        format::load(path.as_ref())
    }

    /// Write the scene to an arbitrary stream (validates first).
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        self.validate()?;
        format::write_scene(self, w)?;
        Ok(())
    }

    /// Read a scene from an arbitrary stream.
    pub fn read_from<R: Read>(r: &mut R) -> Result<Scene> {
        let mut text = String::new();
        r.read_to_string(&mut text)?;
        format::read_scene(&text)
    }

    fn check_node(&self, id: NodeId) -> Result<()> {
        if id >= self.nodes.len() {
            return Err(Error::UnresolvedReference {
                kind: "node",
                name: id.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{AttribValue, MaterialAttrib};

    fn tri_mesh(name: &str) -> Mesh {
        let mut mesh = Mesh::new(name);
        mesh.set_vertices(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ])
        .unwrap();
        mesh.add_face(0, 1, 2).unwrap();
        mesh
    }

    #[test]
    fn test_scene_defaults() {
        let scene = Scene::new();
        assert_eq!(scene.name, "unnamed");
        assert_eq!(scene.ambient, Vec3::splat(0.05));
        assert_eq!(scene.material_count(), 0);
    }

    #[test]
    fn test_add_and_lookup() {
        let mut scene = Scene::new();
        let mut mtl = Material::new("red");
        mtl.set_attrib(MaterialAttrib::Shininess, AttribValue::Scalar(32.0));
        let mid = scene.add_material(mtl);

        let mut mesh = tri_mesh("tri");
        mesh.set_material(mid);
        let mesh_id = scene.add_mesh(mesh);

        assert_eq!(scene.material_by_name("red"), Some(mid));
        assert_eq!(scene.mesh_by_name("tri"), Some(mesh_id));
        assert_eq!(scene.mesh(mesh_id).unwrap().material, Some(mid));
        assert_eq!(scene.material_by_name("green"), None);
    }

    #[test]
    fn test_add_child_reparents() {
        let mut scene = Scene::new();
        let a = scene.add_node(Node::new("a"));
        let b = scene.add_node(Node::new("b"));
        let c = scene.add_node(Node::new("c"));

        scene.add_child(a, c).unwrap();
        assert_eq!(scene.roots(), &[a, b]);
        assert_eq!(scene.node(a).unwrap().children(), &[c]);

        // moving c under b removes it from a's list
        scene.add_child(b, c).unwrap();
        assert_eq!(scene.node(a).unwrap().children(), &[] as &[NodeId]);
        assert_eq!(scene.node(b).unwrap().children(), &[c]);
        assert_eq!(scene.node(c).unwrap().parent(), Some(b));
    }

    #[test]
    fn test_add_child_rejects_cycles() {
        let mut scene = Scene::new();
        let a = scene.add_node(Node::new("a"));
        let b = scene.add_node(Node::new("b"));
        scene.add_child(a, b).unwrap();

        assert!(matches!(
            scene.add_child(b, a),
            Err(Error::HierarchyCycle { .. })
        ));
        assert!(matches!(
            scene.add_child(a, a),
            Err(Error::HierarchyCycle { .. })
        ));

        // tree unchanged
        assert_eq!(scene.roots(), &[a]);
        assert_eq!(scene.node(a).unwrap().children(), &[b]);
    }

    #[test]
    fn test_remove_child_restores_root() {
        let mut scene = Scene::new();
        let a = scene.add_node(Node::new("a"));
        let b = scene.add_node(Node::new("b"));
        scene.add_child(a, b).unwrap();

        scene.remove_child(b).unwrap();
        assert_eq!(scene.node(b).unwrap().parent(), None);
        assert_eq!(scene.roots(), &[a, b]);
    }

    #[test]
    fn test_node_matrix_composes_parent_chain() {
        let mut scene = Scene::new();
        let a = scene.add_node(Node::new("a"));
        let b = scene.add_node(Node::new("b"));
        scene.add_child(a, b).unwrap();

        scene
            .node_mut(a)
            .unwrap()
            .set_position(Vec3::new(1.0, 0.0, 0.0), 0);
        scene
            .node_mut(b)
            .unwrap()
            .set_position(Vec3::new(0.0, 2.0, 0.0), 0);

        let p = scene
            .node_matrix(b, 0)
            .unwrap()
            .transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_bounds_follow_node_transform() {
        let mut scene = Scene::new();
        let mesh_id = scene.add_mesh(tri_mesh("tri"));

        let mut node = Node::new("obj");
        node.object = NodeObject::Mesh(mesh_id);
        node.set_position(Vec3::new(10.0, 0.0, 0.0), 0);
        scene.add_node(node);

        let bounds = scene.bounds(0);
        assert!((bounds.min().x - 10.0).abs() < 1e-5);
        assert!((bounds.max().x - 11.0).abs() < 1e-5);
    }

    #[test]
    fn test_validate_unresolved_material() {
        let mut scene = Scene::new();
        let mut mesh = tri_mesh("tri");
        mesh.set_material(7);
        scene.add_mesh(mesh);

        assert!(matches!(
            scene.validate(),
            Err(Error::UnresolvedReference {
                kind: "material",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_unresolved_node_object() {
        let mut scene = Scene::new();
        let mut node = Node::new("obj");
        node.object = NodeObject::Mesh(0);
        scene.add_node(node);

        assert!(matches!(
            scene.validate(),
            Err(Error::UnresolvedReference { kind: "mesh", .. })
        ));
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut scene = Scene::new();
        scene.name = "demo".to_string();
        scene.add_mesh(tri_mesh("tri"));
        scene.add_node(Node::new("n"));

        scene.clear();
        assert_eq!(scene.name, "unnamed");
        assert_eq!(scene.mesh_count(), 0);
        assert_eq!(scene.node_count(), 0);
        assert!(scene.roots().is_empty());
    }
}
