//! Host-boundary export adapter.
//!
//! A host application (a modeling tool, a converter) hands over a sequence
//! of already-triangulated objects; this crate builds a scene bottom-up and
//! saves it in a single call. Materials are deduplicated by name so that
//! many objects sharing one material produce one scene entry.

use std::collections::HashMap;
use std::path::Path;

use glam::{Quat, Vec2, Vec3, Vec4};
use log::info;
use thiserror::Error;

use goat3d_core::{
    AttribValue, Camera, Light, Material, MaterialAttrib, MaterialId, Mesh, Node, NodeObject,
    Scene,
};

/// Errors surfaced to the host.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("scene error: {0}")]
    Scene(#[from] goat3d_core::Error),
}

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Static placement of an exported object (one key at time 0).
#[derive(Clone, Copy, Debug)]
pub struct ExportTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scaling: Vec3,
}

impl Default for ExportTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scaling: Vec3::ONE,
        }
    }
}

/// Pre-triangulated geometry handed over by the host.
///
/// Triangulation is the host's responsibility; empty arrays mean the
/// attribute is not present.
#[derive(Clone, Debug, Default)]
pub struct ExportMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub texcoords: Vec<Vec2>,
    pub colors: Vec<Vec4>,
    pub faces: Vec<[u32; 3]>,
}

/// Material description from the host.
#[derive(Clone, Debug)]
pub struct ExportMaterial {
    pub name: String,
    pub attribs: Vec<(MaterialAttrib, AttribValue)>,
}

/// One object from the host.
#[derive(Clone, Debug)]
pub enum ExportObject {
    Mesh {
        name: String,
        transform: ExportTransform,
        geometry: ExportMesh,
        material: Option<ExportMaterial>,
    },
    Light {
        name: String,
        transform: ExportTransform,
        color: Vec3,
    },
    Camera {
        name: String,
        transform: ExportTransform,
        near_clip: f32,
        far_clip: f32,
    },
}

/// Build a scene from host objects and save it to `path`.
///
/// This is the single entry point a host plugin needs to call.
pub fn export<I>(name: &str, objects: I, path: impl AsRef<Path>) -> ExportResult<()>
where
    I: IntoIterator<Item = ExportObject>,
{
    let scene = build_scene(name, objects)?;
    scene.save(path)?;
    Ok(())
}

/// Build a scene from host objects without touching the filesystem.
pub fn build_scene<I>(name: &str, objects: I) -> ExportResult<Scene>
where
    I: IntoIterator<Item = ExportObject>,
{
    let mut builder = SceneBuilder::new(name);
    for object in objects {
        builder.add_object(object)?;
    }
    Ok(builder.finish())
}

/// Internal builder mapping host objects onto scene entities.
struct SceneBuilder {
    scene: Scene,
    /// Map from material name to scene id, for deduplication
    materials: HashMap<String, MaterialId>,
}

impl SceneBuilder {
    fn new(name: &str) -> Self {
        let mut scene = Scene::new();
        scene.name = name.to_string();
        Self {
            scene,
            materials: HashMap::new(),
        }
    }

    fn add_object(&mut self, object: ExportObject) -> ExportResult<()> {
        match object {
            ExportObject::Mesh {
                name,
                transform,
                geometry,
                material,
            } => {
                let mtl_id = material.map(|m| self.intern_material(m));

                let mut mesh = Mesh::new(name.clone());
                mesh.set_vertices(geometry.positions)?;
                mesh.set_normals(geometry.normals)?;
                mesh.set_texcoords(geometry.texcoords)?;
                mesh.set_colors(geometry.colors)?;
                mesh.set_faces(geometry.faces)?;
                if let Some(id) = mtl_id {
                    mesh.set_material(id);
                }

                let mesh_id = self.scene.add_mesh(mesh);
                self.attach_node(name, transform, NodeObject::Mesh(mesh_id));
            }
            ExportObject::Light {
                name,
                transform,
                color,
            } => {
                let mut light = Light::new(name.clone());
                light.color = color;
                let light_id = self.scene.add_light(light);
                self.attach_node(name, transform, NodeObject::Light(light_id));
            }
            ExportObject::Camera {
                name,
                transform,
                near_clip,
                far_clip,
            } => {
                let mut cam = Camera::new(name.clone());
                cam.near_clip = near_clip;
                cam.far_clip = far_clip;
                let cam_id = self.scene.add_camera(cam);
                self.attach_node(name, transform, NodeObject::Camera(cam_id));
            }
        }
        Ok(())
    }

    // first definition of a material name wins; later objects reuse it
    fn intern_material(&mut self, material: ExportMaterial) -> MaterialId {
        if let Some(&id) = self.materials.get(&material.name) {
            return id;
        }
        let mut mtl = Material::new(material.name.clone());
        for (kind, value) in material.attribs {
            mtl.set_attrib(kind, value);
        }
        let id = self.scene.add_material(mtl);
        self.materials.insert(material.name, id);
        id
    }

    fn attach_node(&mut self, name: String, transform: ExportTransform, object: NodeObject) {
        let mut node = Node::new(name);
        node.object = object;
        node.set_position(transform.position, 0);
        node.set_rotation(transform.rotation, 0);
        node.set_scaling(transform.scaling, 0);
        self.scene.add_node(node);
    }

    fn finish(self) -> Scene {
        info!(
            "export built scene \"{}\": {} materials, {} meshes, {} nodes",
            self.scene.name,
            self.scene.material_count(),
            self.scene.mesh_count(),
            self.scene.node_count()
        );
        self.scene
    }
}
