//! goat3d core - hierarchical 3D scene container and file format.
//!
//! This crate provides:
//!
//! - **Scene graph types**: [`Scene`], [`Material`], [`Mesh`], [`Light`],
//!   [`Camera`], [`Node`] with keyframe [`Track`]s
//! - **Serialization**: saving and loading the goat3d text format, with
//!   atomic file replacement
//!
//! A scene is built bottom-up: create materials and meshes, attach
//! materials to meshes, create nodes referencing scene objects, then link
//! nodes into a tree. Cross-references are indices into the owning scene.
//!
//! # Example
//!
//! ```ignore
//! use goat3d_core::{Material, Mesh, Node, NodeObject, Scene};
//!
//! let mut scene = Scene::new();
//! scene.name = "demo".to_string();
//!
//! let mtl = scene.add_material(Material::new("red"));
//! let mut mesh = Mesh::new("tri");
//! mesh.set_material(mtl);
//! let mesh_id = scene.add_mesh(mesh);
//!
//! let mut node = Node::new("obj");
//! node.object = NodeObject::Mesh(mesh_id);
//! scene.add_node(node);
//!
//! scene.save("demo.goatsce")?;
//! ```

pub mod aabb;
pub mod camera;
pub mod error;
pub mod format;
pub mod light;
pub mod material;
pub mod mesh;
pub mod node;
pub mod scene;
pub mod track;

// Re-export commonly used types
pub use aabb::Aabb;
pub use camera::Camera;
pub use error::{Error, Result};
pub use format::{ParseError, FILE_EXTENSION};
pub use light::Light;
pub use material::{AttribValue, Material, MaterialAttrib};
pub use mesh::{Mesh, VertexAttrib};
pub use node::{Node, NodeObject};
pub use scene::{CameraId, LightId, MaterialId, MeshId, NodeId, Scene};
pub use track::{Interp, Track, TrackKey};
