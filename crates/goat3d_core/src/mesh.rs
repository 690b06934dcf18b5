//! Mesh geometry representation.
//!
//! A mesh owns one array per vertex attribute kind plus a triangle index
//! buffer, and optionally references a material owned by the scene. All
//! populated attribute arrays must agree on the vertex count; the setters
//! enforce this and reject edits that would break it.

use glam::{Vec2, Vec3, Vec4};

use crate::aabb::Aabb;
use crate::error::{Error, Result};
use crate::scene::MaterialId;

/// Per-vertex attribute kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexAttrib {
    Vertex,
    Normal,
    Tangent,
    Texcoord,
    SkinWeight,
    SkinMatrix,
    Color,
}

impl VertexAttrib {
    /// All attribute kinds in serialization order.
    pub const ALL: [VertexAttrib; 7] = [
        VertexAttrib::Vertex,
        VertexAttrib::Normal,
        VertexAttrib::Tangent,
        VertexAttrib::Texcoord,
        VertexAttrib::SkinWeight,
        VertexAttrib::SkinMatrix,
        VertexAttrib::Color,
    ];

    /// Canonical name used in scene files.
    pub fn name(self) -> &'static str {
        match self {
            VertexAttrib::Vertex => "vertex",
            VertexAttrib::Normal => "normal",
            VertexAttrib::Tangent => "tangent",
            VertexAttrib::Texcoord => "texcoord",
            VertexAttrib::SkinWeight => "skin_weight",
            VertexAttrib::SkinMatrix => "skin_matrix",
            VertexAttrib::Color => "color",
        }
    }

    /// Components per vertex for this kind.
    pub fn width(self) -> usize {
        match self {
            VertexAttrib::Vertex | VertexAttrib::Normal | VertexAttrib::Tangent => 3,
            VertexAttrib::Texcoord => 2,
            VertexAttrib::SkinWeight | VertexAttrib::SkinMatrix | VertexAttrib::Color => 4,
        }
    }

    /// Look up an attribute kind by its file name.
    pub fn from_name(name: &str) -> Option<VertexAttrib> {
        Self::ALL.iter().copied().find(|a| a.name() == name)
    }
}

/// Per-vertex attribute buffers plus triangle indices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    /// Mesh name, referenced by nodes.
    pub name: String,

    /// Material owned by the scene this mesh belongs to.
    pub material: Option<MaterialId>,

    vertices: Vec<Vec3>,
    normals: Vec<Vec3>,
    tangents: Vec<Vec3>,
    texcoords: Vec<Vec2>,
    skin_weights: Vec<Vec4>,
    skin_matrices: Vec<[i32; 4]>,
    colors: Vec<Vec4>,

    faces: Vec<[u32; 3]>,
}

impl Mesh {
    /// Create a new named mesh with no data.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Reference a material by scene id.
    pub fn set_material(&mut self, mtl: MaterialId) {
        self.material = Some(mtl);
    }

    /// Number of vertices (length of the position array).
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Length of the array for an attribute kind (0 when not populated).
    pub fn attrib_len(&self, kind: VertexAttrib) -> usize {
        match kind {
            VertexAttrib::Vertex => self.vertices.len(),
            VertexAttrib::Normal => self.normals.len(),
            VertexAttrib::Tangent => self.tangents.len(),
            VertexAttrib::Texcoord => self.texcoords.len(),
            VertexAttrib::SkinWeight => self.skin_weights.len(),
            VertexAttrib::SkinMatrix => self.skin_matrices.len(),
            VertexAttrib::Color => self.colors.len(),
        }
    }

    /// Replace the vertex position array wholesale.
    ///
    /// Fails with `DimensionMismatch` if another populated attribute array
    /// disagrees with the new length, or with `IndexOutOfRange` if an
    /// existing face references a vertex beyond the new count. The mesh is
    /// unchanged on failure.
    pub fn set_vertices(&mut self, data: Vec<Vec3>) -> Result<()> {
        self.check_len(VertexAttrib::Vertex, data.len())?;
        for face in &self.faces {
            for &idx in face {
                if idx as usize >= data.len() {
                    return Err(Error::IndexOutOfRange {
                        index: idx,
                        vertex_count: data.len(),
                    });
                }
            }
        }
        self.vertices = data;
        Ok(())
    }

    /// Replace the normal array wholesale.
    pub fn set_normals(&mut self, data: Vec<Vec3>) -> Result<()> {
        self.check_len(VertexAttrib::Normal, data.len())?;
        self.normals = data;
        Ok(())
    }

    /// Replace the tangent array wholesale.
    pub fn set_tangents(&mut self, data: Vec<Vec3>) -> Result<()> {
        self.check_len(VertexAttrib::Tangent, data.len())?;
        self.tangents = data;
        Ok(())
    }

    /// Replace the texture coordinate array wholesale.
    pub fn set_texcoords(&mut self, data: Vec<Vec2>) -> Result<()> {
        self.check_len(VertexAttrib::Texcoord, data.len())?;
        self.texcoords = data;
        Ok(())
    }

    /// Replace the skin weight array wholesale.
    pub fn set_skin_weights(&mut self, data: Vec<Vec4>) -> Result<()> {
        self.check_len(VertexAttrib::SkinWeight, data.len())?;
        self.skin_weights = data;
        Ok(())
    }

    /// Replace the skin matrix index array wholesale.
    pub fn set_skin_matrices(&mut self, data: Vec<[i32; 4]>) -> Result<()> {
        self.check_len(VertexAttrib::SkinMatrix, data.len())?;
        self.skin_matrices = data;
        Ok(())
    }

    /// Replace the vertex color array wholesale.
    pub fn set_colors(&mut self, data: Vec<Vec4>) -> Result<()> {
        self.check_len(VertexAttrib::Color, data.len())?;
        self.colors = data;
        Ok(())
    }

    /// Append one triangle.
    ///
    /// Fails with `IndexOutOfRange` if any index is not below the current
    /// vertex count; the face list is unchanged on failure. Vertex data
    /// must therefore be set before the faces referencing it.
    pub fn add_face(&mut self, i0: u32, i1: u32, i2: u32) -> Result<()> {
        let vertex_count = self.vertex_count();
        for idx in [i0, i1, i2] {
            if idx as usize >= vertex_count {
                return Err(Error::IndexOutOfRange { index: idx, vertex_count });
            }
        }
        self.faces.push([i0, i1, i2]);
        Ok(())
    }

    /// Replace all faces in one go.
    pub fn set_faces(&mut self, data: Vec<[u32; 3]>) -> Result<()> {
        let vertex_count = self.vertex_count();
        for face in &data {
            for &idx in face {
                if idx as usize >= vertex_count {
                    return Err(Error::IndexOutOfRange { index: idx, vertex_count });
                }
            }
        }
        self.faces = data;
        Ok(())
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn tangents(&self) -> &[Vec3] {
        &self.tangents
    }

    pub fn texcoords(&self) -> &[Vec2] {
        &self.texcoords
    }

    pub fn skin_weights(&self) -> &[Vec4] {
        &self.skin_weights
    }

    pub fn skin_matrices(&self) -> &[[i32; 4]] {
        &self.skin_matrices
    }

    pub fn colors(&self) -> &[Vec4] {
        &self.colors
    }

    pub fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    /// Axis-aligned bounding box of the vertex positions.
    pub fn bounds(&self) -> Aabb {
        self.vertices
            .iter()
            .fold(Aabb::empty(), |aabb, &v| aabb.grow(v))
    }

    // A populated array fixes the vertex count for every other kind; empty
    // arrays mean "attribute not present" and don't participate.
    fn check_len(&self, kind: VertexAttrib, len: usize) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        for other in VertexAttrib::ALL {
            if other == kind {
                continue;
            }
            let other_len = self.attrib_len(other);
            if other_len != 0 && other_len != len {
                return Err(Error::DimensionMismatch {
                    attrib: kind.name(),
                    len,
                    expected: other_len,
                });
            }
        }
        Ok(())
    }
}
