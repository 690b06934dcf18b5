//! Scene reconstruction from parsed file items.
//!
//! The reader builds into a private scene and only hands it out when the
//! whole file parsed and every reference resolved, so the caller never
//! observes a half-populated scene. Unknown elements are skipped so that
//! files written by newer tools still load.

use glam::{Quat, Vec2, Vec3, Vec4};
use log::debug;

use crate::camera::Camera;
use crate::error::{Error, Result};
use crate::light::Light;
use crate::material::{AttribValue, Material, MaterialAttrib};
use crate::mesh::{Mesh, VertexAttrib};
use crate::node::{Node, NodeObject};
use crate::scene::{NodeId, Scene};
use crate::track::Interp;

use super::parser::{parse_float_row, parse_int_row, ElementParser, Item, ParseError, Tag};

/// Parse file contents into a fully constructed scene.
pub(crate) fn read_scene(text: &str) -> Result<Scene> {
    let mut reader = SceneReader {
        items: ElementParser::new(text),
        scene: Scene::new(),
    };
    reader.read()?;
    Ok(reader.scene)
}

struct SceneReader {
    items: ElementParser,
    scene: Scene,
}

impl SceneReader {
    fn read(&mut self) -> Result<()> {
        let scene_tag = match self.items.expect_item()? {
            Item::Open(tag) if tag.name == "scene" => tag,
            other => {
                return Err(syntax(other.offset(), "expected <scene> as the root element"));
            }
        };

        loop {
            let item = self.expect_in(&scene_tag)?;
            match item {
                Item::Close { ref name, .. } if name == "scene" => break,
                Item::Empty(tag) if tag.name == "name" => {
                    self.scene.name = tag.require("string")?.to_string();
                }
                Item::Open(tag) if tag.name == "env" => self.read_env(&tag)?,
                Item::Open(tag) if tag.name == "mtl" => self.read_material(&tag)?,
                Item::Open(tag) if tag.name == "mesh" => self.read_mesh(&tag)?,
                Item::Open(tag) if tag.name == "light" => self.read_light(&tag)?,
                Item::Open(tag) if tag.name == "camera" => self.read_camera(&tag)?,
                Item::Open(tag) if tag.name == "node" => {
                    self.read_node(&tag)?;
                }
                Item::Open(tag) => {
                    debug!("skipping unknown element <{}>", tag.name);
                    self.skip_element(&tag)?;
                }
                Item::Empty(tag) => debug!("skipping unknown element <{}/>", tag.name),
                Item::Close { name, offset } => {
                    return Err(syntax(offset, format!("unexpected </{}>", name)));
                }
                Item::Data { offset, .. } => {
                    return Err(syntax(offset, "unexpected data row outside an array element"));
                }
            }
        }
        Ok(())
    }

    fn read_env(&mut self, env_tag: &Tag) -> Result<()> {
        loop {
            match self.expect_in(env_tag)? {
                Item::Close { ref name, .. } if name == "env" => return Ok(()),
                Item::Empty(tag) if tag.name == "ambient" => {
                    let [r, g, b] = tag.floats::<3>("float3")?;
                    self.scene.ambient = Vec3::new(r, g, b);
                }
                Item::Empty(tag) => debug!("skipping unknown env element <{}/>", tag.name),
                Item::Open(tag) => self.skip_element(&tag)?,
                other => return Err(syntax(other.offset(), "unexpected content in <env>")),
            }
        }
    }

    fn read_material(&mut self, mtl_tag: &Tag) -> Result<()> {
        let mut mtl = Material::default();
        loop {
            match self.expect_in(mtl_tag)? {
                Item::Close { ref name, .. } if name == "mtl" => break,
                Item::Empty(tag) if tag.name == "name" => {
                    mtl.name = tag.require("string")?.to_string();
                }
                Item::Open(tag) if tag.name == "attr" => self.read_material_attr(&mut mtl, &tag)?,
                Item::Empty(tag) => debug!("skipping unknown material element <{}/>", tag.name),
                Item::Open(tag) => self.skip_element(&tag)?,
                other => return Err(syntax(other.offset(), "unexpected content in <mtl>")),
            }
        }
        self.scene.add_material(mtl);
        Ok(())
    }

    fn read_material_attrib_value(tag: &Tag) -> Result<AttribValue> {
        if tag.attr("float").is_some() {
            Ok(AttribValue::Scalar(tag.f32_attr("float")?))
        } else if tag.attr("float3").is_some() {
            let [x, y, z] = tag.floats::<3>("float3")?;
            Ok(AttribValue::Vec3(Vec3::new(x, y, z)))
        } else if tag.attr("float4").is_some() {
            let [x, y, z, w] = tag.floats::<4>("float4")?;
            Ok(AttribValue::Vec4(Vec4::new(x, y, z, w)))
        } else {
            Err(syntax(
                tag.offset,
                "<val> needs a float, float3 or float4 attribute",
            ))
        }
    }

    fn read_material_attr(&mut self, mtl: &mut Material, attr_tag: &Tag) -> Result<()> {
        let mut kind = None;
        let mut value = None;
        loop {
            match self.expect_in(attr_tag)? {
                Item::Close { ref name, .. } if name == "attr" => break,
                Item::Empty(tag) if tag.name == "name" => {
                    let name = tag.require("string")?;
                    kind = MaterialAttrib::from_name(name);
                    if kind.is_none() {
                        debug!("skipping unknown material attribute \"{}\"", name);
                    }
                }
                Item::Empty(tag) if tag.name == "val" => {
                    value = Some(Self::read_material_attrib_value(&tag)?);
                }
                Item::Empty(tag) if tag.name == "map" => {
                    value = Some(AttribValue::Map(tag.require("string")?.to_string()));
                }
                Item::Empty(tag) => debug!("skipping unknown attr element <{}/>", tag.name),
                Item::Open(tag) => self.skip_element(&tag)?,
                other => return Err(syntax(other.offset(), "unexpected content in <attr>")),
            }
        }
        if let (Some(kind), Some(value)) = (kind, value) {
            mtl.set_attrib(kind, value);
        }
        Ok(())
    }

    fn read_mesh(&mut self, mesh_tag: &Tag) -> Result<()> {
        let mut mesh = Mesh::default();
        loop {
            match self.expect_in(mesh_tag)? {
                Item::Close { ref name, .. } if name == "mesh" => break,
                Item::Empty(tag) if tag.name == "name" => {
                    mesh.name = tag.require("string")?.to_string();
                }
                Item::Empty(tag) if tag.name == "material" => {
                    let name = tag.require("string")?;
                    let id = self.scene.material_by_name(name).ok_or_else(|| {
                        Error::UnresolvedReference {
                            kind: "material",
                            name: name.to_string(),
                        }
                    })?;
                    mesh.material = Some(id);
                }
                Item::Open(tag) if tag.name == "attrib" => {
                    self.read_mesh_attrib(&mut mesh, &tag)?;
                }
                Item::Open(tag) if tag.name == "faces" => {
                    let count = tag.usize_attr("count")?;
                    for _ in 0..count {
                        let (text, offset) = self.expect_data(&tag)?;
                        let [i0, i1, i2] = parse_int_row::<3>(&text, offset)?;
                        mesh.add_face(
                            face_index(i0, offset)?,
                            face_index(i1, offset)?,
                            face_index(i2, offset)?,
                        )?;
                    }
                    self.expect_close(&tag)?;
                }
                Item::Empty(tag) => debug!("skipping unknown mesh element <{}/>", tag.name),
                Item::Open(tag) => self.skip_element(&tag)?,
                other => return Err(syntax(other.offset(), "unexpected content in <mesh>")),
            }
        }
        self.scene.add_mesh(mesh);
        Ok(())
    }

    fn read_mesh_attrib(&mut self, mesh: &mut Mesh, attrib_tag: &Tag) -> Result<()> {
        let name = attrib_tag.require("name")?.to_string();
        let count = attrib_tag.usize_attr("count")?;

        let Some(kind) = VertexAttrib::from_name(&name) else {
            debug!("skipping unknown vertex attribute \"{}\"", name);
            for _ in 0..count {
                self.expect_data(attrib_tag)?;
            }
            return self.expect_close(attrib_tag);
        };

        match kind {
            VertexAttrib::Vertex => {
                let data = self.read_vec3_rows(count, attrib_tag)?;
                self.expect_close(attrib_tag)?;
                mesh.set_vertices(data)?;
            }
            VertexAttrib::Normal => {
                let data = self.read_vec3_rows(count, attrib_tag)?;
                self.expect_close(attrib_tag)?;
                mesh.set_normals(data)?;
            }
            VertexAttrib::Tangent => {
                let data = self.read_vec3_rows(count, attrib_tag)?;
                self.expect_close(attrib_tag)?;
                mesh.set_tangents(data)?;
            }
            VertexAttrib::Texcoord => {
                let mut data = Vec::with_capacity(count);
                for _ in 0..count {
                    let (text, offset) = self.expect_data(attrib_tag)?;
                    let [x, y] = parse_float_row::<2>(&text, offset)?;
                    data.push(Vec2::new(x, y));
                }
                self.expect_close(attrib_tag)?;
                mesh.set_texcoords(data)?;
            }
            VertexAttrib::SkinWeight => {
                let data = self.read_vec4_rows(count, attrib_tag)?;
                self.expect_close(attrib_tag)?;
                mesh.set_skin_weights(data)?;
            }
            VertexAttrib::SkinMatrix => {
                let mut data = Vec::with_capacity(count);
                for _ in 0..count {
                    let (text, offset) = self.expect_data(attrib_tag)?;
                    let [a, b, c, d] = parse_int_row::<4>(&text, offset)?;
                    data.push([a as i32, b as i32, c as i32, d as i32]);
                }
                self.expect_close(attrib_tag)?;
                mesh.set_skin_matrices(data)?;
            }
            VertexAttrib::Color => {
                let data = self.read_vec4_rows(count, attrib_tag)?;
                self.expect_close(attrib_tag)?;
                mesh.set_colors(data)?;
            }
        }
        Ok(())
    }

    fn read_light(&mut self, light_tag: &Tag) -> Result<()> {
        let mut light = Light::default();
        loop {
            match self.expect_in(light_tag)? {
                Item::Close { ref name, .. } if name == "light" => break,
                Item::Empty(tag) if tag.name == "name" => {
                    light.name = tag.require("string")?.to_string();
                }
                Item::Empty(tag) if tag.name == "color" => {
                    let [r, g, b] = tag.floats::<3>("float3")?;
                    light.color = Vec3::new(r, g, b);
                }
                Item::Empty(tag) if tag.name == "atten" => {
                    let [x, y, z] = tag.floats::<3>("float3")?;
                    light.attenuation = Vec3::new(x, y, z);
                }
                Item::Empty(tag) if tag.name == "maxdist" => {
                    light.max_dist = tag.f32_attr("float")?;
                }
                Item::Empty(tag) => debug!("skipping unknown light element <{}/>", tag.name),
                Item::Open(tag) => self.skip_element(&tag)?,
                other => return Err(syntax(other.offset(), "unexpected content in <light>")),
            }
        }
        self.scene.add_light(light);
        Ok(())
    }

    fn read_camera(&mut self, cam_tag: &Tag) -> Result<()> {
        let mut cam = Camera::default();
        loop {
            match self.expect_in(cam_tag)? {
                Item::Close { ref name, .. } if name == "camera" => break,
                Item::Empty(tag) if tag.name == "name" => {
                    cam.name = tag.require("string")?.to_string();
                }
                Item::Empty(tag) if tag.name == "clip" => {
                    let [near, far] = tag.floats::<2>("float2")?;
                    cam.near_clip = near;
                    cam.far_clip = far;
                }
                Item::Empty(tag) => debug!("skipping unknown camera element <{}/>", tag.name),
                Item::Open(tag) => self.skip_element(&tag)?,
                other => return Err(syntax(other.offset(), "unexpected content in <camera>")),
            }
        }
        self.scene.add_camera(cam);
        Ok(())
    }

    fn read_node(&mut self, node_tag: &Tag) -> Result<NodeId> {
        let mut node = Node::default();
        let mut children = Vec::new();
        loop {
            match self.expect_in(node_tag)? {
                Item::Close { ref name, .. } if name == "node" => break,
                Item::Empty(tag) if tag.name == "name" => {
                    node.name = tag.require("string")?.to_string();
                }
                Item::Empty(tag) if tag.name == "object" => {
                    node.object = self.resolve_object(&tag)?;
                }
                Item::Empty(tag) if tag.name == "pivot" => {
                    let [x, y, z] = tag.floats::<3>("float3")?;
                    node.pivot = Vec3::new(x, y, z);
                }
                Item::Open(tag) if tag.name == "track" => self.read_track(&mut node, &tag)?,
                Item::Open(tag) if tag.name == "node" => {
                    children.push(self.read_node(&tag)?);
                }
                Item::Empty(tag) => debug!("skipping unknown node element <{}/>", tag.name),
                Item::Open(tag) => self.skip_element(&tag)?,
                other => return Err(syntax(other.offset(), "unexpected content in <node>")),
            }
        }

        let id = self.scene.add_node(node);
        for child in children {
            self.scene.add_child(id, child)?;
        }
        Ok(id)
    }

    fn resolve_object(&self, tag: &Tag) -> Result<NodeObject> {
        if let Some(name) = tag.attr("mesh") {
            let id = self
                .scene
                .mesh_by_name(name)
                .ok_or_else(|| unresolved("mesh", name))?;
            return Ok(NodeObject::Mesh(id));
        }
        if let Some(name) = tag.attr("light") {
            let id = self
                .scene
                .light_by_name(name)
                .ok_or_else(|| unresolved("light", name))?;
            return Ok(NodeObject::Light(id));
        }
        if let Some(name) = tag.attr("camera") {
            let id = self
                .scene
                .camera_by_name(name)
                .ok_or_else(|| unresolved("camera", name))?;
            return Ok(NodeObject::Camera(id));
        }
        Err(syntax(
            tag.offset,
            "<object> needs a mesh, light or camera attribute",
        ))
    }

    fn read_track(&mut self, node: &mut Node, track_tag: &Tag) -> Result<()> {
        let attr = track_tag.require("attr")?.to_string();
        let interp = track_tag
            .attr("interp")
            .and_then(Interp::from_name)
            .unwrap_or_default();

        match attr.as_str() {
            "position" | "scaling" => {
                let track = if attr == "position" {
                    &mut node.position
                } else {
                    &mut node.scaling
                };
                track.interp = interp;
                loop {
                    match self.expect_in(track_tag)? {
                        Item::Close { ref name, .. } if name == "track" => break,
                        Item::Empty(tag) if tag.name == "key" => {
                            let time = tag.i64_attr("time")?;
                            let [x, y, z] = tag.floats::<3>("float3")?;
                            track.set_key(Vec3::new(x, y, z), time);
                        }
                        other => {
                            return Err(syntax(other.offset(), "unexpected content in <track>"));
                        }
                    }
                }
            }
            "rotation" => {
                node.rotation.interp = interp;
                loop {
                    match self.expect_in(track_tag)? {
                        Item::Close { ref name, .. } if name == "track" => break,
                        Item::Empty(tag) if tag.name == "key" => {
                            let time = tag.i64_attr("time")?;
                            let [x, y, z, w] = tag.floats::<4>("float4")?;
                            node.rotation.set_key(Quat::from_xyzw(x, y, z, w), time);
                        }
                        other => {
                            return Err(syntax(other.offset(), "unexpected content in <track>"));
                        }
                    }
                }
            }
            other => {
                debug!("skipping unknown track \"{}\"", other);
                self.skip_element(track_tag)?;
            }
        }
        Ok(())
    }

    fn read_vec3_rows(&mut self, count: usize, within: &Tag) -> Result<Vec<Vec3>> {
        let mut data = Vec::with_capacity(count);
        for _ in 0..count {
            let (text, offset) = self.expect_data(within)?;
            let [x, y, z] = parse_float_row::<3>(&text, offset)?;
            data.push(Vec3::new(x, y, z));
        }
        Ok(data)
    }

    fn read_vec4_rows(&mut self, count: usize, within: &Tag) -> Result<Vec<Vec4>> {
        let mut data = Vec::with_capacity(count);
        for _ in 0..count {
            let (text, offset) = self.expect_data(within)?;
            let [x, y, z, w] = parse_float_row::<4>(&text, offset)?;
            data.push(Vec4::new(x, y, z, w));
        }
        Ok(data)
    }

    // next item inside an element, turning EOF into an unclosed-element error
    fn expect_in(&mut self, open: &Tag) -> Result<Item> {
        self.items
            .next_item()?
            .ok_or_else(|| {
                Error::Parse(ParseError::UnclosedElement {
                    offset: open.offset,
                    name: open.name.clone(),
                })
            })
    }

    fn expect_data(&mut self, within: &Tag) -> Result<(String, usize)> {
        match self.expect_in(within)? {
            Item::Data { text, offset } => Ok((text, offset)),
            other => Err(syntax(
                other.offset(),
                format!("expected a data row in <{}>", within.name),
            )),
        }
    }

    fn expect_close(&mut self, open: &Tag) -> Result<()> {
        match self.expect_in(open)? {
            Item::Close { ref name, .. } if *name == open.name => Ok(()),
            other => Err(syntax(
                other.offset(),
                format!("expected </{}>", open.name),
            )),
        }
    }

    fn skip_element(&mut self, open: &Tag) -> Result<()> {
        let mut depth = 1;
        while depth > 0 {
            match self.items.next_item()? {
                Some(Item::Open(_)) => depth += 1,
                Some(Item::Close { .. }) => depth -= 1,
                Some(_) => {}
                None => {
                    return Err(Error::Parse(ParseError::UnclosedElement {
                        offset: open.offset,
                        name: open.name.clone(),
                    }));
                }
            }
        }
        Ok(())
    }
}

fn syntax(offset: usize, message: impl Into<String>) -> Error {
    Error::Parse(ParseError::Syntax {
        offset,
        message: message.into(),
    })
}

fn unresolved(kind: &'static str, name: &str) -> Error {
    Error::UnresolvedReference {
        kind,
        name: name.to_string(),
    }
}

fn face_index(value: i64, offset: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        Error::Parse(ParseError::InvalidNumber {
            offset,
            value: value.to_string(),
        })
    })
}
