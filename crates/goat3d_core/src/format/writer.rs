//! Scene file writing.
//!
//! Emits one element per line, two spaces of indentation per level.
//! Floats use the shortest decimal form that parses back to the identical
//! value, which is what makes save/load round trips bit exact.

use std::io::{self, Write};

use glam::{Quat, Vec3};

use crate::material::{AttribValue, Material};
use crate::mesh::{Mesh, VertexAttrib};
use crate::node::NodeObject;
use crate::scene::{NodeId, Scene};
use crate::track::{Track, TrackKey};

use super::escape_attr;

pub(crate) fn write_scene<W: Write>(scene: &Scene, w: &mut W) -> io::Result<()> {
    writeln!(w, "<scene>")?;
    tag(w, 1, &format!("<name string=\"{}\"/>", escape_attr(&scene.name)))?;
    tag(w, 1, "<env>")?;
    tag(
        w,
        2,
        &format!("<ambient float3=\"{}\"/>", vec3_str(scene.ambient)),
    )?;
    tag(w, 1, "</env>")?;

    for mtl in scene.materials() {
        write_material(w, mtl, 1)?;
    }
    for mesh in scene.meshes() {
        write_mesh(scene, w, mesh, 1)?;
    }
    for light in scene.lights() {
        tag(w, 1, "<light>")?;
        tag(w, 2, &format!("<name string=\"{}\"/>", escape_attr(&light.name)))?;
        tag(w, 2, &format!("<color float3=\"{}\"/>", vec3_str(light.color)))?;
        tag(
            w,
            2,
            &format!("<atten float3=\"{}\"/>", vec3_str(light.attenuation)),
        )?;
        tag(w, 2, &format!("<maxdist float=\"{}\"/>", light.max_dist))?;
        tag(w, 1, "</light>")?;
    }
    for cam in scene.cameras() {
        tag(w, 1, "<camera>")?;
        tag(w, 2, &format!("<name string=\"{}\"/>", escape_attr(&cam.name)))?;
        tag(
            w,
            2,
            &format!("<clip float2=\"{} {}\"/>", cam.near_clip, cam.far_clip),
        )?;
        tag(w, 1, "</camera>")?;
    }
    for &root in scene.roots() {
        write_node(scene, w, root, 1)?;
    }

    writeln!(w, "</scene>")
}

fn write_material<W: Write>(w: &mut W, mtl: &Material, level: usize) -> io::Result<()> {
    tag(w, level, "<mtl>")?;
    tag(
        w,
        level + 1,
        &format!("<name string=\"{}\"/>", escape_attr(&mtl.name)),
    )?;

    for (kind, value) in mtl.iter() {
        tag(w, level + 1, "<attr>")?;
        tag(
            w,
            level + 2,
            &format!("<name string=\"{}\"/>", kind.name()),
        )?;
        let val = match value {
            AttribValue::Scalar(x) => format!("<val float=\"{}\"/>", x),
            AttribValue::Vec3(v) => format!("<val float3=\"{}\"/>", vec3_str(*v)),
            AttribValue::Vec4(v) => {
                format!("<val float4=\"{} {} {} {}\"/>", v.x, v.y, v.z, v.w)
            }
            AttribValue::Map(path) => format!("<map string=\"{}\"/>", escape_attr(path)),
        };
        tag(w, level + 2, &val)?;
        tag(w, level + 1, "</attr>")?;
    }
    tag(w, level, "</mtl>")
}

fn write_mesh<W: Write>(scene: &Scene, w: &mut W, mesh: &Mesh, level: usize) -> io::Result<()> {
    tag(w, level, "<mesh>")?;
    tag(
        w,
        level + 1,
        &format!("<name string=\"{}\"/>", escape_attr(&mesh.name)),
    )?;

    // references were validated before writing, so the lookup resolves
    if let Some(mtl) = mesh.material.and_then(|id| scene.material(id)) {
        tag(
            w,
            level + 1,
            &format!("<material string=\"{}\"/>", escape_attr(&mtl.name)),
        )?;
    }

    for kind in VertexAttrib::ALL {
        let count = mesh.attrib_len(kind);
        if count == 0 {
            continue;
        }
        tag(
            w,
            level + 1,
            &format!("<attrib name=\"{}\" count=\"{}\">", kind.name(), count),
        )?;
        match kind {
            VertexAttrib::Vertex => write_vec3_rows(w, level + 2, mesh.vertices())?,
            VertexAttrib::Normal => write_vec3_rows(w, level + 2, mesh.normals())?,
            VertexAttrib::Tangent => write_vec3_rows(w, level + 2, mesh.tangents())?,
            VertexAttrib::Texcoord => {
                for v in mesh.texcoords() {
                    tag(w, level + 2, &format!("{} {}", v.x, v.y))?;
                }
            }
            VertexAttrib::SkinWeight => {
                for v in mesh.skin_weights() {
                    tag(w, level + 2, &format!("{} {} {} {}", v.x, v.y, v.z, v.w))?;
                }
            }
            VertexAttrib::SkinMatrix => {
                for m in mesh.skin_matrices() {
                    tag(w, level + 2, &format!("{} {} {} {}", m[0], m[1], m[2], m[3]))?;
                }
            }
            VertexAttrib::Color => {
                for v in mesh.colors() {
                    tag(w, level + 2, &format!("{} {} {} {}", v.x, v.y, v.z, v.w))?;
                }
            }
        }
        tag(w, level + 1, "</attrib>")?;
    }

    if mesh.face_count() > 0 {
        tag(
            w,
            level + 1,
            &format!("<faces count=\"{}\">", mesh.face_count()),
        )?;
        for face in mesh.faces() {
            tag(w, level + 2, &format!("{} {} {}", face[0], face[1], face[2]))?;
        }
        tag(w, level + 1, "</faces>")?;
    }
    tag(w, level, "</mesh>")
}

fn write_node<W: Write>(scene: &Scene, w: &mut W, id: NodeId, level: usize) -> io::Result<()> {
    let Some(node) = scene.node(id) else {
        return Ok(());
    };
    tag(w, level, "<node>")?;
    tag(
        w,
        level + 1,
        &format!("<name string=\"{}\"/>", escape_attr(&node.name)),
    )?;

    let object = match node.object {
        NodeObject::None => None,
        NodeObject::Mesh(id) => scene.mesh(id).map(|m| ("mesh", &m.name)),
        NodeObject::Light(id) => scene.light(id).map(|l| ("light", &l.name)),
        NodeObject::Camera(id) => scene.camera(id).map(|c| ("camera", &c.name)),
    };
    if let Some((kind, name)) = object {
        tag(
            w,
            level + 1,
            &format!("<object {}=\"{}\"/>", kind, escape_attr(name)),
        )?;
    }

    tag(
        w,
        level + 1,
        &format!("<pivot float3=\"{}\"/>", vec3_str(node.pivot)),
    )?;

    write_vec3_track(w, level + 1, "position", &node.position)?;
    write_quat_track(w, level + 1, &node.rotation)?;
    write_vec3_track(w, level + 1, "scaling", &node.scaling)?;

    for &child in node.children() {
        write_node(scene, w, child, level + 1)?;
    }
    tag(w, level, "</node>")
}

fn write_vec3_track<W: Write>(
    w: &mut W,
    level: usize,
    attr: &str,
    track: &Track<Vec3>,
) -> io::Result<()> {
    if track.is_empty() {
        return Ok(());
    }
    tag(
        w,
        level,
        &format!("<track attr=\"{}\" interp=\"{}\">", attr, track.interp.name()),
    )?;
    for TrackKey { time, value } in track.keys() {
        tag(
            w,
            level + 1,
            &format!("<key time=\"{}\" float3=\"{}\"/>", time, vec3_str(*value)),
        )?;
    }
    tag(w, level, "</track>")
}

fn write_quat_track<W: Write>(w: &mut W, level: usize, track: &Track<Quat>) -> io::Result<()> {
    if track.is_empty() {
        return Ok(());
    }
    tag(
        w,
        level,
        &format!("<track attr=\"rotation\" interp=\"{}\">", track.interp.name()),
    )?;
    for TrackKey { time, value } in track.keys() {
        tag(
            w,
            level + 1,
            &format!(
                "<key time=\"{}\" float4=\"{} {} {} {}\"/>",
                time, value.x, value.y, value.z, value.w
            ),
        )?;
    }
    tag(w, level, "</track>")
}

fn write_vec3_rows<W: Write>(w: &mut W, level: usize, data: &[Vec3]) -> io::Result<()> {
    for v in data {
        tag(w, level, &vec3_str(*v))?;
    }
    Ok(())
}

fn vec3_str(v: Vec3) -> String {
    format!("{} {} {}", v.x, v.y, v.z)
}

fn tag<W: Write>(w: &mut W, level: usize, line: &str) -> io::Result<()> {
    for _ in 0..level {
        write!(w, "  ")?;
    }
    writeln!(w, "{}", line)
}
