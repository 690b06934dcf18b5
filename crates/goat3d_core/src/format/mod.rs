//! The goat3d scene file format.
//!
//! A self-describing tagged text format, one element per line. Element
//! order in a file is materials, meshes, lights, cameras, then the node
//! tree depth-first in child insertion order, so every reference names an
//! entity defined earlier in the file.

mod parser;
mod reader;
mod writer;

pub use parser::ParseError;

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::error::Result;
use crate::scene::Scene;

/// Extension conventionally used for scene files.
pub const FILE_EXTENSION: &str = "goatsce";

pub(crate) fn write_scene<W: io::Write>(scene: &Scene, w: &mut W) -> io::Result<()> {
    writer::write_scene(scene, w)
}

pub(crate) fn read_scene(text: &str) -> Result<Scene> {
    reader::read_scene(text)
}

/// Validate and save a scene, atomically replacing any file at `path`.
pub(crate) fn save(scene: &Scene, path: &Path) -> Result<()> {
    scene.validate()?;

    let tmp = tmp_path(path);
    let file = File::create(&tmp)?;
    let mut w = BufWriter::new(file);
    if let Err(err) = write_scene(scene, &mut w).and_then(|()| w.flush()) {
        drop(w);
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }
    drop(w);

    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }

    info!("saved scene \"{}\" to {}", scene.name, path.display());
    Ok(())
}

/// Load a scene file; only a fully constructed scene is returned.
pub(crate) fn load(path: &Path) -> Result<Scene> {
    let text = fs::read_to_string(path)?;
    let scene = read_scene(&text)?;
    info!(
        "loaded scene \"{}\" from {} ({} materials, {} meshes, {} nodes)",
        scene.name,
        path.display(),
        scene.material_count(),
        scene.mesh_count(),
        scene.node_count()
    );
    Ok(scene)
}

// sibling temp file, same filesystem, so the final rename is atomic
fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".tmp{}", std::process::id()));
    PathBuf::from(name)
}

pub(crate) fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

pub(crate) fn unescape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let mut matched = false;
        for (entity, ch) in [("&amp;", '&'), ("&quot;", '"'), ("&lt;", '<'), ("&gt;", '>')] {
            if let Some(tail) = rest.strip_prefix(entity) {
                out.push(ch);
                rest = tail;
                matched = true;
                break;
            }
        }
        if !matched {
            out.push('&');
            rest = &rest[1..];
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::error::Error;
    use crate::light::Light;
    use crate::material::{AttribValue, Material, MaterialAttrib};
    use crate::mesh::Mesh;
    use crate::node::{Node, NodeObject};
    use crate::scene::{NodeId, Scene};
    use crate::track::Interp;

    use glam::{Quat, Vec2, Vec3, Vec4};

    fn write_to_string(scene: &Scene) -> String {
        let mut buf = Vec::new();
        write_scene(scene, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    /// Build the scene from the format's reference scenario: one material,
    /// one triangle mesh, one root node.
    fn demo_scene() -> Scene {
        let mut scene = Scene::new();
        scene.name = "demo".to_string();

        let mut mtl = Material::new("red");
        mtl.set_attrib(MaterialAttrib::Shininess, AttribValue::Scalar(32.0));
        mtl.set_attrib(
            MaterialAttrib::Diffuse,
            AttribValue::Vec4(Vec4::new(1.0, 0.0, 0.0, 1.0)),
        );
        let mtl_id = scene.add_material(mtl);

        let mut mesh = Mesh::new("tri");
        mesh.set_vertices(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ])
        .unwrap();
        mesh.set_normals(vec![Vec3::Z; 3]).unwrap();
        mesh.add_face(0, 1, 2).unwrap();
        mesh.set_material(mtl_id);
        let mesh_id = scene.add_mesh(mesh);

        let mut node = Node::new("obj");
        node.object = NodeObject::Mesh(mesh_id);
        node.set_position(Vec3::ZERO, 0);
        scene.add_node(node);

        scene
    }

    fn assert_node_trees_eq(a: &Scene, b: &Scene) {
        assert_eq!(a.roots().len(), b.roots().len());
        for (&ra, &rb) in a.roots().iter().zip(b.roots()) {
            assert_nodes_eq(a, ra, b, rb);
        }
    }

    fn assert_nodes_eq(a: &Scene, ida: NodeId, b: &Scene, idb: NodeId) {
        let na = a.node(ida).unwrap();
        let nb = b.node(idb).unwrap();
        assert_eq!(na.name, nb.name);
        assert_eq!(na.pivot, nb.pivot);
        assert_eq!(na.position, nb.position);
        assert_eq!(na.rotation, nb.rotation);
        assert_eq!(na.scaling, nb.scaling);

        match (na.object, nb.object) {
            (NodeObject::None, NodeObject::None) => {}
            (NodeObject::Mesh(ma), NodeObject::Mesh(mb)) => {
                assert_eq!(a.mesh(ma).unwrap().name, b.mesh(mb).unwrap().name);
            }
            (NodeObject::Light(la), NodeObject::Light(lb)) => {
                assert_eq!(a.light(la).unwrap().name, b.light(lb).unwrap().name);
            }
            (NodeObject::Camera(ca), NodeObject::Camera(cb)) => {
                assert_eq!(a.camera(ca).unwrap().name, b.camera(cb).unwrap().name);
            }
            (oa, ob) => panic!("object kind mismatch: {:?} vs {:?}", oa, ob),
        }

        assert_eq!(na.children().len(), nb.children().len());
        for (&ca, &cb) in na.children().iter().zip(nb.children()) {
            assert_nodes_eq(a, ca, b, cb);
        }
    }

    #[test]
    fn test_demo_scene_round_trip() {
        let scene = demo_scene();
        let text = write_to_string(&scene);
        let loaded = read_scene(&text).unwrap();

        assert_eq!(loaded.name, "demo");
        assert_eq!(loaded.ambient, scene.ambient);

        let mtl = &loaded.materials()[0];
        assert_eq!(mtl.name, "red");
        assert_eq!(
            mtl.attrib(MaterialAttrib::Shininess),
            Some(&AttribValue::Scalar(32.0))
        );
        assert_eq!(
            mtl.attrib(MaterialAttrib::Diffuse),
            Some(&AttribValue::Vec4(Vec4::new(1.0, 0.0, 0.0, 1.0)))
        );

        let mesh = &loaded.meshes()[0];
        assert_eq!(mesh.name, "tri");
        assert_eq!(mesh.vertices(), scene.meshes()[0].vertices());
        assert_eq!(mesh.normals(), vec![Vec3::Z; 3]);
        assert_eq!(mesh.faces(), &[[0, 1, 2]]);
        assert_eq!(mesh.material, Some(0));

        assert_eq!(loaded.roots().len(), 1);
        let node = loaded.node(loaded.roots()[0]).unwrap();
        assert_eq!(node.name, "obj");
        assert_eq!(node.position.keys().len(), 1);
        assert_eq!(node.position.keys()[0].time, 0);
        assert_eq!(node.position.keys()[0].value, Vec3::ZERO);
        assert!(matches!(node.object, NodeObject::Mesh(_)));
    }

    #[test]
    fn test_round_trip_is_idempotent() {
        // writing the loaded scene again must reproduce the file byte for byte
        let text = write_to_string(&demo_scene());
        let loaded = read_scene(&text).unwrap();
        assert_eq!(write_to_string(&loaded), text);
    }

    #[test]
    fn test_empty_scene_round_trip() {
        let scene = Scene::new();
        let loaded = read_scene(&write_to_string(&scene)).unwrap();
        assert_eq!(loaded, scene);
    }

    #[test]
    fn test_zero_length_mesh_and_bare_node() {
        let mut scene = Scene::new();
        scene.add_mesh(Mesh::new("husk"));
        scene.add_node(Node::new("empty"));

        let loaded = read_scene(&write_to_string(&scene)).unwrap();
        assert_eq!(loaded.meshes()[0].name, "husk");
        assert_eq!(loaded.meshes()[0].vertex_count(), 0);
        let node = loaded.node(loaded.roots()[0]).unwrap();
        assert_eq!(node.name, "empty");
        assert_eq!(node.object, NodeObject::None);
        assert!(node.position.is_empty());
    }

    #[test]
    fn test_lights_and_cameras_round_trip() {
        let mut scene = Scene::new();
        let mut light = Light::new("key");
        light.color = Vec3::new(1.0, 0.9, 0.8);
        light.attenuation = Vec3::new(1.0, 0.1, 0.01);
        light.max_dist = 250.0;
        let light_id = scene.add_light(light);

        let mut cam = Camera::new("main");
        cam.near_clip = 0.25;
        cam.far_clip = 1000.0;
        let cam_id = scene.add_camera(cam);

        let mut ln = Node::new("key_node");
        ln.object = NodeObject::Light(light_id);
        scene.add_node(ln);
        let mut cn = Node::new("cam_node");
        cn.object = NodeObject::Camera(cam_id);
        scene.add_node(cn);

        let loaded = read_scene(&write_to_string(&scene)).unwrap();
        assert_eq!(loaded.lights()[0], scene.lights()[0]);
        assert_eq!(loaded.cameras()[0], scene.cameras()[0]);
        assert_node_trees_eq(&scene, &loaded);
    }

    #[test]
    fn test_node_hierarchy_round_trip() {
        let mut scene = Scene::new();
        let root = scene.add_node(Node::new("root"));
        let left = scene.add_node(Node::new("left"));
        let right = scene.add_node(Node::new("right"));
        let leaf = scene.add_node(Node::new("leaf"));
        scene.add_child(root, left).unwrap();
        scene.add_child(root, right).unwrap();
        scene.add_child(left, leaf).unwrap();
        scene.add_node(Node::new("second_root"));

        let loaded = read_scene(&write_to_string(&scene)).unwrap();
        assert_eq!(loaded.node_count(), 5);
        assert_node_trees_eq(&scene, &loaded);

        // child order survives: left before right
        let lroot = loaded.node(loaded.roots()[0]).unwrap();
        let names: Vec<_> = lroot
            .children()
            .iter()
            .map(|&c| loaded.node(c).unwrap().name.as_str())
            .collect();
        assert_eq!(names, vec!["left", "right"]);
    }

    #[test]
    fn test_tracks_round_trip_exact() {
        let mut scene = Scene::new();
        let mut node = Node::new("anim");
        node.position.interp = Interp::Step;
        node.set_position(Vec3::new(0.1, 1.0 / 3.0, f32::MIN_POSITIVE), 0);
        node.set_position(Vec3::new(-2.5e-7, 1e8, 42.125), 40);
        node.set_rotation(Quat::from_xyzw(0.1, 0.2, 0.3, 0.9273618), 40);
        node.set_scaling(Vec3::splat(2.0), 0);
        node.set_pivot(Vec3::new(0.25, 0.0, -0.75));
        scene.add_node(node);

        let loaded = read_scene(&write_to_string(&scene)).unwrap();
        let orig = scene.node(scene.roots()[0]).unwrap();
        let node = loaded.node(loaded.roots()[0]).unwrap();

        assert_eq!(node.position, orig.position);
        assert_eq!(node.rotation, orig.rotation);
        assert_eq!(node.scaling, orig.scaling);
        assert_eq!(node.pivot, orig.pivot);
        assert_eq!(node.position.interp, Interp::Step);
    }

    #[test]
    fn test_all_vertex_attribs_round_trip() {
        let mut scene = Scene::new();
        let mut mesh = Mesh::new("full");
        mesh.set_vertices(vec![Vec3::ZERO, Vec3::X, Vec3::Y]).unwrap();
        mesh.set_normals(vec![Vec3::Z; 3]).unwrap();
        mesh.set_tangents(vec![Vec3::X; 3]).unwrap();
        mesh.set_texcoords(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
        ])
        .unwrap();
        mesh.set_skin_weights(vec![Vec4::new(0.5, 0.25, 0.25, 0.0); 3])
            .unwrap();
        mesh.set_skin_matrices(vec![[0, 1, 2, -1]; 3]).unwrap();
        mesh.set_colors(vec![Vec4::ONE; 3]).unwrap();
        mesh.add_face(0, 1, 2).unwrap();
        scene.add_mesh(mesh);

        let loaded = read_scene(&write_to_string(&scene)).unwrap();
        assert_eq!(loaded.meshes()[0], scene.meshes()[0]);
    }

    #[test]
    fn test_names_with_special_chars_round_trip() {
        let mut scene = Scene::new();
        scene.name = "a \"quoted\" <scene> & more".to_string();
        let mut mtl = Material::new("rock & roll");
        mtl.set_attrib(
            MaterialAttrib::Diffuse,
            AttribValue::Map("textures/\"old\" <rock>.png".to_string()),
        );
        scene.add_material(mtl);

        let loaded = read_scene(&write_to_string(&scene)).unwrap();
        assert_eq!(loaded.name, scene.name);
        assert_eq!(loaded.materials()[0], scene.materials()[0]);
    }

    #[test]
    fn test_escape_round_trip() {
        let raw = "a&b \"c\" <d> &amp; e";
        assert_eq!(unescape_attr(&escape_attr(raw)), raw);
        // lone ampersands pass through unharmed
        assert_eq!(unescape_attr("a & b"), "a & b");
    }

    #[test]
    fn test_save_and_load_file() {
        let path = test_path("roundtrip");
        demo_scene().save(&path).unwrap();

        let loaded = Scene::load(&path).unwrap();
        assert_eq!(loaded.name, "demo");
        assert_eq!(loaded.mesh_count(), 1);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_save_to_missing_directory_fails_cleanly() {
        let path = std::env::temp_dir()
            .join("goat3d_no_such_dir")
            .join("demo.goatsce");
        let err = demo_scene().save(&path).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_failed_save_preserves_previous_file() {
        let path = test_path("atomic");
        demo_scene().save(&path).unwrap();

        // a scene with a dangling reference fails validation before writing
        let mut bad = Scene::new();
        let mut mesh = Mesh::new("tri");
        mesh.set_material(99);
        bad.add_mesh(mesh);
        assert!(matches!(
            bad.save(&path),
            Err(Error::UnresolvedReference { .. })
        ));

        let loaded = Scene::load(&path).unwrap();
        assert_eq!(loaded.name, "demo");

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_stream_round_trip() {
        let scene = demo_scene();
        let mut buf = Vec::new();
        scene.write_to(&mut buf).unwrap();

        let loaded = Scene::read_from(&mut buf.as_slice()).unwrap();
        assert_eq!(loaded.name, "demo");
        assert_node_trees_eq(&scene, &loaded);
    }

    fn test_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "goat3d_test_{}_{}.{}",
            tag,
            std::process::id(),
            FILE_EXTENSION
        ))
    }
}
