//! Inspect a goat3d scene file.
//!
//! Prints a scene overview, plus per-entity detail behind flags:
//!
//! ```text
//! goat3d_info -mesh -node scene.goatsce
//! ```

use std::env;

use anyhow::{bail, Context, Result};
use goat3d_core::{AttribValue, NodeId, NodeObject, Scene, VertexAttrib};

const INFO_MTL: u32 = 0x01;
const INFO_MESH: u32 = 0x02;
const INFO_LIGHT: u32 = 0x04;
const INFO_CAM: u32 = 0x08;
const INFO_NODE: u32 = 0x10;

const USAGE: &str = "Usage: goat3d_info [options] <filename>
Options:
  -mtl: print details about materials in the file
  -mesh: print details about meshes in the file
  -light: print details about lights in the file
  -cam: print details about cameras in the file
  -node: print details about the nodes in the file
  -h,-help: print usage help and exit";

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut mode = 0u32;
    let mut fname = None;

    for arg in &args[1..] {
        match arg.as_str() {
            "-mtl" => mode |= INFO_MTL,
            "-mesh" => mode |= INFO_MESH,
            "-light" => mode |= INFO_LIGHT,
            "-cam" => mode |= INFO_CAM,
            "-node" => mode |= INFO_NODE,
            "-h" | "-help" => {
                println!("{}", USAGE);
                return Ok(());
            }
            opt if opt.starts_with('-') => bail!("invalid option: {}", opt),
            name => {
                if fname.is_some() {
                    bail!("unexpected argument: {}", name);
                }
                fname = Some(name);
            }
        }
    }

    let Some(fname) = fname else {
        bail!("pass the filename of a goat3d scene file\n{}", USAGE);
    };

    let scene = Scene::load(fname).with_context(|| format!("failed to load {}", fname))?;

    print_overview(&scene);

    if mode & INFO_MTL != 0 {
        print_mtl(&scene);
    }
    if mode & INFO_MESH != 0 {
        print_mesh(&scene);
    }
    if mode & INFO_LIGHT != 0 {
        print_light(&scene);
    }
    if mode & INFO_CAM != 0 {
        print_cam(&scene);
    }
    if mode & INFO_NODE != 0 {
        print_node(&scene);
    }

    Ok(())
}

fn print_overview(scene: &Scene) {
    println!("Scene: \"{}\"", scene.name);
    println!(
        "Ambient: {} {} {}",
        scene.ambient.x, scene.ambient.y, scene.ambient.z
    );

    let bounds = scene.bounds(0);
    if bounds.is_empty() {
        println!("Bounds: empty");
    } else {
        let (min, max) = (bounds.min(), bounds.max());
        println!(
            "Bounds: {:.3} {:.3} {:.3} - {:.3} {:.3} {:.3}",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
    }

    println!("Materials: {}", scene.material_count());
    println!("Meshes: {}", scene.mesh_count());
    println!("Lights: {}", scene.light_count());
    println!("Cameras: {}", scene.camera_count());
    println!("Nodes: {}", scene.node_count());
}

fn print_mtl(scene: &Scene) {
    println!("\n--- Materials ---");
    for mtl in scene.materials() {
        println!("  \"{}\" ({} attributes)", mtl.name, mtl.attrib_count());
        for (kind, value) in mtl.iter() {
            let value = match value {
                AttribValue::Scalar(x) => format!("{}", x),
                AttribValue::Vec3(v) => format!("{} {} {}", v.x, v.y, v.z),
                AttribValue::Vec4(v) => format!("{} {} {} {}", v.x, v.y, v.z, v.w),
                AttribValue::Map(path) => format!("map \"{}\"", path),
            };
            println!("    {}: {}", kind.name(), value);
        }
    }
}

fn print_mesh(scene: &Scene) {
    println!("\n--- Meshes ---");
    for mesh in scene.meshes() {
        let mtl_name = mesh
            .material
            .and_then(|id| scene.material(id))
            .map(|m| m.name.as_str())
            .unwrap_or("<none>");
        println!(
            "  \"{}\" - {} vertices, {} faces, material {}",
            mesh.name,
            mesh.vertex_count(),
            mesh.face_count(),
            mtl_name
        );
        for kind in VertexAttrib::ALL {
            let len = mesh.attrib_len(kind);
            if len > 0 && kind != VertexAttrib::Vertex {
                println!("    {}: {}", kind.name(), len);
            }
        }
    }
}

fn print_light(scene: &Scene) {
    println!("\n--- Lights ---");
    for light in scene.lights() {
        println!(
            "  \"{}\" - color {} {} {}, atten {} {} {}, max dist {}",
            light.name,
            light.color.x,
            light.color.y,
            light.color.z,
            light.attenuation.x,
            light.attenuation.y,
            light.attenuation.z,
            light.max_dist
        );
    }
}

fn print_cam(scene: &Scene) {
    println!("\n--- Cameras ---");
    for cam in scene.cameras() {
        println!(
            "  \"{}\" - near {}, far {}",
            cam.name, cam.near_clip, cam.far_clip
        );
    }
}

fn print_node(scene: &Scene) {
    println!("\n--- Nodes ---");
    for &root in scene.roots() {
        print_node_tree(scene, root, 1);
    }
}

fn print_node_tree(scene: &Scene, id: NodeId, depth: usize) {
    let Some(node) = scene.node(id) else {
        return;
    };

    let object = match node.object {
        NodeObject::None => "<none>".to_string(),
        NodeObject::Mesh(id) => format!(
            "mesh \"{}\"",
            scene.mesh(id).map(|m| m.name.as_str()).unwrap_or("?")
        ),
        NodeObject::Light(id) => format!(
            "light \"{}\"",
            scene.light(id).map(|l| l.name.as_str()).unwrap_or("?")
        ),
        NodeObject::Camera(id) => format!(
            "camera \"{}\"",
            scene.camera(id).map(|c| c.name.as_str()).unwrap_or("?")
        ),
    };

    let pos = node.position_at(0);
    println!(
        "{:indent$}\"{}\" - object {}, position {:.3} {:.3} {:.3}, {} position keys",
        "",
        node.name,
        object,
        pos.x,
        pos.y,
        pos.z,
        node.position.len(),
        indent = depth * 2
    );

    for &child in node.children() {
        print_node_tree(scene, child, depth + 1);
    }
}
