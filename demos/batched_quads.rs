//! Draws a grid of quads batched into one mesh, instanced several times.
//!
//! ```text
//! cargo run --example batched_quads -- --meshes 64 --debug
//! ```

use clap::Parser;
use glam::{Mat4, Vec3};
use nebula_graphics::{
    init_logging, ContextConfig, GraphicsResult, HostBuffer, InstanceId, Material, Model,
    NativeMesh, ShaderMaterial, ShaderProgram, Window,
};
use std::rc::Rc;
use std::time::Instant;

const VERTEX_SHADER: &str = r#"#version 430 core
layout(location = 0) in vec3 position;
layout(std430, binding = 0) buffer Transforms { mat4 transforms[]; };
uniform float scale;
void main() {
    gl_Position = transforms[gl_InstanceID] * vec4(position * scale, 1.0);
}
"#;

const FRAGMENT_SHADER: &str = r#"#version 430 core
uniform vec3 tint;
out vec4 color;
void main() {
    color = vec4(tint, 1.0);
}
"#;

/// Nebula batched quad demo
#[derive(Parser, Debug)]
#[command(name = "batched_quads", about = "Batched, instanced quad rendering", version)]
struct Args {
    /// Initial window width in pixels.
    #[arg(long, default_value = "500")]
    width: u32,

    /// Initial window height in pixels.
    #[arg(long, default_value = "500")]
    height: u32,

    /// Window title.
    #[arg(long, default_value = "Nebula")]
    title: String,

    /// Request a debug context and log driver messages.
    #[arg(long)]
    debug: bool,

    /// Number of quads merged into the batch (laid out on a square grid).
    #[arg(long, default_value = "16")]
    meshes: u32,
}

fn quad(center_x: f32, center_y: f32, half: f32) -> GraphicsResult<NativeMesh> {
    let vertices = [
        center_x - half, center_y - half, 0.0, //
        center_x + half, center_y - half, 0.0, //
        center_x + half, center_y + half, 0.0, //
        center_x - half, center_y + half, 0.0,
    ];
    NativeMesh::with_data(
        HostBuffer::from_slice(&vertices),
        HostBuffer::from_slice(&[0, 1, 2, 0, 2, 3]),
    )
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let args = Args::parse();

    let config = ContextConfig {
        title: args.title,
        width: args.width,
        height: args.height,
        debug: args.debug || ContextConfig::default().debug,
        ..Default::default()
    };
    let window = Window::new(&config)?;
    let backend = window.backend();

    let shader = Rc::new(ShaderProgram::new(&backend, VERTEX_SHADER, FRAGMENT_SHADER)?);
    let material: Rc<dyn Material> = Rc::new(
        ShaderMaterial::new(shader)
            .with_uniform("tint", Vec3::new(0.9, 0.4, 0.2))
            .with_uniform("scale", 0.5f32),
    );

    let mut model = Model::new(&backend)?;
    let side = (args.meshes.max(1) as f32).sqrt().ceil() as u32;
    let cell = 2.0 / side as f32;
    for n in 0..args.meshes.max(1) {
        let x = -1.0 + cell * ((n % side) as f32 + 0.5);
        let y = -1.0 + cell * ((n / side) as f32 + 0.5);
        model.add_mesh(material.clone(), quad(x, y, cell * 0.4)?)?;
    }
    log::info!("Batched {} quads into one material", model.mesh_count());

    let instances: Vec<InstanceId> = (0..3).map(|_| model.create_instance()).collect();
    let started = Instant::now();

    window.run(move |_backend| {
        let time = started.elapsed().as_secs_f32();
        for (n, id) in instances.iter().enumerate() {
            let phase = time + n as f32 * std::f32::consts::TAU / 3.0;
            if let Some(transform) = model.transform_mut(*id) {
                let offset = Vec3::new(phase.cos() * 0.3, phase.sin() * 0.3, 0.0);
                *transform = Mat4::from_translation(offset) * Mat4::from_rotation_z(time * 0.5);
            }
        }
        model.render_instances()
    })?;
    Ok(())
}
