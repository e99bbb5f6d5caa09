use std::error::Error;
use std::fmt::Display;
use std::rc::Rc;

use anyhow::Context;
use glam::{Mat4, Vec3};
use sdl2::video::GLProfile;

mod config;
mod renderer;
mod scene;
mod trackball;
mod viewer;

use config::{Command, ViewerConfig, USAGE};
use renderer::programs::Programs;
use scene::loader;
use scene::mesh::{Light, PhongMaterial, PhongMesh, TexturedPlane};
use scene::primitives::{self, ArmPose};
use scene::{Drawable, Node};
use viewer::Viewer;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match ViewerConfig::from_args(std::env::args().skip(1))? {
        Command::Run(config) => config,
        Command::Help => {
            print!("{USAGE}");
            return Ok(());
        }
    };

    let sdl_context = sdl2::init().map_err(SdlErr)?;
    let video_subsystem = sdl_context.video().map_err(SdlErr)?;
    let gl_attr = video_subsystem.gl_attr();
    gl_attr.set_context_profile(GLProfile::Core);
    gl_attr.set_context_version(3, 3);
    gl_attr.set_context_flags().forward_compatible().set();
    gl_attr.set_depth_size(24);
    let window = video_subsystem
        .window(env!("CARGO_PKG_NAME"), config.width, config.height)
        .resizable()
        .opengl()
        .build()?;
    // Declared before everything holding GL objects, so it is dropped last.
    let _gl_context = window.gl_create_context().map_err(SdlErr)?;
    let event_pump = sdl_context.event_pump().map_err(SdlErr)?;

    let light = Rc::new(if config.animate_light {
        Light::sweeping()
    } else {
        Light::Fixed(Vec3::new(1.0, -1.0, 1.0))
    });
    let mut viewer = Viewer::new(&video_subsystem, window, event_pump, light.clone());
    let programs = Programs::new().context("building the shader programs")?;
    viewer.add(build_scene(&config, &programs, &light)?);
    viewer.run();
    Ok(())
}

/// Creates the root drawables asked for on the command line.
fn build_scene(
    config: &ViewerConfig,
    programs: &Programs,
    light: &Rc<Light>,
) -> anyhow::Result<Vec<Rc<dyn Drawable>>> {
    let mut drawables: Vec<Rc<dyn Drawable>> = Vec::new();

    for path in &config.models {
        let meshes = loader::load(path, &config.import, programs, light);
        if !meshes.is_empty() {
            drawables.push(Rc::new(Node::new(Mat4::IDENTITY).with_drawables(meshes)));
        }
    }

    if let Some(path) = &config.texture {
        match TexturedPlane::new(programs.texture.clone(), path) {
            Ok(plane) => drawables.push(Rc::new(plane)),
            Err(err) => log::error!("skipping the textured plane: {err:#}"),
        }
    }

    if config.robot_arm {
        let cylinder = primitives::cylinder(32).into_mesh(programs.phong.clone())?;
        let material = PhongMaterial {
            k_d: Vec3::new(0.6, 0.6, 0.7),
            ..PhongMaterial::default()
        };
        let cylinder: Rc<dyn Drawable> = Rc::new(PhongMesh::new(cylinder, material, light.clone()));
        drawables.push(Rc::new(primitives::robot_arm(cylinder, ArmPose::default())));
    }

    if config.axis {
        drawables.push(Rc::new(primitives::axis_mesh(programs.color.clone())?));
    }

    if config.pyramid || config.is_empty_scene() {
        if config.is_empty_scene() {
            log::info!("nothing to show, adding a pyramid\n\n{USAGE}");
        }
        drawables.push(Rc::new(
            primitives::pyramid().into_mesh(programs.color.clone())?,
        ));
    }

    Ok(drawables)
}

#[derive(Debug)]
pub struct SdlErr(String);
impl Display for SdlErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sdl error: {}", self.0)
    }
}
impl Error for SdlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}
