use std::path::PathBuf;

use anyhow::{bail, Context};

use crate::scene::loader::{ImportOptions, Shading};

pub const USAGE: &str = "\
Usage: trackball-viewer [OPTIONS] [MODEL]...

MODEL is an OBJ file; its materials and textures are read next to it.

Options:
  --width <PX>             initial window width (default 640)
  --height <PX>            initial window height (default 480)
  --shading <MODE>         flat, phong or textured (default phong)
  --texture <IMAGE>        add a textured plane, F6/F7 cycle wrap and filter modes
  --pyramid                add the colored pyramid
  --robot-arm              add the robot arm hierarchy
  --axis                   add an axis gizmo at the origin
  --animate-light          sweep the light direction every frame
  --flip-uv                flip V texture coordinates of imported models
  -h, --help               print this help
";

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub width: u32,
    pub height: u32,
    pub models: Vec<PathBuf>,
    pub import: ImportOptions,
    pub texture: Option<PathBuf>,
    pub pyramid: bool,
    pub robot_arm: bool,
    pub axis: bool,
    pub animate_light: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfig {
            width: 640,
            height: 480,
            models: Vec::new(),
            import: ImportOptions::default(),
            texture: None,
            pyramid: false,
            robot_arm: false,
            axis: false,
            animate_light: false,
        }
    }
}

/// What the command line asked for.
#[derive(Debug, PartialEq)]
pub enum Command {
    Run(ViewerConfig),
    Help,
}

impl ViewerConfig {
    /// Parses the arguments following the program name.
    pub fn from_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Command> {
        let mut config = ViewerConfig::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .with_context(|| format!("{flag} needs a value"))
            };
            match arg.as_str() {
                "-h" | "--help" => return Ok(Command::Help),
                "--width" => config.width = parse_size("--width", &value("--width")?)?,
                "--height" => config.height = parse_size("--height", &value("--height")?)?,
                "--shading" => config.import.shading = parse_shading(&value("--shading")?)?,
                "--texture" => config.texture = Some(PathBuf::from(value("--texture")?)),
                "--pyramid" => config.pyramid = true,
                "--robot-arm" => config.robot_arm = true,
                "--axis" => config.axis = true,
                "--animate-light" => config.animate_light = true,
                "--flip-uv" => config.import.flip_uv = true,
                flag if flag.starts_with('-') && flag.len() > 1 => {
                    bail!("unknown option {flag}\n\n{USAGE}")
                }
                _ => config.models.push(PathBuf::from(&arg)),
            }
        }
        Ok(Command::Run(config))
    }

    /// True when nothing at all was asked to be shown.
    pub fn is_empty_scene(&self) -> bool {
        self.models.is_empty()
            && self.texture.is_none()
            && !self.pyramid
            && !self.robot_arm
            && !self.axis
    }
}

fn parse_size(flag: &str, value: &str) -> anyhow::Result<u32> {
    let size: u32 = value
        .parse()
        .with_context(|| format!("{flag} expects a pixel count, got \"{value}\""))?;
    if size == 0 {
        bail!("{flag} must be positive");
    }
    Ok(size)
}

fn parse_shading(value: &str) -> anyhow::Result<Shading> {
    match value.to_ascii_lowercase().as_str() {
        "flat" => Ok(Shading::Flat),
        "phong" => Ok(Shading::Phong),
        "textured" => Ok(Shading::Textured),
        _ => bail!("--shading expects flat, phong or textured, got \"{value}\""),
    }
}
