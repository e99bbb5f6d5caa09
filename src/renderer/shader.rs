use std::fmt::Write;
use std::path::Path;

use glam::{Mat4, Vec3};
use thiserror::Error;

use crate::renderer::gl;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn gl_enum(self) -> gl::types::GLenum {
        match self {
            ShaderStage::Vertex => gl::VERTEX_SHADER,
            ShaderStage::Fragment => gl::FRAGMENT_SHADER,
        }
    }
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("could not read {stage} shader source {path}")]
    Source {
        stage: ShaderStage,
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("compiling {stage} shader failed: {log}\n{numbered_source}")]
    Compile {
        stage: ShaderStage,
        log: String,
        numbered_source: String,
    },
    #[error("linking shader program failed: {0}")]
    Link(String),
}

/// Source text is taken as a file path when such a file exists, otherwise as
/// inline GLSL.
pub fn resolve_source(stage: ShaderStage, source: &str) -> Result<String, ShaderError> {
    let looks_like_path = !source.contains('\n') && Path::new(source).is_file();
    if !looks_like_path {
        return Ok(source.to_string());
    }
    std::fs::read_to_string(source).map_err(|err| ShaderError::Source {
        stage,
        path: source.to_string(),
        source: err,
    })
}

/// Prefixes every line with its 1-based line number, the way GLSL compilers
/// refer to them in info logs.
pub fn number_lines(source: &str) -> String {
    let mut numbered = String::with_capacity(source.len() + source.len() / 8);
    for (i, line) in source.lines().enumerate() {
        let _ = writeln!(numbered, "{:3}: {line}", i + 1);
    }
    numbered
}

fn compile(stage: ShaderStage, source: &str) -> Result<gl::types::GLuint, ShaderError> {
    let shader = gl::call!(gl::CreateShader(stage.gl_enum()));
    let sources = [source.as_ptr() as *const gl::types::GLchar];
    let source_lens = [source.len() as gl::types::GLint];
    gl::call!(gl::ShaderSource(
        shader,
        1,
        sources.as_ptr(),
        source_lens.as_ptr(),
    ));
    gl::call!(gl::CompileShader(shader));
    let mut compile_status = 0;
    gl::call!(gl::GetShaderiv(
        shader,
        gl::COMPILE_STATUS,
        &mut compile_status
    ));
    if compile_status == gl::FALSE as gl::types::GLint {
        let log = gl::info_log(shader, gl::GetShaderiv, gl::GetShaderInfoLog);
        gl::call!(gl::DeleteShader(shader));
        return Err(ShaderError::Compile {
            stage,
            log,
            numbered_source: number_lines(source),
        });
    }
    Ok(shader)
}

/// A linked GL program. Uniform locations looked up from it are only valid
/// while it is alive, which is why drawables hold it behind an `Rc` next to
/// their cached locations.
pub struct ShaderProgram {
    program: gl::types::GLuint,
}

impl ShaderProgram {
    /// Compiles and links the two stages. Each source is either GLSL text or
    /// a path to a file containing it.
    pub fn new(vertex_source: &str, fragment_source: &str) -> Result<ShaderProgram, ShaderError> {
        let vertex_source = resolve_source(ShaderStage::Vertex, vertex_source)?;
        let fragment_source = resolve_source(ShaderStage::Fragment, fragment_source)?;

        let vertex_shader = compile(ShaderStage::Vertex, &vertex_source)?;
        let fragment_shader = match compile(ShaderStage::Fragment, &fragment_source) {
            Ok(shader) => shader,
            Err(err) => {
                gl::call!(gl::DeleteShader(vertex_shader));
                return Err(err);
            }
        };

        let program = gl::call!(gl::CreateProgram());
        gl::call!(gl::AttachShader(program, vertex_shader));
        gl::call!(gl::AttachShader(program, fragment_shader));
        gl::call!(gl::LinkProgram(program));
        gl::call!(gl::DeleteShader(vertex_shader));
        gl::call!(gl::DeleteShader(fragment_shader));

        let mut link_status = 0;
        gl::call!(gl::GetProgramiv(program, gl::LINK_STATUS, &mut link_status));
        if link_status == gl::FALSE as gl::types::GLint {
            let log = gl::info_log(program, gl::GetProgramiv, gl::GetProgramInfoLog);
            gl::call!(gl::DeleteProgram(program));
            return Err(ShaderError::Link(log));
        }

        Ok(ShaderProgram { program })
    }

    pub fn uniform(&self, name: &str) -> Option<UniformLocation> {
        let location = gl::get_uniform_location(self.program, name);
        if location.is_none() {
            log::debug!("program {} has no active uniform \"{name}\"", self.program);
        }
        location.map(UniformLocation)
    }

    /// Makes this the active program. Every drawable calls this itself rather
    /// than trusting whatever the previous draw left bound.
    pub fn activate(&self) {
        gl::call!(gl::UseProgram(self.program));
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        gl::call!(gl::UseProgram(0));
        gl::call!(gl::DeleteProgram(self.program));
    }
}

/// A uniform location of a specific, currently active program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformLocation(gl::types::GLint);

impl UniformLocation {
    pub fn set_mat4(self, value: &Mat4) {
        let columns = value.to_cols_array();
        gl::call!(gl::UniformMatrix4fv(self.0, 1, gl::FALSE, columns.as_ptr()));
    }

    pub fn set_vec3(self, value: Vec3) {
        let value = value.to_array();
        gl::call!(gl::Uniform3fv(self.0, 1, value.as_ptr()));
    }

    pub fn set_f32(self, value: f32) {
        gl::call!(gl::Uniform1f(self.0, value));
    }

    pub fn set_i32(self, value: i32) {
        gl::call!(gl::Uniform1i(self.0, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_numbered_from_one() {
        let numbered = number_lines("#version 330 core\nvoid main() {}\n");
        assert_eq!(numbered, "  1: #version 330 core\n  2: void main() {}\n");
    }

    #[test]
    fn inline_sources_pass_through() {
        let source = "#version 330 core\nvoid main() {}";
        assert_eq!(resolve_source(ShaderStage::Vertex, source).unwrap(), source);
    }

    #[test]
    fn existing_paths_are_read() {
        let dir = std::env::temp_dir().join(format!("viewer-shader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("color.vert");
        std::fs::write(&path, "void main() {}").unwrap();
        let resolved = resolve_source(ShaderStage::Vertex, path.to_str().unwrap()).unwrap();
        assert_eq!(resolved, "void main() {}");
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
