use std::rc::Rc;

use crate::renderer::shader::{ShaderError, ShaderProgram};

const COLOR_VERTEX_SHADER: &str = r#"#version 330 core
layout(location = 0) in vec3 position;
layout(location = 1) in vec3 color;
uniform mat4 model;
uniform mat4 view;
uniform mat4 projection;
out vec3 fragment_color;
void main() {
    fragment_color = color;
    gl_Position = projection * view * model * vec4(position, 1.0);
}
"#;
const COLOR_FRAGMENT_SHADER: &str = r#"#version 330 core
in vec3 fragment_color;
out vec4 out_color;
void main() {
    out_color = vec4(fragment_color, 1.0);
}
"#;

const PHONG_VERTEX_SHADER: &str = r#"#version 330 core
layout(location = 0) in vec3 position;
layout(location = 1) in vec3 normal;
uniform mat4 model;
uniform mat4 view;
uniform mat4 projection;
out vec3 w_position;
out vec3 w_normal;
void main() {
    vec4 w_position4 = model * vec4(position, 1.0);
    w_position = w_position4.xyz / w_position4.w;
    w_normal = transpose(inverse(mat3(model))) * normal;
    gl_Position = projection * view * w_position4;
}
"#;
const PHONG_FRAGMENT_SHADER: &str = r#"#version 330 core
in vec3 w_position;
in vec3 w_normal;
uniform vec3 light_dir;
uniform vec3 k_a;
uniform vec3 k_d;
uniform vec3 k_s;
uniform float s;
uniform vec3 w_camera_position;
out vec4 out_color;
void main() {
    vec3 n = normalize(w_normal);
    vec3 l = normalize(-light_dir);
    vec3 r = reflect(-l, n);
    vec3 v = normalize(w_camera_position - w_position);
    vec3 color = k_a
        + k_d * max(dot(n, l), 0.0)
        + k_s * pow(max(dot(r, v), 0.0), s);
    out_color = vec4(color, 1.0);
}
"#;

const TEXTURE_VERTEX_SHADER: &str = r#"#version 330 core
layout(location = 0) in vec3 position;
layout(location = 2) in vec2 tex_coord;
uniform mat4 model;
uniform mat4 view;
uniform mat4 projection;
out vec2 fragment_tex_coord;
void main() {
    fragment_tex_coord = tex_coord;
    gl_Position = projection * view * model * vec4(position, 1.0);
}
"#;
const TEXTURE_FRAGMENT_SHADER: &str = r#"#version 330 core
in vec2 fragment_tex_coord;
uniform sampler2D diffuse_map;
out vec4 out_color;
void main() {
    out_color = texture(diffuse_map, fragment_tex_coord);
}
"#;

/// The three programs the built-in drawables are written against. Each is
/// shared by every drawable using it.
pub struct Programs {
    /// Per-vertex color at slot 1.
    pub color: Rc<ShaderProgram>,
    /// Normals at slot 1, lit with the Phong model.
    pub phong: Rc<ShaderProgram>,
    /// Texture coordinates at slot 2, sampled from `diffuse_map`.
    pub texture: Rc<ShaderProgram>,
}

impl Programs {
    pub fn new() -> Result<Programs, ShaderError> {
        Ok(Programs {
            color: Rc::new(ShaderProgram::new(COLOR_VERTEX_SHADER, COLOR_FRAGMENT_SHADER)?),
            phong: Rc::new(ShaderProgram::new(PHONG_VERTEX_SHADER, PHONG_FRAGMENT_SHADER)?),
            texture: Rc::new(ShaderProgram::new(
                TEXTURE_VERTEX_SHADER,
                TEXTURE_FRAGMENT_SHADER,
            )?),
        })
    }
}
