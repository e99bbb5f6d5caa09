use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use glam::{Mat4, Vec2, Vec3};
use sdl2::keyboard::Keycode;

use crate::renderer::shader::{ShaderProgram, UniformLocation};
use crate::renderer::texture::{Filter, Sampling, Texture, TextureError, WrapMode};
use crate::renderer::vertex_array::{
    BufferUsage, GeometryError, Primitive, VertexArray, VertexAttribute, ATTR_LOC_POSITION,
    ATTR_LOC_TEXCOORD,
};
use crate::scene::{Drawable, KeyHandler};

/// Texture unit the diffuse map is bound to.
const DIFFUSE_MAP_UNIT: u32 = 0;

struct MatrixUniforms {
    model: Option<UniformLocation>,
    view: Option<UniformLocation>,
    projection: Option<UniformLocation>,
}

/// Geometry drawn with a shared program. Colors (or whatever else the program
/// reads) come from the vertex attributes.
pub struct Mesh {
    program: Rc<ShaderProgram>,
    array: VertexArray,
    primitive: Primitive,
    uniforms: MatrixUniforms,
}

impl Mesh {
    pub fn new(
        program: Rc<ShaderProgram>,
        attributes: &[VertexAttribute],
        index: Option<&[u32]>,
    ) -> Result<Mesh, GeometryError> {
        let array = VertexArray::new(attributes, index, BufferUsage::Static)?;
        let uniforms = MatrixUniforms {
            model: program.uniform("model"),
            view: program.uniform("view"),
            projection: program.uniform("projection"),
        };
        Ok(Mesh {
            program,
            array,
            primitive: Primitive::Triangles,
            uniforms,
        })
    }

    pub fn with_primitive(mut self, primitive: Primitive) -> Mesh {
        self.primitive = primitive;
        self
    }

    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }

    /// Activates the program and uploads the matrices, lets `setup` add the
    /// state a variant needs, then draws.
    fn draw_with(&self, projection: &Mat4, view: &Mat4, model: &Mat4, setup: impl FnOnce()) {
        self.program.activate();
        if let Some(location) = self.uniforms.view {
            location.set_mat4(view);
        }
        if let Some(location) = self.uniforms.projection {
            location.set_mat4(projection);
        }
        if let Some(location) = self.uniforms.model {
            location.set_mat4(model);
        }
        setup();
        self.array.draw(self.primitive);
    }
}

impl Drawable for Mesh {
    fn draw(&self, projection: &Mat4, view: &Mat4, model: &Mat4) {
        self.draw_with(projection, view, model, || {});
    }
}

/// Phong reflection coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhongMaterial {
    pub k_a: Vec3,
    pub k_d: Vec3,
    pub k_s: Vec3,
    pub s: f32,
}

impl Default for PhongMaterial {
    fn default() -> Self {
        PhongMaterial {
            k_a: Vec3::ZERO,
            k_d: Vec3::new(1.0, 1.0, 0.0),
            k_s: Vec3::ONE,
            s: 16.0,
        }
    }
}

/// Direction of the directional light, in world coordinates. One light is
/// shared by every lit mesh, so all of them see the same direction within a
/// frame.
#[derive(Debug)]
pub enum Light {
    Fixed(Vec3),
    /// Sweeps `(x, 0, -1)` with x going from -10 to 10 over `steps` frames,
    /// then starts over.
    Sweeping { steps: usize, frame: Cell<usize> },
}

impl Light {
    pub fn sweeping() -> Light {
        Light::Sweeping {
            steps: 500,
            frame: Cell::new(0),
        }
    }

    pub fn direction(&self) -> Vec3 {
        match self {
            Light::Fixed(direction) => *direction,
            Light::Sweeping { steps, frame } => {
                let t = if *steps > 1 {
                    frame.get() as f32 / (steps - 1) as f32
                } else {
                    0.0
                };
                Vec3::new(-10.0 + 20.0 * t, 0.0, -1.0)
            }
        }
    }

    /// Moves a sweeping light one step. Called once per frame.
    pub fn advance(&self) {
        if let Light::Sweeping { steps, frame } = self {
            frame.set((frame.get() + 1) % (*steps).max(1));
        }
    }
}

/// The camera position in world space: the translation column of the inverse
/// view matrix.
pub fn camera_position(view: &Mat4) -> Vec3 {
    view.inverse().w_axis.truncate()
}

struct PhongUniforms {
    light_dir: Option<UniformLocation>,
    k_a: Option<UniformLocation>,
    k_d: Option<UniformLocation>,
    k_s: Option<UniformLocation>,
    s: Option<UniformLocation>,
    w_camera_position: Option<UniformLocation>,
}

/// A mesh lit by one directional light. Expects normals at slot 1.
pub struct PhongMesh {
    mesh: Mesh,
    material: PhongMaterial,
    light: Rc<Light>,
    uniforms: PhongUniforms,
}

impl PhongMesh {
    pub fn new(mesh: Mesh, material: PhongMaterial, light: Rc<Light>) -> PhongMesh {
        let program = mesh.program();
        let uniforms = PhongUniforms {
            light_dir: program.uniform("light_dir"),
            k_a: program.uniform("k_a"),
            k_d: program.uniform("k_d"),
            k_s: program.uniform("k_s"),
            s: program.uniform("s"),
            w_camera_position: program.uniform("w_camera_position"),
        };
        PhongMesh {
            mesh,
            material,
            light,
            uniforms,
        }
    }
}

impl Drawable for PhongMesh {
    fn draw(&self, projection: &Mat4, view: &Mat4, model: &Mat4) {
        let light_dir = self.light.direction();
        self.mesh.draw_with(projection, view, model, || {
            let set_vec3 = |location: Option<UniformLocation>, value| {
                if let Some(location) = location {
                    location.set_vec3(value);
                }
            };
            let u = &self.uniforms;
            set_vec3(u.light_dir, light_dir);
            set_vec3(u.k_a, self.material.k_a);
            set_vec3(u.k_d, self.material.k_d);
            set_vec3(u.k_s, self.material.k_s);
            // Depends on the view, so it is recomputed every draw.
            set_vec3(u.w_camera_position, camera_position(view));
            if let Some(location) = u.s {
                location.set_f32(self.material.s.max(0.001));
            }
        });
    }
}

/// A mesh sampling one texture. Expects texture coordinates at slot 2.
pub struct TexturedMesh {
    mesh: Mesh,
    texture: Rc<Texture>,
    diffuse_map: Option<UniformLocation>,
}

impl TexturedMesh {
    pub fn new(mesh: Mesh, texture: Rc<Texture>) -> TexturedMesh {
        let diffuse_map = mesh.program().uniform("diffuse_map");
        TexturedMesh {
            mesh,
            texture,
            diffuse_map,
        }
    }
}

impl Drawable for TexturedMesh {
    fn draw(&self, projection: &Mat4, view: &Mat4, model: &Mat4) {
        draw_textured(&self.mesh, &self.texture, self.diffuse_map, projection, view, model);
    }
}

fn draw_textured(
    mesh: &Mesh,
    texture: &Texture,
    diffuse_map: Option<UniformLocation>,
    projection: &Mat4,
    view: &Mat4,
    model: &Mat4,
) {
    mesh.draw_with(projection, view, model, || {
        texture.bind(DIFFUSE_MAP_UNIT);
        if let Some(location) = diffuse_map {
            location.set_i32(DIFFUSE_MAP_UNIT as i32);
        }
    });
    Texture::unbind(DIFFUSE_MAP_UNIT);
}

/// Position in the fixed lists of wrap modes and (mag, min) filter pairs that
/// F6 and F7 step through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SamplingCycle {
    wrap: usize,
    filter: usize,
}

impl SamplingCycle {
    const WRAPS: [WrapMode; 4] = [
        WrapMode::Repeat,
        WrapMode::MirroredRepeat,
        WrapMode::ClampToBorder,
        WrapMode::ClampToEdge,
    ];
    const FILTERS: [(Filter, Filter); 3] = [
        (Filter::Nearest, Filter::Nearest),
        (Filter::Linear, Filter::Linear),
        (Filter::Linear, Filter::LinearMipmapLinear),
    ];

    pub fn sampling(&self) -> Sampling {
        let (mag_filter, min_filter) = SamplingCycle::FILTERS[self.filter];
        Sampling {
            wrap: SamplingCycle::WRAPS[self.wrap],
            mag_filter,
            min_filter,
        }
    }

    pub fn next_wrap(self) -> SamplingCycle {
        SamplingCycle {
            wrap: (self.wrap + 1) % SamplingCycle::WRAPS.len(),
            ..self
        }
    }

    pub fn next_filter(self) -> SamplingCycle {
        SamplingCycle {
            filter: (self.filter + 1) % SamplingCycle::FILTERS.len(),
            ..self
        }
    }

    /// The cycle position a key moves to, or None for keys it ignores.
    pub fn after_key(self, key: Keycode) -> Option<SamplingCycle> {
        match key {
            Keycode::F6 => Some(self.next_wrap()),
            Keycode::F7 => Some(self.next_filter()),
            _ => None,
        }
    }
}

/// Corners and texture coordinates of the 200x200 plane at z = 0. The texture
/// repeats ten times across it, so the wrap modes are visible.
pub fn plane_geometry() -> ([Vec3; 4], [Vec2; 4], [u32; 6]) {
    let positions = [
        Vec3::new(-100.0, -100.0, 0.0),
        Vec3::new(100.0, -100.0, 0.0),
        Vec3::new(100.0, 100.0, 0.0),
        Vec3::new(-100.0, 100.0, 0.0),
    ];
    let tex_coords = [
        Vec2::new(-5.0, -5.0),
        Vec2::new(5.0, -5.0),
        Vec2::new(5.0, 5.0),
        Vec2::new(-5.0, 5.0),
    ];
    (positions, tex_coords, [0, 1, 2, 0, 2, 3])
}

/// A textured plane whose wrap mode and filters can be toggled with F6/F7.
pub struct TexturedPlane {
    mesh: Mesh,
    source: PathBuf,
    cycle: Cell<SamplingCycle>,
    texture: RefCell<Rc<Texture>>,
    diffuse_map: Option<UniformLocation>,
}

impl TexturedPlane {
    pub fn new(program: Rc<ShaderProgram>, source: &Path) -> anyhow::Result<TexturedPlane> {
        let (positions, tex_coords, index) = plane_geometry();
        let mesh = Mesh::new(
            program,
            &[
                VertexAttribute::vec3(ATTR_LOC_POSITION, &positions),
                VertexAttribute::vec2(ATTR_LOC_TEXCOORD, &tex_coords),
            ],
            Some(&index),
        )?;
        let cycle = SamplingCycle::default();
        let texture = Texture::load(source, cycle.sampling())?;
        let diffuse_map = mesh.program().uniform("diffuse_map");
        Ok(TexturedPlane {
            mesh,
            source: source.to_path_buf(),
            cycle: Cell::new(cycle),
            texture: RefCell::new(Rc::new(texture)),
            diffuse_map,
        })
    }

    /// Builds the replacement texture first and only swaps it in once it
    /// exists, so a failed reload leaves the current texture in place.
    fn reload(&self, cycle: SamplingCycle) -> Result<(), TextureError> {
        let texture = Texture::load(&self.source, cycle.sampling())?;
        self.texture.replace(Rc::new(texture));
        self.cycle.set(cycle);
        Ok(())
    }
}

impl Drawable for TexturedPlane {
    fn draw(&self, projection: &Mat4, view: &Mat4, model: &Mat4) {
        let texture = self.texture.borrow();
        draw_textured(&self.mesh, &texture, self.diffuse_map, projection, view, model);
    }

    fn key_handler(&self) -> Option<&dyn KeyHandler> {
        Some(self)
    }
}

impl KeyHandler for TexturedPlane {
    fn handle_key(&self, key: Keycode) {
        let Some(cycle) = self.cycle.get().after_key(key) else {
            return;
        };
        if let Err(err) = self.reload(cycle) {
            log::error!("{err}, keeping the previous texture");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::vertex_array::{self, DrawCommand};

    #[test]
    fn camera_position_is_inverse_view_translation() {
        let eye = Vec3::new(1.0, 2.0, 5.0);
        let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
        assert!(camera_position(&view).abs_diff_eq(eye, 1e-4));
        assert_eq!(camera_position(&Mat4::IDENTITY), Vec3::ZERO);
    }

    #[test]
    fn fixed_light_never_moves() {
        let light = Light::Fixed(Vec3::new(1.0, -1.0, 1.0));
        for _ in 0..3 {
            light.advance();
            assert_eq!(light.direction(), Vec3::new(1.0, -1.0, 1.0));
        }
    }

    #[test]
    fn sweeping_light_covers_range_and_wraps() {
        let light = Light::sweeping();
        assert_eq!(light.direction(), Vec3::new(-10.0, 0.0, -1.0));
        for _ in 1..500 {
            light.advance();
        }
        assert!(light
            .direction()
            .abs_diff_eq(Vec3::new(10.0, 0.0, -1.0), 1e-4));
        light.advance();
        assert_eq!(light.direction(), Vec3::new(-10.0, 0.0, -1.0));
    }

    #[test]
    fn shared_light_holds_still_within_a_frame() {
        let light = Rc::new(Light::sweeping());
        light.advance();
        // Three segments sharing one lit mesh read the light three times.
        let seen: Vec<Vec3> = (0..3).map(|_| light.direction()).collect();
        assert_eq!(seen, [seen[0]; 3]);
        light.advance();
        assert!(light.direction().x > seen[0].x);
    }

    #[test]
    fn sampling_cycle_starts_at_repeat_nearest() {
        let sampling = SamplingCycle::default().sampling();
        assert_eq!(sampling.wrap, WrapMode::Repeat);
        assert_eq!(sampling.mag_filter, Filter::Nearest);
        assert_eq!(sampling.min_filter, Filter::Nearest);
    }

    #[test]
    fn wrap_modes_cycle_modulo_length() {
        let mut cycle = SamplingCycle::default();
        let mut wraps = Vec::new();
        for _ in 0..5 {
            cycle = cycle.after_key(Keycode::F6).unwrap();
            wraps.push(cycle.sampling().wrap);
        }
        assert_eq!(
            wraps,
            [
                WrapMode::MirroredRepeat,
                WrapMode::ClampToBorder,
                WrapMode::ClampToEdge,
                WrapMode::Repeat,
                WrapMode::MirroredRepeat,
            ]
        );
        // Filters are untouched by wrap changes.
        assert_eq!(cycle.sampling().min_filter, Filter::Nearest);
    }

    #[test]
    fn filters_cycle_and_end_on_mipmaps() {
        let cycle = SamplingCycle::default()
            .after_key(Keycode::F7)
            .and_then(|c| c.after_key(Keycode::F7))
            .unwrap();
        let sampling = cycle.sampling();
        assert_eq!(sampling.mag_filter, Filter::Linear);
        assert_eq!(sampling.min_filter, Filter::LinearMipmapLinear);
        assert_eq!(
            cycle.next_filter().sampling().min_filter,
            Filter::Nearest
        );
    }

    #[test]
    fn every_filter_is_reachable_with_f7() {
        let mut cycle = SamplingCycle::default();
        let mut filters = Vec::new();
        for _ in 0..SamplingCycle::FILTERS.len() {
            let sampling = cycle.sampling();
            filters.extend([sampling.mag_filter, sampling.min_filter]);
            cycle = cycle.next_filter();
        }
        for filter in [Filter::Nearest, Filter::Linear, Filter::LinearMipmapLinear] {
            assert!(filters.contains(&filter), "{filter:?} never selected");
        }
    }

    #[test]
    fn other_keys_leave_sampling_alone() {
        assert_eq!(SamplingCycle::default().after_key(Keycode::A), None);
    }

    #[test]
    fn plane_geometry_is_a_valid_indexed_quad() {
        let (positions, tex_coords, index) = plane_geometry();
        let command = vertex_array::validate(
            &[
                VertexAttribute::vec3(ATTR_LOC_POSITION, &positions),
                VertexAttribute::vec2(ATTR_LOC_TEXCOORD, &tex_coords),
            ],
            Some(&index),
        );
        assert_eq!(command, Ok(DrawCommand::Elements { index_count: 6 }));
        // Counter-clockwise seen from +z, so it survives back-face culling.
        let normal = (positions[1] - positions[0]).cross(positions[2] - positions[0]);
        assert!(normal.z > 0.0);
    }
}
