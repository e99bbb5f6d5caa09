//! Built-in geometry and the small scenes assembled from it.

use std::f32::consts::TAU;
use std::rc::Rc;

use glam::{Mat4, Vec3};

use crate::renderer::shader::ShaderProgram;
use crate::renderer::vertex_array::{
    GeometryError, Primitive, VertexAttribute, ATTR_LOC_COLOR_OR_NORMAL, ATTR_LOC_POSITION,
};
use crate::scene::mesh::Mesh;
use crate::scene::{Drawable, Node};

/// Vertex positions, per-vertex colors (or normals) and triangle indices.
pub struct Geometry {
    pub positions: Vec<Vec3>,
    pub colors: Vec<Vec3>,
    pub index: Option<Vec<u32>>,
}

impl Geometry {
    fn attributes(&self) -> [VertexAttribute<'_>; 2] {
        [
            VertexAttribute::vec3(ATTR_LOC_POSITION, &self.positions),
            VertexAttribute::vec3(ATTR_LOC_COLOR_OR_NORMAL, &self.colors),
        ]
    }

    pub fn into_mesh(self, program: Rc<ShaderProgram>) -> Result<Mesh, GeometryError> {
        Mesh::new(program, &self.attributes(), self.index.as_deref())
    }
}

/// Square-based pyramid standing on y = 0 with its apex at (0, 1, 0).
pub fn pyramid() -> Geometry {
    Geometry {
        positions: vec![
            Vec3::new(-0.5, 0.0, -0.5),
            Vec3::new(-0.5, 0.0, 0.5),
            Vec3::new(0.5, 0.0, 0.5),
            Vec3::new(0.5, 0.0, -0.5),
            Vec3::new(0.0, 1.0, 0.0),
        ],
        colors: vec![
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 0.0),
        ],
        index: Some(vec![
            4, 1, 2, 4, 2, 3, 4, 3, 0, 4, 0, 1, 1, 3, 2, 1, 0, 3,
        ]),
    }
}

/// Unit-length x, y and z axes colored red, green and blue, drawn as lines.
pub fn axis() -> Geometry {
    Geometry {
        positions: vec![
            Vec3::ZERO,
            Vec3::X,
            Vec3::ZERO,
            Vec3::Y,
            Vec3::ZERO,
            Vec3::Z,
        ],
        colors: vec![Vec3::X, Vec3::X, Vec3::Y, Vec3::Y, Vec3::Z, Vec3::Z],
        index: None,
    }
}

/// Closed cylinder of radius 1 between y = -1 and y = 1, with smooth side
/// normals in `colors`. Caps have their own vertices so their normals stay
/// flat.
pub fn cylinder(sides: u32) -> Geometry {
    let sides = sides.max(3);
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut index = Vec::new();

    for i in 0..sides {
        let angle = TAU * i as f32 / sides as f32;
        let radial = Vec3::new(angle.cos(), 0.0, -angle.sin());
        positions.push(radial + Vec3::Y);
        positions.push(radial - Vec3::Y);
        normals.push(radial);
        normals.push(radial);
    }
    for i in 0..sides {
        let top = 2 * i;
        let bottom = top + 1;
        let next_top = 2 * ((i + 1) % sides);
        let next_bottom = next_top + 1;
        index.extend_from_slice(&[top, bottom, next_bottom, top, next_bottom, next_top]);
    }

    for (y, normal) in [(1.0, Vec3::Y), (-1.0, -Vec3::Y)] {
        let center = positions.len() as u32;
        positions.push(Vec3::new(0.0, y, 0.0));
        normals.push(normal);
        let ring = positions.len() as u32;
        for i in 0..sides {
            let angle = TAU * i as f32 / sides as f32;
            positions.push(Vec3::new(angle.cos(), y, -angle.sin()));
            normals.push(normal);
        }
        for i in 0..sides {
            let (a, b) = (ring + i, ring + (i + 1) % sides);
            if y > 0.0 {
                index.extend_from_slice(&[center, a, b]);
            } else {
                index.extend_from_slice(&[center, b, a]);
            }
        }
    }

    Geometry {
        positions,
        colors: normals,
        index: Some(index),
    }
}

pub fn axis_mesh(program: Rc<ShaderProgram>) -> Result<Mesh, GeometryError> {
    Ok(axis().into_mesh(program)?.with_primitive(Primitive::Lines))
}

/// Joint angles of the robot arm, in degrees.
#[derive(Debug, Clone, Copy)]
pub struct ArmPose {
    pub base: f32,
    pub arm: f32,
    pub forearm: f32,
}

impl Default for ArmPose {
    fn default() -> Self {
        ArmPose {
            base: 45.0,
            arm: 25.0,
            forearm: 120.0,
        }
    }
}

/// Builds the three-segment arm. The same `cylinder` drawable is placed under
/// all three shape nodes, each scaling it differently.
pub fn robot_arm(cylinder: Rc<dyn Drawable>, pose: ArmPose) -> Node {
    let base_shape = Node::new(Mat4::from_scale(Vec3::new(0.5, 0.1, 0.5)))
        .with_drawable(cylinder.clone());
    let arm_shape = Node::new(
        Mat4::from_translation(Vec3::new(0.0, 0.8, 0.0))
            * Mat4::from_scale(Vec3::new(0.1, 0.8, 0.1)),
    )
    .with_drawable(cylinder.clone());
    let forearm_shape = Node::new(
        Mat4::from_translation(Vec3::new(0.0, 0.5, 0.4))
            * Mat4::from_scale(Vec3::new(0.05, 0.4, 0.05)),
    )
    .with_drawable(cylinder);

    let forearm = Node::new(
        Mat4::from_translation(Vec3::new(0.0, 2.0, 0.15))
            * Mat4::from_rotation_x(pose.forearm.to_radians()),
    )
    .with_node(Rc::new(forearm_shape));
    let arm = Node::new(Mat4::from_rotation_x(pose.arm.to_radians()))
        .with_node(Rc::new(arm_shape))
        .with_node(Rc::new(forearm));
    Node::new(Mat4::from_rotation_y(pose.base.to_radians()))
        .with_node(Rc::new(base_shape))
        .with_node(Rc::new(arm))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::vertex_array::{self, DrawCommand};
    use crate::scene::tests::Recorder;

    fn validate(geometry: &Geometry) -> Result<DrawCommand, GeometryError> {
        vertex_array::validate(&geometry.attributes(), geometry.index.as_deref())
    }

    /// Every triangle faces away from the shape's center, so back-face culling
    /// keeps the outside.
    fn assert_outward_winding(geometry: &Geometry, center: Vec3) {
        let index = geometry.index.as_ref().unwrap();
        for tri in index.chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|i| geometry.positions[tri[i] as usize]);
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid - center) > 0.0, "inward triangle {tri:?}");
        }
    }

    #[test]
    fn pyramid_is_indexed_and_closed() {
        let pyramid = pyramid();
        assert_eq!(
            validate(&pyramid),
            Ok(DrawCommand::Elements { index_count: 18 })
        );
        assert_outward_winding(&pyramid, Vec3::new(0.0, 0.25, 0.0));
    }

    #[test]
    fn axis_is_unindexed() {
        assert_eq!(
            validate(&axis()),
            Ok(DrawCommand::Arrays { vertex_count: 6 })
        );
    }

    #[test]
    fn cylinder_is_closed_and_outward_facing() {
        let cylinder = cylinder(16);
        assert_eq!(cylinder.positions.len(), 16 * 2 + 2 * (16 + 1));
        assert_eq!(
            validate(&cylinder),
            Ok(DrawCommand::Elements {
                index_count: 16 * 6 + 2 * 16 * 3
            })
        );
        assert_outward_winding(&cylinder, Vec3::ZERO);
        assert!(cylinder
            .colors
            .iter()
            .all(|n| (n.length() - 1.0).abs() < 1e-5));
    }

    #[test]
    fn robot_arm_shares_one_cylinder() {
        let cylinder = Rc::new(Recorder::default());
        let arm = robot_arm(cylinder.clone(), ArmPose::default());
        arm.draw(&Mat4::IDENTITY, &Mat4::IDENTITY, &Mat4::IDENTITY);

        let models = cylinder.models.borrow();
        assert_eq!(models.len(), 3);
        let base = Mat4::from_rotation_y(45f32.to_radians());
        let expected_base = base * Mat4::from_scale(Vec3::new(0.5, 0.1, 0.5));
        assert!(models[0].abs_diff_eq(expected_base, 1e-5));
        // The forearm shape sits at the end of the whole chain.
        let expected_forearm = base
            * Mat4::from_rotation_x(25f32.to_radians())
            * Mat4::from_translation(Vec3::new(0.0, 2.0, 0.15))
            * Mat4::from_rotation_x(120f32.to_radians())
            * Mat4::from_translation(Vec3::new(0.0, 0.5, 0.4))
            * Mat4::from_scale(Vec3::new(0.05, 0.4, 0.05));
        assert!(models[2].abs_diff_eq(expected_forearm, 1e-5));
    }
}
