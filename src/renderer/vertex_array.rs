use std::ffi::c_void;
use std::ptr;

use glam::{Vec2, Vec3};
use thiserror::Error;

use crate::renderer::gl;

/// Attribute slot of vertex positions in every program of this crate.
pub const ATTR_LOC_POSITION: gl::types::GLuint = 0;
/// Attribute slot of per-vertex colors, or normals for lit programs.
pub const ATTR_LOC_COLOR_OR_NORMAL: gl::types::GLuint = 1;
/// Attribute slot of texture coordinates.
pub const ATTR_LOC_TEXCOORD: gl::types::GLuint = 2;

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("vertex array has no attributes")]
    NoAttributes,
    #[error("attribute {location} has {len} floats, not a multiple of its {components} components")]
    RaggedAttribute {
        location: gl::types::GLuint,
        len: usize,
        components: usize,
    },
    #[error("attribute {location} has {found} vertices, expected {expected}")]
    MismatchedVertexCount {
        location: gl::types::GLuint,
        expected: usize,
        found: usize,
    },
    #[error("attribute slot {0} is bound twice")]
    DuplicateLocation(gl::types::GLuint),
    #[error("index {index} at position {position} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        index: u32,
        position: usize,
        vertex_count: usize,
    },
    #[error("index list is empty")]
    EmptyIndices,
}

/// One per-vertex float array bound to a fixed attribute slot.
#[derive(Debug, Clone, Copy)]
pub struct VertexAttribute<'a> {
    pub location: gl::types::GLuint,
    pub components: usize,
    pub values: &'a [f32],
}

impl<'a> VertexAttribute<'a> {
    pub fn vec3(location: gl::types::GLuint, values: &'a [Vec3]) -> VertexAttribute<'a> {
        VertexAttribute {
            location,
            components: 3,
            values: bytemuck::cast_slice(values),
        }
    }

    pub fn vec2(location: gl::types::GLuint, values: &'a [Vec2]) -> VertexAttribute<'a> {
        VertexAttribute {
            location,
            components: 2,
            values: bytemuck::cast_slice(values),
        }
    }

    fn vertex_count(&self) -> usize {
        self.values.len() / self.components
    }
}

/// Upload hint for the buffers of a vertex array. Scene geometry is written
/// once and drawn every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    Static,
}

impl BufferUsage {
    fn gl_enum(self) -> gl::types::GLenum {
        match self {
            BufferUsage::Static => gl::STATIC_DRAW,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Lines,
    Triangles,
}

impl Primitive {
    fn gl_enum(self) -> gl::types::GLenum {
        match self {
            Primitive::Lines => gl::LINES,
            Primitive::Triangles => gl::TRIANGLES,
        }
    }
}

/// What a validated vertex array will ask GL to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCommand {
    Arrays { vertex_count: usize },
    Elements { index_count: usize },
}

/// Checks that all attributes agree on a vertex count and that every index
/// stays below it, before anything is uploaded.
pub fn validate(
    attributes: &[VertexAttribute],
    index: Option<&[u32]>,
) -> Result<DrawCommand, GeometryError> {
    let first = attributes.first().ok_or(GeometryError::NoAttributes)?;
    let mut seen_locations = Vec::with_capacity(attributes.len());
    for attribute in attributes {
        if attribute.components == 0 || attribute.values.len() % attribute.components != 0 {
            return Err(GeometryError::RaggedAttribute {
                location: attribute.location,
                len: attribute.values.len(),
                components: attribute.components,
            });
        }
        if seen_locations.contains(&attribute.location) {
            return Err(GeometryError::DuplicateLocation(attribute.location));
        }
        seen_locations.push(attribute.location);
    }

    let vertex_count = first.vertex_count();
    for attribute in &attributes[1..] {
        if attribute.vertex_count() != vertex_count {
            return Err(GeometryError::MismatchedVertexCount {
                location: attribute.location,
                expected: vertex_count,
                found: attribute.vertex_count(),
            });
        }
    }

    match index {
        None => Ok(DrawCommand::Arrays { vertex_count }),
        Some([]) => Err(GeometryError::EmptyIndices),
        Some(index) => {
            let out_of_range = index
                .iter()
                .enumerate()
                .find(|&(_, &i)| i as usize >= vertex_count);
            if let Some((position, &index)) = out_of_range {
                return Err(GeometryError::IndexOutOfRange {
                    index,
                    position,
                    vertex_count,
                });
            }
            Ok(DrawCommand::Elements {
                index_count: index.len(),
            })
        }
    }
}

/// A vertex array object and the attribute/index buffers it created.
pub struct VertexArray {
    vao: gl::types::GLuint,
    buffers: Vec<gl::types::GLuint>,
    command: DrawCommand,
}

impl VertexArray {
    pub fn new(
        attributes: &[VertexAttribute],
        index: Option<&[u32]>,
        usage: BufferUsage,
    ) -> Result<VertexArray, GeometryError> {
        let command = validate(attributes, index)?;

        let mut vao = 0;
        gl::call!(gl::GenVertexArrays(1, &mut vao));
        gl::call!(gl::BindVertexArray(vao));

        let buffer_count = attributes.len() + index.is_some() as usize;
        let mut buffers = vec![0; buffer_count];
        gl::call!(gl::GenBuffers(
            buffers.len() as gl::types::GLsizei,
            buffers.as_mut_ptr()
        ));

        for (attribute, &buffer) in attributes.iter().zip(&buffers) {
            gl::call!(gl::EnableVertexAttribArray(attribute.location));
            gl::call!(gl::BindBuffer(gl::ARRAY_BUFFER, buffer));
            gl::buffer_data(gl::ARRAY_BUFFER, attribute.values, usage.gl_enum());
            gl::call!(gl::VertexAttribPointer(
                attribute.location,
                attribute.components as gl::types::GLint,
                gl::FLOAT,
                gl::FALSE,
                0,
                ptr::null::<c_void>(),
            ));
        }

        if let (Some(index), Some(&buffer)) = (index, buffers.last()) {
            // The element buffer binding is VAO state, so it stays attached.
            gl::call!(gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, buffer));
            gl::buffer_data(gl::ELEMENT_ARRAY_BUFFER, index, usage.gl_enum());
        }

        gl::call!(gl::BindVertexArray(0));
        gl::call!(gl::BindBuffer(gl::ARRAY_BUFFER, 0));

        Ok(VertexArray {
            vao,
            buffers,
            command,
        })
    }

    /// Binds this vertex array and issues its draw call. The binding is
    /// cleared again afterwards.
    pub fn draw(&self, primitive: Primitive) {
        gl::call!(gl::BindVertexArray(self.vao));
        match self.command {
            DrawCommand::Arrays { vertex_count } => gl::call!(gl::DrawArrays(
                primitive.gl_enum(),
                0,
                vertex_count as gl::types::GLsizei,
            )),
            DrawCommand::Elements { index_count } => gl::call!(gl::DrawElements(
                primitive.gl_enum(),
                index_count as gl::types::GLsizei,
                gl::UNSIGNED_INT,
                ptr::null(),
            )),
        }
        gl::call!(gl::BindVertexArray(0));
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        gl::call!(gl::DeleteVertexArrays(1, &self.vao));
        gl::call!(gl::DeleteBuffers(
            self.buffers.len() as gl::types::GLsizei,
            self.buffers.as_ptr(),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POSITIONS: [Vec3; 3] = [
        Vec3::new(0.0, 0.5, 0.0),
        Vec3::new(0.5, -0.5, 0.0),
        Vec3::new(-0.5, -0.5, 0.0),
    ];

    #[test]
    fn unindexed_draw_uses_vertex_count() {
        let attributes = [
            VertexAttribute::vec3(ATTR_LOC_POSITION, &POSITIONS),
            VertexAttribute::vec3(ATTR_LOC_COLOR_OR_NORMAL, &POSITIONS),
        ];
        assert_eq!(
            validate(&attributes, None),
            Ok(DrawCommand::Arrays { vertex_count: 3 })
        );
    }

    #[test]
    fn index_list_overrides_draw_count() {
        let attributes = [VertexAttribute::vec3(ATTR_LOC_POSITION, &POSITIONS)];
        assert_eq!(
            validate(&attributes, Some(&[0, 1, 2, 2, 1, 0])),
            Ok(DrawCommand::Elements { index_count: 6 })
        );
    }

    #[test]
    fn mismatched_vertex_counts_are_rejected() {
        let uvs = [Vec2::ZERO, Vec2::ONE];
        let attributes = [
            VertexAttribute::vec3(ATTR_LOC_POSITION, &POSITIONS),
            VertexAttribute::vec2(ATTR_LOC_TEXCOORD, &uvs),
        ];
        assert_eq!(
            validate(&attributes, None),
            Err(GeometryError::MismatchedVertexCount {
                location: ATTR_LOC_TEXCOORD,
                expected: 3,
                found: 2,
            })
        );
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let attributes = [VertexAttribute::vec3(ATTR_LOC_POSITION, &POSITIONS)];
        assert_eq!(
            validate(&attributes, Some(&[0, 1, 3])),
            Err(GeometryError::IndexOutOfRange {
                index: 3,
                position: 2,
                vertex_count: 3,
            })
        );
    }

    #[test]
    fn ragged_float_arrays_are_rejected() {
        let values = [0.0; 7];
        let attributes = [VertexAttribute {
            location: ATTR_LOC_POSITION,
            components: 3,
            values: &values,
        }];
        assert!(matches!(
            validate(&attributes, None),
            Err(GeometryError::RaggedAttribute { len: 7, .. })
        ));
    }

    #[test]
    fn degenerate_inputs_are_rejected() {
        assert_eq!(validate(&[], None), Err(GeometryError::NoAttributes));
        let attributes = [
            VertexAttribute::vec3(ATTR_LOC_POSITION, &POSITIONS),
            VertexAttribute::vec3(ATTR_LOC_POSITION, &POSITIONS),
        ];
        assert_eq!(
            validate(&attributes, None),
            Err(GeometryError::DuplicateLocation(ATTR_LOC_POSITION))
        );
        let attributes = [VertexAttribute::vec3(ATTR_LOC_POSITION, &POSITIONS)];
        assert_eq!(
            validate(&attributes, Some(&[])),
            Err(GeometryError::EmptyIndices)
        );
    }
}
