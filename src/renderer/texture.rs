use std::ffi::c_void;
use std::path::Path;

use thiserror::Error;

use crate::renderer::gl;

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("unable to load texture file {path}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("texture of {width}x{height} needs {expected} bytes of RGBA, got {found}")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        found: usize,
    },
    #[error("texture has zero size")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    Repeat,
    MirroredRepeat,
    ClampToBorder,
    ClampToEdge,
}

impl WrapMode {
    fn gl_enum(self) -> gl::types::GLenum {
        match self {
            WrapMode::Repeat => gl::REPEAT,
            WrapMode::MirroredRepeat => gl::MIRRORED_REPEAT,
            WrapMode::ClampToBorder => gl::CLAMP_TO_BORDER,
            WrapMode::ClampToEdge => gl::CLAMP_TO_EDGE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Nearest,
    Linear,
    LinearMipmapLinear,
}

impl Filter {
    fn gl_enum(self) -> gl::types::GLenum {
        match self {
            Filter::Nearest => gl::NEAREST,
            Filter::Linear => gl::LINEAR,
            Filter::LinearMipmapLinear => gl::LINEAR_MIPMAP_LINEAR,
        }
    }

    pub fn uses_mipmaps(self) -> bool {
        self == Filter::LinearMipmapLinear
    }
}

/// Wrap and filter settings of a texture. Magnification only ever uses the
/// base level, so a mipmap filter in `mag_filter` is demoted when uploading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sampling {
    pub wrap: WrapMode,
    pub mag_filter: Filter,
    pub min_filter: Filter,
}

impl Default for Sampling {
    fn default() -> Self {
        Sampling {
            wrap: WrapMode::Repeat,
            mag_filter: Filter::Linear,
            min_filter: Filter::LinearMipmapLinear,
        }
    }
}

impl Sampling {
    fn gl_mag_filter(&self) -> gl::types::GLenum {
        match self.mag_filter {
            Filter::Nearest => gl::NEAREST,
            Filter::Linear | Filter::LinearMipmapLinear => gl::LINEAR,
        }
    }
}

/// A 2D RGBA texture living on the GPU. Changing the sampling means building
/// a new `Texture`, never mutating a bound one.
pub struct Texture {
    texture: gl::types::GLuint,
}

impl Texture {
    /// Uploads tightly packed RGBA8 `pixels`, rows first, and generates
    /// mipmaps if the minification filter samples them.
    pub fn new(
        pixels: &[u8],
        width: u32,
        height: u32,
        sampling: Sampling,
    ) -> Result<Texture, TextureError> {
        check_size(pixels, width, height)?;

        let mut texture = 0;
        gl::call!(gl::GenTextures(1, &mut texture));
        gl::call!(gl::BindTexture(gl::TEXTURE_2D, texture));
        gl::call!(gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1));
        gl::call!(gl::TexImage2D(
            gl::TEXTURE_2D,
            0,
            gl::RGBA as gl::types::GLint,
            width as gl::types::GLsizei,
            height as gl::types::GLsizei,
            0,
            gl::RGBA,
            gl::UNSIGNED_BYTE,
            pixels.as_ptr() as *const c_void,
        ));
        let wrap = sampling.wrap.gl_enum() as gl::types::GLint;
        gl::call!(gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, wrap));
        gl::call!(gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, wrap));
        gl::call!(gl::TexParameteri(
            gl::TEXTURE_2D,
            gl::TEXTURE_MAG_FILTER,
            sampling.gl_mag_filter() as gl::types::GLint,
        ));
        gl::call!(gl::TexParameteri(
            gl::TEXTURE_2D,
            gl::TEXTURE_MIN_FILTER,
            sampling.min_filter.gl_enum() as gl::types::GLint,
        ));
        if sampling.min_filter.uses_mipmaps() {
            gl::call!(gl::GenerateMipmap(gl::TEXTURE_2D));
        }
        gl::call!(gl::BindTexture(gl::TEXTURE_2D, 0));

        Ok(Texture { texture })
    }

    /// Decodes the image file at `path` to RGBA and uploads it.
    pub fn load(path: &Path, sampling: Sampling) -> Result<Texture, TextureError> {
        let image = image::open(path)
            .map_err(|source| TextureError::Decode {
                path: path.display().to_string(),
                source,
            })?
            .into_rgba8();
        let (width, height) = image.dimensions();
        let texture = Texture::new(image.as_raw(), width, height, sampling)?;
        log::info!(
            "Loaded texture {}\t({width}x{height}, {:?}, {:?}, {:?})",
            path.display(),
            sampling.wrap,
            sampling.mag_filter,
            sampling.min_filter,
        );
        Ok(texture)
    }

    /// Binds this texture to the given texture unit, making that unit active.
    pub fn bind(&self, unit: u32) {
        gl::call!(gl::ActiveTexture(gl::TEXTURE0 + unit));
        gl::call!(gl::BindTexture(gl::TEXTURE_2D, self.texture));
    }

    pub fn unbind(unit: u32) {
        gl::call!(gl::ActiveTexture(gl::TEXTURE0 + unit));
        gl::call!(gl::BindTexture(gl::TEXTURE_2D, 0));
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        gl::call!(gl::DeleteTextures(1, &self.texture));
    }
}

fn check_size(pixels: &[u8], width: u32, height: u32) -> Result<(), TextureError> {
    if width == 0 || height == 0 {
        return Err(TextureError::Empty);
    }
    let expected = width as usize * height as usize * 4;
    if pixels.len() != expected {
        return Err(TextureError::SizeMismatch {
            width,
            height,
            expected,
            found: pixels.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_buffer_must_match_dimensions() {
        assert!(check_size(&[0; 16], 2, 2).is_ok());
        assert!(matches!(
            check_size(&[0; 12], 2, 2),
            Err(TextureError::SizeMismatch {
                expected: 16,
                found: 12,
                ..
            })
        ));
        assert!(matches!(check_size(&[], 0, 4), Err(TextureError::Empty)));
    }

    #[test]
    fn only_mipmap_filters_need_mipmaps() {
        assert!(!Filter::Nearest.uses_mipmaps());
        assert!(!Filter::Linear.uses_mipmaps());
        assert!(Filter::LinearMipmapLinear.uses_mipmaps());
    }

    #[test]
    fn magnification_never_uses_mipmap_enums() {
        let sampling = Sampling {
            mag_filter: Filter::LinearMipmapLinear,
            ..Sampling::default()
        };
        assert_eq!(sampling.gl_mag_filter(), gl::LINEAR);
    }

    #[test]
    fn missing_files_fail_to_load_before_touching_gl() {
        let result = Texture::load(Path::new("does/not/exist.png"), Sampling::default());
        assert!(matches!(result, Err(TextureError::Decode { .. })));
    }
}
