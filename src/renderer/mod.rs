use sdl2::video::Window;
use sdl2::VideoSubsystem;

pub mod gl;
pub mod programs;
pub mod shader;
pub mod texture;
pub mod vertex_array;

/// Rasterization modes the viewer toggles through with W.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonMode {
    Line,
    Point,
    Fill,
}

impl PolygonMode {
    const CYCLE: [PolygonMode; 3] = [PolygonMode::Line, PolygonMode::Point, PolygonMode::Fill];

    pub fn next(self) -> PolygonMode {
        let index = PolygonMode::CYCLE.iter().position(|&m| m == self).unwrap_or(0);
        PolygonMode::CYCLE[(index + 1) % PolygonMode::CYCLE.len()]
    }

    fn gl_enum(self) -> gl::types::GLenum {
        match self {
            PolygonMode::Line => gl::LINE,
            PolygonMode::Point => gl::POINT,
            PolygonMode::Fill => gl::FILL,
        }
    }
}

/// Global GL state of the window: viewport, clear color, depth test and
/// culling. Drawables own everything else they bind.
pub struct Renderer {
    polygon_mode: PolygonMode,
}

impl Renderer {
    pub fn new(video: &VideoSubsystem, window: &Window) -> Renderer {
        gl::load_with(|s| video.gl_get_proc_address(s) as *const core::ffi::c_void);
        if let Err(err) = video.gl_set_swap_interval(1) {
            log::warn!("could not enable vsync: {err}");
        }
        let (w, h) = window.drawable_size();
        gl::call!(gl::Viewport(0, 0, w as i32, h as i32));

        log::info!(
            "OpenGL {}, GLSL {}, Renderer {}",
            gl::get_string(gl::VERSION),
            gl::get_string(gl::SHADING_LANGUAGE_VERSION),
            gl::get_string(gl::RENDERER),
        );

        gl::call!(gl::ClearColor(0.1, 0.1, 0.1, 0.1));
        gl::call!(gl::Enable(gl::CULL_FACE));
        gl::call!(gl::Enable(gl::DEPTH_TEST));

        Renderer {
            polygon_mode: PolygonMode::Fill,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        gl::call!(gl::Viewport(0, 0, width as i32, height as i32));
    }

    pub fn clear(&mut self) {
        gl::call!(gl::Clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT));
    }

    pub fn cycle_polygon_mode(&mut self) {
        self.polygon_mode = self.polygon_mode.next();
        gl::call!(gl::PolygonMode(
            gl::FRONT_AND_BACK,
            self.polygon_mode.gl_enum()
        ));
        log::debug!("polygon mode {:?}", self.polygon_mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polygon_modes_cycle_from_fill_to_line() {
        let mut mode = PolygonMode::Fill;
        let mut seen = Vec::new();
        for _ in 0..4 {
            mode = mode.next();
            seen.push(mode);
        }
        assert_eq!(
            seen,
            [
                PolygonMode::Line,
                PolygonMode::Point,
                PolygonMode::Fill,
                PolygonMode::Line
            ]
        );
    }
}
