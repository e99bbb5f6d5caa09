//! Generated OpenGL bindings plus the handful of helpers every GL object
//! wrapper in this crate leans on.

use std::borrow::Cow;
use std::ffi::{c_void, CString};

use bytemuck::Pod;

mod bindings {
    #![allow(clippy::all, dead_code, non_camel_case_types, non_snake_case, unused_imports)]
    include!(concat!(env!("OUT_DIR"), "/bindings.rs"));
}

pub use bindings::*;

/// Calls the given GL function, and in debug builds panics with the error
/// name and call site if `glGetError` reports anything afterwards.
macro_rules! call {
    ($expr:expr) => {{
        let result = unsafe { $expr };
        if cfg!(debug_assertions) {
            let error = unsafe { $crate::renderer::gl::GetError() };
            if error != $crate::renderer::gl::NO_ERROR {
                panic!(
                    "OpenGL error {} at {}:{}:{}",
                    $crate::renderer::gl::error_name(error),
                    file!(),
                    line!(),
                    column!(),
                );
            }
        }
        result
    }};
}

pub(crate) use call;

pub fn error_name(error: types::GLenum) -> Cow<'static, str> {
    match error {
        NO_ERROR => Cow::Borrowed("NO_ERROR"),
        INVALID_ENUM => Cow::Borrowed("INVALID_ENUM"),
        INVALID_VALUE => Cow::Borrowed("INVALID_VALUE"),
        INVALID_OPERATION => Cow::Borrowed("INVALID_OPERATION"),
        OUT_OF_MEMORY => Cow::Borrowed("OUT_OF_MEMORY"),
        INVALID_FRAMEBUFFER_OPERATION => Cow::Borrowed("INVALID_FRAMEBUFFER_OPERATION"),
        _ => Cow::Owned(format!("{error:#06x}")),
    }
}

/// Uploads `data` into the buffer currently bound to `target`.
pub fn buffer_data<T: Pod>(target: types::GLenum, data: &[T], usage: types::GLenum) {
    let bytes: &[u8] = bytemuck::cast_slice(data);
    call!(BufferData(
        target,
        bytes.len() as types::GLsizeiptr,
        bytes.as_ptr() as *const c_void,
        usage,
    ));
}

/// Returns the location of the named uniform, or None if the program does not
/// have an active uniform by that name.
pub fn get_uniform_location(program: types::GLuint, name: &str) -> Option<types::GLint> {
    let name = CString::new(name).ok()?;
    let location = call!(GetUniformLocation(program, name.as_ptr()));
    (location != -1).then_some(location)
}

/// Reads a GL string like `GL_VERSION`. Returns an empty string if the driver
/// gives back null.
pub fn get_string(name: types::GLenum) -> String {
    let ptr = call!(GetString(name));
    if ptr.is_null() {
        return String::new();
    }
    unsafe { std::ffi::CStr::from_ptr(ptr as *const std::ffi::c_char) }
        .to_string_lossy()
        .into_owned()
}

/// Reads a shader or program info log through the matching GL getter.
pub(crate) fn info_log(
    object: types::GLuint,
    get_iv: unsafe fn(types::GLuint, types::GLenum, *mut types::GLint),
    get_log: unsafe fn(types::GLuint, types::GLsizei, *mut types::GLsizei, *mut types::GLchar),
) -> String {
    let mut capacity = 0;
    call!(get_iv(object, INFO_LOG_LENGTH, &mut capacity));
    let mut info_log = vec![0u8; capacity.max(1) as usize];
    let mut length = 0;
    call!(get_log(
        object,
        info_log.len() as types::GLsizei,
        &mut length,
        info_log.as_mut_ptr() as *mut types::GLchar,
    ));
    info_log.truncate(length.max(0) as usize);
    String::from_utf8_lossy(&info_log).trim_end().to_string()
}
