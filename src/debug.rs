//! Routing of `KHR_debug` driver messages into `log`.

use glow::HasContext;

pub fn source_name(source: u32) -> &'static str {
    match source {
        glow::DEBUG_SOURCE_API => "API",
        glow::DEBUG_SOURCE_WINDOW_SYSTEM => "WINDOW SYSTEM",
        glow::DEBUG_SOURCE_SHADER_COMPILER => "SHADER COMPILER",
        glow::DEBUG_SOURCE_THIRD_PARTY => "THIRD PARTY",
        glow::DEBUG_SOURCE_APPLICATION => "APPLICATION",
        glow::DEBUG_SOURCE_OTHER => "OTHER",
        _ => "UNKNOWN",
    }
}

pub fn type_name(ty: u32) -> &'static str {
    match ty {
        glow::DEBUG_TYPE_ERROR => "ERROR",
        glow::DEBUG_TYPE_DEPRECATED_BEHAVIOR => "DEPRECATED BEHAVIOR",
        glow::DEBUG_TYPE_UNDEFINED_BEHAVIOR => "UNDEFINED BEHAVIOR",
        glow::DEBUG_TYPE_PORTABILITY => "PORTABILITY",
        glow::DEBUG_TYPE_PERFORMANCE => "PERFORMANCE",
        glow::DEBUG_TYPE_MARKER => "MARKER",
        glow::DEBUG_TYPE_PUSH_GROUP => "PUSH GROUP",
        glow::DEBUG_TYPE_POP_GROUP => "POP GROUP",
        glow::DEBUG_TYPE_OTHER => "OTHER",
        _ => "UNKNOWN",
    }
}

pub fn severity_name(severity: u32) -> &'static str {
    match severity {
        glow::DEBUG_SEVERITY_HIGH => "HIGH",
        glow::DEBUG_SEVERITY_MEDIUM => "MEDIUM",
        glow::DEBUG_SEVERITY_LOW => "LOW",
        glow::DEBUG_SEVERITY_NOTIFICATION => "NOTIFICATION",
        _ => "UNKNOWN",
    }
}

/// Log level a message of the given severity is reported at.
pub fn severity_level(severity: u32) -> log::Level {
    match severity {
        glow::DEBUG_SEVERITY_HIGH => log::Level::Error,
        glow::DEBUG_SEVERITY_MEDIUM => log::Level::Warn,
        glow::DEBUG_SEVERITY_LOW => log::Level::Info,
        _ => log::Level::Debug,
    }
}

/// Debug callback suitable for `glDebugMessageCallback`.
pub fn log_message(source: u32, ty: u32, id: u32, severity: u32, message: &str) {
    log::log!(
        target: "nebula_graphics::gl",
        severity_level(severity),
        "[{}] {} #{id} ({}): {}",
        source_name(source),
        type_name(ty),
        severity_name(severity),
        message.trim_end()
    );
}

/// Enable synchronous debug output on a debug context and route it through [`log_message`].
///
/// # Safety
/// `gl` must be current on the calling thread.
pub unsafe fn install(gl: &mut glow::Context) {
    let version = gl.version();
    let core = (version.major, version.minor) >= (4, 3);
    if !core && !gl.supported_extensions().contains("GL_KHR_debug") {
        log::warn!("KHR_debug is unavailable, driver messages will not be logged");
        return;
    }
    gl.enable(glow::DEBUG_OUTPUT);
    gl.enable(glow::DEBUG_OUTPUT_SYNCHRONOUS);
    gl.debug_message_callback(log_message);
    log::debug!("OpenGL debug output enabled");
}
