//! Window and OpenGL context management using winit and glutin

use crate::backend::{ClearMask, GlowBackend, GraphicsBackend};
use crate::error::{GraphicsError, GraphicsResult};
use crate::hints::WindowHint;
use crate::image_data::ImageData;
use crate::ContextConfig;
use glutin::config::{Config, ConfigTemplateBuilder};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, PossiblyCurrentContext, Version,
};
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::{Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface};
use glutin_winit::DisplayBuilder;
use raw_window_handle::HasRawWindowHandle;
use std::cell::RefCell;
use std::ffi::CString;
use std::num::NonZeroU32;
use std::rc::Rc;
use std::time::{Duration, Instant};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Icon, Window as WinitWindow, WindowBuilder, WindowLevel};

fn window_error(err: impl std::fmt::Display) -> GraphicsError {
    GraphicsError::Window(err.to_string())
}

fn non_zero(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}

/// Counts frames and reports the rate once per second
#[derive(Debug)]
struct FrameCounter {
    frames: u32,
    since: Instant,
}

impl FrameCounter {
    const INTERVAL: Duration = Duration::from_secs(1);

    fn new(now: Instant) -> Self {
        Self { frames: 0, since: now }
    }

    /// Record a frame. Returns the frame count of the last interval once it has elapsed.
    fn tick(&mut self, now: Instant) -> Option<u32> {
        self.frames += 1;
        if now.duration_since(self.since) < Self::INTERVAL {
            return None;
        }
        let frames = self.frames;
        self.frames = 0;
        self.since = now;
        Some(frames)
    }
}

/// A native window with a current OpenGL context.
pub struct Window {
    // Context and surface are released before the window they render to.
    context: PossiblyCurrentContext,
    surface: Surface<WindowSurface>,
    window: WinitWindow,
    event_loop: EventLoop<()>,
    backend: Rc<GlowBackend>,
    title: String,
}

impl Window {
    /// Open a window and make a core-profile context current on it.
    pub fn new(config: &ContextConfig) -> GraphicsResult<Self> {
        let event_loop = EventLoop::new().map_err(window_error)?;
        let hints = config.hints;

        let mut builder = WindowBuilder::new()
            .with_title(config.title.as_str())
            .with_inner_size(PhysicalSize::new(config.width, config.height))
            .with_visible(hints.contains(WindowHint::Visible))
            .with_resizable(hints.contains(WindowHint::Resizable))
            .with_decorations(hints.contains(WindowHint::Decorated))
            .with_active(hints.contains(WindowHint::Focused))
            .with_maximized(hints.contains(WindowHint::Maximized))
            .with_transparent(hints.contains(WindowHint::Transparent));
        if hints.contains(WindowHint::Floating) {
            builder = builder.with_window_level(WindowLevel::AlwaysOnTop);
        }

        let template = ConfigTemplateBuilder::new()
            .with_alpha_size(8)
            .with_transparency(hints.contains(WindowHint::Transparent))
            .with_single_buffering(!hints.contains(WindowHint::DoubleBuffer));

        let (window, gl_config) = DisplayBuilder::new()
            .with_window_builder(Some(builder))
            .build(&event_loop, template, pick_config)
            .map_err(window_error)?;
        let window = window.ok_or_else(|| window_error("no window was created"))?;
        let raw_window_handle = window.raw_window_handle();

        let (major, minor) = config.gl_version;
        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(major, minor))))
            .with_profile(GlProfile::Core)
            .with_debug(config.debug)
            .build(Some(raw_window_handle));

        let display = gl_config.display();
        let context = unsafe { display.create_context(&gl_config, &context_attributes) }
            .map_err(window_error)?;

        let size = window.inner_size();
        let surface_attributes = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            raw_window_handle,
            non_zero(size.width),
            non_zero(size.height),
        );
        let surface = unsafe { display.create_window_surface(&gl_config, &surface_attributes) }
            .map_err(window_error)?;
        let context = context.make_current(&surface).map_err(window_error)?;

        let interval = if config.vsync {
            SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            SwapInterval::DontWait
        };
        if let Err(err) = surface.set_swap_interval(&context, interval) {
            log::warn!("Failed to set swap interval: {err}");
        }

        let mut gl = unsafe {
            glow::Context::from_loader_function(|symbol| match CString::new(symbol) {
                Ok(name) => display.get_proc_address(&name),
                Err(_) => std::ptr::null(),
            })
        };
        if config.debug {
            unsafe { crate::debug::install(&mut gl) };
        }
        let backend = Rc::new(unsafe { GlowBackend::new(gl) });

        center_on_monitor(&window);
        log::info!(
            "Created {}x{} window \"{}\"",
            config.width,
            config.height,
            config.title
        );

        Ok(Self {
            context,
            surface,
            window,
            event_loop,
            backend,
            title: config.title.clone(),
        })
    }

    /// Backend bound to this window's context, for creating resources before [`Window::run`].
    pub fn backend(&self) -> Rc<dyn GraphicsBackend> {
        self.backend.clone()
    }

    pub fn gl(&self) -> &glow::Context {
        self.backend.gl()
    }

    pub fn size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
        self.window.set_title(title);
    }

    /// Set the window icon from RGBA pixels.
    pub fn set_icon(&self, image: &ImageData) -> GraphicsResult<()> {
        if image.channels != 4 {
            return Err(window_error(format!(
                "window icons need 4 channels, got {}",
                image.channels
            )));
        }
        let icon = Icon::from_rgba(image.bytes.clone(), image.width, image.height)
            .map_err(window_error)?;
        self.window.set_window_icon(Some(icon));
        Ok(())
    }

    /// Run the frame loop until the window is closed or `render` fails.
    ///
    /// Each frame swaps buffers, clears colour and depth, resets the viewport to the window
    /// size, then calls `render`.
    pub fn run<F>(self, mut render: F) -> GraphicsResult<()>
    where
        F: FnMut(&Rc<dyn GraphicsBackend>) -> GraphicsResult<()> + 'static,
    {
        let Window {
            context,
            surface,
            window,
            event_loop,
            backend,
            title,
        } = self;
        let backend: Rc<dyn GraphicsBackend> = backend;
        let failure: Rc<RefCell<Option<GraphicsError>>> = Rc::default();
        let failed = failure.clone();
        let mut counter = FrameCounter::new(Instant::now());

        event_loop
            .run(move |event, elwt| {
                elwt.set_control_flow(ControlFlow::Poll);
                match event {
                    Event::WindowEvent { event, .. } => match event {
                        WindowEvent::CloseRequested => elwt.exit(),
                        WindowEvent::Resized(size) if size.width > 0 && size.height > 0 => {
                            surface.resize(&context, non_zero(size.width), non_zero(size.height));
                        }
                        WindowEvent::RedrawRequested => {
                            let frame = surface
                                .swap_buffers(&context)
                                .map_err(window_error)
                                .and_then(|()| {
                                    let size = window.inner_size();
                                    backend.clear(ClearMask::COLOR | ClearMask::DEPTH);
                                    backend.viewport(0, 0, size.width as i32, size.height as i32);
                                    backend.clear_color(0.0, 0.0, 0.0, 1.0);
                                    render(&backend)
                                });
                            if let Err(err) = frame {
                                log::error!("Frame failed: {err}");
                                *failed.borrow_mut() = Some(err);
                                elwt.exit();
                                return;
                            }
                            if let Some(fps) = counter.tick(Instant::now()) {
                                window.set_title(&format!("{title} | FPS: {fps}"));
                            }
                        }
                        _ => {}
                    },
                    Event::AboutToWait => window.request_redraw(),
                    _ => {}
                }
            })
            .map_err(window_error)?;

        match failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Prefer the config with the most samples.
fn pick_config(configs: Box<dyn Iterator<Item = Config> + '_>) -> Config {
    configs
        .reduce(|best, config| {
            if config.num_samples() > best.num_samples() {
                config
            } else {
                best
            }
        })
        .expect("display offers at least one matching config")
}

fn center_on_monitor(window: &WinitWindow) {
    let Some(monitor) = window.primary_monitor().or_else(|| window.current_monitor()) else {
        return;
    };
    let area = monitor.size();
    let origin = monitor.position();
    let size = window.outer_size();
    let x = origin.x + (area.width.saturating_sub(size.width) / 2) as i32;
    let y = origin.y + (area.height.saturating_sub(size.height) / 2) as i32;
    window.set_outer_position(PhysicalPosition::new(x, y));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_counter_reports_once_per_second() {
        let start = Instant::now();
        let mut counter = FrameCounter::new(start);

        assert_eq!(counter.tick(start + Duration::from_millis(300)), None);
        assert_eq!(counter.tick(start + Duration::from_millis(600)), None);
        assert_eq!(counter.tick(start + Duration::from_millis(1000)), Some(3));
        assert_eq!(counter.tick(start + Duration::from_millis(1500)), None);
        assert_eq!(counter.tick(start + Duration::from_millis(2000)), Some(2));
    }

    #[test]
    fn test_non_zero_clamps() {
        assert_eq!(non_zero(0).get(), 1);
        assert_eq!(non_zero(640).get(), 640);
    }
}
