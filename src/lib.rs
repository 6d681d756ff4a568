//! # Learn WebGPU
//!
//! Brings a wgpu rendering context up step by step, one lesson at a time:
//! a hard coded triangle, a buffer round trip, vertex buffers, index buffers,
//! uniform buffers and an explicit bind group.
//!
//! The lesson, the window and the clear color are picked in a TOML config file
//! (`res/config.toml` by default), see [`scene::Config`].
use std::sync::Arc;

use anyhow::{Context, Result};
use winit::{event::*, event_loop::{ControlFlow, EventLoop}};

use crate::state::State;

pub mod helper;
pub mod state;

pub const DEFAULT_CONFIG_PATH: &str = "res/config.toml";

/// Starts the application.
///
/// This function initializes the logger, reads the config, creates the window, and starts the event loop.
/// It sets a panic hook for wasm32 targets and initializes the logger accordingly.
/// For non-wasm32 targets, it uses the `env_logger` crate, logging at `info` unless `RUST_LOG` says otherwise.
///
/// The event loop handles:
/// - Closing the window when requested by the user, on escape or on Cmd/Super + W/Q
/// - Updating and rendering the state when a redraw is requested
/// - Resizing the surface when the window size changes
/// - Requesting a redraw before the system goes to idle
///
/// # Errors
///
/// Fails if the config can't be read, if the window or the gpu can't be set up, or if the lesson's
/// resources can't be loaded.
pub async fn run(config_path: Option<&str>) -> Result<()> {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            std::panic::set_hook(Box::new(console_error_panic_hook::hook));
            console_log::init_with_level(log::Level::Info).context("Couldn't initialize logger")?;
        } else {
            // a second call, e.g. from another demo in the same process, keeps the first logger
            let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();
        }
    }

    let config_path = match config_path {
        Some(path) => {
            log::info!("Using config file: {}", path);
            path
        }
        None => {
            log::info!("Using default config");
            DEFAULT_CONFIG_PATH
        }
    };
    let user_config =
        scene::Config::new(config_path).with_context(|| format!("Could not load config `{}`", config_path))?;

    let event_loop = EventLoop::new().context("Could not create event loop")?;
    let window = winit::window::WindowBuilder::new()
        .with_title(&user_config.window.title)
        .with_inner_size(winit::dpi::LogicalSize::new(user_config.window.width, user_config.window.height))
        .with_resizable(user_config.window.resizable)
        .build(&event_loop)
        .context("Could not open window")?;
    let window = Arc::new(window);

    // ControlFlow::Poll continuously runs the event loop,
    // even if the OS hasn't dispatched any events.
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut state = State::new(window, &user_config).await?;
    let start_time = instant::Instant::now();

    // Start the event loop
    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent {
                ref event,
                window_id,
            } if window_id == state.window.id() && !state.input(event) => match event {
                WindowEvent::CloseRequested => elwt.exit(),
                WindowEvent::KeyboardInput { event: key_event, .. } if state.should_close(key_event) => elwt.exit(),
                WindowEvent::RedrawRequested => {
                    state.update(start_time.elapsed());
                    match state.render() {
                        Ok(_) => {}
                        // Reconfigure the surface if it's lost or outdated
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => state.resize(state.size),
                        // The system is out of memory, we should probably quit
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            log::error!("Out of memory");
                            elwt.exit();
                        }
                        // We're ignoring timeouts
                        Err(wgpu::SurfaceError::Timeout) => log::warn!("Surface timeout"),
                    }
                }
                WindowEvent::Resized(physical_size) => state.resize(*physical_size),
                _ => {}
            },
            // Request a redraw before the system goes to idle
            Event::AboutToWait => state.window.request_redraw(),
            _ => (),
        })
        .context("Event loop failed")?;

    log::info!("Closed lesson {:?}", user_config.render.lesson);
    Ok(())
}


#[cfg(test)]
mod tests {
    use std::path::Path;

    use scene::{load_geometry, load_shader_source, Config, Lesson};

    use super::*;

    const DEMOS: [(&str, Lesson); 6] = [
        ("demos/0-triangle/config.toml", Lesson::Triangle),
        ("demos/1-buffer_mapping/config.toml", Lesson::BufferMapping),
        ("demos/2-vertex_buffer/config.toml", Lesson::VertexBuffer),
        ("demos/3-index_buffer/config.toml", Lesson::IndexBuffer),
        ("demos/4-uniform_buffer/config.toml", Lesson::UniformBuffer),
        ("demos/5-bind_group/config.toml", Lesson::BindGroup),
    ];

    #[test]
    fn test_demo_configs_match_their_lesson() {
        for (path, lesson) in DEMOS {
            let config = Config::new(path).expect("Could not load demo config");
            assert_eq!(config.render.lesson, lesson, "{}", path);
        }
    }

    #[test]
    fn test_demo_resources_exist() {
        for (path, _) in DEMOS.iter().chain([(DEFAULT_CONFIG_PATH, Lesson::BindGroup)].iter()) {
            let config = Config::new(path).expect("Could not load config");
            if let Some(shader_path) = config.render.shader_path() {
                let source = load_shader_source(shader_path).expect("Could not load shader");
                assert!(source.contains("fn vs_main") && source.contains("fn fs_main"), "{}", shader_path);
            }
            if config.render.lesson.uses_geometry() {
                assert!(Path::new(&config.render.geometry_path).exists(), "{}", config.render.geometry_path);
                let geometry = load_geometry(&config.render.geometry_path).expect("Could not load geometry");
                assert!(geometry.validate().is_ok());
            }
        }
    }

    #[test]
    fn test_pyramid_shares_vertices() {
        let geometry = load_geometry("res/geometry/pyramid.txt").expect("Could not load geometry");
        assert_eq!(geometry.vertex_count(), 5);
        assert_eq!(geometry.index_count(), 12);
        assert_eq!(geometry.expanded_vertices().expect("Could not expand").len(), 12);
    }
}
