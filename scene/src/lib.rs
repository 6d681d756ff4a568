//! # Scene
//!
//! Everything the renderer reads from disk before it talks to the gpu.
//!
//! ## Modules
//!
//! - `config`: Loads the TOML configuration file and picks the lesson to run.
//! - `geometry`: Parses the two section (`[points]` / `[indices]`) geometry text format.
//! - `shader`: Loads WGSL shader modules from files.
//! - `structs`: The gpu compatible `Vertex` and `Uniforms` types.
//! - `error`: The `SceneError` type shared by all of the above.
//!
//! ## Usage
//!
//! ```no_run
//! use scene::{load_geometry, Config};
//!
//! let config = Config::new("res/config.toml").expect("Could not load config");
//! let geometry = load_geometry(&config.render.geometry_path).expect("Could not load geometry");
//! println!("{} vertices", geometry.vertex_count());
//! ```
mod config;
mod error;
mod geometry;
mod shader;
mod structs;

pub use config::{Config, Lesson, PresentModeConfig, RenderConfig, WindowConfig};
pub use error::{Result, SceneError};
pub use geometry::{load_geometry, parse_geometry, Geometry, FLOATS_PER_POINT, INDICES_PER_TRIANGLE};
pub use shader::{load_shader_module, load_shader_source, TRIANGLE_SHADER};
pub use structs::{Uniforms, Vertex};
