use std::fs;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{Result, SceneError};

pub const DEFAULT_TITLE: &str = "Learn WebGPU";
pub const DEFAULT_WIDTH: u32 = 640;
pub const DEFAULT_HEIGHT: u32 = 480;
pub const DEFAULT_CLEAR_COLOR: [f64; 4] = [0.9, 0.1, 0.2, 1.0];
pub const DEFAULT_UNIFORM_COLOR: [f32; 4] = [0.0, 1.0, 0.4, 1.0];
pub const DEFAULT_GEOMETRY_PATH: &str = "res/geometry/webgpu.txt";

/// The steps of bringing a renderer up, each one building on the previous.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lesson {
    /// A hard coded triangle, no buffers at all.
    #[default]
    Triangle,
    /// The triangle, plus a gpu buffer written, copied and mapped back at start-up.
    BufferMapping,
    /// Geometry from a file uploaded as a plain vertex buffer.
    VertexBuffer,
    /// Geometry drawn through a vertex and an index buffer.
    IndexBuffer,
    /// Adds a uniform buffer animated over time, using the layout derived from the shader.
    UniformBuffer,
    /// Adds an explicit bind group layout shared by the vertex and fragment stage.
    BindGroup,
}

impl Lesson {
    pub const ALL: [Lesson; 6] = [
        Lesson::Triangle,
        Lesson::BufferMapping,
        Lesson::VertexBuffer,
        Lesson::IndexBuffer,
        Lesson::UniformBuffer,
        Lesson::BindGroup,
    ];

    /// Shader used when the config does not name one. `None` means the embedded triangle shader.
    pub fn default_shader_path(&self) -> Option<&'static str> {
        match self {
            Lesson::Triangle | Lesson::BufferMapping => None,
            Lesson::VertexBuffer | Lesson::IndexBuffer => Some("res/shader/geometry.wgsl"),
            Lesson::UniformBuffer => Some("res/shader/uniform.wgsl"),
            Lesson::BindGroup => Some("res/shader/bind_group.wgsl"),
        }
    }

    pub fn uses_geometry(&self) -> bool {
        !matches!(self, Lesson::Triangle | Lesson::BufferMapping)
    }

    pub fn uses_index_buffer(&self) -> bool {
        matches!(self, Lesson::IndexBuffer | Lesson::UniformBuffer | Lesson::BindGroup)
    }

    pub fn uses_uniforms(&self) -> bool {
        matches!(self, Lesson::UniformBuffer | Lesson::BindGroup)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentModeConfig {
    #[default]
    Fifo,
    Immediate,
    Mailbox,
    AutoVsync,
    AutoNoVsync,
}

impl PresentModeConfig {
    pub fn to_wgpu(self) -> wgpu::PresentMode {
        match self {
            PresentModeConfig::Fifo => wgpu::PresentMode::Fifo,
            PresentModeConfig::Immediate => wgpu::PresentMode::Immediate,
            PresentModeConfig::Mailbox => wgpu::PresentMode::Mailbox,
            PresentModeConfig::AutoVsync => wgpu::PresentMode::AutoVsync,
            PresentModeConfig::AutoNoVsync => wgpu::PresentMode::AutoNoVsync,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            resizable: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub lesson: Lesson,
    pub clear_color: [f64; 4],
    pub present_mode: PresentModeConfig,
    pub shader_path: Option<String>,
    pub geometry_path: String,
}

impl RenderConfig {
    /// The configured shader, or the lesson's default one.
    pub fn shader_path(&self) -> Option<&str> {
        self.shader_path.as_deref().or(self.lesson.default_shader_path())
    }

    pub fn clear_color(&self) -> wgpu::Color {
        let [r, g, b, a] = self.clear_color;
        wgpu::Color { r, g, b, a }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            lesson: Lesson::default(),
            clear_color: DEFAULT_CLEAR_COLOR,
            present_mode: PresentModeConfig::default(),
            shader_path: None,
            geometry_path: DEFAULT_GEOMETRY_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub window: WindowConfig,
    pub render: RenderConfig,
    pub uniform_color: [f32; 4],
}

impl Config {
    pub fn new(config_path: &str) -> Result<Self> {
        let toml_str = fs::read_to_string(config_path).map_err(|e| SceneError::io(config_path, e))?;
        Self::from_str(&toml_str)
    }

    /// A config with every default but the lesson.
    pub fn for_lesson(lesson: Lesson) -> Self {
        let mut config = Self::default();
        config.render.lesson = lesson;
        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            render: RenderConfig::default(),
            uniform_color: DEFAULT_UNIFORM_COLOR,
        }
    }
}

impl FromStr for Config {
    type Err = SceneError;

    fn from_str(toml_str: &str) -> Result<Self> {
        let toml: toml::Value = toml::from_str(toml_str)?;

        let window = load_window_config(toml.get("window"))?;
        let render = load_render_config(toml.get("render"))?;
        let uniform_color = match toml.get("uniforms").and_then(|uniforms| uniforms.get("color")) {
            Some(value) => parse_color(value, "uniforms.color")?.map(|c| c as f32),
            None => DEFAULT_UNIFORM_COLOR,
        };

        Ok(Self {
            window,
            render,
            uniform_color,
        })
    }
}

fn parse_number(value: &toml::Value) -> Option<f64> {
    value.as_float().or_else(|| value.as_integer().map(|i| i as f64))
}

fn parse_color(value: &toml::Value, field: &'static str) -> Result<[f64; 4]> {
    let array = value
        .as_array()
        .ok_or_else(|| SceneError::invalid(field, "expected an array of four numbers"))?;
    let numbers = array
        .iter()
        .map(|v| parse_number(v).ok_or_else(|| SceneError::invalid(field, "expected a number")))
        .collect::<Result<Vec<f64>>>()?;
    match numbers.as_slice() {
        &[r, g, b, a] => Ok([r, g, b, a]),
        _ => Err(SceneError::invalid(field, format!("expected 4 values, found {}", numbers.len()))),
    }
}

fn parse_dimension(value: Option<&toml::Value>, field: &'static str, default: u32) -> Result<u32> {
    match value {
        Some(value) => {
            let number = value
                .as_integer()
                .ok_or_else(|| SceneError::invalid(field, "expected an integer"))?;
            match u32::try_from(number) {
                Ok(number) if number > 0 => Ok(number),
                _ => Err(SceneError::invalid(field, format!("{} is not a valid window size", number))),
            }
        }
        None => Ok(default),
    }
}

fn parse_string(value: Option<&toml::Value>, field: &'static str) -> Result<Option<String>> {
    value
        .map(|v| {
            v.as_str()
                .map(|s| s.to_string())
                .ok_or_else(|| SceneError::invalid(field, "expected a string"))
        })
        .transpose()
}

// makes the window section optional in config
fn load_window_config(value: Option<&toml::Value>) -> Result<WindowConfig> {
    let Some(value) = value else {
        log::debug!("No window defined in config, using defaults");
        return Ok(WindowConfig::default());
    };

    let title = parse_string(value.get("title"), "window.title")?.unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let width = parse_dimension(value.get("width"), "window.width", DEFAULT_WIDTH)?;
    let height = parse_dimension(value.get("height"), "window.height", DEFAULT_HEIGHT)?;
    let resizable = match value.get("resizable") {
        Some(v) => v.as_bool().ok_or_else(|| SceneError::invalid("window.resizable", "expected a boolean"))?,
        None => false,
    };

    Ok(WindowConfig {
        title,
        width,
        height,
        resizable,
    })
}

// makes the render section optional in config
fn load_render_config(value: Option<&toml::Value>) -> Result<RenderConfig> {
    let Some(value) = value else {
        log::debug!("No render section defined in config, using defaults");
        return Ok(RenderConfig::default());
    };

    let lesson = match value.get("lesson") {
        Some(v) => Lesson::deserialize(v.clone())
            .map_err(|e| SceneError::invalid("render.lesson", e.to_string()))?,
        None => Lesson::default(),
    };
    let present_mode = match value.get("present_mode") {
        Some(v) => PresentModeConfig::deserialize(v.clone())
            .map_err(|e| SceneError::invalid("render.present_mode", e.to_string()))?,
        None => PresentModeConfig::default(),
    };
    let clear_color = match value.get("clear_color") {
        Some(v) => parse_color(v, "render.clear_color")?,
        None => DEFAULT_CLEAR_COLOR,
    };
    let shader_path = parse_string(value.get("shader_path"), "render.shader_path")?;
    let geometry_path = parse_string(value.get("geometry_path"), "render.geometry_path")?
        .unwrap_or_else(|| DEFAULT_GEOMETRY_PATH.to_string());

    if lesson.uses_geometry() && geometry_path.is_empty() {
        return Err(SceneError::MissingField("render.geometry_path"));
    }

    Ok(RenderConfig {
        lesson,
        clear_color,
        present_mode,
        shader_path,
        geometry_path,
    })
}
