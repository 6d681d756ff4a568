use std::fs;
use std::path::Path;

use crate::error::{Result, SceneError};

/// The shader of the very first lesson: no vertex buffer, the triangle corners come from `vertex_index`.
pub const TRIANGLE_SHADER: &str = r#"
@vertex
fn vs_main(@builtin(vertex_index) in_vertex_index: u32) -> @builtin(position) vec4f {
    var p = vec2f(0.0, 0.0);
    if in_vertex_index == 0u {
        p = vec2f(-0.5, -0.5);
    } else if in_vertex_index == 1u {
        p = vec2f(0.5, -0.5);
    } else {
        p = vec2f(0.0, 0.5);
    }
    return vec4f(p, 0.0, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4f {
    return vec4f(0.0, 0.4, 1.0, 1.0);
}
"#;

/// Reads WGSL source code from a file.
pub fn load_shader_source<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    log::info!("Loading shader module from `{}`", path.display());
    let source = fs::read_to_string(path).map_err(|e| {
        log::error!("Was not able to open file `{}`", path.display());
        SceneError::io(path, e)
    })?;
    log::trace!("Source: \n{}", source);
    Ok(source)
}

/// Reads a WGSL file and compiles it into a shader module on `device`.
///
/// The module is labelled with the file name so it can be found in graphics debuggers.
/// Compilation errors are reported by the device's uncaptured error handler.
pub fn load_shader_module<P: AsRef<Path>>(device: &wgpu::Device, path: P) -> Result<wgpu::ShaderModule> {
    let path = path.as_ref();
    let source = load_shader_source(path)?;
    let label = path.file_name().map(|name| name.to_string_lossy().into_owned());

    Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: label.as_deref(),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    }))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_shader_source() {
        let source = load_shader_source("../res/shader/geometry.wgsl").expect("Could not read shader");
        assert!(source.contains("fn vs_main"));
        assert!(source.contains("fn fs_main"));
    }

    #[test]
    fn test_load_shader_source_missing() {
        let error = load_shader_source("../res/shader/missing.wgsl").unwrap_err();
        assert!(matches!(error, SceneError::Io { .. }));
    }

    #[test]
    fn test_triangle_shader_entry_points() {
        assert!(TRIANGLE_SHADER.contains("@vertex\nfn vs_main"));
        assert!(TRIANGLE_SHADER.contains("@fragment\nfn fs_main"));
    }
}
