use anyhow::{ensure, Result};

use scene::{load_geometry, load_shader_module, Lesson, RenderConfig, Uniforms, Vertex, TRIANGLE_SHADER};
use wgpu_utils::{
    ascending_bytes, read_buffer, BindGroupDescriptor, BindingResourceTemplate, BufferInitDescriptor, BufferType,
};

/// What a lesson draws each frame and the buffers it draws from.
pub enum DrawCall {
    /// Vertices are generated in the shader from `vertex_index`.
    Procedural { vertex_count: u32 },
    /// A plain vertex buffer, drawn in order.
    Vertices { vertex_buffer: wgpu::Buffer, vertex_count: u32 },
    /// A vertex buffer addressed through a `u16` index buffer.
    Indexed {
        vertex_buffer: wgpu::Buffer,
        index_buffer: wgpu::Buffer,
        index_count: u32,
    },
}

impl DrawCall {
    /// Binds the buffers and records the draw.
    pub fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        match self {
            DrawCall::Procedural { vertex_count } => render_pass.draw(0..*vertex_count, 0..1),
            DrawCall::Vertices { vertex_buffer, vertex_count } => {
                render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
                render_pass.draw(0..*vertex_count, 0..1);
            }
            DrawCall::Indexed { vertex_buffer, index_buffer, index_count } => {
                render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
                render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(0..*index_count, 0, 0..1);
            }
        }
    }
}

/// The uniform values of a lesson together with the buffer and bind group that carry them.
pub struct UniformBinding {
    pub uniforms: Uniforms,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

/// Alpha blending over whatever is already in the target, leaving the target alpha untouched.
pub fn blend_state() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::Zero,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

/// The configured shader, or the embedded triangle shader for lessons without one.
pub fn load_shader(device: &wgpu::Device, render: &RenderConfig) -> Result<wgpu::ShaderModule> {
    match render.shader_path() {
        Some(path) => Ok(load_shader_module(device, path)?),
        None => {
            log::info!("Using the embedded triangle shader");
            Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Triangle Shader"),
                source: wgpu::ShaderSource::Wgsl(TRIANGLE_SHADER.into()),
            }))
        }
    }
}

/// Creates the render pipeline every lesson shares: `vs_main`/`fs_main`, a triangle list and one
/// blended color target in `format`.
///
/// With `layout` set to `None` the layout is derived from the shader.
pub fn create_render_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    layout: Option<&wgpu::PipelineLayout>,
    vertex_buffers: &[wgpu::VertexBufferLayout],
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Render Pipeline"),
        layout,
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: "vs_main", // Entrypoint for vertex shader
            buffers: vertex_buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: "fs_main", // Entrypoint for fragment shader
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(blend_state()),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            // Setting this to anything other than Fill requires Features::POLYGON_MODE_LINE
            // or Features::POLYGON_MODE_POINT
            polygon_mode: wgpu::PolygonMode::Fill,
            // Requires Features::DEPTH_CLIP_CONTROL
            unclipped_depth: false,
            // Requires Features::CONSERVATIVE_RASTERIZATION
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        // Used with a multiview render pass, this indicates how many array layers the attachments will have.
        multiview: None,
    })
}

/// Loads the lesson's geometry, if it has any, and uploads it.
pub fn setup_draw_call(device: &wgpu::Device, render: &RenderConfig) -> Result<DrawCall> {
    if !render.lesson.uses_geometry() {
        return Ok(DrawCall::Procedural { vertex_count: 3 });
    }

    let geometry = load_geometry(&render.geometry_path)?;
    geometry.validate()?;
    if let Some((min, max)) = geometry.bounds() {
        log::debug!("Geometry bounds: {} to {}", min, max);
    }

    let vertex_descriptor =
        BufferInitDescriptor::new(Some("Vertex Buffer"), wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST);

    if render.lesson.uses_index_buffer() {
        let vertex_buffer = vertex_descriptor.create_new_buffer(device, &geometry.vertices());
        // odd index counts are padded to the copy alignment by create_new_buffer
        let index_buffer =
            BufferInitDescriptor::new(Some("Index Buffer"), wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST)
                .create_new_buffer(device, &geometry.index_data);
        Ok(DrawCall::Indexed {
            vertex_buffer,
            index_buffer,
            index_count: geometry.index_count() as u32,
        })
    } else {
        let vertices = geometry.expanded_vertices()?;
        let vertex_buffer = vertex_descriptor.create_new_buffer(device, &vertices);
        Ok(DrawCall::Vertices {
            vertex_buffer,
            vertex_count: vertices.len() as u32,
        })
    }
}

fn uniform_bind_group_descriptor(buffer: &wgpu::Buffer) -> BindGroupDescriptor<'_> {
    BindGroupDescriptor::new(
        Some("uniforms"),
        wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        vec![BufferType::with_min_binding_size(
            BindingResourceTemplate::BufferUniform(buffer.as_entire_binding()),
            std::mem::size_of::<Uniforms>() as u64,
        )],
    )
}

/// Builds the pipeline of a lesson and, when it has uniforms, the bind group for them.
///
/// The uniform buffer lesson lets wgpu derive the pipeline layout from the shader and reads group 0
/// back from the pipeline. The bind group lesson spells the layout out and makes it visible to both
/// shader stages.
pub fn setup_pipeline(
    device: &wgpu::Device,
    render: &RenderConfig,
    format: wgpu::TextureFormat,
    uniform_buffer: Option<&wgpu::Buffer>,
) -> Result<(wgpu::RenderPipeline, Option<wgpu::BindGroup>)> {
    let shader = load_shader(device, render)?;
    let vertex_buffers = if render.lesson.uses_geometry() {
        vec![Vertex::desc()]
    } else {
        Vec::new()
    };

    let Some(buffer) = uniform_buffer else {
        return Ok((create_render_pipeline(device, &shader, format, None, &vertex_buffers), None));
    };

    let descriptor = uniform_bind_group_descriptor(buffer);
    if render.lesson == Lesson::BindGroup {
        let bind_group_layout = descriptor.generate_bind_group_layout(device);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = create_render_pipeline(device, &shader, format, Some(&pipeline_layout), &vertex_buffers);
        let bind_group = descriptor.generate_bind_group(device, &bind_group_layout);
        Ok((pipeline, Some(bind_group)))
    } else {
        let pipeline = create_render_pipeline(device, &shader, format, None, &vertex_buffers);
        let bind_group = descriptor.generate_bind_group(device, &pipeline.get_bind_group_layout(0));
        Ok((pipeline, Some(bind_group)))
    }
}

/// Creates the uniform buffer, initialised with `uniforms`.
pub fn create_uniform_buffer(device: &wgpu::Device, uniforms: &Uniforms) -> wgpu::Buffer {
    BufferInitDescriptor::new(Some("Uniform Buffer"), wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST)
        .create_new_buffer(device, &[*uniforms])
}

/// Writes ascending bytes into a gpu buffer, copies them to a second one and maps that back.
///
/// Fails if the data that comes back is not what was written.
pub fn playing_with_buffers(device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Vec<u8>> {
    const BUFFER_SIZE: usize = 16;
    log::info!("Playing with buffers...");

    let buffer1 = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Input buffer"),
        size: BUFFER_SIZE as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    });

    let numbers = ascending_bytes(BUFFER_SIZE);
    queue.write_buffer(&buffer1, 0, &numbers);
    log::info!("buffer1 data: {:?}", numbers);

    let read_back = read_buffer(device, queue, &buffer1, BUFFER_SIZE as wgpu::BufferAddress)?;
    log::info!("buffer2 data: {:?}", read_back);

    ensure!(read_back == numbers, "Buffer data changed on the way through the gpu: {:?}", read_back);
    Ok(read_back)
}


#[cfg(test)]
mod tests {
    use super::*;
    use scene::Config;
    use wgpu_utils::headless_device_or_skip;

    #[test]
    fn test_blend_state() {
        let blend = blend_state();
        assert_eq!(blend.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(blend.color.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
        assert_eq!(blend.alpha.src_factor, wgpu::BlendFactor::Zero);
        assert_eq!(blend.alpha.dst_factor, wgpu::BlendFactor::One);
    }

    #[test]
    fn test_playing_with_buffers() {
        let Some((_adapter, device, queue)) = headless_device_or_skip() else { return };
        let data = playing_with_buffers(&device, &queue).expect("Buffer round trip failed");
        assert_eq!(data, (0..16).collect::<Vec<u8>>());
    }

    #[test]
    fn test_triangle_draw_call() {
        let Some((_adapter, device, _queue)) = headless_device_or_skip() else { return };
        let config = Config::for_lesson(Lesson::Triangle);
        let draw_call = setup_draw_call(&device, &config.render).expect("Could not set up draw call");
        assert!(matches!(draw_call, DrawCall::Procedural { vertex_count: 3 }));
    }

    #[test]
    fn test_geometry_draw_calls() {
        let Some((_adapter, device, _queue)) = headless_device_or_skip() else { return };

        let config = Config::for_lesson(Lesson::VertexBuffer);
        match setup_draw_call(&device, &config.render).expect("Could not set up draw call") {
            DrawCall::Vertices { vertex_count, .. } => assert_eq!(vertex_count, 9),
            _ => panic!("Vertex buffer lesson should draw plain vertices"),
        }

        let config = Config::for_lesson(Lesson::IndexBuffer);
        match setup_draw_call(&device, &config.render).expect("Could not set up draw call") {
            DrawCall::Indexed { index_count, .. } => assert_eq!(index_count, 9),
            _ => panic!("Index buffer lesson should draw indexed"),
        }
    }

    #[test]
    fn test_missing_geometry_file() {
        let Some((_adapter, device, _queue)) = headless_device_or_skip() else { return };
        let mut config = Config::for_lesson(Lesson::IndexBuffer);
        config.render.geometry_path = "res/geometry/missing.txt".to_string();
        assert!(setup_draw_call(&device, &config.render).is_err());
    }

    #[test]
    fn test_every_lesson_builds_a_pipeline() {
        let Some((_adapter, device, _queue)) = headless_device_or_skip() else { return };
        let format = wgpu::TextureFormat::Bgra8UnormSrgb;

        for lesson in Lesson::ALL {
            let config = Config::for_lesson(lesson);
            let uniforms = Uniforms::new(config.uniform_color, 4.0 / 3.0);
            let buffer = create_uniform_buffer(&device, &uniforms);
            let uniform_buffer = lesson.uses_uniforms().then_some(&buffer);

            let (_pipeline, bind_group) = setup_pipeline(&device, &config.render, format, uniform_buffer)
                .expect("Could not set up pipeline");
            assert_eq!(bind_group.is_some(), lesson.uses_uniforms());
        }
    }
}
