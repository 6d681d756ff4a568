//-----------Vertex-----------------
/// A single point of the geometry: a 2D position and an RGB color.
///
/// The layout matches one `[points]` line of a geometry file (`x y r g b`).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 3],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x3];

    pub fn new(position: [f32; 2], color: [f32; 3]) -> Self {
        Self { position, color }
    }

    /// Describes how the vertex buffer is laid out for the pipeline.
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}


//-----------Uniforms-----------------
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Uniforms {
    pub color: [f32; 4],
    pub time: f32,
    pub aspect_ratio: f32,
    _padding: [f32; 2], // uniform structs are sized in multiples of 16 bytes
}

impl Uniforms {
    pub fn new(color: [f32; 4], aspect_ratio: f32) -> Self {
        Self {
            color,
            time: 0.0,
            aspect_ratio,
            _padding: [0.0; 2],
        }
    }

    pub fn update_time(&mut self, seconds: f32) {
        self.time = seconds;
    }

    pub fn update_aspect_ratio(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect_ratio = width as f32 / height as f32;
        }
    }
}

impl Default for Uniforms {
    fn default() -> Self {
        Self::new([1.0; 4], 1.0)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout_matches_point_line() {
        let layout = Vertex::desc();
        assert_eq!(layout.array_stride, 5 * 4);
        assert_eq!(layout.attributes.len(), 2);
        assert_eq!(layout.attributes[0].offset, 0);
        assert_eq!(layout.attributes[0].format, wgpu::VertexFormat::Float32x2);
        assert_eq!(layout.attributes[1].offset, 8);
        assert_eq!(layout.attributes[1].shader_location, 1);
    }

    #[test]
    fn test_uniforms_size_is_uniform_aligned() {
        assert_eq!(std::mem::size_of::<Uniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<Uniforms>(), 32);
    }

    #[test]
    fn test_uniforms_aspect_ratio() {
        let mut uniforms = Uniforms::default();
        uniforms.update_aspect_ratio(640, 480);
        assert!((uniforms.aspect_ratio - 4.0 / 3.0).abs() < f32::EPSILON);

        // a minimised window must not poison the ratio
        uniforms.update_aspect_ratio(640, 0);
        assert!((uniforms.aspect_ratio - 4.0 / 3.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_uniforms_bytes() {
        let mut uniforms = Uniforms::new([0.0, 1.0, 0.4, 1.0], 1.0);
        uniforms.update_time(2.5);
        let bytes: &[u8] = bytemuck::bytes_of(&uniforms);
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[16..20], &2.5f32.to_ne_bytes());
    }
}
