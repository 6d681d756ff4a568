use std::num::NonZeroU64;

use anyhow::{ensure, Context, Result};
use bytemuck::Pod;
use wgpu::util::DeviceExt;

/// A struct representing the initial descriptor for a buffer.
///
/// This struct is used to create a new buffer with specified label and usage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferInitDescriptor<'a> {
    /// Debug label of a buffer. This will show up in graphics debuggers for easy identification.
    pub label: wgpu::Label<'a>,
    /// Usages of a buffer. If the buffer is used in any way that isn't specified here, the operation
    /// will panic.
    pub usage: wgpu::BufferUsages,
}

impl<'a> BufferInitDescriptor<'a> {
    pub fn new(label: wgpu::Label<'a>, usage: wgpu::BufferUsages) -> Self {
        Self { label, usage }
    }

    /// Creates a buffer holding `data`.
    ///
    /// The contents are padded to the copy alignment by wgpu, so odd sized index data is fine.
    pub fn create_new_buffer<T: Pod>(&self, device: &wgpu::Device, data: &[T]) -> wgpu::Buffer {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: self.label,
            contents: bytemuck::cast_slice(data),
            usage: self.usage,
        })
    }
}

impl<'a> Default for BufferInitDescriptor<'a> {
    fn default() -> Self {
        Self {
            label: Some("Default BufferInitDescriptor"),
            usage: wgpu::BufferUsages::COPY_DST,
        }
    }
}


/// The kind of buffer bound at one slot of a bind group.
/// This shortens the amount of code needed to create a bind group layout and bind group.
#[derive(Clone, Debug)]
pub enum BindingResourceTemplate<'a> {
    BufferStorage(wgpu::BindingResource<'a>),
    BufferUniform(wgpu::BindingResource<'a>),
}

impl<'a> BindingResourceTemplate<'a> {
    fn resource(&self) -> wgpu::BindingResource<'a> {
        match self {
            BindingResourceTemplate::BufferStorage(resource) => resource.clone(),
            BindingResourceTemplate::BufferUniform(resource) => resource.clone(),
        }
    }

    fn buffer_binding_type(&self) -> wgpu::BufferBindingType {
        match self {
            BindingResourceTemplate::BufferStorage(_) => wgpu::BufferBindingType::Storage { read_only: true },
            BindingResourceTemplate::BufferUniform(_) => wgpu::BufferBindingType::Uniform,
        }
    }
}

/// One binding of a bind group: what is bound and, optionally, the smallest size the shader accepts.
///
/// Giving the size lets the device validate it once at bind group creation instead of at every draw.
pub struct BufferType<'a> {
    ty: BindingResourceTemplate<'a>,
    min_binding_size: Option<NonZeroU64>,
}

impl<'a> BufferType<'a> {
    pub fn new(ty: BindingResourceTemplate<'a>) -> Self {
        Self { ty, min_binding_size: None }
    }

    pub fn with_min_binding_size(ty: BindingResourceTemplate<'a>, size: u64) -> Self {
        Self { ty, min_binding_size: NonZeroU64::new(size) }
    }
}

/// A struct representing a descriptor for a bind group.
/// This struct can be used to create a bind group and its layout.
///
/// Bindings are numbered in the order they are listed, starting at 0.
pub struct BindGroupDescriptor<'a> {
    pub label: wgpu::Label<'a>,
    pub vis: wgpu::ShaderStages,
    pub bindings: Vec<BufferType<'a>>,
}

impl<'a> BindGroupDescriptor<'a> {
    pub fn new(label: wgpu::Label<'a>, vis: wgpu::ShaderStages, bindings: Vec<BufferType<'a>>) -> Self {
        Self { label, vis, bindings }
    }

    /// The layout entries that describe the bindings.
    pub fn layout_entries(&self) -> Vec<wgpu::BindGroupLayoutEntry> {
        self.bindings
            .iter()
            .enumerate()
            .map(|(index, binding)| wgpu::BindGroupLayoutEntry {
                binding: index as u32,
                visibility: self.vis,
                ty: wgpu::BindingType::Buffer {
                    ty: binding.ty.buffer_binding_type(),
                    has_dynamic_offset: false,
                    min_binding_size: binding.min_binding_size,
                },
                count: None,
            })
            .collect()
    }

    /// A method to generate the bind group layout.
    pub fn generate_bind_group_layout(&self, device: &wgpu::Device) -> wgpu::BindGroupLayout {
        //append _bind_group_layout if label is Some
        let mod_label = self.label.map(|label| format!("{}_bind_group_layout", label));

        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: mod_label.as_deref(),
            entries: &self.layout_entries(),
        })
    }

    /// A method to generate a bind group matching `layout`.
    ///
    /// `layout` is usually the result of [`Self::generate_bind_group_layout`], or the layout a pipeline
    /// derived from its shader.
    pub fn generate_bind_group(&self, device: &wgpu::Device, layout: &wgpu::BindGroupLayout) -> wgpu::BindGroup {
        let entries = self
            .bindings
            .iter()
            .enumerate()
            .map(|(index, binding)| wgpu::BindGroupEntry {
                binding: index as u32,
                resource: binding.ty.resource(),
            })
            .collect::<Vec<_>>();

        //append _bind_group if label is Some
        let mod_label = self.label.map(|label| format!("{}_bind_group", label));

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: mod_label.as_deref(),
            layout,
            entries: &entries,
        })
    }
}


/// `0, 1, 2, ..` as bytes, wrapping after 255.
pub fn ascending_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| i as u8).collect()
}

/// Copies the first `size` bytes of `source` back to the cpu.
///
/// The data goes through a `MAP_READ` staging buffer. After the copy is submitted the staging buffer
/// is mapped asynchronously and the device is polled until the map callback has reported back.
/// `source` needs `COPY_SRC` usage and `size` has to be a multiple of [`wgpu::COPY_BUFFER_ALIGNMENT`].
pub fn read_buffer(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    source: &wgpu::Buffer,
    size: wgpu::BufferAddress,
) -> Result<Vec<u8>> {
    ensure!(
        size % wgpu::COPY_BUFFER_ALIGNMENT == 0,
        "Buffer read size {} is not a multiple of {}",
        size,
        wgpu::COPY_BUFFER_ALIGNMENT
    );
    ensure!(size <= source.size(), "Buffer read size {} exceeds buffer size {}", size, source.size());

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Output buffer"),
        size,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Read Back Encoder"),
    });
    encoder.copy_buffer_to_buffer(source, 0, &staging, 0, size);
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (sender, receiver) = crossbeam_channel::bounded(1);
    slice.map_async(wgpu::MapMode::Read, move |status| {
        log::debug!("Buffer mapped with status {:?}", status);
        // The receiver is only gone if the caller stopped waiting
        let _ = sender.send(status);
    });

    // The callback only fires while the device is polled
    device.poll(wgpu::Maintain::Wait);
    let status = receiver
        .recv()
        .context("Buffer map callback was dropped without reporting")?;
    status.context("Could not map buffer for reading")?;

    let data = slice.get_mapped_range().to_vec();
    staging.unmap();
    Ok(data)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless_device_or_skip;

    #[test]
    fn test_ascending_bytes() {
        assert_eq!(ascending_bytes(4), vec![0, 1, 2, 3]);
        assert_eq!(ascending_bytes(0), Vec::<u8>::new());
        assert_eq!(ascending_bytes(300)[256], 0);
    }

    #[test]
    fn test_default_descriptor() {
        let descriptor = BufferInitDescriptor::default();
        assert_eq!(descriptor.usage, wgpu::BufferUsages::COPY_DST);
        assert_eq!(descriptor.label, Some("Default BufferInitDescriptor"));
    }

    #[test]
    fn test_read_buffer_round_trip() {
        let Some((_adapter, device, queue)) = headless_device_or_skip() else { return };

        let data = ascending_bytes(16);
        let descriptor = BufferInitDescriptor::new(
            Some("Some GPU-side data buffer"),
            wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC,
        );
        let buffer = descriptor.create_new_buffer(&device, &data);

        let read_back = read_buffer(&device, &queue, &buffer, 16).expect("Could not read buffer");
        assert_eq!(read_back, data);
    }

    #[test]
    fn test_read_buffer_after_queue_write() {
        let Some((_adapter, device, queue)) = headless_device_or_skip() else { return };

        let usage = wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC;
        let buffer = BufferInitDescriptor::new(Some("Written buffer"), usage)
            .create_new_buffer(&device, &[0u32; 4]);
        queue.write_buffer(&buffer, 4, bytemuck::cast_slice(&[7u32, 9u32]));

        let read_back = read_buffer(&device, &queue, &buffer, 16).expect("Could not read buffer");
        let values: &[u32] = bytemuck::cast_slice(&read_back);
        assert_eq!(values, &[0, 7, 9, 0]);
    }

    #[test]
    fn test_read_buffer_repeatedly() {
        let Some((_adapter, device, queue)) = headless_device_or_skip() else { return };

        let buffer = BufferInitDescriptor::new(
            Some("Repeated read buffer"),
            wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC,
        )
        .create_new_buffer(&device, &ascending_bytes(8));

        // every read maps its own staging buffer and waits for its own callback
        for round in 0..3u8 {
            queue.write_buffer(&buffer, 0, &[round; 4]);
            let read_back = read_buffer(&device, &queue, &buffer, 8).expect("Could not read buffer");
            assert_eq!(read_back, vec![round, round, round, round, 4, 5, 6, 7]);
        }
    }

    #[test]
    fn test_read_buffer_rejects_bad_sizes() {
        let Some((_adapter, device, queue)) = headless_device_or_skip() else { return };

        let buffer = BufferInitDescriptor::new(Some("Small buffer"), wgpu::BufferUsages::COPY_SRC)
            .create_new_buffer(&device, &[0u8; 8]);
        assert!(read_buffer(&device, &queue, &buffer, 6).is_err());
        assert!(read_buffer(&device, &queue, &buffer, 12).is_err());
    }

    #[test]
    fn test_layout_entries() {
        let Some((_adapter, device, _queue)) = headless_device_or_skip() else { return };

        let uniform = BufferInitDescriptor::new(Some("Uniform"), wgpu::BufferUsages::UNIFORM)
            .create_new_buffer(&device, &[0f32; 8]);
        let storage = BufferInitDescriptor::new(Some("Storage"), wgpu::BufferUsages::STORAGE)
            .create_new_buffer(&device, &[0f32; 4]);
        let descriptor = BindGroupDescriptor::new(
            Some("test"),
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            vec![
                BufferType::with_min_binding_size(
                    BindingResourceTemplate::BufferUniform(uniform.as_entire_binding()),
                    32,
                ),
                BufferType::new(BindingResourceTemplate::BufferStorage(storage.as_entire_binding())),
            ],
        );

        let entries = descriptor.layout_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].binding, 0);
        assert_eq!(entries[1].binding, 1);
        assert_eq!(entries[0].visibility, wgpu::ShaderStages::VERTEX_FRAGMENT);
        assert_eq!(
            entries[0].ty,
            wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: NonZeroU64::new(32),
            }
        );
        assert!(matches!(
            entries[1].ty,
            wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                min_binding_size: None,
                ..
            }
        ));

        let layout = descriptor.generate_bind_group_layout(&device);
        let _bind_group = descriptor.generate_bind_group(&device, &layout);
    }
}
