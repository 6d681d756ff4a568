mod buffer;
mod gpu;


pub use buffer::{
    ascending_bytes, read_buffer, BindGroupDescriptor, BindingResourceTemplate, BufferInitDescriptor, BufferType,
};
pub use gpu::{
    choose_present_mode, headless_device_or_skip, inspect_adapter, inspect_device, preferred_format,
    request_headless_device, setup_gpu, Gpu,
};
