use std::sync::Arc;

use anyhow::Result;
use winit::{
    event::*,
    keyboard::{Key, ModifiersState, NamedKey},
    window::Window,
};

use scene::{Config, Lesson, Uniforms};
use wgpu_utils::setup_gpu;

use crate::helper::{
    create_uniform_buffer, playing_with_buffers, setup_draw_call, setup_pipeline, DrawCall, UniformBinding,
};

pub struct State {
    pub window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,
    clear_color: wgpu::Color,
    render_pipeline: wgpu::RenderPipeline,
    draw_call: DrawCall,
    uniforms: Option<UniformBinding>,
    modifiers: ModifiersState,
}

impl State {
    /// Constructs a new `State` instance for the lesson named in `user_config`.
    ///
    /// This brings up the gpu for `window`, then builds what the lesson needs on top of it:
    /// the buffer round trip for the buffer mapping lesson, the vertex and index buffers for the
    /// geometry lessons, and the uniform buffer and its bind group for the last two.
    ///
    /// # Errors
    ///
    /// Fails if the gpu can't be set up, if the buffer round trip comes back wrong, or if the
    /// shader or geometry file can't be loaded.
    pub async fn new(window: Arc<Window>, user_config: &Config) -> Result<Self> {
        //---------Setup Hardware---------
        let render = &user_config.render;
        let gpu = setup_gpu(window.clone(), render.present_mode.to_wgpu()).await?;
        log::info!("Hardware initialized on {} ({:?})", gpu.adapter_info.name, gpu.adapter_info.backend);

        if render.lesson == Lesson::BufferMapping {
            playing_with_buffers(&gpu.device, &gpu.queue)?;
        }

        //-----------Geometry------------
        let draw_call = setup_draw_call(&gpu.device, render)?;

        //-----------Uniforms------------
        let uniforms = Uniforms::new(user_config.uniform_color, aspect_ratio(gpu.size));
        let uniform_buffer = render.lesson.uses_uniforms().then(|| create_uniform_buffer(&gpu.device, &uniforms));

        //-----------Pipeline------------
        let (render_pipeline, bind_group) =
            setup_pipeline(&gpu.device, render, gpu.config.format, uniform_buffer.as_ref())?;
        let uniforms = uniform_buffer.zip(bind_group).map(|(buffer, bind_group)| UniformBinding {
            uniforms,
            buffer,
            bind_group,
        });
        log::info!("Lesson {:?} ready", render.lesson);

        Ok(Self {
            window,
            surface: gpu.surface,
            device: gpu.device,
            queue: gpu.queue,
            config: gpu.config,
            size: gpu.size,
            clear_color: render.clear_color(),
            render_pipeline,
            draw_call,
            uniforms,
            modifiers: ModifiersState::empty(),
        })
    }

    /// Reconfigures the surface for the new window size. Zero sized windows (minimised) are ignored.
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);

            if let Some(binding) = &mut self.uniforms {
                binding.uniforms.update_aspect_ratio(new_size.width, new_size.height);
                self.queue.write_buffer(&binding.buffer, 0, bytemuck::cast_slice(&[binding.uniforms]));
            }
        }
    }

    /// Handles the window events the state cares about. Returns whether the event was consumed.
    pub fn input(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
                true
            }
            _ => false,
        }
    }

    /// Whether `event` asks to close the window.
    pub fn should_close(&self, event: &KeyEvent) -> bool {
        event.state == ElementState::Pressed && is_close_shortcut(&event.logical_key, self.modifiers)
    }

    /// Writes the time since start-up into the uniform buffer.
    pub fn update(&mut self, elapsed: std::time::Duration) {
        if let Some(binding) = &mut self.uniforms {
            binding.uniforms.update_time(elapsed.as_secs_f32());
            // only the time changes from frame to frame
            self.queue.write_buffer(
                &binding.buffer,
                std::mem::offset_of!(Uniforms, time) as wgpu::BufferAddress,
                bytemuck::bytes_of(&binding.uniforms.time),
            );
        }
    }

    /// Renders one frame: clears the surface and draws the lesson's geometry on top.
    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        // Get the current output texture from the surface
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            if let Some(binding) = &self.uniforms {
                render_pass.set_bind_group(0, &binding.bind_group, &[]);
            }
            self.draw_call.draw(&mut render_pass);
        }

        log::debug!("Submitting command...");
        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn aspect_ratio(size: winit::dpi::PhysicalSize<u32>) -> f32 {
    if size.height == 0 {
        1.0
    } else {
        size.width as f32 / size.height as f32
    }
}

/// Escape, or Cmd/Super + W or Q.
pub fn is_close_shortcut(key: &Key, modifiers: ModifiersState) -> bool {
    match key {
        Key::Named(NamedKey::Escape) => true,
        Key::Character(c) if modifiers.super_key() => c.eq_ignore_ascii_case("w") || c.eq_ignore_ascii_case("q"),
        _ => false,
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_closes() {
        assert!(is_close_shortcut(&Key::Named(NamedKey::Escape), ModifiersState::empty()));
        assert!(is_close_shortcut(&Key::Named(NamedKey::Escape), ModifiersState::SHIFT));
    }

    #[test]
    fn test_super_w_and_q_close() {
        assert!(is_close_shortcut(&Key::Character("w".into()), ModifiersState::SUPER));
        assert!(is_close_shortcut(&Key::Character("Q".into()), ModifiersState::SUPER | ModifiersState::SHIFT));
    }

    #[test]
    fn test_plain_keys_do_not_close() {
        assert!(!is_close_shortcut(&Key::Character("w".into()), ModifiersState::empty()));
        assert!(!is_close_shortcut(&Key::Character("q".into()), ModifiersState::CONTROL));
        assert!(!is_close_shortcut(&Key::Character("e".into()), ModifiersState::SUPER));
        assert!(!is_close_shortcut(&Key::Named(NamedKey::Enter), ModifiersState::SUPER));
    }

    #[test]
    fn test_aspect_ratio() {
        assert_eq!(aspect_ratio(winit::dpi::PhysicalSize::new(640, 480)), 640.0 / 480.0);
        assert_eq!(aspect_ratio(winit::dpi::PhysicalSize::new(640, 0)), 1.0);
    }
}
