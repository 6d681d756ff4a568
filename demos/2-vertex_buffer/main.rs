//! Geometry from a text file, resolved into a plain vertex buffer.
//!
//! Run from the repository root with `cargo run --example vertex_buffer`.

fn main() {
    let config_path = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/2-vertex_buffer/config.toml");
    if let Err(error) = pollster::block_on(learn_webgpu::run(Some(config_path))) {
        log::error!("{:#}", error);
        std::process::exit(1);
    }
}
