//! A pyramid drawn from five shared vertices and an index buffer.
//!
//! Run from the repository root with `cargo run --example index_buffer`.

fn main() {
    let config_path = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/3-index_buffer/config.toml");
    if let Err(error) = pollster::block_on(learn_webgpu::run(Some(config_path))) {
        log::error!("{:#}", error);
        std::process::exit(1);
    }
}
