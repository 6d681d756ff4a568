//! Moves the geometry in a circle and tints it, with one uniform buffer visible to both shader
//! stages through an explicit bind group layout.
//!
//! Run from the repository root with `cargo run --example bind_group`.

fn main() {
    let config_path = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/5-bind_group/config.toml");
    if let Err(error) = pollster::block_on(learn_webgpu::run(Some(config_path))) {
        log::error!("{:#}", error);
        std::process::exit(1);
    }
}
