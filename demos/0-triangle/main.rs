//! A triangle whose corners are hard coded in the shader, drawn over a red clear color.
//!
//! Run from the repository root with `cargo run --example triangle`.

fn main() {
    let config_path = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/0-triangle/config.toml");
    if let Err(error) = pollster::block_on(learn_webgpu::run(Some(config_path))) {
        log::error!("{:#}", error);
        std::process::exit(1);
    }
}
