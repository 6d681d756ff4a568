//! Spins the geometry using the elapsed time from a uniform buffer. Resize the window to see the aspect ratio follow.
//!
//! Run from the repository root with `cargo run --example uniform_buffer`.

fn main() {
    let config_path = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/4-uniform_buffer/config.toml");
    if let Err(error) = pollster::block_on(learn_webgpu::run(Some(config_path))) {
        log::error!("{:#}", error);
        std::process::exit(1);
    }
}
