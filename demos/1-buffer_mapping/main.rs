//! Writes 16 bytes into a gpu buffer, copies them into a mappable one and reads them back
//! before the first frame. The bytes are logged at `info`.
//!
//! Run from the repository root with `cargo run --example buffer_mapping`.

fn main() {
    let config_path = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/1-buffer_mapping/config.toml");
    if let Err(error) = pollster::block_on(learn_webgpu::run(Some(config_path))) {
        log::error!("{:#}", error);
        std::process::exit(1);
    }
}
