use learn_webgpu::run;

/// Entry point for the application.
///
/// Takes an optional config file path as the first argument and blocks until the window is closed.
fn main() {
    let config_path = std::env::args().nth(1);
    if let Err(error) = pollster::block_on(run(config_path.as_deref())) {
        log::error!("{:#}", error);
        std::process::exit(1);
    }
}
