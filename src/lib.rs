pub mod asset;
pub mod io;
pub mod renderer;
pub mod scene;
pub mod settings;

pub use renderer::{OffscreenTarget, RenderContext, Renderer, RendererError, RendererStats};
pub use scene::{Camera, Scene};
pub use settings::RenderSettings;

/// Installs `env_logger` at Info level unless `RUST_LOG` says otherwise.
/// Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();
}
