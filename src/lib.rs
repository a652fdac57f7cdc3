pub mod app;
pub mod asset;
pub mod error;
pub mod input;
pub mod renderer;
pub mod scene;
pub mod settings;

use app::App;
use error::Error;
use settings::RenderSettings;
use winit::event_loop::EventLoop;

fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}

pub fn run() -> Result<(), Error> {
    init_logging();

    // Bad settings are fatal before the frame loop ever starts.
    let settings = RenderSettings::load()?;
    log::info!("Starting with {settings:?}");

    let event_loop =
        EventLoop::new().map_err(|err| Error::Init(format!("event loop: {err}")))?;
    let mut app = App::new(settings);

    event_loop
        .run_app(&mut app)
        .map_err(|err| Error::Init(format!("event loop: {err}")))?;

    log::info!("Application shutdown complete");
    Ok(())
}
