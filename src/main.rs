mod demo_scenes;

use std::path::PathBuf;
use std::process::ExitCode;

use demo_scenes::DemoScene;
use umbra::{OffscreenTarget, RenderContext, RenderSettings, Renderer};

const SETTINGS_FILE: &str = "umbra.json";
const SHADER_DIR: &str = "shaders";

/// Usage: `umbra [sun|shadows] [output.png]`
fn main() -> ExitCode {
    umbra::init_logging();

    let mut args = std::env::args().skip(1);
    let scene_name = args.next().unwrap_or_else(|| "shadows".to_string());
    let output = PathBuf::from(args.next().unwrap_or_else(|| "umbra.png".to_string()));

    let Some(demo) = DemoScene::from_name(&scene_name) else {
        log::error!("Unknown scene '{}', expected 'sun' or 'shadows'", scene_name);
        return ExitCode::FAILURE;
    };

    match run(demo, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(demo: DemoScene, output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let settings = RenderSettings::load_from_path(SETTINGS_FILE).validate();
    let (camera, scene) = demo.build(settings.viewport_aspect());

    let context = pollster::block_on(RenderContext::headless())?;
    let mut renderer = Renderer::initialize(context, &camera, &scene, SHADER_DIR, settings)?;

    let resolution = renderer.settings().resolution;
    let target = OffscreenTarget::new(
        renderer.device(),
        resolution.width,
        resolution.height,
        renderer.output_format(),
    );
    renderer.render(&camera, &scene, &target.view);
    log::info!("{:?}", renderer.last_frame_stats());

    let image = target.read(renderer.device(), renderer.queue())?;
    image.save(&output)?;
    log::info!("Wrote {:?}", output);

    renderer.release();
    Ok(())
}
