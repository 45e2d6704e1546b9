#![warn(unused_extern_crates)]

use std::fs;
use std::path::PathBuf;

use anyhow::{Error, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use maskcam::overlay::{OverlayAsset, RigNames};
use maskcam::render::SoftwareRenderer;
use maskcam::replay::{ImageSequenceSource, ReplaySource, StillSource, load_asset};
use maskcam::session::{FrameSource, Session};
use maskcam::tracking::{Backend, TrackerConfig};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct CmdArgs {
    /// Recorded landmark track to replay (JSON)
    #[arg(short, long, value_name = "FILE")]
    track: PathBuf,

    /// Overlay asset descriptor (JSON)
    #[arg(short, long, value_name = "FILE")]
    asset: PathBuf,

    /// Still image replayed as the video frame for every track entry
    #[arg(short, long, conflicts_with = "frames")]
    image: Option<PathBuf>,

    /// Directory of frames played in lexicographic order
    #[arg(short, long)]
    frames: Option<PathBuf>,

    /// Directory to write composited frames to
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Max simultaneous face detections
    #[arg(long, default_value = "1")]
    max_faces: u32,

    /// Draw the raw mesh point cloud over the composite
    #[arg(long)]
    render_pointcloud: bool,

    /// Debug mesh as a wireframe rather than dots
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    triangulate_mesh: bool,

    /// Inference backend requested from the landmark source
    #[arg(long, value_enum, default_value = "wasm")]
    backend: Backend,
}

fn main() -> Result<()> {
    let filter = EnvFilter::from_default_env();
    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_env_filter(filter)
        .init();

    let args = CmdArgs::parse();

    let config = TrackerConfig {
        max_faces: args.max_faces,
        render_pointcloud: args.render_pointcloud,
        triangulate_mesh: args.triangulate_mesh,
        backend: args.backend,
    };

    let tracker = ReplaySource::from_path(&args.track)?;
    let asset = load_asset(&args.asset)?;

    if let Some(dir) = &args.output {
        fs::create_dir_all(dir)?;
    }

    match (args.image, args.frames) {
        (Some(path), None) => {
            let img = image::open(&path)?.into_rgb8();
            let screen_height = img.height() as f32;
            let mut frames = StillSource::new(img, tracker.len());

            run_session(
                config,
                &asset,
                screen_height,
                tracker,
                &mut frames,
                args.output,
            )
        }
        (None, Some(dir)) => {
            let mut frames = ImageSequenceSource::from_dir(&dir)?;
            let screen_height = frames.dimensions()?.1 as f32;

            run_session(
                config,
                &asset,
                screen_height,
                tracker,
                &mut frames,
                args.output,
            )
        }
        _ => Err(Error::msg("Specify an --image or a --frames directory")),
    }
}

fn run_session(
    config: TrackerConfig,
    asset: &OverlayAsset,
    screen_height: f32,
    tracker: ReplaySource,
    frames: &mut impl FrameSource,
    output: Option<PathBuf>,
) -> Result<()> {
    let renderer = SoftwareRenderer::new(screen_height, output);
    let mut session = Session::new(
        config,
        asset,
        &RigNames::default(),
        screen_height,
        tracker,
        renderer,
    )?;

    session.run(frames)?;
    session.close()
}
