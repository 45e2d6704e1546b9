use anyhow::Result;
use image::RgbImage;
use tracing::{Level, debug, error, span, warn};

use crate::overlay::{OverlayAsset, OverlayRig, RigNames};
use crate::placement::PlacementEstimator;
use crate::render::Renderer;
use crate::tracking::{LandmarkSource, TrackerConfig};

/// Frame producer for the loop: a capture stream or a recorded sequence.
/// `None` means the stream ended and the loop should stop rescheduling.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// What one loop iteration did to the rendered overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A face was placed and the renderer updated.
    Updated,
    /// No face, or placement failed; previous visual state retained.
    Retained,
}

/// Owns the per-stream state the original kept in module-level globals:
/// config, calibration, tracker and renderer handles. One iteration per
/// frame, each inference awaited before the next is issued.
pub struct Session<S: LandmarkSource, R: Renderer> {
    config: TrackerConfig,
    estimator: PlacementEstimator,
    tracker: S,
    renderer: R,
}

impl<S: LandmarkSource, R: Renderer> Session<S, R> {
    pub fn new(
        config: TrackerConfig,
        asset: &OverlayAsset,
        names: &RigNames,
        screen_height: f32,
        mut tracker: S,
        renderer: R,
    ) -> Result<Session<S, R>> {
        config.validate()?;
        tracker.configure(&config)?;

        // One-time rig lookup and calibration, before any frame runs.
        let rig = OverlayRig::resolve(asset, names)?;
        let estimator = PlacementEstimator::new(rig.calibrate(), rig.anchor_offset(), screen_height);

        Ok(Session {
            config,
            estimator,
            tracker,
            renderer,
        })
    }

    /// Drains the frame source. Tracker, placement and renderer trouble on
    /// a single frame is logged and degrades to the previous state; only
    /// the frame source ending or erroring stops the loop, and the source
    /// is closed either way.
    pub fn run(&mut self, frames: &mut impl FrameSource) -> Result<()> {
        let result = loop {
            let img = match frames.next_frame() {
                Ok(Some(img)) => img,
                Ok(None) => {
                    debug!("Frame source ended");
                    break Ok(());
                }
                Err(e) => break Err(e),
            };

            let span = span!(Level::INFO, "frame_loop_iter");
            let _guard = span.enter();

            match self.process_frame(&img) {
                Ok(_) => {}
                Err(e) => error!("Failed to process frame: {e:?}"),
            }
        };

        frames.close()?;
        result
    }

    pub fn process_frame(&mut self, img: &RgbImage) -> Result<FrameOutcome> {
        let predictions = match self.tracker.estimate_faces(img) {
            Ok(predictions) => predictions,
            Err(e) => {
                warn!("Face tracking failed this frame: {e:?}");
                Vec::new()
            }
        };

        let outcome = match predictions.first() {
            Some(prediction) => {
                match self
                    .estimator
                    .estimate_placement(&prediction.frame, &prediction.bounds)
                {
                    Ok(placement) => {
                        self.renderer.apply_placement(&placement)?;

                        if let Some(patch) =
                            self.estimator.estimate_texture_patch(&prediction.bounds, img)
                        {
                            self.renderer.update_face_texture(&patch)?;
                        }

                        if self.config.render_pointcloud {
                            self.renderer
                                .draw_mesh_points(prediction.frame.mesh(), self.config.triangulate_mesh)?;
                        }

                        FrameOutcome::Updated
                    }
                    Err(e) => {
                        warn!("Skipping placement this frame: {e:?}");
                        FrameOutcome::Retained
                    }
                }
            }
            None => FrameOutcome::Retained,
        };

        self.renderer.present(img)?;

        Ok(outcome)
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn close(mut self) -> Result<()> {
        self.tracker.close()?;
        self.renderer.close()
    }
}
