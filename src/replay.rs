use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Error, Result};
use image::RgbImage;
use serde::Deserialize;
use tracing::debug;

use crate::overlay::{AssetNode, Extents, OverlayAsset};
use crate::session::FrameSource;
use crate::shapes::point::Point2;
use crate::shapes::rect::BoundingBox;
use crate::tracking::{FacePrediction, LandmarkFrame, LandmarkSource, MESH_POINTS, TrackerConfig};

/// A landmark track recorded from the live model, replayed in place of
/// camera + inference.
#[derive(Debug, Deserialize)]
pub struct RecordedTrack {
    pub frames: Vec<RecordedFrame>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordedFrame {
    #[serde(default)]
    pub faces: Vec<RecordedFace>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedFace {
    pub scaled_mesh: Vec<[f32; 3]>,
    pub bounding_box: RecordedBox,
    pub annotations: HashMap<String, Vec<[f32; 3]>>,
}

/// The model wraps each corner in a one-element list around the `[x, y]`
/// pair. Quirky but stable, so the wire type mirrors it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedBox {
    pub top_left: Vec<[f32; 2]>,
    pub bottom_right: Vec<[f32; 2]>,
}

impl RecordedBox {
    fn to_bounds(&self) -> Result<BoundingBox> {
        Ok(BoundingBox::new(
            corner(&self.top_left, "topLeft")?,
            corner(&self.bottom_right, "bottomRight")?,
        ))
    }
}

fn corner(wrapped: &[[f32; 2]], name: &str) -> Result<Point2> {
    match wrapped.first() {
        Some(pair) => Ok((*pair).into()),
        None => Err(Error::msg(format!("bounding box corner {name} is empty"))),
    }
}

impl RecordedFace {
    fn to_prediction(&self) -> Result<FacePrediction> {
        if self.scaled_mesh.len() != MESH_POINTS {
            debug!(
                "recorded mesh has {} points, model delivers {MESH_POINTS}",
                self.scaled_mesh.len()
            );
        }

        let mesh: Vec<_> = self.scaled_mesh.iter().map(|p| (*p).into()).collect();
        let annotations = self
            .annotations
            .iter()
            .map(|(name, points)| {
                let points = points.iter().map(|p| (*p).into()).collect();
                (name.clone(), points)
            })
            .collect();

        Ok(FacePrediction {
            frame: LandmarkFrame::new(mesh, annotations),
            bounds: self.bounding_box.to_bounds()?,
        })
    }
}

/// LandmarkSource over a recorded track. Frames past the end of the track
/// report no detections.
pub struct ReplaySource {
    frames: Vec<RecordedFrame>,
    idx: usize,
    max_faces: usize,
}

impl ReplaySource {
    pub fn from_path(path: impl AsRef<Path>) -> Result<ReplaySource> {
        let raw = fs::read_to_string(path.as_ref())
            .with_context(|| format!("reading track {:?}", path.as_ref()))?;
        let track: RecordedTrack = serde_json::from_str(&raw)?;

        debug!("Loaded track with {} frames", track.frames.len());

        Ok(ReplaySource {
            frames: track.frames,
            idx: 0,
            max_faces: 1,
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl LandmarkSource for ReplaySource {
    fn configure(&mut self, config: &TrackerConfig) -> Result<()> {
        self.max_faces = config.max_faces as usize;
        Ok(())
    }

    fn estimate_faces(&mut self, _img: &RgbImage) -> Result<Vec<FacePrediction>> {
        let recorded = self.frames.get(self.idx).cloned().unwrap_or_default();
        self.idx += 1;

        recorded
            .faces
            .iter()
            .take(self.max_faces)
            .map(|f| f.to_prediction())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct NodeDescriptor {
    name: String,
    position: [f32; 3],
    extents: Option<ExtentsDescriptor>,
}

#[derive(Debug, Deserialize)]
struct ExtentsDescriptor {
    min: [f32; 3],
    max: [f32; 3],
}

/// Loads the overlay asset descriptor: node names, rest-pose positions and
/// geometry extents exported from the 3D asset.
pub fn load_asset(path: impl AsRef<Path>) -> Result<OverlayAsset> {
    let raw = fs::read_to_string(path.as_ref())
        .with_context(|| format!("reading asset {:?}", path.as_ref()))?;
    let nodes: Vec<NodeDescriptor> = serde_json::from_str(&raw)?;

    Ok(OverlayAsset {
        nodes: nodes
            .into_iter()
            .map(|n| AssetNode {
                name: n.name,
                position: n.position.into(),
                extents: n.extents.map(|e| Extents {
                    min: e.min.into(),
                    max: e.max.into(),
                }),
            })
            .collect(),
    })
}

/// Repeats a single still image for every frame of the replay.
pub struct StillSource {
    img: RgbImage,
    remaining: usize,
}

impl StillSource {
    pub fn new(img: RgbImage, frames: usize) -> StillSource {
        StillSource {
            img,
            remaining: frames,
        }
    }

    pub fn from_path(path: impl AsRef<Path>, frames: usize) -> Result<StillSource> {
        let img = image::open(path.as_ref())
            .with_context(|| format!("reading image {:?}", path.as_ref()))?
            .into_rgb8();
        Ok(StillSource::new(img, frames))
    }
}

impl FrameSource for StillSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        Ok(Some(self.img.clone()))
    }
}

/// Plays the images of a directory in lexicographic order.
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    idx: usize,
}

impl ImageSequenceSource {
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<ImageSequenceSource> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir.as_ref())?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect();
        paths.sort();

        Ok(ImageSequenceSource { paths, idx: 0 })
    }

    /// Dimensions of the first frame, for sizing the scene before the loop
    /// starts.
    pub fn dimensions(&self) -> Result<(u32, u32)> {
        let Some(path) = self.paths.first() else {
            return Err(Error::msg("frame directory is empty"));
        };

        let (w, h) = image::image_dimensions(path)?;
        Ok((w, h))
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        let Some(path) = self.paths.get(self.idx) else {
            return Ok(None);
        };
        self.idx += 1;

        let img = image::open(path)
            .with_context(|| format!("reading frame {path:?}"))?
            .into_rgb8();
        Ok(Some(img))
    }
}
