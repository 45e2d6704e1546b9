use std::collections::HashMap;

use anyhow::Result;
use clap::ValueEnum;
use image::RgbImage;

use crate::error::Error;
use crate::shapes::point::Point3;
use crate::shapes::rect::BoundingBox;

/// Fixed cardinality of the face mesh delivered by the landmark model.
pub const MESH_POINTS: usize = 468;

pub const LEFT_EYE_UPPER: &str = "leftEyeUpper0";
pub const RIGHT_EYE_UPPER: &str = "rightEyeUpper0";
pub const NOSE_TIP: &str = "noseTip";

/// One frame's worth of tracked landmarks. Immutable once produced;
/// discarded after the frame completes, so placement carries no history.
#[derive(Debug, Clone)]
pub struct LandmarkFrame {
    scaled_mesh: Vec<Point3>,
    annotations: HashMap<String, Vec<Point3>>,
}

impl LandmarkFrame {
    pub fn new(scaled_mesh: Vec<Point3>, annotations: HashMap<String, Vec<Point3>>) -> Self {
        Self {
            scaled_mesh,
            annotations,
        }
    }

    pub fn mesh(&self) -> &[Point3] {
        &self.scaled_mesh
    }

    pub fn annotation(&self, name: &'static str) -> Result<&[Point3], Error> {
        match self.annotations.get(name) {
            Some(points) => Ok(points),
            None => Err(Error::MissingAnnotation(name)),
        }
    }

    /// First point of a named annotation, the anchor convention used
    /// throughout placement.
    pub fn anchor(&self, name: &'static str) -> Result<Point3, Error> {
        self.annotation(name)?
            .first()
            .copied()
            .ok_or(Error::EmptyAnnotation(name))
    }
}

#[derive(Debug, Clone)]
pub struct FacePrediction {
    pub frame: LandmarkFrame,
    pub bounds: BoundingBox,
}

/// Inference backend of the landmark model. Opaque to the placement core;
/// passed through to the landmark source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    Wasm,
    Webgl,
    Cpu,
}

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub max_faces: u32,
    pub triangulate_mesh: bool,
    pub render_pointcloud: bool,
    pub backend: Backend,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_faces: 1,
            triangulate_mesh: true,
            render_pointcloud: false,
            backend: Backend::Wasm,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_faces < 1 {
            return Err(anyhow::Error::msg("max_faces must be at least 1"));
        }

        Ok(())
    }
}

/// Per-frame face landmark inference. The model behind it is a black box;
/// implementations may be an on-device network or a recorded track.
pub trait LandmarkSource {
    fn configure(&mut self, _config: &TrackerConfig) -> Result<()> {
        Ok(())
    }

    /// Zero detections means no face this frame, not an error.
    fn estimate_faces(&mut self, img: &RgbImage) -> Result<Vec<FacePrediction>>;

    /// Release model resources on session teardown.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
