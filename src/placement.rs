use image::RgbImage;
use image::imageops;
use tracing::trace;

use crate::error::{Error, Result};
use crate::shapes::point::{Point2, Point3};
use crate::shapes::rect::BoundingBox;
use crate::tracking::{LEFT_EYE_UPPER, LandmarkFrame, NOSE_TIP, RIGHT_EYE_UPPER};

/// Ratio fitting the mask asset's proportions to the tracked face.
pub const DESIGN_SCALE: f32 = 0.75;

/// Inter-eye distance of the overlay asset's rest pose, measured once when
/// the asset loads. Normalizes the per-frame eye distance into a scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationReference {
    eye_distance: f32,
}

impl CalibrationReference {
    pub(crate) fn new(eye_distance: f32) -> CalibrationReference {
        CalibrationReference { eye_distance }
    }

    pub fn eye_distance(&self) -> f32 {
        self.eye_distance
    }
}

/// Pose request for the overlay this frame. Recomputed wholesale every
/// frame; the renderer owns it from here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidPlacement {
    pub scale: f32,
    pub position: Point3,
    pub look_at: Point3,
}

/// Rectangular crop of the current video frame plus where to composite it,
/// in scene space.
#[derive(Debug, Clone)]
pub struct FaceTexturePatch {
    pub pixels: RgbImage,
    pub center: Point2,
    pub w: f32,
    pub h: f32,
}

/// Converts one frame of landmarks into a rigid overlay pose and a face
/// texture crop. Stateless per call apart from the one-time calibration.
#[derive(Debug, Clone)]
pub struct PlacementEstimator {
    calibration: CalibrationReference,
    rest_offset: Point3,
    screen_height: f32,
}

impl PlacementEstimator {
    pub fn new(
        calibration: CalibrationReference,
        rest_offset: Point3,
        screen_height: f32,
    ) -> PlacementEstimator {
        PlacementEstimator {
            calibration,
            rest_offset,
            screen_height,
        }
    }

    pub fn estimate_placement(
        &self,
        frame: &LandmarkFrame,
        bounds: &BoundingBox,
    ) -> Result<RigidPlacement> {
        if self.calibration.eye_distance() == 0. {
            return Err(Error::DegenerateCalibration);
        }

        let l_eye = frame.anchor(LEFT_EYE_UPPER)?;
        let r_eye = frame.anchor(RIGHT_EYE_UPPER)?;

        let scale = l_eye.distance(&r_eye) / self.calibration.eye_distance() * DESIGN_SCALE;

        // The offset scales with the frame, so it can't be precomputed.
        let offset = self.rest_offset.scaled(scale);
        let position = l_eye.flip_y(self.screen_height).add(&offset);

        // Look-at target stays in world coordinates, not relative to the
        // overlay position. Bounding-box height stands in for gaze depth.
        let nose = frame.anchor(NOSE_TIP)?;
        let look_at = Point3::new(
            nose.x,
            self.screen_height - nose.y,
            nose.z + bounds.height(),
        );

        trace!("placement scale={scale} position={position:?} look_at={look_at:?}");

        Ok(RigidPlacement {
            scale,
            position,
            look_at,
        })
    }

    /// Crops the face region out of the frame buffer. Boxes overhanging the
    /// buffer are clamped; a box entirely outside it yields no patch.
    pub fn estimate_texture_patch(
        &self,
        bounds: &BoundingBox,
        src: &RgbImage,
    ) -> Option<FaceTexturePatch> {
        let clamped = bounds.clamped(src.width() as f32, src.height() as f32);
        if clamped.is_empty() {
            return None;
        }

        let left = clamped.top_left.x.floor() as u32;
        let top = clamped.top_left.y.floor() as u32;
        let w = (clamped.bottom_right.x.ceil() as u32).min(src.width()) - left;
        let h = (clamped.bottom_right.y.ceil() as u32).min(src.height()) - top;
        if w == 0 || h == 0 {
            return None;
        }

        let pixels = imageops::crop_imm(src, left, top, w, h).to_image();

        let center = clamped.center();
        Some(FaceTexturePatch {
            pixels,
            center: Point2::new(center.x, self.screen_height - center.y),
            w: clamped.width(),
            h: clamped.height(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::{LEFT_EYE_UPPER, NOSE_TIP, RIGHT_EYE_UPPER};
    use image::Rgb;
    use std::collections::HashMap;

    fn frame(l_eye: [f32; 3], r_eye: [f32; 3], nose: [f32; 3]) -> LandmarkFrame {
        let mut annotations = HashMap::new();
        annotations.insert(LEFT_EYE_UPPER.to_string(), Vec::from([l_eye.into()]));
        annotations.insert(RIGHT_EYE_UPPER.to_string(), Vec::from([r_eye.into()]));
        annotations.insert(NOSE_TIP.to_string(), Vec::from([nose.into()]));

        LandmarkFrame::new(Vec::new(), annotations)
    }

    fn bounds() -> BoundingBox {
        BoundingBox::new(Point2::new(80., 60.), Point2::new(180., 200.))
    }

    fn estimator(calibration: f32, rest_offset: Point3) -> PlacementEstimator {
        PlacementEstimator::new(CalibrationReference::new(calibration), rest_offset, 480.)
    }

    #[test]
    fn test_scale_is_normalized_eye_distance() {
        let est = estimator(40., Point3::new(0., 0., 0.));
        let frame = frame([100., 100., 0.], [140., 100., 0.], [120., 130., 0.]);

        let placement = est.estimate_placement(&frame, &bounds()).unwrap();

        // eye distance 40 over calibration 40, times the design constant
        assert_eq!(placement.scale, 0.75);
    }

    #[test]
    fn test_scale_tracks_eye_distance() {
        let est = estimator(40., Point3::new(0., 0., 0.));
        let frame = frame([100., 100., 0.], [180., 100., 0.], [140., 130., 0.]);

        let placement = est.estimate_placement(&frame, &bounds()).unwrap();

        assert_eq!(placement.scale, (80. / 40.) * DESIGN_SCALE);
    }

    #[test]
    fn test_vertical_flip_on_position() {
        let est = estimator(40., Point3::new(0., 0., 0.));
        let frame = frame([100., 100., 0.], [140., 100., 0.], [120., 130., 0.]);

        let placement = est.estimate_placement(&frame, &bounds()).unwrap();

        assert_eq!(placement.position.x, 100.);
        assert_eq!(placement.position.y, 480. - 100.);
    }

    #[test]
    fn test_rest_offset_scales_per_frame() {
        let offset = Point3::new(10., -20., 4.);
        let est = estimator(40., offset);

        // eye distance 80 -> scale 1.5
        let frame = frame([100., 100., 0.], [180., 100., 0.], [140., 130., 0.]);
        let placement = est.estimate_placement(&frame, &bounds()).unwrap();

        assert_eq!(placement.scale, 1.5);
        assert_eq!(placement.position.x, 100. + 10. * 1.5);
        assert_eq!(placement.position.y, (480. - 100.) + -20. * 1.5);
        assert_eq!(placement.position.z, 4. * 1.5);
    }

    // Pins the current gaze behavior: the target is world-space verbatim,
    // flipped vertically, with box height standing in for depth.
    #[test]
    fn test_look_at_is_world_space() {
        let est = estimator(40., Point3::new(50., 50., 50.));
        let frame = frame([100., 100., 0.], [140., 100., 0.], [120., 130., -8.]);

        let placement = est.estimate_placement(&frame, &bounds()).unwrap();

        assert_eq!(placement.look_at, Point3::new(120., 480. - 130., -8. + 140.));
    }

    #[test]
    fn test_idempotent() {
        let est = estimator(40., Point3::new(10., -20., 4.));
        let frame = frame([100., 100., 0.], [140., 100., 0.], [120., 130., 0.]);

        let a = est.estimate_placement(&frame, &bounds()).unwrap();
        let b = est.estimate_placement(&frame, &bounds()).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_calibration_is_rejected() {
        let est = estimator(0., Point3::new(0., 0., 0.));
        let frame = frame([100., 100., 0.], [140., 100., 0.], [120., 130., 0.]);

        let result = est.estimate_placement(&frame, &bounds());

        assert!(matches!(result, Err(Error::DegenerateCalibration)));
    }

    fn checkerboard(w: u32, h: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        })
    }

    #[test]
    fn test_patch_crop() {
        let est = estimator(40., Point3::new(0., 0., 0.));
        let src = checkerboard(640, 480);
        let b = BoundingBox::new(Point2::new(100., 100.), Point2::new(200., 250.));

        let patch = est.estimate_texture_patch(&b, &src).unwrap();

        assert_eq!(patch.pixels.width(), 100);
        assert_eq!(patch.pixels.height(), 150);
        assert_eq!(patch.w, 100.);
        assert_eq!(patch.h, 150.);
        assert_eq!(patch.center, Point2::new(150., 480. - 175.));
        assert_eq!(*patch.pixels.get_pixel(0, 0), *src.get_pixel(100, 100));
    }

    #[test]
    fn test_patch_clamps_overhanging_box() {
        let est = estimator(40., Point3::new(0., 0., 0.));
        let src = checkerboard(640, 480);
        let b = BoundingBox::new(Point2::new(-50., 100.), Point2::new(700., 250.));

        let patch = est.estimate_texture_patch(&b, &src).unwrap();

        assert_eq!(patch.pixels.width(), 640);
        assert!(patch.w <= b.width());
    }

    #[test]
    fn test_patch_fully_outside_box() {
        let est = estimator(40., Point3::new(0., 0., 0.));
        let src = checkerboard(640, 480);
        let b = BoundingBox::new(Point2::new(700., 500.), Point2::new(800., 600.));

        assert!(est.estimate_texture_patch(&b, &src).is_none());
    }
}
