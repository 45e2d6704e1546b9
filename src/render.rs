use std::path::PathBuf;

use anyhow::Result;
use image::{Rgb, RgbImage};
use imageproc::drawing;
use tracing::{Level, span, trace};

use crate::placement::{FaceTexturePatch, RigidPlacement};
use crate::shapes::point::Point3;

/// Scene-graph collaborator. Owns projection and shading; the session only
/// hands it pose and texture requests. Implementations retain the last
/// applied state, which is what makes freeze-frame behavior work when a
/// face drops out.
pub trait Renderer {
    fn apply_placement(&mut self, placement: &RigidPlacement) -> Result<()>;

    fn update_face_texture(&mut self, patch: &FaceTexturePatch) -> Result<()>;

    /// Debug view of the raw mesh, already in scene space: a wireframe
    /// when `triangulate` is set, dots otherwise.
    fn draw_mesh_points(&mut self, _points: &[Point3], _triangulate: bool) -> Result<()> {
        Ok(())
    }

    /// Rasterize the current scene state over this frame.
    fn present(&mut self, frame: &RgbImage) -> Result<()>;

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

const OVERLAY_COLOR: Rgb<u8> = Rgb([50, 238, 219]);
const MESH_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// CPU stand-in for the 3D engine: composites the face patch and overlay
/// markers straight onto the frame. Used by the offline demo and tests.
pub struct SoftwareRenderer {
    screen_height: f32,
    output_dir: Option<PathBuf>,
    placement: Option<RigidPlacement>,
    patch: Option<FaceTexturePatch>,
    mesh: Vec<Point3>,
    wireframe: bool,
    frame_idx: u32,
    last_composite: Option<RgbImage>,
}

impl SoftwareRenderer {
    pub fn new(screen_height: f32, output_dir: Option<PathBuf>) -> SoftwareRenderer {
        SoftwareRenderer {
            screen_height,
            output_dir,
            placement: None,
            patch: None,
            mesh: Vec::new(),
            wireframe: false,
            frame_idx: 0,
            last_composite: None,
        }
    }

    pub fn placement(&self) -> Option<&RigidPlacement> {
        self.placement.as_ref()
    }

    pub fn last_composite(&self) -> Option<&RgbImage> {
        self.last_composite.as_ref()
    }

    fn screen_y(&self, scene_y: f32) -> f32 {
        self.screen_height - scene_y
    }
}

impl Renderer for SoftwareRenderer {
    fn apply_placement(&mut self, placement: &RigidPlacement) -> Result<()> {
        self.placement = Some(*placement);
        Ok(())
    }

    fn update_face_texture(&mut self, patch: &FaceTexturePatch) -> Result<()> {
        self.patch = Some(patch.clone());
        Ok(())
    }

    fn draw_mesh_points(&mut self, points: &[Point3], triangulate: bool) -> Result<()> {
        self.mesh = points.to_vec();
        self.wireframe = triangulate;
        Ok(())
    }

    fn present(&mut self, frame: &RgbImage) -> Result<()> {
        let span = span!(Level::DEBUG, "software_present");
        let _guard = span.enter();

        let mut canvas = frame.clone();

        if let Some(patch) = &self.patch {
            let left = (patch.center.x - patch.w / 2.).round() as i64;
            let top = (self.screen_y(patch.center.y) - patch.h / 2.).round() as i64;
            image::imageops::overlay(&mut canvas, &patch.pixels, left, top);
        }

        if let Some(placement) = &self.placement {
            let px = placement.position.x.round() as i32;
            let py = self.screen_y(placement.position.y).round() as i32;
            let radius = (10. * placement.scale).round().max(1.) as i32;
            drawing::draw_hollow_circle_mut(&mut canvas, (px, py), radius, OVERLAY_COLOR);

            let gx = placement.look_at.x.round() as i32;
            let gy = self.screen_y(placement.look_at.y).round() as i32;
            drawing::draw_line_segment_mut(
                &mut canvas,
                (px as f32, py as f32),
                (gx as f32, gy as f32),
                OVERLAY_COLOR,
            );
        }

        if self.wireframe {
            for pair in self.mesh.windows(2) {
                drawing::draw_line_segment_mut(
                    &mut canvas,
                    (pair[0].x, self.screen_y(pair[0].y)),
                    (pair[1].x, self.screen_y(pair[1].y)),
                    MESH_COLOR,
                );
            }
        } else {
            for p in &self.mesh {
                let x = p.x.round() as i32;
                let y = self.screen_y(p.y).round() as i32;
                drawing::draw_filled_circle_mut(&mut canvas, (x, y), 1, MESH_COLOR);
            }
        }

        if let Some(dir) = &self.output_dir {
            let path = dir.join(format!("frame_{:04}.png", self.frame_idx));
            canvas.save(&path)?;
            trace!("Rendered frame at {path:?}");
        }

        self.frame_idx += 1;
        self.last_composite = Some(canvas);

        Ok(())
    }
}
