use tracing::debug;

use crate::error::{Error, Result};
use crate::placement::CalibrationReference;
use crate::shapes::point::Point3;

/// Head-width scale policy divisor, tuned against the mask asset.
const HEAD_WIDTH_DIVISOR: f32 = 9.;

/// Axis-aligned extents of a node's rest-pose geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extents {
    pub min: Point3,
    pub max: Point3,
}

impl Extents {
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }
}

/// A named node of the loaded overlay asset, in rest pose.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetNode {
    pub name: String,
    pub position: Point3,
    pub extents: Option<Extents>,
}

/// The loaded overlay asset, flattened to its named nodes. Loading the
/// actual 3D file format belongs to the renderer collaborator.
#[derive(Debug, Clone)]
pub struct OverlayAsset {
    pub nodes: Vec<AssetNode>,
}

impl OverlayAsset {
    pub fn node(&self, name: &str) -> Option<&AssetNode> {
        self.nodes.iter().find(|n| n.name == name)
    }
}

/// Which asset nodes the rig binds to.
#[derive(Debug, Clone)]
pub struct RigNames {
    pub head: String,
    pub l_eye: String,
    pub r_eye: String,
    pub gaze: String,
}

impl Default for RigNames {
    fn default() -> Self {
        Self {
            head: "head".to_string(),
            l_eye: "eyeAnchor_L".to_string(),
            r_eye: "eyeAnchor_R".to_string(),
            gaze: "gazeTarget".to_string(),
        }
    }
}

/// Typed handles into the overlay asset, resolved once at load time.
/// A missing node fails here instead of surfacing as a null mid-loop.
#[derive(Debug, Clone)]
pub struct OverlayRig {
    pub head: AssetNode,
    pub l_eye: AssetNode,
    pub r_eye: AssetNode,
    pub gaze: AssetNode,
}

impl OverlayRig {
    pub fn resolve(asset: &OverlayAsset, names: &RigNames) -> Result<OverlayRig> {
        let head = required(asset, &names.head)?;
        if head.extents.is_none() {
            return Err(Error::Calibration(format!(
                "node {} has no geometry extents",
                head.name
            )));
        }

        let rig = OverlayRig {
            head,
            l_eye: required(asset, &names.l_eye)?,
            r_eye: required(asset, &names.r_eye)?,
            gaze: required(asset, &names.gaze)?,
        };

        debug!("resolved overlay rig: {rig:?}");

        Ok(rig)
    }

    /// Rest-pose inter-eye distance. Measured once per overlay instance.
    pub fn calibrate(&self) -> CalibrationReference {
        CalibrationReference::new(self.l_eye.position.distance(&self.r_eye.position))
    }

    /// Vector from the left eye anchor to the asset origin, in rest pose.
    /// Scaled per frame so the anchor lands on the tracked landmark.
    pub fn anchor_offset(&self) -> Point3 {
        self.head.position.sub(&self.l_eye.position)
    }

    /// Alternative scale policy: fit the head geometry to the detected
    /// bounding-box width.
    pub fn head_width_scale(&self, box_width: f32) -> f32 {
        let extents = self.head.extents.expect("checked at resolve");
        box_width / extents.width() / HEAD_WIDTH_DIVISOR
    }
}

fn required(asset: &OverlayAsset, name: &str) -> Result<AssetNode> {
    asset
        .node(name)
        .cloned()
        .ok_or_else(|| Error::Calibration(format!("missing node {name}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset() -> OverlayAsset {
        OverlayAsset {
            nodes: Vec::from([
                AssetNode {
                    name: "head".to_string(),
                    position: Point3::new(0., 10., 0.),
                    extents: Some(Extents {
                        min: Point3::new(-45., -60., -40.),
                        max: Point3::new(45., 60., 40.),
                    }),
                },
                AssetNode {
                    name: "eyeAnchor_L".to_string(),
                    position: Point3::new(-20., 25., 10.),
                    extents: None,
                },
                AssetNode {
                    name: "eyeAnchor_R".to_string(),
                    position: Point3::new(20., 25., 10.),
                    extents: None,
                },
                AssetNode {
                    name: "gazeTarget".to_string(),
                    position: Point3::new(0., 25., 100.),
                    extents: None,
                },
            ]),
        }
    }

    #[test]
    fn test_resolve_and_calibrate() {
        let rig = OverlayRig::resolve(&asset(), &RigNames::default()).unwrap();

        assert_eq!(rig.calibrate().eye_distance(), 40.);
        assert_eq!(rig.anchor_offset(), Point3::new(20., -15., -10.));
    }

    #[test]
    fn test_resolve_missing_node() {
        let names = RigNames {
            gaze: "missing".to_string(),
            ..RigNames::default()
        };

        let result = OverlayRig::resolve(&asset(), &names);

        assert!(matches!(result, Err(Error::Calibration(msg)) if msg == "missing node missing"));
    }

    #[test]
    fn test_resolve_head_without_extents() {
        let mut asset = asset();
        asset.nodes[0].extents = None;

        assert!(OverlayRig::resolve(&asset, &RigNames::default()).is_err());
    }

    #[test]
    fn test_head_width_scale() {
        let rig = OverlayRig::resolve(&asset(), &RigNames::default()).unwrap();

        // box width 90 over head width 90, over the divisor
        assert_eq!(rig.head_width_scale(90.), 1. / HEAD_WIDTH_DIVISOR);
    }
}
