//! Boundary to the scene/rendering side, plus a reference anchored entity.
//!
//! The registry only ever talks to entities through [`SceneEntity`]. A
//! renderer integration implements it on its own node handle;
//! [`AnchoredContent`] is the in-crate implementation used by the replay tool
//! and the tests.

use nalgebra::{UnitQuaternion, Vector3};

use crate::pose::Pose;
use crate::MarkerId;

/// Scene-side handle driven by the registry.
pub trait SceneEntity {
    /// Show (`true`) or hide (`false`) the entity.
    fn set_active(&mut self, active: bool);
    /// Assign the stabilized world pose.
    fn apply_pose(&mut self, pose: &Pose);
}

/// An auxiliary information panel hanging off anchored content.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InfoPanel {
    pub label: String,
    pub visible: bool,
}

/// Virtual content pinned to one marker.
#[derive(Debug, Clone)]
pub struct AnchoredContent {
    title: MarkerId,
    active: bool,
    pose: Pose,
    info_panels: Vec<InfoPanel>,
    panels_visible: bool,
}

impl AnchoredContent {
    /// Inactive content at the origin with all info panels hidden.
    pub fn new(title: impl Into<MarkerId>) -> Self {
        Self {
            title: title.into(),
            active: false,
            pose: Pose::default(),
            info_panels: Vec::new(),
            panels_visible: false,
        }
    }

    /// Attach hidden info panels with the given labels.
    pub fn with_info_panels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.info_panels.extend(labels.into_iter().map(|label| InfoPanel {
            label: label.into(),
            visible: false,
        }));
        self
    }

    pub fn title(&self) -> &MarkerId {
        &self.title
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn info_panels(&self) -> &[InfoPanel] {
        &self.info_panels
    }

    pub fn panels_visible(&self) -> bool {
        self.panels_visible
    }

    /// Flip info-panel visibility for every panel. Returns the new state.
    pub fn toggle_info_panels(&mut self) -> bool {
        self.panels_visible = !self.panels_visible;
        for panel in &mut self.info_panels {
            panel.visible = self.panels_visible;
        }
        self.panels_visible
    }

    /// Yaw-only rotation turning this content's title panel toward the camera.
    pub fn face_camera(&self, camera_position: &Vector3<f64>) -> UnitQuaternion<f64> {
        billboard_rotation(&self.pose.position, camera_position)
    }
}

impl SceneEntity for AnchoredContent {
    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn apply_pose(&mut self, pose: &Pose) {
        self.pose = *pose;
    }
}

/// Rotation about +Y that makes a panel at `panel` face `camera`.
///
/// The panel's +Z axis ends up pointing away from the camera so its front
/// face (-Z) is readable. Pitch and roll are always zero. Returns identity
/// when the camera is (numerically) straight above/below or on the panel.
pub fn billboard_rotation(panel: &Vector3<f64>, camera: &Vector3<f64>) -> UnitQuaternion<f64> {
    let d = camera - panel;
    let horizontal = (d.x * d.x + d.z * d.z).sqrt();
    if !horizontal.is_finite() || horizontal < 1e-9 {
        return UnitQuaternion::identity();
    }
    let yaw = d.x.atan2(d.z) + std::f64::consts::PI;
    UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn panels_start_hidden_and_toggle_together() {
        let mut c = AnchoredContent::new("Poster").with_info_panels(["Artist", "Year"]);
        assert!(c.info_panels().iter().all(|p| !p.visible));
        assert!(c.toggle_info_panels());
        assert!(c.info_panels().iter().all(|p| p.visible));
        assert!(!c.toggle_info_panels());
        assert!(c.info_panels().iter().all(|p| !p.visible));
    }

    #[test]
    fn billboard_front_faces_camera() {
        let panel = Vector3::new(1.0, 0.0, 1.0);
        let camera = Vector3::new(1.0, 1.7, 6.0);
        let rot = billboard_rotation(&panel, &camera);
        let forward = rot * Vector3::z();
        assert_abs_diff_eq!(forward, Vector3::new(0.0, 0.0, -1.0), epsilon = 1e-9);
    }

    #[test]
    fn billboard_is_yaw_only() {
        let rot = billboard_rotation(&Vector3::zeros(), &Vector3::new(3.0, 10.0, -4.0));
        assert_abs_diff_eq!(rot * Vector3::y(), Vector3::y(), epsilon = 1e-9);
        let back = rot * -Vector3::z();
        assert_abs_diff_eq!(back, Vector3::new(0.6, 0.0, -0.8), epsilon = 1e-9);
    }

    #[test]
    fn billboard_degenerate_is_identity() {
        let rot = billboard_rotation(&Vector3::zeros(), &Vector3::new(0.0, 2.0, 0.0));
        assert_eq!(rot, UnitQuaternion::identity());
    }

    #[test]
    fn scene_entity_applies_pose_and_activity() {
        let mut c = AnchoredContent::new("Poster");
        let pose = Pose::from_position(Vector3::new(0.0, 1.0, 0.0));
        c.set_active(true);
        c.apply_pose(&pose);
        assert!(c.is_active());
        assert_eq!(c.pose(), &pose);
    }
}
