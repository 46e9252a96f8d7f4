use crate::materials::serialization::{self, load_json, save_json};
use glam::Vec3;
use std::path::Path;

pub const DEFAULT_FOV: f32 = 15.0;
pub const DEFAULT_DISTANCE_MIN: f32 = 1.0;
pub const DEFAULT_DISTANCE_MAX: f32 = 40.0;

const ZOOM_BASE: f32 = 0.95;
const ZOOM_SMOOTHING: f32 = 0.15;
const ZOOM_SETTLE: f32 = 1e-4;
const RETURN_SMOOTHING: f32 = 0.1;
const RETURN_SETTLE: f32 = 0.005;

/// Partial vector as written in `camera.json`.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VectorDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
}

impl VectorDoc {
    fn from_vec3(value: Vec3) -> Self {
        Self {
            x: Some(value.x),
            y: Some(value.y),
            z: Some(value.z),
        }
    }

    /// Fills missing components from `fallback`.
    fn merged(&self, fallback: Vec3) -> Vec3 {
        Vec3::new(
            self.x.unwrap_or(fallback.x),
            self.y.unwrap_or(fallback.y),
            self.z.unwrap_or(fallback.z),
        )
    }
}

/// Camera configuration document. Every field is optional; absent fields
/// leave the camera as it is.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fov: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom_min: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom_max: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom_speed: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaw_deg: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch_deg: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<VectorDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<VectorDoc>,
}

/// Reads `camera.json`. A missing or malformed document is reported and
/// yields `None`, so the caller keeps its current camera.
pub fn load_camera_config(path: &Path) -> Option<CameraConfig> {
    match load_json::<CameraConfig>(path) {
        Ok(config) => Some(config),
        Err(err) => {
            log::warn!("Camera config {} skipped: {}", path.display(), err);
            None
        }
    }
}

pub fn save_camera_config(config: &CameraConfig, path: &Path) -> serialization::Result<()> {
    save_json(config, path)
}

/// Orbit camera around a target point, with smoothed wheel dolly. Once an
/// orbit gesture is released the eye glides back to the horizon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub fov: f32,
    pub zoom: f32,
    pub distance_min: f32,
    pub distance_max: f32,
    pub zoom_speed: f32,
    pub position: Vec3,
    pub target: Vec3,
    zoom_target: Option<f32>,
    returning: bool,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            fov: DEFAULT_FOV,
            zoom: 1.0,
            distance_min: DEFAULT_DISTANCE_MIN,
            distance_max: DEFAULT_DISTANCE_MAX,
            zoom_speed: 1.0,
            position: Vec3::new(0.0, 0.0, 15.0),
            target: Vec3::ZERO,
            zoom_target: None,
            returning: false,
        }
    }
}

impl OrbitCamera {
    pub fn distance(&self) -> f32 {
        (self.position - self.target).length()
    }

    /// Yaw and pitch in radians of the eye as seen from the target.
    pub fn yaw_pitch(&self) -> (f32, f32) {
        let offset = self.position - self.target;
        let yaw = offset.x.atan2(offset.z);
        let pitch = offset.y.atan2(offset.x.hypot(offset.z));
        (yaw, pitch)
    }

    pub fn is_zooming(&self) -> bool {
        self.zoom_target.is_some()
    }

    pub fn is_returning(&self) -> bool {
        self.returning
    }

    /// Applies a configuration document.
    ///
    /// Yaw/pitch/distance place the eye when both angles or a distance are
    /// given; otherwise `position` is used. Zoom is clamped to the configured
    /// range.
    pub fn apply(&mut self, config: &CameraConfig) {
        if let Some(fov) = config.fov {
            self.fov = fov;
        }
        if let Some(min) = config.zoom_min {
            self.distance_min = min;
        }
        if let Some(max) = config.zoom_max {
            self.distance_max = max;
        }
        if let Some(zoom) = config.zoom {
            self.zoom = zoom.max(self.distance_min).min(self.distance_max);
        }
        if let Some(speed) = config.zoom_speed {
            self.zoom_speed = speed;
        }

        let angles_given = config.yaw_deg.is_some() && config.pitch_deg.is_some();
        if angles_given || config.distance.is_some() {
            let target = config
                .target
                .map_or(self.target, |target| target.merged(self.target));
            let offset = self.position - target;
            let distance = config.distance.unwrap_or_else(|| offset.length());
            let yaw = config
                .yaw_deg
                .map_or_else(|| offset.x.atan2(offset.z), f32::to_radians);
            let pitch = config
                .pitch_deg
                .map_or_else(|| offset.y.atan2(offset.x.hypot(offset.z)), f32::to_radians);
            self.position = target + spherical_offset(yaw, pitch, distance);
        } else if let Some(position) = config.position {
            self.position = position.merged(self.position);
        }

        if let Some(target) = config.target {
            self.target = target.merged(self.target);
        }
        self.zoom_target = None;
        self.returning = false;
    }

    /// Snapshot of the current state in document form.
    pub fn current_config(&self) -> CameraConfig {
        let (yaw, pitch) = self.yaw_pitch();
        CameraConfig {
            fov: Some(self.fov),
            zoom: Some(self.zoom),
            zoom_min: Some(self.distance_min),
            zoom_max: Some(self.distance_max),
            zoom_speed: Some(self.zoom_speed),
            yaw_deg: Some(yaw.to_degrees()),
            pitch_deg: Some(pitch.to_degrees()),
            distance: Some(self.distance()),
            position: Some(VectorDoc::from_vec3(self.position)),
            target: Some(VectorDoc::from_vec3(self.target)),
        }
    }

    /// One wheel notch. Negative `delta_y` zooms in.
    pub fn wheel(&mut self, delta_y: f32) {
        let current = self.zoom_target.unwrap_or_else(|| self.distance());
        let step = ZOOM_BASE.powf(self.zoom_speed);
        let next = if delta_y < 0.0 {
            (current * step).max(self.distance_min)
        } else if delta_y > 0.0 {
            (current / step).min(self.distance_max)
        } else {
            current
        };
        self.zoom_target = Some(next);
    }

    /// Per-frame tick: eases the eye toward the pending dolly distance and
    /// back to the horizon after a released orbit. Returns true while the
    /// camera moved.
    pub fn update(&mut self) -> bool {
        let zoomed = self.update_zoom();
        let returned = self.update_return();
        zoomed || returned
    }

    fn update_zoom(&mut self) -> bool {
        let Some(goal) = self.zoom_target else {
            return false;
        };
        if !goal.is_finite() {
            self.zoom_target = None;
            return false;
        }
        let current = self.distance();
        let next = current + (goal - current) * ZOOM_SMOOTHING;
        self.set_distance(next);
        if (next - goal).abs() < ZOOM_SETTLE {
            self.zoom_target = None;
        }
        true
    }

    fn update_return(&mut self) -> bool {
        if !self.returning {
            return false;
        }
        let (yaw, pitch) = self.yaw_pitch();
        let pitch = if pitch.abs() < RETURN_SETTLE {
            self.returning = false;
            0.0
        } else {
            pitch * (1.0 - RETURN_SMOOTHING)
        };
        self.position = self.target + spherical_offset(yaw, pitch, self.distance());
        true
    }

    /// Orbits the eye around the target, keeping the distance. Pitch stays
    /// short of the poles. Cancels a pending return to the horizon.
    pub fn orbit(&mut self, yaw_delta: f32, pitch_delta: f32) {
        let limit = std::f32::consts::FRAC_PI_2 - 0.01;
        let (yaw, pitch) = self.yaw_pitch();
        let pitch = (pitch + pitch_delta).clamp(-limit, limit);
        self.position = self.target + spherical_offset(yaw + yaw_delta, pitch, self.distance());
        self.returning = false;
    }

    /// Ends an orbit gesture; following ticks ease the pitch back to zero.
    pub fn release(&mut self) {
        self.returning = true;
    }

    /// An eye sitting on the target is pushed out along +Z.
    fn set_distance(&mut self, distance: f32) {
        let direction = (self.position - self.target)
            .try_normalize()
            .unwrap_or(Vec3::Z);
        self.position = self.target + direction * distance;
    }
}

fn spherical_offset(yaw: f32, pitch: f32, distance: f32) -> Vec3 {
    let (sin_yaw, cos_yaw) = yaw.sin_cos();
    let (sin_pitch, cos_pitch) = pitch.sin_cos();
    Vec3::new(
        distance * sin_yaw * cos_pitch,
        distance * sin_pitch,
        distance * cos_yaw * cos_pitch,
    )
}
