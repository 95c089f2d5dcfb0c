use crate::core::math::transform::TransformFactory;
use log::debug;
use nalgebra::{Matrix4, Point3, Vector3};
use thiserror::Error;

pub const MIN_NEAR: f32 = 1e-3;
pub const MIN_DEPTH_RANGE: f32 = 1e-2;
pub const MIN_FOV_DEG: f32 = 1e-2;
pub const MAX_FOV_DEG: f32 = 179.9;
pub const MIN_ORTHO_HEIGHT: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionType {
    #[default]
    Perspective,
    Orthographic,
}

/// Where the camera looks.
///
/// Orbit-style controls keep an explicit target, first-person controls keep
/// yaw/pitch angles. Both answer the same question: which way is forward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Orientation {
    Target(Point3<f32>),
    YawPitch { yaw_deg: f32, pitch_deg: f32 },
}

impl Orientation {
    /// Unnormalized viewing direction for a camera sitting at `position`.
    pub fn forward(&self, position: &Point3<f32>) -> Vector3<f32> {
        match *self {
            Orientation::Target(target) => target - position,
            Orientation::YawPitch { yaw_deg, pitch_deg } => {
                forward_from_yaw_pitch(yaw_deg, pitch_deg)
            }
        }
    }
}

/// Fixed up reference used to build the camera basis.
pub fn world_up() -> Vector3<f32> {
    Vector3::y()
}

/// Unit forward vector for yaw/pitch angles in degrees.
///
/// Yaw 0 looks down +X, yaw 90 down +Z; positive pitch looks up.
pub fn forward_from_yaw_pitch(yaw_deg: f32, pitch_deg: f32) -> Vector3<f32> {
    let (sin_yaw, cos_yaw) = yaw_deg.to_radians().sin_cos();
    let (sin_pitch, cos_pitch) = pitch_deg.to_radians().sin_cos();
    Vector3::new(cos_yaw * cos_pitch, sin_pitch, sin_yaw * cos_pitch)
}

#[derive(Debug, Error, PartialEq)]
pub enum CameraError {
    #[error("clip planes must satisfy 0 < near < far (near = {near}, far = {far})")]
    InvalidClipPlanes { near: f32, far: f32 },
    #[error("field of view must be within (0, 180) degrees (got {0})")]
    InvalidFov(f32),
    #[error("orthographic height must be positive (got {0})")]
    InvalidOrthoHeight(f32),
}

/// Produces View and Projection matrices from a pose and projection settings.
///
/// Matrices are computed on demand, so edits to any field (from the UI or a
/// controller) show up in the very next frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub orientation: Orientation,
    pub projection: ProjectionType,
    /// Vertical field of view in degrees.
    pub fov_deg: f32,
    /// Full height of the orthographic view volume.
    pub ortho_height: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 5.0),
            orientation: Orientation::Target(Point3::origin()),
            projection: ProjectionType::Perspective,
            fov_deg: 60.0,
            ortho_height: 6.0,
            aspect_ratio: 1.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    pub fn new_perspective(
        position: Point3<f32>,
        target: Point3<f32>,
        fov_deg: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            position,
            orientation: Orientation::Target(target),
            projection: ProjectionType::Perspective,
            fov_deg,
            aspect_ratio,
            near,
            far,
            ..Self::default()
        }
    }

    pub fn new_orthographic(
        position: Point3<f32>,
        target: Point3<f32>,
        height: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            position,
            orientation: Orientation::Target(target),
            projection: ProjectionType::Orthographic,
            ortho_height: height,
            aspect_ratio,
            near,
            far,
            ..Self::default()
        }
    }

    /// Restores the default pose and projection, keeping the current aspect ratio.
    pub fn reset(&mut self) {
        *self = Self {
            aspect_ratio: self.aspect_ratio,
            ..Self::default()
        };
    }

    pub fn is_orthographic(&self) -> bool {
        self.projection == ProjectionType::Orthographic
    }

    pub fn set_orthographic(&mut self, orthographic: bool) {
        self.projection = if orthographic {
            ProjectionType::Orthographic
        } else {
            ProjectionType::Perspective
        };
    }

    /// Recomputes the aspect ratio from the current viewport size.
    /// A zero-sized viewport (minimized window) keeps the previous ratio.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect_ratio = width / height;
        }
    }

    pub fn forward(&self) -> Vector3<f32> {
        self.orientation.forward(&self.position)
    }

    /// Point the camera looks at: the explicit target, or one unit ahead.
    pub fn target(&self) -> Point3<f32> {
        match self.orientation {
            Orientation::Target(target) => target,
            Orientation::YawPitch { .. } => self.position + self.forward(),
        }
    }

    pub fn validate(&self) -> Result<(), CameraError> {
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(CameraError::InvalidClipPlanes {
                near: self.near,
                far: self.far,
            });
        }
        match self.projection {
            ProjectionType::Perspective if !(self.fov_deg > 0.0 && self.fov_deg < 180.0) => {
                Err(CameraError::InvalidFov(self.fov_deg))
            }
            ProjectionType::Orthographic if !(self.ortho_height > 0.0) => {
                Err(CameraError::InvalidOrthoHeight(self.ortho_height))
            }
            _ => Ok(()),
        }
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        match self.orientation {
            Orientation::Target(target) => TransformFactory::look_at(&self.position, &target, &world_up()),
            Orientation::YawPitch { .. } => TransformFactory::view(&self.position, &self.forward(), &world_up()),
        }
    }

    /// Builds the projection from the current settings. Out-of-range values
    /// (as a UI drag can produce) are pulled back into a usable range first.
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        let (near, far) = self.sanitized_clip_planes();
        let aspect_ratio = if self.aspect_ratio.is_finite() && self.aspect_ratio > 0.0 {
            self.aspect_ratio
        } else {
            1.0
        };

        match self.projection {
            ProjectionType::Perspective => {
                let fov_deg = if self.fov_deg.is_finite() {
                    self.fov_deg.clamp(MIN_FOV_DEG, MAX_FOV_DEG)
                } else {
                    Self::default().fov_deg
                };
                if fov_deg != self.fov_deg {
                    debug!("fov {} out of range, using {}", self.fov_deg, fov_deg);
                }
                TransformFactory::perspective(aspect_ratio, fov_deg.to_radians(), near, far)
            }
            ProjectionType::Orthographic => {
                let height = if self.ortho_height.is_finite() {
                    self.ortho_height.max(MIN_ORTHO_HEIGHT)
                } else {
                    Self::default().ortho_height
                };
                let half_height = height / 2.0;
                let half_width = half_height * aspect_ratio;

                TransformFactory::orthographic(
                    -half_width,
                    half_width, // Left, Right
                    -half_height,
                    half_height, // Bottom, Top
                    near,
                    far,
                )
            }
        }
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    fn sanitized_clip_planes(&self) -> (f32, f32) {
        let near = if self.near.is_finite() {
            self.near.max(MIN_NEAR)
        } else {
            MIN_NEAR
        };
        let far = if self.far.is_finite() {
            self.far.max(near + MIN_DEPTH_RANGE)
        } else {
            near + MIN_DEPTH_RANGE
        };
        if near != self.near || far != self.far {
            debug!(
                "clip planes ({}, {}) out of range, using ({near}, {far})",
                self.near, self.far
            );
        }
        (near, far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector4;

    const EPS: f32 = 1e-5;

    fn all_finite(m: &Matrix4<f32>) -> bool {
        m.iter().all(|v| v.is_finite())
    }

    #[test]
    fn yaw_pitch_forward_axes() {
        assert!((forward_from_yaw_pitch(0.0, 0.0) - Vector3::x()).norm() < EPS);
        assert!((forward_from_yaw_pitch(90.0, 0.0) - Vector3::z()).norm() < EPS);
        assert!((forward_from_yaw_pitch(0.0, 90.0) - Vector3::y()).norm() < EPS);
    }

    #[test]
    fn both_orientations_agree_on_forward() {
        let mut camera = Camera::default();
        let target_forward = camera.forward().normalize();

        // Default camera looks from +Z toward the origin: yaw 270, pitch 0.
        camera.orientation = Orientation::YawPitch {
            yaw_deg: 270.0,
            pitch_deg: 0.0,
        };
        assert!((camera.forward() - target_forward).norm() < EPS);
        assert!((camera.target() - Point3::new(0.0, 0.0, 4.0)).norm() < EPS);
    }

    #[test]
    fn aspect_ratio_follows_viewport() {
        let mut camera = Camera::default();
        camera.set_viewport(1920.0, 1080.0);
        let wide = camera.projection_matrix();
        camera.set_viewport(1080.0, 1080.0);
        let square = camera.projection_matrix();

        assert!((wide[(1, 1)] - square[(1, 1)]).abs() < EPS);
        assert!((wide[(0, 0)] * 1920.0 / 1080.0 - square[(0, 0)]).abs() < EPS);

        camera.set_viewport(800.0, 0.0);
        assert_eq!(camera.aspect_ratio, 1.0);
    }

    #[test]
    fn orthographic_uses_full_height() {
        let mut camera = Camera::default();
        camera.set_orthographic(true);
        camera.ortho_height = 4.0;
        camera.aspect_ratio = 2.0;
        let proj = camera.projection_matrix();
        let corner = proj * Vector4::new(4.0, 2.0, -1.0, 1.0);
        assert!((corner.x - 1.0).abs() < EPS);
        assert!((corner.y - 1.0).abs() < EPS);
        assert_eq!(corner.w, 1.0);
    }

    #[test]
    fn toggling_projection_keeps_both_settings() {
        let mut camera = Camera::default();
        camera.fov_deg = 75.0;
        camera.ortho_height = 9.0;
        camera.set_orthographic(true);
        camera.set_orthographic(false);
        assert_eq!(camera.fov_deg, 75.0);
        assert_eq!(camera.ortho_height, 9.0);
        assert!(!camera.is_orthographic());
    }

    #[test]
    fn validate_reports_bad_settings() {
        let mut camera = Camera::default();
        assert_eq!(camera.validate(), Ok(()));

        camera.near = 10.0;
        camera.far = 1.0;
        assert!(matches!(
            camera.validate(),
            Err(CameraError::InvalidClipPlanes { .. })
        ));

        camera.far = 100.0;
        camera.fov_deg = 180.0;
        assert_eq!(camera.validate(), Err(CameraError::InvalidFov(180.0)));

        // Fov is irrelevant for an orthographic camera.
        camera.set_orthographic(true);
        assert_eq!(camera.validate(), Ok(()));
        camera.ortho_height = 0.0;
        assert_eq!(camera.validate(), Err(CameraError::InvalidOrthoHeight(0.0)));
    }

    #[test]
    fn invalid_settings_still_produce_finite_matrices() {
        let mut camera = Camera::default();
        camera.near = 0.0;
        camera.far = 0.0;
        camera.fov_deg = 180.0;
        camera.aspect_ratio = f32::NAN;
        assert!(all_finite(&camera.projection_matrix()));

        camera.set_orthographic(true);
        camera.ortho_height = -3.0;
        assert!(all_finite(&camera.projection_matrix()));
    }

    #[test]
    fn looking_straight_down_is_finite() {
        let mut camera = Camera::default();
        camera.position = Point3::new(0.0, 10.0, 0.0);
        camera.orientation = Orientation::Target(Point3::origin());
        assert!(all_finite(&camera.view_matrix()));

        camera.orientation = Orientation::Target(camera.position);
        assert!(all_finite(&camera.view_matrix()));
    }

    #[test]
    fn reset_restores_defaults_but_keeps_aspect() {
        let mut camera = Camera::default();
        camera.set_viewport(1600.0, 900.0);
        camera.position = Point3::new(3.0, 3.0, 3.0);
        camera.set_orthographic(true);
        camera.reset();
        assert_eq!(camera.position, Point3::new(0.0, 0.0, 5.0));
        assert!(!camera.is_orthographic());
        assert!((camera.aspect_ratio - 16.0 / 9.0).abs() < EPS);
    }
}
