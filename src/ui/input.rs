use crate::scene::camera::{Camera, Orientation, forward_from_yaw_pitch, world_up};
use log::debug;
use nalgebra::{Point3, Vector2, Vector3};

pub const PITCH_LIMIT_DEG: f32 = 89.0;

/// Movement keys the controllers care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKey {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
    Sprint,
}

/// Raw per-frame input as seen by the camera controllers.
pub trait InputSource {
    /// Whether the look button (secondary mouse button) is held.
    fn is_look_held(&self) -> bool;
    /// Absolute cursor position in window pixels.
    fn cursor_position(&self) -> Vector2<f32>;
    fn is_key_down(&self, key: MoveKey) -> bool;
    /// Scroll wheel movement this frame, positive away from the user.
    fn scroll_delta(&self) -> f32 {
        0.0
    }
}

/// Plain-data input state, filled once per frame by the windowing layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    pub look_held: bool,
    pub cursor: Vector2<f32>,
    pub keys: Vec<MoveKey>,
    pub scroll: f32,
}

impl InputSnapshot {
    pub fn looking_at(x: f32, y: f32) -> Self {
        Self {
            look_held: true,
            cursor: Vector2::new(x, y),
            ..Self::default()
        }
    }

    pub fn with_key(mut self, key: MoveKey) -> Self {
        self.keys.push(key);
        self
    }
}

impl InputSource for InputSnapshot {
    fn is_look_held(&self) -> bool {
        self.look_held
    }

    fn cursor_position(&self) -> Vector2<f32> {
        self.cursor
    }

    fn is_key_down(&self, key: MoveKey) -> bool {
        self.keys.contains(&key)
    }

    fn scroll_delta(&self) -> f32 {
        self.scroll
    }
}

/// Whether the look button currently drives the camera.
///
/// The environment hides and locks the cursor while `Looking`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookState {
    #[default]
    Free,
    Looking,
}

/// Turns absolute cursor positions into per-frame deltas while look mode is held.
///
/// The first sample after engaging only records a baseline, so a cursor jump that
/// happened while the button was up never reaches the camera.
#[derive(Debug, Clone, PartialEq)]
struct CursorTracker {
    state: LookState,
    prev_cursor: Vector2<f32>,
    capture_baseline: bool,
}

impl Default for CursorTracker {
    fn default() -> Self {
        Self {
            state: LookState::Free,
            prev_cursor: Vector2::zeros(),
            capture_baseline: true,
        }
    }
}

impl CursorTracker {
    /// Returns the cursor delta while looking and whether look mode started this frame.
    fn track<I: InputSource + ?Sized>(&mut self, input: &I) -> Option<(Vector2<f32>, bool)> {
        if !input.is_look_held() {
            if self.state == LookState::Looking {
                debug!("Look mode released");
            }
            self.state = LookState::Free;
            self.capture_baseline = true;
            return None;
        }

        let cursor = input.cursor_position();
        let engaged = self.capture_baseline;
        if engaged {
            debug!("Look mode engaged at ({:.1}, {:.1})", cursor.x, cursor.y);
            self.capture_baseline = false;
            self.prev_cursor = cursor;
        }
        self.state = LookState::Looking;

        let delta = cursor - self.prev_cursor;
        self.prev_cursor = cursor;
        Some((delta, engaged))
    }
}

fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

fn clamp_pitch(pitch: f32) -> f32 {
    pitch.clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG)
}

/// Yaw/pitch (degrees) pointing along `direction`.
fn yaw_pitch_from_direction(direction: &Vector3<f32>) -> Option<(f32, f32)> {
    let norm = direction.norm();
    if norm <= f32::EPSILON || !norm.is_finite() {
        return None;
    }
    let dir = direction / norm;
    let pitch = dir.y.clamp(-1.0, 1.0).asin().to_degrees();
    let yaw = dir.z.atan2(dir.x).to_degrees();
    Some((wrap_degrees(yaw), clamp_pitch(pitch)))
}

//=================================
// First-person controller
//=================================

/// Mouse-look + WASD controller.
///
/// While the look button is held, cursor motion turns the camera and the
/// movement keys fly it around. Releasing the button leaves the pose alone.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraController {
    /// Degrees, wrapped to [0, 360).
    pub yaw: f32,
    /// Degrees, clamped to [-89, 89].
    pub pitch: f32,
    /// Degrees per pixel of cursor motion.
    pub sensitivity: f32,
    /// Units per second.
    pub move_speed: f32,
    pub sprint_speed: f32,
    cursor: CursorTracker,
}

impl Default for CameraController {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            sensitivity: 0.1,
            move_speed: 5.0,
            sprint_speed: 10.0,
            cursor: CursorTracker::default(),
        }
    }
}

impl CameraController {
    /// Creates a controller whose yaw/pitch match the camera's current view direction.
    pub fn new(sensitivity: f32, move_speed: f32, sprint_speed: f32, camera: &Camera) -> Self {
        let mut controller = Self {
            sensitivity,
            move_speed,
            sprint_speed,
            ..Self::default()
        };
        controller.sync_to(camera);
        controller
    }

    pub fn state(&self) -> LookState {
        self.cursor.state
    }

    /// Reads yaw/pitch back from the camera (after a reset or a UI edit).
    pub fn sync_to(&mut self, camera: &Camera) {
        if let Some((yaw, pitch)) = yaw_pitch_from_direction(&camera.forward()) {
            self.yaw = yaw;
            self.pitch = pitch;
        }
    }

    pub fn forward(&self) -> Vector3<f32> {
        forward_from_yaw_pitch(self.yaw, self.pitch)
    }

    /// Applies a cursor delta in pixels. Moving the cursor up (negative y) looks up.
    pub fn apply_look_delta(&mut self, delta: Vector2<f32>) {
        self.yaw = wrap_degrees(self.yaw + delta.x * self.sensitivity);
        self.pitch = clamp_pitch(self.pitch - delta.y * self.sensitivity);
    }

    pub fn update<I: InputSource + ?Sized>(
        &mut self,
        input: &I,
        camera: &mut Camera,
        dt: f32,
    ) -> LookState {
        let Some((delta, engaged)) = self.cursor.track(input) else {
            return LookState::Free;
        };

        if engaged {
            // Pick up any pose edits made while the cursor was free.
            self.sync_to(camera);
        }
        self.apply_look_delta(delta);

        camera.orientation = Orientation::YawPitch {
            yaw_deg: self.yaw,
            pitch_deg: self.pitch,
        };

        // --- Keyboard Movement (WASD + E/Q) ---
        let forward = self.forward();
        let right = forward.cross(&world_up()).normalize();
        let up = world_up();

        let mut move_dir = Vector3::zeros();
        if input.is_key_down(MoveKey::Forward) {
            move_dir += forward;
        }
        if input.is_key_down(MoveKey::Back) {
            move_dir -= forward;
        }
        if input.is_key_down(MoveKey::Right) {
            move_dir += right;
        }
        if input.is_key_down(MoveKey::Left) {
            move_dir -= right;
        }
        if input.is_key_down(MoveKey::Up) {
            move_dir += up;
        }
        if input.is_key_down(MoveKey::Down) {
            move_dir -= up;
        }

        if move_dir.norm_squared() > 1e-6 {
            let speed = if input.is_key_down(MoveKey::Sprint) {
                self.sprint_speed
            } else {
                self.move_speed
            };
            camera.position += move_dir.normalize() * speed * dt;
        }

        LookState::Looking
    }
}

//=================================
// Orbit controller
//=================================

/// Target-relative controller: dragging orbits the camera around its target,
/// scrolling dollies toward or away from it.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitController {
    /// Degrees per pixel of cursor motion.
    pub sensitivity: f32,
    /// Distance change per scroll unit.
    pub zoom_speed: f32,
    pub min_distance: f32,
    yaw: f32,
    pitch: f32,
    distance: f32,
    cursor: CursorTracker,
}

impl OrbitController {
    pub fn new(sensitivity: f32, zoom_speed: f32, camera: &Camera) -> Self {
        let mut controller = Self {
            sensitivity,
            zoom_speed,
            min_distance: 0.1,
            yaw: 90.0,
            pitch: 0.0,
            distance: 5.0,
            cursor: CursorTracker::default(),
        };
        controller.sync_to(camera);
        controller
    }

    pub fn state(&self) -> LookState {
        self.cursor.state
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Re-derives the orbit angles and distance from the camera pose.
    pub fn sync_to(&mut self, camera: &Camera) {
        let offset = camera.position - camera.target();
        if let Some((yaw, pitch)) = yaw_pitch_from_direction(&offset) {
            self.yaw = yaw;
            self.pitch = pitch;
            self.distance = offset.norm().max(self.min_distance);
        }
    }

    pub fn update<I: InputSource + ?Sized>(&mut self, input: &I, camera: &mut Camera) -> LookState {
        let target = camera.target();
        let look = self.cursor.track(input);
        let scroll = input.scroll_delta();

        if look.is_none() && scroll == 0.0 {
            return LookState::Free;
        }
        if look.is_some_and(|(_, engaged)| engaged) || scroll != 0.0 {
            self.sync_to(camera);
        }

        if let Some((delta, _)) = look {
            self.yaw = wrap_degrees(self.yaw + delta.x * self.sensitivity);
            self.pitch = clamp_pitch(self.pitch + delta.y * self.sensitivity);
        }
        self.distance = (self.distance - scroll * self.zoom_speed).max(self.min_distance);

        let offset = forward_from_yaw_pitch(self.yaw, self.pitch) * self.distance;
        camera.position = Point3::from(target.coords + offset);
        camera.orientation = Orientation::Target(target);

        self.cursor.state
    }
}

//=================================
// Controller selection
//=================================

/// The controller variant driving the camera.
#[derive(Debug, Clone, PartialEq)]
pub enum Controller {
    Free(CameraController),
    Orbit(OrbitController),
}

impl Controller {
    /// Builds the variant named in the config ("free" or "orbit").
    pub fn from_mode(
        mode: &str,
        sensitivity: f32,
        move_speed: f32,
        sprint_speed: f32,
        zoom_speed: f32,
        camera: &Camera,
    ) -> Self {
        match mode {
            "orbit" => Self::Orbit(OrbitController::new(sensitivity, zoom_speed, camera)),
            "free" => Self::Free(CameraController::new(sensitivity, move_speed, sprint_speed, camera)),
            other => {
                log::warn!("Unknown controller mode '{other}', using free look");
                Self::Free(CameraController::new(sensitivity, move_speed, sprint_speed, camera))
            }
        }
    }

    pub fn update<I: InputSource + ?Sized>(
        &mut self,
        input: &I,
        camera: &mut Camera,
        dt: f32,
    ) -> LookState {
        match self {
            Controller::Free(c) => c.update(input, camera, dt),
            Controller::Orbit(c) => c.update(input, camera),
        }
    }

    pub fn sync_to(&mut self, camera: &Camera) {
        match self {
            Controller::Free(c) => c.sync_to(camera),
            Controller::Orbit(c) => c.sync_to(camera),
        }
    }

    pub fn state(&self) -> LookState {
        match self {
            Controller::Free(c) => c.state(),
            Controller::Orbit(c) => c.state(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;
    const DT: f32 = 1.0 / 60.0;

    fn yaw_pitch_camera(yaw_deg: f32, pitch_deg: f32) -> Camera {
        Camera {
            orientation: Orientation::YawPitch { yaw_deg, pitch_deg },
            ..Camera::default()
        }
    }

    #[test]
    fn free_state_leaves_pose_untouched() {
        let mut camera = Camera::default();
        let before = camera.clone();
        let mut controller = CameraController::default();

        let input = InputSnapshot {
            cursor: Vector2::new(400.0, 300.0),
            ..InputSnapshot::default()
        }
        .with_key(MoveKey::Forward);
        let state = controller.update(&input, &mut camera, DT);

        assert_eq!(state, LookState::Free);
        assert_eq!(camera, before);
    }

    #[test]
    fn horizontal_delta_increases_yaw() {
        let mut camera = yaw_pitch_camera(0.0, 0.0);
        let mut controller = CameraController::new(0.2, 5.0, 10.0, &camera);
        assert!(controller.yaw.abs() < EPS);

        controller.update(&InputSnapshot::looking_at(100.0, 100.0), &mut camera, DT);
        controller.update(&InputSnapshot::looking_at(150.0, 100.0), &mut camera, DT);

        assert!((controller.yaw - 10.0).abs() < EPS);
        assert!(controller.pitch.abs() < EPS);
        assert_eq!(
            camera.orientation,
            Orientation::YawPitch {
                yaw_deg: controller.yaw,
                pitch_deg: controller.pitch
            }
        );
    }

    #[test]
    fn yaw_wraps_into_range() {
        let mut controller = CameraController {
            sensitivity: 1.0,
            ..CameraController::default()
        };
        controller.apply_look_delta(Vector2::new(-30.0, 0.0));
        assert!((controller.yaw - 330.0).abs() < EPS);
        controller.apply_look_delta(Vector2::new(400.0, 0.0));
        assert!((controller.yaw - 10.0).abs() < EPS);
        controller.apply_look_delta(Vector2::new(-1e-7, 0.0));
        assert!((0.0..360.0).contains(&controller.yaw));
    }

    #[test]
    fn pitch_clamps_exactly_at_limit() {
        let mut controller = CameraController {
            sensitivity: 1.0,
            ..CameraController::default()
        };
        controller.apply_look_delta(Vector2::new(0.0, -500.0));
        assert_eq!(controller.pitch, 89.0);
        controller.apply_look_delta(Vector2::new(0.0, 1000.0));
        assert_eq!(controller.pitch, -89.0);
    }

    #[test]
    fn re_engaging_captures_a_new_baseline() {
        let mut camera = yaw_pitch_camera(0.0, 0.0);
        let mut controller = CameraController::new(0.1, 5.0, 10.0, &camera);

        // Looking
        controller.update(&InputSnapshot::looking_at(10.0, 10.0), &mut camera, DT);
        controller.update(&InputSnapshot::looking_at(20.0, 10.0), &mut camera, DT);
        let yaw_after_first_look = controller.yaw;
        assert!((yaw_after_first_look - 1.0).abs() < EPS);

        // Free: the cursor wanders far away
        let free = InputSnapshot {
            cursor: Vector2::new(900.0, 700.0),
            ..InputSnapshot::default()
        };
        assert_eq!(controller.update(&free, &mut camera, DT), LookState::Free);
        assert_eq!(controller.state(), LookState::Free);

        // Looking again: the jump is not applied
        let state = controller.update(&InputSnapshot::looking_at(900.0, 700.0), &mut camera, DT);
        assert_eq!(state, LookState::Looking);
        assert!((controller.yaw - yaw_after_first_look).abs() < EPS);
        assert!(controller.pitch.abs() < EPS);

        controller.update(&InputSnapshot::looking_at(910.0, 700.0), &mut camera, DT);
        assert!((controller.yaw - yaw_after_first_look - 1.0).abs() < EPS);
    }

    #[test]
    fn movement_applies_on_the_engaging_frame() {
        let mut camera = yaw_pitch_camera(0.0, 0.0);
        camera.position = Point3::origin();
        let mut controller = CameraController::new(0.1, 2.0, 8.0, &camera);

        let input = InputSnapshot::looking_at(0.0, 0.0).with_key(MoveKey::Forward);
        controller.update(&input, &mut camera, 0.5);
        assert!((camera.position - Point3::new(1.0, 0.0, 0.0)).norm() < EPS);

        let input = InputSnapshot::looking_at(0.0, 0.0)
            .with_key(MoveKey::Right)
            .with_key(MoveKey::Sprint);
        controller.update(&input, &mut camera, 0.5);
        // Right of +X with Y up is +Z.
        assert!((camera.position - Point3::new(1.0, 0.0, 4.0)).norm() < EPS);
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut camera = yaw_pitch_camera(45.0, 10.0);
        let start = camera.position;
        let mut controller = CameraController::new(0.1, 5.0, 10.0, &camera);
        let input = InputSnapshot::looking_at(0.0, 0.0)
            .with_key(MoveKey::Forward)
            .with_key(MoveKey::Back)
            .with_key(MoveKey::Up)
            .with_key(MoveKey::Down);
        controller.update(&input, &mut camera, 1.0);
        assert!((camera.position - start).norm() < EPS);
    }

    #[test]
    fn new_controller_matches_target_camera() {
        // Default camera at +Z looking at the origin faces -Z.
        let camera = Camera::default();
        let controller = CameraController::new(0.1, 5.0, 10.0, &camera);
        assert!((controller.yaw - 270.0).abs() < EPS);
        assert!((controller.forward() - Vector3::new(0.0, 0.0, -1.0)).norm() < EPS);
    }

    #[test]
    fn orbit_keeps_distance_and_target() {
        let mut camera = Camera::default();
        let mut orbit = OrbitController::new(0.5, 1.0, &camera);
        assert!((orbit.distance() - 5.0).abs() < EPS);

        orbit.update(&InputSnapshot::looking_at(0.0, 0.0), &mut camera);
        orbit.update(&InputSnapshot::looking_at(60.0, 20.0), &mut camera);

        assert!((camera.position.coords.norm() - 5.0).abs() < EPS);
        assert_eq!(camera.orientation, Orientation::Target(Point3::origin()));
        assert!((camera.position - Point3::new(0.0, 0.0, 5.0)).norm() > 0.1);
    }

    #[test]
    fn orbit_scroll_zooms_with_floor() {
        let mut camera = Camera::default();
        let mut orbit = OrbitController::new(0.5, 1.0, &camera);

        let zoom_in = InputSnapshot {
            scroll: 2.0,
            ..InputSnapshot::default()
        };
        orbit.update(&zoom_in, &mut camera);
        assert!((camera.position.coords.norm() - 3.0).abs() < EPS);

        let slam = InputSnapshot {
            scroll: 100.0,
            ..InputSnapshot::default()
        };
        orbit.update(&slam, &mut camera);
        assert!((camera.position.coords.norm() - orbit.min_distance).abs() < EPS);
    }

    #[test]
    fn controller_mode_selection() {
        let camera = Camera::default();
        let free = Controller::from_mode("free", 0.1, 5.0, 10.0, 0.5, &camera);
        let orbit = Controller::from_mode("orbit", 0.1, 5.0, 10.0, 0.5, &camera);
        let fallback = Controller::from_mode("spline", 0.1, 5.0, 10.0, 0.5, &camera);
        assert!(matches!(free, Controller::Free(_)));
        assert!(matches!(orbit, Controller::Orbit(_)));
        assert!(matches!(fallback, Controller::Free(_)));
    }
}
