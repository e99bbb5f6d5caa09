use glam::{Mat4, Quat, Vec2, Vec3};

/// Closest the camera may get to its target.
pub const MIN_DISTANCE: f32 = 0.001;
/// Vertical field of view of the perspective projection, in degrees.
pub const FIELD_OF_VIEW: f32 = 35.0;
pub const NEAR: f32 = 0.1;
pub const FAR: f32 = 100.0;

/// Radius of the virtual sphere pointer positions are projected onto, in
/// normalized viewport units.
const ARCBALL_RADIUS: f32 = 0.8;
const PAN_SPEED: f32 = 0.001;
const ZOOM_SPEED: f32 = 50.0;

/// Orbiting camera driven by pointer gestures: drag rotates around the
/// target, pan moves the target, zoom changes the distance to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Trackball {
    rotation: Quat,
    distance: f32,
    target: Vec3,
}

impl Default for Trackball {
    fn default() -> Self {
        Trackball::new(3.0)
    }
}

impl Trackball {
    pub fn new(distance: f32) -> Trackball {
        Trackball {
            rotation: Quat::IDENTITY,
            distance: distance.max(MIN_DISTANCE),
            target: Vec3::ZERO,
        }
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Rotates by the arcball increment between two pointer positions, given
    /// in pixels with the origin at the bottom left of the viewport.
    pub fn drag(&mut self, old: Vec2, new: Vec2, viewport: Vec2) {
        if old == new {
            return;
        }
        let old = project_to_sphere(normalize_pointer(old, viewport));
        let new = project_to_sphere(normalize_pointer(new, viewport));
        let axis = old.cross(new);
        if axis.length_squared() <= f32::EPSILON * f32::EPSILON {
            return;
        }
        let angle = 2.0 * old.dot(new).clamp(-1.0, 1.0).acos();
        let increment = Quat::from_axis_angle(axis.normalize(), angle);
        self.rotation = (increment * self.rotation).normalize();
    }

    /// Moves the target within the camera's right/up plane, so the scene
    /// follows the pointer whatever the current rotation.
    pub fn pan(&mut self, old: Vec2, new: Vec2) {
        let delta = (new - old) * PAN_SPEED * self.distance;
        let camera_offset = Vec3::new(delta.x, delta.y, 0.0);
        self.target -= self.rotation.inverse() * camera_offset;
    }

    /// Positive deltas move away from the target and negative ones closer.
    /// The distance scales exponentially so it never reaches zero, and is
    /// clamped at `MIN_DISTANCE`.
    pub fn zoom(&mut self, delta: f32, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        let factor = (ZOOM_SPEED * delta / height).exp();
        self.distance = (self.distance * factor).max(MIN_DISTANCE);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, -self.distance))
            * Mat4::from_quat(self.rotation)
            * Mat4::from_translation(-self.target)
    }

    pub fn projection_matrix(&self, viewport: Vec2) -> Mat4 {
        let aspect = viewport.x.max(1.0) / viewport.y.max(1.0);
        Mat4::perspective_rh_gl(FIELD_OF_VIEW.to_radians(), aspect, NEAR, FAR)
    }
}

/// Maps pixel coordinates onto [-1, 1] in both axes.
fn normalize_pointer(position: Vec2, viewport: Vec2) -> Vec2 {
    let viewport = viewport.max(Vec2::ONE);
    (2.0 * position - viewport) / viewport
}

/// Sphere near the center, hyperbolic sheet further out, so positions outside
/// the ball still rotate smoothly.
fn project_to_sphere(position: Vec2) -> Vec3 {
    let p2 = position.length_squared();
    let r2 = ARCBALL_RADIUS * ARCBALL_RADIUS;
    let z = if 2.0 * p2 < r2 {
        (r2 - p2).sqrt()
    } else {
        r2 / (2.0 * p2.sqrt())
    };
    position.extend(z).normalize()
}
