//! Camera with surface pre-rotation support.

use glam::{Mat4, Quat, Vec3};

/// Perspective camera.
///
/// Besides the usual view/projection state, the camera carries a
/// *pre-rotation* matrix. When the application handles surface rotation
/// itself, the active swapchain transform is mapped to a rotation about the
/// view-forward axis and applied on top of the projection, so rendered
/// content comes out already oriented for the display. With the compositor
/// handling rotation the pre-rotation stays identity.
#[derive(Clone, Debug)]
pub struct Camera {
    /// Camera position in world space.
    pub position: Vec3,
    /// Camera orientation.
    pub rotation: Quat,
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
    pre_rotation: Mat4,
}

impl Camera {
    /// Creates a perspective camera.
    pub fn new(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            rotation: Quat::IDENTITY,
            fov_y,
            aspect,
            near,
            far,
            pre_rotation: Mat4::IDENTITY,
        }
    }

    /// Vertical field of view in radians.
    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    /// Current aspect ratio.
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Sets the aspect ratio.
    ///
    /// Always derive this from the swapchain extent: in pre-rotate mode the
    /// window's logical aspect never changes across rotations, only the
    /// swapchain's does.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Sets the pre-rotation applied after projection.
    pub fn set_pre_rotation(&mut self, pre_rotation: Mat4) {
        self.pre_rotation = pre_rotation;
    }

    /// The current pre-rotation matrix.
    pub fn pre_rotation(&self) -> Mat4 {
        self.pre_rotation
    }

    /// The view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        let forward = self.rotation * Vec3::NEG_Z;
        Mat4::look_at_rh(self.position, self.position + forward, Vec3::Y)
    }

    /// The projection matrix with Vulkan Y-flip and pre-rotation applied.
    pub fn projection_matrix(&self) -> Mat4 {
        let mut projection = Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far);
        // Flip Y for the Vulkan coordinate system.
        projection.y_axis.y *= -1.0;
        self.pre_rotation * projection
    }

    /// The combined view-projection matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Orients the camera toward a target position.
    pub fn look_at(&mut self, target: Vec3) {
        let to_target = target - self.position;
        if to_target.length_squared() > 0.0 {
            self.rotation = Quat::from_rotation_arc(Vec3::NEG_Z, to_target.normalize());
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(45.0_f32.to_radians(), 16.0 / 9.0, 0.1, 100.0)
    }
}

/// Drag-to-orbit camera controller.
#[derive(Clone, Debug)]
pub struct OrbitController {
    /// Point the camera orbits around.
    pub target: Vec3,
    distance: f32,
    yaw: f32,
    pitch: f32,
    sensitivity: f32,
}

impl OrbitController {
    pub fn new(target: Vec3, distance: f32) -> Self {
        Self {
            target,
            distance,
            yaw: 0.0,
            pitch: 0.0,
            sensitivity: 0.005,
        }
    }

    /// Applies a cursor drag in window pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * self.sensitivity;
        self.pitch = (self.pitch - dy * self.sensitivity)
            .clamp(-std::f32::consts::FRAC_PI_2 + 0.01, std::f32::consts::FRAC_PI_2 - 0.01);
    }

    /// Applies scroll-wheel zoom.
    pub fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance - delta * 0.5).clamp(1.0, 50.0);
    }

    /// Writes the orbit position and orientation into the camera.
    pub fn update_camera(&self, camera: &mut Camera) {
        let orientation = Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(self.pitch);
        camera.position = self.target + orientation * (Vec3::Z * self.distance);
        camera.look_at(self.target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_mat4_eq(a: Mat4, b: Mat4) {
        let (a, b) = (a.to_cols_array(), b.to_cols_array());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-5, "matrices differ: {:?} vs {:?}", a, b);
        }
    }

    #[test]
    fn pre_rotation_defaults_to_identity() {
        let camera = Camera::default();
        assert_mat4_eq(camera.pre_rotation(), Mat4::IDENTITY);
    }

    #[test]
    fn pre_rotation_is_applied_after_projection() {
        let mut camera = Camera::new(60.0_f32.to_radians(), 1.5, 0.1, 100.0);
        let base = camera.projection_matrix();

        let rotation = Mat4::from_axis_angle(Vec3::NEG_Z, 90.0_f32.to_radians());
        camera.set_pre_rotation(rotation);

        assert_mat4_eq(camera.projection_matrix(), rotation * base);
    }

    #[test]
    fn set_aspect_changes_the_projection() {
        let mut camera = Camera::new(45.0_f32.to_radians(), 16.0 / 9.0, 0.1, 100.0);
        let wide = camera.projection_matrix();
        camera.set_aspect(9.0 / 16.0);
        let tall = camera.projection_matrix();
        assert!(wide.x_axis.x != tall.x_axis.x);
        assert_eq!(camera.aspect(), 9.0 / 16.0);
    }

    #[test]
    fn orbit_keeps_distance_to_target() {
        let target = Vec3::new(1.0, 2.0, 3.0);
        let mut orbit = OrbitController::new(target, 4.0);
        orbit.rotate(120.0, -45.0);

        let mut camera = Camera::default();
        orbit.update_camera(&mut camera);
        assert!((camera.position.distance(target) - 4.0).abs() < 1e-4);
    }

    #[test]
    fn orbit_pitch_is_clamped() {
        let mut orbit = OrbitController::new(Vec3::ZERO, 5.0);
        orbit.rotate(0.0, -100_000.0);

        let mut camera = Camera::default();
        orbit.update_camera(&mut camera);
        // The camera never flips over the pole.
        assert!(camera.position.y < 5.0);
    }
}
