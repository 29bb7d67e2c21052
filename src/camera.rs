//! Camera, projection and the yaw-only orbit controller.

use std::f32::consts::PI;

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>>(position: P, target: P) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
            up: Vector3::unit_y(),
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Camera uniform in the layout the shaders read it.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn from_camera(camera: &Camera, projection: &Projection) -> Self {
        Self {
            view_position: camera.position.to_homogeneous().into(),
            view_proj: (projection.calc_matrix() * camera.calc_matrix()).into(),
        }
    }
}

/**
 * Orbits the camera around its target on a sphere.
 *
 * Positions use a polar angle measured from +Y and an azimuth measured from
 * +Z towards +X. The polar angle is clamped to `[min_polar, max_polar]`;
 * with both set to the horizon the controller only yaws. Zoom and pan are
 * off unless explicitly enabled.
 */
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitController {
    radius: f32,
    polar: f32,
    azimuth: f32,
    pub min_polar: f32,
    pub max_polar: f32,
    pub rotate_speed: f32,
    pub enable_zoom: bool,
}

impl OrbitController {
    /// Starts from wherever `camera` currently is.
    pub fn new(camera: &Camera, min_polar: f32, max_polar: f32, rotate_speed: f32) -> Self {
        let offset = camera.position - camera.target;
        let radius = offset.magnitude();
        let polar = if radius > 0.0 {
            (offset.y / radius).clamp(-1.0, 1.0).acos()
        } else {
            PI / 2.0
        };
        let azimuth = offset.x.atan2(offset.z);
        let mut controller = Self {
            radius,
            polar,
            azimuth,
            min_polar,
            max_polar,
            rotate_speed,
            enable_zoom: false,
        };
        controller.polar = controller.clamp_polar(polar);
        controller
    }

    /// Yaw-only: the polar angle is pinned to the horizon.
    pub fn yaw_only(camera: &Camera, rotate_speed: f32) -> Self {
        Self::new(camera, PI / 2.0, PI / 2.0, rotate_speed)
    }

    fn clamp_polar(&self, polar: f32) -> f32 {
        polar.clamp(self.min_polar, self.max_polar)
    }

    pub fn polar(&self) -> f32 {
        self.polar
    }

    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Applies a pointer drag of `(dx, dy)` pixels in a viewport `height` pixels tall.
    pub fn rotate(&mut self, dx: f32, dy: f32, height: f32) {
        let height = height.max(1.0);
        self.rotate_left(2.0 * PI * dx / height * self.rotate_speed);
        self.rotate_up(2.0 * PI * dy / height * self.rotate_speed);
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.azimuth = (self.azimuth - angle).rem_euclid(2.0 * PI);
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.polar = self.clamp_polar(self.polar - angle);
    }

    /// Returns whether the zoom was applied.
    pub fn zoom(&mut self, scale: f32) -> bool {
        if !self.enable_zoom || scale <= 0.0 {
            return false;
        }
        self.radius /= scale;
        true
    }

    pub fn update_camera(&self, camera: &mut Camera) {
        let sin_polar = self.polar.sin();
        let offset = Vector3::new(
            self.radius * sin_polar * self.azimuth.sin(),
            self.radius * self.polar.cos(),
            self.radius * sin_polar * self.azimuth.cos(),
        );
        camera.position = camera.target + offset;
    }
}
