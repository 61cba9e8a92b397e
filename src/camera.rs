use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

use crate::config::CameraConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            position: config.position,
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: config.fov,
            aspect: sanitize_aspect(aspect),
            near: config.near,
            far: config.far,
        }
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = aspect_ratio(width, height);
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or(Vec3::NEG_Z)
    }

    /// World-space ray through a point given in normalized device coordinates.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_proj().inverse();
        let near = inverse * ndc.extend(0.0).extend(1.0);
        let far = inverse * ndc.extend(1.0).extend(1.0);
        let near = near.xyz() / near.w;
        let far = far.xyz() / far.w;
        Ray {
            origin: near,
            direction: (far - near).normalize_or(self.forward()),
        }
    }
}

pub fn aspect_ratio(width: u32, height: u32) -> f32 {
    if height == 0 {
        1.0
    } else {
        sanitize_aspect(width as f32 / height as f32)
    }
}

fn sanitize_aspect(aspect: f32) -> f32 {
    if aspect.is_finite() {
        aspect.max(0.01)
    } else {
        1.0
    }
}

pub fn pointer_to_ndc(position: Vec2, viewport: (u32, u32)) -> Vec2 {
    let width = viewport.0.max(1) as f32;
    let height = viewport.1.max(1) as f32;
    Vec2::new(
        position.x / width * 2.0 - 1.0,
        1.0 - position.y / height * 2.0,
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    /// Distance along the ray to the plane through `point` with `normal`.
    pub fn intersect_plane(&self, point: Vec3, normal: Vec3) -> Option<f32> {
        let denom = normal.dot(self.direction);
        if denom.abs() < 1e-6 {
            return None;
        }
        let distance = (point - self.origin).dot(normal) / denom;
        (distance >= 0.0).then_some(distance)
    }

    /// Distance to the nearest hit with an origin-centered sphere.
    pub fn intersect_sphere(&self, radius: f32) -> Option<f32> {
        let b = self.origin.dot(self.direction);
        let c = self.origin.length_squared() - radius * radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let root = discriminant.sqrt();
        [-b - root, -b + root].into_iter().find(|t| *t >= 0.0)
    }

    /// Slab test against an origin-centered box with the given half extents.
    pub fn intersect_box(&self, half: Vec3) -> Option<f32> {
        let inverse = self.direction.recip();
        let t1 = (-half - self.origin) * inverse;
        let t2 = (half - self.origin) * inverse;
        let near = t1.min(t2).max_element();
        let far = t1.max(t2).min_element();
        if far < near.max(0.0) {
            return None;
        }
        Some(near.max(0.0))
    }
}
