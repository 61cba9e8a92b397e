use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

use crate::camera::Camera;
use crate::controls::bindings::{Binding, BindingGuard, BindingKind, BindingRegistry};
use crate::scene::SceneDescriptor;

const EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrbitGesture {
    Rotate,
    Pan,
}

/// Rotate/zoom/pan camera control around a target point.
///
/// Input accumulates into pending deltas; [`OrbitControls::update`] applies
/// them to the camera once per frame, easing them out when damping is on.
#[derive(Debug)]
pub struct OrbitControls {
    pub enabled: bool,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub auto_rotate: bool,
    /// Two means one full revolution every 30 seconds.
    pub auto_rotate_speed: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    target: Vec3,
    theta_delta: f32,
    phi_delta: f32,
    scale: f32,
    pan_offset: Vec3,
    gesture: Option<OrbitGesture>,
    last_pointer: Vec2,
    binding: BindingGuard,
}

impl OrbitControls {
    pub fn bind(registry: &BindingRegistry, scene: &SceneDescriptor) -> Self {
        let binding = registry.acquire(Binding {
            kind: BindingKind::Orbit,
            scene: scene.id(),
            entity: scene.objects()[0].id,
        });
        Self {
            enabled: true,
            enable_damping: true,
            damping_factor: 0.05,
            auto_rotate: false,
            auto_rotate_speed: 2.0,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.5,
            max_distance: 50.0,
            target: scene.origin(),
            theta_delta: 0.0,
            phi_delta: 0.0,
            scale: 1.0,
            pan_offset: Vec3::ZERO,
            gesture: None,
            last_pointer: Vec2::ZERO,
            binding,
        }
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn binding(&self) -> Binding {
        self.binding.binding()
    }

    pub fn gesture(&self) -> Option<OrbitGesture> {
        self.gesture
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.gesture = None;
        }
    }

    pub fn begin(&mut self, gesture: OrbitGesture, pointer: Vec2) {
        if !self.enabled {
            return;
        }
        self.gesture = Some(gesture);
        self.last_pointer = pointer;
    }

    pub fn end(&mut self) {
        self.gesture = None;
    }

    pub fn pointer_moved(&mut self, pointer: Vec2, viewport: (u32, u32), camera: &Camera) {
        let Some(gesture) = self.gesture.filter(|_| self.enabled) else {
            return;
        };
        let delta = pointer - self.last_pointer;
        self.last_pointer = pointer;
        let height = viewport.1.max(1) as f32;

        match gesture {
            OrbitGesture::Rotate => {
                self.theta_delta -= TAU * delta.x / height * self.rotate_speed;
                self.phi_delta -= TAU * delta.y / height * self.rotate_speed;
            }
            OrbitGesture::Pan => {
                let offset = camera.position - self.target;
                let target_distance =
                    offset.length() * (camera.fov.to_radians() * 0.5).tan();
                let forward = camera.forward();
                let right = forward.cross(camera.up).normalize_or(Vec3::X);
                let up = right.cross(forward).normalize_or(Vec3::Y);
                let scale = 2.0 * target_distance / height * self.pan_speed;
                self.pan_offset += -right * delta.x * scale + up * delta.y * scale;
            }
        }
    }

    /// Accumulates a wheel step; negative deltas zoom in.
    pub fn wheel(&mut self, delta_y: f32) {
        if !self.enabled || delta_y == 0.0 {
            return;
        }
        let zoom = 0.95_f32.powf(self.zoom_speed);
        if delta_y < 0.0 {
            self.scale *= zoom;
        } else {
            self.scale /= zoom;
        }
    }

    /// Applies pending motion to `camera`. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut Camera, delta: f32) -> bool {
        let offset = camera.position - self.target;
        let radius = offset.length().max(EPSILON);
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

        if self.auto_rotate && self.gesture.is_none() {
            self.theta_delta -= TAU / 60.0 * self.auto_rotate_speed * delta.max(0.0);
        }

        let factor = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        theta += self.theta_delta * factor;
        phi = (phi + self.phi_delta * factor).clamp(EPSILON, PI - EPSILON);
        let radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
        self.target += self.pan_offset * factor;

        let position = self.target
            + Vec3::new(
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
                radius * phi.sin() * theta.cos(),
            );
        let moved = position.distance_squared(camera.position) > EPSILON
            || camera.target.distance_squared(self.target) > EPSILON;
        camera.position = position;
        camera.target = self.target;

        if self.enable_damping {
            self.theta_delta *= 1.0 - factor;
            self.phi_delta *= 1.0 - factor;
            self.pan_offset *= 1.0 - factor;
        } else {
            self.theta_delta = 0.0;
            self.phi_delta = 0.0;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;
        moved
    }
}
