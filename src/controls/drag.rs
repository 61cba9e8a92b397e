use glam::Vec3;

use crate::camera::Ray;
use crate::controls::bindings::{Binding, BindingGuard, BindingKind, BindingRegistry};
use crate::scene::{EntityId, SceneDescriptor, SceneObject, Shape};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Hovering,
    Dragging,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragEvent {
    HoverOn,
    HoverOff,
    DragStart,
    /// The subject should move to this world position.
    Drag(Vec3),
    DragEnd,
}

#[derive(Debug)]
pub struct DragControls {
    enabled: bool,
    state: DragState,
    subject: EntityId,
    plane_point: Vec3,
    plane_normal: Vec3,
    grab_offset: Vec3,
    binding: BindingGuard,
}

impl DragControls {
    pub fn bind(registry: &BindingRegistry, scene: &SceneDescriptor) -> Self {
        let binding = registry.acquire(Binding {
            kind: BindingKind::Drag,
            scene: scene.id(),
            entity: scene.subject_id(),
        });
        Self {
            enabled: false,
            state: DragState::Idle,
            subject: scene.subject_id(),
            plane_point: Vec3::ZERO,
            plane_normal: Vec3::Z,
            grab_offset: Vec3::ZERO,
            binding,
        }
    }

    pub fn subject(&self) -> EntityId {
        self.subject
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn binding(&self) -> Binding {
        self.binding.binding()
    }

    /// Disabling an active control forces it back to idle.
    pub fn set_enabled(&mut self, enabled: bool) -> Option<DragEvent> {
        self.enabled = enabled;
        if enabled {
            None
        } else {
            self.cancel()
        }
    }

    pub fn cancel(&mut self) -> Option<DragEvent> {
        let event = match self.state {
            DragState::Idle => None,
            DragState::Hovering => Some(DragEvent::HoverOff),
            DragState::Dragging => Some(DragEvent::DragEnd),
        };
        self.state = DragState::Idle;
        event
    }

    pub fn pointer_moved(&mut self, ray: &Ray, subject: &SceneObject) -> Option<DragEvent> {
        if !self.enabled {
            return None;
        }
        match self.state {
            DragState::Dragging => {
                let distance = ray.intersect_plane(self.plane_point, self.plane_normal)?;
                Some(DragEvent::Drag(ray.at(distance) - self.grab_offset))
            }
            DragState::Hovering if !hit_test(ray, subject) => {
                self.state = DragState::Idle;
                Some(DragEvent::HoverOff)
            }
            DragState::Idle if hit_test(ray, subject) => {
                self.state = DragState::Hovering;
                Some(DragEvent::HoverOn)
            }
            _ => None,
        }
    }

    /// Starts a drag when pressed while hovering. The drag plane passes
    /// through the subject and faces the camera.
    pub fn pointer_down(
        &mut self,
        ray: &Ray,
        camera_forward: Vec3,
        subject: &SceneObject,
    ) -> Option<DragEvent> {
        if !self.enabled || self.state != DragState::Hovering {
            return None;
        }
        let position = subject.transform.position;
        let distance = ray.intersect_plane(position, camera_forward)?;
        self.plane_point = position;
        self.plane_normal = camera_forward;
        self.grab_offset = ray.at(distance) - position;
        self.state = DragState::Dragging;
        Some(DragEvent::DragStart)
    }

    pub fn pointer_up(&mut self) -> Option<DragEvent> {
        if self.state != DragState::Dragging {
            return None;
        }
        self.state = DragState::Idle;
        Some(DragEvent::DragEnd)
    }
}

/// Whether `ray` hits `object`'s shape, honoring its full transform.
pub fn hit_test(ray: &Ray, object: &SceneObject) -> bool {
    if !object.visible {
        return false;
    }
    let inverse = object.transform.matrix().inverse();
    let local = Ray {
        origin: inverse.transform_point3(ray.origin),
        direction: inverse.transform_vector3(ray.direction).normalize_or_zero(),
    };
    if local.direction == Vec3::ZERO {
        return false;
    }
    match object.shape {
        Shape::Box {
            width,
            height,
            depth,
        } => local
            .intersect_box(Vec3::new(width, height, depth) * 0.5)
            .is_some(),
        Shape::Sphere { radius, .. } => local.intersect_sphere(radius).is_some(),
        Shape::Plane { width, height } => local
            .intersect_plane(Vec3::ZERO, Vec3::Z)
            .map(|distance| local.at(distance))
            .is_some_and(|point| point.x.abs() <= width * 0.5 && point.y.abs() <= height * 0.5),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{create_scene, SceneVariant};

    fn ray_towards(target: Vec3) -> Ray {
        let origin = Vec3::new(0.0, 0.5, 5.0);
        Ray {
            origin,
            direction: (target - origin).normalize(),
        }
    }

    fn setup() -> (BindingRegistry, DragControls, SceneObject) {
        let registry = BindingRegistry::new();
        let scene = create_scene(SceneVariant::Cube);
        let mut controls = DragControls::bind(&registry, &scene);
        assert_eq!(controls.set_enabled(true), None);
        (registry, controls, scene.subject().clone())
    }

    #[test]
    fn starts_disabled() {
        let registry = BindingRegistry::new();
        let scene = create_scene(SceneVariant::Cube);
        let mut controls = DragControls::bind(&registry, &scene);
        assert!(!controls.is_enabled());
        let ray = ray_towards(scene.subject().transform.position);
        assert_eq!(controls.pointer_moved(&ray, scene.subject()), None);
        assert_eq!(controls.state(), DragState::Idle);
    }

    #[test]
    fn hover_press_drag_release() {
        let (_registry, mut controls, subject) = setup();
        let over = ray_towards(subject.transform.position);
        let away = ray_towards(Vec3::new(5.0, 0.5, 0.0));

        assert_eq!(controls.pointer_moved(&away, &subject), None);
        assert_eq!(controls.pointer_moved(&over, &subject), Some(DragEvent::HoverOn));
        assert_eq!(controls.state(), DragState::Hovering);
        assert_eq!(
            controls.pointer_down(&over, Vec3::NEG_Z, &subject),
            Some(DragEvent::DragStart)
        );
        assert_eq!(controls.state(), DragState::Dragging);

        let moved = ray_towards(Vec3::new(1.0, 0.5, 0.0));
        match controls.pointer_moved(&moved, &subject) {
            Some(DragEvent::Drag(position)) => {
                assert!((position - Vec3::new(1.0, 0.5, 0.0)).length() < 1e-4);
            }
            other => panic!("expected drag, got {other:?}"),
        }

        assert_eq!(controls.pointer_up(), Some(DragEvent::DragEnd));
        assert_eq!(controls.state(), DragState::Idle);
        assert_eq!(controls.pointer_up(), None);
    }

    #[test]
    fn hover_off_when_pointer_leaves() {
        let (_registry, mut controls, subject) = setup();
        let over = ray_towards(subject.transform.position);
        let away = ray_towards(Vec3::new(-4.0, 0.5, 0.0));
        controls.pointer_moved(&over, &subject);
        assert_eq!(controls.pointer_moved(&away, &subject), Some(DragEvent::HoverOff));
        assert_eq!(controls.state(), DragState::Idle);
    }

    #[test]
    fn press_without_hover_does_nothing() {
        let (_registry, mut controls, subject) = setup();
        let over = ray_towards(subject.transform.position);
        assert_eq!(controls.pointer_down(&over, Vec3::NEG_Z, &subject), None);
        assert_eq!(controls.state(), DragState::Idle);
    }

    #[test]
    fn disabling_mid_drag_forces_idle() {
        let (_registry, mut controls, subject) = setup();
        let over = ray_towards(subject.transform.position);
        controls.pointer_moved(&over, &subject);
        controls.pointer_down(&over, Vec3::NEG_Z, &subject);
        assert_eq!(controls.set_enabled(false), Some(DragEvent::DragEnd));
        assert_eq!(controls.state(), DragState::Idle);
    }

    #[test]
    fn hit_test_respects_rotation_and_shape() {
        let mut subject = create_scene(SceneVariant::Cube).subject().clone();
        // Corner direction just outside the unrotated face.
        let ray = ray_towards(Vec3::new(0.6, 0.5, 0.55));
        assert!(!hit_test(&ray, &subject));
        subject.transform.rotation.y = std::f32::consts::FRAC_PI_4;
        assert!(hit_test(&ray, &subject));

        let sphere = create_scene(SceneVariant::Sphere).subject().clone();
        assert!(hit_test(&ray_towards(Vec3::new(0.9, 0.5, 0.0)), &sphere));
        assert!(!hit_test(&ray_towards(Vec3::new(1.5, 0.5, 3.0)), &sphere));
    }
}
