use std::sync::Arc;

use glam::Vec3;
use log::{info, warn};

use crate::animation::AnimationFlags;
use crate::camera::{aspect_ratio, pointer_to_ndc, Camera, Ray};
use crate::color::{BLACK, ORANGE};
use crate::config::ViewerConfig;
use crate::controls::{
    BindingRegistry, DragControls, DragEvent, DragState, OrbitControls, OrbitGesture,
};
use crate::error::ViewerError;
use crate::input::{PointerButton, PointerEvent};
use crate::render::RenderSurface;
use crate::render_loop::{FrameInput, FrameReport, RenderLoop};
use crate::scene::{create_scene, SceneDescriptor, SceneObject, SceneVariant};
use crate::scene_graph::SceneGraph;

const DRAG_OPACITY: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Preferences {
    pub drag_enabled: bool,
    pub auto_rotate: bool,
}

/// The selected scene together with the controls bound to it.
///
/// Dropping it releases the orbit and drag bindings.
#[derive(Debug)]
pub struct ActiveScene {
    descriptor: Arc<SceneDescriptor>,
    pub graph: SceneGraph,
    pub orbit: OrbitControls,
    pub drag: DragControls,
}

impl ActiveScene {
    pub fn descriptor(&self) -> &Arc<SceneDescriptor> {
        &self.descriptor
    }

    pub fn subject(&self) -> Option<&SceneObject> {
        self.graph.get(self.drag.subject())
    }

    pub fn subject_mut(&mut self) -> Option<&mut SceneObject> {
        self.graph.get_mut(self.drag.subject())
    }

    fn apply_drag_event(&mut self, animation: &mut AnimationFlags, event: DragEvent) {
        match event {
            DragEvent::HoverOn => {
                if let Some(subject) = self.subject_mut() {
                    subject.material.emissive = ORANGE;
                }
            }
            DragEvent::HoverOff => {
                if let Some(subject) = self.subject_mut() {
                    subject.material.emissive = BLACK;
                }
            }
            DragEvent::DragStart => {
                self.orbit.set_enabled(false);
                animation.playing = false;
                if let Some(subject) = self.subject_mut() {
                    subject.material.emissive = BLACK;
                    subject.material.transparent = true;
                    subject.material.opacity = DRAG_OPACITY;
                }
            }
            DragEvent::Drag(position) => {
                self.graph.set_position(self.drag.subject(), position);
            }
            DragEvent::DragEnd => {
                self.orbit.set_enabled(true);
                animation.playing = true;
                if let Some(subject) = self.subject_mut() {
                    subject.material.emissive = BLACK;
                    subject.material.transparent = false;
                    subject.material.opacity = 1.0;
                }
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct ViewerState {
    pub active: Option<ActiveScene>,
    /// Created on the first scene selection.
    pub camera: Option<Camera>,
    pub animation: AnimationFlags,
    pub preferences: Preferences,
    /// Last display size seen by the render loop.
    pub viewport: (u32, u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneSwitch {
    pub variant: SceneVariant,
    /// The requested index was invalid and the first scene was used.
    pub fell_back: bool,
    /// The render loop was idle and has been started; the host should
    /// schedule a frame.
    pub loop_started: bool,
}

/// Lifecycle controller: owns the active scene, camera and controls.
#[derive(Debug, Default)]
pub struct Viewer {
    config: ViewerConfig,
    state: ViewerState,
    bindings: BindingRegistry,
    render_loop: RenderLoop,
}

impl Viewer {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn bindings(&self) -> &BindingRegistry {
        &self.bindings
    }

    pub fn render_loop(&self) -> &RenderLoop {
        &self.render_loop
    }

    pub fn active(&self) -> Option<&ActiveScene> {
        self.state.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut ActiveScene> {
        self.state.active.as_mut()
    }

    pub fn subject(&self) -> Option<&SceneObject> {
        self.active().and_then(ActiveScene::subject)
    }

    pub fn subject_mut(&mut self) -> Option<&mut SceneObject> {
        self.active_mut().and_then(ActiveScene::subject_mut)
    }

    pub fn drag_state(&self) -> DragState {
        self.active()
            .map_or(DragState::Idle, |active| active.drag.state())
    }

    /// Selects a scene from raw user input, falling back to the first
    /// scene when the input is not a valid index.
    pub fn select_scene(&mut self, raw: &str) -> SceneSwitch {
        let resolution = SceneVariant::resolve(raw);
        if resolution.fell_back {
            warn!(
                "invalid scene index {raw:?}; falling back to {}",
                resolution.variant
            );
        }
        let switch = self.select_variant(resolution.variant);
        SceneSwitch {
            fell_back: resolution.fell_back,
            ..switch
        }
    }

    pub fn select_variant(&mut self, variant: SceneVariant) -> SceneSwitch {
        if let Some(mut previous) = self.state.active.take() {
            if let Some(event) = previous.drag.cancel() {
                previous.apply_drag_event(&mut self.state.animation, event);
            }
            info!("leaving scene {}", previous.descriptor.variant());
        }

        let descriptor = Arc::new(create_scene(variant));
        let (width, height) = self.state.viewport;
        let camera_config = self.config.camera;
        self.state
            .camera
            .get_or_insert_with(|| Camera::new(&camera_config, aspect_ratio(width, height)));

        let preferences = self.state.preferences;
        let mut orbit = OrbitControls::bind(&self.bindings, &descriptor);
        orbit.enable_damping = self.config.orbit_damping;
        orbit.auto_rotate = preferences.auto_rotate;
        let mut drag = DragControls::bind(&self.bindings, &descriptor);
        drag.set_enabled(preferences.drag_enabled);

        self.state.active = Some(ActiveScene {
            graph: SceneGraph::instantiate(&descriptor),
            descriptor,
            orbit,
            drag,
        });
        info!("selected scene {variant}");

        SceneSwitch {
            variant,
            fell_back: false,
            loop_started: self.render_loop.start(),
        }
    }

    pub fn set_drag_enabled(&mut self, enabled: bool) {
        self.state.preferences.drag_enabled = enabled;
        let animation = &mut self.state.animation;
        if let Some(active) = self.state.active.as_mut() {
            if let Some(event) = active.drag.set_enabled(enabled) {
                active.apply_drag_event(animation, event);
            }
        }
    }

    pub fn drag_enabled(&self) -> bool {
        self.state.preferences.drag_enabled
    }

    pub fn set_auto_rotate(&mut self, enabled: bool) {
        self.state.preferences.auto_rotate = enabled;
        if let Some(active) = self.state.active.as_mut() {
            active.orbit.auto_rotate = enabled;
        }
    }

    pub fn auto_rotate(&self) -> bool {
        self.state.preferences.auto_rotate
    }

    pub fn set_animation_enabled(&mut self, enabled: bool) {
        self.state.animation.enabled = enabled;
    }

    pub fn animation_enabled(&self) -> bool {
        self.state.animation.enabled
    }

    /// Applies a drag transition produced outside [`Viewer::handle_pointer`].
    pub fn apply_drag_event(&mut self, event: DragEvent) {
        let animation = &mut self.state.animation;
        if let Some(active) = self.state.active.as_mut() {
            active.apply_drag_event(animation, event);
        }
    }

    pub fn handle_pointer(&mut self, event: &PointerEvent) {
        let Some(camera) = self.state.camera else {
            return;
        };
        let viewport = self.state.viewport;
        let animation = &mut self.state.animation;
        let Some(active) = self.state.active.as_mut() else {
            return;
        };
        let ray_at = |position| camera.ray_from_ndc(pointer_to_ndc(position, viewport));

        match *event {
            PointerEvent::Moved { position } => {
                if let Some(event) = hover(active, &ray_at(position)) {
                    active.apply_drag_event(animation, event);
                }
                active.orbit.pointer_moved(position, viewport, &camera);
            }
            PointerEvent::Pressed { button, position } => {
                let ray = ray_at(position);
                if let Some(event) = hover(active, &ray) {
                    active.apply_drag_event(animation, event);
                }
                if button == PointerButton::PRIMARY {
                    if let Some(event) = grab(active, &ray, camera.forward()) {
                        active.apply_drag_event(animation, event);
                    }
                }
                let gesture = match button {
                    PointerButton::PRIMARY => Some(OrbitGesture::Rotate),
                    PointerButton::SECONDARY => Some(OrbitGesture::Pan),
                    _ => None,
                };
                if let Some(gesture) = gesture {
                    active.orbit.begin(gesture, position);
                }
            }
            PointerEvent::Released { .. } => {
                if let Some(event) = active.drag.pointer_up() {
                    active.apply_drag_event(animation, event);
                }
                active.orbit.end();
            }
            PointerEvent::Wheel { delta_y } => active.orbit.wheel(delta_y),
        }
    }

    pub fn tick(
        &mut self,
        delta: f32,
        display_size: (u32, u32),
        surface: &mut dyn RenderSurface,
    ) -> Result<Option<FrameReport>, ViewerError> {
        self.render_loop.tick(
            &mut self.state,
            FrameInput {
                delta,
                display_size,
            },
            surface,
        )
    }

    pub fn stop(&mut self) {
        self.render_loop.stop();
    }
}

fn hover(active: &mut ActiveScene, ray: &Ray) -> Option<DragEvent> {
    let ActiveScene { graph, drag, .. } = active;
    let subject = graph.get(drag.subject())?;
    drag.pointer_moved(ray, subject)
}

fn grab(active: &mut ActiveScene, ray: &Ray, camera_forward: Vec3) -> Option<DragEvent> {
    let ActiveScene { graph, drag, .. } = active;
    let subject = graph.get(drag.subject())?;
    drag.pointer_down(ray, camera_forward, subject)
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::controls::BindingKind;
    use crate::render::HeadlessSurface;

    const SIZE: (u32, u32) = (800, 600);
    const CENTER: Vec2 = Vec2::new(400.0, 300.0);

    fn ready_viewer(raw: &str) -> (Viewer, HeadlessSurface) {
        let mut viewer = Viewer::default();
        viewer.select_scene(raw);
        let mut surface = HeadlessSurface::new(SIZE);
        viewer.tick(0.0, SIZE, &mut surface).unwrap();
        (viewer, surface)
    }

    fn press(viewer: &mut Viewer, position: Vec2) {
        viewer.handle_pointer(&PointerEvent::Moved { position });
        viewer.handle_pointer(&PointerEvent::Pressed {
            button: PointerButton::PRIMARY,
            position,
        });
    }

    fn release(viewer: &mut Viewer, position: Vec2) {
        viewer.handle_pointer(&PointerEvent::Released {
            button: PointerButton::PRIMARY,
            position,
        });
    }

    #[test]
    fn every_valid_index_leaves_one_scene_and_its_bindings() {
        let mut viewer = Viewer::default();
        for raw in ["0", "1", "1", "0"] {
            let switch = viewer.select_scene(raw);
            assert!(!switch.fell_back);
            let active = viewer.active().unwrap();
            let id = active.descriptor().id();
            assert_eq!(viewer.bindings().len(), 2);
            assert_eq!(viewer.bindings().bindings_for(id).len(), 2);
        }
    }

    #[test]
    fn invalid_index_falls_back_to_cube() {
        let mut viewer = Viewer::default();
        for raw in ["-1", "2", "7", "abc", "", "1.5"] {
            let switch = viewer.select_scene(raw);
            assert!(switch.fell_back, "{raw:?} should fall back");
            assert_eq!(switch.variant, SceneVariant::Cube);
            assert_eq!(viewer.subject().unwrap().shape.kind(), "box");
        }
        assert_eq!(viewer.bindings().len(), 2);
    }

    #[test]
    fn loop_starts_once() {
        let mut viewer = Viewer::default();
        assert!(!viewer.render_loop().is_running());
        assert!(viewer.select_scene("0").loop_started);
        assert!(!viewer.select_scene("1").loop_started);
        assert!(viewer.render_loop().is_running());
    }

    #[test]
    fn camera_is_created_once() {
        let (mut viewer, mut surface) = ready_viewer("0");
        viewer.handle_pointer(&PointerEvent::Wheel { delta_y: -1.0 });
        viewer.tick(0.1, SIZE, &mut surface).unwrap();
        let camera = viewer.state().camera.unwrap();
        viewer.select_scene("1");
        assert_eq!(viewer.state().camera.unwrap(), camera);
    }

    #[test]
    fn hover_highlights_subject() {
        let (mut viewer, _surface) = ready_viewer("0");
        viewer.set_drag_enabled(true);
        viewer.handle_pointer(&PointerEvent::Moved { position: CENTER });
        assert_eq!(viewer.drag_state(), DragState::Hovering);
        assert_eq!(viewer.subject().unwrap().material.emissive, ORANGE);

        viewer.handle_pointer(&PointerEvent::Moved {
            position: Vec2::new(5.0, 5.0),
        });
        assert_eq!(viewer.drag_state(), DragState::Idle);
        assert_eq!(viewer.subject().unwrap().material.emissive, BLACK);
    }

    #[test]
    fn drag_disables_orbit_until_release() {
        let (mut viewer, _surface) = ready_viewer("0");
        viewer.set_drag_enabled(true);
        viewer.set_animation_enabled(true);

        press(&mut viewer, CENTER);
        assert_eq!(viewer.drag_state(), DragState::Dragging);
        let active = viewer.active().unwrap();
        assert!(!active.orbit.enabled);
        assert!(!viewer.state().animation.playing);
        assert_eq!(viewer.subject().unwrap().material.opacity, DRAG_OPACITY);

        let start = viewer.subject().unwrap().transform.position;
        viewer.handle_pointer(&PointerEvent::Moved {
            position: CENTER + Vec2::new(60.0, 0.0),
        });
        let moved = viewer.subject().unwrap().transform.position;
        assert!(moved.x > start.x);

        release(&mut viewer, CENTER);
        assert_eq!(viewer.drag_state(), DragState::Idle);
        assert!(viewer.active().unwrap().orbit.enabled);
        assert!(viewer.state().animation.playing);
        assert_eq!(viewer.subject().unwrap().material.opacity, 1.0);
    }

    #[test]
    fn drag_does_nothing_while_disabled() {
        let (mut viewer, _surface) = ready_viewer("0");
        press(&mut viewer, CENTER);
        assert_eq!(viewer.drag_state(), DragState::Idle);
        assert!(viewer.active().unwrap().orbit.enabled);
    }

    #[test]
    fn switching_mid_drag_forces_idle() {
        let (mut viewer, _surface) = ready_viewer("0");
        viewer.set_drag_enabled(true);
        press(&mut viewer, CENTER);
        assert_eq!(viewer.drag_state(), DragState::Dragging);
        let cube_scene = viewer.active().unwrap().descriptor().id();

        viewer.select_scene("1");
        assert_eq!(viewer.drag_state(), DragState::Idle);
        assert!(viewer.state().animation.playing);
        let active = viewer.active().unwrap();
        assert!(active.orbit.enabled);
        assert!(active.drag.is_enabled());
        assert!(viewer.bindings().bindings_for(cube_scene).is_empty());

        // Releasing after the switch is a no-op for the new scene.
        release(&mut viewer, CENTER);
        assert_eq!(viewer.drag_state(), DragState::Idle);
    }

    #[test]
    fn disabling_drag_mid_drag_restores_orbit() {
        let (mut viewer, _surface) = ready_viewer("0");
        viewer.set_drag_enabled(true);
        press(&mut viewer, CENTER);
        viewer.set_drag_enabled(false);
        assert_eq!(viewer.drag_state(), DragState::Idle);
        assert!(viewer.active().unwrap().orbit.enabled);
        assert_eq!(viewer.subject().unwrap().material.opacity, 1.0);
    }

    #[test]
    fn sphere_then_cube_leaves_no_sphere_binding() {
        let mut viewer = Viewer::default();
        viewer.select_scene("1");
        let sphere_scene = viewer.active().unwrap().descriptor().id();
        viewer.select_scene("0");

        let active = viewer.active().unwrap();
        assert_eq!(active.subject().unwrap().shape.kind(), "box");
        assert_eq!(active.drag.binding().entity, active.descriptor().subject_id());
        assert!(viewer
            .bindings()
            .bindings()
            .iter()
            .all(|binding| binding.scene != sphere_scene));
        let kinds: Vec<_> = viewer
            .bindings()
            .bindings()
            .iter()
            .map(|binding| binding.kind)
            .collect();
        assert_eq!(kinds, vec![BindingKind::Orbit, BindingKind::Drag]);
    }

    #[test]
    fn preferences_carry_over() {
        let mut viewer = Viewer::default();
        viewer.set_auto_rotate(true);
        viewer.set_drag_enabled(true);
        viewer.select_scene("1");
        let active = viewer.active().unwrap();
        assert!(active.orbit.auto_rotate);
        assert!(active.drag.is_enabled());
        assert!(viewer.drag_enabled());
    }
}
