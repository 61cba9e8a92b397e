use std::collections::BTreeMap;
use std::f32::consts::{FRAC_PI_4, TAU};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::color::{parse_color, to_hex};
use crate::error::{PanelError, ViewerError};
use crate::store::StateStore;
use crate::viewer::Viewer;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ControlKind {
    Number { min: f32, max: f32, step: f32 },
    Boolean,
    Color,
}

impl ControlKind {
    fn expected(&self) -> &'static str {
        match self {
            ControlKind::Number { .. } => "number",
            ControlKind::Boolean => "boolean",
            ControlKind::Color => "color",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControlSpec {
    /// `Folder/name`.
    pub path: &'static str,
    pub kind: ControlKind,
}

impl ControlSpec {
    pub fn folder(&self) -> &'static str {
        self.path.split_once('/').map_or("", |(folder, _)| folder)
    }

    pub fn name(&self) -> &'static str {
        self.path.split_once('/').map_or(self.path, |(_, name)| name)
    }

    /// Whether the control edits the current subject rather than a
    /// viewer-wide setting.
    pub fn is_subject(&self) -> bool {
        self.folder() == "Subject"
    }
}

const POSITION: ControlKind = ControlKind::Number {
    min: -5.0,
    max: 5.0,
    step: 0.5,
};
const UNIT: ControlKind = ControlKind::Number {
    min: 0.0,
    max: 1.0,
    step: 0.1,
};
const ANGLE: ControlKind = ControlKind::Number {
    min: -TAU,
    max: TAU,
    step: FRAC_PI_4,
};

pub const CONTROLS: &[ControlSpec] = &[
    ControlSpec {
        path: "Subject/pos x",
        kind: POSITION,
    },
    ControlSpec {
        path: "Subject/pos y",
        kind: POSITION,
    },
    ControlSpec {
        path: "Subject/pos z",
        kind: POSITION,
    },
    ControlSpec {
        path: "Subject/wireframe",
        kind: ControlKind::Boolean,
    },
    ControlSpec {
        path: "Subject/color",
        kind: ControlKind::Color,
    },
    ControlSpec {
        path: "Subject/metalness",
        kind: UNIT,
    },
    ControlSpec {
        path: "Subject/roughness",
        kind: UNIT,
    },
    ControlSpec {
        path: "Subject/rotate x",
        kind: ANGLE,
    },
    ControlSpec {
        path: "Subject/rotate y",
        kind: ANGLE,
    },
    ControlSpec {
        path: "Subject/rotate z",
        kind: ANGLE,
    },
    ControlSpec {
        path: "Subject/animated",
        kind: ControlKind::Boolean,
    },
    ControlSpec {
        path: "Controls/drag controls",
        kind: ControlKind::Boolean,
    },
    ControlSpec {
        path: "Lights/point light",
        kind: ControlKind::Boolean,
    },
    ControlSpec {
        path: "Lights/ambient light",
        kind: ControlKind::Boolean,
    },
    ControlSpec {
        path: "Helpers/axes",
        kind: ControlKind::Boolean,
    },
    ControlSpec {
        path: "Helpers/pointLight",
        kind: ControlKind::Boolean,
    },
    ControlSpec {
        path: "Camera/autoRotate",
        kind: ControlKind::Boolean,
    },
];

pub fn find_control(path: &str) -> Result<&'static ControlSpec, PanelError> {
    CONTROLS
        .iter()
        .find(|spec| spec.path == path)
        .ok_or_else(|| PanelError::UnknownControl(path.to_string()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlValue {
    Bool(bool),
    Number(f32),
    /// `#rrggbb`.
    Color(String),
}

impl ControlValue {
    pub fn parse(path: &str, raw: &str) -> Result<Self, PanelError> {
        let spec = find_control(path)?;
        let raw = raw.trim();
        let wrong_kind = || PanelError::WrongKind {
            path: path.to_string(),
            expected: spec.kind.expected(),
        };
        match spec.kind {
            ControlKind::Number { .. } => raw.parse().map(Self::Number).map_err(|_| wrong_kind()),
            ControlKind::Boolean => match raw.to_ascii_lowercase().as_str() {
                "true" | "on" | "1" | "yes" => Ok(Self::Bool(true)),
                "false" | "off" | "0" | "no" => Ok(Self::Bool(false)),
                _ => Err(wrong_kind()),
            },
            ControlKind::Color => Ok(Self::Color(raw.to_string())),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f32> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }
}

pub type PanelState = BTreeMap<String, ControlValue>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelLayout {
    pub title: &'static str,
    pub width: u32,
    pub closed: bool,
}

impl Default for PanelLayout {
    fn default() -> Self {
        Self {
            title: "Debug GUI",
            width: 300,
            closed: true,
        }
    }
}

/// Clamps `value` into `min..=max` and snaps it to the nearest step.
pub fn constrain(value: f32, min: f32, max: f32, step: f32) -> f32 {
    let clamped = value.clamp(min, max);
    if step <= 0.0 {
        return clamped;
    }
    let snapped = min + ((clamped - min) / step).round() * step;
    snapped.clamp(min, max)
}

#[derive(Debug)]
pub struct DebugPanel<S: StateStore> {
    store: S,
    key: String,
    layout: PanelLayout,
    defaults: PanelState,
    /// Last value of every control; survives scene switches.
    values: PanelState,
}

impl<S: StateStore> DebugPanel<S> {
    /// Captures the viewer's current values as defaults, then restores any
    /// persisted state. Unreadable or malformed state falls back to the
    /// defaults.
    pub fn attach(viewer: &mut Viewer, store: S) -> Self {
        let defaults = capture(viewer);
        let mut panel = Self {
            store,
            key: viewer.config().storage_key.clone(),
            layout: PanelLayout::default(),
            values: defaults.clone(),
            defaults,
        };

        match panel.store.load(&panel.key) {
            Ok(Some(raw)) => match serde_json::from_str::<PanelState>(&raw) {
                Ok(saved) => {
                    let applied = panel.apply_state(viewer, &saved);
                    info!("restored {applied} panel values from {}", panel.key);
                }
                Err(err) => warn!("discarding malformed panel state: {err}"),
            },
            Ok(None) => {}
            Err(err) => warn!("failed to load panel state: {err:#}"),
        }
        panel
    }

    pub fn controls(&self) -> &'static [ControlSpec] {
        CONTROLS
    }

    pub fn layout(&self) -> &PanelLayout {
        &self.layout
    }

    pub fn defaults(&self) -> &PanelState {
        &self.defaults
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn state(&self, viewer: &Viewer) -> PanelState {
        let mut state = self.values.clone();
        state.extend(capture(viewer));
        state
    }

    /// Live edit of one control. Returns the value actually applied.
    pub fn set(
        &mut self,
        viewer: &mut Viewer,
        path: &str,
        value: ControlValue,
    ) -> Result<ControlValue, PanelError> {
        let spec = find_control(path)?;
        let value = validate(spec, value)?;
        write(viewer, spec, &value);
        self.values.insert(spec.path.to_string(), value.clone());
        Ok(value)
    }

    pub fn finish_change(&mut self, viewer: &Viewer) -> Result<(), ViewerError> {
        let state = self.state(viewer);
        let json = serde_json::to_string(&state)
            .map_err(|err| ViewerError::Store(err.into()))?;
        self.store
            .save(&self.key, &json)
            .map_err(ViewerError::Store)
    }

    pub fn edit(
        &mut self,
        viewer: &mut Viewer,
        path: &str,
        value: ControlValue,
    ) -> Result<ControlValue, ViewerError> {
        let applied = self.set(viewer, path, value)?;
        self.finish_change(viewer)?;
        Ok(applied)
    }

    pub fn toggle(&mut self, viewer: &mut Viewer, path: &str) -> Result<bool, ViewerError> {
        let spec = find_control(path)?;
        let current = self
            .state(viewer)
            .get(spec.path)
            .and_then(ControlValue::as_bool)
            .ok_or_else(|| PanelError::WrongKind {
                path: path.to_string(),
                expected: spec.kind.expected(),
            })?;
        self.edit(viewer, path, ControlValue::Bool(!current))?;
        Ok(!current)
    }

    pub fn reset(&mut self, viewer: &mut Viewer) -> Result<(), ViewerError> {
        self.store.remove(&self.key).map_err(ViewerError::Store)?;
        let defaults = self.defaults.clone();
        self.apply_state(viewer, &defaults);
        info!("panel reset to defaults");
        Ok(())
    }

    /// Re-binds the panel after a scene switch: viewer-wide controls are
    /// re-applied to the new scene and subject controls re-read from the
    /// new subject, which also become their defaults.
    pub fn rebind(&mut self, viewer: &mut Viewer) {
        for spec in CONTROLS.iter().filter(|spec| !spec.is_subject()) {
            if let Some(value) = self.values.get(spec.path) {
                write(viewer, spec, value);
            }
        }
        let animated = "Subject/animated";
        if let Some(value) = self.values.get(animated).and_then(ControlValue::as_bool) {
            viewer.set_animation_enabled(value);
        }

        for (path, value) in capture(viewer) {
            let is_subject = find_control(&path).is_ok_and(|spec| spec.is_subject());
            if is_subject && path != animated {
                self.defaults.insert(path.clone(), value.clone());
            }
            self.values.insert(path, value);
        }
    }

    /// Applies every entry of `state` whose kind matches its control,
    /// skipping the rest. Values are restored as saved, without clamping or
    /// snapping. Returns the number of entries applied.
    fn apply_state(&mut self, viewer: &mut Viewer, state: &PanelState) -> usize {
        let mut applied = 0;
        for (path, value) in state {
            match self.restore(viewer, path, value.clone()) {
                Ok(()) => applied += 1,
                Err(err) => warn!("skipping persisted panel value: {err}"),
            }
        }
        applied
    }

    fn restore(
        &mut self,
        viewer: &mut Viewer,
        path: &str,
        value: ControlValue,
    ) -> Result<(), PanelError> {
        let spec = find_control(path)?;
        let value = check_kind(spec, value)?;
        write(viewer, spec, &value);
        self.values.insert(spec.path.to_string(), value);
        Ok(())
    }
}

/// Checks a live edit and clamps and snaps numbers to the control's grid.
fn validate(spec: &ControlSpec, value: ControlValue) -> Result<ControlValue, PanelError> {
    match (spec.kind, check_kind(spec, value)?) {
        (ControlKind::Number { min, max, step }, ControlValue::Number(number)) => {
            Ok(ControlValue::Number(constrain(number, min, max, step)))
        }
        (_, value) => Ok(value),
    }
}

fn check_kind(spec: &ControlSpec, value: ControlValue) -> Result<ControlValue, PanelError> {
    let wrong_kind = || PanelError::WrongKind {
        path: spec.path.to_string(),
        expected: spec.kind.expected(),
    };
    match (spec.kind, value) {
        (ControlKind::Number { .. }, ControlValue::Number(number)) if number.is_finite() => {
            Ok(ControlValue::Number(number))
        }
        (ControlKind::Boolean, ControlValue::Bool(flag)) => Ok(ControlValue::Bool(flag)),
        (ControlKind::Color, ControlValue::Color(raw)) => parse_color(&raw)
            .map(|color| ControlValue::Color(to_hex(color)))
            .ok_or(PanelError::InvalidColor(raw)),
        _ => Err(wrong_kind()),
    }
}

fn write(viewer: &mut Viewer, spec: &ControlSpec, value: &ControlValue) {
    match (spec.path, value) {
        ("Subject/animated", ControlValue::Bool(flag)) => viewer.set_animation_enabled(*flag),
        ("Controls/drag controls", ControlValue::Bool(flag)) => viewer.set_drag_enabled(*flag),
        ("Camera/autoRotate", ControlValue::Bool(flag)) => viewer.set_auto_rotate(*flag),
        (path, _) if spec.is_subject() => write_subject(viewer, path, value),
        (path, ControlValue::Bool(flag)) => {
            let Some(active) = viewer.active_mut() else {
                return;
            };
            let graph = &mut active.graph;
            match path {
                "Lights/point light" => graph.lights.point.visible = *flag,
                "Lights/ambient light" => graph.lights.ambient.visible = *flag,
                "Helpers/axes" => graph.helpers.axes.visible = *flag,
                "Helpers/pointLight" => graph.helpers.point_light.visible = *flag,
                _ => warn!("no live field for panel control {path}"),
            }
        }
        (path, _) => warn!("no live field for panel control {path}"),
    }
}

fn write_subject(viewer: &mut Viewer, path: &str, value: &ControlValue) {
    let Some(subject) = viewer.subject_mut() else {
        return;
    };
    let transform = &mut subject.transform;
    let material = &mut subject.material;
    match (path, value) {
        ("Subject/pos x", ControlValue::Number(n)) => transform.position.x = *n,
        ("Subject/pos y", ControlValue::Number(n)) => transform.position.y = *n,
        ("Subject/pos z", ControlValue::Number(n)) => transform.position.z = *n,
        ("Subject/rotate x", ControlValue::Number(n)) => transform.rotation.x = *n,
        ("Subject/rotate y", ControlValue::Number(n)) => transform.rotation.y = *n,
        ("Subject/rotate z", ControlValue::Number(n)) => transform.rotation.z = *n,
        ("Subject/metalness", ControlValue::Number(n)) => material.metalness = *n,
        ("Subject/roughness", ControlValue::Number(n)) => material.roughness = *n,
        ("Subject/wireframe", ControlValue::Bool(flag)) => material.wireframe = *flag,
        ("Subject/color", ControlValue::Color(hex)) => {
            if let Some(color) = parse_color(hex) {
                material.color = color;
            }
        }
        _ => warn!("no live field for panel control {path}"),
    }
}

fn capture(viewer: &Viewer) -> PanelState {
    let mut state = PanelState::new();
    let mut put = |path: &str, value: ControlValue| {
        state.insert(path.to_string(), value);
    };
    put("Subject/animated", ControlValue::Bool(viewer.animation_enabled()));
    put("Controls/drag controls", ControlValue::Bool(viewer.drag_enabled()));
    put("Camera/autoRotate", ControlValue::Bool(viewer.auto_rotate()));

    if let Some(active) = viewer.active() {
        let lights = &active.graph.lights;
        let helpers = &active.graph.helpers;
        put("Lights/point light", ControlValue::Bool(lights.point.visible));
        put("Lights/ambient light", ControlValue::Bool(lights.ambient.visible));
        put("Helpers/axes", ControlValue::Bool(helpers.axes.visible));
        put("Helpers/pointLight", ControlValue::Bool(helpers.point_light.visible));
    }
    if let Some(subject) = viewer.subject() {
        let position = subject.transform.position;
        let rotation = subject.transform.rotation;
        let material = &subject.material;
        put("Subject/pos x", ControlValue::Number(position.x));
        put("Subject/pos y", ControlValue::Number(position.y));
        put("Subject/pos z", ControlValue::Number(position.z));
        put("Subject/rotate x", ControlValue::Number(rotation.x));
        put("Subject/rotate y", ControlValue::Number(rotation.y));
        put("Subject/rotate z", ControlValue::Number(rotation.z));
        put("Subject/metalness", ControlValue::Number(material.metalness));
        put("Subject/roughness", ControlValue::Number(material.roughness));
        put("Subject/wireframe", ControlValue::Bool(material.wireframe));
        put("Subject/color", ControlValue::Color(to_hex(material.color)));
    }
    state
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::config::STATE_KEY;
    use crate::input::{PointerButton, PointerEvent};
    use crate::render::HeadlessSurface;
    use crate::store::MemoryStore;

    fn attached(store: &MemoryStore) -> (Viewer, DebugPanel<MemoryStore>) {
        let mut viewer = Viewer::default();
        viewer.select_scene("0");
        let panel = DebugPanel::attach(&mut viewer, store.clone());
        (viewer, panel)
    }

    fn number(state: &PanelState, path: &str) -> f32 {
        state[path].as_number().unwrap()
    }

    #[test]
    fn defaults_match_the_cube_scene() {
        let (viewer, panel) = attached(&MemoryStore::new());
        let defaults = panel.defaults();
        assert_eq!(defaults.len(), CONTROLS.len());
        assert_eq!(number(defaults, "Subject/pos y"), 0.5);
        assert_eq!(defaults["Subject/color"], ControlValue::Color("#f69f1f".into()));
        assert_eq!(defaults["Controls/drag controls"], ControlValue::Bool(false));
        assert_eq!(defaults["Helpers/axes"], ControlValue::Bool(false));
        assert_eq!(panel.state(&viewer), *defaults);
        assert_eq!(panel.layout().title, "Debug GUI");
        assert!(panel.layout().closed);
    }

    #[test]
    fn numbers_are_clamped_and_snapped() {
        let store = MemoryStore::new();
        let (mut viewer, mut panel) = attached(&store);
        let applied = panel
            .set(&mut viewer, "Subject/pos x", ControlValue::Number(7.3))
            .unwrap();
        assert_eq!(applied, ControlValue::Number(5.0));
        panel
            .set(&mut viewer, "Subject/pos x", ControlValue::Number(1.26))
            .unwrap();
        assert_eq!(viewer.subject().unwrap().transform.position.x, 1.5);
        let applied = panel
            .set(&mut viewer, "Subject/rotate y", ControlValue::Number(0.8))
            .unwrap();
        assert!((applied.as_number().unwrap() - FRAC_PI_4).abs() < 1e-5);
        assert!((constrain(0.34, 0.0, 1.0, 0.1) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn wrong_kinds_are_rejected() {
        let (mut viewer, mut panel) = attached(&MemoryStore::new());
        assert_eq!(
            panel.set(&mut viewer, "Subject/wireframe", ControlValue::Number(1.0)),
            Err(PanelError::WrongKind {
                path: "Subject/wireframe".into(),
                expected: "boolean",
            })
        );
        assert_eq!(
            panel.set(&mut viewer, "Subject/size", ControlValue::Number(1.0)),
            Err(PanelError::UnknownControl("Subject/size".into()))
        );
        assert_eq!(
            panel.set(&mut viewer, "Subject/color", ControlValue::Color("nope".into())),
            Err(PanelError::InvalidColor("nope".into()))
        );
        assert!(panel
            .set(&mut viewer, "Subject/pos y", ControlValue::Number(f32::NAN))
            .is_err());
    }

    #[test]
    fn persisted_state_round_trips() {
        let store = MemoryStore::new();
        let (mut viewer, mut panel) = attached(&store);
        panel
            .set(&mut viewer, "Subject/pos y", ControlValue::Number(2.0))
            .unwrap();
        panel
            .set(&mut viewer, "Subject/color", ControlValue::Color("red".into()))
            .unwrap();
        panel
            .set(&mut viewer, "Helpers/axes", ControlValue::Bool(true))
            .unwrap();
        panel
            .edit(&mut viewer, "Controls/drag controls", ControlValue::Bool(true))
            .unwrap();
        let saved = panel.state(&viewer);

        let (fresh_viewer, fresh_panel) = attached(&store);
        assert_eq!(fresh_panel.state(&fresh_viewer), saved);
        assert!(fresh_viewer.drag_enabled());
        assert_eq!(fresh_viewer.subject().unwrap().transform.position.y, 2.0);
        assert!(fresh_viewer.active().unwrap().graph.helpers.axes.visible);
    }

    #[test]
    fn off_grid_values_survive_a_reload() {
        const SIZE: (u32, u32) = (800, 600);
        let center = Vec2::new(400.0, 300.0);
        let store = MemoryStore::new();
        let (mut viewer, mut panel) = attached(&store);
        let mut surface = HeadlessSurface::new(SIZE);
        viewer.tick(0.0, SIZE, &mut surface).unwrap();

        panel
            .edit(&mut viewer, "Controls/drag controls", ControlValue::Bool(true))
            .unwrap();
        viewer.handle_pointer(&PointerEvent::Moved { position: center });
        viewer.handle_pointer(&PointerEvent::Pressed {
            button: PointerButton::PRIMARY,
            position: center,
        });
        let dropped = center + Vec2::new(37.0, -11.0);
        viewer.handle_pointer(&PointerEvent::Moved { position: dropped });
        viewer.handle_pointer(&PointerEvent::Released {
            button: PointerButton::PRIMARY,
            position: dropped,
        });
        panel.finish_change(&viewer).unwrap();
        let saved = panel.state(&viewer);
        let x = number(&saved, "Subject/pos x");
        assert_ne!(x, constrain(x, -5.0, 5.0, 0.5), "drag should leave the grid");

        let (fresh_viewer, fresh_panel) = attached(&store);
        assert_eq!(fresh_panel.state(&fresh_viewer), saved);

        let (mut viewer, mut panel) = attached(&store);
        viewer.set_animation_enabled(true);
        let mut surface = HeadlessSurface::new(SIZE);
        for _ in 0..1200 {
            viewer.tick(1.0 / 60.0, SIZE, &mut surface).unwrap();
        }
        panel.finish_change(&viewer).unwrap();
        let saved = panel.state(&viewer);
        let rotation = number(&saved, "Subject/rotate x");
        assert!((0.0..TAU).contains(&rotation));

        let (fresh_viewer, fresh_panel) = attached(&store);
        assert_eq!(fresh_panel.state(&fresh_viewer), saved);
    }

    #[test]
    fn reset_clears_store_and_restores_defaults() {
        let store = MemoryStore::new();
        let (mut viewer, mut panel) = attached(&store);
        panel
            .edit(&mut viewer, "Subject/wireframe", ControlValue::Bool(true))
            .unwrap();
        assert!(store.contains(STATE_KEY));

        panel.reset(&mut viewer).unwrap();
        assert!(!store.contains(STATE_KEY));
        assert_eq!(panel.state(&viewer), *panel.defaults());
        assert!(!viewer.subject().unwrap().material.wireframe);
    }

    #[test]
    fn malformed_state_yields_defaults() {
        let mut store = MemoryStore::new();
        store.save(STATE_KEY, "{\"Subject/pos x\": ").unwrap();
        let (viewer, panel) = attached(&store);
        assert_eq!(panel.state(&viewer), *panel.defaults());
    }

    #[test]
    fn bad_entries_are_skipped_individually() {
        let mut store = MemoryStore::new();
        store
            .save(
                STATE_KEY,
                r#"{"Subject/pos x": "left", "Unknown/thing": true, "Subject/pos z": 3}"#,
            )
            .unwrap();
        let (viewer, _panel) = attached(&store);
        let position = viewer.subject().unwrap().transform.position;
        assert_eq!(position.x, 0.0);
        assert_eq!(position.z, 3.0);
    }

    #[test]
    fn rebind_carries_viewer_settings_to_new_scene() {
        let (mut viewer, mut panel) = attached(&MemoryStore::new());
        panel
            .set(&mut viewer, "Lights/point light", ControlValue::Bool(false))
            .unwrap();
        panel
            .set(&mut viewer, "Subject/animated", ControlValue::Bool(true))
            .unwrap();
        panel
            .set(&mut viewer, "Subject/color", ControlValue::Color("#00ff00".into()))
            .unwrap();

        viewer.select_scene("1");
        panel.rebind(&mut viewer);

        let active = viewer.active().unwrap();
        assert!(!active.graph.lights.point.visible);
        assert!(viewer.animation_enabled());
        let state = panel.state(&viewer);
        assert_eq!(state["Subject/color"], ControlValue::Color("#0000ff".into()));
        assert_eq!(panel.defaults()["Subject/color"], ControlValue::Color("#0000ff".into()));
        assert_eq!(state["Lights/point light"], ControlValue::Bool(false));
    }

    #[test]
    fn parses_cli_values_by_kind() {
        assert_eq!(
            ControlValue::parse("Subject/pos x", "1.5"),
            Ok(ControlValue::Number(1.5))
        );
        assert_eq!(
            ControlValue::parse("Helpers/axes", "on"),
            Ok(ControlValue::Bool(true))
        );
        assert!(ControlValue::parse("Helpers/axes", "maybe").is_err());
        assert_eq!(
            ControlValue::parse("Subject/color", " #123456 "),
            Ok(ControlValue::Color("#123456".into()))
        );
    }

    #[test]
    fn toggle_flips_and_persists() {
        let store = MemoryStore::new();
        let (mut viewer, mut panel) = attached(&store);
        assert!(panel.toggle(&mut viewer, "Camera/autoRotate").unwrap());
        assert!(viewer.auto_rotate());
        assert!(store.contains(STATE_KEY));
        assert!(panel.toggle(&mut viewer, "Subject/pos x").is_err());
    }
}
