use log::info;

use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::input::{PointerEvent, Shortcut};
use crate::panel::{ControlValue, DebugPanel, PanelState};
use crate::render::RenderSurface;
use crate::render_loop::FrameReport;
use crate::store::StateStore;
use crate::viewer::{SceneSwitch, Viewer};

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerCommand {
    SelectScene(String),
    SetControl { path: String, raw: String },
    Toggle(String),
    ResetPanel,
    Pointer(PointerEvent),
}

/// A viewer together with the debug panel bound to it.
///
/// Hosts own one of these and forward their platform events to it.
#[derive(Debug)]
pub struct ViewerApp<S: StateStore> {
    viewer: Viewer,
    panel: DebugPanel<S>,
}

impl<S: StateStore> ViewerApp<S> {
    /// Selects the initial scene from raw input, then attaches the panel so
    /// its defaults reflect that scene before persisted state is applied.
    pub fn new(config: ViewerConfig, store: S, scene: &str) -> (Self, SceneSwitch) {
        let mut viewer = Viewer::new(config);
        let switch = viewer.select_scene(scene);
        let panel = DebugPanel::attach(&mut viewer, store);
        (Self { viewer, panel }, switch)
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn panel(&self) -> &DebugPanel<S> {
        &self.panel
    }

    pub fn panel_state(&self) -> PanelState {
        self.panel.state(&self.viewer)
    }

    pub fn fps(&self) -> f32 {
        self.viewer.render_loop().stats().fps()
    }

    pub fn select_scene(&mut self, raw: &str) -> SceneSwitch {
        let switch = self.viewer.select_scene(raw);
        self.panel.rebind(&mut self.viewer);
        switch
    }

    pub fn apply(&mut self, command: ViewerCommand) -> Result<(), ViewerError> {
        match command {
            ViewerCommand::SelectScene(raw) => {
                self.select_scene(&raw);
            }
            ViewerCommand::SetControl { path, raw } => {
                let value = ControlValue::parse(&path, &raw)?;
                let applied = self.panel.edit(&mut self.viewer, &path, value)?;
                info!("{path} = {applied:?}");
            }
            ViewerCommand::Toggle(path) => {
                let value = self.panel.toggle(&mut self.viewer, &path)?;
                info!("{path} = {value}");
            }
            ViewerCommand::ResetPanel => self.panel.reset(&mut self.viewer)?,
            ViewerCommand::Pointer(event) => self.viewer.handle_pointer(&event),
        }
        Ok(())
    }

    pub fn shortcut(&mut self, shortcut: Shortcut) -> Result<(), ViewerError> {
        let command = match shortcut {
            Shortcut::SelectScene(index) => ViewerCommand::SelectScene(index.to_string()),
            Shortcut::Toggle(path) => ViewerCommand::Toggle(path.to_string()),
            Shortcut::ResetPanel => ViewerCommand::ResetPanel,
        };
        self.apply(command)
    }

    pub fn tick(
        &mut self,
        delta: f32,
        display_size: (u32, u32),
        surface: &mut dyn RenderSurface,
    ) -> Result<Option<FrameReport>, ViewerError> {
        self.viewer.tick(delta, display_size, surface)
    }

    pub fn shutdown(&mut self) {
        self.viewer.stop();
    }
}

pub fn print_summary<S: StateStore>(app: &ViewerApp<S>) {
    let Some(active) = app.viewer().active() else {
        println!("No scene selected");
        return;
    };
    let graph = &active.graph;
    println!(
        "Scene {}: {} objects, subject {}",
        active.descriptor().variant(),
        graph.objects().len(),
        active
            .subject()
            .map_or("<none>", |subject| subject.name.as_str())
    );
    let lights = &graph.lights;
    println!(
        " - point light intensity={:.2} visible={}",
        lights.point.intensity, lights.point.visible
    );
    println!(
        " - ambient light intensity={:.2} visible={}",
        lights.ambient.intensity, lights.ambient.visible
    );
}

pub fn print_final_state<S: StateStore>(app: &ViewerApp<S>) {
    println!("Final object states:");
    if let Some(active) = app.viewer().active() {
        for object in active.graph.objects() {
            let position = object.transform.position;
            println!(
                " - {} ({}) pos=({:.2}, {:.2}, {:.2}) color={}",
                object.name,
                object.shape.kind(),
                position.x,
                position.y,
                position.z,
                crate::color::to_hex(object.material.color)
            );
        }
    }
    println!("Panel state:");
    for (path, value) in app.panel_state() {
        let value = match value {
            ControlValue::Bool(flag) => flag.to_string(),
            ControlValue::Number(number) => format!("{number:.2}"),
            ControlValue::Color(hex) => hex,
        };
        println!(" - {path} = {value}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::STATE_KEY;
    use crate::render::HeadlessSurface;
    use crate::store::MemoryStore;

    fn app(store: &MemoryStore, scene: &str) -> ViewerApp<MemoryStore> {
        ViewerApp::new(ViewerConfig::default(), store.clone(), scene).0
    }

    #[test]
    fn new_reports_fallback() {
        let (app, switch) = ViewerApp::new(ViewerConfig::default(), MemoryStore::new(), "9");
        assert!(switch.fell_back);
        assert!(switch.loop_started);
        assert_eq!(app.viewer().subject().unwrap().name, "Cube");
    }

    #[test]
    fn set_control_parses_and_persists() {
        let store = MemoryStore::new();
        let mut app = app(&store, "0");
        app.apply(ViewerCommand::SetControl {
            path: "Subject/pos x".into(),
            raw: "2".into(),
        })
        .unwrap();
        assert_eq!(app.viewer().subject().unwrap().transform.position.x, 2.0);
        assert!(store.contains(STATE_KEY));

        let err = app
            .apply(ViewerCommand::SetControl {
                path: "Helpers/axes".into(),
                raw: "sideways".into(),
            })
            .unwrap_err();
        assert!(matches!(err, ViewerError::Panel(_)));
    }

    #[test]
    fn shortcuts_switch_scenes_and_toggle() {
        let mut app = app(&MemoryStore::new(), "0");
        app.shortcut(Shortcut::Toggle("Helpers/axes")).unwrap();
        app.shortcut(Shortcut::SelectScene(1)).unwrap();
        assert_eq!(app.viewer().subject().unwrap().name, "Sphere");
        assert!(app.viewer().active().unwrap().graph.helpers.axes.visible);

        app.shortcut(Shortcut::ResetPanel).unwrap();
        assert!(!app.viewer().active().unwrap().graph.helpers.axes.visible);
    }

    #[test]
    fn shutdown_stops_the_loop() {
        let store = MemoryStore::new();
        let mut app = app(&store, "1");
        let mut surface = HeadlessSurface::new((640, 480));
        assert!(app.tick(0.016, (640, 480), &mut surface).unwrap().is_some());
        assert!((app.fps() - 62.5).abs() < 1e-3);
        app.shutdown();
        assert!(!app.viewer().render_loop().is_running());
        assert!(!store.contains(STATE_KEY));
        assert!(app.tick(0.016, (640, 480), &mut surface).unwrap().is_none());
    }
}
