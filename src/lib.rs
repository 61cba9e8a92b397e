//! A minimal 3D scene viewer.
//!
//! The core (scene factory, lifecycle controller, render loop, controls and
//! debug panel) is platform free and drives any [`render::RenderSurface`];
//! the native binary and the `wasm32` [`web`] module only translate platform
//! events into calls on [`app::ViewerApp`].

pub mod animation;
pub mod app;
pub mod camera;
pub mod color;
pub mod config;
pub mod controls;
pub mod error;
pub mod input;
pub mod loading;
pub mod mesh;
pub mod panel;
pub mod render;
pub mod render_loop;
pub mod scene;
pub mod scene_graph;
pub mod store;
pub mod viewer;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use app::{ViewerApp, ViewerCommand};
pub use config::ViewerConfig;
pub use error::{PanelError, RenderError, ViewerError};
pub use panel::{ControlValue, DebugPanel};
pub use render::{HeadlessSurface, RenderSurface, Renderer};
pub use scene::{create_scene, SceneDescriptor, SceneVariant};
pub use store::{FileStore, MemoryStore, StateStore};
pub use viewer::{Viewer, ViewerState};
