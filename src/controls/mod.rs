//! Pointer-driven controls bound to a scene: camera orbit and subject drag.

pub mod bindings;
pub mod drag;
pub mod orbit;

pub use bindings::{Binding, BindingGuard, BindingKind, BindingRegistry};
pub use drag::{hit_test, DragControls, DragEvent, DragState};
pub use orbit::{OrbitControls, OrbitGesture};
