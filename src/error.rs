use thiserror::Error;

/// Errors surfaced by the viewer core and its hosts.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// The drawable surface the viewer was asked to attach to does not exist.
    #[error("drawable surface `{0}` not found")]
    MissingSurface(String),
    #[error("render failed: {0}")]
    Render(#[from] RenderError),
    #[error("state store failed: {0}")]
    Store(#[source] anyhow::Error),
    #[error(transparent)]
    Panel(#[from] PanelError),
}

/// Failures reported by a [`RenderSurface`](crate::render::RenderSurface) draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("surface was lost")]
    Lost,
    #[error("surface is outdated")]
    Outdated,
    #[error("timed out acquiring the next frame")]
    Timeout,
    #[error("GPU is out of memory")]
    OutOfMemory,
    #[error("surface reported an unknown error")]
    Other,
}

/// Rejected debug panel edits.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PanelError {
    #[error("unknown control `{0}`")]
    UnknownControl(String),
    #[error("control `{path}` expects a {expected} value")]
    WrongKind { path: String, expected: &'static str },
    #[error("`{0}` is not a valid color")]
    InvalidColor(String),
}
