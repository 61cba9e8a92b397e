use std::collections::VecDeque;

use crate::error::RenderError;

use super::{FrameSnapshot, RenderSurface};

/// Surface that keeps frames in memory instead of presenting them.
///
/// Used by the summary-only CLI mode and by tests; queued failures let
/// callers exercise surface error handling without a GPU.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    size: (u32, u32),
    draws: usize,
    resizes: Vec<(u32, u32)>,
    last_frame: Option<FrameSnapshot>,
    failures: VecDeque<RenderError>,
}

impl HeadlessSurface {
    pub fn new(size: (u32, u32)) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn draws(&self) -> usize {
        self.draws
    }

    pub fn resizes(&self) -> &[(u32, u32)] {
        &self.resizes
    }

    pub fn last_frame(&self) -> Option<&FrameSnapshot> {
        self.last_frame.as_ref()
    }

    pub fn fail_next(&mut self, error: RenderError) {
        self.failures.push_back(error);
    }
}

impl RenderSurface for HeadlessSurface {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn resize(&mut self, size: (u32, u32)) {
        self.size = size;
        self.resizes.push(size);
    }

    fn draw(&mut self, frame: &FrameSnapshot) -> Result<(), RenderError> {
        if let Some(error) = self.failures.pop_front() {
            return Err(error);
        }
        self.draws += 1;
        self.last_frame = Some(frame.clone());
        Ok(())
    }
}
