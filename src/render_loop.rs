use log::{info, warn};

use crate::animation::Animator;
use crate::camera::aspect_ratio;
use crate::error::{RenderError, ViewerError};
use crate::render::{FrameSnapshot, RenderSurface};
use crate::viewer::ViewerState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    pub delta: f32,
    pub display_size: (u32, u32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub fps: f32,
    pub resized: bool,
    pub camera_moved: bool,
    pub drawn: bool,
}

impl FrameReport {
    pub const FPS_REFRESH: u64 = 30;

    pub fn fps_due(&self) -> bool {
        self.frame % Self::FPS_REFRESH == 0
    }

    pub fn fps_label(&self) -> String {
        format!("{:.0} fps", self.fps)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameStats {
    frames: u64,
    smoothed_fps: f32,
    last_delta: f32,
    smoothing: f32,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self {
            frames: 0,
            smoothed_fps: 0.0,
            last_delta: 0.0,
            smoothing: 0.05,
        }
    }
}

impl FrameStats {
    pub fn record(&mut self, delta: f32) {
        self.frames += 1;
        self.last_delta = delta;
        if delta <= 0.0 || !delta.is_finite() {
            return;
        }
        let instant = 1.0 / delta;
        self.smoothed_fps = if self.smoothed_fps == 0.0 {
            instant
        } else {
            self.smoothed_fps + (instant - self.smoothed_fps) * self.smoothing
        };
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn fps(&self) -> f32 {
        self.smoothed_fps
    }

    pub fn last_delta(&self) -> f32 {
        self.last_delta
    }
}

/// Per-frame driver: animation, resize, orbit damping and one draw.
///
/// The loop never schedules itself; a host calls [`RenderLoop::tick`] once
/// per display refresh while [`RenderLoop::is_running`] holds.
#[derive(Debug, Default)]
pub struct RenderLoop {
    running: bool,
    stats: FrameStats,
    animator: Animator,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        info!("render loop started");
        true
    }

    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            info!("render loop stopped after {} frames", self.stats.frames());
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    /// Runs one frame against `state`. Returns `None` while stopped.
    ///
    /// Lost and outdated surfaces are reconfigured and timeouts skipped, so
    /// only unrecoverable surface failures are returned as errors.
    pub fn tick(
        &mut self,
        state: &mut ViewerState,
        input: FrameInput,
        surface: &mut dyn RenderSurface,
    ) -> Result<Option<FrameReport>, ViewerError> {
        if !self.running {
            return Ok(None);
        }

        self.stats.record(input.delta);

        if state.animation.is_active() {
            if let Some(subject) = state.active.as_mut().and_then(|active| active.subject_mut()) {
                self.animator.advance(&mut subject.transform, input.delta);
            }
        }

        let size = (input.display_size.0.max(1), input.display_size.1.max(1));
        let resized = surface.size() != size;
        if resized {
            surface.resize(size);
        }
        state.viewport = size;
        if let Some(camera) = state.camera.as_mut() {
            let aspect = aspect_ratio(size.0, size.1);
            if camera.aspect != aspect {
                camera.set_aspect(size.0, size.1);
            }
        }

        let camera_moved = match (state.active.as_mut(), state.camera.as_mut()) {
            (Some(active), Some(camera)) => active.orbit.update(camera, input.delta),
            _ => false,
        };

        let mut report = FrameReport {
            frame: self.stats.frames(),
            fps: self.stats.fps(),
            resized,
            camera_moved,
            drawn: false,
        };
        let (Some(active), Some(camera)) = (state.active.as_ref(), state.camera.as_ref()) else {
            return Ok(Some(report));
        };

        let frame = FrameSnapshot::capture(&active.graph, camera);
        match surface.draw(&frame) {
            Ok(()) => report.drawn = true,
            Err(err @ (RenderError::Lost | RenderError::Outdated)) => {
                warn!("{err}; reconfiguring surface");
                surface.resize(size);
            }
            Err(err @ (RenderError::Timeout | RenderError::Other)) => {
                warn!("{err}; skipping frame");
            }
            Err(err @ RenderError::OutOfMemory) => return Err(err.into()),
        }
        Ok(Some(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::HeadlessSurface;
    use crate::viewer::Viewer;

    const SIZE: (u32, u32) = (800, 600);

    fn frame(delta: f32) -> FrameInput {
        FrameInput {
            delta,
            display_size: SIZE,
        }
    }

    #[test]
    fn does_nothing_until_started() {
        let mut render_loop = RenderLoop::new();
        let mut state = ViewerState::default();
        let mut surface = HeadlessSurface::new(SIZE);
        assert_eq!(render_loop.tick(&mut state, frame(0.016), &mut surface).unwrap(), None);
        assert_eq!(surface.draws(), 0);
        assert_eq!(render_loop.stats().frames(), 0);
    }

    #[test]
    fn draws_once_per_tick() {
        let mut viewer = Viewer::default();
        viewer.select_scene("0");
        let mut surface = HeadlessSurface::new(SIZE);
        for expected in 1..=3 {
            let report = viewer.tick(1.0 / 60.0, SIZE, &mut surface).unwrap().unwrap();
            assert!(report.drawn);
            assert_eq!(report.frame, expected);
            assert_eq!(surface.draws(), expected as usize);
        }
    }

    #[test]
    fn resize_updates_camera_before_draw() {
        let mut viewer = Viewer::default();
        viewer.select_scene("0");
        let mut surface = HeadlessSurface::new(SIZE);
        viewer.tick(0.0, SIZE, &mut surface).unwrap();

        let report = viewer.tick(0.0, (1000, 500), &mut surface).unwrap().unwrap();
        assert!(report.resized);
        assert_eq!(surface.resizes(), &[(1000, 500)]);
        let camera = viewer.state().camera.unwrap();
        assert_eq!(camera.aspect, 2.0);
        let drawn = surface.last_frame().unwrap();
        assert_eq!(drawn.camera.view_proj, camera.view_proj());
    }

    #[test]
    fn lost_surface_is_reconfigured() {
        let mut viewer = Viewer::default();
        viewer.select_scene("1");
        let mut surface = HeadlessSurface::new(SIZE);
        surface.fail_next(RenderError::Lost);
        surface.fail_next(RenderError::Timeout);

        let report = viewer.tick(0.016, SIZE, &mut surface).unwrap().unwrap();
        assert!(!report.drawn);
        assert_eq!(surface.resizes(), &[SIZE]);
        let report = viewer.tick(0.016, SIZE, &mut surface).unwrap().unwrap();
        assert!(!report.drawn);
        let report = viewer.tick(0.016, SIZE, &mut surface).unwrap().unwrap();
        assert!(report.drawn);
    }

    #[test]
    fn out_of_memory_is_fatal() {
        let mut viewer = Viewer::default();
        viewer.select_scene("0");
        let mut surface = HeadlessSurface::new(SIZE);
        surface.fail_next(RenderError::OutOfMemory);
        let err = viewer.tick(0.016, SIZE, &mut surface).unwrap_err();
        assert!(matches!(err, ViewerError::Render(RenderError::OutOfMemory)));
    }

    #[test]
    fn zero_delta_leaves_animated_subject_in_place() {
        let mut viewer = Viewer::default();
        viewer.select_scene("0");
        viewer.set_animation_enabled(true);
        let mut surface = HeadlessSurface::new(SIZE);
        let before = viewer.subject().unwrap().transform;
        viewer.tick(0.0, SIZE, &mut surface).unwrap();
        assert_eq!(viewer.subject().unwrap().transform, before);

        viewer.tick(0.25, SIZE, &mut surface).unwrap();
        assert_ne!(viewer.subject().unwrap().transform, before);
    }

    #[test]
    fn fps_is_smoothed() {
        let mut stats = FrameStats::default();
        stats.record(1.0 / 60.0);
        assert!((stats.fps() - 60.0).abs() < 1e-3);
        stats.record(1.0 / 30.0);
        assert!(stats.fps() < 60.0 && stats.fps() > 58.0);
        stats.record(0.0);
        assert_eq!(stats.frames(), 3);
    }

    #[test]
    fn reports_fps_on_refresh_frames() {
        let mut viewer = Viewer::default();
        viewer.select_scene("0");
        let mut surface = HeadlessSurface::new(SIZE);
        let mut due: Vec<u64> = Vec::new();
        for _ in 0..FrameReport::FPS_REFRESH * 2 {
            let report = viewer.tick(1.0 / 60.0, SIZE, &mut surface).unwrap().unwrap();
            if report.fps_due() {
                assert_eq!(report.fps_label(), "60 fps");
                due.push(report.frame);
            }
        }
        assert_eq!(due, [30, 60]);
    }
}
