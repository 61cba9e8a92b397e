use std::any::Any;
use std::env;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use glam::Vec2;
use log::{debug, info, warn};
use pollster::block_on;
use web_time::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Fullscreen, Window, WindowId};

use scene_viewer::app::{print_final_state, print_summary, ViewerApp, ViewerCommand};
use scene_viewer::config::{ViewerConfig, STATE_KEY};
use scene_viewer::input::{ClickTracker, PointerButton, PointerEvent, PointerState, Shortcut};
use scene_viewer::render::{HeadlessSurface, Renderer};
use scene_viewer::store::{FileStore, StateStore};

const DEFAULT_STATE_FILE: &str = "scene-viewer-state.json";
const HEADLESS_SIZE: (u32, u32) = (1280, 720);

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

fn run() -> Result<()> {
    let options = CliOptions::parse(env::args().skip(1))?;

    let mut store = FileStore::new(&options.state_file);
    if options.reset_state {
        store
            .remove(STATE_KEY)
            .context("failed to clear saved panel state")?;
        println!("Cleared saved panel state");
    }

    let (mut app, switch) = ViewerApp::new(ViewerConfig::default(), store, &options.scene);
    if switch.fell_back {
        println!(
            "Invalid scene index {:?}; showing {}",
            options.scene, switch.variant
        );
    }
    for (path, raw) in &options.edits {
        app.apply(ViewerCommand::SetControl {
            path: path.clone(),
            raw: raw.clone(),
        })
        .with_context(|| format!("failed to set {path}"))?;
    }
    print_summary(&app);

    if options.summary_only {
        run_headless(&mut app, options.frames.unwrap_or(1))?;
    } else {
        match run_interactive(&mut app, options.frames) {
            Ok(()) => {}
            Err(err) if err.downcast_ref::<WindowInitError>().is_some() => {
                eprintln!(
                    "{err}. Falling back to --summary-only mode (set DISPLAY or install a GPU driver to enable rendering)."
                );
                run_headless(&mut app, options.frames.unwrap_or(1))?;
            }
            Err(err) => return Err(err),
        }
    }

    app.shutdown();
    print_final_state(&app);
    Ok(())
}

fn run_headless(app: &mut ViewerApp<FileStore>, frames: u64) -> Result<()> {
    let mut surface = HeadlessSurface::new(HEADLESS_SIZE);
    for _ in 0..frames {
        app.tick(1.0 / 60.0, HEADLESS_SIZE, &mut surface)
            .context("headless frame failed")?;
    }
    println!("Rendered {} frame(s) headless", surface.draws());
    Ok(())
}

fn run_interactive(app: &mut ViewerApp<FileStore>, frame_limit: Option<u64>) -> Result<()> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let event_loop = event_loop
        .map_err(|panic| WindowInitError::from_panic("event loop", panic))?
        .map_err(|err| WindowInitError::from_error("event loop", err))?;

    let mut host = NativeHost {
        app,
        window: None,
        renderer: None,
        pointer: PointerState::new(),
        clicks: ClickTracker::default(),
        last_frame: Instant::now(),
        frame_limit,
        error: None,
    };
    event_loop
        .run_app(&mut host)
        .context("event loop terminated abnormally")?;

    match host.error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct NativeHost<'a> {
    app: &'a mut ViewerApp<FileStore>,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    pointer: PointerState,
    clicks: ClickTracker,
    last_frame: Instant,
    /// Exit after this many drawn frames.
    frame_limit: Option<u64>,
    error: Option<anyhow::Error>,
}

impl NativeHost<'_> {
    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = Window::default_attributes()
            .with_title("Scene Viewer")
            .with_inner_size(LogicalSize::new(1280.0, 720.0));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|err| WindowInitError::from_error("window", err))?,
        );
        let size = window.inner_size();
        let renderer = block_on(Renderer::new(
            Arc::clone(&window),
            (size.width.max(1), size.height.max(1)),
        ))
        .map_err(|err| WindowInitError::from_error("renderer", format!("{err:#}")))?;

        window.request_redraw();
        self.last_frame = Instant::now();
        self.window = Some(window);
        self.renderer = Some(renderer);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        self.error = Some(err);
        event_loop.exit();
    }

    fn pointer(&mut self, event: PointerEvent) {
        self.pointer.apply(&event);
        if let Err(err) = self.app.apply(ViewerCommand::Pointer(event)) {
            warn!("pointer input rejected: {err}");
        }
    }

    fn toggle_fullscreen(&self) {
        let Some(window) = &self.window else {
            return;
        };
        if window.fullscreen().is_some() {
            window.set_fullscreen(None);
        } else {
            window.set_fullscreen(Some(Fullscreen::Borderless(None)));
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(renderer)) = (&self.window, self.renderer.as_mut()) else {
            return;
        };
        let now = Instant::now();
        let delta = now.saturating_duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        let size = window.inner_size();
        let display_size = (size.width.max(1), size.height.max(1));
        match self.app.tick(delta, display_size, renderer) {
            Ok(Some(report)) => {
                if report.fps_due() {
                    window.set_title(&format!("Scene Viewer ({})", report.fps_label()));
                    debug!("frame {}: {}", report.frame, report.fps_label());
                }
                if self.frame_limit.is_some_and(|limit| report.frame >= limit) {
                    info!("frame limit reached after {} frames", report.frame);
                    event_loop.exit();
                    return;
                }
                window.request_redraw();
            }
            Ok(None) => {}
            Err(err) => self.fail(event_loop, err.into()),
        }
    }
}

impl ApplicationHandler for NativeHost<'_> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.init_window(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            WindowEvent::CursorMoved { position, .. } => {
                let position = Vec2::new(position.x as f32, position.y as f32);
                self.pointer(PointerEvent::Moved { position });
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let Some(button) = map_button(button) else {
                    return;
                };
                let position = self.pointer.position();
                match state {
                    ElementState::Pressed => {
                        if button == PointerButton::PRIMARY
                            && self.clicks.press(position, Instant::now())
                        {
                            self.toggle_fullscreen();
                        }
                        self.pointer(PointerEvent::Pressed { button, position });
                    }
                    ElementState::Released => {
                        self.pointer(PointerEvent::Released { button, position });
                    }
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let delta_y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y,
                    MouseScrollDelta::PixelDelta(offset) => -(offset.y as f32),
                };
                self.pointer(PointerEvent::Wheel { delta_y });
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                let shortcut = match &event.logical_key {
                    Key::Named(NamedKey::Backspace) => Shortcut::from_key("Backspace"),
                    Key::Character(text) => Shortcut::from_key(text.as_str()),
                    _ => None,
                };
                if let Some(shortcut) = shortcut {
                    if let Err(err) = self.app.shortcut(shortcut) {
                        warn!("shortcut {shortcut:?} failed: {err}");
                    }
                }
            }
            _ => {}
        }
    }
}

fn map_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::PRIMARY),
        MouseButton::Middle => Some(PointerButton::MIDDLE),
        MouseButton::Right => Some(PointerButton::SECONDARY),
        MouseButton::Back | MouseButton::Forward => None,
        MouseButton::Other(index) => u8::try_from(index).ok().map(PointerButton::new),
    }
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

#[derive(Debug, PartialEq)]
struct CliOptions {
    scene: String,
    summary_only: bool,
    frames: Option<u64>,
    state_file: String,
    /// `--set path=value` edits, applied in order.
    edits: Vec<(String, String)>,
    reset_state: bool,
}

impl CliOptions {
    const USAGE: &'static str = "Usage: scene-viewer [--scene <index>] [--summary-only] [--frames <n>] \
[--state-file <path>] [--set <path>=<value>]... [--reset-state]";

    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut options = Self {
            scene: "0".to_string(),
            summary_only: false,
            frames: None,
            state_file: DEFAULT_STATE_FILE.to_string(),
            edits: Vec::new(),
            reset_state: false,
        };
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .ok_or_else(|| anyhow!("{flag} expects a value. {}", Self::USAGE))
            };
            match arg.as_str() {
                "--scene" => options.scene = value("--scene")?,
                "--summary-only" => options.summary_only = true,
                "--frames" => {
                    let raw = value("--frames")?;
                    let frames = raw
                        .parse()
                        .with_context(|| format!("invalid frame count {raw:?}"))?;
                    options.frames = Some(frames);
                }
                "--state-file" => options.state_file = value("--state-file")?,
                "--set" => {
                    let raw = value("--set")?;
                    let (path, control) = raw
                        .split_once('=')
                        .ok_or_else(|| anyhow!("--set expects <path>=<value>, got {raw:?}"))?;
                    options.edits.push((path.trim().to_string(), control.to_string()));
                }
                "--reset-state" => options.reset_state = true,
                "--help" | "-h" => return Err(anyhow!(Self::USAGE)),
                other => return Err(anyhow!("Unknown argument: {other}. {}", Self::USAGE)),
            }
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliOptions> {
        CliOptions::parse(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn defaults_without_arguments() {
        let options = parse(&[]).unwrap();
        assert_eq!(options.scene, "0");
        assert_eq!(options.state_file, DEFAULT_STATE_FILE);
        assert_eq!(options.frames, None);
        assert!(!options.summary_only && !options.reset_state);
    }

    #[test]
    fn collects_repeated_edits() {
        let options = parse(&[
            "--set",
            "Subject/pos x=2",
            "--set",
            "Helpers/axes=on",
            "--frames",
            "3",
        ])
        .unwrap();
        assert_eq!(
            options.edits,
            vec![
                ("Subject/pos x".to_string(), "2".to_string()),
                ("Helpers/axes".to_string(), "on".to_string()),
            ]
        );
        assert_eq!(options.frames, Some(3));
    }

    #[test]
    fn rejects_malformed_arguments() {
        assert!(parse(&["--scene"]).is_err());
        assert!(parse(&["--set", "no-equals"]).is_err());
        assert!(parse(&["--frames", "many"]).is_err());
        assert!(parse(&["--bogus"]).is_err());
    }
}
