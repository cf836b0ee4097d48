use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use pipeline::{Pipeline, PipelineConfig, PipelineError};

use crate::render::Renderer;
use crate::source::KeyboardSource;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub max_render_fps: u32,
    pub metrics_log_interval: Duration,
    pub pipeline: PipelineConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window_title: "Input Display".to_string(),
            window_width: 960,
            window_height: 540,
            max_render_fps: 60,
            metrics_log_interval: Duration::from_secs(1),
            pipeline: PipelineConfig::default(),
        }
    }
}

pub fn run_app(config: AppConfig) -> Result<(), AppError> {
    let source = Arc::new(KeyboardSource::default());
    let pipeline = Pipeline::spawn(Arc::clone(&source), config.pipeline.clone())?;
    let snapshots = pipeline.snapshots();

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window: &'static winit::window::Window = Box::leak(Box::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    ));
    let mut renderer = Renderer::new(window).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let frame_target = target_frame_duration(config.max_render_fps);
    info!(
        window_width = config.window_width,
        window_height = config.window_height,
        max_render_fps = config.max_render_fps,
        "presenter_started"
    );

    let mut last_present_instant = Instant::now();
    let mut frame_stats = FrameStats::new(config.metrics_log_interval);
    let mut current_fps = 0.0f32;

    let run_result = event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.physical_key == PhysicalKey::Code(KeyCode::Escape)
                        && event.state == ElementState::Pressed
                    {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                        return;
                    }
                    source.handle_key_event(&event);
                }
                WindowEvent::RedrawRequested => {
                    // Single cap sleep point for render pacing.
                    let elapsed = Instant::now().saturating_duration_since(last_present_instant);
                    let cap_sleep = frame_target.saturating_sub(elapsed);
                    if cap_sleep > Duration::ZERO {
                        thread::sleep(cap_sleep);
                    }

                    let snapshot = match snapshots.latest() {
                        Ok(snapshot) => snapshot,
                        Err(error) => {
                            warn!(error = %error, "snapshot_read_failed");
                            window_target.exit();
                            return;
                        }
                    };
                    if let Err(error) = renderer.render(&snapshot, current_fps) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                        return;
                    }
                    last_present_instant = Instant::now();

                    frame_stats.record_frame();
                    if let Some(fps) = frame_stats.maybe_rate(last_present_instant) {
                        current_fps = fps;
                        info!(fps, show_debug = snapshot.show_debug, "loop_metrics");
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun);

    pipeline.request_shutdown();
    pipeline.join()?;
    run_result
}

fn target_frame_duration(max_render_fps: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(max_render_fps.max(1)))
}

/// Frame counter that yields an FPS figure once per logging interval.
#[derive(Debug)]
struct FrameStats {
    interval: Duration,
    frames: u32,
    interval_started: Instant,
}

impl FrameStats {
    fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            frames: 0,
            interval_started: Instant::now(),
        }
    }

    fn record_frame(&mut self) {
        self.frames = self.frames.saturating_add(1);
    }

    fn maybe_rate(&mut self, now: Instant) -> Option<f32> {
        let elapsed = now.saturating_duration_since(self.interval_started);
        if elapsed < self.interval {
            return None;
        }
        let fps = self.frames as f32 / elapsed.as_secs_f32();
        self.frames = 0;
        self.interval_started = now;
        Some(fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_target_is_the_period_of_the_cap() {
        assert_eq!(target_frame_duration(60), Duration::from_secs_f64(1.0 / 60.0));
        // Zero cap clamps instead of dividing by zero.
        assert_eq!(target_frame_duration(0), Duration::from_secs(1));
    }

    #[test]
    fn frame_stats_reports_only_after_the_interval() {
        let mut stats = FrameStats::new(Duration::from_secs(1));
        let started = stats.interval_started;
        for _ in 0..30 {
            stats.record_frame();
        }
        assert!(stats.maybe_rate(started + Duration::from_millis(500)).is_none());

        let fps = stats
            .maybe_rate(started + Duration::from_secs(1))
            .unwrap_or(0.0);
        assert!((fps - 30.0).abs() < 0.5, "fps {fps}");
    }

    #[test]
    fn frame_stats_resets_between_intervals() {
        let mut stats = FrameStats::new(Duration::from_secs(1));
        let started = stats.interval_started;
        stats.record_frame();
        assert!(stats.maybe_rate(started + Duration::from_secs(1)).is_some());

        // Fresh interval: nothing recorded yet, so the next report is zero.
        let fps = stats
            .maybe_rate(started + Duration::from_secs(2))
            .unwrap_or(-1.0);
        assert!(fps.abs() < 0.001, "fps {fps}");
    }
}
