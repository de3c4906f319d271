use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App as CoreApp, AppControl, FrameCtx};
use crate::device::{Gpu, GpuInit};
use crate::time::FrameClock;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// Interval between frame callbacks.
    pub tick_interval: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "lumen".to_string(),
            initial_size: LogicalSize::new(600.0, 600.0),
            tick_interval: Duration::from_millis(16),
        }
    }
}

/// Runtime context passed to the application.
///
/// Requests are applied after the current callback returns.
#[derive(Default)]
pub struct RuntimeCtx {
    exit: bool,
}

impl RuntimeCtx {
    pub fn exit(&mut self) {
        self.exit = true;
    }
}

/// Entry point for the windowed runtime: one window, one GPU surface.
pub struct Runtime;

impl Runtime {
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + CoreApp,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A>
where
    A: CoreApp + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    window: Option<WindowEntry>,
    next_tick: Instant,
    exit_requested: bool,
    failure: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            window: None,
            next_tick: Instant::now(),
            exit_requested: false,
            failure: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.failure = Some(err);
        self.exit_requested = true;
        event_loop.exit();
    }

    fn create_window_entry(&self, event_loop: &ActiveEventLoop) -> Result<WindowEntry> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();

        WindowEntryTryBuilder {
            clock: FrameClock::default(),
            window,
            gpu_builder: |w| {
                pollster::block_on(Gpu::new(w, gpu_init)).context("GPU initialization failed for window")
            },
        }
        .try_build()
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(entry) = self.window.as_mut() else {
            return;
        };

        let app = &mut self.app;
        let mut runtime_ctx = RuntimeCtx::default();
        let mut control = AppControl::Continue;

        entry.with_mut(|fields| {
            let time = fields.clock.tick();
            let mut ctx = FrameCtx {
                window: fields.window,
                gpu: fields.gpu,
                time,
                runtime: &mut runtime_ctx,
            };
            control = app.on_frame(&mut ctx);
        });

        if control == AppControl::Exit || runtime_ctx.exit {
            self.exit_requested = true;
            event_loop.exit();
        }
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        match self.create_window_entry(event_loop) {
            Ok(entry) => {
                entry.with_window(|w| w.request_redraw());
                self.window = Some(entry);
                self.next_tick = Instant::now();
            }
            Err(e) => self.fail(event_loop, e.context("failed to create initial window")),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let now = Instant::now();
        if now >= self.next_tick {
            self.next_tick = now + self.config.tick_interval;
            if let Some(entry) = self.window.as_ref() {
                entry.with_window(|w| w.request_redraw());
            }
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_tick));
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let Some(entry) = self.window.as_mut() else {
            return;
        };
        if entry.with_window(|w| w.id()) != window_id {
            return;
        }

        if self.app.on_window_event(window_id, &event) == AppControl::Exit {
            self.exit_requested = true;
            event_loop.exit();
            return;
        }

        match &event {
            WindowEvent::CloseRequested => {
                self.window = None;
                self.exit_requested = true;
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                entry.with_gpu_mut(|gpu| gpu.resize(*new_size));
                entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let new_size = entry.with_window(|w| w.inner_size());
                entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }
}
