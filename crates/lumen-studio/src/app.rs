use lumen_engine::core::{App, AppControl, FrameCtx};
use winit::event::WindowEvent;
use winit::window::WindowId;

use crate::config::StudioConfig;
use crate::scene::LoadedScene;
use crate::schedule::RenderSchedule;

/// Windowed scene player.
///
/// The renderer is built on the first tick, once a GPU surface exists.
pub struct StudioApp {
    config: StudioConfig,
    runtime: tokio::runtime::Runtime,
    state: Option<LoadedScene>,
    schedule: RenderSchedule,
}

impl StudioApp {
    pub fn new(config: StudioConfig, runtime: tokio::runtime::Runtime) -> Self {
        let schedule = RenderSchedule::new(&config.schedule);
        Self {
            config,
            runtime,
            state: None,
            schedule,
        }
    }
}

impl App for StudioApp {
    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        if matches!(event, WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. }) {
            self.schedule.invalidate();
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let rctx = ctx.render_ctx();
        if !rctx.viewport.is_valid() {
            return AppControl::Continue;
        }

        if self.state.is_none() {
            match LoadedScene::build(&rctx, &self.config, self.runtime.handle().clone()) {
                Ok(state) => self.state = Some(state),
                Err(err) => {
                    log::error!("{err:#}");
                    return AppControl::Exit;
                }
            }
        }
        let Some(state) = self.state.as_mut() else {
            return AppControl::Exit;
        };

        if state.renderer.poll_textures(&rctx) > 0 {
            self.schedule.invalidate();
        }
        if !self.schedule.should_render(ctx.time.elapsed) {
            return AppControl::Continue;
        }

        let LoadedScene { renderer, scene } = state;
        match ctx.render(|rctx, target| renderer.render_frame(rctx, target, scene)) {
            Some(Ok(report)) => {
                log::debug!("frame {}: {report:?}", ctx.time.frame_index);
                self.schedule.mark_rendered();
            }
            Some(Err(err)) => {
                log::error!("render failed: {err}");
                return AppControl::Exit;
            }
            // Surface unavailable this tick; try again next one.
            None => {}
        }
        AppControl::Continue
    }
}
