use winit::window::Window;

use crate::device::{Gpu, SurfaceErrorAction};
use crate::render::{RenderCtx, RenderTarget};
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

/// Per-tick context passed to `core::App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: &'a Window,
    pub gpu: &'a mut Gpu<'w>,
    pub time: FrameTime,
    pub runtime: &'a mut RuntimeCtx,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Renderer-facing context for the current surface.
    pub fn render_ctx(&self) -> RenderCtx<'_> {
        self.gpu.render_ctx()
    }

    /// Acquires the next surface texture, calls `draw` with a ready
    /// [`RenderCtx`] and [`RenderTarget`], then submits and presents.
    ///
    /// `draw` owns the clear. Returns `None` when no surface texture could be
    /// acquired this tick; a fatal surface error also requests exit.
    pub fn render<R, F>(&mut self, draw: F) -> Option<R>
    where
        F: FnOnce(&RenderCtx<'_>, &mut RenderTarget<'_>) -> R,
    {
        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                if self.gpu.handle_surface_error(err) == SurfaceErrorAction::Fatal {
                    self.runtime.exit();
                }
                return None;
            }
        };

        let rctx = self.gpu.render_ctx();

        // RenderTarget borrows frame.encoder; dropped before submit() takes frame.
        let out = {
            let mut target = RenderTarget::new(&mut frame.encoder, &frame.view);
            draw(&rctx, &mut target)
        };

        self.window.pre_present_notify();
        self.gpu.submit(frame);

        Some(out)
    }
}
