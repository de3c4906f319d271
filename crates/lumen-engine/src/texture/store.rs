use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::TextureLoadError;
use crate::render::{QuadLayouts, RenderCtx};

use super::loader::{LoadOutcome, TextureLoader};
use super::origin::{is_cross_origin, Origin};
use super::source::{FetchRequest, ImageData};

static NEXT_STORE: AtomicU32 = AtomicU32::new(1);

/// Stable handle to a texture in a [`TextureStore`].
///
/// The GPU texture behind an id may be replaced when its image loads; the id
/// never changes. Ids carry the tag of the store that minted them, so another
/// store treats them as unknown even when the index is in range.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TextureId {
    store: u32,
    index: u32,
}

impl TextureId {
    /// An id that belongs to no store.
    pub(crate) const fn from_raw(raw: u32) -> Self {
        Self { store: 0, index: raw }
    }

    /// Index within the owning store.
    pub fn raw(self) -> u32 {
        self.index
    }
}

/// `Ready` implies the dimensions are the loaded image's.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TextureState {
    /// Showing the 1x1 placeholder. A failed load stays here for good.
    Pending,
    Ready,
}

/// A GPU-resident image and the bind group that samples it.
pub struct TextureResource {
    url: Option<String>,
    state: TextureState,
    width: u32,
    height: u32,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
}

impl TextureResource {
    fn upload(
        ctx: &RenderCtx<'_>,
        layouts: &QuadLayouts,
        image: &ImageData,
        url: Option<String>,
        state: TextureState,
    ) -> Self {
        let label = url.as_deref().unwrap_or("lumen texture");
        let size = wgpu::Extent3d {
            width: image.width(),
            height: image.height(),
            depth_or_array_layers: 1,
        };

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.rgba(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width()),
                rows_per_image: Some(image.height()),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = layouts.texture_bind_group(ctx.device, &view, label);

        Self {
            url,
            state,
            width: image.width(),
            height: image.height(),
            texture,
            view,
            bind_group,
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn state(&self) -> TextureState {
        self.state
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub(crate) fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

/// Owns every texture of a session. Textures are never removed.
pub struct TextureStore {
    tag: u32,
    resources: Vec<TextureResource>,
    loader: TextureLoader,
    page_origin: Option<Origin>,
}

impl TextureStore {
    pub fn new(loader: TextureLoader, page_origin: Option<Origin>) -> Self {
        Self {
            tag: NEXT_STORE.fetch_add(1, Ordering::Relaxed),
            resources: Vec::new(),
            loader,
            page_origin,
        }
    }

    /// Creates a pending texture showing the placeholder and starts fetching
    /// `url`. Returns immediately.
    pub fn load(&mut self, ctx: &RenderCtx<'_>, layouts: &QuadLayouts, url: &str) -> TextureId {
        let id = self.push(TextureResource::upload(
            ctx,
            layouts,
            &ImageData::placeholder(),
            Some(url.to_owned()),
            TextureState::Pending,
        ));

        let request = FetchRequest {
            url: url.to_owned(),
            cross_origin: is_cross_origin(url, self.page_origin.as_ref()),
        };
        self.loader.request(id, request);
        id
    }

    /// Uploads already-decoded pixels. The texture is `Ready` immediately,
    /// unless the image exceeds the device's texture limit, in which case it
    /// stays on the placeholder.
    pub fn insert(&mut self, ctx: &RenderCtx<'_>, layouts: &QuadLayouts, image: &ImageData) -> TextureId {
        if let Err(reason) = check_device_limit(ctx, image) {
            log::warn!("inserted image keeps the placeholder: {reason}");
            return self.push(TextureResource::upload(
                ctx,
                layouts,
                &ImageData::placeholder(),
                None,
                TextureState::Pending,
            ));
        }
        self.push(TextureResource::upload(ctx, layouts, image, None, TextureState::Ready))
    }

    /// Applies every finished fetch without blocking. Returns how many
    /// outcomes were applied.
    pub fn poll(&mut self, ctx: &RenderCtx<'_>, layouts: &QuadLayouts) -> usize {
        let mut applied = 0;
        while let Some(outcome) = self.loader.try_next() {
            self.apply(ctx, layouts, outcome);
            applied += 1;
        }
        applied
    }

    /// Blocks until no fetch is in flight, applying outcomes as they arrive.
    ///
    /// Must not be called from inside the loader's tokio runtime.
    pub fn wait_pending(&mut self, ctx: &RenderCtx<'_>, layouts: &QuadLayouts) -> usize {
        let mut applied = 0;
        while let Some(outcome) = self.loader.blocking_next() {
            self.apply(ctx, layouts, outcome);
            applied += 1;
        }
        applied
    }

    /// `None` for ids minted by another store.
    pub fn get(&self, id: TextureId) -> Option<&TextureResource> {
        if id.store != self.tag {
            return None;
        }
        self.resources.get(id.index as usize)
    }

    fn get_mut(&mut self, id: TextureId) -> Option<&mut TextureResource> {
        if id.store != self.tag {
            return None;
        }
        self.resources.get_mut(id.index as usize)
    }

    /// Number of fetches still in flight.
    pub fn in_flight(&self) -> usize {
        self.loader.in_flight()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    fn push(&mut self, resource: TextureResource) -> TextureId {
        let id = TextureId {
            store: self.tag,
            index: self.resources.len() as u32,
        };
        self.resources.push(resource);
        id
    }

    fn apply(&mut self, ctx: &RenderCtx<'_>, layouts: &QuadLayouts, outcome: LoadOutcome) {
        match outcome {
            LoadOutcome::Loaded { id, image } => {
                let Some(slot) = self.get_mut(id) else {
                    log::warn!("load finished for unknown texture {id:?}");
                    return;
                };
                if slot.state == TextureState::Ready {
                    log::warn!("texture {id:?} is already loaded; ignoring second result");
                    return;
                }
                if let Err(reason) = check_device_limit(ctx, &image) {
                    let error = TextureLoadError::new(slot.url().unwrap_or("<memory>"), reason);
                    log::warn!("texture {id:?} keeps its placeholder: {error}");
                    return;
                }

                let url = slot.url.take();
                *slot = TextureResource::upload(ctx, layouts, &image, url, TextureState::Ready);
                log::info!(
                    "texture {id:?} ready: {}x{} from {}",
                    slot.width,
                    slot.height,
                    slot.url().unwrap_or("<memory>")
                );
            }
            LoadOutcome::Failed { id, error } => {
                log::warn!("texture {id:?} keeps its placeholder: {error}");
            }
        }
    }
}

/// Rejects images the device cannot hold in a single 2D texture.
fn check_device_limit(ctx: &RenderCtx<'_>, image: &ImageData) -> Result<(), String> {
    let max = ctx.device.limits().max_texture_dimension_2d;
    if image.width() > max || image.height() > max {
        return Err(format!(
            "{}x{} image exceeds the device limit of {max}px per side",
            image.width(),
            image.height()
        ));
    }
    Ok(())
}
