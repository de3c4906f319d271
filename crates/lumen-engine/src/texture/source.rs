use std::path::Path;

use crate::error::TextureLoadError;

use super::origin::Origin;

/// Opaque blue, shown until (unless) the real image arrives.
pub const PLACEHOLDER_RGBA: [u8; 4] = [0, 0, 255, 255];

/// Decoded image: tightly packed RGBA8 rows, first row at the top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl ImageData {
    /// Returns `None` for an empty image or a buffer that doesn't hold
    /// exactly `width * height` pixels.
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        (width > 0 && height > 0 && rgba.len() == expected).then_some(Self { width, height, rgba })
    }

    /// Fills every pixel with `pixel`.
    pub fn solid(width: u32, height: u32, pixel: [u8; 4]) -> Option<Self> {
        let count = (width as usize).checked_mul(height as usize)?;
        Self::new(width, height, pixel.repeat(count))
    }

    pub fn placeholder() -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: PLACEHOLDER_RGBA.to_vec(),
        }
    }

    /// Decodes any format enabled on the `image` crate into RGBA8.
    pub fn decode(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self {
            width,
            height,
            rgba: img.into_raw(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }
}

/// One texture fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    /// The URL's origin differs from the page origin.
    pub cross_origin: bool,
}

/// Where texture bytes come from.
///
/// Implementations block; the loader runs them on tokio's blocking pool.
pub trait TextureSource: Send + Sync + 'static {
    fn fetch(&self, request: &FetchRequest) -> Result<ImageData, TextureLoadError>;
}

/// `http`/`https` via ureq, everything else from the filesystem.
pub struct NetworkSource {
    agent: ureq::Agent,
    page_origin: Option<Origin>,
}

impl NetworkSource {
    /// `page_origin` is sent as the `Origin` header of cross-origin requests.
    pub fn new(page_origin: Option<Origin>) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            page_origin,
        }
    }

    fn fetch_http(&self, request: &FetchRequest) -> Result<Vec<u8>, TextureLoadError> {
        let mut call = self.agent.get(&request.url);
        if request.cross_origin {
            let origin = self
                .page_origin
                .as_ref()
                .map_or_else(|| "null".to_owned(), Origin::to_string);
            call = call.header("Origin", origin);
        }

        call.call()
            .map_err(|e| TextureLoadError::new(&request.url, e))?
            .into_body()
            .read_to_vec()
            .map_err(|e| TextureLoadError::new(&request.url, e))
    }
}

impl Default for NetworkSource {
    fn default() -> Self {
        Self::new(None)
    }
}

impl TextureSource for NetworkSource {
    fn fetch(&self, request: &FetchRequest) -> Result<ImageData, TextureLoadError> {
        let url = request.url.as_str();
        let bytes = if url.starts_with("http://") || url.starts_with("https://") {
            self.fetch_http(request)?
        } else {
            let path = url.strip_prefix("file://").unwrap_or(url);
            std::fs::read(Path::new(path)).map_err(|e| TextureLoadError::new(url, e))?
        };

        log::trace!("fetched {} bytes from {url}", bytes.len());
        ImageData::decode(&bytes).map_err(|e| TextureLoadError::new(url, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_data_checks_buffer_size() {
        assert!(ImageData::new(2, 1, vec![0; 8]).is_some());
        assert!(ImageData::new(2, 1, vec![0; 7]).is_none());
        assert!(ImageData::new(0, 1, Vec::new()).is_none());
    }

    #[test]
    fn placeholder_is_one_blue_pixel() {
        let p = ImageData::placeholder();
        assert_eq!((p.width(), p.height()), (1, 1));
        assert_eq!(p.rgba(), &[0, 0, 255, 255]);
    }

    #[test]
    fn decodes_png_bytes() {
        let mut png = Vec::new();
        let img = image::RgbaImage::from_raw(2, 1, vec![255, 0, 0, 255, 0, 255, 0, 128]).unwrap();
        img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let data = ImageData::decode(&png).unwrap();
        assert_eq!((data.width(), data.height()), (2, 1));
        assert_eq!(data.rgba(), &[255, 0, 0, 255, 0, 255, 0, 128]);
    }

    #[test]
    fn missing_file_reports_url() {
        let source = NetworkSource::default();
        let err = source
            .fetch(&FetchRequest {
                url: "file:///definitely/not/here.png".into(),
                cross_origin: false,
            })
            .unwrap_err();
        assert_eq!(err.url, "file:///definitely/not/here.png");
    }
}
