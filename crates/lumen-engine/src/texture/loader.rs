use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::error::TextureLoadError;

use super::source::{FetchRequest, ImageData, TextureSource};
use super::store::TextureId;

/// Result of one fetch, delivered back to the render thread.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded { id: TextureId, image: ImageData },
    Failed { id: TextureId, error: TextureLoadError },
}

/// Runs texture fetches on a tokio runtime and hands results back over a
/// channel.
///
/// Fetches never touch GPU state. The owner drains outcomes on its own thread
/// with [`TextureLoader::try_next`] and applies them there.
pub struct TextureLoader {
    source: Arc<dyn TextureSource>,
    runtime: Handle,
    tx: UnboundedSender<LoadOutcome>,
    rx: UnboundedReceiver<LoadOutcome>,
    in_flight: usize,
}

impl TextureLoader {
    pub fn new(source: Arc<dyn TextureSource>, runtime: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            source,
            runtime,
            tx,
            rx,
            in_flight: 0,
        }
    }

    /// Starts fetching `request` for texture `id`. Returns immediately.
    pub fn request(&mut self, id: TextureId, request: FetchRequest) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        self.in_flight += 1;

        log::debug!(
            "fetching texture {id:?} from {} (cross-origin: {})",
            request.url,
            request.cross_origin
        );

        self.runtime.spawn(async move {
            let url = request.url.clone();
            let fetched = tokio::task::spawn_blocking(move || source.fetch(&request)).await;

            let outcome = match fetched {
                Ok(Ok(image)) => LoadOutcome::Loaded { id, image },
                Ok(Err(error)) => LoadOutcome::Failed { id, error },
                Err(join) => LoadOutcome::Failed {
                    id,
                    error: TextureLoadError::new(url, join),
                },
            };

            // The receiver is gone only when the loader was dropped.
            let _ = tx.send(outcome);
        });
    }

    /// Next finished fetch, if any, without blocking.
    pub fn try_next(&mut self) -> Option<LoadOutcome> {
        let outcome = self.rx.try_recv().ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(outcome)
    }

    /// Blocks until the next fetch finishes. `None` when nothing is in flight.
    ///
    /// Must not be called from inside the tokio runtime.
    pub fn blocking_next(&mut self) -> Option<LoadOutcome> {
        if self.in_flight == 0 {
            return None;
        }
        let outcome = self.rx.blocking_recv()?;
        self.in_flight -= 1;
        Some(outcome)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    struct MapSource(HashMap<String, ImageData>);

    impl TextureSource for MapSource {
        fn fetch(&self, request: &FetchRequest) -> Result<ImageData, TextureLoadError> {
            self.0
                .get(&request.url)
                .cloned()
                .ok_or_else(|| TextureLoadError::new(&request.url, "not found"))
        }
    }

    fn request(url: &str) -> FetchRequest {
        FetchRequest {
            url: url.to_owned(),
            cross_origin: false,
        }
    }

    #[test]
    fn delivers_successes_and_failures() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .build()
            .unwrap();

        let image = ImageData::solid(2, 2, [255, 0, 0, 255]).unwrap();
        let source = MapSource(HashMap::from([("red.png".to_owned(), image.clone())]));
        let mut loader = TextureLoader::new(Arc::new(source), runtime.handle().clone());

        loader.request(TextureId::from_raw(0), request("red.png"));
        loader.request(TextureId::from_raw(1), request("missing.png"));
        assert_eq!(loader.in_flight(), 2);

        let mut loaded = None;
        let mut failed = None;
        while let Some(outcome) = loader.blocking_next() {
            match outcome {
                LoadOutcome::Loaded { id, image } => loaded = Some((id, image)),
                LoadOutcome::Failed { id, error } => failed = Some((id, error)),
            }
        }

        assert_eq!(loader.in_flight(), 0);
        assert_eq!(loaded, Some((TextureId::from_raw(0), image)));
        let (id, error) = failed.unwrap();
        assert_eq!(id, TextureId::from_raw(1));
        assert_eq!(error.url, "missing.png");
        assert!(loader.try_next().is_none());
    }

    #[test]
    fn panicking_source_reports_failure() {
        struct Panics;
        impl TextureSource for Panics {
            fn fetch(&self, _: &FetchRequest) -> Result<ImageData, TextureLoadError> {
                panic!("decoder exploded");
            }
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .build()
            .unwrap();
        let mut loader = TextureLoader::new(Arc::new(Panics), runtime.handle().clone());
        loader.request(TextureId::from_raw(7), request("boom.png"));

        match loader.blocking_next() {
            Some(LoadOutcome::Failed { id, error }) => {
                assert_eq!(id, TextureId::from_raw(7));
                assert_eq!(error.url, "boom.png");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
