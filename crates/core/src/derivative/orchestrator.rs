//! Request-time serve-or-generate protocol.
//!
//! One state machine per request: resolve the original, derive the cache
//! key, serve the existing file on a hit, otherwise render, commit, and
//! serve. There is no cross-request lock on a key; two concurrent misses
//! both render and the last commit wins.

use std::path::PathBuf;
use std::sync::Arc;

use darkroom_shared::types::media::VIDEO_EXTENSIONS;

use super::error::DerivativeError;
use super::key::{video_stem, CacheKey};
use super::sweep::InvalidationSweeper;
use super::types::TransformSpec;
use crate::storage::{CacheStore, PathResolver, StorageError, StorageLayout, StorageRoot};

/// Rendering port invoked on cache misses.
///
/// Implementations wrap the actual pixel, frame, and page engines. The
/// orchestrator never renders anything itself; it only decides when a
/// render is needed and where the result lives.
pub trait DerivativeRenderer: Send + Sync {
    /// Produces derivative bytes for a resolved original.
    fn produce(
        &self,
        original: &std::path::Path,
        spec: &TransformSpec,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, DerivativeError>> + Send;
}

/// A served derivative.
#[derive(Debug, Clone)]
pub struct Derivative {
    /// Derivative bytes, freshly rendered or read back from cache.
    pub bytes: Vec<u8>,
    /// Media type fixed by the transform.
    pub media_type: &'static str,
    /// Absolute path the derivative is cached at.
    pub cache_path: PathBuf,
}

/// Orchestrates derivative requests and cascading deletes.
pub struct DerivativeService<S: CacheStore, R: DerivativeRenderer> {
    layout: Arc<StorageLayout>,
    resolver: PathResolver,
    store: S,
    renderer: R,
    sweeper: InvalidationSweeper,
}

impl<S: CacheStore, R: DerivativeRenderer> DerivativeService<S, R> {
    /// Creates a service over the given storage layout, cache store, and
    /// renderer.
    pub fn new(layout: Arc<StorageLayout>, store: S, renderer: R) -> Self {
        let resolver = PathResolver::new(Arc::clone(&layout));
        let sweeper = InvalidationSweeper::new(Arc::clone(&layout));
        Self {
            layout,
            resolver,
            store,
            renderer,
            sweeper,
        }
    }

    /// Serves the derivative for `(asset_path, spec)`, rendering it on a
    /// cache miss.
    ///
    /// The cache check is a plain existence test on the derived key. There
    /// is no staleness comparison against the original, so an original
    /// edited in place keeps serving its old derivatives until deleted.
    ///
    /// # Errors
    ///
    /// - [`DerivativeError::ForbiddenPath`] if the path escapes the root
    /// - [`DerivativeError::NotFound`] if no original exists
    /// - any rendering error from the underlying engine on a miss
    pub async fn get_derivative(
        &self,
        asset_path: &str,
        spec: &TransformSpec,
    ) -> Result<Derivative, DerivativeError> {
        let decoded = PathResolver::decode(asset_path);
        let original = self.resolve_original(&decoded, spec)?;

        let key = CacheKey::build(&decoded, spec);
        let cache_path = key.locate(&self.layout);

        if self.store.exists(&cache_path).await? {
            let bytes = self.store.read(&cache_path).await?;
            return Ok(Derivative {
                bytes,
                media_type: spec.media_type(),
                cache_path,
            });
        }

        let bytes = self.renderer.produce(&original, spec).await?;
        self.store.commit(&cache_path, &bytes).await?;
        Ok(Derivative {
            bytes,
            media_type: spec.media_type(),
            cache_path,
        })
    }

    /// Deletes an original and sweeps every derivative that could have
    /// been produced from it. Returns the number of derivative files
    /// removed.
    ///
    /// # Errors
    ///
    /// - [`DerivativeError::ForbiddenPath`] if the path escapes the root
    /// - [`DerivativeError::NotFound`] if the original does not exist
    /// - [`DerivativeError::DeleteFailed`] if the original cannot be
    ///   removed; sweep failures after that point are logged, not raised
    pub async fn delete_original(&self, asset_path: &str) -> Result<usize, DerivativeError> {
        let decoded = PathResolver::decode(asset_path);
        let original = self
            .resolver
            .resolve_decoded(StorageRoot::Originals, &decoded, true)?;

        let sweeper = self.sweeper.clone();
        tokio::task::spawn_blocking(move || sweeper.sweep(&original, &decoded))
            .await
            .map_err(|err| DerivativeError::Render(format!("sweep task failed: {err}")))?
    }

    fn resolve_original(
        &self,
        decoded: &str,
        spec: &TransformSpec,
    ) -> Result<PathBuf, DerivativeError> {
        if matches!(spec, TransformSpec::VideoFrame { .. }) {
            return self.locate_video_original(decoded);
        }
        Ok(self
            .resolver
            .resolve_decoded(StorageRoot::Originals, decoded, true)?)
    }

    /// Finds the stored original for a video request. The request path may
    /// carry any supported video extension or none at all; candidates are
    /// probed stem-first across the supported set, lowercase then
    /// uppercase, with the literal path as the final attempt.
    fn locate_video_original(&self, decoded: &str) -> Result<PathBuf, DerivativeError> {
        let stem = video_stem(decoded);
        let lower = VIDEO_EXTENSIONS.iter().map(|ext| (*ext).to_string());
        let upper = VIDEO_EXTENSIONS.iter().map(|ext| ext.to_ascii_uppercase());
        for ext in lower.chain(upper) {
            let candidate = format!("{stem}.{ext}");
            match self
                .resolver
                .resolve_decoded(StorageRoot::Originals, &candidate, true)
            {
                Ok(path) => return Ok(path),
                Err(StorageError::NotFound { .. }) => {}
                Err(err) => return Err(err.into()),
            }
        }
        self.resolver
            .resolve_decoded(StorageRoot::Originals, stem, true)
            .map_err(|err| match err {
                StorageError::NotFound { .. } => DerivativeError::NotFound(decoded.to_string()),
                other => other.into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derivative::types::{FrameTimestamp, OutputFormat};
    use crate::storage::FsCacheStore;
    use darkroom_shared::config::StorageConfig;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct MemoryCacheStore {
        files: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
    }

    impl CacheStore for MemoryCacheStore {
        async fn exists(&self, path: &Path) -> Result<bool, StorageError> {
            Ok(self.files.lock().unwrap().contains_key(path))
        }

        async fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
            self.files
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| StorageError::not_found(path.display().to_string()))
        }

        async fn commit(&self, path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
            self.files
                .lock()
                .unwrap()
                .insert(path.to_path_buf(), bytes.to_vec());
            Ok(())
        }
    }

    #[derive(Clone)]
    struct CountingRenderer {
        calls: Arc<AtomicUsize>,
        output: Vec<u8>,
    }

    impl CountingRenderer {
        fn new(output: &[u8]) -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                output: output.to_vec(),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl DerivativeRenderer for CountingRenderer {
        async fn produce(
            &self,
            _original: &Path,
            _spec: &TransformSpec,
        ) -> Result<Vec<u8>, DerivativeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.output.clone())
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        layout: Arc<StorageLayout>,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = StorageConfig {
            originals_dir: dir.path().join("originals"),
            cache_dir: dir.path().join("cache"),
            thumbnails_dir: dir.path().join("thumbnails"),
        };
        let layout = Arc::new(StorageLayout::init(&config).expect("layout"));
        Fixture { _dir: dir, layout }
    }

    fn put_original(fx: &Fixture, rel: &str) {
        let path = fx.layout.root(StorageRoot::Originals).join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).expect("mkdir");
        std::fs::write(&path, b"original").expect("write");
    }

    fn resize_spec() -> TransformSpec {
        TransformSpec::Resize {
            width: 300,
            height: 300,
            quality: 80,
            format: OutputFormat::Webp,
        }
    }

    fn video_spec() -> TransformSpec {
        TransformSpec::VideoFrame {
            width: 300,
            height: 300,
            timestamp: FrameTimestamp::default(),
        }
    }

    #[tokio::test]
    async fn test_miss_renders_commits_and_serves() {
        let fx = fixture();
        put_original(&fx, "sec/img.png");
        let store = MemoryCacheStore::default();
        let renderer = CountingRenderer::new(b"rendered");
        let service =
            DerivativeService::new(Arc::clone(&fx.layout), store.clone(), renderer.clone());

        let served = service
            .get_derivative("sec/img.png", &resize_spec())
            .await
            .expect("derivative");

        assert_eq!(served.bytes, b"rendered".to_vec());
        assert_eq!(served.media_type, "image/webp");
        assert_eq!(renderer.calls(), 1);
        assert!(store.files.lock().unwrap().contains_key(&served.cache_path));
    }

    #[tokio::test]
    async fn test_repeat_request_served_without_rendering_again() {
        let fx = fixture();
        put_original(&fx, "sec/img.png");
        let renderer = CountingRenderer::new(b"rendered");
        let service = DerivativeService::new(
            Arc::clone(&fx.layout),
            MemoryCacheStore::default(),
            renderer.clone(),
        );

        let first = service
            .get_derivative("sec/img.png", &resize_spec())
            .await
            .expect("first");
        let second = service
            .get_derivative("sec/img.png", &resize_spec())
            .await
            .expect("second");

        assert_eq!(first.bytes, second.bytes);
        assert_eq!(first.cache_path, second.cache_path);
        assert_eq!(renderer.calls(), 1, "second request must be a cache hit");
    }

    #[tokio::test]
    async fn test_traversal_fails_before_any_render() {
        let fx = fixture();
        let renderer = CountingRenderer::new(b"rendered");
        let service = DerivativeService::new(
            Arc::clone(&fx.layout),
            MemoryCacheStore::default(),
            renderer.clone(),
        );

        let result = service
            .get_derivative("../../etc/passwd", &resize_spec())
            .await;

        assert!(matches!(result, Err(DerivativeError::ForbiddenPath(_))));
        assert_eq!(renderer.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_original_fails_before_any_render() {
        let fx = fixture();
        let renderer = CountingRenderer::new(b"rendered");
        let service = DerivativeService::new(
            Arc::clone(&fx.layout),
            MemoryCacheStore::default(),
            renderer.clone(),
        );

        let result = service.get_derivative("sec/missing.png", &resize_spec()).await;

        assert!(matches!(result, Err(DerivativeError::NotFound(_))));
        assert_eq!(renderer.calls(), 0);
    }

    #[tokio::test]
    async fn test_video_request_finds_differently_cased_extension() {
        let fx = fixture();
        put_original(&fx, "clips/demo.MOV");
        let renderer = CountingRenderer::new(b"frame");
        let service = DerivativeService::new(
            Arc::clone(&fx.layout),
            MemoryCacheStore::default(),
            renderer.clone(),
        );

        let served = service
            .get_derivative("clips/demo.mp4", &video_spec())
            .await
            .expect("frame");

        assert_eq!(served.media_type, "image/jpeg");
        assert_eq!(renderer.calls(), 1);
    }

    #[tokio::test]
    async fn test_video_requests_share_cache_across_request_extensions() {
        let fx = fixture();
        put_original(&fx, "clips/demo.MOV");
        let renderer = CountingRenderer::new(b"frame");
        let service = DerivativeService::new(
            Arc::clone(&fx.layout),
            MemoryCacheStore::default(),
            renderer.clone(),
        );

        service
            .get_derivative("clips/demo.mp4", &video_spec())
            .await
            .expect("first");
        service
            .get_derivative("clips/demo.webm", &video_spec())
            .await
            .expect("second");

        assert_eq!(renderer.calls(), 1, "stem-keyed cache must be shared");
    }

    #[tokio::test]
    async fn test_missing_video_is_not_found() {
        let fx = fixture();
        let renderer = CountingRenderer::new(b"frame");
        let service = DerivativeService::new(
            Arc::clone(&fx.layout),
            MemoryCacheStore::default(),
            renderer.clone(),
        );

        let result = service.get_derivative("clips/none.mp4", &video_spec()).await;

        assert!(matches!(result, Err(DerivativeError::NotFound(_))));
        assert_eq!(renderer.calls(), 0);
    }

    #[tokio::test]
    async fn test_delete_cascades_and_second_delete_is_not_found() {
        let fx = fixture();
        put_original(&fx, "sec/img.png");
        let renderer = CountingRenderer::new(b"rendered");
        let service =
            DerivativeService::new(Arc::clone(&fx.layout), FsCacheStore::new(), renderer.clone());

        service
            .get_derivative("sec/img.png", &resize_spec())
            .await
            .expect("resize");
        service
            .get_derivative(
                "sec/img.png",
                &TransformSpec::Thumbnail {
                    width: 150,
                    height: 150,
                    quality: 80,
                },
            )
            .await
            .expect("thumbnail");

        let deleted = service
            .delete_original("sec/img.png")
            .await
            .expect("delete");
        assert!(deleted >= 2, "expected at least two swept files, got {deleted}");
        assert!(!fx
            .layout
            .root(StorageRoot::Originals)
            .join("sec/img.png")
            .exists());

        let again = service.delete_original("sec/img.png").await;
        assert!(matches!(again, Err(DerivativeError::NotFound(_))));
    }
}
