use job_board::board::{AssetError, AssetStore, AssetUpload};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Uploaded file kept by [`InMemoryAssetStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoredAsset {
    pub(crate) content_type: String,
    pub(crate) bytes: Vec<u8>,
}

/// Asset backend that keeps uploads in process and serves them under `base_url`.
#[derive(Clone)]
pub(crate) struct InMemoryAssetStore {
    base_url: String,
    next_key: Arc<AtomicU64>,
    objects: Arc<Mutex<HashMap<String, StoredAsset>>>,
}

impl InMemoryAssetStore {
    pub(crate) fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            next_key: Arc::new(AtomicU64::new(1)),
            objects: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub(crate) fn fetch(&self, key: &str) -> Result<Option<StoredAsset>, AssetError> {
        let guard = self
            .objects
            .lock()
            .map_err(|_| AssetError::Unavailable("asset mutex poisoned".to_string()))?;
        Ok(guard.get(key).cloned())
    }
}

/// Keep keys URL-safe: anything outside `[A-Za-z0-9._-]` becomes '-'.
fn object_key(sequence: u64, file_name: &str) -> String {
    let safe: String = file_name
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                ch
            } else {
                '-'
            }
        })
        .collect();
    format!("{sequence:06}-{safe}")
}

impl AssetStore for InMemoryAssetStore {
    fn upload(&self, upload: AssetUpload) -> Result<String, AssetError> {
        if upload.bytes.is_empty() {
            return Err(AssetError::Empty(upload.file_name));
        }

        let key = object_key(
            self.next_key.fetch_add(1, Ordering::Relaxed),
            &upload.file_name,
        );
        let stored = StoredAsset {
            content_type: upload.content_type(),
            bytes: upload.bytes,
        };
        self.objects
            .lock()
            .map_err(|_| AssetError::Unavailable("asset mutex poisoned".to_string()))?
            .insert(key.clone(), stored);

        Ok(format!("{}/{}", self.base_url, key))
    }
}
