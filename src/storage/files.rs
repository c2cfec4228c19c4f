//! File-backed record storage
//!
//! One uploaded image plus one JSON sidecar per analysis, both named by
//! the analysis identifier, in a single flat directory. An empty
//! `<id>.lock` file claims the identifier before anything else is written.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::traits::*;
use crate::utils::image::mime_for_extension;

/// Upper bound on `_N` suffixes tried within one second
const MAX_ID_SUFFIX: usize = 1000;

/// Directory-based record storage
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create storage rooted at `dir`, creating the directory if needed
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create uploads directory {}", dir.display()))?;
        info!("Record storage at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn sidecar_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    fn claim_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.lock", id))
    }

    /// Atomically reserve `id`. `Ok(false)` means another writer holds it.
    async fn claim(&self, id: &str) -> Result<bool> {
        let path = self.claim_path(id);
        match create_new(&path).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to create {}", path.display())),
        }
    }

    async fn is_taken(&self, id: &str) -> bool {
        for path in [self.claim_path(id), self.sidecar_path(id)] {
            if fs::try_exists(path).await.unwrap_or(true) {
                return true;
            }
        }
        for ext in IMAGE_EXTENSIONS {
            if fs::try_exists(self.dir.join(format!("{}.{}", id, ext)))
                .await
                .unwrap_or(true)
            {
                return true;
            }
        }
        false
    }
}

async fn create_new(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new().write(true).create_new(true).open(path).await
}

#[async_trait]
impl RecordStore for FileStorage {
    async fn save_upload(&self, data: &[u8], filename: Option<&str>) -> Result<StoredUpload> {
        let ext = upload_extension(filename);
        let base = timestamp_id();

        for suffix in 0..MAX_ID_SUFFIX {
            let id = if suffix == 0 {
                base.clone()
            } else {
                format!("{}_{}", base, suffix)
            };
            if self.is_taken(&id).await {
                continue;
            }

            if !self.claim(&id).await? {
                continue;
            }

            let image_file = format!("{}.{}", id, ext);
            let path = self.dir.join(&image_file);
            let mut file = create_new(&path)
                .await
                .with_context(|| format!("Failed to create {}", path.display()))?;
            file.write_all(data)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            file.flush().await?;

            info!("Saved upload to {}", path.display());
            return Ok(StoredUpload { id, image_file });
        }

        anyhow::bail!("No free identifier for {}", base)
    }

    async fn save_record(&self, record: &StoredRecord) -> Result<()> {
        if !is_valid_id(&record.id) {
            anyhow::bail!("Invalid record id {:?}", record.id);
        }
        let path = self.sidecar_path(&record.id);
        let json = serde_json::to_vec(record).context("Failed to serialize record")?;
        let mut file = match create_new(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                anyhow::bail!("Record {} already exists", record.id)
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to create {}", path.display())),
        };
        file.write_all(&json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        file.flush().await?;
        info!("Saved analysis JSON to {}", path.display());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<RecordSummary>> {
        let mut sidecars = Vec::new();
        let mut entries = fs::read_dir(&self.dir)
            .await
            .with_context(|| format!("Failed to read {}", self.dir.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                sidecars.push(path);
            }
        }
        sidecars.sort();
        sidecars.reverse();

        let mut summaries = Vec::with_capacity(sidecars.len());
        for path in sidecars {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            let data: serde_json::Value = match fs::read(&path)
                .await
                .map_err(anyhow::Error::from)
                .and_then(|bytes| serde_json::from_slice(&bytes).map_err(anyhow::Error::from))
            {
                Ok(data) => data,
                Err(e) => {
                    debug!("Skipping unreadable sidecar {}: {}", path.display(), e);
                    continue;
                }
            };
            let field = |name: &str| data.get(name).and_then(|v| v.as_str()).map(str::to_string);
            summaries.push(RecordSummary {
                id: field("id").unwrap_or(stem),
                timestamp: field("timestamp").unwrap_or_default(),
                image_file: field("image_file").unwrap_or_default(),
            });
        }
        Ok(summaries)
    }

    async fn load(&self, id: &str) -> Result<Option<StoredRecord>> {
        if !is_valid_id(id) {
            return Ok(None);
        }
        let path = self.sidecar_path(id);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
        };
        let record = serde_json::from_slice(&bytes)
            .with_context(|| format!("Malformed sidecar {}", path.display()))?;
        Ok(Some(record))
    }

    async fn load_image(&self, id: &str) -> Result<Option<(Vec<u8>, &'static str)>> {
        if !is_valid_id(id) {
            return Ok(None);
        }
        for ext in IMAGE_EXTENSIONS {
            let path = self.dir.join(format!("{}.{}", id, ext));
            match fs::read(&path).await {
                Ok(bytes) => return Ok(Some((bytes, mime_for_extension(ext)))),
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    warn!("Failed to read {}: {}", path.display(), e);
                    return Err(e.into());
                }
            }
        }
        Ok(None)
    }
}
