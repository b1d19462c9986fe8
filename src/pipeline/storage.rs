//! Storage layout: the `inputs/` and `outputs/` directories.
//!
//! Uploads are streamed into a hidden temporary file inside `inputs/` and
//! renamed onto `<base>.jsf` only once the whole body has arrived within the
//! size limit. An oversized or aborted upload drops its [`StagedUpload`],
//! which deletes the temporary file, so the input directory never holds a
//! partial document. The rename is atomic; concurrent uploads of the same
//! base name race and the last rename wins.

use crate::config::{ServiceConfig, SOURCE_EXTENSION, TARGET_EXTENSION};
use crate::document::UploadedDocument;
use crate::error::ServiceError;
use crate::pipeline::sanitize::{has_extension, strip_directories, BaseName};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio_stream::wrappers::ReadDirStream;
use tracing::{debug, info, warn};

/// The two data directories of the service.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    inputs: PathBuf,
    outputs: PathBuf,
}

impl StorageLayout {
    pub fn new(inputs: impl Into<PathBuf>, outputs: impl Into<PathBuf>) -> Self {
        Self {
            inputs: inputs.into(),
            outputs: outputs.into(),
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(config.inputs_dir(), config.outputs_dir())
    }

    pub fn inputs_dir(&self) -> &Path {
        &self.inputs
    }

    pub fn outputs_dir(&self) -> &Path {
        &self.outputs
    }

    /// Create both directories if they are missing.
    pub async fn ensure(&self) -> Result<(), ServiceError> {
        for dir in [&self.inputs, &self.outputs] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| ServiceError::io(dir, e))?;
            debug!("Storage directory ready: {}", dir.display());
        }
        Ok(())
    }

    /// `<inputs>/<base>.jsf`
    pub fn input_path(&self, base: &BaseName) -> PathBuf {
        self.inputs.join(base.file_name(SOURCE_EXTENSION))
    }

    /// `<outputs>/<base>.pdf`
    pub fn output_path(&self, base: &BaseName) -> PathBuf {
        self.outputs.join(base.file_name(TARGET_EXTENSION))
    }

    /// Open a staging file for an upload capped at `limit` bytes.
    pub fn stage_upload(&self, limit: u64) -> Result<StagedUpload, ServiceError> {
        let tmp = tempfile::Builder::new()
            .prefix(".upload-")
            .suffix(".part")
            .tempfile_in(&self.inputs)
            .map_err(|e| ServiceError::io(&self.inputs, e))?;
        let handle = tmp
            .as_file()
            .try_clone()
            .map_err(|e| ServiceError::io(tmp.path(), e))?;

        Ok(StagedUpload {
            tmp,
            file: tokio::fs::File::from_std(handle),
            written: 0,
            limit,
        })
    }

    /// Names of all regular files in `outputs/` ending in `.pdf`
    /// (case-insensitive), sorted.
    pub async fn list_artifacts(&self) -> Result<Vec<String>, ServiceError> {
        let dir = tokio::fs::read_dir(&self.outputs)
            .await
            .map_err(|e| ServiceError::io(&self.outputs, e))?;
        let mut entries = ReadDirStream::new(dir);

        let mut names = Vec::new();
        while let Some(entry) = entries.next().await {
            let entry = entry.map_err(|e| ServiceError::io(&self.outputs, e))?;
            let is_file = match entry.file_type().await {
                Ok(ft) => ft.is_file(),
                Err(e) => {
                    warn!("Skipping unreadable entry {}: {}", entry.path().display(), e);
                    continue;
                }
            };
            if !is_file {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if has_extension(&name, TARGET_EXTENSION) {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }

    /// Resolve a client-requested artifact name to an existing file.
    ///
    /// Directory components are stripped first, so the result is always a
    /// direct child of `outputs/`.
    ///
    /// # Errors
    /// * `Validation` — empty name or not a `.pdf`
    /// * `NotFound` — no such regular file
    pub async fn locate_artifact(&self, requested: &str) -> Result<(String, PathBuf), ServiceError> {
        let name = strip_directories(requested);
        if name.is_empty() || name == "." || name == ".." {
            return Err(ServiceError::Validation("Invalid file name".into()));
        }
        if !has_extension(name, TARGET_EXTENSION) {
            return Err(ServiceError::Validation(format!(
                "Only .{} files can be downloaded",
                TARGET_EXTENSION
            )));
        }

        let path = self.outputs.join(name);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok((name.to_string(), path)),
            _ => Err(ServiceError::NotFound("File not found".into())),
        }
    }
}

/// An upload being streamed to a temporary file.
///
/// Dropping it without [`commit`](StagedUpload::commit) deletes the file.
#[derive(Debug)]
pub struct StagedUpload {
    tmp: NamedTempFile,
    file: tokio::fs::File,
    written: u64,
    limit: u64,
}

impl StagedUpload {
    /// Append a chunk, failing with `SizeLimit` once the total passes the cap.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), ServiceError> {
        self.written += chunk.len() as u64;
        if self.written > self.limit {
            warn!(
                written = self.written,
                limit = self.limit,
                "Upload size limit exceeded, discarding staged file"
            );
            return Err(ServiceError::too_large(self.limit));
        }
        self.file
            .write_all(chunk)
            .await
            .map_err(|e| ServiceError::io(self.tmp.path(), e))
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Move the staged bytes to `<inputs>/<base>.jsf`, replacing any
    /// previous document with the same base name.
    pub async fn commit(
        mut self,
        layout: &StorageLayout,
        base: BaseName,
        original_name: String,
    ) -> Result<UploadedDocument, ServiceError> {
        self.file
            .flush()
            .await
            .map_err(|e| ServiceError::io(self.tmp.path(), e))?;
        let StagedUpload { tmp, file, written, .. } = self;
        drop(file);

        let target = layout.input_path(&base);
        tmp.persist(&target)
            .map_err(|e| ServiceError::io(&target, e.error))?;

        info!(
            input = %target.display(),
            bytes = written,
            "Stored upload '{}'",
            original_name
        );

        Ok(UploadedDocument {
            base_name: base,
            original_name,
            path: target,
            size: written,
        })
    }
}
