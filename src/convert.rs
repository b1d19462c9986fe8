//! Conversion entry point: stored document → converter → verified artifact.
//!
//! ```text
//! UploadedDocument
//!  │
//!  ├─ 1. Paths    <inputs>/<base>.jsf  →  <outputs>/<base>.pdf
//!  ├─ 2. Invoke   external converter under the timeout guard
//!  ├─ 3. Verify   artifact must exist on disk as a regular file
//!  └─ 4. Output   ConvertedArtifact + ConversionStats
//! ```
//!
//! A converter that exits zero without writing its output is reported as
//! [`ConvertError::MissingOutput`]. Stale artifacts from earlier runs are not
//! removed before invoking, so a failed re-conversion can leave the previous
//! PDF in place.

use crate::document::{ConversionOutput, ConversionStats, ConvertedArtifact, UploadedDocument};
use crate::error::ConvertError;
use crate::pipeline::invoke::ConverterInvoker;
use crate::pipeline::sanitize::BaseName;
use crate::pipeline::storage::StorageLayout;
use tracing::{debug, info, warn};

/// Convert a stored source document into its PDF artifact.
///
/// # Errors
/// Any [`ConvertError`]: spawn failure, non-zero exit, timeout, or a
/// success report with no file on disk.
pub async fn convert_document(
    document: &UploadedDocument,
    layout: &StorageLayout,
    invoker: &ConverterInvoker,
) -> Result<ConversionOutput, ConvertError> {
    let output_path = layout.output_path(&document.base_name);
    info!(
        input = %document.path.display(),
        output = %output_path.display(),
        "Starting conversion of '{}'",
        document.original_name
    );

    let report = invoker.run(&document.path, &output_path).await?;
    if !report.diagnostics.is_empty() {
        debug!("Converter output: {}", report.diagnostics);
    }

    let artifact = verify_artifact(layout, &document.base_name).await;
    if !artifact.exists {
        warn!(
            "Converter reported success but '{}' is missing",
            output_path.display()
        );
        return Err(ConvertError::MissingOutput { path: output_path });
    }

    let stats = ConversionStats {
        input_bytes: document.size,
        output_bytes: artifact.size.unwrap_or(0),
        converter_duration_ms: report.duration.as_millis() as u64,
    };

    info!(
        input_bytes = stats.input_bytes,
        output_bytes = stats.output_bytes,
        duration_ms = stats.converter_duration_ms,
        "Conversion complete: {}",
        artifact.file_name()
    );

    Ok(ConversionOutput { artifact, stats })
}

/// Inspect `<outputs>/<base>.pdf` on disk.
pub async fn verify_artifact(layout: &StorageLayout, base: &BaseName) -> ConvertedArtifact {
    let path = layout.output_path(base);
    let (exists, size) = match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => (true, Some(meta.len())),
        _ => (false, None),
    };
    ConvertedArtifact {
        base_name: base.clone(),
        path,
        exists,
        size,
    }
}
