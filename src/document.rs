//! Data model: source documents, their artifacts, and per-conversion stats.

use crate::config::{SOURCE_EXTENSION, TARGET_EXTENSION};
use crate::pipeline::sanitize::BaseName;
use std::path::PathBuf;

/// An uploaded `.jsf` file persisted in the input directory.
///
/// Immutable once written; the service never deletes it.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub base_name: BaseName,
    /// Filename exactly as the client sent it.
    pub original_name: String,
    /// `<inputs>/<base>.jsf`
    pub path: PathBuf,
    /// Bytes written.
    pub size: u64,
}

impl UploadedDocument {
    /// Stored file name, `<base>.jsf`.
    pub fn file_name(&self) -> String {
        self.base_name.file_name(SOURCE_EXTENSION)
    }
}

/// A generated `.pdf` in the output directory, paired with its source by
/// base name.
#[derive(Debug, Clone)]
pub struct ConvertedArtifact {
    pub base_name: BaseName,
    /// `<outputs>/<base>.pdf`
    pub path: PathBuf,
    pub exists: bool,
    /// Size on disk when `exists`.
    pub size: Option<u64>,
}

impl ConvertedArtifact {
    /// Stored file name, `<base>.pdf`.
    pub fn file_name(&self) -> String {
        self.base_name.file_name(TARGET_EXTENSION)
    }
}

/// Timing and size figures for one conversion.
#[derive(Debug, Clone, Default)]
pub struct ConversionStats {
    pub input_bytes: u64,
    pub output_bytes: u64,
    /// Wall-clock time spent in the converter process.
    pub converter_duration_ms: u64,
}

/// Result of a successful conversion.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    pub artifact: ConvertedArtifact,
    pub stats: ConversionStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::sanitize::sanitize_base_name;

    #[test]
    fn document_and_artifact_share_base_name() {
        let base = sanitize_base_name("quarterly report.jsf");
        let doc = UploadedDocument {
            base_name: base.clone(),
            original_name: "quarterly report.jsf".into(),
            path: PathBuf::from("inputs/quarterly_report.jsf"),
            size: 12,
        };
        let artifact = ConvertedArtifact {
            base_name: base,
            path: PathBuf::from("outputs/quarterly_report.pdf"),
            exists: true,
            size: Some(900),
        };
        assert_eq!(doc.file_name(), "quarterly_report.jsf");
        assert_eq!(artifact.file_name(), "quarterly_report.pdf");
        assert_eq!(doc.base_name, artifact.base_name);
    }
}
