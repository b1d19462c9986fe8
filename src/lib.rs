//! # jsf2pdf
//!
//! Upload `.jsf` text documents over HTTP and convert them to PDF with an
//! external converter process.
//!
//! ## Pipeline Overview
//!
//! ```text
//! POST /api/upload (multipart "file")
//!  │
//!  ├─ 1. Validate  extension must be .jsf
//!  ├─ 2. Sanitize  client filename → BaseName  [a-zA-Z0-9._-]+
//!  ├─ 3. Stage     stream into inputs/ under the size cap, then rename
//!  ├─ 4. Convert   <converter> <inputs/base.jsf> <outputs/base.pdf>, with timeout
//!  ├─ 5. Verify    outputs/base.pdf must exist
//!  └─ 6. Respond   { message, input: "base.jsf", output: "base.pdf" }
//! ```
//!
//! `GET /api/files` lists `outputs/`, `GET /api/download/{name}` streams one
//! artifact back, and every other read request is served from the static
//! directory.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jsf2pdf::{serve, ConverterCommand, ServiceConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServiceConfig::builder()
//!         .root_dir("/srv/jsf2pdf")
//!         .converter(ConverterCommand::new("python3").arg("converter.py"))
//!         .convert_timeout_secs(15)
//!         .build()?;
//!     serve(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `jsf2pdf-server` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod api;
pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod pipeline;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use api::{router, AppState};
pub use config::{ConverterCommand, ServiceConfig, ServiceConfigBuilder};
pub use convert::{convert_document, verify_artifact};
pub use document::{ConversionOutput, ConversionStats, ConvertedArtifact, UploadedDocument};
pub use error::{ConvertError, ErrorBody, ServiceError};
pub use pipeline::invoke::ConverterInvoker;
pub use pipeline::sanitize::{sanitize_base_name, BaseName};
pub use pipeline::storage::StorageLayout;
pub use server::{serve, serve_on};
