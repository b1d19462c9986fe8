//! Pipeline stages for upload-and-convert.
//!
//! Each submodule implements exactly one step and is usable without the HTTP
//! layer.
//!
//! ## Data Flow
//!
//! ```text
//! sanitize ──▶ storage ──▶ invoke ──▶ storage
//! (name)       (stage +    (external   (verify /
//!               persist)    converter)  list / locate)
//! ```
//!
//! 1. [`sanitize`] — turn the client filename into a [`sanitize::BaseName`]
//! 2. [`storage`]  — stream the upload into `inputs/`, enforce the size cap,
//!    list and locate artifacts in `outputs/`
//! 3. [`invoke`]   — run the converter process under the timeout guard

pub mod invoke;
pub mod sanitize;
pub mod storage;
