//! Service configuration.
//!
//! Every path, limit and the converter command live in [`ServiceConfig`],
//! built via [`ServiceConfigBuilder`]. Components receive the config (or the
//! pieces they need) explicitly; nothing is read from process-wide globals, so
//! tests run each service against its own temporary root.

use crate::error::ServiceError;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Extension of accepted source documents.
pub const SOURCE_EXTENSION: &str = "jsf";

/// Extension of generated artifacts.
pub const TARGET_EXTENSION: &str = "pdf";

/// Directory (under the root) holding uploaded source documents.
pub const INPUT_DIR_NAME: &str = "inputs";

/// Directory (under the root) holding generated artifacts.
pub const OUTPUT_DIR_NAME: &str = "outputs";

/// Default static asset directory (under the root).
pub const STATIC_DIR_NAME: &str = "public";

const MIB: u64 = 1024 * 1024;

/// External program used to render a source document.
///
/// Invoked as `<program> <args…> <input> <output>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ConverterCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl Default for ConverterCommand {
    fn default() -> Self {
        ConverterCommand::new("python3").arg("converter.py")
    }
}

/// Configuration for the upload-and-convert service.
///
/// # Example
/// ```rust
/// use jsf2pdf::ServiceConfig;
///
/// let config = ServiceConfig::builder()
///     .root_dir("/srv/jsf2pdf")
///     .port(8080)
///     .max_upload_mb(5)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
/// ```
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Interface to bind. Default: `0.0.0.0`.
    pub host: String,

    /// TCP port. Default: 3000.
    pub port: u16,

    /// Project root; `inputs/` and `outputs/` live directly under it. Default: `.`.
    pub root_dir: PathBuf,

    /// Static asset directory. `None` means `<root>/public`.
    pub static_dir: Option<PathBuf>,

    /// Maximum accepted upload size in bytes. Default: 20 MiB.
    pub max_upload_bytes: u64,

    /// Wall-clock budget for one converter run. Default: 15 s.
    pub convert_timeout: Duration,

    /// Converter program and leading arguments.
    pub converter: ConverterCommand,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            root_dir: PathBuf::from("."),
            static_dir: None,
            max_upload_bytes: 20 * MIB,
            convert_timeout: Duration::from_secs(15),
            converter: ConverterCommand::default(),
        }
    }
}

impl ServiceConfig {
    /// Create a new builder for `ServiceConfig`.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            config: Self::default(),
        }
    }

    pub fn inputs_dir(&self) -> PathBuf {
        self.root_dir.join(INPUT_DIR_NAME)
    }

    pub fn outputs_dir(&self) -> PathBuf {
        self.root_dir.join(OUTPUT_DIR_NAME)
    }

    pub fn static_dir(&self) -> PathBuf {
        match &self.static_dir {
            Some(dir) => dir.clone(),
            None => self.root_dir.join(STATIC_DIR_NAME),
        }
    }

    /// `host:port` string for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn root_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.root_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn static_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.static_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Upload limit in whole mebibytes (the unit of `MAX_UPLOAD_MB`).
    pub fn max_upload_mb(mut self, mb: u64) -> Self {
        self.config.max_upload_bytes = mb.saturating_mul(MIB);
        self
    }

    pub fn max_upload_bytes(mut self, bytes: u64) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn convert_timeout_secs(mut self, secs: u64) -> Self {
        self.config.convert_timeout = Duration::from_secs(secs);
        self
    }

    pub fn convert_timeout(mut self, timeout: Duration) -> Self {
        self.config.convert_timeout = timeout;
        self
    }

    pub fn converter(mut self, command: ConverterCommand) -> Self {
        self.config.converter = command;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServiceConfig, ServiceError> {
        let c = &self.config;
        if c.port == 0 {
            return Err(ServiceError::InvalidConfig("Port must be ≥ 1".into()));
        }
        if c.max_upload_bytes == 0 {
            return Err(ServiceError::InvalidConfig(
                "Maximum upload size must be ≥ 1 byte".into(),
            ));
        }
        if c.convert_timeout.is_zero() {
            return Err(ServiceError::InvalidConfig(
                "Conversion timeout must be greater than zero".into(),
            ));
        }
        if c.converter.program.trim().is_empty() {
            return Err(ServiceError::InvalidConfig(
                "Converter program must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = ServiceConfig::default();
        assert_eq!(c.port, 3000);
        assert_eq!(c.max_upload_bytes, 20 * 1024 * 1024);
        assert_eq!(c.convert_timeout, Duration::from_secs(15));
        assert_eq!(c.inputs_dir(), PathBuf::from("./inputs"));
        assert_eq!(c.outputs_dir(), PathBuf::from("./outputs"));
        assert_eq!(c.static_dir(), PathBuf::from("./public"));
    }

    #[test]
    fn builder_overrides() {
        let c = ServiceConfig::builder()
            .host("127.0.0.1")
            .port(8080)
            .root_dir("/data")
            .static_dir("/web")
            .max_upload_mb(5)
            .convert_timeout_secs(3)
            .converter(ConverterCommand::new("sh").arg("render.sh"))
            .build()
            .unwrap();
        assert_eq!(c.bind_addr(), "127.0.0.1:8080");
        assert_eq!(c.inputs_dir(), PathBuf::from("/data/inputs"));
        assert_eq!(c.static_dir(), PathBuf::from("/web"));
        assert_eq!(c.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(c.convert_timeout, Duration::from_secs(3));
        assert_eq!(c.converter.args, vec!["render.sh".to_string()]);
    }

    #[test]
    fn builder_rejects_invalid_values() {
        assert!(ServiceConfig::builder().port(0).build().is_err());
        assert!(ServiceConfig::builder().max_upload_bytes(0).build().is_err());
        assert!(ServiceConfig::builder().convert_timeout_secs(0).build().is_err());
        assert!(ServiceConfig::builder()
            .converter(ConverterCommand::new("  "))
            .build()
            .is_err());
    }

    #[test]
    fn converter_command_collects_args() {
        let cmd = ConverterCommand::new("python3").args(["a.py", "--fast"]);
        assert_eq!(cmd.args, vec!["a.py".to_string(), "--fast".to_string()]);
        assert_eq!(ConverterCommand::default().program, "python3");
    }
}
