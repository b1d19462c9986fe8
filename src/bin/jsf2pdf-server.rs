//! Server binary for jsf2pdf.
//!
//! A thin shim over the library crate that maps CLI flags (with environment
//! fallbacks) to `ServiceConfig` and runs the HTTP service.

use anyhow::{Context, Result};
use clap::Parser;
use jsf2pdf::{serve, ConverterCommand, ServiceConfig};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve ./inputs, ./outputs and ./public on port 3000
  jsf2pdf-server

  # Custom port and upload limit
  PORT=8080 MAX_UPLOAD_MB=50 jsf2pdf-server

  # Use a different converter
  jsf2pdf-server --converter /usr/local/bin/render --converter-arg --letter

ENDPOINTS:
  GET  /api/health             {"ok": true}
  GET  /api/files              {"files": ["report.pdf", ...]}
  GET  /api/download/<name>    the PDF bytes
  POST /api/upload             multipart field "file" with a .jsf document

CONVERTER:
  Invoked as <converter> <converter-args...> <input.jsf> <output.pdf>.
  Exit status 0 means success; anything printed to stderr is reported back
  on failure. Runs longer than --convert-timeout are killed.
"#;

/// Upload .jsf documents over HTTP and convert them to PDF.
#[derive(Parser, Debug)]
#[command(
    name = "jsf2pdf-server",
    version,
    about = "Upload .jsf documents over HTTP and convert them to PDF",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Interface to bind.
    #[arg(long, env = "JSF2PDF_HOST", default_value = "0.0.0.0")]
    host: String,

    /// TCP port.
    #[arg(short, long, env = "PORT", default_value_t = 3000,
          value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,

    /// Maximum upload size in megabytes.
    #[arg(long, env = "MAX_UPLOAD_MB", default_value_t = 20,
          value_parser = clap::value_parser!(u64).range(1..))]
    max_upload_mb: u64,

    /// Converter timeout in seconds.
    #[arg(long, env = "CONVERT_TIMEOUT_SECS", default_value_t = 15,
          value_parser = clap::value_parser!(u64).range(1..))]
    convert_timeout: u64,

    /// Project root holding inputs/ and outputs/.
    #[arg(long, env = "JSF2PDF_ROOT", default_value = ".")]
    root: PathBuf,

    /// Static asset directory [default: <root>/public].
    #[arg(long, env = "JSF2PDF_STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// Converter program.
    #[arg(long, env = "JSF2PDF_CONVERTER", default_value = "python3")]
    converter: String,

    /// Leading converter argument (repeatable), placed before the input and output paths.
    #[arg(long = "converter-arg", env = "JSF2PDF_CONVERTER_ARGS",
          value_delimiter = ',', default_value = "converter.py",
          allow_hyphen_values = true)]
    converter_args: Vec<String>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "JSF2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli)?;
    tracing::debug!(?config, "Resolved configuration");

    // ── Run ──────────────────────────────────────────────────────────────
    serve(config).await.context("Server failed")?;

    Ok(())
}

/// Map CLI args to `ServiceConfig`.
fn build_config(cli: &Cli) -> Result<ServiceConfig> {
    let converter = ConverterCommand::new(cli.converter.clone()).args(
        cli.converter_args
            .iter()
            .filter(|a| !a.is_empty())
            .cloned(),
    );

    let mut builder = ServiceConfig::builder()
        .host(cli.host.clone())
        .port(cli.port)
        .root_dir(&cli.root)
        .max_upload_mb(cli.max_upload_mb)
        .convert_timeout_secs(cli.convert_timeout)
        .converter(converter);

    if let Some(ref dir) = cli.static_dir {
        builder = builder.static_dir(dir);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_map_to_service_defaults() {
        let cli = Cli::try_parse_from(["jsf2pdf-server"]).unwrap();
        let config = build_config(&cli).unwrap();
        assert_eq!(config.max_upload_bytes, 20 * 1024 * 1024);
        assert_eq!(config.converter, ConverterCommand::default());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "jsf2pdf-server",
            "--port",
            "8081",
            "--max-upload-mb",
            "2",
            "--convert-timeout",
            "4",
            "--root",
            "/tmp/j2p",
            "--converter",
            "sh",
            "--converter-arg",
            "render.sh",
            "--converter-arg",
            "--fast",
        ])
        .unwrap();
        let config = build_config(&cli).unwrap();
        assert_eq!(config.port, 8081);
        assert_eq!(config.max_upload_bytes, 2 * 1024 * 1024);
        assert_eq!(config.convert_timeout.as_secs(), 4);
        assert_eq!(config.outputs_dir(), PathBuf::from("/tmp/j2p/outputs"));
        assert_eq!(
            config.converter,
            ConverterCommand::new("sh").args(["render.sh", "--fast"])
        );
    }
}
