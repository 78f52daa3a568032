mod error;
mod logging;
mod provider;

use std::io::Write;
use std::path::PathBuf;

use clap::{Args, Parser};
use kube_schema_resolver::{GroupVersion, GroupVersionKind, Schema, SchemaResolver};

use crate::error::CliResult;

pub use error::CliError;
pub use logging::{Color, LogFormat, setup_logging};
pub use provider::{ResolverOptions, build_resolver};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "kube-schema-resolver",
    version,
    about = "Print the fully inlined OpenAPI schema of a Kubernetes kind"
)]
pub struct Cli {
    /// API version of the kind, e.g. `v1` or `apps/v1`
    #[arg(value_name = "API_VERSION")]
    pub api_version: String,

    #[arg(value_name = "KIND")]
    pub kind: String,

    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub output: OutputArgs,

    #[command(flatten)]
    pub log: LogArgs,
}

#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Kubernetes API server to query OpenAPI v3 discovery on
    #[arg(long, env = "KUBE_SCHEMA_SERVER")]
    pub server: Option<String>,

    /// Bearer token sent to the API server
    #[arg(long, env = "KUBE_SCHEMA_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// PEM file of the CA certificates that sign the API server's certificate
    #[arg(long, env = "KUBE_SCHEMA_CA_CERT")]
    pub certificate_authority: Option<PathBuf>,

    /// Skip verification of the API server's certificate
    #[arg(long)]
    pub insecure_skip_tls_verify: bool,

    /// JSON or YAML file of generated OpenAPI definitions
    #[arg(long)]
    pub definitions: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub compact: bool,
}

#[derive(Args, Debug, Clone)]
pub struct LogArgs {
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<tracing::metadata::Level>,

    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    #[arg(long, value_enum, default_value_t = Color::Auto)]
    pub color: Color,
}

impl Cli {
    /// The requested kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the api version is malformed or the kind is empty.
    pub fn gvk(&self) -> CliResult<GroupVersionKind> {
        let gv: GroupVersion = self.api_version.parse()?;
        let kind = self.kind.trim();
        if kind.is_empty() {
            return Err(CliError::EmptyKind);
        }
        Ok(gv.with_kind(kind))
    }

    #[must_use]
    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            server: self.source.server.clone(),
            token: self.source.token.clone(),
            certificate_authority: self.source.certificate_authority.clone(),
            insecure_skip_tls_verify: self.source.insecure_skip_tls_verify,
            definitions: self.source.definitions.clone(),
        }
    }
}

/// Resolve the schema requested on the command line.
///
/// # Errors
///
/// Returns an error if no source is configured, the definitions cannot be
/// loaded, or the schema cannot be resolved.
pub fn resolve(cli: &Cli) -> CliResult<Schema> {
    let gvk = cli.gvk()?;
    let resolver = build_resolver(&cli.resolver_options())?;
    tracing::info!(%gvk, "resolving schema");
    Ok(resolver.resolve_schema(&gvk)?)
}

/// Run the CLI.
///
/// # Errors
///
/// Returns an error if the schema cannot be resolved or output cannot be
/// written.
pub fn run(cli: &Cli) -> CliResult<()> {
    let schema = resolve(cli)?;

    let json = if cli.output.compact {
        serde_json::to_vec(&schema)?
    } else {
        serde_json::to_vec_pretty(&schema)?
    };

    if let Some(path) = &cli.output.output {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| CliError::CreateOutputDir {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(path, json).map_err(|e| CliError::WriteOutput {
            path: path.clone(),
            source: e,
        })?;
    } else {
        let mut out = std::io::stdout().lock();
        out.write_all(&json)?;
        out.write_all(b"\n")?;
    }

    Ok(())
}
