use std::path::PathBuf;

use kube_schema_resolver::{
    ChainSchemaResolver, Definitions, DefinitionsSchemaResolver, DiscoveryResolver, HttpDiscovery,
    SchemaResolver, SchemeNamer,
};

use crate::error::{CliError, CliResult};

#[derive(Debug, Clone, Default)]
pub struct ResolverOptions {
    pub server: Option<String>,
    pub token: Option<String>,
    pub certificate_authority: Option<PathBuf>,
    pub insecure_skip_tls_verify: bool,
    pub definitions: Option<PathBuf>,
}

/// Builds the resolver for the configured sources.
///
/// With both sources the static definitions are asked first and discovery is
/// only consulted for types they do not know.
pub fn build_resolver(opts: &ResolverOptions) -> CliResult<Box<dyn SchemaResolver>> {
    let definitions = match &opts.definitions {
        Some(path) => {
            let defs = Definitions::from_path(path)?;
            tracing::debug!(path = %path.display(), count = defs.len(), "loaded definitions");
            let namer = SchemeNamer::from_definitions(&defs);
            Some(DefinitionsSchemaResolver::new(defs, &namer))
        }
        None => None,
    };

    let discovery = match &opts.server {
        Some(server) => Some(DiscoveryResolver::new(http_discovery(server, opts)?)),
        None => None,
    };

    match (definitions, discovery) {
        (Some(defs), Some(discovery)) => Ok(Box::new(ChainSchemaResolver::new(defs, discovery))),
        (Some(defs), None) => Ok(Box::new(defs)),
        (None, Some(discovery)) => Ok(Box::new(discovery)),
        (None, None) => Err(CliError::NoSource),
    }
}

fn http_discovery(server: &str, opts: &ResolverOptions) -> CliResult<HttpDiscovery> {
    let mut http = HttpDiscovery::new(server)
        .with_insecure_skip_tls_verify(opts.insecure_skip_tls_verify);
    if let Some(token) = &opts.token {
        http = http.with_bearer_token(token.clone());
    }
    if let Some(path) = &opts.certificate_authority {
        let pem = std::fs::read(path).map_err(|source| CliError::ReadCaCert {
            path: path.clone(),
            source,
        })?;
        http = http.with_ca_cert(pem);
    }
    Ok(http)
}
