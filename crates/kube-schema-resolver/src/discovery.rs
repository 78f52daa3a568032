use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::extensions::extract_gvks;
use crate::gvk::GroupVersionKind;
use crate::inline::populate_refs;
use crate::schema::Schema;
use crate::SchemaResolver;

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Prefix of every `$ref` inside an OpenAPI v3 group-version document.
pub const REF_PREFIX: &str = "#/components/schemas/";

/// The OpenAPI v3 discovery endpoint of an API server.
pub trait OpenApiV3Discovery {
    type Document: GroupVersionDocument;

    /// Available group-version paths, e.g. `api/v1` or `apis/apps/v1`.
    fn paths(&self) -> Result<HashMap<String, Self::Document>>;
}

/// A single group-version OpenAPI v3 document.
pub trait GroupVersionDocument {
    fn schema(&self, content_type: &str) -> Result<Vec<u8>>;
}

/// Resolves schemas by fetching the group-version OpenAPI v3 document from
/// discovery on every call. Nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct DiscoveryResolver<D> {
    pub discovery: D,
}

impl<D> DiscoveryResolver<D> {
    pub fn new(discovery: D) -> Self {
        Self { discovery }
    }
}

impl<D> SchemaResolver for DiscoveryResolver<D>
where
    D: OpenApiV3Discovery,
{
    fn resolve_schema(&self, gvk: &GroupVersionKind) -> Result<Schema> {
        let paths = self.discovery.paths()?;
        let gv = gvk.group_version();
        let path = gv.discovery_path();
        let Some(document) = paths.get(&path) else {
            return Err(Error::GroupVersionNotFound(gv));
        };

        tracing::debug!(%path, %gvk, "fetching openapi v3 document");
        let bytes = document.schema(CONTENT_TYPE_JSON)?;
        let resp: SchemaResponse = serde_json::from_slice(&bytes)?;
        let schemas = &resp.components.schemas;

        let mut schema = resolve_type(schemas, gvk)?.clone();
        populate_refs(
            |r: &str| schemas.get(r.strip_prefix(REF_PREFIX).unwrap_or(r)).cloned(),
            &mut schema,
        )?;
        Ok(schema)
    }
}

fn resolve_type<'a>(
    schemas: &'a BTreeMap<String, Schema>,
    gvk: &GroupVersionKind,
) -> Result<&'a Schema> {
    schemas
        .iter()
        .find(|(_, s)| extract_gvks(&s.extensions).contains(gvk))
        .map(|(name, s)| {
            tracing::trace!(%name, %gvk, "matched component schema");
            s
        })
        .ok_or_else(|| Error::KindNotFound(gvk.clone()))
}

#[derive(Debug, Default, Deserialize)]
struct SchemaResponse {
    #[serde(default)]
    components: Components,
}

#[derive(Debug, Default, Deserialize)]
struct Components {
    #[serde(default)]
    schemas: BTreeMap<String, Schema>,
}

// ---------------------------------------------------------------------------
// HTTP transport
// ---------------------------------------------------------------------------

/// OpenAPI v3 discovery over HTTP against a Kubernetes API server.
#[derive(Debug, Clone, Default)]
pub struct HttpDiscovery {
    pub server: String,
    pub bearer_token: Option<String>,
    /// PEM bundle of the CA certificates trusted for the API server.
    pub ca_cert: Option<Vec<u8>>,
    pub insecure_skip_tls_verify: bool,
}

impl HttpDiscovery {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Trust only the CA certificates in `pem` instead of the default roots.
    #[must_use]
    pub fn with_ca_cert(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.ca_cert = Some(pem.into());
        self
    }

    #[must_use]
    pub fn with_insecure_skip_tls_verify(mut self, insecure: bool) -> Self {
        self.insecure_skip_tls_verify = insecure;
        self
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.server, path)
    }

    fn agent(&self) -> Result<ureq::Agent> {
        let mut tls = ureq::tls::TlsConfig::builder();
        if let Some(pem) = &self.ca_cert {
            let certs = parse_ca_bundle(pem)?;
            tls = tls.root_certs(ureq::tls::RootCerts::Specific(Arc::new(certs)));
        }
        if self.insecure_skip_tls_verify {
            tracing::warn!(server = %self.server, "tls verification disabled");
            tls = tls.disable_verification(true);
        }
        let config = ureq::Agent::config_builder()
            .tls_config(tls.build())
            .build();
        Ok(ureq::Agent::new_with_config(config))
    }
}

fn parse_ca_bundle(pem: &[u8]) -> Result<Vec<ureq::tls::Certificate<'static>>> {
    let mut certs = Vec::new();
    for item in ureq::tls::parse_pem(pem) {
        if let ureq::tls::PemItem::Certificate(cert) = item.map_err(Error::transport)? {
            certs.push(cert);
        }
    }
    if certs.is_empty() {
        return Err(Error::transport("no certificates found in CA bundle"));
    }
    Ok(certs)
}

impl OpenApiV3Discovery for HttpDiscovery {
    type Document = HttpGroupVersion;

    fn paths(&self) -> Result<HashMap<String, HttpGroupVersion>> {
        let agent = self.agent()?;
        let url = self.url("/openapi/v3");
        tracing::debug!(%url, "fetching openapi v3 paths");
        let bytes = fetch(&agent, &url, CONTENT_TYPE_JSON, self.bearer_token.as_deref())?;
        self.parse_paths(&agent, &bytes)
    }
}

impl HttpDiscovery {
    fn parse_paths(
        &self,
        agent: &ureq::Agent,
        bytes: &[u8],
    ) -> Result<HashMap<String, HttpGroupVersion>> {
        let index: PathsIndex = serde_json::from_slice(bytes)?;
        Ok(index
            .paths
            .into_iter()
            .map(|(path, entry)| {
                let gv = HttpGroupVersion {
                    url: self.url(&entry.server_relative_url),
                    bearer_token: self.bearer_token.clone(),
                    agent: agent.clone(),
                };
                (path, gv)
            })
            .collect())
    }
}

/// A group-version document served at a server-relative URL.
#[derive(Clone)]
pub struct HttpGroupVersion {
    pub url: String,
    bearer_token: Option<String>,
    agent: ureq::Agent,
}

impl std::fmt::Debug for HttpGroupVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGroupVersion")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl GroupVersionDocument for HttpGroupVersion {
    fn schema(&self, content_type: &str) -> Result<Vec<u8>> {
        fetch(&self.agent, &self.url, content_type, self.bearer_token.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct PathsIndex {
    #[serde(default)]
    paths: BTreeMap<String, PathEntry>,
}

#[derive(Debug, Deserialize)]
struct PathEntry {
    #[serde(rename = "serverRelativeURL")]
    server_relative_url: String,
}

fn join_url(base: &str, rel: &str) -> String {
    if rel.starts_with("http://") || rel.starts_with("https://") {
        return rel.to_string();
    }
    let b = base.trim_end_matches('/');
    let r = rel.trim_start_matches('/');
    format!("{b}/{r}")
}

fn fetch(
    agent: &ureq::Agent,
    url: &str,
    accept: &str,
    bearer_token: Option<&str>,
) -> Result<Vec<u8>> {
    let mut req = agent.get(url).header("Accept", accept);
    if let Some(token) = bearer_token {
        req = req.header("Authorization", format!("Bearer {token}"));
    }
    let resp = req.call().map_err(Error::transport)?;
    let mut reader = resp.into_body().into_reader();
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).map_err(Error::transport)?;
    Ok(buf)
}
