#![allow(dead_code)]

use std::cell::Cell;
use std::collections::HashMap;

use kube_schema_resolver::{Error, GroupVersionDocument, OpenApiV3Discovery, Result};
use serde_json::Value;

/// In-memory OpenAPI v3 discovery serving group-version documents from bytes.
#[derive(Debug, Default)]
pub struct FakeDiscovery {
    documents: HashMap<String, Vec<u8>>,
    fail_paths: bool,
    pub paths_calls: Cell<usize>,
}

impl FakeDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, path: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.documents.insert(path.to_string(), bytes.into());
        self
    }

    pub fn with_json(self, path: &str, doc: &Value) -> Self {
        let bytes = serde_json::to_vec(doc).expect("serialize document");
        self.with_document(path, bytes)
    }

    pub fn with_testdata(self, path: &str, relative: &str) -> Self {
        self.with_document(path, test_util::read_testdata(relative))
    }

    pub fn failing() -> Self {
        Self {
            fail_paths: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct FakeDocument {
    bytes: Vec<u8>,
}

impl GroupVersionDocument for FakeDocument {
    fn schema(&self, content_type: &str) -> Result<Vec<u8>> {
        assert_eq!(content_type, "application/json");
        Ok(self.bytes.clone())
    }
}

impl OpenApiV3Discovery for FakeDiscovery {
    type Document = FakeDocument;

    fn paths(&self) -> Result<HashMap<String, FakeDocument>> {
        self.paths_calls.set(self.paths_calls.get() + 1);
        if self.fail_paths {
            return Err(Error::transport(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )));
        }
        Ok(self
            .documents
            .iter()
            .map(|(path, bytes)| {
                (
                    path.clone(),
                    FakeDocument {
                        bytes: bytes.clone(),
                    },
                )
            })
            .collect())
    }
}

pub fn cluster() -> FakeDiscovery {
    FakeDiscovery::new()
        .with_testdata("api/v1", "openapi/v3/api__v1.json")
        .with_testdata("apis/apps/v1", "openapi/v3/apis__apps__v1.json")
}
