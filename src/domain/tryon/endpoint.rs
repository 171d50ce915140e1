use serde::Serialize;
use std::fmt;

/// Spaces tried when `TRYON_SPACES` is not set, in fallback order.
pub const DEFAULT_SPACES: [&str; 3] = [
    "yisol/IDM-VTON",
    "Nymbo/Virtual-Try-On",
    "levihsu/OOTDiffusion",
];

/// Request/response dialect spoken by a remote try-on service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
    /// IDM-VTON: structured editor payload, tuple response.
    IdmVton,
    /// Nymbo Virtual-Try-On: two positional files, path response.
    Nymbo,
    /// Anything else: two positional files, tuple or path response.
    Generic,
}

impl EndpointKind {
    pub fn from_identifier(identifier: &str) -> Self {
        let normalized = identifier.to_ascii_lowercase().replace('/', "-");
        if normalized.contains("idm-vton") {
            Self::IdmVton
        } else if normalized.contains("nymbo-virtual-try-on") {
            Self::Nymbo
        } else {
            Self::Generic
        }
    }
}

/// A remote inference service, named by Space id (`owner/name`) or full URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Endpoint {
    id: String,
    kind: EndpointKind,
}

impl Endpoint {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let kind = EndpointKind::from_identifier(&id);
        Self { id, kind }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> EndpointKind {
        self.kind
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Ordered, immutable list of endpoints. Position is fallback precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRegistry {
    endpoints: Vec<Endpoint>,
}

impl ServiceRegistry {
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        Self { endpoints }
    }

    pub fn from_identifiers<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(identifiers.into_iter().map(Endpoint::new).collect())
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn position(&self, endpoint: &Endpoint) -> Option<usize> {
        self.endpoints.iter().position(|e| e == endpoint)
    }

    /// Endpoints strictly after `endpoint`. Empty when it is last or unknown.
    pub fn after(&self, endpoint: &Endpoint) -> &[Endpoint] {
        match self.position(endpoint) {
            Some(index) => &self.endpoints[index + 1..],
            None => &[],
        }
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::from_identifiers(DEFAULT_SPACES)
    }
}
