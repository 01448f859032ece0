use std::collections::BTreeMap;
use std::fmt;

/// A redirect target: where a matched client should be sent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Server {
    pub name: String,
    /// URL template for plain connections.
    pub url: String,
    /// URL template for secure connections, when the deployment has one.
    pub secure_url: Option<String>,
    /// Opaque routing tag identifying the deployable variant ("flavor").
    pub path: Option<String>,
    /// Extra query parameters appended to the redirect URL.
    pub query: BTreeMap<String, String>,
    pub description: Option<String>,
    /// Only hand this server to clients that are not on the whitelist.
    pub non_whitelisted_only: bool,
}

impl Server {
    #[must_use]
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_owned(),
            url: url.to_owned(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: &str) -> Self {
        self.path = Some(path.to_owned());
        self
    }

    #[must_use]
    pub fn with_secure_url(mut self, url: &str) -> Self {
        self.secure_url = Some(url.to_owned());
        self
    }

    #[must_use]
    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.query.insert(name.to_owned(), value.to_owned());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_owned());
        self
    }
}

/// An ordered set of servers handed out together.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerGroup {
    pub servers: Vec<Server>,
    pub enable_private_servers: bool,
    /// Seconds before the client retries the group; -1 means unset.
    pub count_down_time: i64,
}

impl Default for ServerGroup {
    fn default() -> Self {
        Self {
            servers: Vec::new(),
            enable_private_servers: false,
            count_down_time: -1,
        }
    }
}

/// Partial URL-parameter result for the URL-rules document family. Each
/// field is independently present or absent; absent fields are filled by
/// lower-priority rules and finally the document's default section.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UrlParams {
    pub protocol: Option<String>,
    pub urn: Option<String>,
    pub port: Option<u16>,
    pub ip_protocol_version: Option<String>,
}

impl UrlParams {
    /// True once every field carries a value.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.protocol.is_some()
            && self.urn.is_some()
            && self.port.is_some()
            && self.ip_protocol_version.is_some()
    }

    /// Copy fields from `other` into any still-empty slot of `self`.
    /// Fields already written by an earlier merge are never overwritten.
    /// Returns whether anything was copied.
    pub fn merge_missing_from(&mut self, other: &UrlParams) -> bool {
        let mut contributed = false;
        if self.protocol.is_none() && other.protocol.is_some() {
            self.protocol.clone_from(&other.protocol);
            contributed = true;
        }
        if self.urn.is_none() && other.urn.is_some() {
            self.urn.clone_from(&other.urn);
            contributed = true;
        }
        if self.port.is_none() && other.port.is_some() {
            self.port = other.port;
            contributed = true;
        }
        if self.ip_protocol_version.is_none() && other.ip_protocol_version.is_some() {
            self.ip_protocol_version.clone_from(&other.ip_protocol_version);
            contributed = true;
        }
        contributed
    }
}

/// Terminal outcome of a matched rule or distribution group.
#[derive(Debug, Clone, PartialEq)]
pub enum Consequence {
    Server(Server),
    ServerGroup(ServerGroup),
    UrlParams(UrlParams),
}

impl Consequence {
    #[must_use]
    pub fn as_server(&self) -> Option<&Server> {
        match self {
            Consequence::Server(server) => Some(server),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_server_group(&self) -> Option<&ServerGroup> {
        match self {
            Consequence::ServerGroup(group) => Some(group),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_url_params(&self) -> Option<&UrlParams> {
        match self {
            Consequence::UrlParams(params) => Some(params),
            _ => None,
        }
    }
}

impl fmt::Display for Consequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Consequence::Server(server) => write!(f, "server {}", server.name),
            Consequence::ServerGroup(group) => {
                write!(f, "server group ({} servers)", group.servers.len())
            }
            Consequence::UrlParams(_) => write!(f, "url params"),
        }
    }
}
