//! Remote provider system
//!
//! Each provider kind knows how to turn a URI plus a property map into a typed
//! [`Remote`], how to turn it back, and which runtime parameters it needs. The
//! [`RemoteRegistry`] dispatches to the right provider by its tag and is the
//! only entry point the rest of the crate uses.

pub mod providers;
pub mod uri;

use std::collections::{BTreeMap, HashMap};

use crate::error::{Result, TitanError};
use crate::models::{ProviderKind, Remote, RemoteInfo, RemoteParameters};

pub use providers::{EngineRemoteProvider, NopRemoteProvider, S3RemoteProvider, SshRemoteProvider};
pub use uri::RemoteUri;

/// Property map carried alongside a remote URI
pub type Properties = BTreeMap<String, String>;

/// Property keys whose values are secrets
pub const SECRET_PROPERTIES: &[&str] = &["password", "secretKey"];

const MASKED_VALUE: &str = "*****";

/// Trait for remote providers
pub trait RemoteProvider: Send + Sync {
    /// The provider this implementation handles
    fn kind(&self) -> ProviderKind;

    /// Build a remote from its exchange form
    fn parse_uri(&self, uri: &RemoteUri, name: &str, properties: &Properties) -> Result<Remote>;

    /// Inverse of [`RemoteProvider::parse_uri`]; secrets only travel in the properties
    fn to_uri(&self, remote: &Remote) -> Result<(String, Properties)>;

    /// Default runtime parameters, seeded from any persisted secret
    fn get_parameters(&self, remote: &Remote) -> Result<RemoteParameters>;
}

/// Reject the first property key not in `allowed`
pub(crate) fn check_properties(properties: &Properties, allowed: &[&str]) -> Result<()> {
    match properties.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(TitanError::config(format!("Invalid property '{}'", key))),
        None => Ok(()),
    }
}

/// Error for a remote handed to the wrong provider
pub(crate) fn wrong_provider(expected: ProviderKind, remote: &Remote) -> TitanError {
    TitanError::config(format!(
        "Remote '{}' is a {} remote, not {}",
        remote.name(),
        remote.provider(),
        expected
    ))
}

/// Dispatch table from provider tag to provider, built once
pub struct RemoteRegistry {
    providers: HashMap<ProviderKind, Box<dyn RemoteProvider>>,
}

impl Default for RemoteRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteRegistry {
    /// Create a registry with every built-in provider
    pub fn new() -> Self {
        let mut registry = Self {
            providers: HashMap::new(),
        };

        registry.register(Box::new(NopRemoteProvider));
        registry.register(Box::new(SshRemoteProvider));
        registry.register(Box::new(EngineRemoteProvider));
        registry.register(Box::new(S3RemoteProvider));

        registry
    }

    fn register(&mut self, provider: Box<dyn RemoteProvider>) {
        self.providers.insert(provider.kind(), provider);
    }

    fn provider(&self, kind: ProviderKind) -> Result<&dyn RemoteProvider> {
        self.providers
            .get(&kind)
            .map(|p| p.as_ref())
            .ok_or_else(|| TitanError::UnknownProvider(kind.to_string()))
    }

    /// Parse a remote identifier into a typed remote named `name`
    pub fn parse_uri(&self, uri: &str, name: &str, properties: &Properties) -> Result<Remote> {
        let parsed = RemoteUri::parse(uri)?;
        let kind: ProviderKind = parsed.provider().parse()?;
        self.provider(kind)?.parse_uri(&parsed, name, properties)
    }

    pub fn to_uri(&self, remote: &Remote) -> Result<(String, Properties)> {
        self.provider(remote.provider())?.to_uri(remote)
    }

    pub fn get_parameters(&self, remote: &Remote) -> Result<RemoteParameters> {
        self.provider(remote.provider())?.get_parameters(remote)
    }

    /// Exchange form of a remote with secret property values masked
    pub fn describe(&self, remote: &Remote) -> Result<RemoteInfo> {
        let (uri, mut properties) = self.to_uri(remote)?;
        for key in SECRET_PROPERTIES {
            if let Some(value) = properties.get_mut(*key) {
                *value = MASKED_VALUE.to_string();
            }
        }

        Ok(RemoteInfo {
            name: remote.name().to_string(),
            provider: remote.provider().to_string(),
            uri,
            properties,
        })
    }
}
