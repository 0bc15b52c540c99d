//! Remote models
//!
//! A remote describes where data goes. Each provider kind has its own
//! variant, so every consumer has to handle every provider explicitly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TitanError};

/// Backend kinds a remote can point at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Nop,
    Ssh,
    Engine,
    S3,
}

impl ProviderKind {
    /// The URI scheme / discriminant string for this provider
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Nop => "nop",
            ProviderKind::Ssh => "ssh",
            ProviderKind::Engine => "engine",
            ProviderKind::S3 => "s3",
        }
    }

    pub fn all() -> Vec<ProviderKind> {
        vec![
            ProviderKind::Nop,
            ProviderKind::Ssh,
            ProviderKind::Engine,
            ProviderKind::S3,
        ]
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = TitanError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "nop" => Ok(ProviderKind::Nop),
            "ssh" => Ok(ProviderKind::Ssh),
            "engine" => Ok(ProviderKind::Engine),
            "s3" => Ok(ProviderKind::S3),
            other => Err(TitanError::UnknownProvider(other.to_string())),
        }
    }
}

/// Remote that accepts everything and stores nothing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NopRemote {
    pub name: String,
}

/// Remote host reachable over SSH
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SshRemote {
    pub name: String,
    pub address: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Absolute path on the remote host
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_file: Option<String>,
}

/// Another Titan instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineRemote {
    pub name: String,
    /// `host` or `host:port`
    pub address: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Repository name on the peer
    pub repository: String,
}

/// Bucket (and optional key prefix) in an S3-style object store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Remote {
    pub name: String,
    pub bucket: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// A named replication endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum Remote {
    Nop(NopRemote),
    Ssh(SshRemote),
    Engine(EngineRemote),
    S3(S3Remote),
}

impl Remote {
    pub fn provider(&self) -> ProviderKind {
        match self {
            Remote::Nop(_) => ProviderKind::Nop,
            Remote::Ssh(_) => ProviderKind::Ssh,
            Remote::Engine(_) => ProviderKind::Engine,
            Remote::S3(_) => ProviderKind::S3,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Remote::Nop(r) => &r.name,
            Remote::Ssh(r) => &r.name,
            Remote::Engine(r) => &r.name,
            Remote::S3(r) => &r.name,
        }
    }
}

/// Runtime parameters for the nop provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NopParameters {
    /// Seconds the nop transfer waits before completing
    #[serde(default)]
    pub delay: u64,
}

/// Runtime parameters for SSH remotes
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SshParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Private key contents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// Runtime parameters for peer engine remotes
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Runtime parameters for S3 remotes
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Parameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
}

fn redact(value: &Option<String>) -> &'static str {
    if value.is_some() {
        "<redacted>"
    } else {
        "<none>"
    }
}

impl fmt::Debug for SshParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SshParameters")
            .field("password", &redact(&self.password))
            .field("key", &redact(&self.key))
            .finish()
    }
}

impl fmt::Debug for EngineParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineParameters")
            .field("password", &redact(&self.password))
            .finish()
    }
}

impl fmt::Debug for S3Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Parameters")
            .field("access_key", &redact(&self.access_key))
            .field("secret_key", &redact(&self.secret_key))
            .field("region", &self.region)
            .field("session_token", &redact(&self.session_token))
            .finish()
    }
}

/// Per-call credentials and knobs, one variant per provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum RemoteParameters {
    Nop(NopParameters),
    Ssh(SshParameters),
    Engine(EngineParameters),
    S3(S3Parameters),
}

impl RemoteParameters {
    pub fn provider(&self) -> ProviderKind {
        match self {
            RemoteParameters::Nop(_) => ProviderKind::Nop,
            RemoteParameters::Ssh(_) => ProviderKind::Ssh,
            RemoteParameters::Engine(_) => ProviderKind::Engine,
            RemoteParameters::S3(_) => ProviderKind::S3,
        }
    }

    /// Fill every field the caller left empty from `defaults`.
    ///
    /// Both sides must belong to the same provider.
    pub fn or_defaults(self, defaults: RemoteParameters) -> Result<RemoteParameters> {
        match (self, defaults) {
            (RemoteParameters::Nop(caller), RemoteParameters::Nop(_)) => {
                Ok(RemoteParameters::Nop(caller))
            }
            (RemoteParameters::Ssh(caller), RemoteParameters::Ssh(defaults)) => {
                Ok(RemoteParameters::Ssh(SshParameters {
                    password: caller.password.or(defaults.password),
                    key: caller.key.or(defaults.key),
                }))
            }
            (RemoteParameters::Engine(caller), RemoteParameters::Engine(defaults)) => {
                Ok(RemoteParameters::Engine(EngineParameters {
                    password: caller.password.or(defaults.password),
                }))
            }
            (RemoteParameters::S3(caller), RemoteParameters::S3(defaults)) => {
                Ok(RemoteParameters::S3(S3Parameters {
                    access_key: caller.access_key.or(defaults.access_key),
                    secret_key: caller.secret_key.or(defaults.secret_key),
                    region: caller.region.or(defaults.region),
                    session_token: caller.session_token.or(defaults.session_token),
                }))
            }
            (caller, defaults) => Err(TitanError::config(format!(
                "Parameters for provider '{}' cannot be used with a '{}' remote",
                caller.provider(),
                defaults.provider()
            ))),
        }
    }
}
