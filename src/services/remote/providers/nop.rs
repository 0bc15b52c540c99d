//! No-op remote provider
//!
//! The identifier is always `nop` (or `nop://`) with no authority, no path,
//! and no properties.

use crate::error::{Result, TitanError};
use crate::models::{NopParameters, NopRemote, ProviderKind, Remote, RemoteParameters};
use crate::services::remote::{check_properties, wrong_provider, Properties, RemoteProvider, RemoteUri};

/// Provider for remotes that discard everything
pub struct NopRemoteProvider;

impl RemoteProvider for NopRemoteProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Nop
    }

    fn parse_uri(&self, uri: &RemoteUri, name: &str, properties: &Properties) -> Result<Remote> {
        let malformed = match uri.scheme {
            Some(_) => uri.has_authority() || !uri.path.is_empty(),
            None => uri.raw != "nop",
        };
        if malformed {
            return Err(TitanError::config("Malformed remote identifier"));
        }
        check_properties(properties, &[])?;

        Ok(Remote::Nop(NopRemote {
            name: name.to_string(),
        }))
    }

    fn to_uri(&self, remote: &Remote) -> Result<(String, Properties)> {
        match remote {
            Remote::Nop(_) => Ok(("nop".to_string(), Properties::new())),
            other => Err(wrong_provider(ProviderKind::Nop, other)),
        }
    }

    fn get_parameters(&self, remote: &Remote) -> Result<RemoteParameters> {
        match remote {
            Remote::Nop(_) => Ok(RemoteParameters::Nop(NopParameters::default())),
            other => Err(wrong_provider(ProviderKind::Nop, other)),
        }
    }
}
