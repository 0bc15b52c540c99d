//! S3 object store remote provider
//!
//! `s3://bucket[/path]` with optional `accessKey`, `secretKey`, and `region`
//! properties. The secret key never appears in the URI.

use crate::error::{Result, TitanError};
use crate::models::{ProviderKind, Remote, RemoteParameters, S3Parameters, S3Remote};
use crate::services::remote::uri::encode_path;
use crate::services::remote::{check_properties, wrong_provider, Properties, RemoteProvider, RemoteUri};

const ACCESS_KEY: &str = "accessKey";
const SECRET_KEY: &str = "secretKey";
const REGION: &str = "region";

/// Provider for S3-style object stores
pub struct S3RemoteProvider;

impl RemoteProvider for S3RemoteProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::S3
    }

    fn parse_uri(&self, uri: &RemoteUri, name: &str, properties: &Properties) -> Result<Remote> {
        if uri.scheme.is_none()
            || uri.username.is_some()
            || uri.password.is_some()
            || uri.port.is_some()
        {
            return Err(TitanError::config("Malformed remote identifier"));
        }
        check_properties(properties, &[ACCESS_KEY, SECRET_KEY, REGION])?;

        let bucket = uri
            .host
            .clone()
            .ok_or_else(|| TitanError::config("Missing bucket in remote identifier"))?;

        let path = uri.path.strip_prefix('/').unwrap_or(&uri.path);
        let path = if path.is_empty() {
            None
        } else {
            Some(path.to_string())
        };

        let access_key = properties.get(ACCESS_KEY).cloned();
        let secret_key = properties.get(SECRET_KEY).cloned();
        if access_key.is_some() != secret_key.is_some() {
            return Err(TitanError::config(
                "accessKey and secretKey must be specified together",
            ));
        }

        Ok(Remote::S3(S3Remote {
            name: name.to_string(),
            bucket,
            path,
            access_key,
            secret_key,
            region: properties.get(REGION).cloned(),
        }))
    }

    fn to_uri(&self, remote: &Remote) -> Result<(String, Properties)> {
        let remote = match remote {
            Remote::S3(r) => r,
            other => return Err(wrong_provider(ProviderKind::S3, other)),
        };

        let uri = match &remote.path {
            Some(path) => format!("s3://{}/{}", remote.bucket, encode_path(path)),
            None => format!("s3://{}", remote.bucket),
        };

        let mut properties = Properties::new();
        let fields = [
            (ACCESS_KEY, &remote.access_key),
            (SECRET_KEY, &remote.secret_key),
            (REGION, &remote.region),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                properties.insert(key.to_string(), value.clone());
            }
        }

        Ok((uri, properties))
    }

    fn get_parameters(&self, remote: &Remote) -> Result<RemoteParameters> {
        match remote {
            Remote::S3(r) => Ok(RemoteParameters::S3(S3Parameters {
                access_key: r.access_key.clone(),
                secret_key: r.secret_key.clone(),
                region: r.region.clone(),
                session_token: None,
            })),
            other => Err(wrong_provider(ProviderKind::S3, other)),
        }
    }
}
