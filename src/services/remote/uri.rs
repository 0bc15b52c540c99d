//! Remote identifier parsing
//!
//! Remote identifiers are `scheme://[user[:password]@]host[:port][/path]`, or a
//! bare provider token such as `nop`. Query strings and fragments are rejected
//! everywhere.

use url::{ParseError, Url};

use crate::error::{Result, TitanError};

/// A remote identifier broken into its components, percent-decoded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteUri {
    /// The original input string
    pub raw: String,
    pub scheme: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub path: String,
}

impl RemoteUri {
    pub fn parse(input: &str) -> Result<Self> {
        if input.is_empty() {
            return Err(TitanError::config("Remote identifier cannot be empty"));
        }
        // `url` silently drops tabs and newlines
        if input.chars().any(|c| c.is_control()) {
            return Err(TitanError::config(
                "Malformed remote identifier, control characters are not allowed",
            ));
        }

        match Url::parse(input) {
            Ok(url) => {
                if url.query().is_some() || url.fragment().is_some() {
                    return Err(malformed_query());
                }

                let username = match url.username() {
                    "" => None,
                    user => Some(decode(user)?),
                };
                let password = url.password().map(decode).transpose()?;
                let host = url
                    .host_str()
                    .filter(|h| !h.is_empty())
                    .map(|h| h.to_string());

                // `url` lowercases the scheme; providers match it as written
                let scheme = input.split(':').next().unwrap_or_default();

                Ok(RemoteUri {
                    raw: input.to_string(),
                    scheme: Some(scheme.to_string()),
                    username,
                    password,
                    host,
                    port: url.port(),
                    path: decode(url.path())?,
                })
            }
            // No scheme: the whole string names the provider
            Err(ParseError::RelativeUrlWithoutBase) => {
                if input.contains('?') || input.contains('#') {
                    return Err(malformed_query());
                }
                Ok(RemoteUri {
                    raw: input.to_string(),
                    path: input.to_string(),
                    ..Default::default()
                })
            }
            Err(e) => Err(TitanError::config(format!("Invalid URI syntax: {}", e))),
        }
    }

    /// Provider discriminant: the scheme, or the raw string when there is none
    pub fn provider(&self) -> &str {
        self.scheme.as_deref().unwrap_or(&self.raw)
    }

    /// True when the URI carries user info, a host, or a port
    pub fn has_authority(&self) -> bool {
        self.username.is_some() || self.password.is_some() || self.host.is_some() || self.port.is_some()
    }

    /// Host with the port appended when one was given
    pub fn address(&self) -> Option<String> {
        self.host.as_ref().map(|host| match self.port {
            Some(port) => format!("{}:{}", host, port),
            None => host.clone(),
        })
    }
}

fn malformed_query() -> TitanError {
    TitanError::config("Malformed remote identifier, query and fragments are not allowed")
}

fn decode(component: &str) -> Result<String> {
    urlencoding::decode(component)
        .map(|s| s.into_owned())
        .map_err(|_| TitanError::config(format!("Invalid encoding in remote identifier '{}'", component)))
}

/// Percent-encode a user-info component
pub fn encode_userinfo(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Percent-encode each segment of a path, keeping the separators
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
