//! Repository models

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A named, versioned data volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// Remote as exchanged with clients: URI plus provider-specific extras
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteInfo {
    pub name: String,
    pub provider: String,
    pub uri: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}
