//! Desired state of a Black Duck instance.

use serde::{Deserialize, Serialize};

const DEFAULT_SIZE: &str = "small";
const DEFAULT_POSTGRES_IMAGE: &str = "registry.access.redhat.com/rhscl/postgresql-96-rhel7:1";

/// Desired state of one deployed Black Duck instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstanceSpec {
    /// Namespace the instance lives in, unique per instance
    pub namespace: String,
    /// Black Duck version, exported to the containers as `HUB_VERSION`
    pub version: String,
    /// Name of the container flavor
    #[serde(default = "default_size")]
    pub size: String,
    pub persistent_storage: bool,
    #[serde(rename = "pvc")]
    pub claims: Vec<StorageClaim>,
    /// Storage class used by claims which do not name one
    pub pvc_storage_class: String,
    /// When set, no embedded database is deployed
    pub external_database: Option<ExternalDatabase>,
    /// Free-form `KEY:VALUE` entries merged into the instance config map
    pub environs: Vec<String>,
    pub liveness_probes: bool,
    /// Image of the embedded database
    #[serde(default = "default_postgres_image")]
    pub postgres_image: String,
    pub certificate: Option<String>,
    pub certificate_key: Option<String>,
    pub auth_custom_ca: Option<String>,
    pub proxy_certificate: Option<String>,
}

fn default_size() -> String {
    DEFAULT_SIZE.to_owned()
}

fn default_postgres_image() -> String {
    DEFAULT_POSTGRES_IMAGE.to_owned()
}

impl InstanceSpec {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            size: default_size(),
            postgres_image: default_postgres_image(),
            ..Default::default()
        }
    }

    /// `environs` split into key/value pairs.
    ///
    /// Entries without a `:` separator are skipped, keys and values are trimmed.
    pub fn environ_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.environs.iter().filter_map(|entry| {
            entry
                .split_once(':')
                .map(|(key, value)| (key.trim(), value.trim()))
        })
    }
}

/// A named request for persistent storage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageClaim {
    pub name: String,
    pub size: String,
    pub storage_class: String,
}

impl StorageClaim {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = size.into();
        self
    }

    pub fn with_storage_class(mut self, class: impl Into<String>) -> Self {
        self.storage_class = class.into();
        self
    }
}

/// Connection settings of an externally managed postgres
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalDatabase {
    pub postgres_host: String,
    #[serde(default = "default_postgres_port")]
    pub postgres_port: u16,
    pub postgres_admin: String,
    pub postgres_user: String,
    #[serde(default)]
    pub postgres_ssl: bool,
}

fn default_postgres_port() -> u16 {
    5432
}
