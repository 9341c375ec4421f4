use std::collections::BTreeMap;
use std::fmt;

use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PersistentVolumeClaimSpec, PersistentVolumeClaimVolumeSource, Volume,
    VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::defaults::default_size_for;
use crate::error::{PlanError, ValidationError};
use crate::spec::StorageClaim;

use super::object_meta;

/// Kubernetes quantity grammar, e.g. `150Gi`, `500M`, `1.5e3`
static QUANTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)(Ki|Mi|Gi|Ti|Pi|Ei|n|u|m|k|M|G|T|P|E|[eE][+-]?\d+)?$")
        .expect("quantity regex")
});

/// DNS-1123 subdomain, the rule for claim and storage class names
static SUBDOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("subdomain regex")
});

const MAX_SUBDOMAIN_LEN: usize = 253;

fn is_subdomain(name: &str) -> bool {
    name.len() <= MAX_SUBDOMAIN_LEN && SUBDOMAIN.is_match(name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadWriteOnce,
    ReadOnlyMany,
    ReadWriteMany,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self {
            Self::ReadWriteOnce => "ReadWriteOnce",
            Self::ReadOnlyMany => "ReadOnlyMany",
            Self::ReadWriteMany => "ReadWriteMany",
        };
        f.write_str(mode)
    }
}

/// A storage claim with every parameter settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPvc {
    pub name: String,
    pub namespace: String,
    /// Requested capacity; empty means no storage request is set
    pub size: String,
    /// Storage class; empty leaves the choice to the cluster default
    pub storage_class: String,
    pub access_mode: AccessMode,
}

impl ResolvedPvc {
    /// Validates the claim parameters
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        size: impl Into<String>,
        storage_class: impl Into<String>,
        access_mode: AccessMode,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        let size = size.into();
        let storage_class = storage_class.into();

        if !is_subdomain(&name) {
            return Err(ValidationError::InvalidName(name));
        }
        if !size.is_empty() && !QUANTITY.is_match(&size) {
            return Err(ValidationError::InvalidSize { claim: name, size });
        }
        if !storage_class.is_empty() && !is_subdomain(&storage_class) {
            return Err(ValidationError::InvalidStorageClass {
                claim: name,
                class: storage_class,
            });
        }

        Ok(Self {
            name,
            namespace: namespace.into(),
            size,
            storage_class,
            access_mode,
        })
    }

    pub fn to_claim(&self) -> PersistentVolumeClaim {
        let requests = (!self.size.is_empty()).then(|| {
            BTreeMap::from([("storage".to_owned(), Quantity(self.size.clone()))])
        });

        PersistentVolumeClaim {
            metadata: object_meta(&self.name, Some(self.namespace.as_str()), "pvc"),
            spec: Some(PersistentVolumeClaimSpec {
                access_modes: Some(vec![self.access_mode.to_string()]),
                storage_class_name: (!self.storage_class.is_empty())
                    .then(|| self.storage_class.clone()),
                resources: Some(VolumeResourceRequirements {
                    requests,
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

/// Capacity for a claim: explicit size, then the defaults table, then the raw value
fn resolve_size(claim: &StorageClaim) -> String {
    if !claim.size.is_empty() {
        return claim.size.clone();
    }
    match default_size_for(&claim.name) {
        Some(size) => size.to_owned(),
        None => claim.size.clone(),
    }
}

/// Resolve every declared claim into a persistent volume claim definition.
///
/// The first claim that fails validation aborts the pass.
pub fn plan(
    claims: &[StorageClaim],
    namespace: &str,
    global_storage_class: &str,
) -> Result<Vec<ResolvedPvc>, PlanError> {
    claims
        .iter()
        .map(|claim| {
            let storage_class = if claim.storage_class.is_empty() {
                global_storage_class
            } else {
                claim.storage_class.as_str()
            };
            let size = resolve_size(claim);
            debug!(claim = %claim.name, %size, %storage_class, "resolved claim");

            ResolvedPvc::new(
                &claim.name,
                namespace,
                size,
                storage_class,
                AccessMode::ReadWriteOnce,
            )
            .map_err(|source| PlanError {
                claim: claim.name.clone(),
                namespace: namespace.to_owned(),
                source,
            })
        })
        .collect()
}

/// Pod volume backed by an existing claim
pub fn pvc_volume(volume_name: &str, claim_name: &str, read_only: bool) -> Volume {
    Volume {
        name: volume_name.to_owned(),
        persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
            claim_name: claim_name.to_owned(),
            read_only: Some(read_only),
        }),
        ..Default::default()
    }
}
