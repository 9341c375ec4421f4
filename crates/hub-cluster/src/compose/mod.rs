use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    ConfigMap, EnvVar, Namespace, PersistentVolumeClaim, ReplicationController, Secret, Service,
    ServiceAccount,
};
use k8s_openapi::api::rbac::v1::{ClusterRoleBinding, RoleRef, Subject};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::{Metadata, Resource};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::ComposeError;
use crate::flavor::ContainerFlavor;
use crate::probe::ClusterProbe;
use crate::spec::InstanceSpec;
use crate::CLUSTER_ADMIN_ROLE;

mod config;
mod postgres;
pub(crate) mod pvc;
mod secrets;

pub(crate) const APP_LABEL: &str = "blackduck";

/// Labels shared by every object of an instance
pub(crate) fn labels(component: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("app".to_owned(), APP_LABEL.to_owned()),
        ("component".to_owned(), component.to_owned()),
    ])
}

pub(crate) fn object_meta(name: &str, namespace: Option<&str>, component: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_owned()),
        namespace: namespace.map(str::to_owned),
        labels: Some(labels(component)),
        ..Default::default()
    }
}

/// A cluster object produced by the composer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResourceObject {
    Namespace(Namespace),
    Secret(Secret),
    ServiceAccount(ServiceAccount),
    ClusterRoleBinding(ClusterRoleBinding),
    ConfigMap(ConfigMap),
    PersistentVolumeClaim(PersistentVolumeClaim),
    ReplicationController(ReplicationController),
    Service(Service),
}

macro_rules! resource_object {
    ($($variant:ident),*) => {
        impl ResourceObject {
            /// Kubernetes kind, e.g. `ConfigMap`
            pub fn kind(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => <$variant as Resource>::KIND,)*
                }
            }

            pub fn metadata(&self) -> &ObjectMeta {
                match self {
                    $(Self::$variant(obj) => obj.metadata(),)*
                }
            }
        }

        $(
            impl From<$variant> for ResourceObject {
                fn from(obj: $variant) -> Self {
                    Self::$variant(obj)
                }
            }
        )*
    };
}

resource_object!(
    Namespace,
    Secret,
    ServiceAccount,
    ClusterRoleBinding,
    ConfigMap,
    PersistentVolumeClaim,
    ReplicationController,
    Service
);

impl ResourceObject {
    pub fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or_default()
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey {
            kind: self.kind(),
            namespace: self.metadata().namespace.clone(),
            name: self.name().to_owned(),
        }
    }
}

/// Identity of an object within a [`ResourceSet`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub kind: &'static str,
    pub namespace: Option<String>,
    pub name: String,
}

/// Objects of one instance, in the order they have to be applied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceSet {
    objects: Vec<ResourceObject>,
}

impl ResourceSet {
    /// Add an object; an object with the same key is replaced where it stands
    pub fn insert(&mut self, obj: impl Into<ResourceObject>) {
        let obj = obj.into();
        let key = obj.key();
        match self.objects.iter_mut().find(|existing| existing.key() == key) {
            Some(existing) => {
                debug!(kind = key.kind, name = %key.name, "replacing queued object");
                *existing = obj;
            }
            None => self.objects.push(obj),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceObject> {
        self.objects.iter()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, kind: &str, name: &str) -> Option<&ResourceObject> {
        self.objects
            .iter()
            .find(|obj| obj.kind() == kind && obj.name() == name)
    }

    /// Number of objects of a kind
    pub fn count(&self, kind: &str) -> usize {
        self.objects.iter().filter(|obj| obj.kind() == kind).count()
    }
}

impl IntoIterator for ResourceSet {
    type Item = ResourceObject;
    type IntoIter = std::vec::IntoIter<ResourceObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.objects.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResourceSet {
    type Item = &'a ResourceObject;
    type IntoIter = std::slice::Iter<'a, ResourceObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.objects.iter()
    }
}

/// Builds the cluster objects of a Black Duck instance
pub struct Composer<'a> {
    probe: &'a dyn ClusterProbe,
}

impl<'a> Composer<'a> {
    pub fn new(probe: &'a dyn ClusterProbe) -> Self {
        Self { probe }
    }

    /// Compose every object the instance needs.
    ///
    /// Nothing is written to the cluster; the only cluster access is the
    /// namespace lookup.
    #[instrument(skip_all, fields(namespace = %spec.namespace))]
    pub async fn compose(
        &self,
        spec: &InstanceSpec,
        flavor: &ContainerFlavor,
        env: &[EnvVar],
        admin_password: &str,
        user_password: &str,
        binary_analysis_enabled: bool,
    ) -> Result<ResourceSet, ComposeError> {
        let namespace = spec.namespace.as_str();
        if namespace.is_empty() {
            return Err(ComposeError::MissingNamespace);
        }

        let mut set = ResourceSet::default();

        match self.probe.namespace_exists(namespace).await {
            Ok(true) => debug!("namespace already exists"),
            Ok(false) => {
                debug!("unable to find the namespace, queueing it");
                set.insert(namespace_object(namespace));
            }
            Err(err) => {
                // may hide a connectivity problem rather than a missing namespace
                warn!(%err, "namespace lookup failed, queueing it for creation");
                set.insert(namespace_object(namespace));
            }
        }

        for secret in secrets::instance_secrets(spec, admin_password, user_password) {
            set.insert(secret);
        }

        set.insert(service_account(namespace));
        warn!(
            role = CLUSTER_ADMIN_ROLE,
            "binding instance service account to a cluster-wide role"
        );
        set.insert(cluster_role_binding(namespace));

        for config_map in config::instance_config_maps(spec, flavor, binary_analysis_enabled) {
            set.insert(config_map);
        }

        if spec.persistent_storage {
            let pvcs = pvc::plan(&spec.claims, namespace, &spec.pvc_storage_class)?;
            for pvc in &pvcs {
                set.insert(pvc.to_claim());
            }
        }

        if spec.external_database.is_none() {
            set.insert(postgres::replication_controller(spec, flavor, env));
            set.insert(postgres::service(namespace));
        } else {
            debug!("external database configured, skipping embedded postgres");
        }

        info!(objects = set.len(), "composed instance resources");
        Ok(set)
    }
}

fn namespace_object(namespace: &str) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            name: Some(namespace.to_owned()),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn service_account(namespace: &str) -> ServiceAccount {
    ServiceAccount {
        metadata: object_meta(namespace, Some(namespace), "serviceaccount"),
        ..Default::default()
    }
}

fn cluster_role_binding(namespace: &str) -> ClusterRoleBinding {
    ClusterRoleBinding {
        metadata: object_meta(namespace, None, "clusterrolebinding"),
        role_ref: RoleRef {
            api_group: "rbac.authorization.k8s.io".to_owned(),
            kind: "ClusterRole".to_owned(),
            name: CLUSTER_ADMIN_ROLE.to_owned(),
        },
        subjects: Some(vec![Subject {
            kind: "ServiceAccount".to_owned(),
            name: namespace.to_owned(),
            namespace: Some(namespace.to_owned()),
            ..Default::default()
        }]),
    }
}
