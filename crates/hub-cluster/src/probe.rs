use async_trait::async_trait;
use k8s_openapi::api::core::v1::Namespace;
use kube::{Api, Client, Error as KubeError};
use tracing::{debug, instrument};

/// API group suffix only served by OpenShift clusters
const OPENSHIFT_GROUP_SUFFIX: &str = ".openshift.io";

/// Read-only questions the composer and the detector ask the live cluster
#[async_trait]
pub trait ClusterProbe: Send + Sync {
    /// `Ok(false)` when the namespace does not exist
    async fn namespace_exists(&self, namespace: &str) -> Result<bool, KubeError>;

    /// Whether the API server serves OpenShift API groups
    async fn is_openshift(&self) -> Result<bool, KubeError>;
}

/// Probe backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeProbe {
    client: Client,
}

impl KubeProbe {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClusterProbe for KubeProbe {
    #[instrument(skip(self))]
    async fn namespace_exists(&self, namespace: &str) -> Result<bool, KubeError> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        Ok(namespaces.get_opt(namespace).await?.is_some())
    }

    #[instrument(skip(self))]
    async fn is_openshift(&self) -> Result<bool, KubeError> {
        let groups = self.client.list_api_groups().await?;
        let openshift = groups
            .groups
            .iter()
            .any(|group| group.name.ends_with(OPENSHIFT_GROUP_SUFFIX));
        debug!(openshift, "checked api groups");
        Ok(openshift)
    }
}
