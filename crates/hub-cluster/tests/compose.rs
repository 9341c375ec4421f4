use async_trait::async_trait;
use k8s_openapi::api::core::v1::{EnvVar, PersistentVolumeClaim, ReplicationController};
use kube::error::ErrorResponse;

use hub_cluster::{
    ClusterProbe, ComposeError, Composer, ContainerFlavor, ExternalDatabase, InstanceSpec,
    ResourceObject, ResourceSet, StorageClaim, ValidationError, serialize,
};

/// Probe answering from fixed values
#[derive(Default)]
struct FakeProbe {
    namespace_exists: bool,
    fail: bool,
}

fn api_error() -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".to_owned(),
        message: "connection refused".to_owned(),
        reason: "ServiceUnavailable".to_owned(),
        code: 503,
    })
}

#[async_trait]
impl ClusterProbe for FakeProbe {
    async fn namespace_exists(&self, _namespace: &str) -> Result<bool, kube::Error> {
        if self.fail {
            Err(api_error())
        } else {
            Ok(self.namespace_exists)
        }
    }

    async fn is_openshift(&self) -> Result<bool, kube::Error> {
        Ok(false)
    }
}

fn small() -> ContainerFlavor {
    ContainerFlavor::for_size("small").expect("small flavor")
}

fn persistent_spec() -> InstanceSpec {
    let mut spec = InstanceSpec::new("bd");
    spec.version = "2019.4.0".to_owned();
    spec.persistent_storage = true;
    spec.pvc_storage_class = "standard".to_owned();
    spec.claims = vec![
        StorageClaim::new("blackduck-postgres"),
        StorageClaim::new("blackduck-solr").with_size("5Gi"),
        StorageClaim::new("blackduck-scratch"),
    ];
    spec
}

async fn compose_with(probe: &FakeProbe, spec: &InstanceSpec) -> Result<ResourceSet, ComposeError> {
    Composer::new(probe)
        .compose(spec, &small(), &[], "admin-pw", "user-pw", false)
        .await
}

fn claim<'a>(set: &'a ResourceSet, name: &str) -> &'a PersistentVolumeClaim {
    match set.get("PersistentVolumeClaim", name) {
        Some(ResourceObject::PersistentVolumeClaim(pvc)) => pvc,
        other => panic!("expected claim {name}, got {other:?}"),
    }
}

fn requested_storage(pvc: &PersistentVolumeClaim) -> Option<String> {
    pvc.spec
        .as_ref()
        .and_then(|spec| spec.resources.as_ref())
        .and_then(|resources| resources.requests.as_ref())
        .and_then(|requests| requests.get("storage"))
        .map(|quantity| quantity.0.clone())
}

#[tokio::test]
async fn test_embedded_database() {
    let set = compose_with(&FakeProbe::default(), &persistent_spec())
        .await
        .expect("compose");

    assert!(set.get("ReplicationController", "postgres").is_some());
    assert!(set.get("Service", "postgres").is_some());
    assert!(set.get("ConfigMap", "blackduck-postgres-init-config").is_some());
}

#[tokio::test]
async fn test_external_database() {
    let mut spec = persistent_spec();
    spec.external_database = Some(ExternalDatabase {
        postgres_host: "db.example.com".to_owned(),
        postgres_port: 5432,
        postgres_admin: "admin".to_owned(),
        postgres_user: "user".to_owned(),
        postgres_ssl: true,
    });

    let set = compose_with(&FakeProbe::default(), &spec)
        .await
        .expect("compose");
    assert_eq!(set.count("ReplicationController"), 0);
    assert!(set.get("Service", "postgres").is_none());
    assert!(set.get("ConfigMap", "blackduck-postgres-init-config").is_none());
    assert!(set.get("Secret", "db-creds").is_some());
}

#[tokio::test]
async fn test_no_claims_without_persistence() {
    let mut spec = persistent_spec();
    spec.persistent_storage = false;

    let set = compose_with(&FakeProbe::default(), &spec)
        .await
        .expect("compose");
    assert_eq!(set.count("PersistentVolumeClaim"), 0);

    // the embedded database falls back to ephemeral storage
    let Some(ResourceObject::ReplicationController(rc)) = set.get("ReplicationController", "postgres")
    else {
        panic!("expected postgres controller");
    };
    let volumes = rc_volumes(rc);
    assert!(volumes.iter().any(|volume| volume.empty_dir.is_some()));
    assert!(volumes.iter().all(|volume| volume.persistent_volume_claim.is_none()));
}

fn rc_volumes(rc: &ReplicationController) -> Vec<k8s_openapi::api::core::v1::Volume> {
    rc.spec
        .as_ref()
        .and_then(|spec| spec.template.as_ref())
        .and_then(|template| template.spec.as_ref())
        .and_then(|pod| pod.volumes.clone())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_claim_sizes() {
    let set = compose_with(&FakeProbe::default(), &persistent_spec())
        .await
        .expect("compose");
    assert_eq!(set.count("PersistentVolumeClaim"), 3);

    let postgres = claim(&set, "blackduck-postgres");
    assert_eq!(requested_storage(postgres).as_deref(), Some("150Gi"));
    let spec = postgres.spec.as_ref().expect("claim spec");
    assert_eq!(spec.access_modes, Some(vec!["ReadWriteOnce".to_owned()]));
    assert_eq!(spec.storage_class_name.as_deref(), Some("standard"));
    assert_eq!(postgres.metadata.namespace.as_deref(), Some("bd"));

    assert_eq!(
        requested_storage(claim(&set, "blackduck-solr")).as_deref(),
        Some("5Gi")
    );
    // unknown claim without a size carries no storage request
    assert_eq!(requested_storage(claim(&set, "blackduck-scratch")), None);
}

#[tokio::test]
async fn test_existing_namespace_is_not_queued() {
    let probe = FakeProbe {
        namespace_exists: true,
        ..Default::default()
    };
    let set = compose_with(&probe, &persistent_spec())
        .await
        .expect("compose");
    assert_eq!(set.count("Namespace"), 0);
    assert_eq!(set.iter().next().map(ResourceObject::kind), Some("Secret"));
}

#[tokio::test]
async fn test_probe_failure_queues_namespace() {
    let probe = FakeProbe {
        fail: true,
        ..Default::default()
    };
    let set = compose_with(&probe, &persistent_spec())
        .await
        .expect("compose");
    let first = set.iter().next().expect("objects");
    assert_eq!(first.kind(), "Namespace");
    assert_eq!(first.name(), "bd");
}

#[tokio::test]
async fn test_composition_order() {
    let set = compose_with(&FakeProbe::default(), &persistent_spec())
        .await
        .expect("compose");
    let kinds: Vec<&str> = set.iter().map(ResourceObject::kind).collect();

    let position = |kind: &str| {
        kinds
            .iter()
            .position(|candidate| *candidate == kind)
            .unwrap_or_else(|| panic!("missing {kind}"))
    };
    assert_eq!(position("Namespace"), 0);
    assert!(position("Secret") < position("ServiceAccount"));
    assert!(position("ServiceAccount") < position("ClusterRoleBinding"));
    assert!(position("ClusterRoleBinding") < position("ConfigMap"));
    assert!(position("ConfigMap") < position("PersistentVolumeClaim"));
    assert!(position("PersistentVolumeClaim") < position("ReplicationController"));
    assert!(position("ReplicationController") < position("Service"));
}

#[tokio::test]
async fn test_compose_is_idempotent() {
    let spec = persistent_spec();
    let first = compose_with(&FakeProbe::default(), &spec)
        .await
        .expect("compose");
    let second = compose_with(&FakeProbe::default(), &spec)
        .await
        .expect("compose");
    assert_eq!(first, second);
    assert_eq!(
        serialize(&first).expect("serialize"),
        serialize(&second).expect("serialize")
    );
}

#[tokio::test]
async fn test_duplicate_claims_are_collapsed() {
    let mut spec = persistent_spec();
    spec.claims.push(StorageClaim::new("blackduck-solr").with_size("8Gi"));

    let set = compose_with(&FakeProbe::default(), &spec)
        .await
        .expect("compose");
    assert_eq!(set.count("PersistentVolumeClaim"), 3);
    assert_eq!(
        requested_storage(claim(&set, "blackduck-solr")).as_deref(),
        Some("8Gi")
    );
}

#[tokio::test]
async fn test_invalid_size_aborts() {
    let mut spec = persistent_spec();
    spec.claims.push(StorageClaim::new("blackduck-logstash").with_size("lots"));

    let err = compose_with(&FakeProbe::default(), &spec)
        .await
        .expect_err("should fail");
    match err {
        ComposeError::Pvc {
            claim,
            namespace,
            source,
        } => {
            assert_eq!(claim, "blackduck-logstash");
            assert_eq!(namespace, "bd");
            assert_eq!(
                source,
                ValidationError::InvalidSize {
                    claim: "blackduck-logstash".to_owned(),
                    size: "lots".to_owned(),
                }
            );
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_namespace() {
    let spec = InstanceSpec::new("");
    assert!(matches!(
        compose_with(&FakeProbe::default(), &spec).await,
        Err(ComposeError::MissingNamespace)
    ));
}

#[tokio::test]
async fn test_extra_env_reaches_postgres() {
    let env = [EnvVar {
        name: "TZ".to_owned(),
        value: Some("UTC".to_owned()),
        ..Default::default()
    }];
    let probe = FakeProbe::default();
    let set = Composer::new(&probe)
        .compose(&persistent_spec(), &small(), &env, "a", "u", true)
        .await
        .expect("compose");

    let Some(ResourceObject::ReplicationController(rc)) = set.get("ReplicationController", "postgres")
    else {
        panic!("expected postgres controller");
    };
    let container = &rc
        .spec
        .as_ref()
        .and_then(|spec| spec.template.as_ref())
        .and_then(|template| template.spec.as_ref())
        .expect("pod spec")
        .containers[0];
    let env = container.env.as_ref().expect("env");
    assert!(env.iter().any(|var| var.name == "TZ"));
}

#[tokio::test]
async fn test_short_claim_names_get_default_sizes() {
    let mut spec = InstanceSpec::new("bd");
    spec.persistent_storage = true;
    spec.claims = vec![StorageClaim::new("postgres"), StorageClaim::new("logstash")];

    let set = compose_with(&FakeProbe::default(), &spec)
        .await
        .expect("compose");
    assert_eq!(requested_storage(claim(&set, "postgres")).as_deref(), Some("150Gi"));
    assert_eq!(requested_storage(claim(&set, "logstash")).as_deref(), Some("20Gi"));
}
