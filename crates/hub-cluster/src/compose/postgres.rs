//! Embedded postgres workload, only deployed without an external database.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    ConfigMapVolumeSource, Container, ContainerPort, EmptyDirVolumeSource, EnvVar, EnvVarSource,
    ExecAction, PodSpec, PodTemplateSpec, Probe, ReplicationController, ReplicationControllerSpec,
    ResourceRequirements, SecretKeySelector, Service, ServicePort, ServiceSpec, Volume,
    VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use crate::flavor::ContainerFlavor;
use crate::spec::InstanceSpec;

use super::config::POSTGRES_INIT_CONFIG;
use super::pvc::pvc_volume;
use super::secrets::{ADMIN_PASSWORD_KEY, DB_CREDS_SECRET, USER_PASSWORD_KEY};
use super::{labels, object_meta};

pub(crate) const POSTGRES_SERVICE: &str = "postgres";
pub(crate) const POSTGRES_PORT: i32 = 5432;
pub(crate) const POSTGRES_CLAIM: &str = "blackduck-postgres";
const POSTGRES_SHORT_CLAIM: &str = "postgres";

const COMPONENT: &str = "postgres";
const DATA_VOLUME: &str = "postgres-persistent-vol";
const DATA_PATH: &str = "/var/lib/pgsql/data";
const INIT_VOLUME: &str = "postgres-init";
const INIT_PATH: &str = "/docker-entrypoint-initdb.d";

fn plain_env(name: &str, value: &str) -> EnvVar {
    EnvVar {
        name: name.to_owned(),
        value: Some(value.to_owned()),
        ..Default::default()
    }
}

fn secret_env(name: &str, key: &str) -> EnvVar {
    EnvVar {
        name: name.to_owned(),
        value_from: Some(EnvVarSource {
            secret_key_ref: Some(SecretKeySelector {
                name: DB_CREDS_SECRET.to_owned(),
                key: key.to_owned(),
                optional: Some(false),
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn data_volume(spec: &InstanceSpec) -> Volume {
    let claim = if spec.persistent_storage {
        spec.claims
            .iter()
            .find(|claim| claim.name == POSTGRES_CLAIM || claim.name == POSTGRES_SHORT_CLAIM)
    } else {
        None
    };

    if let Some(claim) = claim {
        pvc_volume(DATA_VOLUME, &claim.name, false)
    } else {
        Volume {
            name: DATA_VOLUME.to_owned(),
            empty_dir: Some(EmptyDirVolumeSource::default()),
            ..Default::default()
        }
    }
}

fn init_volume() -> Volume {
    Volume {
        name: INIT_VOLUME.to_owned(),
        config_map: Some(ConfigMapVolumeSource {
            name: POSTGRES_INIT_CONFIG.to_owned(),
            default_mode: Some(0o777),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn liveness_probe() -> Probe {
    Probe {
        exec: Some(ExecAction {
            command: Some(vec![
                "/bin/sh".to_owned(),
                "-c".to_owned(),
                "pg_isready -h localhost -p 5432".to_owned(),
            ]),
        }),
        initial_delay_seconds: Some(240),
        period_seconds: Some(30),
        timeout_seconds: Some(10),
        failure_threshold: Some(10),
        ..Default::default()
    }
}

fn container(spec: &InstanceSpec, flavor: &ContainerFlavor, extra_env: &[EnvVar]) -> Container {
    let mut env = vec![
        plain_env("POSTGRESQL_USER", "blackduck"),
        plain_env("POSTGRESQL_DATABASE", "blackduck"),
        plain_env("POSTGRESQL_MAX_CONNECTIONS", "300"),
        plain_env("POSTGRESQL_SHARED_BUFFERS", "1024MB"),
        plain_env("POSTGRESQL_EFFECTIVE_CACHE_SIZE", "2048MB"),
        secret_env("POSTGRESQL_ADMIN_PASSWORD", ADMIN_PASSWORD_KEY),
        secret_env("POSTGRESQL_PASSWORD", USER_PASSWORD_KEY),
    ];
    env.extend_from_slice(extra_env);

    let limits = BTreeMap::from([
        ("cpu".to_owned(), Quantity(flavor.postgres_cpu_limit.to_owned())),
        ("memory".to_owned(), Quantity(flavor.postgres_memory_limit())),
    ]);

    Container {
        name: COMPONENT.to_owned(),
        image: Some(spec.postgres_image.clone()),
        env: Some(env),
        ports: Some(vec![ContainerPort {
            container_port: POSTGRES_PORT,
            protocol: Some("TCP".to_owned()),
            ..Default::default()
        }]),
        resources: Some(ResourceRequirements {
            requests: Some(limits.clone()),
            limits: Some(limits),
            ..Default::default()
        }),
        volume_mounts: Some(vec![
            VolumeMount {
                name: DATA_VOLUME.to_owned(),
                mount_path: DATA_PATH.to_owned(),
                ..Default::default()
            },
            VolumeMount {
                name: INIT_VOLUME.to_owned(),
                mount_path: INIT_PATH.to_owned(),
                ..Default::default()
            },
        ]),
        liveness_probe: spec.liveness_probes.then(liveness_probe),
        ..Default::default()
    }
}

/// Replication controller running the embedded database
pub(crate) fn replication_controller(
    spec: &InstanceSpec,
    flavor: &ContainerFlavor,
    env: &[EnvVar],
) -> ReplicationController {
    let namespace = spec.namespace.as_str();

    ReplicationController {
        metadata: object_meta(POSTGRES_SERVICE, Some(namespace), COMPONENT),
        spec: Some(ReplicationControllerSpec {
            replicas: Some(1),
            selector: Some(labels(COMPONENT)),
            template: Some(PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    name: Some(POSTGRES_SERVICE.to_owned()),
                    labels: Some(labels(COMPONENT)),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![container(spec, flavor, env)],
                    volumes: Some(vec![data_volume(spec), init_volume()]),
                    service_account_name: Some(namespace.to_owned()),
                    ..Default::default()
                }),
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Cluster-internal service in front of the embedded database
pub(crate) fn service(namespace: &str) -> Service {
    Service {
        metadata: object_meta(POSTGRES_SERVICE, Some(namespace), COMPONENT),
        spec: Some(ServiceSpec {
            type_: Some("ClusterIP".to_owned()),
            selector: Some(labels(COMPONENT)),
            ports: Some(vec![ServicePort {
                name: Some(format!("port-{POSTGRES_PORT}")),
                port: POSTGRES_PORT,
                target_port: Some(IntOrString::Int(POSTGRES_PORT)),
                protocol: Some("TCP".to_owned()),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}
