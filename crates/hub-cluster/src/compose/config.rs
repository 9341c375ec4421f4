use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ConfigMap;

use crate::flavor::ContainerFlavor;
use crate::spec::InstanceSpec;

use super::object_meta;
use super::postgres::{POSTGRES_PORT, POSTGRES_SERVICE};

pub(crate) const HUB_CONFIG: &str = "blackduck-config";
pub(crate) const DB_CONFIG: &str = "blackduck-db-config";
pub(crate) const RESOURCES_CONFIG: &str = "blackduck-config-resources";
pub(crate) const POSTGRES_INIT_CONFIG: &str = "blackduck-postgres-init-config";
pub(crate) const POSTGRES_INIT_SCRIPT_KEY: &str = "pgsql-init.pgsql";

const EMBEDDED_ADMIN_USER: &str = "blackduck";
const EMBEDDED_USER: &str = "blackduck_user";

const POSTGRES_INIT_SCRIPT: &str = r#"ALTER SYSTEM SET max_connections = 300;
CREATE DATABASE bds_hub OWNER blackduck ENCODING SQL_ASCII;
CREATE DATABASE bds_hub_report OWNER blackduck ENCODING SQL_ASCII;
CREATE DATABASE bdio OWNER blackduck ENCODING SQL_ASCII;
CREATE USER blackduck_user;
CREATE USER blackduck_reporter;
GRANT blackduck_user TO blackduck;
GRANT CONNECT ON DATABASE bds_hub TO blackduck_user;
GRANT CONNECT ON DATABASE bds_hub_report TO blackduck_reporter;
"#;

fn config_map(name: &str, namespace: &str, data: BTreeMap<String, String>) -> ConfigMap {
    ConfigMap {
        metadata: object_meta(name, Some(namespace), "configmap"),
        data: Some(data),
        ..Default::default()
    }
}

fn entries<const N: usize>(pairs: [(&str, String); N]) -> BTreeMap<String, String> {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_owned(), value))
        .collect()
}

fn hub_config(spec: &InstanceSpec, binary_analysis_enabled: bool) -> BTreeMap<String, String> {
    let mut data = entries([
        ("PUBLIC_HUB_WEBSERVER_HOST", "localhost".to_owned()),
        ("PUBLIC_HUB_WEBSERVER_PORT", "443".to_owned()),
        ("HUB_WEBSERVER_PORT", "8443".to_owned()),
        ("IPV4_ONLY", "0".to_owned()),
        ("RUN_SECRETS_DIR", "/tmp/secrets".to_owned()),
        ("HUB_VERSION", spec.version.clone()),
        ("HUB_PROXY_NON_PROXY_HOSTS", "solr".to_owned()),
    ]);

    if binary_analysis_enabled {
        data.insert("USE_BINARY_UPLOADS".to_owned(), "1".to_owned());
    }
    if !spec.liveness_probes {
        data.insert("DISABLE_HUB_DASHBOARD_HEALTHCHECK".to_owned(), "true".to_owned());
    }

    // user supplied values win over the defaults above
    for (key, value) in spec.environ_pairs() {
        data.insert(key.to_owned(), value.to_owned());
    }
    data
}

fn db_config(spec: &InstanceSpec) -> BTreeMap<String, String> {
    match &spec.external_database {
        Some(db) => entries([
            ("HUB_POSTGRES_ADMIN", db.postgres_admin.clone()),
            ("HUB_POSTGRES_USER", db.postgres_user.clone()),
            ("HUB_POSTGRES_PORT", db.postgres_port.to_string()),
            ("HUB_POSTGRES_HOST", db.postgres_host.clone()),
            ("HUB_POSTGRES_ENABLE_SSL", db.postgres_ssl.to_string()),
            ("HUB_POSTGRES_ENABLE_SSL_CERT_AUTH", "false".to_owned()),
        ]),
        None => entries([
            ("HUB_POSTGRES_ADMIN", EMBEDDED_ADMIN_USER.to_owned()),
            ("HUB_POSTGRES_USER", EMBEDDED_USER.to_owned()),
            ("HUB_POSTGRES_PORT", POSTGRES_PORT.to_string()),
            ("HUB_POSTGRES_HOST", POSTGRES_SERVICE.to_owned()),
            ("HUB_POSTGRES_ENABLE_SSL", "false".to_owned()),
            ("HUB_POSTGRES_ENABLE_SSL_CERT_AUTH", "false".to_owned()),
        ]),
    }
}

fn resources_config(flavor: &ContainerFlavor) -> BTreeMap<String, String> {
    entries([
        ("FLAVOR", flavor.name.to_owned()),
        ("webapp-mem", format!("{}M", flavor.webapp_memory_limit_mb)),
        ("jobrunner-mem", format!("{}M", flavor.jobrunner_memory_limit_mb)),
        ("jobrunner-replicas", flavor.jobrunner_replicas.to_string()),
        ("scan-mem", format!("{}M", flavor.scan_memory_limit_mb)),
        ("scan-replicas", flavor.scan_replicas.to_string()),
        ("solr-mem", format!("{}M", flavor.solr_memory_limit_mb)),
        ("postgres-mem", format!("{}M", flavor.postgres_memory_limit_mb)),
        ("postgres-cpu", flavor.postgres_cpu_limit.to_owned()),
    ])
}

/// Config maps of an instance
pub(crate) fn instance_config_maps(
    spec: &InstanceSpec,
    flavor: &ContainerFlavor,
    binary_analysis_enabled: bool,
) -> Vec<ConfigMap> {
    let namespace = spec.namespace.as_str();
    let mut config_maps = vec![
        config_map(
            HUB_CONFIG,
            namespace,
            hub_config(spec, binary_analysis_enabled),
        ),
        config_map(DB_CONFIG, namespace, db_config(spec)),
        config_map(RESOURCES_CONFIG, namespace, resources_config(flavor)),
    ];

    if spec.external_database.is_none() {
        config_maps.push(config_map(
            POSTGRES_INIT_CONFIG,
            namespace,
            entries([(POSTGRES_INIT_SCRIPT_KEY, POSTGRES_INIT_SCRIPT.to_owned())]),
        ));
    }

    config_maps
}
