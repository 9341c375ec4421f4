use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use tracing::warn;

use crate::spec::InstanceSpec;

use super::object_meta;

pub(crate) const DB_CREDS_SECRET: &str = "db-creds";
pub(crate) const ADMIN_PASSWORD_KEY: &str = "HUB_POSTGRES_ADMIN_PASSWORD_FILE";
pub(crate) const USER_PASSWORD_KEY: &str = "HUB_POSTGRES_USER_PASSWORD_FILE";

const CERTIFICATE_SECRET: &str = "blackduck-certificate";
const AUTH_CUSTOM_CA_SECRET: &str = "blackduck-auth-custom-ca";
const PROXY_CERTIFICATE_SECRET: &str = "blackduck-proxy-certificate";

fn opaque_secret(name: &str, namespace: &str, data: &[(&str, &str)]) -> Secret {
    let data = data
        .iter()
        .map(|(key, value)| ((*key).to_owned(), ByteString(value.as_bytes().to_vec())))
        .collect::<BTreeMap<_, _>>();

    Secret {
        metadata: object_meta(name, Some(namespace), "secret"),
        type_: Some("Opaque".to_owned()),
        data: Some(data),
        ..Default::default()
    }
}

/// Credential and certificate secrets of an instance
pub(crate) fn instance_secrets(
    spec: &InstanceSpec,
    admin_password: &str,
    user_password: &str,
) -> Vec<Secret> {
    let namespace = spec.namespace.as_str();
    let mut secrets = vec![opaque_secret(
        DB_CREDS_SECRET,
        namespace,
        &[
            (ADMIN_PASSWORD_KEY, admin_password),
            (USER_PASSWORD_KEY, user_password),
        ],
    )];

    match (spec.certificate.as_deref(), spec.certificate_key.as_deref()) {
        (Some(cert), Some(key)) => secrets.push(opaque_secret(
            CERTIFICATE_SECRET,
            namespace,
            &[
                ("WEBSERVER_CUSTOM_CERT_FILE", cert),
                ("WEBSERVER_CUSTOM_KEY_FILE", key),
            ],
        )),
        (None, None) => {}
        _ => warn!("certificate and certificate key must be given together, skipping"),
    }

    if let Some(ca) = spec.auth_custom_ca.as_deref() {
        secrets.push(opaque_secret(
            AUTH_CUSTOM_CA_SECRET,
            namespace,
            &[("AUTH_CUSTOM_CA", ca)],
        ));
    }

    if let Some(cert) = spec.proxy_certificate.as_deref() {
        secrets.push(opaque_secret(
            PROXY_CERTIFICATE_SECRET,
            namespace,
            &[("HUB_PROXY_CERT_FILE", cert)],
        ));
    }

    secrets
}
