use std::io::Error as IoError;
use std::path::PathBuf;

use kube::config::{InferConfigError, KubeconfigError};
use kube::Error as KubeError;
use serde_json::Error as JsonError;

/// The types of errors that can occur while managing a Black Duck instance
#[derive(thiserror::Error, Debug)]
pub enum ClusterError {
    /// The cluster connection could not be configured
    #[error("Failed to configure the cluster connection")]
    Config(#[from] ConfigError),
    /// The object set for an instance could not be built
    #[error("Failed to compose the instance resources")]
    Compose(#[from] ComposeError),
    /// A cluster command could not be executed
    #[error("Failed to run the cluster command")]
    Dispatch(#[from] DispatchError),
    /// The object set could not be serialized
    #[error("Failed to serialize the instance resources")]
    Serialize(#[from] SerializeError),
    /// The requested container flavor does not exist
    #[error("Unknown container flavor '{0}', expected one of small, medium, large, x-large")]
    UnknownFlavor(String),
}

/// A persistent volume claim definition was rejected
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// The claim name is not a valid Kubernetes object name
    #[error("'{0}' is not a valid claim name")]
    InvalidName(String),
    /// The size is not a Kubernetes quantity such as `2Gi`
    #[error("size '{size}' of claim {claim} is not a valid quantity")]
    InvalidSize { claim: String, size: String },
    /// The storage class is not a valid Kubernetes object name
    #[error("storage class '{class}' of claim {claim} is not a valid name")]
    InvalidStorageClass { claim: String, class: String },
}

/// Planning the persistent volume claims of an instance failed
#[derive(thiserror::Error, Debug)]
#[error("failed to plan claim {claim} in namespace {namespace}")]
pub struct PlanError {
    pub claim: String,
    pub namespace: String,
    #[source]
    pub source: ValidationError,
}

/// Errors that abort the composition of an instance
#[derive(thiserror::Error, Debug)]
pub enum ComposeError {
    /// The instance has no namespace
    #[error("instance namespace must not be empty")]
    MissingNamespace,
    /// A persistent volume claim could not be built
    #[error("failed to create the PVC {claim} in namespace {namespace}")]
    Pvc {
        claim: String,
        namespace: String,
        #[source]
        source: ValidationError,
    },
}

impl From<PlanError> for ComposeError {
    fn from(err: PlanError) -> Self {
        Self::Pvc {
            claim: err.claim,
            namespace: err.namespace,
            source: err.source,
        }
    }
}

/// Errors that may occur while running `kubectl` or `oc`
#[derive(thiserror::Error, Debug)]
pub enum DispatchError {
    /// Neither a usable client binary nor the cluster kind could be determined
    #[error("couldn't determine if running in OpenShift or Kubernetes")]
    DetectionFailure,
    /// The client binary could not be started
    #[error("failed to run {program}")]
    Spawn {
        program: String,
        #[source]
        source: IoError,
    },
    /// The client binary exited unsuccessfully
    #[error("{program} exited with {}: {output}", exit_code_text(.code))]
    Subprocess {
        program: String,
        code: Option<i32>,
        /// Combined stdout and stderr of the failed command
        output: String,
    },
    /// The payload for the command could not be produced
    #[error(transparent)]
    Serialize(#[from] SerializeError),
}

impl DispatchError {
    /// Output captured from the command, if it ran at all
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::Subprocess { output, .. } => Some(output),
            _ => None,
        }
    }
}

fn exit_code_text(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "signal".to_owned(),
    }
}

/// A cluster object could not be encoded
#[derive(thiserror::Error, Debug)]
#[error("failed to serialize {kind} {name}")]
pub struct SerializeError {
    pub kind: &'static str,
    pub name: String,
    #[source]
    pub source: JsonError,
}

/// Errors while locating the kubeconfig or building the API client
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// An explicit or `KUBECONFIG` path does not exist
    #[error("the kubeconfig path '{}' does not point to a file", .0.display())]
    KubeconfigNotFound(PathBuf),
    /// The kubeconfig file could not be read
    #[error("Kubernetes config error")]
    Kubeconfig(#[from] KubeconfigError),
    /// No configuration could be inferred from the environment
    #[error("Kubernetes config error")]
    Infer(#[from] InferConfigError),
    /// The API client could not be created
    #[error("Kubernetes client error")]
    Client(#[from] KubeError),
}
