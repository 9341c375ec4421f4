//! Functionality for composing and applying Black Duck deployments.
//!
//! The primary use of this crate is to turn an [`InstanceSpec`] into the
//! ordered set of Kubernetes objects it needs with a [`Composer`], and to
//! push that set to the cluster through a [`Dispatcher`], which drives
//! `kubectl` or `oc` depending on what the target cluster turns out to be.
//!
//! # Example
//!
//! ```no_run
//! use hub_cluster::{ClusterContext, ClusterError, ContainerFlavor, InstanceSpec, KubeSettings};
//! # async fn example(spec: InstanceSpec) -> Result<(), ClusterError> {
//! let context = ClusterContext::connect(KubeSettings::resolve(None, false)?).await?;
//! let flavor = ContainerFlavor::for_size(&spec.size)?;
//! let set = context
//!     .composer()
//!     .compose(&spec, &flavor, &[], "admin-pw", "user-pw", false)
//!     .await?;
//! context.dispatcher().await?.apply(&set)?;
//! # Ok(())
//! # }
//! ```
//!
//! [`Composer`]: ./struct.Composer.html
//! [`Dispatcher`]: ./struct.Dispatcher.html

#![deny(rustdoc::broken_intra_doc_links)]

pub mod defaults;
pub mod flavor;
pub mod spec;
mod compose;
mod context;
mod dispatch;
mod error;
mod probe;
mod serialize;

/// extensions
#[cfg(feature = "cli")]
pub mod cli;

pub use compose::pvc::{AccessMode, ResolvedPvc, plan, pvc_volume};
pub use compose::{Composer, ObjectKey, ResourceObject, ResourceSet};
pub use context::{ClusterContext, KubeSettings, KubeSettingsBuilder};
pub use dispatch::detect::{ToolPresence, detect};
pub use dispatch::{ClusterExecutor, ClusterKind, DispatchRequest, Dispatcher};
pub use error::{
    ClusterError, ComposeError, ConfigError, DispatchError, PlanError, SerializeError,
    ValidationError,
};
pub use flavor::ContainerFlavor;
pub use probe::{ClusterProbe, KubeProbe};
pub use serialize::serialize;
pub use spec::{ExternalDatabase, InstanceSpec, StorageClaim};

pub use k8s_openapi::api::core::v1::EnvVar;

/// Name of the ClusterRole every instance service account is bound to.
pub(crate) const CLUSTER_ADMIN_ROLE: &str = "cluster-admin";
