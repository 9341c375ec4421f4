use tracing::{debug, instrument, warn};
use which::which;

use crate::probe::ClusterProbe;

use super::ClusterKind;

/// Which cluster cli tools can be found on `PATH`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolPresence {
    pub oc: bool,
    pub kubectl: bool,
}

impl ToolPresence {
    pub fn on_path() -> Self {
        Self {
            oc: which("oc").is_ok(),
            kubectl: which("kubectl").is_ok(),
        }
    }
}

impl ClusterKind {
    /// Prefer the tool matching the cluster, fall back to whichever tool is installed
    pub fn resolve(tools: ToolPresence, openshift: bool) -> Self {
        let ToolPresence { oc, kubectl } = tools;

        if oc && openshift {
            debug!("oc exists and the cluster is openshift");
            Self::OpenShift
        } else if kubectl && !openshift {
            debug!("kubectl exists and it isn't openshift");
            Self::Kubernetes
        } else if kubectl && !oc && openshift {
            debug!("kubectl exists, oc doesn't exist, and it is openshift");
            Self::Kubernetes
        } else if oc && !kubectl && !openshift {
            debug!("oc exists, kubectl doesn't exist, and it isn't openshift");
            Self::OpenShift
        } else {
            Self::Undetermined
        }
    }
}

/// Work out the cluster kind from the installed tools and the API server
#[instrument(skip(probe))]
pub async fn detect(probe: &dyn ClusterProbe) -> ClusterKind {
    let tools = ToolPresence::on_path();
    let openshift = match probe.is_openshift().await {
        Ok(openshift) => openshift,
        Err(err) => {
            warn!(%err, "unable to query api groups, assuming kubernetes");
            false
        }
    };
    let kind = ClusterKind::resolve(tools, openshift);
    debug!(?tools, openshift, ?kind, "detected cluster kind");
    kind
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tools(oc: bool, kubectl: bool) -> ToolPresence {
        ToolPresence { oc, kubectl }
    }

    #[test]
    fn test_decision_table() {
        use ClusterKind::*;

        assert_eq!(ClusterKind::resolve(tools(true, true), true), OpenShift);
        assert_eq!(ClusterKind::resolve(tools(true, false), true), OpenShift);
        assert_eq!(ClusterKind::resolve(tools(true, true), false), Kubernetes);
        assert_eq!(ClusterKind::resolve(tools(false, true), false), Kubernetes);
        assert_eq!(ClusterKind::resolve(tools(false, true), true), Kubernetes);
        assert_eq!(ClusterKind::resolve(tools(true, false), false), OpenShift);
        assert_eq!(ClusterKind::resolve(tools(false, false), true), Undetermined);
        assert_eq!(ClusterKind::resolve(tools(false, false), false), Undetermined);
    }

    #[test]
    fn test_never_both() {
        for oc in [false, true] {
            for kubectl in [false, true] {
                for openshift in [false, true] {
                    let (kube, os) = ClusterKind::resolve(tools(oc, kubectl), openshift).flags();
                    assert!(!(kube && os), "oc={oc} kubectl={kubectl} openshift={openshift}");
                    if oc || kubectl {
                        assert!(kube || os);
                    }
                }
            }
        }
    }
}
