//! Sizing presets for the Black Duck containers.

use crate::error::ClusterError;

/// Resource sizing of an instance, selected by the instance `size`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerFlavor {
    pub name: &'static str,
    pub webapp_memory_limit_mb: u32,
    pub jobrunner_memory_limit_mb: u32,
    pub jobrunner_replicas: u32,
    pub scan_memory_limit_mb: u32,
    pub scan_replicas: u32,
    pub solr_memory_limit_mb: u32,
    pub postgres_memory_limit_mb: u32,
    pub postgres_cpu_limit: &'static str,
}

const FLAVORS: [ContainerFlavor; 4] = [
    ContainerFlavor {
        name: "small",
        webapp_memory_limit_mb: 2560,
        jobrunner_memory_limit_mb: 4608,
        jobrunner_replicas: 1,
        scan_memory_limit_mb: 2560,
        scan_replicas: 1,
        solr_memory_limit_mb: 1024,
        postgres_memory_limit_mb: 3072,
        postgres_cpu_limit: "1",
    },
    ContainerFlavor {
        name: "medium",
        webapp_memory_limit_mb: 5120,
        jobrunner_memory_limit_mb: 4608,
        jobrunner_replicas: 4,
        scan_memory_limit_mb: 5120,
        scan_replicas: 2,
        solr_memory_limit_mb: 1024,
        postgres_memory_limit_mb: 8192,
        postgres_cpu_limit: "2",
    },
    ContainerFlavor {
        name: "large",
        webapp_memory_limit_mb: 10240,
        jobrunner_memory_limit_mb: 4608,
        jobrunner_replicas: 6,
        scan_memory_limit_mb: 9728,
        scan_replicas: 3,
        solr_memory_limit_mb: 1024,
        postgres_memory_limit_mb: 12288,
        postgres_cpu_limit: "2",
    },
    ContainerFlavor {
        name: "x-large",
        webapp_memory_limit_mb: 20480,
        jobrunner_memory_limit_mb: 7168,
        jobrunner_replicas: 10,
        scan_memory_limit_mb: 9728,
        scan_replicas: 5,
        solr_memory_limit_mb: 1024,
        postgres_memory_limit_mb: 12288,
        postgres_cpu_limit: "3",
    },
];

impl ContainerFlavor {
    /// Flavor for a size name, case-insensitive
    pub fn for_size(size: &str) -> Result<Self, ClusterError> {
        FLAVORS
            .iter()
            .find(|flavor| flavor.name.eq_ignore_ascii_case(size.trim()))
            .cloned()
            .ok_or_else(|| ClusterError::UnknownFlavor(size.to_owned()))
    }

    pub(crate) fn postgres_memory_limit(&self) -> String {
        format!("{}Mi", self.postgres_memory_limit_mb)
    }
}
