use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use derive_builder::Builder;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::{debug, instrument};

use crate::compose::Composer;
use crate::dispatch::detect::detect;
use crate::dispatch::{ClusterKind, Dispatcher};
use crate::error::{ConfigError, DispatchError};
use crate::probe::KubeProbe;

const KUBECONFIG_ENV: &str = "KUBECONFIG";

/// How to reach the target cluster, shared by the API client and the cli tools
#[derive(Builder, Debug, Clone, Default, PartialEq, Eq)]
pub struct KubeSettings {
    /// Kubeconfig passed to `kubectl`/`oc` as `--kubeconfig`
    #[builder(setter(into, strip_option), default)]
    kubeconfig: Option<PathBuf>,
    /// Skip verification of the API server certificate
    #[builder(default)]
    insecure_skip_tls_verify: bool,
}

impl KubeSettings {
    pub fn builder() -> KubeSettingsBuilder {
        KubeSettingsBuilder::default()
    }

    /// Settings from the command line, falling back to `KUBECONFIG`.
    ///
    /// A kubeconfig that was asked for explicitly must exist.
    pub fn resolve(
        kubeconfig: Option<PathBuf>,
        insecure_skip_tls_verify: bool,
    ) -> Result<Self, ConfigError> {
        Self::resolve_with_env(
            kubeconfig,
            env::var_os(KUBECONFIG_ENV),
            insecure_skip_tls_verify,
        )
    }

    fn resolve_with_env(
        kubeconfig: Option<PathBuf>,
        env_value: Option<OsString>,
        insecure_skip_tls_verify: bool,
    ) -> Result<Self, ConfigError> {
        let kubeconfig = kubeconfig.or_else(|| {
            env_value
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        });

        if let Some(path) = &kubeconfig {
            if !path.exists() {
                return Err(ConfigError::KubeconfigNotFound(path.clone()));
            }
        }

        Ok(Self {
            kubeconfig,
            insecure_skip_tls_verify,
        })
    }

    pub fn kubeconfig(&self) -> Option<&Path> {
        self.kubeconfig.as_deref()
    }

    pub fn insecure_skip_tls_verify(&self) -> bool {
        self.insecure_skip_tls_verify
    }

    /// Flags placed ahead of every `kubectl`/`oc` invocation
    pub fn global_flags(&self) -> Vec<String> {
        let mut flags = vec![];
        if let Some(path) = &self.kubeconfig {
            flags.push(format!("--kubeconfig={}", path.display()));
        }
        if self.insecure_skip_tls_verify {
            flags.push(format!(
                "--insecure-skip-tls-verify={}",
                self.insecure_skip_tls_verify
            ));
        }
        flags
    }

    /// Kubeconfig used to build the API client, `~/.kube/config` by default
    pub fn client_kubeconfig(&self) -> Option<PathBuf> {
        self.kubeconfig.clone().or_else(|| {
            default_kubeconfig_path(env::var_os("HOME"), env::var_os("USERPROFILE"))
        })
    }

    /// API client configuration honoring the kubeconfig and TLS settings
    #[instrument(skip(self))]
    pub async fn client_config(&self) -> Result<Config, ConfigError> {
        let mut config = match self.client_kubeconfig().filter(|path| path.exists()) {
            Some(path) => {
                debug!(path = %path.display(), "loading kubeconfig");
                let kubeconfig = Kubeconfig::read_from(&path)?;
                Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?
            }
            None => {
                debug!("no kubeconfig found, inferring config");
                Config::infer().await?
            }
        };
        if self.insecure_skip_tls_verify {
            config.accept_invalid_certs = true;
        }
        Ok(config)
    }
}

/// `<home>/.kube/config`, where home is `HOME` or else `USERPROFILE`
fn default_kubeconfig_path(home: Option<OsString>, user_profile: Option<OsString>) -> Option<PathBuf> {
    home.filter(|value| !value.is_empty())
        .or_else(|| user_profile.filter(|value| !value.is_empty()))
        .map(|home| PathBuf::from(home).join(".kube").join("config"))
}

/// Connection to one cluster, created once per process and passed around
pub struct ClusterContext {
    settings: KubeSettings,
    probe: KubeProbe,
}

impl ClusterContext {
    pub async fn connect(settings: KubeSettings) -> Result<Self, ConfigError> {
        let config = settings.client_config().await?;
        let client = Client::try_from(config)?;
        Ok(Self {
            settings,
            probe: KubeProbe::new(client),
        })
    }

    pub fn settings(&self) -> &KubeSettings {
        &self.settings
    }

    pub fn probe(&self) -> &KubeProbe {
        &self.probe
    }

    pub fn composer(&self) -> Composer<'_> {
        Composer::new(&self.probe)
    }

    /// Detect the cluster kind and build a dispatcher for it
    pub async fn dispatcher(&self) -> Result<Dispatcher, DispatchError> {
        let kind: ClusterKind = detect(&self.probe).await;
        Dispatcher::new(kind, self.settings.clone())
    }
}
