use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser};
use tracing::debug;

mod instance;

use instance::InstanceOpt;

use crate::{ClusterContext, KubeSettings, serialize};

/// Where to find the target cluster
#[derive(Debug, Default, Args)]
pub struct TargetOpt {
    /// Path to the kubeconfig file, `KUBECONFIG` is used when not given
    #[arg(long, value_name = "PATH", global = true)]
    pub kubeconfig: Option<PathBuf>,

    /// Do not verify the API server certificate
    #[arg(long, global = true)]
    pub insecure_skip_tls_verify: bool,
}

impl TargetOpt {
    pub fn settings(&self) -> Result<KubeSettings> {
        Ok(KubeSettings::resolve(
            self.kubeconfig.clone(),
            self.insecure_skip_tls_verify,
        )?)
    }

    pub async fn connect(&self) -> Result<ClusterContext> {
        let settings = self.settings()?;
        debug!(?settings, "connecting to cluster");
        Ok(ClusterContext::connect(settings).await?)
    }
}

/// Manage Black Duck instances
#[derive(Debug, Parser)]
pub enum HubCmd {
    /// Create or update an instance
    #[command(name = "deploy")]
    Deploy(InstanceOpt),

    /// Delete the objects of an instance
    #[command(name = "destroy")]
    Destroy(InstanceOpt),

    /// Print the objects of an instance without applying them
    #[command(name = "render")]
    Render(InstanceOpt),

    /// Edit a cluster resource, e.g. `edit configmap blackduck-config -n bd`
    #[command(name = "edit")]
    Edit(EditOpt),

    /// Show cluster information
    #[command(name = "status")]
    Status,
}

#[derive(Debug, Args)]
pub struct EditOpt {
    /// Arguments passed to `kubectl edit` or `oc edit`
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

impl HubCmd {
    /// process instance commands
    pub async fn process(self, target: TargetOpt) -> Result<()> {
        let context = target.connect().await?;

        match self {
            Self::Deploy(opt) => {
                let set = opt.compose(&context).await?;
                let output = context.dispatcher().await?.apply(&set)?;
                print!("{output}");
            }
            Self::Destroy(opt) => {
                let set = opt.compose(&context).await?;
                let output = context.dispatcher().await?.delete(&set)?;
                print!("{output}");
            }
            Self::Render(opt) => {
                let set = opt.compose(&context).await?;
                let payload = serialize(&set)?;
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(&payload)?;
                writeln!(stdout)?;
            }
            Self::Edit(opt) => {
                let args: Vec<&str> = opt.args.iter().map(String::as_str).collect();
                context.dispatcher().await?.edit(&args)?;
            }
            Self::Status => {
                let output = context.dispatcher().await?.cluster_info()?;
                print!("{output}");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Parser)]
    struct Root {
        #[command(flatten)]
        target: TargetOpt,
        #[command(subcommand)]
        cmd: HubCmd,
    }

    #[test]
    fn test_status_with_global_flags() {
        let root = Root::try_parse_from([
            "hubctl",
            "status",
            "--kubeconfig",
            "/tmp/config",
            "--insecure-skip-tls-verify",
        ])
        .expect("parse");
        assert!(matches!(root.cmd, HubCmd::Status));
        assert_eq!(root.target.kubeconfig, Some(PathBuf::from("/tmp/config")));
        assert!(root.target.insecure_skip_tls_verify);
    }

    #[test]
    fn test_edit_passes_flags_through() {
        let root = Root::try_parse_from([
            "hubctl",
            "edit",
            "configmap",
            "blackduck-config",
            "-n",
            "bd",
        ])
        .expect("parse");
        let HubCmd::Edit(opt) = root.cmd else {
            panic!("expected edit");
        };
        assert_eq!(opt.args, vec!["configmap", "blackduck-config", "-n", "bd"]);
    }

    #[test]
    fn test_edit_requires_args() {
        assert!(Root::try_parse_from(["hubctl", "edit"]).is_err());
    }
}
