use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use tracing::debug;

use crate::{ClusterContext, ContainerFlavor, EnvVar, InstanceSpec, ResourceSet};

#[derive(Debug, Args)]
pub struct InstanceOpt {
    /// Instance definition in YAML or JSON
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    file: PathBuf,

    /// Container flavor, overrides the size of the instance definition
    #[arg(long, value_name = "FLAVOR")]
    size: Option<String>,

    /// Password of the postgres admin user
    #[arg(long, env = "HUB_POSTGRES_ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: String,

    /// Password of the postgres application user
    #[arg(long, env = "HUB_POSTGRES_USER_PASSWORD", hide_env_values = true)]
    user_password: String,

    /// Extra environment for the database container, as KEY=VALUE
    #[arg(short = 'e', long = "env", value_name = "KEY=VALUE", value_parser = parse_env_var)]
    env: Vec<EnvVar>,

    /// Enable uploads for binary analysis
    #[arg(long)]
    binary_analysis: bool,
}

impl InstanceOpt {
    fn load_spec(&self) -> Result<InstanceSpec> {
        let mut spec = load_spec(&self.file)?;
        if let Some(size) = &self.size {
            spec.size = size.clone();
        }
        Ok(spec)
    }

    pub(crate) async fn compose(&self, context: &ClusterContext) -> Result<ResourceSet> {
        let spec = self.load_spec()?;
        let flavor = ContainerFlavor::for_size(&spec.size)?;
        debug!(namespace = %spec.namespace, flavor = flavor.name, "composing instance");

        let set = context
            .composer()
            .compose(
                &spec,
                &flavor,
                &self.env,
                &self.admin_password,
                &self.user_password,
                self.binary_analysis,
            )
            .await?;
        Ok(set)
    }
}

fn load_spec(path: &Path) -> Result<InstanceSpec> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("unable to read instance definition {}", path.display()))?;
    let spec: InstanceSpec = serde_yaml::from_str(&contents)
        .with_context(|| format!("invalid instance definition {}", path.display()))?;
    Ok(spec)
}

fn parse_env_var(value: &str) -> Result<EnvVar> {
    let Some((name, value)) = value.split_once('=') else {
        bail!("expected KEY=VALUE, got '{value}'");
    };
    if name.is_empty() {
        bail!("environment variable name must not be empty");
    }
    Ok(EnvVar {
        name: name.to_owned(),
        value: Some(value.to_owned()),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct Root {
        #[command(flatten)]
        opt: InstanceOpt,
    }

    #[test]
    fn test_parse_env_var() {
        let var = parse_env_var("JAVA_OPTS=-Xmx=2g").expect("parse");
        assert_eq!(var.name, "JAVA_OPTS");
        assert_eq!(var.value.as_deref(), Some("-Xmx=2g"));

        assert!(parse_env_var("NOVALUE").is_err());
        assert!(parse_env_var("=value").is_err());
    }

    #[test]
    fn test_parse_instance_opt() {
        let root = Root::try_parse_from([
            "deploy",
            "-f",
            "bd.yaml",
            "--size",
            "medium",
            "--admin-password",
            "a",
            "--user-password",
            "u",
            "-e",
            "A=1",
            "-e",
            "B=2",
            "--binary-analysis",
        ])
        .expect("parse");
        assert_eq!(root.opt.file, PathBuf::from("bd.yaml"));
        assert_eq!(root.opt.size.as_deref(), Some("medium"));
        assert_eq!(root.opt.env.len(), 2);
        assert!(root.opt.binary_analysis);
    }

    #[test]
    fn test_size_override() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "namespace: bd\nsize: large").expect("write");

        let root = Root::try_parse_from([
            "deploy",
            "-f",
            file.path().to_str().expect("utf8 path"),
            "--admin-password",
            "a",
            "--user-password",
            "u",
        ])
        .expect("parse");
        assert_eq!(root.opt.load_spec().expect("load").size, "large");

        let root = Root::try_parse_from([
            "deploy",
            "-f",
            file.path().to_str().expect("utf8 path"),
            "--size",
            "x-large",
            "--admin-password",
            "a",
            "--user-password",
            "u",
        ])
        .expect("parse");
        let spec = root.opt.load_spec().expect("load");
        assert_eq!(spec.namespace, "bd");
        assert_eq!(spec.size, "x-large");
    }

    #[test]
    fn test_load_json_definition() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"namespace":"bd","persistentStorage":true}}"#).expect("write");
        let spec = load_spec(file.path()).expect("load");
        assert!(spec.persistent_storage);
        assert_eq!(spec.size, "small");
    }

    #[test]
    fn test_missing_definition() {
        assert!(load_spec(Path::new("/does/not/exist.yaml")).is_err());
    }
}
