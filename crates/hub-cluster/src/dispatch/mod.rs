use std::fmt;

use duct::Expression;
use tracing::{debug, info, instrument};

use crate::compose::ResourceSet;
use crate::context::KubeSettings;
use crate::error::DispatchError;
use crate::serialize::serialize;

pub mod detect;

const KUBECTL: &str = "kubectl";
const OC: &str = "oc";

/// What kind of cluster we are talking to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterKind {
    Kubernetes,
    OpenShift,
    Undetermined,
}

impl ClusterKind {
    /// `(is_kubernetes, is_openshift)`, never both true
    pub fn flags(self) -> (bool, bool) {
        match self {
            Self::Kubernetes => (true, false),
            Self::OpenShift => (false, true),
            Self::Undetermined => (false, false),
        }
    }
}

/// The cli tool commands are run with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterExecutor {
    Kubernetes,
    OpenShift,
}

impl ClusterExecutor {
    pub fn for_kind(kind: ClusterKind) -> Result<Self, DispatchError> {
        match kind {
            ClusterKind::Kubernetes => Ok(Self::Kubernetes),
            ClusterKind::OpenShift => Ok(Self::OpenShift),
            ClusterKind::Undetermined => Err(DispatchError::DetectionFailure),
        }
    }

    pub fn binary(&self) -> &'static str {
        match self {
            Self::Kubernetes => KUBECTL,
            Self::OpenShift => OC,
        }
    }

    /// Rewrite commands whose name differs between the two tools
    fn translate(&self, args: &[&str]) -> Vec<String> {
        let mut args: Vec<String> = args.iter().map(|arg| (*arg).to_owned()).collect();
        // some versions of oc lack cluster-info, status reports the same
        if *self == Self::OpenShift && args.first().map(String::as_str) == Some("cluster-info") {
            args[0] = "status".to_owned();
        }
        args
    }
}

/// A fully built command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    pub program: String,
    pub args: Vec<String>,
}

impl DispatchRequest {
    fn expression(&self) -> Expression {
        duct::cmd(self.program.as_str(), &self.args)
    }
}

impl fmt::Display for DispatchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runs `kubectl` or `oc` against the target cluster
#[derive(Debug, Clone)]
pub struct Dispatcher {
    executor: ClusterExecutor,
    program: String,
    settings: KubeSettings,
}

impl Dispatcher {
    /// Fails when the cluster kind could not be determined
    pub fn new(kind: ClusterKind, settings: KubeSettings) -> Result<Self, DispatchError> {
        let executor = ClusterExecutor::for_kind(kind)?;
        Ok(Self::with_executor(executor, settings))
    }

    pub fn with_executor(executor: ClusterExecutor, settings: KubeSettings) -> Self {
        Self {
            executor,
            program: executor.binary().to_owned(),
            settings,
        }
    }

    pub fn executor(&self) -> ClusterExecutor {
        self.executor
    }

    /// Command line for the given arguments, global flags first
    pub fn request(&self, args: &[&str]) -> DispatchRequest {
        let mut full_args = self.settings.global_flags();
        full_args.extend(self.executor.translate(args));
        DispatchRequest {
            program: self.program.clone(),
            args: full_args,
        }
    }

    /// Run a command.
    ///
    /// With `stdin` the payload is piped in and the combined output returned;
    /// without it the command is attached to the terminal and the returned
    /// output is empty.
    pub fn dispatch(&self, args: &[&str], stdin: Option<&[u8]>) -> Result<String, DispatchError> {
        match stdin {
            Some(payload) => self.run_with_stdin(payload, args),
            None => self.run_interactive(args).map(|()| String::new()),
        }
    }

    /// Run a command and return its combined stdout and stderr
    #[instrument(skip(self))]
    pub fn run(&self, args: &[&str]) -> Result<String, DispatchError> {
        let request = self.request(args);
        debug!(%request, "running");
        let expression = request.expression().stdin_null();
        capture(&request, expression)
    }

    /// Run a command with `payload` on its stdin and return its combined output
    #[instrument(skip(self, payload), fields(bytes = payload.len()))]
    pub fn run_with_stdin(&self, payload: &[u8], args: &[&str]) -> Result<String, DispatchError> {
        let request = self.request(args);
        debug!(%request, "running with stdin");
        // duct writes the payload from a helper thread and joins it before run() returns
        let expression = request.expression().stdin_bytes(payload.to_vec());
        capture(&request, expression)
    }

    /// Run a command attached to the terminal, e.g. `edit`
    #[instrument(skip(self))]
    pub fn run_interactive(&self, args: &[&str]) -> Result<(), DispatchError> {
        let request = self.request(args);
        debug!(%request, "running interactively");
        let status = request
            .expression()
            .unchecked()
            .run()
            .map_err(|source| spawn_error(&request, source))?
            .status;

        if status.success() {
            Ok(())
        } else {
            Err(DispatchError::Subprocess {
                program: request.program,
                code: status.code(),
                output: String::new(),
            })
        }
    }

    /// Create or update every object of the set
    pub fn apply(&self, set: &ResourceSet) -> Result<String, DispatchError> {
        let payload = serialize(set)?;
        info!(objects = set.len(), "applying resources");
        self.run_with_stdin(&payload, &["apply", "--validate=false", "-f", "-"])
    }

    /// Delete every object of the set
    pub fn delete(&self, set: &ResourceSet) -> Result<String, DispatchError> {
        let payload = serialize(set)?;
        info!(objects = set.len(), "deleting resources");
        self.run_with_stdin(&payload, &["delete", "-f", "-"])
    }

    /// Let the user edit a resource in their editor
    pub fn edit(&self, args: &[&str]) -> Result<(), DispatchError> {
        self.run_interactive(&edit_args(args))
    }

    /// `cluster-info` on Kubernetes, `status` on OpenShift
    pub fn cluster_info(&self) -> Result<String, DispatchError> {
        self.run(&["cluster-info"])
    }
}

fn edit_args<'a>(args: &[&'a str]) -> Vec<&'a str> {
    let mut full_args = vec!["edit"];
    full_args.extend_from_slice(args);
    full_args
}

fn spawn_error(request: &DispatchRequest, source: std::io::Error) -> DispatchError {
    DispatchError::Spawn {
        program: request.program.clone(),
        source,
    }
}

fn capture(request: &DispatchRequest, expression: Expression) -> Result<String, DispatchError> {
    let output = expression
        .stderr_to_stdout()
        .stdout_capture()
        .unchecked()
        .run()
        .map_err(|source| spawn_error(request, source))?;
    let combined = String::from_utf8_lossy(&output.stdout).into_owned();

    if output.status.success() {
        Ok(combined)
    } else {
        Err(DispatchError::Subprocess {
            program: request.program.clone(),
            code: output.status.code(),
            output: combined,
        })
    }
}
