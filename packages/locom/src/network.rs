//! Docker networks the stage's stacks attach to

use locom_common::process;
use locom_common::ElevationError;

/// Docker network errors
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// The docker client is not installed
    #[error("`{program}` was not found on PATH; is Docker installed?")]
    DockerMissing {
        /// Program that failed to spawn
        program: String,
    },

    /// `docker network create` exited non-zero
    #[error("failed to create network {name}: `{command}` exited with {status}")]
    CreateFailed {
        /// Network name
        name: String,
        /// Rendered command line
        command: String,
        /// Exit status
        status: String,
    },

    /// The docker client could not be run
    #[error("failed to run docker: {0}")]
    Spawn(#[source] ElevationError),
}

impl NetworkError {
    fn from_process(name: &str, error: ElevationError) -> Self {
        match error {
            ElevationError::HelperMissing { helper } => Self::DockerMissing { program: helper },
            ElevationError::Denied { command, status } => Self::CreateFailed {
                name: name.to_string(),
                command,
                status,
            },
            other => Self::Spawn(other),
        }
    }
}

/// The docker client, plus any global flags such as `--context`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerCli {
    program: String,
    global_args: Vec<String>,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl DockerCli {
    /// Client invoked as `program`
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            global_args: Vec::new(),
        }
    }

    /// Append an argument placed before every subcommand
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.global_args.push(arg.into());
        self
    }

    fn args(&self, rest: &[&str]) -> Vec<String> {
        self.global_args
            .iter()
            .cloned()
            .chain(rest.iter().map(|a| a.to_string()))
            .collect()
    }

    /// Whether `docker network inspect <name>` succeeds
    pub async fn network_exists(&self, name: &str) -> Result<bool, NetworkError> {
        match process::run_captured(&self.program, &self.args(&["network", "inspect", name])).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_denied() => Ok(false),
            Err(e) => Err(NetworkError::from_process(name, e)),
        }
    }

    /// `docker network create <name>`
    pub async fn create_network(&self, name: &str) -> Result<(), NetworkError> {
        process::run_interactive(&self.program, &self.args(&["network", "create", name]))
            .await
            .map_err(|e| NetworkError::from_process(name, e))?;
        tracing::info!(network = name, "docker network created");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_args_come_first() {
        let docker = DockerCli::new("docker").arg("--context").arg("remote");
        assert_eq!(
            docker.args(&["network", "inspect", "locom"]),
            vec!["--context", "remote", "network", "inspect", "locom"]
        );
    }

    #[tokio::test]
    async fn test_missing_client() {
        let docker = DockerCli::new("locom-no-such-docker");

        let err = docker.network_exists("locom").await.unwrap_err();
        assert!(matches!(err, NetworkError::DockerMissing { ref program } if program == "locom-no-such-docker"));

        let err = docker.create_network("locom").await.unwrap_err();
        assert!(matches!(err, NetworkError::DockerMissing { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_inspect_failure_means_absent_and_create_failure_is_reported() {
        // `sh -c <script> <name> <args...>` stands in for the client
        let docker = DockerCli::new("sh").arg("-c").arg("exit 1").arg("docker");

        assert!(!docker.network_exists("locom").await.unwrap());
        let err = docker.create_network("locom").await.unwrap_err();
        assert!(matches!(err, NetworkError::CreateFailed { ref name, .. } if name == "locom"));

        let docker = DockerCli::new("sh").arg("-c").arg("exit 0").arg("docker");
        assert!(docker.network_exists("locom").await.unwrap());
        docker.create_network("locom").await.unwrap();
    }
}
