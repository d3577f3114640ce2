//! Container engine seam
//!
//! The lifecycle code only ever talks to [`ContainerRuntime`]. [`DockerCli`]
//! shells out to the `docker` binary; tests substitute a recording fake.

use crate::command::{ComposeCommand, DockerCommand, RunSpec};
use crate::error::{ContainerError, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

const HELPER_IMAGE: &str = "alpine";

/// compose サブコマンド
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeAction {
    Up,
    Stop,
    Down,
    Ps,
    Images,
    Logs { follow: bool },
}

impl ComposeAction {
    fn apply(self, command: ComposeCommand) -> ComposeCommand {
        match self {
            Self::Up => command.arg("up").arg("-d"),
            Self::Stop => command.arg("stop"),
            Self::Down => command.arg("down"),
            Self::Ps => command.arg("ps"),
            Self::Images => command.arg("images"),
            Self::Logs { follow: false } => command.arg("logs"),
            Self::Logs { follow: true } => command.arg("logs").arg("-f"),
        }
    }
}

#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Run a compose action for `project` from `working_dir`, returning stdout
    async fn compose(&self, working_dir: &Path, project: &str, action: ComposeAction)
    -> Result<String>;

    /// `docker run`, returning stdout
    async fn run(&self, spec: &RunSpec) -> Result<String>;

    async fn create_volume(&self, name: &str) -> Result<()>;

    async fn remove_volume(&self, name: &str) -> Result<()>;

    /// Copy a host file into `volume` at `dest`
    async fn copy_to_volume(&self, volume: &str, source: &Path, dest: &str) -> Result<()>;

    async fn mkdir_in_volume(&self, volume: &str, dir: &str) -> Result<()>;

    async fn copy_from_container(&self, container: &str, source: &str, dest: &Path)
    -> Result<()>;

    async fn pull(&self, image: &str) -> Result<()>;
}

/// `docker` CLI backed runtime
#[derive(Debug, Clone)]
pub struct DockerCli {
    /// Stream command output to the terminal instead of capturing it
    pub verbose: bool,
    binary: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new(false)
    }
}

impl DockerCli {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            binary: "docker".to_string(),
        }
    }

    /// docker 互換の別バイナリを使う（podman など）
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    async fn exec(&self, command: DockerCommand, working_dir: Option<&Path>) -> Result<String> {
        let line = command.display();
        tracing::debug!("Running: {}", line);

        let mut cmd = Command::new(&self.binary);
        cmd.args(command.as_args());
        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let output = cmd.output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if self.verbose && !stdout.is_empty() {
            print!("{stdout}");
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ContainerError::CommandFailed {
                command: line,
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(stdout)
    }

    /// Attach to the terminal for long running output such as `logs -f`
    async fn exec_inherited(&self, command: DockerCommand, working_dir: &Path) -> Result<()> {
        let line = command.display();
        tracing::debug!("Running: {}", line);

        let status = Command::new(&self.binary)
            .args(command.as_args())
            .current_dir(working_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await?;

        if !status.success() {
            return Err(ContainerError::CommandFailed {
                command: line,
                stderr: format!("exited with {status}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn compose(
        &self,
        working_dir: &Path,
        project: &str,
        action: ComposeAction,
    ) -> Result<String> {
        let command = action.apply(ComposeCommand::new(project)).into_docker();
        if let ComposeAction::Logs { follow: true } = action {
            self.exec_inherited(command, working_dir).await?;
            return Ok(String::new());
        }
        self.exec(command, Some(working_dir)).await
    }

    async fn run(&self, spec: &RunSpec) -> Result<String> {
        self.exec(DockerCommand::run(spec), None).await
    }

    async fn create_volume(&self, name: &str) -> Result<()> {
        self.exec(DockerCommand::volume_create(name), None).await?;
        Ok(())
    }

    async fn remove_volume(&self, name: &str) -> Result<()> {
        self.exec(DockerCommand::volume_remove(name), None).await?;
        Ok(())
    }

    async fn copy_to_volume(&self, volume: &str, source: &Path, dest: &str) -> Result<()> {
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mounted = format!("/source/{file_name}");
        let spec = RunSpec::ephemeral(HELPER_IMAGE)
            .volume(volume, "/data")
            .volume(source.to_string_lossy(), mounted.clone())
            .args(["cp", "-R"])
            .arg(mounted)
            .arg(format!("/data/{}", dest.trim_start_matches('/')));
        self.run(&spec).await?;
        Ok(())
    }

    async fn mkdir_in_volume(&self, volume: &str, dir: &str) -> Result<()> {
        let spec = RunSpec::ephemeral(HELPER_IMAGE)
            .volume(volume, "/data")
            .args(["mkdir", "-p"])
            .arg(format!("/data/{}", dir.trim_start_matches('/')));
        self.run(&spec).await?;
        Ok(())
    }

    async fn copy_from_container(
        &self,
        container: &str,
        source: &str,
        dest: &Path,
    ) -> Result<()> {
        self.exec(DockerCommand::copy_from_container(container, source, dest), None)
            .await?;
        Ok(())
    }

    async fn pull(&self, image: &str) -> Result<()> {
        self.exec(DockerCommand::pull(image), None).await?;
        Ok(())
    }
}
