//! Argument builders for the `docker` CLI

use std::path::Path;

/// A `docker` invocation as an argument vector
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DockerCommand {
    args: Vec<String>,
}

impl DockerCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn volume_create(name: &str) -> Self {
        Self::new().args(["volume", "create", name])
    }

    pub fn volume_remove(name: &str) -> Self {
        Self::new().args(["volume", "remove", name])
    }

    pub fn pull(image: &str) -> Self {
        Self::new().args(["pull", image])
    }

    /// `docker cp <container>:<source> <dest>`
    pub fn copy_from_container(container: &str, source: &str, dest: &Path) -> Self {
        Self::new()
            .arg("cp")
            .arg(format!("{container}:{source}"))
            .arg(dest.to_string_lossy())
    }

    pub fn run(spec: &RunSpec) -> Self {
        Self::new().args(spec.to_args())
    }

    pub fn as_args(&self) -> &[String] {
        &self.args
    }

    pub fn into_args(self) -> Vec<String> {
        self.args
    }

    /// Command line as shown in logs and errors
    pub fn display(&self) -> String {
        std::iter::once("docker")
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A `docker compose -p <project> ...` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeCommand {
    project: String,
    args: Vec<String>,
}

impl ComposeCommand {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn up_detached(project: &str) -> Self {
        Self::new(project).arg("up").arg("-d")
    }

    pub fn into_docker(self) -> DockerCommand {
        DockerCommand::new()
            .args(["compose", "-p"])
            .arg(self.project)
            .args(self.args)
    }
}

/// A one-off `docker run` container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSpec {
    pub image: String,
    pub remove: bool,
    pub name: Option<String>,
    pub platform: Option<String>,
    pub user: Option<String>,
    pub workdir: Option<String>,
    pub entrypoint: Option<String>,
    pub network: Option<String>,
    /// `source:target` pairs passed as `-v`
    pub volumes: Vec<(String, String)>,
    pub env: Vec<(String, String)>,
    pub args: Vec<String>,
}

impl RunSpec {
    /// Throwaway container removed on exit
    pub fn ephemeral(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            remove: true,
            ..Default::default()
        }
    }

    pub fn volume(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.volumes.push((source.into(), target.into()));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn workdir(mut self, workdir: impl Into<String>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }

    pub fn entrypoint(mut self, entrypoint: impl Into<String>) -> Self {
        self.entrypoint = Some(entrypoint.into());
        self
    }

    pub fn network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn to_args(&self) -> Vec<String> {
        let mut out = vec!["run".to_string()];
        if self.remove {
            out.push("--rm".to_string());
        }
        let flags = [
            ("--name", &self.name),
            ("--platform", &self.platform),
            ("--user", &self.user),
            ("--workdir", &self.workdir),
            ("--entrypoint", &self.entrypoint),
            ("--network", &self.network),
        ];
        for (flag, value) in flags {
            if let Some(value) = value {
                out.push(flag.to_string());
                out.push(value.clone());
            }
        }
        for (source, target) in &self.volumes {
            out.push("-v".to_string());
            out.push(format!("{source}:{target}"));
        }
        for (key, value) in &self.env {
            out.push("-e".to_string());
            out.push(format!("{key}={value}"));
        }
        out.push(self.image.clone());
        out.extend(self.args.iter().cloned());
        out
    }
}
