use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use pipfold_core::{Error, Result};
use tracing::{debug, info, warn};

use crate::pip::Pip;

const ENV_DIR_NAMES: [&str; 2] = ["env", "venv"];
const CREATED_ENV_DIR: &str = "env";

#[cfg(windows)]
const PIP_RELATIVE_PATH: &str = "Scripts/pip.exe";
#[cfg(not(windows))]
const PIP_RELATIVE_PATH: &str = "bin/pip";

#[derive(Debug, Clone)]
pub struct PipLocator {
    project_dir: PathBuf,
    virtual_env: Option<PathBuf>,
    probe_pipenv: bool,
}

impl PipLocator {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            virtual_env: None,
            probe_pipenv: true,
        }
    }

    pub fn from_env(project_dir: impl Into<PathBuf>) -> Self {
        let virtual_env = std::env::var_os("VIRTUAL_ENV")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Self::new(project_dir).with_virtual_env(virtual_env)
    }

    pub fn with_virtual_env(mut self, virtual_env: Option<PathBuf>) -> Self {
        self.virtual_env = virtual_env;
        self
    }

    pub fn without_pipenv(mut self) -> Self {
        self.probe_pipenv = false;
        self
    }

    pub fn locate(&self) -> Option<PathBuf> {
        if let Some(env) = &self.virtual_env {
            debug!(env = %env.display(), "using active virtual environment");
            return Some(env.join(PIP_RELATIVE_PATH));
        }

        for dir_name in ENV_DIR_NAMES {
            let candidate = self.project_dir.join(dir_name).join(PIP_RELATIVE_PATH);
            if candidate.exists() {
                debug!(pip = %candidate.display(), "found project environment");
                return Some(candidate);
            }
        }

        if self.probe_pipenv {
            return pipenv_env_root().map(|root| root.join(PIP_RELATIVE_PATH));
        }
        None
    }

    pub fn create(&self) -> Result<PathBuf> {
        let env_dir = self.project_dir.join(CREATED_ENV_DIR);
        let mut guard = PartialEnvGuard::new(&env_dir);

        let mut command = Command::new("virtualenv");
        command
            .arg(CREATED_ENV_DIR)
            .arg("--python")
            .arg("python3")
            .current_dir(&self.project_dir);
        info!(env = %env_dir.display(), "creating virtual environment");

        let status = command.status().map_err(|source| Error::InstallerLaunch {
            command: "virtualenv env --python python3".to_string(),
            source,
        })?;
        if !status.success() {
            return Err(Error::InstallerFailed {
                command: "virtualenv env --python python3".to_string(),
                status: status.to_string(),
                stderr: String::new(),
            });
        }

        guard.keep();
        Ok(env_dir.join(PIP_RELATIVE_PATH))
    }
}

pub fn locate_or_create_pip(locator: &PipLocator) -> Result<Pip> {
    match locator.locate() {
        Some(path) => Ok(Pip::new(path)),
        None => locator.create().map(Pip::new),
    }
}

fn pipenv_env_root() -> Option<PathBuf> {
    let output = Command::new("pipenv").arg("--venv").output().ok()?;
    if !output.status.success() {
        return None;
    }
    let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!root.is_empty()).then(|| PathBuf::from(root))
}

struct PartialEnvGuard<'a> {
    dir: &'a Path,
    existed: bool,
    armed: bool,
}

impl<'a> PartialEnvGuard<'a> {
    fn new(dir: &'a Path) -> Self {
        Self {
            dir,
            existed: dir.exists(),
            armed: true,
        }
    }

    fn keep(&mut self) {
        self.armed = false;
    }
}

impl Drop for PartialEnvGuard<'_> {
    fn drop(&mut self) {
        if !self.armed || self.existed || !self.dir.exists() {
            return;
        }
        if let Err(err) = fs::remove_dir_all(self.dir) {
            warn!(env = %self.dir.display(), error = %err, "failed to remove partial environment");
        }
    }
}
