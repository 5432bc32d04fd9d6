use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

use pipfold_core::{Error, Result};
use tracing::{debug, info};

pub trait PackageQuery {
    fn freeze(&self) -> Result<String>;
    fn show(&self, names: &[String]) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pip {
    executable: PathBuf,
}

impl Pip {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn bin_dir(&self) -> Option<&Path> {
        self.executable.parent()
    }

    pub fn env_root(&self) -> Option<&Path> {
        self.bin_dir().and_then(Path::parent)
    }

    pub fn install<S: AsRef<OsStr>>(&self, args: &[S]) -> Result<()> {
        let mut command = Command::new(&self.executable);
        command.arg("install").args(args);
        self.run_inherited(command)
    }

    pub fn install_requirements(&self, requirements: &Path, no_deps: bool) -> Result<()> {
        let mut command = Command::new(&self.executable);
        command.arg("install");
        if no_deps {
            command.arg("--no-deps");
        }
        command.arg("-r").arg(requirements);
        self.run_inherited(command)
    }

    fn run_inherited(&self, mut command: Command) -> Result<()> {
        let command_line = render_command(&command);
        info!(command = %command_line, "running installer");
        let status = command.status().map_err(|source| Error::InstallerLaunch {
            command: command_line.clone(),
            source,
        })?;
        if !status.success() {
            return Err(Error::InstallerFailed {
                command: command_line,
                status: status.to_string(),
                stderr: String::new(),
            });
        }
        Ok(())
    }

    fn run_captured(&self, mut command: Command) -> Result<String> {
        let command_line = render_command(&command);
        debug!(command = %command_line, "querying installer");
        let output = command.output().map_err(|source| Error::InstallerLaunch {
            command: command_line.clone(),
            source,
        })?;
        if !output.status.success() {
            return Err(Error::InstallerFailed {
                command: command_line,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        String::from_utf8(output.stdout).map_err(|_| Error::NonUtf8Output {
            command: command_line,
        })
    }
}

impl PackageQuery for Pip {
    fn freeze(&self) -> Result<String> {
        let mut command = Command::new(&self.executable);
        command.arg("freeze");
        self.run_captured(command)
    }

    fn show(&self, names: &[String]) -> Result<String> {
        let mut command = Command::new(&self.executable);
        command.arg("show").args(names);
        self.run_captured(command)
    }
}

fn render_command(command: &Command) -> String {
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(|part| part.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}
