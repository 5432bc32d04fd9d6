use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use anyhow::{anyhow, Context, Result};
use pipfold_core::{split_requirement, DependencyGroup, DependencySpec, Manifest};
use pipfold_installer::{locate_or_create_pip, show_packages, Pip, PipLocator};
use pipfold_resolver::{lock_project, InstalledPackageIndex};
use tracing::info;

use crate::render::{format_list_lines, format_lock_summary, format_show_lines};

#[derive(Debug, Clone)]
pub(crate) struct PipSource {
    explicit: Option<PathBuf>,
    project_dir: PathBuf,
}

impl PipSource {
    pub(crate) fn new(explicit: Option<PathBuf>, project_dir: &Path) -> Self {
        Self {
            explicit,
            project_dir: project_dir.to_path_buf(),
        }
    }

    pub(crate) fn resolve(&self) -> Result<Pip> {
        if let Some(path) = &self.explicit {
            return Ok(Pip::new(path));
        }
        let pip = locate_or_create_pip(&PipLocator::from_env(&self.project_dir))
            .context("failed to locate or create the project environment")?;
        info!(pip = %pip.executable().display(), "using installer");
        Ok(pip)
    }
}

pub(crate) fn run_install(
    manifest_path: &Path,
    pip: &PipSource,
    packages: &[String],
    dev: bool,
    save: bool,
) -> Result<()> {
    if packages.is_empty() {
        if save {
            println!("No packages were supplied to save.");
        }
        let manifest = Manifest::load(manifest_path)?;
        return install_manifest(&manifest, &pip.resolve()?, dev);
    }

    let requests = if save {
        Some(parse_save_requests(packages)?)
    } else {
        None
    };

    pip.resolve()?
        .install(packages)
        .context("package installation failed")?;
    if let Some(requests) = requests {
        let group = if dev {
            DependencyGroup::Development
        } else {
            DependencyGroup::Default
        };
        record_requests(manifest_path, requests, group)?;
        println!(
            "Saved {} package(s) to [{}] in {}",
            packages.len(),
            group.manifest_key(),
            manifest_path.display()
        );
    }
    Ok(())
}

fn install_manifest(manifest: &Manifest, pip: &Pip, dev: bool) -> Result<()> {
    let args = manifest_install_args(manifest, dev);
    if args.is_empty() {
        println!("Nothing to install.");
        return Ok(());
    }
    pip.install(&args).context("manifest installation failed")
}

pub(crate) fn manifest_install_args(manifest: &Manifest, dev: bool) -> Vec<String> {
    let mut args = manifest.pip_args(DependencyGroup::Default);
    if dev {
        args.extend(manifest.pip_args(DependencyGroup::Development));
    }
    args
}

pub(crate) fn save_packages(
    manifest_path: &Path,
    packages: &[String],
    group: DependencyGroup,
) -> Result<()> {
    record_requests(manifest_path, parse_save_requests(packages)?, group)
}

fn parse_save_requests(packages: &[String]) -> Result<Vec<(String, DependencySpec)>> {
    packages
        .iter()
        .map(|package| {
            let (name, constraint) = split_requirement(package).ok_or_else(|| {
                anyhow!("cannot record '{package}' in the manifest: expected name[constraint]")
            })?;
            Ok((name.to_string(), DependencySpec::from_constraint(constraint)))
        })
        .collect()
}

fn record_requests(
    manifest_path: &Path,
    requests: Vec<(String, DependencySpec)>,
    group: DependencyGroup,
) -> Result<()> {
    let mut manifest = Manifest::load(manifest_path)?;
    for (name, spec) in requests {
        manifest.insert(group, &name, spec);
    }
    manifest
        .save(manifest_path)
        .with_context(|| format!("failed to update {}", manifest_path.display()))
}

pub(crate) fn run_lock(manifest_path: &Path, pip: &PipSource, no_install: bool) -> Result<()> {
    let manifest = Manifest::load(manifest_path)?;
    let pip = pip.resolve()?;
    if !no_install {
        install_manifest(&manifest, &pip, true)?;
    }

    let report = lock_project(manifest_path, &pip)
        .context("lock failed; no lock files were written")?;
    for line in format_lock_summary(&report) {
        println!("{line}");
    }
    Ok(())
}

pub(crate) fn run_sync(project_dir: &Path, pip: &PipSource, dev: bool) -> Result<()> {
    let mut groups = vec![DependencyGroup::Default];
    if dev {
        groups.push(DependencyGroup::Development);
    }

    let mut lock_files = Vec::with_capacity(groups.len());
    for group in groups {
        let path = project_dir.join(group.lock_file_name());
        if !path.exists() {
            return Err(anyhow!(
                "{} does not exist; run `pipfold lock` first",
                path.display()
            ));
        }
        lock_files.push(path);
    }

    let pip = pip.resolve()?;
    for path in lock_files {
        pip.install_requirements(&path, true)
            .with_context(|| format!("failed to sync {}", path.display()))?;
    }
    Ok(())
}

pub(crate) fn run_show(pip: &PipSource, packages: &[String]) -> Result<()> {
    let records = show_packages(&pip.resolve()?, packages)?;
    for line in format_show_lines(&records) {
        println!("{line}");
    }
    Ok(())
}

pub(crate) fn run_list(pip: &PipSource) -> Result<()> {
    let index = InstalledPackageIndex::build(&pip.resolve()?)?;
    for line in format_list_lines(&index) {
        println!("{line}");
    }
    Ok(())
}

pub(crate) fn shell_program() -> String {
    std::env::var("SHELL")
        .ok()
        .filter(|shell| !shell.is_empty())
        .unwrap_or_else(|| "/bin/sh".to_string())
}

pub(crate) fn activation_env(
    pip: &Pip,
    current_path: Option<OsString>,
) -> Result<Vec<(OsString, OsString)>> {
    let bin_dir = pip.bin_dir().ok_or_else(|| {
        anyhow!(
            "installer {} has no parent directory",
            pip.executable().display()
        )
    })?;
    let env_root = pip
        .env_root()
        .ok_or_else(|| anyhow!("environment of {} has no root", pip.executable().display()))?;

    let mut search_path = vec![bin_dir.to_path_buf()];
    if let Some(current) = current_path {
        search_path.extend(std::env::split_paths(&current));
    }
    let path = std::env::join_paths(search_path).context("cannot build activated PATH")?;

    Ok(vec![
        (OsString::from("VIRTUAL_ENV"), env_root.as_os_str().to_os_string()),
        (OsString::from("PATH"), path),
    ])
}

pub(crate) fn run_in_env(pip: &Pip, program: &str, args: &[String]) -> Result<ExitCode> {
    let mut command = Command::new(program);
    command
        .args(args)
        .envs(activation_env(pip, std::env::var_os("PATH"))?)
        .env_remove("PYTHONHOME")
        .env_remove("__PYVENV_LAUNCHER__");

    info!(program, "running in activated environment");
    let status = command
        .status()
        .with_context(|| format!("failed to launch {program}"))?;
    Ok(match status.code() {
        Some(0) => ExitCode::SUCCESS,
        Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        None => ExitCode::FAILURE,
    })
}
