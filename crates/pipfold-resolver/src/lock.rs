use std::path::{Path, PathBuf};

use pipfold_core::{DependencyGroup, Manifest, Result};
use pipfold_installer::PackageQuery;
use tracing::info;

use crate::closure::{resolve_closure, ResolvedSet, Whitelist};
use crate::index::InstalledPackageIndex;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockPlan {
    default: ResolvedSet,
    development: ResolvedSet,
}

impl LockPlan {
    pub fn resolve(
        manifest: &Manifest,
        index: &InstalledPackageIndex,
        whitelist: &Whitelist,
    ) -> Result<Self> {
        let default = resolve_closure(
            manifest.root_names(DependencyGroup::Default),
            index,
            whitelist,
        )?;
        info!(packages = default.len(), "resolved default closure");

        let development = resolve_closure(
            manifest.root_names(DependencyGroup::Development),
            index,
            whitelist,
        )?;
        info!(packages = development.len(), "resolved development closure");

        Ok(Self {
            default,
            development,
        })
    }

    pub fn group(&self, group: DependencyGroup) -> &ResolvedSet {
        match group {
            DependencyGroup::Default => &self.default,
            DependencyGroup::Development => &self.development,
        }
    }

    pub fn write(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(DependencyGroup::ALL.len());
        for group in DependencyGroup::ALL {
            let path = dir.join(group.lock_file_name());
            self.group(group).write_lock(&path)?;
            written.push(path);
        }
        Ok(written)
    }
}

#[derive(Debug, Clone)]
pub struct LockReport {
    pub plan: LockPlan,
    pub written: Vec<PathBuf>,
}

pub fn lock_directory(manifest_path: &Path) -> &Path {
    match manifest_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

pub fn lock_project(manifest_path: &Path, query: &impl PackageQuery) -> Result<LockReport> {
    let manifest = Manifest::load(manifest_path)?;
    let index = InstalledPackageIndex::build(query)?;
    info!(packages = index.len(), "indexed environment");

    let plan = LockPlan::resolve(&manifest, &index, &Whitelist::default())?;
    let written = plan.write(lock_directory(manifest_path))?;
    Ok(LockReport { plan, written })
}
