use std::collections::{BTreeMap, BTreeSet};

use pipfold_core::{normalize_package_name, Error, InstalledPackage, Result};
use pipfold_installer::{list_installed, show_packages, PackageQuery};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstalledPackageIndex {
    packages: BTreeMap<String, InstalledPackage>,
}

impl InstalledPackageIndex {
    pub fn build(query: &impl PackageQuery) -> Result<Self> {
        let installed = list_installed(query)?;

        let mut seen = BTreeSet::new();
        let mut requested = Vec::with_capacity(installed.len());
        let mut install_lines = Vec::with_capacity(installed.len());
        for entry in installed {
            let name = normalize_package_name(&entry.name);
            if !seen.insert(name.clone()) {
                warn!(package = %entry.name, "package listed twice by the installer, keeping the first");
                continue;
            }
            requested.push(name);
            install_lines.push(entry.line);
        }

        let records = show_packages(query, &requested)?;
        let mut packages = BTreeMap::new();
        for ((name, install_line), record) in requested.into_iter().zip(install_lines).zip(records) {
            let version = record
                .version
                .filter(|version| !version.is_empty())
                .ok_or_else(|| Error::MalformedMetadata {
                    package: record.name.clone(),
                    detail: "record has no Version header".to_string(),
                })?;
            packages.insert(
                name,
                InstalledPackage {
                    name: record.name,
                    version,
                    requires: record.requires,
                    required_by: record.required_by,
                    install_line,
                },
            );
        }

        debug!(count = packages.len(), "indexed installed packages");
        Ok(Self { packages })
    }

    pub fn from_packages(packages: impl IntoIterator<Item = InstalledPackage>) -> Self {
        Self {
            packages: packages
                .into_iter()
                .map(|package| (package.normalized_name(), package))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&InstalledPackage> {
        self.packages.get(&normalize_package_name(name))
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &InstalledPackage)> {
        self.packages
            .iter()
            .map(|(name, package)| (name.as_str(), package))
    }
}
