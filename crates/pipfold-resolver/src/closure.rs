use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use pipfold_core::{normalize_package_name, write_lock, Error, InstalledPackage, Result};

use crate::index::InstalledPackageIndex;

pub const PACKAGE_WHITELIST: [&str; 3] = ["setuptools", "pip", "wheel"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Whitelist {
    names: BTreeSet<String>,
}

impl Whitelist {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|name| normalize_package_name(name.as_ref()))
                .collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&normalize_package_name(name))
    }
}

impl Default for Whitelist {
    fn default() -> Self {
        Self::new(PACKAGE_WHITELIST)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSet {
    packages: BTreeMap<String, InstalledPackage>,
}

impl ResolvedSet {
    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(&normalize_package_name(name))
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

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    pub fn packages(&self) -> impl Iterator<Item = &InstalledPackage> {
        self.packages.values()
    }

    pub fn write_lock(&self, destination: &Path) -> Result<()> {
        write_lock(self.packages(), destination)
    }
}

pub fn resolve_closure<I, S>(
    roots: I,
    index: &InstalledPackageIndex,
    whitelist: &Whitelist,
) -> Result<ResolvedSet>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut resolved: BTreeMap<String, InstalledPackage> = BTreeMap::new();
    let mut pending: Vec<String> = roots
        .into_iter()
        .map(|root| root.as_ref().to_string())
        .collect();
    pending.reverse();

    while let Some(raw) = pending.pop() {
        let name = normalize_package_name(&raw);
        // `resolved` doubles as the visited set: a name is only expanded on
        // its first insertion, which is what terminates dependency cycles.
        if whitelist.contains(&name) || resolved.contains_key(&name) {
            continue;
        }
        let package = index
            .get(&name)
            .ok_or_else(|| Error::MissingDependency { name: raw.clone() })?;
        pending.extend(package.requires.iter().rev().cloned());
        resolved.insert(name, package.clone());
    }

    Ok(ResolvedSet { packages: resolved })
}
