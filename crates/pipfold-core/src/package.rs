use crate::lockfile::LockEntry;
use crate::name::normalize_package_name;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
    pub requires: Vec<String>,
    pub required_by: Vec<String>,
    pub install_line: String,
}

impl InstalledPackage {
    pub fn normalized_name(&self) -> String {
        normalize_package_name(&self.name)
    }

    pub fn is_editable(&self) -> bool {
        self.install_line.starts_with("-e")
    }

    pub fn lock_entry(&self) -> LockEntry {
        LockEntry {
            name: self.name.clone(),
            version: self.version.clone(),
        }
    }
}
