mod error;
mod lockfile;
mod manifest;
mod name;
mod package;

pub use error::{Error, Result};
pub use lockfile::{render_lock, write_lock, LockEntry};
pub use manifest::{DependencyGroup, DependencySpec, Manifest};
pub use name::{normalize_package_name, split_requirement};
pub use package::InstalledPackage;

#[cfg(test)]
mod tests;
