use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::package::InstalledPackage;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct LockEntry {
    pub name: String,
    pub version: String,
}

impl fmt::Display for LockEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=={}", self.name, self.version)
    }
}

pub fn render_lock<'a, I>(packages: I) -> String
where
    I: IntoIterator<Item = &'a InstalledPackage>,
{
    let mut lines = packages
        .into_iter()
        .map(|package| package.lock_entry().to_string())
        .collect::<Vec<_>>();
    lines.sort();
    lines.join("\n")
}

pub fn write_lock<'a, I>(packages: I, destination: &Path) -> Result<()>
where
    I: IntoIterator<Item = &'a InstalledPackage>,
{
    let contents = render_lock(packages);
    let staging = staging_path(destination);

    if let Err(err) = write_flushed(&staging, contents.as_bytes()) {
        let _ = fs::remove_file(&staging);
        return Err(err);
    }
    if let Err(source) = fs::rename(&staging, destination) {
        let _ = fs::remove_file(&staging);
        return Err(Error::io(destination, source));
    }

    debug!(path = %destination.display(), bytes = contents.len(), "wrote lock file");
    Ok(())
}

fn write_flushed(path: &Path, bytes: &[u8]) -> Result<()> {
    let file = File::create(path).map_err(|source| Error::io(path, source))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(bytes)
        .map_err(|source| Error::io(path, source))?;
    writer.flush().map_err(|source| Error::io(path, source))?;
    Ok(())
}

fn staging_path(destination: &Path) -> PathBuf {
    let file_name = destination
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "lock".to_string());
    destination.with_file_name(format!(".{file_name}.tmp"))
}
