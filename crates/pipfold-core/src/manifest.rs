use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::name::normalize_package_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyGroup {
    Default,
    Development,
}

impl DependencyGroup {
    pub const ALL: [Self; 2] = [Self::Default, Self::Development];

    pub fn manifest_key(self) -> &'static str {
        match self {
            Self::Default => "packages",
            Self::Development => "dev-packages",
        }
    }

    pub fn lock_file_name(self) -> &'static str {
        match self {
            Self::Default => "requirements.txt",
            Self::Development => "requirements-dev.txt",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSpec", into = "RawSpec")]
pub enum DependencySpec {
    Any,
    Pinned(String),
    Vcs {
        git: String,
        reference: Option<String>,
        extras: Vec<String>,
    },
    Versioned {
        version: String,
        extras: Vec<String>,
    },
}

impl DependencySpec {
    pub fn pip_args(&self, name: &str) -> Vec<String> {
        match self {
            Self::Any => vec![name.to_string()],
            Self::Pinned(range) => vec![format!("{name}{range}")],
            Self::Vcs {
                git,
                reference,
                extras,
            } => {
                let reference = reference
                    .as_deref()
                    .map(|r| format!("@{r}"))
                    .unwrap_or_default();
                vec![
                    "-e".to_string(),
                    format!("git+{git}{reference}#egg={name}{}", render_extras(extras)),
                ]
            }
            Self::Versioned { version, extras } => {
                let version = if version.trim() == "*" {
                    ""
                } else {
                    version.as_str()
                };
                vec![format!("{name}{}{version}", render_extras(extras))]
            }
        }
    }

    pub fn from_constraint(constraint: Option<&str>) -> Self {
        match constraint.map(str::trim) {
            None | Some("") | Some("*") => Self::Any,
            Some(range) => Self::Pinned(range.to_string()),
        }
    }
}

fn render_extras(extras: &[String]) -> String {
    if extras.is_empty() {
        String::new()
    } else {
        format!("[{}]", extras.join(","))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawSpec {
    Text(String),
    Table(RawTable),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawTable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    git: Option<String>,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    extras: Vec<String>,
}

impl TryFrom<RawSpec> for DependencySpec {
    type Error = String;

    fn try_from(raw: RawSpec) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawSpec::Text(text) => Ok(Self::from_constraint(Some(&text))),
            RawSpec::Table(table) => {
                if let Some(git) = table.git {
                    return Ok(Self::Vcs {
                        git,
                        reference: table.reference,
                        extras: table.extras,
                    });
                }
                match table.version {
                    Some(version) => Ok(Self::Versioned {
                        version,
                        extras: table.extras,
                    }),
                    None => Err("dependency table needs a `git` or `version` key".to_string()),
                }
            }
        }
    }
}

impl From<DependencySpec> for RawSpec {
    fn from(spec: DependencySpec) -> Self {
        match spec {
            DependencySpec::Any => Self::Text("*".to_string()),
            DependencySpec::Pinned(range) => Self::Text(range),
            DependencySpec::Vcs {
                git,
                reference,
                extras,
            } => Self::Table(RawTable {
                git: Some(git),
                reference,
                extras,
                ..RawTable::default()
            }),
            DependencySpec::Versioned { version, extras } => Self::Table(RawTable {
                version: Some(version),
                extras,
                ..RawTable::default()
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    // Field order is save order: foreign tables land ahead of the groups.
    #[serde(flatten)]
    pub other: IndexMap<String, toml::Value>,
    #[serde(default)]
    pub packages: IndexMap<String, DependencySpec>,
    #[serde(default, rename = "dev-packages")]
    pub dev_packages: IndexMap<String, DependencySpec>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let input = fs::read_to_string(path).map_err(|err| Error::ManifestUnreadable {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        let manifest = Self::parse(&input, path)?;
        debug!(
            path = %path.display(),
            packages = manifest.packages.len(),
            dev_packages = manifest.dev_packages.len(),
            "loaded manifest"
        );
        Ok(manifest)
    }

    pub fn parse(input: &str, path: &Path) -> Result<Self> {
        let unreadable = |reason: String| Error::ManifestUnreadable {
            path: path.to_path_buf(),
            reason,
        };

        let manifest: Self = toml::from_str(input).map_err(|err| unreadable(err.to_string()))?;
        for group in DependencyGroup::ALL {
            let mut seen = IndexMap::new();
            for name in manifest.group(group).keys() {
                if let Some(previous) = seen.insert(normalize_package_name(name), name) {
                    return Err(unreadable(format!(
                        "[{}] lists '{previous}' and '{name}', which name the same package",
                        group.manifest_key()
                    )));
                }
            }
        }
        Ok(manifest)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let rendered = toml::to_string(self).map_err(|err| Error::ManifestUnreadable {
            path: path.to_path_buf(),
            reason: format!("cannot serialize manifest: {err}"),
        })?;
        fs::write(path, rendered).map_err(|source| Error::io(path, source))
    }

    pub fn group(&self, group: DependencyGroup) -> &IndexMap<String, DependencySpec> {
        match group {
            DependencyGroup::Default => &self.packages,
            DependencyGroup::Development => &self.dev_packages,
        }
    }

    pub fn group_mut(&mut self, group: DependencyGroup) -> &mut IndexMap<String, DependencySpec> {
        match group {
            DependencyGroup::Default => &mut self.packages,
            DependencyGroup::Development => &mut self.dev_packages,
        }
    }

    pub fn root_names(&self, group: DependencyGroup) -> impl Iterator<Item = &str> {
        self.group(group).keys().map(String::as_str)
    }

    pub fn insert(&mut self, group: DependencyGroup, name: &str, spec: DependencySpec) {
        let normalized = normalize_package_name(name);
        let entries = self.group_mut(group);
        let existing = entries
            .keys()
            .position(|key| normalize_package_name(key) == normalized);
        match existing.and_then(|index| entries.get_index_mut(index)) {
            Some((_, value)) => *value = spec,
            None => {
                entries.insert(name.to_string(), spec);
            }
        }
    }

    pub fn pip_args(&self, group: DependencyGroup) -> Vec<String> {
        self.group(group)
            .iter()
            .flat_map(|(name, spec)| spec.pip_args(name))
            .collect()
    }
}
