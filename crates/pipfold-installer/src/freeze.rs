use pipfold_core::{split_requirement, Error, Result};
use tracing::debug;

use crate::pip::PackageQuery;

const EDITABLE_PREFIX: &str = "-e";
const EGG_FRAGMENT: &str = "#egg=";
const EDITABLE_COMMENT: &str = "# Editable";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreezeEntry {
    pub name: String,
    pub requirement: Option<String>,
    pub line: String,
}

pub fn list_installed(query: &impl PackageQuery) -> Result<Vec<FreezeEntry>> {
    let output = query.freeze()?;
    let entries = parse_freeze_output(&output)?;
    debug!(count = entries.len(), "listed installed packages");
    Ok(entries)
}

pub fn parse_freeze_output(output: &str) -> Result<Vec<FreezeEntry>> {
    let mut entries = Vec::new();
    // Editable installs without VCS metadata are announced by a comment that
    // carries the `name==version` the following `-e <path>` line lacks.
    let mut announced_editable: Option<String> = None;

    for raw in output.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with('#') {
            announced_editable = editable_comment_name(line);
            continue;
        }

        let announced = announced_editable.take();
        let entry = if let Some(target) = line.strip_prefix(EDITABLE_PREFIX) {
            let name = egg_name(target)
                .or(announced)
                .ok_or_else(|| unparseable(line))?;
            FreezeEntry {
                name,
                requirement: None,
                line: line.to_string(),
            }
        } else if let Some((name, _url)) = line.split_once(" @ ") {
            FreezeEntry {
                name: strip_extras(name.trim()).to_string(),
                requirement: None,
                line: line.to_string(),
            }
        } else {
            let (name, requirement) = split_requirement(line).ok_or_else(|| unparseable(line))?;
            FreezeEntry {
                name: name.to_string(),
                requirement: requirement.map(str::to_string),
                line: line.to_string(),
            }
        };
        entries.push(entry);
    }

    Ok(entries)
}

fn egg_name(target: &str) -> Option<String> {
    let (_, fragment) = target.split_once(EGG_FRAGMENT)?;
    let name = fragment
        .split(['&', ' ', '\t'])
        .next()
        .map(strip_extras)
        .unwrap_or_default();
    (!name.is_empty()).then(|| name.to_string())
}

fn editable_comment_name(line: &str) -> Option<String> {
    if !line.starts_with(EDITABLE_COMMENT) {
        return None;
    }
    let start = line.rfind('(')? + 1;
    let end = line.rfind(')')?;
    let (name, _) = split_requirement(line.get(start..end)?)?;
    Some(name.to_string())
}

fn strip_extras(name: &str) -> &str {
    name.split_once('[').map_or(name, |(bare, _)| bare)
}

fn unparseable(line: &str) -> Error {
    Error::UnparseableFreezeLine {
        line: line.to_string(),
    }
}
