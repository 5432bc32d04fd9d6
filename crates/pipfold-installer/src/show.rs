use pipfold_core::{normalize_package_name, Error, Result};
use tracing::debug;

use crate::pip::PackageQuery;

const RECORD_SEPARATOR: &str = "---";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    pub name: String,
    pub version: Option<String>,
    pub requires: Vec<String>,
    pub required_by: Vec<String>,
    pub headers: Vec<(String, String)>,
}

impl PackageMetadata {
    pub fn header(&self, key: &str) -> Option<&str> {
        find_header(&self.headers, key)
    }
}

pub fn show_packages(query: &impl PackageQuery, names: &[String]) -> Result<Vec<PackageMetadata>> {
    if names.is_empty() {
        return Ok(Vec::new());
    }
    let output = query.show(names)?;
    let records = parse_show_output(&output)?;
    verify_alignment(names, &records)?;
    debug!(count = records.len(), "fetched package metadata");
    Ok(records)
}

pub fn verify_alignment(requested: &[String], records: &[PackageMetadata]) -> Result<()> {
    if requested.len() != records.len() {
        return Err(Error::MetadataMismatch {
            detail: format!(
                "requested {} package(s) but received {} record(s)",
                requested.len(),
                records.len()
            ),
        });
    }
    for (position, (name, record)) in requested.iter().zip(records).enumerate() {
        let expected = normalize_package_name(name);
        let received = normalize_package_name(&record.name);
        if expected != received {
            return Err(Error::MetadataMismatch {
                detail: format!(
                    "record {position} describes '{received}' where '{expected}' was requested"
                ),
            });
        }
    }
    Ok(())
}

pub fn parse_show_output(output: &str) -> Result<Vec<PackageMetadata>> {
    let mut records = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    for line in output.lines() {
        if line.trim_end() == RECORD_SEPARATOR {
            records.push(parse_record(&block)?);
            block.clear();
        } else {
            block.push(line);
        }
    }
    if block.iter().any(|line| !line.trim().is_empty()) {
        records.push(parse_record(&block)?);
    }

    Ok(records)
}

fn parse_record(lines: &[&str]) -> Result<PackageMetadata> {
    let mut headers: Vec<(String, String)> = Vec::new();

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let folded = line.starts_with([' ', '\t']);
        match line.split_once(':') {
            Some((key, value)) if !folded && is_header_key(key) => {
                headers.push((key.to_string(), value.trim().to_string()));
            }
            _ => match headers.last_mut() {
                Some((_, value)) => {
                    if !value.is_empty() {
                        value.push('\n');
                    }
                    value.push_str(line.trim());
                }
                None => {
                    return Err(Error::MalformedMetadata {
                        package: "<unknown>".to_string(),
                        detail: format!("record starts with a non-header line: {line}"),
                    })
                }
            },
        }
    }

    let name = find_header(&headers, "Name")
        .filter(|name| !name.is_empty())
        .ok_or_else(|| Error::MalformedMetadata {
            package: "<unknown>".to_string(),
            detail: "record has no Name header".to_string(),
        })?
        .to_string();
    let requires = find_header(&headers, "Requires").ok_or_else(|| Error::MalformedMetadata {
        package: name.clone(),
        detail: "record has no Requires header".to_string(),
    })?;

    Ok(PackageMetadata {
        version: find_header(&headers, "Version").map(str::to_string),
        requires: split_names(requires),
        required_by: find_header(&headers, "Required-By")
            .map(split_names)
            .unwrap_or_default(),
        name,
        headers,
    })
}

fn is_header_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
}

fn find_header<'a>(headers: &'a [(String, String)], key: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
        .map(|(_, value)| value.as_str())
}

fn split_names(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
