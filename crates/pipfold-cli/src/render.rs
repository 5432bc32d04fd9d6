use pipfold_core::DependencyGroup;
use pipfold_installer::PackageMetadata;
use pipfold_resolver::{InstalledPackageIndex, LockReport};

pub(crate) fn format_show_lines(records: &[PackageMetadata]) -> Vec<String> {
    let mut lines = Vec::new();
    for (position, record) in records.iter().enumerate() {
        if position > 0 {
            lines.push(String::new());
        }
        lines.push(format!("Package: {}", record.name));
        lines.push(format!(
            "- version: {}",
            record.version.as_deref().unwrap_or("unknown")
        ));
        lines.push(format!("- requires: {}", join_or_none(&record.requires)));
        lines.push(format!(
            "- required by: {}",
            join_or_none(&record.required_by)
        ));
        if let Some(location) = record.header("Location") {
            lines.push(format!("- location: {location}"));
        }
    }
    lines
}

pub(crate) fn format_list_lines(index: &InstalledPackageIndex) -> Vec<String> {
    index
        .iter()
        .map(|(_, package)| {
            if package.is_editable() {
                format!("{} {} ({})", package.name, package.version, package.install_line)
            } else {
                format!("{} {}", package.name, package.version)
            }
        })
        .collect()
}

pub(crate) fn format_lock_summary(report: &LockReport) -> Vec<String> {
    DependencyGroup::ALL
        .iter()
        .zip(&report.written)
        .map(|(group, path)| {
            format!(
                "Locked {} package(s) from [{}] into {}",
                report.plan.group(*group).len(),
                group.manifest_key(),
                path.display()
            )
        })
        .collect()
}

fn join_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}
