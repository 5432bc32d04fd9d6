use std::sync::LazyLock;

use regex::Regex;

static REQUIREMENT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9][A-Za-z0-9._-]*)([=<>!~^*][=<>!~]?[A-Za-z0-9.*+!_,<>=~-]*)?$")
        .expect("requirement grammar must compile")
});

pub fn normalize_package_name(name: &str) -> String {
    name.to_lowercase().replace('-', "_")
}

pub fn split_requirement(input: &str) -> Option<(&str, Option<&str>)> {
    let captures = REQUIREMENT_LINE.captures(input.trim())?;
    let name = captures.get(1)?.as_str();
    let constraint = captures.get(2).map(|m| m.as_str());
    Some((name, constraint))
}
