//! Naming rules for configuration fields

use regex::Regex;
use std::sync::LazyLock;

static SERVER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][0-9a-z]{2,62}$").expect("valid server name pattern"));

static RESOURCE_GROUP_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-\w._()]+$").expect("valid resource group pattern"));

/// Analysis Services server names: 3-63 lower-case letters and digits,
/// starting with a letter
pub fn server_name(value: &str) -> Result<(), String> {
    if SERVER_NAME.is_match(value) {
        Ok(())
    } else {
        Err(format!(
            "{:?} must start with a lowercase letter, contain only lowercase letters and numbers, \
             and be between 3 and 63 characters long",
            value
        ))
    }
}

/// Resource group names: up to 90 word characters, dashes, dots and
/// parentheses, not ending in a dot
pub fn resource_group_name(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err("resource_group_name cannot be blank".to_string());
    }
    if value.chars().count() > 90 {
        return Err(format!(
            "resource_group_name {:?} may not exceed 90 characters",
            value
        ));
    }
    if !RESOURCE_GROUP_NAME.is_match(value) {
        return Err(format!(
            "resource_group_name {:?} may only contain alphanumeric characters, dash, \
             underscores, parentheses and periods",
            value
        ));
    }
    if value.ends_with('.') {
        return Err(format!(
            "resource_group_name {:?} cannot end with a period",
            value
        ));
    }
    Ok(())
}

pub fn not_empty(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} must not be empty", field))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_name() {
        assert!(server_name("reporting01").is_ok());
        assert!(server_name("abc").is_ok());
        assert!(server_name(&format!("a{}", "b".repeat(62))).is_ok());

        assert!(server_name("ab").is_err());
        assert!(server_name("1server").is_err());
        assert!(server_name("Reporting").is_err());
        assert!(server_name("report-ing").is_err());
        assert!(server_name(&format!("a{}", "b".repeat(63))).is_err());
    }

    #[test]
    fn test_resource_group_name() {
        assert!(resource_group_name("analytics-rg").is_ok());
        assert!(resource_group_name("rg_(prod).v2").is_ok());

        assert!(resource_group_name("").is_err());
        assert!(resource_group_name("rg.").is_err());
        assert!(resource_group_name("rg/child").is_err());
        assert!(resource_group_name(&"r".repeat(91)).is_err());
    }
}
