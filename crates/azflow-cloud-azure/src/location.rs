//! Azure location normalization

/// Canonical form of an Azure location: lower-case with spaces removed
/// (`"West Europe"` -> `"westeurope"`).
pub fn normalize_location(location: &str) -> String {
    location.replace(' ', "").to_lowercase()
}
