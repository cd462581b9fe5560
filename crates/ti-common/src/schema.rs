//! Catalog format versioning and compatibility.

/// Current version of the catalog bundle format.
///
/// Follows semver: MAJOR.MINOR.PATCH
/// - MAJOR: Breaking changes (field removals, type changes)
/// - MINOR: Additive changes (new optional fields)
/// - PATCH: Bug fixes, documentation
pub const CATALOG_FORMAT_VERSION: &str = "1.0.0";

/// Check if a catalog format version can be read by this build.
pub fn is_compatible(version: &str) -> bool {
    match (major(CATALOG_FORMAT_VERSION), major(version)) {
        (Some(current), Some(other)) => current == other,
        _ => false,
    }
}

fn major(version: &str) -> Option<u32> {
    version.split('.').next()?.parse::<u32>().ok()
}
