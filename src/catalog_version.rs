//! Catalog version compatibility
//!
//! Static catalogs (badges, curriculum) carry a semver `version`. Only the
//! major version is checked: minor/patch bumps add entries without changing
//! the schema.

use semver::Version;

use crate::error::{EngineError, Result};

/// Major catalog schema version understood by this build
pub const SUPPORTED_CATALOG_MAJOR: u64 = 1;

/// Parse and check a catalog version string
pub fn check_catalog_version(raw: &str) -> Result<Version> {
    let version = Version::parse(raw.trim())?;
    if version.major != SUPPORTED_CATALOG_MAJOR {
        return Err(EngineError::UnsupportedCatalogVersion {
            found: version.to_string(),
            supported: format!("{}.x", SUPPORTED_CATALOG_MAJOR),
        });
    }
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_same_major() {
        assert_eq!(check_catalog_version("1.4.0").unwrap().minor, 4);
    }

    #[test]
    fn test_rejects_other_major() {
        assert!(matches!(
            check_catalog_version("2.0.0"),
            Err(EngineError::UnsupportedCatalogVersion { .. })
        ));
        assert!(matches!(
            check_catalog_version("one"),
            Err(EngineError::CatalogVersion(_))
        ));
    }
}
