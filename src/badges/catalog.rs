//! Badge catalog loading and validation
//!
//! The catalog is checked once at load time: duplicate IDs, dangling
//! `badge_ref`s and reference cycles are all fatal, so evaluation can recurse
//! without depth guards.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use once_cell::sync::OnceCell;
use semver::Version;
use serde::Deserialize;

use super::definitions::Badge;
use crate::catalog_version::check_catalog_version;
use crate::error::{EngineError, Result};

/// Embedded built-in badge catalog (compile-time)
pub const BUILTIN_BADGES_TOML: &str = include_str!("../../assets/badges.toml");

#[derive(Debug, Deserialize)]
struct CatalogFile {
    version: String,
    #[serde(default)]
    badge: Vec<Badge>,
}

/// Validated, ordered badge catalog
#[derive(Debug, Clone)]
pub struct BadgeCatalog {
    version: Version,
    badges: Vec<Badge>,
    index: HashMap<String, usize>,
}

static BUILTIN: OnceCell<BadgeCatalog> = OnceCell::new();

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

impl BadgeCatalog {
    /// Build a catalog from entries, validating it
    pub fn new(version: Version, badges: Vec<Badge>) -> Result<Self> {
        let mut index = HashMap::with_capacity(badges.len());
        for (i, badge) in badges.iter().enumerate() {
            if index.insert(badge.id.clone(), i).is_some() {
                return Err(EngineError::DuplicateBadge(badge.id.clone()));
            }
        }

        let catalog = Self {
            version,
            badges,
            index,
        };
        catalog.check_references()?;
        catalog.check_acyclic()?;
        Ok(catalog)
    }

    /// Parse and validate catalog TOML
    pub fn parse(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)?;
        let version = check_catalog_version(&file.version)?;
        Self::new(version, file.badge)
    }

    /// Load and validate a catalog from disk
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read badge catalog: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid badge catalog: {}", path.display()))
    }

    /// The embedded catalog, parsed and validated on first use
    pub fn builtin() -> Result<&'static BadgeCatalog> {
        BUILTIN.get_or_try_init(|| Self::parse(BUILTIN_BADGES_TOML))
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Badges in catalog order
    pub fn badges(&self) -> &[Badge] {
        &self.badges
    }

    pub fn get(&self, id: &str) -> Option<&Badge> {
        self.index.get(id).map(|&i| &self.badges[i])
    }

    pub fn len(&self) -> usize {
        self.badges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.badges.is_empty()
    }

    fn check_references(&self) -> Result<()> {
        for badge in &self.badges {
            for target in badge.criteria.referenced_badges() {
                if !self.index.contains_key(target) {
                    return Err(EngineError::UnknownBadgeReference {
                        badge: badge.id.clone(),
                        missing: target.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Depth-first walk over `badge_ref` edges with a visited set
    fn check_acyclic(&self) -> Result<()> {
        let mut marks: HashMap<&str, Mark> = HashMap::new();
        let mut path: Vec<&str> = Vec::new();

        for badge in &self.badges {
            self.visit(&badge.id, &mut marks, &mut path)?;
        }
        Ok(())
    }

    fn visit<'a>(
        &'a self,
        id: &'a str,
        marks: &mut HashMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
    ) -> Result<()> {
        match marks.get(id) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                let start = path.iter().position(|p| *p == id).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].iter().map(|p| p.to_string()).collect();
                cycle.push(id.to_string());
                return Err(EngineError::InvalidCriteriaCycle { path: cycle });
            }
            None => {}
        }

        marks.insert(id, Mark::Visiting);
        path.push(id);

        if let Some(badge) = self.get(id) {
            for target in badge.criteria.referenced_badges() {
                self.visit(target, marks, path)?;
            }
        }

        path.pop();
        marks.insert(id, Mark::Done);
        Ok(())
    }
}
