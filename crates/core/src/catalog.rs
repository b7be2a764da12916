//! Tile catalog - the ordered list of tile definitions a round draws from

use crate::error::ConfigError;
use triple_tray_types::TileTypeId;

const BUILTIN_NAMES: [&str; 14] = [
    "apple",
    "banana",
    "cherry",
    "grape",
    "lemon",
    "melon",
    "orange",
    "peach",
    "pear",
    "plum",
    "kiwi",
    "mango",
    "coconut",
    "strawberry",
];

/// One tile type and its display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileDefinition {
    pub id: TileTypeId,
    pub name: String,
}

/// Immutable, ordered catalog of tile definitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileCatalog {
    definitions: Vec<TileDefinition>,
}

impl TileCatalog {
    /// Catalog with the fourteen built-in fruit tiles
    pub fn builtin() -> Self {
        Self::from_names(BUILTIN_NAMES)
    }

    /// Create a catalog, assigning ids in iteration order
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let definitions = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| TileDefinition {
                id: TileTypeId(i as u16),
                name: name.into(),
            })
            .collect();
        Self { definitions }
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn definitions(&self) -> &[TileDefinition] {
        &self.definitions
    }

    /// Display name for a tile type
    pub fn name(&self, id: TileTypeId) -> Option<&str> {
        self.definitions
            .get(usize::from(id.0))
            .map(|def| def.name.as_str())
    }

    /// The first `limit` tile types in catalog order
    pub fn types(&self, limit: usize) -> Result<Vec<TileTypeId>, ConfigError> {
        if self.definitions.is_empty() || limit == 0 {
            return Err(ConfigError::EmptyCatalog);
        }
        if limit > self.definitions.len() {
            return Err(ConfigError::NotEnoughTypes {
                needed: limit,
                available: self.definitions.len(),
            });
        }
        Ok(self.definitions[..limit].iter().map(|def| def.id).collect())
    }
}

impl Default for TileCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_fourteen_types() {
        let catalog = TileCatalog::builtin();
        assert_eq!(catalog.len(), 14);
        assert_eq!(catalog.name(TileTypeId(0)), Some("apple"));
        assert_eq!(catalog.name(TileTypeId(14)), None);
    }

    #[test]
    fn test_types_limit() {
        let catalog = TileCatalog::from_names(["a", "b", "c"]);
        assert_eq!(
            catalog.types(2).unwrap(),
            vec![TileTypeId(0), TileTypeId(1)]
        );
        assert_eq!(
            catalog.types(4),
            Err(ConfigError::NotEnoughTypes {
                needed: 4,
                available: 3
            })
        );
    }

    #[test]
    fn test_empty_catalog_is_an_error() {
        let catalog = TileCatalog::from_names(Vec::<String>::new());
        assert_eq!(catalog.types(1), Err(ConfigError::EmptyCatalog));
    }
}
