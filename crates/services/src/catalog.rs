use std::collections::BTreeMap;
use std::path::Path;

use names_core::model::{Name, NameNumber};
use rand::{Rng, rng};

use crate::error::CatalogError;

/// Read-only source of name records.
///
/// Implementations are never empty once constructed.
pub trait NameCatalog: Send + Sync {
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` when the number is not in the catalog.
    fn by_number(&self, number: NameNumber) -> Result<Name, CatalogError>;

    fn random(&self) -> Name;

    /// Every name, ordered by number.
    fn all(&self) -> Vec<Name>;
}

/// Catalog held entirely in memory, typically loaded from a JSON file.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    names: BTreeMap<NameNumber, Name>,
    ordered: Vec<Name>,
}

impl StaticCatalog {
    /// # Errors
    ///
    /// Returns `CatalogError::Empty` for an empty list and
    /// `CatalogError::Duplicate` when a number repeats.
    pub fn from_names(names: Vec<Name>) -> Result<Self, CatalogError> {
        if names.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut by_number = BTreeMap::new();
        for name in names {
            let number = name.number;
            if by_number.insert(number, name).is_some() {
                return Err(CatalogError::Duplicate(number));
            }
        }
        let ordered = by_number.values().cloned().collect();
        Ok(Self {
            names: by_number,
            ordered,
        })
    }

    /// Parse a JSON array of name records.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` for malformed JSON or out-of-range numbers.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let names: Vec<Name> = serde_json::from_str(raw)?;
        Self::from_names(names)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Io` if the file cannot be read, otherwise as
    /// [`StaticCatalog::from_json`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl NameCatalog for StaticCatalog {
    fn by_number(&self, number: NameNumber) -> Result<Name, CatalogError> {
        self.names
            .get(&number)
            .cloned()
            .ok_or(CatalogError::NotFound(number))
    }

    fn random(&self) -> Name {
        // Construction rejects empty catalogs, so the range is never empty.
        let index = rng().random_range(0..self.ordered.len());
        self.ordered[index].clone()
    }

    fn all(&self) -> Vec<Name> {
        self.ordered.clone()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Small catalog with synthetic entries `1..=count`.
    pub(crate) fn sample_catalog(count: u8) -> StaticCatalog {
        let names = (1..=count)
            .map(|n| {
                Name::new(
                    NameNumber::new(n).unwrap(),
                    format!("arabic-{n}"),
                    format!("Name {n}"),
                    format!("Meaning {n}"),
                )
            })
            .collect();
        StaticCatalog::from_names(names).unwrap()
    }

    #[test]
    fn by_number_finds_entry() {
        let catalog = sample_catalog(5);
        let name = catalog.by_number(NameNumber::new(3).unwrap()).unwrap();
        assert_eq!(name.transliteration, "Name 3");
    }

    #[test]
    fn unknown_number_is_not_found() {
        let catalog = sample_catalog(5);
        let err = catalog.by_number(NameNumber::new(50).unwrap()).unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(n) if n.value() == 50));
    }

    #[test]
    fn random_returns_a_catalog_entry() {
        let catalog = sample_catalog(5);
        for _ in 0..20 {
            let name = catalog.random();
            assert!(catalog.by_number(name.number).is_ok());
        }
    }

    #[test]
    fn all_is_ordered() {
        let catalog = sample_catalog(4);
        let numbers: Vec<u8> = catalog.all().iter().map(|n| n.number.value()).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[test]
    fn rejects_empty_and_duplicates() {
        assert!(matches!(
            StaticCatalog::from_names(Vec::new()),
            Err(CatalogError::Empty)
        ));

        let one = Name::new(NameNumber::new(1).unwrap(), "a", "b", "c");
        let err = StaticCatalog::from_names(vec![one.clone(), one]).unwrap_err();
        assert!(matches!(err, CatalogError::Duplicate(_)));
    }

    #[test]
    fn parses_json() {
        let raw = r#"[
            {"number": 1, "arabic": "الرحمن", "transliteration": "Ar-Rahman", "meaning": "The Most Gracious"},
            {"number": 2, "arabic": "الرحيم", "transliteration": "Ar-Rahim", "meaning": "The Most Merciful"}
        ]"#;
        let catalog = StaticCatalog::from_json(raw).unwrap();
        assert_eq!(catalog.len(), 2);

        let bad = r#"[{"number": 100, "arabic": "", "transliteration": "", "meaning": ""}]"#;
        assert!(matches!(
            StaticCatalog::from_json(bad),
            Err(CatalogError::Parse(_))
        ));
    }
}
