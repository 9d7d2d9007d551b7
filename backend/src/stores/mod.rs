//! Store registry.
//!
//! An ascending list of uppercase store codes. Rows reference codes by value
//! and may keep a code that has since left the registry.

use crate::error::{RegistryResult, StoreRegistryError};
use crate::models::TableRow;
use crate::persistence::normalize_store_codes;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreRegistry {
    codes: Vec<String>,
}

fn in_use(rows: &[TableRow], code: &str) -> bool {
    rows.iter().any(|row| row.from == code || row.to == code)
}

fn normalize(name: &str) -> RegistryResult<String> {
    let code = name.trim().to_uppercase();
    if code.is_empty() {
        return Err(StoreRegistryError::EmptyName);
    }
    Ok(code)
}

impl StoreRegistry {
    pub fn new<S: AsRef<str>>(codes: &[S]) -> Self {
        Self {
            codes: normalize_store_codes(codes),
        }
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.binary_search_by(|c| c.as_str().cmp(code)).is_ok()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Add a store; returns the normalized code.
    pub fn add(&mut self, name: &str) -> RegistryResult<String> {
        let code = normalize(name)?;
        match self.codes.binary_search(&code) {
            Ok(_) => Err(StoreRegistryError::AlreadyExists(code)),
            Err(pos) => {
                self.codes.insert(pos, code.clone());
                Ok(code)
            }
        }
    }

    /// Remove a store no row references.
    pub fn remove(&mut self, code: &str, rows: &[TableRow]) -> RegistryResult<()> {
        let pos = self
            .codes
            .binary_search_by(|c| c.as_str().cmp(code))
            .map_err(|_| StoreRegistryError::NotFound(code.to_string()))?;
        if in_use(rows, code) {
            return Err(StoreRegistryError::InUse(code.to_string()));
        }
        self.codes.remove(pos);
        Ok(())
    }

    /// Rename a store no row references; returns the normalized new code.
    pub fn rename(&mut self, old: &str, new: &str, rows: &[TableRow]) -> RegistryResult<String> {
        let code = normalize(new)?;
        if !self.contains(old) {
            return Err(StoreRegistryError::NotFound(old.to_string()));
        }
        if code == old {
            return Ok(code);
        }
        if self.contains(&code) {
            return Err(StoreRegistryError::AlreadyExists(code));
        }
        if in_use(rows, old) {
            return Err(StoreRegistryError::InUse(old.to_string()));
        }

        self.codes.retain(|c| c != old);
        self.codes.push(code.clone());
        self.codes.sort();
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> StoreRegistry {
        StoreRegistry::new(&["BR", "AL", "CW"])
    }

    fn row_from(code: &str) -> TableRow {
        let mut row = TableRow::new(1, "X1");
        row.from = code.into();
        row
    }

    #[test]
    fn test_add_normalizes_and_sorts() {
        let mut stores = registry();
        assert_eq!(stores.add("  aa ").unwrap(), "AA");
        assert_eq!(stores.codes(), &["AA", "AL", "BR", "CW"]);
    }

    #[test]
    fn test_add_refusals() {
        let mut stores = registry();
        assert_eq!(stores.add("   "), Err(StoreRegistryError::EmptyName));
        assert_eq!(stores.add("al"), Err(StoreRegistryError::AlreadyExists("AL".into())));
        assert_eq!(stores.len(), 3);
    }

    #[test]
    fn test_remove_in_use_refused() {
        let mut stores = registry();
        let rows = vec![row_from("BR")];

        assert_eq!(stores.remove("BR", &rows), Err(StoreRegistryError::InUse("BR".into())));
        stores.remove("AL", &rows).unwrap();
        assert!(!stores.contains("AL"));
        assert_eq!(stores.remove("AL", &rows), Err(StoreRegistryError::NotFound("AL".into())));
    }

    #[test]
    fn test_rename() {
        let mut stores = registry();
        let rows = vec![row_from("BR")];

        assert_eq!(stores.rename("AL", "zz", &rows).unwrap(), "ZZ");
        assert_eq!(stores.codes(), &["BR", "CW", "ZZ"]);

        assert_eq!(stores.rename("CW", "cw", &rows).unwrap(), "CW");
        assert_eq!(
            stores.rename("CW", "BR", &rows),
            Err(StoreRegistryError::AlreadyExists("BR".into()))
        );
        assert_eq!(
            stores.rename("BR", "QQ", &rows),
            Err(StoreRegistryError::InUse("BR".into()))
        );
        assert_eq!(stores.rename("CW", "", &rows), Err(StoreRegistryError::EmptyName));
    }

    #[test]
    fn test_orphaned_references_tolerated() {
        let stores = registry();
        let rows = vec![row_from("GONE")];
        assert!(!stores.contains(&rows[0].from));
    }
}
