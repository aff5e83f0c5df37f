use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display};
use std::hash::Hash;

/// Types usable as row ids. The canonical key of an id is its `Display` form.
pub trait RowId: Clone + Eq + Hash + Display + Debug + Send + Sync + 'static {
    fn to_key(&self) -> String {
        self.to_string()
    }
}

impl<T: Clone + Eq + Hash + Display + Debug + Send + Sync + 'static> RowId for T {}

/// A persisted key must be non-empty and not only whitespace.
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Position of a row in a baked container, packed as 16 bits of sheet ordinal and 48 bits of row ordinal.
/// Ordering and equality compare the packed integer.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowKey(u64);

impl RowKey {
    pub const ROW_BITS: u32 = 48;
    pub const ROW_MASK: u64 = (1 << Self::ROW_BITS) - 1;
    pub const MAX_ROW: u64 = Self::ROW_MASK;

    pub fn new(sheet: u16, row: u64) -> Option<Self> {
        (row <= Self::MAX_ROW).then_some(RowKey(((sheet as u64) << Self::ROW_BITS) | row))
    }

    pub const fn from_packed(packed: u64) -> Self {
        RowKey(packed)
    }

    pub const fn packed(self) -> u64 {
        self.0
    }

    pub const fn sheet(self) -> u16 {
        (self.0 >> Self::ROW_BITS) as u16
    }

    pub const fn row(self) -> u64 {
        self.0 & Self::ROW_MASK
    }
}

impl Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.sheet(), self.row())
    }
}

impl Debug for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RowKey({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_sheet_and_row() {
        let key = RowKey::new(3, 42).unwrap();
        assert_eq!((key.sheet(), key.row()), (3, 42));
        assert_eq!(RowKey::from_packed(key.packed()), key);
        assert_eq!(key.to_string(), "3:42");
        assert_eq!(RowKey::new(1, RowKey::MAX_ROW + 1), None);
        let last = RowKey::new(u16::MAX, RowKey::MAX_ROW).unwrap();
        assert_eq!((last.sheet(), last.row()), (u16::MAX, RowKey::MAX_ROW));
    }

    #[test]
    fn orders_by_sheet_then_row() {
        let a = RowKey::new(0, 900).unwrap();
        let b = RowKey::new(1, 0).unwrap();
        let c = RowKey::new(1, 1).unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn keys_must_have_content() {
        assert!(is_valid_key("7"));
        assert!(!is_valid_key(" \t"));
        assert_eq!(12u32.to_key(), "12");
    }
}
