//! Column schemas as delivered by a column catalog.
//!
//! Tags on the wire are 1-based positions in a [`ColumnSchema`]: tag `t`
//! refers to `columns[t - 1]`.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Column name reserved for the target table in JSON row output.
pub const RESERVED_TABLE_COLUMN: &str = "_table";

/// One column: its name and the logical type name from stream metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        ColumnDef {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Ordered column list for one stream.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnSchema {
    columns: Vec<ColumnDef>,
}

impl ColumnSchema {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        ColumnSchema { columns }
    }

    /// Build from `(name, type)` pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        ColumnSchema {
            columns: pairs
                .into_iter()
                .map(|(name, ty)| ColumnDef::new(name, ty))
                .collect(),
        }
    }

    /// Number of columns; also the highest legal tag.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnDef> {
        self.columns.iter()
    }

    /// Column addressed by a wire tag, if the tag is in `1..=len`.
    pub fn column_for_tag(&self, tag: u64) -> Option<&ColumnDef> {
        let index = usize::try_from(tag).ok()?.checked_sub(1)?;
        self.columns.get(index)
    }

    /// SHA-256 hex digest over the ordered `(name, type)` list.
    ///
    /// Two schemas share a fingerprint exactly when they decode the same
    /// wire data into the same row shape.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for col in &self.columns {
            hasher.update((col.name.len() as u64).to_le_bytes());
            hasher.update(col.name.as_bytes());
            hasher.update((col.type_name.len() as u64).to_le_bytes());
            hasher.update(col.type_name.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

impl<'a> IntoIterator for &'a ColumnSchema {
    type Item = &'a ColumnDef;
    type IntoIter = std::slice::Iter<'a, ColumnDef>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}
