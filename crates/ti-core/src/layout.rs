//! Resolved table layouts.
//!
//! A [`TableLayout`] is a stream's column schema after every type name has
//! been looked up in the registry. It is built once per ingestion call and
//! carries the table identity handed to row sinks.

use serde::Serialize;
use ti_common::{ColumnSchema, Error, LogicalType, Record, Result, StorageType, StreamId, TableName, Value};
use ti_telemetry::ColumnSpec;
use ti_wire::WireType;

use crate::registry::TypeRegistry;

/// One column with its type facts resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedColumn {
    pub name: String,
    /// Type name as written in the catalog (may be an alias).
    pub type_name: String,
    pub logical: LogicalType,
    pub wire: WireType,
    pub storage: StorageType,
    pub default: Value,
}

/// Table identity plus resolved columns, in wire tag order.
#[derive(Debug, Clone, PartialEq)]
pub struct TableLayout {
    stream: StreamId,
    table: TableName,
    columns: Vec<ResolvedColumn>,
    fingerprint: String,
}

impl TableLayout {
    /// Resolve every column of `schema`; the first unknown type name fails
    /// with `InvalidType`.
    pub fn resolve(
        stream: StreamId,
        table: TableName,
        schema: &ColumnSchema,
        registry: &TypeRegistry,
    ) -> Result<Self> {
        let columns = schema
            .iter()
            .map(|col| {
                let info = registry.lookup(&col.type_name)?;
                Ok(ResolvedColumn {
                    name: col.name.clone(),
                    type_name: col.type_name.clone(),
                    logical: info.logical,
                    wire: info.wire,
                    storage: info.storage,
                    default: info.default.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(TableLayout {
            stream,
            table,
            columns,
            fingerprint: schema.fingerprint(),
        })
    }

    pub fn stream(&self) -> &StreamId {
        &self.stream
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    pub fn columns(&self) -> &[ResolvedColumn] {
        &self.columns
    }

    /// Column count; also the highest legal tag.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// SHA-256 fingerprint of the source column schema.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Column addressed by a 1-based wire tag.
    pub fn column_for_tag(&self, tag: u64) -> Option<&ResolvedColumn> {
        let index = usize::try_from(tag).ok()?.checked_sub(1)?;
        self.columns.get(index)
    }

    /// Row of defaults; what an empty record payload decodes to.
    pub fn default_row(&self) -> Record {
        self.columns.iter().map(|c| c.default.clone()).collect()
    }

    /// Output column specs for columnar sinks.
    pub fn column_specs(&self) -> Vec<ColumnSpec> {
        self.columns
            .iter()
            .map(|c| ColumnSpec::new(c.name.clone(), c.storage))
            .collect()
    }

    /// DDL for the table this layout lands in.
    pub fn create_table_sql(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("  {} {} NOT NULL", quote_ident(&c.name), c.storage.sql_type()))
            .collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
            quote_ident(self.table.as_str()),
            columns.join(",\n")
        )
    }

    /// Single-row `INSERT` for `row`, which must have one value per column.
    pub fn insert_sql(&self, row: &[Value]) -> Result<String> {
        if row.len() != self.columns.len() {
            return Err(Error::SchemaValidation(format!(
                "row has {} values, table {} has {} columns",
                row.len(),
                self.table,
                self.columns.len()
            )));
        }
        let names: Vec<String> = self.columns.iter().map(|c| quote_ident(&c.name)).collect();
        let values: Vec<String> = row.iter().map(Value::to_sql_literal).collect();
        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(self.table.as_str()),
            names.join(", "),
            values.join(", ")
        ))
    }

    /// Serializable description for the `schema` command.
    pub fn describe(&self) -> LayoutDescription {
        LayoutDescription {
            stream: self.stream.to_string(),
            table: self.table.to_string(),
            fingerprint: self.fingerprint.clone(),
            columns: self
                .columns
                .iter()
                .enumerate()
                .map(|(i, c)| ColumnDescription {
                    tag: i as u64 + 1,
                    name: c.name.clone(),
                    logical: c.logical,
                    wire: c.wire.name(),
                    storage: c.storage.sql_type(),
                    default: c.default.to_sql_literal(),
                })
                .collect(),
        }
    }
}

/// JSON view of a layout.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutDescription {
    pub stream: String,
    pub table: String,
    pub fingerprint: String,
    pub columns: Vec<ColumnDescription>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnDescription {
    pub tag: u64,
    pub name: String,
    pub logical: LogicalType,
    pub wire: &'static str,
    pub storage: &'static str,
    pub default: String,
}

/// Backtick-quote an identifier, doubling embedded backticks.
fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ti_wire::Timestamp;

    fn layout() -> TableLayout {
        TableLayout::resolve(
            StreamId::new("host.cpu"),
            TableName::parse("cpu").unwrap(),
            &ColumnSchema::from_pairs([("host", "string"), ("load", "double"), ("at", "timestamp")]),
            &TypeRegistry::standard(),
        )
        .unwrap()
    }

    #[test]
    fn resolves_columns_in_order() {
        let layout = layout();
        assert_eq!(layout.len(), 3);
        assert_eq!(layout.column_for_tag(2).unwrap().name, "load");
        assert_eq!(layout.column_for_tag(2).unwrap().wire, WireType::Fixed64);
        assert!(layout.column_for_tag(0).is_none());
        assert!(layout.column_for_tag(4).is_none());
        assert_eq!(layout.fingerprint().len(), 64);
    }

    #[test]
    fn unknown_type_fails_resolution() {
        let err = TableLayout::resolve(
            StreamId::new("s"),
            TableName::parse("s").unwrap(),
            &ColumnSchema::from_pairs([("a", "int32"), ("b", "decimal")]),
            &TypeRegistry::standard(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidType { ref name } if name == "decimal"));
    }

    #[test]
    fn default_row_matches_columns() {
        assert_eq!(
            layout().default_row(),
            vec![
                Value::Text(String::new()),
                Value::Float64(0.0),
                Value::Timestamp(Timestamp::EPOCH),
            ]
        );
    }

    #[test]
    fn create_table_sql() {
        assert_eq!(
            layout().create_table_sql(),
            "CREATE TABLE IF NOT EXISTS `cpu` (\n  `host` VARCHAR(255) NOT NULL,\n  `load` DOUBLE NOT NULL,\n  `at` DATETIME(6) NOT NULL\n)"
        );
    }

    #[test]
    fn insert_sql_renders_literals() {
        let sql = layout()
            .insert_sql(&[
                Value::Text("db'1".into()),
                Value::Float64(0.5),
                Value::Timestamp(Timestamp::new(60, 0)),
            ])
            .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO `cpu` (`host`, `load`, `at`) VALUES ('db''1', 0.5, '1970-01-01 00:01:00.000000')"
        );
        assert!(layout().insert_sql(&[Value::Int32(1)]).is_err());
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quote_ident("a`b"), "`a``b`");
    }

    #[test]
    fn describe_numbers_tags_from_one() {
        let desc = layout().describe();
        let tags: Vec<u64> = desc.columns.iter().map(|c| c.tag).collect();
        assert_eq!(tags, vec![1, 2, 3]);
        assert_eq!(desc.columns[2].storage, "DATETIME(6)");
    }
}
