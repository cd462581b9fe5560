//! Column catalogs: where a stream's column list comes from.

use std::collections::HashMap;
use ti_common::{ColumnSchema, Error, Result, StreamId, TableName};
use ti_config::CatalogBundle;

/// Read-only source of stream column schemas.
///
/// Implementations must return the same schema for a stream for the
/// duration of one ingestion call.
pub trait ColumnCatalog {
    /// Ordered columns of a stream; unknown streams fail with `UnknownStream`.
    fn get_schema(&self, stream: &StreamId) -> Result<ColumnSchema>;

    /// Table a stream's rows land in.
    fn table_name(&self, stream: &StreamId) -> Result<TableName> {
        Ok(TableName::for_stream(stream))
    }
}

fn unknown_stream(stream: &StreamId) -> Error {
    Error::UnknownStream {
        stream: stream.to_string(),
    }
}

/// Catalog held in memory, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    streams: HashMap<StreamId, (Option<TableName>, ColumnSchema)>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stream whose table name is derived from its id.
    pub fn with_stream(mut self, stream: impl Into<StreamId>, schema: ColumnSchema) -> Self {
        self.streams.insert(stream.into(), (None, schema));
        self
    }

    /// Add a stream landing in an explicit table.
    pub fn with_table(
        mut self,
        stream: impl Into<StreamId>,
        table: TableName,
        schema: ColumnSchema,
    ) -> Self {
        self.streams.insert(stream.into(), (Some(table), schema));
        self
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

impl ColumnCatalog for InMemoryCatalog {
    fn get_schema(&self, stream: &StreamId) -> Result<ColumnSchema> {
        self.streams
            .get(stream)
            .map(|(_, schema)| schema.clone())
            .ok_or_else(|| unknown_stream(stream))
    }

    fn table_name(&self, stream: &StreamId) -> Result<TableName> {
        let (table, _) = self.streams.get(stream).ok_or_else(|| unknown_stream(stream))?;
        Ok(table
            .clone()
            .unwrap_or_else(|| TableName::for_stream(stream)))
    }
}

impl ColumnCatalog for CatalogBundle {
    fn get_schema(&self, stream: &StreamId) -> Result<ColumnSchema> {
        self.stream(stream)
            .map(|def| def.columns.clone())
            .ok_or_else(|| unknown_stream(stream))
    }

    fn table_name(&self, stream: &StreamId) -> Result<TableName> {
        self.stream(stream)
            .map(|def| def.table_name())
            .ok_or_else(|| unknown_stream(stream))
    }
}
