//! Logical type registry.
//!
//! Maps a logical type name from stream metadata to the wire type its field
//! is encoded with, the storage category of its column, and the value that
//! stands in for an omitted field. The registry is built once and shared
//! read-only (typically behind an `Arc`) by every ingestion call.

use std::collections::BTreeMap;
use ti_common::{Error, LogicalType, Result, StorageType, Value};
use ti_wire::{Timestamp, WireType};

/// Everything the ingester needs to know about one logical type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeInfo {
    pub logical: LogicalType,
    pub wire: WireType,
    pub storage: StorageType,
    /// Value synthesized for a field omitted on the wire.
    pub default: Value,
}

impl TypeInfo {
    /// Canonical facts for a logical type.
    pub fn of(logical: LogicalType) -> Self {
        TypeInfo {
            logical,
            wire: wire_type(logical),
            storage: storage_type(logical),
            default: default_value(logical),
        }
    }
}

fn wire_type(logical: LogicalType) -> WireType {
    match logical {
        LogicalType::Bool
        | LogicalType::Int32
        | LogicalType::Int64
        | LogicalType::Uint32
        | LogicalType::Uint64
        | LogicalType::Sint32
        | LogicalType::Sint64 => WireType::Varint,
        LogicalType::Fixed64 | LogicalType::Sfixed64 | LogicalType::Double => WireType::Fixed64,
        LogicalType::Fixed32 | LogicalType::Sfixed32 | LogicalType::Float => WireType::Fixed32,
        LogicalType::String | LogicalType::Timestamp => WireType::LengthDelimited,
    }
}

fn storage_type(logical: LogicalType) -> StorageType {
    match logical {
        LogicalType::Bool | LogicalType::Int32 | LogicalType::Sint32 | LogicalType::Sfixed32 => {
            StorageType::Int32
        }
        LogicalType::Int64
        | LogicalType::Sint64
        | LogicalType::Sfixed64
        | LogicalType::Uint32
        | LogicalType::Fixed32
        | LogicalType::Uint64
        | LogicalType::Fixed64 => StorageType::Int64,
        LogicalType::Float => StorageType::Float32,
        LogicalType::Double => StorageType::Float64,
        LogicalType::String => StorageType::Text,
        LogicalType::Timestamp => StorageType::DateTime,
    }
}

/// Zero value in the variant the decoder produces for the type.
fn default_value(logical: LogicalType) -> Value {
    match logical {
        LogicalType::Bool => Value::Bool(false),
        LogicalType::Int32 | LogicalType::Sint32 | LogicalType::Sfixed32 => Value::Int32(0),
        LogicalType::Int64 | LogicalType::Sint64 | LogicalType::Sfixed64 => Value::Int64(0),
        LogicalType::Uint32 | LogicalType::Fixed32 => Value::Uint32(0),
        LogicalType::Uint64 | LogicalType::Fixed64 => Value::Uint64(0),
        LogicalType::Float => Value::Float32(0.0),
        LogicalType::Double => Value::Float64(0.0),
        LogicalType::String => Value::Text(String::new()),
        LogicalType::Timestamp => Value::Timestamp(Timestamp::EPOCH),
    }
}

/// Immutable name → [`TypeInfo`] table.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: BTreeMap<String, TypeInfo>,
}

impl TypeRegistry {
    /// Registry with every canonical logical type name.
    pub fn standard() -> Self {
        Self::builder().standard_types().build()
    }

    /// Start from an empty registry.
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    /// Look up a type name; unknown names fail with `InvalidType`.
    pub fn lookup(&self, name: &str) -> Result<&TypeInfo> {
        self.types.get(name).ok_or_else(|| Error::invalid_type(name))
    }

    pub fn wire_type_of(&self, name: &str) -> Result<WireType> {
        self.lookup(name).map(|info| info.wire)
    }

    pub fn storage_type_of(&self, name: &str) -> Result<StorageType> {
        self.lookup(name).map(|info| info.storage)
    }

    pub fn default_value_of(&self, name: &str) -> Result<Value> {
        self.lookup(name).map(|info| info.default.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registered names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypeInfo)> {
        self.types.iter().map(|(name, info)| (name.as_str(), info))
    }
}

/// Builder for alternate registries.
#[derive(Debug, Default)]
pub struct TypeRegistryBuilder {
    types: BTreeMap<String, TypeInfo>,
}

impl TypeRegistryBuilder {
    /// Register every canonical name.
    pub fn standard_types(mut self) -> Self {
        for logical in LogicalType::ALL {
            self.types.insert(logical.name().to_string(), TypeInfo::of(logical));
        }
        self
    }

    /// Register `name` as another spelling of `logical`.
    pub fn alias(mut self, name: impl Into<String>, logical: LogicalType) -> Self {
        self.types.insert(name.into(), TypeInfo::of(logical));
        self
    }

    pub fn remove(mut self, name: &str) -> Self {
        self.types.remove(name);
        self
    }

    pub fn build(self) -> TypeRegistry {
        TypeRegistry { types: self.types }
    }
}
