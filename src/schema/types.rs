//! Schema type definitions
//!
//! A schema is an immutable, closed description of a record's shape.
//! Declared types:
//! - null, boolean, int, long, float, double, string, bytes
//! - enum: named finite set of string symbols
//! - fixed: named fixed-length byte sequence
//! - array, map: homogeneous containers (map keys are strings)
//! - record: nested record schema
//! - union: ordered set of 2+ alternatives, at most one of which is null

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use super::errors::{SchemaError, SchemaResult};

/// Kind tag of a schema node, without its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    String,
    Bytes,
    Enum,
    Fixed,
    Array,
    Map,
    Record,
    Union,
}

impl SchemaKind {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            SchemaKind::Null => "null",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Int => "int",
            SchemaKind::Long => "long",
            SchemaKind::Float => "float",
            SchemaKind::Double => "double",
            SchemaKind::String => "string",
            SchemaKind::Bytes => "bytes",
            SchemaKind::Enum => "enum",
            SchemaKind::Fixed => "fixed",
            SchemaKind::Array => "array",
            SchemaKind::Map => "map",
            SchemaKind::Record => "record",
            SchemaKind::Union => "union",
        }
    }

    /// Structured kinds are stored as serialized blobs.
    pub fn is_structured(&self) -> bool {
        matches!(self, SchemaKind::Array | SchemaKind::Map | SchemaKind::Record)
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Enum declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumSchema {
    pub name: String,
    pub symbols: Vec<String>,
}

impl EnumSchema {
    /// Returns the ordinal of `symbol`, if declared.
    pub fn ordinal(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }
}

/// Fixed-length byte sequence declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedSchema {
    pub name: String,
    pub size: usize,
}

/// A declared type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Schema {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    String,
    Bytes,
    Enum(EnumSchema),
    Fixed(FixedSchema),
    Array {
        /// Element type (boxed to allow recursive types)
        items: Box<Schema>,
    },
    Map {
        /// Value type; keys are always strings
        values: Box<Schema>,
    },
    Record(Arc<RecordSchema>),
    Union {
        branches: Vec<Schema>,
    },
}

impl Schema {
    /// Create an array schema
    pub fn array(items: Schema) -> Self {
        Schema::Array {
            items: Box::new(items),
        }
    }

    /// Create a map schema
    pub fn map(values: Schema) -> Self {
        Schema::Map {
            values: Box::new(values),
        }
    }

    /// Create an enum schema
    pub fn enumeration(name: impl Into<String>, symbols: &[&str]) -> Self {
        Schema::Enum(EnumSchema {
            name: name.into(),
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Create a fixed schema
    pub fn fixed(name: impl Into<String>, size: usize) -> Self {
        Schema::Fixed(FixedSchema {
            name: name.into(),
            size,
        })
    }

    /// Create a nested record schema
    pub fn record(schema: RecordSchema) -> Self {
        Schema::Record(Arc::new(schema))
    }

    /// Create a union schema
    pub fn union(branches: Vec<Schema>) -> Self {
        Schema::Union { branches }
    }

    /// The `["null", inner]` optional-value shape
    pub fn optional(inner: Schema) -> Self {
        Schema::Union {
            branches: vec![Schema::Null, inner],
        }
    }

    /// Returns the kind tag
    pub fn kind(&self) -> SchemaKind {
        match self {
            Schema::Null => SchemaKind::Null,
            Schema::Boolean => SchemaKind::Boolean,
            Schema::Int => SchemaKind::Int,
            Schema::Long => SchemaKind::Long,
            Schema::Float => SchemaKind::Float,
            Schema::Double => SchemaKind::Double,
            Schema::String => SchemaKind::String,
            Schema::Bytes => SchemaKind::Bytes,
            Schema::Enum(_) => SchemaKind::Enum,
            Schema::Fixed(_) => SchemaKind::Fixed,
            Schema::Array { .. } => SchemaKind::Array,
            Schema::Map { .. } => SchemaKind::Map,
            Schema::Record(_) => SchemaKind::Record,
            Schema::Union { .. } => SchemaKind::Union,
        }
    }

    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        self.kind().type_name()
    }

    /// Checks the structural rules every schema must satisfy.
    ///
    /// Record schemas are checked when they are constructed, so this does
    /// not descend into them again.
    pub fn validate(&self) -> SchemaResult<()> {
        match self {
            Schema::Union { branches } => {
                if branches.len() < 2 {
                    return Err(SchemaError::UnionArity(branches.len()));
                }
                let nulls = branches
                    .iter()
                    .filter(|b| b.kind() == SchemaKind::Null)
                    .count();
                if nulls > 1 {
                    return Err(SchemaError::DuplicateNullBranch);
                }
                for branch in branches {
                    if branch.kind() == SchemaKind::Union {
                        return Err(SchemaError::NestedUnion);
                    }
                    branch.validate()?;
                }
                Ok(())
            }
            Schema::Enum(e) => {
                if e.symbols.is_empty() {
                    return Err(SchemaError::EmptyEnum(e.name.clone()));
                }
                let mut seen = HashSet::new();
                for symbol in &e.symbols {
                    if !seen.insert(symbol.as_str()) {
                        return Err(SchemaError::DuplicateSymbol {
                            name: e.name.clone(),
                            symbol: symbol.clone(),
                        });
                    }
                }
                Ok(())
            }
            Schema::Array { items } => items.validate(),
            Schema::Map { values } => values.validate(),
            _ => Ok(()),
        }
    }

    /// Canonical textual form, used as the structural identity of a schema.
    ///
    /// Two schemas with the same canonical form decode the same bytes the
    /// same way. Field defaults are not part of the canonical form.
    pub fn canonical_form(&self) -> String {
        self.canonical_value().to_string()
    }

    fn canonical_value(&self) -> Value {
        match self {
            Schema::Enum(e) => json!({"type": "enum", "name": e.name, "symbols": e.symbols}),
            Schema::Fixed(f) => json!({"type": "fixed", "name": f.name, "size": f.size}),
            Schema::Array { items } => json!({"type": "array", "items": items.canonical_value()}),
            Schema::Map { values } => json!({"type": "map", "values": values.canonical_value()}),
            Schema::Record(r) => {
                let fields: Vec<Value> = r
                    .fields()
                    .iter()
                    .map(|f| json!({"name": f.name(), "type": f.schema().canonical_value()}))
                    .collect();
                json!({"type": "record", "name": r.name(), "fields": fields})
            }
            Schema::Union { branches } => {
                Value::Array(branches.iter().map(Schema::canonical_value).collect())
            }
            primitive => Value::String(primitive.type_name().to_string()),
        }
    }
}

/// Field declaration, before a position is assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub schema: Schema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FieldDef {
    /// Create a field declaration with no default
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            default: None,
        }
    }

    /// Attach a default value
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// A field of a record schema.
///
/// The position is stable for the lifetime of the schema and addresses the
/// field's value slot and dirty bit in a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    position: usize,
    schema: Schema,
    default: Option<Value>,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Record schema: an ordered sequence of named fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RecordSchemaDef", into = "RecordSchemaDef")]
pub struct RecordSchema {
    name: String,
    fields: Vec<Field>,
    /// Field name -> position
    index: HashMap<String, usize>,
}

impl RecordSchema {
    /// Create a record schema, assigning positions in declaration order.
    pub fn new(name: impl Into<String>, defs: Vec<FieldDef>) -> SchemaResult<Self> {
        let name = name.into();
        let mut fields = Vec::with_capacity(defs.len());
        let mut index = HashMap::with_capacity(defs.len());

        for (position, def) in defs.into_iter().enumerate() {
            def.schema.validate()?;
            if index.insert(def.name.clone(), position).is_some() {
                return Err(SchemaError::DuplicateField {
                    record: name,
                    field: def.name,
                });
            }
            fields.push(Field {
                name: def.name,
                position,
                schema: def.schema,
                default: def.default,
            });
        }

        Ok(Self {
            name,
            fields,
            index,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in position order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.index.get(name).map(|&pos| &self.fields[pos])
    }

    /// Position of the named field
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// All field names, in position order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

impl PartialEq for RecordSchema {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.fields == other.fields
    }
}

#[derive(Serialize, Deserialize)]
struct RecordSchemaDef {
    name: String,
    fields: Vec<FieldDef>,
}

impl TryFrom<RecordSchemaDef> for RecordSchema {
    type Error = SchemaError;

    fn try_from(def: RecordSchemaDef) -> SchemaResult<Self> {
        RecordSchema::new(def.name, def.fields)
    }
}

impl From<RecordSchema> for RecordSchemaDef {
    fn from(schema: RecordSchema) -> Self {
        Self {
            name: schema.name,
            fields: schema
                .fields
                .into_iter()
                .map(|f| FieldDef {
                    name: f.name,
                    schema: f.schema,
                    default: f.default,
                })
                .collect(),
        }
    }
}
