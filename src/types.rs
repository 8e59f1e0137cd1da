// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Logic handling the intermediate representation of Avro values.

use crate::{
    AvroResult, Decimal, Duration,
    error::Details,
    schema::{
        DecimalSchema, EnumSchema, FixedSchema, Name, Namespace, RecordSchema, Schema, SchemaKind,
        UnionSchema,
    },
};
use serde_json::Value as JsonValue;
use std::{
    borrow::Borrow,
    collections::{BTreeMap, HashMap},
    str::FromStr,
};
use strum::EnumDiscriminants;
use uuid::Uuid;

/// Represents any valid Avro value.
///
/// More information about Avro values can be found in the
/// [Avro Specification](https://avro.apache.org/docs/++version++/specification/#schema-declaration)
#[derive(Clone, Debug, EnumDiscriminants, PartialEq)]
#[strum_discriminants(name(ValueKind))]
pub enum Value {
    /// A `null` Avro value.
    Null,
    /// A `boolean` Avro value.
    Boolean(bool),
    /// An `int` Avro value.
    Int(i32),
    /// A `long` Avro value.
    Long(i64),
    /// A `float` Avro value.
    Float(f32),
    /// A `double` Avro value.
    Double(f64),
    /// A `bytes` Avro value.
    Bytes(Vec<u8>),
    /// A `string` Avro value.
    String(String),
    /// A `fixed` Avro value.
    /// This variant holds the size of the fixed value and its content.
    Fixed(usize, Vec<u8>),
    /// An `enum` Avro value.
    ///
    /// An Enum is represented by a symbol and its position in the symbols
    /// list of its corresponding schema. This allows schema-less encoding,
    /// as well as schema resolution while reading values.
    Enum(u32, String),
    /// A `union` Avro value.
    ///
    /// A Union is represented by the value it holds and its position in the
    /// types list of its corresponding schema.
    Union(u32, Box<Value>),
    /// An `array` Avro value.
    Array(Vec<Value>),
    /// A `map` Avro value.
    Map(HashMap<String, Value>),
    /// A `record` Avro value.
    ///
    /// A Record is represented by a vector of (`<field name>`, `value`).
    /// This allows schema-less encoding.
    Record(Vec<(String, Value)>),
    /// A date value.
    ///
    /// Serialized and deserialized as `i32` directly. Can only be deserialized
    /// properly with a schema.
    Date(i32),
    /// A time-of-day value in milliseconds.
    TimeMillis(i32),
    /// A time-of-day value in microseconds.
    TimeMicros(i64),
    /// A timestamp value in milliseconds since the Unix epoch.
    TimestampMillis(i64),
    /// A timestamp value in microseconds since the Unix epoch.
    TimestampMicros(i64),
    /// An Avro Decimal value. Bytes are in big-endian order, per the Avro spec.
    Decimal(Decimal),
    /// A duration: an amount of time defined by months, days and milliseconds.
    Duration(Duration),
    /// A universally unique identifier, annotating a string.
    Uuid(Uuid),
}

macro_rules! to_value(
    ($type:ty, $variant_constructor:expr) => (
        impl From<$type> for Value {
            fn from(value: $type) -> Self {
                $variant_constructor(value)
            }
        }
    );
);

to_value!(bool, Value::Boolean);
to_value!(i32, Value::Int);
to_value!(i64, Value::Long);
to_value!(f32, Value::Float);
to_value!(f64, Value::Double);
to_value!(String, Value::String);
to_value!(Vec<u8>, Value::Bytes);
to_value!(Uuid, Value::Uuid);
to_value!(Decimal, Value::Decimal);
to_value!(Duration, Value::Duration);

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Self::Null
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_owned())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Self>,
{
    /// Convert an `Option` into a nullable-union value.
    ///
    /// The `None` branch is encoded as index 0, matching the common
    /// `["null", T]` declaration order.
    fn from(value: Option<T>) -> Self {
        match value {
            None => Self::Union(0, Box::new(Self::Null)),
            Some(v) => Self::Union(1, Box::new(v.into())),
        }
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(value: HashMap<String, Value>) -> Self {
        Self::Map(value)
    }
}

/// Utility interface to build `Value::Record` objects.
#[derive(Debug, Clone)]
pub struct Record<'a> {
    /// List of fields attached to the record object.
    pub fields: Vec<(String, Value)>,
    schema_lookup: &'a BTreeMap<String, usize>,
}

impl<'a> Record<'a> {
    /// Create a `Record` given a `Schema`.
    ///
    /// If the `Schema` is not a `Schema::Record` variant, `None` will be returned.
    pub fn new(schema: &Schema) -> Option<Record<'_>> {
        match *schema {
            Schema::Record(RecordSchema {
                fields: ref schema_fields,
                lookup: ref schema_lookup,
                ..
            }) => {
                let mut fields = Vec::with_capacity(schema_fields.len());
                for schema_field in schema_fields.iter() {
                    fields.push((schema_field.name.clone(), Value::Null));
                }

                Some(Record {
                    fields,
                    schema_lookup,
                })
            }
            _ => None,
        }
    }

    /// Put a compatible value (implementing the `ToAvro` trait) in the
    /// `Record` for a given `field` name.
    ///
    /// **NOTE** Only ensure that the field name is present in the `Schema`
    /// given when creating this `Record`. Does not perform any schema
    /// validation.
    pub fn put<V>(&mut self, field: &str, value: V)
    where
        V: Into<Value>,
    {
        if let Some(&position) = self.schema_lookup.get(field) {
            self.fields[position].1 = value.into()
        }
    }
}

impl<'a> From<Record<'a>> for Value {
    fn from(value: Record<'a>) -> Self {
        Self::Record(value.fields)
    }
}

impl TryFrom<JsonValue> for Value {
    type Error = crate::Error;

    fn try_from(value: JsonValue) -> AvroResult<Self> {
        match value {
            JsonValue::Null => Ok(Self::Null),
            JsonValue::Bool(b) => Ok(Self::Boolean(b)),
            JsonValue::Number(ref n) if n.is_i64() => {
                Ok(Self::Long(n.as_i64().ok_or_else(|| {
                    Details::GetI64FromJson(n.clone())
                })?))
            }
            JsonValue::Number(ref n) if n.is_u64() => {
                let n = n.as_u64().unwrap();
                match i64::try_from(n) {
                    Ok(n) => Ok(Self::Long(n)),
                    Err(_) => Err(Details::GetU64FromJson(
                        serde_json::Number::from(n),
                    )
                    .into()),
                }
            }
            JsonValue::Number(n) => Ok(Self::Double(n.as_f64().unwrap_or(f64::NAN))),
            JsonValue::String(s) => Ok(Self::String(s)),
            JsonValue::Array(items) => items
                .into_iter()
                .map(Self::try_from)
                .collect::<AvroResult<Vec<_>>>()
                .map(Self::Array),
            JsonValue::Object(items) => items
                .into_iter()
                .map(|(key, value)| Self::try_from(value).map(|v| (key, v)))
                .collect::<AvroResult<HashMap<_, _>>>()
                .map(Self::Map),
        }
    }
}

impl Value {
    /// Validate the value against the given [Schema](../schema/enum.Schema.html).
    ///
    /// See the [Avro specification](https://avro.apache.org/docs/++version++/specification)
    /// for the full set of rules of schema validation.
    pub fn validate(&self, schema: &Schema) -> bool {
        match crate::schema::ResolvedSchema::try_from(schema) {
            Ok(rs) => self
                .validate_internal(schema, rs.get_names(), &schema.namespace())
                .is_none(),
            Err(_) => false,
        }
    }

    /// Validate the value against the given schema, returning the reason of
    /// the first mismatch when the value does not conform.
    pub(crate) fn validate_internal<S: Borrow<Schema>>(
        &self,
        schema: &Schema,
        names: &HashMap<Name, S>,
        enclosing_namespace: &Namespace,
    ) -> Option<String> {
        match (self, schema) {
            (_, Schema::Ref { name }) => {
                let name = name.fully_qualified_name(enclosing_namespace);
                match names.get(&name) {
                    Some(resolved) => {
                        self.validate_internal(resolved.borrow(), names, &name.namespace)
                    }
                    None => Some(format!("Unresolved schema reference: {name:?}")),
                }
            }
            (&Value::Null, &Schema::Null) => None,
            (&Value::Boolean(_), &Schema::Boolean) => None,
            (&Value::Int(_), &Schema::Int) => None,
            (&Value::Int(_), &Schema::Long) => None,
            (&Value::Long(_), &Schema::Long) => None,
            (&Value::Float(_), &Schema::Float) => None,
            (&Value::Double(_), &Schema::Double) => None,
            (&Value::Bytes(_), &Schema::Bytes) => None,
            (&Value::String(_), &Schema::String) => None,
            (&Value::Uuid(_), &Schema::Uuid) => None,
            (&Value::Uuid(_), &Schema::String) => None,
            (Value::String(s), &Schema::Uuid) => match Uuid::from_str(s) {
                Ok(_) => None,
                Err(e) => Some(format!("Invalid UUID string: {e}")),
            },
            (&Value::Date(_), &Schema::Date) => None,
            (&Value::Int(_), &Schema::Date) => None,
            (&Value::TimeMillis(_), &Schema::TimeMillis) => None,
            (&Value::Int(_), &Schema::TimeMillis) => None,
            (&Value::TimeMicros(_), &Schema::TimeMicros) => None,
            (&Value::Long(_), &Schema::TimeMicros) => None,
            (&Value::TimestampMillis(_), &Schema::TimestampMillis) => None,
            (&Value::Long(_), &Schema::TimestampMillis) => None,
            (&Value::TimestampMicros(_), &Schema::TimestampMicros) => None,
            (&Value::Long(_), &Schema::TimestampMicros) => None,
            (&Value::Decimal(_), &Schema::Decimal(_)) => None,
            (Value::Bytes(_), &Schema::Decimal(_)) => None,
            (&Value::Duration(_), &Schema::Duration(_)) => None,
            (Value::Fixed(n, _), &Schema::Duration(_)) => {
                if *n == 12 {
                    None
                } else {
                    Some(format!("A duration must be a fixed of size 12, got {n}"))
                }
            }
            (Value::Fixed(n, _), Schema::Fixed(FixedSchema { size, .. })) => {
                if n == size {
                    None
                } else {
                    Some(format!(
                        "The value's size ({n}) must match the fixed size ({size})"
                    ))
                }
            }
            (Value::Fixed(n, _), Schema::Decimal(DecimalSchema { inner, .. })) => {
                match inner.as_ref() {
                    Schema::Fixed(FixedSchema { size, .. }) if n != size => Some(format!(
                        "The decimal value's size ({n}) must match the fixed size ({size})"
                    )),
                    _ => None,
                }
            }
            (Value::Bytes(b), Schema::Fixed(FixedSchema { size, .. })) => {
                if b.len() == *size {
                    None
                } else {
                    Some(format!(
                        "The bytes' length ({}) must match the fixed size ({size})",
                        b.len()
                    ))
                }
            }
            (Value::String(s), Schema::Enum(EnumSchema { symbols, .. })) => {
                if symbols.contains(s) {
                    None
                } else {
                    Some(format!("'{s}' is not a member of the possible symbols"))
                }
            }
            (Value::Enum(i, s), Schema::Enum(EnumSchema { symbols, .. })) => symbols
                .get(*i as usize)
                .map(|ref symbol| {
                    if symbol != &s {
                        Some(format!("Symbol '{s}' is not at position '{i}'"))
                    } else {
                        None
                    }
                })
                .unwrap_or_else(|| Some(format!("No symbol at position '{i}'"))),
            (Value::Union(i, value), Schema::Union(inner)) => inner
                .variants()
                .get(*i as usize)
                .map(|schema| value.validate_internal(schema, names, enclosing_namespace))
                .unwrap_or_else(|| Some(format!("No schema in the union at position '{i}'"))),
            (v, Schema::Union(inner)) => {
                match inner.find_schema(v, names, enclosing_namespace) {
                    Some(_) => None,
                    None => Some("Could not find matching type in union".to_string()),
                }
            }
            (Value::Array(items), Schema::Array(inner)) => items.iter().find_map(|item| {
                item.validate_internal(&inner.items, names, enclosing_namespace)
            }),
            (Value::Map(items), Schema::Map(inner)) => items.iter().find_map(|(_, value)| {
                value.validate_internal(&inner.types, names, enclosing_namespace)
            }),
            (Value::Record(record_fields), Schema::Record(RecordSchema { name, fields, .. })) => {
                let record_namespace = name.fully_qualified_name(enclosing_namespace).namespace;
                let mut lookup: HashMap<&str, &Value> = HashMap::new();
                for (name, value) in record_fields {
                    lookup.insert(name.as_str(), value);
                }
                fields.iter().find_map(|field| {
                    let value = lookup.get(field.name.as_str()).or_else(|| {
                        field
                            .aliases
                            .iter()
                            .find_map(|alias| lookup.get(alias.as_str()))
                    });
                    match value {
                        Some(value) => {
                            value.validate_internal(&field.schema, names, &record_namespace)
                        }
                        None if field.default.is_some() => None,
                        None => Some(format!("Field with name '{}' is not a member of the map items", field.name)),
                    }
                })
            }
            (v, s) => Some(format!(
                "Unsupported value-schema combination! Value: {v:?}, schema: {s:?}"
            )),
        }
    }

    /// Attempt to perform schema resolution on the value, with the given
    /// [Schema](../schema/enum.Schema.html).
    ///
    /// See [Schema Resolution](https://avro.apache.org/docs/++version++/specification/#schema-resolution)
    /// in the Avro specification for the full set of rules of schema
    /// resolution.
    pub fn resolve(self, schema: &Schema) -> AvroResult<Self> {
        let rs = crate::schema::ResolvedSchema::try_from(schema)?;
        self.resolve_internal(schema, rs.get_names(), &schema.namespace(), &None)
    }

    pub(crate) fn resolve_internal<S: Borrow<Schema>>(
        mut self,
        schema: &Schema,
        names: &HashMap<Name, S>,
        enclosing_namespace: &Namespace,
        field_default: &Option<JsonValue>,
    ) -> AvroResult<Self> {
        // Check if this schema is a union, and if the reader schema is not.
        if SchemaKind::from(&self) == SchemaKind::Union
            && SchemaKind::from(schema) != SchemaKind::Union
        {
            // Pull out the Union, and attempt to resolve against it.
            let v = match self {
                Value::Union(_i, b) => *b,
                _ => unreachable!(),
            };
            self = v;
        }
        match *schema {
            Schema::Ref { ref name } => {
                let name = name.fully_qualified_name(enclosing_namespace);

                if let Some(resolved) = names.get(&name) {
                    self.resolve_internal(resolved.borrow(), names, &name.namespace, field_default)
                } else {
                    Err(Details::SchemaResolutionError(name).into())
                }
            }
            Schema::Null => self.resolve_null(),
            Schema::Boolean => self.resolve_boolean(),
            Schema::Int => self.resolve_int(),
            Schema::Long => self.resolve_long(),
            Schema::Float => self.resolve_float(),
            Schema::Double => self.resolve_double(),
            Schema::Bytes => self.resolve_bytes(),
            Schema::String => self.resolve_string(),
            Schema::Fixed(FixedSchema { size, .. }) => self.resolve_fixed(size),
            Schema::Union(ref inner) => {
                self.resolve_union(inner, names, enclosing_namespace, field_default)
            }
            Schema::Enum(EnumSchema {
                ref symbols,
                ref default,
                ..
            }) => self.resolve_enum(symbols, default, field_default),
            Schema::Array(ref inner) => {
                self.resolve_array(&inner.items, names, enclosing_namespace)
            }
            Schema::Map(ref inner) => self.resolve_map(&inner.types, names, enclosing_namespace),
            Schema::Record(ref record_schema) => {
                self.resolve_record(record_schema, names, enclosing_namespace)
            }
            Schema::Decimal(DecimalSchema { ref inner, .. }) => self.resolve_decimal(inner),
            Schema::Uuid => self.resolve_uuid(),
            Schema::Date => self.resolve_date(),
            Schema::TimeMillis => self.resolve_time_millis(),
            Schema::TimeMicros => self.resolve_time_micros(),
            Schema::TimestampMillis => self.resolve_timestamp_millis(),
            Schema::TimestampMicros => self.resolve_timestamp_micros(),
            Schema::Duration(_) => self.resolve_duration(),
        }
    }

    fn resolve_null(self) -> AvroResult<Self> {
        match self {
            Value::Null => Ok(Value::Null),
            other => Err(Details::GetNull(other).into()),
        }
    }

    fn resolve_boolean(self) -> AvroResult<Self> {
        match self {
            Value::Boolean(b) => Ok(Value::Boolean(b)),
            other => Err(Details::GetBoolean(other).into()),
        }
    }

    fn resolve_int(self) -> AvroResult<Self> {
        match self {
            Value::Int(n) => Ok(Value::Int(n)),
            Value::Long(n) => i32::try_from(n)
                .map(Value::Int)
                .map_err(|_| Details::GetInt(Value::Long(n)).into()),
            other => Err(Details::GetInt(other).into()),
        }
    }

    fn resolve_long(self) -> AvroResult<Self> {
        match self {
            Value::Int(n) => Ok(Value::Long(i64::from(n))),
            Value::Long(n) => Ok(Value::Long(n)),
            other => Err(Details::GetLong(other).into()),
        }
    }

    fn resolve_float(self) -> AvroResult<Self> {
        match self {
            Value::Int(n) => Ok(Value::Float(n as f32)),
            Value::Long(n) => Ok(Value::Float(n as f32)),
            Value::Float(x) => Ok(Value::Float(x)),
            Value::Double(x) => Ok(Value::Float(x as f32)),
            other => Err(Details::GetFloat(other).into()),
        }
    }

    fn resolve_double(self) -> AvroResult<Self> {
        match self {
            Value::Int(n) => Ok(Value::Double(f64::from(n))),
            Value::Long(n) => Ok(Value::Double(n as f64)),
            Value::Float(x) => Ok(Value::Double(f64::from(x))),
            Value::Double(x) => Ok(Value::Double(x)),
            other => Err(Details::GetDouble(other).into()),
        }
    }

    fn resolve_bytes(self) -> AvroResult<Self> {
        match self {
            Value::Bytes(bytes) => Ok(Value::Bytes(bytes)),
            Value::String(s) => Ok(Value::Bytes(s.into_bytes())),
            Value::Array(items) => Ok(Value::Bytes(
                items
                    .into_iter()
                    .map(Value::try_u8)
                    .collect::<AvroResult<Vec<_>>>()?,
            )),
            other => Err(Details::GetBytes(other).into()),
        }
    }

    fn resolve_string(self) -> AvroResult<Self> {
        match self {
            Value::String(s) => Ok(Value::String(s)),
            Value::Bytes(bytes) => Ok(Value::String(
                String::from_utf8(bytes).map_err(Details::ConvertToUtf8)?,
            )),
            other => Err(Details::GetString(other).into()),
        }
    }

    fn resolve_fixed(self, size: usize) -> AvroResult<Self> {
        match self {
            Value::Fixed(n, bytes) => {
                if n == size {
                    Ok(Value::Fixed(n, bytes))
                } else {
                    Err(Details::CompareFixedSizes { size, n }.into())
                }
            }
            Value::Bytes(bytes) => {
                if bytes.len() == size {
                    Ok(Value::Fixed(size, bytes))
                } else {
                    Err(Details::CompareFixedSizes {
                        size,
                        n: bytes.len(),
                    }
                    .into())
                }
            }
            Value::String(s) => {
                let bytes = s.into_bytes();
                if bytes.len() == size {
                    Ok(Value::Fixed(size, bytes))
                } else {
                    Err(Details::CompareFixedSizes {
                        size,
                        n: bytes.len(),
                    }
                    .into())
                }
            }
            other => Err(Details::GetBytes(other).into()),
        }
    }

    fn resolve_enum(
        self,
        symbols: &[String],
        enum_default: &Option<String>,
        field_default: &Option<JsonValue>,
    ) -> AvroResult<Self> {
        let validate_symbol = |symbol: String, symbols: &[String]| {
            if let Some(index) = symbols.iter().position(|item| item == &symbol) {
                Ok(Value::Enum(index as u32, symbol))
            } else {
                let default = enum_default.clone().map(JsonValue::String).or_else(|| field_default.clone());
                match default {
                    Some(JsonValue::String(default)) => {
                        if let Some(index) = symbols.iter().position(|item| item == &default) {
                            Ok(Value::Enum(index as u32, default))
                        } else {
                            Err(Details::EnumSymbolMissing {
                                symbol,
                                symbols: symbols.into(),
                            }
                            .into())
                        }
                    }
                    _ => Err(Details::EnumSymbolMissing {
                        symbol,
                        symbols: symbols.into(),
                    }
                    .into()),
                }
            }
        };

        match self {
            Value::Enum(_raw_index, s) => validate_symbol(s, symbols),
            Value::String(s) => validate_symbol(s, symbols),
            other => Err(Details::GetEnum(other).into()),
        }
    }

    fn resolve_union<S: Borrow<Schema>>(
        self,
        schema: &UnionSchema,
        names: &HashMap<Name, S>,
        enclosing_namespace: &Namespace,
        field_default: &Option<JsonValue>,
    ) -> AvroResult<Self> {
        let v = match self {
            // Both are unions case.
            Value::Union(_i, v) => *v,
            // Reader is a union, but writer is not.
            v => v,
        };

        // Find the first match in the reader schema.
        // FIXME: this might be wrong when the union consists of multiple same records that have different names
        for (i, inner) in schema.variants().iter().enumerate() {
            let result =
                v.clone()
                    .resolve_internal(inner, names, enclosing_namespace, field_default);
            if let Ok(resolved) = result {
                return Ok(Value::Union(i as u32, Box::new(resolved)));
            }
        }

        Err(Details::FindUnionVariant {
            schema: schema.clone(),
            value: v,
        }
        .into())
    }

    fn resolve_array<S: Borrow<Schema>>(
        self,
        schema: &Schema,
        names: &HashMap<Name, S>,
        enclosing_namespace: &Namespace,
    ) -> AvroResult<Self> {
        match self {
            Value::Array(items) => Ok(Value::Array(
                items
                    .into_iter()
                    .map(|item| item.resolve_internal(schema, names, enclosing_namespace, &None))
                    .collect::<AvroResult<_>>()?,
            )),
            other => Err(Details::GetArray {
                expected: schema.into(),
                other,
            }
            .into()),
        }
    }

    fn resolve_map<S: Borrow<Schema>>(
        self,
        schema: &Schema,
        names: &HashMap<Name, S>,
        enclosing_namespace: &Namespace,
    ) -> AvroResult<Self> {
        match self {
            Value::Map(items) => Ok(Value::Map(
                items
                    .into_iter()
                    .map(|(key, value)| {
                        value
                            .resolve_internal(schema, names, enclosing_namespace, &None)
                            .map(|value| (key, value))
                    })
                    .collect::<AvroResult<_>>()?,
            )),
            other => Err(Details::GetMap {
                expected: schema.into(),
                other,
            }
            .into()),
        }
    }

    fn resolve_record<S: Borrow<Schema>>(
        self,
        record_schema: &RecordSchema,
        names: &HashMap<Name, S>,
        enclosing_namespace: &Namespace,
    ) -> AvroResult<Self> {
        let RecordSchema {
            ref name,
            ref fields,
            ..
        } = *record_schema;
        let record_namespace = name.fully_qualified_name(enclosing_namespace).namespace;

        let mut items = match self {
            Value::Map(items) => Ok(items),
            Value::Record(fields) => Ok(fields.into_iter().collect::<HashMap<_, _>>()),
            other => Err(Details::GetRecord {
                expected: fields
                    .iter()
                    .map(|field| (field.name.clone(), SchemaKind::from(&field.schema)))
                    .collect(),
                other,
            }),
        }?;

        let new_fields = fields
            .iter()
            .map(|field| {
                let value = match items.remove(&field.name).or_else(|| {
                    field
                        .aliases
                        .iter()
                        .find_map(|alias| items.remove(alias))
                }) {
                    Some(value) => value,
                    None => match field.default {
                        Some(ref value) => Value::try_from(value.clone())?,
                        None => {
                            return Err(Details::GetField(field.name.clone()).into());
                        }
                    },
                };
                value
                    .resolve_internal(&field.schema, names, &record_namespace, &field.default)
                    .map(|value| (field.name.clone(), value))
            })
            .collect::<AvroResult<Vec<_>>>()?;

        Ok(Value::Record(new_fields))
    }

    fn resolve_decimal(self, inner: &Schema) -> AvroResult<Self> {
        match self {
            Value::Decimal(decimal) => match inner {
                Schema::Fixed(FixedSchema { size, .. }) => {
                    if decimal.len() <= *size {
                        Ok(Value::Decimal(decimal))
                    } else {
                        Err(Details::CompareFixedSizes {
                            size: *size,
                            n: decimal.len(),
                        }
                        .into())
                    }
                }
                _ => Ok(Value::Decimal(decimal)),
            },
            Value::Fixed(n, bytes) => match inner {
                Schema::Fixed(FixedSchema { size, .. }) if n != *size => {
                    Err(Details::CompareFixedSizes { size: *size, n }.into())
                }
                _ => Ok(Value::Decimal(Decimal::from(bytes))),
            },
            Value::Bytes(bytes) => Ok(Value::Decimal(Decimal::from(bytes))),
            Value::String(s) => Ok(Value::Decimal(Decimal::from(s.into_bytes()))),
            other => Err(Details::ResolveDecimal(other).into()),
        }
    }

    fn resolve_uuid(self) -> AvroResult<Self> {
        match self {
            Value::Uuid(uuid) => Ok(Value::Uuid(uuid)),
            Value::String(ref string) => Ok(Value::Uuid(
                Uuid::from_str(string).map_err(Details::ConvertStrToUuid)?,
            )),
            other => Err(Details::GetUuid(other).into()),
        }
    }

    fn resolve_date(self) -> AvroResult<Self> {
        match self {
            Value::Date(d) | Value::Int(d) => Ok(Value::Date(d)),
            other => Err(Details::GetDate(other).into()),
        }
    }

    fn resolve_time_millis(self) -> AvroResult<Self> {
        match self {
            Value::TimeMillis(t) | Value::Int(t) => Ok(Value::TimeMillis(t)),
            other => Err(Details::GetTimeMillis(other).into()),
        }
    }

    fn resolve_time_micros(self) -> AvroResult<Self> {
        match self {
            Value::TimeMicros(t) | Value::Long(t) => Ok(Value::TimeMicros(t)),
            Value::Int(t) => Ok(Value::TimeMicros(i64::from(t))),
            other => Err(Details::GetTimeMicros(other).into()),
        }
    }

    fn resolve_timestamp_millis(self) -> AvroResult<Self> {
        match self {
            Value::TimestampMillis(ts) | Value::Long(ts) => Ok(Value::TimestampMillis(ts)),
            Value::Int(ts) => Ok(Value::TimestampMillis(i64::from(ts))),
            other => Err(Details::GetTimestampMillis(other).into()),
        }
    }

    fn resolve_timestamp_micros(self) -> AvroResult<Self> {
        match self {
            Value::TimestampMicros(ts) | Value::Long(ts) => Ok(Value::TimestampMicros(ts)),
            Value::Int(ts) => Ok(Value::TimestampMicros(i64::from(ts))),
            other => Err(Details::GetTimestampMicros(other).into()),
        }
    }

    fn resolve_duration(self) -> AvroResult<Self> {
        match self {
            Value::Duration(duration) => Ok(Value::Duration(duration)),
            Value::Fixed(size, bytes) => {
                if size != 12 {
                    return Err(Details::GetDecimalFixedBytes(size).into());
                }
                let mut raw = [0u8; 12];
                raw.copy_from_slice(&bytes);
                Ok(Value::Duration(Duration::from(raw)))
            }
            other => Err(Details::ResolveDuration(other).into()),
        }
    }

    fn try_u8(self) -> AvroResult<u8> {
        let int = self.resolve_int()?;
        if let Value::Int(n) = int {
            if (0..=255).contains(&n) {
                return Ok(n as u8);
            }
        }

        Err(Details::GetBytes(int).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestResult;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_validate_primitives() -> TestResult {
        assert!(Value::Null.validate(&Schema::Null));
        assert!(Value::Boolean(true).validate(&Schema::Boolean));
        assert!(Value::Int(42).validate(&Schema::Int));
        assert!(Value::Int(42).validate(&Schema::Long));
        assert!(Value::Long(42).validate(&Schema::Long));
        assert!(Value::Float(42.0).validate(&Schema::Float));
        assert!(Value::Double(42.0).validate(&Schema::Double));
        assert!(Value::String("foo".into()).validate(&Schema::String));

        assert!(!Value::Long(42).validate(&Schema::Int));
        assert!(!Value::Double(42.0).validate(&Schema::Float));
        assert!(!Value::String("foo".into()).validate(&Schema::Bytes));
        Ok(())
    }

    #[test]
    fn test_validate_fixed() -> TestResult {
        let schema = Schema::parse_str(r#"{"type": "fixed", "name": "f", "size": 2}"#)?;
        assert!(Value::Fixed(2, vec![1, 2]).validate(&schema));
        assert!(!Value::Fixed(3, vec![1, 2, 3]).validate(&schema));
        assert!(Value::Bytes(vec![1, 2]).validate(&schema));
        assert!(!Value::Bytes(vec![1, 2, 3]).validate(&schema));
        Ok(())
    }

    #[test]
    fn test_validate_enum() -> TestResult {
        let schema = Schema::parse_str(
            r#"{"type": "enum", "name": "e", "symbols": ["a", "b"]}"#,
        )?;
        assert!(Value::Enum(0, "a".into()).validate(&schema));
        assert!(Value::String("b".into()).validate(&schema));
        assert!(!Value::Enum(1, "a".into()).validate(&schema));
        assert!(!Value::String("c".into()).validate(&schema));
        Ok(())
    }

    #[test]
    fn test_validate_union() -> TestResult {
        let schema = Schema::parse_str(r#"["null", "int"]"#)?;
        assert!(Value::Union(0, Box::new(Value::Null)).validate(&schema));
        assert!(Value::Union(1, Box::new(Value::Int(42))).validate(&schema));
        assert!(Value::Null.validate(&schema));
        assert!(Value::Int(42).validate(&schema));
        assert!(!Value::Union(2, Box::new(Value::Int(42))).validate(&schema));
        assert!(!Value::String("foo".into()).validate(&schema));
        Ok(())
    }

    #[test]
    fn test_validate_record_missing_field() -> TestResult {
        let schema = Schema::parse_str(
            r#"
            {
                "type": "record",
                "name": "test",
                "fields": [
                    {"name": "a", "type": "long"},
                    {"name": "b", "type": "string", "default": "empty"}
                ]
            }
        "#,
        )?;
        // "b" has a default and may be omitted, "a" may not
        assert!(Value::Record(vec![("a".into(), Value::Long(1))]).validate(&schema));
        assert!(
            !Value::Record(vec![("b".into(), Value::String("x".into()))]).validate(&schema)
        );
        Ok(())
    }

    #[test]
    fn test_resolve_numeric_promotion() -> TestResult {
        assert_eq!(
            Value::Int(42).resolve(&Schema::Long)?,
            Value::Long(42)
        );
        assert_eq!(
            Value::Int(42).resolve(&Schema::Float)?,
            Value::Float(42.0)
        );
        assert_eq!(
            Value::Long(42).resolve(&Schema::Double)?,
            Value::Double(42.0)
        );
        assert_eq!(
            Value::Float(1.5).resolve(&Schema::Double)?,
            Value::Double(1.5)
        );
        assert!(Value::Double(1.5).resolve(&Schema::Long).is_err());
        Ok(())
    }

    #[test]
    fn test_resolve_string_bytes_crossover() -> TestResult {
        assert_eq!(
            Value::String("ab".into()).resolve(&Schema::Bytes)?,
            Value::Bytes(vec![b'a', b'b'])
        );
        assert_eq!(
            Value::Bytes(vec![b'a', b'b']).resolve(&Schema::String)?,
            Value::String("ab".into())
        );
        Ok(())
    }

    #[test]
    fn test_resolve_union_reader_union() -> TestResult {
        let reader = Schema::parse_str(r#"["null", "long"]"#)?;
        assert_eq!(
            Value::Int(42).resolve(&reader)?,
            Value::Union(1, Box::new(Value::Long(42)))
        );
        assert_eq!(
            Value::Union(0, Box::new(Value::Null)).resolve(&reader)?,
            Value::Union(0, Box::new(Value::Null))
        );
        Ok(())
    }

    #[test]
    fn test_resolve_enum_missing_symbol() -> TestResult {
        let reader = Schema::parse_str(
            r#"{"type": "enum", "name": "e", "symbols": ["a", "b"]}"#,
        )?;
        match Value::Enum(2, "c".into())
            .resolve(&reader)
            .map_err(crate::Error::into_details)
        {
            Err(Details::EnumSymbolMissing { symbol, .. }) => assert_eq!(symbol, "c"),
            other => panic!("Expected Details::EnumSymbolMissing, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_resolve_enum_reader_default() -> TestResult {
        let reader = Schema::parse_str(
            r#"{"type": "enum", "name": "e", "symbols": ["a", "b"], "default": "a"}"#,
        )?;
        assert_eq!(
            Value::Enum(5, "zzz".into()).resolve(&reader)?,
            Value::Enum(0, "a".into())
        );
        Ok(())
    }

    #[test]
    fn test_resolve_record_reader_only_field_default() -> TestResult {
        let reader = Schema::parse_str(
            r#"
            {
                "type": "record",
                "name": "test",
                "fields": [
                    {"name": "a", "type": "long"},
                    {"name": "b", "type": "string", "default": "empty"}
                ]
            }
        "#,
        )?;
        let written = Value::Record(vec![("a".into(), Value::Long(4))]);
        assert_eq!(
            written.resolve(&reader)?,
            Value::Record(vec![
                ("a".into(), Value::Long(4)),
                ("b".into(), Value::String("empty".into())),
            ])
        );
        Ok(())
    }

    #[test]
    fn test_resolve_record_writer_only_field_is_dropped() -> TestResult {
        let reader = Schema::parse_str(
            r#"
            {
                "type": "record",
                "name": "test",
                "fields": [
                    {"name": "a", "type": "long"}
                ]
            }
        "#,
        )?;
        let written = Value::Record(vec![
            ("a".into(), Value::Long(4)),
            ("gone".into(), Value::String("x".into())),
        ]);
        assert_eq!(
            written.resolve(&reader)?,
            Value::Record(vec![("a".into(), Value::Long(4))])
        );
        Ok(())
    }

    #[test]
    fn test_resolve_fixed_size_mismatch() -> TestResult {
        let reader = Schema::parse_str(r#"{"type": "fixed", "name": "f", "size": 4}"#)?;
        assert!(Value::Fixed(2, vec![1, 2]).resolve(&reader).is_err());
        Ok(())
    }

    #[test]
    fn test_resolve_duration_from_fixed() -> TestResult {
        let reader = Schema::parse_str(
            r#"{"type": "fixed", "name": "d", "size": 12, "logicalType": "duration"}"#,
        )?;
        let value = Value::Fixed(12, vec![1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0]);
        match value.resolve(&reader)? {
            Value::Duration(d) => {
                assert_eq!(u32::from(d.months()), 1);
                assert_eq!(u32::from(d.days()), 2);
                assert_eq!(u32::from(d.millis()), 3);
            }
            other => panic!("Expected a duration, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_record_builder() -> TestResult {
        let schema = Schema::parse_str(
            r#"
            {
                "type": "record",
                "name": "test",
                "fields": [
                    {"name": "a", "type": "long"},
                    {"name": "b", "type": "string"}
                ]
            }
        "#,
        )?;
        let mut record = Record::new(&schema).unwrap();
        record.put("a", 27i64);
        record.put("b", "foo");
        assert_eq!(
            Value::from(record),
            Value::Record(vec![
                ("a".into(), Value::Long(27)),
                ("b".into(), Value::String("foo".into())),
            ])
        );
        Ok(())
    }
}
