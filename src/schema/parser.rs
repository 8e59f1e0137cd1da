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

use crate::error::Details;
use crate::schema::{
    Alias, Aliases, ArraySchema, DecimalSchema, EnumSchema, FixedSchema, MapSchema, Name, Names,
    Namespace, RecordField, RecordSchema, Schema, SchemaKind, UnionSchema,
};
use crate::types;
use crate::util::MapHelper;
use crate::validator::{validate_enum_symbol_name, validate_record_field_name};
use crate::{AvroResult, Error};
use log::warn;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Default)]
pub(crate) struct Parser {
    input_schemas: HashMap<Name, Value>,
    /// Used to resolve cyclic references, i.e. when a
    /// field's type is a reference to its record's type
    resolving_schemas: Names,
    input_order: Vec<Name>,
    /// Used to avoid parsing the same schema twice
    parsed_schemas: Names,
}

impl Parser {
    pub(crate) fn new(input_schemas: HashMap<Name, Value>, input_order: Vec<Name>) -> Self {
        Self {
            input_schemas,
            resolving_schemas: HashMap::default(),
            input_order,
            parsed_schemas: HashMap::default(),
        }
    }

    pub(crate) fn get_parsed_schemas(&self) -> &Names {
        &self.parsed_schemas
    }

    /// Create a `Schema` from a string representing a JSON Avro schema.
    pub(super) fn parse_str(&mut self, input: &str) -> AvroResult<Schema> {
        let value = serde_json::from_str(input).map_err(Details::ParseSchemaJson)?;
        self.parse(&value, &None)
    }

    /// Create an array of `Schema`s from the input schemas given to the
    /// parser.
    ///
    /// It is allowed that the schemas have cross-dependencies; these will be
    /// resolved during parsing.
    pub(super) fn parse_list(&mut self) -> AvroResult<Vec<Schema>> {
        self.parse_input_schemas()?;

        let mut parsed_schemas = Vec::with_capacity(self.parsed_schemas.len());
        for name in self.input_order.drain(0..) {
            let parsed = self
                .parsed_schemas
                .remove(&name)
                .expect("One of the input schemas was unexpectedly not parsed");
            parsed_schemas.push(parsed);
        }
        Ok(parsed_schemas)
    }

    /// Convert the input schemas to `parsed_schemas`.
    fn parse_input_schemas(&mut self) -> Result<(), Error> {
        while !self.input_schemas.is_empty() {
            let next_name = self
                .input_schemas
                .keys()
                .next()
                .expect("Input schemas unexpectedly empty")
                .to_owned();
            let (name, value) = self
                .input_schemas
                .remove_entry(&next_name)
                .expect("Key unexpectedly missing");
            let parsed = self.parse(&value, &None)?;
            if !self.parsed_schemas.contains_key(&name) {
                self.parsed_schemas.insert(name, parsed);
            }
        }
        Ok(())
    }

    /// Create a `Schema` from a `serde_json::Value` representing a JSON Avro
    /// schema.
    pub(super) fn parse(
        &mut self,
        value: &Value,
        enclosing_namespace: &Namespace,
    ) -> AvroResult<Schema> {
        match *value {
            Value::String(ref t) => self.parse_known_schema(t.as_str(), enclosing_namespace),
            Value::Object(ref data) => self.parse_complex(data, enclosing_namespace),
            Value::Array(ref data) => self.parse_union(data, enclosing_namespace),
            _ => Err(Details::ParseSchemaFromValidJson.into()),
        }
    }

    /// Parse a string as a primitive type or reference to a named schema.
    fn parse_known_schema(
        &mut self,
        name: &str,
        enclosing_namespace: &Namespace,
    ) -> AvroResult<Schema> {
        match name {
            "null" => Ok(Schema::Null),
            "boolean" => Ok(Schema::Boolean),
            "int" => Ok(Schema::Int),
            "long" => Ok(Schema::Long),
            "double" => Ok(Schema::Double),
            "float" => Ok(Schema::Float),
            "bytes" => Ok(Schema::Bytes),
            "string" => Ok(Schema::String),
            _ => self.fetch_schema_ref(name, enclosing_namespace),
        }
    }

    /// Given a name, tries to retrieve the parsed schema from `parsed_schemas`.
    ///
    /// If a parsed schema is not found, it checks if a currently resolving
    /// schema with that name exists. If a resolving schema is not found, it
    /// checks if a JSON with that name exists in `input_schemas` and then
    /// parses it (removing it from `input_schemas`) and adds the parsed
    /// schema to `parsed_schemas`.
    ///
    /// This method allows schema definitions that depend on other types to
    /// parse their dependencies (or look them up if already parsed).
    fn fetch_schema_ref(
        &mut self,
        name: &str,
        enclosing_namespace: &Namespace,
    ) -> AvroResult<Schema> {
        fn get_schema_ref(parsed: &Schema) -> Schema {
            match parsed {
                Schema::Record(RecordSchema { name, .. })
                | Schema::Enum(EnumSchema { name, .. })
                | Schema::Fixed(FixedSchema { name, .. }) => Schema::Ref { name: name.clone() },
                _ => parsed.clone(),
            }
        }

        let fully_qualified_name =
            Name::new(name)?.fully_qualified_name(enclosing_namespace);

        if self.parsed_schemas.contains_key(&fully_qualified_name) {
            return Ok(Schema::Ref {
                name: fully_qualified_name,
            });
        }
        if let Some(resolving_schema) = self.resolving_schemas.get(&fully_qualified_name) {
            return Ok(resolving_schema.clone());
        }

        // For good error reporting we add this check
        match fully_qualified_name.name.as_str() {
            "record" | "enum" | "fixed" => {
                return Err(
                    Details::InvalidSchemaRecord(fully_qualified_name.name.clone()).into(),
                );
            }
            _ => (),
        }

        let value = self
            .input_schemas
            .remove(&fully_qualified_name)
            .ok_or_else(|| Details::ParsePrimitive(fully_qualified_name.fullname(None)))?;

        // parsing a full schema from inside another schema. Other full schema
        // will not inherit namespace
        let parsed = self.parse(&value, &None)?;
        if !self.parsed_schemas.contains_key(&fully_qualified_name) {
            self.parsed_schemas
                .insert(fully_qualified_name, parsed.clone());
        }

        Ok(get_schema_ref(&parsed))
    }

    fn get_decimal_integer(
        &self,
        complex: &Map<String, Value>,
        key: &'static str,
    ) -> AvroResult<usize> {
        match complex.get(key) {
            Some(Value::Number(value)) => {
                let num = value
                    .as_u64()
                    .ok_or_else(|| Details::GetU64FromJson(value.clone()))?;
                usize::try_from(num).map_err(|e| Details::ConvertU64ToUsize(e, num).into())
            }
            None => {
                if key == "scale" {
                    Ok(0)
                } else {
                    Err(Details::GetDecimalMetadataFromJson(key).into())
                }
            }
            Some(value) => Err(Details::GetDecimalMetadataValueFromJson {
                key: key.into(),
                value: value.clone(),
            }
            .into()),
        }
    }

    fn parse_precision_and_scale(
        &self,
        complex: &Map<String, Value>,
    ) -> AvroResult<(usize, usize)> {
        let precision = self.get_decimal_integer(complex, "precision")?;
        let scale = self.get_decimal_integer(complex, "scale")?;

        if precision < 1 {
            return Err(Details::DecimalPrecisionMustBePositive { precision }.into());
        }

        if precision < scale {
            Err(Details::DecimalPrecisionLessThanScale { precision, scale }.into())
        } else {
            Ok((precision, scale))
        }
    }

    /// Parse a `serde_json::Value` representing a complex Avro type into a
    /// `Schema`.
    ///
    /// Avro supports "recursive" definition of types.
    /// e.g: `{"type": {"type": "string"}}`
    fn parse_complex(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: &Namespace,
    ) -> AvroResult<Schema> {
        // Try to parse this as a native complex type.
        fn parse_as_native_complex(
            complex: &Map<String, Value>,
            parser: &mut Parser,
            enclosing_namespace: &Namespace,
        ) -> AvroResult<Schema> {
            match complex.get("type") {
                Some(value) => match value {
                    Value::String(s) if s == "fixed" => {
                        parser.parse_fixed(complex, enclosing_namespace)
                    }
                    _ => parser.parse(value, enclosing_namespace),
                },
                None => Err(Details::GetComplexTypeField.into()),
            }
        }

        // A logical type is layered on top of a native type. When the
        // underlying type is not among the supported kinds, or the logical
        // attributes are invalid, the logical annotation is ignored and the
        // underlying type is used directly.
        fn try_convert_to_logical_type<F>(
            logical_type: &str,
            schema: Schema,
            supported_schema_kinds: &[SchemaKind],
            convert: F,
        ) -> AvroResult<Schema>
        where
            F: Fn(Schema) -> AvroResult<Schema>,
        {
            let kind = SchemaKind::from(&schema);
            if supported_schema_kinds.contains(&kind) {
                convert(schema)
            } else {
                warn!(
                    "Ignoring unknown logical type '{logical_type}' for schema of type: {schema:?}!"
                );
                Ok(schema)
            }
        }

        match complex.get("logicalType") {
            Some(Value::String(t)) => match t.as_str() {
                "decimal" => {
                    return try_convert_to_logical_type(
                        "decimal",
                        parse_as_native_complex(complex, self, enclosing_namespace)?,
                        &[SchemaKind::Fixed, SchemaKind::Bytes],
                        |inner| -> AvroResult<Schema> {
                            match self.parse_precision_and_scale(complex) {
                                Ok((precision, scale)) => Ok(Schema::Decimal(DecimalSchema {
                                    precision,
                                    scale,
                                    inner: Box::new(inner),
                                })),
                                Err(err) => {
                                    warn!("Ignoring invalid decimal logical type: {err}");
                                    Ok(inner)
                                }
                            }
                        },
                    );
                }
                "uuid" => {
                    return try_convert_to_logical_type(
                        "uuid",
                        parse_as_native_complex(complex, self, enclosing_namespace)?,
                        &[SchemaKind::String],
                        |_| -> AvroResult<Schema> { Ok(Schema::Uuid) },
                    );
                }
                "date" => {
                    return try_convert_to_logical_type(
                        "date",
                        parse_as_native_complex(complex, self, enclosing_namespace)?,
                        &[SchemaKind::Int],
                        |_| -> AvroResult<Schema> { Ok(Schema::Date) },
                    );
                }
                "time-millis" => {
                    return try_convert_to_logical_type(
                        "time-millis",
                        parse_as_native_complex(complex, self, enclosing_namespace)?,
                        &[SchemaKind::Int],
                        |_| -> AvroResult<Schema> { Ok(Schema::TimeMillis) },
                    );
                }
                "time-micros" => {
                    return try_convert_to_logical_type(
                        "time-micros",
                        parse_as_native_complex(complex, self, enclosing_namespace)?,
                        &[SchemaKind::Long],
                        |_| -> AvroResult<Schema> { Ok(Schema::TimeMicros) },
                    );
                }
                "timestamp-millis" => {
                    return try_convert_to_logical_type(
                        "timestamp-millis",
                        parse_as_native_complex(complex, self, enclosing_namespace)?,
                        &[SchemaKind::Long],
                        |_| -> AvroResult<Schema> { Ok(Schema::TimestampMillis) },
                    );
                }
                "timestamp-micros" => {
                    return try_convert_to_logical_type(
                        "timestamp-micros",
                        parse_as_native_complex(complex, self, enclosing_namespace)?,
                        &[SchemaKind::Long],
                        |_| -> AvroResult<Schema> { Ok(Schema::TimestampMicros) },
                    );
                }
                "duration" => {
                    return try_convert_to_logical_type(
                        "duration",
                        parse_as_native_complex(complex, self, enclosing_namespace)?,
                        &[SchemaKind::Fixed],
                        |schema| -> AvroResult<Schema> {
                            match schema {
                                Schema::Fixed(fixed) if fixed.size == 12 => {
                                    Ok(Schema::Duration(fixed))
                                }
                                Schema::Fixed(FixedSchema { size, .. }) => {
                                    warn!(
                                        "Ignoring duration logical type on fixed type because size ({size}) is not 12!"
                                    );
                                    Ok(schema)
                                }
                                _ => {
                                    warn!(
                                        "Ignoring invalid duration logical type for schema: {schema:?}"
                                    );
                                    Ok(schema)
                                }
                            }
                        },
                    );
                }
                // In this case, of an unknown logical type, we just pass
                // through the underlying type.
                _ => {}
            },
            Some(value) => return Err(Details::GetLogicalTypeFieldType(value.clone()).into()),
            _ => {}
        }
        match complex.get("type") {
            Some(Value::String(t)) => match t.as_str() {
                "record" => self.parse_record(complex, enclosing_namespace),
                "enum" => self.parse_enum(complex, enclosing_namespace),
                "array" => self.parse_array(complex, enclosing_namespace),
                "map" => self.parse_map(complex, enclosing_namespace),
                "fixed" => self.parse_fixed(complex, enclosing_namespace),
                other => self.parse_known_schema(other, enclosing_namespace),
            },
            Some(Value::Object(data)) => self.parse_complex(data, enclosing_namespace),
            Some(Value::Array(variants)) => self.parse_union(variants, enclosing_namespace),
            Some(unknown) => Err(Details::GetComplexType(unknown.clone()).into()),
            None => Err(Details::GetComplexTypeField.into()),
        }
    }

    fn register_resolving_schema(&mut self, name: &Name, aliases: &Aliases) {
        let resolving_schema = Schema::Ref { name: name.clone() };
        self.resolving_schemas
            .insert(name.clone(), resolving_schema.clone());

        if let Some(aliases) = aliases {
            aliases.iter().for_each(|alias| {
                let alias_fullname = alias.fully_qualified_name(&name.namespace);
                self.resolving_schemas
                    .insert(alias_fullname, resolving_schema.clone());
            });
        }
    }

    fn register_parsed_schema(
        &mut self,
        fully_qualified_name: &Name,
        schema: &Schema,
        aliases: &Aliases,
    ) {
        self.parsed_schemas
            .insert(fully_qualified_name.clone(), schema.clone());
        self.resolving_schemas.remove(fully_qualified_name);

        if let Some(aliases) = aliases {
            aliases.iter().for_each(|alias| {
                let alias_fullname = alias.fully_qualified_name(&fully_qualified_name.namespace);
                self.resolving_schemas.remove(&alias_fullname);
                self.parsed_schemas.insert(alias_fullname, schema.clone());
            });
        }
    }

    /// Parse a `serde_json::Map` representing a `record` Avro schema.
    fn parse_record(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: &Namespace,
    ) -> AvroResult<Schema> {
        let fully_qualified_name = Name::parse(complex, enclosing_namespace)?;
        let aliases = fix_aliases_namespace(complex.aliases(), &fully_qualified_name.namespace)?;

        let mut lookup = BTreeMap::new();

        self.register_resolving_schema(&fully_qualified_name, &aliases);

        let fields_json = complex
            .get("fields")
            .and_then(|fields| fields.as_array())
            .ok_or(Details::GetRecordFieldsJson)?;

        let mut fields = Vec::with_capacity(fields_json.len());
        for (position, field) in fields_json.iter().enumerate() {
            let field = field
                .as_object()
                .ok_or(Details::GetRecordFieldsJson)?;
            let field = self.parse_record_field(field, position, &fully_qualified_name)?;
            if lookup.insert(field.name.clone(), position).is_some() {
                return Err(Details::FieldNameDuplicate(field.name).into());
            }
            fields.push(field);
        }

        let schema = Schema::Record(RecordSchema {
            name: fully_qualified_name.clone(),
            aliases: aliases.clone(),
            doc: complex.doc(),
            fields,
            lookup,
            attributes: get_custom_attributes(complex, &["fields"]),
        });

        self.register_parsed_schema(&fully_qualified_name, &schema, &aliases);
        Ok(schema)
    }

    /// Parse a `serde_json::Map` into a `RecordField`.
    fn parse_record_field(
        &mut self,
        field: &Map<String, Value>,
        position: usize,
        enclosing_record: &Name,
    ) -> AvroResult<RecordField> {
        let name = field.name().ok_or(Details::GetNameFieldFromRecord)?;

        validate_record_field_name(&name)?;

        let ty = field.get("type").ok_or(Details::GetRecordFieldTypeField)?;
        let schema = self.parse(ty, &enclosing_record.namespace)?;

        if let Some(logical_type) = field.get("logicalType") {
            warn!(
                "Ignored the {enclosing_record}.{name}.logicalType property (`{logical_type}`). It should probably be nested inside the `type` for the field"
            );
        }

        let default = field.get("default").cloned();
        self.resolve_default_value(
            &schema,
            &name,
            &enclosing_record.fullname(None),
            &default,
        )?;

        let aliases = field
            .get("aliases")
            .and_then(|aliases| {
                aliases.as_array().map(|aliases| {
                    aliases
                        .iter()
                        .flat_map(|alias| alias.as_str())
                        .map(|alias| alias.to_string())
                        .collect::<Vec<String>>()
                })
            })
            .unwrap_or_default();

        Ok(RecordField {
            name,
            doc: field.doc(),
            default,
            aliases,
            schema,
            position,
            custom_attributes: get_custom_attributes(
                field,
                &["type", "name", "doc", "default", "aliases"],
            ),
        })
    }

    /// Checks that the recorded `default` of a field can actually be resolved
    /// against the field schema.
    fn resolve_default_value(
        &self,
        field_schema: &Schema,
        field_name: &str,
        record_name: &str,
        default: &Option<Value>,
    ) -> AvroResult<()> {
        if let Some(value) = default {
            let avro_value = types::Value::try_from(value.clone())?;
            match field_schema {
                Schema::Union(union_schema) => {
                    let schemas = &union_schema.schemas;
                    let resolved = schemas.iter().any(|schema| {
                        avro_value
                            .to_owned()
                            .resolve_internal(
                                schema,
                                &self.parsed_schemas,
                                &schema.namespace(),
                                &None,
                            )
                            .is_ok()
                    });

                    if !resolved {
                        let schema: Option<&Schema> = schemas.first();
                        return match schema {
                            Some(first_schema) => Err(Details::GetDefaultUnion(
                                SchemaKind::from(first_schema),
                                types::ValueKind::from(&avro_value),
                            )
                            .into()),
                            None => Err(Details::EmptyUnion.into()),
                        };
                    }
                }
                _ => {
                    let resolved = avro_value
                        .resolve_internal(
                            field_schema,
                            &self.parsed_schemas,
                            &field_schema.namespace(),
                            &None,
                        )
                        .is_ok();

                    if !resolved {
                        return Err(Details::GetDefaultRecordField(
                            field_name.to_string(),
                            record_name.to_string(),
                            field_schema.canonical_form(),
                        )
                        .into());
                    }
                }
            };
        }

        Ok(())
    }

    /// Parse a `serde_json::Map` representing an `enum` Avro schema.
    fn parse_enum(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: &Namespace,
    ) -> AvroResult<Schema> {
        let fully_qualified_name = Name::parse(complex, enclosing_namespace)?;
        let aliases = fix_aliases_namespace(complex.aliases(), &fully_qualified_name.namespace)?;

        let symbols: Vec<String> = complex
            .get("symbols")
            .and_then(|v| v.as_array())
            .ok_or(Details::GetEnumSymbolsField)
            .and_then(|symbols| {
                symbols
                    .iter()
                    .map(|symbol| symbol.as_str().map(|s| s.to_string()))
                    .collect::<Option<_>>()
                    .ok_or(Details::GetEnumSymbols)
            })?;

        let mut existing_symbols: HashSet<&String> = HashSet::with_capacity(symbols.len());
        for symbol in symbols.iter() {
            validate_enum_symbol_name(symbol)?;

            if existing_symbols.contains(&symbol) {
                return Err(Details::EnumSymbolDuplicate(symbol.to_string()).into());
            }
            existing_symbols.insert(symbol);
        }

        let default = complex.get("default");
        let default_symbol = match default {
            Some(Value::String(s)) => {
                if !symbols.contains(s) {
                    return Err(Details::GetEnumDefault {
                        symbol: s.clone(),
                        symbols,
                    }
                    .into());
                }
                Some(s.clone())
            }
            Some(other) => {
                return Err(Details::EnumDefaultWrongType(other.clone()).into());
            }
            None => None,
        };

        let schema = Schema::Enum(EnumSchema {
            name: fully_qualified_name.clone(),
            aliases: aliases.clone(),
            doc: complex.doc(),
            symbols,
            default: default_symbol,
            attributes: get_custom_attributes(complex, &["symbols", "default"]),
        });

        self.register_parsed_schema(&fully_qualified_name, &schema, &aliases);

        Ok(schema)
    }

    /// Parse a `serde_json::Map` representing an `array` Avro schema.
    fn parse_array(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: &Namespace,
    ) -> AvroResult<Schema> {
        complex
            .get("items")
            .ok_or_else(|| Details::GetArrayItemsField.into())
            .and_then(|items| self.parse(items, enclosing_namespace))
            .map(|items| {
                Schema::Array(ArraySchema {
                    items: Box::new(items),
                    attributes: get_custom_attributes(complex, &["items"]),
                })
            })
    }

    /// Parse a `serde_json::Map` representing a `map` Avro schema.
    fn parse_map(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: &Namespace,
    ) -> AvroResult<Schema> {
        complex
            .get("values")
            .ok_or_else(|| Details::GetMapValuesField.into())
            .and_then(|items| self.parse(items, enclosing_namespace))
            .map(|items| {
                Schema::Map(MapSchema {
                    types: Box::new(items),
                    attributes: get_custom_attributes(complex, &["values"]),
                })
            })
    }

    /// Parse a `serde_json::Value` representing an Avro union type.
    fn parse_union(
        &mut self,
        items: &[Value],
        enclosing_namespace: &Namespace,
    ) -> AvroResult<Schema> {
        items
            .iter()
            .map(|v| self.parse(v, enclosing_namespace))
            .collect::<Result<Vec<_>, _>>()
            .and_then(|schemas| {
                if schemas.is_empty() {
                    return Err(Details::EmptyUnion.into());
                }
                UnionSchema::new(schemas).map(Schema::Union)
            })
    }

    /// Parse a `serde_json::Map` representing a `fixed` Avro schema.
    fn parse_fixed(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: &Namespace,
    ) -> AvroResult<Schema> {
        let fully_qualified_name = Name::parse(complex, enclosing_namespace)?;
        let aliases = fix_aliases_namespace(complex.aliases(), &fully_qualified_name.namespace)?;

        let size_opt = complex.get("size");
        if size_opt.is_none() {
            return Err(Details::GetFixedSizeField.into());
        }

        let doc = complex.doc();

        let size = match size_opt {
            Some(size) => size
                .as_u64()
                .ok_or_else(|| Details::GetFixedSizeFieldPositive(size.clone())),
            None => Err(Details::GetFixedSizeField),
        }?;

        let schema = Schema::Fixed(FixedSchema {
            name: fully_qualified_name.clone(),
            aliases: aliases.clone(),
            doc,
            size: size as usize,
            attributes: get_custom_attributes(complex, &["size", "precision", "scale"]),
        });

        self.register_parsed_schema(&fully_qualified_name, &schema, &aliases);

        Ok(schema)
    }
}

/// A convenience function to build the custom attributes of a complex type
/// from its JSON object, excluding the given reserved keys.
fn get_custom_attributes(
    complex: &Map<String, Value>,
    excluded: &[&str],
) -> BTreeMap<String, Value> {
    let mut custom_attributes: BTreeMap<String, Value> = BTreeMap::new();
    for (key, value) in complex {
        match key.as_str() {
            "type" | "name" | "namespace" | "doc" | "aliases" | "logicalType" => continue,
            candidate if excluded.contains(&candidate) => continue,
            _ => custom_attributes.insert(key.clone(), value.clone()),
        };
    }
    custom_attributes
}

/// Takes aliases as a plain list of strings and pairs them with the namespace
/// of the type they alias when they don't carry their own.
fn fix_aliases_namespace(
    aliases: Option<Vec<String>>,
    namespace: &Namespace,
) -> AvroResult<Aliases> {
    match aliases {
        Some(aliases) => {
            let mut fixed = Vec::with_capacity(aliases.len());
            for alias in aliases {
                let alias = if alias.find('.').is_none() {
                    match namespace {
                        Some(ns) => format!("{ns}.{alias}"),
                        None => alias,
                    }
                } else {
                    alias
                };
                fixed.push(Alias::new(&alias)?);
            }
            Ok(Some(fixed))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestResult;
    use crate::error::Error;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unknown_name_is_an_error() {
        match Schema::parse_str(r#""notatype""#).map_err(Error::into_details) {
            Err(Details::ParsePrimitive(name)) => assert_eq!(name, "notatype"),
            other => panic!("Expected Details::ParsePrimitive, got {other:?}"),
        }
    }

    #[test]
    fn test_default_must_match_field_schema() {
        let schema = Schema::parse_str(
            r#"
            {
                "type": "record",
                "name": "test",
                "fields": [
                    {"name": "a", "type": "long", "default": "not a long"}
                ]
            }
        "#,
        );
        assert!(schema.is_err());
    }

    #[test]
    fn test_union_default_may_match_any_branch() -> TestResult {
        let schema = Schema::parse_str(
            r#"
            {
                "type": "record",
                "name": "test",
                "fields": [
                    {"name": "a", "type": ["null", "int"], "default": null}
                ]
            }
        "#,
        )?;
        assert!(matches!(schema, Schema::Record(_)));
        Ok(())
    }

    #[test]
    fn test_aliases_inherit_namespace() -> TestResult {
        let schema = Schema::parse_str(
            r#"
            {
                "type": "fixed",
                "name": "F",
                "namespace": "space",
                "aliases": ["G"],
                "size": 2
            }
        "#,
        )?;
        match schema {
            Schema::Fixed(FixedSchema { aliases, .. }) => {
                let aliases = aliases.unwrap();
                assert_eq!(aliases.len(), 1);
                assert_eq!(aliases[0].fullname(None), "space.G");
            }
            other => panic!("Expected a fixed schema, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_enum_default_must_be_a_symbol() {
        let schema = Schema::parse_str(
            r#"{"type": "enum", "name": "Suit", "symbols": ["a", "b"], "default": "c"}"#,
        );
        assert!(schema.is_err());
    }
}
