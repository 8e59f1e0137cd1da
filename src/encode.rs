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

use crate::{
    AvroResult,
    error::Details,
    schema::{
        DecimalSchema, EnumSchema, FixedSchema, Name, Namespace, RecordSchema, ResolvedSchema,
        Schema, SchemaKind,
    },
    types::{Value, ValueKind},
    util::{zig_i32, zig_i64},
};
use log::error;
use std::{borrow::Borrow, collections::HashMap, io::Write};

/// Encode a `Value` into avro format.
///
/// **NOTE** This will not perform schema validation. The value is assumed to
/// be valid with regards to the schema. Schema are needed only to guide the
/// encoding for complex type values.
pub fn encode<W: Write>(value: &Value, schema: &Schema, writer: &mut W) -> AvroResult<usize> {
    let rs = ResolvedSchema::try_from(schema)?;
    encode_internal(value, schema, rs.get_names(), &None, writer)
}

pub(crate) fn encode_bytes<B: AsRef<[u8]> + ?Sized, W: Write>(
    s: &B,
    mut writer: W,
) -> AvroResult<usize> {
    let bytes = s.as_ref();
    encode_long(bytes.len() as i64, &mut writer)?;
    writer
        .write(bytes)
        .map_err(|e| Details::WriteBytes(e).into())
}

pub(crate) fn encode_long<W: Write>(i: i64, writer: W) -> AvroResult<usize> {
    zig_i64(i, writer)
}

pub(crate) fn encode_int<W: Write>(i: i32, writer: W) -> AvroResult<usize> {
    zig_i32(i, writer)
}

pub(crate) fn encode_internal<W: Write, S: Borrow<Schema>>(
    value: &Value,
    schema: &Schema,
    names: &HashMap<Name, S>,
    enclosing_namespace: &Namespace,
    writer: &mut W,
) -> AvroResult<usize> {
    if let Schema::Ref { name } = schema {
        let fully_qualified_name = name.fully_qualified_name(enclosing_namespace);
        let resolved = names
            .get(&fully_qualified_name)
            .ok_or(Details::SchemaResolutionError(fully_qualified_name))?;
        return encode_internal(value, resolved.borrow(), names, enclosing_namespace, writer);
    }

    // A union encodes the index of the branch the value matches, followed by
    // the value encoded with the branch schema. A value that is not wrapped
    // in `Value::Union` is placed into the first matching branch.
    if let Schema::Union(union) = schema {
        return match value {
            Value::Union(idx, item) => {
                let inner = union.variants().get(*idx as usize).ok_or(
                    Details::GetUnionVariant {
                        index: *idx as i64,
                        num_variants: union.variants().len(),
                    },
                )?;
                let mut written = encode_long(*idx as i64, &mut *writer)?;
                written += encode_internal(item, inner, names, enclosing_namespace, writer)?;
                Ok(written)
            }
            other => {
                let (idx, inner) = union
                    .find_schema(other, names, enclosing_namespace)
                    .ok_or_else(|| Details::FindUnionVariant {
                        schema: union.clone(),
                        value: other.clone(),
                    })?;
                let mut written = encode_long(idx as i64, &mut *writer)?;
                written += encode_internal(other, inner, names, enclosing_namespace, writer)?;
                Ok(written)
            }
        };
    }

    match value {
        Value::Null => {
            if let Schema::Null = schema {
                Ok(0)
            } else {
                Err(Details::EncodeValueAsSchemaError {
                    value_kind: ValueKind::Null,
                    supported_schema: vec![SchemaKind::Null, SchemaKind::Union],
                }
                .into())
            }
        }
        Value::Boolean(b) => writer
            .write(&[u8::from(*b)])
            .map_err(|e| Details::WriteBytes(e).into()),
        // Pattern | Pattern here to signify that these _must_ have the same encoding.
        Value::Int(i) | Value::Date(i) | Value::TimeMillis(i) => encode_int(*i, writer),
        Value::Long(i)
        | Value::TimestampMillis(i)
        | Value::TimestampMicros(i)
        | Value::TimeMicros(i) => encode_long(*i, writer),
        Value::Float(x) => writer
            .write(&x.to_le_bytes())
            .map_err(|e| Details::WriteBytes(e).into()),
        Value::Double(x) => writer
            .write(&x.to_le_bytes())
            .map_err(|e| Details::WriteBytes(e).into()),
        Value::Decimal(decimal) => match schema {
            Schema::Decimal(DecimalSchema { inner, .. }) => match inner.as_ref() {
                Schema::Fixed(FixedSchema { size, .. }) => {
                    let bytes = decimal.to_sign_extended_bytes_with_len(*size)?;
                    encode_internal(
                        &Value::Fixed(*size, bytes),
                        inner,
                        names,
                        enclosing_namespace,
                        writer,
                    )
                }
                Schema::Bytes => {
                    let bytes: Vec<u8> = decimal.try_into()?;
                    encode_bytes(&bytes, writer)
                }
                other => {
                    Err(Details::EncodeValueAsSchemaError {
                        value_kind: ValueKind::Decimal,
                        supported_schema: vec![SchemaKind::from(other)],
                    }
                    .into())
                }
            },
            _ => Err(Details::EncodeValueAsSchemaError {
                value_kind: ValueKind::Decimal,
                supported_schema: vec![SchemaKind::Decimal],
            }
            .into()),
        },
        &Value::Duration(duration) => {
            let slice: [u8; 12] = duration.into();
            writer
                .write(&slice)
                .map_err(|e| Details::WriteBytes(e).into())
        }
        Value::Uuid(uuid) => encode_bytes(&uuid.to_string(), writer),
        Value::Bytes(bytes) => match *schema {
            Schema::Bytes => encode_bytes(bytes, writer),
            Schema::Decimal(DecimalSchema { ref inner, .. }) => match inner.as_ref() {
                Schema::Fixed(_) => writer
                    .write(bytes.as_slice())
                    .map_err(|e| Details::WriteBytes(e).into()),
                _ => encode_bytes(bytes, writer),
            },
            Schema::Fixed { .. } => writer
                .write(bytes.as_slice())
                .map_err(|e| Details::WriteBytes(e).into()),
            _ => Err(Details::EncodeValueAsSchemaError {
                value_kind: ValueKind::Bytes,
                supported_schema: vec![SchemaKind::Bytes, SchemaKind::Fixed],
            }
            .into()),
        },
        Value::String(s) => match *schema {
            Schema::String | Schema::Uuid => encode_bytes(s, writer),
            Schema::Enum(EnumSchema { ref symbols, .. }) => {
                if let Some(index) = symbols.iter().position(|item| item == s) {
                    encode_int(index as i32, writer)
                } else {
                    error!("Invalid symbol string {:?}.", &s[..]);
                    Err(Details::GetEnumSymbol(s.clone()).into())
                }
            }
            _ => Err(Details::EncodeValueAsSchemaError {
                value_kind: ValueKind::String,
                supported_schema: vec![SchemaKind::String, SchemaKind::Enum],
            }
            .into()),
        },
        Value::Fixed(_, bytes) => writer
            .write(bytes.as_slice())
            .map_err(|e| Details::WriteBytes(e).into()),
        Value::Enum(i, _) => encode_int(*i as i32, writer),
        Value::Union(_, _) => {
            // Unions are handled before the value dispatch; a union value
            // against a non-union schema cannot be encoded.
            error!("invalid schema type for Union: {schema:?}");
            Err(Details::EncodeValueAsSchemaError {
                value_kind: ValueKind::Union,
                supported_schema: vec![SchemaKind::Union],
            }
            .into())
        }
        Value::Array(items) => {
            if let Schema::Array(ref inner) = *schema {
                if !items.is_empty() {
                    encode_long(items.len() as i64, &mut *writer)?;
                    for item in items.iter() {
                        encode_internal(
                            item,
                            &inner.items,
                            names,
                            enclosing_namespace,
                            &mut *writer,
                        )?;
                    }
                }
                writer
                    .write(&[0u8])
                    .map_err(|e| Details::WriteBytes(e).into())
            } else {
                error!("invalid schema type for Array: {schema:?}");
                Err(Details::EncodeValueAsSchemaError {
                    value_kind: ValueKind::Array,
                    supported_schema: vec![SchemaKind::Array],
                }
                .into())
            }
        }
        Value::Map(items) => {
            if let Schema::Map(ref inner) = *schema {
                if !items.is_empty() {
                    encode_long(items.len() as i64, &mut *writer)?;
                    for (key, value) in items {
                        encode_bytes(key, &mut *writer)?;
                        encode_internal(
                            value,
                            &inner.types,
                            names,
                            enclosing_namespace,
                            &mut *writer,
                        )?;
                    }
                }
                writer
                    .write(&[0u8])
                    .map_err(|e| Details::WriteBytes(e).into())
            } else {
                error!("invalid schema type for Map: {schema:?}");
                Err(Details::EncodeValueAsSchemaError {
                    value_kind: ValueKind::Map,
                    supported_schema: vec![SchemaKind::Map],
                }
                .into())
            }
        }
        Value::Record(value_fields) => {
            if let Schema::Record(RecordSchema {
                ref name,
                fields: ref schema_fields,
                ..
            }) = *schema
            {
                let record_namespace = name.fully_qualified_name(enclosing_namespace).namespace;

                let mut lookup = HashMap::new();
                value_fields.iter().for_each(|(name, field)| {
                    lookup.insert(name, field);
                });

                let mut written_bytes = 0;
                for schema_field in schema_fields.iter() {
                    let name = &schema_field.name;
                    let value_opt = lookup.get(name).or_else(|| {
                        schema_field
                            .aliases
                            .iter()
                            .find_map(|alias| lookup.get(alias))
                    });

                    if let Some(value) = value_opt {
                        written_bytes += encode_internal(
                            value,
                            &schema_field.schema,
                            names,
                            &record_namespace,
                            writer,
                        )?;
                    } else if let Some(ref default) = schema_field.default {
                        // a field left out of the value is written from its
                        // declared default
                        let default = Value::try_from(default.clone())?.resolve_internal(
                            &schema_field.schema,
                            names,
                            &record_namespace,
                            &schema_field.default,
                        )?;
                        written_bytes += encode_internal(
                            &default,
                            &schema_field.schema,
                            names,
                            &record_namespace,
                            writer,
                        )?;
                    } else {
                        return Err(Details::GetField(name.clone()).into());
                    }
                }
                Ok(written_bytes)
            } else {
                error!("invalid schema type for Record: {schema:?}");
                Err(Details::EncodeValueAsSchemaError {
                    value_kind: ValueKind::Record,
                    supported_schema: vec![SchemaKind::Record, SchemaKind::Union],
                }
                .into())
            }
        }
    }
}

pub fn encode_to_vec(value: &Value, schema: &Schema) -> AvroResult<Vec<u8>> {
    let mut buffer = Vec::new();
    encode(value, schema, &mut buffer)?;
    Ok(buffer)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::TestResult;
    use pretty_assertions::assert_eq;

    pub(crate) fn success(value: &Value, schema: &Schema) -> String {
        format!(
            "Value: {:?}\n should encode with schema:\n{:?}",
            &value, &schema
        )
    }

    #[test]
    fn test_encode_empty_array() {
        let mut buf = Vec::new();
        let empty: Vec<Value> = Vec::new();
        encode(
            &Value::Array(empty.clone()),
            &Schema::array(Schema::Int),
            &mut buf,
        )
        .expect(&success(&Value::Array(empty), &Schema::array(Schema::Int)));
        assert_eq!(vec![0u8], buf);
    }

    #[test]
    fn test_encode_empty_map() {
        let mut buf = Vec::new();
        let empty: HashMap<String, Value> = HashMap::new();
        encode(
            &Value::Map(empty.clone()),
            &Schema::map(Schema::Int),
            &mut buf,
        )
        .expect(&success(&Value::Map(empty), &Schema::map(Schema::Int)));
        assert_eq!(vec![0u8], buf);
    }

    #[test]
    fn test_encode_union_branch_index_precedes_payload() -> TestResult {
        let schema = Schema::parse_str(r#"["null", "int"]"#)?;

        let mut buf = Vec::new();
        encode(&Value::Union(0, Box::new(Value::Null)), &schema, &mut buf)?;
        assert_eq!(buf, vec![0u8]);

        buf.clear();
        encode(&Value::Union(1, Box::new(Value::Int(42))), &schema, &mut buf)?;
        assert_eq!(buf, vec![2u8, 84u8]);
        Ok(())
    }

    #[test]
    fn test_encode_unwrapped_value_into_union() -> TestResult {
        let schema = Schema::parse_str(r#"["null", "int"]"#)?;

        let mut buf = Vec::new();
        encode(&Value::Null, &schema, &mut buf)?;
        assert_eq!(buf, vec![0u8]);

        buf.clear();
        encode(&Value::Int(42), &schema, &mut buf)?;
        assert_eq!(buf, vec![2u8, 84u8]);
        Ok(())
    }

    #[test]
    fn test_encode_value_with_no_union_branch_fails() -> TestResult {
        let schema = Schema::parse_str(r#"["null", "int"]"#)?;
        let mut buf = Vec::new();
        assert!(encode(&Value::String("x".into()), &schema, &mut buf).is_err());
        Ok(())
    }

    #[test]
    fn test_encode_record_from_declared_field_defaults() -> TestResult {
        let schema = Schema::parse_str(
            r#"
            {
                "type": "record",
                "name": "test",
                "fields": [
                    {"name": "a", "type": "long", "default": 42}
                ]
            }
        "#,
        )?;
        let mut buf = Vec::new();
        encode(&Value::Record(vec![]), &schema, &mut buf)?;
        assert_eq!(buf, vec![84u8]);
        Ok(())
    }

    #[test]
    fn test_encode_record_missing_field_without_default_fails() -> TestResult {
        let schema = Schema::parse_str(
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
        let mut buf = Vec::new();
        assert!(encode(&Value::Record(vec![]), &schema, &mut buf).is_err());
        Ok(())
    }

    #[test]
    fn test_encode_recursive_record() -> TestResult {
        let mut buf = Vec::new();
        let schema = Schema::parse_str(
            r#"
            {
                "type":"record",
                "name":"TestStruct",
                "fields": [
                    {
                        "name":"a",
                        "type":{
                            "type":"record",
                            "name": "Inner",
                            "fields": [ {
                                "name":"z",
                                "type":"int"
                            }]
                        }
                    },
                    {
                        "name":"b",
                        "type":"Inner"
                    }
                ]
            }"#,
        )?;

        let inner_value1 = Value::Record(vec![("z".into(), Value::Int(3))]);
        let inner_value2 = Value::Record(vec![("z".into(), Value::Int(6))]);
        let outer_value =
            Value::Record(vec![("a".into(), inner_value1), ("b".into(), inner_value2)]);
        encode(&outer_value, &schema, &mut buf)?;
        assert_eq!(buf, vec![6u8, 12u8]);
        Ok(())
    }

    #[test]
    fn test_encode_duration_layout() -> TestResult {
        use crate::{Days, Duration, Millis, Months};

        let schema = Schema::parse_str(
            r#"{"type": "fixed", "name": "d", "size": 12, "logicalType": "duration"}"#,
        )?;
        let value = Value::Duration(Duration::new(
            Months::new(1),
            Days::new(2),
            Millis::new(3),
        ));
        let mut buf = Vec::new();
        encode(&value, &schema, &mut buf)?;
        assert_eq!(buf, vec![1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0]);
        Ok(())
    }
}
