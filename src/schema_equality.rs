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

//! Structural comparison of schemas, backing `impl PartialEq for Schema`.
//!
//! Named types are compared by fully-qualified name *and* by shape, so that
//! ill-formed inputs reusing a name for two different definitions do not
//! compare equal.

use crate::schema::{
    ArraySchema, DecimalSchema, EnumSchema, FixedSchema, MapSchema, RecordSchema, Schema,
    UnionSchema,
};

/// Compare two schemas for structural equality.
pub fn compare_schemata(one: &Schema, two: &Schema) -> bool {
    match (one, two) {
        (Schema::Null, Schema::Null)
        | (Schema::Boolean, Schema::Boolean)
        | (Schema::Int, Schema::Int)
        | (Schema::Long, Schema::Long)
        | (Schema::Float, Schema::Float)
        | (Schema::Double, Schema::Double)
        | (Schema::Bytes, Schema::Bytes)
        | (Schema::String, Schema::String)
        | (Schema::Uuid, Schema::Uuid)
        | (Schema::Date, Schema::Date)
        | (Schema::TimeMillis, Schema::TimeMillis)
        | (Schema::TimeMicros, Schema::TimeMicros)
        | (Schema::TimestampMillis, Schema::TimestampMillis)
        | (Schema::TimestampMicros, Schema::TimestampMicros) => true,
        (Schema::Array(ArraySchema { items: one, .. }), Schema::Array(ArraySchema { items: two, .. })) => {
            compare_schemata(one, two)
        }
        (Schema::Map(MapSchema { types: one, .. }), Schema::Map(MapSchema { types: two, .. })) => {
            compare_schemata(one, two)
        }
        (Schema::Union(UnionSchema { schemas: one, .. }), Schema::Union(UnionSchema { schemas: two, .. })) => {
            one.len() == two.len()
                && one
                    .iter()
                    .zip(two.iter())
                    .all(|(s1, s2)| compare_schemata(s1, s2))
        }
        (
            Schema::Record(RecordSchema {
                name: name_one,
                fields: fields_one,
                ..
            }),
            Schema::Record(RecordSchema {
                name: name_two,
                fields: fields_two,
                ..
            }),
        ) => {
            name_one.fullname(None) == name_two.fullname(None)
                && fields_one.len() == fields_two.len()
                && fields_one.iter().zip(fields_two.iter()).all(|(f1, f2)| {
                    f1.name == f2.name
                        && f1.default == f2.default
                        && compare_schemata(&f1.schema, &f2.schema)
                })
        }
        (
            Schema::Enum(EnumSchema {
                name: name_one,
                symbols: symbols_one,
                ..
            }),
            Schema::Enum(EnumSchema {
                name: name_two,
                symbols: symbols_two,
                ..
            }),
        ) => name_one.fullname(None) == name_two.fullname(None) && symbols_one == symbols_two,
        (
            Schema::Fixed(FixedSchema {
                name: name_one,
                size: size_one,
                ..
            }),
            Schema::Fixed(FixedSchema {
                name: name_two,
                size: size_two,
                ..
            }),
        )
        | (
            Schema::Duration(FixedSchema {
                name: name_one,
                size: size_one,
                ..
            }),
            Schema::Duration(FixedSchema {
                name: name_two,
                size: size_two,
                ..
            }),
        ) => name_one.fullname(None) == name_two.fullname(None) && size_one == size_two,
        (
            Schema::Decimal(DecimalSchema {
                precision: precision_one,
                scale: scale_one,
                inner: inner_one,
            }),
            Schema::Decimal(DecimalSchema {
                precision: precision_two,
                scale: scale_two,
                inner: inner_two,
            }),
        ) => {
            precision_one == precision_two
                && scale_one == scale_two
                && compare_schemata(inner_one, inner_two)
        }
        // A reference compares equal to another reference, or to the named
        // type it points at, by fully-qualified name.
        (Schema::Ref { name: name_one }, Schema::Ref { name: name_two }) => {
            name_one.fullname(None) == name_two.fullname(None)
        }
        (Schema::Ref { name }, other) | (other, Schema::Ref { name }) => other
            .name()
            .map(|other_name| name.fullname(None) == other_name.fullname(None))
            .unwrap_or(false),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestResult;
    use crate::schema::Name;

    #[test]
    fn test_primitive_equality() {
        assert!(compare_schemata(&Schema::Int, &Schema::Int));
        assert!(!compare_schemata(&Schema::Int, &Schema::Long));
        assert!(!compare_schemata(&Schema::String, &Schema::Bytes));
    }

    #[test]
    fn test_array_map_equality() {
        assert!(compare_schemata(
            &Schema::array(Schema::Int),
            &Schema::array(Schema::Int)
        ));
        assert!(!compare_schemata(
            &Schema::array(Schema::Int),
            &Schema::map(Schema::Int)
        ));
    }

    #[test]
    fn test_record_equality_by_name_and_shape() -> TestResult {
        let one = Schema::parse_str(
            r#"{"type": "record", "name": "A", "fields": [{"name": "f", "type": "int"}]}"#,
        )?;
        let two = Schema::parse_str(
            r#"{"type": "record", "name": "A", "fields": [{"name": "f", "type": "int"}]}"#,
        )?;
        let other_name = Schema::parse_str(
            r#"{"type": "record", "name": "B", "fields": [{"name": "f", "type": "int"}]}"#,
        )?;
        let other_shape = Schema::parse_str(
            r#"{"type": "record", "name": "A", "fields": [{"name": "f", "type": "long"}]}"#,
        )?;
        assert!(compare_schemata(&one, &two));
        assert!(!compare_schemata(&one, &other_name));
        assert!(!compare_schemata(&one, &other_shape));
        Ok(())
    }

    #[test]
    fn test_ref_matches_named_type() -> TestResult {
        let fixed = Schema::parse_str(r#"{"type": "fixed", "name": "F", "size": 2}"#)?;
        let reference = Schema::Ref {
            name: Name::new("F")?,
        };
        assert!(compare_schemata(&fixed, &reference));
        assert!(compare_schemata(&reference, &fixed));
        Ok(())
    }

    #[test]
    fn test_logical_type_not_equal_to_base() -> TestResult {
        let date = Schema::parse_str(r#"{"type": "int", "logicalType": "date"}"#)?;
        assert!(!compare_schemata(&date, &Schema::Int));
        Ok(())
    }
}
