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

use crate::AvroResult;
use crate::error::{Details, Error};
use crate::schema::{
    DecimalSchema, EnumSchema, FixedSchema, Names, NamesRef, Namespace, RecordSchema, Schema,
    UnionSchema,
};
use std::collections::HashMap;

/// The named types of one or more schemas, indexed by fully-qualified name.
///
/// Construction fails when a `Schema::Ref` points at a name that is not
/// defined anywhere in the given schemas, or when a name is defined twice.
pub struct ResolvedSchema<'s> {
    names_ref: NamesRef<'s>,
    root: &'s Schema,
}

impl<'s> TryFrom<&'s Schema> for ResolvedSchema<'s> {
    type Error = Error;

    fn try_from(schema: &'s Schema) -> AvroResult<Self> {
        let mut rs = ResolvedSchema {
            names_ref: HashMap::new(),
            root: schema,
        };
        rs.resolve(schema, &None)?;
        rs.check_refs(schema, &None)?;
        Ok(rs)
    }
}

impl<'s> ResolvedSchema<'s> {
    pub fn get_root_schema(&self) -> &'s Schema {
        self.root
    }

    pub fn get_names(&self) -> &NamesRef<'s> {
        &self.names_ref
    }

    fn resolve(&mut self, schema: &'s Schema, enclosing_namespace: &Namespace) -> AvroResult<()> {
        match schema {
            Schema::Array(schema) => self.resolve(&schema.items, enclosing_namespace),
            Schema::Map(schema) => self.resolve(&schema.types, enclosing_namespace),
            Schema::Union(UnionSchema { schemas, .. }) => {
                for schema in schemas {
                    self.resolve(schema, enclosing_namespace)?;
                }
                Ok(())
            }
            Schema::Enum(EnumSchema { name, .. })
            | Schema::Fixed(FixedSchema { name, .. })
            | Schema::Duration(FixedSchema { name, .. }) => {
                let fully_qualified_name = name.fully_qualified_name(enclosing_namespace);
                if self
                    .names_ref
                    .insert(fully_qualified_name.clone(), schema)
                    .is_some()
                {
                    Err(Details::AmbiguousSchemaDefinition(fully_qualified_name).into())
                } else {
                    Ok(())
                }
            }
            Schema::Decimal(DecimalSchema { inner, .. }) => {
                if let Schema::Fixed(FixedSchema { name, .. }) = inner.as_ref() {
                    let fully_qualified_name = name.fully_qualified_name(enclosing_namespace);
                    if self
                        .names_ref
                        .insert(fully_qualified_name.clone(), schema)
                        .is_some()
                    {
                        return Err(
                            Details::AmbiguousSchemaDefinition(fully_qualified_name).into()
                        );
                    }
                }
                Ok(())
            }
            Schema::Record(RecordSchema { name, fields, .. }) => {
                let fully_qualified_name = name.fully_qualified_name(enclosing_namespace);
                if self
                    .names_ref
                    .insert(fully_qualified_name.clone(), schema)
                    .is_some()
                {
                    Err(Details::AmbiguousSchemaDefinition(fully_qualified_name).into())
                } else {
                    let record_namespace = fully_qualified_name.namespace;
                    for field in fields {
                        self.resolve(&field.schema, &record_namespace)?;
                    }
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }

    /// Verify that every `Schema::Ref` points at a collected name.
    fn check_refs(&self, schema: &'s Schema, enclosing_namespace: &Namespace) -> AvroResult<()> {
        match schema {
            Schema::Array(schema) => self.check_refs(&schema.items, enclosing_namespace),
            Schema::Map(schema) => self.check_refs(&schema.types, enclosing_namespace),
            Schema::Union(UnionSchema { schemas, .. }) => {
                for schema in schemas {
                    self.check_refs(schema, enclosing_namespace)?;
                }
                Ok(())
            }
            Schema::Record(RecordSchema { name, fields, .. }) => {
                let record_namespace = name.fully_qualified_name(enclosing_namespace).namespace;
                for field in fields {
                    self.check_refs(&field.schema, &record_namespace)?;
                }
                Ok(())
            }
            Schema::Ref { name } => {
                let fully_qualified_name = name.fully_qualified_name(enclosing_namespace);
                if !self.names_ref.contains_key(&fully_qualified_name) {
                    Err(Details::SchemaResolutionError(fully_qualified_name).into())
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }
}

/// Collect the named types of `schema` into `names`, keyed by
/// fully-qualified name, with owned clones.
pub(crate) fn resolve_names(
    schema: &Schema,
    names: &mut Names,
    enclosing_namespace: &Namespace,
) -> AvroResult<()> {
    match schema {
        Schema::Array(inner) => resolve_names(&inner.items, names, enclosing_namespace),
        Schema::Map(inner) => resolve_names(&inner.types, names, enclosing_namespace),
        Schema::Union(UnionSchema { schemas, .. }) => {
            for schema in schemas {
                resolve_names(schema, names, enclosing_namespace)?;
            }
            Ok(())
        }
        Schema::Enum(EnumSchema { name, .. })
        | Schema::Fixed(FixedSchema { name, .. })
        | Schema::Duration(FixedSchema { name, .. }) => {
            let fully_qualified_name = name.fully_qualified_name(enclosing_namespace);
            if names
                .insert(fully_qualified_name.clone(), schema.clone())
                .is_some()
            {
                Err(Details::AmbiguousSchemaDefinition(fully_qualified_name).into())
            } else {
                Ok(())
            }
        }
        Schema::Decimal(DecimalSchema { inner, .. }) => {
            if let Schema::Fixed(FixedSchema { name, .. }) = inner.as_ref() {
                let fully_qualified_name = name.fully_qualified_name(enclosing_namespace);
                if names
                    .insert(fully_qualified_name.clone(), schema.clone())
                    .is_some()
                {
                    return Err(Details::AmbiguousSchemaDefinition(fully_qualified_name).into());
                }
            }
            Ok(())
        }
        Schema::Record(RecordSchema { name, fields, .. }) => {
            let fully_qualified_name = name.fully_qualified_name(enclosing_namespace);
            if names
                .insert(fully_qualified_name.clone(), schema.clone())
                .is_some()
            {
                Err(Details::AmbiguousSchemaDefinition(fully_qualified_name).into())
            } else {
                let record_namespace = fully_qualified_name.namespace;
                for field in fields {
                    resolve_names(&field.schema, names, &record_namespace)?;
                }
                Ok(())
            }
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestResult;

    #[test]
    fn test_resolved_schema_collects_names() -> TestResult {
        let schema = Schema::parse_str(
            r#"
            {
                "type": "record",
                "name": "LongList",
                "fields": [
                    {"name": "value", "type": "long"},
                    {"name": "next", "type": ["null", "LongList"]}
                ]
            }
        "#,
        )?;
        let rs = ResolvedSchema::try_from(&schema)?;
        assert_eq!(rs.get_names().len(), 1);
        assert!(
            rs.get_names()
                .contains_key(&crate::schema::Name::new("LongList")?)
        );
        Ok(())
    }

    #[test]
    fn test_dangling_ref_is_an_error() {
        let schema = Schema::Ref {
            name: crate::schema::Name::new("NoSuchType").unwrap(),
        };
        assert!(ResolvedSchema::try_from(&schema).is_err());
    }
}
