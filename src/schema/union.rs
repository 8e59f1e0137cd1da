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
use crate::error::Details;
use crate::schema::{Name, Namespace, Schema, SchemaKind};
use crate::types;
use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap, HashSet};

/// A description of a Union schema
#[derive(Debug, Clone)]
pub struct UnionSchema {
    /// The schemas that make up this union
    pub(crate) schemas: Vec<Schema>,
    // Used to ensure uniqueness of unnamed schema inputs, and provide constant
    // time finding of the schema index given a value. Named types are indexed
    // by fullname instead.
    variant_index: BTreeMap<SchemaKind, usize>,
}

impl UnionSchema {
    /// Creates a new UnionSchema from a vector of schemas.
    ///
    /// # Errors
    /// Will return an error if `schemas` has duplicate unnamed schemas, has
    /// named schemas with duplicate fullnames, or if `schemas` contains a
    /// union.
    pub fn new(schemas: Vec<Schema>) -> AvroResult<Self> {
        let mut vindex = BTreeMap::new();
        let mut seen_names = HashSet::new();
        for (i, schema) in schemas.iter().enumerate() {
            if let Schema::Union(_) = schema {
                return Err(Details::GetNestedUnion.into());
            }
            if let Some(name) = schema.name() {
                if !seen_names.insert(name.fullname(None)) {
                    return Err(Details::GetUnionDuplicateName(name.fullname(None)).into());
                }
            } else if vindex.insert(SchemaKind::from(schema), i).is_some() {
                return Err(Details::GetUnionDuplicate.into());
            }
        }
        Ok(UnionSchema {
            schemas,
            variant_index: vindex,
        })
    }

    /// Returns a slice to all variants of this schema.
    pub fn variants(&self) -> &[Schema] {
        &self.schemas
    }

    /// Returns true if any of the variants of this `UnionSchema` is `Null`.
    pub fn is_nullable(&self) -> bool {
        self.schemas.iter().any(|x| matches!(x, Schema::Null))
    }

    /// Optionally returns a reference to the first schema matched by this
    /// value, as well as its position within this union.
    pub(crate) fn find_schema<S: Borrow<Schema>>(
        &self,
        value: &types::Value,
        names: &HashMap<Name, S>,
        enclosing_namespace: &Namespace,
    ) -> Option<(usize, &Schema)> {
        let schema_kind = SchemaKind::from(value);
        if let Some(&i) = self.variant_index.get(&schema_kind) {
            // fast path
            Some((i, &self.schemas[i]))
        } else {
            // slow path (required for matching logical or named types)
            self.schemas.iter().enumerate().find(|(_, schema)| {
                let namespace = schema.namespace().or_else(|| enclosing_namespace.clone());
                value
                    .clone()
                    .resolve_internal(schema, names, &namespace, &None)
                    .is_ok()
            })
        }
    }
}

// No need to compare variant_index, it is derivative of schemas.
impl PartialEq for UnionSchema {
    fn eq(&self, other: &UnionSchema) -> bool {
        self.schemas.eq(&other.schemas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestResult;
    use crate::error::Error;

    #[test]
    fn test_union_rejects_nested_union() {
        let inner = UnionSchema::new(vec![Schema::Null, Schema::Int]).unwrap();
        match UnionSchema::new(vec![Schema::Union(inner)]).map_err(Error::into_details) {
            Err(Details::GetNestedUnion) => {}
            other => panic!("Expected Details::GetNestedUnion, got {other:?}"),
        }
    }

    #[test]
    fn test_union_rejects_duplicate_kind() {
        match UnionSchema::new(vec![Schema::Int, Schema::Int]).map_err(Error::into_details) {
            Err(Details::GetUnionDuplicate) => {}
            other => panic!("Expected Details::GetUnionDuplicate, got {other:?}"),
        }
    }

    #[test]
    fn test_union_allows_distinct_named_types() -> TestResult {
        let schema = Schema::parse_str(
            r#"[
                {"type": "fixed", "name": "a", "size": 4},
                {"type": "fixed", "name": "b", "size": 4}
            ]"#,
        )?;
        match schema {
            Schema::Union(union) => assert_eq!(union.variants().len(), 2),
            other => panic!("Expected a union, got {other:?}"),
        }
        Ok(())
    }
}
