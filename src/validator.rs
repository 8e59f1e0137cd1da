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

//! Validation of names according to the
//! [Avro specification](https://avro.apache.org/docs/++version++/specification/#names).

use crate::{AvroResult, error::Details, schema::Namespace};
use regex_lite::Regex;
use std::sync::OnceLock;

fn schema_name_regex() -> &'static Regex {
    static SCHEMA_NAME_ONCE: OnceLock<Regex> = OnceLock::new();
    SCHEMA_NAME_ONCE.get_or_init(|| {
        Regex::new(
            // An optional namespace (with optional dots) followed by a name
            // without any dots in it.
            r"^((?P<namespace>([A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*)?)\.)?(?P<name>[A-Za-z_][A-Za-z0-9_]*)$",
        )
        .unwrap()
    })
}

fn namespace_regex() -> &'static Regex {
    static NAMESPACE_ONCE: OnceLock<Regex> = OnceLock::new();
    NAMESPACE_ONCE.get_or_init(|| {
        Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*)?$").unwrap()
    })
}

fn simple_name_regex() -> &'static Regex {
    static SIMPLE_NAME_ONCE: OnceLock<Regex> = OnceLock::new();
    SIMPLE_NAME_ONCE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap())
}

/// Validates a schema name and splits it into its name and namespace parts.
pub(crate) fn validate_schema_name(schema_name: &str) -> AvroResult<(String, Namespace)> {
    let regex = schema_name_regex();
    let caps = regex
        .captures(schema_name)
        .ok_or_else(|| Details::InvalidSchemaName(schema_name.to_string(), regex.as_str()))?;
    let name = caps
        .name("name")
        .expect("Regex has a group named `name`")
        .as_str()
        .to_string();
    let namespace = caps
        .name("namespace")
        .map(|ns| ns.as_str().to_string())
        .filter(|ns| !ns.is_empty());
    Ok((name, namespace))
}

/// Validates a namespace string.
pub(crate) fn validate_namespace(ns: &str) -> AvroResult<()> {
    let regex = namespace_regex();
    if !regex.is_match(ns) {
        return Err(Details::InvalidNamespace(ns.to_string(), regex.as_str()).into());
    }
    Ok(())
}

/// Validates the symbol of an enum.
pub(crate) fn validate_enum_symbol_name(symbol: &str) -> AvroResult<()> {
    if !simple_name_regex().is_match(symbol) {
        return Err(Details::EnumSymbolName(symbol.to_string()).into());
    }
    Ok(())
}

/// Validates the name of a record field.
pub(crate) fn validate_record_field_name(name: &str) -> AvroResult<()> {
    if !simple_name_regex().is_match(name) {
        return Err(Details::FieldName(name.to_string()).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestResult;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_validate_schema_name() -> TestResult {
        assert_eq!(
            validate_schema_name("some_name")?,
            ("some_name".to_string(), None)
        );
        assert_eq!(
            validate_schema_name("some_namespace.some_name")?,
            (
                "some_name".to_string(),
                Some("some_namespace".to_string())
            )
        );
        assert!(validate_schema_name("").is_err());
        assert!(validate_schema_name(" ").is_err());
        assert!(validate_schema_name("some_namespace.").is_err());
        assert!(validate_schema_name("9name").is_err());
        Ok(())
    }

    /// Names and namespaces can be constructed entirely by underscores.
    #[test]
    fn test_funny_valid_names_and_namespaces() {
        for funny_name in ["_", "_._", "__._", "_.__", "_._._"] {
            assert!(validate_schema_name(funny_name).is_ok());
        }
    }

    #[test]
    fn test_validate_enum_symbol_name() {
        assert!(validate_enum_symbol_name("spades").is_ok());
        assert!(validate_enum_symbol_name("SPADES_2").is_ok());
        assert!(validate_enum_symbol_name("2spades").is_err());
        assert!(validate_enum_symbol_name("spa des").is_err());
        assert!(validate_enum_symbol_name("").is_err());
    }
}
