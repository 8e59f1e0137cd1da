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

//! **avrofile** reads and writes [Avro](https://avro.apache.org/) object
//! container files: self-describing, block-oriented binary files that embed
//! the schema of their contents in the file header.
//!
//! Data is handled through the generic [`Value`](types::Value) type, a tagged
//! variant over Avro's primitive and complex types. Mapping between `Value`
//! and application types is the caller's concern; this crate covers the
//! schema model, the binary encoding, and the container framing.
//!
//! # Writing
//!
//! ```
//! use avrofile::{Codec, Schema, Writer, types::Value};
//!
//! let schema = Schema::parse_str(r#""long""#)?;
//! let mut writer = Writer::with_codec(&schema, Vec::new(), Codec::Null)?;
//! writer.append(Value::Long(27))?;
//! let encoded = writer.into_inner()?;
//! # Ok::<(), avrofile::Error>(())
//! ```
//!
//! # Reading
//!
//! ```
//! # use avrofile::{Schema, Writer, types::Value};
//! # let schema = Schema::parse_str(r#""long""#)?;
//! # let mut writer = Writer::new(&schema, Vec::new())?;
//! # writer.append(Value::Long(27))?;
//! # let encoded = writer.into_inner()?;
//! use avrofile::Reader;
//!
//! for value in Reader::new(&encoded[..])? {
//!     assert_eq!(value?, Value::Long(27));
//! }
//! # Ok::<(), avrofile::Error>(())
//! ```

mod codec;
mod decimal;
mod decode;
mod duration;
mod encode;
mod reader;
mod writer;

pub mod error;
pub mod rabin;
pub mod schema;
pub mod schema_equality;
pub mod types;
pub mod util;
pub mod validator;

pub use codec::{Codec, DeflateSettings};
pub use decimal::Decimal;
pub use duration::{Days, Duration, Millis, Months};
pub use error::Error;
pub use reader::{Reader, from_avro_datum, read_marker};
pub use schema::Schema;
pub use uuid::Uuid;
pub use writer::{Writer, WriterBuilder, to_avro_datum};

/// A convenience type alias for `Result`s with `Error`s.
pub type AvroResult<T> = Result<T, Error>;

#[cfg(test)]
pub(crate) type TestResult = Result<(), Box<dyn std::error::Error>>;

#[cfg(test)]
mod tests {
    use crate::{
        Codec, Reader, Schema, TestResult, Writer,
        types::{Record, Value},
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn record_with_resolved_defaults() -> TestResult {
        let writer_raw_schema = r#"
            {
                "type": "record",
                "name": "test",
                "fields": [
                    {"name": "a", "type": "long", "default": 42},
                    {"name": "b", "type": "string"}
                ]
            }
        "#;
        let reader_raw_schema = r#"
            {
                "type": "record",
                "name": "test",
                "fields": [
                    {"name": "a", "type": "long", "default": 42},
                    {"name": "b", "type": "string"},
                    {
                        "name": "c",
                        "type": {
                            "type": "enum",
                            "name": "suit",
                            "symbols": ["diamonds", "spades", "clubs", "hearts"]
                        },
                        "default": "spades"
                    }
                ]
            }
        "#;
        let writer_schema = Schema::parse_str(writer_raw_schema)?;
        let reader_schema = Schema::parse_str(reader_raw_schema)?;
        let mut writer = Writer::with_codec(&writer_schema, Vec::new(), Codec::Null)?;
        let mut record = Record::new(writer.schema()).unwrap();
        record.put("a", 27i64);
        record.put("b", "foo");
        writer.append(record)?;
        let input = writer.into_inner()?;
        let mut reader = Reader::with_schema(&reader_schema, &input[..])?;
        assert_eq!(
            reader.next().unwrap()?,
            Value::Record(vec![
                ("a".to_string(), Value::Long(27)),
                ("b".to_string(), Value::String("foo".to_string())),
                ("c".to_string(), Value::Enum(1, "spades".to_string())),
            ])
        );
        assert!(reader.next().is_none());
        Ok(())
    }

    #[test]
    fn illformed_length_is_rejected() -> TestResult {
        let raw_schema = r#"
            {
                "type": "record",
                "name": "test",
                "fields": [
                    {"name": "a", "type": "long", "default": 42},
                    {"name": "b", "type": "string"}
                ]
            }
        "#;

        let schema = Schema::parse_str(raw_schema)?;

        // Would allocate 18446744073709551605 bytes
        let illformed: &[u8] = &[0x3e, 0x15, 0xff, 0x1f, 0x15, 0xff];

        let value = crate::from_avro_datum(&schema, &mut &*illformed, None);
        assert!(value.is_err());
        Ok(())
    }
}
