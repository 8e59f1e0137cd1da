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

//! Logic handling reading from Avro format at user level.

use crate::{
    AvroResult, Codec, Error,
    decode::{decode, decode_internal},
    error::Details,
    schema::{Names, Schema, resolve_names},
    types::Value,
    util,
};
use log::warn;
use serde_json::from_slice;
use std::{
    collections::HashMap,
    io::{ErrorKind, Read},
    str::FromStr,
};

/// Internal Block reader.
struct Block<R> {
    reader: R,
    /// Internal buffering to reduce allocation.
    buf: Vec<u8>,
    buf_idx: usize,
    /// Number of elements expected to exist within this block.
    message_count: usize,
    marker: [u8; 16],
    codec: Codec,
    writer_schema: Schema,
    names: Names,
    user_metadata: HashMap<String, Vec<u8>>,
}

impl<R: Read> Block<R> {
    fn new(reader: R) -> AvroResult<Block<R>> {
        let mut block = Block {
            reader,
            codec: Codec::Null,
            writer_schema: Schema::Null,
            buf: vec![],
            buf_idx: 0,
            message_count: 0,
            marker: [0; 16],
            names: Default::default(),
            user_metadata: Default::default(),
        };

        block.read_header()?;
        Ok(block)
    }

    /// Try to read the header and to set the writer `Schema`, the `Codec` and
    /// the marker based on its content.
    fn read_header(&mut self) -> AvroResult<()> {
        let mut buf = [0u8; 4];
        self.reader
            .read_exact(&mut buf)
            .map_err(Details::ReadHeader)?;

        if buf != [b'O', b'b', b'j', 1u8] {
            return Err(Details::HeaderMagic.into());
        }

        let meta_schema = Schema::map(Schema::Bytes);
        match decode(&meta_schema, &mut self.reader)? {
            Value::Map(metadata) => {
                self.read_writer_schema(&metadata)?;
                self.codec = read_codec(&metadata)?;

                for (key, value) in metadata {
                    if key == "avro.schema" || key == "avro.codec" {
                        // already processed
                    } else if key.starts_with("avro.") {
                        warn!("Ignoring unknown metadata key: {key}");
                    } else {
                        self.read_user_metadata(key, value);
                    }
                }
            }
            _ => {
                return Err(Details::GetHeaderMetadata.into());
            }
        }

        self.reader
            .read_exact(&mut self.marker)
            .map_err(|e| Details::ReadMarker(e).into())
    }

    fn fill_buf(&mut self, n: usize) -> AvroResult<()> {
        // The buffer needs to contain exactly `n` elements, otherwise codecs
        // will potentially read invalid bytes.
        self.buf.resize(util::safe_len(n)?, 0);
        self.reader
            .read_exact(&mut self.buf)
            .map_err(Details::ReadIntoBuf)?;
        self.buf_idx = 0;
        Ok(())
    }

    /// Try to read a data block. The objects are stored in an internal buffer
    /// to the `Reader`.
    fn read_block_next(&mut self) -> AvroResult<()> {
        assert!(self.is_empty(), "Expected self to be empty!");
        match util::read_long(&mut self.reader).map_err(Error::into_details) {
            Ok(block_count) => {
                if block_count < 0 {
                    return Err(Details::BlockCount(block_count).into());
                }
                let block_bytes = util::read_long(&mut self.reader)?;
                if block_bytes < 0 || block_bytes > i32::MAX as i64 {
                    return Err(Details::MalformedLength(block_bytes).into());
                }
                self.message_count = block_count as usize;
                self.fill_buf(block_bytes as usize)?;
                let mut marker = [0u8; 16];
                self.reader
                    .read_exact(&mut marker)
                    .map_err(Details::ReadBlockMarker)?;

                if marker != self.marker {
                    return Err(Details::SyncMarkerMismatch.into());
                }

                self.codec.decompress(&mut self.buf)
            }
            Err(Details::UnexpectedEnd(io_err)) => {
                if let ErrorKind::UnexpectedEof = io_err.kind() {
                    // we only finished to read cleanly from the stream
                    Ok(())
                } else {
                    Err(Details::UnexpectedEnd(io_err).into())
                }
            }
            Err(e) => Err(Error::new(e)),
        }
    }

    fn len(&self) -> usize {
        self.message_count
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_next(&mut self, read_schema: Option<&Schema>) -> AvroResult<Option<Value>> {
        if self.is_empty() {
            self.read_block_next()?;
            if self.is_empty() {
                return Ok(None);
            }
        }

        let mut block_bytes = &self.buf[self.buf_idx..];
        let b_original = block_bytes.len();

        let item = decode_internal(&self.writer_schema, &self.names, &None, &mut block_bytes)?;
        let item = match read_schema {
            Some(schema) => item.resolve(schema)?,
            None => item,
        };

        if b_original != 0 && b_original == block_bytes.len() {
            // decode_internal did not consume any bytes, so return an error
            // to avoid an infinite loop
            return Err(Details::UnexpectedEnd(std::io::Error::from(
                ErrorKind::UnexpectedEof,
            ))
            .into());
        }
        self.buf_idx += b_original - block_bytes.len();
        self.message_count -= 1;
        Ok(Some(item))
    }

    fn read_writer_schema(&mut self, metadata: &HashMap<String, Value>) -> AvroResult<()> {
        let json: serde_json::Value = metadata
            .get("avro.schema")
            .and_then(|bytes| {
                if let Value::Bytes(ref bytes) = *bytes {
                    from_slice(bytes.as_ref()).ok()
                } else {
                    None
                }
            })
            .ok_or(Details::GetAvroSchemaFromMap)?;
        self.writer_schema = Schema::parse(&json)?;
        let mut names = HashMap::new();
        resolve_names(&self.writer_schema, &mut names, &None)?;
        self.names = names;
        Ok(())
    }

    fn read_user_metadata(&mut self, key: String, value: Value) {
        match value {
            Value::Bytes(ref vec) => {
                self.user_metadata.insert(key, vec.clone());
            }
            wrong => {
                warn!("User metadata values must be Value::Bytes, found {wrong:?}");
            }
        }
    }
}

fn read_codec(metadata: &HashMap<String, Value>) -> AvroResult<Codec> {
    match metadata.get("avro.codec") {
        Some(Value::Bytes(bytes)) => match std::str::from_utf8(bytes.as_ref()) {
            Ok(name) => {
                Codec::from_str(name).map_err(|_| Details::CodecNotSupported(name.to_owned()).into())
            }
            Err(utf8_error) => Err(Details::ConvertToUtf8Error(utf8_error).into()),
        },
        Some(_) => Err(Details::BadCodecMetadata.into()),
        None => {
            warn!("The file header has no `avro.codec` metadata, assuming `null`");
            Ok(Codec::Null)
        }
    }
}

/// Main interface for reading Avro formatted values.
///
/// To be used as an iterator:
///
/// ```no_run
/// # use avrofile::Reader;
/// # use std::io::Cursor;
/// # let input = Cursor::new(Vec::<u8>::new());
/// for value in Reader::new(input).unwrap() {
///     match value {
///         Ok(v) => println!("{:?}", v),
///         Err(e) => println!("Error: {}", e),
///     };
/// }
/// ```
pub struct Reader<'a, R> {
    block: Block<R>,
    reader_schema: Option<&'a Schema>,
    errored: bool,
    should_resolve_schema: bool,
}

impl<'a, R: Read> Reader<'a, R> {
    /// Creates a `Reader` given something implementing the `io::Read` trait
    /// to read from. No reader `Schema` will be set.
    ///
    /// **NOTE** The avro header is going to be read automatically upon
    /// creation of the `Reader`.
    pub fn new(reader: R) -> AvroResult<Reader<'a, R>> {
        let block = Block::new(reader)?;
        let reader = Reader {
            block,
            reader_schema: None,
            errored: false,
            should_resolve_schema: false,
        };
        Ok(reader)
    }

    /// Creates a `Reader` given a reader `Schema` and something implementing
    /// the `io::Read` trait to read from.
    ///
    /// **NOTE** The avro header is going to be read automatically upon
    /// creation of the `Reader`.
    pub fn with_schema(schema: &'a Schema, reader: R) -> AvroResult<Reader<'a, R>> {
        let block = Block::new(reader)?;
        let mut reader = Reader {
            block,
            reader_schema: Some(schema),
            errored: false,
            should_resolve_schema: false,
        };
        // Check if the reader and writer schemas disagree.
        reader.should_resolve_schema = reader.writer_schema() != schema;
        Ok(reader)
    }

    /// Get a reference to the writer `Schema`.
    #[inline]
    pub fn writer_schema(&self) -> &Schema {
        &self.block.writer_schema
    }

    /// Get a reference to the optional reader `Schema`.
    #[inline]
    pub fn reader_schema(&self) -> Option<&Schema> {
        self.reader_schema
    }

    /// Get a reference to the user metadata.
    #[inline]
    pub fn user_metadata(&self) -> &HashMap<String, Vec<u8>> {
        &self.block.user_metadata
    }

    /// Get the value of a single metadata key, if present.
    #[inline]
    pub fn meta(&self, key: &str) -> Option<&[u8]> {
        self.block.user_metadata.get(key).map(|v| v.as_slice())
    }

    #[inline]
    fn read_next(&mut self) -> AvroResult<Option<Value>> {
        let read_schema = if self.should_resolve_schema {
            self.reader_schema
        } else {
            None
        };

        self.block.read_next(read_schema)
    }
}

impl<R: Read> Iterator for Reader<'_, R> {
    type Item = AvroResult<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        // to prevent keep on reading after the first error occurs
        if self.errored {
            return None;
        };
        match self.read_next() {
            Ok(opt) => opt.map(Ok),
            Err(e) => {
                self.errored = true;
                Some(Err(e))
            }
        }
    }
}

/// Decode a `Value` encoded in Avro format given its `Schema` and anything
/// implementing `io::Read` to read from.
///
/// In case a reader `Schema` is provided, schema resolution will also be
/// performed.
///
/// **NOTE** This function has a quite small niche of usage and does NOT take
/// care of reading the header and consecutive data blocks; use
/// [`Reader`](struct.Reader.html) if you don't know what you are doing,
/// instead.
pub fn from_avro_datum<R: Read>(
    writer_schema: &Schema,
    reader: &mut R,
    reader_schema: Option<&Schema>,
) -> AvroResult<Value> {
    let value = decode(writer_schema, reader)?;
    match reader_schema {
        Some(schema) => value.resolve(schema),
        None => Ok(value),
    }
}

/// Reads the marker bytes from Avro bytes generated earlier by a `Writer`.
pub fn read_marker(bytes: &[u8]) -> [u8; 16] {
    assert!(
        bytes.len() > 16,
        "The bytes are too short to read a marker from them"
    );
    let mut marker = [0_u8; 16];
    marker.clone_from_slice(&bytes[(bytes.len() - 16)..]);
    marker
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TestResult, Writer, types::Record};
    use pretty_assertions::assert_eq;

    const SCHEMA: &str = r#"
    {
      "type": "record",
      "name": "test",
      "fields": [
        {
          "name": "a",
          "type": "long",
          "default": 42
        },
        {
          "name": "b",
          "type": "string"
        }
      ]
    }
    "#;

    #[test]
    fn test_from_avro_datum() -> TestResult {
        let schema = Schema::parse_str(SCHEMA)?;
        let mut encoded: &'static [u8] = &[54, 6, 102, 111, 111];

        let mut record = Record::new(&schema).unwrap();
        record.put("a", 27i64);
        record.put("b", "foo");
        let expected = record.into();

        assert_eq!(from_avro_datum(&schema, &mut encoded, None)?, expected);

        Ok(())
    }

    #[test]
    fn test_reader_iterator() -> TestResult {
        let schema = Schema::parse_str(SCHEMA)?;
        let mut writer = Writer::new(&schema, Vec::new())?;

        let mut record1 = Record::new(&schema).unwrap();
        record1.put("a", 27i64);
        record1.put("b", "foo");
        let mut record2 = Record::new(&schema).unwrap();
        record2.put("a", 42i64);
        record2.put("b", "bar");
        writer.append(record1)?;
        writer.append(record2)?;
        let input = writer.into_inner()?;

        let reader = Reader::new(&input[..])?;
        let values = reader.collect::<Result<Vec<_>, _>>()?;
        assert_eq!(
            values,
            vec![
                Value::Record(vec![
                    ("a".into(), Value::Long(27)),
                    ("b".into(), Value::String("foo".into())),
                ]),
                Value::Record(vec![
                    ("a".into(), Value::Long(42)),
                    ("b".into(), Value::String("bar".into())),
                ]),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_reader_bad_magic() {
        let input: &[u8] = b"NotAvroData.....";
        match Reader::new(input).map_err(Error::into_details) {
            Err(Details::HeaderMagic) => {}
            other => panic!("Expected Details::HeaderMagic, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_reader_empty_file() -> TestResult {
        let schema = Schema::parse_str(r#""int""#)?;
        let mut writer = Writer::new(&schema, Vec::new())?;
        writer.close()?;
        let input = writer.into_inner()?;

        let mut reader = Reader::new(&input[..])?;
        assert!(reader.next().is_none());
        Ok(())
    }

    #[test]
    fn test_reader_preserves_user_metadata() -> TestResult {
        let schema = Schema::parse_str(r#""int""#)?;
        let mut writer = Writer::new(&schema, Vec::new())?;
        writer.add_user_metadata("application".to_string(), b"avrofile".as_slice())?;
        writer.append(Value::Int(1))?;
        let input = writer.into_inner()?;

        let reader = Reader::new(&input[..])?;
        assert_eq!(reader.meta("application"), Some(b"avrofile".as_slice()));
        Ok(())
    }

    #[test]
    fn test_reader_schema_resolution() -> TestResult {
        let writer_schema = Schema::parse_str(r#""int""#)?;
        let reader_schema = Schema::parse_str(r#""long""#)?;
        let mut writer = Writer::new(&writer_schema, Vec::new())?;
        writer.append(Value::Int(42))?;
        let input = writer.into_inner()?;

        let mut reader = Reader::with_schema(&reader_schema, &input[..])?;
        assert_eq!(reader.next().unwrap()?, Value::Long(42));
        Ok(())
    }

    #[test]
    fn test_reader_stops_after_error() -> TestResult {
        let schema = Schema::parse_str(r#""long""#)?;
        let mut writer = Writer::new(&schema, Vec::new())?;
        writer.append(Value::Long(1))?;
        let mut input = writer.into_inner()?;

        // corrupt the trailing sync marker of the only block
        let last = input.len() - 1;
        input[last] ^= 0xFF;

        let mut reader = Reader::new(&input[..])?;
        assert!(reader.next().unwrap().is_err());
        // the iterator is fused after an error
        assert!(reader.next().is_none());
        Ok(())
    }
}
