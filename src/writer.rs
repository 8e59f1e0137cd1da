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

//! Logic handling writing in Avro format at user level.

use crate::{
    AvroResult, Codec, Error,
    encode::{encode, encode_internal},
    error::Details,
    schema::{ResolvedSchema, Schema},
    types::Value,
};
use std::{collections::HashMap, io::Write, mem::ManuallyDrop};

/// The soft threshold in bytes after which the current block is flushed.
const DEFAULT_SYNC_INTERVAL: usize = 16 * 1024;
const AVRO_OBJECT_HEADER: &[u8] = b"Obj\x01";

/// Main interface for writing Avro formatted values.
///
/// The writer buffers appended values and emits them in compressed,
/// sync-marked blocks. Call [`close`](Writer::close) (or
/// [`into_inner`](Writer::into_inner)) when done: dropping will attempt to
/// flush the remaining buffer, but any errors that happen in the process of
/// dropping will be ignored.
pub struct Writer<'a, W: Write> {
    schema: &'a Schema,
    writer: W,
    resolved_schema: ResolvedSchema<'a>,
    codec: Codec,
    sync_interval: usize,
    buffer: Vec<u8>,
    num_values: usize,
    marker: [u8; 16],
    has_header: bool,
    closed: bool,
    user_metadata: HashMap<String, Value>,
    bytes_written: usize,
}

/// Builder for a [`Writer`].
pub struct WriterBuilder<'a, W: Write> {
    schema: &'a Schema,
    writer: W,
    codec: Codec,
    sync_interval: usize,
    marker: Option<[u8; 16]>,
    has_header: bool,
    user_metadata: HashMap<String, Value>,
}

impl<'a, W: Write> WriterBuilder<'a, W> {
    /// Create a builder for a `Writer` that writes to `writer` using `schema`.
    pub fn new(schema: &'a Schema, writer: W) -> Self {
        Self {
            schema,
            writer,
            codec: Codec::Null,
            sync_interval: DEFAULT_SYNC_INTERVAL,
            marker: None,
            has_header: false,
            user_metadata: HashMap::new(),
        }
    }

    /// Set the compression codec. Defaults to `Codec::Null`.
    pub fn codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    /// Set the block flush threshold in bytes. Defaults to 16 KiB.
    ///
    /// This is a soft threshold: the datum being appended is always finished
    /// before the block is flushed.
    pub fn sync_interval(mut self, sync_interval: usize) -> Self {
        self.sync_interval = sync_interval;
        self
    }

    /// Use the given sync marker instead of generating a random one.
    pub fn marker(mut self, marker: [u8; 16]) -> Self {
        self.marker = Some(marker);
        self
    }

    /// Mark the header as already written.
    ///
    /// Use together with [`marker`](Self::marker) to append blocks to an
    /// already populated sink.
    pub fn has_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Set the user metadata to write into the file header.
    ///
    /// Values are written as the `bytes` of the metadata map; keys starting
    /// with `avro.` are reserved.
    pub fn user_metadata(mut self, metadata: HashMap<String, Vec<u8>>) -> Self {
        self.user_metadata = metadata
            .into_iter()
            .map(|(k, v)| (k, Value::Bytes(v)))
            .collect();
        self
    }

    /// Build the `Writer`.
    pub fn build(self) -> AvroResult<Writer<'a, W>> {
        for key in self.user_metadata.keys() {
            if key.starts_with("avro.") {
                return Err(Details::InvalidMetadataKey(key.clone()).into());
            }
        }
        let resolved_schema = ResolvedSchema::try_from(self.schema)?;
        Ok(Writer {
            schema: self.schema,
            writer: self.writer,
            resolved_schema,
            codec: self.codec,
            sync_interval: self.sync_interval,
            buffer: Vec::with_capacity(self.sync_interval),
            num_values: 0,
            marker: self.marker.unwrap_or_else(generate_sync_marker),
            has_header: self.has_header,
            closed: false,
            user_metadata: self.user_metadata,
            bytes_written: 0,
        })
    }
}

impl<'a, W: Write> Writer<'a, W> {
    /// Creates a `Writer` given a `Schema` and something implementing the
    /// `io::Write` trait to write to.
    /// No compression `Codec` will be used.
    pub fn new(schema: &'a Schema, writer: W) -> AvroResult<Self> {
        Writer::with_codec(schema, writer, Codec::Null)
    }

    /// Creates a `Writer` with a specific `Codec` given a `Schema` and
    /// something implementing the `io::Write` trait to write to.
    pub fn with_codec(schema: &'a Schema, writer: W, codec: Codec) -> AvroResult<Self> {
        Self::builder(schema, writer).codec(codec).build()
    }

    /// Creates a builder to configure a `Writer`.
    pub fn builder(schema: &'a Schema, writer: W) -> WriterBuilder<'a, W> {
        WriterBuilder::new(schema, writer)
    }

    /// Creates a `Writer` that will append values to already populated
    /// `std::io::Write` using the provided `marker`.
    /// No compression `Codec` will be used.
    pub fn append_to(schema: &'a Schema, writer: W, marker: [u8; 16]) -> AvroResult<Self> {
        Writer::append_to_with_codec(schema, writer, Codec::Null, marker)
    }

    /// Creates a `Writer` that will append values to already populated
    /// `std::io::Write` using the provided `marker`.
    pub fn append_to_with_codec(
        schema: &'a Schema,
        writer: W,
        codec: Codec,
        marker: [u8; 16],
    ) -> AvroResult<Self> {
        Self::builder(schema, writer)
            .codec(codec)
            .marker(marker)
            .has_header(true)
            .build()
    }

    /// Get a reference to the `Schema` associated to a `Writer`.
    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    /// Append a value to the `Writer`, also performing schema validation.
    ///
    /// Returns the number of bytes written (it might be 0, see below).
    ///
    /// **NOTE**: This function is not guaranteed to perform any actual write,
    /// since it relies on internal buffering for performance reasons. If you
    /// want to be sure the value has been written, then call
    /// [`flush`](Writer::flush).
    pub fn append<T: Into<Value>>(&mut self, value: T) -> AvroResult<usize> {
        let avro = value.into();
        self.append_ref(&avro)
    }

    /// Append a compatible value to a `Writer`, also performing schema
    /// validation.
    ///
    /// Returns the number of bytes written (it might be 0, see below).
    ///
    /// **NOTE**: This function is not guaranteed to perform any actual write,
    /// since it relies on internal buffering for performance reasons. If you
    /// want to be sure the value has been written, then call
    /// [`flush`](Writer::flush).
    pub fn append_ref(&mut self, value: &Value) -> AvroResult<usize> {
        if self.closed {
            return Err(Details::WriterClosed.into());
        }
        if let Some(reason) = value.validate_internal(
            self.schema,
            self.resolved_schema.get_names(),
            &self.schema.namespace(),
        ) {
            return Err(Details::ValidationWithReason {
                value: value.clone(),
                schema: self.schema.clone(),
                reason,
            }
            .into());
        }

        let n = self.maybe_write_header()?;
        encode_internal(
            value,
            self.schema,
            self.resolved_schema.get_names(),
            &self.schema.namespace(),
            &mut self.buffer,
        )?;

        self.num_values += 1;

        if self.buffer.len() >= self.sync_interval {
            return self.flush().map(|b| b + n);
        }

        Ok(n)
    }

    /// Extend a `Writer` with an `Iterator` of values, also performing schema
    /// validation.
    ///
    /// Returns the number of bytes written.
    ///
    /// **NOTE**: This function forces the written data to be flushed (an
    /// implicit call to [`flush`](Writer::flush) is performed).
    pub fn extend<I, T: Into<Value>>(&mut self, values: I) -> AvroResult<usize>
    where
        I: IntoIterator<Item = T>,
    {
        let mut num_bytes = 0;
        for value in values {
            num_bytes += self.append(value)?;
        }
        num_bytes += self.flush()?;

        Ok(num_bytes)
    }

    /// Extend a `Writer` by appending each `Value` from a slice, while also
    /// performing schema validation on each value appended.
    ///
    /// Returns the number of bytes written.
    ///
    /// **NOTE**: This function forces the written data to be flushed (an
    /// implicit call to [`flush`](Writer::flush) is performed).
    pub fn extend_from_slice(&mut self, values: &[Value]) -> AvroResult<usize> {
        let mut num_bytes = 0;
        for value in values {
            num_bytes += self.append_ref(value)?;
        }
        num_bytes += self.flush()?;

        Ok(num_bytes)
    }

    /// Flush the content to the inner `Writer`.
    ///
    /// This will also write the header if it wasn't written yet.
    ///
    /// Returns the number of bytes written.
    pub fn flush(&mut self) -> AvroResult<usize> {
        if self.closed {
            return Err(Details::WriterClosed.into());
        }
        self.flush_internal()
    }

    fn flush_internal(&mut self) -> AvroResult<usize> {
        let mut num_bytes = self.maybe_write_header()?;
        if self.num_values == 0 {
            return Ok(num_bytes);
        }

        self.codec.compress(&mut self.buffer)?;

        let num_values = self.num_values;
        let stream_len = self.buffer.len();

        num_bytes += self.append_raw_long(num_values as i64)?
            + self.append_raw_long(stream_len as i64)?;

        let n = self
            .writer
            .write(self.buffer.as_ref())
            .map_err(Details::WriteBytes)?;
        self.bytes_written += n;
        num_bytes += n;

        num_bytes += self.append_marker()?;

        self.buffer.clear();
        self.num_values = 0;

        self.writer.flush().map_err(Details::FlushWriter)?;

        Ok(num_bytes)
    }

    /// Flush the pending block and return the position of the sink, that is
    /// the total number of bytes this writer has emitted to it.
    pub fn sync(&mut self) -> AvroResult<u64> {
        if self.closed {
            return Err(Details::WriterClosed.into());
        }
        self.flush_internal()?;
        Ok(self.bytes_written as u64)
    }

    /// Close the `Writer`: write the header if it was never written, flush
    /// any pending block and flush the underlying sink.
    ///
    /// Closing is idempotent; appending or flushing after close fails with
    /// [`Details::WriterClosed`](crate::error::Details::WriterClosed).
    pub fn close(&mut self) -> AvroResult<()> {
        if self.closed {
            return Ok(());
        }
        self.flush_internal()?;
        self.closed = true;
        Ok(())
    }

    /// Return what the `Writer` is writing to, consuming the `Writer` itself.
    ///
    /// **NOTE**: This function forces the written data to be flushed (an
    /// implicit call to [`close`](Writer::close) is performed).
    pub fn into_inner(mut self) -> AvroResult<W> {
        self.close()?;

        let mut this = ManuallyDrop::new(self);

        // Extract every member that is not Copy and therefore should be dropped
        let _buffer = std::mem::take(&mut this.buffer);
        let _user_metadata = std::mem::take(&mut this.user_metadata);
        // SAFETY: resolved schema is not accessed after this and won't be dropped because of ManuallyDrop
        unsafe { std::ptr::drop_in_place(&mut this.resolved_schema) };

        // SAFETY: double-drops are prevented by putting `this` in a ManuallyDrop that is never dropped
        let writer = unsafe { std::ptr::read(&this.writer) };

        Ok(writer)
    }

    /// Gets a reference to the underlying writer.
    ///
    /// **NOTE**: There is likely data still in the buffer. To have all the
    /// data in the writer call [`flush`](Writer::flush) first.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Gets a mutable reference to the underlying writer.
    ///
    /// It is inadvisable to directly write to the underlying writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Adds custom metadata to the file.
    /// This method can be used only before adding the first record to the
    /// writer.
    pub fn add_user_metadata<T: AsRef<[u8]>>(&mut self, key: String, value: T) -> AvroResult<()> {
        if self.closed {
            return Err(Details::WriterClosed.into());
        }
        if !self.has_header {
            if key.starts_with("avro.") {
                return Err(Details::InvalidMetadataKey(key).into());
            }
            self.user_metadata
                .insert(key, Value::Bytes(value.as_ref().to_vec()));
            Ok(())
        } else {
            Err(Details::FileHeaderAlreadyWritten.into())
        }
    }

    /// Append the synchronization marker to the payload.
    fn append_marker(&mut self) -> AvroResult<usize> {
        // using .writer.write directly to avoid mutable borrow of self
        // with ref borrowing of self.marker
        let n = self
            .writer
            .write(&self.marker)
            .map_err(Details::WriteMarker)?;
        self.bytes_written += n;
        Ok(n)
    }

    /// Append a raw Avro long to the payload.
    fn append_raw_long(&mut self, value: i64) -> AvroResult<usize> {
        let mut buf = Vec::new();
        encode(&Value::Long(value), &Schema::Long, &mut buf)?;
        self.append_bytes(&buf)
    }

    /// Append pure bytes to the payload.
    fn append_bytes(&mut self, bytes: &[u8]) -> AvroResult<usize> {
        let n = self
            .writer
            .write(bytes)
            .map_err(Details::WriteBytes)?;
        self.bytes_written += n;
        Ok(n)
    }

    /// Create an Avro header based on schema, codec and sync marker.
    fn header(&self) -> Result<Vec<u8>, Error> {
        let schema_bytes = serde_json::to_string(self.schema)
            .map_err(Details::ConvertJsonToString)?
            .into_bytes();

        let mut metadata = HashMap::with_capacity(2 + self.user_metadata.len());
        metadata.insert("avro.schema".to_owned(), Value::Bytes(schema_bytes));
        metadata.insert("avro.codec".to_owned(), self.codec.into());

        for (k, v) in &self.user_metadata {
            metadata.insert(k.clone(), v.clone());
        }

        let mut header = Vec::new();
        header.extend_from_slice(AVRO_OBJECT_HEADER);
        encode(
            &Value::Map(metadata),
            &Schema::map(Schema::Bytes),
            &mut header,
        )?;
        header.extend_from_slice(&self.marker);

        Ok(header)
    }

    fn maybe_write_header(&mut self) -> AvroResult<usize> {
        if !self.has_header {
            let header = self.header()?;
            let n = self.append_bytes(header.as_ref())?;
            self.has_header = true;
            Ok(n)
        } else {
            Ok(0)
        }
    }
}

impl<W: Write> Drop for Writer<'_, W> {
    /// Drop the writer, will try to close it ignoring any errors.
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Encode a value into raw Avro data without container framing, also
/// performing schema validation.
pub fn to_avro_datum<T: Into<Value>>(schema: &Schema, value: T) -> AvroResult<Vec<u8>> {
    let mut buffer = Vec::new();
    write_avro_datum(schema, value, &mut buffer)?;
    Ok(buffer)
}

/// Encode a value into raw Avro data, also performing schema validation.
///
/// This is an internal function which gets the bytes buffer where to write as
/// parameter instead of creating a new one like `to_avro_datum`.
fn write_avro_datum<T: Into<Value>, W: Write>(
    schema: &Schema,
    value: T,
    writer: &mut W,
) -> Result<(), Error> {
    let avro = value.into();
    if !avro.validate(schema) {
        return Err(Details::Validation.into());
    }
    encode(&avro, schema, writer)?;
    Ok(())
}

fn generate_sync_marker() -> [u8; 16] {
    rand::random()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestResult;
    use crate::error::Error;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_file_is_header_only() -> TestResult {
        let schema = Schema::parse_str(r#""int""#)?;
        let mut writer = Writer::new(&schema, Vec::new())?;
        writer.close()?;
        let buffer = writer.into_inner()?;

        // magic, then the metadata map, then the 16 byte sync marker
        assert_eq!(&buffer[..4], b"Obj\x01");
        assert_eq!(&buffer[buffer.len() - 16..], &crate::read_marker(&buffer));
        Ok(())
    }

    #[test]
    fn test_close_is_idempotent() -> TestResult {
        let schema = Schema::parse_str(r#""int""#)?;
        let mut writer = Writer::new(&schema, Vec::new())?;
        writer.append(Value::Int(3))?;
        writer.close()?;
        writer.close()?;
        Ok(())
    }

    #[test]
    fn test_append_after_close_fails() -> TestResult {
        let schema = Schema::parse_str(r#""int""#)?;
        let mut writer = Writer::new(&schema, Vec::new())?;
        writer.close()?;
        match writer.append(Value::Int(3)).map_err(Error::into_details) {
            Err(Details::WriterClosed) => {}
            other => panic!("Expected Details::WriterClosed, got {other:?}"),
        }
        match writer.flush().map_err(Error::into_details) {
            Err(Details::WriterClosed) => {}
            other => panic!("Expected Details::WriterClosed, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_append_rejects_invalid_value() -> TestResult {
        let schema = Schema::parse_str(r#""int""#)?;
        let mut writer = Writer::new(&schema, Vec::new())?;
        match writer
            .append(Value::String("not an int".into()))
            .map_err(Error::into_details)
        {
            Err(Details::ValidationWithReason { .. }) => {}
            other => panic!("Expected Details::ValidationWithReason, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_sync_returns_sink_position() -> TestResult {
        let schema = Schema::parse_str(r#""long""#)?;
        let mut writer = Writer::new(&schema, Vec::new())?;
        writer.append(Value::Long(1))?;
        let position = writer.sync()?;
        assert_eq!(position, writer.get_ref().len() as u64);
        Ok(())
    }

    #[test]
    fn test_small_sync_interval_flushes_per_datum() -> TestResult {
        let schema = Schema::parse_str(r#""long""#)?;
        let mut writer = Writer::builder(&schema, Vec::new())
            .sync_interval(1)
            .build()?;
        writer.append(Value::Long(1))?;
        writer.append(Value::Long(2))?;
        writer.close()?;
        let buffer = writer.into_inner()?;

        // each datum went into its own block, so the marker occurs three
        // times: once in the header and once after each block
        let marker = crate::read_marker(&buffer);
        let count = buffer
            .windows(16)
            .filter(|window| *window == marker)
            .count();
        assert_eq!(count, 3);
        Ok(())
    }

    #[test]
    fn test_user_metadata_key_validation() -> TestResult {
        let schema = Schema::parse_str(r#""int""#)?;
        let mut writer = Writer::new(&schema, Vec::new())?;
        match writer
            .add_user_metadata("avro.codec".to_string(), b"deflate".as_slice())
            .map_err(Error::into_details)
        {
            Err(Details::InvalidMetadataKey(_)) => {}
            other => panic!("Expected Details::InvalidMetadataKey, got {other:?}"),
        }
        writer.add_user_metadata("application".to_string(), b"avrofile".as_slice())?;
        Ok(())
    }

    #[test]
    fn test_user_metadata_after_header_fails() -> TestResult {
        let schema = Schema::parse_str(r#""int""#)?;
        let mut writer = Writer::new(&schema, Vec::new())?;
        writer.append(Value::Int(1))?;
        match writer
            .add_user_metadata("application".to_string(), b"avrofile".as_slice())
            .map_err(Error::into_details)
        {
            Err(Details::FileHeaderAlreadyWritten) => {}
            other => panic!("Expected Details::FileHeaderAlreadyWritten, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_to_avro_datum() -> TestResult {
        let schema = Schema::parse_str(r#""long""#)?;
        assert_eq!(to_avro_datum(&schema, Value::Long(27))?, vec![54u8]);
        Ok(())
    }
}
