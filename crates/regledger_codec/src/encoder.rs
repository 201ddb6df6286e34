//! Row encoder.

use crate::record::{Record, Schema};
use std::borrow::Cow;

/// Encode a whole ledger: the header line, then one line per record.
///
/// Fields are written in schema order; a column missing from a record is
/// written empty. An empty schema encodes to no bytes at all.
pub fn serialize_all(schema: &Schema, records: &[Record]) -> Vec<u8> {
    if schema.is_empty() {
        return Vec::new();
    }
    let mut encoder = RowEncoder::new();
    encoder.write_header(schema);
    for record in records {
        encoder.write_record(schema, record);
    }
    encoder.into_bytes()
}

/// Encode the header line for a schema, including the line terminator.
pub fn encode_header(schema: &Schema) -> String {
    let mut encoder = RowEncoder::new();
    encoder.write_header(schema);
    encoder.into_string()
}

/// Encode a single record as one line in schema order.
pub fn encode_row(schema: &Schema, record: &Record) -> String {
    let mut encoder = RowEncoder::new();
    encoder.write_record(schema, record);
    encoder.into_string()
}

/// Quote a field if it contains a separator, quote or line break.
pub fn encode_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// An incremental ledger encoder.
pub struct RowEncoder {
    buffer: String,
}

impl RowEncoder {
    /// Create a new encoder.
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    /// Write the header line.
    pub fn write_header(&mut self, schema: &Schema) {
        self.write_line(schema.columns().iter().map(String::as_str));
    }

    /// Write one record in schema order.
    pub fn write_record(&mut self, schema: &Schema, record: &Record) {
        self.write_line(schema.columns().iter().map(|c| record.get_or_empty(c)));
    }

    /// Consume the encoder and return the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.into_bytes()
    }

    /// Consume the encoder and return the encoded text.
    pub fn into_string(self) -> String {
        self.buffer
    }

    fn write_line<'v>(&mut self, values: impl ExactSizeIterator<Item = &'v str>) {
        // A lone empty field would otherwise be a blank line, which readers skip.
        if values.len() == 1 {
            let mut values = values;
            if let Some(value) = values.next() {
                if value.is_empty() {
                    self.buffer.push_str("\"\"\n");
                } else {
                    self.buffer.push_str(&encode_field(value));
                    self.buffer.push('\n');
                }
            }
            return;
        }

        for (i, value) in values.enumerate() {
            if i > 0 {
                self.buffer.push(',');
            }
            self.buffer.push_str(&encode_field(value));
        }
        self.buffer.push('\n');
    }
}

impl Default for RowEncoder {
    fn default() -> Self {
        Self::new()
    }
}
