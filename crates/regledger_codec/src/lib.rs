//! # regledger Codec
//!
//! The flat-file row format used by regledger ledgers.
//!
//! A ledger file is a header line naming the columns, followed by one line
//! per record:
//!
//! - Fields are separated by `,`
//! - A field containing `,`, `"` or a line break is wrapped in `"`
//! - A literal `"` inside a quoted field is written as `""`
//! - All other fields are written bare
//!
//! Decoding is lenient about row width (short rows are padded, extra fields
//! dropped) and strict about quoting: an unterminated quoted field aborts the
//! whole parse with [`CodecError::MalformedRow`].
//!
//! ## Usage
//!
//! ```
//! use regledger_codec::{parse_all, serialize_all, Record, Schema};
//!
//! let schema = Schema::new(["ID", "NAME"]);
//! let records = vec![Record::from_pairs([("ID", "1"), ("NAME", "Sharma, Arjun")])];
//!
//! let bytes = serialize_all(&schema, &records);
//! let (decoded_schema, decoded) = parse_all(&bytes).unwrap();
//! assert_eq!(decoded_schema, schema);
//! assert_eq!(decoded, records);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod record;

pub use decoder::{decode_utf8, parse_all, parse_schema, RowReader};
pub use encoder::{encode_field, encode_header, encode_row, serialize_all, RowEncoder};
pub use error::{CodecError, CodecResult};
pub use record::{Record, Schema};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn schema_strategy() -> impl Strategy<Value = Schema> {
        prop::collection::hash_set("[A-Z][A-Z_]{0,11}", 1..8)
            .prop_map(|columns| Schema::new(columns.into_iter()))
    }

    fn field_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(String::new()),
            "[a-zA-Z0-9 ]{0,12}",
            "[a-z ,\"\n\r]{0,12}",
            any::<String>(),
        ]
    }

    fn ledger_strategy() -> impl Strategy<Value = (Schema, Vec<Record>)> {
        schema_strategy().prop_flat_map(|schema| {
            let width = schema.len();
            let rows = prop::collection::vec(prop::collection::vec(field_strategy(), width), 0..6);
            (Just(schema), rows).prop_map(|(schema, rows)| {
                let records = rows
                    .into_iter()
                    .map(|values| {
                        Record::from_pairs(schema.columns().iter().cloned().zip(values))
                    })
                    .collect();
                (schema, records)
            })
        })
    }

    proptest! {
        #[test]
        fn parse_inverts_serialize((schema, records) in ledger_strategy()) {
            let bytes = serialize_all(&schema, &records);
            let (decoded_schema, decoded) = parse_all(&bytes).unwrap();
            prop_assert_eq!(decoded_schema, schema);
            prop_assert_eq!(decoded, records);
        }
    }

    #[test]
    fn roundtrip_tricky_values() {
        let schema = Schema::new(["ID", "ADDRESS", "REMARKS"]);
        let records = vec![
            Record::from_pairs([("ID", "1"), ("ADDRESS", "a,b"), ("REMARKS", "\"quoted\"")]),
            Record::from_pairs([("ID", "2"), ("ADDRESS", ""), ("REMARKS", "two\nlines")]),
            Record::from_pairs([("ID", ""), ("ADDRESS", ""), ("REMARKS", "")]),
        ];
        let bytes = serialize_all(&schema, &records);
        assert_eq!(parse_all(&bytes).unwrap(), (schema, records));
    }
}
