//! Row decoder.

use crate::error::{CodecError, CodecResult};
use crate::record::{Record, Schema};

const BOM: char = '\u{feff}';

/// Decode a whole ledger: the schema from line 1 and one record per row.
///
/// Rows shorter than the schema are padded with empty values, longer rows
/// have their extra fields ignored. Blank lines are skipped. Empty input
/// yields an empty schema and no records.
///
/// # Errors
///
/// Returns [`CodecError::MalformedRow`] if a quoted field is never closed;
/// the whole parse is aborted rather than dropping the row.
pub fn parse_all(bytes: &[u8]) -> CodecResult<(Schema, Vec<Record>)> {
    let text = decode_utf8(bytes)?;
    let mut reader = RowReader::new(text);

    let schema = match reader.next_row()? {
        Some(header) => Schema::new(header),
        None => return Ok((Schema::empty(), Vec::new())),
    };

    let mut records = Vec::new();
    while let Some(fields) = reader.next_row()? {
        records.push(build_record(&schema, fields));
    }

    Ok((schema, records))
}

/// Decode only the header line of a ledger.
///
/// # Errors
///
/// Returns an error if the header itself is malformed or not UTF-8.
pub fn parse_schema(bytes: &[u8]) -> CodecResult<Schema> {
    let text = decode_utf8(bytes)?;
    let mut reader = RowReader::new(text);
    Ok(reader.next_row()?.map(Schema::new).unwrap_or_default())
}

/// Validate ledger bytes as UTF-8 and strip a leading byte-order mark.
///
/// # Errors
///
/// Returns [`CodecError::InvalidUtf8`] with the offset of the first bad byte.
pub fn decode_utf8(bytes: &[u8]) -> CodecResult<&str> {
    let text = std::str::from_utf8(bytes).map_err(|e| CodecError::InvalidUtf8 {
        offset: e.valid_up_to(),
    })?;
    Ok(text.strip_prefix(BOM).unwrap_or(text))
}

fn build_record(schema: &Schema, fields: Vec<String>) -> Record {
    let mut values = fields.into_iter();
    Record::from_pairs(
        schema
            .columns()
            .iter()
            .map(|column| (column.clone(), values.next().unwrap_or_default())),
    )
}

/// A streaming reader that yields one row of raw fields at a time.
///
/// A field that starts with `"` is quoted: it may contain commas and line
/// breaks, and `""` inside it stands for one literal quote. Text following
/// the closing quote up to the next separator is kept verbatim.
pub struct RowReader<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> RowReader<'a> {
    /// Create a reader over the given text.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
        }
    }

    /// The 1-based line number of the next unread row.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Read the next non-blank row, or `None` at end of input.
    pub fn next_row(&mut self) -> CodecResult<Option<Vec<String>>> {
        loop {
            let rest = &self.input[self.pos..];
            if rest.is_empty() {
                return Ok(None);
            }
            if rest.starts_with('\n') {
                self.pos += 1;
                self.line += 1;
                continue;
            }
            if rest.starts_with("\r\n") {
                self.pos += 2;
                self.line += 1;
                continue;
            }
            return self.read_row().map(Some);
        }
    }

    fn read_row(&mut self) -> CodecResult<Vec<String>> {
        let start_line = self.line;
        let rest = &self.input[self.pos..];
        let mut chars = rest.char_indices().peekable();

        let mut fields = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut at_field_start = true;

        while let Some((i, c)) = chars.next() {
            if in_quotes {
                match c {
                    '"' if matches!(chars.peek(), Some((_, '"'))) => {
                        chars.next();
                        field.push('"');
                    }
                    '"' => in_quotes = false,
                    '\n' => {
                        self.line += 1;
                        field.push(c);
                    }
                    _ => field.push(c),
                }
                continue;
            }

            match c {
                '"' if at_field_start => {
                    in_quotes = true;
                    at_field_start = false;
                }
                ',' => {
                    fields.push(std::mem::take(&mut field));
                    at_field_start = true;
                }
                '\n' => {
                    self.pos += i + 1;
                    self.line += 1;
                    fields.push(field);
                    return Ok(fields);
                }
                '\r' if matches!(chars.peek(), Some((_, '\n'))) => {}
                _ => {
                    field.push(c);
                    at_field_start = false;
                }
            }
        }

        if in_quotes {
            return Err(CodecError::malformed_row(
                start_line,
                "unterminated quoted field",
            ));
        }

        self.pos = self.input.len();
        fields.push(field);
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_and_rows() {
        let data = b"ID,NAME,EMAIL\n1,Sita,sita@example.com\n2,Ram,ram@example.com\n";
        let (schema, records) = parse_all(data).unwrap();

        assert_eq!(schema.columns(), ["ID", "NAME", "EMAIL"]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("NAME"), Some("Ram"));
    }

    #[test]
    fn empty_input_is_empty_ledger() {
        let (schema, records) = parse_all(b"").unwrap();
        assert!(schema.is_empty());
        assert!(records.is_empty());
    }

    #[test]
    fn short_rows_are_padded() {
        let (_, records) = parse_all(b"A,B,C\n1\n").unwrap();
        let pairs: Vec<_> = records[0].iter().collect();
        assert_eq!(pairs, [("A", "1"), ("B", ""), ("C", "")]);
    }

    #[test]
    fn extra_fields_are_ignored() {
        let (_, records) = parse_all(b"A,B\n1,2,3,4\n").unwrap();
        assert_eq!(records[0].len(), 2);
        assert_eq!(records[0].get("B"), Some("2"));
    }

    #[test]
    fn quoted_fields_keep_commas_quotes_and_newlines() {
        let data = b"ID,ADDRESS\n1,\"Ward 4, \"\"Old\"\" Bazaar\nKathmandu\"\n2,plain\n";
        let (_, records) = parse_all(data).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].get("ADDRESS"),
            Some("Ward 4, \"Old\" Bazaar\nKathmandu")
        );
        assert_eq!(records[1].get("ADDRESS"), Some("plain"));
    }

    #[test]
    fn unterminated_quote_is_malformed() {
        let data = b"ID,NAME\n1,ok\n2,\"never closed\n3,x\n";
        let err = parse_all(data).unwrap_err();
        assert_eq!(
            err,
            CodecError::malformed_row(3, "unterminated quoted field")
        );
    }

    #[test]
    fn crlf_and_blank_lines() {
        let data = b"A,B\r\n1,2\r\n\r\n3,4";
        let (schema, records) = parse_all(data).unwrap();
        assert_eq!(schema.columns(), ["A", "B"]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("B"), Some("2"));
        assert_eq!(records[1].get("B"), Some("4"));
    }

    #[test]
    fn bom_is_stripped_from_header() {
        let data = "\u{feff}ID,NAME\n1,a\n".as_bytes();
        let schema = parse_schema(data).unwrap();
        assert_eq!(schema.columns(), ["ID", "NAME"]);
    }

    #[test]
    fn invalid_utf8_rejected() {
        let err = parse_all(b"ID\n\xff\n").unwrap_err();
        assert_eq!(err, CodecError::InvalidUtf8 { offset: 3 });
    }

    #[test]
    fn reader_tracks_lines_across_quoted_newlines() {
        let mut reader = RowReader::new("\"a\nb\",c\nd\n");
        assert_eq!(reader.next_row().unwrap().unwrap(), ["a\nb", "c"]);
        assert_eq!(reader.line(), 3);
        assert_eq!(reader.next_row().unwrap().unwrap(), ["d"]);
        assert!(reader.next_row().unwrap().is_none());
    }
}
