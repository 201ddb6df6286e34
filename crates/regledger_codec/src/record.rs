//! Schema and record types.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// The ordered list of column names for a ledger.
///
/// A schema is read from the first line of a ledger file and fixes the
/// column order used when the ledger is written back.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    /// Creates a schema from column names, in order.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a schema with no columns.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the column names in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the schema has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns true if the schema has a column with this exact name.
    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.position(column).is_some()
    }

    /// Returns the index of a column.
    #[must_use]
    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Appends a column to the tail of the schema.
    ///
    /// Returns false (and leaves the schema untouched) if the column
    /// already exists. Existing column order never changes.
    pub fn extend(&mut self, column: impl Into<String>) -> bool {
        let column = column.into();
        if self.contains(&column) {
            return false;
        }
        self.columns.push(column);
        true
    }
}

/// One ledger row: an ordered mapping from column name to value.
///
/// Field order is insertion order. Records read from a ledger always carry
/// exactly the ledger's schema columns, in schema order; use
/// [`Record::conform`] to bring an arbitrary record into that shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a record from `(column, value)` pairs.
    ///
    /// A repeated column keeps its first position and its last value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut record = Self::new();
        for (column, value) in pairs {
            record.set(column, value);
        }
        record
    }

    /// Returns the value of a column, if present.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the value of a column, or `""` if absent.
    #[must_use]
    pub fn get_or_empty(&self, column: &str) -> &str {
        self.get(column).unwrap_or("")
    }

    /// Returns true if the column is present (even if empty).
    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    /// Sets a column value, replacing in place or appending a new field.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(c, _)| *c == column) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((column, value)),
        }
    }

    /// Sets a column only if it is absent or empty.
    pub fn set_if_empty(&mut self, column: &str, value: impl Into<String>) {
        if self.get_or_empty(column).is_empty() {
            self.set(column, value);
        }
    }

    /// Iterates over `(column, value)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(c, v)| (c.as_str(), v.as_str()))
    }

    /// Iterates over column names in field order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(c, _)| c.as_str())
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns a copy with exactly the schema's columns, in schema order.
    ///
    /// Missing columns become empty values; columns the schema does not
    /// know are dropped.
    #[must_use]
    pub fn conform(&self, schema: &Schema) -> Record {
        Record {
            fields: schema
                .columns()
                .iter()
                .map(|c| (c.clone(), self.get_or_empty(c).to_string()))
                .collect(),
        }
    }

    /// Returns a copy without the given columns.
    #[must_use]
    pub fn without(&self, columns: &[&str]) -> Record {
        Record {
            fields: self
                .fields
                .iter()
                .filter(|(c, _)| !columns.contains(&c.as_str()))
                .cloned()
                .collect(),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (column, value) in &self.fields {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_extend_appends_to_tail() {
        let mut schema = Schema::new(["ID", "NAME"]);
        assert!(schema.extend("STATUS"));
        assert!(!schema.extend("NAME"));
        assert_eq!(schema.columns(), ["ID", "NAME", "STATUS"]);
    }

    #[test]
    fn set_replaces_in_place() {
        let mut record = Record::from_pairs([("ID", "1"), ("NAME", "a")]);
        record.set("ID", "2");
        record.set("EMAIL", "x@y");
        let cols: Vec<_> = record.columns().collect();
        assert_eq!(cols, ["ID", "NAME", "EMAIL"]);
        assert_eq!(record.get("ID"), Some("2"));
    }

    #[test]
    fn conform_pads_and_drops() {
        let schema = Schema::new(["ID", "NAME", "PHONE"]);
        let record = Record::from_pairs([("NAME", "Sita"), ("EXTRA", "x"), ("ID", "7")]);
        let conformed = record.conform(&schema);

        let pairs: Vec<_> = conformed.iter().collect();
        assert_eq!(pairs, [("ID", "7"), ("NAME", "Sita"), ("PHONE", "")]);
    }

    #[test]
    fn set_if_empty_keeps_existing() {
        let mut record = Record::from_pairs([("ID", "keep"), ("CERT", "")]);
        record.set_if_empty("ID", "new");
        record.set_if_empty("CERT", "BC-1");
        assert_eq!(record.get("ID"), Some("keep"));
        assert_eq!(record.get("CERT"), Some("BC-1"));
    }

    #[test]
    fn without_removes_columns() {
        let record = Record::from_pairs([("ID", "1"), ("PASSWORD_hash", "h"), ("SALT", "s")]);
        let public = record.without(&["PASSWORD_hash", "SALT"]);
        assert_eq!(public.len(), 1);
        assert!(!public.contains("SALT"));
    }

    #[test]
    fn serializes_in_field_order() {
        let record = Record::from_pairs([("B", "2"), ("A", "1")]);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"B":"2","A":"1"}"#);
    }
}
