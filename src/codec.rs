//! Delimited-text encoding of batch rows
//!
//! The batch input carries a header line; the ledgers do not. Values are decoded as JSON
//! strings and encoded through a null-safe scalar renderer, so a row written to a ledger
//! can be fed back in as the input of a re-run.

use crate::error::{Error, Result};
use crate::types::{BatchRow, FieldOrder, GUID_FIELD, OUID_FIELD};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashSet;

/// Reads batch input and renders ledger lines
#[derive(Clone, Copy, Debug)]
pub struct RowCodec {
    delimiter: u8,
}

impl Default for RowCodec {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl RowCodec {
    /// Create a codec for the given single-byte delimiter
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Decode a batch with a header line
    ///
    /// Returns the header order and one row per non-empty record.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedInput`] when the header lacks `guid` or `ouid`, repeats a column,
    /// or a record's width differs from the header's.
    pub fn decode(&self, raw: &str) -> Result<(FieldOrder, Vec<BatchRow>)> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(false)
            .from_reader(raw.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let order = FieldOrder::new(headers);
        validate_header(&order)?;

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| {
                if let csv::ErrorKind::UnequalLengths {
                    pos,
                    expected_len,
                    len,
                } = e.kind()
                {
                    return Error::MalformedInput(format!(
                        "record on line {} has {} fields, header has {}",
                        pos.as_ref().map(|p| p.line()).unwrap_or_default(),
                        len,
                        expected_len
                    ));
                }
                Error::Csv(e)
            })?;

            let row = BatchRow::from_pairs(
                order
                    .fields()
                    .iter()
                    .zip(record.iter())
                    .map(|(field, value)| (field.clone(), Value::String(value.to_string()))),
            );
            rows.push(row);
        }

        Ok((order, rows))
    }

    /// Encode the original fields of `row` as one line, in `order`
    ///
    /// Absent and null values become empty fields; quoting is applied only where the
    /// delimiter, quotes or line breaks require it.
    pub fn encode(&self, row: &BatchRow, order: &FieldOrder) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        let record: Vec<Cow<'_, str>> = order
            .fields()
            .iter()
            .map(|field| scalar_to_field(row.get(field)))
            .collect();
        writer.write_record(record.iter().map(|v| v.as_bytes()))?;

        let bytes = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        String::from_utf8(bytes)
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
    }
}

fn validate_header(order: &FieldOrder) -> Result<()> {
    for required in [GUID_FIELD, OUID_FIELD] {
        if !order.contains(required) {
            return Err(Error::MalformedInput(format!(
                "header must contain a '{}' column, found [{}]",
                required,
                order.fields().join(", ")
            )));
        }
    }

    let mut seen = HashSet::new();
    if let Some(dup) = order.fields().iter().find(|f| !seen.insert(f.as_str())) {
        return Err(Error::MalformedInput(format!(
            "header repeats column '{}'",
            dup
        )));
    }

    Ok(())
}

/// Render one value as a ledger field
///
/// Strings are written verbatim (no JSON quotes), numbers and booleans in JSON form,
/// compound values as compact JSON, and null or missing values as the empty string.
pub fn scalar_to_field(value: Option<&Value>) -> Cow<'_, str> {
    match value {
        None | Some(Value::Null) => Cow::Borrowed(""),
        Some(Value::String(s)) => Cow::Borrowed(s.as_str()),
        Some(Value::Bool(b)) => Cow::Owned(b.to_string()),
        Some(Value::Number(n)) => Cow::Owned(n.to_string()),
        Some(other) => Cow::Owned(other.to_string()),
    }
}
