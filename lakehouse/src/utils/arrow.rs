use arrow::array::{Array, Date32Array, StringArray};
use arrow::record_batch::RecordBatch;
use common::{Error, Result};

pub fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| Error::SchemaValidation(format!("missing column '{}'", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| {
            Error::SchemaValidation(format!("column '{}' is not a string column", name))
        })
}

pub fn date_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Date32Array> {
    batch
        .column_by_name(name)
        .ok_or_else(|| Error::SchemaValidation(format!("missing column '{}'", name)))?
        .as_any()
        .downcast_ref::<Date32Array>()
        .ok_or_else(|| Error::SchemaValidation(format!("column '{}' is not a date column", name)))
}

/// Value at `index`, treating nulls as empty text.
pub fn str_value(array: &StringArray, index: usize) -> &str {
    if array.is_null(index) {
        ""
    } else {
        array.value(index)
    }
}
