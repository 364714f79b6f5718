use crate::schema::REGISTRATION_DATE;
use crate::utils::arrow::{str_value, string_column};
use arrow::array::{Array, ArrayRef, Date32Array};
use arrow::datatypes::{DataType, Date32Type, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use common::{Error, Result};
use std::sync::Arc;

/// Header normalization: trimmed, lowercase, spaces replaced by underscores.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Parses a `ddmmyyyy` registration date, restoring a leading zero lost upstream.
pub fn normalize_registration_date(raw: &str) -> Result<NaiveDate> {
    let padded = format!("{:0>8}", raw.trim());
    if padded.len() != 8 || !padded.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Parse(format!(
            "registration date '{}' is not an 8-digit ddmmyyyy value",
            raw
        )));
    }

    NaiveDate::parse_from_str(&padded, "%d%m%Y").map_err(|e| {
        Error::Parse(format!(
            "registration date '{}' (padded '{}') is not a valid date: {}",
            raw, padded, e
        ))
    })
}

/// Normalizes headers and turns the registration date column into dates.
///
/// A single bad date fails the whole table.
pub fn clean(raw: &RecordBatch) -> Result<RecordBatch> {
    let renamed: Vec<String> = raw
        .schema()
        .fields()
        .iter()
        .map(|field| normalize_column_name(field.name()))
        .collect();

    let date_index = renamed
        .iter()
        .position(|name| name == REGISTRATION_DATE)
        .ok_or_else(|| {
            Error::SchemaValidation(format!(
                "registration date column '{}' not found in {:?}",
                REGISTRATION_DATE, renamed
            ))
        })?;

    let raw_dates = string_column(raw, raw.schema().field(date_index).name())?;
    let mut days = Vec::with_capacity(raw_dates.len());
    for row in 0..raw_dates.len() {
        let date = normalize_registration_date(str_value(raw_dates, row))
            .map_err(|e| Error::Parse(format!("row {}: {}", row + 1, e)))?;
        days.push(Date32Type::from_naive_date(date));
    }

    let mut fields = Vec::with_capacity(renamed.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(renamed.len());
    for (index, name) in renamed.iter().enumerate() {
        if index == date_index {
            fields.push(Field::new(name, DataType::Date32, false));
            columns.push(Arc::new(Date32Array::from(days.clone())));
        } else {
            let field = raw.schema().field(index).clone();
            fields.push(field.with_name(name));
            columns.push(raw.column(index).clone());
        }
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::arrow::date_column;
    use arrow::array::StringArray;

    fn raw_batch(names: &[&str], dates: Vec<&str>) -> RecordBatch {
        let fields: Vec<Field> = names
            .iter()
            .map(|name| Field::new(*name, DataType::Utf8, false))
            .collect();
        let mut columns: Vec<ArrayRef> = vec![Arc::new(StringArray::from(dates.clone()))];
        for _ in 1..names.len() {
            columns.push(Arc::new(StringArray::from(vec!["x"; dates.len()])));
        }
        RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).unwrap()
    }

    #[test]
    fn test_normalize_column_name() {
        assert_eq!(normalize_column_name("  Fecha Matriculacion "), "fecha_matriculacion");
        assert_eq!(normalize_column_name("MARCA"), "marca");
    }

    #[test]
    fn test_date_padding() {
        let date = normalize_registration_date("1032024").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let date = normalize_registration_date("31122023").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn test_date_round_trip() {
        let mut day = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2016, 12, 31).unwrap();
        while day <= end {
            let raw = day.format("%d%m%Y").to_string();
            assert_eq!(normalize_registration_date(&raw).unwrap(), day);
            let unpadded = raw.trim_start_matches('0');
            assert_eq!(normalize_registration_date(unpadded).unwrap(), day);
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_invalid_dates() {
        for raw in ["32132024", "", "3002202", "0103202A", "010320245", "29022023"] {
            let err = normalize_registration_date(raw).unwrap_err();
            assert!(matches!(err, Error::Parse(_)), "{raw} should fail");
        }
    }

    #[test]
    fn test_clean_renames_and_parses() {
        let raw = raw_batch(&["Fecha Matriculacion", " Marca "], vec!["1032024", "15062023"]);
        let cleaned = clean(&raw).unwrap();

        assert_eq!(cleaned.schema().field(0).name(), "fecha_matriculacion");
        assert_eq!(cleaned.schema().field(1).name(), "marca");
        let dates = date_column(&cleaned, "fecha_matriculacion").unwrap();
        assert_eq!(dates.value_as_date(0), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(dates.value_as_date(1), NaiveDate::from_ymd_opt(2023, 6, 15));
    }

    #[test]
    fn test_clean_aborts_on_bad_date() {
        let raw = raw_batch(&["fecha_matriculacion", "marca"], vec!["01032024", "99999999"]);
        let err = clean(&raw).unwrap_err();
        assert!(matches!(err, Error::Parse(msg) if msg.contains("row 2")));
    }

    #[test]
    fn test_clean_requires_date_column() {
        let raw = raw_batch(&["marca"], vec!["FORD"]);
        assert!(matches!(clean(&raw).unwrap_err(), Error::SchemaValidation(_)));
    }
}
