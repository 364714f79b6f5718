use super::types::{DataQualityWarning, EnrichedRecord, EnrichmentOutcome, WarningKind};
use crate::reference::{BrandEntry, ReferenceData};
use crate::schema::{self, BRAND, CITY, DISPLACEMENT, MODEL, REGISTRATION_DATE};
use crate::utils::arrow::{date_column, str_value, string_column};
use arrow::array::{
    ArrayRef, BooleanArray, Date32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::Date32Type;
use arrow::record_batch::RecordBatch;
use chrono::Datelike;
use common::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Warnings for values whose count exceeds `threshold`, most frequent first.
fn material_warnings(
    counts: HashMap<&str, usize>,
    threshold: usize,
    file_id: &str,
    kind: WarningKind,
    reference: &ReferenceData,
) -> Vec<DataQualityWarning> {
    let mut warnings: Vec<DataQualityWarning> = counts
        .into_iter()
        .filter(|(_, count)| *count > threshold)
        .map(|(value, count)| DataQualityWarning {
            file: file_id.to_string(),
            kind,
            value: value.to_string(),
            count,
            known_out_of_scope: kind == WarningKind::City && reference.is_known_out_of_scope(value),
        })
        .collect();

    warnings.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    warnings
}

pub fn parse_displacement(raw: &str) -> Result<i64> {
    let trimmed = raw.trim();
    trimmed.parse::<i64>().map_err(|_| {
        Error::Parse(format!("engine displacement '{}' is not an integer", raw))
    })
}

/// Classifies, geocodes and flags one silver table.
///
/// Rows with unmapped or out-of-scope brands and rows without coordinates are
/// dropped; values dropped more than `threshold` times come back as warnings.
/// A non-numeric displacement fails the whole table.
pub fn enrich(
    batch: &RecordBatch,
    reference: &ReferenceData,
    file_id: &str,
    threshold: usize,
) -> Result<EnrichmentOutcome> {
    let dates = date_column(batch, REGISTRATION_DATE)?;
    let brands = string_column(batch, BRAND)?;
    let models = string_column(batch, MODEL)?;
    let displacements = string_column(batch, DISPLACEMENT)?;
    let cities = string_column(batch, CITY)?;

    let mut outcome = EnrichmentOutcome::default();

    // Brand classification
    let mut unmapped_brands: HashMap<&str, usize> = HashMap::new();
    let mut classified: Vec<(usize, &BrandEntry)> = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let raw_brand = str_value(brands, row);
        match reference.brands.classify(raw_brand) {
            Some(entry) if entry.category.is_in_scope() => classified.push((row, entry)),
            Some(_) => outcome.dropped_brand_rows += 1,
            None => {
                *unmapped_brands.entry(raw_brand).or_default() += 1;
                outcome.dropped_brand_rows += 1;
            }
        }
    }
    outcome.warnings.extend(material_warnings(
        unmapped_brands,
        threshold,
        file_id,
        WarningKind::Brand,
        reference,
    ));

    // Displacement and electric flag
    let mut with_displacement = Vec::with_capacity(classified.len());
    for (row, entry) in classified {
        let displacement = parse_displacement(str_value(displacements, row))
            .map_err(|e| Error::Parse(format!("{} row {}: {}", file_id, row + 1, e)))?;
        with_displacement.push((row, entry, displacement));
    }

    // Coordinates join
    let mut unmatched_cities: HashMap<&str, usize> = HashMap::new();
    for (row, entry, displacement) in with_displacement {
        let city = str_value(cities, row);
        let Some(coordinates) = reference.cities.get(city) else {
            *unmatched_cities.entry(city).or_default() += 1;
            outcome.dropped_city_rows += 1;
            continue;
        };

        let registration_date = dates.value_as_date(row).ok_or_else(|| {
            Error::Parse(format!("{} row {}: missing registration date", file_id, row + 1))
        })?;

        outcome.records.push(EnrichedRecord {
            registration_date,
            year: registration_date.year(),
            month: registration_date.month() as i32,
            city: city.to_string(),
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
            brand: entry.canonical.clone(),
            model: str_value(models, row).to_string(),
            engine_displacement_cc: displacement,
            vehicle_type: entry.category,
            is_electric: displacement == 0,
        });
    }
    outcome.warnings.extend(material_warnings(
        unmatched_cities,
        threshold,
        file_id,
        WarningKind::City,
        reference,
    ));

    Ok(outcome)
}

/// Gold records to a table in the fixed gold column order.
pub fn records_to_batch(records: &[EnrichedRecord]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Date32Array::from_iter_values(
            records
                .iter()
                .map(|r| Date32Type::from_naive_date(r.registration_date)),
        )),
        Arc::new(Int32Array::from_iter_values(records.iter().map(|r| r.year))),
        Arc::new(Int32Array::from_iter_values(records.iter().map(|r| r.month))),
        Arc::new(StringArray::from_iter_values(records.iter().map(|r| r.city.as_str()))),
        Arc::new(Float64Array::from_iter_values(records.iter().map(|r| r.latitude))),
        Arc::new(Float64Array::from_iter_values(records.iter().map(|r| r.longitude))),
        Arc::new(StringArray::from_iter_values(records.iter().map(|r| r.brand.as_str()))),
        Arc::new(StringArray::from_iter_values(records.iter().map(|r| r.model.as_str()))),
        Arc::new(Int64Array::from_iter_values(
            records.iter().map(|r| r.engine_displacement_cc),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.vehicle_type.as_str()),
        )),
        Arc::new(BooleanArray::from(
            records.iter().map(|r| r.is_electric).collect::<Vec<bool>>(),
        )),
    ];

    Ok(RecordBatch::try_new(schema::gold_schema(), columns)?)
}
