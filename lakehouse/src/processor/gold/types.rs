use crate::reference::VehicleCategory;
use chrono::NaiveDate;
use std::fmt;

/// One row of the gold table.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub registration_date: NaiveDate,
    pub year: i32,
    pub month: i32,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub brand: String,
    pub model: String,
    pub engine_displacement_cc: i64,
    pub vehicle_type: VehicleCategory,
    pub is_electric: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    Brand,
    City,
}

impl WarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Brand => "brand",
            Self::City => "city",
        }
    }
}

/// An unmapped value frequent enough in one file to deserve attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataQualityWarning {
    pub file: String,
    pub kind: WarningKind,
    pub value: String,
    pub count: usize,
    /// City already listed as out of scope. Does not suppress the warning.
    pub known_out_of_scope: bool,
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} '{}' unmapped in {} rows that were dropped",
            self.file,
            self.kind.as_str(),
            self.value,
            self.count
        )?;
        if self.known_out_of_scope {
            write!(f, " (known out of scope)")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnrichmentOutcome {
    pub records: Vec<EnrichedRecord>,
    pub warnings: Vec<DataQualityWarning>,
    pub dropped_brand_rows: usize,
    pub dropped_city_rows: usize,
}
