use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use lazy_static::lazy_static;
use std::sync::Arc;

// Silver column names, after header normalization.
pub const REGISTRATION_DATE: &str = "fecha_matriculacion";
pub const BRAND: &str = "marca";
pub const MODEL: &str = "modelo";
pub const DISPLACEMENT: &str = "cilindrada";
pub const CITY: &str = "localidad";

/// Raw layer: every fixed-width field as text, named as configured.
pub fn raw_registrations_schema(field_names: &[String]) -> Schema {
    Schema::new(
        field_names
            .iter()
            .map(|name| Field::new(name, DataType::Utf8, false))
            .collect::<Vec<_>>(),
    )
}

// Gold layer schema
pub fn gold_registrations_schema() -> Schema {
    Schema::new(vec![
        Field::new("registration_date", DataType::Date32, false),
        Field::new("year", DataType::Int32, false),
        Field::new("month", DataType::Int32, false),
        Field::new("city", DataType::Utf8, false),
        Field::new("latitude", DataType::Float64, false),
        Field::new("longitude", DataType::Float64, false),
        Field::new("brand", DataType::Utf8, false),
        Field::new("model", DataType::Utf8, false),
        Field::new("engine_displacement_cc", DataType::Int64, false),
        Field::new("vehicle_type", DataType::Utf8, false),
        Field::new("is_electric", DataType::Boolean, false),
    ])
}

pub fn gold_schema() -> SchemaRef {
    GOLD_REGISTRATIONS_SCHEMA.clone()
}

lazy_static! {
    static ref GOLD_REGISTRATIONS_SCHEMA: SchemaRef = Arc::new(gold_registrations_schema());
}
