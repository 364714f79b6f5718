//! Static lookup tables used by the gold layer.
//!
//! The brand document is a YAML or JSON object whose top-level keys are category
//! sections (`cars`, `motorbikes`, `trucks`, `tractor`, `unknown`), each mapping
//! the raw brand spelling found in the source files to a canonical brand name.
//! Brands listed under `unknown` are recognised but out of scope: they are
//! dropped without a data-quality warning.

use crate::utils::paths::has_extension;
use common::config::ReferenceConfig;
use common::{Error, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::io::Read;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleCategory {
    Car,
    Motorbike,
    Truck,
    Tractor,
    Unclassified,
}

impl VehicleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Car => "Car",
            Self::Motorbike => "Motorbike",
            Self::Truck => "Truck",
            Self::Tractor => "Tractor",
            Self::Unclassified => "Unclassified",
        }
    }

    pub fn is_in_scope(&self) -> bool {
        !matches!(self, Self::Unclassified)
    }
}

impl fmt::Display for VehicleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandEntry {
    pub canonical: String,
    pub category: VehicleCategory,
}

#[derive(Debug, Deserialize, Default)]
struct BrandDocument {
    #[serde(default)]
    cars: BTreeMap<String, String>,
    #[serde(default)]
    motorbikes: BTreeMap<String, String>,
    #[serde(default)]
    trucks: BTreeMap<String, String>,
    #[serde(default, alias = "tractors")]
    tractor: BTreeMap<String, String>,
    #[serde(default)]
    unknown: BTreeMap<String, String>,
}

/// Raw brand alias -> (canonical brand, category).
#[derive(Debug, Clone, Default)]
pub struct BrandMapping {
    entries: HashMap<String, BrandEntry>,
}

impl BrandMapping {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let document: BrandDocument = serde_json::from_reader(reader)?;
        Ok(Self::from_document(document))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let document: BrandDocument = serde_json::from_str(json)?;
        Ok(Self::from_document(document))
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let document: BrandDocument = serde_yaml::from_str(yaml)?;
        Ok(Self::from_document(document))
    }

    /// Loads a `.yaml`/`.yml` document, or JSON for any other extension.
    pub fn load(path: &Path) -> Result<Self> {
        let file = open(path)?;
        let name = path.to_string_lossy();
        if has_extension(&name, "yaml") || has_extension(&name, "yml") {
            let document: BrandDocument = serde_yaml::from_reader(file)?;
            Ok(Self::from_document(document))
        } else {
            Self::from_reader(file)
        }
    }

    fn from_document(document: BrandDocument) -> Self {
        let mut mapping = Self::default();
        // Later sections win when an alias is listed twice.
        let sections = [
            (document.cars, VehicleCategory::Car),
            (document.motorbikes, VehicleCategory::Motorbike),
            (document.trucks, VehicleCategory::Truck),
            (document.tractor, VehicleCategory::Tractor),
            (document.unknown, VehicleCategory::Unclassified),
        ];
        for (aliases, category) in sections {
            for (alias, canonical) in aliases {
                mapping.insert(&alias, &canonical, category);
            }
        }
        mapping
    }

    pub fn insert(&mut self, alias: &str, canonical: &str, category: VehicleCategory) {
        self.entries.insert(
            alias.to_string(),
            BrandEntry {
                canonical: canonical.to_string(),
                category,
            },
        );
    }

    /// `None` means the alias is unmapped.
    pub fn classify(&self, raw_brand: &str) -> Option<&BrandEntry> {
        self.entries.get(raw_brand)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
struct CityRow {
    city: String,
    latitude: f64,
    longitude: f64,
}

/// City name -> coordinates, matched exactly.
#[derive(Debug, Clone, Default)]
pub struct CityCoordinates {
    cities: HashMap<String, Coordinates>,
}

impl CityCoordinates {
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut coordinates = Self::default();
        for row in csv_reader.deserialize::<CityRow>() {
            let row = row?;
            coordinates.insert(&row.city, row.latitude, row.longitude);
        }
        Ok(coordinates)
    }

    pub fn insert(&mut self, city: &str, latitude: f64, longitude: f64) {
        self.cities.insert(
            city.to_string(),
            Coordinates {
                latitude,
                longitude,
            },
        );
    }

    pub fn get(&self, city: &str) -> Option<Coordinates> {
        self.cities.get(city).copied()
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

/// Everything the enrichment step looks up, loaded once per run.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub brands: BrandMapping,
    pub cities: CityCoordinates,
    pub out_of_scope_cities: HashSet<String>,
}

impl ReferenceData {
    pub fn new(brands: BrandMapping, cities: CityCoordinates) -> Self {
        Self {
            brands,
            cities,
            out_of_scope_cities: HashSet::new(),
        }
    }

    pub fn with_out_of_scope_cities<I, S>(mut self, cities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.out_of_scope_cities = cities.into_iter().map(Into::into).collect();
        self
    }

    pub fn load(config: &ReferenceConfig) -> Result<Self> {
        let brands = BrandMapping::load(&config.brands_path)?;
        let delimiter = config.cities_delimiter.as_bytes().first().copied().ok_or_else(|| {
            Error::InvalidInput("reference.cities_delimiter is empty".to_string())
        })?;
        let cities = CityCoordinates::from_reader(open(&config.cities_path)?, delimiter)?;

        info!(
            brands = brands.len(),
            cities = cities.len(),
            out_of_scope_cities = config.out_of_scope_cities.len(),
            "Loaded reference data"
        );

        Ok(Self::new(brands, cities).with_out_of_scope_cities(config.out_of_scope_cities.clone()))
    }

    pub fn is_known_out_of_scope(&self, city: &str) -> bool {
        self.out_of_scope_cities.contains(city)
    }
}

fn open(path: &Path) -> Result<std::fs::File> {
    std::fs::File::open(path).map_err(|e| {
        Error::InvalidInput(format!(
            "cannot open reference file {}: {}",
            path.display(),
            e
        ))
    })
}
