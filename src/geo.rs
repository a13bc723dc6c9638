use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info};
use tokio::sync::OnceCell;

use crate::error::{EngineError, Result};
use crate::models::GeoCoordinate;

/// Fields per reference row: postcode, latitude, longitude, city, state, pos_id
const GEO_FIELDS: usize = 6;

static SHARED_GEO_INDEX: OnceCell<Arc<GeoIndex>> = OnceCell::const_new();

/// Read-only postcode → coordinate map
///
/// Built once at startup and shared by every scoring worker through an
/// `Arc`. There is no interior mutability, so reads never lock.
#[derive(Debug, Default)]
pub struct GeoIndex {
    coordinates: HashMap<u32, GeoCoordinate>,
}

impl GeoIndex {
    /// Load the reference CSV at `path`
    ///
    /// Rows with the wrong field count are skipped. A non-numeric latitude or
    /// longitude fails the whole load with `EngineError::Configuration`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let index = Self::from_reader(file, &path.display().to_string())?;
        info!(
            "Loaded {} postcodes from geo reference '{}'",
            index.len(),
            path.display()
        );
        Ok(index)
    }

    /// Build an index from any CSV source; `source` names it in errors
    pub fn from_reader<R: Read>(reader: R, source: &str) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut coordinates = HashMap::new();

        for result in csv_reader.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            if record.len() != GEO_FIELDS {
                debug!("{}:{}: skipping row with {} fields", source, line, record.len());
                continue;
            }

            let parse_degrees = |field: &str, name: &str| {
                field
                    .parse::<f64>()
                    .map_err(|_| EngineError::Configuration {
                        path: source.to_string(),
                        line,
                        message: format!("non-numeric {} '{}'", name, field),
                    })
            };
            let latitude = parse_degrees(&record[1], "latitude")?;
            let longitude = parse_degrees(&record[2], "longitude")?;

            let postcode = match record[0].parse::<u32>() {
                Ok(postcode) => postcode,
                Err(_) => {
                    debug!("{}:{}: skipping row with postcode '{}'", source, line, &record[0]);
                    continue;
                }
            };

            coordinates.insert(
                postcode,
                GeoCoordinate {
                    postcode,
                    latitude,
                    longitude,
                    city: record[3].to_string(),
                    state: record[4].to_string(),
                    pos_id: record[5].to_string(),
                },
            );
        }

        Ok(Self { coordinates })
    }

    /// Process-wide index, loaded from `path` on first use
    ///
    /// Concurrent first callers wait on the same initialisation; later calls
    /// return the already-built index and ignore `path`.
    pub async fn shared<P: AsRef<Path>>(path: P) -> Result<Arc<GeoIndex>> {
        let index = SHARED_GEO_INDEX
            .get_or_try_init(|| async { GeoIndex::load(path.as_ref()).map(Arc::new) })
            .await?;
        Ok(Arc::clone(index))
    }

    pub fn lookup(&self, postcode: u32) -> Result<&GeoCoordinate> {
        self.coordinates
            .get(&postcode)
            .ok_or(EngineError::NotFound { postcode })
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }
}
