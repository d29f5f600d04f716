//! Orbit lookup core
//!
//! ## Main Components
//! - `parse_product_name`: Sentinel-1 product name -> `ProductIdentity`
//! - `OrbitResolver`: acquisition window -> ranked covering orbit records
//! - `RecordBuilder`: orbit file name -> `OrbitRecord`, written to the index
//! - `ingest_all`: a batch of orbit file names -> `IngestSummary`

mod product_name;
pub use product_name::{ProductIdentity, parse_product_name};

mod resolver;
pub use resolver::{LOOKBACK_DAYS, OrbitResolver};

mod record;
pub use record::RecordBuilder;

mod ingest;
pub use ingest::{IngestSummary, ingest_all, read_orbit_file_names};
