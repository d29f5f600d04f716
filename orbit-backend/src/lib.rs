pub mod config;
pub mod error;
pub mod index;
pub mod logging;
pub mod module;

pub use error::OrbitError;
