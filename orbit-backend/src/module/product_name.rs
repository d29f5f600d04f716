//! Sentinel-1 product name parser
//!
//! A product name such as
//! `S1A_IW_GRDH_1SDV_20210101T000000_20210101T000020_036000_0439F1_1A2B`
//! is matched against the full naming convention in one anchored pattern.
//! Anything that does not conform, including trailing characters, is rejected.

use orbit_common::{CompactTimestamp, Platform};
use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::error::{OrbitError, Result};

const PLATFORM: &str = r"(?P<platform>S1A|S1B)";
const BEAM_MODE: &str = r"(?P<beam_mode>IW|EW|WV|EN|AN|S[1-6])";
const PRODUCT_TYPE: &str = r"(?P<product_type>GRD|SLC|RAW|OCN)(?P<resolution>[HMF_])";
const LEVEL: &str = r"(?P<level>[0-2])S";
const POLARIZATION: &str = r"(?P<polarization>SH|SV|DH|DV|HH|HV|VV|VH)";
const START: &str = r"(?P<start>[0-9]{8}T[0-9]{6})";
const END: &str = r"(?P<end>[0-9]{8}T[0-9]{6})";
const ABSOLUTE_ORBIT: &str = r"(?P<orbit>[0-9]{6})";
const DATA_TAKE: &str = r"(?P<data_take>[0-9A-F]{6})";
const UNIQUE_ID: &str = r"(?P<unique_id>[0-9A-F]{4})";

static PRODUCT_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        "^{PLATFORM}_{BEAM_MODE}_{PRODUCT_TYPE}_{LEVEL}{POLARIZATION}_{START}_{END}_{ABSOLUTE_ORBIT}_{DATA_TAKE}_{UNIQUE_ID}$"
    );
    Regex::new(&pattern).expect("product name pattern is valid")
});

/// Fields decoded from a Sentinel-1 product name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductIdentity {
    pub platform: Platform,
    /// e.g. "IW", "EW", "S3"
    pub beam_mode: String,
    /// One of "GRD", "SLC", "RAW", "OCN"
    pub product_type: String,
    /// 'H', 'M' or 'F'; `None` for product types without a resolution class
    pub resolution_class: Option<char>,
    pub processing_level: u8,
    /// e.g. "DV", "SH"
    pub polarization: String,
    pub acquisition_start: CompactTimestamp,
    pub acquisition_end: CompactTimestamp,
    pub absolute_orbit: u32,
    /// Six hex digits, kept as written
    pub data_take_id: String,
    /// Four hex digits, kept as written
    pub unique_id: String,
}

fn group<'h>(caps: &Captures<'h>, name: &str) -> &'h str {
    caps.name(name).map_or("", |m| m.as_str())
}

/// Parse a product name into its identity.
///
/// Fails with [`OrbitError::InvalidName`] when the name does not follow the
/// convention, names an impossible date, or ends before it starts.
pub fn parse_product_name(name: &str) -> Result<ProductIdentity> {
    let invalid = || OrbitError::InvalidName(name.to_string());

    let caps = PRODUCT_NAME_RE.captures(name).ok_or_else(invalid)?;

    let platform: Platform = group(&caps, "platform").parse().map_err(|_| invalid())?;
    let acquisition_start: CompactTimestamp =
        group(&caps, "start").parse().map_err(|_| invalid())?;
    let acquisition_end: CompactTimestamp = group(&caps, "end").parse().map_err(|_| invalid())?;
    if acquisition_start > acquisition_end {
        return Err(invalid());
    }

    let resolution_class = group(&caps, "resolution").chars().next().filter(|c| *c != '_');

    Ok(ProductIdentity {
        platform,
        beam_mode: group(&caps, "beam_mode").to_string(),
        product_type: group(&caps, "product_type").to_string(),
        resolution_class,
        processing_level: group(&caps, "level").parse().map_err(|_| invalid())?,
        polarization: group(&caps, "polarization").to_string(),
        acquisition_start,
        acquisition_end,
        absolute_orbit: group(&caps, "orbit").parse().map_err(|_| invalid())?,
        data_take_id: group(&caps, "data_take").to_string(),
        unique_id: group(&caps, "unique_id").to_string(),
    })
}
