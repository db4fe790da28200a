//! Column names the pipeline gives meaning to.

pub const PORT_NAME: &str = "Port Name";
pub const COUNTRY: &str = "Country";
pub const MILLION_TEU: &str = "MillionTEU2023";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
