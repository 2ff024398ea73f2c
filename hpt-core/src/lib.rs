pub mod csv_table;
pub mod date_header;
pub mod metrics;
pub mod period;
pub mod price_point;
pub mod region;

pub use region::{parse_regions, BuildOptions, RegionRecord, RegionSeriesBuilder};
