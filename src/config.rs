use std::path::PathBuf;

/// Fixed pipeline settings. One config is built in `main` and passed by
/// reference into each stage; nothing else is configurable at runtime.
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the gzip-compressed tab-separated market tracker export.
    pub source_url: String,
    /// Where the cleaned CSV is written before upload.
    pub output_path: PathBuf,
    /// Destination bucket.
    pub bucket: String,
    /// Destination object key inside the bucket.
    pub object_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url:
                "https://redfin-public-data.s3.us-west-2.amazonaws.com/redfin_market_tracker/city_market_tracker.tsv000.gz"
                    .to_string(),
            output_path: PathBuf::from("real_estate_data.csv"),
            bucket: "redfin-final-csv".to_string(),
            object_key: "real_estate_data.csv".to_string(),
        }
    }
}
