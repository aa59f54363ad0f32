use serde::Deserialize;

use crate::error::Result;
use crate::storage::StorageType;

#[derive(Debug, PartialEq, Deserialize)]
pub struct Config {
    /// number of frames in the buffer pool.
    pub pool_size: usize,
    pub log_level: String,

    pub storage_type: StorageType,
    /// page file used by the disk storage.
    pub data_file: String,
}

impl Config {
    pub fn new(file: &str) -> Result<Config> {
        let mut cfg = config::Config::builder()
            .set_default("pool_size", 64)?
            .set_default("log_level", "info")?
            .set_default("storage_type", "memory")?
            .set_default("data_file", "data/sboxbuf.db")?;
        if !file.is_empty() {
            cfg = cfg.add_source(config::File::with_name(file))
        }
        cfg = cfg.add_source(config::Environment::with_prefix("SBOXBUF"));
        Ok(cfg.build()?.try_deserialize()?)
    }
}
