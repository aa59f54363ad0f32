pub mod error;

pub mod buffer;
pub mod storage;

pub mod config;
