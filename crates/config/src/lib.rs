// Configuration loading

pub mod error;
pub mod settings;

pub use error::ConfigError;
pub use settings::{Settings, CONFIG_FILE_NAME, DATASET_PATH_ENV};
