//! Configuration, logging, and settings for the importer.

mod logging;
mod settings;

pub use logging::init_logger;
pub use settings::{
    load_dotenv,
    resolve_json_files,
    ImportSettings,
    DEFAULT_TIMEOUT_SECS,
    JSON_SUFFIX,
};
