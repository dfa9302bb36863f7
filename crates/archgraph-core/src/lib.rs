pub mod config;
pub mod diagram;
pub mod entity;
pub mod error;
pub mod id;
pub mod logging;
pub mod model;
pub mod types;

pub use config::{
    AnalysisConfig, BuilderConfig, CacheConfig, ConfigLoader, DescriptionPrecedence, DriftConfig,
    EngineConfig, LoggingConfig,
};
pub use diagram::*;
pub use entity::*;
pub use error::*;
pub use id::*;
pub use logging::init_tracing;
pub use model::*;
pub use types::*;
