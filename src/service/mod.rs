//! Service layer module

pub mod analysis_service;
pub mod error;
pub mod types;

pub use analysis_service::AnalysisService;
pub use error::AnalysisError;
pub use types::*;
