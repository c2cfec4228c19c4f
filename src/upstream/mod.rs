//! External skin-analysis API
//!
//! The orchestrator talks to the vision service through [`SkinAnalyzer`],
//! so tests can substitute an in-process fake.

pub mod ailab;
pub mod traits;

pub use ailab::AilabClient;
pub use traits::SkinAnalyzer;
