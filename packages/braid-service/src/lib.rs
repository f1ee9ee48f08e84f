pub mod context;
pub mod engine;

mod error;

pub use context::{
	answer_length, citation_count, cost_estimate, format_context, grounding_coverage, token_estimate,
};
pub use engine::{BlendedResult, Citation, EngineSettings, RetrievalEngine};
pub use error::{Error, Result};
