mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Bm25, Chunking, Config, EmbeddingProviderConfig, Hosted, Ingest, ModelPrice, Qdrant, Retrieval,
	Service,
};

use std::{fs, path::Path};

pub const LEXICAL_SIGNALS: [&str; 2] = ["rank", "score"];

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	parse(&raw).map_err(|err| match err {
		Error::ParseConfig { source, .. } => Error::ParseConfig { path: path.to_path_buf(), source },
		other => other,
	})
}

/// Parses, normalizes and validates a TOML document.
pub fn parse(raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw)
		.map_err(|err| Error::ParseConfig { path: Default::default(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.chunking.chunk_size == 0 {
		return Err(Error::Validation {
			message: "chunking.chunk_size must be greater than zero.".to_string(),
		});
	}
	if cfg.chunking.overlap >= cfg.chunking.chunk_size {
		return Err(Error::Validation {
			message: "chunking.overlap must be less than chunking.chunk_size.".to_string(),
		});
	}

	let retrieval = &cfg.retrieval;

	if !retrieval.vector_weight.is_finite() {
		return Err(Error::Validation {
			message: "retrieval.vector_weight must be a finite number.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&retrieval.vector_weight) {
		return Err(Error::Validation {
			message: "retrieval.vector_weight must be in the range 0.0-1.0.".to_string(),
		});
	}
	if retrieval.candidate_floor == 0 {
		return Err(Error::Validation {
			message: "retrieval.candidate_floor must be greater than zero.".to_string(),
		});
	}
	if retrieval.lexical_candidate_floor == 0 {
		return Err(Error::Validation {
			message: "retrieval.lexical_candidate_floor must be greater than zero.".to_string(),
		});
	}
	if !LEXICAL_SIGNALS.contains(&retrieval.lexical_signal.as_str()) {
		return Err(Error::Validation {
			message: "retrieval.lexical_signal must be one of rank or score.".to_string(),
		});
	}

	for (label, value) in [
		("retrieval.bm25.k1", retrieval.bm25.k1),
		("retrieval.bm25.b", retrieval.bm25.b),
		("retrieval.bm25.epsilon", retrieval.bm25.epsilon),
	] {
		if !value.is_finite() || value < 0.0 {
			return Err(Error::Validation {
				message: format!("{label} must be a finite number, zero or greater."),
			});
		}
	}

	if retrieval.bm25.b > 1.0 {
		return Err(Error::Validation {
			message: "retrieval.bm25.b must be 1.0 or less.".to_string(),
		});
	}

	if cfg.ingest.csv_max_rows == 0 {
		return Err(Error::Validation {
			message: "ingest.csv_max_rows must be greater than zero.".to_string(),
		});
	}

	for (model, price) in &cfg.pricing {
		if model.trim().is_empty() {
			return Err(Error::Validation { message: "pricing keys must be non-empty.".to_string() });
		}

		for (side, value) in [("input", price.input), ("output", price.output)] {
			if !value.is_finite() || value < 0.0 {
				return Err(Error::Validation {
					message: format!(
						"pricing.\"{model}\".{side} must be a finite number, zero or greater."
					),
				});
			}
		}
	}

	if let Some(hosted) = cfg.hosted.as_ref() {
		if hosted.qdrant.collection.trim().is_empty() {
			return Err(Error::Validation {
				message: "hosted.qdrant.collection must be non-empty.".to_string(),
			});
		}
		if hosted.embedding.dimensions == 0 {
			return Err(Error::Validation {
				message: "hosted.embedding.dimensions must be greater than zero.".to_string(),
			});
		}

		for (label, timeout_ms) in [
			("hosted.qdrant.timeout_ms", hosted.qdrant.timeout_ms),
			("hosted.embedding.timeout_ms", hosted.embedding.timeout_ms),
		] {
			if timeout_ms == 0 {
				return Err(Error::Validation {
					message: format!("{label} must be greater than zero."),
				});
			}
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.retrieval.lexical_signal = cfg.retrieval.lexical_signal.trim().to_ascii_lowercase();

	let Some(hosted) = cfg.hosted.as_mut() else { return };

	for value in [&mut hosted.qdrant.url, &mut hosted.qdrant.api_key, &mut hosted.embedding.api_key]
	{
		if value.as_deref().map(|raw| raw.trim().is_empty()).unwrap_or(false) {
			*value = None;
		}
	}
}
