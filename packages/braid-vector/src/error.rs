use crate::BackendKind;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Vector backend configuration error: {message}")]
	Configuration { message: String },
	#[error("{backend} backend {operation} failed: {message}")]
	Transport { operation: &'static str, backend: BackendKind, message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
}
impl Error {
	pub(crate) fn hosted(operation: &'static str, err: impl std::fmt::Display) -> Self {
		Self::Transport { operation, backend: BackendKind::Hosted, message: err.to_string() }
	}
}
