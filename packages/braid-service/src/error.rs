pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Retrieval {operation} failed: {source}")]
	Vector {
		operation: &'static str,
		#[source]
		source: braid_vector::Error,
	},
}
impl Error {
	pub(crate) fn vector(operation: &'static str) -> impl FnOnce(braid_vector::Error) -> Self {
		move |source| Self::Vector { operation, source }
	}
}
