pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request at {field}: {message}")]
	Validation { field: String, message: String },
	#[error("Retrieval failed: {message}")]
	Retrieval { message: String },
}
impl Error {
	pub(crate) fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::Validation { field: field.into(), message: message.into() }
	}

	/// Retrieval failures are transient; the caller may retry. Validation failures are not.
	pub fn is_retryable(&self) -> bool {
		matches!(self, Self::Retrieval { .. })
	}
}

impl From<color_eyre::Report> for Error {
	fn from(err: color_eyre::Report) -> Self {
		Self::Retrieval { message: err.to_string() }
	}
}
