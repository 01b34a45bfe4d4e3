pub type BoothResult<T> = Result<T, BoothError>;

#[derive(thiserror::Error, Debug)]
pub enum BoothError {
    #[error("decode error: {0}")]
    Decode(String),

    #[error("composition error: {0}")]
    Composition(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("capture limit exceeded: session holds at most {max} photos")]
    CaptureLimitExceeded { max: usize },

    #[error("invalid photo data: {0}")]
    InvalidPhotoData(String),

    #[error("index {index} out of range for {len} photos")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BoothError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn composition(msg: impl Into<String>) -> Self {
        Self::Composition(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn invalid_photo(msg: impl Into<String>) -> Self {
        Self::InvalidPhotoData(msg.into())
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(BoothError::decode("x").to_string().contains("decode error:"));
        assert!(
            BoothError::composition("x")
                .to_string()
                .contains("composition error:")
        );
        assert!(BoothError::encode("x").to_string().contains("encode error:"));
        assert!(
            BoothError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(BoothError::config("x").to_string().contains("config error:"));
    }

    #[test]
    fn structured_variants_render_their_fields() {
        let err = BoothError::IndexOutOfRange { index: 4, len: 2 };
        assert_eq!(err.to_string(), "index 4 out of range for 2 photos");

        let err = BoothError::not_found("layout", "strip-9");
        assert_eq!(err.to_string(), "layout 'strip-9' not found");
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = BoothError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
