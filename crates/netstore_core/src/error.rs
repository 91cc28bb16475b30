use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetstoreError {
    #[error("storage error: {message}")]
    Storage { message: String },
    #[error("not found: {message}")]
    NotFound { message: String },
    #[error("validation error: {message}")]
    Validation { message: String },
    #[error("invariant violation: {message}")]
    Invariant { message: String },
}

impl NetstoreError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant {
            message: message.into(),
        }
    }

    pub fn codec(err: serde_json::Error) -> Self {
        Self::Storage {
            message: format!("codec: {err}"),
        }
    }

    pub fn is_invariant(&self) -> bool {
        matches!(self, Self::Invariant { .. })
    }
}

pub type NetstoreResult<T> = Result<T, NetstoreError>;

impl From<sea_orm::DbErr> for NetstoreError {
    fn from(value: sea_orm::DbErr) -> Self {
        NetstoreError::storage(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::NetstoreError;

    #[test]
    fn helper_constructors_set_variants() {
        let err = NetstoreError::storage("disk");
        assert!(matches!(err, NetstoreError::Storage { .. }));
        let err = NetstoreError::not_found("missing");
        assert!(matches!(err, NetstoreError::NotFound { .. }));
        let err = NetstoreError::invalid("bad");
        assert!(matches!(err, NetstoreError::Validation { .. }));
        let err = NetstoreError::invariant("variant 0");
        assert!(err.is_invariant());
    }

    #[test]
    fn codec_errors_surface_as_storage() {
        let err = serde_json::from_str::<u32>("nope").expect_err("invalid json");
        assert!(matches!(
            NetstoreError::codec(err),
            NetstoreError::Storage { .. }
        ));
    }
}
