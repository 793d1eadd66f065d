use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutingError {
    #[error("admin credentials do not match")]
    InvalidCredentials,

    #[error("admin login required")]
    AdminRequired,

    #[error("no PIN is configured for this student; ask an administrator to set one")]
    PinNotConfigured,

    #[error("PIN does not match")]
    PinMismatch,

    #[error("PIN digits must be 0-9, got {0:?}")]
    BadDigit(String),

    #[error("student record no longer exists (index {index}, roster has {len}); refresh the roster")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("select a student first")]
    NoSelection,

    #[error("enter the student's PIN before generating a document")]
    GenerationLocked,

    #[error("invalid date for {field}: {value:?}")]
    InvalidDate { field: &'static str, value: String },

    #[error("snapshot could not be parsed: {0}")]
    BadSnapshot(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl OutingError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            Self::AdminRequired => "admin_required",
            Self::PinNotConfigured => "pin_not_configured",
            Self::PinMismatch => "pin_mismatch",
            Self::BadDigit(_) => "bad_params",
            Self::IndexOutOfRange { .. } => "index_out_of_range",
            Self::MissingField(_) => "missing_field",
            Self::NoSelection => "no_selection",
            Self::GenerationLocked => "generation_locked",
            Self::InvalidDate { .. } => "bad_date",
            Self::BadSnapshot(_) => "bad_snapshot",
            Self::Storage(_) => "storage_failed",
        }
    }
}

pub type Result<T> = std::result::Result<T, OutingError>;
