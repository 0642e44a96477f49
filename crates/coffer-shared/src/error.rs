use thiserror::Error;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    #[error("Password must not be empty")]
    Empty,

    #[error("Password must be at most {max} bytes")]
    TooLong { max: usize },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    Missing(&'static str),

    #[error("Parameter '{field}' is longer than {max} characters")]
    TooLong { field: &'static str, max: usize },
}
