use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),
    #[error("generator error: {0}")]
    Generator(#[from] sample_dispatch::Error),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("clock did not advance after {0} reads")]
    ClockUnavailable(usize),
    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn other(err: impl ToString) -> Self {
        Error::Other(err.to_string())
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Error::InvalidConfig(reason.into())
    }
}
