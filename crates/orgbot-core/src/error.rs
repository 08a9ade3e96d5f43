#[derive(thiserror::Error, Debug)]
pub enum OrgbotError {
    #[error("config error: {0}")]
    Config(String),
    #[error("persistence error: {0}")]
    Persistence(String),
}

pub type Result<T> = std::result::Result<T, OrgbotError>;
