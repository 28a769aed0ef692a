#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("dial or call failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("request exceeded its deadline")]
    Deadline,
    #[error("tls configuration error: {0}")]
    Tls(String),
}
