/// Failures surfaced by the upstream client and the aggregators.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum ApiError {
    /// Transport failure, non-2xx status or a payload that does not parse.
    #[error("upstream error: {0}")]
    Upstream(String),
    /// The request was well formed but the resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.status() == Some(reqwest::StatusCode::NOT_FOUND) {
            let target = err
                .url()
                .map(|url| url.to_string())
                .unwrap_or_else(|| err.to_string());
            return ApiError::NotFound(target);
        }
        ApiError::Upstream(err.to_string())
    }
}
