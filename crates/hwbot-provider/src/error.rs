#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("endpoint {endpoint} is unavailable, response code: 404")]
    EndpointUnavailable { endpoint: String },

    #[error("endpoint {endpoint} is unavailable, response code: {code}")]
    UnexpectedStatusCode { endpoint: String, code: u16 },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("response is missing expected field: {0}")]
    MissingField(String),
}

impl ApiError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::EndpointUnavailable { .. } => Some(404),
            Self::UnexpectedStatusCode { code, .. } => Some(*code),
            _ => None,
        }
    }
}
