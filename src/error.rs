use thiserror::Error;

/// Everything that can go wrong while answering a single request.
///
/// None of these are fatal to the process; each one is scoped to the
/// connection that provoked it. The dispatcher answers with an error page,
/// the relay closes the connection without a response.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("the {0} method is not implemented")]
    MethodNotImplemented(String),
    #[error("{0} is not a valid target")]
    InvalidTarget(String),
    #[error("could not connect to {0}")]
    OriginUnreachable(String),
    #[error("{0} was not found")]
    ResourceNotFound(String),
    #[error("access to {0} is denied")]
    ResourceForbidden(String),
}

impl HttpError {
    /// Status code and reason phrase for the error page.
    pub fn status(&self) -> (u16, &'static str) {
        match self {
            Self::MethodNotImplemented(_) => (501, "Not Implemented"),
            Self::InvalidTarget(_) => (400, "Bad Request"),
            Self::OriginUnreachable(_) => (502, "Bad Gateway"),
            Self::ResourceNotFound(_) => (404, "Not Found"),
            Self::ResourceForbidden(_) => (403, "Forbidden"),
        }
    }
}
