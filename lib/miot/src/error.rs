use std::fmt;

#[derive(Debug)]
pub enum Error {
    StreamClosed,
    DeviceResponse(i16),
    Mqtt(paho_mqtt::Error),
    Json(serde_json::Error),
    UrlParse(chipp_http::UrlParseError),
    Http(chipp_http::Error),
    Timeout(tokio::time::error::Elapsed),
}

impl From<paho_mqtt::Error> for Error {
    fn from(err: paho_mqtt::Error) -> Self {
        Self::Mqtt(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<chipp_http::UrlParseError> for Error {
    fn from(err: chipp_http::UrlParseError) -> Self {
        Self::UrlParse(err)
    }
}

impl From<chipp_http::Error> for Error {
    fn from(err: chipp_http::Error) -> Self {
        Self::Http(err)
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        Self::Timeout(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StreamClosed => write!(f, "response stream is closed"),
            Self::DeviceResponse(code) => write!(f, "device error code {code}"),
            Self::Mqtt(err) => write!(f, "mqtt error: {err}"),
            Self::Json(err) => write!(f, "json error: {err}"),
            Self::UrlParse(err) => write!(f, "url parse error: {err}"),
            Self::Http(err) => write!(f, "http error: {err}"),
            Self::Timeout(err) => write!(f, "timeout error: {err}"),
        }
    }
}

impl std::error::Error for Error {}
