use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised while fetching or caching weather data.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("City not found: {0}")]
    CityNotFound(String),

    #[error("Cache error: {0}")]
    Cache(String),
}

impl WeatherError {
    /// Short, non-technical message for the terminal.
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::Network(_) | WeatherError::Status { .. } => {
                "Unable to load weather data. Please check your connection or try another city."
            }
            WeatherError::Parse(_) => "The weather service returned data we could not read.",
            WeatherError::CityNotFound(_) => "City not found. Try a different spelling.",
            WeatherError::Cache(_) => "The local weather cache could not be used.",
        }
    }

    pub(crate) fn status(status: StatusCode, body: &str) -> Self {
        WeatherError::Status { status, body: truncate_body(body) }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_bodies_are_truncated() {
        let err = WeatherError::status(StatusCode::BAD_GATEWAY, &"x".repeat(500));
        let msg = err.to_string();

        assert!(msg.starts_with("Request failed with status 502 Bad Gateway: "));
        assert!(msg.ends_with("..."));
        assert!(msg.len() < 300);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let body = "é".repeat(150);
        let truncated = truncate_body(&body);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn city_not_found_message() {
        let err = WeatherError::CityNotFound("Atlantis".into());
        assert_eq!(err.to_string(), "City not found: Atlantis");
        assert!(err.user_message().contains("City not found"));
    }
}
