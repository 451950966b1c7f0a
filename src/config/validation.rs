//! Validation of the merged configuration.

use url::Url;

use super::ConfigError;

const MIN_FRAME_SIZE: usize = 256;
const MAX_FRAME_SIZE: usize = 16384;

pub fn validate_api_key(api_key: &str) -> Result<(), ConfigError> {
    if api_key.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "Gemini API key is required (set GEMINI_API_KEY or gemini.api_key)".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_sample_rates(capture: u32, playback: u32) -> Result<(), ConfigError> {
    if capture == 0 || playback == 0 {
        return Err(ConfigError::Invalid(format!(
            "sample rates must be positive (capture {capture}, playback {playback})"
        )));
    }
    Ok(())
}

pub fn validate_frame_size(frame_size: usize) -> Result<(), ConfigError> {
    if !(MIN_FRAME_SIZE..=MAX_FRAME_SIZE).contains(&frame_size) {
        return Err(ConfigError::Invalid(format!(
            "frame_size must be between {MIN_FRAME_SIZE} and {MAX_FRAME_SIZE}, got {frame_size}"
        )));
    }
    Ok(())
}

pub fn validate_noise_threshold(threshold: f32) -> Result<(), ConfigError> {
    if !(0.0..1.0).contains(&threshold) {
        return Err(ConfigError::Invalid(format!(
            "noise_threshold must be in [0, 1), got {threshold}"
        )));
    }
    Ok(())
}

pub fn validate_webhook_url(url: &str) -> Result<(), ConfigError> {
    let parsed = Url::parse(url)
        .map_err(|e| ConfigError::Invalid(format!("booking webhook URL {url:?}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid(format!(
            "booking webhook URL must use http or https, got {}",
            parsed.scheme()
        )));
    }
    Ok(())
}
