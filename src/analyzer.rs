use async_trait::async_trait;
use thiserror::Error;

use crate::models::AnalysisResult;

/// Failure of the external analysis collaborator.
///
/// The `Display` text is what the error classifier reads, so transport and HTTP
/// failures keep the wording the classifier matches on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyzeError {
    #[error("failed to fetch: {0}")]
    Transport(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed analysis response: {0}")]
    MalformedResult(String),

    #[error("{0}")]
    Other(String),
}

/// The remote radio-readiness critic. Only the file name is ever sent.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, file_name: &str) -> Result<AnalysisResult, AnalyzeError>;
}

pub const METRIC_NAMES: &[&str] = &[
    "Dynamic Range",
    "Loudness (LUFS)",
    "Stereo Width",
    "Frequency Balance",
    "Clarity & Presence",
    "Technical Issues",
];

/// Build the critique prompt for a track. The file name is the only input.
pub fn build_prompt(file_name: &str) -> String {
    format!(
        "Act as a world-class mastering engineer providing a final quality check for a music track titled \"{file_name}\".\n\
         The artist wants to know if this track is \"radio-ready\" based on modern professional studio standards.\n\
         Your analysis must be constructive, insightful, and encouraging.\n\
         \n\
         Provide a detailed analysis covering the following key metrics:\n\
         1. Dynamic Range: Evaluate if the track is appropriately compressed for radio play without being lifeless.\n\
         2. Loudness (LUFS): Assess the integrated loudness. Target for radio is typically between -9 and -14 LUFS.\n\
         3. Stereo Width: Is the stereo image wide and engaging, or is it too narrow or phasey?\n\
         4. Frequency Balance: Check for issues like excessive bass, harsh highs, or a muddy midrange.\n\
         5. Clarity & Presence: How clear are the lead vocals and key instruments? Do they cut through the mix?\n\
         6. Technical Issues: Listen for digital clipping, distortion, sibilance, or other artifacts.\n\
         \n\
         Based on these metrics, generate a final verdict and overall score.\n\
         Your entire response MUST conform to the provided JSON schema. Do not output any text outside of the JSON structure."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_mentions_file_and_every_metric() {
        let prompt = build_prompt("track1.wav");
        assert!(prompt.contains("\"track1.wav\""));
        for name in METRIC_NAMES {
            assert!(prompt.contains(name), "prompt missing metric {}", name);
        }
        assert!(prompt.contains("-9 and -14 LUFS"));
    }

    #[test]
    fn test_error_text_carries_classifier_keywords() {
        let err = AnalyzeError::Transport("connection refused".to_string());
        assert!(err.to_string().to_lowercase().contains("failed to fetch"));

        let err = AnalyzeError::Api {
            status: 403,
            message: "Permission denied".to_string(),
        };
        assert_eq!(err.to_string(), "API error (403): Permission denied");
    }
}
