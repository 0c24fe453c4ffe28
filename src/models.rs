use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analyzer::AnalyzeError;

/// One scored dimension of an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: String,
    /// 0 (poor) to 10 (excellent)
    pub rating: f64,
    pub explanation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Recommended for Radio")]
    RecommendedForRadio,
    #[serde(rename = "Needs Work")]
    NeedsWork,
    #[serde(rename = "Not Recommended")]
    NotRecommended,
}

impl Recommendation {
    pub const ALL: [Recommendation; 3] = [
        Recommendation::RecommendedForRadio,
        Recommendation::NeedsWork,
        Recommendation::NotRecommended,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::RecommendedForRadio => "Recommended for Radio",
            Recommendation::NeedsWork => "Needs Work",
            Recommendation::NotRecommended => "Not Recommended",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// 0 to 100
    pub overall_score: f64,
    pub recommendation: Recommendation,
    pub summary: String,
    pub metrics: Vec<Metric>,
}

impl AnalysisResult {
    /// Decode a model response body into a validated result.
    ///
    /// The body may be wrapped in a Markdown ```json fence. Missing or ill-typed
    /// fields, a recommendation outside the closed set, or out-of-range numbers all
    /// fail with `AnalyzeError::MalformedResult`; nothing partially populated escapes.
    pub fn from_json(text: &str) -> Result<Self, AnalyzeError> {
        let body = strip_code_fence(text);
        let result: AnalysisResult = serde_json::from_str(body)
            .map_err(|e| AnalyzeError::MalformedResult(e.to_string()))?;
        result.validate()?;
        Ok(result)
    }

    pub fn validate(&self) -> Result<(), AnalyzeError> {
        if !self.overall_score.is_finite() || !(0.0..=100.0).contains(&self.overall_score) {
            return Err(AnalyzeError::MalformedResult(format!(
                "overallScore {} outside 0-100",
                self.overall_score
            )));
        }
        let mut names = HashSet::new();
        for metric in &self.metrics {
            if !names.insert(metric.name.as_str()) {
                return Err(AnalyzeError::MalformedResult(format!(
                    "metric '{}' appears more than once",
                    metric.name
                )));
            }
            if !metric.rating.is_finite() || !(0.0..=10.0).contains(&metric.rating) {
                return Err(AnalyzeError::MalformedResult(format!(
                    "rating {} for metric '{}' outside 0-10",
                    metric.rating, metric.name
                )));
            }
        }
        Ok(())
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.strip_prefix("```json") {
        Some(rest) => rest.trim_end().trim_end_matches("```").trim(),
        None => trimmed,
    }
}

/// Creation-ordered identifier of a history entry (milliseconds since the Unix epoch,
/// bumped past the previous id when two entries land in the same millisecond).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryId(pub u64);

impl fmt::Display for HistoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// One persisted analysis event. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: HistoryId,
    pub file_name: String,
    /// Display-only creation time
    pub timestamp: String,
    pub result: AnalysisResult,
}

impl PartialEq for HistoryItem {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for HistoryItem {}

/// A file handed to the pipeline. Only the name is ever read.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.file_name()
            .and_then(|f| f.to_str())
            .map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "overallScore": 85,
        "recommendation": "Recommended for Radio",
        "summary": "Punchy and clear.",
        "metrics": [
            {"name": "Loudness (LUFS)", "value": "-10 LUFS", "rating": 9, "explanation": "On target."}
        ]
    }"#;

    #[test]
    fn test_decode_valid_result() {
        let result = AnalysisResult::from_json(SAMPLE).unwrap();
        assert_eq!(result.overall_score, 85.0);
        assert_eq!(result.recommendation, Recommendation::RecommendedForRadio);
        assert_eq!(result.metrics.len(), 1);
        assert_eq!(result.metrics[0].value, "-10 LUFS");
    }

    #[test]
    fn test_decode_strips_markdown_fence() {
        let fenced = format!("```json\n{}\n```", SAMPLE);
        let result = AnalysisResult::from_json(&fenced).unwrap();
        assert_eq!(result.metrics[0].name, "Loudness (LUFS)");
    }

    #[test]
    fn test_unknown_recommendation_is_malformed() {
        let body = SAMPLE.replace("Recommended for Radio", "Maybe Later");
        let err = AnalysisResult::from_json(&body).unwrap_err();
        assert!(matches!(err, AnalyzeError::MalformedResult(_)));
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let body = r#"{"overallScore": 70, "recommendation": "Needs Work", "metrics": []}"#;
        let err = AnalysisResult::from_json(body).unwrap_err();
        assert!(matches!(err, AnalyzeError::MalformedResult(_)));
    }

    #[test]
    fn test_string_rating_is_malformed() {
        let body = SAMPLE.replace("\"rating\": 9", "\"rating\": \"nine\"");
        assert!(AnalysisResult::from_json(&body).is_err());
    }

    #[test]
    fn test_out_of_range_score_is_malformed() {
        let body = SAMPLE.replace("\"overallScore\": 85", "\"overallScore\": 185");
        assert!(AnalysisResult::from_json(&body).is_err());

        let body = SAMPLE.replace("\"rating\": 9", "\"rating\": 11");
        assert!(AnalysisResult::from_json(&body).is_err());
    }

    #[test]
    fn test_duplicate_metric_name_is_malformed() {
        let mut result = AnalysisResult::from_json(SAMPLE).unwrap();
        let mut twin = result.metrics[0].clone();
        twin.rating = 2.0;
        result.metrics.push(twin);

        let body = serde_json::to_string(&result).unwrap();
        let err = AnalysisResult::from_json(&body).unwrap_err();
        assert!(matches!(err, AnalyzeError::MalformedResult(_)));
    }

    #[test]
    fn test_unparsable_body_is_malformed() {
        let err = AnalysisResult::from_json("I'm sorry, I can't listen to audio.").unwrap_err();
        assert!(matches!(err, AnalyzeError::MalformedResult(_)));
    }

    #[test]
    fn test_history_item_wire_names() {
        let item = HistoryItem {
            id: HistoryId(1_700_000_000_000),
            file_name: "track1.wav".to_string(),
            timestamp: "2024-01-01 10:00:00".to_string(),
            result: AnalysisResult::from_json(SAMPLE).unwrap(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["id"], 1_700_000_000_000u64);
        assert_eq!(json["fileName"], "track1.wav");
        assert_eq!(json["result"]["overallScore"], 85.0);
        assert_eq!(json["result"]["recommendation"], "Recommended for Radio");
    }

    #[test]
    fn test_history_item_equality_is_by_id() {
        let result = AnalysisResult::from_json(SAMPLE).unwrap();
        let a = HistoryItem {
            id: HistoryId(1),
            file_name: "a.wav".to_string(),
            timestamp: String::new(),
            result: result.clone(),
        };
        let b = HistoryItem {
            file_name: "b.wav".to_string(),
            ..a.clone()
        };
        let c = HistoryItem {
            id: HistoryId(2),
            ..a.clone()
        };
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_uploaded_file_from_path_keeps_name_only() {
        let file = UploadedFile::from_path(std::path::Path::new("/music/mixes/track1.wav")).unwrap();
        assert_eq!(file.name, "track1.wav");
    }
}
