use serde::{Deserialize, Serialize};

use super::ReplyStatus;

/// Body of `POST /analyze_frame`: base64 JPEG without a data-URI prefix.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeRequest<'a> {
    pub frame: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub recognized: bool,
    #[serde(default)]
    pub name: Option<String>,
    /// Similarity in `[0, 1]`; absent for unknown faces.
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl Detection {
    /// Confidence rounded to a whole percentage.
    pub fn confidence_percent(&self) -> u32 {
        let confidence = self.confidence.unwrap_or(0.0).clamp(0.0, 1.0);
        (confidence * 100.0).round() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub status: ReplyStatus,
    #[serde(default)]
    pub faces_detected: u32,
    #[serde(default)]
    pub results: Vec<Detection>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AnalyzeResponse {
    /// Detections worth reporting; empty unless the server analysed the frame and found faces.
    pub fn reportable(&self) -> &[Detection] {
        if self.status.is_success() && self.faces_detected > 0 {
            &self.results
        } else {
            &[]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skipped_frames_report_nothing() {
        let response: AnalyzeResponse = serde_json::from_str(
            r#"{"status": "skipped", "message": "Monitoring not active"}"#,
        )
        .unwrap();
        assert!(response.reportable().is_empty());
    }

    #[test]
    fn zero_faces_report_nothing_even_with_results() {
        let response: AnalyzeResponse = serde_json::from_str(
            r#"{"status": "success", "faces_detected": 0,
                "results": [{"recognized": false, "name": "Unknown"}]}"#,
        )
        .unwrap();
        assert!(response.reportable().is_empty());
    }

    #[test]
    fn confidence_rounds_to_nearest_percent() {
        let detection = Detection {
            recognized: true,
            name: Some("Ana".into()),
            confidence: Some(0.836),
        };
        assert_eq!(detection.confidence_percent(), 84);
    }
}
