//! Wire types for the document-to-speech server.
//!
//! Field names use `rename` attributes to match the server's camelCase JSON;
//! the Rust side stays snake_case.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Gender
// ---------------------------------------------------------------------------

/// Voice gender for speech synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
}

impl Default for Gender {
    // The server also defaults to a female voice when the field is absent.
    fn default() -> Self {
        Gender::Female
    }
}

impl Gender {
    /// Label for the voice selection radio buttons.
    pub fn label(self) -> &'static str {
        match self {
            Gender::Female => "Female",
            Gender::Male => "Male",
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechRequest
// ---------------------------------------------------------------------------

/// Body of `POST /generate-speech`. Exactly one mode per request; the server
/// infers the other side (text from the uploaded document for `Selection`,
/// language detection for `Text`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SpeechRequest {
    /// Speak the previously uploaded document with an explicit voice.
    Selection { language: String, gender: Gender },
    /// Speak user-typed text; the server detects the language.
    Text {
        #[serde(rename = "inputText")]
        input_text: String,
    },
}

// ---------------------------------------------------------------------------
// SpeechResult
// ---------------------------------------------------------------------------

/// Response of `POST /generate-speech`. Consumed once to update the UI, then
/// discarded.
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    /// Present only for direct-text requests where the server ran language
    /// detection.
    #[serde(default, rename = "detectedLanguage")]
    pub detected_language: Option<String>,
}

// ---------------------------------------------------------------------------
// UploadResult
// ---------------------------------------------------------------------------

/// Success response of `POST /upload`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResult {
    /// Extracted text preview (server-sanitized, truncated server-side).
    pub text: String,
    /// Detected language code, when detection succeeded.
    #[serde(default)]
    pub language: Option<String>,
    /// Length of the full extracted text; the preview may be shorter.
    #[serde(default, rename = "fullTextLength")]
    pub full_text_length: Option<u64>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- SpeechRequest serialization ---

    #[test]
    fn selection_request_wire_shape() {
        let req = SpeechRequest::Selection {
            language: "fr".into(),
            gender: Gender::Male,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "language": "fr", "gender": "male" })
        );
    }

    #[test]
    fn text_request_wire_shape() {
        let req = SpeechRequest::Text {
            input_text: "hello there".into(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({ "inputText": "hello there" }));
    }

    #[test]
    fn default_gender_is_female() {
        assert_eq!(Gender::default(), Gender::Female);
    }

    // ---- SpeechResult parsing ---

    #[test]
    fn speech_result_success_with_detection() {
        let result: SpeechResult = serde_json::from_str(
            r#"{"success": true, "message": "Speech generated successfully", "detectedLanguage": "es"}"#,
        )
        .unwrap();
        assert!(result.success);
        assert!(result.error.is_none());
        assert_eq!(result.detected_language.as_deref(), Some("es"));
    }

    #[test]
    fn speech_result_null_detection_is_none() {
        let result: SpeechResult =
            serde_json::from_str(r#"{"success": true, "detectedLanguage": null}"#).unwrap();
        assert!(result.detected_language.is_none());
    }

    #[test]
    fn speech_result_failure() {
        let result: SpeechResult =
            serde_json::from_str(r#"{"success": false, "error": "No text found."}"#).unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("No text found."));
    }

    #[test]
    fn speech_result_missing_success_defaults_false() {
        let result: SpeechResult = serde_json::from_str(r#"{"error": "boom"}"#).unwrap();
        assert!(!result.success);
    }

    // ---- UploadResult parsing ---

    #[test]
    fn upload_result_full_payload() {
        let result: UploadResult = serde_json::from_str(
            r#"{"success": true, "text": "Once upon a time...", "language": "en", "fullTextLength": 1234}"#,
        )
        .unwrap();
        assert_eq!(result.text, "Once upon a time...");
        assert_eq!(result.language.as_deref(), Some("en"));
        assert_eq!(result.full_text_length, Some(1234));
    }

    #[test]
    fn upload_result_without_language() {
        let result: UploadResult = serde_json::from_str(r#"{"text": "plain"}"#).unwrap();
        assert!(result.language.is_none());
        assert!(result.full_text_length.is_none());
    }
}
