//! Request/response types exchanged with the external backends
//!
//! The gateway relays these payloads without interpreting them. The typed
//! forms exist for the session check, the capture loop and tests; proxy
//! handlers forward bodies as opaque JSON values.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// User identity as reported by the identity service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub display_name: String,
    pub user_id: String,
}

/// Response of the identity service `/api/auth-status` endpoint
///
/// The identity service omits `user` when unauthenticated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStatus {
    #[serde(rename = "isAuthenticated")]
    pub is_authenticated: bool,
    #[serde(default)]
    pub user: Option<User>,
}

impl AuthStatus {
    /// Unauthenticated state (the fail-closed default)
    pub fn unauthenticated() -> Self {
        Self::default()
    }
}

/// Genre selection read from / written to the session backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreSelection {
    pub genres: Vec<String>,
}

/// Emotion text submitted for refinement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionDescriptor {
    #[serde(rename = "mainEmotion")]
    pub main_emotion: String,
    #[serde(rename = "emotionDetail")]
    pub emotion_detail: String,
}

/// Playlist creation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistRequest {
    pub emotion: String,
}

/// Playlist artifacts (opaque embeddable markup)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistArtifacts {
    pub embedded_playlist_code: String,
    #[serde(default)]
    pub top_tracks_embedded: Vec<String>,
}

/// Music generation prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicPrompt {
    pub prompt: String,
}

/// Generated music location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedMusic {
    pub audio_url: String,
}

/// Image-based emotion detection request (base64 JPEG, no data-URL prefix)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionRequest {
    pub image: String,
}

/// Image-based emotion detection result
///
/// The detector may answer without an emotion when no face was found.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Uniform error envelope returned by every proxy route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }

    /// Extract the `error` field from an arbitrary JSON body, if present
    pub fn from_value(value: &Value) -> Option<Self> {
        value
            .get("error")
            .and_then(Value::as_str)
            .map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn auth_status_without_user_is_unauthenticated() {
        let status: AuthStatus = serde_json::from_value(json!({ "isAuthenticated": false })).unwrap();
        assert_eq!(status, AuthStatus::unauthenticated());
    }

    #[test]
    fn auth_status_with_user() {
        let status: AuthStatus = serde_json::from_value(json!({
            "isAuthenticated": true,
            "user": { "display_name": "Ada", "user_id": "ada01" }
        }))
        .unwrap();

        assert!(status.is_authenticated);
        assert_eq!(status.user.unwrap().user_id, "ada01");
    }

    #[test]
    fn emotion_descriptor_uses_camel_case_on_the_wire() {
        let descriptor = EmotionDescriptor {
            main_emotion: "Calm".to_string(),
            emotion_detail: "after a long walk".to_string(),
        };
        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(value["mainEmotion"], "Calm");
        assert_eq!(value["emotionDetail"], "after a long walk");
    }

    #[test]
    fn detection_result_tolerates_missing_fields() {
        let result: DetectionResult = serde_json::from_value(json!({})).unwrap();
        assert!(result.emotion.is_none());
        assert!(result.confidence.is_none());
    }

    #[test]
    fn error_response_from_value() {
        assert_eq!(
            ErrorResponse::from_value(&json!({ "error": "nope" })),
            Some(ErrorResponse::new("nope"))
        );
        assert_eq!(ErrorResponse::from_value(&json!({ "ok": true })), None);
    }
}
