//! API module for shared HTTP payload types
//!
//! Contains ONLY serde types, no HTTP framework dependencies. The gateway
//! wraps these with axum handlers; the capture tool uses them with reqwest.

pub mod types;

pub use types::{
    AuthStatus, DetectionRequest, DetectionResult, EmotionDescriptor, ErrorResponse,
    GeneratedMusic, GenreSelection, MusicPrompt, PlaylistArtifacts, PlaylistRequest, User,
};
