//! Outbound endpoint table
//!
//! One entry per external capability. Handlers differ only in the entry
//! they relay through.

use reqwest::Method;

/// External backend an endpoint lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Identity, genres, playlists, music generation and image detection
    Session,
    /// Emotion text refinement
    Refinement,
}

impl Backend {
    /// Name used in relayed error messages
    pub fn label(self) -> &'static str {
        match self {
            Backend::Session => "Session API",
            Backend::Refinement => "Refinement API",
        }
    }
}

/// Which inbound cookies travel to the backend
///
/// The two backends use different conventions; each endpoint keeps its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookiePolicy {
    /// The whole inbound jar
    ForwardAll,
    /// A single named cookie
    ForwardNamed(&'static str),
    /// No cookies
    Omit,
}

/// Description of one outbound call
#[derive(Debug)]
pub struct Endpoint {
    /// Short name for logs
    pub name: &'static str,
    pub backend: Backend,
    pub method: Method,
    /// Fixed path appended to the backend base URL
    pub path: &'static str,
    pub cookies: CookiePolicy,
    /// Inbound body fields forwarded; empty means no body is sent
    pub fields: &'static [&'static str],
    /// Completes "Failed to ..." in transport error messages
    pub action: &'static str,
}

pub static AUTH_STATUS: Endpoint = Endpoint {
    name: "auth-status",
    backend: Backend::Session,
    method: Method::GET,
    path: "/api/auth-status",
    cookies: CookiePolicy::ForwardAll,
    fields: &[],
    action: "check auth status",
};

pub static SIGNOUT: Endpoint = Endpoint {
    name: "signout",
    backend: Backend::Session,
    method: Method::POST,
    path: "/signout",
    cookies: CookiePolicy::ForwardAll,
    fields: &[],
    action: "sign out",
};

pub static GENRES_READ: Endpoint = Endpoint {
    name: "genres-read",
    backend: Backend::Session,
    method: Method::GET,
    path: "/genres",
    cookies: CookiePolicy::ForwardAll,
    fields: &[],
    action: "fetch genres",
};

pub static GENRES_WRITE: Endpoint = Endpoint {
    name: "genres-write",
    backend: Backend::Session,
    method: Method::POST,
    path: "/update-genres",
    cookies: CookiePolicy::ForwardAll,
    fields: &["genres"],
    action: "update genres",
};

pub static REFINE_EMOTION: Endpoint = Endpoint {
    name: "refine-emotion",
    backend: Backend::Refinement,
    method: Method::POST,
    path: "/refineEmotion",
    cookies: CookiePolicy::Omit,
    fields: &["mainEmotion", "emotionDetail"],
    action: "process emotion",
};

pub static CREATE_PLAYLIST: Endpoint = Endpoint {
    name: "create-playlist",
    backend: Backend::Session,
    method: Method::POST,
    path: "/api/create_playlist",
    cookies: CookiePolicy::ForwardAll,
    fields: &["emotion"],
    action: "create playlist",
};

pub static GENERATE_MUSIC: Endpoint = Endpoint {
    name: "generate-music",
    backend: Backend::Session,
    method: Method::POST,
    path: "/api/generate-music",
    cookies: CookiePolicy::ForwardNamed("session"),
    fields: &["prompt"],
    action: "generate music",
};

pub static DETECT_EMOTION: Endpoint = Endpoint {
    name: "detect-emotion",
    backend: Backend::Session,
    method: Method::POST,
    path: "/api/detect-emotion",
    cookies: CookiePolicy::ForwardAll,
    fields: &["image"],
    action: "process image",
};
