//! HTTP verbs exposed by the pipeline.
//!
//! Verbs split into two families:
//! - simple (`GET`, `HEAD`): data travels as query parameters, responses may
//!   be bare resource data, and each call carries a cache-buster.
//! - complex (`POST`, `PATCH`, `PUT`): data travels as the JSON body and the
//!   backend always answers with a status envelope.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A verb accepted by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Get,
    Head,
    Post,
    Patch,
    Put,
}

impl Method {
    /// Simple verbs, in declaration order.
    pub const SIMPLE: [Method; 2] = [Method::Get, Method::Head];

    /// Complex verbs, in declaration order.
    pub const COMPLEX: [Method; 3] = [Method::Post, Method::Patch, Method::Put];

    /// Returns true for read-style verbs.
    pub fn is_simple(self) -> bool {
        matches!(self, Method::Get | Method::Head)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Put => "PUT",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Put => reqwest::Method::PUT,
        }
    }
}

/// Error returned when parsing an unsupported verb.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported method: {0}")]
pub struct UnsupportedMethod(pub String);

impl FromStr for Method {
    type Err = UnsupportedMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Method::Get),
            "head" => Ok(Method::Head),
            "post" => Ok(Method::Post),
            "patch" => Ok(Method::Patch),
            "put" => Ok(Method::Put),
            _ => Err(UnsupportedMethod(s.to_string())),
        }
    }
}
