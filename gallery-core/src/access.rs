//! Shared-secret gate in front of the gallery API.
//!
//! The code a visitor types on the landing page and the token appended to
//! every media link are one capability: an [`AccessToken`] is only ever
//! produced by a successful check against the configured allow-list.

use std::fmt;
use thiserror::Error;

/// What a valid token lets the holder do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// List folders, list gallery media and download single objects.
    ReadGallery,
}

/// Proof that a presented code matched the allow-list.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    scope: Scope,
}

impl AccessToken {
    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }
}

// Never print the secret itself.
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("access denied")]
pub struct AccessDenied;

#[derive(Debug, Clone, Default)]
pub struct AccessGate {
    codes: Vec<String>,
}

impl AccessGate {
    pub fn new(codes: Vec<String>) -> Self {
        Self {
            codes: codes.into_iter().filter(|c| !c.is_empty()).collect(),
        }
    }

    /// Builds the allow-list from `a,b,c`. Entries are not trimmed.
    pub fn from_csv(list: &str) -> Self {
        Self::new(list.split(',').map(str::to_string).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Exact, case-sensitive match against one allow-list entry.
    pub fn authorize(&self, code: &str) -> bool {
        self.codes.iter().any(|allowed| allowed == code)
    }

    /// Checks a code and hands back the capability it grants.
    pub fn issue(&self, code: &str) -> Result<AccessToken, AccessDenied> {
        if self.authorize(code) {
            Ok(AccessToken {
                value: code.to_string(),
                scope: Scope::ReadGallery,
            })
        } else {
            Err(AccessDenied)
        }
    }

    /// Picks the token from an `Authorization` header value or a `token`
    /// query parameter; the header wins when both are present.
    pub fn authorize_request(
        &self,
        authorization: Option<&str>,
        query_token: Option<&str>,
    ) -> Result<AccessToken, AccessDenied> {
        let presented = authorization
            .and_then(extract_bearer_token)
            .or(query_token)
            .ok_or(AccessDenied)?;

        self.issue(presented)
    }
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
}
