//! Acting principal and request origin
//!
//! The saver never reads ambient state: whoever opens a saver passes an
//! [`IdentityProvider`] describing who is making the change and from where.

use serde::{Deserialize, Serialize};

/// Network origin of the request that caused a change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOrigin {
    /// Remote network address
    pub remote_addr: String,
    /// Client identification string (user agent)
    pub user_agent: String,
}

/// Supplies the identity recorded in audit entries
pub trait IdentityProvider {
    /// Name of the acting principal, if anyone is logged in
    fn current_principal_name(&self) -> Option<String>;

    /// Origin of the current request, if the change happens inside one
    fn current_request_origin(&self) -> Option<RequestOrigin>;
}

/// Plain identity value, built by the caller for each operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub username: Option<String>,
    pub origin: Option<RequestOrigin>,
}

impl Identity {
    /// No principal and no request context
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A principal acting outside any request, e.g. from the command line
    pub fn user(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            origin: None,
        }
    }

    /// Attach request-origin metadata
    pub fn with_origin(mut self, remote_addr: impl Into<String>, user_agent: impl Into<String>) -> Self {
        self.origin = Some(RequestOrigin {
            remote_addr: remote_addr.into(),
            user_agent: user_agent.into(),
        });
        self
    }
}

impl IdentityProvider for Identity {
    fn current_principal_name(&self) -> Option<String> {
        self.username.clone()
    }

    fn current_request_origin(&self) -> Option<RequestOrigin> {
        self.origin.clone()
    }
}
