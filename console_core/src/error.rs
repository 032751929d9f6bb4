use thiserror::Error;

use crate::access::{Action, ModuleId};

/// Why there is no usable session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("not signed in")]
    Missing,
    #[error("session expired")]
    Expired,
    #[error("the server rejected the access token")]
    Rejected,
}

/// Every failure a screen can run into.
///
/// Only `Auth` forces a logout; everything else leaves the screen in its
/// pre-call state and is shown to the user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("you do not have permission to {action} in module {module}")]
    Forbidden { module: ModuleId, action: Action },
    #[error("{}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("{message}")]
    Rejected { code: i64, message: String },
    #[error("network error: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ConsoleError {
    pub fn requires_logout(&self) -> bool {
        matches!(self, ConsoleError::Auth(_))
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, ConsoleError::Forbidden { .. })
    }

    /// Text for the dismissible alert. Transport details go to the log, not the user.
    pub fn user_message(&self) -> String {
        match self {
            ConsoleError::Transport(_) | ConsoleError::Decode(_) => {
                "Something went wrong while contacting the server. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(err: serde_json::Error) -> Self {
        ConsoleError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConsoleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_auth_errors_force_logout() {
        assert!(ConsoleError::from(AuthError::Expired).requires_logout());
        assert!(!ConsoleError::Transport("reset".into()).requires_logout());
        assert!(!ConsoleError::Forbidden { module: ModuleId::from("108"), action: Action::Delete }.requires_logout());
    }

    #[test]
    fn transport_details_are_hidden_from_users() {
        let msg = ConsoleError::Transport("tcp reset by peer".into()).user_message();
        assert!(!msg.contains("tcp"));
        let rejected = ConsoleError::Rejected { code: 4, message: "Duty already exists".into() };
        assert_eq!(rejected.user_message(), "Duty already exists");
    }
}
