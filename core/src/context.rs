//! Which business operation failed.
//!
//! Subjects and actions are closed enums so a typo cannot silently miss the
//! server-error fallback table.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    User,
    Auth,
    Property,
    Transaction,
    Verification,
}

impl Subject {
    pub fn as_str(self) -> &'static str {
        match self {
            Subject::User => "user",
            Subject::Auth => "auth",
            Subject::Property => "property",
            Subject::Transaction => "transaction",
            Subject::Verification => "verification",
        }
    }

    /// Capitalized noun used in "<Subject> not found." copy.
    pub(crate) fn noun(self) -> &'static str {
        match self {
            Subject::User => "User",
            Subject::Auth => "Account",
            Subject::Property => "Property",
            Subject::Transaction => "Transaction",
            Subject::Verification => "Verification request",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Fetch,
    List,
    Create,
    Update,
    Delete,
    Login,
    Register,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Fetch => "fetch",
            Action::List => "list",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Login => "login",
            Action::Register => "register",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `(subject, action)` pair identifying a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct OperationContext {
    pub subject: Subject,
    pub action: Action,
}

impl OperationContext {
    pub fn new(subject: Subject, action: Action) -> Self {
        Self { subject, action }
    }
}

impl fmt::Display for OperationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.subject, self.action)
    }
}
