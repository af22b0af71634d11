//! Classifiers bound to one subject, with targeted server-error copy.
//!
//! `wrap_for(subject).classify(raw, action)` equals
//! `classify(raw, Some(OperationContext::new(subject, action)))` for every
//! kind. The fallback table only matters for `ServerError`, where it replaces
//! whatever the server sent.

use crate::classify::classify_with;
use crate::context::{Action, OperationContext, Subject};
use crate::error::{ClassifiedError, Failure};
use crate::failure::RawFailure;

/// Server-error copy for one subject, keyed by action.
pub type FallbackTable = fn(Action) -> Option<&'static str>;

/// A classifier specialized for one subject.
#[derive(Debug, Clone, Copy)]
pub struct OperationClassifier {
    subject: Subject,
    fallbacks: FallbackTable,
}

/// Classifier for `subject` using the built-in copy.
pub fn wrap_for(subject: Subject) -> OperationClassifier {
    OperationClassifier {
        subject,
        fallbacks: table_for(subject),
    }
}

impl OperationClassifier {
    /// Classifier with screen-specific server-error copy.
    pub fn with_fallbacks(subject: Subject, fallbacks: FallbackTable) -> Self {
        Self { subject, fallbacks }
    }

    pub fn subject(&self) -> Subject {
        self.subject
    }

    pub fn context(&self, action: Action) -> OperationContext {
        OperationContext::new(self.subject, action)
    }

    pub fn classify(&self, raw: RawFailure, action: Action) -> ClassifiedError {
        classify_with(raw, Some(self.context(action)), (self.fallbacks)(action))
    }

    /// Classify a raw failure; pass an already classified one through untouched.
    pub fn attach(&self, failure: Failure, action: Action) -> Failure {
        match failure {
            Failure::Raw(raw) => Failure::Classified(self.classify(raw, action)),
            classified @ Failure::Classified(_) => classified,
        }
    }
}

/// Built-in server-error copy for `ctx`, if any.
pub fn server_fallback(ctx: OperationContext) -> Option<&'static str> {
    table_for(ctx.subject)(ctx.action)
}

fn table_for(subject: Subject) -> FallbackTable {
    match subject {
        Subject::User => user_fallback,
        Subject::Auth => auth_fallback,
        Subject::Property => property_fallback,
        Subject::Transaction => transaction_fallback,
        Subject::Verification => verification_fallback,
    }
}

fn user_fallback(action: Action) -> Option<&'static str> {
    match action {
        Action::Create => Some("Could not create user, try again."),
        Action::Update => Some("Could not update user, try again."),
        Action::Delete => Some("Could not delete user, try again."),
        Action::Fetch => Some("Could not load user, try again."),
        Action::List => Some("Could not load users, try again."),
        Action::Login | Action::Register => None,
    }
}

fn auth_fallback(action: Action) -> Option<&'static str> {
    match action {
        Action::Login => Some("Could not sign in, try again."),
        Action::Register => Some("Could not complete registration, try again."),
        _ => None,
    }
}

fn property_fallback(action: Action) -> Option<&'static str> {
    match action {
        Action::Create => Some("Could not publish property, try again."),
        Action::Update => Some("Could not update property, try again."),
        Action::Delete => Some("Could not remove property, try again."),
        Action::Fetch => Some("Could not load property, try again."),
        Action::List => Some("Could not load properties, try again."),
        Action::Login | Action::Register => None,
    }
}

fn transaction_fallback(action: Action) -> Option<&'static str> {
    match action {
        Action::Create => Some("Could not start transaction, try again."),
        Action::Fetch => Some("Could not load transaction, try again."),
        Action::List => Some("Could not load transactions, try again."),
        _ => None,
    }
}

fn verification_fallback(action: Action) -> Option<&'static str> {
    match action {
        Action::Create => Some("Could not submit verification request, try again."),
        Action::Fetch => Some("Could not load verification request, try again."),
        Action::List => Some("Could not load verification requests, try again."),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{classify, SERVER_ERROR};
    use crate::error::ErrorKind;
    use serde_json::json;

    const ACTIONS: [Action; 7] = [
        Action::Fetch,
        Action::List,
        Action::Create,
        Action::Update,
        Action::Delete,
        Action::Login,
        Action::Register,
    ];

    #[test]
    fn user_create_server_error_uses_targeted_copy() {
        let err = wrap_for(Subject::User).classify(RawFailure::with_json(500, json!({})), Action::Create);
        assert_eq!(err.kind(), ErrorKind::ServerError);
        assert_eq!(err.message(), "Could not create user, try again.");
    }

    #[test]
    fn auth_wrappers_cover_login_and_register() {
        let auth = wrap_for(Subject::Auth);
        let login = auth.classify(RawFailure::with_json(500, json!({})), Action::Login);
        let register = auth.classify(RawFailure::with_json(500, json!({})), Action::Register);
        assert_eq!(login.message(), "Could not sign in, try again.");
        assert_eq!(register.message(), "Could not complete registration, try again.");
    }

    #[test]
    fn non_server_kinds_match_plain_classify() {
        let raws = [
            RawFailure::unreachable(),
            RawFailure::with_json(400, json!({"email": "taken"})),
            RawFailure::with_json(401, json!({"error": "bad creds"})),
            RawFailure::new(Some(403), None),
            RawFailure::new(Some(404), None),
            RawFailure::with_json(409, json!({"error": "dup"})),
            RawFailure::new(Some(502), None),
        ];
        for subject in [Subject::User, Subject::Auth, Subject::Property] {
            let wrapper = wrap_for(subject);
            for action in ACTIONS {
                for raw in &raws {
                    let ctx = OperationContext::new(subject, action);
                    assert_eq!(wrapper.classify(raw.clone(), action), classify(raw.clone(), Some(ctx)));
                }
            }
        }
    }

    #[test]
    fn missing_table_entry_keeps_generic_copy() {
        let err = wrap_for(Subject::Auth).classify(RawFailure::with_json(500, json!({})), Action::Delete);
        assert_eq!(err.message(), SERVER_ERROR);
    }

    #[test]
    fn custom_table_overrides_builtin_copy() {
        fn listing_screen(action: Action) -> Option<&'static str> {
            match action {
                Action::Create => Some("Your listing was not saved."),
                _ => None,
            }
        }
        let wrapper = OperationClassifier::with_fallbacks(Subject::Property, listing_screen);
        let err = wrapper.classify(RawFailure::with_json(500, json!({})), Action::Create);
        assert_eq!(err.message(), "Your listing was not saved.");
        let err = wrapper.classify(RawFailure::with_json(500, json!({})), Action::Delete);
        assert_eq!(err.message(), SERVER_ERROR);
    }

    #[test]
    fn attach_classifies_raw_once() {
        let users = wrap_for(Subject::User);
        let first = users.attach(RawFailure::with_json(500, json!({})).into(), Action::Delete);
        assert_eq!(first.classified().unwrap().message(), "Could not delete user, try again.");

        // A second wrapper further up the chain must not reclassify.
        let second = wrap_for(Subject::Property).attach(first.clone(), Action::Create);
        assert_eq!(second, first);
    }
}
