// Form validation shared by the site's contact form and anything else that
// wants to check a submission before sending it.
use crate::models::ContactRequest;
use regex::Regex;
use std::sync::OnceLock;

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    // something@something.something, no whitespace and a single '@'
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex"))
}

pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

/// Returns the list of human-readable problems with a submission, empty when it is fine.
///
/// Name, email and message are required; subject is optional. An email that is
/// present but malformed gets its own message.
pub fn validate_submission(req: &ContactRequest) -> Vec<&'static str> {
    let mut errors = Vec::new();

    if req.name.trim().is_empty() {
        errors.push("Name is required");
    }
    if req.email.trim().is_empty() {
        errors.push("Email is required");
    }
    if req.message.trim().is_empty() {
        errors.push("Message is required");
    }
    if !req.email.is_empty() && !is_valid_email(&req.email) {
        errors.push("Please enter a valid email address");
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("first.last@sub.example.org"));
    }

    #[test]
    fn test_invalid_email() {
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("a@@b.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_validate_complete_submission() {
        let req = ContactRequest::new("A", "a@b.com", "S", "M");
        assert!(validate_submission(&req).is_empty());
    }

    #[test]
    fn test_validate_missing_fields() {
        let req = ContactRequest::new(" ", "", "", "");
        assert_eq!(
            validate_submission(&req),
            vec!["Name is required", "Email is required", "Message is required"]
        );
    }

    #[test]
    fn test_validate_bad_email_only() {
        let req = ContactRequest::new("A", "not-an-email", "", "hi");
        assert_eq!(validate_submission(&req), vec!["Please enter a valid email address"]);
    }
}
