//! Contact form intake. Validates, stores the message, and confirms.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::ratelimit::middleware::{client_ip, enforce};
use crate::state::AppState;

const MAX_MESSAGE_CHARS: usize = 5000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
}

/// POST /api/v1/contact
pub async fn handle_contact(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(req): Json<ContactRequest>,
) -> Result<Json<ContactResponse>, AppError> {
    validate(&req)?;
    let ip = client_ip(&headers, peer.map(|ConnectInfo(addr)| addr));
    enforce(&state.limiters.contact, &ip).await?;

    sqlx::query(
        "INSERT INTO contact_messages (id, name, email, role, company, subject, message) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(Uuid::new_v4())
    .bind(req.name.trim())
    .bind(req.email.trim())
    .bind(clean_optional(&req.role))
    .bind(clean_optional(&req.company))
    .bind(req.subject.trim())
    .bind(req.message.trim())
    .execute(&state.db)
    .await?;

    tracing::info!(subject = %req.subject.trim(), "contact message stored");

    Ok(Json(ContactResponse {
        success: true,
        message: "Message received. Jordan typically replies within two business days."
            .to_string(),
    }))
}

/// Checks every required field before reporting, so one response names
/// everything the client still has to fill in.
fn validate(req: &ContactRequest) -> Result<(), AppError> {
    let mut missing = Vec::new();
    if req.name.trim().is_empty() {
        missing.push("name");
    }
    if req.email.trim().is_empty() {
        missing.push("email");
    }
    if req.subject.trim().is_empty() {
        missing.push("subject");
    }
    if req.message.trim().is_empty() {
        missing.push("message");
    }
    if !missing.is_empty() {
        return Err(AppError::missing_fields(&missing));
    }
    if !valid_email(req.email.trim()) {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }
    if req.message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::Validation(format!(
            "Message exceeds {MAX_MESSAGE_CHARS} characters"
        )));
    }
    Ok(())
}

/// Shape check only. Deliverability is the mail server's problem.
fn valid_email(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

fn clean_optional(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_request() -> ContactRequest {
        ContactRequest {
            name: "Sam Reyes".to_string(),
            email: "sam@example.com".to_string(),
            role: Some("Recruiter".to_string()),
            company: Some("Acme".to_string()),
            subject: "Opportunity".to_string(),
            message: "Would love to chat.".to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_complete_request() {
        assert!(validate(&filled_request()).is_ok());
    }

    #[test]
    fn test_validate_names_every_missing_field() {
        let req = ContactRequest {
            name: String::new(),
            email: "sam@example.com".to_string(),
            role: None,
            company: None,
            subject: "   ".to_string(),
            message: String::new(),
        };
        let err = validate(&req).unwrap_err();
        let AppError::Validation(msg) = err else {
            panic!("expected Validation");
        };
        assert!(msg.contains("name"));
        assert!(msg.contains("subject"));
        assert!(msg.contains("message"));
        assert!(!msg.contains("email"));
    }

    #[test]
    fn test_validate_rejects_malformed_email() {
        let mut req = filled_request();
        req.email = "not-an-email".to_string();
        let err = validate(&req).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_validate_rejects_oversize_message() {
        let mut req = filled_request();
        req.message = "x".repeat(MAX_MESSAGE_CHARS + 1);
        assert!(validate(&req).is_err());
    }

    #[test]
    fn test_email_shapes() {
        assert!(valid_email("a@b.co"));
        assert!(!valid_email("a@b"));
        assert!(!valid_email("@b.co"));
        assert!(!valid_email("a b@c.co"));
        assert!(!valid_email("a@.co"));
    }

    #[test]
    fn test_clean_optional_drops_blank_strings() {
        assert_eq!(clean_optional(&Some("  Acme ".to_string())), Some("Acme"));
        assert_eq!(clean_optional(&Some("   ".to_string())), None);
        assert_eq!(clean_optional(&None), None);
    }
}
