use crate::utils::AppError;

use super::{CheckAssignmentRequest, CreateAssignmentRequest};

/// bcrypt only reads this many bytes of its input and ignores the rest.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Validated input for a new registration. Only constructible through `parse`,
/// so the email is always trimmed and lowercased.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Validated credential pair for looking up an existing assignment.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl NewRegistration {
    pub fn parse(request: &CreateAssignmentRequest) -> Result<Self, AppError> {
        match (
            present(request.email.as_deref()),
            present(request.password.as_deref()),
            present(request.name.as_deref()),
        ) {
            (Some(_), Some(password), Some(_)) if password.len() > MAX_PASSWORD_BYTES => {
                Err(AppError::Validation(format!(
                    "Password must be at most {} bytes",
                    MAX_PASSWORD_BYTES
                )))
            }
            (Some(email), Some(password), Some(name)) => Ok(Self {
                name: name.trim().to_string(),
                email: normalize_email(email),
                password: password.to_string(),
            }),
            _ => Err(AppError::Validation(
                "Email, password, and name are required".to_string(),
            )),
        }
    }
}

impl Credentials {
    pub fn parse(request: &CheckAssignmentRequest) -> Result<Self, AppError> {
        match (
            present(request.email.as_deref()),
            present(request.password.as_deref()),
        ) {
            (Some(email), Some(password)) => Ok(Self {
                email: normalize_email(email),
                password: password.to_string(),
            }),
            _ => Err(AppError::Validation(
                "Email and password are required".to_string(),
            )),
        }
    }

    /// Registration never stores a longer password, so anything past the
    /// bcrypt limit cannot be the right one.
    pub fn password_fits_hash(&self) -> bool {
        self.password.len() <= MAX_PASSWORD_BYTES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(email: Option<&str>, password: Option<&str>, name: Option<&str>) -> CreateAssignmentRequest {
        CreateAssignmentRequest {
            email: email.map(str::to_string),
            password: password.map(str::to_string),
            name: name.map(str::to_string),
        }
    }

    #[test]
    fn test_registration_normalizes_email_and_name() {
        let parsed = NewRegistration::parse(&create(
            Some("  Santa@NorthPole.com "),
            Some("hunter22"),
            Some("  Kris Kringle "),
        ))
        .unwrap();

        assert_eq!(parsed.email, "santa@northpole.com");
        assert_eq!(parsed.name, "Kris Kringle");
        assert_eq!(parsed.password, "hunter22");
    }

    #[test]
    fn test_registration_rejects_blank_or_missing_fields() {
        for request in [
            create(None, Some("pw"), Some("Kris")),
            create(Some("a@b.c"), Some("   "), Some("Kris")),
            create(Some("a@b.c"), Some("pw"), Some("\t")),
            create(Some(""), Some("pw"), Some("Kris")),
        ] {
            let err = NewRegistration::parse(&request).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }

    #[test]
    fn test_credentials_require_both_fields() {
        let ok = Credentials::parse(&CheckAssignmentRequest {
            email: Some("A@B.C".into()),
            password: Some("pw".into()),
        })
        .unwrap();
        assert_eq!(ok.email, "a@b.c");

        let err = Credentials::parse(&CheckAssignmentRequest {
            email: Some("a@b.c".into()),
            password: None,
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "Email and password are required");
    }

    #[test]
    fn test_registration_rejects_password_past_bcrypt_limit() {
        let at_limit = "a".repeat(MAX_PASSWORD_BYTES);
        assert!(NewRegistration::parse(&create(Some("a@b.c"), Some(at_limit.as_str()), Some("Kris"))).is_ok());

        let too_long = format!("{}RIGHT", at_limit);
        let err = NewRegistration::parse(&create(Some("a@b.c"), Some(too_long.as_str()), Some("Kris")))
            .unwrap_err();
        assert_eq!(err.to_string(), "Password must be at most 72 bytes");

        // Multi-byte characters count by their encoded length
        let wide = "é".repeat(37);
        assert!(NewRegistration::parse(&create(Some("a@b.c"), Some(wide.as_str()), Some("Kris"))).is_err());
    }

    #[test]
    fn test_credentials_flag_password_past_bcrypt_limit() {
        let long = Credentials::parse(&CheckAssignmentRequest {
            email: Some("a@b.c".into()),
            password: Some(format!("{}WRONG", "a".repeat(MAX_PASSWORD_BYTES))),
        })
        .unwrap();
        assert!(!long.password_fits_hash());
    }
}
