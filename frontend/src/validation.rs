use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email.trim())
}

/// Field-level errors of the login form; both `None` means submittable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoginErrors {
    pub email: Option<&'static str>,
    pub password: Option<&'static str>,
}

impl LoginErrors {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none()
    }
}

pub fn validate_login(email: &str, password: &str) -> LoginErrors {
    let email = email.trim();
    LoginErrors {
        email: if email.is_empty() {
            Some("Email wajib diisi")
        } else if !is_valid_email(email) {
            Some("Email tidak valid")
        } else {
            None
        },
        password: password.is_empty().then_some("Password wajib diisi"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("admin@bantulkab.go.id"));
        assert!(is_valid_email(" sari.w@pasar.id "));
        assert!(!is_valid_email("admin@"));
        assert!(!is_valid_email("admin.bantulkab.go.id"));
        assert!(!is_valid_email("a@b.c"));
    }

    #[test]
    fn login_form_messages() {
        assert_eq!(
            validate_login("", ""),
            LoginErrors { email: Some("Email wajib diisi"), password: Some("Password wajib diisi") }
        );
        assert_eq!(validate_login("bukan-email", "x").email, Some("Email tidak valid"));
        assert!(validate_login("admin@bantulkab.go.id", "rahasia").is_empty());
    }
}
