use time::OffsetDateTime;
use uuid::Uuid;

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 64;
pub const EMAIL_MAX_LEN: usize = 120;
pub const PASSWORD_MIN_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub last_login: Option<OffsetDateTime>,
}

/// A registration that passed field validation. Uniqueness is checked against the store separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl NewUser {
    /// Validates raw registration fields.
    ///
    /// # Errors
    /// Returns a human-readable message describing the first invalid field.
    pub fn validate(username: &str, email: &str, password: &str, confirm_password: &str) -> Result<Self, String> {
        let username = username.trim();
        let email = email.trim();

        let username_len = username.chars().count();
        if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&username_len) {
            return Err(format!(
                "Username must be between {USERNAME_MIN_LEN} and {USERNAME_MAX_LEN} characters"
            ));
        }

        if email.is_empty() {
            return Err("Email is required".to_string());
        }
        if email.chars().count() > EMAIL_MAX_LEN {
            return Err(format!("Email must be less than {EMAIL_MAX_LEN} characters"));
        }
        if !is_valid_email(email) {
            return Err("Valid email address required".to_string());
        }

        if password.chars().count() < PASSWORD_MIN_LEN {
            return Err(format!("Password must be at least {PASSWORD_MIN_LEN} characters"));
        }
        if password != confirm_password {
            return Err("Passwords must match".to_string());
        }

        Ok(Self { username: username.to_string(), email: email.to_lowercase(), password: password.to_string() })
    }
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.contains(char::is_whitespace)
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty())
}
