/// Shortest accepted password, counted in bytes
pub const MIN_PASSWORD_LEN: usize = 8;

const MIN_EMAIL_LEN: usize = 5;

/// Lowercased, surrounding whitespace removed
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Loose shape check on an already normalized address: exactly one `@`,
/// at least one `.`, and at least five characters
pub fn is_valid_email(email: &str) -> bool {
    email.len() >= MIN_EMAIL_LEN && email.matches('@').count() == 1 && email.contains('.')
}

pub fn is_valid_password(password: &str) -> bool {
    password.len() >= MIN_PASSWORD_LEN
}
