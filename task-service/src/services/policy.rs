//! Password strength policy.

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// A single password policy violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    TooShort { min_length: usize },
    MissingUppercase,
    MissingLowercase,
    MissingDigit,
    MissingSpecial,
}

impl PolicyError {
    fn category(&self) -> Option<&'static str> {
        match self {
            PolicyError::TooShort { .. } => None,
            PolicyError::MissingUppercase => Some("uppercase letter"),
            PolicyError::MissingLowercase => Some("lowercase letter"),
            PolicyError::MissingDigit => Some("digit"),
            PolicyError::MissingSpecial => Some("special character"),
        }
    }
}

/// Every violation found in one password, rendered as a single message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyViolations(Vec<PolicyError>);

impl PolicyViolations {
    pub fn violations(&self) -> &[PolicyError] {
        &self.0
    }
}

impl std::fmt::Display for PolicyViolations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();

        for violation in &self.0 {
            if let PolicyError::TooShort { min_length } = violation {
                parts.push(format!(
                    "password must be at least {} characters long",
                    min_length
                ));
            }
        }

        let missing: Vec<&str> = self.0.iter().filter_map(PolicyError::category).collect();
        if !missing.is_empty() {
            parts.push(format!(
                "password must contain at least one: {}",
                missing.join(", ")
            ));
        }

        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for PolicyViolations {}

/// Password strength rules applied at account creation.
#[derive(Debug, Clone)]
pub struct PasswordPolicy;

impl PasswordPolicy {
    /// Check length and character classes, collecting all violations.
    pub fn validate_strength(password: &str) -> Result<(), PolicyViolations> {
        let mut violations = Vec::new();

        if password.chars().count() < MIN_PASSWORD_LENGTH {
            violations.push(PolicyError::TooShort {
                min_length: MIN_PASSWORD_LENGTH,
            });
        }
        if !password.chars().any(|c| c.is_uppercase()) {
            violations.push(PolicyError::MissingUppercase);
        }
        if !password.chars().any(|c| c.is_lowercase()) {
            violations.push(PolicyError::MissingLowercase);
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            violations.push(PolicyError::MissingDigit);
        }
        if !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
            violations.push(PolicyError::MissingSpecial);
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(PolicyViolations(violations))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strong_password_passes() {
        assert!(PasswordPolicy::validate_strength("Abc12345!").is_ok());
    }

    #[test]
    fn test_lists_every_missing_category() {
        let err = PasswordPolicy::validate_strength("abc12345").unwrap_err();
        assert_eq!(
            err.violations(),
            &[PolicyError::MissingUppercase, PolicyError::MissingSpecial]
        );
        assert_eq!(
            err.to_string(),
            "password must contain at least one: uppercase letter, special character"
        );
    }

    #[test]
    fn test_short_password_message() {
        let err = PasswordPolicy::validate_strength("abc").unwrap_err();
        assert_eq!(
            err.to_string(),
            "password must be at least 8 characters long; \
             password must contain at least one: uppercase letter, digit, special character"
        );
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 7 characters, 10 bytes
        let err = PasswordPolicy::validate_strength("Ab1!ééé").unwrap_err();
        assert_eq!(
            err.violations(),
            &[PolicyError::TooShort {
                min_length: MIN_PASSWORD_LENGTH
            }]
        );
    }

    #[test]
    fn test_empty_password() {
        let err = PasswordPolicy::validate_strength("").unwrap_err();
        assert_eq!(err.violations().len(), 5);
    }
}
