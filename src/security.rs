//! CSV formula-injection sanitization and account pseudonymization.
//!
//! Grounded in `original_source/src/layering_detection/utils/security_utils.py`.

use sha2::{Digest, Sha256};

use crate::domain::SurveillanceError;

const DANGEROUS_CHARS: [char; 6] = ['=', '+', '-', '@', '\t', '\r'];

/// Prefixes `value` with `'` if it contains a formula-leading or control
/// character anywhere, so spreadsheet software never interprets a CSV cell
/// as a formula. Empty strings pass through unchanged.
pub fn sanitize_for_csv(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    if value.contains(DANGEROUS_CHARS) {
        format!("'{value}")
    } else {
        value.to_string()
    }
}

/// Reads `PSEUDONYMIZATION_SALT` from the environment. Required (not
/// defaulted) — pseudonymization with a guessable or empty salt defeats its
/// own purpose.
pub fn pseudonymization_salt() -> Result<String, SurveillanceError> {
    let salt = std::env::var("PSEUDONYMIZATION_SALT").map_err(|_| SurveillanceError::ConfigInvalid {
        field: "PSEUDONYMIZATION_SALT",
        reason: "environment variable is required for pseudonymization".into(),
    })?;
    if salt.trim().is_empty() {
        return Err(SurveillanceError::ConfigInvalid {
            field: "PSEUDONYMIZATION_SALT",
            reason: "must not be empty".into(),
        });
    }
    Ok(salt)
}

/// Hex-encoded SHA-256 of `salt:account_id`, 64 lowercase hex characters.
pub fn pseudonymize_account_id(account_id: &str, salt: &str) -> Result<String, SurveillanceError> {
    if salt.trim().is_empty() {
        return Err(SurveillanceError::ConfigInvalid {
            field: "PSEUDONYMIZATION_SALT",
            reason: "must not be empty".into(),
        });
    }
    let material = format!("{salt}:{account_id}");
    let mut hasher = Sha256::new();
    hasher.update(material.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_formula_characters_are_prefixed() {
        assert_eq!(sanitize_for_csv("=SUM(A1:A10)"), "'=SUM(A1:A10)");
        assert_eq!(sanitize_for_csv("+1"), "'+1");
        assert_eq!(sanitize_for_csv("-1"), "'-1");
        assert_eq!(sanitize_for_csv("@cmd"), "'@cmd");
    }

    #[test]
    fn embedded_dangerous_characters_are_also_prefixed() {
        assert_eq!(sanitize_for_csv("value=123"), "'value=123");
        assert_eq!(sanitize_for_csv("text\twith\ttabs"), "'text\twith\ttabs");
    }

    #[test]
    fn benign_values_pass_through_unchanged() {
        assert_eq!(sanitize_for_csv("ACC001"), "ACC001");
        assert_eq!(sanitize_for_csv(""), "");
    }

    #[test]
    fn pseudonymize_is_deterministic_and_salted() {
        let a = pseudonymize_account_id("ACC001", "salt-a").unwrap();
        let b = pseudonymize_account_id("ACC001", "salt-a").unwrap();
        let c = pseudonymize_account_id("ACC001", "salt-b").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn pseudonymize_rejects_empty_salt() {
        assert!(pseudonymize_account_id("ACC001", "").is_err());
        assert!(pseudonymize_account_id("ACC001", "   ").is_err());
    }
}
