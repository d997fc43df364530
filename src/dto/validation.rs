//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a nickname keeps some substance after trimming and fits
/// the 12-character display budget.
pub fn validate_nickname(nickname: &str) -> Result<(), ValidationError> {
    let trimmed = nickname.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("nickname_empty");
        err.message = Some("Nickname must not be empty".into());
        return Err(err);
    }
    if trimmed.chars().count() > crate::rank::MAX_NAME_CHARS {
        let mut err = ValidationError::new("nickname_too_long");
        err.message = Some(
            format!(
                "Nickname must be at most {} characters",
                crate::rank::MAX_NAME_CHARS
            )
            .into(),
        );
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_nickname_valid() {
        assert!(validate_nickname("Neo").is_ok());
        assert!(validate_nickname("  Neo  ").is_ok());
        assert!(validate_nickname("abcdefghijkl").is_ok());
    }

    #[test]
    fn test_validate_nickname_invalid() {
        assert!(validate_nickname("").is_err());
        assert!(validate_nickname("   ").is_err());
        assert!(validate_nickname("abcdefghijklm").is_err()); // 13 chars
    }
}
