//! Validation utilities

use crate::types::*;
use bigdecimal::BigDecimal;

/// Validate that an amount is positive
pub fn validate_positive_amount(amount: &BigDecimal) -> LedgerResult<()> {
    if *amount <= BigDecimal::from(0) {
        Err(LedgerError::Validation(
            "Amount must be positive".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Validate a hierarchical chart code (e.g. "1-101")
pub fn validate_account_code(code: &str) -> LedgerResult<()> {
    if code.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Account code cannot be empty".to_string(),
        ));
    }

    if code.len() > 20 {
        return Err(LedgerError::Validation(
            "Account code cannot exceed 20 characters".to_string(),
        ));
    }

    if !code.chars().all(|c| c.is_ascii_digit() || c == '-') {
        return Err(LedgerError::Validation(
            "Account code can only contain digits and dashes".to_string(),
        ));
    }

    if code.starts_with('-') || code.ends_with('-') {
        return Err(LedgerError::Validation(
            "Account code cannot start or end with a dash".to_string(),
        ));
    }

    Ok(())
}

/// Validate that an account name is valid
pub fn validate_account_name(name: &str) -> LedgerResult<()> {
    if name.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Account name cannot be empty".to_string(),
        ));
    }

    if name.len() > 100 {
        return Err(LedgerError::Validation(
            "Account name cannot exceed 100 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate a journal entry or void-reason description
pub fn validate_description(description: &str) -> LedgerResult<()> {
    if description.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Description cannot be empty".to_string(),
        ));
    }

    if description.len() > 500 {
        return Err(LedgerError::Validation(
            "Description cannot exceed 500 characters".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_code_format() {
        assert!(validate_account_code("1-101").is_ok());
        assert!(validate_account_code("3-200").is_ok());
        assert!(validate_account_code("1000").is_ok());
        assert!(validate_account_code("").is_err());
        assert!(validate_account_code("-101").is_err());
        assert!(validate_account_code("1-").is_err());
        assert!(validate_account_code("cash").is_err());
    }

    #[test]
    fn positive_amounts_only() {
        assert!(validate_positive_amount(&BigDecimal::from(1)).is_ok());
        assert!(validate_positive_amount(&BigDecimal::from(0)).is_err());
        assert!(validate_positive_amount(&BigDecimal::from(-5)).is_err());
    }
}
