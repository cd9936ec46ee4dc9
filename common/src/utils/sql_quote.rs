//! SQL identifier and literal quoting.
//!
//! Every user-supplied name that ends up in DDL passes through
//! [`quote_ident`]; every user-supplied value that cannot be bound as a
//! parameter passes through [`quote_literal`].

use crate::errors::{AppError, AppResult};

/// PostgreSQL truncates identifiers longer than this many bytes.
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// Quotes an identifier for interpolation into a statement.
///
/// # Errors
/// Returns `AppError::Validation` for empty names, names containing NUL, or
/// names longer than [`MAX_IDENTIFIER_LEN`] bytes.
pub fn quote_ident(name: &str) -> AppResult<String> {
    if name.is_empty() {
        return Err(AppError::Validation("identifier must not be empty".into()));
    }
    if name.contains('\0') {
        return Err(AppError::Validation(
            "identifier must not contain NUL characters".into(),
        ));
    }
    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(AppError::Validation(format!(
            "identifier exceeds {} bytes",
            MAX_IDENTIFIER_LEN
        )));
    }
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Quotes a schema-qualified name, e.g. `"public"."users"`.
pub fn quote_qualified(schema: &str, name: &str) -> AppResult<String> {
    Ok(format!("{}.{}", quote_ident(schema)?, quote_ident(name)?))
}

/// Quotes a string literal.
///
/// Backslashes switch to the `E'...'` form so the result is correct whatever
/// `standard_conforming_strings` is set to.
pub fn quote_literal(value: &str) -> AppResult<String> {
    if value.contains('\0') {
        return Err(AppError::Validation(
            "value must not contain NUL characters".into(),
        ));
    }
    let escaped = value.replace('\'', "''");
    if escaped.contains('\\') {
        Ok(format!("E'{}'", escaped.replace('\\', "\\\\")))
    } else {
        Ok(format!("'{}'", escaped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_identifier() {
        assert_eq!(quote_ident("users").unwrap(), "\"users\"");
        assert_eq!(quote_ident("Mixed Case").unwrap(), "\"Mixed Case\"");
    }

    #[test]
    fn test_embedded_quotes_are_doubled() {
        assert_eq!(
            quote_ident("a\"; DROP TABLE x; --").unwrap(),
            "\"a\"\"; DROP TABLE x; --\""
        );
    }

    #[test]
    fn test_rejects_bad_identifiers() {
        assert!(quote_ident("").is_err());
        assert!(quote_ident("a\0b").is_err());
        assert!(quote_ident(&"x".repeat(64)).is_err());
        assert!(quote_ident(&"x".repeat(63)).is_ok());
    }

    #[test]
    fn test_qualified() {
        assert_eq!(
            quote_qualified("public", "todos").unwrap(),
            "\"public\".\"todos\""
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(quote_literal("2020-01-01").unwrap(), "'2020-01-01'");
        assert_eq!(quote_literal("it's").unwrap(), "'it''s'");
        assert_eq!(quote_literal("a\\b").unwrap(), "E'a\\\\b'");
        assert!(quote_literal("a\0").is_err());
    }
}
