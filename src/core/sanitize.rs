// src/core/sanitize.rs

use crate::error::{Error, Result};

pub const MAX_AREA_NAME_LEN: usize = 100;

/// Table names: ASCII letters, digits and underscore, non-empty.
pub fn is_valid_table_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn check_table_name(name: &str) -> Result<()> {
    if is_valid_table_name(name) {
        Ok(())
    } else {
        Err(Error::InvalidIdentifier(name.to_string()))
    }
}

/// Double-quoted SQL identifier. Column names come straight from API keys,
/// so reserved words and odd characters must survive.
pub fn quote_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push('"');
    for ch in name.chars() {
        if ch == '"' { out.push('"'); }
        out.push(ch);
    }
    out.push('"');
    out
}

/// Column names must be non-empty and free of NUL.
pub fn check_column_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('\0') {
        Err(Error::InvalidIdentifier(name.to_string()))
    } else {
        Ok(())
    }
}

/// User-typed area name: digits, Latin and Cyrillic letters, whitespace and
/// `- ́ ’ , ( ) .`, 1 to 100 characters.
pub fn is_valid_area_name(name: &str) -> bool {
    let len = name.chars().count();
    if len == 0 || len > MAX_AREA_NAME_LEN {
        return false;
    }
    name.chars().all(|c| {
        c.is_ascii_alphanumeric()
            || matches!(c, 'а'..='я' | 'А'..='Я' | 'ё' | 'Ё')
            || c.is_whitespace()
            || matches!(c, '-' | '\u{301}' | '’' | ',' | '(' | ')' | '.')
    })
}
