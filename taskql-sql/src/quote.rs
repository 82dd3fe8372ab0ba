/// Turns raw user input into a SQL literal. Compiled fragments never contain
/// unquoted input.
pub trait Quoter {
    fn quote(&self, raw: &str) -> String;
}

/// SQLite string literals: single quotes doubled, NUL bytes dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteQuoter;

impl Quoter for SqliteQuoter {
    fn quote(&self, raw: &str) -> String {
        let mut quoted = String::with_capacity(raw.len() + 2);
        quoted.push('\'');
        for ch in raw.chars() {
            match ch {
                '\'' => quoted.push_str("''"),
                '\0' => {}
                ch => quoted.push(ch),
            }
        }
        quoted.push('\'');
        quoted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_are_doubled() {
        assert_eq!(SqliteQuoter.quote("it's"), "'it''s'");
        assert_eq!(SqliteQuoter.quote("''"), "''''''");
    }

    #[test]
    fn nul_is_dropped() {
        assert_eq!(SqliteQuoter.quote("a\0b"), "'ab'");
        assert_eq!(SqliteQuoter.quote(""), "''");
    }
}
