use inlinable_string::{InlinableString, StringExt};

pub fn char_to_string(c: char) -> InlinableString {
    let mut s = InlinableString::new();
    s.push(c);
    s
}

// True if `name` could be produced by the lexer as a single identifier
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => chars.all(|c| c.is_ascii_alphanumeric() || c == '_'),
        _ => false
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn identifiers() {
        for ok in ["a", "x1", "rate_2", "Foo"] {
            assert!(is_identifier(ok), "{}", ok);
        }
        for bad in ["", "1a", "_a", "a-b", "a b"] {
            assert!(!is_identifier(bad), "{}", bad);
        }
    }
}
