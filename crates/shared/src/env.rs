//! Settings lookup helpers shared by the configuration layers

/// Read `key` through `lookup`, trimmed. Empty values count as missing.
pub fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_values_are_missing() {
        let lookup = |key: &str| match key {
            "SET" => Some("  value ".to_string()),
            "BLANK" => Some("   ".to_string()),
            _ => None,
        };
        assert_eq!(non_empty(&lookup, "SET").as_deref(), Some("value"));
        assert_eq!(non_empty(&lookup, "BLANK"), None);
        assert_eq!(non_empty(&lookup, "UNSET"), None);
    }
}
