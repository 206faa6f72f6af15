//! Minimum criteria for topic-oriented searches

/// Shortest usable name term
pub const MIN_NAME_LENGTH: usize = 2;

/// True when the trimmed name has at least [`MIN_NAME_LENGTH`] characters or the
/// trimmed topic id is non-empty. Missing values count as empty.
pub fn valid_search_query(name: Option<&str>, topic_id: Option<&str>) -> bool {
    let name_ok = name.map_or(false, |n| n.trim().chars().count() >= MIN_NAME_LENGTH);
    let topic_ok = topic_id.map_or(false, |t| !t.trim().is_empty());
    name_ok || topic_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_needs_two_characters() {
        assert!(valid_search_query(Some("ab"), None));
        assert!(valid_search_query(Some("  ab  "), None));
        assert!(!valid_search_query(Some(" a "), None));
        assert!(!valid_search_query(Some(""), None));
    }

    #[test]
    fn test_topic_id_alone_is_enough() {
        assert!(valid_search_query(None, Some("5")));
        assert!(valid_search_query(Some("a"), Some("5")));
        assert!(!valid_search_query(None, Some("   ")));
    }

    #[test]
    fn test_nothing_supplied_fails_closed() {
        assert!(!valid_search_query(None, None));
    }

    #[test]
    fn test_characters_not_bytes() {
        assert!(valid_search_query(Some("éa"), None));
        assert!(!valid_search_query(Some("é"), None));
    }
}
