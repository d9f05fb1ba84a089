//! Client-side search and sort over already-fetched records.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Case-insensitive substring match of `term` against any of `fields`.
/// A blank term matches everything.
pub fn matches_any<'a>(term: &str, fields: impl IntoIterator<Item = &'a str>) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    fields
        .into_iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Stable sort by `key`, then reverse for descending order.
pub fn sort_by_key<T, K, F>(records: &mut [T], direction: SortDirection, mut key: F)
where
    F: FnMut(&T) -> K,
    K: Ord,
{
    records.sort_by(|a, b| {
        let ordering = key(a).cmp(&key(b));
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_term_matches_everything() {
        assert!(matches_any("  ", ["anything"]));
        assert!(matches_any("", std::iter::empty()));
    }

    #[test]
    fn match_is_case_insensitive() {
        assert!(matches_any("acme", ["ACME Corp", "billing@acme.io"]));
        assert!(!matches_any("globex", ["ACME Corp"]));
    }

    #[test]
    fn sorts_both_directions() {
        let mut names = vec!["b", "c", "a"];
        sort_by_key(&mut names, SortDirection::Ascending, |n| *n);
        assert_eq!(names, vec!["a", "b", "c"]);
        sort_by_key(&mut names, SortDirection::Descending, |n| *n);
        assert_eq!(names, vec!["c", "b", "a"]);
    }
}
