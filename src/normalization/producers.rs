use indexmap::IndexSet;

/// Separator between producer names inside the `producers` field.
pub const NAME_SEPARATOR: &str = ", ";
/// Separator in front of the last name of a list ("A, B and C").
pub const LAST_NAME_SEPARATOR: &str = " and ";

/// Splits a free-text producer field into distinct names.
///
/// Grammar: `names := name ((", " | " and ") name)*`. Every `" and "` is
/// rewritten to `", "` before splitting on `", "`, so a name that itself
/// contains either separator cannot be represented and gets split.
///
/// Names are trimmed, empty names are dropped and repeated names keep their
/// first position.
pub fn split_producers(field: &str) -> Vec<String> {
    let joined = field.replace(LAST_NAME_SEPARATOR, NAME_SEPARATOR);
    let mut names: IndexSet<&str> = IndexSet::new();
    for name in joined.split(NAME_SEPARATOR) {
        let name = name.trim();
        if !name.is_empty() {
            names.insert(name);
        }
    }
    names.into_iter().map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_and_then_comma() {
        assert_eq!(
            split_producers("Allan Carr, Robert Stigwood and Jerry Weintraub"),
            vec!["Allan Carr", "Robert Stigwood", "Jerry Weintraub"]
        );
    }

    #[test]
    fn single_name_is_kept_whole() {
        assert_eq!(split_producers("Jerry Weintraub"), vec!["Jerry Weintraub"]);
    }

    #[test]
    fn drops_empty_names_and_duplicates() {
        assert_eq!(
            split_producers("Bo Derek and  , Bo Derek, John Derek "),
            vec!["Bo Derek", "John Derek"]
        );
        assert!(split_producers("   ").is_empty());
    }

    #[test]
    fn names_containing_the_separator_are_split() {
        // "Simon and Schuster" is a single company, but the grammar has no escape.
        assert_eq!(
            split_producers("Simon and Schuster"),
            vec!["Simon", "Schuster"]
        );
    }

    #[test]
    fn and_without_surrounding_spaces_is_part_of_a_name() {
        assert_eq!(split_producers("Sandy Anderson"), vec!["Sandy Anderson"]);
    }
}
