//! Locale-aware ordering of display names.
//!
//! Names are compared in three passes, the way a UI collator would:
//!
//! 1. base letters, ignoring accents and case (`Ängström` ~ `angstrom`)
//! 2. accents, unaccented first (`Angstrom` < `Ängström`)
//! 3. case, lower-case first (`zoe` < `Zoe`)
//!
//! A final code-point comparison makes the order total.

use std::cmp::Ordering;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

fn base_letters(name: &str) -> impl Iterator<Item = char> + '_ {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

fn accented_letters(name: &str) -> impl Iterator<Item = char> + '_ {
    name.nfd().flat_map(char::to_lowercase)
}

fn case_marks(name: &str) -> impl Iterator<Item = bool> + '_ {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(char::is_uppercase)
}

/// Compare two display names for sorting.
#[must_use]
pub fn compare_names(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(base_letters(b))
        .then_with(|| accented_letters(a).cmp(accented_letters(b)))
        .then_with(|| case_marks(a).cmp(case_marks(b)))
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(names: &[&str]) -> Vec<String> {
        let mut names: Vec<String> = names.iter().map(ToString::to_string).collect();
        names.sort_by(|a, b| compare_names(a, b));
        names
    }

    #[test]
    fn test_accents_do_not_move_names_to_the_end() {
        assert_eq!(compare_names("Anderson", "Ängström"), Ordering::Less);
        assert_eq!(
            sorted(&["Zimmer", "Ängström", "Anderson"]),
            vec!["Anderson", "Ängström", "Zimmer"]
        );
    }

    #[test]
    fn test_unaccented_before_accented() {
        assert_eq!(compare_names("Angstrom", "Ängström"), Ordering::Less);
        assert_eq!(compare_names("Ängström", "Angstrom"), Ordering::Greater);
    }

    #[test]
    fn test_case_insensitive_then_lower_first() {
        assert_eq!(compare_names("bob", "Alice"), Ordering::Greater);
        assert_eq!(compare_names("zoe", "Zoe"), Ordering::Less);
    }

    #[test]
    fn test_precomposed_and_decomposed_forms_sort_together() {
        let precomposed = "\u{00c9}mile";
        let decomposed = "E\u{0301}mile";
        assert_eq!(compare_names(precomposed, "Eve"), Ordering::Less);
        assert_eq!(compare_names(decomposed, "Eve"), Ordering::Less);
        assert_ne!(compare_names(precomposed, decomposed), Ordering::Equal);
    }

    #[test]
    fn test_space_sorts_before_letters() {
        assert_eq!(compare_names("Ann Lee", "Anna"), Ordering::Less);
    }

    #[test]
    fn test_order_is_total_and_repeatable() {
        let names = ["Émile", "emile", "Emile", "Ängström", "Anderson", "anderson"];
        let first = sorted(&names);
        let mut reversed = names;
        reversed.reverse();
        assert_eq!(sorted(&reversed), first);
        assert_eq!(compare_names("Émile", "Émile"), Ordering::Equal);
    }
}
