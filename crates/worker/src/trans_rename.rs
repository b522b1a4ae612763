//! Trans-rename rule application (specification §4.5, "Atomic rename with
//! trans-rename rule").

use afd_core::job::TransRename;

/// Applies `rule` to `name`, honoring `toggle_only` against `current_toggle`.
///
/// The pattern supports at most one `*` wildcard, which captures the
/// matched substring and is substituted for the first `{}` in the
/// replacement template; `?` matches exactly one character literally.
/// Returns `None` when the rule does not apply to this toggle, or the
/// pattern does not match.
#[must_use]
pub fn apply(name: &str, rule: &TransRename, current_toggle: u8) -> Option<String> {
    if let Some(only) = rule.toggle_only {
        if only != current_toggle {
            return None;
        }
    }
    let captured = match_pattern(name, &rule.pattern)?;
    Some(match captured {
        Some(star) => rule.replacement.replacen("{}", &star, 1),
        None => rule.replacement.clone(),
    })
}

/// Matches `name` against `pattern`; returns `Some(Some(star))` when a `*`
/// captured a substring, `Some(None)` on a literal match with no `*`, or
/// `None` if the pattern does not match.
fn match_pattern(name: &str, pattern: &str) -> Option<Option<String>> {
    let Some(star_pos) = pattern.find('*') else {
        return if literal_matches(name, pattern) { Some(None) } else { None };
    };
    let (prefix, suffix) = (&pattern[..star_pos], &pattern[star_pos + 1..]);
    if name.len() < prefix.len() + suffix.len() {
        return None;
    }
    let (head, rest) = name.split_at(prefix.len());
    if !literal_matches(head, prefix) {
        return None;
    }
    let (middle, tail) = rest.split_at(rest.len() - suffix.len());
    if !literal_matches(tail, suffix) {
        return None;
    }
    Some(Some(middle.to_string()))
}

fn literal_matches(text: &str, pattern: &str) -> bool {
    if text.len() != pattern.len() {
        return false;
    }
    text.chars().zip(pattern.chars()).all(|(t, p)| p == '?' || p == t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(pattern: &str, replacement: &str, toggle_only: Option<u8>) -> TransRename {
        TransRename {
            pattern: pattern.to_string(),
            replacement: replacement.to_string(),
            toggle_only,
        }
    }

    #[test]
    fn star_captures_and_substitutes() {
        let r = rule("report_*.csv", "out/*.csv".replace('*', "{}").as_str(), None);
        assert_eq!(apply("report_2024.csv", &r, 1), Some("out/2024.csv".to_string()));
    }

    #[test]
    fn question_mark_matches_one_literal_character() {
        let r = rule("a?c", "matched", None);
        assert_eq!(apply("abc", &r, 1), Some("matched".to_string()));
        assert_eq!(apply("abbc", &r, 1), None);
    }

    #[test]
    fn toggle_only_rule_is_skipped_on_the_other_toggle() {
        let r = rule("*.txt", "renamed-{}", Some(2));
        assert_eq!(apply("a.txt", &r, 1), None);
        assert_eq!(apply("a.txt", &r, 2), Some("renamed-a".to_string()));
    }

    #[test]
    fn non_matching_pattern_returns_none() {
        let r = rule("*.csv", "renamed-{}", None);
        assert_eq!(apply("a.txt", &r, 1), None);
    }
}
