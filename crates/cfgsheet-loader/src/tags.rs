//! Row tags: the column A marker of a data row.

use std::collections::BTreeSet;

use crate::config::LoaderConfig;

fn tokens<'t>(tag: &'t str, config: &'t LoaderConfig) -> impl Iterator<Item = &'t str> {
    tag.split(move |c| config.tag_separators.contains(c))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// True when the row must be skipped: the whole trimmed tag, or any of its
/// tokens, is one of the configured ignore tags.
pub fn is_ignore_tag(tag: &str, config: &LoaderConfig) -> bool {
    let tag = tag.trim();
    if tag.is_empty() {
        return false;
    }
    let ignored = |t: &str| config.ignore_tags.iter().any(|i| i == t);
    ignored(tag) || tokens(tag, config).any(ignored)
}

/// Tag tokens of a row, deduplicated and sorted.
pub fn parse_tags(tag: &str, config: &LoaderConfig) -> BTreeSet<String> {
    tokens(tag, config).map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignore_matches_whole_tag_or_token() {
        let config = LoaderConfig::default();
        assert!(is_ignore_tag("!", &config));
        assert!(is_ignore_tag(" ## ", &config));
        assert!(is_ignore_tag("dev,!", &config));
        assert!(!is_ignore_tag("", &config));
        assert!(!is_ignore_tag("dev", &config));
        assert!(!is_ignore_tag("!dev", &config));
    }

    #[test]
    fn custom_ignore_tags() {
        let config = LoaderConfig::default().with_ignore_tags(["skip"]);
        assert!(is_ignore_tag("skip", &config));
        assert!(!is_ignore_tag("!", &config));
    }

    #[test]
    fn tags_are_split_and_sorted() {
        let config = LoaderConfig::default();
        let tags: Vec<String> = parse_tags("test; dev|test", &config).into_iter().collect();
        assert_eq!(tags, vec!["dev", "test"]);
        assert!(parse_tags("", &config).is_empty());
    }
}
