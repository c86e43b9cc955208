//! Hashtag extraction for feed posts

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// `#word` at the start of text or after a non-word character, so `C#`
/// and `a#b` do not count. The run is greedy and checked afterwards.
static HASHTAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^\w&#])#([\w-]+)").expect("invalid hashtag regex"));

/// Maximum tags stored per post
pub const MAX_POST_TAGS: usize = 10;

/// Longer runs are not tags at all
pub const MAX_HASHTAG_CHARS: usize = 32;

fn is_valid_tag(tag: &str) -> bool {
    tag.chars().next().is_some_and(char::is_alphanumeric)
        && tag.chars().count() <= MAX_HASHTAG_CHARS
}

/// Extract lowercased hashtags, deduplicated and sorted.
///
/// # Example
/// ```
/// use q5_server::models::extract_hashtags;
///
/// assert_eq!(extract_hashtags("#QEC beats #noise"), vec!["noise", "qec"]);
/// ```
pub fn extract_hashtags(text: &str) -> Vec<String> {
    HASHTAG_RE
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|tag| is_valid_tag(tag))
        .map(str::to_lowercase)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .take(MAX_POST_TAGS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_from_sentence() {
        let tags = extract_hashtags("Great talk on #photonics and #QuantumSensing today");
        assert_eq!(tags, vec!["photonics", "quantumsensing"]);
    }

    #[test]
    fn dedupes_case_insensitively() {
        assert_eq!(extract_hashtags("#QKD #qkd #Qkd"), vec!["qkd"]);
    }

    #[test]
    fn ignores_embedded_hashes() {
        assert!(extract_hashtags("I write C# and a#b").is_empty());
        assert!(extract_hashtags("&#39; entity").is_empty());
        assert!(extract_hashtags("## heading").is_empty());
    }

    #[test]
    fn start_of_text_and_punctuation() {
        assert_eq!(extract_hashtags("#first, (#second)"), vec!["first", "second"]);
    }

    #[test]
    fn keeps_non_ascii_tags_whole() {
        let tags = extract_hashtags("Visiting #Québec for #Überlegenheit");
        assert_eq!(tags, vec!["québec", "überlegenheit"]);
    }

    #[test]
    fn skips_overlong_runs_instead_of_truncating() {
        let long = format!("#{}", "q".repeat(MAX_HASHTAG_CHARS + 1));
        let exact = format!("#{}", "q".repeat(MAX_HASHTAG_CHARS));
        assert!(extract_hashtags(&long).is_empty());
        assert_eq!(extract_hashtags(&exact).len(), 1);
        assert_eq!(extract_hashtags(&format!("{long} #qec")), vec!["qec"]);
    }

    #[test]
    fn tag_must_start_alphanumeric() {
        assert!(extract_hashtags("#_private #-dash").is_empty());
        assert_eq!(extract_hashtags("#fault-tolerant_qc"), vec!["fault-tolerant_qc"]);
    }

    #[test]
    fn caps_tag_count() {
        let text: String = (0..20).map(|i| format!("#t{:02} ", i)).collect();
        assert_eq!(extract_hashtags(&text).len(), MAX_POST_TAGS);
    }
}
