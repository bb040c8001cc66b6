//! Mention parser.

use regex::Regex;

/// Mention information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    /// Mentioned user id.
    pub user_id: String,
    /// Byte offset where the mention starts.
    pub start: usize,
    /// Byte offset one past the mention end.
    pub end: usize,
}

// Matches <@user> and bare @user. The bracketed alternative comes first so
// the surrounding angle brackets are consumed with the mention.
#[allow(clippy::unwrap_used)] // valid static pattern that cannot fail
static MENTION_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"<@([a-zA-Z0-9_-]+)>|@([a-zA-Z0-9_-]+)").unwrap()
});

/// Extract every mention in the text, in document order, duplicates included.
#[must_use]
pub fn extract_mentions(text: &str) -> Vec<Mention> {
    MENTION_RE
        .captures_iter(text)
        .filter_map(|cap| {
            let m = cap.get(0)?;
            let user_id = cap.get(1).or_else(|| cap.get(2))?.as_str().to_string();
            Some(Mention {
                user_id,
                start: m.start(),
                end: m.end(),
            })
        })
        .collect()
}

/// Extract the distinct mentioned user ids, order of first occurrence
/// preserved.
#[must_use]
pub fn extract_mentioned_user_ids(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    extract_mentions(text)
        .into_iter()
        .filter_map(|m| seen.insert(m.user_id.clone()).then_some(m.user_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_mention() {
        let mentions = extract_mentions("ping @alice please");
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].user_id, "alice");
        assert_eq!(&"ping @alice please"[mentions[0].start..mentions[0].end], "@alice");
    }

    #[test]
    fn test_bracketed_mention_consumes_brackets() {
        let text = "hi <@bob>!";
        let mentions = extract_mentions(text);
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].user_id, "bob");
        assert_eq!(&text[mentions[0].start..mentions[0].end], "<@bob>");
    }

    #[test]
    fn test_hyphen_and_underscore_in_user_id() {
        let mentions = extract_mentions("@dev_ops-1");
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].user_id, "dev_ops-1");
    }

    #[test]
    fn test_mixed_order_preserved() {
        let ids = extract_mentioned_user_ids("<@b> then @a then <@b>");
        assert_eq!(ids, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_email_like_text_still_matches_local_part() {
        // A bare @ inside a word is still a mention under this grammar;
        // upstream validation decides whether the id resolves to a user.
        let mentions = extract_mentions("mail me at foo@example");
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].user_id, "example");
    }
}
