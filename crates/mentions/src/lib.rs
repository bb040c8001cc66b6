//! Mention extraction for message content.
//!
//! Parses message text for addressed users in either the bare `@user` form
//! or the bracketed `<@user>` form and returns the distinct user ids in
//! order of first occurrence.
//!
//! # Example
//!
//! ```
//! use huddle_mentions::extract_mentioned_user_ids;
//!
//! let ids = extract_mentioned_user_ids("Hello @user1 and <@user2>");
//! assert_eq!(ids, vec!["user1".to_string(), "user2".to_string()]);
//! ```

mod parser;

pub use parser::{Mention, extract_mentioned_user_ids, extract_mentions};

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_and_bracketed_forms() {
        let ids = extract_mentioned_user_ids("Hello @user1 and <@user2>");
        assert_eq!(ids, vec!["user1".to_string(), "user2".to_string()]);
    }

    #[test]
    fn test_duplicates_collapse_to_first_occurrence() {
        let ids = extract_mentioned_user_ids("@user1 @user1");
        assert_eq!(ids, vec!["user1".to_string()]);
    }

    #[test]
    fn test_no_mentions() {
        let ids = extract_mentioned_user_ids("nothing to see here");
        assert!(ids.is_empty());
    }
}
