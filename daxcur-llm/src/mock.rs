//! Local keyword responder, the last tier of the router.
//!
//! Looks at the most recent user turn only. Matching is case-insensitive
//! and `VAR` is checked before `OPTIMIZE`.

use crate::types::{ChatMessage, Reply, Role};

const VAR_REPLY: &str = "Here's the DAX formula using VAR for better readability:

```dax
VAR TotalRevenue = SUM([Revenue])
VAR TotalUnits = SUM([Units])
RETURN
    DIVIDE(TotalRevenue, TotalUnits)
```

This approach stores intermediate calculations in variables, making the formula easier to read and maintain.";

const OPTIMIZE_REPLY: &str = "Here's an optimized version of the DAX formula:

```dax
CALCULATE(
    DIVIDE(SUM([Revenue]), SUM([Units])),
    REMOVEFILTERS()
)
```

This version uses CALCULATE with REMOVEFILTERS for better performance.";

const DEFAULT_REPLY: &str = "I understand you want to refine the DAX formula. Here's an improved version:

```dax
SUMX(
    VALUES(Sales[ProductKey]),
    DIVIDE([Revenue], [Units])
)
```

This uses SUMX for row-by-row calculation which can be more accurate.";

/// Deterministic canned replies keyed on the latest user turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockResponder;

impl MockResponder {
    /// Reply for `messages`. Never empty, never fails.
    #[must_use]
    pub fn respond(messages: &[ChatMessage]) -> Reply {
        let latest = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.to_uppercase())
            .unwrap_or_default();

        let text = if latest.contains("VAR") {
            VAR_REPLY
        } else if latest.contains("OPTIMIZE") {
            OPTIMIZE_REPLY
        } else {
            DEFAULT_REPLY
        };
        ChatMessage::assistant(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_pick_snippets() {
        let var = MockResponder::respond(&[ChatMessage::user("please use var here")]);
        assert!(var.content.contains("VAR TotalRevenue"));
        assert_eq!(var.role, Role::Assistant);

        let opt = MockResponder::respond(&[ChatMessage::user("Optimize this")]);
        assert!(opt.content.contains("REMOVEFILTERS()"));

        let other = MockResponder::respond(&[ChatMessage::user("hello")]);
        assert!(other.content.contains("SUMX("));
    }

    #[test]
    fn var_wins_over_optimize() {
        let reply = MockResponder::respond(&[ChatMessage::user("optimize with VAR")]);
        assert!(reply.content.starts_with("Here's the DAX formula using VAR"));
    }

    #[test]
    fn only_latest_user_turn_counts() {
        let reply = MockResponder::respond(&[
            ChatMessage::user("use VAR"),
            ChatMessage::assistant("done, OPTIMIZE next?"),
            ChatMessage::user("optimize it"),
        ]);
        assert!(reply.content.contains("REMOVEFILTERS"));
    }

    #[test]
    fn no_user_turn_gets_default() {
        let reply = MockResponder::respond(&[ChatMessage::system("VAR")]);
        assert!(reply.content.contains("SUMX"));
        assert!(!MockResponder::respond(&[]).content.is_empty());
    }
}
