//! Token redaction.
//!
//! Every string that might end up in a [`crate::error::MigrationError`] or a
//! `JobRecord` must pass through here first. Tokens are treated as opaque
//! secrets: we never log them, and we never let them survive into anything
//! that gets serialized back to a caller.

/// Replaces every occurrence of `tokens` in `text` with `***`.
///
/// Empty tokens are ignored so an unset credential can't turn this into a
/// no-op replace-everything.
pub fn redact_in(text: &str, tokens: &[&str]) -> String {
    let mut scrubbed = text.to_string();
    for token in tokens {
        if token.is_empty() {
            continue;
        }
        scrubbed = scrubbed.replace(token, "***");
    }
    scrubbed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_every_occurrence_of_both_tokens() {
        let text = "push to https://ghp_abc@github.com failed, retry with ghp_abc or glpat_xyz";
        let out = redact_in(text, &["ghp_abc", "glpat_xyz"]);
        assert!(!out.contains("ghp_abc"));
        assert!(!out.contains("glpat_xyz"));
        assert_eq!(out.matches("***").count(), 3);
    }

    #[test]
    fn empty_token_is_a_no_op() {
        let text = "nothing secret here";
        assert_eq!(redact_in(text, &[""]), text);
    }

    #[test]
    fn absent_token_leaves_text_untouched() {
        let text = "no secrets present";
        assert_eq!(redact_in(text, &["unused_token"]), text);
    }
}
