//! Markdown code-fence stripping for LLM replies.

const FENCE: &str = "```";

/// Strip a triple-backtick wrapper from an LLM reply.
///
/// When the trimmed reply starts with a fence, the opening fence line (with
/// any language tag) is dropped, and the last line is dropped only if it is
/// exactly a fence. Interior lines are returned verbatim. Replies that do
/// not start with a fence, or consist of a single line, come back trimmed.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.starts_with(FENCE) {
        return trimmed;
    }

    let Some(first_newline) = trimmed.find('\n') else {
        return trimmed;
    };
    let body = &trimmed[first_newline + 1..];

    match body.rfind('\n') {
        Some(last_newline) if body[last_newline + 1..].trim() == FENCE => &body[..last_newline],
        None if body.trim() == FENCE => "",
        _ => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_only_trimmed() {
        assert_eq!(strip_code_fence("  rag \n"), "rag");
    }

    #[test]
    fn wrapped_text_round_trips() {
        let inner = "{\n  \"message\": \"celular\",\n  \"color\": \"negro\"\n}";
        let wrapped = format!("```json\n{inner}\n```");
        assert_eq!(strip_code_fence(&wrapped), inner);

        let wrapped = format!("```\n{inner}\n```");
        assert_eq!(strip_code_fence(&wrapped), inner);
    }

    #[test]
    fn interior_whitespace_is_preserved() {
        let inner = "  indented\n\n  trailing  ";
        let wrapped = format!("```\n{inner}\n```");
        assert_eq!(strip_code_fence(&wrapped), inner);
    }

    #[test]
    fn missing_closing_fence_drops_only_opening_line() {
        assert_eq!(strip_code_fence("```\nshopping\nmore"), "shopping\nmore");
    }

    #[test]
    fn single_fence_line_is_left_alone() {
        assert_eq!(strip_code_fence("```rag```"), "```rag```");
    }

    #[test]
    fn empty_fenced_block() {
        assert_eq!(strip_code_fence("```\n```"), "");
    }
}
