// src/utils/html.rs

/// Sanitises user-supplied text that the front end renders as HTML
/// (project descriptions, chat messages). Whitelisted tags survive;
/// scripts, iframes and event-handler attributes are stripped.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

pub fn clean_optional(input: Option<&str>) -> Option<String> {
    input.map(clean_html).filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_scripts_keeps_formatting() {
        let cleaned = clean_html("<b>hi</b><script>alert(1)</script>");
        assert_eq!(cleaned, "<b>hi</b>");
    }

    #[test]
    fn test_clean_optional_drops_empty() {
        assert_eq!(clean_optional(None), None);
        assert_eq!(clean_optional(Some("<script>x</script>")), None);
        assert_eq!(clean_optional(Some("ok")), Some("ok".to_string()));
    }
}
