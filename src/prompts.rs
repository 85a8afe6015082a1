//! System instructions sent to the generation API.
//!
//! Keeping every prompt here means changing what the model is told happens in
//! one place, and tests can inspect prompts without a live model.

/// System instruction for a chat turn, grounding the answer in `context`.
pub fn chat_system_prompt(context: &str) -> String {
    format!("Use this PDF content to answer:\n{}", context)
}

/// System instruction for summarising a document of `page_count` pages.
pub fn summary_system_prompt(page_count: usize) -> String {
    format!(
        "Provide a comprehensive summary covering key points from this {}-page document.",
        page_count
    )
}

/// Footnote appended to a chat answer listing the pages that grounded it.
pub fn referenced_pages_footnote(pages: &[usize]) -> String {
    let list: Vec<String> = pages.iter().map(|p| p.to_string()).collect();
    format!("\n\n*Referenced pages: {}*", list.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_prompt_embeds_context() {
        let p = chat_system_prompt("[a.pdf - Page 1] hello");
        assert_eq!(p, "Use this PDF content to answer:\n[a.pdf - Page 1] hello");
    }

    #[test]
    fn summary_prompt_mentions_page_count() {
        assert!(summary_system_prompt(25).contains("25-page document"));
    }

    #[test]
    fn footnote_lists_pages_in_order() {
        assert_eq!(
            referenced_pages_footnote(&[1, 3, 5]),
            "\n\n*Referenced pages: 1, 3, 5*"
        );
    }
}
