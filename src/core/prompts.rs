//! Prompt construction for the rewrite and format passes.

use crate::config::Persona;

/// System message sent with every rewrite request
pub const SYSTEM_PROMPT: &str = "You are a professional blogger.";

/// Heading of the summary section the rewrite must append
pub const SUMMARY_HEADING: &str = "## まとめ";

/// Build the persona rewrite instruction.
///
/// `reordered` is the draft after the section reorder stage; `title` is the
/// game title derived from the file name.
pub fn rewrite_prompt(reordered: &str, title: &str, persona: &Persona) -> String {
    format!(
        r#"Rewrite the following Markdown article according to the rules below. Write the result in Japanese.
IMPORTANT: any text wrapped in [autohtml] tags at the top must be kept exactly as-is. Do not change it.

## Rules
1. Section order: keep the level-3 (###) sections in exactly the order they appear below. The first two are fixed; the rest were deliberately reordered.
2. Grouping: group the ### sections in pairs and give each pair a new level-2 (##) heading that makes readers want to keep reading (three ## headings in total).
3. Title: include the game title "{title}" in every ## heading you create.
4. Voice: rewrite every ### heading so readers want to read it, and rewrite each body in this tone:
   - Tone: {tone}
   - Do not use emoji.
5. Summary: finish the article with a "{summary}" heading followed by a short, attractive wrap-up of what makes the game worth playing.

## Article
{reordered}
"#,
        title = title,
        tone = persona.tone,
        summary = SUMMARY_HEADING,
        reordered = reordered,
    )
}

/// Build the formatting-only instruction for the second pass
pub fn format_prompt(rewritten: &str) -> String {
    format!(
        r#"Reformat the following Markdown article without changing its wording, headings or order.
- Split long paragraphs into short ones (two or three sentences each) and put a blank line between paragraphs.
- Put line breaks at natural pauses so the text reads well on a phone.
- Wrap the most important phrase of each section in **bold**. Do not overuse it.
- Keep [autohtml] and [autoimg] blocks exactly as they are.
- Return only the article.

## Article
{rewritten}
"#,
        rewritten = rewritten,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_prompt_embeds_inputs() {
        let persona = Persona::hype();
        let prompt = rewrite_prompt("### A\nbody\n", "ロードモバイル", &persona);

        assert!(prompt.contains("### A\nbody\n"));
        assert!(prompt.contains("\"ロードモバイル\""));
        assert!(prompt.contains(&persona.tone));
        assert!(prompt.contains(SUMMARY_HEADING));
        assert!(prompt.contains("[autohtml]"));
    }

    #[test]
    fn test_format_prompt_embeds_text() {
        let prompt = format_prompt("rewritten body");
        assert!(prompt.ends_with("rewritten body\n"));
        assert!(prompt.contains("**bold**"));
    }
}
