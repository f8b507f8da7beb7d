//! Prompts for the two text-generation calls.
//!
//! Centralising every prompt here keeps prompt wording out of the call and
//! validation logic in [`crate::pipeline::llm`], and lets unit tests inspect
//! the exact text without a live model.
//!
//! Both prompts ask for a bare JSON object. Models frequently wrap it in
//! prose or code fences anyway, which is why responses go through
//! [`crate::pipeline::extract`] rather than straight into `serde_json`.

/// Prompt for the title slide: a JSON object with `title` and `description`.
pub fn title_description_prompt(narration: &str) -> String {
    format!(
        r#"Write a title and a description for a PowerPoint presentation based on the transcript below.

Requirements:
- The title must be fewer than 20 words
- The description must be fewer than 35 words
- Describe the content, not the speaker
- Write in English, whatever the language of the transcript
- Respond with a single JSON object with exactly two string keys: "title" and "description"

Transcript: {narration}
"#
    )
}

/// Prompt for the content slides.
///
/// Requests `{"arrayOfObjects": [{"title": …, "content": [...]}, …]}` with
/// `slide_count` entries of 3–4 lines of roughly 160–170 characters each.
pub fn outline_prompt(narration: &str, slide_count: usize) -> String {
    format!(
        r#"Condense and tidy up the text below so it can be presented as PowerPoint slides.

Requirements:
- Produce exactly {slide_count} slides
- Each slide has a short "title" and a "content" array of 3 to 4 strings
- Each content string is between 160 and 170 characters long
- You may expand on the content using what the text implies
- Respond with a single JSON object with one key "arrayOfObjects" whose value is the array of slides
- Every slide object must have a "title" string and a "content" array of strings

Text: {narration}
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_prompt_embeds_transcript_and_keys() {
        let p = title_description_prompt("rust ownership explained");
        assert!(p.contains("rust ownership explained"));
        assert!(p.contains("\"title\""));
        assert!(p.contains("\"description\""));
        assert!(p.contains("fewer than 20 words"));
        assert!(p.contains("fewer than 35 words"));
    }

    #[test]
    fn outline_prompt_requests_slide_count() {
        let p = outline_prompt("some narration", 7);
        assert!(p.contains("exactly 7 slides"));
        assert!(p.contains("arrayOfObjects"));
        assert!(p.contains("160 and 170 characters"));
        assert!(p.ends_with("Text: some narration\n"));
    }
}
