use crate::domain::AnswerResult;

/// Maximum characters shown per source passage.
pub const SNIPPET_CHARS: usize = 160;

/// First `max_chars` characters of `text` with newlines flattened, plus `…` when cut.
pub fn snippet(text: &str, max_chars: usize) -> String {
    let mut out: String = text
        .chars()
        .take(max_chars)
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    if text.chars().count() > max_chars {
        out.push('…');
    }
    out
}

pub fn format_answer(res: &AnswerResult) -> String {
    let mut out = format!("\n[Answer]\n{}\n\n[Source Passages]\n", res.answer);
    for (i, chunk) in res.source_chunks.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, snippet(&chunk.text, SNIPPET_CHARS)));
    }
    out
}
