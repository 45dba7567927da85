/// Pulls the JSON payload out of free-form model output.
pub trait JsonExtractor: Send + Sync {
    fn extract<'a>(&self, raw: &'a str) -> &'a str;
}

/// Best-effort recovery: the widest `{...}` or `[...]` span in the trimmed
/// text. The longer span wins and an object wins a tie. Text with no usable
/// span is returned trimmed. Decoding is what actually validates the result.
#[derive(Debug, Clone, Copy, Default)]
pub struct BracketScanExtractor;

impl JsonExtractor for BracketScanExtractor {
    fn extract<'a>(&self, raw: &'a str) -> &'a str {
        let trimmed = raw.trim();

        let object = span(trimmed, '{', '}');
        let array = span(trimmed, '[', ']');

        match (object, array) {
            (Some(obj), Some(arr)) if arr.len() > obj.len() => arr,
            (Some(obj), _) => obj,
            (None, Some(arr)) => arr,
            (None, None) => trimmed,
        }
    }
}

fn span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| text[start..=end].trim())
}
