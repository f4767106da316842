use autumnus::{HtmlLinkedBuilder, formatter::Formatter, languages::Language, themes};

/// Theme used for the generated `highlight.css`.
pub const DEFAULT_THEME: &str = "dracula";

/// Code block highlighter using autumnus (tree-sitter based).
///
/// Output uses CSS classes rather than inline styles; the matching stylesheet
/// comes from [`SyntaxHighlighter::stylesheet`].
pub struct SyntaxHighlighter {
    theme_name: String,
}

impl SyntaxHighlighter {
    pub fn new(theme_name: &str) -> Self {
        Self {
            theme_name: theme_name.to_string(),
        }
    }

    /// Highlight a fenced code block.
    ///
    /// `info` is the fence info string (`rust`, `rust,ignore`, ...). Blocks
    /// without a language and unknown languages produce a plain escaped
    /// `<pre><code>` block.
    pub fn highlight(&self, code: &str, info: &str) -> String {
        let language = info
            .split(|c: char| c == ',' || c.is_whitespace())
            .next()
            .unwrap_or_default();
        if language.is_empty() {
            return plain_code_block(code, language);
        }

        let lang = Language::guess(language, code);
        if matches!(lang, Language::PlainText) && !matches!(language, "plaintext" | "text") {
            return plain_code_block(code, language);
        }

        let formatter = match HtmlLinkedBuilder::new().source(code).lang(lang).build() {
            Ok(f) => f,
            Err(_) => return plain_code_block(code, language),
        };

        let mut output: Vec<u8> = Vec::new();
        if formatter.format(&mut output).is_err() {
            return plain_code_block(code, language);
        }
        String::from_utf8(output).unwrap_or_else(|_| plain_code_block(code, language))
    }

    /// CSS for the configured theme, or `None` if autumnus doesn't know it.
    pub fn stylesheet(&self) -> Option<String> {
        let theme = themes::get(&self.theme_name).ok()?;
        Some(theme.css(false))
    }
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new(DEFAULT_THEME)
    }
}

fn plain_code_block(code: &str, language: &str) -> String {
    let escaped = html_escape(code);
    if language.is_empty() {
        format!("<pre><code>{escaped}</code></pre>")
    } else {
        format!(
            "<pre><code class=\"language-{}\">{escaped}</code></pre>",
            html_escape(language)
        )
    }
}

/// Escape HTML special characters.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
