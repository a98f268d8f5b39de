use std::path::Path;

/// HTML template with `{{token}}` placeholders.
///
/// Rendering is literal substitution: every occurrence of a bound token is
/// replaced, unbound tokens stay in the output untouched, and nothing is
/// escaped here. Callers escape untrusted values before binding them.
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
}

impl Template {
    pub fn new(source: impl Into<String>) -> Self {
        Self { source: source.into() }
    }

    pub async fn load(path: &Path) -> std::io::Result<Self> {
        let source = tokio::fs::read_to_string(path).await?;
        Ok(Self { source })
    }

    /// Single pass over the source, so bound values are never themselves
    /// scanned for tokens.
    pub fn render(&self, bindings: &[(&str, String)]) -> String {
        let mut out = String::with_capacity(self.source.len());
        let mut rest = self.source.as_str();

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after_open = &rest[start + 2..];
            let bound = after_open.find("}}").and_then(|end| {
                let token = &after_open[..end];
                bindings
                    .iter()
                    .find(|(name, _)| *name == token)
                    .map(|(_, value)| (value, end))
            });
            match bound {
                Some((value, end)) => {
                    out.push_str(value);
                    rest = &after_open[end + 2..];
                }
                // Not a bound token: keep the braces and rescan right after them
                None => {
                    out.push_str("{{");
                    rest = after_open;
                }
            }
        }

        out.push_str(rest);
        out
    }
}

/// Escape text for use in HTML element content and quoted attributes
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
