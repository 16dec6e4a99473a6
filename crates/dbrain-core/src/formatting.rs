//! Formatting utilities (Telegram HTML, vault markdown, report rendering).

use std::sync::OnceLock;

use regex::Regex;

use crate::{processor::Report, Result};

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Truncate to `max_chars` characters, appending `...` when cut.
pub fn truncate_text(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out = s.chars().take(max_chars.saturating_sub(3)).collect::<String>();
    out.push_str("...");
    out
}

struct MarkdownRules {
    bold: Regex,
    italic: Regex,
    code: Regex,
    strike: Regex,
    underline: Regex,
    link: Regex,
}

fn markdown_rules() -> &'static MarkdownRules {
    static RULES: OnceLock<MarkdownRules> = OnceLock::new();
    RULES.get_or_init(|| MarkdownRules {
        bold: Regex::new(r"(?s)<b>(.*?)</b>").expect("valid regex"),
        italic: Regex::new(r"(?s)<i>(.*?)</i>").expect("valid regex"),
        code: Regex::new(r"(?s)<code>(.*?)</code>").expect("valid regex"),
        strike: Regex::new(r"(?s)<s>(.*?)</s>").expect("valid regex"),
        underline: Regex::new(r"</?u>").expect("valid regex"),
        link: Regex::new(r#"<a href="([^"]+)">([^<]+)</a>"#).expect("valid regex"),
    })
}

/// Convert the Telegram HTML subset the LLM answers in to Obsidian markdown.
pub fn html_to_markdown(html: &str) -> String {
    let r = markdown_rules();
    let text = r.bold.replace_all(html, "**$1**");
    let text = r.italic.replace_all(&text, "*$1*");
    let text = r.code.replace_all(&text, "`$1`");
    let text = r.strike.replace_all(&text, "~~$1~~");
    let text = r.underline.replace_all(&text, "");
    let text = r.link.replace_all(&text, "[$2]($1)");
    text.into_owned()
}

/// Render a processor outcome as the Telegram HTML that replaces a placeholder.
pub fn format_report(outcome: &Result<Report>, limit: usize) -> String {
    match outcome {
        Ok(report) if report.html.trim().is_empty() => "⚠️ Empty response from the model".to_string(),
        Ok(report) => truncate_text(&report.html, limit),
        Err(e) => truncate_text(&format!("❌ {}", escape_html(&e.to_string())), limit),
    }
}
