//! Plain text email templates rendered to HTML.
//!
//! Authors write plain text with `{{ key }}` placeholders. Blank lines
//! separate blocks; a block of `- `/`* `/`• ` lines becomes a bullet list, a
//! block of `1. ` lines a numbered list, anything else a paragraph. `**bold**`
//! and bare `http(s)://` links are the only inline markup.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Placeholder values keyed by name.
pub type TemplateVars = BTreeMap<String, String>;

/// A rendered email ready for a sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("valid regex"))
}

fn bold_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid regex"))
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"https?://[^\s<>"]+"#).expect("valid regex"))
}

fn ordered_item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.\s+").expect("valid regex"))
}

const BULLETS: [&str; 3] = ["- ", "* ", "• "];

const TRAILING_ENTITIES: [&str; 4] = ["&quot;", "&#39;", "&gt;", "&lt;"];

/// The standard variables for one recipient.
#[must_use]
pub fn recipient_vars(full_name: Option<&str>, email: &str, app_url: &str) -> TemplateVars {
    let local_part = email.split('@').next().unwrap_or(email);
    let name = full_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(local_part);
    let first_name = name.split_whitespace().next().unwrap_or(name);
    TemplateVars::from([
        ("name".to_string(), name.to_string()),
        ("first_name".to_string(), first_name.to_string()),
        ("email".to_string(), email.to_string()),
        ("app_url".to_string(), app_url.trim_end_matches('/').to_string()),
    ])
}

/// Replace `{{ key }}` placeholders. Unknown keys are left as written.
#[must_use]
pub fn substitute(template: &str, vars: &TemplateVars) -> String {
    placeholder_re()
        .replace_all(template, |caps: &Captures<'_>| {
            vars.get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn inline(line: &str) -> String {
    let escaped = escape_html(line);
    let bolded = bold_re().replace_all(&escaped, "<strong>$1</strong>");
    url_re()
        .replace_all(&bolded, |caps: &Captures<'_>| {
            let matched = &caps[0];
            let url = trim_url(matched);
            let rest = &matched[url.len()..];
            format!(r#"<a href="{url}">{url}</a>{rest}"#)
        })
        .into_owned()
}

/// Drop trailing punctuation and escaped quotes or brackets from a URL match.
/// The text is already escaped, so `"` arrives as `&quot;`.
fn trim_url(matched: &str) -> &str {
    let mut url = matched;
    loop {
        if let Some(rest) = TRAILING_ENTITIES.iter().find_map(|e| url.strip_suffix(e)) {
            url = rest;
        } else if let Some(rest) = url.strip_suffix(['.', ',', ';', ':', '!', '?', ')']) {
            url = rest;
        } else {
            return url;
        }
    }
}

fn blocks(text: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

fn strip_bullet(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    BULLETS.iter().find_map(|b| trimmed.strip_prefix(b))
}

/// Convert plain text (placeholders already substituted) to an HTML fragment.
#[must_use]
pub fn text_to_html(text: &str) -> String {
    let mut html = String::new();
    for block in blocks(text) {
        if block.iter().all(|l| strip_bullet(l).is_some()) {
            html.push_str("<ul>");
            for line in &block {
                let item = strip_bullet(line).unwrap_or(line);
                html.push_str(&format!("<li>{}</li>", inline(item)));
            }
            html.push_str("</ul>\n");
        } else if block.iter().all(|l| ordered_item_re().is_match(l.trim_start())) {
            html.push_str("<ol>");
            for line in &block {
                let item = ordered_item_re().replace(line.trim_start(), "");
                html.push_str(&format!("<li>{}</li>", inline(&item)));
            }
            html.push_str("</ol>\n");
        } else {
            let lines: Vec<String> = block.iter().map(|l| inline(l)).collect();
            html.push_str(&format!("<p>{}</p>\n", lines.join("<br>")));
        }
    }
    html
}

fn layout(body: &str, app_url: &str) -> String {
    let account = format!("{}/account", app_url.trim_end_matches('/'));
    format!(
        "<!DOCTYPE html>\n<html><body style=\"font-family:-apple-system,Segoe UI,Helvetica,Arial,sans-serif;\
line-height:1.5;color:#1f2937;max-width:560px;margin:0 auto;padding:24px\">\n{body}\
<hr style=\"border:none;border-top:1px solid #e5e7eb;margin:32px 0 16px\">\n\
<p style=\"font-size:12px;color:#6b7280\">You are receiving this email because you have an ICF Log account. \
<a href=\"{account}\">Manage email preferences</a></p>\n</body></html>\n"
    )
}

/// Render subject and body for one recipient.
#[must_use]
pub fn render_email(
    subject: &str,
    content: &str,
    vars: &TemplateVars,
    app_url: &str,
) -> RenderedEmail {
    let body = substitute(content, vars);
    let account = format!("{}/account", app_url.trim_end_matches('/'));
    RenderedEmail {
        subject: substitute(subject, vars).trim().to_string(),
        html: layout(&text_to_html(&body), app_url),
        text: format!("{}\n\n--\nManage email preferences: {account}\n", body.trim_end()),
    }
}
