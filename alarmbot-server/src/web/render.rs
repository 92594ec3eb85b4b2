//! HTML fragments for the web chat.

use alarmbot_core::{Reply, ReplyKind};

/// Escape text for use in HTML content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn kind_class(kind: ReplyKind) -> &'static str {
    match kind {
        ReplyKind::Welcome => "welcome",
        ReplyKind::Prompt => "prompt",
        ReplyKind::Invalid => "invalid",
        ReplyKind::Unsupported => "unsupported",
        ReplyKind::Resolution => "resolution",
    }
}

/// Render a reply as a fragment: the text, then one button per choice.
///
/// Each button carries its label in `data-msg`; the page re-submits it as a
/// new `/get` query when clicked.
pub fn render_reply(reply: &Reply) -> String {
    let mut out = format!(
        "<div class=\"reply reply-{}\">{}</div>",
        kind_class(reply.kind),
        escape_html(&reply.text).replace('\n', "<br>")
    );
    if !reply.choices.is_empty() {
        out.push_str("<div class=\"choices\">");
        for choice in &reply.choices {
            let label = escape_html(choice);
            out.push_str(&format!(
                "<button type=\"button\" class=\"choice\" data-msg=\"{label}\">{label}</button>"
            ));
        }
        out.push_str("</div>");
    }
    out
}
