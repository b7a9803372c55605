//! HTML pages for the browser form

use crate::models::types::{ProbeOutcome, Verdict};
use crate::utils::constants::{APP_NAME, FORM_URL_FIELD};

/// Escape text for HTML element content and attribute values
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

fn layout(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{app}</title>
<style>
body {{ font-family: sans-serif; max-width: 720px; margin: 40px auto; padding: 0 16px; }}
input[type=text] {{ width: 75%; padding: 8px; }}
.safe {{ color: #1b7f3b; }}
.unsafe {{ color: #b3261e; }}
li {{ margin: 6px 0; }}
</style>
</head>
<body>
<h1>🛡️ {app}</h1>
<form action="/predict" method="post">
<input type="text" name="{field}" placeholder="https://example.com" required>
<button type="submit">Check</button>
</form>
{body}
</body>
</html>
"#,
        app = APP_NAME,
        field = FORM_URL_FIELD,
        body = body
    )
}

pub fn render_home() -> String {
    layout("")
}

pub fn render_error(message: &str) -> String {
    layout(&format!(r#"<p class="unsafe">❌ {}</p>"#, escape_html(message)))
}

fn probe_line(outcome: &ProbeOutcome, present: &str, absent: &str) -> String {
    if outcome.is_detected() {
        format!("✅ {}", present)
    } else {
        format!("❌ {}", absent)
    }
}

pub fn render_verdict(verdict: &Verdict) -> String {
    let url = escape_html(&verdict.url);
    let status = if verdict.is_safe() {
        format!("🟢 Status: {} website is ✅SAFE to visit.", url)
    } else {
        format!("🔴 Status: {} website is ❌NOT SAFE to visit.", url)
    };
    let probability = match verdict.probability_percent {
        Some(p) => format!("🔒 Probability of being malicious: {}%", p),
        None => format!("🔒 {} does not report probabilities.", escape_html(&verdict.model)),
    };

    let probes = &verdict.probes;
    let lines = [
        status,
        probability,
        probe_line(
            &probes.ssl_certificate,
            "SSL Certificate: The website has a valid SSL certificate.",
            "SSL Certificate: The website does not have a valid SSL certificate.",
        ),
        probe_line(
            &probes.server_banner,
            "Server banner is present for the website.",
            "No server banner detected for the website.",
        ),
        probe_line(
            &probes.hsts,
            "HSTS is enabled for the website.",
            "HSTS is not enabled for the website.",
        ),
        probe_line(
            &probes.x_xss_protection,
            "X-XSS-Protection is set for the website.",
            "X-XSS-Protection is not set for the website.",
        ),
    ];

    let items: String = lines.iter().map(|l| format!("<li>{}</li>\n", l)).collect();
    layout(&format!(
        "<h2 class=\"{class}\">Entered Website: {url}</h2>\n<ul>\n{items}</ul>",
        class = verdict.label.as_str(),
        url = url,
        items = items
    ))
}
