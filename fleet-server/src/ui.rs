//! Browser client pages
//!
//! The page shell, stylesheet and script are compiled into the binary and
//! stitched together per request.

use std::time::Duration;

const INDEX_HTML: &str = include_str!("../assets/index.html");
const STYLES_CSS: &str = include_str!("../assets/styles.css");
const APP_JS: &str = include_str!("../assets/app.js");

/// Escape text for HTML element and attribute content
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render the review page for `review_id`
pub fn render_review_page(review_id: &str, poll_interval: Duration) -> String {
    // `<` is escaped so the literal cannot close the script element
    let id_literal = serde_json::to_string(review_id)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace('<', "\\u003c");

    let script = APP_JS
        .replace("__REVIEW_ID__", &id_literal)
        .replace("__POLL_INTERVAL_MS__", &poll_interval.as_millis().to_string());

    INDEX_HTML
        .replace("__TITLE_ID__", &escape_html(review_id))
        .replace("/* __STYLES__ */", STYLES_CSS)
        .replace("/* __SCRIPT__ */", &script)
}

/// Render the page shown for an unknown review
pub fn render_not_found_page(review_id: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Review Not Found</title>
  <style>
    body {{
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
      background: #0d1117;
      color: #e6edf3;
      display: flex;
      align-items: center;
      justify-content: center;
      height: 100vh;
      margin: 0;
    }}
    .error {{ text-align: center; }}
    h1 {{ color: #f85149; }}
  </style>
</head>
<body>
  <div class="error">
    <h1>Review Not Found</h1>
    <p>The review with ID "{}" does not exist.</p>
  </div>
</body>
</html>
"#,
        escape_html(review_id)
    )
}
