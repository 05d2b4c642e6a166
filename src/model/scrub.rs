use std::borrow::Cow;

const MAX_ERROR_CHARS: usize = 200;

/// Markers after which a credential-like token is redacted.
const SECRET_MARKERS: [&str; 5] = [
    "Authorization: Bearer ",
    "authorization: bearer ",
    "\"authorization\":\"Bearer ",
    "api_key=",
    "\"api_key\":\"",
];

/// Prefixes of self-describing tokens, redacted together with the prefix.
const TOKEN_PREFIXES: [&str; 1] = ["hf_"];

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '+' | '/' | '=')
}

fn token_end(input: &str, from: usize) -> usize {
    input[from..]
        .char_indices()
        .find(|(_, c)| !is_secret_char(*c))
        .map_or(input.len(), |(i, _)| from + i)
}

fn redact_after(scrubbed: &mut String, marker: &str) {
    let mut search_from = 0;
    while let Some(rel) = scrubbed[search_from..].find(marker) {
        let start = search_from + rel;
        let content_start = start + marker.len();
        let end = token_end(scrubbed, content_start);

        // Bare marker without a value.
        if end == content_start {
            search_from = content_start;
            continue;
        }

        scrubbed.replace_range(content_start..end, "[REDACTED]");
        search_from = content_start + "[REDACTED]".len();
    }
}

fn starts_token(input: &str, at: usize) -> bool {
    input[..at]
        .chars()
        .next_back()
        .is_none_or(|c| !is_secret_char(c))
}

fn redact_prefixed(scrubbed: &mut String, prefix: &str) {
    let mut search_from = 0;
    while let Some(rel) = scrubbed[search_from..].find(prefix) {
        let start = search_from + rel;
        let content_start = start + prefix.len();
        let end = token_end(scrubbed, content_start);

        // Mid-word (`shelf_id`) or bare prefix.
        if !starts_token(scrubbed, start) || end == content_start {
            search_from = content_start;
            continue;
        }

        scrubbed.replace_range(start..end, "[REDACTED]");
        search_from = start + "[REDACTED]".len();
    }
}

/// Redact credential-like tokens from backend error text.
pub fn scrub_secret_patterns(input: &str) -> Cow<'_, str> {
    let has_marker = SECRET_MARKERS.iter().any(|marker| input.contains(marker));
    let has_prefix = TOKEN_PREFIXES.iter().any(|prefix| input.contains(prefix));
    if !has_marker && !has_prefix {
        return Cow::Borrowed(input);
    }

    let mut scrubbed = input.to_string();
    for marker in SECRET_MARKERS {
        redact_after(&mut scrubbed, marker);
    }
    for prefix in TOKEN_PREFIXES {
        redact_prefixed(&mut scrubbed, prefix);
    }

    if scrubbed == input {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(scrubbed)
    }
}

/// Scrub and truncate backend error text before it reaches a log line.
pub fn sanitize_error_text(input: &str) -> String {
    let scrubbed = scrub_secret_patterns(input);

    if scrubbed.chars().count() <= MAX_ERROR_CHARS {
        return scrubbed.into_owned();
    }

    let scrubbed = scrubbed.as_ref();
    let end = scrubbed
        .char_indices()
        .nth(MAX_ERROR_CHARS)
        .map_or(scrubbed.len(), |(i, _)| i);

    format!("{}...", &scrubbed[..end])
}

/// Build a sanitized error from a failed backend HTTP response.
pub async fn api_error(backend: &str, response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read backend error body>".to_string());
    let sanitized = sanitize_error_text(&body);
    anyhow::anyhow!("{backend} API error ({status}): {sanitized}")
}
