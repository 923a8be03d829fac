//! Log sanitization for account data and secrets.
//!
//! Formatted log lines pass through [`SanitizingMakeWriter`] before they reach
//! the sink. It redacts:
//! - E-mail addresses
//! - Session cookies (`session=...` in `Cookie` / `Set-Cookie` headers)
//! - Argon2 PHC password hashes
//! - `password=...`, `token=...` and similar key/value secrets
//! - UUIDs, JWTs and long hex strings
//!
//! Symptom names and disease names are not sensitive on their own and pass
//! through untouched, so warnings about unknown symptoms stay readable.
//!
//! # Performance / DoS
//!
//! `sanitize()` caps the input it scans (see `SYMPTOMCHECK_SANITIZE_MAX_BYTES`)
//! so that huge untrusted strings cannot make logging expensive.

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

static SECRET_PATTERNS: OnceLock<SecretPatterns> = OnceLock::new();

/// Maximum number of bytes to sanitize per call. Defaults to 16 KiB.
const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

struct SecretPattern {
    regex: Regex,
    replacement: &'static str,
}

struct SecretPatterns {
    set: RegexSet,
    patterns: Vec<SecretPattern>,
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }

    let mut end = max_bytes.min(input.len());
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

fn max_sanitize_bytes() -> usize {
    std::env::var("SYMPTOMCHECK_SANITIZE_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

fn get_patterns() -> &'static SecretPatterns {
    SECRET_PATTERNS.get_or_init(|| {
        // Order matters: more specific patterns run before the broad ones.
        let rules: Vec<(&'static str, &'static str)> = vec![
            // Argon2 / PHC password hashes
            (r"\$argon2(?:id|i|d)\$[A-Za-z0-9$=,+/.-]+", "[REDACTED-PASSWORD-HASH]"),
            // Session cookie values
            (r"(?i)\bsession=[A-Za-z0-9_-]+", "session=[REDACTED]"),
            // Key/value secrets from forms, query strings or debug output
            (
                r#"(?i)\b(password|passwd|pwd|token|secret|api[_-]?key)\b(\s*[:=]\s*"?)[^\s&",;}]+"#,
                "$1$2[REDACTED]",
            ),
            // JWTs
            (
                r"\beyJ[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\b",
                "[REDACTED-JWT]",
            ),
            // E-mail addresses (bounded labels; case-insensitive)
            (
                r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
                "[REDACTED-EMAIL]",
            ),
            // UUIDs
            (
                r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
                "[REDACTED-UUID]",
            ),
            // Long hex strings (token hashes, key material). `sha256=<digest>`
            // is shielded in `sanitize_with_limit`.
            (r"\b[0-9a-fA-F]{48,}\b", "[REDACTED-HEX]"),
        ];

        let set = RegexSet::new(rules.iter().map(|(p, _)| *p)).expect("Valid regex set");
        let patterns = rules
            .into_iter()
            .map(|(pattern, replacement)| SecretPattern {
                regex: Regex::new(pattern).expect("Valid regex"),
                replacement,
            })
            .collect();

        SecretPatterns { set, patterns }
    })
}

/// Sanitize a string by replacing secrets and personal data.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_sanitize_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let patterns = get_patterns();

    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    if !patterns.set.is_match(prefix) {
        let mut out = prefix.to_string();
        if truncated {
            out.push_str(" [TRUNCATED]");
        }
        return out;
    }

    // A published model digest is not a secret; keep it readable.
    let digest_re = model_digest_regex();
    let mut kept: Vec<String> = Vec::new();
    let protected = digest_re.replace_all(prefix, |caps: &regex::Captures<'_>| {
        kept.push(caps[0].to_string());
        format!("\u{0}{}\u{0}", kept.len() - 1)
    });

    let matched: Vec<usize> = patterns.set.matches(&protected).into_iter().collect();
    let mut result = protected.into_owned();
    for idx in matched {
        let pattern = &patterns.patterns[idx];
        result = pattern
            .regex
            .replace_all(&result, pattern.replacement)
            .into_owned();
    }

    for (i, original) in kept.iter().enumerate() {
        result = result.replace(&format!("\u{0}{i}\u{0}"), original);
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

fn model_digest_regex() -> &'static Regex {
    static DIGEST: OnceLock<Regex> = OnceLock::new();
    DIGEST.get_or_init(|| Regex::new(r"sha256=[0-9a-f]{64}\b").expect("Valid regex"))
}

/// Check if a string contains something [`sanitize`] would redact.
#[must_use]
pub fn contains_secret(input: &str) -> bool {
    let (prefix, _truncated) = truncate_to_char_boundary(input, max_sanitize_bytes());
    get_patterns().set.is_match(prefix)
}

/// A `tracing_subscriber` writer wrapper that sanitizes formatted log output
/// before it is written to the underlying sink.
#[derive(Debug)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<M> Clone for SanitizingMakeWriter<M>
where
    M: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

pub struct SanitizingWriter<W> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W> SanitizingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }
}

impl<W> SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line = self.buffer.drain(..=pos).collect::<Vec<u8>>();
            let line_str = String::from_utf8_lossy(&line);
            self.inner.write_all(sanitize(&line_str).as_bytes())?;
        }
        Ok(())
    }
}

impl<W> std::io::Write for SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // Bound buffering when a formatter emits a huge line with no newline.
        let hard_cap = max_sanitize_bytes().saturating_mul(2);
        if hard_cap > 0 && self.buffer.len() > hard_cap {
            let s = String::from_utf8_lossy(&self.buffer).to_string();
            self.inner.write_all(sanitize(&s).as_bytes())?;
            self.inner.write_all(b"\n[TRUNCATED]\n")?;
            self.buffer.clear();
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;

        if !self.buffer.is_empty() {
            let s = String::from_utf8_lossy(&self.buffer);
            let sanitized = sanitize(&s);
            self.inner.write_all(sanitized.as_bytes())?;
            self.buffer.clear();
        }

        self.inner.flush()
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer())
    }
}
