use regex::Regex;
use std::io::{self, Write};
use std::sync::Arc;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Default filter when `RUST_LOG` is unset and `DEBUG_MODE` is off
const DEFAULT_FILTER: &str = "terascan_core=info,terascan_transport_telegram=info,terascan_telegram_bot=info,teloxide=warn,grammers_client=warn,grammers_mtsender=warn,hyper=warn,reqwest=warn";

/// Regex patterns for redacting secrets from log lines
pub struct RedactionPatterns {
    token_url: Regex,
    token_bare: Regex,
    token_prefixed: Regex,
    api_hash_assignment: Regex,
    api_hash_bare: Regex,
}

impl RedactionPatterns {
    /// Compile all patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            token_url: Regex::new(r"(https?://[^/]+/bot)([0-9]+:[A-Za-z0-9_-]+)(/['\s]*)")?,
            token_bare: Regex::new(r"([0-9]{8,10}:[A-Za-z0-9_-]{35})")?,
            token_prefixed: Regex::new(r"(bot[0-9]{8,10}:)[A-Za-z0-9_-]+")?,
            api_hash_assignment: Regex::new(r#"(?i)(api_hash["']?\s*[:=]\s*["']?)[^\s"'&,}]+"#)?,
            api_hash_bare: Regex::new(r"\b[0-9a-f]{32}\b")?,
        })
    }

    /// Mask bot tokens and MTProto api hashes
    #[must_use]
    pub fn redact(&self, input: &str) -> String {
        let output = self
            .token_url
            .replace_all(input, "$1[TELEGRAM_TOKEN]$3");
        let output = self.token_bare.replace_all(&output, "[TELEGRAM_TOKEN]");
        let output = self
            .token_prefixed
            .replace_all(&output, "$1[TELEGRAM_TOKEN]");
        let output = self
            .api_hash_assignment
            .replace_all(&output, "$1[MASKED]");
        self.api_hash_bare
            .replace_all(&output, "[MASKED]")
            .into_owned()
    }
}

/// Writer that masks secrets before forwarding to `inner`
pub struct RedactingWriter<W: Write> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let redacted = self.patterns.redact(&s);
        self.inner.write_all(redacted.as_bytes())?;
        // Report the original length; the redacted text may differ in size
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// `MakeWriter` wrapping another writer factory with redaction
pub struct RedactingMakeWriter<F> {
    make_inner: F,
    patterns: Arc<RedactionPatterns>,
}

impl<F> RedactingMakeWriter<F> {
    /// Wrap a writer factory
    pub const fn new(make_inner: F, patterns: Arc<RedactionPatterns>) -> Self {
        Self {
            make_inner,
            patterns,
        }
    }
}

impl<'a, F, W> tracing_subscriber::fmt::MakeWriter<'a> for RedactingMakeWriter<F>
where
    F: Fn() -> W + 'static,
    W: Write,
{
    type Writer = RedactingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            inner: (self.make_inner)(),
            patterns: self.patterns.clone(),
        }
    }
}

/// Filter from `RUST_LOG`, else `debug` in debug mode, else the default set
#[must_use]
pub fn env_filter(debug_mode: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug_mode {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new(DEFAULT_FILTER)
        }
    })
}

/// Install the global subscriber writing redacted lines to stderr.
///
/// `DEBUG_MODE=true` (or `1`) switches the default filter to `debug`.
pub fn init_logging(patterns: Arc<RedactionPatterns>) {
    let make_writer = RedactingMakeWriter::new(io::stderr, patterns);
    let debug_mode = std::env::var("DEBUG_MODE")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);

    tracing_subscriber::registry()
        .with(env_filter(debug_mode))
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> RedactionPatterns {
        RedactionPatterns::new().expect("patterns compile")
    }

    #[test]
    fn test_bot_token_in_url_is_masked() {
        let line = "POST https://api.telegram.org/bot123456789:AAF1SWxvbr7LD1sy_PJg5ShcBhY9aLUQEss/sendMessage";
        let redacted = patterns().redact(line);
        assert!(!redacted.contains("AAF1SWxvbr7LD1sy"));
        assert!(redacted.contains("[TELEGRAM_TOKEN]"));
    }

    #[test]
    fn test_api_hash_is_masked() {
        let p = patterns();
        let redacted = p.redact(r#"HistorySettings { api_id: 1, api_hash: "hunter2" }"#);
        assert_eq!(redacted, r#"HistorySettings { api_id: 1, api_hash: "[MASKED]" }"#);

        let redacted = p.redact("API_HASH=e4585a30e42079fef123da0c70b5e5a6 loaded");
        assert!(!redacted.contains("e4585a30"));

        let redacted = p.redact("hash e4585a30e42079fef123da0c70b5e5a6");
        assert_eq!(redacted, "hash [MASKED]");
    }

    #[test]
    fn test_plain_lines_untouched() {
        let line = "Chat list loaded operator=42 chats=17";
        assert_eq!(patterns().redact(line), line);
    }

    #[test]
    fn test_writer_reports_original_length() {
        let mut writer = RedactingWriter {
            inner: Vec::new(),
            patterns: Arc::new(patterns()),
        };
        let line = b"api_hash=abcdef\n";
        assert_eq!(writer.write(line).expect("write to vec"), line.len());
        assert_eq!(writer.inner, b"api_hash=[MASKED]\n");
    }
}
