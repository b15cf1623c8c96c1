use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Patterns for values that must never reach the logs verbatim.
pub struct PiiRegexRegistry;

impl PiiRegexRegistry {
    /// Compact JWT: header starts with `{"` (`eyJ`), three base64url segments
    pub fn jwt() -> &'static Regex {
        static JWT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
            #[allow(clippy::unwrap_used)]
            Regex::new(r"eyJ[A-Za-z0-9_-]*\.[A-Za-z0-9_-]*\.[A-Za-z0-9_-]*").unwrap()
        });
        &JWT_REGEX
    }

    pub fn email() -> &'static Regex {
        static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
            #[allow(clippy::unwrap_used)]
            Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{1,}\b").unwrap()
        });
        &EMAIL_REGEX
    }

    /// Opaque base64 or base64url run of at least 16 characters
    pub fn opaque_token() -> &'static Regex {
        static OPAQUE_TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
            #[allow(clippy::unwrap_used)]
            Regex::new(r"\b[A-Za-z0-9+/_-]{16,}={0,2}").unwrap()
        });
        &OPAQUE_TOKEN_REGEX
    }
}

/// Mask tokens and emails in free text.
///
/// JWTs go first so their segments are not half-matched by the opaque token
/// pattern. Emails keep the first character of the local part and the domain.
pub fn redact(input: &str) -> String {
    let without_jwts = PiiRegexRegistry::jwt().replace_all(input, "[REDACTED_JWT]");

    let without_emails =
        PiiRegexRegistry::email().replace_all(&without_jwts, |caps: &regex::Captures| {
            mask_email(&caps[0])
        });

    PiiRegexRegistry::opaque_token()
        .replace_all(&without_emails, "[REDACTED_TOKEN]")
        .to_string()
}

fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => match local.chars().next() {
            Some(first) => format!("{first}***@{domain}"),
            None => format!("@{domain}"),
        },
        None => email.to_string(),
    }
}

/// Displays its contents through [`redact`].
pub struct Redacted<'a>(pub &'a str);

impl fmt::Display for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&redact(self.0))
    }
}

impl fmt::Debug for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&redact(self.0))
    }
}
