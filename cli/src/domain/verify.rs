//! Expected-vs-observed comparisons for remote verification.

use crate::domain::config::BodyMatchMode;
use crate::domain::error::VerificationFailed;

/// What an HTTP endpoint must answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpExpectation {
    pub status: u16,
    pub body: String,
    pub mode: BodyMatchMode,
}

impl HttpExpectation {
    #[must_use]
    pub fn exact(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            mode: BodyMatchMode::Exact,
        }
    }

    /// Compare one response against the expectation. The body is trimmed first.
    ///
    /// # Errors
    ///
    /// Returns `VerificationFailed` naming the first mismatch.
    pub fn check(&self, status: u16, body: &str) -> Result<(), VerificationFailed> {
        if status != self.status {
            return Err(VerificationFailed::new(
                "HTTP status",
                self.status.to_string(),
                status.to_string(),
            ));
        }
        let body = body.trim();
        let ok = match self.mode {
            BodyMatchMode::Exact => body == self.body,
            BodyMatchMode::Contains => body.contains(&self.body),
        };
        if ok {
            Ok(())
        } else {
            let what = match self.mode {
                BodyMatchMode::Exact => "HTTP body",
                BodyMatchMode::Contains => "HTTP body containing",
            };
            Err(VerificationFailed::new(
                what,
                format!("{:?}", self.body),
                format!("{body:?}"),
            ))
        }
    }
}

/// Compare remote command output, ignoring surrounding whitespace.
///
/// # Errors
///
/// Returns `VerificationFailed` when the trimmed output differs.
pub fn check_command_output(actual: &str, expected: &str) -> Result<(), VerificationFailed> {
    if actual.trim() == expected {
        Ok(())
    } else {
        Err(VerificationFailed::new(
            "SSH command output",
            format!("{expected:?}"),
            format!("{actual:?}"),
        ))
    }
}

/// `echo -n '<text>'`, safe for any text.
#[must_use]
pub fn echo_command(text: &str) -> String {
    format!("echo -n {}", shell_quote(text))
}

/// Single-quote `s` for a POSIX shell.
#[must_use]
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
