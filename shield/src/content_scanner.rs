//! Response content scanning (§4.8: "run the content scanner (heuristic
//! patterns for obvious script injection and phishing forms); on severity
//! High, replace body with a block page and set status to 403").

use regex::RegexSet;

/// How concerning a scan result is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Nothing matched.
    None,
    /// A pattern matched that's often benign (e.g. an inline `<script>` with
    /// no suspicious payload).
    Low,
    /// Multiple suspicious patterns, or one moderately convincing one.
    Medium,
    /// A pattern strongly indicative of injected malicious script or a
    /// credential-phishing form; the response should be blocked outright.
    High,
}

/// The minimal block page substituted in for a `Severity::High` response.
pub const BLOCK_PAGE_BODY: &str =
    "<!DOCTYPE html><html><head><title>Blocked</title></head><body><h1>This page was blocked</h1><p>Content matching known malicious patterns was removed.</p></body></html>";

/// Heuristic pattern scanner. Not a substitute for a real antivirus/signature
/// engine — catches the same class of obvious, low-effort injection and
/// phishing patterns a browser's built-in heuristic filters look for.
pub struct ContentScanner {
    high: RegexSet,
    medium: RegexSet,
}

impl Default for ContentScanner {
    fn default() -> Self {
        let high = RegexSet::new([
            r"(?i)document\.write\s*\(\s*unescape\s*\(",
            r"(?i)<script[^>]*>[^<]*\beval\s*\(\s*atob\s*\(",
            r#"(?i)<form[^>]+action\s*=\s*["'][^"']*\.(?:tk|top|xyz)[/"']"#,
            r"(?i)\bfromCharCode\s*\(\s*(?:\d+\s*,\s*){10,}",
        ])
        .expect("static regex patterns are valid");
        let medium = RegexSet::new([
            r#"(?i)<input[^>]+type\s*=\s*["']password["'][^>]*>.*<input[^>]+type\s*=\s*["']password["']"#,
            r"(?i)<iframe[^>]+style\s*=\s*[\"'][^\"']*display\s*:\s*none",
        ])
        .expect("static regex patterns are valid");
        Self { high, medium }
    }
}

impl ContentScanner {
    /// Scan an HTML (or other text) response body for injection/phishing
    /// heuristics, returning the highest severity any pattern matched at.
    pub fn scan(&self, body: &str) -> Severity {
        if self.high.is_match(body) {
            Severity::High
        } else if self.medium.is_match(body) {
            Severity::Medium
        } else {
            Severity::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_body_scans_as_none() {
        let scanner = ContentScanner::default();
        assert_eq!(scanner.scan("<html><body><h1>Hello</h1></body></html>"), Severity::None);
    }

    #[test]
    fn obfuscated_eval_scans_as_high() {
        let scanner = ContentScanner::default();
        let body = "<script>eval(atob('ZG9jdW1lbnQ='))</script>";
        assert_eq!(scanner.scan(body), Severity::High);
    }

    #[test]
    fn duplicate_password_fields_scan_as_medium() {
        let scanner = ContentScanner::default();
        let body = r#"<input type="password" name="a"><input type="password" name="b">"#;
        assert_eq!(scanner.scan(body), Severity::Medium);
    }
}
