//! Origin Validator: DNS-rebinding defense for the HTTP and
//! WebSocket transports.
//!
//! Generalized from a fixed localhost/allowlist check into a full
//! decision order: missing origin, localhost, `file://`,
//! `vscode-webview://`, then wildcard pattern match, plus a
//! repeat-offender counter.

use std::collections::HashMap;

use parking_lot::Mutex;

/// Configuration for [`OriginValidator`].
#[derive(Debug, Clone)]
pub struct OriginConfig {
    /// Patterns an origin may match. `*` is a greedy wildcard over any
    /// characters; any other regex metacharacter in a pattern is treated
    /// literally.
    pub allowed_origins: Vec<String>,
    /// Allow `http(s)://localhost`, `http(s)://127.0.0.1`, `http(s)://[::1]`.
    pub allow_localhost: bool,
    /// Allow the `file://` scheme (Electron/desktop clients with no origin
    /// concept).
    pub allow_file_protocol: bool,
    /// Allow the `vscode-webview://` scheme.
    pub allow_vscode_webview: bool,
    /// If true, a request with no `Origin` header at all is denied. If
    /// false, a missing header is allowed outright.
    pub require_origin_header: bool,
    /// If true, denied attempts are logged and counted per origin.
    pub log_unauthorized_attempts: bool,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            allow_localhost: true,
            allow_file_protocol: false,
            allow_vscode_webview: false,
            require_origin_header: false,
            log_unauthorized_attempts: true,
        }
    }
}

/// Number of denied attempts from one origin before an alert line is
/// emitted.
pub const REPEAT_OFFENDER_ALERT_THRESHOLD: u64 = 5;

/// Result of validating one origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginDecision {
    /// Whether the origin is allowed.
    pub allowed: bool,
    /// The origin that was checked, if one was present.
    pub origin: Option<String>,
    /// The allowlist pattern that matched, if the decision came from
    /// pattern matching.
    pub matched_pattern: Option<String>,
    /// Human-readable reason for the decision.
    pub reason: String,
}

fn is_localhost(origin: &str) -> bool {
    const PATTERNS: [&str; 6] = [
        "://localhost",
        "://127.0.0.1",
        "://[::1]",
        "localhost:",
        "127.0.0.1:",
        "[::1]:",
    ];
    PATTERNS.iter().any(|p| origin.contains(p)) || origin.starts_with("localhost")
}

/// Match `text` against a glob `pattern` where `*` matches any run of
/// characters (including empty) and every other character must match
/// literally. No external regex dependency: patterns here are simple
/// origin allowlist entries, not general expressions.
fn glob_match(pattern: &str, text: &str) -> bool {
    let segments: Vec<&str> = pattern.split('*').collect();
    if segments.len() == 1 {
        return pattern == text;
    }

    let mut rest = text;
    for (i, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            continue;
        }
        if i == 0 {
            if !rest.starts_with(segment) {
                return false;
            }
            rest = &rest[segment.len()..];
        } else if i == segments.len() - 1 {
            if !rest.ends_with(segment) {
                return false;
            }
        } else {
            match rest.find(segment) {
                Some(pos) => rest = &rest[pos + segment.len()..],
                None => return false,
            }
        }
    }
    true
}

/// Validates request origins and tracks repeat offenders.
#[derive(Debug)]
pub struct OriginValidator {
    config: OriginConfig,
    offenders: Mutex<HashMap<String, u64>>,
}

impl OriginValidator {
    /// New validator with the given configuration.
    pub fn new(config: OriginConfig) -> Self {
        Self {
            config,
            offenders: Mutex::new(HashMap::new()),
        }
    }

    /// Evaluate one origin header value (`None` if the header was absent)
    /// against the full decision order: missing-origin policy, localhost,
    /// `file://`, `vscode-webview://`, allowlist pattern match, deny.
    pub fn validate(&self, origin: Option<&str>) -> OriginDecision {
        let Some(origin) = origin else {
            return if self.config.require_origin_header {
                self.deny(None, "missing Origin header and one is required".into())
            } else {
                OriginDecision {
                    allowed: true,
                    origin: None,
                    matched_pattern: None,
                    reason: "no Origin header; not required".into(),
                }
            };
        };

        if self.config.allow_localhost && is_localhost(origin) {
            return self.allow(origin, None, "localhost origin".into());
        }
        if self.config.allow_file_protocol && origin.starts_with("file://") {
            return self.allow(origin, None, "file:// origin".into());
        }
        if self.config.allow_vscode_webview && origin.starts_with("vscode-webview://") {
            return self.allow(origin, None, "vscode-webview:// origin".into());
        }

        for pattern in &self.config.allowed_origins {
            if glob_match(pattern, origin) {
                return self.allow(origin, Some(pattern.clone()), "matched allowlist pattern".into());
            }
        }

        self.deny(Some(origin.to_string()), format!("origin '{origin}' not in allowlist"))
    }

    fn allow(&self, origin: &str, matched_pattern: Option<String>, reason: String) -> OriginDecision {
        OriginDecision {
            allowed: true,
            origin: Some(origin.to_string()),
            matched_pattern,
            reason,
        }
    }

    fn deny(&self, origin: Option<String>, reason: String) -> OriginDecision {
        if self.config.log_unauthorized_attempts {
            let key = origin.clone().unwrap_or_else(|| "<missing>".to_string());
            let mut offenders = self.offenders.lock();
            let count = offenders.entry(key.clone()).or_insert(0);
            *count += 1;
            let count = *count;
            tracing::warn!(origin = %key, reason = %reason, "origin denied");
            if count >= REPEAT_OFFENDER_ALERT_THRESHOLD {
                tracing::error!(origin = %key, attempts = count, "repeat offender: origin denied {count} times");
            }
        }
        OriginDecision {
            allowed: false,
            origin,
            matched_pattern: None,
            reason,
        }
    }

    /// How many times an origin has been denied so far.
    pub fn offense_count(&self, origin: &str) -> u64 {
        self.offenders.lock().get(origin).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_origin_allowed_when_not_required() {
        let v = OriginValidator::new(OriginConfig::default());
        assert!(v.validate(None).allowed);
    }

    #[test]
    fn missing_origin_denied_when_required() {
        let v = OriginValidator::new(OriginConfig {
            require_origin_header: true,
            ..Default::default()
        });
        assert!(!v.validate(None).allowed);
    }

    #[test]
    fn localhost_allowed_by_default() {
        let v = OriginValidator::new(OriginConfig::default());
        assert!(v.validate(Some("http://localhost:3000")).allowed);
        assert!(v.validate(Some("https://127.0.0.1:8080")).allowed);
    }

    #[test]
    fn file_protocol_denied_unless_enabled() {
        let v = OriginValidator::new(OriginConfig::default());
        assert!(!v.validate(Some("file:///home/user/app")).allowed);

        let v = OriginValidator::new(OriginConfig {
            allow_file_protocol: true,
            ..Default::default()
        });
        assert!(v.validate(Some("file:///home/user/app")).allowed);
    }

    #[test]
    fn vscode_webview_requires_explicit_opt_in() {
        let v = OriginValidator::new(OriginConfig::default());
        assert!(!v.validate(Some("vscode-webview://abc123")).allowed);

        let v = OriginValidator::new(OriginConfig {
            allow_vscode_webview: true,
            ..Default::default()
        });
        assert!(v.validate(Some("vscode-webview://abc123")).allowed);
    }

    #[test]
    fn wildcard_pattern_matches() {
        let v = OriginValidator::new(OriginConfig {
            allowed_origins: vec!["https://*.trusted.example".to_string()],
            allow_localhost: false,
            ..Default::default()
        });
        let decision = v.validate(Some("https://app.trusted.example"));
        assert!(decision.allowed);
        assert_eq!(decision.matched_pattern.as_deref(), Some("https://*.trusted.example"));
        assert!(!v.validate(Some("https://evil.example")).allowed);
    }

    #[test]
    fn unmatched_origin_is_denied() {
        let v = OriginValidator::new(OriginConfig {
            allow_localhost: false,
            ..Default::default()
        });
        assert!(!v.validate(Some("https://evil.example")).allowed);
    }

    #[test]
    fn repeat_offenders_are_counted() {
        let v = OriginValidator::new(OriginConfig {
            allow_localhost: false,
            ..Default::default()
        });
        for _ in 0..4 {
            v.validate(Some("https://evil.example"));
        }
        assert_eq!(v.offense_count("https://evil.example"), 4);
        v.validate(Some("https://evil.example"));
        assert_eq!(v.offense_count("https://evil.example"), 5);
    }
}
