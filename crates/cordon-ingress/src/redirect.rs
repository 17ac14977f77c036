//! Redirect target validation for public tracking links.
//!
//! Policy: relative path or nothing. Only targets beginning with a
//! single `/` are accepted. Protocol-relative targets (`//…`, and the
//! browser-equivalent `/\…`), absolute URLs, and traversal segments
//! are refused — including absolute URLs to domains we control, since
//! domain allow-lists are themselves a recurring source of bypasses.
//! A blocked attempt is recorded as a security incident by the
//! caller, not silently downgraded.

use crate::error::RedirectViolation;

/// Validate an untrusted redirect target.
pub fn validate_redirect_target(target: &str) -> Result<(), RedirectViolation> {
    if target.is_empty() {
        return Err(RedirectViolation::Empty);
    }
    if !target.starts_with('/') {
        return Err(RedirectViolation::NotRelative);
    }
    // Browsers resolve both "//host" and "/\host" as scheme-relative.
    if target.starts_with("//") || target.starts_with("/\\") {
        return Err(RedirectViolation::ProtocolRelative);
    }
    if target
        .split(['/', '\\'])
        .any(|segment| segment == "..")
    {
        return Err(RedirectViolation::Traversal);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_relative_paths_pass() {
        for target in ["/", "/safe/path", "/courses/42?tab=intro", "/a/b/c#frag"] {
            assert_eq!(validate_redirect_target(target), Ok(()), "{target}");
        }
    }

    #[test]
    fn protocol_relative_is_rejected() {
        for target in ["//evil.example", "//evil.example/path", "/\\evil.example"] {
            assert_eq!(
                validate_redirect_target(target),
                Err(RedirectViolation::ProtocolRelative),
                "{target}"
            );
        }
    }

    #[test]
    fn absolute_urls_are_rejected_even_to_known_domains() {
        for target in [
            "https://evil.example",
            "http://localhost/next",
            "javascript:alert(1)",
            "relative/no/slash",
        ] {
            assert_eq!(
                validate_redirect_target(target),
                Err(RedirectViolation::NotRelative),
                "{target}"
            );
        }
    }

    #[test]
    fn traversal_segments_are_rejected() {
        for target in ["/../x", "/a/../../etc", "/a/..", "/a\\..\\b"] {
            assert_eq!(
                validate_redirect_target(target),
                Err(RedirectViolation::Traversal),
                "{target}"
            );
        }
    }

    #[test]
    fn empty_target_is_rejected() {
        assert_eq!(validate_redirect_target(""), Err(RedirectViolation::Empty));
    }

    #[test]
    fn dot_segments_that_are_not_traversal_pass() {
        for target in ["/a/..b", "/a/b..", "/..a/b"] {
            assert_eq!(validate_redirect_target(target), Ok(()), "{target}");
        }
    }
}
