use core::str::FromStr;

use warden_core::{DomainError, ValueObject};

/// Number of `.`-separated segments in a compact JWS (header.payload.signature).
const SEGMENTS: usize = 3;

/// A syntactically well-formed bearer token.
///
/// Only the shape is checked here: non-empty, exactly three non-empty
/// segments. Whether the token is *valid* is the verifier's decision.
///
/// `Display` and `Debug` never print the token itself.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn parse(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(DomainError::validation("token must not be empty"));
        }

        let segments: Vec<&str> = raw.split('.').collect();
        if segments.len() != SEGMENTS {
            return Err(DomainError::invalid_format(format!(
                "token must have {SEGMENTS} dot-separated segments, found {}",
                segments.len()
            )));
        }
        if segments.iter().any(|s| s.is_empty()) {
            return Err(DomainError::invalid_format("token segments must not be empty"));
        }

        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl ValueObject for BearerToken {}

impl FromStr for BearerToken {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl core::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

impl core::fmt::Display for BearerToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("<redacted>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn three_segments_parse() {
        let token = BearerToken::parse("eyJhbGciOiJIUzI1NiJ9.e30.xyz").unwrap();
        assert_eq!(token.as_str(), "eyJhbGciOiJIUzI1NiJ9.e30.xyz");
    }

    #[test]
    fn single_segment_is_a_format_error() {
        let err = BearerToken::parse("abc").unwrap_err();
        assert!(err.is_format_error());
    }

    #[test]
    fn empty_is_rejected() {
        let err = BearerToken::parse("").unwrap_err();
        assert_eq!(err, DomainError::validation("token must not be empty"));
    }

    #[test]
    fn empty_segments_are_rejected() {
        assert!(BearerToken::parse("a..c").is_err());
        assert!(BearerToken::parse(".b.c").is_err());
        assert!(BearerToken::parse("a.b.").is_err());
    }

    #[test]
    fn equality_follows_the_string() {
        let a: BearerToken = "a.b.c".parse().unwrap();
        let b: BearerToken = "a.b.c".parse().unwrap();
        let c: BearerToken = "a.b.d".parse().unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn formatting_redacts() {
        let token = BearerToken::parse("secret.secret.secret").unwrap();
        assert!(!format!("{token}").contains("secret"));
        assert!(!format!("{token:?}").contains("secret"));
    }

    proptest! {
        #[test]
        fn well_formed_tokens_round_trip(
            a in "[A-Za-z0-9_-]{1,24}",
            b in "[A-Za-z0-9_-]{1,24}",
            c in "[A-Za-z0-9_-]{1,24}",
        ) {
            let raw = format!("{a}.{b}.{c}");
            let token = BearerToken::parse(raw.clone()).unwrap();
            prop_assert_eq!(token.as_str(), raw.as_str());
        }

        #[test]
        fn fewer_than_three_segments_never_parse(
            parts in prop::collection::vec("[A-Za-z0-9_-]{1,16}", 1..3),
        ) {
            let raw = parts.join(".");
            prop_assert!(BearerToken::parse(raw).is_err());
        }
    }
}
