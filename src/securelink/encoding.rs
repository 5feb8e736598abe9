//! Percent-encoding of request paths.
//!
//! Links are signed and evaluated over the decoded path; only the wire form
//! is percent-encoded.

use std::borrow::Cow;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Bytes escaped in a path: everything except unreserved characters and the
/// sub-delimiters that are legal in path segments. `?` and `#` stay escaped.
const PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b',')
    .remove(b'/')
    .remove(b':')
    .remove(b';')
    .remove(b'=')
    .remove(b'@');

/// Decode a raw request path.
///
/// Paths that do not decode to UTF-8 are returned unchanged.
pub fn decode_path(raw: &str) -> Cow<'_, str> {
    percent_decode_str(raw)
        .decode_utf8()
        .unwrap_or(Cow::Borrowed(raw))
}

/// Encode a decoded path for the wire.
pub fn encode_path(path: &str) -> String {
    utf8_percent_encode(path, PATH).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_escapes() {
        assert_eq!(decode_path("/foo%20bar"), "/foo bar");
        assert_eq!(decode_path("/na%C3%AFve"), "/naïve");
        assert!(matches!(decode_path("/plain/path"), Cow::Borrowed(_)));
    }

    #[test]
    fn invalid_utf8_is_kept_raw() {
        assert_eq!(decode_path("/bad%FF"), "/bad%FF");
    }

    #[test]
    fn encodes_for_the_wire() {
        assert_eq!(encode_path("/foo bar"), "/foo%20bar");
        assert_eq!(encode_path("/naïve"), "/na%C3%AFve");
        assert_eq!(encode_path("/a?b#c"), "/a%3Fb%23c");
        assert_eq!(encode_path("/a-b_c.d~e/f:g@h;i=j,k+l&m$n"), "/a-b_c.d~e/f:g@h;i=j,k+l&m$n");
        assert_eq!(encode_path("/100%"), "/100%25");
    }
}
