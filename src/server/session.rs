//! Anonymous client identifier cookie
//!
//! Every API caller ends up with an `id` cookie. The value only lets a UI
//! group "my" buckets; it grants nothing and is never checked.

use hyper::header::{HeaderMap, HeaderValue, COOKIE, SET_COOKIE};
use tracing::debug;

use crate::id;
use crate::{DumpError, Result};

use super::response::HttpResponse;

/// Name of the client identifier cookie
pub const COOKIE_NAME: &str = "id";

/// Client identifier attached to an API request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientId {
    /// Presented by the client in a cookie
    Existing(String),
    /// Generated for this request; must be sent back in `Set-Cookie`
    Assigned(String),
}

impl ClientId {
    /// The identifier value
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            ClientId::Existing(id) | ClientId::Assigned(id) => id,
        }
    }

    /// Add the `Set-Cookie` header for a newly assigned id
    ///
    /// # Errors
    ///
    /// Returns error if the cookie cannot be encoded as a header value
    pub fn apply(&self, response: &mut HttpResponse) -> Result<()> {
        if let ClientId::Assigned(id) = self {
            let cookie = HeaderValue::try_from(format!("{COOKIE_NAME}={id}; Path=/"))
                .map_err(|e| DumpError::Other(format!("Invalid cookie value: {e}")))?;
            response.headers_mut().append(SET_COOKIE, cookie);
        }
        Ok(())
    }
}

/// Return the client id from the request cookies, or assign a new one
///
/// # Errors
///
/// Returns error if a `Cookie` header is present but unreadable
pub fn ensure_client_id(headers: &HeaderMap) -> Result<ClientId> {
    if let Some(existing) = read_cookie(headers, COOKIE_NAME)? {
        return Ok(ClientId::Existing(existing));
    }

    let assigned = id::generate();
    debug!("Assigned client id {}", assigned);
    Ok(ClientId::Assigned(assigned))
}

/// Find the first cookie named `name` across all `Cookie` headers
///
/// Malformed pairs belonging to other cookies are skipped.
///
/// # Errors
///
/// Returns error if the `name` pair itself carries bytes outside the
/// cookie value alphabet
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Result<Option<String>> {
    for header in headers.get_all(COOKIE) {
        for pair in header.as_bytes().split(|&b| b == b';') {
            let Some(eq) = pair.iter().position(|&b| b == b'=') else {
                continue;
            };
            let (key, value) = (trim_spaces(&pair[..eq]), trim_spaces(&pair[eq + 1..]));
            if key != name.as_bytes() {
                continue;
            }

            let value = value
                .strip_prefix(b"\"")
                .and_then(|v| v.strip_suffix(b"\""))
                .unwrap_or(value);
            if !value.iter().copied().all(is_cookie_octet) {
                return Err(DumpError::InvalidCookie(format!(
                    "cookie '{name}' has an invalid value"
                )));
            }
            return Ok(Some(value.iter().map(|&b| char::from(b)).collect()));
        }
    }

    Ok(None)
}

fn trim_spaces(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace());
    let end = bytes.iter().rposition(|b| !b.is_ascii_whitespace());
    match (start, end) {
        (Some(start), Some(end)) => &bytes[start..=end],
        _ => &[],
    }
}

/// Bytes allowed in a cookie value: visible ASCII minus `"` `,` `;` `\`
fn is_cookie_octet(b: u8) -> bool {
    matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::response;
    use hyper::StatusCode;

    fn headers_with(cookies: &[&[u8]]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for cookie in cookies {
            headers.append(COOKIE, HeaderValue::from_bytes(cookie).unwrap());
        }
        headers
    }

    #[test]
    fn test_missing_cookie_assigns_id() {
        let client = ensure_client_id(&HeaderMap::new()).unwrap();

        assert!(matches!(client, ClientId::Assigned(_)));
        assert!(id::is_valid(client.value()));
    }

    #[test]
    fn test_existing_cookie_is_reused() {
        let headers = headers_with(&[b"theme=dark; id=abcdefghij; lang=en"]);
        let client = ensure_client_id(&headers).unwrap();

        assert_eq!(client, ClientId::Existing("abcdefghij".to_string()));
    }

    #[test]
    fn test_cookie_across_multiple_headers() {
        let headers = headers_with(&[b"theme=dark", b"id=\"qwertyuiop\""]);

        assert_eq!(
            read_cookie(&headers, COOKIE_NAME).unwrap(),
            Some("qwertyuiop".to_string())
        );
    }

    #[test]
    fn test_similar_names_do_not_match() {
        let headers = headers_with(&[b"sid=abc; idx=def; malformed"]);

        assert_eq!(read_cookie(&headers, COOKIE_NAME).unwrap(), None);
    }

    #[test]
    fn test_unreadable_id_cookie_is_an_error() {
        let cases: [&[u8]; 3] = [b"id=caf\xc3\xa9", b"theme=dark; id=ab,cd", b"id=\xff"];
        for raw in cases {
            let headers = headers_with(&[raw]);

            assert!(matches!(
                ensure_client_id(&headers),
                Err(DumpError::InvalidCookie(_))
            ));
        }
    }

    #[test]
    fn test_malformed_sibling_cookie_is_skipped() {
        let headers = headers_with(&[b"theme=caf\xc3\xa9; id=abcdefghij"]);
        assert_eq!(
            ensure_client_id(&headers).unwrap(),
            ClientId::Existing("abcdefghij".to_string())
        );

        let headers = headers_with(&[b"junk=\xff\xfe", b"id=klmnopqrst"]);
        assert_eq!(
            read_cookie(&headers, COOKIE_NAME).unwrap(),
            Some("klmnopqrst".to_string())
        );
    }

    #[test]
    fn test_malformed_sibling_without_id_assigns() {
        let headers = headers_with(&[b"theme=caf\xc3\xa9"]);

        assert!(matches!(
            ensure_client_id(&headers).unwrap(),
            ClientId::Assigned(_)
        ));
    }

    #[test]
    fn test_apply_sets_cookie_only_when_assigned() {
        let mut response = response::text(StatusCode::OK, "");
        ClientId::Existing("abcdefghij".to_string())
            .apply(&mut response)
            .unwrap();
        assert!(response.headers().get(SET_COOKIE).is_none());

        ClientId::Assigned("klmnopqrst".to_string())
            .apply(&mut response)
            .unwrap();
        assert_eq!(response.headers()[SET_COOKIE], "id=klmnopqrst; Path=/");
    }
}
