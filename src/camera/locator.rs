//! Source locator sanitization
//!
//! Camera URLs arrive with credentials typed in by hand, e.g.
//! `rtsp://admin:p@ss@10.0.0.5/stream`. The password is stored
//! percent-encoded so the transcoder can parse the authority.

use percent_encoding::{percent_decode_str, percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters escaped in a password, matching `encodeURIComponent`
const PASSWORD: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode the password in a locator's authority
///
/// The userinfo ends at the last `@` before the path, so an unescaped `@`
/// inside the password is handled. The password is decoded before it is
/// encoded, which makes the operation idempotent: an already sanitized
/// locator comes back unchanged, including escapes that are not valid
/// UTF-8. Passwords containing `/` must arrive escaped, since a raw `/`
/// terminates the authority.
///
/// A raw password that happens to contain a valid escape is decoded too:
/// `ab%41` is stored as `abA`. Such a password must be sent as `ab%2541`.
///
/// Locators without a scheme separator, userinfo, or password are returned
/// as-is.
pub fn sanitize_locator(locator: &str) -> String {
    let Some(scheme_end) = locator.find("://") else {
        return locator.to_string();
    };
    let authority_start = scheme_end + 3;
    let rest = &locator[authority_start..];

    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let Some(at) = rest[..authority_end].rfind('@') else {
        return locator.to_string();
    };

    let userinfo = &rest[..at];
    let Some(colon) = userinfo.find(':') else {
        return locator.to_string();
    };

    let user = &userinfo[..colon];
    let password = &userinfo[colon + 1..];
    if password.is_empty() {
        return locator.to_string();
    }

    let decoded: Vec<u8> = percent_decode_str(password).collect();
    let encoded = percent_encode(&decoded, PASSWORD);

    format!(
        "{}{}:{}{}",
        &locator[..authority_start],
        user,
        encoded,
        &rest[at..]
    )
}

/// Strip the password from a locator for logging
pub fn redact_locator(locator: &str) -> String {
    let Some(scheme_end) = locator.find("://") else {
        return locator.to_string();
    };
    let authority_start = scheme_end + 3;
    let rest = &locator[authority_start..];

    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => match rest[..at].find(':') {
            Some(colon) => format!(
                "{}{}:***{}",
                &locator[..authority_start],
                &rest[..colon],
                &rest[at..]
            ),
            None => locator.to_string(),
        },
        None => locator.to_string(),
    }
}
