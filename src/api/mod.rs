pub mod client;
pub mod config;
pub mod error;

pub use client::{ApiClient, ApiRequest, ApiResponse, HttpTransport, Method, Transport};
pub use config::ProviderConfig;
pub use error::{check_unparsed, translate_api_error, ApiError};

/// RFC 3986 percent-encoding for query string values.
pub fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::percent_encode;

    #[test]
    fn reserved_characters_are_escaped() {
        assert_eq!(percent_encode("ops user@example.com"), "ops%20user%40example.com");
        assert_eq!(percent_encode("role+eng=a,b"), "role%2Beng%3Da%2Cb");
        assert_eq!(percent_encode("plain-role_name.v2~x"), "plain-role_name.v2~x");
    }
}
