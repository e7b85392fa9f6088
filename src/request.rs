use std::net::{IpAddr, SocketAddr};

/// The parts of an HTTP request recorded by `http.request.v1`.
///
/// Headers and form values are multi-maps kept as ordered `(name, value)`
/// pairs; repeated names are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    /// Query string without the leading `?`.
    pub raw_query: String,
    /// Peer address, usually `host:port`.
    pub remote_addr: String,
    pub headers: Vec<(String, String)>,
    /// Parsed form body, when the request carried one.
    pub post_form: Option<Vec<(String, String)>>,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        HttpRequest {
            method: method.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_query(mut self, raw_query: impl Into<String>) -> Self {
        self.raw_query = raw_query.into();
        self
    }

    pub fn with_remote_addr(mut self, remote_addr: impl Into<String>) -> Self {
        self.remote_addr = remote_addr.into();
        self
    }

    /// Append a header value; earlier values for the same name are kept.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Append a posted form value.
    pub fn with_form_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.post_form
            .get_or_insert_with(Vec::new)
            .push((name.into(), value.into()));
        self
    }

    /// Set the posted form from an `application/x-www-form-urlencoded` body.
    pub fn with_form_body(mut self, body: &str) -> Self {
        self.post_form = Some(parse_urlencoded(body));
        self
    }

    /// Decoded query parameters in the order they appear.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        parse_urlencoded(&self.raw_query)
    }

    /// Client address with any port removed.
    pub fn client_ip(&self) -> &str {
        strip_port(&self.remote_addr)
    }
}

/// Decode `application/x-www-form-urlencoded` data.
///
/// `+` decodes to a space. Pairs that do not decode to UTF-8 are skipped.
pub fn parse_urlencoded(input: &str) -> Vec<(String, String)> {
    input
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            Some((decode_component(key)?, decode_component(value)?))
        })
        .collect()
}

fn decode_component(raw: &str) -> Option<String> {
    let raw = raw.replace('+', " ");
    urlencoding::decode(&raw).ok().map(|s| s.into_owned())
}

/// Remove the port from a `host:port` address.
///
/// Handles bracketed IPv6 (`[::1]:8080`) and leaves bare IPv4/IPv6
/// addresses untouched.
pub fn strip_port(addr: &str) -> &str {
    if addr.parse::<IpAddr>().is_ok() {
        return addr;
    }
    if let Ok(sock) = addr.parse::<SocketAddr>() {
        return match sock {
            SocketAddr::V4(_) => addr.rsplit_once(':').map_or(addr, |(host, _)| host),
            SocketAddr::V6(_) => addr
                .rsplit_once("]:")
                .map_or(addr, |(host, _)| host.trim_start_matches('[')),
        };
    }
    if let Some(rest) = addr.strip_prefix('[') {
        // [host] or [host]:port with a non-numeric host
        return rest.split_once(']').map_or(addr, |(host, _)| host);
    }
    match addr.rsplit_once(':') {
        Some((host, _)) if !host.contains(':') => host,
        _ => addr,
    }
}

/// Canonical MIME header name: first letter and each letter after `-`
/// upper-cased, the rest lower-cased (`x-test` becomes `X-Test`).
///
/// Names containing bytes outside the HTTP token set are returned as-is.
pub fn canonical_header_key(name: &str) -> String {
    if !name.bytes().all(is_token_byte) {
        return name.to_string();
    }
    let mut upper = true;
    name.chars()
        .map(|c| {
            let out = if upper { c.to_ascii_uppercase() } else { c.to_ascii_lowercase() };
            upper = c == '-';
            out
        })
        .collect()
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_port_variants() {
        assert_eq!(strip_port("1.2.3.4:1234"), "1.2.3.4");
        assert_eq!(strip_port("1.2.3.4"), "1.2.3.4");
        assert_eq!(strip_port("[::1]:8080"), "::1");
        assert_eq!(strip_port("[fe80::1%eth0]:80"), "fe80::1%eth0");
        assert_eq!(strip_port("::1"), "::1");
        assert_eq!(strip_port("2001:db8::1"), "2001:db8::1");
        assert_eq!(strip_port("localhost:3000"), "localhost");
        assert_eq!(strip_port(""), "");
    }

    #[test]
    fn parse_urlencoded_decodes() {
        assert_eq!(
            parse_urlencoded("foo=bar&q=a+b%26c&empty=&flag&&x=%E2%9C%93"),
            vec![
                ("foo".to_string(), "bar".to_string()),
                ("q".to_string(), "a b&c".to_string()),
                ("empty".to_string(), String::new()),
                ("flag".to_string(), String::new()),
                ("x".to_string(), "\u{2713}".to_string()),
            ]
        );
        assert!(parse_urlencoded("").is_empty());
    }

    #[test]
    fn parse_urlencoded_skips_invalid_utf8() {
        assert_eq!(parse_urlencoded("bad=%FF&ok=1"), vec![("ok".to_string(), "1".to_string())]);
    }

    #[test]
    fn canonical_header_keys() {
        assert_eq!(canonical_header_key("x-test"), "X-Test");
        assert_eq!(canonical_header_key("CONTENT-TYPE"), "Content-Type");
        assert_eq!(canonical_header_key("accept"), "Accept");
        assert_eq!(canonical_header_key("X Bad"), "X Bad");
        assert_eq!(canonical_header_key("x-b\u{e9}"), "x-b\u{e9}");
    }

    #[test]
    fn form_values_accumulate() {
        let req = HttpRequest::new("POST", "/")
            .with_form_value("a", "1")
            .with_form_value("a", "2");
        assert_eq!(req.post_form.unwrap().len(), 2);
    }
}
