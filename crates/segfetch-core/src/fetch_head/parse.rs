//! Parse HTTP response header lines into HeadInfo.

use super::HeadInfo;

/// Parse collected header lines into HeadInfo.
///
/// When redirects were followed the lines of every response are present; a
/// status line starts a new response, so only the final one is kept.
pub(crate) fn parse_headers(lines: &[String]) -> HeadInfo {
    let mut info = HeadInfo::default();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            info = HeadInfo::default();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                info.content_length = Some(value.to_string());
            }
            if name.eq_ignore_ascii_case("accept-ranges") {
                info.accept_ranges = value.eq_ignore_ascii_case("bytes");
            }
        }
    }

    info
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_headers_content_length_and_ranges() {
        let r = parse_headers(&lines(&[
            "HTTP/1.1 200 OK",
            "Content-Length: 12345",
            "Accept-Ranges: bytes",
        ]));
        assert_eq!(r.content_length.as_deref(), Some("12345"));
        assert!(r.accept_ranges);
    }

    #[test]
    fn parse_headers_case_insensitive() {
        let r = parse_headers(&lines(&["content-length:  77 ", "ACCEPT-RANGES: Bytes"]));
        assert_eq!(r.content_length.as_deref(), Some("77"));
        assert!(r.accept_ranges);
    }

    #[test]
    fn parse_headers_no_ranges() {
        let r = parse_headers(&lines(&["Content-Length: 999", "Accept-Ranges: none"]));
        assert_eq!(r.content_length.as_deref(), Some("999"));
        assert!(!r.accept_ranges);
    }

    #[test]
    fn parse_headers_keeps_only_final_response() {
        let r = parse_headers(&lines(&[
            "HTTP/1.1 302 Found",
            "Content-Length: 0",
            "Location: http://mirror/file",
            "",
            "HTTP/1.1 200 OK",
            "Content-Length: 4096",
        ]));
        assert_eq!(r.content_length.as_deref(), Some("4096"));
        assert!(!r.accept_ranges);
    }

    #[test]
    fn parse_headers_missing_length() {
        let r = parse_headers(&lines(&["HTTP/1.1 200 OK", "Accept-Ranges: bytes"]));
        assert!(r.content_length.is_none());
    }
}
