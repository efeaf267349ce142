const BOM: &[u8] = b"\xEF\xBB\xBF";

pub fn strip_bom(line: &[u8]) -> &[u8] { line.strip_prefix(BOM).unwrap_or(line) }

/// `line` as text, or `None` when it can't be a manifest line: NUL or other
/// control bytes, or bytes that are not valid UTF-8.
pub fn text_line(line: &[u8]) -> Option<&str> {
    let has_control = line
        .iter()
        .any(|&b| b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r' | 0x0C));
    if has_control {
        return None;
    }
    std::str::from_utf8(line).ok()
}

pub fn is_binary_line(line: &[u8]) -> bool { text_line(line).is_none() }

pub fn is_comment_line(line: &[u8]) -> bool { matches!(line.first(), Some(b';' | b'#')) }

pub fn is_blank_line(line: &[u8]) -> bool { matches!(line.first(), None | Some(b'\r' | b'\n')) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_detection() {
        assert!(!is_binary_line(b"file.txt DEADBEEF\r\n"));
        assert!(!is_binary_line("вложение.txt 00000000\n".as_bytes()));
        assert!(is_binary_line(b"MZ\x00\x01"));
        assert!(is_binary_line(b"\xFF\xFEa\x00"));
        assert!(is_binary_line(b"caf\xE9 00000000\n"));
        assert_eq!(text_line(b"a 00000000\n"), Some("a 00000000\n"));
    }

    #[test]
    fn test_bom_and_comments() {
        assert_eq!(strip_bom(b"\xEF\xBB\xBF; hi"), b"; hi");
        assert_eq!(strip_bom(b"; hi"), b"; hi");
        assert!(is_comment_line(b"; hi"));
        assert!(is_comment_line(b"# hi"));
        assert!(!is_comment_line(b"hi ; there"));
        assert!(is_blank_line(b"\r\n"));
        assert!(!is_blank_line(b" x"));
    }
}
