//! Minimal RFC 4180 line codec for partition files.
//!
//! Rows never span lines: asset ids reject whitespace and source names are
//! fixed slugs, so the reader works line by line.

/// Quote a field when it contains a separator, quote or line break.
pub(crate) fn encode_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}

pub(crate) fn encode_line<'a>(fields: impl IntoIterator<Item = &'a str>) -> String {
    let mut line = fields
        .into_iter()
        .map(encode_field)
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

/// Split one line into fields. Returns `None` for an unterminated quote,
/// which is what a row cut off mid-append looks like.
pub(crate) fn decode_line(line: &str) -> Option<Vec<String>> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match (ch, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            ('"', true) => in_quotes = false,
            ('"', false) if current.is_empty() => in_quotes = true,
            (',', false) => fields.push(std::mem::take(&mut current)),
            (other, _) => current.push(other),
        }
    }

    if in_quotes {
        return None;
    }
    fields.push(current);
    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_fields_are_not_quoted() {
        assert_eq!(encode_line(["a", "b", "1.5"]), "a,b,1.5\n");
    }

    #[test]
    fn special_fields_are_quoted_and_decoded() {
        let line = encode_line(["x,y", "say \"hi\"", ""]);
        assert_eq!(line, "\"x,y\",\"say \"\"hi\"\"\",\n");
        let fields = decode_line(line.trim_end_matches('\n')).expect("decode");
        assert_eq!(fields, vec!["x,y", "say \"hi\"", ""]);
    }

    #[test]
    fn crlf_lines_decode() {
        let fields = decode_line("a,b\r").expect("decode");
        assert_eq!(fields, vec!["a", "b"]);
    }

    #[test]
    fn unterminated_quote_is_rejected() {
        assert_eq!(decode_line("a,\"b"), None);
    }
}
