/// Returned by `Message::get_field` when a field is missing or empty.
pub const NO_INFO: &'static str = "<No info>";

/// Pulls the value of `field_name` out of raw header text.
///
/// Single pass: the first occurrence of `field_name` (case-sensitive) is
/// taken, any directly following `:` and ` ` are skipped, and the value
/// runs up to the next line break. Folded continuation lines are not
/// joined. A missing field or an empty value yields [`NO_INFO`].
pub fn extract_field(header: &str, field_name: &str) -> String {
    if field_name.is_empty() {
        return NO_INFO.to_string();
    }
    let value_start = match header.find(field_name) {
        Some(pos) => pos + field_name.len(),
        None => return NO_INFO.to_string(),
    };

    let rest = header[value_start..].trim_start_matches(|c: char| c == ' ' || c == ':');
    if rest.starts_with('\n') || rest.starts_with("\r\n") {
        return NO_INFO.to_string();
    }

    let value = match rest.find('\n') {
        Some(end) => &rest[..end],
        None => rest,
    };
    let value = value.trim_end_matches('\r');
    if value.is_empty() {
        NO_INFO.to_string()
    } else {
        value.to_string()
    }
}

/// Picks the content of a fetch: the last non-empty piece wins.
pub fn last_non_empty(pieces: Vec<Vec<u8>>) -> String {
    pieces.into_iter()
        .filter(|piece| !piece.is_empty())
        .last()
        .map(|piece| String::from_utf8_lossy(&piece).into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &'static str = "Return-Path: <bob@example.org>\r\n\
                                  From: Bob <bob@example.org>\r\n\
                                  Subject: Lunch on Friday\r\n\
                                  X-Empty:\r\n\
                                  \r\n";

    #[test]
    fn subject_lf() {
        assert_eq!(extract_field("Subject: Hello\n", "Subject"), "Hello");
    }

    #[test]
    fn subject_crlf() {
        assert_eq!(extract_field(HEADER, "Subject"), "Lunch on Friday");
        assert_eq!(extract_field(HEADER, "From"), "Bob <bob@example.org>");
    }

    #[test]
    fn empty_value() {
        assert_eq!(extract_field("Subject:\n", "Subject"), NO_INFO);
        assert_eq!(extract_field(HEADER, "X-Empty"), NO_INFO);
        assert_eq!(extract_field("Subject:   ", "Subject"), NO_INFO);
    }

    #[test]
    fn missing_field() {
        assert_eq!(extract_field(HEADER, "X-Missing"), NO_INFO);
        assert_eq!(extract_field("", "Subject"), NO_INFO);
        assert_eq!(extract_field(HEADER, ""), NO_INFO);
    }

    #[test]
    fn case_sensitive() {
        assert_eq!(extract_field(HEADER, "subject"), NO_INFO);
    }

    #[test]
    fn value_without_trailing_newline() {
        assert_eq!(extract_field("Subject: last line", "Subject"), "last line");
    }

    #[test]
    fn folded_value_keeps_first_line() {
        let folded = "Subject: first part\r\n second part\r\n";
        assert_eq!(extract_field(folded, "Subject"), "first part");
    }

    #[test]
    fn first_occurrence_wins() {
        let header = "Subject: one\nSubject: two\n";
        assert_eq!(extract_field(header, "Subject"), "one");
    }

    #[test]
    fn last_non_empty_piece() {
        let pieces = vec![b"first".to_vec(), b"second".to_vec(), Vec::new()];
        assert_eq!(last_non_empty(pieces), "second");
        assert_eq!(last_non_empty(Vec::new()), "");
        assert_eq!(last_non_empty(vec![Vec::new()]), "");
    }
}
