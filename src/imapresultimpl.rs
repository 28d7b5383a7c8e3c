use imapresult::{IMAPResponse, IMAPStatus, IMAPFetch, BodySection};
use regex::Regex;


lazy_static! {
    static ref STATUS_REGEX: Regex =
        Regex::new(r"(?i)^\* STATUS (?P<mailbox>.+) \((?P<items>[^)]*)\)\s*$").unwrap();
    static ref MESSAGES_REGEX: Regex = Regex::new(r"(?i)\bMESSAGES (?P<count>\d+)").unwrap();
    static ref FETCH_REGEX: Regex = Regex::new(r"(?i)^\* \d+ FETCH \(").unwrap();
    static ref UID_REGEX: Regex = Regex::new(r"(?i)[( ]UID (?P<uid>\d+)").unwrap();
    static ref SECTION_REGEX: Regex = Regex::new(
        r#"(?i)BODY\[(?P<section>[^\]]*)\](?:<\d+>)? (?P<value>\{\d+\}|NIL|"(?:[^"\\]|\\.)*")"#
    ).unwrap();
    static ref LITERAL_REGEX: Regex = Regex::new(r"\{\d+\}").unwrap();
}

fn unquote(quoted: &str) -> String {
    let inner = if quoted.len() >= 2 && quoted.starts_with('"') && quoted.ends_with('"') {
        &quoted[1..quoted.len() - 1]
    } else {
        quoted
    };
    let mut out = String::with_capacity(inner.len());
    let mut escaped = false;
    for c in inner.chars() {
        if escaped || c != '\\' {
            out.push(c);
            escaped = false;
        } else {
            escaped = true;
        }
    }
    out
}

impl IMAPStatus {
    pub fn parse(response: &IMAPResponse) -> Option<IMAPStatus> {
        let status_cap = STATUS_REGEX.captures(&response.text)?;
        let count_cap = MESSAGES_REGEX.captures(&status_cap["items"])?;
        Some(IMAPStatus {
            mailbox: unquote(&status_cap["mailbox"]),
            messages: count_cap["count"].parse::<u32>().ok()?,
        })
    }
}

impl IMAPFetch {
    pub fn parse(response: &IMAPResponse) -> Option<IMAPFetch> {
        if !FETCH_REGEX.is_match(&response.text) {
            return None;
        }
        let uid = UID_REGEX.captures(&response.text)
            .and_then(|cap| cap["uid"].parse::<u32>().ok());

        let mut sections = Vec::new();
        for cap in SECTION_REGEX.captures_iter(&response.text) {
            let value = match cap.name("value") {
                Some(value) => value,
                None => continue,
            };
            let content = if value.as_str().starts_with('{') {
                // Literals are stored in the order their markers appear
                let index = LITERAL_REGEX.find_iter(&response.text[..value.start()]).count();
                match response.literals.get(index) {
                    Some(literal) => literal.clone(),
                    None => continue,
                }
            } else if value.as_str().eq_ignore_ascii_case("NIL") {
                Vec::new()
            } else {
                unquote(value.as_str()).into_bytes()
            };
            sections.push(BodySection {
                section: cap["section"].to_uppercase(),
                content: content,
            });
        }

        Some(IMAPFetch {
            uid: uid,
            sections: sections,
        })
    }
}
