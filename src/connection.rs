use std::io::{BufRead, BufReader, Read, Write};
use regex::Regex;

use errors::*;
use engine::{ProtocolEngine, Section};
use imapresult::{IMAPResponse, IMAPStatus, IMAPFetch};
use Uid;

static TAG_PREFIX: &'static str = "a";
const CR: u8 = 0x0d;
const LF: u8 = 0x0a;

lazy_static! {
    static ref GREETING: Regex =
        Regex::new(r"(?i)^\* (?P<status>OK|PREAUTH|BYE)\b ?(?P<statustext>.*)").unwrap();
    static ref COMPLETION: Regex =
        Regex::new(r"(?i)^(?P<tag>[^*+ ]\S*) (?P<status>OK|NO|BAD)\b ?(?P<statustext>.*)").unwrap();
    static ref LITERAL: Regex = Regex::new(r"\{(?P<len>\d+)\}$").unwrap();
}

fn quote(value: &str) -> Result<String> {
    if value.contains('\n') || value.contains('\r') {
        bail!(ErrorKind::Protocol("Line break in command argument".to_string()));
    }
    Ok(format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\"")))
}

// INBOX is case-insensitive, every other name is not
fn same_mailbox(a: &str, b: &str) -> bool {
    a == b || (a.eq_ignore_ascii_case("INBOX") && b.eq_ignore_ascii_case("INBOX"))
}

/// A blocking IMAP4rev1 client connection over any byte stream.
#[derive(Debug)]
pub struct IMAPConnection<S: Read + Write> {
    stream: BufReader<S>,
    tag: u32,
}

impl<S: Read + Write> IMAPConnection<S> {
    /// Wraps an established stream and consumes the server greeting.
    pub fn new(stream: S) -> Result<IMAPConnection<S>> {
        let mut conn = IMAPConnection {
            stream: BufReader::new(stream),
            tag: 0,
        };
        conn.read_greeting()?;
        Ok(conn)
    }

    fn read_greeting(&mut self) -> Result<()> {
        trace!("Reading Greeting from Server");
        let greeting = self.read_line()?;
        let caps = match GREETING.captures(&greeting) {
            Some(caps) => caps,
            None => bail!(ErrorKind::Connection(format!("Un-parseable greeting: {}", greeting))),
        };
        match caps["status"].to_uppercase().as_str() {
            "OK" | "PREAUTH" => Ok(()),
            _ => bail!(ErrorKind::Connection(format!("Server refused connection: {}",
                                                     &caps["statustext"]))),
        }
    }

    /// Sends one tagged command and collects its untagged responses.
    ///
    /// A `NO` or `BAD` completion is turned into the error kind built by
    /// `rejected` from the server's explanation.
    fn run_command<F>(&mut self, command: &str, rejected: F) -> Result<Vec<IMAPResponse>>
        where F: FnOnce(String) -> ErrorKind
    {
        let tag = self.create_tag();
        self.write_command(&tag, command)?;

        let mut untagged = Vec::new();
        loop {
            let response = self.read_response()?;
            if response.text.starts_with("* ") {
                untagged.push(response);
                continue;
            }
            if response.text.starts_with('+') {
                bail!(ErrorKind::Protocol(format!("Unexpected continuation: {}", response.text)));
            }

            let caps = match COMPLETION.captures(&response.text) {
                Some(caps) => caps,
                None => bail!(ErrorKind::Protocol(format!("Un-parseable Response: {}", response.text))),
            };
            if &caps["tag"] != tag.as_str() {
                bail!(ErrorKind::Protocol(format!("Completion for unknown tag {}", &caps["tag"])));
            }
            return match caps["status"].to_uppercase().as_str() {
                "OK" => Ok(untagged),
                status => Err(rejected(format!("{} {}", status, &caps["statustext"])).into()),
            };
        }
    }

    /// Reads one complete response, following any literals it announces.
    fn read_response(&mut self) -> Result<IMAPResponse> {
        let mut response = IMAPResponse::default();
        loop {
            let line = self.read_line()?;
            response.text.push_str(&line);
            let len = match LITERAL.captures(&line) {
                Some(cap) => cap["len"].parse::<usize>()
                    .chain_err(|| ErrorKind::Protocol(format!("Bad literal length in: {}", line)))?,
                None => return Ok(response),
            };

            // The announced length is untrusted, only buffer what arrives
            let mut literal = Vec::new();
            (&mut self.stream).take(len as u64).read_to_end(&mut literal)
                .chain_err(|| ErrorKind::Connection("Could not read literal".to_string()))?;
            if literal.len() != len {
                bail!(ErrorKind::Connection("Connection lost inside a literal".to_string()));
            }
            debug!("S: <{} octets>", len);
            response.literals.push(literal);
        }
    }

    fn read_line(&mut self) -> Result<String> {
        let mut buff = Vec::new();
        let read = self.stream.read_until(LF, &mut buff)
            .chain_err(|| ErrorKind::Connection("Could not read from server".to_string()))?;
        if read == 0 {
            bail!(ErrorKind::Connection("Connection closed by server".to_string()));
        }

        // Strip the CRLF, nothing above this layer needs it
        if buff.last() == Some(&LF) {
            buff.pop();
        }
        if buff.last() == Some(&CR) {
            buff.pop();
        }
        let line = String::from_utf8(buff)
            .chain_err(|| ErrorKind::Protocol("Response is not valid UTF-8".to_string()))?;
        info!("S: {}", line);
        Ok(line)
    }

    fn write_command(&mut self, tag: &str, command: &str) -> Result<()> {
        if command.starts_with("LOGIN ") {
            info!("C: {} LOGIN <credentials>", tag);
        } else {
            info!("C: {} {}", tag, command);
        }
        let line = format!("{} {}\r\n", tag, command);
        let stream = self.stream.get_mut();
        let sent = stream.write_all(line.as_bytes()).and_then(|_| stream.flush());
        sent.chain_err(|| ErrorKind::Connection("Could not send command".to_string()))
    }

    fn create_tag(&mut self) -> String {
        self.tag += 1;
        format!("{}{}", TAG_PREFIX, self.tag)
    }
}

impl<S: Read + Write> ProtocolEngine for IMAPConnection<S> {
    fn login(&mut self, username: &str, password: &str) -> Result<()> {
        trace!("Cmd: LOGIN");
        let credentials = quote(username)
            .and_then(|u| quote(password).map(|p| format!("{} {}", u, p)))
            .chain_err(|| ErrorKind::Authentication("Invalid character in credentials".to_string()))?;
        self.run_command(&format!("LOGIN {}", credentials), ErrorKind::Authentication)?;
        Ok(())
    }

    fn select(&mut self, mailbox: &str) -> Result<()> {
        trace!("Cmd: SELECT");
        let name = quote(mailbox)
            .chain_err(|| ErrorKind::Mailbox(format!("Invalid mailbox name {:?}", mailbox)))?;
        self.run_command(&format!("SELECT {}", name),
                         |text| ErrorKind::Mailbox(format!("{}: {}", mailbox, text)))?;
        Ok(())
    }

    fn status_messages(&mut self, mailbox: &str) -> Result<u32> {
        trace!("Cmd: STATUS");
        let name = quote(mailbox)?;
        let responses = self.run_command(&format!("STATUS {} (MESSAGES)", name),
                                         ErrorKind::Protocol)?;
        let status = responses.iter()
            .filter_map(IMAPStatus::parse)
            .find(|status| same_mailbox(&status.mailbox, mailbox));
        match status {
            Some(status) => Ok(status.messages),
            None => bail!(ErrorKind::Protocol(format!("No STATUS data for {}", mailbox))),
        }
    }

    fn fetch_uids(&mut self, sequence_set: &str) -> Result<Vec<Uid>> {
        trace!("Cmd: FETCH");
        let responses = self.run_command(&format!("FETCH {} (UID)", sequence_set),
                                         ErrorKind::Protocol)?;
        Ok(responses.iter()
            .filter_map(IMAPFetch::parse)
            .filter_map(|fetch| fetch.uid)
            .collect())
    }

    fn uid_fetch_section(&mut self, uid: Uid, section: Section) -> Result<Vec<Vec<u8>>> {
        trace!("Cmd: UID FETCH");
        let responses = self.run_command(&format!("UID FETCH {} ({})", uid, section.fetch_item()),
                                         ErrorKind::Protocol)?;
        let mut pieces = Vec::new();
        for fetch in responses.iter().filter_map(IMAPFetch::parse) {
            if fetch.uid.map_or(false, |fetched| fetched != uid) {
                continue;
            }
            pieces.extend(fetch.sections.into_iter()
                .filter(|body| body.section == section.response_name())
                .map(|body| body.content));
        }
        Ok(pieces)
    }

    fn uid_store_deleted(&mut self, uid: Uid) -> Result<()> {
        trace!("Cmd: UID STORE");
        self.run_command(&format!("UID STORE {} +FLAGS.SILENT (\\Deleted)", uid),
                         ErrorKind::Protocol)?;
        Ok(())
    }

    fn expunge(&mut self) -> Result<()> {
        trace!("Cmd: EXPUNGE");
        self.run_command("EXPUNGE", ErrorKind::Protocol)?;
        Ok(())
    }

    fn logout(&mut self) -> Result<()> {
        trace!("Cmd: LOGOUT");
        self.run_command("LOGOUT", ErrorKind::Protocol)?;
        Ok(())
    }
}
