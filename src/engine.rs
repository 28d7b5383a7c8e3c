//! The seam between a `Session` and the wire protocol.
//!
//! A `Session` never talks to a socket itself. It asks a [`Connector`]
//! for a [`ProtocolEngine`] and routes every request through it, so the
//! wire implementation can be swapped (the crate ships one over TCP/TLS,
//! tests use an in-process fake).

use errors::*;
use openssl::ssl::{SslConnector, SslMethod, SslStream};
use std::io::{self, Read, Write};
use std::net::TcpStream;

use connection::IMAPConnection;
use Uid;

/// Sequence set covering every message of the selected mailbox.
pub const ALL_MESSAGES: &'static str = "1:*";

/// The part of a message a UID fetch asks for.
#[derive(PartialEq, Clone, Copy)]
#[derive(Debug)]
pub enum Section {
    /// The header section only (`BODY.PEEK[HEADER]`).
    Header,
    /// The complete message content (`BODY.PEEK[]`).
    Full,
}

impl Section {
    pub fn fetch_item(&self) -> &'static str {
        match *self {
            Section::Header => "BODY.PEEK[HEADER]",
            Section::Full => "BODY.PEEK[]",
        }
    }

    /// Name of the section as it comes back in a FETCH response.
    pub fn response_name(&self) -> &'static str {
        match *self {
            Section::Header => "HEADER",
            Section::Full => "",
        }
    }
}

/// Request/response primitives a `Session` needs from an IMAP engine.
///
/// Every call is one blocking round trip. Implementations report
/// transport trouble as `ErrorKind::Connection`, a rejected LOGIN as
/// `ErrorKind::Authentication`, a rejected SELECT as `ErrorKind::Mailbox`
/// and any other rejection as `ErrorKind::Protocol`.
pub trait ProtocolEngine {
    fn login(&mut self, username: &str, password: &str) -> Result<()>;

    fn select(&mut self, mailbox: &str) -> Result<()>;

    /// Total number of messages in `mailbox` (`STATUS mailbox (MESSAGES)`).
    fn status_messages(&mut self, mailbox: &str) -> Result<u32>;

    /// UIDs of the messages in `sequence_set`, in server response order.
    fn fetch_uids(&mut self, sequence_set: &str) -> Result<Vec<Uid>>;

    /// Raw content pieces of `section` for the message with `uid`, in
    /// response order. Empty when the server sent nothing for it.
    fn uid_fetch_section(&mut self, uid: Uid, section: Section) -> Result<Vec<Vec<u8>>>;

    /// Sets the `\Deleted` flag on the message with `uid`.
    fn uid_store_deleted(&mut self, uid: Uid) -> Result<()>;

    fn expunge(&mut self) -> Result<()>;

    fn logout(&mut self) -> Result<()>;
}

/// Opens connections for a `Session`.
pub trait Connector {
    type Engine: ProtocolEngine;

    /// Establishes a connection to `host:port` and consumes the server
    /// greeting, returning an engine ready for LOGIN.
    fn connect(&self, host: &str, port: u16) -> Result<Self::Engine>;
}

#[derive(PartialEq, Clone, Copy)]
#[derive(Debug)]
pub enum Security {
    Plain,
    SSL,
}

impl Security {
    /// Maps the `auth` value of an account configuration.
    pub fn from_auth(auth: &str) -> Result<Security> {
        match auth {
            "Plain" => Ok(Security::Plain),
            "SSL" => Ok(Security::SSL),
            _ => Err("Unknown auth type".into()),
        }
    }
}

trait Duplex: Read + Write {}

impl<T: Read + Write> Duplex for T {}

/// Socket opened by a [`TcpConnector`]: plain TCP or TLS over TCP.
#[derive(Debug)]
pub enum TCPStreamType {
    Plain(TcpStream),
    SSL(SslStream<TcpStream>),
}

impl TCPStreamType {
    fn duplex(&mut self) -> &mut dyn Duplex {
        match *self {
            TCPStreamType::Plain(ref mut tcp) => tcp,
            TCPStreamType::SSL(ref mut tls) => tls,
        }
    }
}

impl Read for TCPStreamType {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.duplex().read(buf)
    }
}

impl Write for TCPStreamType {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.duplex().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.duplex().flush()
    }
}

/// Connects over TCP, optionally wrapped in TLS.
#[derive(Debug)]
pub struct TcpConnector {
    pub security: Security,
}

impl TcpConnector {
    pub fn new(security: Security) -> TcpConnector {
        TcpConnector { security: security }
    }
}

impl Default for TcpConnector {
    fn default() -> TcpConnector {
        TcpConnector::new(Security::Plain)
    }
}

impl Connector for TcpConnector {
    type Engine = IMAPConnection<TCPStreamType>;

    fn connect(&self, host: &str, port: u16) -> Result<Self::Engine> {
        trace!("Initiate IMAP Connection");
        let tcp_stream = TcpStream::connect((host, port))
            .chain_err(|| ErrorKind::Connection(format!("Could not connect to {}:{}", host, port)))?;
        let stream = match self.security {
            Security::Plain => {
                debug!("Creating a Plain TCP Connection");
                TCPStreamType::Plain(tcp_stream)
            }
            Security::SSL => {
                debug!("Creating a SSL Connection");
                let connector = SslConnector::builder(SslMethod::tls())
                    .chain_err(|| ErrorKind::Connection("Could not set up TLS".to_string()))?
                    .build();
                let ssl_stream = connector.connect(host, tcp_stream)
                    .map_err(|e| -> Error {
                        ErrorKind::Connection(format!("TLS handshake with {} failed: {}", host, e)).into()
                    })?;
                TCPStreamType::SSL(ssl_stream)
            }
        };
        trace!("Connection Established");
        IMAPConnection::new(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_names() {
        assert_eq!(Security::from_auth("Plain").unwrap(), Security::Plain);
        assert_eq!(Security::from_auth("SSL").unwrap(), Security::SSL);
        assert!(Security::from_auth("ssl").is_err());
    }

    #[test]
    fn default_is_plain() {
        assert_eq!(TcpConnector::default().security, Security::Plain);
    }

    #[test]
    fn unreachable_server_is_connection_error() {
        let port = {
            let listener = ::std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        match TcpConnector::default().connect("127.0.0.1", port) {
            Err(Error(ErrorKind::Connection(_), _)) => {}
            other => panic!("expected connection error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn tls_handshake_failure_is_connection_error() {
        let listener = ::std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = ::std::thread::spawn(move || {
            let (mut client, _) = listener.accept().unwrap();
            let _ = client.write_all(b"* OK IMAP4rev1 Service Ready\r\n");
        });
        match TcpConnector::new(Security::SSL).connect("127.0.0.1", port) {
            Err(Error(ErrorKind::Connection(_), _)) => {}
            other => panic!("expected connection error, got {:?}", other.map(|_| ())),
        }
        server.join().unwrap();
    }

    #[test]
    fn fetch_items() {
        assert_eq!(Section::Header.fetch_item(), "BODY.PEEK[HEADER]");
        assert_eq!(Section::Full.fetch_item(), "BODY.PEEK[]");
    }
}
