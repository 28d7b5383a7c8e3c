#[cfg(feature = "serde")]
extern crate serde;

/******************************************************************/

#[macro_use]
extern crate log;
#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate lazy_static;
extern crate openssl;
extern crate regex;

pub mod errors {
    error_chain! {
        foreign_links {
            Io(::std::io::Error);
            SslStack(::openssl::error::ErrorStack);
        }

        errors {
            Connection(msg: String) {
                description("connection error")
                display("Connection error: {}", msg)
            }
            Authentication(msg: String) {
                description("authentication error")
                display("Authentication error: {}", msg)
            }
            Mailbox(msg: String) {
                description("mailbox error")
                display("Mailbox error: {}", msg)
            }
            Protocol(msg: String) {
                description("protocol error")
                display("Protocol error: {}", msg)
            }
        }
    }
}

mod connection;
pub mod config;
pub mod engine;
pub mod imapresult;
mod imapresultimpl;
mod message;
mod session;
mod utils;
#[cfg(test)]
mod mock_stream;

pub use config::AccountConfig;
pub use connection::IMAPConnection;
pub use engine::{Connector, ProtocolEngine, Section, Security, TCPStreamType, TcpConnector,
                 ALL_MESSAGES};
pub use message::{DeleteResult, Message};
pub use session::{Session, SessionState, DEFAULT_PORT};
pub use utils::{extract_field, NO_INFO};

/// Server-assigned, mailbox-scoped unique identifier of a message.
pub type Uid = u32;
