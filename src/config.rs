#[cfg(feature = "serde")]
use serde::{Serialize, Deserialize};

use session::DEFAULT_PORT;

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_auth() -> String {
    "Plain".to_string()
}

fn default_mailbox() -> String {
    "INBOX".to_string()
}

/// Everything needed to open a session on one account.
///
/// `auth` is either `"Plain"` or `"SSL"`.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AccountConfig {
    pub host: String,
    #[cfg_attr(feature = "serde", serde(default = "default_port"))]
    pub port: u16,
    pub username: String,
    pub password: String,
    #[cfg_attr(feature = "serde", serde(default = "default_auth"))]
    pub auth: String,
    #[cfg_attr(feature = "serde", serde(default = "default_mailbox"))]
    pub mailbox: String,
}

impl AccountConfig {
    /// Plain connection on the standard port, selecting `INBOX`.
    pub fn new(host: &str, username: &str, password: &str) -> AccountConfig {
        AccountConfig {
            host: host.to_string(),
            port: default_port(),
            username: username.to_string(),
            password: password.to_string(),
            auth: default_auth(),
            mailbox: default_mailbox(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let account = AccountConfig::new("imap.example.org", "bob", "secret");
        assert_eq!(account.port, 143);
        assert_eq!(account.auth, "Plain");
        assert_eq!(account.mailbox, "INBOX");
    }
}
