use std::cell::RefCell;
use std::fmt;

use errors::*;
use config::AccountConfig;
use engine::{Connector, ProtocolEngine, Security, TcpConnector, ALL_MESSAGES};
use message::Message;
use Uid;

/// Standard port for unencrypted IMAP.
pub const DEFAULT_PORT: u16 = 143;

#[derive(PartialEq, Clone, Copy)]
#[derive(Debug)]
pub enum SessionState {
    Disconnected,
    NotAuthenticated,
    Authenticated,
    Selected,
    Logout,
}

struct SessionInner<E> {
    engine: Option<E>,
    state: SessionState,
    mailbox: Option<String>,
    messages: Vec<Uid>,
}

impl<E: ProtocolEngine> SessionInner<E> {
    fn engine_mut(&mut self) -> Result<&mut E> {
        match self.engine {
            Some(ref mut engine) => Ok(engine),
            None => bail!(ErrorKind::Connection("Not connected".to_string())),
        }
    }

    fn require_authenticated(&self) -> Result<()> {
        match self.state {
            SessionState::Authenticated | SessionState::Selected => Ok(()),
            SessionState::NotAuthenticated => bail!(ErrorKind::Authentication("Not logged in".to_string())),
            SessionState::Disconnected | SessionState::Logout => {
                bail!(ErrorKind::Connection("Not connected".to_string()))
            }
        }
    }

    fn selected_mailbox(&self) -> Result<String> {
        self.require_authenticated()?;
        match self.mailbox {
            Some(ref mailbox) if self.state == SessionState::Selected => Ok(mailbox.clone()),
            _ => bail!(ErrorKind::Mailbox("No mailbox selected".to_string())),
        }
    }

    fn set_state(&mut self, state: SessionState) {
        self.state = state;
        debug!("SessionState::{:?}", self.state);
    }
}

/// A connection to one IMAP account with at most one selected mailbox.
///
/// The session caches the UIDs of the last enumeration. The cache is
/// replaced as a whole by [`get_messages`](#method.get_messages) and
/// dropped by `select_mailbox` and by every successful deletion; it is
/// never patched incrementally.
///
/// All requests are blocking and strictly sequential. A `Session` is not
/// `Sync`; share it across threads only behind a lock.
pub struct Session<C: Connector = TcpConnector> {
    connector: C,
    inner: RefCell<SessionInner<C::Engine>>,
    update_ui: Box<dyn Fn()>,
}

impl Session<TcpConnector> {
    /// A session that connects over plain TCP. `update_ui` is invoked
    /// after every successful message deletion.
    pub fn new<F>(update_ui: F) -> Session
        where F: Fn() + 'static
    {
        Session::with_connector(TcpConnector::default(), update_ui)
    }

    /// Connects, logs in and selects the mailbox described by `account`.
    pub fn from_account<F>(account: &AccountConfig, update_ui: F) -> Result<Session>
        where F: Fn() + 'static
    {
        let connector = TcpConnector::new(Security::from_auth(&account.auth)?);
        let mut session = Session::with_connector(connector, update_ui);
        session.connect(&account.host, account.port)?;
        session.login(&account.username, &account.password)?;
        session.select_mailbox(&account.mailbox)?;
        Ok(session)
    }
}

impl<C: Connector> Session<C> {
    pub fn with_connector<F>(connector: C, update_ui: F) -> Session<C>
        where F: Fn() + 'static
    {
        Session {
            connector: connector,
            inner: RefCell::new(SessionInner {
                engine: None,
                state: SessionState::Disconnected,
                mailbox: None,
                messages: Vec::new(),
            }),
            update_ui: Box::new(update_ui),
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.borrow().state
    }

    /// Name of the selected mailbox, if any.
    pub fn mailbox(&self) -> Option<String> {
        self.inner.borrow().mailbox.clone()
    }

    /// Opens the connection to `server:port`. Use [`DEFAULT_PORT`] for
    /// plain IMAP.
    pub fn connect(&mut self, server: &str, port: u16) -> Result<()> {
        trace!("Connecting to {}:{}", server, port);
        let inner = self.inner.get_mut();
        match inner.state {
            SessionState::Disconnected | SessionState::Logout => {}
            _ => bail!(ErrorKind::Connection("Already connected".to_string())),
        }

        let engine = self.connector.connect(server, port)?;
        inner.engine = Some(engine);
        inner.mailbox = None;
        inner.messages.clear();
        inner.set_state(SessionState::NotAuthenticated);
        Ok(())
    }

    pub fn login(&mut self, userid: &str, password: &str) -> Result<()> {
        trace!("Attempting to Login");
        let inner = self.inner.get_mut();
        match inner.state {
            SessionState::NotAuthenticated => {}
            SessionState::Disconnected | SessionState::Logout => {
                bail!(ErrorKind::Connection("Not connected".to_string()))
            }
            SessionState::Authenticated | SessionState::Selected => {
                bail!(ErrorKind::Authentication("Already logged in".to_string()))
            }
        }

        inner.engine_mut()?.login(userid, password)?;
        inner.set_state(SessionState::Authenticated);
        Ok(())
    }

    /// Makes `mailbox` the active mailbox and drops the message cache.
    ///
    /// A failed selection leaves no mailbox selected.
    pub fn select_mailbox(&mut self, mailbox: &str) -> Result<()> {
        trace!("Selecting mailbox {}", mailbox);
        let inner = self.inner.get_mut();
        inner.require_authenticated()?;
        inner.messages.clear();

        let selected = inner.engine_mut()?.select(mailbox);
        match selected {
            Ok(()) => {
                inner.mailbox = Some(mailbox.to_string());
                inner.set_state(SessionState::Selected);
                Ok(())
            }
            Err(e) => {
                inner.mailbox = None;
                inner.set_state(SessionState::Authenticated);
                Err(e)
            }
        }
    }

    /// Enumerates the selected mailbox in server order.
    ///
    /// One STATUS round trip for the message count, then (unless the
    /// mailbox is empty) one FETCH of the UIDs of the whole mailbox. The
    /// result replaces the message cache; on error the cache is kept.
    pub fn get_messages(&self) -> Result<Vec<Message<C>>> {
        trace!("Enumerating messages");
        let uids = {
            let mut inner = self.inner.borrow_mut();
            let mailbox = inner.selected_mailbox()?;
            let uids = {
                let engine = inner.engine_mut()?;
                let count = engine.status_messages(&mailbox)?;
                debug!("{} holds {} messages", mailbox, count);
                if count == 0 {
                    Vec::new()
                } else {
                    engine.fetch_uids(ALL_MESSAGES)?
                }
            };
            inner.messages = uids.clone();
            uids
        };
        Ok(uids.into_iter().map(|uid| Message::new(self, uid)).collect())
    }

    /// Handles for the messages of the last enumeration still cached.
    pub fn cached_messages(&self) -> Vec<Message<C>> {
        self.inner.borrow().messages.iter()
            .map(|&uid| Message::new(self, uid))
            .collect()
    }

    /// Logs out and closes the connection, releasing the message cache.
    ///
    /// Does nothing when not connected. Dropping a connected session
    /// logs out as well, but swallows the error.
    pub fn logout(&mut self) -> Result<()> {
        let inner = self.inner.get_mut();
        let mut engine = match inner.engine.take() {
            Some(engine) => engine,
            None => return Ok(()),
        };
        trace!("Logging out, releasing {} cached messages", inner.messages.len());
        inner.messages.clear();
        inner.mailbox = None;
        inner.set_state(SessionState::Logout);
        engine.logout()
    }

    pub(crate) fn with_selected<T, F>(&self, f: F) -> Result<T>
        where F: FnOnce(&mut C::Engine) -> Result<T>
    {
        let mut inner = self.inner.borrow_mut();
        inner.selected_mailbox()?;
        f(inner.engine_mut()?)
    }

    pub(crate) fn invalidate_cache(&self) {
        self.inner.borrow_mut().messages.clear();
        debug!("Message cache invalidated");
    }

    pub(crate) fn refresh_ui(&self) {
        (self.update_ui)()
    }
}

impl<C: Connector> Drop for Session<C> {
    fn drop(&mut self) {
        if let Err(e) = self.logout() {
            warn!("Logout failed: {}", e);
        }
    }
}

impl<C: Connector> fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Session")
            .field("state", &inner.state)
            .field("mailbox", &inner.mailbox)
            .field("messages", &inner.messages)
            .finish()
    }
}
