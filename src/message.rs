use std::fmt;

use errors::*;
use engine::{Connector, ProtocolEngine, Section};
use session::Session;
use utils::{extract_field, last_non_empty};
use Uid;

/// Outcome of [`Message::delete_from_mailbox`]. On failure the handle is
/// handed back untouched together with the error.
pub type DeleteResult<'s, C> = ::std::result::Result<(), (Error, Message<'s, C>)>;

/// A message of the selected mailbox, addressed by its UID.
///
/// The handle borrows its `Session` and has no connection of its own;
/// every operation is a UID-scoped request routed through the session.
pub struct Message<'s, C: 's + Connector> {
    session: &'s Session<C>,
    uid: Uid,
}

impl<'s, C: 's + Connector> Message<'s, C> {
    pub(crate) fn new(session: &'s Session<C>, uid: Uid) -> Message<'s, C> {
        Message {
            session: session,
            uid: uid,
        }
    }

    pub fn uid(&self) -> Uid {
        self.uid
    }

    /// Value of the header field `field_name` (e.g. `"Subject"`, `"From"`).
    ///
    /// Yields [`NO_INFO`](constant.NO_INFO.html) when the field is absent
    /// or empty; only a failed fetch is an error.
    pub fn get_field(&self, field_name: &str) -> Result<String> {
        trace!("Reading {} of UID {}", field_name, self.uid);
        let header = self.fetch(Section::Header)?;
        Ok(extract_field(&header, field_name))
    }

    /// The complete raw message, headers included. Empty when the server
    /// sent no content.
    pub fn get_body(&self) -> Result<String> {
        trace!("Reading body of UID {}", self.uid);
        self.fetch(Section::Full)
    }

    /// Flags the message `\Deleted` and expunges the mailbox.
    ///
    /// Consumes the handle. On success the session's message cache is
    /// dropped and the refresh callback runs once. If either request
    /// fails nothing local changes and the handle comes back in the error.
    pub fn delete_from_mailbox(self) -> DeleteResult<'s, C> {
        trace!("Deleting UID {}", self.uid);
        let uid = self.uid;
        let deleted = self.session.with_selected(|engine| {
            engine.uid_store_deleted(uid)?;
            engine.expunge()
        });
        if let Err(e) = deleted {
            return Err((e, self));
        }

        self.session.invalidate_cache();
        self.session.refresh_ui();
        Ok(())
    }

    fn fetch(&self, section: Section) -> Result<String> {
        let uid = self.uid;
        self.session
            .with_selected(|engine| engine.uid_fetch_section(uid, section))
            .map(last_non_empty)
    }
}

impl<'s, C: 's + Connector> fmt::Debug for Message<'s, C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Message").field("uid", &self.uid).finish()
    }
}
