use Uid;

/// One untagged server response (`* ...`), with any literals it carried.
///
/// `text` holds the response line(s) without the trailing CRLF; each
/// literal is left in place as its `{n}` marker and its octets are kept,
/// in order, in `literals`.
#[derive(Debug, Default)]
pub struct IMAPResponse {
    pub text: String,
    pub literals: Vec<Vec<u8>>,
}

#[derive(Debug)]
pub struct IMAPStatus {
    pub mailbox: String,
    pub messages: u32,
}

#[derive(Debug)]
pub struct BodySection {
    pub section: String,
    pub content: Vec<u8>,
}

#[derive(Debug)]
pub struct IMAPFetch {
    pub uid: Option<Uid>,
    pub sections: Vec<BodySection>,
}
