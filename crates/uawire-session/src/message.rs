//! Message composition and delivery.

use uawire_conn::Connection;
use uawire_edf::EdfData;

use crate::error::{Result, SessionError};

/// What a [`Message`] is, or will become once delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageKind {
    /// Freshly composed, not yet committed to a delivery path.
    #[default]
    None,
    /// A message posted to a folder.
    Post,
    /// A direct page to an online user.
    Page,
    /// A system bulletin. Read-only; bulletins cannot be sent.
    Bulletin,
}

/// Where a delivery attempt ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// The sender lacks the access to deliver this message.
    Forbidden,
    /// The recipient is online but refusing pages.
    PageBusy,
    /// The recipient is not on line.
    PageUnavailable,
    /// No such recipient on this server.
    NoSuchRecipient,
    /// The target folder does not exist or cannot be posted to.
    NoFolder,
}

/// A message being composed or read.
///
/// Integer fields use -1 for "unset"; the server fills them in on
/// delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    pub to_id: i32,
    pub to: Option<String>,
    pub from_id: i32,
    pub from: Option<String>,
    pub subject: String,
    pub body: String,
    pub folder_id: i32,
    pub date: i32,
    pub id: i32,
    pub in_reply_to: i32,
}

impl Default for Message {
    fn default() -> Self {
        Self {
            kind: MessageKind::None,
            to_id: -1,
            to: None,
            from_id: -1,
            from: None,
            subject: String::new(),
            body: String::new(),
            folder_id: -1,
            date: -1,
            id: -1,
            in_reply_to: -1,
        }
    }
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a reply to this message.
    ///
    /// Valid only for a post or a page. The reply keeps the kind, goes
    /// back to the sender, carries the same subject, and records this
    /// message's id as its parent.
    pub fn reply(&self) -> Result<Message> {
        match self.kind {
            MessageKind::Post | MessageKind::Page => {}
            _ => {
                return Err(SessionError::InvalidOperation(
                    "can only reply to a post or a page".to_string(),
                ))
            }
        }

        Ok(Message {
            kind: self.kind,
            to: self.from.clone(),
            to_id: self.from_id,
            subject: self.subject.clone(),
            in_reply_to: self.id,
            ..Message::default()
        })
    }

    /// Post this message to its folder.
    ///
    /// A fresh message becomes a post. A page is diverted into a post
    /// with a replacement subject, for recipients who went off line
    /// mid-conversation. `toid` is sent only when a recipient is set.
    pub fn post(&mut self, conn: &Connection) -> Result<DeliveryOutcome> {
        match self.kind {
            MessageKind::None => self.kind = MessageKind::Post,
            MessageKind::Post => {}
            MessageKind::Page => {
                self.kind = MessageKind::Post;
                self.subject = "Diverted page".to_string();
            }
            MessageKind::Bulletin => {
                return Err(SessionError::InvalidOperation(
                    "cannot post a bulletin".to_string(),
                ))
            }
        }

        if self.subject.is_empty() {
            return Err(SessionError::InvalidData(
                "subject line is missing".to_string(),
            ));
        }

        let mut request = EdfData::string("request", "message_add")
            .with_integer("folderid", self.folder_id)
            .with_string("subject", self.subject.as_str())
            .with_string("text", self.body.as_str());
        if self.to_id != -1 {
            request.add_integer("toid", self.to_id);
        }

        let reply = conn.send_and_receive(&request)?;
        if reply.string_value().is_ok_and(|v| v == "message_add") {
            Ok(DeliveryOutcome::Delivered)
        } else {
            Ok(DeliveryOutcome::NoFolder)
        }
    }

    /// Page the recipient directly.
    ///
    /// A fresh message or a post becomes a page.
    pub fn page(&mut self, conn: &Connection) -> Result<DeliveryOutcome> {
        match self.kind {
            MessageKind::None | MessageKind::Post => self.kind = MessageKind::Page,
            MessageKind::Page => {}
            MessageKind::Bulletin => {
                return Err(SessionError::InvalidOperation(
                    "cannot page a bulletin".to_string(),
                ))
            }
        }

        let request = EdfData::string("request", "user_contact")
            .with_integer("toid", self.to_id)
            .with_string("text", self.body.as_str());

        let reply = conn.send_and_receive(&request)?;
        let value = reply.string_value().map_err(|_| {
            SessionError::WrongEdf("expected a string-valued reply to user_contact".to_string())
        })?;
        match value {
            "user_contact" => Ok(DeliveryOutcome::Delivered),
            "user_busy" => Ok(DeliveryOutcome::PageBusy),
            "user_not_on" => Ok(DeliveryOutcome::PageUnavailable),
            other => Err(SessionError::WrongEdf(format!(
                "unexpected reply '{other}' to user_contact"
            ))),
        }
    }
}
