//! The outgoing reply email.

use mail_builder::{
    MessageBuilder,
    headers::content_type::ContentType,
    mime::{BodyPart, MimePart},
};

use crate::error::{ReplyError, ReplyResult};
use crate::reply::PreparedReply;

/// A reply ready to be handed to the mail transfer command.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    /// text/plain alternative
    pub body: String,
    /// text/calendar; method=REPLY alternative
    pub calendar: String,
}

impl OutgoingMessage {
    pub fn from_reply(prepared: &PreparedReply) -> ReplyResult<Self> {
        Ok(OutgoingMessage {
            from: prepared.from.clone(),
            to: prepared.to.clone(),
            subject: prepared.subject.clone(),
            body: prepared.body.clone(),
            calendar: prepared.reply.to_ics()?,
        })
    }

    /// Render as RFC 5322 bytes with a multipart/alternative body.
    pub fn to_bytes(&self) -> ReplyResult<Vec<u8>> {
        MessageBuilder::new()
            .from(self.from.as_str())
            .to(self.to.as_str())
            .subject(self.subject.as_str())
            .body(MimePart::new(
                ContentType::new("multipart/alternative"),
                BodyPart::Multipart(vec![
                    MimePart::new(
                        ContentType::new("text/plain"),
                        BodyPart::Text(self.body.as_str().into()),
                    ),
                    MimePart::new(
                        ContentType::new("text/calendar")
                            .attribute("method", "REPLY")
                            .attribute("charset", "utf-8"),
                        BodyPart::Text(self.calendar.as_str().into()),
                    ),
                ]),
            ))
            .write_to_vec()
            .map_err(|e| ReplyError::Message(e.to_string()))
    }
}
