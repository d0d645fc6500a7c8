//! Decoded IMAP commands handed to the processors.
//!
//! Byte-level parsing happens upstream; by the time a command reaches this
//! crate it is one of the typed requests below.

use std::fmt;

/// Client-chosen tag correlating a command with its tagged response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag(String);

impl Tag {
    /// Wraps a raw tag.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the tag text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `CREATE <mailbox>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    /// Command tag.
    pub tag: Tag,
    /// Client-relative mailbox name.
    pub mailbox_name: String,
}

impl CreateRequest {
    /// Builds a CREATE request.
    pub fn new(tag: impl Into<String>, mailbox_name: impl Into<String>) -> Self {
        Self {
            tag: Tag::new(tag),
            mailbox_name: mailbox_name.into(),
        }
    }
}

/// `SELECT <mailbox>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectRequest {
    /// Command tag.
    pub tag: Tag,
    /// Client-relative mailbox name.
    pub mailbox_name: String,
}

impl SelectRequest {
    /// Builds a SELECT request.
    pub fn new(tag: impl Into<String>, mailbox_name: impl Into<String>) -> Self {
        Self {
            tag: Tag::new(tag),
            mailbox_name: mailbox_name.into(),
        }
    }
}

/// Commands understood by [`super::ImapProcessor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImapRequest {
    /// Mailbox creation.
    Create(CreateRequest),
    /// Mailbox selection.
    Select(SelectRequest),
}

impl ImapRequest {
    /// Tag of the wrapped command.
    #[must_use]
    pub fn tag(&self) -> &Tag {
        match self {
            Self::Create(request) => &request.tag,
            Self::Select(request) => &request.tag,
        }
    }
}

impl From<CreateRequest> for ImapRequest {
    fn from(request: CreateRequest) -> Self {
        Self::Create(request)
    }
}

impl From<SelectRequest> for ImapRequest {
    fn from(request: SelectRequest) -> Self {
        Self::Select(request)
    }
}
