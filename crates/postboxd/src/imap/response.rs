//! IMAP response events and their line rendering.
//!
//! Processors emit [`ImapResponse`] values; the connection renders each one
//! with [`fmt::Display`] and terminates it with CRLF.

use std::fmt;

use super::request::Tag;

/// Status of a tagged response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed.
    Ok,
    /// Command failed for an operational reason.
    No,
    /// Command was rejected as invalid.
    Bad,
}

impl Status {
    /// Wire keyword.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::No => "NO",
            Self::Bad => "BAD",
        }
    }
}

/// Fixed reason attached to a tagged response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonCode {
    /// Command completed normally.
    Completed,
    /// Target mailbox already exists.
    MailboxExists,
    /// Mailbox name was rejected.
    FailureMailboxName,
    /// Target mailbox does not exist.
    FailureNoSuchMailbox,
    /// Catch-all processing failure.
    GenericFailureDuringProcessing,
}

impl ReasonCode {
    /// Stable identifier of the reason.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Completed => "COMPLETED",
            Self::MailboxExists => "MAILBOX_EXISTS",
            Self::FailureMailboxName => "FAILURE_MAILBOX_NAME",
            Self::FailureNoSuchMailbox => "FAILURE_NO_SUCH_MAILBOX",
            Self::GenericFailureDuringProcessing => "GENERIC_FAILURE_DURING_PROCESSING",
        }
    }

    /// Human-readable text sent to the client.
    #[must_use]
    pub fn text(self) -> &'static str {
        match self {
            Self::Completed => "completed.",
            Self::MailboxExists => "failed. Mailbox already exists.",
            Self::FailureMailboxName => "failed. Invalid mailbox name.",
            Self::FailureNoSuchMailbox => "failed. No such mailbox.",
            Self::GenericFailureDuringProcessing => "processing failed.",
        }
    }
}

/// Bracketed response code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    /// `[READ-WRITE]`
    ReadWrite,
    /// `[UIDVALIDITY n]`
    UidValidity(u32),
    /// `[UIDNEXT n]`
    UidNext(u32),
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadWrite => f.write_str("[READ-WRITE]"),
            Self::UidValidity(value) => write!(f, "[UIDVALIDITY {value}]"),
            Self::UidNext(value) => write!(f, "[UIDNEXT {value}]"),
        }
    }
}

/// Flags every mailbox supports.
pub const SYSTEM_FLAGS: &str = r"(\Answered \Flagged \Deleted \Seen \Draft)";

/// Terminal response correlated with one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusResponse {
    /// Tag of the command.
    pub tag: Tag,
    /// Outcome.
    pub status: Status,
    /// Optional bracketed code.
    pub code: Option<ResponseCode>,
    /// Command name, for example `CREATE`.
    pub command: &'static str,
    /// Reason for the outcome.
    pub reason: ReasonCode,
}

impl StatusResponse {
    /// Builds a tagged `OK ... completed.` response.
    #[must_use]
    pub fn completed(tag: Tag, command: &'static str) -> Self {
        Self {
            tag,
            status: Status::Ok,
            code: None,
            command,
            reason: ReasonCode::Completed,
        }
    }

    /// Attaches a bracketed response code.
    #[must_use]
    pub fn with_code(mut self, code: ResponseCode) -> Self {
        self.code = Some(code);
        self
    }
}

impl fmt::Display for StatusResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.tag, self.status.as_str())?;
        if let Some(code) = self.code {
            write!(f, " {code}")?;
        }
        write!(f, " {} {}", self.command, self.reason.text())
    }
}

/// Advisory response preceding the tagged one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UntaggedResponse {
    /// `* n EXISTS`
    Exists(u32),
    /// `* n RECENT`
    Recent(u32),
    /// `* FLAGS (...)`
    Flags,
    /// `* OK [code] text`
    Ok {
        /// Bracketed code.
        code: ResponseCode,
        /// Trailing text.
        text: &'static str,
    },
}

impl fmt::Display for UntaggedResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exists(count) => write!(f, "* {count} EXISTS"),
            Self::Recent(count) => write!(f, "* {count} RECENT"),
            Self::Flags => write!(f, "* FLAGS {SYSTEM_FLAGS}"),
            Self::Ok { code, text } => write!(f, "* OK {code} {text}"),
        }
    }
}

/// Any response a processor may emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImapResponse {
    /// Advisory response.
    Untagged(UntaggedResponse),
    /// Terminal response.
    Tagged(StatusResponse),
}

impl ImapResponse {
    /// Returns the tagged response, if this is one.
    #[must_use]
    pub fn as_tagged(&self) -> Option<&StatusResponse> {
        match self {
            Self::Tagged(response) => Some(response),
            Self::Untagged(_) => None,
        }
    }
}

impl From<UntaggedResponse> for ImapResponse {
    fn from(response: UntaggedResponse) -> Self {
        Self::Untagged(response)
    }
}

impl From<StatusResponse> for ImapResponse {
    fn from(response: StatusResponse) -> Self {
        Self::Tagged(response)
    }
}

impl fmt::Display for ImapResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Untagged(response) => response.fmt(f),
            Self::Tagged(response) => response.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn renders_completed() {
        let response = StatusResponse::completed(Tag::new("a1"), "CREATE");
        assert_eq!(response.to_string(), "a1 OK CREATE completed.");
    }

    #[rstest]
    fn renders_failure_with_reason() {
        let response = StatusResponse {
            tag: Tag::new("a2"),
            status: Status::No,
            code: None,
            command: "CREATE",
            reason: ReasonCode::MailboxExists,
        };
        assert_eq!(
            response.to_string(),
            "a2 NO CREATE failed. Mailbox already exists."
        );
    }

    #[rstest]
    fn renders_response_codes() {
        let response =
            StatusResponse::completed(Tag::new("s1"), "SELECT").with_code(ResponseCode::ReadWrite);
        assert_eq!(response.to_string(), "s1 OK [READ-WRITE] SELECT completed.");
    }

    #[rstest]
    #[case(UntaggedResponse::Exists(3), "* 3 EXISTS")]
    #[case(UntaggedResponse::Recent(0), "* 0 RECENT")]
    #[case(
        UntaggedResponse::Ok { code: ResponseCode::UidNext(9), text: "Predicted next UID" },
        "* OK [UIDNEXT 9] Predicted next UID"
    )]
    fn renders_untagged(#[case] response: UntaggedResponse, #[case] expected: &str) {
        assert_eq!(response.to_string(), expected);
    }

    #[rstest]
    fn reason_keys_are_stable() {
        assert_eq!(ReasonCode::MailboxExists.key(), "MAILBOX_EXISTS");
        assert_eq!(ReasonCode::FailureMailboxName.key(), "FAILURE_MAILBOX_NAME");
        assert_eq!(
            ReasonCode::GenericFailureDuringProcessing.key(),
            "GENERIC_FAILURE_DURING_PROCESSING"
        );
    }
}
