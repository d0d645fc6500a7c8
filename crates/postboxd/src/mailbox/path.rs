//! Resolution of client-relative mailbox names.

use super::{INBOX, MailboxError, MailboxPath};
use crate::session::SessionContext;

/// Turns names typed by a client into fully qualified [`MailboxPath`]s.
///
/// `INBOX` is matched case-insensitively, both alone and as the first
/// hierarchy component. A single trailing delimiter is dropped, since
/// `CREATE foo.` asks for `foo` as a future parent.
#[derive(Debug, Clone, Copy)]
pub struct PathConverter<'a> {
    session: &'a SessionContext,
}

impl<'a> PathConverter<'a> {
    /// Creates a converter bound to `session`'s user and delimiter.
    #[must_use]
    pub fn for_session(session: &'a SessionContext) -> Self {
        Self { session }
    }

    /// Resolves `mailbox_name` into the session user's private namespace.
    ///
    /// # Errors
    ///
    /// Returns [`MailboxError::InvalidName`] for empty names, names with
    /// empty hierarchy components, and names addressing another namespace.
    pub fn build_full_path(&self, mailbox_name: &str) -> Result<MailboxPath, MailboxError> {
        let delimiter = self.session.delimiter();
        let trimmed = mailbox_name
            .strip_suffix(delimiter)
            .unwrap_or(mailbox_name);

        if trimmed.is_empty() {
            return Err(MailboxError::invalid_name(mailbox_name, "name is empty"));
        }
        if trimmed.starts_with('#') {
            return Err(MailboxError::invalid_name(
                mailbox_name,
                "only the private namespace is supported",
            ));
        }
        if trimmed.split(delimiter).any(str::is_empty) {
            return Err(MailboxError::invalid_name(
                mailbox_name,
                "hierarchy components must not be empty",
            ));
        }

        Ok(MailboxPath::private(
            self.session.user().clone(),
            normalise_inbox(trimmed, delimiter),
        ))
    }
}

fn normalise_inbox(name: &str, delimiter: char) -> String {
    let (first, rest) = match name.split_once(delimiter) {
        Some((first, rest)) => (first, Some(rest)),
        None => (name, None),
    };
    if !first.eq_ignore_ascii_case(INBOX) {
        return name.to_owned();
    }
    match rest {
        Some(rest) => format!("{INBOX}{delimiter}{rest}"),
        None => INBOX.to_owned(),
    }
}
