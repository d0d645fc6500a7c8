use crate::logging::LogFormat;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default path of the JMAP API route.
pub const DEFAULT_JMAP_ENDPOINT: &str = "/jmap";

/// Default mailbox name length limit.
pub const DEFAULT_MAX_MAILBOX_NAME_LENGTH: usize = 200;

/// Mailboxes every user is given on first contact.
pub const DEFAULT_MAILBOXES: [&str; 5] = ["INBOX", "Outbox", "Sent", "Trash", "Drafts"];

/// Smallest name length limit that still admits every default mailbox.
pub const MIN_MAX_MAILBOX_NAME_LENGTH: usize = longest_default_mailbox();

const fn longest_default_mailbox() -> usize {
    let mut longest = 0;
    let mut index = 0;
    while index < DEFAULT_MAILBOXES.len() {
        let length = DEFAULT_MAILBOXES[index].len();
        if length > longest {
            longest = length;
        }
        index += 1;
    }
    longest
}

/// Default mailbox hierarchy delimiter.
pub const DEFAULT_PATH_DELIMITER: char = '.';

/// Default `Access-Control-Allow-Origin` value.
pub const DEFAULT_CORS_ALLOW_ORIGIN: &str = "*";

/// Default identity for local replay mode.
pub const DEFAULT_LOCAL_USER: &str = "postmaster@localhost";

/// Default log filter expression used by the binaries.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Owned default JMAP endpoint.
#[must_use]
pub fn default_jmap_endpoint() -> String {
    DEFAULT_JMAP_ENDPOINT.to_owned()
}

/// Default mailbox name length limit.
#[must_use]
pub fn default_max_mailbox_name_length() -> usize {
    DEFAULT_MAX_MAILBOX_NAME_LENGTH
}

/// Owned default delimiter.
#[must_use]
pub fn default_path_delimiter() -> String {
    DEFAULT_PATH_DELIMITER.to_string()
}

/// Owned default allow-origin value.
#[must_use]
pub fn default_cors_allow_origin() -> String {
    DEFAULT_CORS_ALLOW_ORIGIN.to_owned()
}

/// Owned default local user.
#[must_use]
pub fn default_local_user() -> String {
    DEFAULT_LOCAL_USER.to_owned()
}
