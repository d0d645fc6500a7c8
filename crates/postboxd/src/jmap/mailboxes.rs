//! Draft mailbox methods: `getMailboxes` and `setMailboxes`.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use super::errors::MethodError;
use super::method::{MethodProcessor, parse_arguments};
use crate::mailbox::{MailboxError, MailboxId, MailboxMetadata, MailboxPath};
use crate::provision::DEFAULT_MAILBOXES;
use crate::session::SessionContext;

/// Tracing target for JMAP processing.
pub(crate) const JMAP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::jmap");

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetMailboxesArguments {
    #[serde(default)]
    ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MailboxView {
    id: MailboxId,
    name: String,
    parent_id: Option<MailboxId>,
    role: Option<String>,
    total_messages: u32,
}

/// Role of a top-level default mailbox, such as `inbox` or `trash`.
fn role_of(mailbox: &MailboxMetadata, delimiter: char) -> Option<String> {
    let name = mailbox.path.name();
    if name.contains(delimiter) {
        return None;
    }
    DEFAULT_MAILBOXES
        .iter()
        .find(|default| default.eq_ignore_ascii_case(name))
        .map(|default| default.to_ascii_lowercase())
}

fn view(
    mailbox: &MailboxMetadata,
    ids_by_path: &HashMap<&MailboxPath, MailboxId>,
    delimiter: char,
) -> MailboxView {
    let parent_id = mailbox
        .path
        .parent(delimiter)
        .and_then(|parent| ids_by_path.get(&parent).copied());
    MailboxView {
        id: mailbox.id,
        name: mailbox.path.leaf(delimiter).to_owned(),
        parent_id,
        role: role_of(mailbox, delimiter),
        total_messages: mailbox.messages,
    }
}

/// `getMailboxes`: lists the caller's mailboxes.
#[derive(Debug, Default, Clone, Copy)]
pub struct GetMailboxes;

#[async_trait]
impl MethodProcessor for GetMailboxes {
    fn method_name(&self) -> &'static str {
        "getMailboxes"
    }

    fn response_name(&self) -> &'static str {
        "mailboxes"
    }

    async fn process(
        &self,
        arguments: &Value,
        session: &SessionContext,
    ) -> Result<Value, MethodError> {
        let arguments: GetMailboxesArguments = parse_arguments(arguments)?;
        let delimiter = session.delimiter();
        let mailboxes = session.store().list_mailboxes(session.user()).await?;
        let ids_by_path: HashMap<&MailboxPath, MailboxId> = mailboxes
            .iter()
            .map(|mailbox| (&mailbox.path, mailbox.id))
            .collect();

        let (list, not_found): (Vec<MailboxView>, Vec<String>) = match arguments.ids {
            None => (
                mailboxes
                    .iter()
                    .map(|mailbox| view(mailbox, &ids_by_path, delimiter))
                    .collect(),
                Vec::new(),
            ),
            Some(ids) => {
                let mut list = Vec::new();
                let mut not_found = Vec::new();
                for id in ids {
                    match mailboxes.iter().find(|mailbox| mailbox.id.to_string() == id) {
                        Some(mailbox) => list.push(view(mailbox, &ids_by_path, delimiter)),
                        None => not_found.push(id),
                    }
                }
                (list, not_found)
            }
        };

        debug!(target: JMAP_TARGET, listed = list.len(), missing = not_found.len(), "mailboxes listed");
        Ok(json!({
            "accountId": session.user(),
            "list": list,
            "notFound": not_found,
        }))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MailboxCreation {
    name: String,
    #[serde(default)]
    parent_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetMailboxesArguments {
    #[serde(default)]
    create: BTreeMap<String, MailboxCreation>,
}

/// Per-creation outcome.
enum Creation {
    Created(MailboxId),
    NotCreated {
        error_type: &'static str,
        description: String,
    },
}

impl Creation {
    fn invalid(description: impl Into<String>) -> Self {
        Self::NotCreated {
            error_type: "invalidArguments",
            description: description.into(),
        }
    }
}

/// `setMailboxes`: creates mailboxes.
///
/// Each creation succeeds or fails on its own. Expected failures land in
/// `notCreated`; unexpected store faults fail the whole invocation.
#[derive(Debug, Default, Clone, Copy)]
pub struct SetMailboxes;

impl SetMailboxes {
    async fn create_one(
        &self,
        creation: &MailboxCreation,
        existing: &[MailboxMetadata],
        session: &SessionContext,
    ) -> Result<Creation, MethodError> {
        let delimiter = session.delimiter();
        if creation.name.is_empty() || creation.name.contains(delimiter) {
            return Ok(Creation::invalid(format!(
                "mailbox name '{}' must be a non-empty leaf name",
                creation.name
            )));
        }

        let path = match &creation.parent_id {
            Some(parent_id) => {
                let Some(parent) = existing
                    .iter()
                    .find(|mailbox| mailbox.id.to_string() == *parent_id)
                else {
                    return Ok(Creation::invalid(format!("parent mailbox {parent_id} not found")));
                };
                parent.path.child(&creation.name, delimiter)
            }
            None => match session.path_converter().build_full_path(&creation.name) {
                Ok(path) => path,
                Err(error) => return Ok(Creation::invalid(error.to_string())),
            },
        };

        match session.store().create_mailbox(&path).await {
            Ok(id) => {
                debug!(target: JMAP_TARGET, %path, id = id.get(), "mailbox created");
                Ok(Creation::Created(id))
            }
            Err(error @ MailboxError::AlreadyExists { .. }) => Ok(Creation::NotCreated {
                error_type: "mailboxExists",
                description: error.to_string(),
            }),
            Err(error @ (MailboxError::NameTooLong { .. } | MailboxError::InvalidName { .. })) => {
                Ok(Creation::invalid(error.to_string()))
            }
            Err(error) => Err(error.into()),
        }
    }
}

#[async_trait]
impl MethodProcessor for SetMailboxes {
    fn method_name(&self) -> &'static str {
        "setMailboxes"
    }

    fn response_name(&self) -> &'static str {
        "mailboxesSet"
    }

    async fn process(
        &self,
        arguments: &Value,
        session: &SessionContext,
    ) -> Result<Value, MethodError> {
        let arguments: SetMailboxesArguments = parse_arguments(arguments)?;
        let existing = if arguments.create.values().any(|c| c.parent_id.is_some()) {
            session.store().list_mailboxes(session.user()).await?
        } else {
            Vec::new()
        };

        let mut created = serde_json::Map::new();
        let mut not_created = serde_json::Map::new();
        for (creation_id, creation) in &arguments.create {
            match self.create_one(creation, &existing, session).await? {
                Creation::Created(id) => {
                    created.insert(creation_id.clone(), json!({ "id": id }));
                }
                Creation::NotCreated {
                    error_type,
                    description,
                } => {
                    not_created.insert(
                        creation_id.clone(),
                        json!({ "type": error_type, "description": description }),
                    );
                }
            }
        }

        Ok(json!({
            "accountId": session.user(),
            "created": created,
            "notCreated": not_created,
        }))
    }
}
