//! JMAP method processor contract.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::errors::MethodError;
use crate::session::SessionContext;

/// Executes one named JMAP method.
#[async_trait]
pub trait MethodProcessor: Send + Sync {
    /// Method name this processor answers, for example `getMailboxes`.
    fn method_name(&self) -> &'static str;

    /// Name of the successful response, for example `mailboxes`.
    fn response_name(&self) -> &'static str;

    /// Runs the method with raw `arguments` on behalf of `session`.
    ///
    /// # Errors
    ///
    /// Returns [`MethodError`] for invalid arguments or store failures.
    async fn process(&self, arguments: &Value, session: &SessionContext)
    -> Result<Value, MethodError>;
}

/// Decodes method arguments into `T`.
pub(crate) fn parse_arguments<T: DeserializeOwned>(arguments: &Value) -> Result<T, MethodError> {
    T::deserialize(arguments).map_err(MethodError::from_json_error)
}
