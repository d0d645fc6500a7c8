//! JMAP API endpoint handler.

use async_trait::async_trait;

use super::dispatch::BatchDispatcher;
use super::invocation::Batch;
use crate::http::{AuthenticatedHandler, HttpResponse, RouteError};
use crate::session::SessionContext;

/// Decodes a batch, runs it and answers with the ordered results.
#[derive(Debug)]
pub struct JmapApi {
    dispatcher: BatchDispatcher,
}

impl JmapApi {
    pub fn new(dispatcher: BatchDispatcher) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl AuthenticatedHandler for JmapApi {
    type Input = Batch;

    fn decode(&self, body: &[u8]) -> Result<Batch, RouteError> {
        Batch::parse(body)
    }

    async fn handle(
        &self,
        batch: Batch,
        session: &SessionContext,
    ) -> Result<HttpResponse, RouteError> {
        let results = self.dispatcher.dispatch(&batch, session).await;
        HttpResponse::json(200, &results).map_err(RouteError::Serialize)
    }
}
