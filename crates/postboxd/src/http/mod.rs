//! HTTP-style routing for the JMAP endpoint.

mod errors;
mod message;
mod route;
mod stages;

pub use errors::{RouteError, TransportClassifier, failure_response, transport_rules};
pub use message::{
    ACCEPT, AUTHORIZATION, CONTENT_TYPE, Headers, HttpMethod, HttpRequest, HttpResponse,
    JSON_UTF8, WWW_AUTHENTICATE,
};
pub use route::{
    Cors, CorsPolicy, Endpoint, Preflight, Route, RouteHandler, RouteTable, VERSION_PARAMETER,
    Version, cors,
};
pub use stages::{Authenticated, AuthenticatedHandler, PipelineStages};
