//! Route selection by method, path and protocol version.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{Instrument, debug};

use super::errors::{RouteError, TransportClassifier, failure_response, transport_rules};
use super::message::{ACCEPT, HttpMethod, HttpRequest, HttpResponse};
use crate::cancel::CloseSignal;
use crate::diagnostics::DiagnosticContext;

/// Tracing target for routing.
pub(crate) const ROUTE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::route");

/// `Accept` header parameter naming the protocol version.
pub const VERSION_PARAMETER: &str = "jmapVersion";

/// JMAP protocol revision a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Version {
    /// Pre-standard draft methods such as `getMailboxes`.
    #[default]
    Draft,
    /// RFC 8621.
    Rfc8621,
}

impl Version {
    /// Wire name of the version.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Rfc8621 => "rfc-8621",
        }
    }

    /// Parses a version name.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::UnsupportedVersion`] for unknown names.
    pub fn parse(value: &str) -> Result<Self, RouteError> {
        match value.trim() {
            "draft" => Ok(Self::Draft),
            "rfc-8621" => Ok(Self::Rfc8621),
            other => Err(RouteError::unsupported_version(other)),
        }
    }

    /// Reads the version from a request's `Accept` header.
    ///
    /// Requests without the parameter target [`Version::Draft`].
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::UnsupportedVersion`] for unknown versions.
    pub fn from_request(request: &HttpRequest) -> Result<Self, RouteError> {
        let Some(accept) = request.header(ACCEPT) else {
            return Ok(Self::default());
        };
        accept
            .split([',', ';'])
            .filter_map(|parameter| parameter.trim().split_once('='))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case(VERSION_PARAMETER))
            .map_or(Ok(Self::default()), |(_, value)| Self::parse(value))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Method and path a route answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    method: HttpMethod,
    path: String,
}

impl Endpoint {
    /// Endpoint answering `method` on the exact `path`.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns `true` when `request` targets this endpoint or a sub-path.
    pub fn matches(&self, request: &HttpRequest) -> bool {
        if request.method() != self.method {
            return false;
        }
        let path = request.path();
        path == self.path
            || path
                .strip_prefix(self.path.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method.as_str(), self.path)
    }
}

/// Produces a response for a routed request.
///
/// Handlers always answer; failures are already converted into responses.
#[async_trait]
pub trait RouteHandler: Send + Sync {
    /// Produces the response for a matched `request`.
    async fn handle(&self, request: &HttpRequest) -> HttpResponse;
}

/// One routing entry.
#[derive(Clone)]
pub struct Route {
    endpoint: Endpoint,
    version: Version,
    handler: Arc<dyn RouteHandler>,
}

impl Route {
    /// Binds `handler` to `endpoint` for one API `version`.
    pub fn new(endpoint: Endpoint, version: Version, handler: Arc<dyn RouteHandler>) -> Self {
        Self {
            endpoint,
            version,
            handler,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn version(&self) -> Version {
        self.version
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("endpoint", &self.endpoint)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

/// CORS response headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    allow_origin: String,
}

impl CorsPolicy {
    /// Methods advertised to browsers.
    pub const ALLOW_METHODS: &'static str = "GET, POST, DELETE, PUT";
    /// Request headers advertised to browsers.
    pub const ALLOW_HEADERS: &'static str = "Content-Type, Authorization, Accept";
    /// Preflight cache lifetime in seconds.
    pub const MAX_AGE: &'static str = "86400";

    /// Policy allowing requests from `allow_origin`.
    pub fn new(allow_origin: impl Into<String>) -> Self {
        Self {
            allow_origin: allow_origin.into(),
        }
    }

    /// Adds the `Access-Control-*` headers to `response`.
    pub fn apply(&self, response: &mut HttpResponse) {
        response.insert_header("Access-Control-Allow-Origin", self.allow_origin.as_str());
        response.insert_header("Access-Control-Allow-Methods", Self::ALLOW_METHODS);
        response.insert_header("Access-Control-Allow-Headers", Self::ALLOW_HEADERS);
        response.insert_header("Access-Control-Max-Age", Self::MAX_AGE);
    }
}

/// Decorates a handler's responses with CORS headers.
pub struct Cors {
    policy: CorsPolicy,
    inner: Arc<dyn RouteHandler>,
}

/// Wraps `inner` so its responses carry `policy`'s headers.
pub fn cors(policy: CorsPolicy, inner: Arc<dyn RouteHandler>) -> Cors {
    Cors { policy, inner }
}

#[async_trait]
impl RouteHandler for Cors {
    async fn handle(&self, request: &HttpRequest) -> HttpResponse {
        let mut response = self.inner.handle(request).await;
        self.policy.apply(&mut response);
        response
    }
}

/// Answers CORS preflight requests without authenticating.
#[derive(Debug, Default, Clone, Copy)]
pub struct Preflight;

#[async_trait]
impl RouteHandler for Preflight {
    async fn handle(&self, _request: &HttpRequest) -> HttpResponse {
        HttpResponse::new(200)
    }
}

/// Ordered set of routes.
pub struct RouteTable {
    routes: Vec<Route>,
    rules: TransportClassifier,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

impl RouteTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            rules: transport_rules(),
        }
    }

    /// Appends a route. Earlier routes win when several match.
    pub fn add(&mut self, route: Route) -> &mut Self {
        self.routes.push(route);
        self
    }

    /// Installs `handler` at `endpoint` with CORS headers, plus an `OPTIONS`
    /// preflight on the same path.
    pub fn add_with_preflight(
        &mut self,
        endpoint: Endpoint,
        version: Version,
        handler: Arc<dyn RouteHandler>,
        policy: &CorsPolicy,
    ) -> &mut Self {
        let preflight = Endpoint::new(HttpMethod::Options, endpoint.path());
        self.add(Route::new(
            endpoint,
            version,
            Arc::new(cors(policy.clone(), handler)),
        ));
        self.add(Route::new(
            preflight,
            version,
            Arc::new(cors(policy.clone(), Arc::new(Preflight))),
        ))
    }

    /// Installed routes in match order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Finds the route for `request`.
    ///
    /// Preflight requests match on method and path alone.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::UnsupportedVersion`] when the request names an
    /// unknown protocol version.
    pub fn find(&self, request: &HttpRequest) -> Result<Option<&Route>, RouteError> {
        if request.method() == HttpMethod::Options {
            return Ok(self
                .routes
                .iter()
                .find(|route| route.endpoint.matches(request)));
        }
        let version = Version::from_request(request)?;
        Ok(self
            .routes
            .iter()
            .find(|route| route.version == version && route.endpoint.matches(request)))
    }

    /// Routes `request` and returns the handler's response.
    ///
    /// Unknown versions answer 400 and unmatched requests answer 404.
    pub async fn dispatch(&self, request: &HttpRequest) -> HttpResponse {
        let context = DiagnosticContext::new()
            .with("method", request.method().as_str())
            .with("path", request.path());
        let span = context.span();
        async {
            match self.find(request) {
                Ok(Some(route)) => {
                    debug!(target: ROUTE_TARGET, endpoint = %route.endpoint, "route selected");
                    route.handler.handle(request).await
                }
                Ok(None) => {
                    debug!(target: ROUTE_TARGET, "no route matched");
                    HttpResponse::new(404)
                }
                Err(error) => failure_response(self.rules.resolve(&error, &context).action),
            }
        }
        .instrument(span)
        .await
    }

    /// Like [`RouteTable::dispatch`], but gives up when `close` fires first.
    ///
    /// Returns `None` when the connection closed; the in-flight pipeline is
    /// dropped and nothing should be written.
    pub async fn handle_until_closed(
        &self,
        request: &HttpRequest,
        close: &mut CloseSignal,
    ) -> Option<HttpResponse> {
        tokio::select! {
            biased;
            () = close.closed() => {
                debug!(target: ROUTE_TARGET, path = request.path(), "connection closed before response");
                None
            }
            response = self.dispatch(request) => Some(response),
        }
    }
}
