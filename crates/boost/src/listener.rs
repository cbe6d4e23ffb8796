use crate::error::BoostError;
use crate::schema::ComposedSchema;
use accounts_graphql::RequestInfo;
use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::extract::{ConnectInfo, FromRequest, Request, State};
use axum::http::{HeaderMap, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use axum_server::Handle;
use serde::Serialize;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};
use tokio::signal;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

const GRACE_PERIOD: Duration = Duration::from_secs(30);

static START_TIME: LazyLock<Instant> = LazyLock::new(Instant::now);

/// Routes serving `schema`: GraphQL on `POST /`, GraphiQL on `GET /`, liveness on `GET /health`.
pub fn router(schema: Arc<ComposedSchema>) -> Router {
    LazyLock::force(&START_TIME);

    Router::new()
        .route("/", get(graphiql).post(graphql))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(schema)
}

async fn graphql(State(schema): State<Arc<ComposedSchema>>, request: Request) -> Response {
    let info = request_info(request.headers(), request.extensions().get::<ConnectInfo<SocketAddr>>());
    let request = match <GraphQLRequest as FromRequest<()>>::from_request(request, &()).await {
        Ok(request) => request.into_inner(),
        Err(rejection) => return rejection.into_response(),
    };

    GraphQLResponse::from(schema.execute(request, info).await).into_response()
}

fn request_info(headers: &HeaderMap, peer: Option<&ConnectInfo<SocketAddr>>) -> RequestInfo {
    let value = |name: header::HeaderName| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned);
    RequestInfo {
        authorization: value(header::AUTHORIZATION),
        user_agent: value(header::USER_AGENT),
        ip: peer.map(|ConnectInfo(addr)| addr.ip().to_string()),
    }
}

async fn graphiql() -> Html<String> {
    Html(GraphiQLSource::build().endpoint("/").finish())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    /// Seconds since the router was built.
    uptime: u64,
}

async fn health() -> impl IntoResponse {
    let body = HealthResponse {
        status: "up",
        version: env!("CARGO_PKG_VERSION"),
        uptime: START_TIME.elapsed().as_secs(),
    };

    ([(header::CACHE_CONTROL, "no-store, no-cache, must-revalidate"), (header::PRAGMA, "no-cache")], Json(body))
}

/// A running HTTP server.
#[must_use = "dropping the handle leaves the server running detached"]
#[derive(Debug)]
pub struct Listening {
    url: String,
    local_addr: SocketAddr,
    handle: Handle<SocketAddr>,
    task: JoinHandle<io::Result<()>>,
}

impl Listening {
    /// Base URL of the GraphQL endpoint, e.g. `http://localhost:4003/`.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The bound socket address; differs from the requested one for port `0`.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting connections and waits up to 30 seconds for in-flight requests.
    ///
    /// # Errors
    /// [`BoostError::Internal`] when the server task failed while serving.
    pub async fn shutdown(self) -> Result<(), BoostError> {
        self.handle.graceful_shutdown(Some(GRACE_PERIOD));
        match self.task.await {
            Ok(Ok(())) => {
                info!("Server shutdown complete");
                Ok(())
            }
            Ok(Err(e)) => Err(BoostError::Internal {
                message: e.to_string().into(),
                context: Some("Serving HTTP".into()),
            }),
            Err(e) => Err(BoostError::Internal {
                message: e.to_string().into(),
                context: Some("Joining server task".into()),
            }),
        }
    }

    /// Serves until Ctrl+C or SIGTERM, then shuts down gracefully.
    ///
    /// # Errors
    /// Fails when the signal handlers cannot be installed or the server task failed.
    pub async fn run_until_signal(self) -> Result<(), BoostError> {
        shutdown_signal().await?;
        info!("Shutdown signal received, starting graceful shutdown...");
        self.shutdown().await
    }
}

/// Binds `address` and serves `router` on a spawned task, returning once the socket is bound.
///
/// # Errors
/// [`BoostError::BindFailure`] when the address cannot be bound.
pub(crate) async fn serve(address: SocketAddr, router: Router) -> Result<Listening, BoostError> {
    let handle = Handle::<SocketAddr>::new();
    let task = tokio::spawn(
        axum_server::bind(address)
            .handle(handle.clone())
            .serve(router.into_make_service_with_connect_info::<SocketAddr>()),
    );

    let Some(local_addr) = handle.listening().await else {
        let source = match task.await {
            Ok(Err(e)) => e,
            Ok(Ok(())) => io::Error::other("server stopped before binding"),
            Err(e) => io::Error::other(e),
        };
        return Err(BoostError::BindFailure { source, context: Some(format!("Binding {address}").into()) });
    };

    let url = url_for(local_addr);
    info!("Accounts GraphQL server running at {url}");
    Ok(Listening { url, local_addr, handle, task })
}

fn url_for(addr: SocketAddr) -> String {
    if addr.ip().is_unspecified() {
        format!("http://localhost:{}/", addr.port())
    } else {
        format!("http://{addr}/")
    }
}

/// Waits for SIGINT (Ctrl+C) or, on unix, SIGTERM.
async fn shutdown_signal() -> Result<(), BoostError> {
    let ctrl_c = async {
        signal::ctrl_c().await.map_err(|e| signal_error(&e, "Installing Ctrl+C handler"))
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .map_err(|e| signal_error(&e, "Installing SIGTERM handler"))?
            .recv()
            .await;
        Ok::<_, BoostError>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<(), BoostError>>();

    let received = tokio::select! {
        res = ctrl_c => res,
        res = terminate => res,
    };
    received.inspect_err(|e| error!("Error while waiting for shutdown signal: {e}"))
}

fn signal_error(err: &io::Error, context: &'static str) -> BoostError {
    BoostError::Internal { message: err.to_string().into(), context: Some(context.into()) }
}
