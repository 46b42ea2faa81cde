use crate::{
    app::AppContext,
    auth::AuthModule,
    config::Config,
    error::{PortalError, Result},
    flags::list_flags,
    health::health_handler,
    http::RouteModule,
    lessons::LessonsModule,
    middleware::MakeRequestUuid,
};
use axum::{Router, extract::DefaultBodyLimit, routing::get};
use tokio::signal;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

/// The coursegate HTTP application
///
/// Built from a validated [`Config`]; every route module is registered up front.
pub struct App {
    router: Router<AppContext>,
    config: Config,
    context: AppContext,
}

impl App {
    /// Creates the application with a context derived from `config`
    pub fn new(config: Config) -> Self {
        let context = AppContext::from_config(&config);
        Self::with_context(config, context)
    }

    /// Creates the application with an explicit context, e.g. with stub providers
    pub fn with_context(config: Config, context: AppContext) -> Self {
        let router = Router::<AppContext>::new()
            .route("/health", get(health_handler))
            .route("/flags", get(list_flags));

        Self {
            router,
            config,
            context,
        }
        .register_module(AuthModule)
        .register_module(LessonsModule)
    }

    pub fn register_module<M: RouteModule>(mut self, module: M) -> Self {
        self.router = module.register(self.router);
        self
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// The fully layered router with state applied
    ///
    /// Used by `serve` and by tests driving requests in-process.
    pub fn into_router(self) -> Router {
        // Last layer is outermost: the request id exists before tracing starts.
        self.router
            .layer(DefaultBodyLimit::max(self.config.server.max_body_size))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .with_state(self.context)
    }

    /// Bind the configured address and serve until Ctrl+C or SIGTERM
    pub async fn serve(self) -> Result<()> {
        let addr = self.config.server.addr().map_err(|e| {
            PortalError::internal(format!("Invalid server address in config: {}", e))
        })?;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| PortalError::internal(format!("Failed to bind {}: {}", addr, e)))?;

        tracing::info!("Server starting on http://{}", addr);
        tracing::info!("Health check available at http://{}/health", addr);

        axum::serve(listener, self.into_router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| PortalError::internal(format!("Server error: {}", e)))?;

        tracing::info!("Shutdown complete");
        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, starting graceful shutdown");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use crate::testing;

    fn app() -> Router {
        App::new(ConfigBuilder::new().build().unwrap()).into_router()
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let response = testing::get(app(), "/health").execute().await.assert_ok();
        assert!(response.response().headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_unknown_route() {
        testing::get(app(), "/nope").execute().await.assert_not_found();
    }

    #[tokio::test]
    async fn test_body_limit() {
        let config = ConfigBuilder::new().with_max_body_size(16).build().unwrap();
        let router = App::new(config).into_router();

        testing::post(router, "/webhooks/video")
            .header("x-signature", "sha256=00")
            .raw_body(vec![b'a'; 64])
            .execute()
            .await
            .assert_status(axum::http::StatusCode::PAYLOAD_TOO_LARGE);
    }
}
