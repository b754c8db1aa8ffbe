use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::routing::post;
use axum::Router;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};

use crate::application::shutdown::Shutdown;
use crate::application::supervisor::Component;
use crate::config::ServerConfig;
use crate::domain::errors::WorkerError;
use crate::infrastructure::node::ChainRpc;
use crate::infrastructure::persistence::Store;
use crate::infrastructure::web::handlers::{
    build_signed_transaction, build_unsigned_transaction, business_register, export_addresses,
    submit_withdraw, AppState,
};
use crate::utils::logging;

/// The exposed tenant-facing HTTP service
pub struct WebService {
    addr: String,
    state: AppState,
    shutdown: Shutdown,
    tasks: Vec<JoinHandle<()>>,
    stopped: AtomicBool,
}

impl WebService {
    pub fn new(
        config: &ServerConfig,
        chain: &crate::config::NodeConfig,
        store: Store,
        rpc: Arc<dyn ChainRpc>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            addr: config.addr(),
            state: AppState {
                store,
                rpc,
                consumer_token: config.consumer_token.clone(),
                chain: chain.chain.clone(),
                network: chain.network.clone(),
            },
            shutdown,
            tasks: Vec::new(),
            stopped: AtomicBool::new(false),
        }
    }

    pub fn router(state: AppState) -> Router {
        let cors = CorsLayer::new().allow_origin(Any).allow_headers(Any);

        Router::new()
            .route("/business/register", post(business_register))
            .route("/addresses/export", post(export_addresses))
            .route("/withdraw/unsigned", post(build_unsigned_transaction))
            .route("/withdraw/signed", post(build_signed_transaction))
            .route("/withdraw/submit", post(submit_withdraw))
            .layer(cors)
            .with_state(state)
    }

    pub fn start(&mut self) -> Result<(), WorkerError> {
        if self.stopped.load(Ordering::SeqCst) {
            return Ok(());
        }
        let addr = self.addr.clone();
        let app = Self::router(self.state.clone());
        let shutdown = self.shutdown.clone();

        self.tasks.push(tokio::spawn(async move {
            logging::log_info(&format!("starting rpc server on {}", addr));
            let listener = match tokio::net::TcpListener::bind(&addr).await {
                Ok(listener) => listener,
                Err(e) => {
                    shutdown.handle_crit(format!("failed to bind {}: {}", addr, e));
                    return;
                }
            };

            let cancel = shutdown.clone();
            let serve = axum::serve(listener, app)
                .with_graceful_shutdown(async move { cancel.cancelled().await });
            if let Err(e) = serve.await {
                shutdown.handle_crit(format!("rpc server failed: {}", e));
            }
        }));

        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), WorkerError> {
        self.stopped.store(true, Ordering::SeqCst);
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
        logging::log_info("rpc server stopped");
        Ok(())
    }
}

#[async_trait::async_trait]
impl Component for WebService {
    fn name(&self) -> &'static str {
        "rpc-server"
    }

    fn start(&mut self) -> Result<(), WorkerError> {
        WebService::start(self)
    }

    async fn close(&mut self) -> Result<(), WorkerError> {
        WebService::close(self).await
    }
}
