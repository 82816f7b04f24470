use actix_web::dev::ServerHandle;
use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::{error, info, warn};
use std::future;
use std::io;
use std::sync::Arc;

use pulse_chain::api::{self, AppState};
use pulse_chain::blockchain::Ledger;
use pulse_chain::config::ChainConfig;

#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = ChainConfig::from_env().map_err(|e| {
        error!("invalid configuration: {e}");
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;
    let (host, port) = (config.host.clone(), config.port);

    println!("⛓️ Starting blockchain API at http://{host}:{port}");

    let ledger = Arc::new(Ledger::new(config.consensus));
    let state = web::Data::new(AppState::new(Arc::clone(&ledger)));

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .disable_signals()
    .bind((host.as_str(), port))?
    .run();

    // in-flight mining must end before the workers can drain
    let handle = server.handle();
    stop_on(
        "Ctrl-C",
        async {
            if actix_web::rt::signal::ctrl_c().await.is_err() {
                future::pending::<()>().await;
            }
        },
        Arc::clone(&ledger),
        handle.clone(),
    );

    #[cfg(unix)]
    {
        use actix_web::rt::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => stop_on(
                "SIGTERM",
                async move {
                    term.recv().await;
                },
                Arc::clone(&ledger),
                handle,
            ),
            Err(e) => warn!("cannot listen for SIGTERM: {e}"),
        }
    }

    server.await
}

/// Cancel mining and stop the server gracefully once `signal` resolves.
fn stop_on<F>(name: &'static str, signal: F, ledger: Arc<Ledger>, handle: ServerHandle)
where
    F: Future<Output = ()> + 'static,
{
    actix_web::rt::spawn(async move {
        signal.await;
        info!("{name} received, shutting down");
        ledger.cancel_mining();
        handle.stop(true).await;
    });
}
