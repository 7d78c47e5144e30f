// Copyright 2018 Alex Crawford
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use actix_web::{web, App, HttpResponse, HttpServer};
use broker::redis_client::RedisBroker;
use broker::BrokerClient;
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use worker::config::WorkerSettings;
use worker::handlers::HandlerContext;
use worker::runtime::Runtime;
use worker::{cleanup, metrics};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = WorkerSettings::assemble()?;

    env_logger::Builder::from_default_env()
        .filter(Some("worker"), settings.verbosity)
        .filter(Some("broker"), settings.verbosity)
        .filter(Some("commons"), settings.verbosity)
        .try_init()
        .ok();

    let queue = settings.canonical_queue().to_string();
    info!("starting worker on queue {}", queue);

    // The worker runtime has no result TTL of its own to apply; it only
    // ever reads/writes job records, never reaps them (spec §4.1 is the
    // gateway-facing retention boundary).
    let broker = RedisBroker::connect(&settings.broker_url, Duration::from_secs(0)).await?;
    let broker: Arc<dyn BrokerClient> = Arc::new(broker);

    let ctx = HandlerContext {
        uploads_root: settings.uploads_root.clone(),
        output_root: settings.output_root.clone(),
    };

    let registry: &'static prometheus::Registry = Box::leak(Box::new(metrics::new_registry()?));
    let metrics_address = settings.metrics_address;
    let metrics_port = settings.metrics_port;
    let metrics_server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(metrics::RegistryWrapper(registry)))
            .route(
                "/metrics",
                web::get().to(commons::metrics::serve::<metrics::RegistryWrapper>),
            )
            .route("/health", web::get().to(|| async { HttpResponse::Ok().body("ok") }))
    })
    .bind((metrics_address, metrics_port))?
    .run();

    let shutdown = Arc::new(AtomicBool::new(false));
    spawn_shutdown_listener(shutdown.clone());

    if let Some(subdir) = cleanup::swept_subdir(&queue) {
        let root = settings.output_root.join(subdir);
        let max_age = Duration::from_secs(settings.cleanup_max_age_secs);
        let interval = Duration::from_secs(settings.cleanup_interval_secs);
        info!("cleanup sweep enabled for {}", root.display());
        tokio::spawn(cleanup::run(root, max_age, interval));
    }

    let runtime = Runtime::new(broker, queue, ctx);
    let run_loop = runtime.run(shutdown);

    tokio::select! {
        result = metrics_server => result.map_err(anyhow::Error::from)?,
        _ = run_loop => {}
    }

    Ok(())
}

/// Observe SIGINT/SIGTERM and flip `shutdown` so the next idle tick of the
/// block-pop loop (spec §4.3: "a bounded wait ... so shutdown signals are
/// observable between pops") exits cleanly.
fn spawn_shutdown_listener(shutdown: Arc<AtomicBool>) {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
            tokio::select! {
                _ = ctrl_c => {}
                _ = sigterm.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
        }
        info!("shutdown signal received, finishing current job before exit");
        shutdown.store(true, Ordering::Relaxed);
    });
}
