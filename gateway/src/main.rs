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

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use broker::redis_client::RedisBroker;
use broker::BrokerClient;
use gateway::config::AppSettings;
use gateway::state::State;
use gateway::{routes, token_store};
use log::info;
use std::sync::Arc;
use std::time::Duration;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = AppSettings::assemble()?;

    env_logger::Builder::from_default_env()
        .filter(Some("gateway"), settings.verbosity)
        .filter(Some("broker"), settings.verbosity)
        .filter(Some("commons"), settings.verbosity)
        .try_init()
        .ok();

    info!("starting gateway on {}:{}", settings.address, settings.port);

    let result_ttl = Duration::from_secs(settings.job_result_ttl_secs);
    let broker = RedisBroker::connect(&settings.broker_url, result_ttl).await?;
    let broker: Arc<dyn BrokerClient> = Arc::new(broker);

    let address = settings.address;
    let port = settings.port;
    let state = State::new(settings, broker);

    spawn_token_sweeper(state.tokens.clone());

    let registry: &'static prometheus::Registry =
        Box::leak(Box::new(gateway::metrics::new_registry()?));

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(actix_web::middleware::Logger::default())
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(gateway::metrics::RegistryWrapper(registry)))
            .app_data(web::JsonConfig::default().limit(16 * 1024 * 1024))
            .configure(routes::configure)
    })
    .bind((address, port))?
    .run()
    .await?;

    Ok(())
}

fn spawn_token_sweeper(tokens: Arc<token_store::TokenStore>) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(60)).await;
            tokens.sweep(chrono::Utc::now());
        }
    });
}
