//! HTTP route registration (spec §6). Health is exempt from admission; every
//! other route requires an [`crate::admission::Admitted`] extraction.

pub mod enqueue;
pub mod health;
pub mod patch;
pub mod status;
pub mod tokens;
pub mod upload;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    enqueue::configure(cfg);
    status::configure(cfg);
    patch::configure(cfg);
    tokens::configure(cfg);
    upload::configure(cfg);
    health::configure(cfg);
}
