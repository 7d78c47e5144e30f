//! Request admission (spec §4.9): either a matching `X-API-Key` header, or
//! a source address within the configured allow-list.

use crate::state::State;
use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use commons::{admission, ErrorKind, JobError};
use futures::future::{ready, Ready};

/// Extracted once a request has been admitted; handlers that take this as
/// an argument are unreachable from a non-admitted request.
pub struct Admitted;

impl FromRequest for Admitted {
    type Error = JobError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = match req.app_data::<web::Data<State>>() {
            Some(state) => state,
            None => {
                return ready(Err(JobError::new(
                    ErrorKind::Auth,
                    "gateway state unavailable",
                )))
            }
        };

        let presented = req
            .headers()
            .get(admission::API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());

        let peer_addr = req.peer_addr().map(|a| a.ip());

        let admitted = admission::is_admitted(
            &state.settings.api_key,
            presented,
            peer_addr,
            &state.settings.allowed_ranges,
        );

        if admitted {
            ready(Ok(Admitted))
        } else {
            crate::metrics::record_admission_rejection(req.path());
            ready(Err(JobError::new(
                ErrorKind::Auth,
                "missing or invalid X-API-Key",
            )))
        }
    }
}
