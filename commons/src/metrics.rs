//! Metrics service, shared between the gateway and worker binaries.

use actix_web::HttpResponse;
use anyhow::Result;
use prometheus::{self, Registry};

/// For types that store a static Registry reference.
pub trait HasRegistry {
    /// Get the static registry reference.
    fn registry(&self) -> &'static Registry;
}

/// Minimally wraps a Registry for implementing `HasRegistry`.
pub struct RegistryWrapper(pub &'static Registry);

impl HasRegistry for RegistryWrapper {
    fn registry(&self) -> &'static Registry {
        self.0
    }
}

/// Serve metrics requests (Prometheus textual format).
pub async fn serve<T>(app_data: actix_web::web::Data<T>) -> actix_web::Result<HttpResponse>
where
    T: 'static + HasRegistry,
{
    use prometheus::Encoder;

    let metrics = app_data.registry().gather();
    let content = {
        let tenc = prometheus::TextEncoder::new();
        let mut buf = vec![];
        tenc.encode(&metrics, &mut buf)
            .map_err(actix_web::error::ErrorInternalServerError)?;
        buf
    };

    Ok(HttpResponse::Ok().body(content))
}

/// Create a custom Prometheus registry.
pub fn new_registry(prefix: Option<String>) -> Result<Registry> {
    Registry::new_custom(prefix.clone(), None)
        .map_err(|e| anyhow::anyhow!("could not create a custom registry with prefix {:?}: {}", prefix, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn serve_metrics_basic() -> Result<()> {
        let rt = testing::init_runtime()?;

        let metrics_prefix = "jobcore";
        let registry_wrapped = RegistryWrapper(Box::leak(Box::new(new_registry(Some(
            metrics_prefix.to_string(),
        ))?)));

        testing::dummy_gauge(registry_wrapped.0, 42.0)?;

        let metrics_call = serve::<RegistryWrapper>(actix_web::web::Data::new(registry_wrapped));
        let resp = rt.block_on(metrics_call).unwrap();

        assert_eq!(resp.status(), 200);
        let body = actix_web::body::to_bytes(resp.into_body());
        let bytes = rt.block_on(body).unwrap();
        assert!(memchr::memmem::find(
            &bytes,
            format!("{}_dummy_gauge 42\n", metrics_prefix).as_bytes()
        )
        .is_some());

        Ok(())
    }
}
