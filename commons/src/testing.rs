//! Test helpers.

use anyhow::Result;
use tokio::runtime::Runtime;

/// Initialize logging.
pub fn init_logger() -> Result<()> {
    let _ = env_logger::try_init_from_env(env_logger::Env::default());
    Ok(())
}

/// Initialize a tokio runtime for tests, with logging.
pub fn init_runtime() -> Result<Runtime> {
    let _ = init_logger();
    Ok(Runtime::new()?)
}

/// Register a dummy gauge, with given value.
pub fn dummy_gauge(registry: &prometheus::Registry, value: f64) -> Result<()> {
    let test_gauge = prometheus::Gauge::new("dummy_gauge", "dummy help")?;
    test_gauge.set(value);
    registry.register(Box::new(test_gauge))?;
    Ok(())
}
