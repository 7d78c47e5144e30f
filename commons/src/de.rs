//! Deserializers.

/// Deserialize a comma-separated set of CIDR ranges from a single string.
pub fn de_allowed_ranges<'de, D>(deserializer: D) -> Result<Option<Vec<ipnet::IpNet>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;
    let raw = String::deserialize(deserializer)?;
    Ok(Some(crate::admission::parse_allowed_ranges(raw)))
}

/// Deserialize a log-level from a numerical value.
pub fn de_loglevel<'de, D>(deserializer: D) -> Result<Option<log::LevelFilter>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;
    let numlevel = u8::deserialize(deserializer)?;

    let verbosity = match numlevel {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    Ok(Some(verbosity))
}
