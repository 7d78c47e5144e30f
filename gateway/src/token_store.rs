//! The artifact token service (spec §4.6, C6).
//!
//! Tokens are kept in process memory (spec §9 Open Question: "whether the
//! token store should persist across gateway restarts" — resolved in
//! `SPEC_FULL.md` in favor of in-process storage; tokens lose validity on
//! restart, which spec §4.6 explicitly allows).

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::RngCore;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
struct TokenEntry {
    path: PathBuf,
    expires_at: DateTime<Utc>,
}

/// Mints and redeems short-lived opaque download tokens bound to a single
/// filesystem path (spec §4.6). Write-by-gateway, read-by-gateway; workers
/// never touch this store (spec §8).
pub struct TokenStore {
    default_ttl: Duration,
    entries: Mutex<HashMap<String, TokenEntry>>,
}

/// Why a presented token was rejected (spec §7: `404` for unknown tokens,
/// `410` for expired ones, without disclosing which is which beyond that
/// distinction — spec §4.6 "rejects forgeries without disclosing which
/// failure occurred").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemError {
    Unknown,
    Expired,
}

impl TokenStore {
    pub fn new(default_ttl: Duration) -> Self {
        TokenStore {
            default_ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Mint a token for `path`, valid until `now + default_ttl`.
    pub fn mint(&self, path: PathBuf, now: DateTime<Utc>) -> (String, DateTime<Utc>) {
        let token = generate_token();
        let expires_at = now + chrono::Duration::from_std(self.default_ttl).unwrap_or_default();
        self.entries.lock().insert(
            token.clone(),
            TokenEntry {
                path,
                expires_at,
            },
        );
        (token, expires_at)
    }

    /// Redeem `token` at `now`, returning the artifact path if it is both
    /// known and not yet expired (spec §8 invariant I5: "A valid token for
    /// path `p` cannot yield any bytes outside the file at `p`").
    pub fn redeem(&self, token: &str, now: DateTime<Utc>) -> Result<PathBuf, RedeemError> {
        let entries = self.entries.lock();
        let entry = entries.get(token).ok_or(RedeemError::Unknown)?;
        if now >= entry.expires_at {
            return Err(RedeemError::Expired);
        }
        Ok(entry.path.clone())
    }

    /// Drop tokens that have expired, bounding memory growth.
    pub fn sweep(&self, now: DateTime<Utc>) {
        self.entries.lock().retain(|_, e| e.expires_at > now);
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    base16_encode(&bytes)
}

fn base16_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0x0f) as usize] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_then_redeem_immediately_succeeds() {
        let store = TokenStore::new(Duration::from_secs(1800));
        let now = Utc::now();
        let (token, expires_at) = store.mint(PathBuf::from("/output/converted/a.glb"), now);
        assert!(expires_at > now);
        let path = store.redeem(&token, now).unwrap();
        assert_eq!(path, PathBuf::from("/output/converted/a.glb"));
    }

    #[test]
    fn redeem_after_expiry_is_rejected() {
        let store = TokenStore::new(Duration::from_secs(1));
        let now = Utc::now();
        let (token, _) = store.mint(PathBuf::from("/output/converted/a.glb"), now);
        let later = now + chrono::Duration::seconds(2);
        assert_eq!(store.redeem(&token, later), Err(RedeemError::Expired));
    }

    #[test]
    fn unknown_token_is_rejected() {
        let store = TokenStore::new(Duration::from_secs(1800));
        assert_eq!(
            store.redeem("does-not-exist", Utc::now()),
            Err(RedeemError::Unknown)
        );
    }

    #[test]
    fn sweep_drops_only_expired_entries() {
        let store = TokenStore::new(Duration::from_secs(1));
        let now = Utc::now();
        let (live, _) = store.mint(PathBuf::from("/output/a"), now);
        let (dead, _) = store.mint(PathBuf::from("/output/b"), now - chrono::Duration::seconds(10));
        store.sweep(now);
        assert!(store.redeem(&live, now).is_ok());
        assert_eq!(store.redeem(&dead, now), Err(RedeemError::Unknown));
    }
}
