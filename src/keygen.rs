//! License key generation.
//!
//! Keys look like `LIC-1A2B-3C4D-5E6F`: a fixed brand prefix followed by three
//! groups of four uppercase hex characters (48 random bits).

use rand::RngCore;
use rand::rngs::OsRng;

/// Brand prefix shared by every license key.
pub const KEY_PREFIX: &str = "LIC";

const GROUPS: usize = 3;
const GROUP_LEN: usize = 4;

/// Source of candidate license keys.
///
/// Implementations don't need to guarantee uniqueness; the ledger checks each
/// candidate against the store and asks again on collision.
pub trait KeyGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Draws keys from the operating system's CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsKeyGenerator;

impl KeyGenerator for OsKeyGenerator {
    fn generate(&self) -> String {
        let mut bytes = [0u8; GROUPS * GROUP_LEN / 2];
        OsRng.fill_bytes(&mut bytes);
        format_key(&bytes)
    }
}

/// Format raw bytes as `LIC-XXXX-XXXX-XXXX`.
fn format_key(bytes: &[u8; GROUPS * GROUP_LEN / 2]) -> String {
    let hex = hex::encode_upper(bytes);
    let groups: Vec<&str> = (0..GROUPS)
        .map(|i| &hex[i * GROUP_LEN..(i + 1) * GROUP_LEN])
        .collect();
    format!("{}-{}", KEY_PREFIX, groups.join("-"))
}

/// Validate that a string has the shape of a license key.
pub fn is_valid_license_key(s: &str) -> bool {
    let Some(rest) = s.strip_prefix(KEY_PREFIX).and_then(|r| r.strip_prefix('-')) else {
        return false;
    };

    let groups: Vec<&str> = rest.split('-').collect();
    groups.len() == GROUPS
        && groups.iter().all(|g| {
            g.len() == GROUP_LEN
                && g.chars()
                    .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
        })
}
