use chrono::{DateTime, Utc};
use rand::Rng;

const SUFFIX_LEN: usize = 5;
const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Human-readable order reference: route, ship, second-resolution
/// timestamp and a short random suffix to break same-second collisions.
/// The storage layer keeps a unique index on it regardless.
pub fn generate(route_alias: &str, ship_alias: &str, at: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();

    format!(
        "ID-{}-{}{}-{}",
        route_alias,
        ship_alias,
        at.format("%Y%m%d%H%M%S"),
        suffix
    )
}
