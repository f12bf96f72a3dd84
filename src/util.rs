use anyhow::{Context, Result};
use memchr::memmem;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Number of hex characters of the digest that end up in a hashed filename.
pub(crate) const HASH_LEN: usize = 8;

pub(crate) fn hash_path_contents(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(hash_bytes(&bytes))
}

pub(crate) fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest: [u8; 32] = hasher.finalize().into();
    let mut hex = hex::encode(digest);
    hex.truncate(HASH_LEN);
    hex
}

/// Replaces every non-overlapping occurrence of `from` in `haystack` with `to`. Works on bytes so
/// that files which are not valid UTF-8 can still have an ASCII file name rewritten.
pub(crate) fn replace_bytes(haystack: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    let mut replaced = Vec::with_capacity(haystack.len());
    let mut last = 0;
    for start in memmem::find_iter(haystack, from) {
        replaced.extend_from_slice(&haystack[last..start]);
        replaced.extend_from_slice(to);
        last = start + from.len();
    }
    replaced.extend_from_slice(&haystack[last..]);
    replaced
}

/// Splices `hash` into `name` as a new segment after the first dot-separated component, e.g.,
/// `main.dart.js` becomes `main.<hash>.dart.js`.
pub(crate) fn hashed_name(name: &str, hash: &str) -> String {
    match name.split_once('.') {
        Some((stem, rest)) => format!("{stem}.{hash}.{rest}"),
        None => format!("{name}.{hash}"),
    }
}

/// Inverse check for `hashed_name`: does `candidate` look like `name` with some hash spliced in?
pub(crate) fn is_hashed_name(name: &str, candidate: &str) -> bool {
    let (prefix, suffix) = match name.split_once('.') {
        Some((stem, rest)) => (format!("{stem}."), format!(".{rest}")),
        None => (format!("{name}."), String::new()),
    };
    let Some(middle) = candidate
        .strip_prefix(&prefix)
        .and_then(|s| s.strip_suffix(&suffix))
    else {
        return false;
    };
    middle.len() == HASH_LEN
        && middle
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}
