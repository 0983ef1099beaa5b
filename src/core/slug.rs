//! Slug derivation
//!
//! A slug is the canonical, URL-safe key of a display name. Two names that
//! differ only in case or in surrounding/repeated whitespace share a slug,
//! which is what makes slug uniqueness enforce name uniqueness.

use deunicode::deunicode_char;
use sha2::{Digest, Sha256};

/// Prefix of slugs for names with no letters or digits left after transliteration
const FALLBACK_PREFIX: &str = "n-";

/// Derive the slug of a display name.
///
/// The name is transliterated to ASCII first ("Café" becomes `cafe`). ASCII
/// letters and digits are kept (lowercased); every other run of characters
/// collapses into a single `-`, and leading/trailing separators are dropped.
///
/// A letter or digit with no ASCII rendering would otherwise vanish and let
/// distinct names share a slug, so such names get a short hash of the
/// normalized name appended. Names with nothing left at all get a hash-only
/// slug instead of an empty one.
pub fn slugify(name: &str) -> String {
    let mut text = String::with_capacity(name.len());
    let mut lossy = false;
    for c in name.trim().chars() {
        if c.is_ascii() {
            text.push(c);
            continue;
        }
        match deunicode_char(c) {
            Some(ascii) if ascii.chars().any(|a| a.is_ascii_alphanumeric()) => text.push_str(ascii),
            other => {
                lossy |= c.is_alphanumeric();
                text.push_str(other.unwrap_or(" "));
            }
        }
    }

    let mut slug = String::with_capacity(text.len());
    let mut pending_sep = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('-');
            }
            pending_sep = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }

    if slug.is_empty() {
        return format!("{}{}", FALLBACK_PREFIX, name_hash(name, 8));
    }
    if lossy {
        slug.push('-');
        slug.push_str(&name_hash(name, 4));
    }
    slug
}

/// Normalize a name for comparison: trim, collapse whitespace, lowercase
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Hex of the first `bytes` bytes of the normalized name's SHA-256
fn name_hash(name: &str, bytes: usize) -> String {
    let digest = Sha256::digest(normalize_name(name).as_bytes());
    digest.iter().take(bytes).map(|b| format!("{:02x}", b)).collect()
}
