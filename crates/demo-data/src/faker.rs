//! Fake value generation for seeders.
//!
//! Thin locale-pluggable layer over the `fake` crate plus the handful of
//! helpers the seeders need: slugs, weighted choices, display-friendly
//! prices, and a unique-key pool for natural keys (slug, SKU, email).

use std::collections::HashSet;

use fake::Fake;
use fake::faker::address::en::{CityName, StreetName};
use fake::faker::company::en::CompanyName;
use fake::faker::lorem::en::{Paragraph, Sentence, Words};
use fake::faker::name::en::Name;
use rand::{Rng, RngCore};
use thiserror::Error;

/// Retry bound for unique natural key synthesis.
pub const MAX_KEY_ATTEMPTS: u32 = 10;

#[derive(Debug, Error)]
#[error("could not synthesize a unique key after {attempts} attempts")]
pub struct UniqueKeyExhausted {
    pub attempts: u32,
}

pub fn full_name(rng: &mut dyn RngCore) -> String {
    Name().fake_with_rng(rng)
}

pub fn company_name(rng: &mut dyn RngCore) -> String {
    CompanyName().fake_with_rng(rng)
}

pub fn city(rng: &mut dyn RngCore) -> String {
    CityName().fake_with_rng(rng)
}

pub fn sentence(rng: &mut dyn RngCore) -> String {
    Sentence(4..10).fake_with_rng(rng)
}

pub fn paragraph(rng: &mut dyn RngCore) -> String {
    Paragraph(2..5).fake_with_rng(rng)
}

/// Title-cased phrase of 2-5 words.
pub fn title(rng: &mut dyn RngCore) -> String {
    let words: Vec<String> = Words(2..6).fake_with_rng(rng);
    words
        .into_iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => w,
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Email derived from a display name, with a numeric suffix so collisions
/// across runs stay unlikely even before the unique-key pool kicks in.
pub fn email_for(name: &str, rng: &mut dyn RngCore) -> String {
    let normalized: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(".");

    let suffix: u32 = rng.gen_range(1..9999);
    let domains = ["gmail.com", "outlook.com", "yahoo.com", "proton.me"];
    let domain = domains[rng.gen_range(0..domains.len())];

    format!("{normalized}{suffix}@{domain}")
}

/// Local-format mobile number.
pub fn phone(rng: &mut dyn RngCore) -> String {
    format!("09{:08}", rng.gen_range(0..100_000_000u64))
}

pub fn street_address(rng: &mut dyn RngCore) -> String {
    let street: String = StreetName().fake_with_rng(rng);
    format!("{} {}", rng.gen_range(1..400), street)
}

/// Lowercases, strips punctuation, joins words with dashes.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Picks an option according to its relative weight.
pub fn weighted_choice<'a, T>(options: &'a [(T, f64)], rng: &mut dyn RngCore) -> &'a T {
    let total: f64 = options.iter().map(|(_, w)| w).sum();
    let roll: f64 = rng.gen_range(0.0..total);

    let mut cumulative = 0.0;
    for (value, weight) in options {
        cumulative += weight;
        if roll < cumulative {
            return value;
        }
    }
    &options[options.len() - 1].0
}

pub fn int(rng: &mut dyn RngCore, min: i64, max: i64) -> i64 {
    rng.gen_range(min..=max)
}

/// Price in minor units, rounded down to `step` so amounts look like what a
/// merchant would actually charge.
pub fn money(rng: &mut dyn RngCore, min: i64, max: i64, step: i64) -> i64 {
    let raw = rng.gen_range(min..=max);
    (raw / step).max(1) * step
}

/// Pool of natural keys already used within one seed run. Collisions are
/// resolved by suffixing a counter, bounded at [`MAX_KEY_ATTEMPTS`].
#[derive(Debug, Default)]
pub struct UniqueKeys {
    used: HashSet<String>,
}

impl UniqueKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, base: &str) -> Result<String, UniqueKeyExhausted> {
        if self.used.insert(base.to_string()) {
            return Ok(base.to_string());
        }
        for attempt in 2..=MAX_KEY_ATTEMPTS {
            let candidate = format!("{base}-{attempt}");
            if self.used.insert(candidate.clone()) {
                return Ok(candidate);
            }
        }
        Err(UniqueKeyExhausted {
            attempts: MAX_KEY_ATTEMPTS,
        })
    }
}
