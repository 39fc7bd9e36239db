//! Expansion of patterns into their encoded forms.
//!
//! A secret that is hex- or base-64-encoded elsewhere in a pipeline no
//! longer matches its registered byte sequence. The expander generates
//! those encoded forms up front so the provider catches them as ordinary
//! literal patterns.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE};
use base64::Engine;
use bitflags::bitflags;

use crate::error::{Error, Result};
use crate::pattern::{Pattern, Patterns};

/// Separators inserted between adjacent value bytes for the separated
/// variants.
pub const SEPARATORS: &[u8] = &[b'-', b'_', b':', b'.', b' '];

bitflags! {
    /// Variant classes emitted by the expander.
    #[derive(Default)]
    pub struct VariantFlags: u32 {
        /// Lowercase and uppercase hexadecimal encodings.
        const HEX = 0b0000_0001;
        /// Standard, raw unpadded and URL-safe base-64 encodings.
        const BASE64 = 0b0000_0010;
        /// Every byte percent-encoded, with lowercase and uppercase digits.
        const PERCENT = 0b0000_0100;
        /// The value with a separator inserted between every adjacent pair
        /// of bytes.
        const SEPARATED = 0b0000_1000;
    }
}

impl FromStr for VariantFlags {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut flags = VariantFlags::empty();

        for c in s.chars() {
            match c {
                'h' => flags |= VariantFlags::HEX,
                'b' => flags |= VariantFlags::BASE64,
                'p' => flags |= VariantFlags::PERCENT,
                's' => flags |= VariantFlags::SEPARATED,
                _ => return Err(Error::InvalidFlag(c)),
            }
        }

        Ok(flags)
    }
}

impl fmt::Display for VariantFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.contains(VariantFlags::HEX) {
            write!(f, "h")?
        }
        if self.contains(VariantFlags::BASE64) {
            write!(f, "b")?
        }
        if self.contains(VariantFlags::PERCENT) {
            write!(f, "p")?
        }
        if self.contains(VariantFlags::SEPARATED) {
            write!(f, "s")?
        }
        Ok(())
    }
}

/// Expand `pattern` into its encoded variants.
///
/// The original pattern always comes first, followed by the selected
/// variant classes in a fixed order, every variant sharing the original
/// placeholder. The output is deterministic: the same input always yields
/// the same list in the same order. No deduplication is performed;
/// duplicates are harmless because replacement is idempotent.
///
/// # Examples
///
/// ```
/// use streamscrub::{pattern, expand_pattern, VariantFlags};
///
/// let expanded = expand_pattern(&pattern! { "pw" => "[R]" }, VariantFlags::HEX);
///
/// assert!(expanded.iter().any(|p| p.value == b"7077"));
/// ```
pub fn expand_pattern(pattern: &Pattern, flags: VariantFlags) -> Patterns {
    let value = &pattern.value;
    let derive = |value: Vec<u8>| Pattern {
        value,
        placeholder: pattern.placeholder.clone(),
    };

    let mut variants = vec![pattern.clone()];

    if flags.contains(VariantFlags::HEX) {
        variants.push(derive(hex::encode(value).into_bytes()));
        variants.push(derive(hex::encode_upper(value).into_bytes()));
    }

    if flags.contains(VariantFlags::BASE64) {
        variants.push(derive(STANDARD.encode(value).into_bytes()));
        variants.push(derive(STANDARD_NO_PAD.encode(value).into_bytes()));
        variants.push(derive(URL_SAFE.encode(value).into_bytes()));
    }

    if flags.contains(VariantFlags::PERCENT) {
        variants.push(derive(percent(value, false)));
        variants.push(derive(percent(value, true)));
    }

    if flags.contains(VariantFlags::SEPARATED) {
        for &sep in SEPARATORS {
            variants.push(derive(separated(value, sep)));
        }
    }

    variants
}

/// Expand every pattern in `patterns`, preserving relative order.
pub fn expand_patterns(patterns: &[Pattern], flags: VariantFlags) -> Patterns {
    patterns
        .iter()
        .flat_map(|pattern| expand_pattern(pattern, flags))
        .collect()
}

fn percent(value: &[u8], upper: bool) -> Vec<u8> {
    let mut encoded = Vec::with_capacity(value.len() * 3);

    for &b in value {
        if upper {
            encoded.extend_from_slice(format!("%{:02X}", b).as_bytes());
        } else {
            encoded.extend_from_slice(format!("%{:02x}", b).as_bytes());
        }
    }

    encoded
}

fn separated(value: &[u8], sep: u8) -> Vec<u8> {
    let mut inserted = Vec::with_capacity(value.len() * 2);

    for (i, &b) in value.iter().enumerate() {
        if i > 0 {
            inserted.push(sep);
        }
        inserted.push(b);
    }

    inserted
}
