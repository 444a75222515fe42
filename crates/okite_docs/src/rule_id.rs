//! Rule identifiers.
//!
//! A rule identifier is `<prefix>-<ulid>`: a lowercase, possibly hyphenated prefix followed by a
//! 26-character ULID in Crockford base32 (48-bit millisecond timestamp + 80 random bits). The
//! suffix is accepted in either case; the canonical and generated form is always lowercase.

use chrono::{DateTime, TimeZone, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// Length of the ULID suffix in characters.
pub const ULID_LEN: usize = 26;

/// Largest timestamp representable in the 48-bit timestamp field.
pub const MAX_TIMESTAMP_MS: u64 = (1u64 << 48) - 1;

const CROCKFORD: &[u8; 32] = b"0123456789abcdefghjkmnpqrstvwxyz";
const RANDOM_BITS: u32 = 80;
const RANDOM_MASK: u128 = (1u128 << RANDOM_BITS) - 1;

/// Structural ULID validation failures.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum UlidError {
    #[error("expected 26 characters, found {0}")]
    Length(usize),
    #[error("character `{0}` is not in the ULID alphabet")]
    Character(char),
    #[error("leading character `{0}` overflows the 48-bit timestamp")]
    Overflow(char),
    #[error("timestamp {0}ms exceeds the 48-bit range")]
    TimestampOverflow(u64),
}

/// Rule identifier parse and generation failures.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum RuleIdError {
    #[error("`{0}` does not end with `-<26-character ULID>`")]
    MissingSuffix(String),
    #[error("rule identifier prefix is empty")]
    EmptyPrefix,
    #[error("prefix `{0}` must match `[a-z0-9][a-z0-9-]*`")]
    InvalidPrefix(String),
    #[error("suffix `{suffix}` is not a valid ULID: {source}")]
    InvalidSuffix {
        suffix: String,
        #[source]
        source: UlidError,
    },
    #[error("random component exhausted within one millisecond")]
    RandomOverflow,
    #[error("system clock reports a time before the Unix epoch ({0}ms)")]
    Clock(i64),
    #[error(transparent)]
    Ulid(#[from] UlidError),
}

/// A 128-bit lexicographically sortable unique identifier.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Ulid(u128);

impl Ulid {
    /// Build a ULID from its timestamp and random components.
    ///
    /// Random bits above the 80-bit field are discarded.
    pub fn from_parts(timestamp_ms: u64, random: u128) -> Result<Self, UlidError> {
        if timestamp_ms > MAX_TIMESTAMP_MS {
            return Err(UlidError::TimestampOverflow(timestamp_ms));
        }
        Ok(Self(
            (u128::from(timestamp_ms) << RANDOM_BITS) | (random & RANDOM_MASK),
        ))
    }

    /// Millisecond Unix timestamp encoded in the first 48 bits.
    pub fn timestamp_ms(self) -> u64 {
        (self.0 >> RANDOM_BITS) as u64
    }

    /// The 80-bit random component.
    pub fn random(self) -> u128 {
        self.0 & RANDOM_MASK
    }

    /// Timestamp as a UTC instant.
    pub fn datetime(self) -> Option<DateTime<Utc>> {
        let millis = i64::try_from(self.timestamp_ms()).ok()?;
        Utc.timestamp_millis_opt(millis).single()
    }

    /// Raw 128-bit value.
    pub fn as_u128(self) -> u128 {
        self.0
    }
}

fn decode_char(ch: char) -> Option<u8> {
    let lower = ch.to_ascii_lowercase();
    CROCKFORD
        .iter()
        .position(|b| char::from(*b) == lower)
        .map(|idx| idx as u8)
}

impl FromStr for Ulid {
    type Err = UlidError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let count = text.chars().count();
        if count != ULID_LEN {
            return Err(UlidError::Length(count));
        }
        let mut value = 0u128;
        for (idx, ch) in text.chars().enumerate() {
            let digit = decode_char(ch).ok_or(UlidError::Character(ch))?;
            if idx == 0 && digit > 7 {
                return Err(UlidError::Overflow(ch));
            }
            value = (value << 5) | u128::from(digit);
        }
        Ok(Self(value))
    }
}

impl Display for Ulid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut out = String::with_capacity(ULID_LEN);
        for idx in 0..ULID_LEN {
            let shift = 5 * (ULID_LEN - 1 - idx);
            let digit = ((self.0 >> shift) & 0x1f) as usize;
            out.push(char::from(CROCKFORD[digit]));
        }
        f.write_str(&out)
    }
}

/// A parsed `<prefix>-<ulid>` rule identifier.
///
/// The prefix is stored lowercased. [`RuleId::has_canonical_case`] remembers whether the parsed
/// text spelled the prefix in lowercase, so callers can report casing drift without rejecting the
/// identifier.
#[derive(Clone, Debug)]
pub struct RuleId {
    prefix: String,
    suffix: Ulid,
    canonical_case: bool,
}

impl RuleId {
    /// Parse a rule identifier.
    ///
    /// The trailing 26 characters are the suffix and must be preceded by `-`; everything before
    /// that hyphen is the prefix, which may itself contain hyphens.
    pub fn parse(text: &str) -> Result<Self, RuleIdError> {
        let (prefix, suffix) =
            split_suffix(text).ok_or_else(|| RuleIdError::MissingSuffix(text.to_string()))?;
        let lowered = normalize_prefix(prefix)?;
        let ulid = suffix
            .parse::<Ulid>()
            .map_err(|source| RuleIdError::InvalidSuffix {
                suffix: suffix.to_string(),
                source,
            })?;
        Ok(Self {
            canonical_case: lowered == prefix,
            prefix: lowered,
            suffix: ulid,
        })
    }

    /// Whether `text` parses as a rule identifier.
    pub fn is_valid(text: &str) -> bool {
        Self::parse(text).is_ok()
    }

    /// Assemble an identifier from a prefix and an existing ULID.
    pub fn new(prefix: &str, suffix: Ulid) -> Result<Self, RuleIdError> {
        Ok(Self {
            prefix: normalize_prefix(prefix)?,
            suffix,
            canonical_case: true,
        })
    }

    /// Lowercased prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// ULID suffix.
    pub fn suffix(&self) -> Ulid {
        self.suffix
    }

    /// `false` when the parsed text used uppercase letters in the prefix.
    pub fn has_canonical_case(&self) -> bool {
        self.canonical_case
    }

    /// Canonical lowercase text form.
    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl PartialEq for RuleId {
    fn eq(&self, other: &Self) -> bool {
        self.prefix == other.prefix && self.suffix == other.suffix
    }
}

impl Eq for RuleId {}

impl Display for RuleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.suffix)
    }
}

impl FromStr for RuleId {
    type Err = RuleIdError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text)
    }
}

fn split_suffix(text: &str) -> Option<(&str, &str)> {
    let (start, _) = text.char_indices().rev().nth(ULID_LEN - 1)?;
    let (head, tail) = text.split_at(start);
    let prefix = head.strip_suffix('-')?;
    Some((prefix, tail))
}

fn normalize_prefix(prefix: &str) -> Result<String, RuleIdError> {
    if prefix.is_empty() {
        return Err(RuleIdError::EmptyPrefix);
    }
    let lowered = prefix.to_ascii_lowercase();
    let mut chars = lowered.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    let tail_ok = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !(head_ok && tail_ok) {
        return Err(RuleIdError::InvalidPrefix(prefix.to_string()));
    }
    Ok(lowered)
}

/// Rule identifier generator.
///
/// In monotonic mode, an identifier requested in the same millisecond as (or earlier than) the
/// previous one reuses the previous timestamp and increments the random component, so a batch
/// sorts in generation order.
#[derive(Clone, Debug, Default)]
pub struct RuleIdGenerator {
    monotonic: bool,
    last: Option<Ulid>,
}

impl RuleIdGenerator {
    /// Generator that draws fresh randomness for every identifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generator that keeps same-millisecond batches strictly increasing.
    pub fn monotonic() -> Self {
        Self {
            monotonic: true,
            last: None,
        }
    }

    /// Generate an identifier stamped with the current instant.
    pub fn generate(&mut self, prefix: &str) -> Result<RuleId, RuleIdError> {
        let now = Utc::now().timestamp_millis();
        let now = u64::try_from(now).map_err(|_| RuleIdError::Clock(now))?;
        self.generate_at(prefix, now)
    }

    /// Generate an identifier stamped with `timestamp_ms`.
    pub fn generate_at(&mut self, prefix: &str, timestamp_ms: u64) -> Result<RuleId, RuleIdError> {
        let prefix = normalize_prefix(prefix)?;
        let suffix = self.next_ulid(timestamp_ms)?;
        Ok(RuleId {
            prefix,
            suffix,
            canonical_case: true,
        })
    }

    fn next_ulid(&mut self, timestamp_ms: u64) -> Result<Ulid, RuleIdError> {
        let ulid = match self.last {
            Some(last) if self.monotonic && timestamp_ms <= last.timestamp_ms() => {
                let random = last.random() + 1;
                if random > RANDOM_MASK {
                    return Err(RuleIdError::RandomOverflow);
                }
                Ulid::from_parts(last.timestamp_ms(), random)?
            }
            _ => Ulid::from_parts(timestamp_ms, random_bits())?,
        };
        self.last = Some(ulid);
        Ok(ulid)
    }
}

fn random_bits() -> u128 {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes[6..]);
    u128::from_be_bytes(bytes)
}

/// Parse a rule identifier.
pub fn parse(text: &str) -> Result<RuleId, RuleIdError> {
    RuleId::parse(text)
}

/// Whether `text` is a valid rule identifier.
pub fn is_valid(text: &str) -> bool {
    RuleId::is_valid(text)
}

/// Generate a fresh rule identifier for `prefix`.
pub fn generate(prefix: &str) -> Result<RuleId, RuleIdError> {
    RuleIdGenerator::new().generate(prefix)
}
