//! Document identifier allocation.
//!
//! A table allocates ids for documents inserted without one, following the
//! `IdPolicy` it was created with:
//!
//! - `uuid`: a random version-4 UUID rendered as 32 lowercase hex
//!   characters (no hyphens).
//! - `increment`: a per-table counter starting at `initial`, rendered in
//!   `radix`. Radices 2-36 use `0-9a-z`; radix 62 uses [`BASE62_ALPHABET`].
//!
//! ```text
//! increment { initial: 1000, radix: 62 }  →  "g8", "g9", "gA", ...
//! increment { initial: 1, radix: 10 }     →  "1", "2", "3", ...
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Digits for radices 2 through 36.
const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Digit alphabet for radix 62: the value of a digit is its index.
pub const BASE62_ALPHABET: &[u8; 62] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Largest `initial` accepted: the largest integer a JSON number carries exactly.
pub const MAX_INITIAL: u64 = (1 << 53) - 1;

fn default_initial() -> u64 {
    1
}

fn default_radix() -> u32 {
    10
}

/// How a table allocates ids for documents inserted without one.
///
/// Serialized the way clients send it at table creation:
///
/// ```json
/// {"type": "uuid"}
/// {"type": "increment", "initial": 1000, "radix": 62}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum IdPolicy {
    Uuid,
    Increment {
        #[serde(default = "default_initial")]
        initial: u64,
        #[serde(default = "default_radix")]
        radix: u32,
    },
}

impl Default for IdPolicy {
    fn default() -> Self {
        IdPolicy::Increment {
            initial: default_initial(),
            radix: default_radix(),
        }
    }
}

impl IdPolicy {
    /// Increment policy with the default radix.
    pub fn increment(initial: u64) -> Self {
        IdPolicy::Increment {
            initial,
            radix: default_radix(),
        }
    }

    /// Rejects radices outside 2..=36 and 62, and `initial` above [`MAX_INITIAL`].
    pub fn validate(&self) -> Result<()> {
        match self {
            IdPolicy::Uuid => Ok(()),
            IdPolicy::Increment { initial, .. } if *initial > MAX_INITIAL => Err(Error::Validation(
                format!("Invalid initial {}: must not exceed {}", initial, MAX_INITIAL),
            )),
            IdPolicy::Increment { radix, .. } if (2..=36).contains(radix) || *radix == 62 => Ok(()),
            IdPolicy::Increment { radix, .. } => Err(Error::Validation(format!(
                "Invalid radix {}: must be between 2 and 36, or 62",
                radix
            ))),
        }
    }
}

/// Allocation state for one table.
///
/// The cursor is lazily initialized to `initial` on the first allocation and
/// only moves forward. Callers serialize access through the table lock.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    policy: IdPolicy,
    next_id: Option<u64>,
}

impl IdAllocator {
    pub fn new(policy: IdPolicy) -> Self {
        Self {
            policy,
            next_id: None,
        }
    }

    pub fn policy(&self) -> IdPolicy {
        self.policy
    }

    /// The value the next increment allocation will render, if any was made.
    pub fn cursor(&self) -> Option<u64> {
        self.next_id
    }

    /// Produces the next identifier.
    pub fn allocate(&mut self) -> String {
        match self.policy {
            IdPolicy::Uuid => uuid_id(),
            IdPolicy::Increment { initial, radix } => {
                let id = *self.next_id.get_or_insert(initial);
                self.next_id = Some(id.saturating_add(1));
                to_radix(id, radix)
            }
        }
    }
}

/// Random version-4 UUID without hyphens.
pub fn uuid_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Renders `value` in `radix`, most significant digit first.
///
/// Radices up to 36 use lowercase `0-9a-z`; 62 switches to
/// [`BASE62_ALPHABET`]. Any other radix is a caller bug and renders in
/// base 10.
pub fn to_radix(mut value: u64, radix: u32) -> String {
    let alphabet: &[u8] = match radix {
        2..=36 => &DIGITS[..radix as usize],
        62 => BASE62_ALPHABET,
        _ => &DIGITS[..10],
    };
    let base = alphabet.len() as u64;

    if value == 0 {
        return (alphabet[0] as char).to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(alphabet[(value % base) as usize]);
        value /= base;
    }
    digits.reverse();
    digits.into_iter().map(char::from).collect()
}
