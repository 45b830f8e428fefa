//! Interned identifiers for stands, bookings, hall maps and exhibitions.
//!
//! The backend hands out ids as JSON numbers on some endpoints and as JSON
//! strings on others. Every id is coerced to its canonical text on ingestion
//! and interned, so `7` and `"7"` compare equal everywhere past the boundary.

use lasso::{Spur, ThreadedRodeo};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for ids — fast comparisons, low memory.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

fn intern(s: &str) -> Spur {
    INTERNER.get_or_intern(s.trim())
}

fn resolve(spur: &Spur) -> &'static str {
    INTERNER.resolve(spur)
}

/// Canonical text for a numeric id. Integral floats drop their fraction
/// (`42.0` → `"42"`) so they match the integer and string spellings.
fn canonical_f64(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 9.0e15 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}

/// Accepts a JSON string or number and yields the canonical id text.
struct IdTextVisitor;

impl Visitor<'_> for IdTextVisitor {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an id as a string or a number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
        Ok(v.trim().to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
        Ok(canonical_f64(v))
    }
}

fn deserialize_id_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    deserializer.deserialize_any(IdTextVisitor)
}

/// Largest magnitude a JavaScript number holds exactly.
const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// The numeric value of an id whose text is exactly a canonical,
/// JS-safe integer. `"007"`, `"+5"` and `"9007199254740993"` stay text.
pub fn numeric_id(text: &str) -> Option<i64> {
    let n = text.parse::<i64>().ok()?;
    (n.to_string() == text && n.unsigned_abs() <= MAX_SAFE_INTEGER).then_some(n)
}

/// Canonical integer ids go back out as JSON numbers, everything else as
/// strings.
fn serialize_id_text<S: Serializer>(text: &str, serializer: S) -> Result<S::Ok, S::Error> {
    match numeric_id(text) {
        Some(n) => serializer.serialize_i64(n),
        None => serializer.serialize_str(text),
    }
}

macro_rules! server_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(Spur);

        impl $name {
            /// Intern a server-assigned id.
            pub fn intern(s: &str) -> Self {
                Self(intern(s))
            }

            /// Intern a numeric server id.
            pub fn from_number(n: i64) -> Self {
                Self::intern(&n.to_string())
            }

            /// Resolve back to the canonical id text.
            pub fn as_str(&self) -> &str {
                resolve(&self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serialize_id_text(self.as_str(), serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = deserialize_id_text(deserializer)?;
                Ok(Self::intern(&text))
            }
        }
    };
}

server_id!(
    /// Id of a booking resource (distinct from the stand it books).
    BookingId
);
server_id!(
    /// Id of a hall map (one floor-plan image bound to one exhibition).
    HallMapId
);
server_id!(
    /// Id of an exhibition event.
    ExhibitionId
);
server_id!(
    /// Id of the artist who requested a booking.
    ArtistId
);

const PLACEHOLDER_PREFIX: &str = "local_";

fn is_placeholder_text(s: &str) -> bool {
    s.strip_prefix(PLACEHOLDER_PREFIX)
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Id of a stand.
///
/// Either server-assigned, or a local placeholder minted right after a
/// successful create while the host has not yet re-supplied the stand list.
/// Placeholders never compare equal to server ids and must never be sent to
/// the backend. Placeholder-ness follows from the text alone.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StandId {
    key: Spur,
    local: bool,
}

impl StandId {
    /// Intern a stand id from its text. The placeholder spelling
    /// (`local_<n>`) yields the placeholder again, so local ids survive a
    /// trip through the host.
    pub fn intern(s: &str) -> Self {
        let s = s.trim();
        Self {
            key: intern(s),
            local: is_placeholder_text(s),
        }
    }

    /// Intern a numeric server stand id.
    pub fn from_number(n: i64) -> Self {
        Self::intern(&n.to_string())
    }

    /// Mint a fresh local placeholder id (`local_<n>`).
    pub fn placeholder() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        Self::intern(&format!("{PLACEHOLDER_PREFIX}{n}"))
    }

    /// Whether this id is a client-side placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.local
    }

    /// Resolve back to the canonical id text.
    pub fn as_str(&self) -> &str {
        resolve(&self.key)
    }
}

impl fmt::Debug for StandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.local {
            write!(f, "StandId(~{})", self.as_str())
        } else {
            write!(f, "StandId({})", self.as_str())
        }
    }
}

impl fmt::Display for StandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StandId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.local {
            serializer.serialize_str(self.as_str())
        } else {
            serialize_id_text(self.as_str(), serializer)
        }
    }
}

impl<'de> Deserialize<'de> for StandId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = deserialize_id_text(deserializer)?;
        Ok(Self::intern(&text))
    }
}
