use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use tiny_keccak::{Hasher, Keccak};

/// A StarkNet field element, kept as canonical lowercase `0x` hex with no
/// leading zeros.  Only the 252-bit width is enforced here; the exact field
/// modulus is checked by the network.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Felt(String);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeltError {
	#[error("empty field element")]
	Empty,

	#[error("invalid field element '{0}'")]
	Invalid(String),

	#[error("field element '{0}' is wider than 252 bits")]
	TooWide(String),
}

/// Hex digits in a 252-bit value.
const MAX_HEX_DIGITS: usize = 63;

impl Felt {
	pub fn zero() -> Self {
		Self("0x0".into())
	}

	/// Parse a `0x`-prefixed (or bare) hex string.
	pub fn from_hex(s: &str) -> Result<Self, FeltError> {
		let digits = s
			.strip_prefix("0x")
			.or_else(|| s.strip_prefix("0X"))
			.unwrap_or(s);
		if digits.is_empty() {
			return Err(FeltError::Empty);
		}
		if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
			return Err(FeltError::Invalid(s.to_owned()));
		}
		let trimmed = digits.trim_start_matches('0');
		if trimmed.len() > MAX_HEX_DIGITS {
			return Err(FeltError::TooWide(s.to_owned()));
		}
		Ok(Self::canonical(trimmed))
	}

	/// Build from 32 big-endian bytes.  The caller must already have
	/// cleared the top four bits.
	pub fn from_be_bytes(bytes: &[u8; 32]) -> Self {
		let encoded = hex::encode(bytes);
		Self::canonical(encoded.trim_start_matches('0'))
	}

	fn canonical(trimmed: &str) -> Self {
		if trimmed.is_empty() {
			Self::zero()
		} else {
			Self(format!("0x{}", trimmed.to_ascii_lowercase()))
		}
	}

	/// Cairo short string: up to 31 ASCII bytes packed big-endian.
	pub fn from_short_string(s: &str) -> Result<Self, FeltError> {
		if !s.is_ascii() || s.len() > 31 {
			return Err(FeltError::Invalid(s.to_owned()));
		}
		let encoded = hex::encode(s.as_bytes());
		Ok(Self::canonical(encoded.trim_start_matches('0')))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn is_zero(&self) -> bool {
		self.0 == "0x0"
	}
}

impl Default for Felt {
	fn default() -> Self {
		Self::zero()
	}
}

macro_rules! felt_from_uint {
	($($t:ty),*) => {
		$(
			impl From<$t> for Felt {
				fn from(v: $t) -> Self {
					Self(format!("{v:#x}"))
				}
			}
		)*
	};
}

felt_from_uint!(u8, u32, u64, u128, usize);

/// Accepts `0x`-prefixed hex or a decimal integer that fits in a `u128`.
impl FromStr for Felt {
	type Err = FeltError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let s = s.trim();
		if s.is_empty() {
			return Err(FeltError::Empty);
		}
		if s.starts_with("0x") || s.starts_with("0X") {
			return Self::from_hex(s);
		}
		s.parse::<u128>()
			.map(Self::from)
			.map_err(|_| FeltError::Invalid(s.to_owned()))
	}
}

impl fmt::Display for Felt {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl Serialize for Felt {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.0)
	}
}

impl<'de> Deserialize<'de> for Felt {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let raw = String::deserialize(deserializer)?;
		raw.parse().map_err(de::Error::custom)
	}
}

// -- Selectors --

/// Entry-point selector for a function name: keccak-256 of the name,
/// truncated to 250 bits.
pub fn selector(name: &str) -> Felt {
	let mut hasher = Keccak::v256();
	hasher.update(name.as_bytes());
	let mut out = [0u8; 32];
	hasher.finalize(&mut out);
	out[0] &= 0x03;
	Felt::from_be_bytes(&out)
}

// -- Uint256 --

/// A Cairo `Uint256`: two 128-bit words, passed on-chain as `(low, high)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Uint256 {
	pub low: u128,
	pub high: u128,
}

impl Uint256 {
	pub fn is_zero(&self) -> bool {
		self.low == 0 && self.high == 0
	}

	/// Calldata order: `[low, high]`.
	pub fn to_felts(&self) -> [Felt; 2] {
		[Felt::from(self.low), Felt::from(self.high)]
	}

	fn from_decimal(s: &str) -> Result<Self, FeltError> {
		if !s.bytes().all(|b| b.is_ascii_digit()) {
			return Err(FeltError::Invalid(s.to_owned()));
		}
		// Four little-endian 64-bit limbs, multiplied up one digit at a time.
		let mut limbs = [0u64; 4];
		for digit in s.bytes().map(|b| u128::from(b - b'0')) {
			let mut carry = digit;
			for limb in limbs.iter_mut() {
				let wide = u128::from(*limb) * 10 + carry;
				*limb = wide as u64;
				carry = wide >> 64;
			}
			if carry != 0 {
				return Err(FeltError::TooWide(s.to_owned()));
			}
		}
		Ok(Self {
			low: u128::from(limbs[0]) | u128::from(limbs[1]) << 64,
			high: u128::from(limbs[2]) | u128::from(limbs[3]) << 64,
		})
	}

	fn from_hex(s: &str, digits: &str) -> Result<Self, FeltError> {
		if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
			return Err(FeltError::Invalid(s.to_owned()));
		}
		let digits = digits.trim_start_matches('0');
		if digits.len() > 64 {
			return Err(FeltError::TooWide(s.to_owned()));
		}
		let split = digits.len().saturating_sub(32);
		let word = |d: &str| {
			if d.is_empty() {
				Ok(0)
			} else {
				u128::from_str_radix(d, 16).map_err(|_| FeltError::Invalid(s.to_owned()))
			}
		};
		Ok(Self {
			low: word(&digits[split..])?,
			high: word(&digits[..split])?,
		})
	}
}

impl From<u128> for Uint256 {
	fn from(low: u128) -> Self {
		Self { low, high: 0 }
	}
}

/// Accepts a decimal integer or `0x` hex, up to 256 bits.
impl FromStr for Uint256 {
	type Err = FeltError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let s = s.trim();
		if s.is_empty() {
			return Err(FeltError::Empty);
		}
		match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
			Some(digits) => Self::from_hex(s, digits),
			None => Self::from_decimal(s),
		}
	}
}

impl fmt::Display for Uint256 {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.high == 0 {
			write!(f, "{:#x}", self.low)
		} else {
			write!(f, "{:#x}{:032x}", self.high, self.low)
		}
	}
}

impl Serialize for Uint256 {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

/// JSON input may carry a plain number for small amounts.
impl<'de> Deserialize<'de> for Uint256 {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Repr {
			Number(u64),
			Text(String),
		}

		match Repr::deserialize(deserializer)? {
			Repr::Number(n) => Ok(Self::from(u128::from(n))),
			Repr::Text(s) => s.parse().map_err(de::Error::custom),
		}
	}
}
