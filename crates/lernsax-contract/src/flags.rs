//! Message state flags decoded from envelope icons.
//!
//! The message list never states flags in text. Each row carries one
//! envelope icon (`mail_0.svg` .. `mail_7.svg`) whose index packs the
//! flagged, answered and read bits. Icons outside the table decode to
//! [`MessageFlags::UNIDENTIFIED`].

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// Serialized form of [`FlagState::Unidentified`].
pub const UNIDENTIFIED: &str = "unidentified";

/// One message flag: set, unset, or unknown because the icon was not recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagState {
    /// Flag is set.
    Set,
    /// Flag is not set.
    Unset,
    /// The icon did not match any known state.
    Unidentified,
}

impl FlagState {
    /// Returns the flag as a boolean, or `None` when unidentified.
    #[must_use]
    pub const fn as_bool(self) -> Option<bool> {
        match self {
            Self::Set => Some(true),
            Self::Unset => Some(false),
            Self::Unidentified => None,
        }
    }

    /// Returns `true` if the flag could not be decoded.
    #[must_use]
    pub const fn is_unidentified(self) -> bool {
        matches!(self, Self::Unidentified)
    }
}

impl From<bool> for FlagState {
    fn from(value: bool) -> Self {
        if value { Self::Set } else { Self::Unset }
    }
}

impl Serialize for FlagState {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.as_bool() {
            Some(value) => serializer.serialize_bool(value),
            None => serializer.serialize_str(UNIDENTIFIED),
        }
    }
}

impl<'de> Deserialize<'de> for FlagState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FlagStateVisitor;

        impl Visitor<'_> for FlagStateVisitor {
            type Value = FlagState;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "a boolean or \"{UNIDENTIFIED}\"")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<FlagState, E> {
                Ok(FlagState::from(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<FlagState, E> {
                if v == UNIDENTIFIED {
                    Ok(FlagState::Unidentified)
                } else {
                    Err(E::invalid_value(de::Unexpected::Str(v), &self))
                }
            }
        }

        deserializer.deserialize_any(FlagStateVisitor)
    }
}

/// The three flags shown by a message's envelope icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageFlags {
    /// Message is flagged.
    pub flagged: FlagState,
    /// Message has been answered.
    pub answered: FlagState,
    /// Message has been read.
    pub read: FlagState,
}

impl MessageFlags {
    /// All three flags unknown.
    pub const UNIDENTIFIED: Self = Self {
        flagged: FlagState::Unidentified,
        answered: FlagState::Unidentified,
        read: FlagState::Unidentified,
    };

    /// Builds flags from an icon index: bit 2 flagged, bit 1 answered, bit 0 read.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self {
            flagged: bit(bits, 0b100),
            answered: bit(bits, 0b010),
            read: bit(bits, 0b001),
        }
    }

    /// Returns `true` if every flag was decoded.
    #[must_use]
    pub const fn is_identified(&self) -> bool {
        !(self.flagged.is_unidentified()
            || self.answered.is_unidentified()
            || self.read.is_unidentified())
    }
}

const fn bit(bits: u8, mask: u8) -> FlagState {
    if bits & mask == 0 {
        FlagState::Unset
    } else {
        FlagState::Set
    }
}

/// Envelope icon sources as they appear in the message list, in bit order.
pub const ICON_TABLE: [(&str, MessageFlags); 8] = [
    ("../pics/mail_0.svg", MessageFlags::from_bits(0)),
    ("../pics/mail_1.svg", MessageFlags::from_bits(1)),
    ("../pics/mail_2.svg", MessageFlags::from_bits(2)),
    ("../pics/mail_3.svg", MessageFlags::from_bits(3)),
    ("../pics/mail_4.svg", MessageFlags::from_bits(4)),
    ("../pics/mail_5.svg", MessageFlags::from_bits(5)),
    ("../pics/mail_6.svg", MessageFlags::from_bits(6)),
    ("../pics/mail_7.svg", MessageFlags::from_bits(7)),
];

/// Decodes an envelope icon source. Total: unknown icons are unidentified.
#[must_use]
pub fn decode_icon(src: &str) -> MessageFlags {
    ICON_TABLE
        .iter()
        .find(|(icon, _)| *icon == src)
        .map_or(MessageFlags::UNIDENTIFIED, |(_, flags)| *flags)
}
