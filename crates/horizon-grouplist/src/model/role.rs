//! Data roles and values for item models.
//!
//! Roles define what type of data is being requested from a model item.
//! Each cell can have multiple pieces of data associated with it, distinguished
//! by their role. The value returned for a role is an [`ItemData`].

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// First user-role offset reserved for the additional label scheme.
///
/// `ItemRole::User(LABEL_ROLE_BASE + n)` selects the n-th configured label
/// of a grouping model instead of the primary one.
pub const LABEL_ROLE_BASE: u32 = 10;

/// Selects which value of a cell a query asks for.
///
/// A provider may answer several values per cell: the text a group is keyed
/// by under `Display`, a thumbnail under `Decoration`, a richer value under
/// `Edit`. Grouping, sorting, labels and pixmaps are each configured as a
/// column plus a role.
///
/// `User` roles carry application data. `User(n)` with `n` at or above
/// [`LABEL_ROLE_BASE`] is how a [`Group`](super::Group) is asked for one of
/// its owner's additional labels; see [`ItemRole::label`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum ItemRole {
    #[default]
    Display = 0,
    /// Icon or pixmap.
    Decoration = 1,
    Edit = 2,
    ToolTip = 3,
    StatusTip = 4,
    WhatsThis = 5,
    SizeHint = 6,
    /// Application-defined role `n`.
    User(u32) = 256,
}

impl ItemRole {
    #[inline]
    pub fn is_user_role(&self) -> bool {
        matches!(self, ItemRole::User(_))
    }

    /// Stable numeric form: 0 to 6 for the predefined roles, `256 + n` for
    /// `User(n)`, saturating at `u32::MAX`.
    pub fn value(&self) -> u32 {
        match self {
            ItemRole::Display => 0,
            ItemRole::Decoration => 1,
            ItemRole::Edit => 2,
            ItemRole::ToolTip => 3,
            ItemRole::StatusTip => 4,
            ItemRole::WhatsThis => 5,
            ItemRole::SizeHint => 6,
            ItemRole::User(n) => n.saturating_add(256),
        }
    }

    /// Inverse of [`value`](Self::value). Values 7 to 255 are unassigned.
    pub fn from_value(value: u32) -> Option<Self> {
        let role = match value {
            0 => ItemRole::Display,
            1 => ItemRole::Decoration,
            2 => ItemRole::Edit,
            3 => ItemRole::ToolTip,
            4 => ItemRole::StatusTip,
            5 => ItemRole::WhatsThis,
            6 => ItemRole::SizeHint,
            7..=255 => return None,
            n => ItemRole::User(n - 256),
        };
        Some(role)
    }

    /// The role selecting the `index`-th configured label of a grouping model.
    ///
    /// Indexes past the representable range saturate to the last user role,
    /// which selects no configured label in practice.
    pub fn label(index: usize) -> Self {
        let n = u32::try_from(index)
            .ok()
            .and_then(|index| LABEL_ROLE_BASE.checked_add(index))
            .unwrap_or(u32::MAX);
        ItemRole::User(n)
    }

    /// If this is a label role, returns the label index it selects.
    pub fn label_index(&self) -> Option<usize> {
        match *self {
            ItemRole::User(n) if n >= LABEL_ROLE_BASE => Some((n - LABEL_ROLE_BASE) as usize),
            _ => None,
        }
    }
}

/// The family a value belongs to, for comparison purposes.
///
/// Two non-null values are only comparable when they share a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueFamily {
    /// No value.
    Null,
    /// `Bool`.
    Bool,
    /// `Int` and `UInt`.
    Integer,
    /// `Float`.
    Float,
    /// `Char`.
    Char,
    /// `String`, `Bytes`, `Url` and `Regex`.
    Text,
    /// `Date`.
    Date,
    /// `Time`.
    Time,
    /// `DateTime`.
    DateTime,
    /// `Size`.
    Size,
    /// `Point`.
    Point,
    /// `Custom` payloads; these have no ordering.
    Opaque,
}

impl fmt::Display for ValueFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueFamily::Null => "null",
            ValueFamily::Bool => "boolean",
            ValueFamily::Integer => "integer",
            ValueFamily::Float => "floating point",
            ValueFamily::Char => "character",
            ValueFamily::Text => "text",
            ValueFamily::Date => "date",
            ValueFamily::Time => "time",
            ValueFamily::DateTime => "date/time",
            ValueFamily::Size => "size",
            ValueFamily::Point => "point",
            ValueFamily::Opaque => "opaque",
        };
        f.write_str(name)
    }
}

/// Dynamically-typed value stored in, or read from, a model cell.
///
/// Grouping keys and sort keys are `ItemData` values; the comparator protocol
/// in [`compare`](super::compare) dispatches on [`ItemData::family`].
///
/// # Example
///
/// ```ignore
/// use horizon_grouplist::model::ItemData;
///
/// let data = ItemData::from("Hello");
/// assert_eq!(data.as_string(), Some("Hello"));
///
/// // Downcast opaque payloads
/// let data = ItemData::new(42u32);
/// assert_eq!(data.downcast::<u32>(), Some(&42));
/// ```
#[derive(Debug, Clone, Default)]
pub enum ItemData {
    /// No data.
    #[default]
    None,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    /// A single character.
    Char(char),
    String(String),
    /// Raw bytes, such as a hash, compared as text.
    Bytes(Vec<u8>),
    /// A URL, compared by its string form.
    Url(Url),
    /// A regular expression, compared by its pattern.
    Regex(Regex),
    /// Calendar date.
    Date(NaiveDate),
    /// Time of day.
    Time(NaiveTime),
    /// Date and time.
    DateTime(NaiveDateTime),
    /// Width and height.
    Size(f32, f32),
    Point(f32, f32),
    /// Opaque payload, e.g. a pixmap. Has no ordering.
    Custom(Arc<dyn Any + Send + Sync>),
}

impl ItemData {
    /// Wraps an opaque payload, such as a pixmap handle.
    pub fn new<T: Any + Send + Sync + 'static>(value: T) -> Self {
        ItemData::Custom(Arc::new(value))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ItemData::None)
    }

    pub fn is_some(&self) -> bool {
        !self.is_none()
    }

    /// Returns the comparison family of this value.
    pub fn family(&self) -> ValueFamily {
        match self {
            ItemData::None => ValueFamily::Null,
            ItemData::Bool(_) => ValueFamily::Bool,
            ItemData::Int(_) | ItemData::UInt(_) => ValueFamily::Integer,
            ItemData::Float(_) => ValueFamily::Float,
            ItemData::Char(_) => ValueFamily::Char,
            ItemData::String(_) | ItemData::Bytes(_) | ItemData::Url(_) | ItemData::Regex(_) => {
                ValueFamily::Text
            }
            ItemData::Date(_) => ValueFamily::Date,
            ItemData::Time(_) => ValueFamily::Time,
            ItemData::DateTime(_) => ValueFamily::DateTime,
            ItemData::Size(..) => ValueFamily::Size,
            ItemData::Point(..) => ValueFamily::Point,
            ItemData::Custom(_) => ValueFamily::Opaque,
        }
    }

    /// Text form of string-like values, used for case-insensitive ordering.
    pub fn text(&self) -> Option<Cow<'_, str>> {
        match self {
            ItemData::String(s) => Some(Cow::Borrowed(s.as_str())),
            ItemData::Bytes(b) => Some(String::from_utf8_lossy(b)),
            ItemData::Url(u) => Some(Cow::Borrowed(u.as_str())),
            ItemData::Regex(r) => Some(Cow::Borrowed(r.as_str())),
            _ => None,
        }
    }

    /// The string, if this is `String`. Other string-like values answer
    /// through [`text`](Self::text).
    pub fn as_string(&self) -> Option<&str> {
        match self {
            ItemData::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn into_string(self) -> Option<String> {
        match self {
            ItemData::String(s) => Some(s),
            _ => None,
        }
    }

    /// Unsigned values that fit are converted.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ItemData::Int(n) => Some(*n),
            ItemData::UInt(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    /// Signed values that are not negative are converted.
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            ItemData::UInt(n) => Some(*n),
            ItemData::Int(n) => u64::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ItemData::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ItemData::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_char(&self) -> Option<char> {
        match self {
            ItemData::Char(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            ItemData::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            ItemData::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn as_size(&self) -> Option<(f32, f32)> {
        match self {
            ItemData::Size(w, h) => Some((*w, *h)),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<(f32, f32)> {
        match self {
            ItemData::Point(x, y) => Some((*x, *y)),
            _ => None,
        }
    }

    /// The payload of a `Custom` value, if it holds a `T`.
    pub fn downcast<T: Any>(&self) -> Option<&T> {
        match self {
            ItemData::Custom(data) => data.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl fmt::Display for ItemData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemData::None | ItemData::Custom(_) => Ok(()),
            ItemData::Bool(b) => write!(f, "{b}"),
            ItemData::Int(n) => write!(f, "{n}"),
            ItemData::UInt(n) => write!(f, "{n}"),
            ItemData::Float(n) => write!(f, "{n}"),
            ItemData::Char(c) => write!(f, "{c}"),
            ItemData::String(s) => f.write_str(s),
            ItemData::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
            ItemData::Url(u) => f.write_str(u.as_str()),
            ItemData::Regex(r) => f.write_str(r.as_str()),
            ItemData::Date(d) => write!(f, "{d}"),
            ItemData::Time(t) => write!(f, "{t}"),
            ItemData::DateTime(dt) => write!(f, "{dt}"),
            ItemData::Size(w, h) => write!(f, "{w}x{h}"),
            ItemData::Point(x, y) => write!(f, "({x}, {y})"),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for ItemData {
                fn from(value: $ty) -> Self {
                    ItemData::$variant(value)
                }
            }
        )*
    };
}

impl_from! {
    String => String,
    i64 => Int,
    u64 => UInt,
    f64 => Float,
    bool => Bool,
    char => Char,
    Vec<u8> => Bytes,
    Url => Url,
    Regex => Regex,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => DateTime,
}

impl From<&str> for ItemData {
    fn from(s: &str) -> Self {
        ItemData::String(s.to_string())
    }
}

impl From<i32> for ItemData {
    fn from(n: i32) -> Self {
        ItemData::Int(n.into())
    }
}

impl From<u32> for ItemData {
    fn from(n: u32) -> Self {
        ItemData::UInt(n.into())
    }
}

impl From<f32> for ItemData {
    fn from(n: f32) -> Self {
        ItemData::Float(n.into())
    }
}

impl From<Option<String>> for ItemData {
    fn from(text: Option<String>) -> Self {
        text.map_or(ItemData::None, ItemData::String)
    }
}
