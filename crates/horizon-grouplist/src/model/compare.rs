//! Three-way comparison of item values.
//!
//! Grouping decides bucket membership and in-bucket order with a
//! [`CompareFn`]. The default, [`default_compare`], orders values by family:
//!
//! - null sorts before any other value
//! - integers (signed and unsigned mixed) by numeric value
//! - floats with a relative tolerance of 1e-12
//! - string-like values case-insensitively
//! - dates, times and date/times chronologically
//! - sizes width-then-height, points x-then-y
//!
//! Comparing values of different families is a contract violation. The
//! checked form, [`try_compare_values`], reports it as an error; the default
//! comparator panics.

use std::cmp::Ordering;
use std::sync::Arc;

use super::role::{ItemData, ValueFamily};
use super::traits::ItemModel;
use crate::error::{Error, Result};

/// Comparator used for grouping and in-group sorting.
///
/// Arguments: the data provider, the column the values were read from,
/// and the two values. Returning `Less` means the first value sorts first.
pub type CompareFn = Arc<dyn Fn(&dyn ItemModel, usize, &ItemData, &ItemData) -> Ordering + Send + Sync>;

/// Returns the built-in family comparator as a [`CompareFn`].
pub fn default_compare() -> CompareFn {
    Arc::new(|_model: &dyn ItemModel, _column: usize, a: &ItemData, b: &ItemData| {
        compare_values(a, b)
    })
}

/// Compares two values using the built-in family ordering.
///
/// # Panics
///
/// Panics if both values are non-null and belong to different families, or
/// if either is an opaque `Custom` payload. Supply a custom [`CompareFn`]
/// when such values must be ordered.
pub fn compare_values(a: &ItemData, b: &ItemData) -> Ordering {
    match try_compare_values(a, b) {
        Ok(ordering) => ordering,
        Err(err) => panic!("{err}"),
    }
}

/// Compares two values, reporting family mismatches as errors.
pub fn try_compare_values(a: &ItemData, b: &ItemData) -> Result<Ordering> {
    use ItemData as D;

    let ordering = match (a, b) {
        (D::None, D::None) => Ordering::Equal,
        (D::None, _) => Ordering::Less,
        (_, D::None) => Ordering::Greater,
        (D::Bool(x), D::Bool(y)) => x.cmp(y),
        (D::Int(_) | D::UInt(_), D::Int(_) | D::UInt(_)) => wide_int(a).cmp(&wide_int(b)),
        (D::Float(x), D::Float(y)) => fuzzy_compare(*x, *y),
        (D::Char(x), D::Char(y)) => x.cmp(y),
        (D::Date(x), D::Date(y)) => x.cmp(y),
        (D::Time(x), D::Time(y)) => x.cmp(y),
        (D::DateTime(x), D::DateTime(y)) => x.cmp(y),
        (D::Size(w1, h1), D::Size(w2, h2)) => fuzzy_pair((*w1, *h1), (*w2, *h2)),
        (D::Point(x1, y1), D::Point(x2, y2)) => fuzzy_pair((*x1, *y1), (*x2, *y2)),
        _ => match (a.text(), b.text()) {
            (Some(x), Some(y)) => caseless_cmp(&x, &y),
            _ => return Err(mismatch(a.family(), b.family())),
        },
    };
    Ok(ordering)
}

fn mismatch(left: ValueFamily, right: ValueFamily) -> Error {
    if left == ValueFamily::Opaque || left == right {
        Error::UnsupportedFamily(left)
    } else if right == ValueFamily::Opaque {
        Error::UnsupportedFamily(right)
    } else {
        Error::FamilyMismatch { left, right }
    }
}

fn wide_int(value: &ItemData) -> i128 {
    match value {
        ItemData::Int(n) => i128::from(*n),
        ItemData::UInt(n) => i128::from(*n),
        _ => 0,
    }
}

/// Relative-tolerance float comparison; NaN sorts after every number.
fn fuzzy_compare(a: f64, b: f64) -> Ordering {
    if a == b || (a - b).abs() * 1e12 <= a.abs().min(b.abs()) {
        return Ordering::Equal;
    }
    a.partial_cmp(&b).unwrap_or_else(|| a.total_cmp(&b))
}

fn fuzzy_pair(a: (f32, f32), b: (f32, f32)) -> Ordering {
    fuzzy_compare(a.0.into(), b.0.into()).then_with(|| fuzzy_compare(a.1.into(), b.1.into()))
}

fn caseless_cmp(a: &str, b: &str) -> Ordering {
    let lower = |s: &str| s.chars().flat_map(char::to_lowercase).collect::<Vec<_>>();
    if a.is_ascii() && b.is_ascii() {
        let a = a.bytes().map(|c| c.to_ascii_lowercase());
        let b = b.bytes().map(|c| c.to_ascii_lowercase());
        return a.cmp(b);
    }
    lower(a).cmp(&lower(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use regex::Regex;
    use url::Url;

    #[test]
    fn test_null_sorts_first() {
        assert_eq!(compare_values(&ItemData::None, &ItemData::None), Ordering::Equal);
        assert_eq!(compare_values(&ItemData::None, &ItemData::from(0)), Ordering::Less);
        assert_eq!(compare_values(&ItemData::from("a"), &ItemData::None), Ordering::Greater);
    }

    #[test]
    fn test_integers_mixed_signedness() {
        assert_eq!(compare_values(&ItemData::Int(-1), &ItemData::UInt(0)), Ordering::Less);
        assert_eq!(compare_values(&ItemData::UInt(5), &ItemData::Int(5)), Ordering::Equal);
        assert_eq!(
            compare_values(&ItemData::UInt(u64::MAX), &ItemData::Int(i64::MAX)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_fuzzy_float_equality() {
        assert_eq!(compare_values(&ItemData::from(0.1 + 0.2), &ItemData::from(0.3)), Ordering::Equal);
        assert_eq!(compare_values(&ItemData::from(1.0), &ItemData::from(1.001)), Ordering::Less);
        assert_eq!(compare_values(&ItemData::from(0.0), &ItemData::from(-0.0)), Ordering::Equal);
        assert_eq!(
            compare_values(&ItemData::from(f64::NAN), &ItemData::from(1.0)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_text_is_case_insensitive() {
        assert_eq!(compare_values(&ItemData::from("Apple"), &ItemData::from("apple")), Ordering::Equal);
        assert_eq!(compare_values(&ItemData::from("apple"), &ItemData::from("Banana")), Ordering::Less);
        assert_eq!(compare_values(&ItemData::from("ÉCOLE"), &ItemData::from("école")), Ordering::Equal);
        assert_eq!(compare_values(&ItemData::from("ab"), &ItemData::from("a")), Ordering::Greater);
    }

    #[test]
    fn test_string_like_values_share_family() {
        let url = ItemData::from(Url::parse("https://example.com/").unwrap());
        let regex = ItemData::from(Regex::new("^a+$").unwrap());
        let hash = ItemData::from(b"DEADBEEF".to_vec());

        assert_eq!(compare_values(&hash, &ItemData::from("deadbeef")), Ordering::Equal);
        assert_eq!(compare_values(&url, &ItemData::from("HTTPS://EXAMPLE.COM/")), Ordering::Equal);
        assert_eq!(compare_values(&regex, &ItemData::from("^a+$")), Ordering::Equal);
    }

    #[test]
    fn test_chronological_order() {
        let d1 = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(compare_values(&d1.into(), &d2.into()), Ordering::Less);

        let t1 = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let t2 = NaiveTime::from_hms_opt(8, 59, 59).unwrap();
        assert_eq!(compare_values(&t1.into(), &t2.into()), Ordering::Greater);

        let dt1 = d1.and_time(t1);
        let dt2 = d2.and_time(t2);
        assert_eq!(compare_values(&dt1.into(), &dt2.into()), Ordering::Less);
    }

    #[test]
    fn test_size_and_point_are_lexicographic() {
        assert_eq!(
            compare_values(&ItemData::Size(2.0, 1.0), &ItemData::Size(2.0, 3.0)),
            Ordering::Less
        );
        assert_eq!(
            compare_values(&ItemData::Point(3.0, 0.0), &ItemData::Point(2.0, 9.0)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_family_mismatch_is_reported() {
        let err = try_compare_values(&ItemData::from("1"), &ItemData::from(1)).unwrap_err();
        assert_eq!(
            err,
            Error::FamilyMismatch {
                left: ValueFamily::Text,
                right: ValueFamily::Integer
            }
        );

        let date = ItemData::from(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let time = ItemData::from(NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        assert!(matches!(
            try_compare_values(&date, &time),
            Err(Error::FamilyMismatch { .. })
        ));
    }

    #[test]
    fn test_opaque_values_are_unsupported() {
        let pixmap = ItemData::new(vec![0u8; 4]);
        assert_eq!(
            try_compare_values(&pixmap, &pixmap.clone()),
            Err(Error::UnsupportedFamily(ValueFamily::Opaque))
        );
        assert_eq!(
            try_compare_values(&ItemData::None, &pixmap),
            Ok(Ordering::Less)
        );
    }

    #[test]
    #[should_panic(expected = "cannot compare")]
    fn test_compare_values_panics_on_mismatch() {
        compare_values(&ItemData::from(true), &ItemData::from(1.5));
    }
}
