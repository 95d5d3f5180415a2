//! Version-string ordering for ontology rows.
//!
//! Versions are compared segment-wise on `.`-separated parts: numeric
//! segments compare numerically, anything else falls back to lexicographic
//! comparison. A version with more segments orders after an equal prefix
//! ("1.0.0.1" > "1.0.0").

use std::cmp::Ordering;

/// Compare two version strings, highest wins.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
  let mut left = a.split('.');
  let mut right = b.split('.');

  loop {
    match (left.next(), right.next()) {
      (None, None) => return Ordering::Equal,
      (Some(_), None) => return Ordering::Greater,
      (None, Some(_)) => return Ordering::Less,
      (Some(l), Some(r)) => {
        let ord = match (l.parse::<u64>(), r.parse::<u64>()) {
          (Ok(ln), Ok(rn)) => ln.cmp(&rn),
          _ => l.cmp(r),
        };
        if ord != Ordering::Equal {
          return ord;
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn numeric_segments_compare_numerically() {
    assert_eq!(compare_versions("1.10.0", "1.9.0"), Ordering::Greater);
    assert_eq!(compare_versions("2.0.0", "10.0.0"), Ordering::Less);
  }

  #[test]
  fn equal_versions() {
    assert_eq!(compare_versions("1.0.0", "1.0.0"), Ordering::Equal);
  }

  #[test]
  fn longer_version_wins_on_equal_prefix() {
    assert_eq!(compare_versions("1.0.0.1", "1.0.0"), Ordering::Greater);
  }

  #[test]
  fn non_numeric_segments_fall_back_to_lexicographic() {
    assert_eq!(compare_versions("1.0.0-beta", "1.0.0-alpha"), Ordering::Greater);
  }

  #[test]
  fn max_by_picks_highest() {
    let versions = ["1.2.0", "1.10.0", "0.9.9"];
    let highest = versions
      .iter()
      .max_by(|a, b| compare_versions(a, b))
      .unwrap();
    assert_eq!(*highest, "1.10.0");
  }
}
