// storefront/app/src/pipelines/order_number.rs

use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore};

const SUFFIX_LEN: usize = 6;
const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// `ORD-<unix millis>-<6 uppercase base36 chars>`. Not guaranteed unique.
pub fn generate_order_number() -> String {
  order_number_at(Utc::now(), OsRng.next_u64())
}

pub(crate) fn order_number_at(now: DateTime<Utc>, entropy: u64) -> String {
  let mut suffix = [0u8; SUFFIX_LEN];
  let mut rest = entropy;
  for slot in suffix.iter_mut() {
    *slot = ALPHABET[(rest % 36) as usize];
    rest /= 36;
  }
  // ALPHABET is ASCII, so every byte is a valid char.
  let suffix: String = suffix.iter().map(|&b| b as char).collect();
  format!("ORD-{}-{}", now.timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn format_is_prefix_millis_and_base36_suffix() {
    let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
    assert_eq!(order_number_at(now, 0), "ORD-1700000000123-000000");
    assert_eq!(order_number_at(now, 35), "ORD-1700000000123-Z00000");
    assert_eq!(order_number_at(now, 36), "ORD-1700000000123-010000");
  }

  #[test]
  fn generated_numbers_have_expected_shape() {
    let number = generate_order_number();
    let parts: Vec<&str> = number.split('-').collect();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0], "ORD");
    assert!(parts[1].parse::<i64>().is_ok());
    assert_eq!(parts[2].len(), SUFFIX_LEN);
    assert!(parts[2].chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
  }
}
