//! Input sanitation for invocation arguments.

use crate::error::ValidationError;
use std::str::FromStr;

/// Every argument must be non-empty and at most `max_len` bytes long.
pub fn validate_arguments(args: &[String], max_len: usize) -> Result<(), ValidationError> {
    for (index, value) in args.iter().enumerate() {
        if value.is_empty() {
            return Err(ValidationError::Empty { index });
        }
        if value.len() > max_len {
            return Err(ValidationError::TooLong {
                index,
                max: max_len,
            });
        }
    }
    Ok(())
}

/// Require the argument count to be one of `allowed`.
pub fn expect_count(args: &[String], allowed: &[usize]) -> Result<(), ValidationError> {
    if allowed.contains(&args.len()) {
        return Ok(());
    }
    let expected = allowed
        .iter()
        .map(|count| count.to_string())
        .collect::<Vec<_>>()
        .join(" or ");
    Err(ValidationError::ArgumentCount {
        expected,
        got: args.len(),
    })
}

/// Parse the argument at `index` as a number.
pub fn parse_number<T: FromStr>(args: &[String], index: usize) -> Result<T, ValidationError> {
    args.get(index)
        .and_then(|value| value.parse().ok())
        .ok_or(ValidationError::NotNumeric { index })
}
