//! Field validators shared by draft and input types.

use rust_decimal::Decimal;
use validator::ValidationError;

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

pub fn positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value > Decimal::ZERO {
        Ok(())
    } else {
        Err(error("positive", "must be greater than zero"))
    }
}

pub fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if *value >= Decimal::ZERO {
        Ok(())
    } else {
        Err(error("non_negative", "must not be negative"))
    }
}

/// 0 to 100 inclusive.
pub fn percentage(value: &Decimal) -> Result<(), ValidationError> {
    if *value >= Decimal::ZERO && *value <= Decimal::ONE_HUNDRED {
        Ok(())
    } else {
        Err(error("percentage", "must be between 0 and 100"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds() {
        assert!(positive(&Decimal::ONE).is_ok());
        assert!(positive(&Decimal::ZERO).is_err());
        assert!(non_negative(&Decimal::ZERO).is_ok());
        assert!(non_negative(&Decimal::NEGATIVE_ONE).is_err());
        assert!(percentage(&Decimal::ONE_HUNDRED).is_ok());
        assert!(percentage(&Decimal::new(1001, 1)).is_err());
    }
}
