use alloy::primitives::U256;
use eyre::Context as _;

/// Parse a decimal UI amount (e.g. "1.5") into base units for a token with `decimals`.
///
/// Rejects signs, exponents and more fractional digits than the token supports.
pub fn parse_ui_to_base(s: &str, decimals: u8) -> eyre::Result<U256> {
    let s = s.trim();
    if s.is_empty() {
        eyre::bail!("empty amount");
    }

    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    if whole.is_empty() && frac.is_empty() {
        eyre::bail!("amount has no digits");
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        eyre::bail!("amount must be a plain decimal number");
    }
    if frac.len() > usize::from(decimals) {
        eyre::bail!("too many decimal places for token (decimals={decimals})");
    }

    let whole_v = if whole.is_empty() {
        U256::ZERO
    } else {
        whole.parse::<U256>().context("parse whole")?
    };

    let mut frac_s = frac.to_owned();
    while frac_s.len() < usize::from(decimals) {
        frac_s.push('0');
    }
    let frac_v = if frac_s.is_empty() {
        U256::ZERO
    } else {
        frac_s.parse::<U256>().context("parse fractional")?
    };

    let scale = U256::from(10_u64)
        .checked_pow(U256::from(decimals))
        .ok_or_else(|| eyre::eyre!("decimals too large"))?;

    whole_v
        .checked_mul(scale)
        .and_then(|x| x.checked_add(frac_v))
        .ok_or_else(|| eyre::eyre!("amount overflow"))
}

/// Format a base-unit amount into a UI decimal string without using floats.
///
/// Examples:
/// - base=1500000, decimals=6 => "1.5"
/// - base=1, decimals=6 => "0.000001"
pub fn format_base_to_ui(base: U256, decimals: u8) -> String {
    if decimals == 0 {
        return base.to_string();
    }
    let digits = base.to_string();
    let width = usize::from(decimals);
    let padded = if digits.len() <= width {
        format!("{digits:0>w$}", w = width + 1)
    } else {
        digits
    };
    let (whole, frac) = padded.split_at(padded.len() - width);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        whole.to_owned()
    } else {
        format!("{whole}.{frac}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ui_amount_basic() -> eyre::Result<()> {
        assert_eq!(parse_ui_to_base("1", 6)?, U256::from(1_000_000_u64));
        assert_eq!(parse_ui_to_base("1.5", 6)?, U256::from(1_500_000_u64));
        assert_eq!(parse_ui_to_base("0.000001", 6)?, U256::from(1_u64));
        assert_eq!(parse_ui_to_base(".25", 2)?, U256::from(25_u64));
        assert_eq!(parse_ui_to_base("0", 18)?, U256::ZERO);
        assert_eq!(
            parse_ui_to_base("2.5", 18)?,
            U256::from(2_500_000_000_000_000_000_u128)
        );
        Ok(())
    }

    #[test]
    fn parse_ui_rejects_garbage() {
        for bad in ["", " ", ".", "abc", "1e3", "-1", "+1", "1.2.3", "0x10"] {
            let r = parse_ui_to_base(bad, 18);
            assert!(r.is_err(), "expected error for {bad:?}, got {r:?}");
        }
    }

    #[test]
    fn parse_ui_rejects_too_many_decimals() {
        let r = parse_ui_to_base("1.0000001", 6);
        assert!(r.is_err(), "expected error, got ok");
        if let Err(err) = r {
            assert!(err.to_string().contains("too many decimal places"));
        }
    }

    #[test]
    fn format_base_to_ui_trims_zeros() {
        assert_eq!(format_base_to_ui(U256::from(1_500_000_u64), 6), "1.5");
        assert_eq!(format_base_to_ui(U256::from(1_u64), 6), "0.000001");
        assert_eq!(format_base_to_ui(U256::from(10_000_000_u64), 6), "10");
        assert_eq!(format_base_to_ui(U256::ZERO, 18), "0");
        assert_eq!(format_base_to_ui(U256::from(42_u64), 0), "42");
    }
}
