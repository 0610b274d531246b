/// Formats an amount in 만원 as "X억 Y만", dropping whichever part is zero.
///
/// Fractional 만 are truncated. Zero renders as "0만".
pub fn format_amount(man: f64) -> String {
    if !man.is_finite() {
        return "0만".to_string();
    }
    let whole = man.trunc() as i64;
    if whole < 0 {
        return format!("-{}", format_amount(-(whole as f64)));
    }
    let (uk, rem) = (whole / 10_000, whole % 10_000);
    match (uk, rem) {
        (0, rem) => format!("{rem}만"),
        (uk, 0) => format!("{uk}억"),
        (uk, rem) => format!("{uk}억 {rem}만"),
    }
}

/// Signed variant for deltas, e.g. "+1억 200만".
pub fn format_amount_delta(man: f64) -> String {
    if man.is_finite() && man.trunc() > 0.0 {
        format!("+{}", format_amount(man))
    } else {
        format_amount(man)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_uk_and_man_components() {
        assert_eq!(format_amount(0.0), "0만");
        assert_eq!(format_amount(10_000.0), "1억");
        assert_eq!(format_amount(12_345.0), "1억 2345만");
        assert_eq!(format_amount(9_999.0), "9999만");
        assert_eq!(format_amount(59_500.0), "5억 9500만");
        assert_eq!(format_amount(60_000.0), "6억");
    }

    #[test]
    fn truncates_fractions_and_handles_odd_values() {
        assert_eq!(format_amount(12_247.9), "1억 2247만");
        assert_eq!(format_amount(0.4), "0만");
        assert_eq!(format_amount(f64::NAN), "0만");
        assert_eq!(format_amount(-12_345.0), "-1억 2345만");
    }

    #[test]
    fn deltas_carry_a_sign() {
        assert_eq!(format_amount_delta(10_200.0), "+1억 200만");
        assert_eq!(format_amount_delta(-500.0), "-500만");
        assert_eq!(format_amount_delta(0.0), "0만");
    }
}
