use crate::domain::model::{TariffBreakdown, TariffInput};

impl TariffInput {
    pub fn cif(&self) -> f64 {
        self.fob + self.freight + self.insurance
    }
}

/// Landed cost in local currency: CIF converted at the exchange rate, then
/// duty, then VAT on top of the duty-inclusive value.
///
/// No bounds are enforced; any finite input yields a finite or infinite
/// float, never a panic.
pub fn landed_cost(input: &TariffInput) -> f64 {
    (input.cif() * input.exchange_rate)
        * (1.0 + input.duty_pct / 100.0)
        * (1.0 + input.vat_pct / 100.0)
}

pub fn calculate(input: TariffInput) -> TariffBreakdown {
    TariffBreakdown {
        input,
        cif: input.cif(),
        total_local: landed_cost(&input),
    }
}

/// Formats an amount with no decimals and `,` thousands separators.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let rounded = format!("{:.0}", value);
    let (sign, digits) = match rounded.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rounded.as_str()),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    // "-0" after rounding a tiny negative value
    if grouped == "0" {
        return grouped;
    }

    format!("{}{}", sign, grouped)
}

pub fn summary_payload(breakdown: &TariffBreakdown) -> String {
    format!("Total: {}", format_amount(breakdown.total_local))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TariffInput {
        TariffInput {
            fob: 1000.0,
            freight: 150.0,
            insurance: 25.0,
            exchange_rate: 4000.0,
            duty_pct: 10.0,
            vat_pct: 19.0,
        }
    }

    #[test]
    fn test_golden_landed_cost() {
        let result = calculate(sample());
        assert_eq!(result.cif, 1175.0);
        assert_eq!(result.total_local, 6_152_300.0);
        assert_eq!(summary_payload(&result), "Total: 6,152,300");
    }

    #[test]
    fn test_zero_rates_equal_converted_cif() {
        let input = TariffInput {
            duty_pct: 0.0,
            vat_pct: 0.0,
            ..sample()
        };
        assert_eq!(landed_cost(&input), input.cif() * input.exchange_rate);
    }

    #[test]
    fn test_bit_for_bit_determinism() {
        let input = TariffInput {
            fob: 1234.567,
            freight: 89.01,
            insurance: 2.345,
            exchange_rate: 3987.65,
            duty_pct: 7.5,
            vat_pct: 5.0,
        };
        let first = landed_cost(&input).to_bits();
        for _ in 0..100 {
            assert_eq!(landed_cost(&input).to_bits(), first);
        }
    }

    #[test]
    fn test_negative_and_zero_inputs_do_not_panic() {
        let input = TariffInput {
            fob: -10.0,
            freight: 0.0,
            insurance: 0.0,
            exchange_rate: 2.0,
            duty_pct: -100.0,
            vat_pct: 0.0,
        };
        assert_eq!(landed_cost(&input), 0.0);

        let all_zero = TariffInput {
            fob: 0.0,
            freight: 0.0,
            insurance: 0.0,
            exchange_rate: 0.0,
            duty_pct: 0.0,
            vat_pct: 0.0,
        };
        assert_eq!(landed_cost(&all_zero), 0.0);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(999.0), "999");
        assert_eq!(format_amount(1000.0), "1,000");
        assert_eq!(format_amount(4_700_000.0), "4,700,000");
        assert_eq!(format_amount(1_234_567.6), "1,234,568");
        assert_eq!(format_amount(-1_500.0), "-1,500");
        assert_eq!(format_amount(-0.2), "0");
    }
}
