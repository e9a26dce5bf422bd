//! CNPJ and CNAE normalization
//!
//! A CNPJ is 14 digits: an 8-digit root identifying the company, a 4-digit
//! establishment (branch) number and 2 check digits. Datasets are joined on
//! the root only.

/// Length of a canonical CNPJ root
pub const CNPJ_ROOT_LEN: usize = 8;

/// Strip every character that is not an ASCII digit
pub fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Canonical 8-digit CNPJ root
///
/// Longer inputs keep their first 8 digits, shorter ones are left-padded
/// with zeros. Input without any digit yields an empty string.
///
/// # Examples
/// ```
/// use btm_common::normalize::cnpj_root;
///
/// assert_eq!(cnpj_root("12.345.678/0001-99"), "12345678");
/// assert_eq!(cnpj_root("123"), "00000123");
/// assert_eq!(cnpj_root("n/a"), "");
/// ```
pub fn cnpj_root(value: &str) -> String {
    let digits = digits_only(value);
    if digits.is_empty() {
        return String::new();
    }
    if digits.len() >= CNPJ_ROOT_LEN {
        digits[..CNPJ_ROOT_LEN].to_string()
    } else {
        format!("{:0>width$}", digits, width = CNPJ_ROOT_LEN)
    }
}

/// [`cnpj_root`] over an optional cell
pub fn cnpj_root_opt(value: Option<&str>) -> String {
    value.map(cnpj_root).unwrap_or_default()
}

/// Digits-only form of a CNAE code ("6201-5/01" -> "6201501")
pub fn norm_cnae(value: &str) -> String {
    digits_only(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatted_cnpj_keeps_root() {
        assert_eq!(cnpj_root("12.345.678/0001-99"), "12345678");
    }

    #[test]
    fn test_short_input_is_zero_padded() {
        assert_eq!(cnpj_root("123"), "00000123");
        assert_eq!(cnpj_root("1"), "00000001");
        assert_eq!(cnpj_root("1234567"), "01234567");
    }

    #[test]
    fn test_exactly_eight_digits_unchanged() {
        assert_eq!(cnpj_root("87654321"), "87654321");
    }

    #[test]
    fn test_no_digits_yields_empty() {
        assert_eq!(cnpj_root(""), "");
        assert_eq!(cnpj_root("   "), "");
        assert_eq!(cnpj_root("sem cnpj"), "");
        assert_eq!(cnpj_root_opt(None), "");
    }

    #[test]
    fn test_optional_cell() {
        assert_eq!(cnpj_root_opt(Some("00.000.000/0001-00")), "00000000");
    }

    #[test]
    fn test_non_ascii_digits_are_ignored() {
        // Arabic-Indic digits are not part of the CNPJ alphabet
        assert_eq!(cnpj_root("١٢٣45"), "00000045");
    }

    #[test]
    fn test_length_law_over_mixed_inputs() {
        let inputs = [
            "",
            "x",
            "0",
            "12-3",
            "12.345.678/0001-99",
            "00000000000100",
            "CNPJ: 33.000.167/0001-01",
            "9999999999999999999999",
            "abc1def",
        ];
        for input in inputs {
            let root = cnpj_root(input);
            let has_digit = input.chars().any(|c| c.is_ascii_digit());
            if has_digit {
                assert_eq!(root.len(), CNPJ_ROOT_LEN, "input {:?}", input);
                assert!(root.chars().all(|c| c.is_ascii_digit()));
            } else {
                assert!(root.is_empty(), "input {:?}", input);
            }
        }
    }

    #[test]
    fn test_norm_cnae() {
        assert_eq!(norm_cnae("6201-5/01"), "6201501");
        assert_eq!(norm_cnae(""), "");
    }
}
