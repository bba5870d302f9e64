//! Display formatting for headline figures

use serde::{Deserialize, Serialize};

/// How a card's value is rendered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "lowercase")]
pub enum Format {
    /// Whole number with thousands separators: `12,345`
    Integer,
    /// Dollar amount with thousands separators: `$1,234.50`
    Currency { decimals: usize },
    /// Plain decimal with an optional unit suffix: `34.5 years`
    Decimal { decimals: usize, suffix: String },
    /// Percentage: `15.0%`
    Percent { decimals: usize },
}

impl Format {
    pub fn apply(&self, value: f64) -> String {
        match self {
            Format::Integer => group_thousands(value, 0),
            Format::Currency { decimals } => {
                let body = group_thousands(value.abs(), *decimals);
                if value < 0.0 && body.chars().any(|c| c.is_ascii_digit() && c != '0') {
                    format!("-${}", body)
                } else {
                    format!("${}", body)
                }
            }
            Format::Decimal { decimals, suffix } => {
                let body = format!("{:.*}", *decimals, value);
                if suffix.is_empty() {
                    body
                } else {
                    format!("{} {}", body, suffix)
                }
            }
            Format::Percent { decimals } => format!("{:.*}%", *decimals, value),
        }
    }
}

/// Fixed-point rendering with `,` between thousands
pub fn group_thousands(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value);
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}
