//! Token and cost budgeting before a completion is sent.

pub mod gate;
pub mod pricing;
pub mod tokens;

pub use gate::{BudgetGate, GateDecision};
pub use pricing::PricingTable;
pub use tokens::TokenCounter;

/// `1234567` -> `1,234,567`
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(1_000_000), "1,000,000");
        assert_eq!(format_thousands(12_345), "12,345");
    }
}
