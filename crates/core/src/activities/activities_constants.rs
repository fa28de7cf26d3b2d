//! Source activity type codes
//!
//! Codes as reported by the brokerage. Only the families below are imported.
//! Transfers (ACATC, ACATS), journals (JNL, JNLC, JNLS) and mergers (MA) are
//! skipped along with anything else.

/// Order fill. Becomes BUY or SELL depending on the side.
pub const SOURCE_TYPE_FILL: &str = "FILL";

/// Prefix shared by every dividend variant (DIV, DIVCGL, DIVNRA, DIVROC, ...).
pub const SOURCE_DIVIDEND_PREFIX: &str = "DIV";

/// Prefix shared by every interest variant (INT, INTNRA, INTTW).
pub const SOURCE_INTEREST_PREFIX: &str = "INT";

/// Standalone fee.
pub const SOURCE_TYPE_FEE: &str = "FEE";

/// Commission fee.
pub const SOURCE_TYPE_COMMISSION_FEE: &str = "CFEE";

/// Fee-family codes.
pub const SOURCE_FEE_TYPES: [&str; 2] = [SOURCE_TYPE_FEE, SOURCE_TYPE_COMMISSION_FEE];

/// Fill side that opens or adds to a position.
pub const SIDE_BUY: &str = "buy";

/// Fill sides that reduce a position.
pub const SIDE_SELL: [&str; 2] = ["sell", "sell_short"];

/// Comment label appended to interest rows.
pub const INTEREST_COMMENT_LABEL: &str = "Interest";

/// Comment label appended to fee rows.
pub const FEE_COMMENT_LABEL: &str = "Fee";

/// Returns true for codes of the fee family.
pub fn is_fee_type(activity_type: &str) -> bool {
    SOURCE_FEE_TYPES.contains(&activity_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_fee_type() {
        assert!(is_fee_type("FEE"));
        assert!(is_fee_type("CFEE"));
        assert!(!is_fee_type("DIVFEE"));
        assert!(!is_fee_type("fee"));
        assert!(!is_fee_type(""));
    }
}
