//! Tests for the activity normalizer.

#[cfg(test)]
mod tests {
    use crate::activities::*;
    use crate::errors::{Error, ErrorKind};
    use crate::symbols::SymbolMap;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn account() -> DestinationAccount {
        DestinationAccount {
            id: "acc-1".to_string(),
            name: "Alpaca".to_string(),
            currency: "USD".to_string(),
            platform_id: None,
        }
    }

    fn fill(id: &str, side: &str, symbol: &str, qty: &str, price: &str) -> SourceActivity {
        SourceActivity {
            id: id.to_string(),
            activity_type: "FILL".to_string(),
            side: Some(side.to_string()),
            symbol: Some(symbol.to_string()),
            quantity: Some(qty.to_string()),
            price: Some(price.to_string()),
            timestamp: "2024-03-05T14:30:00.123Z".to_string(),
            ..Default::default()
        }
    }

    fn cash_activity(id: &str, activity_type: &str, amount: &str) -> SourceActivity {
        SourceActivity {
            id: id.to_string(),
            activity_type: activity_type.to_string(),
            amount: Some(amount.to_string()),
            timestamp: "2024-03-01".to_string(),
            ..Default::default()
        }
    }

    fn expect_tx(result: crate::Result<Normalized>) -> CanonicalTransaction {
        match result {
            Ok(Normalized::Transaction(tx)) => tx,
            other => panic!("expected transaction, got {:?}", other),
        }
    }

    // ============================================================================
    // Classification
    // ============================================================================

    #[test]
    fn test_classification_priority() {
        assert_eq!(classify("FILL", Some("buy")), Some(TransactionType::Buy));
        assert_eq!(classify("FILL", Some("sell")), Some(TransactionType::Sell));
        assert_eq!(
            classify("FILL", Some("sell_short")),
            Some(TransactionType::Sell)
        );
        assert_eq!(classify("DIV", None), Some(TransactionType::Dividend));
        assert_eq!(classify("DIVNRA", None), Some(TransactionType::Dividend));
        assert_eq!(classify("DIVFEE", None), Some(TransactionType::Dividend));
        assert_eq!(classify("INT", None), Some(TransactionType::Interest));
        assert_eq!(classify("INTTW", None), Some(TransactionType::Interest));
        assert_eq!(classify("FEE", None), Some(TransactionType::Fee));
        assert_eq!(classify("CFEE", None), Some(TransactionType::Fee));
    }

    #[test]
    fn test_unsupported_kinds_are_not_classified() {
        for code in ["JNLC", "JNLS", "ACATC", "CSD", "MA", "SSO", ""] {
            assert_eq!(classify(code, None), None, "{}", code);
        }
        assert_eq!(classify("FILL", None), None);
        assert_eq!(classify("FILL", Some("hold")), None);
    }

    #[test]
    fn test_skip_carries_raw_type() {
        let activity = cash_activity("j-1", "JNLC", "100");
        let result = normalize(&activity, &SymbolMap::default(), &account()).unwrap();
        assert_eq!(result, Normalized::Skip("JNLC".to_string()));
    }

    // ============================================================================
    // Trades
    // ============================================================================

    #[test]
    fn test_buy_fill() {
        let tx = expect_tx(normalize(
            &fill("f-1", "buy", "AAPL", "10", "170.5"),
            &SymbolMap::default(),
            &account(),
        ));

        assert_eq!(tx.transaction_type, TransactionType::Buy);
        assert_eq!(tx.symbol, "AAPL");
        assert_eq!(tx.quantity, dec!(10));
        assert_eq!(tx.unit_price, dec!(170.5));
        assert_eq!(tx.fee, dec!(0));
        assert_eq!(tx.currency, "USD");
        assert_eq!(tx.data_source, DataSource::Yahoo);
        assert_eq!(tx.account_id, "acc-1");
        assert_eq!(tx.comment, "source_id=f-1");
        assert_eq!(
            tx.date,
            Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap()
                + chrono::Duration::milliseconds(123)
        );
    }

    #[test]
    fn test_short_sell_uses_absolute_values() {
        let tx = expect_tx(normalize(
            &fill("f-2", "sell_short", "TSLA", "-3", "-200"),
            &SymbolMap::default(),
            &account(),
        ));
        assert_eq!(tx.transaction_type, TransactionType::Sell);
        assert_eq!(tx.quantity, dec!(3));
        assert_eq!(tx.unit_price, dec!(200));
    }

    #[test]
    fn test_fill_symbol_is_mapped() {
        let symbols: SymbolMap = [("BTC/USD".to_string(), "BTCUSD".to_string())]
            .into_iter()
            .collect();
        let tx = expect_tx(normalize(
            &fill("f-3", "buy", "BTC/USD", "0.0015", "61000"),
            &symbols,
            &account(),
        ));
        assert_eq!(tx.symbol, "BTCUSD");
        assert_eq!(tx.quantity, dec!(0.0015));
    }

    #[test]
    fn test_scientific_quantity_is_accepted() {
        let tx = expect_tx(normalize(
            &fill("f-4", "buy", "ETHUSD", "1.5e-3", "3000"),
            &SymbolMap::default(),
            &account(),
        ));
        assert_eq!(tx.quantity, dec!(0.0015));
    }

    // ============================================================================
    // Income and fees
    // ============================================================================

    #[test]
    fn test_dividend_with_quantity_computes_per_share_price() {
        let mut activity = cash_activity("d-1", "DIV", "12.50");
        activity.symbol = Some("KO".to_string());
        activity.quantity = Some("25".to_string());

        let tx = expect_tx(normalize(&activity, &SymbolMap::default(), &account()));
        assert_eq!(tx.transaction_type, TransactionType::Dividend);
        assert_eq!(tx.symbol, "KO");
        assert_eq!(tx.quantity, dec!(25));
        assert_eq!(tx.unit_price, dec!(0.5));
        assert_eq!(tx.data_source, DataSource::Yahoo);
        assert_eq!(tx.date, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_dividend_without_quantity_uses_amount() {
        let mut activity = cash_activity("d-2", "DIVNRA", "-1.80");
        activity.symbol = Some("KO".to_string());
        activity.quantity = Some("0".to_string());

        let tx = expect_tx(normalize(&activity, &SymbolMap::default(), &account()));
        assert_eq!(tx.quantity, dec!(1));
        assert_eq!(tx.unit_price, dec!(1.80));
    }

    #[test]
    fn test_interest_is_cash_row() {
        let tx = expect_tx(normalize(
            &cash_activity("i-1", "INT", "3.21"),
            &SymbolMap::default(),
            &account(),
        ));
        assert_eq!(tx.transaction_type, TransactionType::Interest);
        assert_eq!(tx.symbol, "USD");
        assert_eq!(tx.quantity, dec!(1));
        assert_eq!(tx.unit_price, dec!(3.21));
        assert_eq!(tx.data_source, DataSource::Manual);
        assert_eq!(tx.comment, "source_id=i-1 - Interest");
    }

    #[test]
    fn test_fee_amount_goes_to_fee_field() {
        let tx = expect_tx(normalize(
            &cash_activity("c-1", "CFEE", "-0.02"),
            &SymbolMap::default(),
            &account(),
        ));
        assert_eq!(tx.transaction_type, TransactionType::Fee);
        assert_eq!(tx.quantity, dec!(0));
        assert_eq!(tx.unit_price, dec!(0));
        assert_eq!(tx.fee, dec!(0.02));
        assert_eq!(tx.comment, "source_id=c-1 - Fee");
    }

    #[test]
    fn test_zero_fee_is_still_normalized() {
        let tx = expect_tx(normalize(
            &cash_activity("c-2", "FEE", "0"),
            &SymbolMap::default(),
            &account(),
        ));
        assert_eq!(tx.fee, dec!(0));
    }

    #[test]
    fn test_activity_currency_wins_over_account_currency() {
        let mut activity = cash_activity("i-2", "INT", "1");
        activity.currency = Some("EUR".to_string());
        let tx = expect_tx(normalize(&activity, &SymbolMap::default(), &account()));
        assert_eq!(tx.currency, "EUR");
        assert_eq!(tx.symbol, "EUR");
    }

    // ============================================================================
    // Malformed records
    // ============================================================================

    fn expect_malformed(result: crate::Result<Normalized>, source_id: &str) {
        match result {
            Err(err @ Error::MalformedActivity { .. }) => {
                assert_eq!(err.kind(), ErrorKind::MalformedActivity);
                if let Error::MalformedActivity { source_id: id, .. } = err {
                    assert_eq!(id, source_id);
                }
            }
            other => panic!("expected malformed activity, got {:?}", other),
        }
    }

    #[test]
    fn test_unparseable_quantity_is_malformed() {
        let result = normalize(
            &fill("f-9", "buy", "AAPL", "ten", "1"),
            &SymbolMap::default(),
            &account(),
        );
        expect_malformed(result, "f-9");
    }

    #[test]
    fn test_missing_amount_is_malformed() {
        let mut activity = cash_activity("d-9", "DIV", "");
        activity.symbol = Some("KO".to_string());
        expect_malformed(
            normalize(&activity, &SymbolMap::default(), &account()),
            "d-9",
        );
    }

    #[test]
    fn test_dividend_per_share_overflow_is_malformed() {
        let mut activity = cash_activity("d-10", "DIV", "79228162514264337593543950335");
        activity.symbol = Some("KO".to_string());
        activity.quantity = Some("0.0000001".to_string());
        expect_malformed(
            normalize(&activity, &SymbolMap::default(), &account()),
            "d-10",
        );
    }

    #[test]
    fn test_missing_fill_symbol_is_malformed() {
        let mut activity = fill("f-10", "buy", "", "1", "1");
        activity.symbol = None;
        expect_malformed(
            normalize(&activity, &SymbolMap::default(), &account()),
            "f-10",
        );
    }

    #[test]
    fn test_bad_timestamp_is_malformed() {
        let mut activity = cash_activity("i-9", "INT", "1");
        activity.timestamp = "03/01/2024".to_string();
        expect_malformed(
            normalize(&activity, &SymbolMap::default(), &account()),
            "i-9",
        );
    }

    #[test]
    fn test_id_with_whitespace_is_malformed() {
        expect_malformed(
            normalize(
                &cash_activity("i 10", "INT", "1"),
                &SymbolMap::default(),
                &account(),
            ),
            "i 10",
        );
    }

    #[test]
    fn test_unsupported_kind_is_skipped_even_when_malformed() {
        let mut activity = cash_activity("", "JNLC", "abc");
        activity.timestamp = "garbage".to_string();
        assert!(matches!(
            normalize(&activity, &SymbolMap::default(), &account()),
            Ok(Normalized::Skip(_))
        ));
    }
}
