//! Lots-to-amount estimate for investment-trust ranking rows.
//!
//! The ranking page reports traded lots, not money. Multiplying by the close
//! price gives an approximate amount so a ranking can stand in as a flow
//! source. Results are estimates and are flagged as such when rendered.

use ebrokerdj_api::types::{BrokerFlowRow, TrustRankRow};

/// Converts ranking rows into flow rows labelled `"<code> <name>"`.
pub fn trust_to_broker(rows: &[TrustRankRow]) -> Vec<BrokerFlowRow> {
    rows.iter()
        .map(|row| BrokerFlowRow {
            date: row.date,
            broker: format!("{} {}", row.code, row.name).trim().to_string(),
            buy_amt: estimate_amount(row.buy, row.close),
            sell_amt: estimate_amount(row.sell, row.close),
            diff: estimate_amount(row.net, row.close),
        })
        .collect()
}

/// `lots * price` rounded with halves toward positive infinity, with
/// non-finite products read as zero.
pub fn estimate_amount(lots: f64, price: f64) -> f64 {
    let amount = (lots * price + 0.5).floor();
    if amount.is_finite() {
        amount
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::parse_code_name;
    use chrono::NaiveDate;

    fn trust(code: &str, name: &str, close: f64, buy: f64, sell: f64, net: f64) -> TrustRankRow {
        TrustRankRow {
            date: NaiveDate::from_ymd_opt(2025, 8, 26),
            rank: 1,
            code: code.into(),
            name: name.into(),
            close,
            change: "+1".into(),
            change_pct: "+0.1%".into(),
            buy,
            sell,
            net,
        }
    }

    #[test]
    fn multiplies_lots_by_close() {
        let rows = trust_to_broker(&[trust("2330", "台積電", 1050.5, 3.0, 1.0, 2.0)]);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.broker, "2330 台積電");
        assert_eq!(row.buy_amt, 3152.0);
        assert_eq!(row.sell_amt, 1051.0);
        assert_eq!(row.diff, 2101.0);
        assert_eq!(row.date, NaiveDate::from_ymd_opt(2025, 8, 26));
    }

    #[test]
    fn negative_net_stays_negative() {
        let rows = trust_to_broker(&[trust("2603", "長榮", 180.0, 0.0, 500.0, -500.0)]);
        assert_eq!(rows[0].diff, -90000.0);
    }

    #[test]
    fn labels_parse_back_to_code_and_name() {
        let rows = trust_to_broker(&[trust("00919", "群益台灣精選高息", 23.1, 1.0, 0.0, 1.0)]);
        let parsed = parse_code_name(&rows[0].broker).unwrap();
        assert_eq!(parsed.code, "00919");
        assert_eq!(parsed.name, "群益台灣精選高息");
    }

    #[test]
    fn non_finite_amounts_become_zero() {
        assert_eq!(estimate_amount(f64::NAN, 10.0), 0.0);
        assert_eq!(estimate_amount(f64::MAX, 10.0), 0.0);
        assert_eq!(estimate_amount(2.0, 0.25), 1.0);
    }

    #[test]
    fn halves_round_up() {
        assert_eq!(estimate_amount(1.0, 23.5), 24.0);
        assert_eq!(estimate_amount(-1.0, 23.5), -23.0);
        assert_eq!(estimate_amount(-1.0, 23.6), -24.0);
    }
}
