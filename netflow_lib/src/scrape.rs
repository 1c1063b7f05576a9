//! Row parsers for the two report page layouts.
//!
//! Both parsers run against the rows returned by [`crate::table::extract_table`].
//! A row that does not match the expected shape is skipped, never raised,
//! so a partially matching page still yields its usable rows.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use ebrokerdj_api::types::{BrokerFlowRow, TrustRankRow};

use crate::table::{extract_from_document, RawTableRow};

static DATE_LABEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.t11").expect("valid selector"));
static FULL_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})[/-](\d{1,2})[/-](\d{1,2})").expect("valid regex"));
static MONTH_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})[/-](\d{1,2})").expect("valid regex"));
static DATA_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"資料日期[:：]?(\d{4})(\d{2})(\d{2})").expect("valid regex"));
static LEADING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Labels of summary rows on broker flow pages.
const SUMMARY_MARKERS: &[&str] = &["合計", "總計"];

const TRUST_RANK_CELLS: usize = 8;
const BROKER_FLOW_CELLS: usize = 4;

/// Parses an investment-trust ranking page into rows sorted by rank.
///
/// `today` anchors pages that print only month and day.
pub fn parse_trust_rank_page(html: &str, today: NaiveDate) -> Vec<TrustRankRow> {
    let document = Html::parse_document(html);
    let date = trust_rank_date(&document, today);

    let mut rows: Vec<TrustRankRow> = extract_from_document(&document)
        .iter()
        .filter_map(|row| trust_rank_row(row, date))
        .collect();
    rows.sort_by_key(|r| r.rank);

    tracing::debug!("parsed {} trust ranking rows (date {:?})", rows.len(), date);
    rows
}

/// Parses a broker branch flow page.
pub fn parse_broker_flow_page(html: &str) -> Vec<BrokerFlowRow> {
    let document = Html::parse_document(html);
    let date = broker_flow_date(html);

    let rows: Vec<BrokerFlowRow> = extract_from_document(&document)
        .iter()
        .filter_map(|row| broker_flow_row(row, date))
        .collect();

    tracing::debug!("parsed {} broker flow rows (date {:?})", rows.len(), date);
    rows
}

/// Reads one ranking row: rank, "code name", close, change, change %,
/// buy, sell, net.
pub fn trust_rank_row(row: &RawTableRow, date: Option<NaiveDate>) -> Option<TrustRankRow> {
    if row.len() < TRUST_RANK_CELLS {
        return None;
    }
    let rank = parse_rank(row.text(0))?;

    let mut parts = row.text(1).split_whitespace();
    let code = parts.next()?.to_string();
    let name = parts.collect::<Vec<_>>().join(" ");

    Some(TrustRankRow {
        date,
        rank,
        code,
        name,
        close: to_number(row.text(2)),
        change: row.text(3).to_string(),
        change_pct: row.text(4).to_string(),
        buy: to_number(row.text(5)),
        sell: to_number(row.text(6)),
        net: to_number(row.text(7)),
    })
}

/// Reads one broker flow row: label markup, buy, sell, diff.
///
/// Summary rows and rows whose three amounts are all zero are skipped.
pub fn broker_flow_row(row: &RawTableRow, date: Option<NaiveDate>) -> Option<BrokerFlowRow> {
    if row.len() < BROKER_FLOW_CELLS {
        return None;
    }

    let label_cell = &row.cells[0];
    let broker = match label_cell.html.trim() {
        "" => label_cell.text.trim(),
        html => html,
    };
    if broker.is_empty() || SUMMARY_MARKERS.iter().any(|m| broker.contains(m)) {
        return None;
    }

    let buy_amt = to_number(row.text(1));
    let sell_amt = to_number(row.text(2));
    let diff = to_number(row.text(3));
    if buy_amt == 0.0 && sell_amt == 0.0 && diff == 0.0 {
        return None;
    }

    Some(BrokerFlowRow {
        date,
        broker: broker.to_string(),
        buy_amt,
        sell_amt,
        diff,
    })
}

/// Report date of a ranking page, taken from the first `div.t11` mentioning 日期.
pub fn trust_rank_date(document: &Html, today: NaiveDate) -> Option<NaiveDate> {
    let label = document
        .select(&DATE_LABEL)
        .map(|el| el.text().collect::<String>())
        .find(|text| text.contains("日期"))?;
    trust_rank_date_from_label(label.trim(), today)
}

/// Parses `YYYY/MM/DD` (or `-`), falling back to `MM/DD` in `today`'s year.
///
/// A December date read in January belongs to the previous year.
pub fn trust_rank_date_from_label(label: &str, today: NaiveDate) -> Option<NaiveDate> {
    if let Some(caps) = FULL_DATE.captures(label) {
        return NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        );
    }

    let caps = MONTH_DAY.captures(label)?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    let mut year = today.year();
    if today.month() == 1 && month == 12 {
        year -= 1;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Report date of a broker flow page: `資料日期：YYYYMMDD` anywhere in the page.
pub fn broker_flow_date(html: &str) -> Option<NaiveDate> {
    let compact = WHITESPACE.replace_all(html, "");
    let caps = DATA_DATE.captures(&compact)?;
    NaiveDate::from_ymd_opt(
        caps[1].parse().ok()?,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
    )
}

/// Lenient number reading: thousands separators are dropped and the longest
/// numeric prefix is used. Anything unreadable is `0.0`.
pub fn to_number(text: &str) -> f64 {
    let cleaned = text.replace(',', "");
    LEADING_NUMBER
        .find(cleaned.trim())
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

fn parse_rank(text: &str) -> Option<u32> {
    let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn row(cells: &[&str]) -> RawTableRow {
        RawTableRow {
            cells: cells
                .iter()
                .map(|c| Cell {
                    text: c.to_string(),
                    html: c.to_string(),
                })
                .collect(),
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn to_number_is_lenient() {
        assert_eq!(to_number("1,234"), 1234.0);
        assert_eq!(to_number(" -56.5 "), -56.5);
        assert_eq!(to_number("+3"), 3.0);
        assert_eq!(to_number("12張"), 12.0);
        assert_eq!(to_number("--"), 0.0);
        assert_eq!(to_number(""), 0.0);
    }

    #[test]
    fn trust_row_parses_all_fields() {
        let r = row(&[
            "1", "2330 台積電", "1,050.00", "+5.00", "+0.48%", "3,000", "1,000", "2,000",
        ]);
        let parsed = trust_rank_row(&r, Some(ymd(2025, 8, 26))).unwrap();
        assert_eq!(parsed.rank, 1);
        assert_eq!(parsed.code, "2330");
        assert_eq!(parsed.name, "台積電");
        assert_eq!(parsed.close, 1050.0);
        assert_eq!(parsed.change, "+5.00");
        assert_eq!(parsed.change_pct, "+0.48%");
        assert_eq!(parsed.buy, 3000.0);
        assert_eq!(parsed.sell, 1000.0);
        assert_eq!(parsed.net, 2000.0);
    }

    #[test]
    fn trust_row_keeps_multi_word_names() {
        let r = row(&["7", "00919 群益 台灣精選高息", "23", "0", "0%", "1", "0", "1"]);
        let parsed = trust_rank_row(&r, None).unwrap();
        assert_eq!(parsed.code, "00919");
        assert_eq!(parsed.name, "群益 台灣精選高息");
    }

    #[test]
    fn trust_row_skips_bad_shapes() {
        assert!(trust_rank_row(&row(&["名次", "股票", "收盤", "漲跌", "%", "買", "賣", "超"]), None).is_none());
        assert!(trust_rank_row(&row(&["1", "2330 台積電", "1", "2"]), None).is_none());
        assert!(trust_rank_row(&row(&["1", "  ", "1", "2", "3", "4", "5", "6"]), None).is_none());
    }

    #[test]
    fn broker_row_uses_markup_label() {
        let r = RawTableRow {
            cells: vec![
                Cell {
                    text: "".into(),
                    html: "<script>GenLink2stk('AS2330','台積電');</script>".into(),
                },
                Cell { text: "12,345".into(), html: "12,345".into() },
                Cell { text: "2,345".into(), html: "2,345".into() },
                Cell { text: "10,000".into(), html: "10,000".into() },
            ],
        };
        let parsed = broker_flow_row(&r, None).unwrap();
        assert!(parsed.broker.contains("GenLink2stk('AS2330','台積電')"));
        assert_eq!(parsed.buy_amt, 12345.0);
        assert_eq!(parsed.sell_amt, 2345.0);
        assert_eq!(parsed.diff, 10000.0);
    }

    #[test]
    fn broker_row_falls_back_to_text() {
        let r = RawTableRow {
            cells: vec![
                Cell { text: " 2603 長榮 ".into(), html: "  ".into() },
                Cell { text: "5".into(), html: "5".into() },
                Cell { text: "1".into(), html: "1".into() },
                Cell { text: "4".into(), html: "4".into() },
            ],
        };
        assert_eq!(broker_flow_row(&r, None).unwrap().broker, "2603 長榮");
    }

    #[test]
    fn broker_row_skips_totals_and_zero_rows() {
        assert!(broker_flow_row(&row(&["合計", "100", "50", "50"]), None).is_none());
        assert!(broker_flow_row(&row(&["總計", "100", "50", "50"]), None).is_none());
        assert!(broker_flow_row(&row(&["2330 台積電", "0", "0", "0"]), None).is_none());
        assert!(broker_flow_row(&row(&["買進", "賣出", "差額", "x"]), None).is_none());
        assert!(broker_flow_row(&row(&["2330 台積電", "1", "2"]), None).is_none());
    }

    #[test]
    fn broker_row_keeps_diff_as_printed() {
        let parsed = broker_flow_row(&row(&["2330 台積電", "100", "40", "50"]), None).unwrap();
        assert_eq!(parsed.diff, 50.0);
    }

    #[test]
    fn trust_date_full_and_month_day() {
        let today = ymd(2025, 8, 27);
        assert_eq!(trust_rank_date_from_label("日期：2025/08/26", today), Some(ymd(2025, 8, 26)));
        assert_eq!(trust_rank_date_from_label("日期：2024-12-31", today), Some(ymd(2024, 12, 31)));
        assert_eq!(trust_rank_date_from_label("日期：08/26", today), Some(ymd(2025, 8, 26)));
        assert_eq!(trust_rank_date_from_label("日期：8-5", today), Some(ymd(2025, 8, 5)));
        assert_eq!(trust_rank_date_from_label("日期：--", today), None);
    }

    #[test]
    fn trust_date_rolls_back_in_january() {
        let today = ymd(2026, 1, 2);
        assert_eq!(trust_rank_date_from_label("日期：12/31", today), Some(ymd(2025, 12, 31)));
        assert_eq!(trust_rank_date_from_label("日期：01/02", today), Some(ymd(2026, 1, 2)));
    }

    #[test]
    fn trust_date_uses_first_matching_label() {
        let html = r#"<div class="t11">單位：張</div><div class="t11">日期：08/26</div><div class="t11">日期：08/25</div>"#;
        let document = Html::parse_document(html);
        assert_eq!(trust_rank_date(&document, ymd(2025, 8, 27)), Some(ymd(2025, 8, 26)));
    }

    #[test]
    fn trust_date_missing() {
        let document = Html::parse_document("<div class=\"t10\">日期：08/26</div>");
        assert_eq!(trust_rank_date(&document, ymd(2025, 8, 27)), None);
    }

    #[test]
    fn broker_date_variants() {
        assert_eq!(broker_flow_date("<div>資料日期：20250825</div>"), Some(ymd(2025, 8, 25)));
        assert_eq!(broker_flow_date("資料日期: 2025 08 25"), Some(ymd(2025, 8, 25)));
        assert_eq!(broker_flow_date("資料日期20250825"), Some(ymd(2025, 8, 25)));
        assert_eq!(broker_flow_date("日期：2025/08/25"), None);
    }

    #[test]
    fn trust_page_sorted_by_rank() {
        let html = r#"<html><body>
            <div class="t11">日期：08/26</div>
            <table>
              <tr><td>名次</td><td>股票名稱</td><td>收盤價</td><td>漲跌</td><td>漲跌幅</td><td>買進</td><td>賣出</td><td>買賣超</td></tr>
              <tr><td>2</td><td>2603 長榮</td><td>180.5</td><td>-1.5</td><td>-0.82%</td><td>600</td><td>100</td><td>500</td></tr>
              <tr><td>1</td><td>2330 台積電</td><td>1,050</td><td>+5</td><td>+0.48%</td><td>3,000</td><td>1,000</td><td>2,000</td></tr>
            </table></body></html>"#;
        let rows = parse_trust_rank_page(html, ymd(2025, 8, 27));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].code, "2330");
        assert_eq!(rows[1].code, "2603");
        assert_eq!(rows[0].date, Some(ymd(2025, 8, 26)));
    }
}
