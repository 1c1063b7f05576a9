//! Text digest of one overlap run.

use std::fmt::Write as _;

use chrono::NaiveDate;
use serde::Serialize;

use crate::overlap::OverlapResult;

pub const STALE_NOTICE: &str = "資料尚未更新";
pub const NO_OVERLAP_NOTICE: &str = "今日無重疊標的";
const ESTIMATE_FOOTNOTE: &str = "* 投信金額為張數 × 收盤價估算";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigestSource {
    pub label: String,
    /// Amounts are estimated from lots rather than reported.
    pub estimated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigestReport {
    pub title: String,
    /// Lookback window in trading days.
    pub day: u32,
    pub sources: Vec<DigestSource>,
    /// Shared report date, `None` when any page is not refreshed yet.
    pub date: Option<NaiveDate>,
    pub results: Vec<OverlapResult>,
}

impl DigestReport {
    pub fn is_stale(&self) -> bool {
        self.date.is_none()
    }

    /// Renders the digest. Blocks are separated by blank lines so the
    /// chunker can split between codes.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "📊 {}", self.title);
        let _ = writeln!(
            out,
            "{}日重疊清單（{}家來源，共{}檔）",
            self.day,
            self.sources.len(),
            self.results.len()
        );
        let _ = writeln!(out, "來源：{}", self.source_line());
        let _ = write!(
            out,
            "日期：{}",
            self.date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| STALE_NOTICE.to_string())
        );

        if self.is_stale() {
            let _ = write!(out, "\n\n⚠️ {}，請稍後再查詢", STALE_NOTICE);
        } else if self.results.is_empty() {
            let _ = write!(out, "\n\n{}", NO_OVERLAP_NOTICE);
        }

        for (i, result) in self.results.iter().enumerate() {
            out.push_str("\n\n");
            out.push_str(&render_block(i + 1, result, &self.sources));
        }

        if !self.results.is_empty() && self.sources.iter().any(|s| s.estimated) {
            let _ = write!(out, "\n\n{}", ESTIMATE_FOOTNOTE);
        }
        out
    }

    fn source_line(&self) -> String {
        self.sources
            .iter()
            .map(|s| {
                if s.estimated {
                    format!("{}*", s.label)
                } else {
                    s.label.clone()
                }
            })
            .collect::<Vec<_>>()
            .join("、")
    }
}

fn render_block(position: usize, result: &OverlapResult, sources: &[DigestSource]) -> String {
    let mut block = format!("{}. {} {}", position, result.code, result.name);
    for (i, entry) in result.per_source.iter().enumerate() {
        let marker = if sources.get(i).is_some_and(|s| s.estimated) {
            "*"
        } else {
            ""
        };
        let _ = write!(
            block,
            "\n   {}{}：買 {} / 賣 {} / 差 {}",
            entry.source_label,
            marker,
            fmt_amount(entry.buy_amt),
            fmt_amount(entry.sell_amt),
            fmt_amount(entry.diff)
        );
    }
    let _ = write!(
        block,
        "\n   合計：買 {} / 賣 {} / 差 {}",
        fmt_amount(result.sum_buy_amt),
        fmt_amount(result.sum_sell_amt),
        fmt_amount(result.sum_diff)
    );
    block
}

/// Rounds to an integer and inserts thousands separators.
pub fn fmt_amount(value: f64) -> String {
    let rounded = value.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlap::SourceEntry;

    fn entry(label: &str, buy: f64, sell: f64) -> SourceEntry {
        SourceEntry {
            source_label: label.into(),
            buy_amt: buy,
            sell_amt: sell,
            diff: buy - sell,
        }
    }

    fn report(date: Option<NaiveDate>, results: Vec<OverlapResult>) -> DigestReport {
        DigestReport {
            title: "大摩 + 投信".into(),
            day: 5,
            sources: vec![
                DigestSource { label: "大摩".into(), estimated: false },
                DigestSource { label: "投信上市".into(), estimated: true },
            ],
            date,
            results,
        }
    }

    fn tsmc() -> OverlapResult {
        OverlapResult {
            code: "2330".into(),
            name: "台積電".into(),
            per_source: vec![entry("大摩", 1_234_567.0, 1_000.0), entry("投信上市", 500.0, 0.0)],
            sum_buy_amt: 1_235_067.0,
            sum_sell_amt: 1_000.0,
            sum_diff: 1_234_067.0,
        }
    }

    #[test]
    fn amounts_are_grouped() {
        assert_eq!(fmt_amount(0.0), "0");
        assert_eq!(fmt_amount(999.0), "999");
        assert_eq!(fmt_amount(1000.0), "1,000");
        assert_eq!(fmt_amount(1_234_567.4), "1,234,567");
        assert_eq!(fmt_amount(-45_000.0), "-45,000");
        assert_eq!(fmt_amount(-0.2), "0");
    }

    #[test]
    fn renders_header_and_blocks() {
        let text = report(NaiveDate::from_ymd_opt(2025, 8, 26), vec![tsmc()]).render();
        assert!(text.starts_with("📊 大摩 + 投信\n5日重疊清單（2家來源，共1檔）\n來源：大摩、投信上市*\n日期：2025-08-26"));
        assert!(text.contains("\n\n1. 2330 台積電\n   大摩：買 1,234,567 / 賣 1,000 / 差 1,233,567"));
        assert!(text.contains("   投信上市*：買 500 / 賣 0 / 差 500"));
        assert!(text.contains("   合計：買 1,235,067 / 賣 1,000 / 差 1,234,067"));
        assert!(text.ends_with(ESTIMATE_FOOTNOTE));
    }

    #[test]
    fn stale_digest_differs_from_empty_overlap() {
        let stale = report(None, vec![tsmc()]);
        assert!(stale.is_stale());
        let stale_text = stale.render();
        assert!(stale_text.contains(STALE_NOTICE));
        assert!(stale_text.contains("\n\n1. 2330 台積電"));
        assert!(stale_text.find(STALE_NOTICE) < stale_text.find("1. 2330"));
        assert!(!stale_text.contains(NO_OVERLAP_NOTICE));

        let empty_text = report(NaiveDate::from_ymd_opt(2025, 8, 26), Vec::new()).render();
        assert!(empty_text.contains(NO_OVERLAP_NOTICE));
        assert!(!empty_text.contains(STALE_NOTICE));
    }

    #[test]
    fn stale_digest_without_results_has_only_the_notice() {
        let text = report(None, Vec::new()).render();
        assert!(text.ends_with("請稍後再查詢"));
        assert!(!text.contains(NO_OVERLAP_NOTICE));
    }
}
