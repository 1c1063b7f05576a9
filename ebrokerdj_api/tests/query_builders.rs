use ebrokerdj_api::{BrokerFlowQuery, Market, Query, Side, TrustRankQuery};
use url::Url;

fn base_url() -> Url {
    Url::parse("https://example.com/z/zg/zgb/zgb0.djhtm").unwrap()
}

#[test]
fn trust_rank_query_defaults() {
    let query = TrustRankQuery::default();
    assert_eq!(query.path(), "/z/zg/zg_DD_0_1.djhtm");
    assert_eq!(query.day(), 1);
}

#[test]
fn trust_rank_query_otc_five_day() {
    let query = TrustRankQuery::default()
        .with_market(Market::Otc)
        .with_day(5);
    assert_eq!(query.path(), "/z/zg/zg_DD_1_5.djhtm");
    assert_eq!(query.day(), 5);
}

#[test]
fn trust_rank_query_adds_no_parameters() {
    let url = TrustRankQuery::default().add_to_url(&base_url());
    assert_eq!(url.query(), None);
}

#[test]
fn broker_flow_query_full() {
    let url = BrokerFlowQuery::new("9600", "9661")
        .with_side(Side::Buy)
        .with_day(5)
        .add_to_url(&base_url());
    assert_eq!(url.query(), Some("a=9600&b=9661&c=B&d=5"));
}

#[test]
fn broker_flow_query_minimal() {
    let query = BrokerFlowQuery::new("1650", "1650");
    let url = query.add_to_url(&base_url());
    assert_eq!(url.query(), Some("a=1650&b=1650"));
    assert_eq!(query.day(), 1);
}

#[test]
fn market_and_side_parse() {
    assert_eq!("listed".parse::<Market>().unwrap(), Market::Listed);
    assert_eq!("OTC".parse::<Market>().unwrap(), Market::Otc);
    assert!("nasdaq".parse::<Market>().is_err());

    assert_eq!("B".parse::<Side>().unwrap(), Side::Buy);
    assert_eq!("sell".parse::<Side>().unwrap(), Side::Sell);
    assert!("X".parse::<Side>().is_err());
    assert_eq!(Side::Sell.to_string(), "S");
    assert_eq!(Market::Otc.to_string(), "otc");
}
