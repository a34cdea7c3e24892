//! Response shaping: an operation-specific reduction followed by a size cap.
//!
//! Upstream payloads have no fixed schema, so every field read here is
//! defensive. Field projection uses ordered alias lists: the first alias that
//! is present and non-null wins, and a field with no present alias is left
//! out of the output rather than set to null.

use crate::constants::shaping::{
    CHARS_PER_TOKEN, DETAIL_INFO_MAX_CHARS, ELLIPSIS, LIST_MAX_ITEMS, NEWS_DESCRIPTION_MAX_CHARS,
    NEWS_MAX_ITEMS, SERIES_TAIL_POINTS, STATEMENT_MAX_ROWS, SUMMARY_MAX_KEYS,
    SUMMARY_SAMPLE_ITEMS,
};
use crate::utils::text::truncate_chars;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextLimit {
    None,
    Chars(usize),
    CharsWithEllipsis(usize),
}

/// One output field and the upstream names it may be read from, in priority
/// order.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub output: &'static str,
    pub aliases: &'static [&'static str],
    pub limit: TextLimit,
}

const fn field(output: &'static str, aliases: &'static [&'static str]) -> FieldRule {
    FieldRule {
        output,
        aliases,
        limit: TextLimit::None,
    }
}

const fn text(output: &'static str, aliases: &'static [&'static str], limit: TextLimit) -> FieldRule {
    FieldRule {
        output,
        aliases,
        limit,
    }
}

pub const DETAIL_FIELDS: &[FieldRule] = &[
    field("name", &["name"]),
    field("symbol", &["symbol"]),
    field("price", &["price", "currentPrice", "ltp"]),
    field("change", &["change", "priceChange"]),
    field("changePercent", &["changePercent", "pChange"]),
    field("marketCap", &["marketCap"]),
    field("pe", &["pe", "peRatio"]),
    field("pb", &["pb", "pbRatio"]),
    field("dividend", &["dividend", "dividendYield"]),
    field("52WeekHigh", &["52WeekHigh", "high52Week"]),
    field("52WeekLow", &["52WeekLow", "low52Week"]),
    field("volume", &["volume"]),
    field("sector", &["sector", "industry"]),
    field("exchange", &["exchange"]),
    field("isin", &["isin"]),
    text(
        "info",
        &["info"],
        TextLimit::CharsWithEllipsis(DETAIL_INFO_MAX_CHARS),
    ),
];

pub const NEWS_FIELDS: &[FieldRule] = &[
    field("title", &["title", "headline"]),
    field("date", &["date", "publishedDate"]),
    text(
        "description",
        &["description"],
        TextLimit::Chars(NEWS_DESCRIPTION_MAX_CHARS),
    ),
    field("link", &["link", "url"]),
];

pub const LIST_FIELDS: &[FieldRule] = &[
    field("name", &["name"]),
    field("symbol", &["symbol"]),
    field("price", &["price", "currentPrice", "ltp"]),
    field("change", &["change", "priceChange"]),
    field("changePercent", &["changePercent", "pChange"]),
    field("volume", &["volume"]),
    field("value", &["value", "turnover"]),
];

/// Operation classes with a dedicated reduction. Anything not listed here
/// still gets the generic list reduction when its payload is an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeRule {
    EntityDetail,
    TimeSeries,
    Statement,
    NewsFeed,
    Default,
}

impl ShapeRule {
    pub fn for_operation(operation: &str) -> Self {
        match operation {
            "get_stock_details" => ShapeRule::EntityDetail,
            "get_historical_data" => ShapeRule::TimeSeries,
            "get_financial_statement" => ShapeRule::Statement,
            "get_recent_announcements" | "get_market_news" => ShapeRule::NewsFeed,
            _ => ShapeRule::Default,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Shaper {
    max_output_tokens: usize,
}

impl Shaper {
    pub fn new(max_output_tokens: usize) -> Self {
        Self { max_output_tokens }
    }

    pub fn shape(&self, payload: Value, operation: &str) -> Value {
        let reduced = reduce(payload, ShapeRule::for_operation(operation));
        self.cap(reduced)
    }

    /// Replaces the payload with a summary when its pretty-printed form is
    /// estimated over the token ceiling.
    pub fn cap(&self, payload: Value) -> Value {
        let tokens = estimate_tokens(&render(&payload));
        if tokens <= self.max_output_tokens {
            return payload;
        }

        let summary = summarize(&payload, tokens, true);
        if estimate_tokens(&render(&summary)) <= self.max_output_tokens {
            return summary;
        }
        summarize(&payload, tokens, false)
    }
}

pub fn reduce(payload: Value, rule: ShapeRule) -> Value {
    match (rule, payload) {
        (ShapeRule::EntityDetail, Value::Object(map)) => Value::Object(project(&map, DETAIL_FIELDS)),
        (ShapeRule::TimeSeries, Value::Object(map)) if series_len(&map).is_some() => {
            Value::Object(keep_series_tail(map))
        }
        (ShapeRule::Statement, Value::Object(map)) => Value::Object(trim_statement(map)),
        // Statement rows have their own columns; the list projection would empty them.
        (ShapeRule::Statement, rows @ Value::Array(_)) => rows,
        (ShapeRule::NewsFeed, Value::Array(items)) => {
            Value::Array(project_items(items, NEWS_MAX_ITEMS, NEWS_FIELDS))
        }
        (_, Value::Array(items)) => Value::Array(project_items(items, LIST_MAX_ITEMS, LIST_FIELDS)),
        (_, other) => other,
    }
}

pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Pretty JSON, the exact text the host receives.
pub fn render(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// First alias that is present and not null.
pub fn pick<'a>(map: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|alias| map.get(*alias))
        .find(|value| !value.is_null())
}

pub fn project(map: &Map<String, Value>, rules: &[FieldRule]) -> Map<String, Value> {
    let mut out = Map::new();
    for rule in rules {
        let Some(value) = pick(map, rule.aliases) else {
            continue;
        };
        out.insert(rule.output.to_string(), apply_limit(value, rule.limit));
    }
    out
}

fn apply_limit(value: &Value, limit: TextLimit) -> Value {
    let (max_chars, ellipsis) = match limit {
        TextLimit::None => return value.clone(),
        TextLimit::Chars(max) => (max, false),
        TextLimit::CharsWithEllipsis(max) => (max, true),
    };
    let raw = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if raw.chars().count() <= max_chars {
        return Value::String(raw);
    }
    let mut cut = truncate_chars(&raw, max_chars);
    if ellipsis {
        cut.push_str(ELLIPSIS);
    }
    Value::String(cut)
}

fn project_items(items: Vec<Value>, max_items: usize, rules: &[FieldRule]) -> Vec<Value> {
    items
        .into_iter()
        .take(max_items)
        .map(|item| match item {
            Value::Object(map) => Value::Object(project(&map, rules)),
            other => other,
        })
        .collect()
}

fn series_len(map: &Map<String, Value>) -> Option<usize> {
    map.get("data").and_then(Value::as_array).map(Vec::len)
}

/// Only trims when the series is longer than the tail, so shaped output
/// passes through a second time untouched.
fn keep_series_tail(mut map: Map<String, Value>) -> Map<String, Value> {
    let original = series_len(&map).unwrap_or(0);
    if original <= SERIES_TAIL_POINTS {
        return map;
    }
    if let Some(Value::Array(points)) = map.get_mut("data") {
        points.drain(..original - SERIES_TAIL_POINTS);
    }
    map.insert(
        "note".to_string(),
        Value::String(format!(
            "Showing last {} data points. Original count: {}",
            SERIES_TAIL_POINTS, original
        )),
    );
    map
}

fn trim_statement(map: Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    let mut notes = Vec::new();
    for (key, value) in map {
        match value {
            Value::Array(mut rows) if rows.len() > STATEMENT_MAX_ROWS => {
                notes.push((
                    format!("{}_note", key),
                    format!(
                        "Showing first {} items. Total: {}",
                        STATEMENT_MAX_ROWS,
                        rows.len()
                    ),
                ));
                rows.truncate(STATEMENT_MAX_ROWS);
                out.insert(key, Value::Array(rows));
            }
            other => {
                out.insert(key, other);
            }
        }
    }
    for (key, note) in notes {
        out.insert(key, Value::String(note));
    }
    out
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Array(_) => "array",
        Value::Object(_) => "object",
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Null => "null",
    }
}

fn summarize(payload: &Value, tokens: usize, with_sample: bool) -> Value {
    let mut out = Map::new();
    out.insert(
        "summary".to_string(),
        Value::String("Response too large. Showing summary.".to_string()),
    );
    out.insert(
        "dataType".to_string(),
        Value::String(kind_name(payload).to_string()),
    );

    match payload {
        Value::Array(items) => {
            out.insert("itemCount".to_string(), Value::from(items.len()));
            if with_sample {
                out.insert(
                    "sample".to_string(),
                    Value::Array(items.iter().take(SUMMARY_SAMPLE_ITEMS).cloned().collect()),
                );
            }
        }
        Value::Object(map) => {
            let keys: Vec<Value> = map
                .keys()
                .take(SUMMARY_MAX_KEYS)
                .map(|k| Value::String(truncate_chars(k, 100)))
                .collect();
            out.insert("keys".to_string(), Value::Array(keys));
            out.insert("keyCount".to_string(), Value::from(map.len()));
        }
        _ => {}
    }

    let mut message = format!(
        "Original response estimated at {} tokens. Use more specific queries or filters.",
        tokens
    );
    if !with_sample && payload.is_array() {
        message.push_str(" Sample omitted because it was too large.");
    }
    out.insert("message".to_string(), Value::String(message));
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shaper() -> Shaper {
        Shaper::new(20_000)
    }

    #[test]
    fn detail_prefers_first_alias() {
        let shaped = shaper().shape(
            json!({"currentPrice": 100, "ltp": 99, "name": "Tata Steel"}),
            "get_stock_details",
        );
        assert_eq!(shaped["price"], 100);
        assert_eq!(shaped["name"], "Tata Steel");
    }

    #[test]
    fn detail_omits_absent_fields_and_drops_unknown_ones() {
        let shaped = shaper().shape(
            json!({"symbol": "TATASTEEL", "peRatio": null, "pbRatio": 2.1, "noise": [1, 2, 3]}),
            "get_stock_details",
        );
        let map = shaped.as_object().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(shaped["pb"], 2.1);
        assert!(!map.contains_key("pe"));
        assert!(!map.contains_key("noise"));
    }

    #[test]
    fn detail_keeps_zero_values() {
        let shaped = shaper().shape(json!({"change": 0, "priceChange": 5}), "get_stock_details");
        assert_eq!(shaped["change"], 0);
    }

    #[test]
    fn detail_truncates_info_with_ellipsis() {
        let long = "x".repeat(900);
        let shaped = shaper().shape(json!({"info": long}), "get_stock_details");
        let info = shaped["info"].as_str().unwrap();
        assert_eq!(info.chars().count(), 503);
        assert!(info.ends_with("..."));

        let short = shaper().shape(json!({"info": "Steel maker"}), "get_stock_details");
        assert_eq!(short["info"], "Steel maker");
    }

    #[test]
    fn time_series_keeps_last_hundred_points() {
        let points: Vec<Value> = (0..240).map(|i| json!([format!("d{}", i), i])).collect();
        let shaped = shaper().shape(
            json!({"stock": "TCS", "data": points}),
            "get_historical_data",
        );
        let data = shaped["data"].as_array().unwrap();
        assert_eq!(data.len(), 100);
        assert_eq!(data[0][1], 140);
        assert_eq!(data[99][1], 239);
        assert_eq!(shaped["stock"], "TCS");
        assert!(shaped["note"]
            .as_str()
            .unwrap()
            .contains("Original count: 240"));
    }

    #[test]
    fn series_of_exactly_the_tail_length_gets_no_note() {
        let points: Vec<Value> = (0..100).map(Value::from).collect();
        let payload = json!({"data": points});
        let shaped = shaper().shape(payload.clone(), "get_historical_data");
        assert_eq!(shaped, payload);
        assert!(shaped.get("note").is_none());
    }

    #[test]
    fn short_time_series_is_untouched() {
        let payload = json!({"data": [1, 2, 3]});
        assert_eq!(shaper().shape(payload.clone(), "get_historical_data"), payload);
    }

    #[test]
    fn statement_rows_delivered_as_array_keep_their_columns() {
        let rows: Vec<Value> = (0..12)
            .map(|i| json!({"year": 2010 + i, "revenue": 100 + i}))
            .collect();
        let shaped = shaper().shape(Value::Array(rows.clone()), "get_financial_statement");
        assert_eq!(shaped, Value::Array(rows));
        assert_eq!(shaped[11]["revenue"], 111);
    }

    #[test]
    fn statement_trims_long_tables_and_notes_total() {
        let rows: Vec<Value> = (0..25).map(|i| json!({"year": 2000 + i})).collect();
        let shaped = shaper().shape(
            json!({"income": rows, "currency": "INR", "short": [1, 2]}),
            "get_financial_statement",
        );
        assert_eq!(shaped["income"].as_array().unwrap().len(), 10);
        assert_eq!(shaped["income_note"], "Showing first 10 items. Total: 25");
        assert_eq!(shaped["short"].as_array().unwrap().len(), 2);
        assert!(shaped.get("short_note").is_none());
        assert_eq!(shaped["currency"], "INR");
    }

    #[test]
    fn news_keeps_fifteen_projected_items() {
        let items: Vec<Value> = (0..30)
            .map(|i| {
                json!({
                    "headline": format!("h{}", i),
                    "publishedDate": "2024-01-01",
                    "description": "d".repeat(400),
                    "url": "https://example.com",
                    "image": "ignored"
                })
            })
            .collect();
        let shaped = shaper().shape(Value::Array(items), "get_market_news");
        let arr = shaped.as_array().unwrap();
        assert_eq!(arr.len(), 15);
        assert_eq!(arr[0]["title"], "h0");
        assert_eq!(arr[0]["date"], "2024-01-01");
        assert_eq!(arr[0]["link"], "https://example.com");
        assert_eq!(arr[0]["description"].as_str().unwrap().len(), 300);
        assert!(arr[0].get("image").is_none());
    }

    #[test]
    fn generic_list_keeps_twenty_projected_items() {
        let items: Vec<Value> = (0..50)
            .map(|i| json!({"ticker_id": i, "name": format!("s{}", i), "ltp": i, "turnover": 10}))
            .collect();
        let shaped = shaper().shape(Value::Array(items), "get_nse_most_active");
        let arr = shaped.as_array().unwrap();
        assert_eq!(arr.len(), 20);
        assert_eq!(arr[3], json!({"name": "s3", "price": 3, "value": 10}));
    }

    #[test]
    fn generic_list_passes_scalars_through() {
        let shaped = shaper().shape(json!(["gold", 1]), "get_commodities");
        assert_eq!(shaped, json!(["gold", 1]));
    }

    #[test]
    fn objects_without_a_rule_pass_through() {
        let payload = json!({"trending_stocks": {"top_gainers": [1, 2, 3]}});
        assert_eq!(shaper().shape(payload.clone(), "get_trending_stocks"), payload);
    }

    #[test]
    fn reshaping_shaped_output_is_stable() {
        let cases = vec![
            (json!({"currentPrice": 1, "info": "y".repeat(800)}), "get_stock_details"),
            (json!({"data": (0..300).collect::<Vec<i32>>()}), "get_historical_data"),
            (json!({"rows": (0..40).collect::<Vec<i32>>()}), "get_financial_statement"),
            (
                Value::Array((0..20).map(|_| json!({"headline": "h", "description": "z".repeat(500)})).collect()),
                "get_recent_announcements",
            ),
            (
                Value::Array((0..30).map(|i| json!({"symbol": i, "pChange": 1.5})).collect()),
                "get_price_shockers",
            ),
        ];
        for (payload, operation) in cases {
            let once = shaper().shape(payload, operation);
            let twice = shaper().shape(once.clone(), operation);
            assert_eq!(once, twice, "{} is not stable", operation);
        }
    }

    #[test]
    fn oversized_array_becomes_summary() {
        let items: Vec<Value> = (0..200)
            .map(|i| json!({"name": format!("stock-number-{}-with-a-long-name", i)}))
            .collect();
        let shaped = Shaper::new(200).shape(Value::Array(items), "get_ipo_data");
        assert_eq!(shaped["dataType"], "array");
        assert_eq!(shaped["itemCount"], 20);
        assert_eq!(shaped["sample"].as_array().unwrap().len(), 5);
        assert!(shaped["message"].as_str().unwrap().contains("tokens"));
    }

    #[test]
    fn oversized_object_summary_lists_keys() {
        let mut map = Map::new();
        for i in 0..80 {
            map.insert(format!("field_{}", i), Value::String("v".repeat(50)));
        }
        let shaped = Shaper::new(400).shape(Value::Object(map), "get_trending_stocks");
        assert_eq!(shaped["dataType"], "object");
        assert_eq!(shaped["keys"].as_array().unwrap().len(), 50);
        assert_eq!(shaped["keyCount"], 80);
        assert!(shaped.get("field_0").is_none());
    }

    #[test]
    fn summary_drops_sample_when_sample_alone_is_too_big() {
        let items: Vec<Value> = (0..10).map(|_| Value::String("q".repeat(2_000))).collect();
        let shaped = Shaper::new(300).shape(Value::Array(items), "get_commodities");
        assert!(shaped.get("sample").is_none());
        assert_eq!(shaped["itemCount"], 10);
    }

    #[test]
    fn token_estimate_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }
}
