use crate::errors::ToolError;
use crate::services::upstream::UpstreamRequest;
use reqwest::Method;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
}

impl HttpMethod {
    pub fn to_reqwest(self) -> Method {
        match self {
            HttpMethod::Get => Method::GET,
        }
    }
}

/// A tool argument forwarded as a query parameter of the same name.
#[derive(Debug, Clone, Copy)]
pub struct QueryArg {
    pub name: &'static str,
    pub required: bool,
    pub default: Option<&'static str>,
}

const fn required(name: &'static str) -> QueryArg {
    QueryArg {
        name,
        required: true,
        default: None,
    }
}

const fn defaulted(name: &'static str, default: &'static str) -> QueryArg {
    QueryArg {
        name,
        required: false,
        default: Some(default),
    }
}

/// Static description of one exposed tool and the upstream call behind it.
/// The argument schema lives next to the description in `tool_catalog.json`.
#[derive(Debug, Clone, Copy)]
pub struct OperationDescriptor {
    pub name: &'static str,
    pub method: HttpMethod,
    pub path: &'static str,
    pub query: &'static [QueryArg],
}

const fn get(name: &'static str, path: &'static str, query: &'static [QueryArg]) -> OperationDescriptor {
    OperationDescriptor {
        name,
        method: HttpMethod::Get,
        path,
        query,
    }
}

pub static OPERATIONS: &[OperationDescriptor] = &[
    get("get_stock_details", "/stock", &[required("name")]),
    get(
        "get_historical_data",
        "/historical_data",
        &[
            required("stock_name"),
            required("period"),
            defaulted("filter", "price"),
        ],
    ),
    get("get_trending_stocks", "/trending", &[]),
    get("get_market_news", "/news", &[]),
    get("get_nse_most_active", "/NSE_most_active", &[]),
    get("get_bse_most_active", "/BSE_most_active", &[]),
    get("get_price_shockers", "/price_shockers", &[]),
    get("get_52_week_high_low", "/fetch_52_week_high_low_data", &[]),
    get("get_ipo_data", "/ipo", &[]),
    get(
        "get_corporate_actions",
        "/corporate_actions",
        &[required("stock_name")],
    ),
    get(
        "get_recent_announcements",
        "/recent_announcements",
        &[required("stock_name")],
    ),
    get(
        "get_financial_statement",
        "/statement",
        &[required("stock_name"), required("stats")],
    ),
    get(
        "get_stock_target_price",
        "/stock_target_price",
        &[required("stock_id")],
    ),
    get("search_industry", "/industry_search", &[required("query")]),
    get("get_commodities", "/commodities", &[]),
];

pub fn operation_by_name(name: &str) -> Option<&'static OperationDescriptor> {
    OPERATIONS.iter().find(|op| op.name == name)
}

impl OperationDescriptor {
    /// Maps validated tool arguments onto the upstream call. Arguments that are
    /// not declared for the operation are ignored.
    pub fn build_request(&self, args: &Value) -> Result<UpstreamRequest, ToolError> {
        let mut request = UpstreamRequest {
            method: self.method.to_reqwest(),
            path: self.path.to_string(),
            query: Vec::with_capacity(self.query.len()),
        };
        for arg in self.query {
            // Present values go out verbatim, empty strings included; the
            // default only fills an absent key.
            let supplied = args.get(arg.name).and_then(Value::as_str);
            match (supplied, arg.default) {
                (Some(value), _) => request = request.with_query(arg.name, value),
                (None, Some(default)) => request = request.with_query(arg.name, default),
                (None, None) if arg.required => {
                    return Err(ToolError::invalid_params(format!(
                        "{}: missing required field '{}'",
                        self.name, arg.name
                    )));
                }
                (None, None) => {}
            }
        }
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn historical_data_defaults_filter_to_price() {
        let op = operation_by_name("get_historical_data").unwrap();
        let request = op
            .build_request(&json!({"stock_name": "Infosys", "period": "1yr"}))
            .unwrap();
        assert_eq!(request.path, "/historical_data");
        assert_eq!(
            request.query,
            vec![
                ("stock_name".to_string(), "Infosys".to_string()),
                ("period".to_string(), "1yr".to_string()),
                ("filter".to_string(), "price".to_string()),
            ]
        );
    }

    #[test]
    fn explicit_filter_wins_over_default() {
        let op = operation_by_name("get_historical_data").unwrap();
        let request = op
            .build_request(&json!({"stock_name": "TCS", "period": "max", "filter": "pe"}))
            .unwrap();
        assert_eq!(request.query[2].1, "pe");
    }

    #[test]
    fn no_argument_operations_send_no_query() {
        let op = operation_by_name("get_52_week_high_low").unwrap();
        let request = op.build_request(&json!({"ignored": "x"})).unwrap();
        assert_eq!(request.path, "/fetch_52_week_high_low_data");
        assert!(request.query.is_empty());
        assert_eq!(request.method, Method::GET);
    }

    #[test]
    fn missing_required_argument_is_rejected() {
        let op = operation_by_name("get_financial_statement").unwrap();
        let err = op
            .build_request(&json!({"stock_name": "TCS"}))
            .unwrap_err();
        assert!(err.message.contains("'stats'"));
    }

    #[test]
    fn empty_strings_are_forwarded_verbatim() {
        let op = operation_by_name("search_industry").unwrap();
        let request = op.build_request(&json!({"query": ""})).unwrap();
        assert_eq!(request.query, vec![("query".to_string(), String::new())]);

        let op = operation_by_name("get_historical_data").unwrap();
        let request = op
            .build_request(&json!({"stock_name": "TCS", "period": "1yr", "filter": ""}))
            .unwrap();
        assert_eq!(request.query[2], ("filter".to_string(), String::new()));
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<&str> = OPERATIONS.iter().map(|op| op.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), OPERATIONS.len());
    }
}
