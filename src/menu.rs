use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::MenuApiConfig;
use crate::http::HttpFetcher;

pub const API_FAILURE_TEXT: &str = "Failed to fetch data from Yelp API!";
const MENU_HEADING: &str = "*Menu List:*\n\n";
const NO_NAME: &str = "No Name";
const PLACEHOLDER: &str = "-";
const ERROR_BODY_PREVIEW: usize = 200;

/// Environment lookup used to resolve the API key on each request.
pub type EnvLookup = fn(&str) -> Option<String>;

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// One entry of the `menus` array returned by the API.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    pub food_name: String,
    pub category: String,
    pub details: String,
    pub price: String,
}

impl MenuItem {
    /// Read an item, substituting placeholders for absent fields.
    pub fn from_value(value: &Value) -> Self {
        let field = |key: &str| value.get(key).and_then(scalar_text);
        Self {
            food_name: field("Food Name").unwrap_or_else(|| NO_NAME.to_string()),
            category: field("Category").unwrap_or_else(|| PLACEHOLDER.to_string()),
            details: field("Details").unwrap_or_else(|| PLACEHOLDER.to_string()),
            price: field("Price").unwrap_or_else(|| PLACEHOLDER.to_string()),
        }
    }

    fn render(&self, out: &mut String) {
        out.push_str(&format!("*{}*\n", escape_markdown(&self.food_name)));
        out.push_str(&format!("_Category_: {}\n", self.category));
        out.push_str(&format!("_Details_: {}\n", self.details));
        out.push_str(&format!("_Price_: {}\n\n", self.price));
    }
}

fn body_preview(body: &str) -> String {
    body.chars().take(ERROR_BODY_PREVIEW).collect()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Escape the Telegram Markdown control characters `_` and `*`.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '_' || c == '*' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub fn not_found_text(business_id: &str) -> String {
    format!("No menu found for ID: `{}`.", business_id)
}

/// Turn a menu API response body into reply text.
pub fn format_menu(business_id: &str, body: &str) -> String {
    let data: Value = serde_json::from_str(body).unwrap_or(Value::Null);

    let menus = match data.get("menus").and_then(Value::as_array) {
        Some(menus) if !menus.is_empty() => menus,
        _ => return not_found_text(business_id),
    };

    let mut message = String::from(MENU_HEADING);
    for item in menus {
        MenuItem::from_value(item).render(&mut message);
    }
    message
}

/// Looks up a business menu and renders it for chat.
pub struct MenuClient {
    http: Arc<dyn HttpFetcher>,
    config: MenuApiConfig,
    env: EnvLookup,
}

impl MenuClient {
    pub fn new(http: Arc<dyn HttpFetcher>, config: MenuApiConfig) -> Self {
        Self {
            http,
            config,
            env: process_env,
        }
    }

    #[cfg(test)]
    pub fn with_env(mut self, env: EnvLookup) -> Self {
        self.env = env;
        self
    }

    /// Fetch the menu for `business_id`. Never fails: transport and HTTP
    /// errors come back as the API-failure text.
    pub async fn fetch_menu_text(&self, business_id: &str) -> String {
        let url = format!("{}/get_menus", self.config.base_url.trim_end_matches('/'));
        let headers = [
            ("X-RapidAPI-Key", self.config.resolve_api_key_with(self.env)),
            ("X-RapidAPI-Host", self.config.host.clone()),
        ];
        let params = [("business_id", business_id)];

        let response = match self.http.get(&url, &headers, &params).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Menu lookup for {} failed: {:#}", business_id, e);
                return API_FAILURE_TEXT.to_string();
            }
        };

        if !response.is_success() {
            warn!(
                "Menu API returned status {} for {}: {}",
                response.status,
                business_id,
                body_preview(&response.body)
            );
            return API_FAILURE_TEXT.to_string();
        }

        debug!("Menu API response for {}: {} bytes", business_id, response.body.len());
        format_menu(business_id, &response.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ReqwestFetcher;
    use mockito::Matcher;
    use serde_json::json;
    use std::time::Duration;

    fn client_for(base_url: String) -> MenuClient {
        let http = Arc::new(ReqwestFetcher::new(Duration::from_secs(5)).unwrap());
        MenuClient::new(
            http,
            MenuApiConfig {
                base_url,
                host: "yelp-business-api.p.rapidapi.com".to_string(),
                api_key: Some("test-key".to_string()),
                timeout_secs: 5,
            },
        )
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("Nasi_Goreng"), r"Nasi\_Goreng");
        assert_eq!(escape_markdown("*hot*_dog_"), r"\*hot\*\_dog\_");
        assert_eq!(escape_markdown("plain"), "plain");
    }

    #[test]
    fn test_body_preview_is_capped() {
        assert_eq!(body_preview("short"), "short");
        let long = "é".repeat(ERROR_BODY_PREVIEW + 50);
        assert_eq!(body_preview(&long).chars().count(), ERROR_BODY_PREVIEW);
    }

    #[test]
    fn test_item_placeholders() {
        let item = MenuItem::from_value(&json!({}));
        assert_eq!(item.food_name, "No Name");
        assert_eq!(item.category, "-");
        assert_eq!(item.details, "-");
        assert_eq!(item.price, "-");

        let item = MenuItem::from_value(&json!("not an object"));
        assert_eq!(item.food_name, "No Name");
    }

    #[test]
    fn test_item_scalar_fields() {
        let item = MenuItem::from_value(&json!({
            "Food Name": "Sate",
            "Category": null,
            "Details": ["x"],
            "Price": 15000
        }));
        assert_eq!(item.food_name, "Sate");
        assert_eq!(item.category, "-");
        assert_eq!(item.details, "-");
        assert_eq!(item.price, "15000");
    }

    #[test]
    fn test_format_menu_block_layout() {
        let body = json!({"menus": [{
            "Food Name": "Nasi_Goreng",
            "Category": "Main",
            "Details": "Spicy",
            "Price": "20000"
        }]})
        .to_string();

        assert_eq!(
            format_menu("id1", &body),
            "*Menu List:*\n\n*Nasi\\_Goreng*\n_Category_: Main\n_Details_: Spicy\n_Price_: 20000\n\n"
        );
    }

    #[test]
    fn test_format_menu_keeps_api_order_and_duplicates() {
        let body = json!({"menus": [
            {"Food Name": "B"},
            {"Food Name": "A"},
            {"Food Name": "B"}
        ]})
        .to_string();

        let text = format_menu("id1", &body);
        let names: Vec<&str> = text
            .lines()
            .filter(|l| l.starts_with('*') && *l != "*Menu List:*")
            .collect();
        assert_eq!(names, vec!["*B*", "*A*", "*B*"]);
    }

    #[test]
    fn test_format_menu_not_found_cases() {
        for body in [
            r#"{"menus": []}"#,
            r#"{"menus": {"a": 1}}"#,
            r#"{"other": 1}"#,
            "not json",
            "",
        ] {
            assert_eq!(format_menu("X", body), "No menu found for ID: `X`.", "{body}");
        }
    }

    #[tokio::test]
    async fn test_fetch_menu_text_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/get_menus")
            .match_query(Matcher::UrlEncoded(
                "business_id".into(),
                "5uUs2b4bQdS3WS8z16LJKw".into(),
            ))
            .match_header("x-rapidapi-key", "test-key")
            .match_header("x-rapidapi-host", "yelp-business-api.p.rapidapi.com")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"menus":[{"Food Name":"Nasi_Goreng","Category":"Main","Details":"Spicy","Price":"20000"}]}"#,
            )
            .create_async()
            .await;

        let text = client_for(server.url())
            .fetch_menu_text("5uUs2b4bQdS3WS8z16LJKw")
            .await;

        mock.assert_async().await;
        assert!(text.starts_with("*Menu List:*"));
        assert!(text.contains(r"Nasi\_Goreng"));
        assert!(text.contains("Main"));
        assert!(text.contains("Spicy"));
        assert!(text.contains("20000"));
    }

    #[tokio::test]
    async fn test_fetch_menu_text_http_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/get_menus")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let text = client_for(server.url()).fetch_menu_text("abc").await;
        assert_eq!(text, API_FAILURE_TEXT);
    }

    #[tokio::test]
    async fn test_fetch_menu_text_empty_menus() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/get_menus")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"menus":[]}"#)
            .create_async()
            .await;

        let text = client_for(server.url()).fetch_menu_text("X").await;
        assert_eq!(text, "No menu found for ID: `X`.");
    }

    #[tokio::test]
    async fn test_fetch_menu_text_trailing_slash_base_url() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/get_menus")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"menus":[]}"#)
            .create_async()
            .await;

        client_for(format!("{}/", server.url()))
            .fetch_menu_text("X")
            .await;
        mock.assert_async().await;
    }
}
