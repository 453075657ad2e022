//! REST Collection Store
//!
//! Client for the hosted Postgres REST surface: table reads with
//! `column=eq.value` filters and RPC calls under `/rest/v1/rpc/`.
//! Backend rows use loosely named columns; `map_row` is the only place
//! that knows them.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::RestConfig;
use crate::domain::{BatchReply, Coin, CoinDisplay, CoinPage, DomainError, DomainResult, RankUpdate};
use super::traits::CollectionStore;

const COL_ID: &str = "id";
const COL_NAME: &str = "Coin Name";
const COL_FRONT: &str = "Front Image";
const COL_BACK: &str = "Back Image";
const COL_PUBLIC: &str = "Public Display";
const COL_NFT: &str = "Is NFT";
const COL_CREATED: &str = "created_at";

impl From<reqwest::Error> for DomainError {
    fn from(e: reqwest::Error) -> Self {
        DomainError::Internal(format!("http: {}", e))
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::InvalidInput(format!("json: {}", e))
    }
}

#[derive(Serialize)]
struct RankArg {
    id: u32,
    priority: u32,
}

#[derive(Serialize)]
struct BatchArgs {
    updates: Vec<RankArg>,
}

/// Collection store backed by the hosted REST API
#[derive(Debug, Clone)]
pub struct RestCollectionStore {
    client: Client,
    config: RestConfig,
}

impl RestCollectionStore {
    pub fn new(config: RestConfig) -> DomainResult<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.config.api_key.is_empty() {
            return request;
        }
        request
            .header("apikey", &self.config.api_key)
            .header(reqwest::header::AUTHORIZATION, format!("Bearer {}", self.config.api_key))
    }
}

#[async_trait]
impl CollectionStore for RestCollectionStore {
    async fn fetch_ordered_items(&self, owner_key: &str) -> DomainResult<CoinPage> {
        let request = self
            .client
            .get(self.url(&self.config.table))
            .query(&[
                ("select", "*".to_string()),
                (self.config.owner_column.as_str(), eq_filter(owner_key)),
                ("order", format!("{}.asc", self.config.rank_column)),
            ])
            .header("Prefer", "count=exact");

        let response = self.authorized(request).send().await?;
        let total_header = content_range_total(&response);
        let response = error_for_status(response).await?;

        let rows: Vec<Map<String, Value>> = response.json().await?;
        let mut coins = rows
            .iter()
            .map(|row| map_row(row, &self.config))
            .collect::<DomainResult<Vec<_>>>()?;
        // the server already orders, but rank ties would otherwise be unstable
        coins.sort_by_key(|c| (c.rank, c.id));

        let total = total_header.unwrap_or(coins.len() as u32);
        Ok(CoinPage { coins, total })
    }

    async fn batch_update_ranks(&self, updates: &[RankUpdate]) -> DomainResult<BatchReply> {
        let body = BatchArgs {
            updates: updates
                .iter()
                .map(|u| RankArg { id: u.id, priority: u.rank })
                .collect(),
        };

        let request = self
            .client
            .post(self.url(&format!("rpc/{}", self.config.batch_function)))
            .json(&body);
        let response = self.authorized(request).send().await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            // an error status is a reply, not a transport failure
            let reply = match BatchReply::parse(&text) {
                BatchReply::Rejected(msg) => msg,
                _ => format!("HTTP {}: {}", status.as_u16(), text.trim()),
            };
            return Ok(BatchReply::Rejected(reply));
        }
        Ok(BatchReply::parse(&text))
    }
}

async fn error_for_status(response: Response) -> DomainResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(match status.as_u16() {
        404 => DomainError::NotFound(body),
        400 | 422 => DomainError::InvalidInput(body),
        409 => DomainError::Conflict(body),
        code => DomainError::Internal(format!("HTTP {}: {}", code, body)),
    })
}

/// `eq."value"`, backslash-escaping quotes and backslashes.
/// Quoting keeps `,` `.` `(` `)` in an owner key literal.
fn eq_filter(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("eq.\"{}\"", escaped)
}

/// `Content-Range: 0-9/42` -> 42
fn content_range_total(response: &Response) -> Option<u32> {
    response
        .headers()
        .get("content-range")?
        .to_str()
        .ok()?
        .rsplit('/')
        .next()?
        .parse()
        .ok()
}

/// Map a backend row into a typed Coin
pub(crate) fn map_row(row: &Map<String, Value>, config: &RestConfig) -> DomainResult<Coin> {
    let id = int_field(row, COL_ID)?
        .ok_or_else(|| DomainError::InvalidInput(format!("row without '{}'", COL_ID)))?;
    let rank = int_field(row, &config.rank_column)?.unwrap_or(0);
    let owner_key = row
        .get(&config.owner_column)
        .and_then(Value::as_str)
        .ok_or_else(|| DomainError::InvalidInput(format!("coin {} without '{}'", id, config.owner_column)))?
        .to_string();

    Ok(Coin {
        id: u32::try_from(id).map_err(|_| DomainError::InvalidInput(format!("bad id {}", id)))?,
        rank: u32::try_from(rank).unwrap_or(0),
        owner_key,
        display: CoinDisplay {
            name: str_field(row, COL_NAME).unwrap_or_default(),
            front_image: str_field(row, COL_FRONT),
            back_image: str_field(row, COL_BACK),
            is_public: bool_field(row, COL_PUBLIC),
            is_nft: bool_field(row, COL_NFT),
        },
        created_at: row.get(COL_CREATED).and_then(Value::as_i64),
        updated_at: None,
    })
}

fn int_field(row: &Map<String, Value>, key: &str) -> DomainResult<Option<i64>> {
    match row.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| DomainError::InvalidInput(format!("'{}' is not an integer", key))),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| DomainError::InvalidInput(format!("'{}' is not an integer", key))),
        Some(_) => Err(DomainError::InvalidInput(format!("'{}' is not an integer", key))),
    }
}

fn str_field(row: &Map<String, Value>, key: &str) -> Option<String> {
    row.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn bool_field(row: &Map<String, Value>, key: &str) -> bool {
    match row.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0) != 0,
        Some(Value::String(s)) => matches!(s.to_ascii_lowercase().as_str(), "true" | "yes" | "1"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_eq_filter_quotes_reserved_characters() {
        assert_eq!(eq_filter("a@b.c"), r#"eq."a@b.c""#);
        assert_eq!(eq_filter("smith, j (navy)"), r#"eq."smith, j (navy)""#);
        assert_eq!(eq_filter(r#"say "hi" \o/"#), r#"eq."say \"hi\" \\o/""#);
    }

    #[test]
    fn test_map_row_with_spaced_columns() {
        let config = RestConfig::default();
        let coin = map_row(
            &row(json!({
                "id": 12,
                "Owner Email": "a@b.c",
                "Priority": 3,
                "Coin Name": "Unit coin",
                "Front Image": "https://img/front.png",
                "Back Image": "",
                "Public Display": true,
                "Is NFT": "false"
            })),
            &config,
        )
        .expect("map");

        assert_eq!(coin.id, 12);
        assert_eq!(coin.rank, 3);
        assert_eq!(coin.owner_key, "a@b.c");
        assert_eq!(coin.display.name, "Unit coin");
        assert_eq!(coin.display.front_image.as_deref(), Some("https://img/front.png"));
        assert_eq!(coin.display.back_image, None);
        assert!(coin.display.is_public);
        assert!(!coin.display.is_nft);
    }

    #[test]
    fn test_map_row_rank_as_string_and_missing() {
        let config = RestConfig::default();
        let coin = map_row(&row(json!({"id": "4", "Owner Email": "o", "Priority": " 9 "})), &config).unwrap();
        assert_eq!(coin.id, 4);
        assert_eq!(coin.rank, 9);

        let unranked = map_row(&row(json!({"id": 5, "Owner Email": "o", "Priority": null})), &config).unwrap();
        assert_eq!(unranked.rank, 0);
    }

    #[test]
    fn test_map_row_rejects_missing_id_or_owner() {
        let config = RestConfig::default();
        assert!(map_row(&row(json!({"Owner Email": "o"})), &config).is_err());
        assert!(map_row(&row(json!({"id": 1})), &config).is_err());
        assert!(map_row(&row(json!({"id": -1, "Owner Email": "o"})), &config).is_err());
    }
}
