//! Crunchbase search API client

use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use orgpipe_core::{FetchError, SHARED_RUNTIME, fresh_client};

use crate::transform::OrgEntity;

/// Default search endpoint
pub const SEARCH_URL: &str = "https://api.crunchbase.com/api/v4/searches/organizations";

/// Credential header name
const USER_KEY_HEADER: &str = "X-cb-user-key";

/// Fields requested from the API; everything else stays server-side
const FIELD_IDS: [&str; 7] = [
    "uuid",
    "linkedin",
    "location_identifiers",
    "website_url",
    "created_at",
    "updated_at",
    "permalink",
];

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    field_ids: &'a [&'a str],
    order: [SortKey<'a>; 1],
    query: [Predicate<'a>; 1],
    limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    after_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct SortKey<'a> {
    field_id: &'a str,
    sort: &'a str,
}

#[derive(Debug, Serialize)]
struct Predicate<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    field_id: &'a str,
    operator_id: &'a str,
    values: [String; 1],
}

/// One page of the search response
#[derive(Debug, Deserialize)]
pub struct SearchPage {
    /// Total matching records across all pages; stable for a run
    pub count: usize,
    #[serde(default)]
    pub entities: Vec<OrgEntity>,
}

/// Paginated extractor for the organization search endpoint.
///
/// Pagination is forward-only: the extractor never derives a cursor
/// itself, the caller feeds it the last flattened row's uuid and the
/// ascending `rank_org` sort keeps the ordering stable underneath it.
pub struct OrgExtractor {
    url: String,
    api_key: String,
    updated_since: NaiveDate,
    limit: usize,
    retries: u32,
}

impl OrgExtractor {
    pub fn new(
        url: String,
        api_key: String,
        updated_since: NaiveDate,
        limit: usize,
        retries: u32,
    ) -> Self {
        Self {
            url,
            api_key,
            updated_since,
            limit,
            retries,
        }
    }

    /// Serialized request body for one page.
    ///
    /// The `gte` operator is deliberate: `gt` is rejected by the API even
    /// though its docs list it.
    fn request_body(&self, after_id: Option<&str>) -> serde_json::Result<String> {
        serde_json::to_string(&SearchRequest {
            field_ids: &FIELD_IDS,
            order: [SortKey {
                field_id: "rank_org",
                sort: "asc",
            }],
            query: [Predicate {
                kind: "predicate",
                field_id: "updated_at",
                operator_id: "gte",
                values: [self.updated_since.to_string()],
            }],
            limit: self.limit,
            after_id,
        })
    }

    /// Fetch one page. `after_id` is the previous page's last uuid; `None`
    /// requests the first page of a run.
    ///
    /// Every transport error or non-2xx status is retried with a fresh
    /// client until the budget of `retries` total attempts runs out, with
    /// no delay between attempts. A 2xx body that fails to parse is fatal
    /// and not retried.
    pub fn fetch_page(&self, after_id: Option<&str>) -> anyhow::Result<SearchPage> {
        let body = self.request_body(after_id)?;
        let mut last_err: Option<FetchError> = None;

        for attempt in 1..=self.retries {
            // Fresh client per attempt: the connection pool of a failed
            // attempt is never reused.
            let client = fresh_client();
            let result: Result<String, reqwest::Error> =
                SHARED_RUNTIME.handle().block_on(async {
                    let resp = client
                        .post(&self.url)
                        .header(USER_KEY_HEADER, &self.api_key)
                        .header("Content-Type", "application/json")
                        .body(body.clone())
                        .send()
                        .await?
                        .error_for_status()?;
                    resp.text().await
                });

            match result {
                Ok(text) => {
                    let page: SearchPage = serde_json::from_str(&text)
                        .context("invalid search response JSON")?;
                    return Ok(page);
                }
                Err(e) => {
                    let err = FetchError::from_reqwest(&e);
                    log::warn!(
                        "{}: attempt {attempt}/{} failed: {err}",
                        self.url,
                        self.retries
                    );
                    last_err = Some(err);
                }
            }
        }

        log::error!("{}: giving up after {} attempts", self.url, self.retries);
        Err(last_err
            .map(anyhow::Error::from)
            .unwrap_or_else(|| anyhow::anyhow!("retry budget is zero")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor(updated_since: NaiveDate) -> OrgExtractor {
        OrgExtractor::new(
            SEARCH_URL.to_string(),
            "fake_key".to_string(),
            updated_since,
            50,
            5,
        )
    }

    fn body_json(extractor: &OrgExtractor, after_id: Option<&str>) -> serde_json::Value {
        serde_json::from_str(&extractor.request_body(after_id).unwrap()).unwrap()
    }

    #[test]
    fn first_page_body_has_no_cursor() {
        let since = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let body = body_json(&extractor(since), None);

        assert!(body.get("after_id").is_none());
        assert_eq!(body["limit"], 50);
        assert_eq!(body["order"][0]["field_id"], "rank_org");
        assert_eq!(body["order"][0]["sort"], "asc");
    }

    #[test]
    fn body_filters_on_updated_since() {
        let since = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let body = body_json(&extractor(since), None);

        let predicate = &body["query"][0];
        assert_eq!(predicate["type"], "predicate");
        assert_eq!(predicate["field_id"], "updated_at");
        assert_eq!(predicate["operator_id"], "gte");
        assert_eq!(predicate["values"], serde_json::json!(["2023-12-31"]));
    }

    #[test]
    fn body_projects_fixed_field_list() {
        let since = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let body = body_json(&extractor(since), None);

        let fields: Vec<&str> = body["field_ids"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(fields, FIELD_IDS);
    }

    #[test]
    fn backfill_bound_is_earliest_representable_date() {
        let body = body_json(&extractor(NaiveDate::MIN), None);
        assert_eq!(
            body["query"][0]["values"],
            serde_json::json!([NaiveDate::MIN.to_string()])
        );
    }

    #[test]
    fn later_pages_carry_the_cursor() {
        let since = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let body = body_json(&extractor(since), Some("fake_last_id"));
        assert_eq!(body["after_id"], "fake_last_id");
    }

    #[test]
    fn response_parses_count_and_entities() {
        let page: SearchPage = serde_json::from_str(
            r#"{"count": 2, "entities": [{"uuid": "a"}, {"uuid": "b"}]}"#,
        )
        .unwrap();
        assert_eq!(page.count, 2);
        assert_eq!(page.entities.len(), 2);
    }
}
