// ABOUTME: REST client for the ITSM table API.
// ABOUTME: Basic auth on every request; results unwrapped from the {"result": ...} envelope.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use super::error::ItsmError;
use super::model::{
    ChangeKind, Envelope, NewChangeRequest, NewChangeTask, RECORD_FIELDS, Record, Table,
};

const GET_ACCEPTED: &[StatusCode] = &[StatusCode::OK];
const PUT_ACCEPTED: &[StatusCode] = &[StatusCode::OK, StatusCode::ACCEPTED];
const POST_ACCEPTED: &[StatusCode] = &[StatusCode::OK, StatusCode::CREATED, StatusCode::ACCEPTED];

/// Read access to change entities, as needed by the approval waiter.
#[async_trait]
pub trait ChangeLookup: Send + Sync {
    async fn fetch_change(&self, kind: ChangeKind, sys_id: &str) -> Result<Record, ItsmError>;
}

/// Filter for table listings.
#[derive(Debug, Clone)]
pub struct ListQuery {
    /// Encoded query, e.g. `active=true^ORDERBYnumber`.
    pub query: String,
    pub state: Option<String>,
    pub limit: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            state: None,
            limit: 100,
        }
    }
}

#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    api_version: String,
    username: String,
    password: String,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Client {
    pub fn new(
        base_url: &str,
        api_version: &str,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Self, ItsmError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ItsmError::Config(format!(
                "base url must start with http:// or https://, got '{}'",
                base_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("stagegate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ItsmError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            api_version: api_version.trim_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/api/now/{version}/table/{table}[/{sys_id}]`
    fn table_url(&self, table: Table, sys_id: Option<&str>) -> String {
        let mut url = format!(
            "{}/api/now/{}/table/{}",
            self.base_url, self.api_version, table
        );
        if let Some(id) = sys_id {
            url.push('/');
            url.push_str(&urlencoding::encode(id));
        }
        url
    }

    async fn send<T, B>(
        &self,
        method: Method,
        url: String,
        body: Option<&B>,
        accepted: &[StatusCode],
    ) -> Result<T, ItsmError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        debug!(%method, url = %url, "ITSM request");

        let mut request = self
            .http
            .request(method, &url)
            .basic_auth(&self.username, Some(&self.password))
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !accepted.contains(&status) {
            debug!(status = status.as_u16(), "ITSM request not accepted");
            let subject = url.split('?').next().unwrap_or(&url);
            return Err(ItsmError::from_status(status, subject, text));
        }

        let envelope: Envelope<T> = serde_json::from_str(&text)
            .map_err(|e| ItsmError::InvalidResponse(e.to_string()))?;
        Ok(envelope.result)
    }

    async fn get<T: DeserializeOwned>(&self, url: String) -> Result<T, ItsmError> {
        self.send::<T, ()>(Method::GET, url, None, GET_ACCEPTED)
            .await
    }

    /// List records matching `query`.
    pub async fn list(&self, table: Table, query: &ListQuery) -> Result<Vec<Record>, ItsmError> {
        let mut url = format!(
            "{}?sysparm_limit={}&sysparm_display_value=true&sysparm_query={}&sysparm_fields={}",
            self.table_url(table, None),
            query.limit,
            urlencoding::encode(&query.query),
            urlencoding::encode(RECORD_FIELDS),
        );
        if let Some(state) = &query.state {
            url.push_str("&state=");
            url.push_str(&urlencoding::encode(state));
        }
        self.get(url).await
    }

    /// List change tasks, optionally only those under the change request `parent_number`.
    pub async fn list_change_tasks(
        &self,
        parent_number: Option<&str>,
        query: &ListQuery,
    ) -> Result<Vec<Record>, ItsmError> {
        let mut scoped = query.clone();
        if let Some(parent) = parent_number.filter(|p| !p.trim().is_empty()) {
            scoped.query = format!("{}^change_request.number={}", query.query, parent.trim());
        }
        self.list(Table::ChangeTask, &scoped).await
    }

    pub async fn get_record(&self, table: Table, sys_id: &str) -> Result<Record, ItsmError> {
        let url = format!(
            "{}?sysparm_limit=1&sysparm_display_value=true&sysparm_fields={}",
            self.table_url(table, Some(sys_id)),
            urlencoding::encode(RECORD_FIELDS),
        );
        self.get(url).await
    }

    pub async fn get_by_number(&self, table: Table, number: &str) -> Result<Record, ItsmError> {
        let query = ListQuery {
            query: format!("number={}", number),
            state: None,
            limit: 1,
        };
        self.list(table, &query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ItsmError::NotFound(format!("{} {}", table, number)))
    }

    fn write_url(&self, table: Table, sys_id: Option<&str>) -> String {
        format!(
            "{}?sysparm_display_value=true&sysparm_fields={}",
            self.table_url(table, sys_id),
            urlencoding::encode(RECORD_FIELDS),
        )
    }

    pub async fn create_change_request(
        &self,
        request: &NewChangeRequest,
    ) -> Result<Record, ItsmError> {
        let url = self.write_url(Table::ChangeRequest, None);
        self.send(Method::POST, url, Some(request), POST_ACCEPTED)
            .await
    }

    pub async fn create_change_task(&self, task: &NewChangeTask) -> Result<Record, ItsmError> {
        let url = self.write_url(Table::ChangeTask, None);
        self.send(Method::POST, url, Some(task), POST_ACCEPTED)
            .await
    }

    /// Set the approval field of a change request.
    pub async fn set_approval(&self, sys_id: &str, approval: &str) -> Result<Record, ItsmError> {
        let url = self.write_url(Table::ChangeRequest, Some(sys_id));
        let body = json!({ "approval": approval });
        self.send(Method::PUT, url, Some(&body), PUT_ACCEPTED).await
    }

    pub async fn set_state(
        &self,
        kind: ChangeKind,
        sys_id: &str,
        state: &str,
    ) -> Result<Record, ItsmError> {
        let url = self.write_url(kind.table(), Some(sys_id));
        let body = json!({ "state": state });
        self.send(Method::PUT, url, Some(&body), PUT_ACCEPTED).await
    }
}

#[async_trait]
impl ChangeLookup for Client {
    async fn fetch_change(&self, kind: ChangeKind, sys_id: &str) -> Result<Record, ItsmError> {
        self.get_record(kind.table(), sys_id).await
    }
}
