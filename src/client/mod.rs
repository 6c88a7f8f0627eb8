use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cancel::CancellationToken;
use crate::directory::{normalize_as, DirectoryRecord, ShapeError};
use crate::model::{
    Cat, ClassInfo, Course, CourseWithCount, CurrentUser, RosterEntry, Student, Teacher,
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid API base URL '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },

    #[error("invalid cookie header value")]
    InvalidCookie,

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} returned a body that is not JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{url}: {source}")]
    Shape {
        url: String,
        #[source]
        source: ShapeError,
    },
}

/// Result of a list fetch. Every failure carries no records.
#[derive(Debug)]
pub enum Fetched<T> {
    Loaded(Vec<T>),
    Failed(ClientError),
    /// The request was superseded before its result could be used.
    Cancelled,
}

impl<T> Fetched<T> {
    /// The fetched records, or an empty list for a failed or cancelled fetch.
    pub fn into_records(self) -> Vec<T> {
        match self {
            Self::Loaded(records) => records,
            Self::Failed(_) | Self::Cancelled => Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout_seconds: u64,
        cookie: Option<&str>,
    ) -> Result<Self, ClientError> {
        let base = Url::parse(base_url.trim()).map_err(|e| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl {
                url: base_url.to_string(),
                message: "URL cannot carry a path".to_string(),
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(cookie) = cookie.map(str::trim).filter(|c| !c.is_empty()) {
            let value = HeaderValue::from_str(cookie).map_err(|_| ClientError::InvalidCookie)?;
            headers.insert(COOKIE, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ClientError::HttpClientBuild { source: e })?;
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Joins path segments onto the base URL, percent-encoding each one.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub async fn fetch_json(&self, url: Url) -> Result<Value, ClientError> {
        let shown = url.to_string();
        debug!(url = %shown, "GET");
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::Transport {
                url: shown.clone(),
                source: e,
            })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url: shown,
                status: status.as_u16(),
            });
        }
        let body = resp.bytes().await.map_err(|e| ClientError::Transport {
            url: shown.clone(),
            source: e,
        })?;
        serde_json::from_slice(&body).map_err(|e| ClientError::Decode {
            url: shown,
            source: e,
        })
    }

    /// Fetches a JSON list. Failures are logged here and never propagate;
    /// the token is checked once the response is in.
    pub async fn fetch_array<T: DeserializeOwned>(
        &self,
        url: Url,
        token: &CancellationToken,
    ) -> Fetched<T> {
        let shown = url.to_string();
        let result = self.fetch_json(url).await;
        if token.is_cancelled() {
            debug!(url = %shown, "fetch superseded; discarding response");
            return Fetched::Cancelled;
        }
        let body = match result {
            Ok(body) => body,
            Err(err) => {
                warn!(error = %err, "fetch failed; treating as no data");
                return Fetched::Failed(err);
            }
        };
        let normalized = normalize_as::<T>(body);
        match normalized.failure {
            Some(shape) => Fetched::Failed(ClientError::Shape {
                url: shown,
                source: shape,
            }),
            None => {
                debug!(url = %shown, records = normalized.items.len(), "fetched");
                Fetched::Loaded(normalized.items)
            }
        }
    }

    /// `GET /{slug}/{students|teachers}/detailed`
    pub async fn fetch_directory<R>(&self, slug: &str, token: &CancellationToken) -> Fetched<R>
    where
        R: DirectoryRecord + DeserializeOwned,
    {
        let url = self.endpoint(&[slug, R::KIND.resource(), "detailed"]);
        self.fetch_array(url, token).await
    }

    pub async fn students_detailed(
        &self,
        slug: &str,
        token: &CancellationToken,
    ) -> Fetched<Student> {
        self.fetch_directory(slug, token).await
    }

    pub async fn teachers_detailed(
        &self,
        slug: &str,
        token: &CancellationToken,
    ) -> Fetched<Teacher> {
        self.fetch_directory(slug, token).await
    }

    pub async fn student_classes(&self, id: i64, token: &CancellationToken) -> Fetched<ClassInfo> {
        let url = self.endpoint(&["student", &id.to_string(), "classes"]);
        self.fetch_array(url, token).await
    }

    pub async fn teacher_schedule(&self, id: i64, token: &CancellationToken) -> Fetched<ClassInfo> {
        let url = self.endpoint(&["teacher", &id.to_string(), "schedule"]);
        self.fetch_array(url, token).await
    }

    pub async fn student_cats(&self, id: i64, token: &CancellationToken) -> Fetched<Cat> {
        let url = self.endpoint(&["cats", "student", &id.to_string()]);
        self.fetch_array(url, token).await
    }

    pub async fn teacher_cats(&self, id: i64, token: &CancellationToken) -> Fetched<Cat> {
        let url = self.endpoint(&["cats", "teacher", &id.to_string()]);
        self.fetch_array(url, token).await
    }

    pub async fn department_courses(
        &self,
        department: &str,
        token: &CancellationToken,
    ) -> Fetched<Course> {
        let url = self.endpoint(&["courses", "department", department]);
        self.fetch_array(url, token).await
    }

    pub async fn student_courses(&self, id: i64, token: &CancellationToken) -> Fetched<Course> {
        let url = self.endpoint(&["student", &id.to_string(), "courses"]);
        self.fetch_array(url, token).await
    }

    /// Courses of the student's own department.
    pub async fn student_department_courses(
        &self,
        id: i64,
        token: &CancellationToken,
    ) -> Fetched<Course> {
        let url = self.endpoint(&["student", &id.to_string(), "department-courses"]);
        self.fetch_array(url, token).await
    }

    pub async fn teacher_courses(
        &self,
        id: i64,
        token: &CancellationToken,
    ) -> Fetched<CourseWithCount> {
        let url = self.endpoint(&["teacher", &id.to_string(), "courses-with-count"]);
        self.fetch_array(url, token).await
    }

    /// `GET /{slug}/teacher/{id}/students`, one entry per registration.
    pub async fn teacher_students(
        &self,
        slug: &str,
        id: i64,
        token: &CancellationToken,
    ) -> Fetched<RosterEntry> {
        let url = self.endpoint(&[slug, "teacher", &id.to_string(), "students"]);
        self.fetch_array(url, token).await
    }

    /// `GET /me`. `Ok(None)` when the backend reports no session.
    pub async fn current_user(&self) -> Result<Option<CurrentUser>, ClientError> {
        let url = self.endpoint(&["me"]);
        let shown = url.to_string();
        match self.fetch_json(url).await {
            Ok(body) => serde_json::from_value::<CurrentUser>(body)
                .map(Some)
                .map_err(|e| ClientError::Decode {
                    url: shown,
                    source: e,
                }),
            Err(ClientError::Status { status, .. }) if (400..500).contains(&status) => Ok(None),
            Err(err) => Err(err),
        }
    }
}
