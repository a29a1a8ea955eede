//! Shared reqwest wrapper for the external collaborators.
//!
//! Non-success statuses are classified here so every client reports them the
//! same way: `404` becomes [`PhtError::NotFound`], anything else an upstream
//! error carrying the status. Collaborator URLs and reply bodies only go into
//! the error context, never into the message a caller may show to clients.

use std::time::Duration;

use reqwest::{Response, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{ErrorContext, PhtError, PhtResult};

const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpClient {
    /// Build a client rooted at `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> PhtResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PhtError::configuration(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Append `segments` to the base URL, percent-encoding each one so an
    /// identifier can never climb out of its collection.
    ///
    /// Empty, `.` and `..` segments are rejected since URL normalization would
    /// drop them.
    pub fn segment_url(&self, segments: &[&str]) -> PhtResult<String> {
        if let Some(bad) = segments.iter().find(|s| matches!(**s, "" | "." | "..")) {
            return Err(PhtError::validation(format!(
                "Invalid path segment '{}'",
                bad
            )));
        }
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            PhtError::configuration(format!("Invalid base URL '{}': {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                PhtError::configuration(format!("Base URL '{}' cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url.into())
    }

    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    /// `url` is absolute; build it with [`HttpClient::url`] or
    /// [`HttpClient::segment_url`].
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        context: ErrorContext,
    ) -> PhtResult<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(e, &context))?;
        read_json(response, context).await
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: String,
        body: &B,
        context: ErrorContext,
    ) -> PhtResult<T> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(e, &context))?;
        read_json(response, context).await
    }

    pub async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: String,
        body: &B,
        context: ErrorContext,
    ) -> PhtResult<T> {
        let response = self
            .client
            .put(url)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(e, &context))?;
        read_json(response, context).await
    }
}

/// Decode a JSON body after checking the status.
pub async fn read_json<T: DeserializeOwned>(
    response: Response,
    context: ErrorContext,
) -> PhtResult<T> {
    let response = check_status(response, &context).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| transport_error(e, &context))
}

/// Turn a non-success response into the matching error.
pub async fn check_status(response: Response, context: &ErrorContext) -> PhtResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let mut body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    truncate_on_char_boundary(&mut body, MAX_ERROR_BODY);

    let details = format!("url={} body={}", url, body);
    if status == StatusCode::NOT_FOUND {
        return Err(PhtError::not_found_with_context(
            not_found_message(context),
            context.clone().with_details(details),
        ));
    }
    Err(PhtError::upstream_with_context(
        format!("Upstream service returned status {}", status.as_u16()),
        context.clone().with_details(details),
    ))
}

fn not_found_message(context: &ErrorContext) -> String {
    match (&context.entity, &context.entity_id) {
        (Some(entity), Some(id)) => format!("{} '{}' not found", entity, id),
        (Some(entity), None) => format!("{} not found", entity),
        _ => "Upstream resource not found".to_string(),
    }
}

/// Classify a transport failure under the caller's context.
///
/// reqwest renders the request URL into its messages, so the full text is
/// kept in the details and the message only names the failure kind.
pub fn transport_error(err: reqwest::Error, context: &ErrorContext) -> PhtError {
    let converted = PhtError::from(err);
    let kind = converted.context().details.clone().unwrap_or_default();
    PhtError::upstream_with_context(
        format!("Upstream request failed ({})", kind),
        context
            .clone()
            .with_details(format!("{}: {}", kind, converted.message())),
    )
}

fn truncate_on_char_boundary(text: &mut String, max: usize) {
    if text.len() <= max {
        return;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
}
