//! Pre-send and post-receive stages.
//!
//! # Pre-send
//! merge options → show mask → cancel handle (+ expose to caller)
//! → compose URL, query/body, credential header → register
//!
//! # Post-receive
//! - success: hide mask → notify → deregister → normalise
//! - raw transfer: deregister → response verbatim (no mask is ever shown)
//! - failure: deregister → hide mask → notify → session guardian → reject
//! - cancelled: deregister → hide mask → reject with the cancel reason

use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use futures_util::future::AbortRegistration;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use url::Url;

use crate::http::envelope::{backend_message, normalize, ResultEnvelope};
use crate::http::method::Method;
use crate::http::request::{RequestId, TransportRequest};
use crate::http::response::TransportResponse;
use crate::http::transport::TransportError;
use crate::http::url::{compose, resource_name};
use crate::lifecycle::cancel::{CancelHandle, Canceller};
use crate::lifecycle::descriptor::RequestDescriptor;
use crate::lifecycle::registry::TrackingGuard;
use crate::observability::metrics::{self, Outcome};
use crate::pipeline::client::Pipeline;
use crate::pipeline::error::PipelineError;
use crate::pipeline::options::{CallOptions, RequestOptions};

/// Bookkeeping carried from pre-send to post-receive.
pub(crate) struct InFlight {
    method: Method,
    handle: CancelHandle,
    options: CallOptions,
    _tracking: TrackingGuard,
}

pub(crate) struct Prepared {
    pub(crate) request: TransportRequest,
    pub(crate) registration: AbortRegistration,
    pub(crate) call: InFlight,
}

/// A call whose transport round trip returned a 2xx response.
pub(crate) struct Completed {
    pub(crate) call: InFlight,
    pub(crate) response: TransportResponse,
    pub(crate) start: Instant,
}

impl Pipeline {
    /// Pre-send stage.
    ///
    /// A construction failure hides the mask, is logged, leaves the registry
    /// untouched and rejects with the configured error message.
    pub(crate) fn pre_send(
        &self,
        method: Method,
        url: &str,
        data: Option<Value>,
        options: RequestOptions,
    ) -> Result<Prepared, ResultEnvelope> {
        let (options, on_cancel) = options.merge(&self.defaults.load());

        if let Some(mask) = &options.mask {
            self.mask.show(mask);
        }

        let id = RequestId::new();
        let (handle, registration) = CancelHandle::new(id);
        if let Some(expose) = on_cancel {
            expose(Canceller::new(handle.clone(), Arc::clone(&self.registry)));
        }

        let request = match self.build_request(id, method, url, data, &options) {
            Ok(request) => request,
            Err(e) => {
                self.hide_mask(&options);
                tracing::error!(request_id = %id, method = %method, url, error = %e, "Request construction failed");
                return Err(ResultEnvelope::failure(options.error_message));
            }
        };

        let tracking = self.registry.track(RequestDescriptor::new(
            handle.clone(),
            method,
            request.url.as_str(),
            options.clone(),
        ));

        Ok(Prepared {
            request,
            registration,
            call: InFlight {
                method,
                handle,
                options,
                _tracking: tracking,
            },
        })
    }

    fn build_request(
        &self,
        id: RequestId,
        method: Method,
        url: &str,
        data: Option<Value>,
        options: &CallOptions,
    ) -> Result<TransportRequest, PipelineError> {
        let path = compose(url, resource_name(data.as_ref()));
        let url = self.resolve_url(&path)?;
        let headers = self.credential_headers()?;

        let (query, body) = if method.is_simple() {
            (self.query_params(data.as_ref())?, None)
        } else {
            (Vec::new(), data)
        };

        Ok(TransportRequest {
            id,
            method,
            url,
            query,
            headers,
            body,
            timeout: options.timeout,
        })
    }

    fn resolve_url(&self, path: &str) -> Result<Url, PipelineError> {
        let invalid = |reason: String| PipelineError::InvalidUrl {
            url: path.to_string(),
            reason,
        };

        match Url::parse(path) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self
                    .transport_config
                    .base_url
                    .as_deref()
                    .ok_or_else(|| invalid("relative URL and no base_url configured".to_string()))?;
                let joined = if path.starts_with('/') {
                    format!("{}{}", base.trim_end_matches('/'), path)
                } else {
                    format!("{}/{}", base.trim_end_matches('/'), path)
                };
                Url::parse(&joined).map_err(|e| invalid(e.to_string()))
            }
            Err(e) => Err(invalid(e.to_string())),
        }
    }

    fn credential_headers(&self) -> Result<HeaderMap, PipelineError> {
        let mut headers = HeaderMap::new();
        let Some(token) = self.tokens.token() else {
            return Ok(headers);
        };

        let header = &self.transport_config.token_header;
        let invalid = |reason: String| PipelineError::InvalidHeader {
            name: header.clone(),
            reason,
        };
        let name = HeaderName::from_bytes(header.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let value = HeaderValue::from_str(&token).map_err(|e| invalid(e.to_string()))?;
        headers.insert(name, value);
        Ok(headers)
    }

    /// Data fields as query parameters, plus the cache-buster.
    ///
    /// A data field named like the cache-buster is replaced by the timestamp.
    fn query_params(&self, data: Option<&Value>) -> Result<Vec<(String, String)>, PipelineError> {
        let buster = &self.transport_config.cache_buster_param;
        let mut query = Vec::new();
        match data {
            None | Some(Value::Null) => {}
            Some(Value::Object(fields)) => {
                for (key, value) in fields {
                    if key == buster {
                        continue;
                    }
                    let value = match value {
                        Value::Null => continue,
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    query.push((key.clone(), value));
                }
            }
            Some(Value::Array(_)) => return Err(PipelineError::InvalidQuery("an array")),
            Some(Value::String(_)) => return Err(PipelineError::InvalidQuery("a string")),
            Some(Value::Number(_)) => return Err(PipelineError::InvalidQuery("a number")),
            Some(Value::Bool(_)) => return Err(PipelineError::InvalidQuery("a boolean")),
        }

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        query.push((buster.clone(), now.to_string()));
        Ok(query)
    }

    /// Post-receive, success path.
    pub(crate) fn on_success(&self, completed: Completed) -> ResultEnvelope {
        let Completed { call, response, start } = completed;
        let InFlight { method, handle, options, .. } = call;

        self.hide_mask(&options);
        if !options.silent {
            self.notifier.success(&options.success_message);
        }
        self.registry.deregister(&handle);

        let envelope = normalize(&response.json(), method.is_simple());
        tracing::debug!(
            request_id = %handle.id(),
            method = %method,
            status = response.status,
            success = envelope.success,
            "Request resolved"
        );
        metrics::record_request(method.as_str(), Outcome::Resolved, start);
        envelope
    }

    /// Post-receive for raw transfers: bookkeeping only.
    pub(crate) fn on_raw(&self, completed: Completed) -> TransportResponse {
        let Completed { call, response, start } = completed;
        self.registry.deregister(&call.handle);
        tracing::debug!(request_id = %call.handle.id(), status = response.status, "Raw transfer completed");
        metrics::record_request(call.method.as_str(), Outcome::Raw, start);
        response
    }

    /// Post-receive, failure path.
    pub(crate) fn on_failure(&self, call: InFlight, error: TransportError, start: Instant) -> ResultEnvelope {
        let InFlight { method, handle, options, .. } = call;

        self.registry.deregister(&handle);
        self.hide_mask(&options);

        let payload = error.response().map(TransportResponse::json);
        if !options.silent {
            let message = payload
                .as_ref()
                .and_then(backend_message)
                .unwrap_or_else(|| options.error_message.clone());
            self.notifier.failure(&message);
        }

        match (error.response().map(|r| r.status), payload) {
            (Some(status), Some(payload)) => {
                tracing::warn!(request_id = %handle.id(), method = %method, status, "Request rejected by server");
                self.guardian.guard(status, &payload, self.route.on_login_surface());
                metrics::record_request(method.as_str(), Outcome::Rejected, start);

                // A failed response is never an implicit success, whatever its shape.
                let mut envelope = normalize(&payload, false);
                envelope.success = false;
                envelope.message.get_or_insert(options.error_message);
                envelope
            }
            _ => {
                tracing::warn!(request_id = %handle.id(), method = %method, error = %error, "Request failed without a response");
                metrics::record_request(method.as_str(), Outcome::TransportFailed, start);
                ResultEnvelope::failure(error.to_string())
            }
        }
    }

    /// Post-receive for a call whose handle fired.
    pub(crate) fn on_cancelled(&self, call: InFlight, start: Instant) -> ResultEnvelope {
        let InFlight { method, handle, options, .. } = call;

        self.registry.deregister(&handle);
        self.hide_mask(&options);

        tracing::debug!(request_id = %handle.id(), method = %method, reason = ?handle.reason(), "Request cancelled");
        metrics::record_request(method.as_str(), Outcome::Cancelled, start);
        ResultEnvelope::failure(handle.reason().unwrap_or(options.error_message.as_str()))
    }

    fn hide_mask(&self, options: &CallOptions) {
        if let Some(mask) = &options.mask {
            self.mask.hide(mask);
        }
    }
}
