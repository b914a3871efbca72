//! Caller-facing client.
//!
//! One method per verb, each taking `(url, data, options)` and resolving to
//! a [`ResultEnvelope`] or rejecting with one.

use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use futures_util::future::{Abortable, Aborted};
use serde_json::Value;

use crate::capabilities::{Capabilities, Mask, Notifier, RouteContext, TokenSource};
use crate::config::loader::ConfigError;
use crate::config::schema::{OrchestratorConfig, TransportConfig};
use crate::config::validation::validate_config;
use crate::http::envelope::ResultEnvelope;
use crate::http::method::Method;
use crate::http::response::TransportResponse;
use crate::http::transport::{ReqwestTransport, Transport};
use crate::lifecycle::descriptor::TrackedRequest;
use crate::lifecycle::registry::RequestRegistry;
use crate::pipeline::error::PipelineResult;
use crate::pipeline::interceptors::Completed;
use crate::pipeline::options::{RequestDefaults, RequestOptions};
use crate::session::guardian::SessionGuardian;

/// The request lifecycle manager.
pub struct Pipeline {
    pub(super) transport: Arc<dyn Transport>,
    pub(super) registry: Arc<RequestRegistry>,
    pub(super) defaults: ArcSwap<RequestDefaults>,
    pub(super) transport_config: TransportConfig,
    pub(super) mask: Arc<dyn Mask>,
    pub(super) notifier: Arc<dyn Notifier>,
    pub(super) tokens: Arc<dyn TokenSource>,
    pub(super) route: Arc<dyn RouteContext>,
    pub(super) guardian: SessionGuardian,
}

impl Pipeline {
    /// Create a pipeline with its own registry.
    pub fn new(
        config: OrchestratorConfig,
        transport: Arc<dyn Transport>,
        capabilities: Capabilities,
    ) -> PipelineResult<Self> {
        Self::with_registry(config, transport, capabilities, Arc::new(RequestRegistry::new()))
    }

    /// Create a pipeline tracking calls in `registry`.
    pub fn with_registry(
        config: OrchestratorConfig,
        transport: Arc<dyn Transport>,
        capabilities: Capabilities,
        registry: Arc<RequestRegistry>,
    ) -> PipelineResult<Self> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let guardian = SessionGuardian::new(
            config.session.clone(),
            capabilities.dialog,
            capabilities.login,
        );

        tracing::debug!(
            base_url = ?config.transport.base_url,
            timeout_secs = config.transport.timeout_secs,
            "Pipeline initialised"
        );

        Ok(Self {
            transport,
            registry,
            defaults: ArcSwap::from_pointee(RequestDefaults::from_config(&config)),
            transport_config: config.transport,
            mask: capabilities.mask,
            notifier: capabilities.notifier,
            tokens: capabilities.tokens,
            route: capabilities.route,
            guardian,
        })
    }

    /// Create a pipeline over a [`ReqwestTransport`] honouring the configured timeout.
    pub fn with_reqwest(config: OrchestratorConfig, capabilities: Capabilities) -> PipelineResult<Self> {
        let transport = ReqwestTransport::new(config.transport.timeout())?;
        Self::new(config, Arc::new(transport), capabilities)
    }

    pub async fn get(&self, url: &str, data: Option<Value>, options: RequestOptions) -> Result<ResultEnvelope, ResultEnvelope> {
        self.request(Method::Get, url, data, options).await
    }

    pub async fn head(&self, url: &str, data: Option<Value>, options: RequestOptions) -> Result<ResultEnvelope, ResultEnvelope> {
        self.request(Method::Head, url, data, options).await
    }

    pub async fn post(&self, url: &str, data: Option<Value>, options: RequestOptions) -> Result<ResultEnvelope, ResultEnvelope> {
        self.request(Method::Post, url, data, options).await
    }

    pub async fn patch(&self, url: &str, data: Option<Value>, options: RequestOptions) -> Result<ResultEnvelope, ResultEnvelope> {
        self.request(Method::Patch, url, data, options).await
    }

    pub async fn put(&self, url: &str, data: Option<Value>, options: RequestOptions) -> Result<ResultEnvelope, ResultEnvelope> {
        self.request(Method::Put, url, data, options).await
    }

    /// Run one call through both interceptor stages.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        data: Option<Value>,
        options: RequestOptions,
    ) -> Result<ResultEnvelope, ResultEnvelope> {
        let completed = self.round_trip(method, url, data, options).await?;
        Ok(self.on_success(completed))
    }

    /// Raw file/blob transfer: the response is returned verbatim, with no
    /// normalisation or notification. Masks are not supported here; a mask
    /// in `options` is ignored.
    pub async fn download(
        &self,
        method: Method,
        url: &str,
        data: Option<Value>,
        mut options: RequestOptions,
    ) -> Result<TransportResponse, ResultEnvelope> {
        if let Some(mask) = options.mask.take() {
            tracing::debug!(mask = %mask, url, "Mask ignored for raw transfer");
        }
        let completed = self.round_trip(method, url, data, options).await?;
        Ok(self.on_raw(completed))
    }

    /// Abort every in-flight call that is not auto-cancel exempt.
    pub fn cancel_all(&self, reason: Option<&str>) -> usize {
        self.registry.cancel_all(reason)
    }

    pub fn in_flight(&self) -> usize {
        self.registry.len()
    }

    pub fn tracked(&self) -> Vec<TrackedRequest> {
        self.registry.snapshot()
    }

    pub fn registry(&self) -> &Arc<RequestRegistry> {
        &self.registry
    }

    pub fn session(&self) -> &SessionGuardian {
        &self.guardian
    }

    /// Replace the option defaults; calls already in flight keep theirs.
    pub fn reload_defaults(&self, config: &OrchestratorConfig) {
        self.defaults.store(Arc::new(RequestDefaults::from_config(config)));
        tracing::info!("Request defaults reloaded");
    }

    pub fn defaults(&self) -> Arc<RequestDefaults> {
        self.defaults.load_full()
    }

    async fn round_trip(
        &self,
        method: Method,
        url: &str,
        data: Option<Value>,
        options: RequestOptions,
    ) -> Result<Completed, ResultEnvelope> {
        let start = Instant::now();
        let prepared = self.pre_send(method, url, data, options)?;

        let result = Abortable::new(self.transport.send(prepared.request), prepared.registration).await;
        let call = prepared.call;

        match result {
            Ok(Ok(response)) => Ok(Completed { call, response, start }),
            Ok(Err(error)) => Err(self.on_failure(call, error, start)),
            Err(Aborted) => Err(self.on_cancelled(call, start)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{Dialog, LoginSurfaceFlag, MaskTarget, StaticToken};
    use crate::http::request::TransportRequest;
    use crate::http::transport::TransportError;
    use crate::lifecycle::cancel::Canceller;
    use crate::session::dialog::{ReauthDialog, SubmitAction};
    use futures_util::future::{self, BoxFuture};
    use futures_util::FutureExt;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    enum Scripted {
        Respond(Result<TransportResponse, TransportError>),
        Hang,
    }

    #[derive(Default)]
    struct ScriptedTransport {
        script: Mutex<VecDeque<Scripted>>,
        seen: Mutex<Vec<TransportRequest>>,
    }

    impl ScriptedTransport {
        fn with(script: Vec<Scripted>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                seen: Mutex::default(),
            })
        }

        fn last(&self) -> TransportRequest {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl Transport for ScriptedTransport {
        fn send(&self, request: TransportRequest) -> BoxFuture<'_, Result<TransportResponse, TransportError>> {
            self.seen.lock().unwrap().push(request);
            match self.script.lock().unwrap().pop_front() {
                Some(Scripted::Respond(result)) => future::ready(result).boxed(),
                Some(Scripted::Hang) | None => future::pending().boxed(),
            }
        }
    }

    #[derive(Default)]
    struct RecordingUi {
        events: Mutex<Vec<String>>,
    }

    impl RecordingUi {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl Mask for RecordingUi {
        fn show(&self, target: &MaskTarget) {
            self.push(format!("show:{target}"));
        }
        fn hide(&self, target: &MaskTarget) {
            self.push(format!("hide:{target}"));
        }
    }

    impl Notifier for RecordingUi {
        fn success(&self, message: &str) {
            self.push(format!("ok:{message}"));
        }
        fn failure(&self, message: &str) {
            self.push(format!("fail:{message}"));
        }
    }

    impl Dialog for RecordingUi {
        fn confirm(&self, dialog: ReauthDialog, _on_submit: SubmitAction) {
            self.push(format!("confirm:{}", dialog.title));
        }
    }

    struct Harness {
        pipeline: Arc<Pipeline>,
        transport: Arc<ScriptedTransport>,
        ui: Arc<RecordingUi>,
        route: Arc<LoginSurfaceFlag>,
    }

    fn harness(script: Vec<Scripted>) -> Harness {
        harness_with(script, Some("http://backend.test/api"))
    }

    fn harness_with(script: Vec<Scripted>, base_url: Option<&str>) -> Harness {
        let transport = ScriptedTransport::with(script);
        let ui = Arc::new(RecordingUi::default());
        let route = Arc::new(LoginSurfaceFlag::default());
        let capabilities = Capabilities {
            mask: ui.clone(),
            notifier: ui.clone(),
            dialog: ui.clone(),
            tokens: Arc::new(StaticToken(Some("tok-123".to_string()))),
            route: route.clone(),
            ..Capabilities::default()
        };
        let mut config = OrchestratorConfig::default();
        config.transport.base_url = base_url.map(str::to_string);

        let pipeline = Pipeline::new(config, transport.clone(), capabilities).unwrap();
        Harness {
            pipeline: Arc::new(pipeline),
            transport,
            ui,
            route,
        }
    }

    fn respond(status: u16, body: Value) -> Scripted {
        let response = TransportResponse::new(status, body.to_string());
        if response.is_success() {
            Scripted::Respond(Ok(response))
        } else {
            Scripted::Respond(Err(TransportError::Status(response)))
        }
    }

    async fn wait_for_in_flight(pipeline: &Pipeline, count: usize) {
        while pipeline.in_flight() < count {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_get_resolves_bare_data() {
        let h = harness(vec![respond(200, json!({ "id": 7, "size": 3 }))]);

        let env = h
            .pipeline
            .get("/disks", Some(json!({ "name": "a b" })), RequestOptions::new().mask("#panel"))
            .await
            .unwrap();

        assert_eq!(env, ResultEnvelope::ok(json!({ "id": 7, "size": 3 })));
        assert_eq!(h.pipeline.in_flight(), 0);

        let sent = h.transport.last();
        assert_eq!(sent.url.as_str(), "http://backend.test/api/disks/a%20b");
        assert_eq!(sent.body, None);
        assert!(sent.query.contains(&("name".to_string(), "a b".to_string())));
        assert!(sent.query.iter().any(|(k, v)| k == "t" && v.parse::<u128>().is_ok()));
        assert_eq!(sent.headers.get("csrf_id").unwrap(), "tok-123");

        assert_eq!(
            h.ui.events(),
            vec!["show:#panel", "hide:#panel", "ok:Operation succeeded"]
        );
    }

    #[tokio::test]
    async fn test_head_resolves_empty_body() {
        let h = harness(vec![Scripted::Respond(Ok(TransportResponse::new(200, "")))]);
        let env = h.pipeline.head("/disks", None, RequestOptions::new().silent(true)).await.unwrap();
        assert_eq!(env, ResultEnvelope::ok(Value::Null));
        assert!(h.ui.events().is_empty());
    }

    #[tokio::test]
    async fn test_post_sends_body_unmodified() {
        let h = harness(vec![respond(200, json!({ "status": "Success", "msg": "created" }))]);
        let data = json!({ "name": "vol/1", "size": 10 });

        let env = h.pipeline.post("/volumes", Some(data.clone()), RequestOptions::new()).await.unwrap();
        assert!(env.success);
        assert_eq!(env.message.as_deref(), Some("created"));
        assert_eq!(env.data, None);

        let sent = h.transport.last();
        assert_eq!(sent.url.path(), "/api/volumes/vol%2F1");
        assert_eq!(sent.body, Some(data));
        assert!(sent.query.is_empty());
    }

    #[tokio::test]
    async fn test_business_failure_on_2xx_resolves() {
        let h = harness(vec![respond(200, json!({ "status": "Failure", "msg": "quota exceeded" }))]);
        let env = h.pipeline.put("/volumes", None, RequestOptions::new()).await.unwrap();
        assert!(!env.success);
        assert_eq!(env.message.as_deref(), Some("quota exceeded"));
    }

    #[tokio::test]
    async fn test_server_error_prefers_backend_message() {
        let h = harness(vec![respond(500, json!({ "status": "Failure", "code": "E_DISK", "msg": "disk offline" }))]);

        let err = h.pipeline.patch("/disks", None, RequestOptions::new()).await.unwrap_err();
        assert_eq!(err, ResultEnvelope::failure("disk offline"));
        assert_eq!(h.ui.events(), vec!["fail:disk offline"]);
        assert_eq!(h.pipeline.in_flight(), 0);
        assert!(!h.pipeline.session().is_prompt_pending());
    }

    #[tokio::test]
    async fn test_failed_read_never_resolves_as_success() {
        let h = harness(vec![respond(404, json!({ "id": 1 }))]);
        let err = h
            .pipeline
            .get("/disks", None, RequestOptions::new().error_message("Disk not found"))
            .await
            .unwrap_err();
        assert_eq!(err, ResultEnvelope::failure("Disk not found"));
        assert_eq!(h.ui.events(), vec!["fail:Disk not found"]);
    }

    #[tokio::test]
    async fn test_unauthorized_prompts_once() {
        let h = harness(vec![
            respond(401, json!({ "status": "Failure", "msg": "expired" })),
            respond(401, json!({ "status": "Failure", "msg": "expired" })),
        ]);

        let _ = h.pipeline.get("/a", None, RequestOptions::new().silent(true)).await;
        let _ = h.pipeline.get("/b", None, RequestOptions::new().silent(true)).await;

        assert_eq!(h.ui.events(), vec!["confirm:Please log in again"]);
    }

    #[tokio::test]
    async fn test_unauthorized_code_on_2xx_resolves_without_prompt() {
        let h = harness(vec![respond(200, json!({ "status": "Failure", "code": "NO_ACCESS" }))]);

        let env = h.pipeline.post("/volumes", None, RequestOptions::new().silent(true)).await.unwrap();
        assert!(!env.success);
        assert!(h.ui.events().is_empty());
        assert!(!h.pipeline.session().is_prompt_pending());
    }

    #[tokio::test]
    async fn test_unauthorized_suppressed_on_login_surface() {
        let h = harness(vec![respond(403, json!({ "status": "Failure", "code": "NO_ACCESS" }))]);
        h.route.set(true);

        let err = h.pipeline.post("/login", None, RequestOptions::new().silent(true)).await.unwrap_err();
        assert!(!err.success);
        assert!(h.ui.events().is_empty());
    }

    #[tokio::test]
    async fn test_network_failure_rejects_with_transport_message() {
        let h = harness(vec![Scripted::Respond(Err(TransportError::Network("connection refused".into())))]);

        let err = h.pipeline.get("/a", None, RequestOptions::new()).await.unwrap_err();
        assert_eq!(err, ResultEnvelope::failure("network error: connection refused"));
        assert_eq!(h.ui.events(), vec!["fail:Request failed"]);
        assert_eq!(h.pipeline.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_construction_failure_is_not_registered() {
        let h = harness_with(vec![], None);

        let err = h
            .pipeline
            .post("/relative", None, RequestOptions::new().mask("#form"))
            .await
            .unwrap_err();

        assert_eq!(err, ResultEnvelope::failure("Request failed"));
        assert!(h.transport.seen.lock().unwrap().is_empty());
        assert_eq!(h.pipeline.in_flight(), 0);
        assert_eq!(h.ui.events(), vec!["show:#form", "hide:#form"]);
    }

    #[tokio::test]
    async fn test_simple_verb_rejects_non_object_data() {
        let h = harness(vec![]);
        let err = h.pipeline.get("/a", Some(json!([1, 2])), RequestOptions::new()).await.unwrap_err();
        assert!(!err.success);
        assert_eq!(h.pipeline.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_cancel_all_spares_exempt_calls() {
        let h = harness(vec![Scripted::Hang, Scripted::Hang]);

        let p = h.pipeline.clone();
        let normal = tokio::spawn(async move { p.get("/slow", None, RequestOptions::new().mask("#grid")).await });
        wait_for_in_flight(&h.pipeline, 1).await;

        let p = h.pipeline.clone();
        let exempt = tokio::spawn(async move {
            p.get("/poll", None, RequestOptions::new().exempt_from_auto_cancel()).await
        });
        wait_for_in_flight(&h.pipeline, 2).await;

        assert_eq!(h.pipeline.cancel_all(Some("route change")), 1);
        assert_eq!(h.pipeline.in_flight(), 1);

        let err = normal.await.unwrap().unwrap_err();
        assert_eq!(err, ResultEnvelope::failure("route change"));

        let tracked = h.pipeline.tracked();
        assert_eq!(tracked.len(), 1);
        assert!(tracked[0].auto_cancel_exempt);
        assert!(!exempt.is_finished());

        // Cancellation is silent; the mask is still released.
        assert_eq!(h.ui.events(), vec!["show:#grid", "hide:#grid"]);

        exempt.abort();
        assert!(exempt.await.unwrap_err().is_cancelled());
        assert_eq!(h.pipeline.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_abandoned_calls_leave_registry() {
        let h = harness(vec![Scripted::Hang, Scripted::Hang, Scripted::Hang]);

        for path in ["/a", "/b", "/c"] {
            let call = h.pipeline.get(path, None, RequestOptions::new().silent(true));
            let outcome = tokio::time::timeout(Duration::from_millis(10), call).await;
            assert!(outcome.is_err());
        }

        assert_eq!(h.pipeline.in_flight(), 0);
        assert!(h.pipeline.tracked().is_empty());
        assert_eq!(h.transport.seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_cache_buster_replaces_data_field() {
        let h = harness(vec![respond(200, json!({}))]);

        h.pipeline
            .get("/disks", Some(json!({ "t": "stale", "page": 2 })), RequestOptions::new().silent(true))
            .await
            .unwrap();

        let sent = h.transport.last();
        let busters: Vec<_> = sent.query.iter().filter(|(k, _)| k == "t").collect();
        assert_eq!(busters.len(), 1);
        assert_ne!(busters[0].1, "stale");
        assert!(sent.query.contains(&("page".to_string(), "2".to_string())));
    }

    #[tokio::test]
    async fn test_manual_cancel_aborts_and_deregisters() {
        let h = harness(vec![Scripted::Hang]);
        let slot: Arc<Mutex<Option<Canceller>>> = Arc::default();

        let p = h.pipeline.clone();
        let captured = slot.clone();
        let call = tokio::spawn(async move {
            let options = RequestOptions::new().on_cancel(move |c| {
                *captured.lock().unwrap() = Some(c);
            });
            p.post("/upload", None, options).await
        });
        wait_for_in_flight(&h.pipeline, 1).await;

        let canceller = slot.lock().unwrap().take().unwrap();
        canceller.cancel(Some("user abort"));
        assert_eq!(h.pipeline.in_flight(), 0);

        let err = call.await.unwrap().unwrap_err();
        assert_eq!(err, ResultEnvelope::failure("user abort"));

        // Firing again is harmless
        canceller.cancel(None);
    }

    #[tokio::test]
    async fn test_download_returns_raw_response() {
        let h = harness(vec![Scripted::Respond(Ok(TransportResponse::new(200, vec![0u8, 159, 146, 150])))]);

        let resp = h
            .pipeline
            .download(Method::Get, "/export", None, RequestOptions::new().mask("#page"))
            .await
            .unwrap();
        assert_eq!(resp.body, vec![0u8, 159, 146, 150]);
        assert_eq!(h.pipeline.in_flight(), 0);
        // Raw transfers never touch the mask, so none is left on screen.
        assert!(h.ui.events().is_empty());
    }

    #[tokio::test]
    async fn test_reload_defaults() {
        let h = harness(vec![Scripted::Respond(Err(TransportError::Timeout(Duration::from_secs(1))))]);

        let mut config = OrchestratorConfig::default();
        config.defaults.error_message = "Service unavailable".to_string();
        config.transport.timeout_secs = 5;
        h.pipeline.reload_defaults(&config);
        assert_eq!(h.pipeline.defaults().timeout, Duration::from_secs(5));

        let _ = h.pipeline.get("/a", None, RequestOptions::new()).await;
        assert_eq!(h.ui.events(), vec!["fail:Service unavailable"]);
        assert_eq!(h.transport.last().timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = OrchestratorConfig::default();
        config.transport.timeout_secs = 0;
        let result = Pipeline::new(config, ScriptedTransport::with(vec![]), Capabilities::default());
        assert!(result.is_err());
    }
}
