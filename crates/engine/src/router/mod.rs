pub mod classifier;
pub mod extractor;
pub mod response;

use anyhow::Result;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use switchboard_shared::{RoutedResponse, ToolId};

use crate::backend::{GeminiClient, GenerativeBackend};
use crate::config::EngineConfig;
use crate::tools::{
    OpenWeatherClient, ToolError, ToolErrorKind, ToolOutcome, Toolbelt, WeatherProvider,
};
use classifier::IntentClassifier;
use response::DispatchFailure;

/// Added on top of the HTTP client timeout so the client's own timeout error
/// normally wins and carries the more specific message.
const STAGE_GRACE: Duration = Duration::from_secs(2);

/// Lifecycle of one request. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DispatchState {
    Received,
    Classifying,
    Extracting,
    Executing,
    Completed,
    Failed,
}

impl DispatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DispatchState::Completed | DispatchState::Failed)
    }

    pub fn can_advance_to(&self, next: DispatchState) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            DispatchState::Failed => true,
            // Completed only follows a successful execution.
            DispatchState::Completed => *self == DispatchState::Executing,
            _ => next as u8 == *self as u8 + 1,
        }
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DispatchState::Received => "received",
            DispatchState::Classifying => "classifying",
            DispatchState::Extracting => "extracting",
            DispatchState::Executing => "executing",
            DispatchState::Completed => "completed",
            DispatchState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Per-request bookkeeping. Never shared between requests.
struct Run {
    request_id: String,
    state: DispatchState,
}

impl Run {
    fn new() -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            state: DispatchState::Received,
        }
    }

    fn advance(&mut self, next: DispatchState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "invalid transition {} -> {}",
            self.state,
            next
        );
        log::debug!("[{}] {} -> {}", self.request_id, self.state, next);
        self.state = next;
    }
}

/// Routes one query through classify -> extract -> execute and always yields
/// a well-formed response.
pub struct Dispatcher {
    classifier: IntentClassifier,
    toolbelt: Toolbelt,
    stage_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        backend: Arc<dyn GenerativeBackend>,
        weather: Arc<dyn WeatherProvider>,
        stage_timeout: Duration,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(backend.clone()),
            toolbelt: Toolbelt::new(backend, weather),
            stage_timeout,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let backend = Arc::new(GeminiClient::new(config)?);
        let weather = Arc::new(OpenWeatherClient::new(config)?);
        Ok(Self::new(backend, weather, config.upstream_timeout + STAGE_GRACE))
    }

    pub async fn dispatch(&self, query: &str) -> RoutedResponse {
        let mut run = Run::new();
        log::info!("[{}] Routing query: {}", run.request_id, query);

        let response = match self.run(&mut run, query).await {
            Ok((tool, ToolOutcome::Success(text))) => {
                run.advance(DispatchState::Completed);
                response::completed(query, tool, text)
            }
            Ok((tool, ToolOutcome::Failure(source))) => {
                Self::fail(&mut run, query, DispatchFailure::Execution { tool, source })
            }
            Err(failure) => Self::fail(&mut run, query, failure),
        };

        log::info!(
            "[{}] Responded with tool_used={}",
            run.request_id,
            response.tool_used
        );
        response
    }

    /// Classify, extract, and execute. Runs exactly one tool or none.
    async fn run(
        &self,
        run: &mut Run,
        query: &str,
    ) -> Result<(ToolId, ToolOutcome), DispatchFailure> {
        run.advance(DispatchState::Classifying);
        let classification = self
            .bounded(self.classifier.classify(query))
            .await
            .ok_or_else(|| {
                DispatchFailure::ClassifierUnavailable(format!(
                    "timed out after {}s",
                    self.stage_timeout.as_secs_f32()
                ))
            })??;
        let tool = classification.tool;
        log::info!("[{}] Classified as {}", run.request_id, tool);

        run.advance(DispatchState::Extracting);
        let args = extractor::extract(tool, query, &classification.arguments)
            .map_err(|source| DispatchFailure::Extraction { tool, source })?;

        run.advance(DispatchState::Executing);
        let outcome = self
            .bounded(self.toolbelt.execute(&args))
            .await
            .ok_or_else(|| self.execution_timeout(tool))?;

        Ok((tool, outcome))
    }

    fn fail(run: &mut Run, query: &str, failure: DispatchFailure) -> RoutedResponse {
        run.advance(DispatchState::Failed);
        log::warn!("[{}] Request failed: {}", run.request_id, failure);
        response::failed(query, &failure)
    }

    async fn bounded<T>(&self, fut: impl Future<Output = T>) -> Option<T> {
        tokio::time::timeout(self.stage_timeout, fut).await.ok()
    }

    fn execution_timeout(&self, tool: ToolId) -> DispatchFailure {
        DispatchFailure::Execution {
            tool,
            source: ToolError::new(
                ToolErrorKind::UpstreamUnavailable,
                format!("{} tool timed out after {}s", tool, self.stage_timeout.as_secs_f32()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, FunctionCall, GenerateRequest, GenerateResponse};
    use crate::tools::{CurrentConditions, WeatherError};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use switchboard_shared::ToolUsed;

    /// Answers classification with a fixed function call and plain prompts
    /// with a fixed text.
    struct ScriptedBackend {
        call: Option<(&'static str, Value)>,
        answer: &'static str,
        classify_delay: Duration,
        answer_delay: Duration,
        missing_key: bool,
        calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn routing(name: &'static str, arguments: Value) -> Self {
            Self {
                call: Some((name, arguments)),
                answer: "",
                classify_delay: Duration::ZERO,
                answer_delay: Duration::ZERO,
                missing_key: false,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl GenerativeBackend for ScriptedBackend {
        async fn generate(
            &self,
            request: GenerateRequest,
        ) -> Result<GenerateResponse, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.missing_key {
                return Err(BackendError::MissingApiKey);
            }
            if request.force_function_call {
                tokio::time::sleep(self.classify_delay).await;
                Ok(GenerateResponse {
                    text: None,
                    function_call: self.call.clone().map(|(name, arguments)| FunctionCall {
                        name: name.to_string(),
                        arguments,
                    }),
                })
            } else {
                tokio::time::sleep(self.answer_delay).await;
                Ok(GenerateResponse {
                    text: Some(self.answer.to_string()),
                    function_call: None,
                })
            }
        }
    }

    struct FixedWeather {
        delay: Duration,
        calls: AtomicUsize,
    }

    impl FixedWeather {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                delay,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl WeatherProvider for FixedWeather {
        async fn current(&self, location: &str) -> Result<CurrentConditions, WeatherError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if location != "Paris" {
                return Err(WeatherError::NotFound(location.to_string()));
            }
            Ok(CurrentConditions {
                temperature_c: 18.5,
                description: "clear sky".to_string(),
                location: "Paris".to_string(),
                country: "FR".to_string(),
            })
        }
    }

    type Harness = (Dispatcher, Arc<ScriptedBackend>, Arc<FixedWeather>);

    fn bounded_dispatcher(
        backend: ScriptedBackend,
        weather_delay: Duration,
        stage_timeout: Duration,
    ) -> Harness {
        let backend = Arc::new(backend);
        let weather = FixedWeather::new(weather_delay);
        let dispatcher = Dispatcher::new(backend.clone(), weather.clone(), stage_timeout);
        (dispatcher, backend, weather)
    }

    fn dispatcher(backend: ScriptedBackend) -> Harness {
        bounded_dispatcher(backend, Duration::ZERO, Duration::from_secs(5))
    }

    #[test]
    fn test_state_transitions() {
        use DispatchState::*;
        assert!(Received.can_advance_to(Classifying));
        assert!(Classifying.can_advance_to(Extracting));
        assert!(Extracting.can_advance_to(Executing));
        assert!(Executing.can_advance_to(Completed));
        assert!(Classifying.can_advance_to(Failed));

        assert!(!Received.can_advance_to(Executing));
        assert!(!Extracting.can_advance_to(Completed));
        assert!(!Completed.can_advance_to(Failed));
        assert!(!Failed.can_advance_to(Classifying));
    }

    #[tokio::test]
    async fn test_routes_math() {
        let (dispatcher, _, weather) =
            dispatcher(ScriptedBackend::routing("math", json!({ "expression": "42 * 6" })));

        let response = dispatcher.dispatch("What's 42 * 6?").await;
        assert_eq!(response.query, "What's 42 * 6?");
        assert_eq!(response.tool_used, ToolUsed::Math);
        assert_eq!(response.result, "252");
        assert_eq!(weather.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_math_failure_is_reported_in_result() {
        let (dispatcher, _, _) =
            dispatcher(ScriptedBackend::routing("math", json!({ "expression": "10 / 0" })));

        let response = dispatcher.dispatch("what is 10 divided by 0").await;
        assert_eq!(response.tool_used, ToolUsed::Math);
        assert!(response.result.starts_with("Division by zero"));
    }

    #[tokio::test]
    async fn test_routes_weather() {
        let (dispatcher, _, weather) =
            dispatcher(ScriptedBackend::routing("weather", json!({ "location": "Paris" })));

        let response = dispatcher.dispatch("What's the weather today in Paris?").await;
        assert_eq!(response.tool_used, ToolUsed::Weather);
        assert_eq!(response.result, "It's 18.50°C and clear sky in Paris, FR.");
        assert_eq!(weather.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_location() {
        let (dispatcher, _, _) =
            dispatcher(ScriptedBackend::routing("weather", json!({ "location": "Atlantis" })));

        let response = dispatcher.dispatch("Weather in Atlantis?").await;
        assert_eq!(response.tool_used, ToolUsed::Weather);
        assert!(response.result.starts_with("Location not found"));
    }

    #[tokio::test]
    async fn test_routes_llm() {
        let mut backend =
            ScriptedBackend::routing("llm", json!({ "question": "capital of France" }));
        backend.answer = "The capital of France is Paris.";
        let (dispatcher, backend, _) = dispatcher(backend);

        let response = dispatcher.dispatch("What is the capital of France?").await;
        assert_eq!(response.tool_used, ToolUsed::Llm);
        assert_eq!(response.result, "The capital of France is Paris.");
        // One call to classify, one to answer.
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unroutable_runs_no_tool() {
        let (dispatcher, backend, weather) = dispatcher(ScriptedBackend::routing(
            classifier::UNROUTABLE,
            json!({ "reason": "mixes arithmetic with weather" }),
        ));

        let response = dispatcher
            .dispatch("What is the square root of the weather in Paris?")
            .await;
        assert_eq!(response.tool_used, ToolUsed::Unknown);
        assert_eq!(response.result, "Unable to route query: mixes arithmetic with weather");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert_eq!(weather.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_location_skips_weather_call() {
        let (dispatcher, _, weather) = dispatcher(ScriptedBackend::routing("weather", json!({})));

        let response = dispatcher.dispatch("Is it going to rain?").await;
        assert_eq!(response.tool_used, ToolUsed::Weather);
        assert_eq!(response.result, "Could not determine location from query");
        assert_eq!(weather.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let mut backend = ScriptedBackend::routing("llm", json!({}));
        backend.missing_key = true;
        let (dispatcher, _, weather) = dispatcher(backend);

        let response = dispatcher.dispatch("Who wrote Hamlet?").await;
        assert_eq!(response.tool_used, ToolUsed::Unknown);
        assert!(response.result.starts_with("Classifier unavailable"));
        assert_eq!(weather.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_classifier_timeout() {
        let mut backend = ScriptedBackend::routing("math", json!({ "expression": "1 + 1" }));
        backend.classify_delay = Duration::from_secs(2);
        let (dispatcher, _, _) =
            bounded_dispatcher(backend, Duration::ZERO, Duration::from_millis(50));

        let response = dispatcher.dispatch("1 + 1").await;
        assert_eq!(response.tool_used, ToolUsed::Unknown);
        assert!(response.result.starts_with("Classifier unavailable: timed out"));
    }

    #[tokio::test]
    async fn test_stalled_weather_provider_times_out() {
        let backend = ScriptedBackend::routing("weather", json!({ "location": "Paris" }));
        let (dispatcher, _, weather) =
            bounded_dispatcher(backend, Duration::from_secs(10), Duration::from_millis(100));

        let started = std::time::Instant::now();
        let response = dispatcher.dispatch("What's the weather in Paris?").await;

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(response.tool_used, ToolUsed::Weather);
        assert_eq!(response.result, "Upstream unavailable: weather tool timed out after 0.1s");
        assert_eq!(weather.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stalled_answer_times_out() {
        let mut backend = ScriptedBackend::routing("llm", json!({}));
        backend.answer = "too late";
        backend.answer_delay = Duration::from_secs(10);
        let (dispatcher, _, _) =
            bounded_dispatcher(backend, Duration::ZERO, Duration::from_millis(100));

        let started = std::time::Instant::now();
        let response = dispatcher.dispatch("Who wrote Hamlet?").await;

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(response.tool_used, ToolUsed::Llm);
        assert!(response.result.starts_with("Upstream unavailable: llm tool timed out"));
    }
}
