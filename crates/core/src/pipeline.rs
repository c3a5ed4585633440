//! Validation pipeline wrapped around every request handler.
//!
//! Each request type registers zero or more validator groups. All groups
//! run, possibly concurrently, and their failures are merged. A non-empty
//! union stops the request before the handler is invoked; an empty union
//! (or no registered groups) passes the request through unchanged.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use validator::Validate;

use crate::clock::Clock;
use crate::outcome::Outcome;
use crate::validation::{RuleSet, ValidationContext, ValidationErrors};

/// A command or query routed through a pipeline.
pub trait Request: Send + Sync {
    type Response: Send;

    /// Name used in logs.
    const NAME: &'static str;
}

/// Executes a request that has passed validation.
#[async_trait]
pub trait Handler<R: Request>: Send + Sync {
    async fn handle(&self, request: R, cancel: &CancellationToken) -> Outcome<R::Response>;
}

/// One group of validation rules for requests of type `R`.
pub trait RequestValidator<R>: Send + Sync {
    fn name(&self) -> &'static str;

    fn validate(&self, request: &R, ctx: &ValidationContext) -> ValidationErrors;
}

/// Rejection returned when any registered group reports a failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid request: {errors}")]
pub struct InvalidRequest {
    pub errors: ValidationErrors,
}

/// Result of sending a request through a pipeline.
pub type Dispatch<T> = Result<Outcome<T>, InvalidRequest>;

impl<R: Send + Sync> RequestValidator<R> for RuleSet<R> {
    fn name(&self) -> &'static str {
        RuleSet::name(self)
    }

    fn validate(&self, request: &R, ctx: &ValidationContext) -> ValidationErrors {
        self.evaluate(request, ctx)
    }
}

/// Adapter for constraints declared with `#[derive(Validate)]`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Structural;

impl<R: Validate + Send + Sync> RequestValidator<R> for Structural {
    fn name(&self) -> &'static str {
        "structural"
    }

    fn validate(&self, request: &R, _ctx: &ValidationContext) -> ValidationErrors {
        match request.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors.into(),
        }
    }
}

/// Runs a validator written for `T` against the `T` embedded in `R`.
pub struct Projected<R, T, V> {
    project: fn(&R) -> &T,
    inner: V,
    _request: PhantomData<fn(&R)>,
}

impl<R, T, V> Projected<R, T, V> {
    pub fn new(project: fn(&R) -> &T, inner: V) -> Self {
        Self {
            project,
            inner,
            _request: PhantomData,
        }
    }
}

impl<R, T, V> RequestValidator<R> for Projected<R, T, V>
where
    R: Send + Sync,
    T: Send + Sync,
    V: RequestValidator<T>,
{
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn validate(&self, request: &R, ctx: &ValidationContext) -> ValidationErrors {
        self.inner.validate((self.project)(request), ctx)
    }
}

/// Validator groups registered for one request type.
pub struct ValidationPipeline<R> {
    validators: Vec<Box<dyn RequestValidator<R>>>,
    clock: Arc<dyn Clock>,
}

impl<R: Request> ValidationPipeline<R> {
    /// A pipeline with no groups: every request passes through.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            validators: Vec::new(),
            clock,
        }
    }

    pub fn register(mut self, validator: impl RequestValidator<R> + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    pub fn validator_count(&self) -> usize {
        self.validators.len()
    }

    /// Run every group and merge their failures.
    pub async fn validate(&self, request: &R) -> ValidationErrors {
        let ctx = ValidationContext::new(self.clock.now());
        let ctx = &ctx;
        let results = join_all(self.validators.iter().map(|validator| async move {
            (validator.name(), validator.validate(request, ctx))
        }))
        .await;

        let mut errors = ValidationErrors::new();
        for (group, group_errors) in results {
            if !group_errors.is_empty() {
                tracing::debug!(
                    request = R::NAME,
                    group,
                    count = group_errors.len(),
                    "Validator group failed"
                );
            }
            errors.merge(group_errors);
        }
        errors
    }

    /// Validate `request` and, if it passes, hand it to `handler`.
    pub async fn send<H>(
        &self,
        request: R,
        handler: &H,
        cancel: &CancellationToken,
    ) -> Dispatch<R::Response>
    where
        H: Handler<R> + ?Sized,
    {
        if !self.validators.is_empty() {
            let errors = self.validate(&request).await;
            if !errors.is_empty() {
                tracing::warn!(
                    request = R::NAME,
                    failures = errors.len(),
                    "Rejected invalid request"
                );
                return Err(InvalidRequest { errors });
            }
        }
        Ok(handler.handle(request, cancel).await)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::clock::FixedClock;

    #[derive(Validate)]
    struct Echo {
        #[validate(length(min = 2, message = "text too short"))]
        text: String,
        value: i32,
    }

    impl Request for Echo {
        type Response = String;
        const NAME: &'static str = "echo";
    }

    #[derive(Default)]
    struct CountingHandler {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Handler<Echo> for CountingHandler {
        async fn handle(&self, request: Echo, _cancel: &CancellationToken) -> Outcome<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Outcome::Success(request.text)
        }
    }

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()))
    }

    fn value_rules() -> RuleSet<Echo> {
        RuleSet::new("echo").rule("value", "value must be positive", |e: &Echo, _| e.value > 0)
    }

    #[tokio::test]
    async fn passthrough_without_validators() {
        let pipeline = ValidationPipeline::<Echo>::new(clock());
        let handler = CountingHandler::default();
        let request = Echo {
            text: String::new(),
            value: -1,
        };

        let result = pipeline
            .send(request, &handler, &CancellationToken::new())
            .await;

        assert_eq!(result, Ok(Outcome::Success(String::new())));
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn union_of_all_groups_is_reported() {
        let pipeline = ValidationPipeline::<Echo>::new(clock())
            .register(Structural)
            .register(value_rules());
        let handler = CountingHandler::default();

        let result = pipeline
            .send(
                Echo {
                    text: "a".into(),
                    value: 0,
                },
                &handler,
                &CancellationToken::new(),
            )
            .await;

        let invalid = result.unwrap_err();
        assert_eq!(invalid.errors.messages_for("text"), ["text too short"]);
        assert_eq!(invalid.errors.messages_for("value"), ["value must be positive"]);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0, "handler must not run");
    }

    #[tokio::test]
    async fn valid_request_reaches_handler() {
        let pipeline = ValidationPipeline::<Echo>::new(clock())
            .register(Structural)
            .register(value_rules());
        let handler = CountingHandler::default();

        let result = pipeline
            .send(
                Echo {
                    text: "hello".into(),
                    value: 3,
                },
                &handler,
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(result, Ok(Outcome::Success("hello".to_string())));
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn projected_validator_reads_inner_value() {
        struct Wrapper {
            inner: Echo,
        }
        impl Request for Wrapper {
            type Response = ();
            const NAME: &'static str = "wrapper";
        }
        fn inner(wrapper: &Wrapper) -> &Echo {
            &wrapper.inner
        }

        let pipeline = ValidationPipeline::<Wrapper>::new(clock())
            .register(Projected::new(inner, value_rules()));
        let errors = pipeline
            .validate(&Wrapper {
                inner: Echo {
                    text: "ok".into(),
                    value: -5,
                },
            })
            .await;
        assert!(errors.has_field("value"));
    }
}
