mod support;

use std::sync::{Arc, Mutex};

use smithy_orchestrator::prelude::*;
use smithy_orchestrator::telemetry::{SpanStatus, metrics};
use support::{RecordingLogger, RecordingStrategy, ScriptedTransport, builder, fast_retries};

fn telemetry(exporter: &InMemoryExporter) -> Telemetry {
    Telemetry::new(
        TelemetryConfig::builder()
            .enabled(true)
            .service_name("Items")
            .operation_name("GetItem")
            .build(),
    )
    .with_exporter(exporter.clone())
}

#[tokio::test]
async fn test_single_successful_attempt() {
    let transport = ScriptedTransport::new().respond(StatusCode::OK, "widget");
    let exporter = InMemoryExporter::new();
    let orchestrator = builder(transport.clone())
        .with_retry_strategy(fast_retries(3))
        .with_telemetry(telemetry(&exporter))
        .build()
        .unwrap();

    assert_eq!(orchestrator.execute(7).await.unwrap(), "widget");
    assert_eq!(transport.requests().len(), 1);
    assert_eq!(transport.requests()[0].path, "/items/7");
    assert_eq!(exporter.metric_total(metrics::ATTEMPTS), 1.0);
    assert!(exporter.metrics(metrics::ERRORS).is_empty());
    assert_eq!(exporter.metrics(metrics::DURATION).len(), 1);
}

#[tokio::test]
async fn test_retry_then_success() {
    let transport = ScriptedTransport::new()
        .respond(StatusCode::SERVICE_UNAVAILABLE, "busy")
        .respond(StatusCode::OK, "widget");
    let exporter = InMemoryExporter::new();
    let executions = Arc::new(Mutex::new(0));
    let attempts = Arc::new(Mutex::new(0));
    let (e, a) = (executions.clone(), attempts.clone());

    let orchestrator = builder(transport.clone())
        .with_retry_strategy(fast_retries(3))
        .with_telemetry(telemetry(&exporter))
        .with_interceptor(
            HookInterceptor::<u32, String>::new("counter")
                .with_read_before_execution(move |_| {
                    *e.lock().unwrap() += 1;
                    Ok(())
                })
                .with_read_before_attempt(move |_| {
                    *a.lock().unwrap() += 1;
                    Ok(())
                }),
        )
        .build()
        .unwrap();

    assert_eq!(orchestrator.execute(1).await.unwrap(), "widget");
    assert_eq!(*executions.lock().unwrap(), 1);
    assert_eq!(*attempts.lock().unwrap(), 2);
    assert_eq!(transport.requests().len(), 2);

    assert_eq!(exporter.metric_total(metrics::ATTEMPTS), 2.0);
    let errors = exporter.metrics(metrics::ERRORS);
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].attributes.get("error.type").map(String::as_str),
        Some("response")
    );

    let spans = exporter.finished_spans();
    assert_eq!(spans.len(), 3);
    assert_eq!(spans[0].status, SpanStatus::Error);
    assert_eq!(spans[1].status, SpanStatus::Ok);
    let call = &spans[2];
    assert_eq!(call.name, "Items.GetItem");
    assert_eq!(call.status, SpanStatus::Ok);
    assert!(spans[..2]
        .iter()
        .all(|attempt| attempt.parent_span_id.as_deref() == Some(call.span_id.as_str())));
}

#[tokio::test]
async fn test_exhausted_retries_return_last_attempt_error() {
    let transport = ScriptedTransport::new()
        .fail(OrchestratorError::transport("attempt 1"))
        .fail(OrchestratorError::transport("attempt 2"))
        .fail(OrchestratorError::transport("attempt 3"))
        .respond(StatusCode::OK, "never sent");
    let orchestrator = builder(transport.clone())
        .with_retry_strategy(fast_retries(3))
        .build()
        .unwrap();

    let err = orchestrator.execute(1).await.unwrap_err();
    assert_eq!(err.to_string(), "transport error: attempt 3");
    assert_eq!(transport.requests().len(), 3);
}

#[tokio::test]
async fn test_non_retryable_error_stops_after_one_attempt() {
    let transport = ScriptedTransport::new()
        .respond(StatusCode::NOT_FOUND, "missing")
        .respond(StatusCode::OK, "never sent");
    let orchestrator = builder(transport.clone())
        .with_retry_strategy(fast_retries(3))
        .build()
        .unwrap();

    let err = orchestrator.execute(1).await.unwrap_err();
    assert_eq!(err.status_code(), Some(404));
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_without_retry_strategy_makes_one_attempt() {
    let transport = ScriptedTransport::new()
        .fail(OrchestratorError::transport("connection reset"))
        .respond(StatusCode::OK, "never sent");
    let orchestrator = builder(transport.clone()).build().unwrap();

    let err = orchestrator.execute(1).await.unwrap_err();
    assert_eq!(err.kind(), "transport");
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_custom_classification_retries_not_found() {
    let transport = ScriptedTransport::new()
        .respond(StatusCode::NOT_FOUND, "not yet")
        .respond(StatusCode::OK, "eventually");
    let orchestrator = builder(transport.clone())
        .with_retry_strategy(fast_retries(3))
        .with_retry_error_info_provider(|err| match err.status_code() {
            Some(404) => Some(RetryErrorInfo::new(RetryErrorType::Transient)),
            _ => default_retry_error_info(err),
        })
        .build()
        .unwrap();

    assert_eq!(orchestrator.execute(1).await.unwrap(), "eventually");
}

#[tokio::test]
async fn test_partition_resolution() {
    let strategy = Arc::new(RecordingStrategy::new(fast_retries(3)));
    let transport = ScriptedTransport::new()
        .respond(StatusCode::OK, "by host")
        .respond(StatusCode::OK, "by attribute");
    let orchestrator = builder(transport)
        .with_shared_retry_strategy(strategy.clone())
        .build()
        .unwrap();

    orchestrator.execute(1).await.unwrap();
    orchestrator
        .execute_with(
            1,
            Attributes::new().with(&keys::PARTITION_ID, "tenant-a".to_string()),
        )
        .await
        .unwrap();
    // An empty partition id falls back to the host.
    orchestrator
        .execute_with(1, Attributes::new().with(&keys::PARTITION_ID, String::new()))
        .await
        .unwrap_err();

    assert_eq!(
        strategy.scopes(),
        vec!["items.example.com", "tenant-a", "items.example.com"]
    );
}

#[tokio::test]
async fn test_missing_partition_fails_before_any_attempt() {
    let transport = ScriptedTransport::new().respond(StatusCode::OK, "never sent");
    let attempts = Arc::new(Mutex::new(0));
    let counter = attempts.clone();
    let orchestrator = Orchestrator::<u32, String>::builder()
        .with_deserializer(support::text_deserializer())
        .with_transport(transport.clone())
        .with_retry_strategy(fast_retries(3))
        .with_interceptor(
            HookInterceptor::<u32, String>::new("attempts").with_read_before_attempt(move |_| {
                *counter.lock().unwrap() += 1;
                Ok(())
            }),
        )
        .build()
        .unwrap();

    let err = orchestrator.execute(1).await.unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(*attempts.lock().unwrap(), 0);
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_attempts_start_from_the_pre_loop_request() {
    let transport = ScriptedTransport::new()
        .respond(StatusCode::INTERNAL_SERVER_ERROR, "oops")
        .respond(StatusCode::OK, "done");
    let leaked = Arc::new(Mutex::new(Vec::new()));
    let sink = leaked.clone();

    let orchestrator = builder(transport.clone())
        .with_retry_strategy(fast_retries(3))
        .with_signer(ApplySignerFn::new(|request: HttpRequest, _, _| {
            request.with_header("x-signed", "1")
        }))
        .with_interceptor(
            HookInterceptor::<u32, String>::new("isolation")
                .with_modify_before_retry_loop(|ctx| {
                    ctx.request_mut().set_header("x-loop", "1")?;
                    Ok(())
                })
                .with_modify_before_signing(move |ctx| {
                    sink.lock()
                        .unwrap()
                        .push(ctx.request().header("x-signed").is_some());
                    Ok(())
                }),
        )
        .build()
        .unwrap();

    orchestrator.execute(1).await.unwrap();
    assert_eq!(*leaked.lock().unwrap(), vec![false, false]);
    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests
        .iter()
        .all(|r| r.header("x-loop") == Some("1") && r.header("x-signed") == Some("1")));
}

#[tokio::test]
async fn test_completion_hooks_have_the_final_word() {
    let transport = ScriptedTransport::new().respond(StatusCode::OK, "widget");
    let orchestrator = builder(transport)
        .with_interceptor(
            HookInterceptor::<u32, String>::new("rewrite").with_modify_before_completion(|ctx| {
                if let Ok(output) = ctx.output() {
                    let upper = output.to_uppercase();
                    ctx.update_output(Ok(upper));
                }
                Ok(())
            }),
        )
        .build()
        .unwrap();

    assert_eq!(orchestrator.execute(1).await.unwrap(), "WIDGET");
}

#[tokio::test]
async fn test_deserialization_error_is_visible_after_deserialization() {
    let transport = ScriptedTransport::new().respond(StatusCode::BAD_REQUEST, "bad input");
    let seen = Arc::new(Mutex::new(None));
    let sink = seen.clone();
    let orchestrator = builder(transport)
        .with_interceptor(
            HookInterceptor::<u32, String>::new("observer").with_read_after_deserialization(
                move |ctx| {
                    *sink.lock().unwrap() = ctx.output().err().and_then(|e| e.status_code());
                    Ok(())
                },
            ),
        )
        .build()
        .unwrap();

    let err = orchestrator.execute(1).await.unwrap_err();
    assert_eq!(err.status_code(), Some(400));
    assert_eq!(*seen.lock().unwrap(), Some(400));
}

#[tokio::test]
async fn test_interceptor_errors_are_aggregated() {
    let logger = Arc::new(RecordingLogger::default());
    let fail = |message: &'static str| {
        HookInterceptor::<u32, String>::new(message)
            .with_read_before_execution(move |_| Err(BoxError::from(message)))
    };
    let transport = ScriptedTransport::new().respond(StatusCode::OK, "never sent");
    let orchestrator = builder(transport.clone())
        .with_attribute(&keys::LOGGER, logger.clone() as Arc<dyn Logger>)
        .with_interceptor(fail("e1"))
        .with_interceptor(fail("e2"))
        .with_interceptor(fail("e3"))
        .build()
        .unwrap();

    let err = orchestrator.execute(1).await.unwrap_err();
    assert_eq!(err.hook(), Some(Hook::ReadBeforeExecution));
    assert!(err.to_string().ends_with("e3"));
    let logged = logger.entries.lock().unwrap().clone();
    assert_eq!(logged.len(), 2);
    assert!(logged[0].ends_with("e1"));
    assert!(logged[1].ends_with("e2"));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_presign_with_bearer_auth() {
    let transport = ScriptedTransport::new();
    let orchestrator = builder(transport.clone())
        .with_endpoint_applier(ResolvedEndpointApplier::new(
            StaticEndpointResolver::parse("https://presign.example.com/v1").unwrap(),
        ))
        .with_attribute(
            &keys::AUTH_SCHEME_RESOLVER,
            Arc::new(StaticAuthSchemeResolver::new(vec![AuthOption::new(
                smithy_orchestrator::auth::HTTP_BEARER_AUTH_SCHEME_ID,
            )])) as Arc<dyn AuthSchemeResolver>,
        )
        .with_attribute(&keys::AUTH_SCHEMES, AuthSchemes::new().with(BearerAuthScheme))
        .with_attribute(
            &keys::IDENTITY_RESOLVERS,
            IdentityResolvers::new().with(
                smithy_orchestrator::auth::HTTP_BEARER_AUTH_SCHEME_ID,
                StaticIdentityResolver::new(Identity::new(BearerToken::new("t0ken"), None)),
            ),
        )
        .build()
        .unwrap();

    let request = orchestrator
        .presign_request(9, Attributes::new())
        .await
        .unwrap();
    assert_eq!(request.host, "presign.example.com");
    assert_eq!(request.path, "/v1/items/9");
    assert_eq!(request.header("authorization"), Some("Bearer t0ken"));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_presign_propagates_hook_errors() {
    let orchestrator = builder(ScriptedTransport::new())
        .with_interceptor(
            HookInterceptor::<u32, String>::new("deny")
                .with_read_before_signing(|_| Err(BoxError::from("presigning disabled"))),
        )
        .build()
        .unwrap();

    let err = orchestrator
        .presign_request(1, Attributes::new())
        .await
        .unwrap_err();
    assert_eq!(err.hook(), Some(Hook::ReadBeforeSigning));
}

#[tokio::test]
async fn test_concurrent_calls_share_one_orchestrator() {
    let transport = ScriptedTransport::new()
        .respond(StatusCode::OK, "a")
        .respond(StatusCode::OK, "b")
        .respond(StatusCode::OK, "c");
    let orchestrator = Arc::new(
        builder(transport.clone())
            .with_retry_strategy(fast_retries(3))
            .build()
            .unwrap(),
    );

    let handles: Vec<_> = (0..3)
        .map(|id| {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.execute(id).await })
        })
        .collect();
    let mut outputs = Vec::new();
    for handle in handles {
        outputs.push(handle.await.unwrap().unwrap());
    }
    outputs.sort();
    assert_eq!(outputs, vec!["a", "b", "c"]);
    assert_eq!(transport.requests().len(), 3);
}
