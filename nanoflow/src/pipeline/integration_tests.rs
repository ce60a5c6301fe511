//! End-to-end tests for pipeline execution.

#[cfg(test)]
mod tests {
    use crate::adapters::{Adapter, Disposable, FeedbackSink, InputAdapter, OutputAdapter};
    use crate::config::{Configuration, InMemoryConfiguration};
    use crate::context::{ExecutionContext, OUTPUT_KEY, PIPELINE_NAME_KEY};
    use crate::errors::NanoflowError;
    use crate::events::{names, CollectingEventSink, EventSink};
    use crate::nanos::{FnNano, Nano};
    use crate::pipeline::{LifecycleState, Pipeline, PipelineHandle};
    use crate::testing::{
        payload, CallLog, FailingNano, MockInputAdapter, MockOutputAdapter, RecordingFeedback,
        RecordingNano, SlowNano, WriteNano,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    struct Harness {
        input: Arc<MockInputAdapter>,
        output: Arc<MockOutputAdapter>,
        events: Arc<CollectingEventSink>,
        pipeline: Arc<Pipeline>,
    }

    fn harness(name: &str, nanos: Vec<Arc<dyn Nano>>) -> Harness {
        harness_with_output(name, nanos, MockOutputAdapter::new())
    }

    fn harness_with_output(name: &str, nanos: Vec<Arc<dyn Nano>>, output: MockOutputAdapter) -> Harness {
        let input = Arc::new(MockInputAdapter::new());
        let output = Arc::new(output);
        let events = Arc::new(CollectingEventSink::new());
        let config: Arc<dyn Configuration> = Arc::new(InMemoryConfiguration::new());

        let pipeline = Pipeline::builder(name, config)
            .nanos(nanos)
            .event_sink(events.clone() as Arc<dyn EventSink>)
            .build(input.clone() as Arc<dyn InputAdapter>, output.clone() as Arc<dyn OutputAdapter>);

        Harness {
            input,
            output,
            events,
            pipeline,
        }
    }

    #[tokio::test]
    async fn test_greeting_pipeline_replaces_body() {
        let h = harness(
            "test",
            vec![Arc::new(FnNano::new("greet", |ctx: &ExecutionContext| -> Result<(), NanoflowError> {
                ctx.set(OUTPUT_KEY, json!({"greeting": "hi"}))?;
                Ok(())
            }))],
        );

        let mut message = payload(json!({"name": "world"}));
        h.pipeline.execute(&mut message).await;

        assert_eq!(message.data, json!({"greeting": "hi"}));
        let sent = h.output.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].data, json!({"greeting": "hi"}));
        assert_eq!(h.output.feedback_count(), 1);
        assert_eq!(h.events.count_of(names::PIPELINE_EXECUTION_COMPLETED), 1);
    }

    #[tokio::test]
    async fn test_nanos_run_in_order_before_send() {
        let log = CallLog::new();
        let nanos: Vec<Arc<dyn Nano>> = ["a", "b", "c"]
            .into_iter()
            .map(|n| Arc::new(RecordingNano::with_log(n, log.clone())) as Arc<dyn Nano>)
            .collect();
        let h = harness_with_output("ordered", nanos, MockOutputAdapter::new().with_log(log.clone()));

        h.pipeline.execute(&mut payload(json!(1))).await;

        assert_eq!(log.entries(), vec!["a", "b", "c", "send", "feedback"]);
    }

    #[tokio::test]
    async fn test_body_unchanged_without_output() {
        let h = harness("passthrough", vec![Arc::new(WriteNano::new("scratch", "tmp", json!(true)))]);

        let body = json!({"id": 7, "tags": ["x"]});
        let mut message = payload(body.clone());
        h.pipeline.execute(&mut message).await;

        assert_eq!(message.data, body);
        assert_eq!(h.output.sent()[0].data, body);
    }

    #[tokio::test]
    async fn test_failing_nano_skips_send_and_feeds_back_original() {
        let log = CallLog::new();
        let after = Arc::new(RecordingNano::with_log("after", log.clone()));
        let h = harness(
            "failing",
            vec![
                Arc::new(WriteNano::output("out", json!("replaced"))),
                Arc::new(FailingNano::new("boom", "nano exploded")),
                after.clone(),
            ],
        );

        let mut message = payload(json!({"original": true}));
        h.pipeline.execute(&mut message).await;

        assert_eq!(h.output.sent_count(), 0);
        assert_eq!(after.call_count(), 0);
        let feedback = h.output.feedback();
        assert_eq!(feedback.len(), 1);
        assert_eq!(feedback[0].data, json!({"original": true}));

        let failed = h.events.events_of_type(names::PIPELINE_EXECUTION_FAILED);
        assert_eq!(failed.len(), 1);
        let data = failed[0].1.clone().unwrap();
        assert_eq!(
            data["error"]["message"],
            "Pipeline failing failed to execute with nano exploded"
        );
        assert_eq!(data["error"]["type"], "NanoExecutionError");
    }

    #[tokio::test]
    async fn test_send_failure_restores_body_before_feedback() {
        let h = harness("send-fails", vec![Arc::new(WriteNano::output("out", json!("new")))]);
        h.output.set_fail_send(true);

        let mut message = payload(json!("old"));
        h.pipeline.execute(&mut message).await;

        assert_eq!(message.data, json!("old"));
        assert_eq!(h.output.feedback()[0].data, json!("old"));
        assert_eq!(h.events.count_of(names::PIPELINE_EXECUTION_FAILED), 1);
    }

    #[tokio::test]
    async fn test_duplicate_key_is_a_failure() {
        let h = harness(
            "dupes",
            vec![
                Arc::new(WriteNano::new("first", "k", json!(1))),
                Arc::new(WriteNano::new("second", "k", json!(2))),
            ],
        );

        h.pipeline.execute(&mut payload(json!(null))).await;

        assert_eq!(h.output.sent_count(), 0);
        assert_eq!(h.output.feedback_count(), 1);
        let failed = h.events.events_of_type(names::PIPELINE_EXECUTION_FAILED);
        let message = failed[0].1.as_ref().unwrap()["error"]["message"].clone();
        assert_eq!(message, "Pipeline dupes failed to execute with Key already exists: 'k'");
    }

    #[tokio::test]
    async fn test_pipeline_name_key_is_reserved() {
        let h = harness(
            "reserved",
            vec![Arc::new(WriteNano::new("clobber", PIPELINE_NAME_KEY, json!("other")))],
        );

        h.pipeline.execute(&mut payload(json!(0))).await;

        assert_eq!(h.output.sent_count(), 0);
        assert_eq!(h.events.count_of(names::PIPELINE_EXECUTION_FAILED), 1);
    }

    #[tokio::test]
    async fn test_execution_context_recorded_in_request() {
        let h = harness("history", vec![Arc::new(WriteNano::new("w", "seen", json!(true)))]);

        let mut message = payload(json!({}));
        h.pipeline.execute(&mut message).await;

        let history = message.context.execution_contexts();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].pipeline_name(), Some("history".to_string()));
        assert_eq!(history[0].get("seen"), Some(json!(true)));
        assert!(history[0].is_complete());
        assert!(!history[0].id().is_empty());
    }

    #[tokio::test]
    async fn test_explicit_feedback_overrides_output() {
        let input = Arc::new(MockInputAdapter::new());
        let output = Arc::new(MockOutputAdapter::new());
        let feedback = Arc::new(RecordingFeedback::new());

        let pipeline = Pipeline::builder("explicit", Arc::new(InMemoryConfiguration::new()))
            .feedback(feedback.clone() as Arc<dyn FeedbackSink>)
            .build(input, output.clone() as Arc<dyn OutputAdapter>);

        pipeline.execute(&mut payload(json!(1))).await;

        assert_eq!(feedback.count(), 1);
        assert_eq!(output.feedback_count(), 0);
        assert_eq!(output.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_feedback_is_reported() {
        let h = harness_with_output("unwired", vec![], MockOutputAdapter::without_feedback());
        assert!(!h.pipeline.has_feedback());

        h.pipeline.execute(&mut payload(json!(1))).await;
        assert_eq!(h.output.sent_count(), 1);

        let err = h.pipeline.send_feedback(&payload(json!(1))).await.unwrap_err();
        assert!(matches!(err, NanoflowError::FeedbackNotConfigured(_)));
        assert!(err.to_string().starts_with("No feedback set for pipeline unwired"));
    }

    #[tokio::test]
    async fn test_load_connects_and_registers_handler() {
        let h = harness("loaded", vec![Arc::new(WriteNano::output("out", json!("via-input")))]);

        h.pipeline.load().await.unwrap();
        assert_eq!(h.input.connect_count(), 1);
        assert_eq!(h.output.connect_count(), 1);
        assert!(h.input.has_handler());

        h.input.deliver(payload(json!("in"))).await.unwrap();
        assert_eq!(h.output.sent()[0].data, json!("via-input"));
    }

    #[tokio::test]
    async fn test_load_propagates_connect_failure() {
        let h = harness("broken", vec![]);
        h.input.set_fail_connect(true);

        assert!(h.pipeline.load().await.is_err());
        assert_eq!(h.output.connect_count(), 0);
        assert!(!h.input.has_handler());
    }

    #[tokio::test]
    async fn test_adapters_attached_at_construction() {
        let h = harness("attached", vec![]);

        assert_eq!(h.input.binding().pipeline().unwrap().name(), "attached");
        assert!(h.output.binding().config().is_ok());
        assert_eq!(h.pipeline.schema().input, h.input.schema());
        assert_eq!(h.pipeline.schema().output, h.output.schema());
    }

    #[tokio::test]
    async fn test_add_nanos_appends() {
        let h = harness("growing", vec![Arc::new(RecordingNano::new("one"))]);
        h.pipeline.add_nanos(vec![Arc::new(RecordingNano::new("two"))]);

        assert_eq!(h.pipeline.nano_names(), vec!["one", "two"]);
        assert_eq!(h.pipeline.nano_count(), 2);
    }

    #[tokio::test]
    async fn test_nanos_added_mid_execution_do_not_affect_it() {
        let late = Arc::new(RecordingNano::new("late"));
        let h = harness("snapshot", vec![Arc::new(SlowNano::with_delay_ms("slow", 30))]);

        let pipeline = h.pipeline.clone();
        let running = tokio::spawn(async move {
            let mut message = payload(json!(1));
            pipeline.execute(&mut message).await;
        });

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        h.pipeline.add_nanos(vec![late.clone()]);
        running.await.unwrap();

        assert_eq!(late.call_count(), 0);
        h.pipeline.execute(&mut payload(json!(2))).await;
        assert_eq!(late.call_count(), 1);
    }

    #[tokio::test]
    async fn test_dispose_idle_releases_immediately_and_denies() {
        let h = harness("idle", vec![]);

        h.pipeline.dispose().await.unwrap();
        assert_eq!(h.pipeline.lifecycle_state(), LifecycleState::Released);
        assert_eq!(h.input.dispose_count(), 1);
        assert_eq!(h.output.dispose_count(), 1);
        assert!(!h.input.binding().is_attached());

        h.pipeline.execute(&mut payload(json!(1))).await;
        assert_eq!(h.output.sent_count(), 0);
        assert_eq!(h.output.feedback_count(), 0);
        assert_eq!(h.events.count_of(names::PIPELINE_EXECUTION_DENIED), 1);
    }

    #[tokio::test]
    async fn test_dispose_waits_for_in_flight_execution() {
        let h = harness("busy", vec![Arc::new(SlowNano::with_delay_ms("slow", 30))]);

        let pipeline = h.pipeline.clone();
        let running = tokio::spawn(async move {
            let mut message = payload(json!("in-flight"));
            pipeline.execute(&mut message).await;
        });

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        h.pipeline.dispose().await.unwrap();
        assert_eq!(h.pipeline.lifecycle_state(), LifecycleState::Draining);
        assert_eq!(h.input.dispose_count(), 0);

        running.await.unwrap();
        assert_eq!(h.output.sent_count(), 1);
        assert_eq!(h.pipeline.lifecycle_state(), LifecycleState::Released);
        assert_eq!(h.input.dispose_count(), 1);
        assert_eq!(h.output.dispose_count(), 1);
        assert_eq!(h.events.count_of(names::PIPELINE_RELEASED), 1);
    }

    #[tokio::test]
    async fn test_concurrent_executions_interleave() {
        let log = CallLog::new();
        let h = harness_with_output(
            "concurrent",
            vec![
                Arc::new(RecordingNano::with_log("before", log.clone())) as Arc<dyn Nano>,
                Arc::new(SlowNano::with_delay_ms("slow", 20)),
                Arc::new(RecordingNano::with_log("after", log.clone())),
            ],
            MockOutputAdapter::new(),
        );

        let mut first = payload(json!("first"));
        let mut second = payload(json!("second"));
        tokio::join!(h.pipeline.execute(&mut first), h.pipeline.execute(&mut second));

        assert_eq!(log.entries(), vec!["before", "before", "after", "after"]);
        assert_eq!(h.output.sent_count(), 2);
        assert_eq!(h.pipeline.lifecycle_state(), LifecycleState::Active);
    }

    #[tokio::test]
    async fn test_terminate_terminates_both_adapters() {
        let h = harness("terminated", vec![]);

        h.pipeline.terminate().await.unwrap();

        assert_eq!(h.input.terminate_count(), 1);
        assert_eq!(h.output.terminate_count(), 1);
        assert_eq!(h.pipeline.lifecycle_state(), LifecycleState::Released);

        h.pipeline.execute(&mut payload(json!(1))).await;
        assert_eq!(h.output.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_nano_reads_live_configuration() {
        let input = Arc::new(MockInputAdapter::new());
        let output = Arc::new(MockOutputAdapter::new());
        let config = Arc::new(InMemoryConfiguration::new().with_value("greeting", json!("hello")));

        #[derive(Debug)]
        struct ConfigNano;

        #[async_trait::async_trait]
        impl Nano for ConfigNano {
            fn name(&self) -> &str {
                "config"
            }

            async fn execute(
                &self,
                ctx: &ExecutionContext,
                config: &dyn Configuration,
            ) -> Result<(), NanoflowError> {
                let pipeline = ctx.pipeline_name();
                let value = config.get_value("greeting", pipeline.as_deref()).await?;
                ctx.set(OUTPUT_KEY, value)?;
                Ok(())
            }
        }

        let pipeline = Pipeline::builder("configured", config.clone() as Arc<dyn Configuration>)
            .nano(Arc::new(ConfigNano))
            .build(input, output.clone() as Arc<dyn OutputAdapter>);

        pipeline.execute(&mut payload(json!(null))).await;

        assert_eq!(output.sent()[0].data, json!("hello"));
        assert_eq!(config.consumer_map(&["greeting".to_string()]), vec!["configured"]);
    }
}
