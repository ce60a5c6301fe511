//! Cross-cutting tests for the context module.

#[cfg(test)]
mod tests {
    use crate::context::{ExecutionContext, RequestContext, OUTPUT_KEY, PIPELINE_NAME_KEY};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_reserved_keys() {
        assert_eq!(PIPELINE_NAME_KEY, "pipelineName");
        assert_eq!(OUTPUT_KEY, "output");
    }

    #[test]
    fn test_pipeline_name_helper() {
        let request = Arc::new(RequestContext::new("origin"));
        let ctx = ExecutionContext::new("origin", &request);
        assert_eq!(ctx.pipeline_name(), None);

        ctx.set(PIPELINE_NAME_KEY, json!("orders")).unwrap();
        assert_eq!(ctx.pipeline_name(), Some("orders".to_string()));
    }

    #[test]
    fn test_concurrent_writers_only_one_wins() {
        let request = Arc::new(RequestContext::new("origin"));
        let ctx = Arc::new(ExecutionContext::new("origin", &request));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ctx = ctx.clone();
                std::thread::spawn(move || ctx.set("shared", json!(i)).is_ok())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(winners, 1);
        assert!(ctx.get("shared").is_some());
    }

    #[test]
    fn test_history_survives_execution_scope() {
        let request = Arc::new(RequestContext::new("origin"));
        {
            let ctx = ExecutionContext::new("origin", &request).with_id("hop-1");
            ctx.set(PIPELINE_NAME_KEY, json!("first")).unwrap();
            ctx.complete();
            request.push_execution_context(ctx);
        }

        let history = request.execution_contexts();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id(), "hop-1");
        assert_eq!(history[0].pipeline_name(), Some("first".to_string()));
        assert!(history[0].request_context().is_ok());
    }
}
