use serde_json::json;

use chainpilot::EngineError;
use chainpilot::core::chain::NullObserver;
use chainpilot::core::planner::PlanOrigin;
use chainpilot::core::session::ToolCallOutput;
use chainpilot::error::PlanValidationError;

use super::support::{
    RecordingTranscript, ScriptedBackend, ScriptedReasoner, ScriptedSurface, engine,
    memory_preferences, plan_json, step,
};

#[tokio::test]
async fn prose_plan_falls_back_to_query_tool() {
    let backend = ScriptedBackend::new();
    backend.reply("query-records", ToolCallOutput::text("3 open incidents"));
    let reasoner = ScriptedReasoner::with_replies(vec![
        "You should probably look at the incident table.",
        "There are 3 open incidents.",
    ]);
    let mut engine = engine(&backend, reasoner, memory_preferences());

    let request = "how many open incidents are there";
    let reply = engine
        .handle(request, &ScriptedSurface::default(), &RecordingTranscript::default())
        .await
        .unwrap()
        .expect("request completes");

    assert_eq!(reply.plan.origin, PlanOrigin::Fallback);
    assert_eq!(
        backend.calls(),
        vec![("query-records".to_string(), json!({ "query": request }))]
    );
    assert_eq!(reply.response, "There are 3 open incidents.");
}

#[tokio::test]
async fn plan_naming_unknown_tool_falls_back() {
    let backend = ScriptedBackend::new();
    let plan = plan_json(false, &[step("drop-table", json!({ "table": "incident" }))]);
    let reasoner = ScriptedReasoner::with_replies(vec![plan.as_str()]);
    let engine = engine(&backend, reasoner, memory_preferences());

    let plan = engine.plan("show recent incidents").await.unwrap();

    assert_eq!(plan.origin, PlanOrigin::Fallback);
    assert_eq!(plan.steps.len(), 1);
    assert_eq!(plan.steps[0].tool_name, "query-records");
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn unavailable_reasoning_service_still_answers_from_raw_output() {
    let backend = ScriptedBackend::new();
    backend.reply("query-records", ToolCallOutput::text("INC0010001 Printer on fire"));
    let mut engine = engine(&backend, ScriptedReasoner::unavailable(), memory_preferences());

    let reply = engine
        .handle(
            "find the printer incident",
            &ScriptedSurface::default(),
            &RecordingTranscript::default(),
        )
        .await
        .unwrap()
        .expect("request completes");

    assert_eq!(reply.plan.origin, PlanOrigin::Fallback);
    assert_eq!(
        reply.response,
        "Step 1 (query-records):\nINC0010001 Printer on fire"
    );
}

#[tokio::test]
async fn empty_catalog_cannot_be_planned() {
    let backend = ScriptedBackend::new();
    let mut engine =
        engine(&backend, ScriptedReasoner::unavailable(), memory_preferences()).with_catalog(Vec::new());

    let error = engine
        .submit("list incidents", &NullObserver)
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        EngineError::PlanValidation(PlanValidationError::NoTools)
    ));
    assert!(engine.pending().is_none());
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn catalog_refresh_reads_backend_tools() {
    let backend = ScriptedBackend::new();
    let mut engine =
        engine(&backend, ScriptedReasoner::unavailable(), memory_preferences()).with_catalog(Vec::new());

    let tools = engine.refresh_catalog().await.unwrap();

    assert!(tools.iter().any(|tool| tool.name == "create-update-set"));
    assert!(!engine.catalog().is_empty());
}
