use serde_json::json;

use chainpilot::EngineError;
use chainpilot::core::planner::PlanOrigin;
use chainpilot::core::session::ToolCallOutput;

use super::support::{
    Entry, RECORD_ID, RecordingTranscript, ScriptedBackend, ScriptedReasoner, ScriptedSurface,
    engine, memory_preferences, plan_json, step,
};

fn lookup_chain() -> String {
    plan_json(
        true,
        &[
            step(
                "query-records",
                json!({ "table": "incident", "query": "number=INC0010001" }),
            ),
            step(
                "get-record",
                json!({ "table": "incident", "sys_id": "{{step_1_result}}" }),
            ),
        ],
    )
}

#[tokio::test]
async fn single_step_plan_makes_exactly_one_backend_call() {
    let backend = ScriptedBackend::new();
    backend.reply("query-records", ToolCallOutput::text("3 open incidents"));
    let plan = plan_json(
        false,
        &[step("query-records", json!({ "table": "incident", "query": "active=true" }))],
    );
    let reasoner = ScriptedReasoner::with_replies(vec![plan.as_str(), "There are 3 open incidents."]);
    let prompts = reasoner.prompts();
    let mut engine = engine(&backend, reasoner, memory_preferences());
    let transcript = RecordingTranscript::default();

    let reply = engine
        .handle("how many open incidents?", &ScriptedSurface::default(), &transcript)
        .await
        .unwrap()
        .expect("request completes");

    assert_eq!(backend.call_names(), vec!["query-records"]);
    assert_eq!(reply.plan.origin, PlanOrigin::Reasoned);
    assert!(!reply.plan.is_chain);
    assert_eq!(reply.results.len(), 1);
    assert_eq!(reply.response, "There are 3 open incidents.");
    assert_eq!(
        transcript.entries(),
        vec![
            Entry::StepStarted(1, 1, "query-records".into()),
            Entry::StepFinished("query-records".into()),
            Entry::Assistant("There are 3 open incidents.".into()),
        ]
    );

    let prompts = prompts.lock().unwrap();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("how many open incidents?"));
    assert!(prompts[0].contains("query-records"));
    assert!(prompts[1].contains("3 open incidents"));
}

#[tokio::test]
async fn chain_feeds_identifier_from_earlier_step() {
    let backend = ScriptedBackend::new();
    backend.reply(
        "query-records",
        ToolCallOutput::text(format!("Found INC0010001 (sys_id: {RECORD_ID}) state=New")),
    );
    backend.reply(
        "get-record",
        ToolCallOutput::text("INC0010001 Printer on fire"),
    );
    let plan = lookup_chain();
    let reasoner = ScriptedReasoner::with_replies(vec![plan.as_str(), "INC0010001 is new."]);
    let mut engine = engine(&backend, reasoner, memory_preferences());

    let reply = engine
        .handle(
            "show me INC0010001",
            &ScriptedSurface::default(),
            &RecordingTranscript::default(),
        )
        .await
        .unwrap()
        .expect("request completes");

    let calls = backend.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].0, "get-record");
    assert_eq!(
        calls[1].1,
        json!({ "table": "incident", "sys_id": RECORD_ID })
    );
    assert!(reply.plan.is_chain);
    assert_eq!(reply.results[1].resolved_arguments["sys_id"], json!(RECORD_ID));
}

#[tokio::test]
async fn chain_stops_at_failing_step_and_reports_applied_steps() {
    let backend = ScriptedBackend::new();
    backend.reply(
        "query-records",
        ToolCallOutput::text(format!("sys_id: {RECORD_ID}")),
    );
    backend.reply("get-record", ToolCallOutput::error("record not found"));
    let plan = plan_json(
        true,
        &[
            step("query-records", json!({ "table": "incident" })),
            step("get-record", json!({ "sys_id": "{{step_1_result}}" })),
            step("query-records", json!({ "table": "problem" })),
        ],
    );
    let reasoner = ScriptedReasoner::with_replies(vec![plan.as_str()]);
    let mut engine = engine(&backend, reasoner, memory_preferences());
    let transcript = RecordingTranscript::default();

    let error = engine
        .handle("look up the incident", &ScriptedSurface::default(), &transcript)
        .await
        .unwrap_err();

    let EngineError::StepExecution(failure) = &error else {
        panic!("unexpected error: {error}");
    };
    assert_eq!(failure.position, 2);
    assert_eq!(failure.tool_name, "get-record");
    assert!(failure.message.contains("record not found"));
    assert_eq!(failure.completed.len(), 1);
    assert_eq!(failure.completed[0].tool_name, "query-records");

    assert_eq!(backend.call_names(), vec!["query-records", "get-record"]);
    let errors = transcript.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("step 2 (get-record) failed"));
    assert!(errors[0].contains("not rolled back: step 1 (query-records)"));
    assert!(engine.pending().is_none());
}

#[tokio::test]
async fn transport_error_fails_the_step() {
    let backend = ScriptedBackend::new();
    backend.fail("query-records", "broken pipe");
    let plan = plan_json(false, &[step("query-records", json!({ "table": "incident" }))]);
    let reasoner = ScriptedReasoner::with_replies(vec![plan.as_str()]);
    let mut engine = engine(&backend, reasoner, memory_preferences());

    let error = engine
        .handle(
            "list incidents",
            &ScriptedSurface::default(),
            &RecordingTranscript::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        &error,
        EngineError::StepExecution(failure)
            if failure.position == 1 && failure.completed.is_empty() && failure.message.contains("broken pipe")
    ));
}
