use serde_json::json;

use chainpilot::config::SingleFlightPolicy;
use chainpilot::{Config, EngineError};
use chainpilot::core::chain::NullObserver;
use chainpilot::core::engine::{ContainerDecision, EngineOutcome, ScopeDecision};
use chainpilot::core::preferences::ContextSelection;
use chainpilot::core::session::ToolCallOutput;

use super::support::{
    CONTAINER_ID, Entry, NEW_CONTAINER_ID, RECORD_ID, RecordingTranscript, SCOPE_ID,
    ScriptedBackend, ScriptedReasoner, ScriptedSurface, engine, engine_with, locked_preferences,
    memory_preferences, plan_json, step, unwritable_preferences,
};

fn create_incident_plan() -> String {
    plan_json(
        false,
        &[step(
            "create-record",
            json!({ "table": "incident", "fields": { "short_description": "Printer on fire" } }),
        )],
    )
}

#[tokio::test]
async fn create_request_confirms_scope_then_container_and_pushes_both() {
    let backend = ScriptedBackend::new();
    backend.reply(
        "create-record",
        ToolCallOutput::text(format!("Created incident sys_id: {RECORD_ID}")),
    );
    let reasoner = ScriptedReasoner::with_replies(vec![
        create_incident_plan().as_str(),
        "Created incident INC0010001.",
    ]);
    let mut engine = engine(&backend, reasoner, memory_preferences());

    let scope = ContextSelection::new(SCOPE_ID, "Incident App");
    let container = ContextSelection::new(CONTAINER_ID, "AI_20250307_form_fixes");
    let surface = ScriptedSurface::new(
        vec![ScopeDecision::Select {
            selection: scope.clone(),
            lock: false,
        }],
        vec![ContainerDecision::Select {
            selection: container.clone(),
            lock: false,
        }],
    );
    let transcript = RecordingTranscript::default();

    let reply = engine
        .handle("create an incident for the printer", &surface, &transcript)
        .await
        .unwrap()
        .expect("request completes");

    assert_eq!(reply.response, "Created incident INC0010001.");
    assert_eq!(
        backend.call_names(),
        vec![
            "list-applications",
            "list-update-sets",
            "set-current-application",
            "set-current-update-set",
            "create-record",
        ]
    );
    let calls = backend.calls();
    assert_eq!(calls[2].1, json!({ "sys_id": SCOPE_ID }));
    assert_eq!(calls[3].1, json!({ "sys_id": CONTAINER_ID }));

    let scope_requests = surface.scope_requests();
    assert_eq!(scope_requests.len(), 1);
    assert_eq!(scope_requests[0].tools, vec!["create-record"]);
    assert_eq!(scope_requests[0].options[0], scope);
    let container_requests = surface.container_requests();
    assert_eq!(container_requests[0].scope, Some(scope.clone()));
    assert_eq!(container_requests[0].options, vec![container.clone()]);

    let prefs = engine.preferences();
    assert_eq!(prefs.execution_scope.current_selection, Some(scope));
    assert_eq!(prefs.tracking_container.current_selection, Some(container));
    assert!(!prefs.execution_scope.locked);
    assert!(engine.pending().is_none());
    assert!(
        transcript
            .entries()
            .contains(&Entry::Assistant("Created incident INC0010001.".into()))
    );
}

#[tokio::test]
async fn locked_preferences_skip_prompts_but_still_push_context() {
    let backend = ScriptedBackend::new();
    let reasoner = ScriptedReasoner::with_replies(vec![create_incident_plan().as_str(), "Done."]);
    let mut engine = engine(&backend, reasoner, locked_preferences());
    let surface = ScriptedSurface::default();

    engine
        .handle("create an incident", &surface, &RecordingTranscript::default())
        .await
        .unwrap()
        .expect("request completes");

    assert!(surface.scope_requests().is_empty());
    assert!(surface.container_requests().is_empty());
    assert_eq!(
        backend.call_names(),
        vec!["set-current-application", "set-current-update-set", "create-record"]
    );
}

#[tokio::test]
async fn new_container_is_created_inside_the_confirmed_scope() {
    let backend = ScriptedBackend::new();
    backend.reply(
        "create-update-set",
        ToolCallOutput::text(format!("Update set created with sys_id {NEW_CONTAINER_ID}")),
    );
    let reasoner = ScriptedReasoner::with_replies(vec![create_incident_plan().as_str(), "Done."]);
    let mut engine = engine(&backend, reasoner, memory_preferences());
    let surface = ScriptedSurface::new(
        vec![ScopeDecision::Select {
            selection: ContextSelection::new(SCOPE_ID, "Incident App"),
            lock: false,
        }],
        vec![ContainerDecision::CreateNew {
            description: "printer incident".into(),
            lock: true,
        }],
    );

    engine
        .handle("create an incident", &surface, &RecordingTranscript::default())
        .await
        .unwrap()
        .expect("request completes");

    assert_eq!(
        backend.call_names(),
        vec![
            "list-applications",
            "list-update-sets",
            "set-current-application",
            "create-update-set",
            "set-current-application",
            "set-current-update-set",
            "create-record",
        ]
    );

    let calls = backend.calls();
    let name = calls[3].1["name"].as_str().unwrap().to_string();
    assert!(name.starts_with("AI_"), "unexpected name {name}");
    assert!(name.ends_with("_printer_incident"), "unexpected name {name}");
    assert_eq!(calls[3].1["description"], json!("printer incident"));
    assert_eq!(calls[5].1, json!({ "sys_id": NEW_CONTAINER_ID }));

    let container = &engine.preferences().tracking_container;
    assert!(container.locked);
    assert_eq!(
        container.current_selection,
        Some(ContextSelection::new(NEW_CONTAINER_ID, name))
    );
}

#[tokio::test]
async fn cancelling_scope_leaves_backend_untouched() {
    let backend = ScriptedBackend::new();
    let reasoner = ScriptedReasoner::with_replies(vec![create_incident_plan().as_str()]);
    let mut engine = engine(&backend, reasoner, memory_preferences());
    let surface = ScriptedSurface::new(vec![ScopeDecision::Cancel], Vec::new());
    let transcript = RecordingTranscript::default();

    let reply = engine
        .handle("create an incident", &surface, &transcript)
        .await
        .unwrap();

    assert!(reply.is_none());
    assert_eq!(backend.call_names(), vec!["list-applications"]);
    assert!(engine.pending().is_none());
    assert!(engine.preferences().execution_scope.current_selection.is_none());
    assert!(
        transcript
            .entries()
            .iter()
            .any(|entry| matches!(entry, Entry::Notice(text) if text.contains("cancelled")))
    );
}

#[tokio::test]
async fn second_request_is_rejected_while_one_is_pending() {
    let backend = ScriptedBackend::new();
    let reasoner = ScriptedReasoner::with_replies(vec![create_incident_plan().as_str()]);
    let mut engine = engine(&backend, reasoner, memory_preferences());

    let outcome = engine
        .submit("create an incident", &NullObserver)
        .await
        .unwrap();
    assert!(matches!(outcome, EngineOutcome::NeedsScope(_)));

    let error = engine
        .submit("list open incidents", &NullObserver)
        .await
        .unwrap_err();
    assert!(
        matches!(&error, EngineError::Busy { request } if request == "create an incident"),
        "unexpected error: {error}"
    );

    // The pending execution survives the rejection.
    let pending = engine.cancel_pending().expect("still pending");
    assert_eq!(pending.request, "create an incident");
    assert!(engine.pending().is_none());
    assert!(!backend.call_names().contains(&"create-record".to_string()));
}

#[tokio::test]
async fn out_of_order_confirmation_is_rejected() {
    let backend = ScriptedBackend::new();
    let reasoner = ScriptedReasoner::with_replies(vec![create_incident_plan().as_str()]);
    let mut engine = engine(&backend, reasoner, memory_preferences());

    engine
        .submit("create an incident", &NullObserver)
        .await
        .unwrap();

    let error = engine
        .confirm_tracking_container(
            ContainerDecision::Select {
                selection: ContextSelection::new(CONTAINER_ID, "Form fixes"),
                lock: false,
            },
            &NullObserver,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        EngineError::UnexpectedConfirmation {
            expected: "awaiting_tracking_container",
            got: "awaiting_scope",
        }
    ));
    assert!(engine.pending().is_some());
    assert!(engine.preferences().tracking_container.current_selection.is_none());
}

#[tokio::test]
async fn confirmation_without_pending_execution_is_rejected() {
    let backend = ScriptedBackend::new();
    let mut engine = engine(&backend, ScriptedReasoner::unavailable(), memory_preferences());

    let error = engine
        .confirm_scope(
            ScopeDecision::Select {
                selection: ContextSelection::new(SCOPE_ID, "Incident App"),
                lock: false,
            },
            &NullObserver,
        )
        .await
        .unwrap_err();
    assert!(matches!(error, EngineError::NoPendingExecution));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn supersede_policy_replaces_the_pending_execution() {
    let backend = ScriptedBackend::new();
    let reasoner = ScriptedReasoner::with_replies(vec![
        create_incident_plan().as_str(),
        plan_json(
            false,
            &[step("update-record", json!({ "sys_id": RECORD_ID, "fields": {} }))],
        )
        .as_str(),
    ]);
    let mut config = Config::default();
    config.gating.single_flight = SingleFlightPolicy::Supersede;
    let mut engine = engine_with(&backend, reasoner, memory_preferences(), &config);

    engine
        .submit("create an incident", &NullObserver)
        .await
        .unwrap();
    let outcome = engine
        .submit("update the incident", &NullObserver)
        .await
        .unwrap();

    assert!(matches!(outcome, EngineOutcome::NeedsScope(ref request) if request.tools == vec!["update-record"]));
    let pending = engine.pending().expect("pending");
    assert_eq!(pending.request, "update the incident");
    assert_eq!(pending.plan.steps[0].tool_name, "update-record");
}

#[tokio::test]
async fn failed_context_push_aborts_before_any_step() {
    let backend = ScriptedBackend::new();
    backend.reply(
        "set-current-update-set",
        ToolCallOutput::error("update set is complete"),
    );
    let reasoner = ScriptedReasoner::with_replies(vec![create_incident_plan().as_str()]);
    let mut engine = engine(&backend, reasoner, locked_preferences());
    let transcript = RecordingTranscript::default();

    let error = engine
        .handle("create an incident", &ScriptedSurface::default(), &transcript)
        .await
        .unwrap_err();

    assert!(error.to_string().contains("set-current-update-set failed"));
    assert!(!backend.call_names().contains(&"create-record".to_string()));
    assert_eq!(transcript.errors().len(), 1);
    assert!(engine.pending().is_none());
}

#[tokio::test]
async fn unsaved_confirmations_still_run_the_request() {
    let backend = ScriptedBackend::new();
    let reasoner = ScriptedReasoner::with_replies(vec![create_incident_plan().as_str(), "Done."]);
    let mut engine = engine(&backend, reasoner, unwritable_preferences());
    let scope = ContextSelection::new(SCOPE_ID, "Incident App");
    let container = ContextSelection::new(CONTAINER_ID, "AI_20250307_form_fixes");
    let surface = ScriptedSurface::new(
        vec![ScopeDecision::Select {
            selection: scope.clone(),
            lock: true,
        }],
        vec![ContainerDecision::Select {
            selection: container.clone(),
            lock: false,
        }],
    );

    let reply = engine
        .handle("create an incident", &surface, &RecordingTranscript::default())
        .await
        .unwrap()
        .expect("request completes");

    assert_eq!(reply.response, "Done.");
    assert_eq!(
        backend.call_names(),
        vec![
            "list-applications",
            "list-update-sets",
            "set-current-application",
            "set-current-update-set",
            "create-record",
        ]
    );
    let prefs = engine.preferences();
    assert_eq!(prefs.execution_scope.current_selection, Some(scope));
    assert!(prefs.execution_scope.locked);
    assert_eq!(prefs.tracking_container.current_selection, Some(container));
}

#[tokio::test]
async fn cancel_without_pending_execution_is_rejected() {
    let backend = ScriptedBackend::new();
    let mut engine = engine(&backend, ScriptedReasoner::unavailable(), memory_preferences());

    let error = engine
        .confirm_scope(ScopeDecision::Cancel, &NullObserver)
        .await
        .unwrap_err();
    assert!(matches!(error, EngineError::NoPendingExecution));

    let error = engine
        .confirm_tracking_container(ContainerDecision::Cancel, &NullObserver)
        .await
        .unwrap_err();
    assert!(matches!(error, EngineError::NoPendingExecution));
    assert!(backend.calls().is_empty());
}
