#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::anyhow;
use serde_json::{Value, json};

use chainpilot::Config;
use chainpilot::core::chain::{ChainObserver, StepResult};
use chainpilot::core::engine::{
    ChatEngine, ConfirmationSurface, ContainerDecision, ContainerRequest, ScopeDecision,
    ScopeRequest, Transcript,
};
use chainpilot::core::planner::{ExecutionStep, ToolDescriptor};
use chainpilot::core::preferences::{ContextSelection, KvStore, MemoryKvStore, PreferenceStore};
use chainpilot::error::PersistenceError;
use chainpilot::core::providers::ReasoningService;
use chainpilot::core::session::{BoxFuture, ToolBackend, ToolCallOutput};

pub const SCOPE_ID: &str = "1111aaaa2222bbbb3333cccc4444dddd";
pub const CONTAINER_ID: &str = "5555eeee6666ffff7777aaaa8888bbbb";
pub const NEW_CONTAINER_ID: &str = "9999cccc0000dddd1111eeee2222ffff";
pub const RECORD_ID: &str = "46d44a23a9fe19810012d100cca80666";

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn schema(properties: &[&str], required: &[&str]) -> Value {
    let properties: serde_json::Map<String, Value> = properties
        .iter()
        .map(|name| ((*name).to_string(), json!({ "type": "string" })))
        .collect();
    json!({ "type": "object", "properties": properties, "required": required })
}

/// Catalog of a service-management backend with scope and update-set tools.
pub fn catalog() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "query-records",
            "Query records in a table",
            schema(&["table", "query"], &["table"]),
        ),
        ToolDescriptor::new(
            "get-record",
            "Fetch one record by sys_id",
            schema(&["table", "sys_id"], &["sys_id"]),
        ),
        ToolDescriptor::new(
            "create-record",
            "Create a record in a table",
            schema(&["table", "fields"], &["table"]),
        ),
        ToolDescriptor::new(
            "update-record",
            "Update fields on a record",
            schema(&["table", "sys_id", "fields"], &["sys_id"]),
        ),
        ToolDescriptor::new("list-applications", "List application scopes", schema(&[], &[])),
        ToolDescriptor::new(
            "set-current-application",
            "Switch the current application scope",
            schema(&["sys_id"], &["sys_id"]),
        ),
        ToolDescriptor::new("list-update-sets", "List in-progress update sets", schema(&[], &[])),
        ToolDescriptor::new(
            "create-update-set",
            "Create an update set",
            schema(&["name", "description"], &["name"]),
        ),
        ToolDescriptor::new(
            "set-current-update-set",
            "Switch the current update set",
            schema(&["sys_id"], &["sys_id"]),
        ),
    ]
}

/// Backend answering from per-tool scripts. Unscripted tools answer "ok".
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<HashMap<String, VecDeque<anyhow::Result<ToolCallOutput>>>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        let backend = Self::default();
        backend.reply(
            "list-applications",
            ToolCallOutput::text(
                json!([
                    { "sys_id": SCOPE_ID, "name": "Incident App" },
                    { "sys_id": "global", "name": "Global" }
                ])
                .to_string(),
            ),
        );
        backend.reply(
            "list-update-sets",
            ToolCallOutput::text(
                json!({ "result": [{ "sys_id": CONTAINER_ID, "name": "AI_20250307_form_fixes" }] })
                    .to_string(),
            ),
        );
        Arc::new(backend)
    }

    pub fn reply(&self, tool: &str, output: ToolCallOutput) {
        lock(&self.replies)
            .entry(tool.to_string())
            .or_default()
            .push_back(Ok(output));
    }

    pub fn fail(&self, tool: &str, message: &str) {
        lock(&self.replies)
            .entry(tool.to_string())
            .or_default()
            .push_back(Err(anyhow!(message.to_string())));
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        lock(&self.calls).clone()
    }

    pub fn call_names(&self) -> Vec<String> {
        self.calls().into_iter().map(|(name, _)| name).collect()
    }
}

impl ToolBackend for ScriptedBackend {
    fn list_tools(&self) -> BoxFuture<'_, anyhow::Result<Vec<ToolDescriptor>>> {
        Box::pin(async move { Ok(catalog()) })
    }

    fn call_tool<'a>(
        &'a self,
        name: &'a str,
        arguments: Value,
    ) -> BoxFuture<'a, anyhow::Result<ToolCallOutput>> {
        Box::pin(async move {
            lock(&self.calls).push((name.to_string(), arguments));
            lock(&self.replies)
                .get_mut(name)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| Ok(ToolCallOutput::text("ok")))
        })
    }
}

/// Reasoning service replaying canned completions in order. Runs out into
/// errors so the engine's fallbacks take over.
#[derive(Default)]
pub struct ScriptedReasoner {
    replies: Mutex<VecDeque<anyhow::Result<String>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedReasoner {
    pub fn with_replies(replies: Vec<&str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.to_string())).collect()),
            prompts: Arc::default(),
        }
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn prompts(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.prompts)
    }
}

impl ReasoningService for ScriptedReasoner {
    fn name(&self) -> &str {
        "scripted"
    }

    fn complete<'a>(
        &'a self,
        _system_prompt: &'a str,
        prompt: &'a str,
    ) -> BoxFuture<'a, anyhow::Result<String>> {
        Box::pin(async move {
            lock(&self.prompts).push(prompt.to_string());
            lock(&self.replies)
                .pop_front()
                .unwrap_or_else(|| Err(anyhow!("reasoning service unavailable")))
        })
    }
}

/// Plan JSON the way the reasoning service answers.
pub fn plan_json(is_chain: bool, steps: &[Value]) -> String {
    json!({ "isChain": is_chain, "reasoning": "test plan", "steps": steps }).to_string()
}

pub fn step(tool: &str, arguments: Value) -> Value {
    json!({ "toolName": tool, "arguments": arguments, "reasoning": format!("run {tool}") })
}

/// Operator replaying scripted decisions. Running out of decisions cancels.
#[derive(Default)]
pub struct ScriptedSurface {
    scope: Mutex<VecDeque<ScopeDecision>>,
    container: Mutex<VecDeque<ContainerDecision>>,
    pub scope_requests: Mutex<Vec<ScopeRequest>>,
    pub container_requests: Mutex<Vec<ContainerRequest>>,
}

impl ScriptedSurface {
    pub fn new(scope: Vec<ScopeDecision>, container: Vec<ContainerDecision>) -> Self {
        Self {
            scope: Mutex::new(scope.into()),
            container: Mutex::new(container.into()),
            ..Self::default()
        }
    }

    pub fn scope_requests(&self) -> Vec<ScopeRequest> {
        lock(&self.scope_requests).clone()
    }

    pub fn container_requests(&self) -> Vec<ContainerRequest> {
        lock(&self.container_requests).clone()
    }
}

impl ConfirmationSurface for ScriptedSurface {
    fn choose_scope(&self, request: &ScopeRequest) -> anyhow::Result<ScopeDecision> {
        lock(&self.scope_requests).push(request.clone());
        Ok(lock(&self.scope).pop_front().unwrap_or(ScopeDecision::Cancel))
    }

    fn choose_tracking_container(
        &self,
        request: &ContainerRequest,
    ) -> anyhow::Result<ContainerDecision> {
        lock(&self.container_requests).push(request.clone());
        Ok(lock(&self.container)
            .pop_front()
            .unwrap_or(ContainerDecision::Cancel))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    StepStarted(usize, usize, String),
    StepFinished(String),
    Assistant(String),
    Notice(String),
    Error(String),
}

#[derive(Default)]
pub struct RecordingTranscript {
    entries: Mutex<Vec<Entry>>,
}

impl RecordingTranscript {
    pub fn entries(&self) -> Vec<Entry> {
        lock(&self.entries).clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::Error(text) => Some(text),
                _ => None,
            })
            .collect()
    }
}

impl ChainObserver for RecordingTranscript {
    fn step_started(&self, position: usize, total: usize, step: &ExecutionStep) {
        lock(&self.entries).push(Entry::StepStarted(position, total, step.tool_name.clone()));
    }

    fn step_finished(&self, result: &StepResult) {
        lock(&self.entries).push(Entry::StepFinished(result.tool_name.clone()));
    }
}

impl Transcript for RecordingTranscript {
    fn assistant(&self, text: &str) {
        lock(&self.entries).push(Entry::Assistant(text.to_string()));
    }

    fn notice(&self, text: &str) {
        lock(&self.entries).push(Entry::Notice(text.to_string()));
    }

    fn error(&self, text: &str) {
        lock(&self.entries).push(Entry::Error(text.to_string()));
    }
}

pub fn memory_preferences() -> PreferenceStore {
    PreferenceStore::load(Box::new(MemoryKvStore::default()))
}

/// Store whose writes always fail, as on a full disk.
struct FullDiskKv;

impl KvStore for FullDiskKv {
    fn get(&self, _key: &str) -> Result<Option<Value>, PersistenceError> {
        Ok(None)
    }

    fn set(&mut self, _key: &str, _value: Value) -> Result<(), PersistenceError> {
        Err(PersistenceError::Save("disk full".into()))
    }

    fn delete(&mut self, _key: &str) -> Result<bool, PersistenceError> {
        Err(PersistenceError::Save("disk full".into()))
    }
}

pub fn unwritable_preferences() -> PreferenceStore {
    PreferenceStore::load(Box::new(FullDiskKv))
}

/// Preferences with both selections stored and locked.
pub fn locked_preferences() -> PreferenceStore {
    let mut store = memory_preferences();
    store
        .set_execution_scope(Some(ContextSelection::new(SCOPE_ID, "Incident App")))
        .unwrap();
    store.set_execution_scope_locked(true).unwrap();
    store
        .set_tracking_container(Some(ContextSelection::new(CONTAINER_ID, "Form fixes")))
        .unwrap();
    store.set_tracking_container_locked(true).unwrap();
    store
}

pub fn engine_with(
    backend: &Arc<ScriptedBackend>,
    reasoner: ScriptedReasoner,
    preferences: PreferenceStore,
    config: &Config,
) -> ChatEngine {
    let backend: Arc<dyn ToolBackend> = backend.clone();
    ChatEngine::new(backend, Box::new(reasoner), preferences, config)
        .unwrap()
        .with_catalog(catalog())
}

pub fn engine(
    backend: &Arc<ScriptedBackend>,
    reasoner: ScriptedReasoner,
    preferences: PreferenceStore,
) -> ChatEngine {
    engine_with(backend, reasoner, preferences, &Config::default())
}
