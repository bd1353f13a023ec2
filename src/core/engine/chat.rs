use super::context::{create_arguments, parse_selections, set_arguments};
use super::surface::{
    ConfirmationSurface, ContainerDecision, ContainerRequest, ScopeDecision, ScopeRequest,
    Transcript,
};
use crate::config::{Config, GatingConfig, SingleFlightPolicy};
use crate::core::chain::{ChainObserver, ChainRunner, StepResult, compose_response};
use crate::core::gating::{
    GateRequirement, GateStage, GatingController, PendingExecution, gate_requirements,
    plan_has_gating_step, render_container_name,
};
use crate::core::planner::prompt::{PLANNER_SYSTEM_PROMPT, planning_prompt};
use crate::core::planner::{
    ExecutionPlan, HeuristicPlanner, PlaceholderResolver, PlanParser, ToolDescriptor,
};
use crate::core::preferences::{ContextSelection, PreferenceStore, Preferences};
use crate::core::providers::ReasoningService;
use crate::core::session::ToolBackend;
use crate::error::{EngineError, PersistenceError, PlanValidationError, Result};
use anyhow::{Context, anyhow};
use chrono::Local;
use serde_json::{Value, json};
use std::sync::Arc;

/// Final answer for one request.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub request: String,
    pub plan: ExecutionPlan,
    pub results: Vec<StepResult>,
    pub response: String,
}

/// Where a submitted request stands after the last engine call.
#[derive(Debug, Clone)]
pub enum EngineOutcome {
    NeedsScope(ScopeRequest),
    NeedsTrackingContainer(ContainerRequest),
    Completed(ChatReply),
    Cancelled,
}

/// Drives one request at a time from plan to transcript entry.
///
/// Gating suspends between calls: `submit` may return a confirmation request,
/// answered later through `confirm_scope` / `confirm_tracking_container`.
pub struct ChatEngine {
    backend: Arc<dyn ToolBackend>,
    reasoner: Box<dyn ReasoningService>,
    preferences: PreferenceStore,
    gate: GatingController,
    runner: ChainRunner,
    resolver: PlaceholderResolver,
    gating: GatingConfig,
    catalog: Vec<ToolDescriptor>,
}

impl ChatEngine {
    pub fn new(
        backend: Arc<dyn ToolBackend>,
        reasoner: Box<dyn ReasoningService>,
        preferences: PreferenceStore,
        config: &Config,
    ) -> anyhow::Result<Self> {
        let resolver = PlaceholderResolver::new(&config.planner.identifier_pattern)
            .context("invalid planner.identifier_pattern")?;
        Ok(Self {
            backend,
            reasoner,
            preferences,
            gate: GatingController::new(config.gating.single_flight),
            runner: ChainRunner::new(resolver.clone()),
            resolver,
            gating: config.gating.clone(),
            catalog: Vec::new(),
        })
    }

    pub fn with_catalog(mut self, catalog: Vec<ToolDescriptor>) -> Self {
        self.catalog = catalog;
        self
    }

    pub async fn refresh_catalog(&mut self) -> anyhow::Result<&[ToolDescriptor]> {
        self.catalog = self.backend.list_tools().await?;
        Ok(&self.catalog)
    }

    pub fn catalog(&self) -> &[ToolDescriptor] {
        &self.catalog
    }

    pub fn preferences(&self) -> &Preferences {
        self.preferences.get()
    }

    pub fn pending(&self) -> Option<&PendingExecution> {
        self.gate.pending()
    }

    /// Ask the reasoning service for a plan; fall back to keyword matching
    /// when it fails or proposes something invalid.
    pub async fn plan(&self, request: &str) -> std::result::Result<ExecutionPlan, PlanValidationError> {
        if self.catalog.is_empty() {
            return Err(PlanValidationError::NoTools);
        }

        let prompt = planning_prompt(request, &self.catalog);
        match self.reasoner.complete(PLANNER_SYSTEM_PROMPT, &prompt).await {
            Ok(text) => match PlanParser::parse(&text, &self.catalog) {
                Ok(plan) => {
                    tracing::info!(steps = plan.len(), chain = plan.is_chain, "plan accepted");
                    return Ok(plan);
                }
                Err(error) => {
                    tracing::warn!(error = %error, "proposed plan rejected, using keyword fallback");
                }
            },
            Err(error) => {
                tracing::warn!(
                    service = self.reasoner.name(),
                    error = %format!("{error:#}"),
                    "planning request failed, using keyword fallback"
                );
            }
        }

        HeuristicPlanner::plan(request, &self.catalog)
    }

    /// Plan `request` and advance as far as possible without the operator.
    pub async fn submit(
        &mut self,
        request: &str,
        observer: &dyn ChainObserver,
    ) -> Result<EngineOutcome> {
        if let Some(pending) = self.gate.pending()
            && matches!(self.gating.single_flight, SingleFlightPolicy::Reject)
        {
            return Err(EngineError::Busy {
                request: pending.request.clone(),
            });
        }

        let plan = self.plan(request).await?;
        let stage = self.gate.begin(request, plan, self.preferences.get())?;
        self.advance(stage, observer).await
    }

    pub async fn confirm_scope(
        &mut self,
        decision: ScopeDecision,
        observer: &dyn ChainObserver,
    ) -> Result<EngineOutcome> {
        let (selection, lock) = match decision {
            ScopeDecision::Cancel => return self.cancel_outcome(),
            ScopeDecision::Select { selection, lock } => (selection, lock),
        };
        self.expect_stage(GateStage::AwaitingScope)?;

        tracing::info!(scope = %selection.name, lock, "execution scope confirmed");
        self.remember(|store| store.set_execution_scope(Some(selection)));
        if lock {
            self.remember(|store| store.set_execution_scope_locked(true));
        }

        let stage = self.gate.confirm_scope(self.preferences.get())?;
        self.advance(stage, observer).await
    }

    pub async fn confirm_tracking_container(
        &mut self,
        decision: ContainerDecision,
        observer: &dyn ChainObserver,
    ) -> Result<EngineOutcome> {
        let (selection, lock) = match decision {
            ContainerDecision::Cancel => return self.cancel_outcome(),
            ContainerDecision::Select { selection, lock } => {
                self.expect_stage(GateStage::AwaitingTrackingContainer)?;
                (selection, lock)
            }
            ContainerDecision::CreateNew { description, lock } => {
                self.expect_stage(GateStage::AwaitingTrackingContainer)?;
                (self.create_container(&description).await?, lock)
            }
        };

        tracing::info!(container = %selection.name, lock, "tracking container confirmed");
        self.remember(|store| store.set_tracking_container(Some(selection)));
        if lock {
            self.remember(|store| store.set_tracking_container_locked(true));
        }

        let stage = self.gate.confirm_tracking_container()?;
        self.advance(stage, observer).await
    }

    pub fn cancel_pending(&mut self) -> Option<PendingExecution> {
        self.gate.cancel()
    }

    /// Run one request to completion, collecting confirmations from
    /// `surface` and reporting through `transcript`.
    pub async fn handle<S, T>(
        &mut self,
        request: &str,
        surface: &S,
        transcript: &T,
    ) -> Result<Option<ChatReply>>
    where
        S: ConfirmationSurface + ?Sized,
        T: Transcript,
    {
        let mut outcome = self.submit(request, transcript).await;
        loop {
            let next = match outcome {
                Ok(EngineOutcome::Completed(reply)) => {
                    transcript.assistant(&reply.response);
                    return Ok(Some(reply));
                }
                Ok(EngineOutcome::Cancelled) => {
                    transcript.notice("Request cancelled. Nothing was sent to the backend.");
                    return Ok(None);
                }
                Ok(EngineOutcome::NeedsScope(scope_request)) => {
                    match surface.choose_scope(&scope_request) {
                        Ok(decision) => self.confirm_scope(decision, transcript).await,
                        Err(error) => Err(error.into()),
                    }
                }
                Ok(EngineOutcome::NeedsTrackingContainer(container_request)) => {
                    match surface.choose_tracking_container(&container_request) {
                        Ok(decision) => self.confirm_tracking_container(decision, transcript).await,
                        Err(error) => Err(error.into()),
                    }
                }
                Err(error) => {
                    if !matches!(error, EngineError::Busy { .. }) {
                        self.gate.cancel();
                    }
                    transcript.error(&describe_error(&error));
                    return Err(error);
                }
            };
            outcome = next;
        }
    }

    fn cancel_outcome(&mut self) -> Result<EngineOutcome> {
        self.gate
            .cancel()
            .map(|_| EngineOutcome::Cancelled)
            .ok_or(EngineError::NoPendingExecution)
    }

    /// Apply a confirmed selection. A failed save keeps the in-memory value
    /// and lets the request continue.
    fn remember(
        &mut self,
        update: impl FnOnce(&mut PreferenceStore) -> std::result::Result<(), PersistenceError>,
    ) {
        if let Err(error) = update(&mut self.preferences) {
            tracing::warn!(error = %error, "preference not saved, continuing with in-memory value");
        }
    }

    fn expect_stage(&self, expected: GateStage) -> Result<()> {
        match self.gate.stage() {
            None => Err(EngineError::NoPendingExecution),
            Some(stage) if stage == expected => Ok(()),
            Some(stage) => Err(EngineError::UnexpectedConfirmation {
                expected: expected.into(),
                got: stage.into(),
            }),
        }
    }

    async fn advance(&mut self, stage: GateStage, observer: &dyn ChainObserver) -> Result<EngineOutcome> {
        match stage {
            GateStage::AwaitingScope => Ok(EngineOutcome::NeedsScope(self.scope_request().await)),
            GateStage::AwaitingTrackingContainer => Ok(EngineOutcome::NeedsTrackingContainer(
                self.container_request().await,
            )),
            GateStage::Ready => self.execute(observer).await.map(EngineOutcome::Completed),
        }
    }

    async fn execute(&mut self, observer: &dyn ChainObserver) -> Result<ChatReply> {
        let pending = self.gate.take_ready()?;
        if plan_has_gating_step(&pending.plan) {
            self.push_context().await?;
        }

        let results = self
            .runner
            .run(&pending.plan, self.backend.as_ref(), observer)
            .await?;
        let response =
            compose_response(self.reasoner.as_ref(), &pending.request, &pending.plan, &results)
                .await;

        Ok(ChatReply {
            request: pending.request,
            plan: pending.plan,
            results,
            response,
        })
    }

    fn pending_request(&self) -> String {
        self.gate
            .pending()
            .map(|pending| pending.request.clone())
            .unwrap_or_default()
    }

    async fn scope_request(&self) -> ScopeRequest {
        let tools = self
            .gate
            .pending()
            .map(|pending| {
                pending
                    .plan
                    .tool_names()
                    .filter(|name| {
                        gate_requirements(name).contains(&GateRequirement::ExecutionScope)
                    })
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();

        ScopeRequest {
            request: self.pending_request(),
            tools,
            options: self.list_options(&self.gating.scope_list_tool).await,
            current: self.preferences.get().execution_scope.current_selection.clone(),
        }
    }

    async fn container_request(&self) -> ContainerRequest {
        let request = self.pending_request();
        let suggested_name = self.container_name(&request);
        let prefs = self.preferences.get();

        ContainerRequest {
            request,
            scope: prefs.execution_scope.current_selection.clone(),
            options: self.list_options(&self.gating.container_list_tool).await,
            current: prefs.tracking_container.current_selection.clone(),
            suggested_name,
        }
    }

    fn container_name(&self, description: &str) -> String {
        render_container_name(
            &self.preferences.get().tracking_container.naming_template,
            &self.gating.container_prefix,
            Local::now().date_naive(),
            description,
        )
    }

    fn tool(&self, name: &str) -> Option<&ToolDescriptor> {
        self.catalog.iter().find(|tool| tool.name == name)
    }

    /// Options for a confirmation prompt. Listing failures leave the list
    /// empty; the operator can still create or cancel.
    async fn list_options(&self, tool_name: &str) -> Vec<ContextSelection> {
        if !self.catalog.is_empty() && self.tool(tool_name).is_none() {
            tracing::debug!(tool = %tool_name, "listing tool not offered by backend");
            return Vec::new();
        }

        match self.backend.call_tool(tool_name, json!({})).await {
            Ok(output) if !output.is_error => parse_selections(&output.render(), &self.resolver),
            Ok(output) => {
                tracing::warn!(tool = %tool_name, error = %output.render(), "listing tool reported an error");
                Vec::new()
            }
            Err(error) => {
                tracing::warn!(tool = %tool_name, error = %format!("{error:#}"), "listing tool failed");
                Vec::new()
            }
        }
    }

    async fn call_context_tool(&self, tool_name: &str, arguments: Value) -> anyhow::Result<String> {
        let output = self
            .backend
            .call_tool(tool_name, arguments)
            .await
            .with_context(|| format!("{tool_name} failed"))?;
        if output.is_error {
            return Err(anyhow!("{tool_name} failed: {}", output.render()));
        }
        Ok(output.render())
    }

    async fn push_scope(&self) -> anyhow::Result<()> {
        let scope = &self.preferences.get().execution_scope;
        let Some(selection) = scope.current_selection.as_ref().filter(|_| scope.enabled) else {
            return Ok(());
        };
        let tool_name = &self.gating.scope_set_tool;
        let arguments = set_arguments(self.tool(tool_name), selection);
        self.call_context_tool(tool_name, arguments).await?;
        tracing::debug!(scope = %selection.name, "execution scope pushed");
        Ok(())
    }

    async fn push_container(&self) -> anyhow::Result<()> {
        let container = &self.preferences.get().tracking_container;
        let Some(selection) = container
            .current_selection
            .as_ref()
            .filter(|_| container.enabled)
        else {
            return Ok(());
        };
        let tool_name = &self.gating.container_set_tool;
        let arguments = set_arguments(self.tool(tool_name), selection);
        self.call_context_tool(tool_name, arguments).await?;
        tracing::debug!(container = %selection.name, "tracking container pushed");
        Ok(())
    }

    /// Synchronize backend context from preferences: scope first, then the
    /// tracking container.
    async fn push_context(&self) -> anyhow::Result<()> {
        self.push_scope().await?;
        self.push_container().await
    }

    /// Create a container inside the confirmed scope and return it.
    async fn create_container(&self, description: &str) -> anyhow::Result<ContextSelection> {
        self.push_scope().await?;

        let description = if description.trim().is_empty() {
            self.pending_request()
        } else {
            description.trim().to_string()
        };
        let name = self.container_name(&description);
        let tool_name = &self.gating.container_create_tool;
        let arguments = create_arguments(self.tool(tool_name), &name, &description);

        let output = self.call_context_tool(tool_name, arguments).await?;
        let id = self
            .resolver
            .find_identifier(&output)
            .ok_or_else(|| anyhow!("{tool_name} did not return an identifier for '{name}'"))?;
        tracing::info!(container = %name, id, "tracking container created");
        Ok(ContextSelection::new(id, name))
    }
}

/// Operator-facing description of a failed request.
pub fn describe_error(error: &EngineError) -> String {
    match error {
        EngineError::StepExecution(failure) if !failure.completed.is_empty() => {
            let completed = failure
                .completed
                .iter()
                .map(|result| format!("step {} ({})", result.step_index + 1, result.tool_name))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{failure}. Already applied and not rolled back: {completed}.")
        }
        other => format!("{other:#}"),
    }
}
