use super::style;
use crate::core::chain::{ChainObserver, StepResult};
use crate::core::engine::{
    ConfirmationSurface, ContainerDecision, ContainerRequest, ScopeDecision, ScopeRequest,
    Transcript,
};
use crate::core::planner::ExecutionStep;
use crate::core::preferences::ContextSelection;
use dialoguer::{Confirm, Input, Select};

fn selection_label(selection: &ContextSelection, current: Option<&ContextSelection>) -> String {
    let marker = if current.is_some_and(|c| c.id == selection.id) {
        format!(" {}", style::dim("(current)"))
    } else {
        String::new()
    };
    format!("{} {}{marker}", selection.name, style::dim(&selection.id))
}

fn default_index(options: &[ContextSelection], current: Option<&ContextSelection>) -> usize {
    current
        .and_then(|c| options.iter().position(|option| option.id == c.id))
        .unwrap_or(0)
}

fn ask_lock(what: &str) -> anyhow::Result<bool> {
    Ok(Confirm::new()
        .with_prompt(format!("  Remember this {what} and stop asking?"))
        .default(false)
        .interact()?)
}

fn ask_manual_selection(what: &str) -> anyhow::Result<Option<ContextSelection>> {
    let id: String = Input::new()
        .with_prompt(format!("  {what} sys_id (empty to cancel)"))
        .allow_empty(true)
        .interact_text()?;
    let id = id.trim();
    if id.is_empty() {
        return Ok(None);
    }
    let name: String = Input::new()
        .with_prompt("  Display name")
        .default(id.to_string())
        .interact_text()?;
    Ok(Some(ContextSelection::new(id, name)))
}

/// Operator confirmations through interactive terminal prompts.
pub struct TerminalSurface;

impl ConfirmationSurface for TerminalSurface {
    fn choose_scope(&self, request: &ScopeRequest) -> anyhow::Result<ScopeDecision> {
        println!();
        println!(
            "  {} {}",
            style::header("Scope required for:"),
            style::yellow(request.tools.join(", "))
        );

        let current = request.current.as_ref();
        let mut labels: Vec<String> = request
            .options
            .iter()
            .map(|option| selection_label(option, current))
            .collect();
        labels.push("Enter a sys_id".to_string());
        labels.push("Cancel".to_string());

        let choice = Select::new()
            .with_prompt("  Application scope")
            .items(&labels)
            .default(default_index(&request.options, current))
            .interact()?;

        let selection = if choice < request.options.len() {
            request.options[choice].clone()
        } else if choice == request.options.len() {
            match ask_manual_selection("Application")? {
                Some(selection) => selection,
                None => return Ok(ScopeDecision::Cancel),
            }
        } else {
            return Ok(ScopeDecision::Cancel);
        };

        Ok(ScopeDecision::Select {
            selection,
            lock: ask_lock("scope")?,
        })
    }

    fn choose_tracking_container(
        &self,
        request: &ContainerRequest,
    ) -> anyhow::Result<ContainerDecision> {
        println!();
        if let Some(scope) = &request.scope {
            println!(
                "  {} {}",
                style::header("Update set in scope"),
                style::value(&scope.name)
            );
        }

        let current = request.current.as_ref();
        let mut labels = vec![format!(
            "Create new: {}",
            style::value(&request.suggested_name)
        )];
        labels.extend(
            request
                .options
                .iter()
                .map(|option| selection_label(option, current)),
        );
        labels.push("Cancel".to_string());

        let default = current
            .and_then(|c| request.options.iter().position(|option| option.id == c.id))
            .map_or(0, |index| index + 1);
        let choice = Select::new()
            .with_prompt("  Update set")
            .items(&labels)
            .default(default)
            .interact()?;

        if choice == 0 {
            let description: String = Input::new()
                .with_prompt("  Description")
                .default(request.request.clone())
                .interact_text()?;
            return Ok(ContainerDecision::CreateNew {
                description,
                lock: ask_lock("update set")?,
            });
        }
        let Some(selection) = request.options.get(choice - 1).cloned() else {
            return Ok(ContainerDecision::Cancel);
        };

        Ok(ContainerDecision::Select {
            selection,
            lock: ask_lock("update set")?,
        })
    }
}

/// Transcript printed to stdout.
pub struct TerminalTranscript {
    pub verbose: bool,
}

impl ChainObserver for TerminalTranscript {
    fn step_started(&self, position: usize, total: usize, step: &ExecutionStep) {
        let rationale = if step.rationale.is_empty() {
            String::new()
        } else {
            format!(" {}", style::dim(&step.rationale))
        };
        println!(
            "  {} {}{rationale}",
            style::accent(format!("[{position}/{total}]")),
            style::cyan(&step.tool_name)
        );
    }

    fn step_finished(&self, result: &StepResult) {
        if self.verbose {
            println!("{}", style::dim(result.raw_output.trim_end()));
        }
    }
}

impl Transcript for TerminalTranscript {
    fn assistant(&self, text: &str) {
        println!();
        println!("{text}");
        println!();
    }

    fn notice(&self, text: &str) {
        println!("  {}", style::dim(text));
    }

    fn error(&self, text: &str) {
        eprintln!("  {} {text}", console::style("error:").red().bold());
    }
}
