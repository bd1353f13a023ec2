use chainpilot::Config;
use chainpilot::core::preferences::{ContextSelection, Preferences};
use chainpilot::core::session::ConnectionStatus;
use chainpilot::ui::style;

fn selection_line(selection: Option<&ContextSelection>, locked: bool, enabled: bool) -> String {
    if !enabled {
        return style::dim("disabled");
    }
    let lock = if locked { " (locked)" } else { "" };
    match selection {
        Some(selection) => format!(
            "{} {}{lock}",
            style::value(&selection.name),
            style::dim(&selection.id)
        ),
        None => style::dim(format!("not selected{lock}")),
    }
}

pub fn render_status(config: &Config, status: &ConnectionStatus, tool_count: usize) -> String {
    let mut lines = vec![
        format!("◆ {}", style::header("chainpilot status")),
        String::new(),
        format!("  Version     {}", env!("CARGO_PKG_VERSION")),
        format!("  Config      {}", config.config_path.display()),
        format!(
            "  Preferences {}",
            config.resolved_preferences_path().display()
        ),
        String::new(),
        format!(
            "  Backend     {} {}",
            style::value(&config.backend.name),
            style::dim(format!("{} {}", config.backend.command, config.backend.args.join(" ")).trim_end())
        ),
    ];

    let status_line = match status {
        ConnectionStatus::Connected => style::success(status.label()),
        ConnectionStatus::Error(_) => style::yellow(status.label()),
        _ => style::dim(status.label()),
    };
    lines.push(format!("  Status      {status_line}"));
    if let Some(message) = status.message() {
        lines.push(format!("              {}", style::dim(message)));
    }
    lines.push(format!("  Tools       {tool_count}"));
    lines.push(String::new());
    lines.push(format!(
        "  Reasoning   {} {}",
        style::value(&config.reasoning.model),
        style::dim(&config.reasoning.base_url)
    ));

    lines.join("\n")
}

pub fn render_preferences(preferences: &Preferences) -> String {
    let scope = &preferences.execution_scope;
    let container = &preferences.tracking_container;
    [
        format!("◆ {}", style::header("Preferences")),
        String::new(),
        format!(
            "  Application scope  {}",
            selection_line(scope.current_selection.as_ref(), scope.locked, scope.enabled)
        ),
        format!(
            "  Update set         {}",
            selection_line(
                container.current_selection.as_ref(),
                container.locked,
                container.enabled
            )
        ),
        format!(
            "  Naming template    {}",
            style::cyan(&container.naming_template)
        ),
    ]
    .join("\n")
}
