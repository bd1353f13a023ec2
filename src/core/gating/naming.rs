use chrono::NaiveDate;

/// Render a tracking-container name. Supported tokens are `{prefix}`,
/// `{date}` (`YYYYMMDD`) and `{description}`; whitespace runs in the
/// description collapse to a single `_`.
pub fn render_container_name(
    template: &str,
    prefix: &str,
    date: NaiveDate,
    description: &str,
) -> String {
    let description = description.split_whitespace().collect::<Vec<_>>().join("_");
    template
        .replace("{prefix}", prefix)
        .replace("{date}", &date.format("%Y%m%d").to_string())
        .replace("{description}", &description)
}
