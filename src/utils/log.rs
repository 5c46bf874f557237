// src/utils/log.rs

//! Banner and summary blocks written through the `log` facade.

const RULE_WIDTH: usize = 60;

/// Log a header
pub fn header(title: &str) {
    for line in header_lines(title) {
        ::log::info!("{}", line);
    }
}

/// Log a sub-item (indented)
pub fn sub_item(message: &str) {
    ::log::info!("    {}", message);
}

/// Log a separator line
pub fn separator() {
    ::log::info!("{}", "─".repeat(RULE_WIDTH));
}

/// Log a summary section
pub fn summary(title: &str, items: &[(&str, String)]) {
    for line in summary_lines(title, items) {
        ::log::info!("{}", line);
    }
}

fn header_lines(title: &str) -> Vec<String> {
    let border = "═".repeat(RULE_WIDTH);
    vec![border.clone(), format!("  {}", title), border]
}

fn summary_lines(title: &str, items: &[(&str, String)]) -> Vec<String> {
    let width = items.iter().map(|(key, _)| key.len()).max().unwrap_or(0);

    let mut lines = Vec::with_capacity(items.len() + 1);
    lines.push(format!("[SUMMARY] {}", title));
    for (key, value) in items {
        lines.push(format!("    {:<width$} : {}", key, value, width = width));
    }
    lines
}
