use colored::Colorize;
use console::Alignment;

use portwait::Target;

/// Outcome of probing one target for `portwait check`.
pub struct Row {
    pub target: Target,
    /// `Ok(listening)` or the message of a fatal probe error.
    pub status: Result<bool, String>,
}

/// Print one line per target with a status icon, aligned on the target column.
pub fn print_check_rows(rows: &[Row]) {
    let w_target = rows
        .iter()
        .map(|r| r.target.to_string().len())
        .max()
        .unwrap_or(0);

    // Measure actual display width of the icons so columns line up even when
    // ✓/✗ render as double-width in some fonts.
    let w_icon = console::measure_text_width("✓").max(1);

    for row in rows {
        let (icon, name, status) = match &row.status {
            Ok(true) => (
                "✓".green().to_string(),
                row.target.to_string().green().bold().to_string(),
                "open".green().to_string(),
            ),
            Ok(false) => (
                "✗".red().to_string(),
                row.target.to_string(),
                "closed".dimmed().to_string(),
            ),
            Err(msg) => (
                "!".yellow().to_string(),
                row.target.to_string(),
                msg.yellow().to_string(),
            ),
        };
        println!("  {} {}  {}", pad(&icon, w_icon), pad(&name, w_target), status);
    }
}

/// One-line result for the waiting commands.
pub fn print_wait_result(verb: &str, targets: &[Target], reached: bool) {
    let names: Vec<String> = targets.iter().map(|t| t.to_string()).collect();
    let names = names.join(", ");
    if reached {
        println!("{} {} {}", "●".green(), names.green().bold(), verb.green());
    } else {
        println!(
            "{} {} {}",
            "○".dimmed(),
            names.bold(),
            format!("not {} before timeout", verb).yellow()
        );
    }
}

/// Pad an ANSI-colored string to a visible width using console's awareness of escape codes.
fn pad(s: &str, width: usize) -> String {
    console::pad_str(s, width, Alignment::Left, None).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_ignores_color_codes() {
        colored::control::set_override(true);
        let s = "ab".green().to_string();
        let padded = pad(&s, 4);
        assert_eq!(console::measure_text_width(&padded), 4);
    }
}
