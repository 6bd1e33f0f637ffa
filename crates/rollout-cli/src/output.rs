use rollout_core::runner::Console;
use serde::Serialize;

/// With `--json`, stdout carries only the JSON document; progress and tool
/// output move to stderr.
pub fn console(json: bool) -> Console {
    if json {
        Console::Stderr
    } else {
        Console::Stdout
    }
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Render rows as left-aligned columns under `headers`.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    out.push_str(&format_row(headers.iter().copied(), &widths));
    out.push('\n');
    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    out.push_str(&sep.join("  "));
    out.push('\n');
    for row in rows {
        out.push_str(&format_row(row.iter().map(String::as_str), &widths));
        out.push('\n');
    }
    out
}

fn format_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &w)| format!("{cell:w$}"))
        .collect();
    padded.join("  ").trim_end().to_string()
}

pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_align_to_widest_cell() {
        let rows = vec![
            vec!["az".to_string(), "/usr/bin/az".to_string()],
            vec!["terraform".to_string(), "/opt/tf".to_string()],
        ];
        let table = render_table(&["TOOL", "PATH"], &rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "TOOL       PATH");
        assert_eq!(lines[1], "---------  -----------");
        assert_eq!(lines[2], "az         /usr/bin/az");
        assert_eq!(lines[3], "terraform  /opt/tf");
    }
}
