//! Output formatting for human-readable and JSON modes.

use serde::Serialize;

pub fn print_success(msg: &str, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::json!({ "status": "ok", "message": msg }));
    } else {
        println!("ok: {msg}");
    }
}

pub fn print_warning(msg: &str, json_mode: bool) {
    if json_mode {
        eprintln!("{}", serde_json::json!({ "warning": msg }));
    } else {
        eprintln!("warning: {msg}");
    }
}

pub fn print_error(msg: &str, json_mode: bool) {
    if json_mode {
        eprintln!("{}", serde_json::json!({ "error": msg }));
    } else {
        eprintln!("error: {msg}");
    }
}

/// JSON in JSON mode, pretty JSON otherwise.
pub fn print_value<T: Serialize>(value: &T, json_mode: bool) {
    let rendered = if json_mode {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    match rendered {
        Ok(s) => println!("{s}"),
        Err(e) => print_error(&format!("json serialization failed: {e}"), json_mode),
    }
}

/// Column-aligned table in human mode, an array of objects in JSON mode.
pub fn print_table(headers: &[&str], rows: &[Vec<String>], json_mode: bool) {
    if json_mode {
        let arr: Vec<serde_json::Value> = rows
            .iter()
            .map(|row| {
                let obj: serde_json::Map<String, serde_json::Value> = headers
                    .iter()
                    .enumerate()
                    .map(|(i, h)| {
                        let val = row.get(i).cloned().unwrap_or_default();
                        (h.to_lowercase(), serde_json::Value::String(val))
                    })
                    .collect();
                serde_json::Value::Object(obj)
            })
            .collect();
        println!("{}", serde_json::Value::Array(arr));
        return;
    }

    if rows.is_empty() {
        println!("(no results)");
        return;
    }

    print!("{}", render_table(headers, rows));
}

fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<String>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:<w$}"))
            .collect();
        format!("{}\n", padded.join("  ").trim_end())
    };

    let mut out = line(headers.iter().map(|h| h.to_uppercase()).collect());
    out.push_str(&line(widths.iter().map(|w| "-".repeat(*w)).collect()));
    for row in rows {
        out.push_str(&line(row.clone()));
    }
    out
}

/// Human-readable byte count.
pub fn format_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KIB {
        format!("{bytes} B")
    } else if b < KIB * KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{:.1} MiB", b / (KIB * KIB))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_columns_align() {
        let rows = vec![
            vec!["Alice".to_string(), "sent".to_string()],
            vec!["Bartholomew".to_string(), "pending".to_string()],
        ];
        let rendered = render_table(&["name", "status"], &rows);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "NAME         STATUS");
        assert_eq!(lines[1], "-----------  -------");
        assert_eq!(lines[2], "Alice        sent");
        assert_eq!(lines[3], "Bartholomew  pending");
    }

    #[test]
    fn sizes_use_binary_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KiB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MiB");
    }
}
