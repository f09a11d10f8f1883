use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use uawire_edf::{EdfData, Value};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Compact,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// An EDF tree as JSON: `{"name", "value", "children"}` per element, the
/// value being null, a string, or a number.
pub fn tree_to_json(tree: &EdfData) -> serde_json::Value {
    let value = match tree.value() {
        Value::None => serde_json::Value::Null,
        Value::Str(s) => serde_json::Value::String(s.clone()),
        Value::Int(n) => serde_json::Value::from(*n),
    };
    serde_json::json!({
        "name": tree.name(),
        "value": value,
        "children": tree.children().iter().map(tree_to_json).collect::<Vec<_>>(),
    })
}

pub fn print_tree(tree: &EdfData, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&tree_to_json(tree)).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ELEMENT", "VALUE"]);
            add_rows(&mut table, tree, 0);
            println!("{table}");
        }
        // to_pretty terminates every line itself
        OutputFormat::Pretty => {
            print!("{}", tree.to_pretty());
        }
        OutputFormat::Compact => {
            println!("{tree}");
        }
    }
}

fn add_rows(table: &mut Table, tree: &EdfData, depth: usize) {
    let indent = "  ".repeat(depth);
    table.add_row(vec![
        format!("{indent}{}", tree.name()),
        value_text(tree.value()),
    ]);
    for child in tree.children() {
        add_rows(table, child, depth + 1);
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::None => String::new(),
        Value::Str(s) => s.clone(),
        Value::Int(n) => n.to_string(),
    }
}
