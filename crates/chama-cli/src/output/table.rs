use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{cell, flatten_fields, result_of, ROW_COLLECTIONS};

/// Format output as tables using the tabled crate: scalar fields first,
/// then one table per row collection, then warnings and methodology.
pub fn print_table(value: &Value) {
    let result = result_of(value);

    match result {
        Value::Object(res_map) => {
            let mut fields = Vec::new();
            flatten_fields("", result, &mut fields);
            if !fields.is_empty() {
                let mut builder = Builder::default();
                builder.push_record(["Field", "Value"]);
                for (key, val) in fields {
                    builder.push_record([key, val]);
                }
                println!("{}", Table::from(builder));
            }

            for name in ROW_COLLECTIONS {
                if let Some(Value::Array(rows)) = res_map.get(name) {
                    println!("\n{}:", title(name));
                    print_rows(rows);
                }
            }
        }
        Value::Array(rows) => print_rows(rows),
        other => println!("{}", cell(other)),
    }

    if let Value::Object(envelope) = value {
        print_notes(envelope);
    }
}

fn print_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_rows(rows: &[Value]) {
    if rows.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = rows.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(headers.clone());

        for item in rows {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(cell).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }
        println!("{}", Table::from(builder));
    } else {
        for item in rows {
            println!("{}", cell(item));
        }
    }
}

fn title(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title() {
        assert_eq!(title("field_errors"), "Field errors");
        assert_eq!(title("schedule"), "Schedule");
    }
}
