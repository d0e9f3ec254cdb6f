use serde_json::Value;
use std::io;

use super::{cell, flatten_fields, result_of};

/// Collections written as CSV rows when present.
const CSV_ROWS: [&str; 2] = ["schedule", "history"];

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let written = write_csv(&mut wtr, result_of(value))
        .and_then(|_| wtr.flush().map_err(csv::Error::from));
    if let Err(e) = written {
        tracing::error!(error = %e, "failed to write CSV output");
    }
}

fn write_csv<W: io::Write>(wtr: &mut csv::Writer<W>, result: &Value) -> Result<(), csv::Error> {
    if let Value::Object(map) = result {
        for name in CSV_ROWS {
            if let Some(Value::Array(rows)) = map.get(name) {
                return write_rows(wtr, rows);
            }
        }
    }

    if let Value::Array(rows) = result {
        return write_rows(wtr, rows);
    }

    let mut fields = Vec::new();
    flatten_fields("", result, &mut fields);
    wtr.write_record(["field", "value"])?;
    for (key, val) in fields {
        wtr.write_record([key, val])?;
    }
    Ok(())
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) -> Result<(), csv::Error> {
    let Some(Value::Object(first)) = rows.first() else {
        for item in rows {
            wtr.write_record([cell(item)])?;
        }
        return Ok(());
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    wtr.write_record(&headers)?;
    for item in rows {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(cell).unwrap_or_default())
                .collect();
            wtr.write_record(&row)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(value: &Value) -> String {
        let mut buf = Vec::new();
        {
            let mut wtr = csv::Writer::from_writer(&mut buf);
            write_csv(&mut wtr, result_of(value)).unwrap();
            wtr.flush().unwrap();
        }
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_schedule_rows() {
        let value = json!({
            "result": {
                "monthly_payment": "100",
                "schedule": [
                    {"month": 1, "payment": "100", "remaining_balance": "100"},
                    {"month": 2, "payment": "100", "remaining_balance": "0"}
                ]
            },
            "warnings": []
        });
        let out = render(&value);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("month"));
        assert!(lines[2].starts_with('2'));
    }

    #[test]
    fn test_field_value_fallback() {
        let value = json!({"progress_pct": "75", "target_reached": false});
        let out = render(&value);
        assert!(out.starts_with("field,value"));
        assert!(out.contains("target_reached,false"));
    }
}
