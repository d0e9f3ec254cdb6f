use serde_json::Value;

use super::{cell, result_of};

/// Headline fields in order of priority.
const PRIORITY_KEYS: [&str; 5] = [
    "monthly_payment",
    "score",
    "approval_likelihood",
    "total_contributions",
    "progress_pct",
];

/// Print just the key answer value from the output, falling back to the
/// first non-null field of the result.
pub fn print_minimal(value: &Value) {
    println!("{}", headline(value));
}

fn headline(value: &Value) -> String {
    let result_obj = result_of(value);

    if let Value::Object(map) = result_obj {
        for key in PRIORITY_KEYS {
            if let Some(val) = map.get(key) {
                if !val.is_null() {
                    return cell(val);
                }
            }
        }
        // Contribution reports nest the total under the summary.
        if let Some(Value::Object(summary)) = map.get("summary") {
            if let Some(total) = summary.get("total_contributions") {
                return cell(total);
            }
        }

        if let Some((key, val)) = map.iter().find(|(_, v)| !v.is_null()) {
            return format!("{}: {}", key, cell(val));
        }
    }

    cell(result_obj)
}
