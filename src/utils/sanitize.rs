use serde_json::Value;

/// Masks card tokens, contact details and credentials in JSON payloads for logging
pub fn sanitize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sanitized = serde_json::Map::new();
            for (key, val) in map {
                let sanitized_val = if is_sensitive_field(key) {
                    mask_value(val)
                } else {
                    sanitize_json(val)
                };
                sanitized.insert(key.clone(), sanitized_val);
            }
            Value::Object(sanitized)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sanitize_json).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_field(key: &str) -> bool {
    matches!(
        key.to_lowercase().as_str(),
        "token"
            | "acceptance_token"
            | "signature"
            | "customer_email"
            | "email"
            | "phone_number"
            | "legal_id"
            | "private_key"
            | "secret"
            | "authorization"
    )
}

fn mask_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(mask_secret(s)),
        _ => Value::String("****".to_string()),
    }
}

/// Keeps the first and last four characters of long values.
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() > 8 {
        let start: String = chars[..4].iter().collect();
        let end: String = chars[chars.len() - 4..].iter().collect();
        format!("{}****{}", start, end)
    } else {
        "****".to_string()
    }
}
