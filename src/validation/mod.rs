//! Checkout payload validation.
//!
//! Every rule runs independently and all violations are collected, so a
//! client sees the complete list of problems in a single 400 response.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

pub const MIN_AMOUNT_IN_CENTS: i64 = 1000;
pub const SUPPORTED_CURRENCY: &str = "COP";
pub const CARD_PAYMENT_TYPE: &str = "CARD";
pub const MIN_REFERENCE_LEN: usize = 10;
pub const MIN_PHONE_DIGITS: usize = 10;
pub const LEGAL_ID_MIN_DIGITS: usize = 6;
pub const LEGAL_ID_MAX_DIGITS: usize = 12;
pub const MAX_INSTALLMENTS: i64 = u32::MAX as i64;
pub const TOKEN_MIN_SUFFIX_LEN: usize = 16;
pub const TOKEN_PREFIXES: &[&str] = &["tok_test_", "tok_live_"];
pub const REQUIRED_FIELDS: &[&str] = &[
    "amount_in_cents",
    "currency",
    "customer_email",
    "payment_method",
    "reference",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validates a raw checkout payload. An empty result means the payload is accepted.
pub fn validate_transaction_payload(payload: &Value) -> Vec<ValidationError> {
    let empty = Map::new();
    let fields = payload.as_object().unwrap_or(&empty);
    let mut errors = Vec::new();

    for field in REQUIRED_FIELDS {
        if is_missing(fields.get(*field)) {
            errors.push(ValidationError::new(*field, format!("{} is required", field)));
        }
    }

    if let Some(amount) = present(fields.get("amount_in_cents")) {
        match whole_number(amount) {
            Some(cents) if cents >= MIN_AMOUNT_IN_CENTS => {}
            _ => errors.push(ValidationError::new(
                "amount_in_cents",
                format!("must be an integer of at least {}", MIN_AMOUNT_IN_CENTS),
            )),
        }
    }

    if let Some(currency) = present(fields.get("currency")) {
        if currency.as_str() != Some(SUPPORTED_CURRENCY) {
            errors.push(ValidationError::new(
                "currency",
                format!("must be {}", SUPPORTED_CURRENCY),
            ));
        }
    }

    if let Some(email) = present(fields.get("customer_email")) {
        if !email.as_str().map(is_email_shaped).unwrap_or(false) {
            errors.push(ValidationError::new(
                "customer_email",
                "must be a valid email address",
            ));
        }
    }

    if let Some(method) = present(fields.get("payment_method")) {
        validate_payment_method(method, &mut errors);
    }

    if let Some(reference) = present(fields.get("reference")) {
        let long_enough = reference
            .as_str()
            .map(|r| r.chars().count() >= MIN_REFERENCE_LEN)
            .unwrap_or(false);
        if !long_enough {
            errors.push(ValidationError::new(
                "reference",
                format!("must be a string of at least {} characters", MIN_REFERENCE_LEN),
            ));
        }
    }

    if let Some(customer) = present(fields.get("customer_data")) {
        validate_customer_data(customer, &mut errors);
    }

    errors
}

fn validate_payment_method(method: &Value, errors: &mut Vec<ValidationError>) {
    let Some(method) = method.as_object() else {
        errors.push(ValidationError::new(
            "payment_method",
            "must be an object with a card token",
        ));
        return;
    };

    match method.get("token").and_then(Value::as_str) {
        Some(token) if is_card_token(token.trim()) => {}
        Some(_) => errors.push(ValidationError::new(
            "payment_method.token",
            "must look like tok_test_<alphanumeric> or tok_live_<alphanumeric>",
        )),
        None => errors.push(ValidationError::new(
            "payment_method.token",
            "payment_method.token is required",
        )),
    }

    if let Some(installments) = present(method.get("installments")) {
        if !whole_number(installments)
            .map(|n| (1..=MAX_INSTALLMENTS).contains(&n))
            .unwrap_or(false)
        {
            errors.push(ValidationError::new(
                "payment_method.installments",
                format!("must be an integer between 1 and {}", MAX_INSTALLMENTS),
            ));
        }
    }

    if let Some(kind) = present(method.get("type")) {
        if kind.as_str() != Some(CARD_PAYMENT_TYPE) {
            errors.push(ValidationError::new(
                "payment_method.type",
                format!("must be {}", CARD_PAYMENT_TYPE),
            ));
        }
    }
}

fn validate_customer_data(customer: &Value, errors: &mut Vec<ValidationError>) {
    let Some(customer) = customer.as_object() else {
        errors.push(ValidationError::new("customer_data", "must be an object"));
        return;
    };

    let full_name = customer.get("full_name").and_then(Value::as_str);
    if full_name.map(|n| n.split_whitespace().count()).unwrap_or(0) < 2 {
        errors.push(ValidationError::new(
            "customer_data.full_name",
            "must contain at least first and last name",
        ));
    }

    let phone = customer.get("phone_number").and_then(Value::as_str);
    if phone.map(count_digits).unwrap_or(0) < MIN_PHONE_DIGITS {
        errors.push(ValidationError::new(
            "customer_data.phone_number",
            format!("must contain at least {} digits", MIN_PHONE_DIGITS),
        ));
    }

    let legal_id = customer.get("legal_id").and_then(Value::as_str);
    if !legal_id.map(is_legal_id).unwrap_or(false) {
        errors.push(ValidationError::new(
            "customer_data.legal_id",
            format!(
                "must be {} to {} digits",
                LEGAL_ID_MIN_DIGITS, LEGAL_ID_MAX_DIGITS
            ),
        ));
    }
}

fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

pub(crate) fn present(value: Option<&Value>) -> Option<&Value> {
    if is_missing(value) {
        None
    } else {
        value
    }
}

/// Integer value of a JSON number, accepting floats with no fractional part.
pub(crate) fn whole_number(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }

    let f = value.as_f64()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

pub fn is_email_shaped(email: &str) -> bool {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    let clean = |part: &str| !part.is_empty() && !part.contains('@') && !part.contains(char::is_whitespace);
    if !clean(local) || !clean(domain) {
        return false;
    }

    domain
        .char_indices()
        .any(|(i, ch)| ch == '.' && i > 0 && i + 1 < domain.len())
}

pub fn is_card_token(token: &str) -> bool {
    TOKEN_PREFIXES.iter().any(|prefix| {
        token
            .strip_prefix(prefix)
            .map(|rest| {
                rest.len() >= TOKEN_MIN_SUFFIX_LEN && rest.chars().all(|ch| ch.is_ascii_alphanumeric())
            })
            .unwrap_or(false)
    })
}

pub fn is_legal_id(legal_id: &str) -> bool {
    let legal_id = legal_id.trim();
    (LEGAL_ID_MIN_DIGITS..=LEGAL_ID_MAX_DIGITS).contains(&legal_id.len())
        && legal_id.chars().all(|ch| ch.is_ascii_digit())
}

fn count_digits(value: &str) -> usize {
    value.chars().filter(|ch| ch.is_ascii_digit()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_payload() -> Value {
        json!({
            "amount_in_cents": 50000,
            "currency": "COP",
            "customer_email": "a@b.com",
            "payment_method": { "token": "tok_test_1234567890123456" },
            "reference": "ORDER-ABCDEFGH",
            "customer_data": {
                "full_name": "Jane Doe",
                "phone_number": "3001234567",
                "legal_id": "123456789"
            }
        })
    }

    fn fields(errors: &[ValidationError]) -> Vec<&'static str> {
        errors.iter().map(|e| e.field).collect()
    }

    #[test]
    fn test_valid_payload_has_no_errors() {
        assert!(validate_transaction_payload(&valid_payload()).is_empty());
    }

    #[test]
    fn test_each_missing_required_field_is_named() {
        for field in REQUIRED_FIELDS {
            let mut payload = valid_payload();
            payload.as_object_mut().unwrap().remove(*field);

            let errors = validate_transaction_payload(&payload);
            assert!(
                errors.iter().any(|e| e.field == *field && e.message.contains(field)),
                "missing {} not reported: {:?}",
                field,
                errors
            );
        }
    }

    #[test]
    fn test_all_violations_are_collected() {
        let payload = json!({
            "amount_in_cents": 10,
            "currency": "USD",
            "customer_email": "not-an-email",
            "payment_method": { "token": "card_123", "installments": 0, "type": "NEQUI" },
            "reference": "short"
        });

        let errors = validate_transaction_payload(&payload);
        assert_eq!(
            fields(&errors),
            vec![
                "amount_in_cents",
                "currency",
                "customer_email",
                "payment_method.token",
                "payment_method.installments",
                "payment_method.type",
                "reference",
            ]
        );
    }

    #[test]
    fn test_non_object_payload_reports_every_required_field() {
        let errors = validate_transaction_payload(&json!("hello"));
        assert_eq!(fields(&errors), REQUIRED_FIELDS.to_vec());
    }

    #[test]
    fn test_empty_string_counts_as_missing() {
        let mut payload = valid_payload();
        payload["reference"] = json!("   ");
        let errors = validate_transaction_payload(&payload);
        assert_eq!(fields(&errors), vec!["reference"]);
        assert!(errors[0].message.contains("required"));
    }

    #[test]
    fn test_amount_rules() {
        let mut payload = valid_payload();
        payload["amount_in_cents"] = json!(999);
        assert_eq!(fields(&validate_transaction_payload(&payload)), vec!["amount_in_cents"]);

        payload["amount_in_cents"] = json!(1000);
        assert!(validate_transaction_payload(&payload).is_empty());

        payload["amount_in_cents"] = json!(1500.5);
        assert_eq!(fields(&validate_transaction_payload(&payload)), vec!["amount_in_cents"]);

        payload["amount_in_cents"] = json!(2000.0);
        assert!(validate_transaction_payload(&payload).is_empty());

        payload["amount_in_cents"] = json!("50000");
        assert_eq!(fields(&validate_transaction_payload(&payload)), vec!["amount_in_cents"]);
    }

    #[test]
    fn test_payment_method_must_be_object() {
        let mut payload = valid_payload();
        payload["payment_method"] = json!("tok_test_1234567890123456");
        let errors = validate_transaction_payload(&payload);
        assert_eq!(fields(&errors), vec!["payment_method"]);
    }

    #[test]
    fn test_installments_must_fit_u32() {
        let mut payload = valid_payload();
        payload["payment_method"]["installments"] = json!(u32::MAX as i64 + 1);
        assert_eq!(
            fields(&validate_transaction_payload(&payload)),
            vec!["payment_method.installments"]
        );

        payload["payment_method"]["installments"] = json!(u32::MAX);
        assert!(validate_transaction_payload(&payload).is_empty());
    }

    #[test]
    fn test_card_type_is_allowed() {
        let mut payload = valid_payload();
        payload["payment_method"] =
            json!({ "type": "CARD", "token": "tok_live_ABCDEF1234567890", "installments": 3 });
        assert!(validate_transaction_payload(&payload).is_empty());
    }

    #[test]
    fn test_customer_data_rules() {
        let mut payload = valid_payload();
        payload["customer_data"] = json!({
            "full_name": "Jane",
            "phone_number": "300-123",
            "legal_id": "12AB"
        });

        let errors = validate_transaction_payload(&payload);
        assert_eq!(
            fields(&errors),
            vec![
                "customer_data.full_name",
                "customer_data.phone_number",
                "customer_data.legal_id",
            ]
        );
    }

    #[test]
    fn test_customer_data_is_optional() {
        let mut payload = valid_payload();
        payload.as_object_mut().unwrap().remove("customer_data");
        assert!(validate_transaction_payload(&payload).is_empty());
    }

    #[test]
    fn test_phone_digits_ignore_formatting() {
        let mut payload = valid_payload();
        payload["customer_data"]["phone_number"] = json!("+57 (300) 123-4567");
        assert!(validate_transaction_payload(&payload).is_empty());
    }

    #[test]
    fn test_email_shape() {
        assert!(is_email_shaped("jane.doe@shop.co"));
        assert!(is_email_shaped("  a@b.com "));
        assert!(!is_email_shaped("a@b"));
        assert!(!is_email_shaped("a@.com"));
        assert!(!is_email_shaped("a@b."));
        assert!(!is_email_shaped("@b.com"));
        assert!(!is_email_shaped("a b@c.com"));
        assert!(!is_email_shaped("a@b@c.com"));
    }

    #[test]
    fn test_card_token_shape() {
        assert!(is_card_token("tok_test_1234567890123456"));
        assert!(is_card_token("tok_live_abcdefABCDEF123456"));
        assert!(!is_card_token("tok_test_123456789012345"));
        assert!(!is_card_token("tok_prod_1234567890123456"));
        assert!(!is_card_token("tok_test_1234-567890123456"));
    }

    #[test]
    fn test_legal_id_shape() {
        assert!(is_legal_id("123456"));
        assert!(is_legal_id("123456789012"));
        assert!(!is_legal_id("12345"));
        assert!(!is_legal_id("1234567890123"));
        assert!(!is_legal_id("12345a"));
    }
}
