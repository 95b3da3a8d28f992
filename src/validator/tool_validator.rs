//! Per-turn schema validation and ID normalization (§4.7). A single invalid
//! turn discards the whole conversation — no partial salvage.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use crate::model::{FunctionCall, Role, ToolSchema, Turn};

use super::error::ValidationError;
use super::json_extract::extract_balanced_json;

pub enum ValidationVerdict {
    Valid(Vec<Turn>),
    Discard(ValidationError),
}

static CUSTOMER_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^C\d+$").unwrap());
static LINE_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^L\d+$").unwrap());
static BILL_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^B\d+$").unwrap());
static PAYMENT_METHOD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(gift_card_|credit_card_|paypal_)").unwrap());

pub fn validate_conversation(turns: &[Turn], tools: &[ToolSchema]) -> ValidationVerdict {
    let tool_map: HashMap<&str, &ToolSchema> = tools.iter().map(|t| (t.name.as_str(), t)).collect();
    let mut normalized = Vec::with_capacity(turns.len());

    for turn in turns {
        if turn_calls_think_tool(&turn.value) {
            return ValidationVerdict::Discard(ValidationError::ThinkingToolDisallowed(
                "think".to_string(),
            ));
        }

        if turn.from != Role::FunctionCall {
            normalized.push(turn.clone());
            continue;
        }

        match validate_and_normalize_call(&turn.value, &tool_map) {
            Ok(value) => normalized.push(Turn::new(Role::FunctionCall, value)),
            Err(e) => return ValidationVerdict::Discard(e),
        }
    }

    ValidationVerdict::Valid(normalized)
}

fn turn_calls_think_tool(value: &str) -> bool {
    match extract_balanced_json(value) {
        Ok(extracted) => extracted
            .value
            .get("name")
            .and_then(|n| n.as_str())
            .map(|n| n == "think")
            .unwrap_or(false),
        Err(_) => false,
    }
}

fn validate_and_normalize_call(
    value: &str,
    tool_map: &HashMap<&str, &ToolSchema>,
) -> Result<String, ValidationError> {
    let extracted = extract_balanced_json(value)?;
    let obj = extracted
        .value
        .as_object()
        .ok_or(ValidationError::UnparsableCall)?;
    let name = obj
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or(ValidationError::UnparsableCall)?
        .to_string();

    let schema = tool_map
        .get(name.as_str())
        .ok_or_else(|| ValidationError::UnknownTool(name.clone()))?;

    let raw_arguments = obj.get("arguments").cloned().unwrap_or(json!({}));
    // Seed data in the wild sometimes double-encodes arguments as a JSON string.
    let arguments_value = match raw_arguments {
        Value::String(s) => {
            serde_json::from_str(&s).map_err(|_| ValidationError::ArgumentsNotObject)?
        }
        other => other,
    };
    let mut arguments = arguments_value
        .as_object()
        .cloned()
        .ok_or(ValidationError::ArgumentsNotObject)?;

    for required in &schema.parameters.required {
        if !arguments.contains_key(required) {
            return Err(ValidationError::MissingRequiredArgument(required.clone()));
        }
    }

    for key in arguments.keys() {
        if !schema.parameters.properties.contains_key(key) {
            return Err(ValidationError::UndeclaredArgument(key.clone()));
        }
    }

    for (key, prop) in &schema.parameters.properties {
        if let (Some(declared_type), Some(actual)) = (&prop.type_, arguments.get(key)) {
            check_type(key, actual, declared_type, prop.items.as_ref().and_then(|i| i.type_.as_deref()))?;
        }
    }

    normalize_ids(&mut arguments)?;

    let call = FunctionCall {
        name,
        arguments,
        think_prefix: extracted.think_prefix,
    };
    Ok(reserialize(&call))
}

fn check_type(
    key: &str,
    value: &Value,
    declared_type: &str,
    item_type: Option<&str>,
) -> Result<(), ValidationError> {
    let matches = match declared_type {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => {
            if !value.is_array() {
                false
            } else if let Some(item_type) = item_type {
                value
                    .as_array()
                    .unwrap()
                    .iter()
                    .all(|elem| type_matches(elem, item_type))
            } else {
                true
            }
        }
        _ => true,
    };
    if matches {
        Ok(())
    } else {
        Err(ValidationError::TypeMismatch {
            name: key.to_string(),
            expected: declared_type.to_string(),
            actual: json_type_name(value).to_string(),
        })
    }
}

fn type_matches(value: &Value, declared_type: &str) -> bool {
    match declared_type {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        _ => true,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Rewrites common `payment_method_id` misspellings to their canonical
/// prefix before format validation, e.g. `cc_1234` -> `credit_card_1234`.
fn fix_payment_method_prefix(raw: &str) -> String {
    if PAYMENT_METHOD_RE.is_match(raw) {
        return raw.to_string();
    }

    const CREDIT_CARD_PREFIXES: &[&str] = &["creditcard_", "credit_", "cc_", "card_", "visa_"];
    const GIFT_CARD_PREFIXES: &[&str] = &["giftcard_", "gift_", "gc_"];

    for prefix in CREDIT_CARD_PREFIXES {
        if let Some(rest) = raw.strip_prefix(prefix) {
            return format!("credit_card_{rest}");
        }
    }
    for prefix in GIFT_CARD_PREFIXES {
        if let Some(rest) = raw.strip_prefix(prefix) {
            return format!("gift_card_{rest}");
        }
    }
    raw.to_string()
}

fn normalize_ids(args: &mut serde_json::Map<String, Value>) -> Result<(), ValidationError> {
    if let Some(Value::String(order_id)) = args.get("order_id").cloned() {
        let normalized = if order_id.starts_with('#') {
            order_id
        } else {
            format!("#{order_id}")
        };
        if !normalized.starts_with('#') || normalized.len() < 2 {
            return Err(ValidationError::InvalidIdFormat("order_id".to_string()));
        }
        args.insert("order_id".to_string(), json!(normalized));
    }

    if let Some(Value::String(payment_id)) = args.get("payment_method_id").cloned() {
        let fixed = fix_payment_method_prefix(&payment_id);
        if !PAYMENT_METHOD_RE.is_match(&fixed) {
            return Err(ValidationError::InvalidIdFormat(
                "payment_method_id".to_string(),
            ));
        }
        args.insert("payment_method_id".to_string(), json!(fixed));
    }

    if let Some(Value::String(email)) = args.get("email").cloned() {
        if !email.contains('@') {
            return Err(ValidationError::InvalidIdFormat("email".to_string()));
        }
    }

    for (key, prefix, re) in [
        ("customer_id", "C", &*CUSTOMER_ID_RE),
        ("line_id", "L", &*LINE_ID_RE),
        ("bill_id", "B", &*BILL_ID_RE),
    ] {
        if let Some(Value::String(raw)) = args.get(key).cloned() {
            let normalized = if raw.chars().all(|c| c.is_ascii_digit()) {
                format!("{prefix}{raw}")
            } else {
                raw
            };
            if !re.is_match(&normalized) {
                return Err(ValidationError::InvalidIdFormat(key.to_string()));
            }
            args.insert(key.to_string(), json!(normalized));
        }
    }

    Ok(())
}

fn reserialize(call: &FunctionCall) -> String {
    let body = json!({ "name": call.name, "arguments": call.arguments });
    let body_str = serde_json::to_string(&body).expect("FunctionCall always serializes");
    match &call.think_prefix {
        Some(prefix) => format!("{prefix}\n{body_str}"),
        None => body_str,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ToolParameters, ToolProperty};
    use std::collections::BTreeMap;

    fn tool(name: &str, required: &[&str], props: &[(&str, &str)]) -> ToolSchema {
        let mut properties = BTreeMap::new();
        for (key, ty) in props {
            properties.insert(
                key.to_string(),
                ToolProperty {
                    type_: Some(ty.to_string()),
                    items: None,
                },
            );
        }
        ToolSchema {
            name: name.to_string(),
            description: String::new(),
            parameters: ToolParameters {
                properties,
                required: required.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    #[test]
    fn missing_required_argument_discards() {
        let tools = vec![tool(
            "send_payment_request",
            &["customer_id", "bill_id"],
            &[("customer_id", "string"), ("bill_id", "string")],
        )];
        let turns = vec![Turn::new(
            Role::FunctionCall,
            r#"{"name":"send_payment_request","arguments":{"customer_id":"C1"}}"#,
        )];
        match validate_conversation(&turns, &tools) {
            ValidationVerdict::Discard(ValidationError::MissingRequiredArgument(field)) => {
                assert_eq!(field, "bill_id");
            }
            _ => panic!("expected discard"),
        }
    }

    #[test]
    fn unknown_tool_discards() {
        let tools = vec![tool("book_reservation", &[], &[])];
        let turns = vec![Turn::new(
            Role::FunctionCall,
            r#"{"name":"delete_everything","arguments":{}}"#,
        )];
        assert!(matches!(
            validate_conversation(&turns, &tools),
            ValidationVerdict::Discard(ValidationError::UnknownTool(_))
        ));
    }

    #[test]
    fn telecom_bare_digit_customer_id_is_normalized() {
        let tools = vec![tool(
            "refuel_data",
            &["customer_id", "line_id", "gb_amount"],
            &[
                ("customer_id", "string"),
                ("line_id", "string"),
                ("gb_amount", "number"),
            ],
        )];
        let turns = vec![Turn::new(
            Role::FunctionCall,
            r#"{"name":"refuel_data","arguments":{"customer_id":"5","line_id":"L1","gb_amount":1.0}}"#,
        )];
        match validate_conversation(&turns, &tools) {
            ValidationVerdict::Valid(normalized) => {
                assert!(normalized[0].value.contains("\"customer_id\":\"C5\""));
            }
            ValidationVerdict::Discard(e) => panic!("unexpected discard: {e}"),
        }
    }

    #[test]
    fn retail_order_id_gets_hash_prefix() {
        let tools = vec![tool("get_order_details", &["order_id"], &[("order_id", "string")])];
        let turns = vec![Turn::new(
            Role::FunctionCall,
            r#"{"name":"get_order_details","arguments":{"order_id":"1001"}}"#,
        )];
        match validate_conversation(&turns, &tools) {
            ValidationVerdict::Valid(normalized) => {
                assert!(normalized[0].value.contains("\"order_id\":\"#1001\""));
            }
            ValidationVerdict::Discard(e) => panic!("unexpected discard: {e}"),
        }
    }

    #[test]
    fn misspelled_credit_card_prefix_is_rewritten() {
        let tools = vec![tool(
            "send_payment_request",
            &["payment_method_id"],
            &[("payment_method_id", "string")],
        )];
        let turns = vec![Turn::new(
            Role::FunctionCall,
            r#"{"name":"send_payment_request","arguments":{"payment_method_id":"cc_1234"}}"#,
        )];
        match validate_conversation(&turns, &tools) {
            ValidationVerdict::Valid(normalized) => {
                assert!(normalized[0].value.contains("\"payment_method_id\":\"credit_card_1234\""));
            }
            ValidationVerdict::Discard(e) => panic!("unexpected discard: {e}"),
        }
    }

    #[test]
    fn misspelled_gift_card_prefix_is_rewritten() {
        let tools = vec![tool(
            "send_payment_request",
            &["payment_method_id"],
            &[("payment_method_id", "string")],
        )];
        let turns = vec![Turn::new(
            Role::FunctionCall,
            r#"{"name":"send_payment_request","arguments":{"payment_method_id":"giftcard_9"}}"#,
        )];
        match validate_conversation(&turns, &tools) {
            ValidationVerdict::Valid(normalized) => {
                assert!(normalized[0].value.contains("\"payment_method_id\":\"gift_card_9\""));
            }
            ValidationVerdict::Discard(e) => panic!("unexpected discard: {e}"),
        }
    }

    #[test]
    fn already_canonical_gift_card_id_is_left_untouched() {
        let tools = vec![tool(
            "send_payment_request",
            &["payment_method_id"],
            &[("payment_method_id", "string")],
        )];
        let turns = vec![Turn::new(
            Role::FunctionCall,
            r#"{"name":"send_payment_request","arguments":{"payment_method_id":"gift_card_9"}}"#,
        )];
        match validate_conversation(&turns, &tools) {
            ValidationVerdict::Valid(normalized) => {
                assert!(normalized[0].value.contains("\"payment_method_id\":\"gift_card_9\""));
            }
            ValidationVerdict::Discard(e) => panic!("unexpected discard: {e}"),
        }
    }

    #[test]
    fn unrecognized_payment_method_prefix_is_still_rejected() {
        let tools = vec![tool(
            "send_payment_request",
            &["payment_method_id"],
            &[("payment_method_id", "string")],
        )];
        let turns = vec![Turn::new(
            Role::FunctionCall,
            r#"{"name":"send_payment_request","arguments":{"payment_method_id":"bitcoin_1"}}"#,
        )];
        assert!(matches!(
            validate_conversation(&turns, &tools),
            ValidationVerdict::Discard(ValidationError::InvalidIdFormat(_))
        ));
    }

    #[test]
    fn email_without_at_sign_is_rejected() {
        let tools = vec![tool("update_email", &["email"], &[("email", "string")])];
        let turns = vec![Turn::new(
            Role::FunctionCall,
            r#"{"name":"update_email","arguments":{"email":"not-an-email"}}"#,
        )];
        assert!(matches!(
            validate_conversation(&turns, &tools),
            ValidationVerdict::Discard(ValidationError::InvalidIdFormat(_))
        ));
    }

    #[test]
    fn extra_undeclared_argument_discards() {
        let tools = vec![tool("book_reservation", &[], &[("passenger_name", "string")])];
        let turns = vec![Turn::new(
            Role::FunctionCall,
            r#"{"name":"book_reservation","arguments":{"passenger_name":"A","extra_field":"x"}}"#,
        )];
        assert!(matches!(
            validate_conversation(&turns, &tools),
            ValidationVerdict::Discard(ValidationError::UndeclaredArgument(_))
        ));
    }

    #[test]
    fn think_tool_call_is_disallowed() {
        let tools = vec![tool("book_reservation", &[], &[])];
        let turns = vec![Turn::new(
            Role::FunctionCall,
            r#"{"name":"think","arguments":{"thought":"hmm"}}"#,
        )];
        assert!(matches!(
            validate_conversation(&turns, &tools),
            ValidationVerdict::Discard(ValidationError::ThinkingToolDisallowed(_))
        ));
    }

    #[test]
    fn non_function_call_turns_pass_through_unchanged() {
        let tools = vec![tool("book_reservation", &[], &[])];
        let turns = vec![Turn::new(Role::Human, "hello")];
        match validate_conversation(&turns, &tools) {
            ValidationVerdict::Valid(normalized) => assert_eq!(normalized.len(), 1),
            ValidationVerdict::Discard(e) => panic!("unexpected discard: {e}"),
        }
    }

    #[test]
    fn json_string_encoded_arguments_are_decoded_once() {
        let tools = vec![tool("book_reservation", &["passenger_name"], &[("passenger_name", "string")])];
        let turns = vec![Turn::new(
            Role::FunctionCall,
            r#"{"name":"book_reservation","arguments":"{\"passenger_name\":\"A\"}"}"#,
        )];
        match validate_conversation(&turns, &tools) {
            ValidationVerdict::Valid(_) => {}
            ValidationVerdict::Discard(e) => panic!("unexpected discard: {e}"),
        }
    }
}
