use form_builder::{
    form::form_model::{FieldId, FieldSet},
    generator::{
        backend::{ChatCompletionsBackend, CompletionBackend, MockBackend, parse_chat_response},
        parse::{extract_json, parse_generated},
        prompt::{SYSTEM_PROMPT, build_user_message},
    },
    reconcile::error::FormError,
};

use crate::common::fixtures::text_field;

mod common;

// =========================================================================
// JSON extraction
// =========================================================================

#[test]
fn extract_json_handles_common_wrappers() {
    assert_eq!(extract_json(r#"[{"id":"a"}]"#), Some(r#"[{"id":"a"}]"#));
    assert_eq!(
        extract_json("```json\n[{\"id\":\"a\"}]\n```"),
        Some(r#"[{"id":"a"}]"#)
    );
    assert_eq!(
        extract_json("```\n[]\n```"),
        Some("[]")
    );
    assert_eq!(
        extract_json("Here is your form:\n[{\"id\":\"a\"}]\nLet me know!"),
        Some(r#"[{"id":"a"}]"#)
    );
    assert_eq!(
        extract_json(r#"{"fields": [{"id": "a"}]}"#),
        Some(r#"{"fields": [{"id": "a"}]}"#)
    );
    assert_eq!(
        extract_json("Here is the form [v2]:\n[{\"id\":\"t\"}]"),
        Some(r#"[{"id":"t"}]"#)
    );
    assert_eq!(
        extract_json("Version [1] of {your form} below\n```json\n[{\"id\":\"t\"}]\n```"),
        Some(r#"[{"id":"t"}]"#)
    );
    assert_eq!(extract_json("no json here"), None);
    assert_eq!(extract_json("] backwards ["), None);
}

#[test]
fn parse_generated_ingests_fields() {
    let text = "```json\n[{\"id\": \"x\", \"type\": \"email\", \"conditions\": []}]\n```";
    let form = parse_generated(text).unwrap();
    assert_eq!(form.len(), 1);
    assert_eq!(form.fields[0].id, FieldId::from("x"));
}

#[test]
fn parse_generated_skips_bracketed_prose() {
    let text = "Here is the form [v2]:\n[{\"id\": \"t\", \"type\": \"text\", \"conditions\": {}}]\nDone [ok].";
    let form = parse_generated(text).unwrap();
    assert_eq!(form.len(), 1);
    assert_eq!(form.fields[0].id, FieldId::from("t"));
}

#[test]
fn parse_generated_without_brackets_is_generator_error() {
    let err = parse_generated("I could not build that form.").unwrap_err();
    assert!(matches!(err, FormError::Generator(_)));
}

#[test]
fn parse_generated_reports_bad_json() {
    let err = parse_generated("[{\"id\": \"x\",]").unwrap_err();
    assert!(matches!(err, FormError::JsonParse { .. }));
}

#[test]
fn parse_generated_reports_missing_id() {
    let err = parse_generated(r#"[{"type": "text"}]"#).unwrap_err();
    assert!(matches!(err, FormError::MalformedInput { .. }));
    assert!(err.is_fatal_to_round());
}

// =========================================================================
// Prompt assembly
// =========================================================================

#[test]
fn first_request_is_sent_bare() {
    assert_eq!(build_user_message("contact form", None).unwrap(), "contact form");
}

#[test]
fn later_requests_embed_current_form() {
    let form = FieldSet::new(vec![text_field("abc", "Name")]);
    let message = build_user_message("make name optional", Some(&form)).unwrap();

    let (prefix, request) = message.split_once("\n\n").unwrap();
    assert_eq!(request, "make name optional");
    let embedded = prefix.strip_prefix("Here's my existing form: ").unwrap();
    let value: serde_json::Value = serde_json::from_str(embedded).unwrap();
    assert_eq!(value[0]["id"], "abc");
    assert_eq!(value[0]["title"], "Name");
}

#[test]
fn system_prompt_describes_condition_forms() {
    for needle in ["\"and\"", "\"or\"", "\"field\"", "\"options\"", "is_not_selected"] {
        assert!(SYSTEM_PROMPT.contains(needle), "missing {}", needle);
    }
}

// =========================================================================
// Backends
// =========================================================================

#[test]
fn mock_backend_replays_in_order() {
    let backend = MockBackend::new(["one", "two"]);
    assert_eq!(backend.complete("s", "u1").unwrap(), "one");
    assert_eq!(backend.complete("s", "u2").unwrap(), "two");
    assert!(matches!(backend.complete("s", "u3"), Err(FormError::Generator(_))));
    assert_eq!(backend.requests(), vec!["u1", "u2", "u3"]);
}

#[test]
fn chat_response_yields_first_choice_content() {
    let raw = r#"{"choices":[{"message":{"role":"assistant","content":"[]"}}]}"#;
    assert_eq!(parse_chat_response(raw).unwrap(), "[]");
}

#[test]
fn chat_response_without_content_is_generator_error() {
    assert!(matches!(
        parse_chat_response(r#"{"choices":[]}"#),
        Err(FormError::Generator(_))
    ));
    assert!(matches!(
        parse_chat_response(r#"{"choices":[{"message":{"content":"  "}}]}"#),
        Err(FormError::Generator(_))
    ));
    assert!(matches!(
        parse_chat_response("<html>bad gateway</html>"),
        Err(FormError::JsonParse { .. })
    ));
}

#[test]
fn request_body_carries_both_messages() {
    let backend = ChatCompletionsBackend::new("http://localhost", "m", "k").with_sampling(0.5, 0.25);
    let body = serde_json::to_value(backend.build_request("sys", "usr")).unwrap();
    assert_eq!(body["model"], "m");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], "sys");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "usr");
    assert_eq!(body["temperature"], 0.5);
    assert_eq!(body["top_p"], 0.25);
    assert_eq!(body["stream"], false);
}

#[test]
fn http_backend_requires_credential() {
    let result = ChatCompletionsBackend::from_env(
        "http://localhost:1/v1/chat/completions",
        "m",
        "FORM_BUILDER_TEST_KEY_THAT_IS_NEVER_SET",
    );
    match result {
        Err(FormError::MissingCredential(var)) => {
            assert_eq!(var, "FORM_BUILDER_TEST_KEY_THAT_IS_NEVER_SET")
        }
        Err(other) => panic!("Expected MissingCredential, got {:?}", other),
        Ok(_) => panic!("Expected MissingCredential, got a backend"),
    }
}

#[test]
fn http_backend_surfaces_connection_failure() {
    let backend = ChatCompletionsBackend::new("http://127.0.0.1:9/v1/chat/completions", "m", "k");
    let err = backend.complete("s", "u").unwrap_err();
    assert!(matches!(err, FormError::Http { .. }));
    assert!(!err.is_fatal_to_round());
}
