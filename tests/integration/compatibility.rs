//! Model capability and prompt template compatibility tests

use serde_json::json;

use crewkb::integration::{MODEL_CATEGORY, TEMPLATE_CATEGORY};
use crewkb::store::NewEntry;
use crewkb::{KnowledgeBase, KnowledgeError};

use super::helpers::*;

fn store_model(kb: &KnowledgeBase, vision: bool) {
    kb.update_model_capabilities(
        "model-x",
        body(json!({
            "model_id": "model-x",
            "capabilities": {"vision": vision, "function_calls": true},
            "optimization_tips": ["keep system prompts short"]
        })),
    )
    .expect("Failed to store model capabilities");
}

fn store_templates(kb: &KnowledgeBase) {
    kb.store_entry(
        TEMPLATE_CATEGORY,
        "template-needs-vision",
        body(json!({"name": "Describe image", "required_capabilities": ["vision"]})),
    )
    .unwrap();
    kb.store_entry(
        TEMPLATE_CATEGORY,
        "template-plain",
        body(json!({"name": "Summarize", "required_capabilities": []})),
    )
    .unwrap();
}

#[test]
fn test_vision_template_compatibility_flips_with_capability() {
    let (_temp, kb) = init_kb();
    kb.store()
        .add(
            NewEntry::new("gpt supports vision and function calls", MODEL_CATEGORY)
                .with_tags(["capability"]),
        )
        .unwrap();
    store_model(&kb, true);
    store_templates(&kb);

    assert!(kb
        .validate_model_compatibility("template-needs-vision", "model-x")
        .unwrap());

    store_model(&kb, false);
    assert!(!kb
        .validate_model_compatibility("template-needs-vision", "model-x")
        .unwrap());
    assert!(kb
        .validate_model_compatibility("template-plain", "model-x")
        .unwrap());

    let model = kb.get_model_capabilities("model-x").unwrap().unwrap();
    assert_eq!(model.version, 2);
}

#[test]
fn test_missing_documents_are_incompatible() {
    let (_temp, kb) = init_kb();
    store_templates(&kb);

    assert!(!kb
        .validate_model_compatibility("template-needs-vision", "model-unknown")
        .unwrap());
    store_model(&kb, true);
    assert!(!kb
        .validate_model_compatibility("template-missing", "model-x")
        .unwrap());
    assert!(kb.compatible_templates("model-unknown").unwrap().is_empty());
}

#[test]
fn test_compatible_templates_lists_satisfied_templates() {
    let (_temp, kb) = init_kb();
    store_model(&kb, false);
    store_templates(&kb);

    assert_eq!(
        kb.compatible_templates("model-x").unwrap(),
        vec!["template-plain"]
    );

    store_model(&kb, true);
    assert_eq!(
        kb.compatible_templates("model-x").unwrap(),
        vec!["template-needs-vision", "template-plain"]
    );
}

#[test]
fn test_capabilities_require_configured_fields() {
    let (_temp, kb) = init_kb();
    let err = kb
        .update_model_capabilities("model-y", body(json!({"model_id": "model-y"})))
        .unwrap_err();
    assert!(matches!(err, KnowledgeError::Configuration(ref msg) if msg.contains("capabilities")));
    assert!(kb.get_model_capabilities("model-y").unwrap().is_none());
}

#[test]
fn test_model_config_collects_best_practices_and_templates() {
    let (_temp, mut kb) = init_kb();
    store_model(&kb, true);
    store_templates(&kb);
    kb.store()
        .add(NewEntry::new(
            "model-x works best with numbered steps",
            "best-practices",
        ))
        .unwrap();

    let config = kb.get_model_config("model-x").unwrap().unwrap();
    assert_eq!(config.document.id, "model-x");
    assert_eq!(config.best_practices.len(), 1);
    assert_eq!(
        config.recommended_templates,
        vec!["template-needs-vision", "template-plain"]
    );

    assert!(kb.get_model_config("model-unknown").unwrap().is_none());
}

#[test]
fn test_optimization_tips_and_performance_metrics() {
    let (_temp, kb) = init_kb();
    store_model(&kb, true);

    assert_eq!(
        kb.get_optimization_tips("model-x").unwrap(),
        vec!["keep system prompts short"]
    );

    assert!(kb
        .update_model_performance("model-x", body(json!({"latency_ms": 310})))
        .unwrap());
    assert!(kb
        .update_model_performance("model-x", body(json!({"tokens_per_s": 55})))
        .unwrap());
    assert!(!kb
        .update_model_performance("model-unknown", body(json!({"latency_ms": 1})))
        .unwrap());

    let model = kb.get_model_capabilities("model-x").unwrap().unwrap();
    let metrics = model.object("performance_metrics");
    assert_eq!(metrics["latency_ms"], json!(310));
    assert_eq!(metrics["tokens_per_s"], json!(55));
    assert_eq!(model.version, 3);
}

#[test]
fn test_prompt_template_includes_related_content() {
    let (_temp, mut kb) = init_kb();
    store_templates(&kb);

    let template = kb
        .get_prompt_template("template-needs-vision")
        .unwrap()
        .unwrap();
    assert_eq!(template.document.get("name"), Some(&json!("Describe image")));
    assert!(kb.get_prompt_template("template-missing").unwrap().is_none());
}

fn store_template(kb: &KnowledgeBase, id: &str, required: serde_json::Value) {
    kb.store_entry(
        TEMPLATE_CATEGORY,
        id,
        body(json!({"name": id, "required_capabilities": required})),
    )
    .unwrap();
}

#[test]
fn test_required_capabilities_as_map_uses_keys() {
    let (_temp, kb) = init_kb();
    store_model(&kb, false);
    store_template(&kb, "template-map", json!({"vision": true}));

    assert!(!kb
        .validate_model_compatibility("template-map", "model-x")
        .unwrap());

    store_model(&kb, true);
    assert!(kb
        .validate_model_compatibility("template-map", "model-x")
        .unwrap());
}

#[test]
fn test_required_capabilities_as_list() {
    let (_temp, kb) = init_kb();
    store_model(&kb, true);
    store_template(&kb, "template-list", json!(["vision", "function_calls"]));
    store_template(&kb, "template-audio", json!(["audio"]));

    assert!(kb
        .validate_model_compatibility("template-list", "model-x")
        .unwrap());
    assert!(!kb
        .validate_model_compatibility("template-audio", "model-x")
        .unwrap());
}

#[test]
fn test_unreadable_required_capabilities_are_incompatible() {
    let (_temp, kb) = init_kb();
    store_model(&kb, true);
    store_template(&kb, "template-scalar", json!("vision"));
    store_template(&kb, "template-mixed", json!(["vision", 3]));

    assert!(!kb
        .validate_model_compatibility("template-scalar", "model-x")
        .unwrap());
    assert!(!kb
        .validate_model_compatibility("template-mixed", "model-x")
        .unwrap());
    assert!(kb.compatible_templates("model-x").unwrap().is_empty());
}
