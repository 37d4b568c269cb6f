//! Router fallback against simulated upstreams.
//!
//! `wiremock` stands in for the gateway and the per-model endpoints so each
//! failure mode and response shape is exercised over real HTTP.

use std::time::Duration;

use daxcur_core::config::ChatConfig;
use daxcur_core::ModelType;
use daxcur_llm::{ChatMessage, ChatRouter, DaxCorrector, Role, Tier};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(gateway: Option<&MockServer>, direct: Option<&MockServer>) -> ChatConfig {
    let mut config = ChatConfig {
        gateway_url: gateway.map(MockServer::uri),
        request_timeout_ms: 500,
        ..ChatConfig::default()
    };
    if let Some(server) = direct {
        config.endpoints.set(ModelType::Cognos, server.uri());
    }
    config
}

fn ask(text: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system("You convert Cognos expressions to DAX."),
        ChatMessage::user(text),
    ]
}

// ---------------------------------------------------------------------------
// Tier ordering
// ---------------------------------------------------------------------------

#[tokio::test]
async fn gateway_answers_first() {
    let gateway = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/chat"))
        .and(body_partial_json(json!({"model_type": "cognos"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "reply": {"role": "assistant", "content": "from gateway"}
        })))
        .expect(1)
        .mount(&gateway)
        .await;

    let direct = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "direct"})))
        .expect(0)
        .mount(&direct)
        .await;

    let router = ChatRouter::from_config(&config(Some(&gateway), Some(&direct)));
    let routed = router.send(ModelType::Cognos, &ask("hello")).await;
    assert_eq!(routed.tier, Tier::Gateway);
    assert_eq!(routed.reply.content, "from gateway");
    assert_eq!(routed.reply.role, Role::Assistant);
}

#[tokio::test]
async fn gateway_failure_falls_to_direct_openai_shape() {
    let gateway = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(1)
        .mount(&gateway)
        .await;

    let direct = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .and(body_partial_json(json!({"max_tokens": 1000, "model_type": "cognos"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "X"}}]
        })))
        .mount(&direct)
        .await;

    let router = ChatRouter::from_config(&config(Some(&gateway), Some(&direct)));
    let routed = router.send(ModelType::Cognos, &ask("hello")).await;
    assert_eq!(routed.tier, Tier::Direct);
    assert_eq!(routed.reply, ChatMessage::assistant("X"));
}

#[tokio::test]
async fn gateway_timeout_falls_through() {
    let gateway = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"reply": {"role": "assistant", "content": "late"}}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&gateway)
        .await;

    let direct = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"generated_text": "H"})))
        .mount(&direct)
        .await;

    let router = ChatRouter::from_config(&config(Some(&gateway), Some(&direct)));
    let routed = router.send(ModelType::Cognos, &ask("hello")).await;
    assert_eq!(routed.tier, Tier::Direct);
    assert_eq!(routed.reply.content, "H");
}

#[tokio::test]
async fn both_tiers_down_ends_at_mock() {
    let gateway = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&gateway)
        .await;
    let direct = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&direct)
        .await;

    let router = ChatRouter::from_config(&config(Some(&gateway), Some(&direct)));
    let routed = router.send(ModelType::Cognos, &ask("please OPTIMIZE")).await;
    assert_eq!(routed.tier, Tier::Mock);
    assert!(routed.reply.content.contains("REMOVEFILTERS"));
}

#[tokio::test]
async fn empty_upstream_content_falls_through() {
    let direct = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": ""})))
        .mount(&direct)
        .await;

    let router = ChatRouter::from_config(&config(None, Some(&direct)));
    let routed = router.send(ModelType::Cognos, &ask("hello")).await;
    assert_eq!(routed.tier, Tier::Mock);
    assert!(!routed.reply.content.is_empty());
}

#[tokio::test]
async fn unconfigured_model_type_skips_direct() {
    let direct = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "cognos only"})))
        .expect(0)
        .mount(&direct)
        .await;

    // Only cognos has an endpoint.
    let router = ChatRouter::from_config(&config(None, Some(&direct)));
    let routed = router.send(ModelType::Tableau, &ask("hello")).await;
    assert_eq!(routed.tier, Tier::Mock);
}

// ---------------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn direct_response_shapes_are_normalised() {
    let shapes = [
        (json!({"response": "ollama"}), "ollama"),
        (json!({"output": "out"}), "out"),
        (json!([{"generated_text": "hf-list"}]), "hf-list"),
        (json!({"text": "unknown"}), r#"{"text":"unknown"}"#),
    ];

    for (body, expected) in shapes {
        let direct = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&direct)
            .await;

        let router = ChatRouter::from_config(&config(None, Some(&direct)));
        let routed = router.send(ModelType::Cognos, &ask("hello")).await;
        assert_eq!(routed.tier, Tier::Direct);
        assert_eq!(routed.reply.content, expected);
    }
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancel_abandons_slow_upstream() {
    let gateway = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&gateway)
        .await;

    let mut cfg = config(Some(&gateway), None);
    cfg.request_timeout_ms = 10_000;
    let router = ChatRouter::from_config(&cfg);

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let result = router
        .send_with_cancel(ModelType::Cognos, &ask("hello"), &token)
        .await;
    assert!(result.is_err());
    assert!(started.elapsed() < Duration::from_secs(4));
}

// ---------------------------------------------------------------------------
// DAX correction
// ---------------------------------------------------------------------------

#[tokio::test]
async fn correction_success_clamps_confidence() {
    let direct = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/dax/correct"))
        .and(body_partial_json(json!({"target_dax_formula": "SUM([Revenue])"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "correctedFormula": "CALCULATE(SUM([Revenue]))",
            "explanation": "wrap in CALCULATE",
            "confidenceScore": 1.7
        })))
        .mount(&direct)
        .await;

    let corrector = DaxCorrector::from_config(&config(None, Some(&direct)));
    let out = corrector
        .correct_dax(ModelType::Cognos, "total([Revenue])", "SUM([Revenue])")
        .await;
    assert!(out.success);
    assert_eq!(out.corrected_formula, "CALCULATE(SUM([Revenue]))");
    assert!((out.confidence_score - 1.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn correction_error_status_echoes_target() {
    let direct = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&direct)
        .await;

    let corrector = DaxCorrector::from_config(&config(None, Some(&direct)));
    let out = corrector
        .correct_dax(ModelType::Cognos, "total([Revenue])", "SUM([Revenue])")
        .await;
    assert!(!out.success);
    assert_eq!(out.corrected_formula, "SUM([Revenue])");
    assert!(out.confidence_score.abs() < f64::EPSILON);
    assert!(out.explanation.contains("503"));
}
