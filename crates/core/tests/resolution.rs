//! End-to-end resolution behavior through `CommandEngine`.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use voxtap_core::*;
use voxtap_providers::{GenerateResponse, LLMProvider, Message, ProviderError};

enum Reply {
    Text(&'static str),
    Fail,
    Hang,
}

struct MockProvider {
    reply: Reply,
    calls: AtomicUsize,
}

impl MockProvider {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl LLMProvider for MockProvider {
    async fn generate(&self, _messages: &[Message]) -> Result<GenerateResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.reply {
            Reply::Text(text) => Ok(GenerateResponse {
                content: Some(text.to_string()),
                finish_reason: "stop".to_string(),
            }),
            Reply::Fail => Err(ProviderError::Api("500: upstream down".to_string())),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Err(ProviderError::Http("unreachable".to_string()))
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

fn engine(provider: Option<Arc<MockProvider>>) -> CommandEngine {
    let settings = EngineSettings {
        provider_timeout: Duration::from_millis(100),
        ..EngineSettings::default()
    };
    CommandEngine::new(
        TargetRegistry::default_grid(),
        provider.map(|p| p as Arc<dyn LLMProvider>),
        Arc::new(SimulatedExecutor),
        settings,
    )
}

fn cmd(text: &str) -> Command {
    Command::new(text).unwrap()
}

#[tokio::test]
async fn test_ordinal_without_provider() {
    let outcome = engine(None).handle(cmd("1번 눌러줘")).await;
    assert_eq!(outcome.resolution.action(), ActionDescriptor::Tap { x: 100, y: 400 });
    assert!(outcome.error().is_none());
}

#[tokio::test]
async fn test_label_without_provider() {
    let outcome = engine(None).handle(cmd("구글 열어줘")).await;
    match outcome.resolution {
        Resolution::Resolved { action, target, .. } => {
            assert_eq!(action, ActionDescriptor::Tap { x: 100, y: 400 });
            assert_eq!(target, SymbolicTarget::Label("구글".to_string()));
        }
        other => panic!("Expected resolution, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_command_is_no_match() {
    let outcome = engine(None).handle(cmd("존재하지않는명령")).await;
    let err = outcome.error().unwrap();
    assert_eq!(err.code(), "no_match");
    assert_eq!(
        err,
        EngineError::NoMatch {
            llm: LlmStage::NoProvider
        }
    );
}

#[tokio::test]
async fn test_llm_takes_precedence_when_it_disagrees() {
    // The matcher alone would pick 구글 (id 1); the provider says 3번.
    let provider = MockProvider::new(Reply::Text("3번"));
    let outcome = engine(Some(provider.clone())).handle(cmd("구글 열어줘")).await;

    match outcome.resolution {
        Resolution::Resolved {
            action, strategy, ..
        } => {
            assert_eq!(action, ActionDescriptor::Tap { x: 260, y: 400 });
            assert_eq!(strategy, Strategy::Llm);
        }
        other => panic!("Expected resolution, got {:?}", other),
    }
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_out_of_range_reply_falls_through_on_original_command() {
    let provider = MockProvider::new(Reply::Text("25번"));
    let outcome = engine(Some(provider)).handle(cmd("2번 눌러줘")).await;

    match outcome.resolution {
        Resolution::Resolved {
            action,
            strategy,
            llm,
            ..
        } => {
            assert_eq!(action, ActionDescriptor::Tap { x: 180, y: 400 });
            assert_eq!(strategy, Strategy::Deterministic);
            assert_eq!(llm, LlmStage::Inconclusive);
        }
        other => panic!("Expected resolution, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unregistered_reply_falls_through() {
    let provider = MockProvider::new(Reply::Text("9번"));
    let outcome = engine(Some(provider)).handle(cmd("네이버")).await;

    match outcome.resolution {
        Resolution::Resolved { llm, strategy, .. } => {
            assert_eq!(llm, LlmStage::UnknownTarget(SymbolicTarget::Id(9)));
            assert_eq!(strategy, Strategy::Deterministic);
        }
        other => panic!("Expected resolution, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fallthrough_matches_direct_matcher() {
    let commands = [
        "1번 눌러줘",
        "구글 열어줘",
        "페이스북이랑 네이버",
        "3번 말고 구글",
        "존재하지않는명령",
    ];

    for reply in [Reply::Fail, Reply::Text("모르겠어요"), Reply::Hang] {
        let with_provider = engine(Some(MockProvider::new(reply)));
        let without = engine(None);

        for text in commands {
            let fallen = with_provider.handle(cmd(text)).await.resolution;
            let direct = without.handle(cmd(text)).await.resolution;
            assert_eq!(fallen.action(), direct.action(), "command: {}", text);
            assert_eq!(fallen.is_resolved(), direct.is_resolved(), "command: {}", text);
        }
    }
}

#[tokio::test]
async fn test_provider_error_is_not_surfaced() {
    let outcome = engine(Some(MockProvider::new(Reply::Fail)))
        .handle(cmd("존재하지않는명령"))
        .await;

    match outcome.error() {
        Some(EngineError::NoMatch {
            llm: LlmStage::ProviderError(detail),
        }) => assert!(detail.contains("upstream down")),
        other => panic!("Expected NoMatch with provider detail, got {:?}", other),
    }
}

#[tokio::test]
async fn test_every_request_is_recorded() {
    let engine = engine(None);
    for i in 1..=7 {
        engine.handle(cmd(&format!("{}번", i))).await;
    }

    let history = engine.history();
    let texts: Vec<_> = history.iter().map(|r| r.command.raw_text().to_string()).collect();
    assert_eq!(texts, vec!["3번", "4번", "5번", "6번", "7번"]);

    // 4번 to 7번 are not registered, so they are recorded with no action.
    assert_eq!(history[0].resolved_action, ActionDescriptor::Tap { x: 260, y: 400 });
    assert_eq!(history[4].resolved_action, ActionDescriptor::None);
}

#[tokio::test]
async fn test_cancelled_request_is_not_recorded() {
    let engine = Arc::new(CommandEngine::new(
        TargetRegistry::default_grid(),
        Some(MockProvider::new(Reply::Hang) as Arc<dyn LLMProvider>),
        Arc::new(SimulatedExecutor),
        EngineSettings {
            provider_timeout: Duration::from_secs(30),
            ..EngineSettings::default()
        },
    ));

    let task = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.handle(cmd("1번 눌러줘")).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    assert!(engine.history().is_empty());
    assert_eq!(engine.metrics().commands, 1);
}

#[tokio::test]
async fn test_ui_elements_resolve_to_center() {
    let command = cmd("로그인 버튼 눌러줘")
        .with_ui_elements(vec![ElementDescriptor {
            text: "로그인".to_string(),
            kind: "button".to_string(),
            bounds: Bounds {
                left: 100,
                top: 200,
                right: 300,
                bottom: 260,
            },
        }])
        .unwrap();

    let outcome = engine(None).handle(command).await;
    assert_eq!(outcome.resolution.action(), ActionDescriptor::Tap { x: 200, y: 230 });
}

#[tokio::test]
async fn test_dispatch_records_direct_actions() {
    let engine = engine(None);
    let dispatched = engine
        .dispatch(
            "open_app YouTube",
            ActionDescriptor::LaunchApp {
                name: "YouTube".to_string(),
            },
        )
        .await
        .unwrap();

    assert!(dispatched.performed);
    assert_eq!(dispatched.history.len(), 1);
    assert_eq!(engine.metrics().actions_dispatched, 1);

    let rejected = engine.dispatch("  ", ActionDescriptor::None).await;
    assert!(matches!(rejected, Err(EngineError::InvalidInput(_))));
}

#[tokio::test]
async fn test_perform_only_runs_resolved_actions() {
    let engine = engine(None);
    let resolved = engine.handle(cmd("1번")).await;
    let failed = engine.handle(cmd("없는 명령")).await;

    assert!(engine.perform(&resolved).await);
    assert!(!engine.perform(&failed).await);
}

#[tokio::test]
async fn test_concurrent_requests_all_recorded() {
    let engine = Arc::new(engine(None));
    let mut handles = Vec::new();
    for i in 0..20 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.handle(cmd(&format!("{}번 눌러줘", i % 3 + 1))).await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().error().is_none());
    }

    assert_eq!(engine.metrics().commands, 20);
    assert_eq!(engine.history().len(), 5);
}
