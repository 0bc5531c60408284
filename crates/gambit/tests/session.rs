use gambit::config::{AgentConfig, AgentKind, GambitConfig};
use gambit::core::{ModelGateway, MoveInput, OutputSink, TurnLoop};
use gambit::memory::{MemoryStore, MessageKind, Role};
use gambit::{build_agents, export_memories};
use gambit_test_utils::{CollectingSink, FixedGateway, RecordingGateway, ScriptedMoves};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn two_player_config() -> GambitConfig {
    let mut config = GambitConfig::default();
    config.agents = vec![
        AgentConfig::new("Human", AgentKind::Human),
        AgentConfig::new("Bot", AgentKind::Model),
    ];
    config
}

#[test]
fn agents_follow_config_order_and_seed_prompts() {
    let gateway: Arc<dyn ModelGateway> = Arc::new(FixedGateway::new("{}"));
    let sink: Arc<dyn OutputSink> = Arc::new(CollectingSink::new());
    let agents = build_agents(&two_player_config(), gateway, None, sink).expect("agents");

    let names: Vec<&str> = agents.iter().map(|agent| agent.name()).collect();
    assert_eq!(names, vec!["Human", "Bot"]);
    for agent in &agents {
        let records = agent.memory().records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].role(), Role::System);
        assert_eq!(records[0].name(), "system");
    }
}

#[tokio::test]
async fn configured_session_exports_replayable_memory() {
    let gateway = RecordingGateway::new(r#"{"thought":"center","move":[7,7]}"#);
    let moves: Arc<dyn MoveInput> = Arc::new(ScriptedMoves::new(["3 4"]));
    let sink = CollectingSink::new();
    let agents = build_agents(
        &two_player_config(),
        Arc::new(gateway.clone()),
        Some(moves),
        Arc::new(sink.clone()),
    )
    .expect("agents");

    let mut session = TurnLoop::new(agents, 2);
    session.run(None).await.expect("run");

    let payload = gateway.last_payload.lock().clone();
    assert_eq!(payload[0].role, Role::System);
    assert!(payload[1].content.contains("Human: [4,3]"));
    assert_eq!(sink.messages().len(), 2);

    let temp = TempDir::new().expect("tmp");
    let written = export_memories(session.agents(), temp.path()).expect("export");
    assert_eq!(written.len(), 2);

    let mut replayed: MemoryStore = MemoryStore::new();
    replayed.load(written[1].as_path(), true).expect("load");
    let bot = &session.agents()[1];
    assert_eq!(replayed.size(), bot.memory().size());
    let rendered: Vec<String> = replayed
        .records()
        .iter()
        .map(|record| record.render_as_text())
        .collect();
    let expected: Vec<String> = bot
        .memory()
        .records()
        .iter()
        .map(|record| record.render_as_text())
        .collect();
    assert_eq!(rendered, expected);
    assert_eq!(replayed.records()[2].content(), &json!([7, 7]));
    assert!(
        replayed
            .records()
            .iter()
            .all(|record| record.kind() == MessageKind::Message)
    );
}
