//! End-to-end runs of the planner agent tree against a scripted model

mod common;

use std::sync::Arc;

use common::*;
use futures::StreamExt;
use wayfinder::agent::{collect_run, Agent, AgentEvent, EventKind, Runner};
use wayfinder::core::{Message, ResponseMode, Role, SessionKey, WayfinderError};
use wayfinder::planner::{self, TravelMode, TripForm, LOCATION_AGENT, REPORT_SECTIONS, RESEARCH_AGENT};
use wayfinder::tools::Tool;
use wayfinder::{ChatFrontEnd, Config, SessionStore};

fn key() -> SessionKey {
    SessionKey::new("transport_planner", "web_user", "default_session")
}

fn planner_for(config: &Config, provider: &Arc<ScriptedProvider>, search: Arc<dyn Tool>) -> Arc<dyn Agent> {
    planner::build_root_agent(config, provider.clone(), search).unwrap()
}

async fn run_events(agent: Arc<dyn Agent>, store: &mut SessionStore, text: &str) -> Vec<AgentEvent> {
    let runner = Runner::new("transport_planner", agent);
    runner
        .run(store, key(), Message::user(text))
        .map(|event| event.unwrap())
        .collect()
        .await
}

fn happy_provider() -> Arc<ScriptedProvider> {
    shared(
        ScriptedProvider::new()
            .script(
                LOCATION_MARKER,
                vec![Reply::text("Start: Jurong\nDestination: Marina Bay")],
            )
            .script(
                RESEARCH_MARKER,
                vec![
                    Reply::search("Jurong to Marina Bay public transport"),
                    Reply::text(full_report()),
                ],
            ),
    )
}

#[tokio::test]
async fn test_steps_run_once_each_in_order() {
    let provider = happy_provider();
    let agent = planner_for(&workflow_config(), &provider, Arc::new(FakeSearch::ok("Bus 30: 45 min")));
    let mut store = SessionStore::new();
    store.ensure_created(&key());

    let events = run_events(agent, &mut store, "Plan a trip from Jurong to Marina Bay.").await;

    let final_authors: Vec<&str> = events
        .iter()
        .filter(|e| e.is_final_response())
        .map(|e| e.author.as_str())
        .collect();
    assert_eq!(final_authors, vec![LOCATION_AGENT, RESEARCH_AGENT]);

    // location once (streamed), research twice (search round, then answer)
    assert_eq!(
        provider.call_order(),
        vec![LOCATION_MARKER, RESEARCH_MARKER, RESEARCH_MARKER]
    );

    // Every event of the first step comes before any event of the second
    let first_research = events.iter().position(|e| e.author == RESEARCH_AGENT).unwrap();
    assert!(events[first_research..].iter().all(|e| e.author == RESEARCH_AGENT));
}

#[tokio::test]
async fn test_each_step_sees_previous_output() {
    let provider = happy_provider();
    let agent = planner_for(&workflow_config(), &provider, Arc::new(FakeSearch::ok("Bus 30: 45 min")));
    let mut store = SessionStore::new();
    store.ensure_created(&key());

    run_events(agent, &mut store, "Plan a trip from Jurong to Marina Bay.").await;

    let requests = provider.requests();
    let location = &requests[0];
    let research = &requests[1];

    assert!(location.streamed);
    assert!(research.history().starts_with(location.history()));
    assert_eq!(research.history().len(), location.history().len() + 1);

    let handed_over = research.history().last().unwrap();
    assert_eq!(handed_over.role, Role::User);
    assert!(handed_over.content.contains("[location_input_agent] said: Start: Jurong"));
    assert_eq!(research.tool_names, vec!["google_search"]);

    // The stored conversation only ever grew: user, location, research
    let stored = store.messages(&key()).unwrap();
    assert_eq!(stored.len(), 3);
    assert_eq!(stored[1].author, LOCATION_AGENT);
    assert_eq!(stored[2].author, RESEARCH_AGENT);
}

#[tokio::test]
async fn test_trip_form_shows_only_final_report() {
    let provider = happy_provider();
    let search = Arc::new(FakeSearch::ok("Bus 30: 45 min"));
    let agent = planner_for(&workflow_config(), &provider, search.clone());
    let mut front_end = ChatFrontEnd::from_config(&workflow_config(), agent);

    let form = TripForm::new("Jurong", "Marina Bay", TravelMode::All);
    let replies = front_end.submit_trip(&form).await.unwrap();

    assert_eq!(replies.len(), 1);
    for section in REPORT_SECTIONS {
        assert!(replies[0].content.contains(section), "missing {}", section);
    }
    assert!(!replies[0].content.contains("Start: Jurong"));

    assert_eq!(front_end.history()[0].content, "Plan a trip from Jurong to Marina Bay.");
    assert_eq!(
        search.queries.lock().unwrap().as_slice(),
        ["Jurong to Marina Bay public transport"]
    );
}

#[tokio::test]
async fn test_each_step_mode_shows_both_answers() {
    let provider = happy_provider();
    let mut config = workflow_config();
    config.agent.response_mode = ResponseMode::EachStep;
    let agent = planner_for(&config, &provider, Arc::new(FakeSearch::ok("ok")));
    let mut front_end = ChatFrontEnd::from_config(&config, agent);

    let replies = front_end
        .submit_text("Plan a trip from Jurong to Marina Bay.")
        .await
        .unwrap();

    let labels: Vec<Option<&str>> = replies.iter().map(|r| r.label.as_deref()).collect();
    assert_eq!(labels, vec![Some(LOCATION_AGENT), Some(RESEARCH_AGENT)]);
}

#[tokio::test]
async fn test_search_failure_still_answers() {
    let provider = shared(
        ScriptedProvider::new()
            .script(LOCATION_MARKER, vec![Reply::text("Start: Jurong\nDestination: Marina Bay")])
            .script(
                RESEARCH_MARKER,
                vec![
                    Reply::search("Jurong to Marina Bay bus"),
                    Reply::text("Live data could not be checked.\n\n**By Bus** - usually about 50 min"),
                ],
            ),
    );
    let agent = planner_for(&workflow_config(), &provider, Arc::new(FakeSearch::failing("search quota exceeded")));
    let mut front_end = ChatFrontEnd::from_config(&workflow_config(), agent);

    let replies = front_end
        .submit_text("Plan a trip from Jurong to Marina Bay.")
        .await
        .unwrap();

    assert_eq!(replies.len(), 1);
    assert!(replies[0].content.contains("By Bus"));

    // The failure was reported back to the model
    let follow_up = provider.requests().pop().unwrap();
    let observations = &follow_up.messages.last().unwrap().content;
    assert!(observations.contains("FAILED"));
    assert!(observations.contains("search quota exceeded"));
}

#[tokio::test]
async fn test_model_outage_is_rendered_as_text() {
    let provider = shared(
        ScriptedProvider::new().script(LOCATION_MARKER, vec![Reply::Fail("503 from model".into())]),
    );
    let agent = planner_for(&workflow_config(), &provider, Arc::new(FakeSearch::ok("unused")));
    let mut front_end = ChatFrontEnd::from_config(&workflow_config(), agent);

    let replies = front_end.submit_text("hello").await.unwrap();
    assert_eq!(replies.len(), 1);
    assert!(replies[0].content.contains("503 from model"));
    assert_eq!(front_end.history().len(), 2);
}

#[tokio::test]
async fn test_step_without_final_is_empty_response() {
    let provider = shared(ScriptedProvider::new().script(LOCATION_MARKER, vec![Reply::text("")]));
    let agent = planner_for(&workflow_config(), &provider, Arc::new(FakeSearch::ok("unused")));
    let runner = Runner::new("transport_planner", agent);
    let mut store = SessionStore::new();
    store.ensure_created(&key());

    let err = collect_run(runner.run(&mut store, key(), Message::user("hi")))
        .await
        .unwrap_err();

    assert!(matches!(err, WayfinderError::EmptyResponse(ref agent) if agent == LOCATION_AGENT));
    // research never ran
    assert_eq!(provider.call_order(), vec![LOCATION_MARKER]);
}

#[tokio::test]
async fn test_tool_budget_forces_synthesis() {
    let provider = shared(
        ScriptedProvider::new()
            .script(LOCATION_MARKER, vec![Reply::text("Start: Jurong\nDestination: Changi")])
            .script(
                RESEARCH_MARKER,
                vec![Reply::search("Jurong to Changi"), Reply::text("**Fastest Route** - MRT East-West line")],
            ),
    );
    let mut config = workflow_config();
    config.agent.max_tool_rounds = 1;
    let agent = planner_for(&config, &provider, Arc::new(FakeSearch::ok("EW line 55 min")));
    let mut store = SessionStore::new();
    store.ensure_created(&key());

    let events = run_events(agent, &mut store, "Jurong to Changi").await;

    let last = events.last().unwrap();
    assert!(last.is_final_response());
    assert_eq!(last.text(), Some("**Fastest Route** - MRT East-West line"));

    // The synthesis call is made without tools
    let synthesis = provider.requests().pop().unwrap();
    assert!(synthesis.tool_names.is_empty());
}

#[tokio::test]
async fn test_root_transfers_to_workflow() {
    let provider = shared(
        ScriptedProvider::new()
            .script(
                ROOT_MARKER,
                vec![Reply::transfer(
                    "Hi! I can help you plan routes in Singapore.",
                    "transport_workflow_agent",
                )],
            )
            .script(LOCATION_MARKER, vec![Reply::text("Start: Jurong\nDestination: Marina Bay")])
            .script(
                RESEARCH_MARKER,
                vec![Reply::search("Jurong Marina Bay"), Reply::text(full_report())],
            ),
    );
    let config = Config::default();
    assert!(config.agent.delegate_via_root);
    let agent = planner_for(&config, &provider, Arc::new(FakeSearch::ok("ok")));
    assert_eq!(agent.name(), "root_agent");

    let mut store = SessionStore::new();
    store.ensure_created(&key());
    let events = run_events(agent, &mut store, "What's the fastest way from Jurong to Marina Bay?").await;

    assert!(events.iter().any(|e| matches!(
        &e.kind,
        EventKind::Transfer { to } if to == "transport_workflow_agent"
    )));
    // The greeting is partial; the last final is the report
    assert!(events
        .iter()
        .filter(|e| e.author == "root_agent")
        .all(|e| !e.is_final_response()));
    assert_eq!(events.last().unwrap().author, RESEARCH_AGENT);
    assert_eq!(provider.requests()[0].tool_names, vec!["transfer_to_agent"]);
}

#[tokio::test]
async fn test_append_to_unknown_session_fails() {
    let provider = happy_provider();
    let agent = planner_for(&workflow_config(), &provider, Arc::new(FakeSearch::ok("ok")));
    let runner = Runner::new("transport_planner", agent);
    let mut store = SessionStore::new();

    for session in ["never", "created", ""] {
        let key = SessionKey::new("transport_planner", "web_user", session);
        let err = collect_run(runner.run(&mut store, key, Message::user("hi")))
            .await
            .unwrap_err();
        assert!(matches!(err, WayfinderError::SessionNotFound(_)));
    }
    assert!(provider.requests().is_empty());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_create_twice_keeps_history() {
    let provider = happy_provider();
    let agent = planner_for(&workflow_config(), &provider, Arc::new(FakeSearch::ok("ok")));
    let mut store = SessionStore::new();
    assert!(store.create(key()));

    run_events(agent, &mut store, "Plan a trip from Jurong to Marina Bay.").await;
    let before = store.messages(&key()).unwrap().to_vec();

    assert!(!store.create(key()));
    store.ensure_created(&key());
    assert_eq!(store.messages(&key()).unwrap(), before.as_slice());
    tokio_test::assert_ok!(store.append(&key(), Message::user("thanks")));
    assert_eq!(store.messages(&key()).unwrap().len(), before.len() + 1);
}
