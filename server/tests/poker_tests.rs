use std::time::Duration;

use holdem_engine::{Action, TableConfig};
use holdem_server::actor::ActorCommand;
use holdem_server::protocol::ServerEvent;
use holdem_server::registry::Registry;
use tokio::sync::{mpsc, oneshot};

async fn join(tx: &mpsc::UnboundedSender<ActorCommand>, name: &str) -> (String, mpsc::UnboundedReceiver<ServerEvent>) {
    let (client_tx, client_rx) = mpsc::unbounded_channel();
    let (reply_tx, reply_rx) = oneshot::channel();
    tx.send(ActorCommand::Join { name: name.to_string(), client_tx, reply: reply_tx }).unwrap();
    let player_id = reply_rx.await.unwrap().unwrap();
    (player_id, client_rx)
}

async fn act(tx: &mpsc::UnboundedSender<ActorCommand>, player_id: &str, action: Action) -> Result<(), holdem_engine::EngineError> {
    let (reply_tx, reply_rx) = oneshot::channel();
    tx.send(ActorCommand::Action { player_id: player_id.to_string(), action, reply: reply_tx }).unwrap();
    reply_rx.await.unwrap()
}

/// Drains whatever broadcasts are already queued without blocking forever;
/// used so assertions below don't depend on counting exact event fan-out.
async fn drain(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(Some(event)) = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await {
        events.push(event);
    }
    events
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn two_joins_auto_start_a_heads_up_hand_with_blinds_posted() {
    let registry = Registry::new(TableConfig::default());
    let tx = registry.get_or_create("t1").await;

    let (_alice, mut alice_rx) = join(&tx, "Alice").await;
    let (_bob, mut bob_rx) = join(&tx, "Bob").await;

    let events = drain(&mut bob_rx).await;
    let saw_preflop = events.iter().any(|e| matches!(e, ServerEvent::TableState { view } if matches!(view.stage, holdem_engine::GameStage::Preflop)));
    assert!(saw_preflop, "expected a preflop table_state broadcast once two players are seated");

    let pot_total: u64 = events
        .iter()
        .filter_map(|e| match e {
            ServerEvent::PotUpdate { total_pot, .. } => Some(*total_pot),
            _ => None,
        })
        .last()
        .unwrap_or(0);
    assert_eq!(pot_total, 15); // small blind 5 + big blind 10

    drop(alice_rx.try_recv());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn fold_heads_up_ends_the_hand_without_showdown() {
    let registry = Registry::new(TableConfig::default());
    let tx = registry.get_or_create("t2").await;

    let (alice, _alice_rx) = join(&tx, "Alice").await;
    let (bob, mut bob_rx) = join(&tx, "Bob").await;

    // heads-up: dealer/small-blind (Alice, seat 0) acts first preflop.
    act(&tx, &alice, Action::Fold).await.unwrap();

    let events = drain(&mut bob_rx).await;
    let showdown = events.iter().find_map(|e| match e {
        ServerEvent::HandShowdown { winners } => Some(winners.clone()),
        _ => None,
    });
    let winners = showdown.expect("expected a hand_showdown broadcast after the fold");
    assert_eq!(winners.len(), 1);
    assert!(winners[0].fold_win);
    assert_eq!(winners[0].player_id, bob);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn acting_out_of_turn_is_rejected_without_mutating_state() {
    let registry = Registry::new(TableConfig::default());
    let tx = registry.get_or_create("t3").await;

    let (alice, _alice_rx) = join(&tx, "Alice").await;
    let (bob, _bob_rx) = join(&tx, "Bob").await;

    // Bob is the big blind and not first to act heads-up; Alice is.
    let err = act(&tx, &bob, Action::Check).await.unwrap_err();
    assert_eq!(err, holdem_engine::EngineError::NotYourTurn);

    // Alice can still act normally afterward -- the rejected action left no trace.
    act(&tx, &alice, Action::Call).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn chat_is_broadcast_to_every_subscriber_but_does_not_mutate_table_state() {
    let registry = Registry::new(TableConfig::default());
    let tx = registry.get_or_create("t4").await;

    let (alice, mut alice_rx) = join(&tx, "Alice").await;
    let (_bob, mut bob_rx) = join(&tx, "Bob").await;
    drain(&mut alice_rx).await;
    drain(&mut bob_rx).await;

    tx.send(ActorCommand::Chat { player_id: alice, message: "gl hf".to_string() }).unwrap();

    let bob_events = drain(&mut bob_rx).await;
    let chat = bob_events.iter().find_map(|e| match e {
        ServerEvent::ChatNew { message, .. } => Some(message.clone()),
        _ => None,
    });
    assert_eq!(chat.as_deref(), Some("gl hf"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn a_table_with_seated_players_never_reports_reapable() {
    let registry = Registry::new(TableConfig::default());
    let tx = registry.get_or_create("t5").await;
    let (_alice, _rx) = join(&tx, "Alice").await;

    let (reply_tx, reply_rx) = oneshot::channel();
    tx.send(ActorCommand::IsReapable(reply_tx)).unwrap();
    assert!(!reply_rx.await.unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn leaving_heads_up_ends_the_hand_and_frees_the_seat() {
    let registry = Registry::new(TableConfig::default());
    let tx = registry.get_or_create("t6").await;

    let (alice, _alice_rx) = join(&tx, "Alice").await;
    let (bob, mut bob_rx) = join(&tx, "Bob").await;

    let (reply_tx, reply_rx) = oneshot::channel();
    tx.send(ActorCommand::Leave { player_id: alice, reply: reply_tx }).unwrap();
    reply_rx.await.unwrap().unwrap();

    let events = drain(&mut bob_rx).await;
    assert!(events.iter().any(|e| matches!(e, ServerEvent::PlayerLeft { .. })));
    let _ = bob;
}
