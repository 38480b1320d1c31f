use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio_tungstenite::connect_async;

/// A manual websocket client for exercising a running `holdem-server`:
///
/// ```text
/// client <url> join <table_id> <name>
/// client <url> fold <table_id>
/// client <url> bet <table_id> <amount>
/// ```
#[tokio::main]
async fn main() {
    let url = std::env::args().nth(1).unwrap_or_else(|| "ws://127.0.0.1:8080/ws".to_string());
    let mode = std::env::args().nth(2).unwrap_or_else(|| "join".to_string());
    let table_id = std::env::args().nth(3).unwrap_or_else(|| "table-1".to_string());
    let arg = std::env::args().nth(4);

    let (mut ws, _resp) = connect_async(url.as_str()).await.expect("connect");

    let outbound = match mode.as_str() {
        "join" => {
            let name = arg.unwrap_or_else(|| format!("guest-{}", std::process::id() % 1000));
            serde_json::json!({"type": "join_table", "table_id": table_id, "name": name})
        }
        "fold" => serde_json::json!({"type": "action_fold", "table_id": table_id}),
        "check" => serde_json::json!({"type": "action_check", "table_id": table_id}),
        "call" => serde_json::json!({"type": "action_call", "table_id": table_id}),
        "bet" => {
            let amount: i64 = arg.and_then(|a| a.parse().ok()).unwrap_or(10);
            serde_json::json!({"type": "action_bet", "table_id": table_id, "amount": amount})
        }
        "raise" => {
            let amount: i64 = arg.and_then(|a| a.parse().ok()).unwrap_or(20);
            serde_json::json!({"type": "action_raise", "table_id": table_id, "amount": amount})
        }
        "leave" => serde_json::json!({"type": "leave_table", "table_id": table_id}),
        "chat" => {
            let message = arg.unwrap_or_else(|| "hello".to_string());
            serde_json::json!({"type": "chat_send", "table_id": table_id, "message": message})
        }
        other => panic!("unknown mode {other}"),
    };

    ws.send(tokio_tungstenite::tungstenite::Message::Text(outbound.to_string())).await.unwrap();

    let mut reads = 0;
    while reads < 20 {
        let Some(msg) = ws.next().await else { break };
        let Ok(msg) = msg else { break };
        let text = msg.to_string();
        if let Ok(value) = serde_json::from_str::<Value>(&text) {
            println!("<- {value}");
        } else {
            println!("<- {text}");
        }
        reads += 1;
    }
}
