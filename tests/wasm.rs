//! Boundary smoke tests, run with `wasm-pack test --headless --chrome`.

#![cfg(target_arch = "wasm32")]

use wasm_bindgen_test::*;
use wasm_minigames::{MemoryGame, TicTacToeGame};

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn tictactoe_play_round_trips_json() {
    let mut game = TicTacToeGame::new(None).expect("constructor should succeed");

    let json = game.play(0, 0).expect("play should succeed");
    let payload: serde_json::Value = serde_json::from_str(&json).expect("payload should parse");

    assert_eq!(payload["state"]["turn"], "O");
    assert_eq!(payload["events"][0]["type"], "MarkPlaced");
}

#[wasm_bindgen_test]
fn memory_snapshot_starts_all_face_down() {
    let game = MemoryGame::new(4, Some(r#"{"seed": 7}"#.to_string()))
        .expect("constructor should succeed");

    let json = game.snapshot_json().expect("snapshot should serialize");
    let snapshot: serde_json::Value = serde_json::from_str(&json).expect("snapshot should parse");

    let cards = snapshot["cards"].as_array().expect("cards should be an array");
    assert_eq!(cards.len(), 8);
    assert!(cards.iter().all(|card| card.is_null()));
    assert_eq!(snapshot["solved"], false);
}

#[wasm_bindgen_test]
async fn memory_reveal_promise_resolves_after_delay() {
    let mut game = MemoryGame::new(2, Some(r#"{"seed": 7, "delay_ms": 10}"#.to_string()))
        .expect("constructor should succeed");

    // First card resolves immediately with no comparison.
    let promise = game.reveal(0).expect("reveal should succeed");
    let value = wasm_bindgen_futures::JsFuture::from(promise)
        .await
        .expect("promise should resolve");
    let payload: serde_json::Value =
        serde_json::from_str(&value.as_string().expect("payload should be a string"))
            .expect("payload should parse");
    assert_eq!(payload["outcome"]["type"], "Flipped");
    assert!(payload.get("resolution").is_none());

    // Second card defers its comparison behind the configured delay.
    let promise = game.reveal(1).expect("reveal should succeed");
    let value = wasm_bindgen_futures::JsFuture::from(promise)
        .await
        .expect("promise should resolve");
    let payload: serde_json::Value =
        serde_json::from_str(&value.as_string().expect("payload should be a string"))
            .expect("payload should parse");
    assert_eq!(payload["outcome"]["type"], "Comparing");
    assert!(payload["resolution"]["type"].is_string());
}
