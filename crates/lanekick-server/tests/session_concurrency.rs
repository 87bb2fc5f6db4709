#[allow(dead_code)]
mod common;

use std::sync::Arc;

use futures::future::join_all;

use lanekick_server::storage::GameStore;

use common::TestServer;

#[tokio::test]
async fn concurrent_kicks_on_one_session_never_lose_updates() {
    let server = Arc::new(TestServer::new().await);
    let id = server.start("alice").await;

    let kicks = (0..40).map(|_| {
        let server = Arc::clone(&server);
        let id = id.clone();
        async move { server.kick("alice", &id, "hit").await }
    });
    let results = join_all(kicks).await;
    assert!(results.iter().all(|(status, _)| *status == 200));

    // Every response saw a distinct combo value.
    let mut combos: Vec<u64> = results
        .iter()
        .map(|(_, body)| body["combo"].as_u64().unwrap())
        .collect();
    combos.sort_unstable();
    assert_eq!(combos, (1..=40).collect::<Vec<_>>());

    let (_, end) = server.end("alice", &id).await;
    assert_eq!(end["max_combo"], 40);
    assert_eq!(end["kicks_total"], 40);
    assert_eq!(server.wait_for_actions(&id, 40).await.len(), 40);
}

#[tokio::test]
async fn concurrent_ends_credit_exactly_once() {
    let server = Arc::new(TestServer::new().await);
    let id = server.start("alice").await;
    server.kick("alice", &id, "perfect").await;
    server.kick("alice", &id, "perfect").await;

    let ends = (0..8).map(|_| {
        let server = Arc::clone(&server);
        let id = id.clone();
        async move { server.end("alice", &id).await }
    });
    let results = join_all(ends).await;

    let applied = results
        .iter()
        .filter(|(status, body)| *status == 200 && body["no_op"] == false)
        .count();
    assert_eq!(applied, 1);
    assert!(results.iter().all(|(_, body)| body["final_score"] == 460));

    let agg = server.store.player_aggregate("alice").unwrap().unwrap();
    assert_eq!(agg.total_score, 460);
    assert_eq!(agg.games_played, 1);
}

#[tokio::test]
async fn distinct_sessions_progress_independently() {
    let server = Arc::new(TestServer::new().await);
    let players = ["p0", "p1", "p2", "p3", "p4", "p5"];
    let mut ids = Vec::new();
    for p in players {
        ids.push(server.start(p).await);
    }

    let work = players.iter().zip(ids.iter()).enumerate().map(|(i, (p, id))| {
        let server = Arc::clone(&server);
        let (p, id) = (p.to_string(), id.clone());
        async move {
            for _ in 0..=i {
                server.kick(&p, &id, "hit").await;
            }
            server.end(&p, &id).await
        }
    });
    let results = join_all(work).await;

    for (i, (status, body)) in results.iter().enumerate() {
        assert_eq!(*status, 200);
        assert_eq!(body["max_combo"], i as u64 + 1);
        assert_eq!(body["no_op"], false);
    }
    let (_, ranking) = server.get("/game/ranking/global").await;
    assert_eq!(ranking.as_array().unwrap().len(), players.len());
    assert_eq!(ranking[0]["player"], "p5");
}
