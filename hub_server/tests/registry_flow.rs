mod support;

use std::time::Duration;

const SECRET: &str = "dev-secret";

fn hub_port(base_url: &str) -> u16 {
    base_url
        .rsplit(':')
        .next()
        .and_then(|p| p.parse().ok())
        .expect("port in base url")
}

#[tokio::test]
async fn register_list_and_update_flow() {
    let base_url = support::ensure_server();
    let client = reqwest::Client::new();

    // The hub's own port is always reachable, so the poller cannot flip this
    // record offline under the test.
    let port = hub_port(base_url);
    let record = serde_json::json!({
        "name": "Server A",
        "port": port,
        "status": "Online",
        "playerCount": 0,
        "maxCount": 5,
    });

    // A bad secret is rejected before anything is stored.
    let res = client
        .post(format!("{base_url}/serverdata"))
        .header("Authorization", "not-the-secret")
        .json(&record)
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(res.status(), reqwest::StatusCode::UNAUTHORIZED);

    let res = client
        .post(format!("{base_url}/serverdata"))
        .header("Authorization", SECRET)
        .json(&record)
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(res.status(), reqwest::StatusCode::OK);

    // The listing is public.
    let listing: serde_json::Value = client
        .get(format!("{base_url}/serverdata"))
        .send()
        .await
        .expect("request should succeed")
        .json()
        .await
        .expect("json listing");
    let entry = listing
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["port"] == port)
        .expect("registered server listed");
    assert_eq!(entry["name"], "Server A");
    assert_eq!(entry["playerCount"], 0);
    assert_eq!(entry["maxCount"], 5);

    // Count-only update for the registered port.
    let res = client
        .post(format!("{base_url}/playercount"))
        .header("Authorization", SECRET)
        .json(&serde_json::json!({ "playerCount": 3, "port": port }))
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(res.status(), reqwest::StatusCode::OK);

    let listing: serde_json::Value = client
        .get(format!("{base_url}/serverdata"))
        .send()
        .await
        .expect("request should succeed")
        .json()
        .await
        .expect("json listing");
    let entry = listing
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["port"] == port)
        .expect("registered server listed");
    assert_eq!(entry["playerCount"], 3);

    // Count pushes for unknown ports are refused.
    let res = client
        .post(format!("{base_url}/playercount"))
        .header("Authorization", SECRET)
        .json(&serde_json::json!({ "playerCount": 1, "port": 59999 }))
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unreachable_servers_are_marked_offline() {
    let base_url = support::ensure_server();
    let client = reqwest::Client::new();

    // Nothing listens on this port, so the prober has to flip it offline.
    let dead_port = 59998;
    let record = serde_json::json!({
        "name": "Ghost",
        "port": dead_port,
        "status": "Online",
        "playerCount": 2,
        "maxCount": 5,
    });
    let res = client
        .post(format!("{base_url}/serverdata"))
        .header("Authorization", SECRET)
        .json(&record)
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(res.status(), reqwest::StatusCode::OK);

    // Probe interval is two seconds; give it a few rounds.
    for _ in 0..40 {
        let listing: serde_json::Value = client
            .get(format!("{base_url}/serverdata"))
            .send()
            .await
            .expect("request should succeed")
            .json()
            .await
            .expect("json listing");
        let entry = listing
            .as_array()
            .unwrap()
            .iter()
            .find(|s| s["port"] == dead_port)
            .expect("registered server listed")
            .clone();
        if entry["status"] == "Offline" {
            assert_eq!(entry["playerCount"], 0);
            return;
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
    panic!("server was never marked offline");
}
