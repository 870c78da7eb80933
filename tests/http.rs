use once_cell::sync::Lazy;
use reqwest::Client;
use serde::Deserialize;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct SessionBody {
    id: String,
    date: String,
    games_count: u64,
    pvi: f64,
}

#[derive(Debug, Deserialize)]
struct StakeBody {
    stake: String,
    count: u64,
}

#[derive(Debug, Deserialize)]
struct MonthBody {
    month: String,
    games: u64,
}

#[derive(Debug, Deserialize)]
struct StatsBody {
    total_games: u64,
    total_rake_gross: f64,
    total_tide_points: f64,
    total_gem_value: f64,
    effective_rb_percent: f64,
    sessions: Vec<SessionBody>,
    stakes_breakdown: Vec<StakeBody>,
    months_breakdown: Vec<MonthBody>,
}

struct TestServer {
    base_url: String,
    data_path: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("spintracker_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/catalog")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_spintracker"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", &data_path)
        .env("APP_STORAGE", "file")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer {
        base_url,
        data_path,
        child,
    }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn create_session(client: &Client, server: &TestServer, user: &str, body: serde_json::Value) -> SessionBody {
    let response = client
        .post(format!("{}/api/sessions", server.base_url))
        .header("x-user-id", user)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.unwrap()
}

async fn fetch_stats(client: &Client, server: &TestServer, user: &str, query: &str) -> StatsBody {
    client
        .get(format!("{}/api/stats?{query}", server.base_url))
        .header("x-user-id", user)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_session_feeds_month_stats() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let user = "http_month";

    client
        .put(format!("{}/api/settings", server.base_url))
        .header("x-user-id", user)
        .json(&serde_json::json!({ "ocean_rank": "turtle", "default_pvi": 0.5, "exchange_goal_index": 0 }))
        .send()
        .await
        .unwrap()
        .error_for_status()
        .unwrap();

    let created = create_session(
        &client,
        &server,
        user,
        serde_json::json!({ "date": "2024-03-15", "buy_in": "5", "games_count": "100", "pvi": "1.0" }),
    )
    .await;
    assert!(!created.id.is_empty());
    assert_eq!(created.games_count, 100);

    let stats = fetch_stats(&client, &server, user, "month=2024-03").await;
    assert_eq!(stats.total_games, 100);
    assert!((stats.total_rake_gross - 35.0).abs() < 1e-9);
    assert!((stats.total_tide_points - 3500.0).abs() < 1e-9);
    assert!((stats.total_gem_value - 10.5).abs() < 1e-9);
    assert!((stats.effective_rb_percent - 30.0).abs() < 1e-9);
    assert_eq!(stats.sessions.len(), 1);
    assert_eq!(stats.sessions[0].id, created.id);
    assert_eq!(stats.stakes_breakdown[0].stake, "5");

    let other_month = fetch_stats(&client, &server, user, "month=2024-04").await;
    assert_eq!(other_month.total_games, 0);
    assert_eq!(other_month.effective_rb_percent, 0.0);
}

#[tokio::test]
async fn http_year_view_groups_months() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let user = "http_year";

    for (date, games) in [("2024-01-10", 20), ("2024-02-10", 30), ("2024-02-20", 5), ("2023-12-31", 99)] {
        create_session(
            &client,
            &server,
            user,
            serde_json::json!({ "date": date, "buy_in": 1, "games_count": games }),
        )
        .await;
    }

    let stats = fetch_stats(&client, &server, user, "month=2024-02&view=year").await;
    assert_eq!(stats.total_games, 55);
    let months: Vec<(&str, u64)> = stats
        .months_breakdown
        .iter()
        .map(|row| (row.month.as_str(), row.games))
        .collect();
    assert_eq!(months, vec![("2024-02", 35), ("2024-01", 20)]);
    assert_eq!(stats.stakes_breakdown[0].count, 55);
}

#[tokio::test]
async fn http_update_delete_and_persist() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let user = "http_edit";

    let created = create_session(
        &client,
        &server,
        user,
        serde_json::json!({ "date": "2024-05-01", "buy_in": 10, "games_count": 40, "pvi": 0.6 }),
    )
    .await;

    let updated: SessionBody = client
        .put(format!("{}/api/sessions/{}", server.base_url, created.id))
        .header("x-user-id", user)
        .json(&serde_json::json!({ "date": "2024-05-02", "buy_in": 10, "games_count": 45, "pvi": 0.7 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.date, "2024-05-02");
    assert_eq!(updated.pvi, 0.7);

    let saved = std::fs::read_to_string(&server.data_path).unwrap();
    assert!(saved.contains(&created.id));

    let response = client
        .delete(format!("{}/api/sessions/{}", server.base_url, created.id))
        .header("x-user-id", user)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let sessions: Vec<SessionBody> = client
        .get(format!("{}/api/sessions", server.base_url))
        .header("x-user-id", user)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(sessions.is_empty());

    let missing = client
        .delete(format!("{}/api/sessions/{}", server.base_url, created.id))
        .header("x-user-id", user)
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn http_rejects_invalid_input() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/sessions", server.base_url))
        .header("x-user-id", "http_invalid")
        .json(&serde_json::json!({ "date": "2024-05-01", "buy_in": 7, "games_count": 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("stake"));

    let response = client
        .get(format!("{}/api/stats?month=2024-13", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = client
        .get(format!("{}/api/sessions", server.base_url))
        .header("x-user-id", "bad id!")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn http_index_serves_dashboard() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let page = Client::new()
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("SpinTracker"));
    assert!(page.contains(r#"value="turtle""#));
}
