use kvm_watchdog::config::AppConfig;
use kvm_watchdog::{
    bootstrap, CredentialProvider, Credentials, HealthCheckResult, HttpTransport, PowerError,
    RecoveryOutcome, RecoveryStage, ReqwestTransport, TransportError,
};
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{basic_auth, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Operator;

impl CredentialProvider for Operator {
    fn acquire(&self) -> kvm_watchdog::Result<Credentials> {
        Ok(Credentials::new("admin", "hunter2"))
    }
}

fn config_for(server: &MockServer, kvm: &MockServer) -> AppConfig {
    let mut config = AppConfig::default();
    config.monitor.server_addr = format!("{}/health", server.uri());
    config.monitor.request_timeout_secs = 2;
    config.kvm.power_off_url = format!("{}/api/atx/click?button=power_long", kvm.uri());
    config.kvm.power_on_url = format!("{}/api/atx/click?button=power", kvm.uri());
    config.kvm.settle_delay_secs = 1;
    config
}

fn transport(config: &AppConfig) -> Arc<dyn HttpTransport> {
    Arc::new(ReqwestTransport::new(config.monitor.request_timeout()).unwrap())
}

async fn mount_button(kvm: &MockServer, button: &str, status: u16, times: u64) {
    Mock::given(method("POST"))
        .and(path("/api/atx/click"))
        .and(query_param("button", button))
        .and(basic_auth("admin", "hunter2"))
        .respond_with(ResponseTemplate::new(status))
        .expect(times)
        .mount(kvm)
        .await;
}

fn buttons_pressed(requests: &[wiremock::Request]) -> Vec<String> {
    requests
        .iter()
        .filter_map(|r| {
            r.url
                .query_pairs()
                .find(|(k, _)| k == "button")
                .map(|(_, v)| v.into_owned())
        })
        .collect()
}

#[tokio::test]
async fn healthy_server_triggers_no_button_press() {
    let server = MockServer::start().await;
    let kvm = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server, &kvm);
    let watchdog = bootstrap::build_watchdog(&config, &Operator, transport(&config)).unwrap();
    let report = watchdog.tick().await;

    assert!(report.health.is_healthy());
    assert!(report.recovery.is_none());
    assert!(kvm.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn service_unavailable_power_cycles_with_settle_delay() {
    let server = MockServer::start().await;
    let kvm = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_button(&kvm, "power_long", 200, 1).await;
    mount_button(&kvm, "power", 200, 1).await;

    let config = config_for(&server, &kvm);
    let watchdog = bootstrap::build_watchdog(&config, &Operator, transport(&config)).unwrap();

    let started = Instant::now();
    let report = watchdog.tick().await;

    assert_eq!(
        report.health,
        HealthCheckResult::UnexpectedStatus(StatusCode::SERVICE_UNAVAILABLE)
    );
    assert_eq!(report.recovery, Some(RecoveryOutcome::Succeeded));
    assert!(started.elapsed() >= Duration::from_secs(1));

    let requests = kvm.received_requests().await.unwrap();
    assert_eq!(buttons_pressed(&requests), vec!["power_long", "power"]);
}

#[tokio::test]
async fn unauthorized_power_off_stops_the_sequence() {
    let server = MockServer::start().await;
    let kvm = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_button(&kvm, "power_long", 401, 1).await;
    mount_button(&kvm, "power", 200, 0).await;

    let config = config_for(&server, &kvm);
    let watchdog = bootstrap::build_watchdog(&config, &Operator, transport(&config)).unwrap();
    let report = watchdog.tick().await;

    assert_eq!(
        report.recovery,
        Some(RecoveryOutcome::FailedAt {
            stage: RecoveryStage::PowerOff,
            cause: PowerError::UnexpectedStatus(StatusCode::UNAUTHORIZED),
        })
    );
    let requests = kvm.received_requests().await.unwrap();
    assert_eq!(buttons_pressed(&requests), vec!["power_long"]);
}

#[tokio::test]
async fn hung_server_times_out_and_is_power_cycled_once() {
    let server = MockServer::start().await;
    let kvm = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;
    mount_button(&kvm, "power_long", 200, 1).await;
    mount_button(&kvm, "power", 200, 1).await;

    let mut config = config_for(&server, &kvm);
    config.monitor.request_timeout_secs = 1;
    let watchdog = bootstrap::build_watchdog(&config, &Operator, transport(&config)).unwrap();
    let report = watchdog.tick().await;

    assert!(matches!(
        report.health,
        HealthCheckResult::Unreachable(TransportError::Timeout(_))
    ));
    assert_eq!(report.recovery, Some(RecoveryOutcome::Succeeded));
}

#[tokio::test]
async fn unreachable_server_is_only_logged_when_recovery_disabled() {
    let server = MockServer::start().await;
    let kvm = MockServer::start().await;
    mount_button(&kvm, "power_long", 200, 0).await;

    let mut config = config_for(&server, &kvm);
    // nothing listens on the discard port
    config.monitor.server_addr = "http://127.0.0.1:9/health".to_string();
    config.monitor.recover_on_unreachable = false;
    let watchdog = bootstrap::build_watchdog(&config, &Operator, transport(&config)).unwrap();
    let report = watchdog.tick().await;

    assert!(matches!(report.health, HealthCheckResult::Unreachable(_)));
    assert!(report.recovery.is_none());
}

#[tokio::test]
async fn reqwest_transport_sends_basic_auth_on_post_only() {
    let kvm = MockServer::start().await;
    mount_button(&kvm, "power", 200, 1).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&kvm)
        .await;

    let transport = ReqwestTransport::new(Duration::from_secs(2)).unwrap();
    let creds = Credentials::new("admin", "hunter2");

    let status = transport
        .post(&format!("{}/api/atx/click?button=power", kvm.uri()), &creds)
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);

    let status = transport.get(&kvm.uri()).await.unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let requests = kvm.received_requests().await.unwrap();
    let get = requests.iter().find(|r| r.method.as_str() == "GET").unwrap();
    assert!(!get.headers.contains_key("authorization"));
}
