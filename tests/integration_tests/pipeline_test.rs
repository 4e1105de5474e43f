//! Poll pipeline tests against a mock booking site
//!
//! One wiremock server plays the availability API, the sign-in pages and a
//! webhook receiver, so a single test exercises client, authenticator,
//! session store, normalizer and notification channel together.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use slotwatch::auth::{EasydoctAuthenticator, LoginCredentials};
use slotwatch::models::{CredentialSet, CycleOutcome};
use slotwatch::notifications::{NotificationService, WebhookChannel};
use slotwatch::poller::{HttpAvailabilityClient, Poller, QueryTemplate};
use slotwatch::scheduler::{JitterSchedule, Scheduler, StopReason};
use slotwatch::session::SessionStore;

const AVAILABILITY_PATH: &str = "/api/rdv/getAvailabilities";
const LOGIN_PATH: &str = "/EdPatient/EdPatientSignin";
const EXAM_PATH: &str = "/rdv/gie-irldr-imagerie-rennes";
const WEBHOOK_PATH: &str = "/hooks/slots";

const FRESH_COOKIE: &str = "SessionKey=sess-123; UserSessionKey=user-9; .AspNet.Cookies=CfDJ8fresh";

const SLOTS_BODY: &str = r#"{
    "availabilityCount": 2,
    "appointments": [
        "None",
        {"dayAbbr": "28 novembre", "startTime": "11:15", "roomName": "IRM CANOPIA"},
        {"dayAbbr": "29 novembre", "startTime": "09:30"}
    ]
}"#;

const LOGIN_PAGE: &str = r#"<form method="post">
<input type="hidden" name="__VIEWSTATE" id="__VIEWSTATE" value="vs-token" />
<input type="hidden" name="__VIEWSTATEGENERATOR" id="__VIEWSTATEGENERATOR" value="C2EE9ABB" />
<input type="hidden" name="__EVENTVALIDATION" id="__EVENTVALIDATION" value="ev-token" />
</form>"#;

fn query_template() -> QueryTemplate {
    QueryTemplate {
        exam_type_id: "3374".to_string(),
        exam_id: "56796".to_string(),
        office_place_ids: vec!["812".to_string()],
        patient_birth_date: "1990-01-01".to_string(),
        min_date: None,
    }
}

async fn mount_login_flow(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("set-cookie", ".AspNet.Cookies=CfDJ8fresh; Path=/")
                .append_header("set-cookie", "SessionKey=sess-123; Path=/"),
        )
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(EXAM_PATH))
        .respond_with(
            ResponseTemplate::new(200).append_header("set-cookie", "UserSessionKey=user-9; Path=/"),
        )
        .mount(server)
        .await;
}

/// Availability API accepting only the freshly issued session
async fn mount_availability(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(AVAILABILITY_PATH))
        .and(header("cookie", FRESH_COOKIE))
        .respond_with(ResponseTemplate::new(200).set_body_string(SLOTS_BODY))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(AVAILABILITY_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(server)
        .await;
}

fn build_poller(server: &MockServer, initial: CredentialSet) -> Poller {
    let client = HttpAvailabilityClient::new(
        &format!("{}{AVAILABILITY_PATH}", server.uri()),
        Duration::from_secs(5),
    )
    .unwrap();

    let authenticator = EasydoctAuthenticator::new()
        .with_login_url(format!("{}{LOGIN_PATH}", server.uri()))
        .with_timeout(Duration::from_secs(5));
    let login = LoginCredentials::new(
        "user@example.com",
        "hunter2",
        format!("{}{EXAM_PATH}", server.uri()),
    );

    let notifier = NotificationService::new().with_channel(Box::new(
        WebhookChannel::from_url(format!("{}{WEBHOOK_PATH}", server.uri())).unwrap(),
    ));

    Poller::new(
        Arc::new(client),
        Arc::new(SessionStore::new(initial)),
        query_template(),
        Arc::new(notifier),
    )
    .with_auto_login(Arc::new(authenticator), login)
}

#[tokio::test]
async fn test_expired_session_is_renewed_and_slots_notified() {
    let server = MockServer::start().await;
    mount_login_flow(&server).await;
    mount_availability(&server).await;

    Mock::given(method("POST"))
        .and(path(WEBHOOK_PATH))
        .and(body_partial_json(json!({
            "summary": "Found 2 available appointment slot(s)!",
            "count": 2
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let poller = build_poller(&server, CredentialSet::new("expired", "N", "stale"));
    let report = poller.check().await;

    assert!(report.relogin_attempted);
    match &report.outcome {
        CycleOutcome::Found(result) => {
            assert_eq!(result.count(), 2);
            assert_eq!(
                result.slot_lines(),
                vec!["28 novembre 11:15", "29 novembre 09:30"]
            );
        }
        other => panic!("expected Found, got {other}"),
    }

    let session = poller.session().read();
    assert_eq!(session.cookie_header(), FRESH_COOKIE);
    assert_eq!(poller.session().generation(), 1);
}

#[tokio::test]
async fn test_valid_session_skips_login() {
    let server = MockServer::start().await;
    mount_availability(&server).await;

    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(WEBHOOK_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let poller = build_poller(
        &server,
        CredentialSet::new("sess-123", "user-9", "CfDJ8fresh"),
    );
    let report = poller.check().await;

    assert!(report.outcome.is_found());
    assert!(!report.relogin_attempted);
}

#[tokio::test]
async fn test_scheduler_stops_once_slots_are_found() {
    let server = MockServer::start().await;
    mount_login_flow(&server).await;
    mount_availability(&server).await;

    Mock::given(method("POST"))
        .and(path(WEBHOOK_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let poller = build_poller(&server, CredentialSet::new("expired", "N", "stale"));
    let scheduler = Scheduler::new(Arc::new(poller), JitterSchedule::from_secs(1, 0).unwrap());

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let summary = tokio::time::timeout(Duration::from_secs(30), scheduler.run(shutdown_rx))
        .await
        .unwrap();

    assert_eq!(summary.stop_reason, StopReason::Found);
    assert_eq!(summary.stats.cycles, 1);
    assert_eq!(summary.stats.found, 1);
    assert_eq!(summary.stats.relogins, 1);
}
