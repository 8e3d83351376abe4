use glpi_helpdesk::config::Config;
use glpi_helpdesk::error::HelpdeskError;
use glpi_helpdesk::glpi_client::GlpiClient;
use glpi_helpdesk::helpdesk::Helpdesk;
use glpi_helpdesk::models::{Brok, HostCacheEntry, Identifier};
use glpi_helpdesk::xmlrpc;
use pretty_assertions::assert_eq;
use serde_json::{json, Map, Value};
use tokio_test::assert_ok;
use wiremock::matchers::{body_string_contains, header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "tok-123";

fn config(server: &MockServer) -> Config {
    Config {
        uri: format!("{}/glpi/plugins/webservices/xmlrpc.php", server.uri()),
        ..Config::default()
    }
}

fn procedure(name: &str) -> wiremock::MockBuilder {
    Mock::given(method("POST")).and(body_string_contains(format!(
        "<methodName>{}</methodName>",
        name
    )))
}

fn xml_ok(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/xml")
        .set_body_string(xmlrpc::encode_response(&result))
}

fn xml_fault(code: i64, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/xml")
        .set_body_string(xmlrpc::encode_fault(code, message))
}

async fn mount_startup(server: &MockServer) {
    procedure("glpi.doLogin")
        .respond_with(xml_ok(json!({"session": TOKEN})))
        .mount(server)
        .await;
    procedure("kiosks.getHelpdeskConfiguration")
        .respond_with(xml_ok(json!({"url_base": "http://glpi", "kiosk": 1})))
        .mount(server)
        .await;
}

async fn started(server: &MockServer) -> Helpdesk {
    mount_startup(server).await;
    assert_ok!(Helpdesk::init(&config(server)).await)
}

/// Parameter struct of every request made for `name`, in order.
async fn calls(server: &MockServer, name: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .expect("request recording")
        .into_iter()
        .filter_map(|r| {
            let body = String::from_utf8(r.body).expect("utf-8 body");
            let (procedure, mut params) = xmlrpc::parse_call(&body).expect("methodCall body");
            assert_eq!(params.len(), 1, "one struct parameter per call");
            (procedure == name).then(|| params.remove(0))
        })
        .collect()
}

fn params(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("object")
}

fn resolved_brok(host: &str) -> Brok {
    Brok::new(
        "initial_host_status",
        json!({"host_name": host, "customs": {
            "_HOSTID": 1, "_ITEMTYPE": "Computer", "_ITEMSID": 42, "_ENTITIESID": 0
        }}),
    )
}

#[tokio::test]
async fn init_logs_in_and_attaches_session_to_configuration() {
    let server = MockServer::start().await;
    let helpdesk = started(&server).await;

    assert_eq!(helpdesk.get_ui_session().as_str(), TOKEN);
    assert_eq!(
        serde_json::to_value(helpdesk.get_ui_helpdesk_configuration()).unwrap(),
        json!({"url_base": "http://glpi", "kiosk": 1, "session": TOKEN})
    );

    assert_eq!(
        calls(&server, "glpi.doLogin").await,
        vec![json!({"login_name": "shinken", "login_password": "shinken"})]
    );
    assert_eq!(
        calls(&server, "kiosks.getHelpdeskConfiguration").await,
        vec![json!({"session": TOKEN})]
    );
}

#[tokio::test]
async fn login_is_an_xml_rpc_method_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("content-type", "text/xml"))
        .and(body_string_contains("<methodCall><methodName>glpi.doLogin</methodName>"))
        .and(body_string_contains(
            "<member><name>login_name</name><value><string>shinken</string></value></member>",
        ))
        .respond_with(xml_ok(json!({"session": TOKEN})))
        .expect(1)
        .mount(&server)
        .await;

    let client = assert_ok!(GlpiClient::connect(&config(&server)));
    let session = assert_ok!(client.login("shinken", "shinken").await);
    assert_eq!(session.as_str(), TOKEN);
}

#[tokio::test]
async fn login_fault_is_an_authentication_error() {
    let server = MockServer::start().await;
    procedure("glpi.doLogin")
        .respond_with(xml_fault(3, "Bad login or password"))
        .mount(&server)
        .await;

    let client = assert_ok!(GlpiClient::connect(&config(&server)));
    match client.login("shinken", "wrong").await {
        Err(HelpdeskError::Authentication { code, message }) => {
            assert_eq!(code, 3);
            assert_eq!(message, "Bad login or password");
        }
        other => panic!("expected authentication error, got {:?}", other),
    }
}

#[tokio::test]
async fn non_xml_answer_is_a_local_error() {
    let server = MockServer::start().await;
    procedure("glpi.doLogin")
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"session": "x"}"#))
        .mount(&server)
        .await;

    let client = assert_ok!(GlpiClient::connect(&config(&server)));
    let err = client.login("shinken", "shinken").await.unwrap_err();
    assert!(!err.is_fault());
}

#[tokio::test]
async fn init_fails_when_login_is_refused() {
    let server = MockServer::start().await;
    procedure("glpi.doLogin")
        .respond_with(xml_fault(3, "Bad login or password"))
        .mount(&server)
        .await;

    let err = Helpdesk::init(&config(&server)).await.err().expect("init must fail");
    assert!(matches!(err, HelpdeskError::Initialization(_)));
    assert!(err.to_string().contains("Bad login or password"));
    assert!(calls(&server, "kiosks.getHelpdeskConfiguration").await.is_empty());
}

#[tokio::test]
async fn init_fails_when_configuration_is_unavailable() {
    let server = MockServer::start().await;
    procedure("glpi.doLogin")
        .respond_with(xml_ok(json!({"session": TOKEN})))
        .mount(&server)
        .await;
    procedure("kiosks.getHelpdeskConfiguration")
        .respond_with(ResponseTemplate::new(500).set_body_string("plugin kiosks missing"))
        .mount(&server)
        .await;

    let err = Helpdesk::init(&config(&server)).await.err().expect("init must fail");
    assert!(matches!(err, HelpdeskError::Initialization(_)));
    assert!(err.to_string().contains("helpdesk configuration"));
}

#[tokio::test]
async fn init_error_never_contains_password() {
    let server = MockServer::start().await;
    procedure("glpi.doLogin")
        .respond_with(xml_fault(3, "refused p4ssw0rd"))
        .mount(&server)
        .await;

    let config = Config {
        login_password: "p4ssw0rd".to_string(),
        ..config(&server)
    };
    let err = Helpdesk::init(&config).await.err().expect("init must fail");
    assert!(!err.to_string().contains("p4ssw0rd"));
}

#[tokio::test]
async fn resolved_host_lists_tickets_of_its_asset() {
    let server = MockServer::start().await;
    let helpdesk = started(&server).await;
    procedure("glpi.listTickets")
        .respond_with(xml_ok(json!([{"id": 5, "name": "Disk full"}])))
        .mount(&server)
        .await;

    helpdesk.manage_brok(&resolved_brok("srv1")).await;

    let cached = helpdesk.host_entry("srv1").await.expect("cache slot");
    assert_eq!(
        serde_json::to_value(&cached).unwrap(),
        json!({"hostsid": 1, "itemtype": "Computer", "items_id": 42, "entities_id": 0})
    );

    let tickets = helpdesk.get_tickets(Some("srv1"), None, 50, true).await;
    assert_eq!(tickets, Some(vec![json!({"id": 5, "name": "Disk full"})]));

    assert_eq!(
        calls(&server, "glpi.listTickets").await,
        vec![json!({
            "session": TOKEN,
            "id2name": 1,
            "iso8859": 1,
            "limit": 50,
            "entity": 0,
            "itemtype": "Computer",
            "item": 42,
        })]
    );
}

#[tokio::test]
async fn unresolved_host_has_no_tickets_and_no_remote_call() {
    let server = MockServer::start().await;
    let helpdesk = started(&server).await;

    helpdesk
        .manage_brok(&Brok::new(
            "initial_host_status",
            json!({"host_name": "srv2", "customs": {}}),
        ))
        .await;

    let cached = helpdesk.host_entry("srv2").await.expect("cache slot");
    assert_eq!(cached, HostCacheEntry::Unresolved);
    assert_eq!(serde_json::to_value(&cached).unwrap(), json!({"items_id": null}));

    assert_eq!(helpdesk.get_tickets(Some("srv2"), None, 50, true).await, None);
    assert!(calls(&server, "glpi.listTickets").await.is_empty());
}

#[tokio::test]
async fn unknown_host_is_none_while_empty_remote_list_is_empty() {
    let server = MockServer::start().await;
    let helpdesk = started(&server).await;
    procedure("glpi.listTickets")
        .respond_with(xml_ok(json!([])))
        .mount(&server)
        .await;

    assert_eq!(helpdesk.get_tickets(Some("never-seen"), None, 50, true).await, None);
    assert_eq!(helpdesk.get_tickets(None, None, 50, true).await, Some(vec![]));
    assert_eq!(calls(&server, "glpi.listTickets").await.len(), 1);
}

#[tokio::test]
async fn later_initial_status_overwrites_entry() {
    let server = MockServer::start().await;
    let helpdesk = started(&server).await;

    helpdesk.manage_brok(&resolved_brok("srv1")).await;
    helpdesk
        .manage_brok(&Brok::new(
            "initial_host_status",
            json!({"host_name": "srv1", "customs": {"_ITEMTYPE": "Printer"}}),
        ))
        .await;

    assert_eq!(
        helpdesk.host_entry("srv1").await,
        Some(HostCacheEntry::Unresolved)
    );
    assert_eq!(helpdesk.get_tickets(Some("srv1"), None, 50, true).await, None);
}

#[tokio::test]
async fn status_and_count_are_passed_through() {
    let server = MockServer::start().await;
    let helpdesk = started(&server).await;
    procedure("glpi.listTickets")
        .respond_with(xml_ok(json!([])))
        .mount(&server)
        .await;

    helpdesk.get_tickets(None, Some("notclosed"), 10, true).await;

    let sent = calls(&server, "glpi.listTickets").await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["status"], json!("notclosed"));
    assert_eq!(sent[0]["limit"], json!(10));
    assert!(sent[0].get("itemtype").is_none());
    assert!(sent[0].get("item").is_none());
}

#[tokio::test]
async fn list_fault_returns_none() {
    let server = MockServer::start().await;
    let helpdesk = started(&server).await;
    procedure("glpi.listTickets")
        .respond_with(xml_fault(13, "Bad session"))
        .mount(&server)
        .await;

    helpdesk.manage_brok(&resolved_brok("srv1")).await;
    assert_eq!(helpdesk.get_tickets(Some("srv1"), None, 50, true).await, None);
    assert_eq!(helpdesk.get_tickets(None, None, 50, false).await, None);
}

#[tokio::test]
async fn get_ticket_fault_returns_none() {
    let server = MockServer::start().await;
    let helpdesk = started(&server).await;
    procedure("glpi.getTicket")
        .respond_with(xml_fault(20, "Unknown ticket"))
        .mount(&server)
        .await;

    assert_eq!(helpdesk.get_ticket(&Identifier::from(404)).await, None);
    assert_eq!(
        calls(&server, "glpi.getTicket").await,
        vec![json!({"session": TOKEN, "ticket": 404, "id2name": 1, "iso8859": 1})]
    );
}

#[tokio::test]
async fn typed_ticket_id_is_sent_untouched() {
    let server = MockServer::start().await;
    let helpdesk = started(&server).await;
    procedure("glpi.getTicket")
        .respond_with(xml_ok(json!({"id": 7})))
        .mount(&server)
        .await;

    helpdesk.get_ui_ticket(&Identifier::parse("007")).await;
    helpdesk.get_ui_ticket(&Identifier::parse(" 12 ")).await;

    let sent: Vec<Value> = calls(&server, "glpi.getTicket")
        .await
        .into_iter()
        .map(|p| p["ticket"].clone())
        .collect();
    assert_eq!(sent, vec![json!("007"), json!(12)]);
}

#[tokio::test]
async fn full_listing_expands_tickets_and_skips_failures() {
    let server = MockServer::start().await;
    let helpdesk = started(&server).await;
    procedure("glpi.listTickets")
        .respond_with(xml_ok(json!([{"id": 1}, {"id": "2"}, {"name": "no id"}])))
        .mount(&server)
        .await;
    procedure("glpi.getTicket")
        .and(body_string_contains("<name>ticket</name><value><int>1</int></value>"))
        .respond_with(xml_ok(json!({"id": 1, "name": "Host status : srv1 is DOWN"})))
        .mount(&server)
        .await;
    procedure("glpi.getTicket")
        .and(body_string_contains("<name>ticket</name><value><string>2</string></value>"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    helpdesk.manage_brok(&resolved_brok("srv1")).await;
    let tickets = helpdesk.get_ui_tickets(Some("srv1/HTTP"), None, 50, false).await;

    assert_eq!(
        tickets,
        Some(vec![json!({"id": 1, "name": "Host status : srv1 is DOWN"})])
    );
    assert_eq!(calls(&server, "glpi.getTicket").await.len(), 2);
    let listed = calls(&server, "glpi.listTickets").await;
    assert_eq!(listed[0]["item"], json!(42));
}

#[tokio::test]
async fn set_ui_ticket_injects_session_and_source() {
    let server = MockServer::start().await;
    let helpdesk = started(&server).await;
    procedure("glpi.createTicket")
        .respond_with(xml_ok(json!({"id": 77, "name": "x"})))
        .mount(&server)
        .await;

    let created = helpdesk
        .set_ui_ticket(params(json!({"title": "x", "source": "forged"})))
        .await;

    assert_eq!(created, Some(json!({"id": 77, "name": "x"})));
    assert_eq!(
        calls(&server, "glpi.createTicket").await,
        vec![json!({"title": "x", "session": TOKEN, "source": "Shinken"})]
    );
}

#[tokio::test]
async fn followup_uses_configured_source() {
    let server = MockServer::start().await;
    mount_startup(&server).await;
    let config = Config {
        source: "Nagios".to_string(),
        ..config(&server)
    };
    let helpdesk = assert_ok!(Helpdesk::init(&config).await);
    procedure("glpi.addTicketFollowup")
        .respond_with(xml_ok(json!({"id": 3})))
        .mount(&server)
        .await;

    let created = helpdesk
        .set_ui_ticket_followup(params(json!({"ticket": 77, "content": "still DOWN"})))
        .await;

    assert_eq!(created, Some(json!({"id": 3})));
    assert_eq!(
        calls(&server, "glpi.addTicketFollowup").await,
        vec![json!({
            "ticket": 77,
            "content": "still DOWN",
            "session": TOKEN,
            "source": "Nagios",
        })]
    );
}

#[tokio::test]
async fn create_ticket_failure_returns_none() {
    let server = MockServer::start().await;
    let helpdesk = started(&server).await;
    procedure("glpi.createTicket")
        .respond_with(xml_fault(11, "Missing title"))
        .mount(&server)
        .await;
    procedure("glpi.addTicketFollowup")
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert_eq!(helpdesk.create_ticket(Map::new()).await, None);
    assert_eq!(helpdesk.create_ticket_followup(Map::new()).await, None);

    assert_eq!(
        calls(&server, "glpi.createTicket").await,
        vec![json!({"session": TOKEN, "source": "Shinken"})]
    );
}

#[tokio::test]
async fn downtime_and_unknown_broks_make_no_remote_calls() {
    let server = MockServer::start().await;
    let helpdesk = started(&server).await;
    let before = server.received_requests().await.unwrap().len();

    helpdesk.manage_brok(&resolved_brok("srv1")).await;
    helpdesk
        .manage_brok(&Brok::new("schedule_host_downtime", json!({"host_name": "srv1"})))
        .await;
    helpdesk
        .manage_brok(&Brok::new(
            "schedule_service_downtime",
            json!({"host_name": "srv1", "service_description": "HTTP"}),
        ))
        .await;
    helpdesk
        .manage_brok(&Brok::new("host_check_result", json!({"host_name": "srv1"})))
        .await;

    assert_eq!(server.received_requests().await.unwrap().len(), before);
    assert!(helpdesk.host_entry("srv1").await.unwrap().asset_id().is_some());
}

#[tokio::test]
async fn external_link_is_trimmed_endpoint() {
    let server = MockServer::start().await;
    let helpdesk = started(&server).await;
    assert_eq!(
        helpdesk.get_external_ui_link(),
        format!("{}/glpi", server.uri())
    );
}
