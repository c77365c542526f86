use std::sync::{Arc, Mutex};

use log::{LevelFilter, Log, Metadata, Record};
use serde_json::json;
use wechat_sdk::api::MsgSecCheck;
use wechat_sdk::credential::MiniProgramCredential;
use wechat_sdk::{RequestContext, WechatClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LIVE_TOKEN: &str = "SUPERSECRETTOKEN";

/// Keeps every record emitted by this crate.
struct CaptureLogger {
    lines: Mutex<Vec<String>>,
}

static LOGGER: CaptureLogger = CaptureLogger {
    lines: Mutex::new(Vec::new()),
};

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if record.target().starts_with("wechat_sdk") {
            self.lines.lock().unwrap().push(record.args().to_string());
        }
    }

    fn flush(&self) {}
}

#[tokio::test]
async fn test_trace_logs_never_contain_tokens() {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(LevelFilter::Trace);

    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": LIVE_TOKEN,
            "expires_in": 7200
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wxa/msg_sec_check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errcode": 0,
            "errmsg": "ok"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = WechatClient::builder()
        .scheme("http")
        .host_override(mock_server.address().to_string())
        .build()
        .unwrap();
    let tokens = client.token_manager(Arc::new(MiniProgramCredential::new("wx1", "s1")));

    client
        .send(&RequestContext::new(), &tokens, &MsgSecCheck::new("hello"))
        .await
        .unwrap();

    let lines = LOGGER.lines.lock().unwrap().clone();
    assert!(lines.iter().any(|line| line.starts_with("[Wechat] <<< ")));
    assert!(lines
        .iter()
        .any(|line| line.contains("access_token=[REDACTED]")));
    assert!(
        lines.iter().all(|line| !line.contains(LIVE_TOKEN)),
        "token leaked into logs: {lines:?}"
    );
}
