use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde_json::json;
use wechat_sdk::credential::{MiniProgramCredential, OfficialAccountCredential};
use wechat_sdk::token::TokenManager;
use wechat_sdk::{RequestContext, WechatClient, WechatError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const APPID: &str = "wx1234567890abcdef";
const SECRET: &str = "secret1234567890ab";

fn create_test_client(mock_server: &MockServer) -> WechatClient {
    WechatClient::builder()
        .scheme("http")
        .host_override(mock_server.address().to_string())
        .cache_sweep_interval(None)
        .build()
        .unwrap()
}

fn miniprogram_tokens(client: &WechatClient) -> TokenManager {
    client.token_manager(Arc::new(MiniProgramCredential::new(APPID, SECRET)))
}

fn token_response(token: &str, expires_in: i64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": token,
        "expires_in": expires_in
    }))
}

#[tokio::test]
async fn test_token_fetched_once_then_cached() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .and(query_param("grant_type", "client_credential"))
        .and(query_param("appid", APPID))
        .and(query_param("secret", SECRET))
        .respond_with(token_response("ACCESS_TOKEN", 7200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let tokens = miniprogram_tokens(&client);
    let ctx = RequestContext::new();

    assert_eq!(tokens.get_token(&ctx, false).await.unwrap(), "ACCESS_TOKEN");
    assert_eq!(tokens.get_token(&ctx, false).await.unwrap(), "ACCESS_TOKEN");

    let cached = client.cache().get(&ctx, tokens.cache_key()).await.unwrap();
    assert_eq!(cached, "ACCESS_TOKEN");
}

#[tokio::test]
async fn test_concurrent_callers_share_one_fetch() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .respond_with(token_response("SHARED", 7200).set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let tokens = miniprogram_tokens(&client);
    let ctx = RequestContext::new();

    let results = join_all((0..10).map(|_| {
        let tokens = tokens.clone();
        let ctx = ctx.clone();
        async move { tokens.get_token(&ctx, false).await }
    }))
    .await;

    for result in results {
        assert_eq!(result.unwrap(), "SHARED");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_on_multi_thread_runtime() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .respond_with(token_response("SHARED", 7200).set_delay(Duration::from_millis(100)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let handles: Vec<_> = (0..8)
        .map(|_| {
            // separate managers for the same credential share the cache slot
            let tokens = miniprogram_tokens(&client);
            tokio::spawn(async move { tokens.get_token(&RequestContext::new(), false).await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "SHARED");
    }
}

#[tokio::test]
async fn test_force_refresh_bypasses_cache() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .respond_with(token_response("FIRST", 7200))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .respond_with(token_response("SECOND", 7200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let tokens = miniprogram_tokens(&client);
    let ctx = RequestContext::new();

    assert_eq!(tokens.get_token(&ctx, false).await.unwrap(), "FIRST");
    assert_eq!(tokens.refresh_token(&ctx).await.unwrap(), "SECOND");
    assert_eq!(tokens.get_token(&ctx, false).await.unwrap(), "SECOND");
}

#[tokio::test]
async fn test_miniprogram_and_official_account_share_cache_slot() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .respond_with(token_response("SAME", 7200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let mp = miniprogram_tokens(&client);
    let oa = client.token_manager(Arc::new(OfficialAccountCredential::new(APPID, SECRET)));
    let ctx = RequestContext::new();

    assert_eq!(mp.cache_key(), oa.cache_key());
    assert_eq!(mp.get_token(&ctx, false).await.unwrap(), "SAME");
    assert_eq!(oa.get_token(&ctx, false).await.unwrap(), "SAME");
}

#[tokio::test]
async fn test_different_apps_get_separate_tokens() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .and(query_param("appid", "wx_a"))
        .respond_with(token_response("TOKEN_A", 7200))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .and(query_param("appid", "wx_b"))
        .respond_with(token_response("TOKEN_B", 7200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let a = client.token_manager(Arc::new(MiniProgramCredential::new("wx_a", SECRET)));
    let b = client.token_manager(Arc::new(MiniProgramCredential::new("wx_b", SECRET)));
    let ctx = RequestContext::new();

    assert_ne!(a.cache_key(), b.cache_key());
    assert_eq!(a.get_token(&ctx, false).await.unwrap(), "TOKEN_A");
    assert_eq!(b.get_token(&ctx, false).await.unwrap(), "TOKEN_B");
    assert_eq!(a.get_token(&ctx, false).await.unwrap(), "TOKEN_A");
}

#[tokio::test]
async fn test_fetch_error_is_wrapped_and_not_cached() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errcode": 40013,
            "errmsg": "invalid appid"
        })))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let tokens = miniprogram_tokens(&client);
    let ctx = RequestContext::new();

    for _ in 0..2 {
        let err = tokens.get_token(&ctx, false).await.unwrap_err();
        assert!(matches!(
            err,
            WechatError::Credential {
                name: "miniprogram_credential",
                ..
            }
        ));
        assert_eq!(err.errcode(), Some(40013));
        assert!(!err.is_token_invalid());
    }
}

#[tokio::test]
async fn test_token_within_safety_margin_is_refetched() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .respond_with(token_response("SHORT", 300))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let tokens = miniprogram_tokens(&client);
    let ctx = RequestContext::new();

    assert_eq!(tokens.get_token(&ctx, false).await.unwrap(), "SHORT");
    assert_eq!(tokens.get_token(&ctx, false).await.unwrap(), "SHORT");
}

#[tokio::test]
async fn test_custom_safety_margin() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .respond_with(token_response("SHORT", 300))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = WechatClient::builder()
        .scheme("http")
        .host_override(mock_server.address().to_string())
        .token_safety_margin(Duration::from_secs(60))
        .build()
        .unwrap();
    let tokens = miniprogram_tokens(&client);
    let ctx = RequestContext::new();

    assert_eq!(tokens.get_token(&ctx, false).await.unwrap(), "SHORT");
    assert_eq!(tokens.get_token(&ctx, false).await.unwrap(), "SHORT");
}

#[tokio::test]
async fn test_timeout_while_fetching() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .respond_with(token_response("LATE", 7200).set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let tokens = miniprogram_tokens(&client);
    let ctx = RequestContext::with_timeout(Duration::from_millis(100));

    let err = tokens.get_token(&ctx, false).await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(client
        .cache()
        .get(&RequestContext::new(), tokens.cache_key())
        .await
        .is_err());
}
