use chrono::DateTime;
use mockito::{Matcher, Server};
use threadmark_slack::{ChatPlatform, CommandResponse, PlatformError, SlackClient};

fn client(server: &Server) -> SlackClient {
    SlackClient::new("xoxb-test").unwrap().with_base_url(server.url())
}

#[tokio::test]
async fn test_fetch_replies_sends_query_and_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/conversations.replies")
        .match_header("authorization", "Bearer xoxb-test")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("channel".into(), "C1".into()),
            Matcher::UrlEncoded("ts".into(), "1700000000.000100".into()),
            Matcher::UrlEncoded("limit".into(), "1000".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "ok": true,
                "messages": [
                    {"ts": "1700000000.000100", "user": "U1", "text": "Deploy the thing", "reply_count": 2},
                    {"ts": "1700000001.000100", "user": "U2", "text": "name: Deploy"},
                    {"ts": "1700000002.000100", "user": "U1"}
                ],
                "has_more": false
            }"#,
        )
        .create_async()
        .await;

    let messages = client(&server)
        .fetch_replies("C1", "1700000000.000100", 1000)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].reply_count, Some(2));
    assert_eq!(messages[1].user.as_deref(), Some("U2"));
    assert_eq!(messages[2].text, "");
}

#[tokio::test]
async fn test_fetch_history_passes_oldest_seconds() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/conversations.history")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("channel".into(), "C1".into()),
            Matcher::UrlEncoded("oldest".into(), "1700000000".into()),
            Matcher::UrlEncoded("limit".into(), "50".into()),
        ]))
        .with_body(r#"{"ok": true, "messages": [{"ts": "1700000100.000100", "text": "root", "reply_count": 1}]}"#)
        .create_async()
        .await;

    let oldest = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
    let messages = client(&server).fetch_history("C1", oldest, 50).await.unwrap();

    mock.assert_async().await;
    assert_eq!(messages.len(), 1);
    assert!(messages[0].has_replies());
}

#[tokio::test]
async fn test_api_error_is_reported() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/conversations.history")
        .match_query(Matcher::Any)
        .with_body(r#"{"ok": false, "error": "not_in_channel"}"#)
        .create_async()
        .await;

    let oldest = DateTime::from_timestamp(0, 0).unwrap();
    let err = client(&server).fetch_history("C1", oldest, 10).await.unwrap_err();

    match err {
        PlatformError::Api { method, error } => {
            assert_eq!(method, "conversations.history");
            assert_eq!(error, "not_in_channel");
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_http_status_error_is_reported() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/chat.getPermalink")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let err = client(&server)
        .resolve_permalink("C1", "1.0")
        .await
        .unwrap_err();

    assert!(matches!(err, PlatformError::Status { status: 500, .. }));
}

#[tokio::test]
async fn test_resolve_permalink() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/chat.getPermalink")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("channel".into(), "C1".into()),
            Matcher::UrlEncoded("message_ts".into(), "1700000000.000100".into()),
        ]))
        .with_body(r#"{"ok": true, "channel": "C1", "permalink": "https://example.slack.com/archives/C1/p1700000000000100"}"#)
        .create_async()
        .await;

    let link = client(&server)
        .resolve_permalink("C1", "1700000000.000100")
        .await
        .unwrap();

    assert_eq!(link, "https://example.slack.com/archives/C1/p1700000000000100");
}

#[tokio::test]
async fn test_list_channels_follows_cursor_and_keeps_members() {
    let mut server = Server::new_async().await;
    let first = server
        .mock("GET", "/conversations.list")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("exclude_archived".into(), "true".into()),
            // no cursor on the first page, so the query ends with the limit
            Matcher::Regex("limit=1000$".into()),
        ]))
        .with_body(
            r#"{
                "ok": true,
                "channels": [
                    {"id": "C1", "name": "general", "is_member": true},
                    {"id": "C2", "name": "random", "is_member": false}
                ],
                "response_metadata": {"next_cursor": "page2"}
            }"#,
        )
        .create_async()
        .await;
    let second = server
        .mock("GET", "/conversations.list")
        .match_query(Matcher::UrlEncoded("cursor".into(), "page2".into()))
        .with_body(
            r#"{
                "ok": true,
                "channels": [{"id": "C3", "name": "eng", "is_member": true}],
                "response_metadata": {"next_cursor": ""}
            }"#,
        )
        .create_async()
        .await;

    let channels = client(&server).list_channels().await.unwrap();

    first.assert_async().await;
    second.assert_async().await;
    let ids: Vec<&str> = channels.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["C1", "C3"]);
}

#[tokio::test]
async fn test_respond_posts_to_response_url() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/commands/T1/123")
        .match_body(Matcher::Json(serde_json::json!({
            "response_type": "ephemeral",
            "text": "You have *1 open thread(s)*:"
        })))
        .with_body("ok")
        .create_async()
        .await;

    let url = format!("{}/commands/T1/123", server.url());
    client(&server)
        .respond(&url, &CommandResponse::ephemeral("You have *1 open thread(s)*:"))
        .await
        .unwrap();

    mock.assert_async().await;
}
