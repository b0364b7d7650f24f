use std::sync::Arc;

use pretty_assertions::assert_eq;
use relay_core::{PageSelection, ProgressLog, SizeVariant};
use relay_engine::{
    FetchSettings, MetadataError, PipelineSettings, RelayPipeline, ReqwestFetcher,
    ResolveSettings,
};
use serde_json::json;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HINT: &str = "ask an operator to check the logs";

fn pipeline(server: &MockServer, settings: PipelineSettings) -> RelayPipeline {
    let fetcher = ReqwestFetcher::new(FetchSettings::default()).unwrap();
    RelayPipeline::new(Arc::new(fetcher), server.uri(), settings)
}

fn small_ceiling() -> PipelineSettings {
    PipelineSettings {
        resolve: ResolveSettings {
            image_byte_ceiling: 100,
            ..ResolveSettings::default()
        },
        ..PipelineSettings::default()
    }
}

async fn mount_metadata(server: &MockServer, page_count: serde_json::Value) {
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path("/ajax/illust/12345"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": false,
            "message": "",
            "body": {
                "userId": "42",
                "userName": "artist",
                "title": "Cats",
                "description": "cats<br />and more cats",
                "uploadDate": "2019-03-05T15:00:00+00:00",
                "pageCount": page_count,
                "urls": {
                    "mini": null,
                    "original": format!("{base}/img-original/12345_p0.png"),
                    "regular": format!("{base}/img-master/12345_p0_master1200.jpg"),
                    "small": format!("{base}/c/540x540/img-master/12345_p0_master1200.jpg")
                }
            }
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ajax/user/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": false,
            "body": { "imageBig": format!("{base}/user-profile/a_170.png") }
        })))
        .mount(server)
        .await;
}

async fn mount_bytes(server: &MockServer, regex: &str, len: usize) {
    Mock::given(method("GET"))
        .and(path_regex(regex))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![9_u8; len], "image/jpeg"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn metadata_is_fetched_illustration_then_author() {
    let server = MockServer::start().await;
    mount_metadata(&server, json!(2)).await;

    let metadata = pipeline(&server, PipelineSettings::default())
        .fetch_metadata(12345)
        .await
        .expect("metadata");

    assert_eq!(metadata.artwork_url, "https://www.pixiv.net/artworks/12345");
    assert_eq!(metadata.illust.user_id, "42");
    assert_eq!(metadata.illust.page_count, Some(2));
    assert_eq!(
        metadata.illust.description.as_deref(),
        Some("cats\nand more cats")
    );
    assert_eq!(metadata.illust.urls.len(), 3);
    assert!(metadata.illust.urls.contains_key(&SizeVariant::Regular));
    assert_eq!(
        metadata.author.image_big,
        Some(format!("{}/user-profile/a_170.png", server.uri()))
    );
}

#[tokio::test]
async fn upstream_error_aborts_the_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ajax/illust/12345"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": true,
            "message": "Work has been deleted",
            "body": []
        })))
        .mount(&server)
        .await;

    let err = pipeline(&server, PipelineSettings::default())
        .fetch_metadata(12345)
        .await
        .unwrap_err();

    match err {
        MetadataError::Upstream(message) => assert_eq!(message, "Work has been deleted"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn oversized_originals_fall_back_and_bundles_are_built() {
    let server = MockServer::start().await;
    mount_metadata(&server, json!(2)).await;
    mount_bytes(&server, r"^/img-original/.*\.png$", 200).await;
    mount_bytes(&server, r"^/img-master/.*\.jpg$", 50).await;
    mount_bytes(&server, r"^/user-profile/.*$", 8).await;

    let pipeline = pipeline(&server, small_ceiling());
    let metadata = pipeline.fetch_metadata(12345).await.unwrap();
    let log = ProgressLog::detached();

    let reply = pipeline
        .prepare_reply(&metadata, &PageSelection::default(), &log)
        .await;

    assert_eq!(reply.attached, 2);
    assert_eq!(reply.requested, 2);
    assert_eq!(reply.bundles.len(), 2);
    assert_eq!(
        reply.bundles[0].content,
        "https://www.pixiv.net/artworks/12345\nattached 2 of 2 images"
    );
    let names: Vec<_> = reply.bundles[1]
        .attachments
        .iter()
        .map(|a| a.name.as_str())
        .collect();
    assert_eq!(names, vec!["page2-regular.jpg", "thumbnail.png"]);
    assert_eq!(reply.bundles[1].previews[0].author_url, "https://www.pixiv.net/users/42");
    assert_eq!(log.error_count(), 0);
}

#[tokio::test]
async fn every_page_failing_yields_a_text_only_reply() {
    let server = MockServer::start().await;
    mount_metadata(&server, json!(2)).await;

    let pipeline = pipeline(&server, PipelineSettings::default());
    let metadata = pipeline.fetch_metadata(12345).await.unwrap();
    let log = ProgressLog::detached();

    let reply = pipeline
        .prepare_reply(&metadata, &PageSelection::default(), &log)
        .await;

    assert_eq!(reply.attached, 0);
    assert_eq!(reply.bundles.len(), 1);
    let bundle = &reply.bundles[0];
    assert!(bundle.previews.is_empty());
    assert!(bundle.attachments.is_empty());
    assert!(bundle
        .content
        .starts_with("https://www.pixiv.net/artworks/12345\nattached 0 of 2 images\n- page 1:"));
    assert!(bundle.content.contains("\n- page 2:"));
    assert!(bundle.content.ends_with(HINT));
}

#[tokio::test]
async fn clipped_illustration_reports_a_lower_bound() {
    let server = MockServer::start().await;
    mount_metadata(&server, json!("20")).await;
    mount_bytes(&server, r"^/img-original/.*\.png$", 10).await;
    mount_bytes(&server, r"^/user-profile/.*$", 8).await;

    let pipeline = pipeline(&server, PipelineSettings::default());
    let metadata = pipeline.fetch_metadata(12345).await.unwrap();
    let log = ProgressLog::detached();

    let reply = pipeline
        .prepare_reply(&metadata, &PageSelection::default(), &log)
        .await;

    assert_eq!(reply.requested, 9);
    assert_eq!(reply.bundles.len(), 9);
    assert!(reply.bundles[0].content.ends_with("attached 9 of 9+ images"));
    assert_eq!(reply.bundles[8].attachments[0].name, "page9-original.png");
}

#[tokio::test]
async fn explicit_pages_with_duplicates_and_out_of_range() {
    let server = MockServer::start().await;
    mount_metadata(&server, json!(3)).await;
    mount_bytes(&server, r"^/img-original/12345_p[0-2]\.png$", 10).await;
    mount_bytes(&server, r"^/user-profile/.*$", 8).await;

    let pipeline = pipeline(&server, PipelineSettings::default());
    let metadata = pipeline.fetch_metadata(12345).await.unwrap();
    let log = ProgressLog::detached();
    let selection = PageSelection {
        pages: vec![2, 5, 2],
        rejected: Vec::new(),
    };

    let reply = pipeline.prepare_reply(&metadata, &selection, &log).await;

    assert_eq!(reply.requested, 3);
    assert_eq!(reply.attached, 1);
    assert_eq!(reply.bundles[0].attachments[0].name, "page2-original.png");
    let errors = log.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("page 5:"));
    assert!(reply.bundles[0].content.contains("attached 1 of 3 images"));
    assert!(reply.bundles[0].content.ends_with(HINT));
}

#[tokio::test]
async fn missing_page_count_defaults_to_a_single_page() {
    let server = MockServer::start().await;
    mount_metadata(&server, json!(null)).await;
    mount_bytes(&server, r"^/img-original/.*\.png$", 10).await;

    let pipeline = pipeline(&server, PipelineSettings::default());
    let metadata = pipeline.fetch_metadata(12345).await.unwrap();
    let log = ProgressLog::detached();

    let reply = pipeline
        .prepare_reply(&metadata, &PageSelection::default(), &log)
        .await;

    assert_eq!(reply.requested, 1);
    assert_eq!(reply.attached, 1);
    // Thumbnail is missing on the server; that is only a warning.
    assert_eq!(reply.bundles[0].attachments.len(), 1);
    assert_eq!(log.error_count(), 0);
}
