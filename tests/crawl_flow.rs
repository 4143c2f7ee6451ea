//! Full crawl over static listing fixtures with a mock image CDN.

mod common;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use albumgrab::config::Settings;
use albumgrab::models::DownloadStatus;
use albumgrab::scrapers::extract::{ExtractionStrategy, ValueSource};
use albumgrab::services::crawl::{CrawlOrchestrator, RunFolder};
use albumgrab::services::{crawl, reconcile};
use albumgrab::scrapers::CrawlSession;

use common::{sample_png, StaticDriver};

const BASE: &str = "http://shop.test/albums?tab=gallery";

fn listing(product_links: &[&str]) -> String {
    let links: String = product_links
        .iter()
        .map(|href| format!(r#"<a class="album__main" href="{}">album</a>"#, href))
        .collect();
    format!(
        r#"<div class="pagination__main"><span>au total 2 pages</span></div>
           <div class="albums">{}</div>"#,
        links
    )
}

fn product(title: &str, image_src: Option<&str>) -> String {
    let cover = image_src
        .map(|src| format!(r#"<div class="cover"><img src="{}"></div>"#, src))
        .unwrap_or_default();
    format!(
        r#"<div class="showalbumheader__gallerytitle">{}</div>{}"#,
        title, cover
    )
}

fn test_settings() -> Settings {
    let mut settings = Settings::default();
    // No real site, no politeness delays.
    settings.source_host = String::new();
    settings.timing.min_image_delay_ms = 0;
    settings.timing.max_image_delay_ms = 0;
    settings.timing.page_settle_ms = 0;
    settings.timing.product_settle_ms = 0;
    settings.timing.page_pause_ms = 0;
    settings.selectors.image = vec![ExtractionStrategy::new(
        ".cover img",
        ValueSource::Attribute("src".to_string()),
    )];
    settings
}

#[tokio::test]
async fn crawl_walks_pages_records_failures_and_reconciles_clean() {
    let server = MockServer::start().await;
    for p in ["/img1.png", "/img2.png"] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(sample_png()),
            )
            .mount(&server)
            .await;
    }
    // Valid bytes at a stand-in path: rejected on the URL, not the payload.
    Mock::given(method("GET"))
        .and(path("/static/placeholder.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(sample_png()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slow.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(sample_png())
                .set_delay(std::time::Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let mut driver = StaticDriver::new()
        .with_page(
            BASE,
            &listing(
                &[
                    "http://shop.test/albums/1",
                    "http://shop.test/albums/2",
                    "http://shop.test/albums/3",
                ],
            ),
        )
        .with_page(
            "http://shop.test/albums?tab=gallery&page=2",
            &listing(&["http://shop.test/albums/4"]),
        )
        .with_page(
            "http://shop.test/albums/1",
            &product(
                "200 HM6803-004 Size 36-45 YEEZY 700V2",
                Some(&format!("{}/img1.png", server.uri())),
            ),
        )
        .with_page(
            "http://shop.test/albums/2",
            &product("301 jordan retro", Some(&format!("{}/img2.png", server.uri()))),
        )
        .with_page(
            "http://shop.test/albums/3",
            &product(
                "404 air max",
                Some(&format!("{}/static/placeholder.png", server.uri())),
            ),
        )
        .with_page(
            "http://shop.test/albums/4",
            &product("505 dunk low", Some(&format!("{}/slow.jpg", server.uri()))),
        );

    let dir = TempDir::new().unwrap();
    let run = RunFolder::create(dir.path().join("run")).unwrap();
    let settings = test_settings();
    // Short HTTP timeout so the delayed mock registers as a network failure.
    let mut session = CrawlSession::new("", std::time::Duration::from_millis(500)).unwrap();

    let orchestrator = CrawlOrchestrator::new(settings.clone());
    let outcome = orchestrator
        .run(
            &mut driver,
            &mut session,
            BASE,
            &run,
            Arc::new(AtomicBool::new(false)),
        )
        .await;

    assert!(!outcome.interrupted);
    assert!(driver
        .visited
        .contains(&"http://shop.test/albums?tab=gallery&page=2".to_string()));
    assert_eq!(outcome.pagination.total_pages, 2);
    assert_eq!(outcome.attempts, 4);
    assert_eq!(outcome.records.len(), 4);
    assert!(!driver.secondary_open());

    // Slots 1 and 2 succeeded, slot 3 was a placeholder, slot 4 timed out.
    let statuses: Vec<bool> = outcome
        .records
        .iter()
        .map(|r| r.download_status.is_success())
        .collect();
    assert_eq!(statuses, vec![true, true, false, false]);

    assert_eq!(outcome.records[0].canonical_name, "YEEZY_700V2");
    assert_eq!(outcome.records[0].saved_filename.as_deref(), Some("img-1.jpg"));
    let expected_served = format!("{}/images/run/img-1.jpg", settings.output.served_base_url);
    assert_eq!(
        outcome.records[0].served_image_url.as_deref(),
        Some(expected_served.as_str())
    );
    assert_eq!(outcome.records[1].saved_filename.as_deref(), Some("img-2.jpg"));

    match &outcome.records[2].download_status {
        DownloadStatus::Failed(reason) => {
            assert!(reason.contains("placeholder"), "{}", reason)
        }
        other => panic!("expected failure, got {:?}", other),
    }
    match &outcome.records[3].download_status {
        DownloadStatus::Failed(reason) => {
            assert!(reason.contains("network error"), "{}", reason)
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(outcome.records[3].page_number, 2);

    // Exactly the two successful slots are on disk.
    assert!(run.images_dir.join("img-1.jpg").exists());
    assert!(run.images_dir.join("img-2.jpg").exists());
    assert!(!run.images_dir.join("img-3.jpg").exists());

    // Final flush writes both tables and leaves nothing to reconcile.
    crawl::finish_run(&outcome, &run, &settings.output.base_name).unwrap();
    assert!(run.root.join("catalog_data.csv").exists());
    assert!(run.root.join("catalog_data.xlsx").exists());
    assert!(!run.root.join("temp_catalog_data.csv").exists());

    let report = reconcile::reconcile(&outcome.records, &run.images_dir).unwrap();
    assert_eq!(report.declared_success, 2);
    assert_eq!(report.actual_files, 2);
    assert!(!report.has_drift());
}

#[tokio::test]
async fn product_without_image_url_gets_a_failed_row() {
    let mut driver = StaticDriver::new()
        .with_page(
            BASE,
            r#"<div class="albums">
                 <a class="album__main" href="http://shop.test/albums/9">album</a>
               </div>"#,
        )
        .with_page("http://shop.test/albums/9", &product("909 air force", None));

    let dir = TempDir::new().unwrap();
    let run = RunFolder::create(dir.path().join("run")).unwrap();
    let mut session = CrawlSession::new("", std::time::Duration::from_secs(5)).unwrap();

    let outcome = CrawlOrchestrator::new(test_settings())
        .run(
            &mut driver,
            &mut session,
            BASE,
            &run,
            Arc::new(AtomicBool::new(false)),
        )
        .await;

    // No pagination container: single-page listing.
    assert_eq!(outcome.pagination.total_pages, 1);
    assert!(!outcome.pagination.has_pagination);
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.attempts, 1);

    let record = &outcome.records[0];
    assert!(record.original_image_url.is_none());
    assert!(record.saved_filename.is_none());
    match &record.download_status {
        DownloadStatus::Failed(reason) => assert!(reason.contains("image URL"), "{}", reason),
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn interrupt_before_second_page_keeps_first_page_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img1.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(sample_png()),
        )
        .mount(&server)
        .await;

    let mut driver = StaticDriver::new()
        .with_page(BASE, &listing(&["http://shop.test/albums/1"]))
        .with_page(
            "http://shop.test/albums/1",
            &product("100 sample", Some(&format!("{}/img1.png", server.uri()))),
        );
    // Page 2 fixture is deliberately absent; the cancel flag must stop the
    // loop before it is requested.

    let dir = TempDir::new().unwrap();
    let run = RunFolder::create(dir.path().join("run")).unwrap();
    let mut session = CrawlSession::new("", std::time::Duration::from_secs(5)).unwrap();

    let cancel = Arc::new(AtomicBool::new(false));
    cancel.store(true, std::sync::atomic::Ordering::Relaxed);
    // Flag set before the run: the loop exits at its first checkpoint.
    let outcome = CrawlOrchestrator::new(test_settings())
        .run(&mut driver, &mut session, BASE, &run, cancel)
        .await;

    assert!(outcome.interrupted);
    assert!(outcome.records.is_empty());
    assert_eq!(outcome.attempts, 0);
}

#[tokio::test]
async fn unreachable_listing_yields_an_empty_outcome() {
    let mut driver = StaticDriver::new();
    let dir = TempDir::new().unwrap();
    let run = RunFolder::create(dir.path().join("run")).unwrap();
    let mut session = CrawlSession::new("", std::time::Duration::from_secs(5)).unwrap();

    let outcome = CrawlOrchestrator::new(test_settings())
        .run(
            &mut driver,
            &mut session,
            BASE,
            &run,
            Arc::new(AtomicBool::new(false)),
        )
        .await;

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.attempts, 0);
    assert!(!outcome.interrupted);
}
