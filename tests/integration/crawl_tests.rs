//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end, from the first claim to the exported
//! CSV tables and the checkpoint file.

use shoal::config::{default_allowed_types, Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use shoal::crawler::Coordinator;
use shoal::output::read_tables;
use shoal::state::{FetchStatus, ResultTables};
use shoal::storage::{CheckpointStore, SqliteCheckpointStore};
use shoal::LinkIndicator;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling `root_url`, writing into `dir`
fn create_test_config(root_url: &str, dir: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            root_url: root_url.to_string(),
            site_domain: None,
            max_pages: 100,
            max_depth: 16,
            politeness_delay: 0,
            worker_count: 4,
            request_timeout: 2000,
            claim_timeout: 50,
            checkpoint_interval: 2,
            allowed_types: default_allowed_types(),
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            directory: dir.join("out").display().to_string(),
            site_name: "test".to_string(),
            checkpoint_path: dir.join("state.db").display().to_string(),
            report_path: dir.join("report.md").display().to_string(),
        },
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_raw(format!("<html><body>{}</body></html>", body), "text/html")
}

async fn mount_page(server: &MockServer, page: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(response)
        .mount(server)
        .await;
}

fn fetched_urls(tables: &ResultTables) -> Vec<String> {
    let mut urls: Vec<_> = tables.fetches.iter().map(|f| f.url.clone()).collect();
    urls.sort();
    urls
}

/// Sorted copy of every table, for comparisons that ignore worker ordering
fn normalized(tables: &ResultTables) -> (Vec<String>, Vec<String>, Vec<String>) {
    let mut fetches: Vec<_> = tables
        .fetches
        .iter()
        .map(|f| format!("{} {}", f.url, f.status))
        .collect();
    let mut visits: Vec<_> = tables
        .visits
        .iter()
        .map(|v| format!("{} {} {} {}", v.url, v.byte_size, v.outlink_count, v.content_type))
        .collect();
    let mut links: Vec<_> = tables
        .links
        .iter()
        .map(|l| format!("{} {}", l.url, l.indicator))
        .collect();
    fetches.sort();
    visits.sort();
    links.sort();
    (fetches, visits, links)
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        html(r#"<a href="/page1">1</a><a href="page2">2</a><a href="https://external.example.com/x">x</a>"#),
    )
    .await;
    mount_page(&server, "/page1", html(r#"<a href="/">home</a><a href="/page2">2</a>"#)).await;
    mount_page(&server, "/page2", html("no links here")).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&base, dir.path());
    let output = config.output.clone();

    let coordinator = Coordinator::new(config, true).expect("Failed to create coordinator");
    let summary = coordinator.run().await.expect("Crawl failed");

    assert_eq!(summary.visited, 3);
    assert_eq!(summary.fetches, 3);
    assert_eq!(summary.visits, 3);
    assert_eq!(summary.links, 5);
    assert_eq!(summary.pending, 0);
    assert!(!summary.halted);

    let tables = read_tables(&output).unwrap();
    assert_eq!(
        fetched_urls(&tables),
        vec![
            format!("{}/", base),
            format!("{}/page1", base),
            format!("{}/page2", base),
        ]
    );
    assert!(tables.fetches.iter().all(|f| f.status == FetchStatus::Code(200)));

    // Every visit has exactly one 200 fetch
    for visit in &tables.visits {
        let matching: Vec<_> = tables.fetches.iter().filter(|f| f.url == visit.url).collect();
        assert_eq!(matching.len(), 1);
        assert!(matching[0].status.is_success());
    }

    let external: Vec<_> = tables
        .links
        .iter()
        .filter(|l| l.indicator == LinkIndicator::NotOk)
        .collect();
    assert_eq!(external.len(), 1);
    assert_eq!(external[0].url, "https://external.example.com/x");

    let fetch_csv = std::fs::read_to_string(output.fetch_table_path()).unwrap();
    assert!(fetch_csv.starts_with("url,status\n"));
    let visit_csv = std::fs::read_to_string(output.visit_table_path()).unwrap();
    assert!(visit_csv.starts_with("url,byte_size,outlink_count,content_type\n"));
    let links_csv = std::fs::read_to_string(output.links_table_path()).unwrap();
    assert!(links_csv.starts_with("url,indicator\n"));
}

#[tokio::test]
async fn test_single_page_budget_with_many_workers() {
    let server = MockServer::start().await;

    let links: String = (0..20)
        .map(|i| format!(r#"<a href="/p{}">{}</a>"#, i, i))
        .collect();
    mount_page(&server, "/", html(&links)).await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(&server.uri(), dir.path());
    config.crawler.max_pages = 1;
    config.crawler.worker_count = 8;
    let output = config.output.clone();

    let coordinator = Coordinator::new(config, true).unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.visited, 1);
    assert_eq!(summary.fetches, 1);

    let tables = read_tables(&output).unwrap();
    assert_eq!(tables.fetches.len(), 1);
    assert_eq!(tables.links.len(), 20);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn test_html_with_charset_counts_distinct_outlinks() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        ResponseTemplate::new(200)
            .set_body_raw(
                r##"<html><body>
                <a href="/a">A</a>
                <a href="/b">B</a>
                <a href="https://external.example.com/x">X</a>
                <a href="/a#again">A again</a>
                </body></html>"##,
                "text/html; charset=utf-8",
            ),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(&server.uri(), dir.path());
    config.crawler.max_pages = 1;
    let output = config.output.clone();

    Coordinator::new(config, true).unwrap().run().await.unwrap();

    let tables = read_tables(&output).unwrap();
    assert_eq!(tables.visits.len(), 1);
    assert_eq!(tables.visits[0].outlink_count, 3);
    assert_eq!(tables.visits[0].content_type, "text/html");
    assert_eq!(tables.links.len(), 3);

    let internal = tables.links.iter().filter(|l| l.indicator.is_internal()).count();
    assert_eq!(internal, 2);
}

#[tokio::test]
async fn test_timeout_records_error() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        html(r#"<a href="/next">next</a>"#).set_delay(Duration::from_secs(3)),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(&server.uri(), dir.path());
    config.crawler.request_timeout = 200;
    let output = config.output.clone();
    let checkpoint = config.output.checkpoint_path.clone();

    let summary = Coordinator::new(config, true).unwrap().run().await.unwrap();
    assert_eq!(summary.visited, 1);

    let tables = read_tables(&output).unwrap();
    assert_eq!(tables.fetches.len(), 1);
    assert_eq!(tables.fetches[0].status, FetchStatus::Error);
    assert!(tables.visits.is_empty());
    assert!(tables.links.is_empty());

    let fetch_csv = std::fs::read_to_string(output.fetch_table_path()).unwrap();
    assert!(fetch_csv.ends_with(",Error\n"));

    let store = SqliteCheckpointStore::new(Path::new(&checkpoint)).unwrap();
    let state = store.load().unwrap().unwrap();
    assert_eq!(state.visited, vec![format!("{}/", server.uri())]);
}

#[tokio::test]
async fn test_crawl_with_depth_limit() {
    let server = MockServer::start().await;

    mount_page(&server, "/", html(r#"<a href="/d1">1</a>"#)).await;
    mount_page(&server, "/d1", html(r#"<a href="/d2">2</a>"#)).await;
    mount_page(&server, "/d2", html(r#"<a href="/d3">3</a>"#)).await;
    Mock::given(method("GET"))
        .and(path("/d3"))
        .respond_with(html("too deep"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(&server.uri(), dir.path());
    config.crawler.max_depth = 2;
    let output = config.output.clone();

    let summary = Coordinator::new(config, true).unwrap().run().await.unwrap();
    assert_eq!(summary.visited, 3);

    let tables = read_tables(&output).unwrap();
    assert_eq!(tables.fetches.len(), 3);
    // The over-depth link is still recorded on the page that holds it
    assert!(tables.links.iter().any(|l| l.url.ends_with("/d3")));
}

#[tokio::test]
async fn test_non_success_statuses_are_not_followed() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", html(r#"<a href="/missing">m</a><a href="/old">o</a>"#)).await;
    mount_page(&server, "/missing", ResponseTemplate::new(404)).await;
    mount_page(
        &server,
        "/old",
        ResponseTemplate::new(301).insert_header("location", format!("{}/new", base).as_str()),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html("moved here"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&base, dir.path());
    let output = config.output.clone();

    Coordinator::new(config, true).unwrap().run().await.unwrap();

    let tables = read_tables(&output).unwrap();
    assert_eq!(tables.fetches.len(), 3);

    let status_of = |suffix: &str| {
        tables
            .fetches
            .iter()
            .find(|f| f.url.ends_with(suffix))
            .map(|f| f.status)
    };
    assert_eq!(status_of("/missing"), Some(FetchStatus::Code(404)));
    assert_eq!(status_of("/old"), Some(FetchStatus::Code(301)));

    assert_eq!(tables.visits.len(), 1);
    assert_eq!(tables.visits[0].url, format!("{}/", base));
}

#[tokio::test]
async fn test_content_type_handling() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        html(r#"<a href="/doc.pdf">pdf</a><a href="/data.json">json</a>"#),
    )
    .await;
    mount_page(
        &server,
        "/doc.pdf",
        ResponseTemplate::new(200)
            .set_body_raw(vec![0u8; 4096], "application/pdf"),
    )
    .await;
    mount_page(
        &server,
        "/data.json",
        ResponseTemplate::new(200)
            .set_body_raw(r#"{"links": "<a href='/hidden'>"}"#, "application/json"),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), dir.path());
    let output = config.output.clone();

    Coordinator::new(config, true).unwrap().run().await.unwrap();

    let tables = read_tables(&output).unwrap();
    assert_eq!(tables.fetches.len(), 3);
    assert_eq!(tables.visits.len(), 2);

    let pdf = tables
        .visits
        .iter()
        .find(|v| v.url.ends_with("/doc.pdf"))
        .expect("pdf should be visited");
    assert_eq!(pdf.byte_size, 4096);
    assert_eq!(pdf.outlink_count, 0);
    assert_eq!(pdf.content_type, "application/pdf");

    assert!(!tables.visits.iter().any(|v| v.url.ends_with("/data.json")));
    assert!(!tables.fetches.iter().any(|f| f.url.ends_with("/hidden")));
}

async fn mount_resume_site(server: &MockServer) {
    mount_page(
        server,
        "/",
        html(
            r#"<a href="/p1">1</a><a href="/p2">2</a><a href="/p3">3</a>
               <a href="https://elsewhere.example.org/">out</a>"#,
        ),
    )
    .await;
    mount_page(server, "/p1", html(r#"<a href="/p4">4</a><a href="/">home</a>"#)).await;
    mount_page(server, "/p2", html(r#"<a href="/p4">4</a><a href="/p5">5</a>"#)).await;
    mount_page(server, "/p3", ResponseTemplate::new(404)).await;
    mount_page(server, "/p4", html(r#"<a href="/p6">6</a>"#)).await;
    mount_page(server, "/p5", html("leaf")).await;
    mount_page(server, "/p6", html(r#"<a href="/p1">back</a>"#)).await;
}

#[tokio::test]
async fn test_resume_matches_uninterrupted_run() {
    let server = MockServer::start().await;
    mount_resume_site(&server).await;

    // Uninterrupted reference run
    let reference_dir = tempfile::tempdir().unwrap();
    let reference_config = create_test_config(&server.uri(), reference_dir.path());
    let reference_output = reference_config.output.clone();
    Coordinator::new(reference_config, true)
        .unwrap()
        .run()
        .await
        .unwrap();
    let reference = read_tables(&reference_output).unwrap();
    let requests_before = server.received_requests().await.unwrap().len();

    // Interrupted run: halt once the first request of this run arrives
    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(&server.uri(), dir.path());
    config.crawler.worker_count = 1;
    config.crawler.politeness_delay = 50;
    config.crawler.checkpoint_interval = 1;

    let interrupted = Coordinator::new(config.clone(), true).unwrap();
    let (first, _) = tokio::join!(interrupted.run(), async {
        loop {
            let seen = server.received_requests().await.unwrap().len();
            if seen > requests_before {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        interrupted.stop();
    });
    let first = first.unwrap();
    assert!(first.halted);
    drop(interrupted);

    // Resume from the checkpoint in a new coordinator
    let resumed = Coordinator::new(config.clone(), false).unwrap();
    let second = resumed.run().await.unwrap();
    assert!(!second.halted);
    assert_eq!(second.pending, 0);

    let tables = read_tables(&config.output).unwrap();
    assert_eq!(normalized(&tables), normalized(&reference));
    assert_eq!(second.visited, reference.fetches.len());
}

async fn wait_for_requests(server: &MockServer, count: usize) {
    while server.received_requests().await.unwrap().len() < count {
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}

#[tokio::test]
async fn test_resume_after_hard_stop_never_refetches() {
    let server = MockServer::start().await;

    let links: String = (0..60)
        .map(|i| format!(r#"<a href="/p{}">{}</a>"#, i, i))
        .collect();
    mount_page(&server, "/", html(&links)).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/p\d+$"))
        .respond_with(html("leaf").set_delay(Duration::from_millis(30)))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(&server.uri(), dir.path());
    config.crawler.max_pages = 40;
    config.crawler.checkpoint_interval = 3;

    // Drop the crawl mid-flight: no final checkpoint, claims left unrecorded
    let coordinator = Coordinator::new(config.clone(), true).unwrap();
    tokio::select! {
        _ = coordinator.run() => panic!("crawl finished before it was stopped"),
        _ = wait_for_requests(&server, 10) => {}
    }
    drop(coordinator);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let checkpoint = {
        let store = SqliteCheckpointStore::new(Path::new(&config.output.checkpoint_path)).unwrap();
        store.load().unwrap().expect("a periodic checkpoint was saved")
    };
    assert!(checkpoint.fetches.len() <= checkpoint.visited.len());
    let checkpointed: HashSet<String> = checkpoint.visited.iter().cloned().collect();
    let requests_before = server.received_requests().await.unwrap().len();

    let summary = Coordinator::new(config.clone(), false)
        .unwrap()
        .run()
        .await
        .unwrap();
    assert!(summary.visited <= 40);
    assert!(!summary.halted);

    let requests = server.received_requests().await.unwrap();
    for request in &requests[requests_before..] {
        assert!(
            !checkpointed.contains(request.url.as_str()),
            "{} was fetched again after resume",
            request.url
        );
    }

    let tables = read_tables(&config.output).unwrap();
    let unique: HashSet<&str> = tables.fetches.iter().map(|f| f.url.as_str()).collect();
    assert_eq!(unique.len(), tables.fetches.len());
    assert!(tables.fetches.len() <= summary.visited);
}

#[tokio::test]
async fn test_rerun_of_completed_crawl_fetches_nothing() {
    let server = MockServer::start().await;
    mount_resume_site(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    Coordinator::new(config.clone(), true)
        .unwrap()
        .run()
        .await
        .unwrap();
    let first = read_tables(&config.output).unwrap();
    let requests = server.received_requests().await.unwrap().len();

    let summary = Coordinator::new(config.clone(), false)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(server.received_requests().await.unwrap().len(), requests);
    assert_eq!(summary.fetches, first.fetches.len());
    assert_eq!(read_tables(&config.output).unwrap(), first);
}

#[tokio::test]
async fn test_fresh_discards_previous_checkpoint() {
    let server = MockServer::start().await;
    mount_resume_site(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    let first = Coordinator::new(config.clone(), true)
        .unwrap()
        .run()
        .await
        .unwrap();
    let second = Coordinator::new(config.clone(), true)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(first.fetches, second.fetches);
    assert_eq!(first.visited, second.visited);
}
