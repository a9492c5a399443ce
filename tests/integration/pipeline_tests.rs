//! Integration tests for the scraping pipeline
//!
//! These tests use wiremock to serve listing and detail pages and run
//! whole sources end-to-end against tables in temporary directories.

use auto_harvest::config::{Config, FetcherConfig, OutputConfig, ScraperConfig, SourceConfig};
use auto_harvest::crawler::{discover_page, run_source};
use auto_harvest::extract::extract;
use auto_harvest::output::{SilentObserver, StopReason};
use auto_harvest::sites::{adapter_for, Pagination, SiteKind};
use auto_harvest::store::{
    CsvTableStore, IdentityStrategy, KnownKeySet, PersistedTable, StoreError, StoreResult,
    TableStore,
};
use auto_harvest::{Field, HarvestError, RunContext};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with one source
fn create_test_config(site: SiteKind, base_url: String, output_path: String) -> Config {
    Config {
        scraper: ScraperConfig {
            max_pages: 5,
            target_records: 100,
            max_batch_size: 50,
            workers: 2,
            page_delay_ms: 10, // Very short for testing
        },
        fetcher: FetcherConfig {
            max_retries: 1,
            retry_delay_ms: 5,
            ..FetcherConfig::default()
        },
        output: OutputConfig::default(),
        sources: vec![SourceConfig {
            site,
            base_url,
            output_path,
            pagination: Some(Pagination::Query),
        }],
    }
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body)
}

async fn mount_listing(server: &MockServer, listing_path: &str, page: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(listing_path))
        .and(query_param("page", page))
        .respond_with(html(body))
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, detail_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(detail_path))
        .respond_with(html(body))
        .mount(server)
        .await;
}

fn sauto_detail(title: &str, power: Option<&str>) -> String {
    let power_tile = power
        .map(|p| {
            format!(
                r#"<li class="c-car-properties__tile">
                    <div class="c-car-properties__tile-label">Výkon</div>
                    <div class="c-car-properties__tile-value">{}</div>
                </li>"#,
                p
            )
        })
        .unwrap_or_default();

    format!(
        r#"<html><body>
        <h1 class="c-item-title">{}</h1>
        <span class="c-a-basic-info__subtitle-info">Ojeté, 3/2017, 98 000 km</span>
        <div class="c-a-basic-info__price">319 000 Kč</div>
        <ul>
            <li class="c-car-properties__tile">
                <div class="c-car-properties__tile-label">Palivo</div>
                <div class="c-car-properties__tile-value">Benzín</div>
            </li>
            <li class="c-car-properties__tile">
                <div class="c-car-properties__tile-label">Převodovka</div>
                <div class="c-car-properties__tile-value">Manuální (6 stupňů)</div>
            </li>
            {}
        </ul>
        </body></html>"#,
        title, power_tile
    )
}

fn aaaauto_detail() -> String {
    r#"<html><body>
        <h1 class="h2 mb5 notranslate">Kia <span class="regular">Ceed, 2020</span></h1>
        <strong class="carCard__price-value carCard__price-value--big">349 900 Kč</strong>
        <ul>
            <li>Tachometr <strong>45 000 km</strong></li>
            <li>Palivo <strong>Benzín</strong></li>
            <li>Převodovka <strong>Automatická</strong></li>
            <li>Výkon <strong>103 kW</strong></li>
        </ul>
    </body></html>"#
        .to_string()
}

#[tokio::test]
async fn test_sauto_run_is_idempotent() {
    let server = MockServer::start().await;
    let base_url = format!("{}/inzerce/osobni", server.uri());

    mount_listing(
        &server,
        "/inzerce/osobni",
        "1",
        r#"<html><body>
            <a class="c-item__link" href="/osobni/detail/skoda/octavia/1">Octavia</a>
            <a class="c-item__link" href="/osobni/detail/kia/ceed/2">Ceed</a>
            <a class="c-paging__btn" href="/inzerce/osobni?page=2">Další</a>
        </body></html>"#
            .to_string(),
    )
    .await;
    mount_listing(&server, "/inzerce/osobni", "2", "<html><body></body></html>".to_string()).await;
    mount_detail(
        &server,
        "/osobni/detail/skoda/octavia/1",
        sauto_detail("Škoda Octavia, 2017", Some("110 kW")),
    )
    .await;
    // No power tile, so this record is never complete
    mount_detail(
        &server,
        "/osobni/detail/kia/ceed/2",
        sauto_detail("Kia Ceed", None),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let table_path = dir.path().join("auta_sauto.csv");
    let config = create_test_config(
        SiteKind::Sauto,
        base_url,
        table_path.to_string_lossy().to_string(),
    );
    let source = &config.sources[0];
    let store = CsvTableStore::new(&table_path, IdentityStrategy::Url);

    let first = run_source(&config, source, &store, &SilentObserver)
        .await
        .unwrap();

    assert_eq!(first.stop_reason, Some(StopReason::Exhausted));
    assert_eq!(first.pages_visited, 2);
    assert_eq!(first.accepted, 1);
    assert_eq!(first.rejected, 1);
    assert_eq!(first.table_rows, 1);

    let table = store.load().unwrap();
    assert_eq!(table.len(), 1);
    let row = &table.rows()[0];
    assert_eq!(
        row.url.as_deref(),
        Some(format!("{}/osobni/detail/skoda/octavia/1", server.uri()).as_str())
    );
    assert_eq!(row.record.get(Field::Brand), "Skoda");
    assert_eq!(row.record.get(Field::Model), "Octavia");
    assert_eq!(row.record.get(Field::Year), "2017");
    assert_eq!(row.record.get(Field::Price), "319000");
    assert_eq!(row.record.get(Field::Transmission), "Manual");

    let second = run_source(&config, source, &store, &SilentObserver)
        .await
        .unwrap();

    assert_eq!(second.skipped_known, 1);
    assert_eq!(second.dispatched, 1);
    assert_eq!(second.accepted, 0);
    assert_eq!(second.table_rows, 1);
    assert_eq!(store.load().unwrap().len(), 1);
}

#[tokio::test]
async fn test_aaaauto_fingerprint_run() {
    let server = MockServer::start().await;
    let base_url = format!("{}/ojete-vozy/", server.uri());

    mount_listing(
        &server,
        "/ojete-vozy/",
        "1",
        r#"<html><body>
            <a href="/kia-ceed/car.html?id=1">Ceed</a>
            <a href="/kia-ceed/car.html?id=2">Ceed again</a>
            <a href="/kontakt">Kontakt</a>
        </body></html>"#
            .to_string(),
    )
    .await;
    mount_detail(&server, "/kia-ceed/car.html", aaaauto_detail()).await;

    let dir = TempDir::new().unwrap();
    let table_path = dir.path().join("auta_aaaauto.csv");
    let mut config = create_test_config(
        SiteKind::Aaaauto,
        base_url,
        table_path.to_string_lossy().to_string(),
    );
    config.scraper.max_pages = 1;
    let source = &config.sources[0];
    let store = CsvTableStore::new(&table_path, IdentityStrategy::Fingerprint);

    let first = run_source(&config, source, &store, &SilentObserver)
        .await
        .unwrap();

    assert_eq!(first.stop_reason, Some(StopReason::BudgetExhausted));
    assert_eq!(first.accepted, 2);

    // Both listings carry identical values and both are kept
    let mut table = store.load().unwrap();
    assert_eq!(table.len(), 2);
    assert!(table.rows().iter().all(|r| r.url.is_none()));
    let record = &table.rows()[0].record;
    assert_eq!(record.get(Field::Brand), "Kia");
    assert_eq!(record.get(Field::Model), "Ceed");
    assert_eq!(record.get(Field::Year), "2020");
    assert_eq!(record.get(Field::Transmission), "Automat");

    let header = std::fs::read_to_string(&table_path).unwrap();
    assert!(header.starts_with("\u{feff}Brand,Model,Year,Mileage,Price,Fuel,Transmission,Power"));

    // Known fingerprints are dropped after extraction
    let second = run_source(&config, source, &store, &SilentObserver)
        .await
        .unwrap();
    assert_eq!(second.dispatched, 2);
    assert_eq!(second.skipped_known, 2);
    assert_eq!(second.table_rows, 2);

    assert_eq!(table.dedup(), 1);
    store.save(&table).unwrap();
    assert_eq!(store.load().unwrap().len(), 1);
}

#[tokio::test]
async fn test_target_stops_before_budget() {
    let server = MockServer::start().await;
    let base_url = format!("{}/ojete-vozy/", server.uri());

    for page in ["1", "2", "3"] {
        mount_listing(
            &server,
            "/ojete-vozy/",
            page,
            format!(r#"<a href="/kia-ceed/car.html?id={}">Ceed</a>"#, page),
        )
        .await;
    }
    mount_detail(&server, "/kia-ceed/car.html", aaaauto_detail()).await;

    let dir = TempDir::new().unwrap();
    let table_path = dir.path().join("auta_aaaauto.csv");
    let mut config = create_test_config(
        SiteKind::Aaaauto,
        base_url,
        table_path.to_string_lossy().to_string(),
    );
    config.scraper.target_records = 2;
    let source = &config.sources[0];
    let store = CsvTableStore::new(&table_path, IdentityStrategy::Fingerprint);

    let report = run_source(&config, source, &store, &SilentObserver)
        .await
        .unwrap();

    assert_eq!(report.stop_reason, Some(StopReason::TargetMet));
    assert_eq!(report.pages_visited, 2);
    assert_eq!(report.accepted, 2);
}

#[tokio::test]
async fn test_discover_page_resolves_matching_anchors() {
    let server = MockServer::start().await;

    mount_listing(
        &server,
        "/ojete-vozy/",
        "1",
        r#"<html><body>
            <a href="/skoda-octavia/car.html?id=7">Octavia</a>
            <a href="/skoda-octavia/car.html?id=7#photos">Octavia photos</a>
            <a href="/skoda-fabia/car.html?id=8">Fabia</a>
            <a href="/financovani">Financování</a>
        </body></html>"#
            .to_string(),
    )
    .await;

    let config = create_test_config(
        SiteKind::Aaaauto,
        format!("{}/ojete-vozy/", server.uri()),
        "unused.csv".to_string(),
    );
    let adapter = adapter_for(&config.sources[0]).unwrap();
    let ctx = RunContext::from_config(&config, KnownKeySet::empty(adapter.identity())).unwrap();
    let base = Url::parse(&config.sources[0].base_url).unwrap();

    let links = discover_page(&ctx, adapter.as_ref(), &base, 1).await;

    assert_eq!(
        links.into_iter().collect::<Vec<_>>(),
        vec![
            format!("{}/skoda-fabia/car.html?id=8", server.uri()),
            format!("{}/skoda-octavia/car.html?id=7", server.uri()),
        ]
    );
}

#[tokio::test]
async fn test_failed_detail_fetch_yields_unknown_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/osobni/detail/skoda/fabia/9"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = create_test_config(
        SiteKind::Sauto,
        format!("{}/inzerce/osobni", server.uri()),
        "unused.csv".to_string(),
    );
    config.fetcher.max_retries = 2;
    let adapter = adapter_for(&config.sources[0]).unwrap();
    let ctx = RunContext::from_config(&config, KnownKeySet::empty(adapter.identity())).unwrap();
    assert_eq!(ctx.retry.max_attempts, 2);

    let url = Url::parse(&format!("{}/osobni/detail/skoda/fabia/9", server.uri())).unwrap();
    let record = extract(&ctx, adapter.as_ref(), &url).await;

    assert_eq!(record.missing_fields(), Field::ALL.to_vec());
}

#[tokio::test]
async fn test_ignored_fragment_pagination_stops_as_exhausted() {
    let server = MockServer::start().await;
    let base_url = format!("{}/ojete-vozy/", server.uri());

    // The fragment never reaches the server, so every page is page 1
    Mock::given(method("GET"))
        .and(path("/ojete-vozy/"))
        .respond_with(html(
            r#"<a href="/kia-ceed/car.html?id=1">Ceed</a>"#.to_string(),
        ))
        .expect(2)
        .mount(&server)
        .await;
    mount_detail(&server, "/kia-ceed/car.html", aaaauto_detail()).await;

    let dir = TempDir::new().unwrap();
    let table_path = dir.path().join("auta_aaaauto.csv");
    let mut config = create_test_config(
        SiteKind::Aaaauto,
        base_url,
        table_path.to_string_lossy().to_string(),
    );
    config.sources[0].pagination = Some(Pagination::Fragment);
    let source = &config.sources[0];
    let store = CsvTableStore::new(&table_path, IdentityStrategy::Fingerprint);

    let report = run_source(&config, source, &store, &SilentObserver)
        .await
        .unwrap();

    assert_eq!(report.stop_reason, Some(StopReason::Exhausted));
    assert_eq!(report.pages_visited, 2);
    assert_eq!(report.dispatched, 1);
    assert_eq!(report.accepted, 1);
    assert_eq!(store.load().unwrap().len(), 1);
}

#[tokio::test]
async fn test_table_missing_column_fails_run_untouched() {
    let server = MockServer::start().await;

    let dir = TempDir::new().unwrap();
    let table_path = dir.path().join("auta_sauto.csv");
    // A URL-identity table written without its URL column
    let original = "Brand,Model,Year,Mileage,Price,Fuel,Transmission,Power\n\
                    Kia,Ceed,2020,45000,349900,Benzín,Manual,103\n";
    std::fs::write(&table_path, original).unwrap();

    let config = create_test_config(
        SiteKind::Sauto,
        format!("{}/inzerce/osobni", server.uri()),
        table_path.to_string_lossy().to_string(),
    );
    let store = CsvTableStore::new(&table_path, IdentityStrategy::Url);

    let result = run_source(&config, &config.sources[0], &store, &SilentObserver).await;

    assert!(matches!(
        result,
        Err(HarvestError::Store(StoreError::MissingColumn { .. }))
    ));
    assert_eq!(std::fs::read_to_string(&table_path).unwrap(), original);
    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty());
}

/// Reads through a CSV table but refuses every write
struct ReadOnlyStore {
    inner: CsvTableStore,
}

impl TableStore for ReadOnlyStore {
    fn identity(&self) -> IdentityStrategy {
        self.inner.identity()
    }

    fn load(&self) -> StoreResult<PersistedTable> {
        self.inner.load()
    }

    fn save(&self, _table: &PersistedTable) -> StoreResult<()> {
        Err(StoreError::Io {
            path: self.inner.path().to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }
}

#[tokio::test]
async fn test_failed_save_keeps_previous_table() {
    let server = MockServer::start().await;
    let base_url = format!("{}/inzerce/osobni", server.uri());

    mount_listing(
        &server,
        "/inzerce/osobni",
        "1",
        r#"<a class="c-item__link" href="/osobni/detail/skoda/octavia/1">Octavia</a>"#
            .to_string(),
    )
    .await;
    mount_listing(&server, "/inzerce/osobni", "2", "<html><body></body></html>".to_string()).await;
    mount_detail(
        &server,
        "/osobni/detail/skoda/octavia/1",
        sauto_detail("Škoda Octavia, 2017", Some("110 kW")),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let table_path = dir.path().join("auta_sauto.csv");
    let original = "URL,Brand,Model,Year,Mileage,Price,Fuel,Transmission,Power\n\
                    https://example.com/osobni/detail/kia/ceed/2,Kia,Ceed,2020,45000,349900,Benzín,Manual,103\n";
    std::fs::write(&table_path, original).unwrap();

    let config = create_test_config(
        SiteKind::Sauto,
        base_url,
        table_path.to_string_lossy().to_string(),
    );
    let store = ReadOnlyStore {
        inner: CsvTableStore::new(&table_path, IdentityStrategy::Url),
    };

    let result = run_source(&config, &config.sources[0], &store, &SilentObserver).await;

    assert!(matches!(
        result,
        Err(HarvestError::Store(StoreError::Io { .. }))
    ));
    assert_eq!(std::fs::read_to_string(&table_path).unwrap(), original);
}
