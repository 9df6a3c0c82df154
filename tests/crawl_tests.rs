//! Integration tests for the crawler
//!
//! These tests use wiremock to serve lot and dataset documents and check
//! recursive resolution, cycle avoidance, outcome mapping and full catalog
//! runs end-to-end.

use l190_crawler::config::{Config, DedupScope, RunContext};
use l190_crawler::crawler::{run_catalog, Crawler};
use l190_crawler::output::{
    spawn_writer, CsvSink, MemorySink, OutputRow, RunStats, StatsRecorder,
};
use l190_crawler::storage::SqliteSink;
use l190_crawler::Outcome;
use indicatif::ProgressBar;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Configuration with short retry waits
fn test_config() -> Config {
    let mut config = Config::default();
    config.fetcher.retry_delay_ms = 20;
    config.fetcher.max_retry_elapsed_ms = 1_000;
    config
}

fn lot(cig: &str, participants: &[&str], awardees: &[&str]) -> String {
    let ids = |wrapper: &str, item: &str, ids: &[&str]| -> String {
        let items: String = ids
            .iter()
            .map(|id| format!("<{item}><codiceFiscale>{id}</codiceFiscale></{item}>"))
            .collect();
        format!("<{wrapper}>{items}</{wrapper}>")
    };
    format!(
        "<lotto><cig>{cig}</cig>\
         <strutturaProponente><codiceFiscaleProp>80012345678</codiceFiscaleProp>\
         <denominazione>Comune di Esempio</denominazione></strutturaProponente>\
         {}{}</lotto>",
        ids("partecipanti", "partecipante", participants),
        ids("aggiudicatari", "aggiudicatario", awardees),
    )
}

fn lot_document(lots: &[String]) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <legge190:pubblicazione xmlns:legge190=\"legge190_1_0\">\
         <metadata><titolo>Pubblicazione</titolo></metadata><data>{}</data>\
         </legge190:pubblicazione>",
        lots.concat()
    )
}

fn dataset_document(links: &[String]) -> String {
    let datasets: String = links
        .iter()
        .map(|link| format!("<dataset><linkDataset>{link}</linkDataset></dataset>"))
        .collect();
    format!("<?xml version=\"1.0\"?><indici><metadata/><indice>{datasets}</indice></indici>")
}

async fn serve(server: &MockServer, route: &str, body: String, expected_fetches: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(expected_fetches)
        .mount(server)
        .await;
}

/// Resolves one seed into a memory sink
async fn resolve(config: &Config, url: &str) -> (Outcome, Vec<OutputRow>, RunStats) {
    let sink = MemorySink::new();
    let (writer, task) = spawn_writer(Box::new(sink.clone()));
    let stats = StatsRecorder::new();

    let crawler = Crawler::new(config, writer, stats.clone()).unwrap();
    let outcome = crawler.resolve_seed(url).await;
    drop(crawler);

    let report = task.finish().await.unwrap();
    (outcome, sink.rows(), stats.snapshot(report))
}

#[tokio::test]
async fn test_lot_seed_produces_rows() {
    let mock_server = MockServer::start().await;
    serve(
        &mock_server,
        "/lots.xml",
        lot_document(&[lot("ZAA1234567", &["A", "B"], &["B"])]),
        1,
    )
    .await;

    let (outcome, rows, _) =
        resolve(&test_config(), &format!("{}/lots.xml", mock_server.uri())).await;

    assert_eq!(outcome, Outcome::Success);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].participant_id.as_deref(), Some("A"));
    assert_eq!(rows[0].is_winner, 0);
    assert_eq!(rows[1].participant_id.as_deref(), Some("B"));
    assert_eq!(rows[1].is_winner, 1);
    assert!(rows.iter().all(|r| r.entity_name == "Comune di Esempio"));
}

#[tokio::test]
async fn test_dataset_rows_aggregate_recursively() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    serve(
        &mock_server,
        "/root.xml",
        dataset_document(&[format!("{base}/nested.xml"), format!("{base}/lot-b.xml")]),
        1,
    )
    .await;
    serve(
        &mock_server,
        "/nested.xml",
        dataset_document(&[format!("{base}/lot-a.xml")]),
        1,
    )
    .await;
    serve(
        &mock_server,
        "/lot-a.xml",
        lot_document(&[lot("CA", &["A1", "A2"], &["A1"])]),
        1,
    )
    .await;
    serve(
        &mock_server,
        "/lot-b.xml",
        lot_document(&[lot("CB", &[], &["B1"])]),
        1,
    )
    .await;

    let (outcome, rows, _) = resolve(&test_config(), &format!("{base}/root.xml")).await;

    assert_eq!(outcome, Outcome::Success);
    let summary: Vec<_> = rows
        .iter()
        .map(|r| (r.award_id.as_str(), r.participant_id.as_deref(), r.is_winner))
        .collect();
    // Depth-first, document order
    assert_eq!(
        summary,
        vec![
            ("CA", Some("A1"), 1),
            ("CA", Some("A2"), 0),
            ("CB", Some("B1"), 1),
        ]
    );
}

#[tokio::test]
async fn test_back_reference_is_not_refetched_in_parent_scope() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    serve(
        &mock_server,
        "/parent.xml",
        dataset_document(&[format!("{base}/child.xml")]),
        1,
    )
    .await;
    serve(
        &mock_server,
        "/child.xml",
        dataset_document(&[format!("{base}/parent.xml"), format!("{base}/lot.xml")]),
        1,
    )
    .await;
    serve(&mock_server, "/lot.xml", lot_document(&[lot("C1", &["A"], &[])]), 1).await;

    let mut config = test_config();
    config.crawler.dedup_scope = DedupScope::Parent;

    let (outcome, rows, _) = resolve(&config, &format!("{base}/parent.xml")).await;

    assert_eq!(outcome, Outcome::Success);
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn test_longer_cycle_terminates_in_seed_scope() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    // a -> b -> c -> a, plus a self link on c
    serve(
        &mock_server,
        "/a.xml",
        dataset_document(&[format!("{base}/b.xml")]),
        1,
    )
    .await;
    serve(
        &mock_server,
        "/b.xml",
        dataset_document(&[format!("{base}/c.xml"), format!("{base}/lot.xml")]),
        1,
    )
    .await;
    serve(
        &mock_server,
        "/c.xml",
        dataset_document(&[format!("{base}/a.xml"), format!("{base}/c.xml")]),
        1,
    )
    .await;
    serve(&mock_server, "/lot.xml", lot_document(&[lot("C1", &["A"], &["A"])]), 1).await;

    let (outcome, rows, _) = resolve(&test_config(), &format!("{base}/a.xml")).await;

    assert_eq!(outcome, Outcome::Success);
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn test_shared_lot_fetched_once_per_seed() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    serve(
        &mock_server,
        "/index.xml",
        dataset_document(&[format!("{base}/lot.xml"), format!("{base}/lot.xml")]),
        1,
    )
    .await;
    serve(&mock_server, "/lot.xml", lot_document(&[lot("C1", &["A"], &[])]), 1).await;

    let (_, rows, _) = resolve(&test_config(), &format!("{base}/index.xml")).await;
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn test_unrecognized_document() {
    let mock_server = MockServer::start().await;
    serve(
        &mock_server,
        "/page.html",
        "<html><body><p>Amministrazione trasparente</p></body></html>".to_string(),
        1,
    )
    .await;

    let (outcome, rows, _) =
        resolve(&test_config(), &format!("{}/page.html", mock_server.uri())).await;

    assert_eq!(outcome, Outcome::Unrecognized);
    assert_eq!(outcome.return_code(), None);
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_malformed_document() {
    let mock_server = MockServer::start().await;
    serve(
        &mock_server,
        "/broken.xml",
        "<pubblicazione><data><lotto></data>".to_string(),
        1,
    )
    .await;

    let (outcome, rows, _) =
        resolve(&test_config(), &format!("{}/broken.xml", mock_server.uri())).await;

    assert_eq!(outcome, Outcome::ProcessingFailed);
    assert_eq!(outcome.return_code(), Some(2));
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_unreachable_seed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone.xml"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&mock_server)
        .await;

    let (outcome, _, _) =
        resolve(&test_config(), &format!("{}/gone.xml", mock_server.uri())).await;

    assert_eq!(outcome, Outcome::FetchFailed);
    assert_eq!(outcome.return_code(), Some(1));
}

#[tokio::test]
async fn test_nested_failures_do_not_fail_the_seed() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    serve(
        &mock_server,
        "/index.xml",
        dataset_document(&[
            format!("{base}/gone.xml"),
            format!("{base}/broken.xml"),
            format!("{base}/lot.xml"),
        ]),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/gone.xml"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    serve(&mock_server, "/broken.xml", "<lotto>".to_string(), 1).await;
    serve(&mock_server, "/lot.xml", lot_document(&[lot("C1", &["A"], &[])]), 1).await;

    let (outcome, rows, stats) = resolve(&test_config(), &format!("{base}/index.xml")).await;

    assert_eq!(outcome, Outcome::Success);
    assert_eq!(rows.len(), 1);
    assert_eq!(stats.links_failed, 2);
}

#[tokio::test]
async fn test_lot_missing_field_skips_only_that_lot() {
    let mock_server = MockServer::start().await;
    let incomplete = "<lotto><cig>C0</cig><partecipanti><partecipante>\
                      <codiceFiscale>X</codiceFiscale></partecipante></partecipanti></lotto>"
        .to_string();
    serve(
        &mock_server,
        "/lots.xml",
        lot_document(&[incomplete, lot("C1", &["A"], &["A"])]),
        1,
    )
    .await;

    let (outcome, rows, stats) =
        resolve(&test_config(), &format!("{}/lots.xml", mock_server.uri())).await;

    assert_eq!(outcome, Outcome::Success);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].award_id, "C1");
    assert_eq!(stats.lots_skipped, 1);
}

#[tokio::test]
async fn test_document_without_valid_lots_fails_processing() {
    let mock_server = MockServer::start().await;
    serve(
        &mock_server,
        "/broken.xml",
        lot_document(&[
            "<lotto><cig>C0</cig></lotto>".to_string(),
            "<lotto><cig>C1</cig></lotto>".to_string(),
        ]),
        1,
    )
    .await;

    let (outcome, rows, stats) =
        resolve(&test_config(), &format!("{}/broken.xml", mock_server.uri())).await;

    assert_eq!(outcome, Outcome::ProcessingFailed);
    assert_eq!(outcome.return_code(), Some(2));
    assert!(rows.is_empty());
    assert_eq!(stats.lots_skipped, 2);
}

#[tokio::test]
async fn test_foreign_identifier_resolved_through_vocabulary() {
    let mock_server = MockServer::start().await;
    let foreign = "<lotto><cig>C1</cig>\
        <strutturaProponente><codiceFiscaleProp>1</codiceFiscaleProp>\
        <denominazione>Ente</denominazione></strutturaProponente>\
        <partecipanti><partecipante><identificativoFiscaleEstero>DE123</identificativoFiscaleEstero>\
        </partecipante></partecipanti>\
        <aggiudicatari><aggiudicatario><identificativoFiscaleEstero>DE123</identificativoFiscaleEstero>\
        </aggiudicatario></aggiudicatari></lotto>"
        .to_string();
    serve(&mock_server, "/lots.xml", lot_document(&[foreign]), 1).await;

    let (_, rows, _) = resolve(&test_config(), &format!("{}/lots.xml", mock_server.uri())).await;

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].participant_id.as_deref(), Some("DE123"));
    assert_eq!(rows[0].is_winner, 1);
}

#[tokio::test]
async fn test_concurrent_expansion_matches_sequential() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    let links: Vec<String> = (0..5).map(|i| format!("{base}/lot-{i}.xml")).collect();
    serve(&mock_server, "/index.xml", dataset_document(&links), 1).await;
    for i in 0..5 {
        serve(
            &mock_server,
            &format!("/lot-{i}.xml"),
            lot_document(&[lot(&format!("C{i}"), &["A", "B"], &["A"])]),
            1,
        )
        .await;
    }

    let mut config = test_config();
    config.crawler.max_concurrent_fetches = 4;

    let (outcome, rows, _) = resolve(&config, &format!("{base}/index.xml")).await;

    assert_eq!(outcome, Outcome::Success);
    assert_eq!(rows.len(), 10);
    // Rows of one lot stay contiguous
    for pair in rows.chunks(2) {
        assert_eq!(pair[0].award_id, pair[1].award_id);
    }
}

/// Writes a catalog named like a real one inside `dir`
fn write_catalog(dir: &TempDir, entries: &str) -> RunContext {
    let catalog_path = dir.path().join("l190-2023.xml");
    std::fs::write(
        &catalog_path,
        format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?><catalogo>{entries}</catalogo>"),
    )
    .unwrap();
    RunContext::new(catalog_path).unwrap()
}

fn entry(tax_id: &str, name: &str, url: &str) -> String {
    format!(
        "<comunicazione><codiceFiscale> {tax_id} </codiceFiscale>\
         <ragioneSociale> {name} </ragioneSociale><url> {url} </url></comunicazione>"
    )
}

fn read_csv(path: &std::path::Path) -> Vec<Vec<String>> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap()
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

#[tokio::test]
async fn test_catalog_run_writes_csv_tables() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    let without_scheme = base.trim_start_matches("http://").to_string();

    serve(
        &mock_server,
        "/ente1.xml",
        dataset_document(&[format!("{base}/lot.xml")]),
        1,
    )
    .await;
    serve(
        &mock_server,
        "/lot.xml",
        lot_document(&[lot("ZAA1234567", &["A", "B"], &["B"])]),
        1,
    )
    .await;
    serve(
        &mock_server,
        "/ente2.html",
        "<html><body/></html>".to_string(),
        1,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let entries = [
        entry("80012345678", "Comune di Esempio", &format!("{base}/ente1.xml")),
        "<comunicazione><codiceFiscale>999</codiceFiscale></comunicazione>".to_string(),
        entry("80087654321", "Comune Vicino", &format!("{without_scheme}/ente2.html")),
    ]
    .concat();
    let context = write_catalog(&dir, &entries);

    let output_path = dir.path().join("out.csv");
    let status_path = dir.path().join("status.csv");
    let sink = CsvSink::open(&output_path, &status_path).unwrap();

    let stats = run_catalog(
        &context,
        &test_config(),
        Box::new(sink),
        &ProgressBar::hidden(),
    )
    .await
    .unwrap();

    assert_eq!(stats.seeds_total(), 2);
    assert_eq!(stats.count(Outcome::Success), 1);
    assert_eq!(stats.count(Outcome::Unrecognized), 1);
    assert_eq!(stats.entries_skipped, 1);
    assert_eq!(stats.rows_written, 2);
    assert_eq!(stats.statuses_written, 2);

    let rows = read_csv(&output_path);
    assert_eq!(
        rows,
        vec![
            vec!["Comune di Esempio", "80012345678", "ZAA1234567", "A", "0"],
            vec!["Comune di Esempio", "80012345678", "ZAA1234567", "B", "1"],
        ]
    );

    let statuses = read_csv(&status_path);
    assert_eq!(
        statuses,
        vec![
            vec![
                "2023".to_string(),
                "80012345678".to_string(),
                "Comune di Esempio".to_string(),
                format!("{base}/ente1.xml"),
                "0".to_string(),
            ],
            vec![
                "2023".to_string(),
                "80087654321".to_string(),
                "Comune Vicino".to_string(),
                format!("http://{without_scheme}/ente2.html"),
                String::new(),
            ],
        ]
    );
}

#[tokio::test]
async fn test_same_url_in_two_entries_is_resolved_for_each() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    serve(
        &mock_server,
        "/shared.xml",
        lot_document(&[lot("C1", &["A"], &["A"])]),
        2,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let url = format!("{base}/shared.xml");
    let context = write_catalog(
        &dir,
        &[entry("1", "Ente Uno", &url), entry("2", "Ente Due", &url)].concat(),
    );

    let sink = MemorySink::new();
    let mut config = test_config();
    config.crawler.max_concurrent_seeds = 2;

    let stats = run_catalog(
        &context,
        &config,
        Box::new(sink.clone()),
        &ProgressBar::hidden(),
    )
    .await
    .unwrap();

    assert_eq!(stats.count(Outcome::Success), 2);
    assert_eq!(sink.rows().len(), 2);
    assert_eq!(sink.statuses().len(), 2);
    assert!(sink.is_finished());
}

#[tokio::test]
async fn test_catalog_run_into_sqlite() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    serve(
        &mock_server,
        "/lot.xml",
        lot_document(&[lot("C1", &["A", "B", "C"], &["C"])]),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/down.xml"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let context = write_catalog(
        &dir,
        &[
            entry("1", "Ente Uno", &format!("{base}/lot.xml")),
            entry("2", "Ente Due", &format!("{base}/down.xml")),
        ]
        .concat(),
    )
    .with_config_hash("0123abcd");

    let rows_db = dir.path().join("rows.db");
    let status_db = dir.path().join("status.db");
    let sink = SqliteSink::open(&rows_db, &status_db, &context).unwrap();

    let stats = run_catalog(&context, &test_config(), Box::new(sink), &ProgressBar::hidden())
        .await
        .unwrap();
    assert_eq!(stats.rows_written, 3);

    let conn = rusqlite::Connection::open(&status_db).unwrap();
    let codes: Vec<(String, Option<u8>)> = conn
        .prepare("SELECT entity_tax_id, return_code FROM link_status ORDER BY id")
        .unwrap()
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        codes,
        vec![("1".to_string(), Some(0)), ("2".to_string(), Some(1))]
    );

    let (status, hash, year): (String, String, String) = conn
        .query_row("SELECT status, config_hash, year FROM runs", [], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })
        .unwrap();
    assert_eq!(status, "completed");
    assert_eq!(hash, "0123abcd");
    assert_eq!(year, "2023");

    let conn = rusqlite::Connection::open(&rows_db).unwrap();
    let winners: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM lot_participants WHERE is_winner = 1",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(winners, 1);
}

#[test]
fn test_catalog_without_year_fails_fast() {
    let dir = TempDir::new().unwrap();
    let catalog_path = dir.path().join("catalogo.xml");
    std::fs::write(&catalog_path, "<catalogo/>").unwrap();

    assert!(RunContext::new(catalog_path).is_err());
}
