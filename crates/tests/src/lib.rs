//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置到投递的跨 crate 契约
//! - 基于 mock HTTP 服务器的 e2e 测试（CSV -> 转换 -> 分批 -> 投递 -> 报告）

#[cfg(test)]
mod contract_tests {
    use contracts::{Batch, BatchPayload, LoaderConfig};
    use dispatcher::{DispatcherConfig, RetryPolicy};

    #[test]
    fn test_config_flows_into_dispatcher() {
        let toml = r#"
            [endpoint]
            url = "https://ingest.example.com/v1"
            auth_token = "abc"
            auth_scheme = "Bearer"

            [delivery]
            batch_size = 25
            concurrency = 3

            [retry]
            max_retries = 2
            base_delay_ms = 100
            max_delay_ms = 1000
            jitter_ms = 0
        "#;
        let config =
            config_loader::ConfigLoader::load_from_str(toml, config_loader::ConfigFormat::Toml)
                .unwrap();

        let dispatch = DispatcherConfig::from_loader_config(&config);
        assert_eq!(dispatch.concurrency, 3);
        assert_eq!(dispatch.retry, RetryPolicy::from_config(&config.retry));
        assert_eq!(dispatch.retry.max_attempts(), 3);
        assert_eq!(config.endpoint.authorization(), "Bearer abc");
    }

    #[test]
    fn test_empty_batch_payload() {
        let field = LoaderConfig::default().endpoint.payload_field;
        let payload = BatchPayload::encode(&field, &Batch::new(0, 0, vec![])).unwrap();
        assert_eq!(&payload.body()[..], br#"{"activityRecordList":[]}"#);
    }

    #[test]
    fn test_demo_files_load() {
        let demos = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos");
        let config =
            config_loader::ConfigLoader::load_from_path(&demos.join("activity-loader.toml"))
                .unwrap();
        config_loader::ConfigLoader::validate(&config).unwrap();
        assert_eq!(config.delivery.batch_size, 200);
        assert_eq!(config.retry.max_retries, 7);
        assert_eq!(config.input.delimiter, ';');

        let output = ingestion::CsvRecordSource::from_config(
            demos.join("activities.csv"),
            &config.input,
        )
        .produce_with_stats()
        .unwrap();
        assert_eq!(output.stats.rows_read, 6);
        assert_eq!(output.stats.emitted, 4);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::Write;
    use std::time::Duration;

    use contracts::{FailureClass, LoaderConfig, RecordSource};
    use dispatcher::{create_dispatcher, Batcher, RunReport};
    use ingestion::CsvRecordSource;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const INGEST_PATH: &str = "/private/v1/ingest";

    const SAMPLE: &str = "\
id;asset_name;ip;category;created_utc;source
1;web-01;10.0.0.1;Phishing;2024-01-01;siem
2;web-02;not-an-ip;phishing;2024-01-01;siem
3;db-01;::1;Valid Acounts;2024-01-02;edr
4;;10.0.0.4;Hardware Additions;2024-01-02;edr
5;app-01;192.168.1.5;compromise (drive-by);2024-01-03;siem
";

    fn csv_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    /// `n` valid rows with ids `1000..1000 + n`
    fn generated_csv(n: usize) -> String {
        let mut csv = String::from("id;asset;ip;category\n");
        for i in 0..n {
            csv.push_str(&format!(
                "{};host-{};10.0.{}.{};phishing\n",
                1000 + i,
                i,
                i / 250,
                i % 250
            ));
        }
        csv
    }

    fn config(
        server: &MockServer,
        batch_size: usize,
        concurrency: usize,
        max_retries: u32,
    ) -> LoaderConfig {
        let mut config = LoaderConfig::default();
        config.endpoint.url = format!("{}{}", server.uri(), INGEST_PATH);
        config.endpoint.auth_token = "eye-am-hiring".into();
        config.delivery.batch_size = batch_size;
        config.delivery.concurrency = concurrency;
        config.retry.max_retries = max_retries;
        config.retry.base_delay_ms = 5;
        config.retry.max_delay_ms = 20;
        config.retry.jitter_ms = 0;
        config
    }

    async fn send_file(config: &LoaderConfig, file: &tempfile::NamedTempFile) -> RunReport {
        let records = CsvRecordSource::from_config(file.path(), &config.input)
            .produce()
            .unwrap();
        let batches = Batcher::new(config.delivery.batch_size)
            .unwrap()
            .split(records);
        create_dispatcher(config).unwrap().run(batches).await
    }

    /// CSV -> transform -> batch -> HTTP, verifying the wire format
    #[tokio::test]
    async fn test_e2e_csv_to_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(INGEST_PATH))
            .and(header("authorization", "eye-am-hiring"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&server)
            .await;

        let file = csv_file(SAMPLE);
        let report = send_file(&config(&server, 2, 2, 3), &file).await;

        assert!(report.is_success());
        assert_eq!(report.total_records, 3);
        assert_eq!(report.total_batches, 2);

        let mut bodies: Vec<serde_json::Value> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect();
        bodies.sort_by_key(|b| b["activityRecordList"][0]["id"].as_i64());

        let first = bodies[0]["activityRecordList"].as_array().unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(
            first[0],
            serde_json::json!({"id": 1, "asset": "web-01", "ip": "10.0.0.1", "category": "phishing"})
        );
        assert_eq!(first[1]["category"], "validaccounts");

        let second = bodies[1]["activityRecordList"].as_array().unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0]["category"], "drivebycompromise");
        assert!(second[0].get("created_utc").is_none());
    }

    #[tokio::test]
    async fn test_e2e_filter_applied() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = config(&server, 200, 2, 3);
        config.input.filter = Some("category=phishing".into());

        let report = send_file(&config, &csv_file(SAMPLE)).await;
        assert!(report.is_success());
        assert_eq!(report.total_records, 1);
    }

    #[tokio::test]
    async fn test_e2e_client_error_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("schema mismatch"))
            .expect(1)
            .mount(&server)
            .await;

        let report = send_file(&config(&server, 200, 2, 7), &csv_file(SAMPLE)).await;

        assert!(!report.is_success());
        let failure = &report.failed_batches[0];
        assert_eq!(failure.class, FailureClass::Rejected);
        assert_eq!(failure.attempts, 1);
        assert_eq!(failure.status, Some(400));
        assert!(failure.error.contains("schema mismatch"));
    }

    #[tokio::test]
    async fn test_e2e_server_error_exhausts_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let report = send_file(&config(&server, 200, 1, 2), &csv_file(SAMPLE)).await;

        let failure = &report.failed_batches[0];
        assert_eq!(failure.class, FailureClass::Exhausted);
        assert_eq!(failure.attempts, 3);
        assert_eq!(failure.status, Some(503));
    }

    #[tokio::test]
    async fn test_e2e_transient_failures_recover() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(2)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let report = send_file(&config(&server, 200, 1, 7), &csv_file(SAMPLE)).await;

        assert!(report.is_success());
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    /// Mixed outcomes: the report lists exactly the failed batches, in order
    #[tokio::test]
    async fn test_e2e_report_lists_failed_batches_in_order() {
        let server = MockServer::start().await;
        // batch 3 (ids 1030..1039) is rejected, batch 1 (ids 1010..1019) always 500
        Mock::given(method("POST"))
            .and(body_string_contains("\"id\":1030"))
            .respond_with(ResponseTemplate::new(422))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("\"id\":1010"))
            .respond_with(ResponseTemplate::new(500))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let file = csv_file(&generated_csv(50));
        let report = send_file(&config(&server, 10, 4, 2), &file).await;

        assert_eq!(report.total_batches, 5);
        assert_eq!(report.succeeded_batches, 3);
        let failed: Vec<_> = report
            .failed_batches
            .iter()
            .map(|f| (f.batch_index, f.class, f.attempts))
            .collect();
        assert_eq!(
            failed,
            vec![(1, FailureClass::Exhausted, 3), (3, FailureClass::Rejected, 1)]
        );
        assert_eq!(report.failed_batches[0].record_start, 10);
        assert_eq!(report.failed_batches[0].record_end, 20);
        assert_eq!(report.failed_records(), 20);
    }

    #[tokio::test]
    async fn test_e2e_concurrency_bounded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(30)))
            .mount(&server)
            .await;

        let config = config(&server, 5, 3, 0);
        let file = csv_file(&generated_csv(60));
        let records = CsvRecordSource::from_config(file.path(), &config.input)
            .produce()
            .unwrap();
        let batches = Batcher::new(5).unwrap().split(records);
        let dispatcher = create_dispatcher(&config).unwrap();

        let report = dispatcher.run(batches).await;

        assert!(report.is_success());
        assert_eq!(report.total_batches, 12);
        let metrics = dispatcher.metrics();
        assert!(metrics.peak_in_flight <= 3);
        assert_eq!(metrics.in_flight, 0);
        assert_eq!(metrics.attempts, 12);
    }

    #[tokio::test]
    async fn test_e2e_unreachable_endpoint_exhausts() {
        let mut config = LoaderConfig::default();
        config.endpoint.url = "http://127.0.0.1:1/ingest".into();
        config.retry.max_retries = 1;
        config.retry.base_delay_ms = 1;
        config.retry.max_delay_ms = 5;
        config.retry.jitter_ms = 0;

        let report = send_file(&config, &csv_file(SAMPLE)).await;

        let failure = &report.failed_batches[0];
        assert_eq!(failure.class, FailureClass::Exhausted);
        assert_eq!(failure.attempts, 2);
        assert_eq!(failure.status, None);
    }
}
