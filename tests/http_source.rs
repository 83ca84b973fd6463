//! HttpSource against a minimal static file server on a local port.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use eventband::cache::EventDataCache;
use eventband::catalog::EventCatalog;
use eventband::model::EventId;
use eventband::source::{DataSource, HttpSource};
use std::sync::Arc;

const INDEX: &str = r#"[{"eventid":"7","title":"Payrolls","date":"2023-02-03","tic":510},
{"eventid":"7","title":"Payrolls","date":"2023-02-03","tic":510},
{"eventid":"9","title":"GDP","date":"2023-01-26","tic":510}]"#;
const EVENT7: &str = r#"[{"PrimarySector":"Tech","state":"CA","dist":-1,"cret45_median":0.1,"cret45_perc_10":-0.2,"cret45_perc_90":0.3},
{"PrimarySector":"Energy","state":"TX","dist":2,"cret45_median":0.4,"cret45_perc_10":0.0,"cret45_perc_90":0.9}]"#;

/// Serves `/json_data/*` until the test process exits. Returns the base URL.
fn serve() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let mut stream = match stream {
                Ok(s) => s,
                Err(_) => continue,
            };
            // Drain the headers so closing the socket does not reset it.
            let mut request = String::new();
            {
                let mut reader = BufReader::new(&stream);
                if reader.read_line(&mut request).is_err() {
                    continue;
                }
                let mut header = String::new();
                loop {
                    header.clear();
                    match reader.read_line(&mut header) {
                        Ok(0) | Err(_) => break,
                        Ok(_) if header.trim().is_empty() => break,
                        Ok(_) => {}
                    }
                }
            }
            let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();

            let (status, body) = match path.as_str() {
                "/json_data/event_ids.json" => ("200 OK", INDEX),
                "/json_data/event7.json" => ("200 OK", EVENT7),
                "/json_data/event9.json" => ("200 OK", "<html>not json</html>"),
                _ => ("404 NOT FOUND", "Not Found"),
            };
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    format!("http://127.0.0.1:{}/json_data", port)
}

fn source(base: &str) -> HttpSource {
    HttpSource::new(base, Duration::from_secs(5)).expect("source")
}

#[tokio::test]
async fn loads_catalog_over_http() {
    let base = serve();
    let catalog = EventCatalog::load(&source(&base)).await.unwrap();
    assert_eq!(catalog.ids(), &[EventId::from("7"), EventId::from("9")]);
    assert_eq!(catalog.title(&EventId::from("7")), Some("Payrolls"));
}

#[tokio::test]
async fn fetches_event_rows() {
    let base = serve();
    let rows = source(&base).fetch_event(&EventId::from("7")).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].primary_sector, "Energy");
    assert_eq!(rows[1].cret45_perc_90, Some(0.9));
}

#[tokio::test]
async fn non_success_status_is_network_error() {
    let base = serve();
    let err = source(&base).fetch_event(&EventId::from("404")).await.unwrap_err();
    assert_eq!(err.kind(), "network");
    assert_eq!(err.resource(), "event404.json");
}

#[tokio::test]
async fn html_body_is_parse_error() {
    let base = serve();
    let err = source(&base).fetch_event(&EventId::from("9")).await.unwrap_err();
    assert_eq!(err.kind(), "parse");
}

#[tokio::test]
async fn cache_over_http_fetches_once() {
    let base = serve();
    let cache = EventDataCache::new(Arc::new(source(&base)));
    let id = EventId::from("7");
    let first = cache.get(&id).await.unwrap();
    let second = cache.get(&id).await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(cache.get(&EventId::from("9")).await.is_err());
    assert!(!cache.contains(&EventId::from("9")));
}
