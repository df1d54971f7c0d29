use crate::*;
use async_trait::async_trait;
use market_clients::PolygonQuoteProvider;
use market_core::{Candle, ChartEnvelope, MarketError, MarketResult, Quote, QuoteProvider, TextFetcher, EQUITY};
use news_feeds::NewsQuery;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ----- Fakes -----

struct FakeProvider {
    name: &'static str,
    configured: bool,
    outcome: MarketResult<Vec<Quote>>,
    calls: AtomicUsize,
    requested: Mutex<Vec<Vec<String>>>,
}

impl FakeProvider {
    fn ok(name: &'static str, quotes: Vec<Quote>) -> Arc<Self> {
        Arc::new(Self {
            name,
            configured: true,
            outcome: Ok(quotes),
            calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        })
    }

    fn err(name: &'static str, err: MarketError) -> Arc<Self> {
        Arc::new(Self {
            name,
            configured: true,
            outcome: Err(err),
            calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        })
    }

    fn unconfigured(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            configured: false,
            outcome: Ok(Vec::new()),
            calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteProvider for FakeProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn fetch_quotes(&self, symbols: &[String]) -> MarketResult<Vec<Quote>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(symbols.to_vec());
        self.outcome
            .clone()
            .map(|quotes| quotes.into_iter().filter(|q| symbols.contains(&q.symbol)).collect())
    }
}

#[derive(Default)]
struct FakeFetcher {
    routes: Vec<(String, MarketResult<String>)>,
    calls: AtomicUsize,
    urls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    fn new() -> Self {
        Self::default()
    }

    fn ok(mut self, needle: &str, body: impl Into<String>) -> Self {
        self.routes.push((needle.to_string(), Ok(body.into())));
        self
    }

    fn err(mut self, needle: &str, err: MarketError) -> Self {
        self.routes.push((needle.to_string(), Err(err)));
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn requested(&self, needle: &str) -> usize {
        self.urls.lock().unwrap().iter().filter(|u| u.contains(needle)).count()
    }
}

#[async_trait]
impl TextFetcher for FakeFetcher {
    async fn get_text(&self, url: &str, _timeout: Duration) -> MarketResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());
        self.routes
            .iter()
            .find(|(needle, _)| url.contains(needle.as_str()))
            .map(|(_, outcome)| outcome.clone())
            .unwrap_or_else(|| {
                Err(MarketError::Http {
                    status: 404,
                    url: url.to_string(),
                })
            })
    }
}

fn quote(symbol: &str, source: &str, price: f64) -> Quote {
    let mut q = Quote::new(symbol, source);
    q.price = price;
    q.change = 1.0;
    q.change_percent = 0.5;
    q.volume = 1_000;
    q
}

fn equity(symbol: &str, source: &str, price: f64) -> Quote {
    let mut q = quote(symbol, source, price);
    q.quote_type = Some(EQUITY.to_string());
    q
}

fn chain(providers: &[&Arc<FakeProvider>]) -> Vec<Arc<dyn QuoteProvider>> {
    providers.iter().map(|p| Arc::clone(p) as Arc<dyn QuoteProvider>).collect()
}

fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn rss(items: &[(&str, &str, &str)]) -> String {
    let body: String = items
        .iter()
        .map(|(url, title, date)| {
            format!(
                "<item><title>{}</title><link>{}</link><pubDate>{}</pubDate></item>",
                title, url, date
            )
        })
        .collect();
    format!("<rss><channel>{}</channel></rss>", body)
}

fn rising_chart(points: usize) -> String {
    let candles: Vec<Candle> = (0..points)
        .map(|i| {
            let c = 100.0 + i as f64;
            Candle {
                t: 1_700_000_000_000 + i as i64 * 86_400_000,
                o: c,
                h: c,
                l: c,
                c,
                v: Some(1_000.0),
            }
        })
        .collect();
    serde_json::to_string(&ChartEnvelope::from_candles("AAPL", "1y", "1d", &candles, "yahoo")).unwrap()
}

// ----- Quotes -----

#[tokio::test]
async fn rate_limited_provider_falls_through_to_next() {
    let first = FakeProvider::err(
        "polygon",
        MarketError::RateLimited {
            provider: "polygon".into(),
        },
    );
    let second = FakeProvider::ok("finnhub", vec![quote("AAPL", "finnhub", 190.0), quote("MSFT", "finnhub", 410.0)]);
    let third = FakeProvider::ok("yahoo", vec![quote("AAPL", "yahoo", 1.0)]);

    let aggregator = QuoteAggregator::new(chain(&[&first, &second, &third]), 20, false);
    let response = aggregator.fetch_csv("aapl, MSFT").await;

    assert_eq!(response.source.as_deref(), Some("finnhub"));
    assert_eq!(response.quotes().len(), 2);
    assert!(response.quotes().iter().all(|q| q.source == "finnhub"));
    assert_eq!(third.calls(), 0);

    let status = &response.status;
    assert_eq!(status.attempted_sources, vec!["polygon", "finnhub"]);
    assert_eq!(status.errors.len(), 1);
    assert_eq!(status.errors[0].code, AttemptCode::RateLimitExceeded);
    assert!(status.fallback_used);
    assert_eq!(status.found_symbols, 2);
    assert_eq!(status.message, "All 2 symbols loaded from finnhub");
}

#[tokio::test]
async fn later_providers_only_see_missing_symbols() {
    let first = FakeProvider::ok("polygon", vec![quote("AAPL", "polygon", 190.0)]);
    let second = FakeProvider::ok("yahoo", vec![quote("MSFT", "yahoo", 410.0), quote("AAPL", "yahoo", 1.0)]);
    let skipped = FakeProvider::unconfigured("iex");

    let aggregator = QuoteAggregator::new(chain(&[&first, &skipped, &second]), 20, false);
    let response = aggregator.fetch(&symbols(&["AAPL", "MSFT"])).await;

    assert_eq!(skipped.calls(), 0);
    assert_eq!(second.requested.lock().unwrap()[0], vec!["MSFT".to_string()]);
    assert_eq!(response.quotes()[0].source, "polygon");
    assert_eq!(response.quotes()[0].price, 190.0);
    assert_eq!(response.quotes()[1].source, "yahoo");
    assert_eq!(response.status.attempted_sources, vec!["polygon", "yahoo"]);
}

#[tokio::test]
async fn upstream_errors_are_kept_per_symbol() {
    let yahoo = FakeProvider::ok(
        "yahoo",
        vec![
            quote("AAPL", "yahoo", 190.0),
            Quote::with_error("ZZZZINVALID", "yahoo", "No data found, symbol may be delisted"),
        ],
    );
    let aggregator = QuoteAggregator::new(chain(&[&yahoo]), 20, true);
    let response = aggregator.fetch_csv("AAPL,ZZZZINVALID").await;

    let json = serde_json::to_value(&response).unwrap();
    let result = json["quoteResponse"]["result"].as_array().unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result[0]["symbol"], "AAPL");
    assert_eq!(result[0]["regularMarketPrice"], 190.0);
    assert!(result[0]["technicalAnalysis"].is_object());
    assert_eq!(result[1]["symbol"], "ZZZZINVALID");
    assert_eq!(result[1]["error"], "No data found, symbol may be delisted");
    assert_eq!(result[1]["regularMarketPrice"], 0.0);
    assert!(result[1].get("technicalAnalysis").is_none());
    assert_eq!(response.status.found_symbols, 1);
    assert_eq!(response.status.message, "1 of 2 symbols found");
    assert!(json.get("error").is_none());
}

#[tokio::test]
async fn total_failure_is_empty_with_error() {
    let aggregator = QuoteAggregator::new(
        chain(&[
            &FakeProvider::err("polygon", MarketError::Network("connection reset".into())),
            &FakeProvider::err("yahoo", MarketError::Http { status: 503, url: "x".into() }),
        ]),
        20,
        false,
    );
    let response = aggregator.fetch_csv("AAPL").await;

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["quoteResponse"]["result"], serde_json::json!([]));
    assert_eq!(json["error"], "upstream_unavailable");
    assert_eq!(response.status.errors.len(), 2);
    assert!(response.status.errors.iter().all(|e| e.code == AttemptCode::FetchError));
    assert_eq!(response.status.message, "No quote data available from any source");
    assert!(!response.status.fallback_used);
}

#[test]
fn symbol_lists_are_normalized_and_capped() {
    assert_eq!(parse_symbols(" aapl,MSFT,,aapl ,tsla", 20), symbols(&["AAPL", "MSFT", "TSLA"]));
    let many: Vec<String> = (0..30).map(|i| format!("S{}", i)).collect();
    assert_eq!(parse_symbols(&many.join(","), 20).len(), 20);

    let aggregator = QuoteAggregator::new(Vec::new(), 500, false);
    assert_eq!(aggregator.symbol_cap(), 50);
}

// ----- News -----

const DATE_OLD: &str = "Mon, 01 Jan 2024 10:00:00 GMT";
const DATE_NEW: &str = "Tue, 02 Jan 2024 10:00:00 GMT";

#[tokio::test]
async fn duplicate_urls_keep_the_first_feed() {
    let fetcher = Arc::new(
        FakeFetcher::new()
            .ok(
                "cnbc.com/id/10001147",
                rss(&[("https://x.com/shared", "Stocks rally on CPI", DATE_NEW)]),
            )
            .ok(
                "feeds.reuters.com",
                rss(&[
                    ("https://x.com/shared", "Stocks rally on CPI (wire)", DATE_NEW),
                    ("https://x.com/other", "Bond yields slip", DATE_OLD),
                ]),
            ),
    );
    let news = NewsAggregator::new(fetcher, Duration::from_secs(1), true);
    let page = news.page("", &NewsQuery::default()).await;

    assert_eq!(page.total, 2);
    let shared: Vec<_> = page.items.iter().filter(|i| i.url == "https://x.com/shared").collect();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].source, "CNBC");
    assert_eq!(page.items[0].url, "https://x.com/shared");
}

#[tokio::test]
async fn third_page_of_twenty_three_items() {
    let cnbc: Vec<(String, String)> = (0..12)
        .map(|i| (format!("https://cnbc.test/{}", i), format!("Stocks update {}", i)))
        .collect();
    let reuters: Vec<(String, String)> = (0..11)
        .map(|i| (format!("https://reuters.test/{}", i), format!("Market brief {}", i)))
        .collect();
    let as_items = |rows: &[(String, String)]| {
        rss(&rows
            .iter()
            .map(|(u, t)| (u.as_str(), t.as_str(), DATE_OLD))
            .collect::<Vec<_>>())
    };

    let fetcher = Arc::new(
        FakeFetcher::new()
            .ok("cnbc.com/id/10001147", as_items(&cnbc))
            .ok("feeds.reuters.com", as_items(&reuters)),
    );
    let news = NewsAggregator::new(fetcher.clone(), Duration::from_secs(1), true);
    let query = NewsQuery {
        page: 3,
        page_size: 10,
        ..NewsQuery::default()
    };

    let page = news.page("", &query).await;
    assert_eq!(page.total, 23);
    assert_eq!(page.items.len(), 3);

    // the pool is cached, so paging again does not refetch
    let calls = fetcher.calls();
    let first = news.page("", &NewsQuery::default()).await;
    assert_eq!(first.items.len(), 10);
    assert_eq!(fetcher.calls(), calls);
}

#[tokio::test]
async fn pools_are_cached_per_source_limit() {
    let rows: Vec<(String, String)> = (0..8)
        .map(|i| (format!("https://cnbc.test/{}", i), format!("Stocks update {}", i)))
        .collect();
    let feed = rss(&rows
        .iter()
        .map(|(u, t)| (u.as_str(), t.as_str(), DATE_OLD))
        .collect::<Vec<_>>());
    let fetcher = Arc::new(FakeFetcher::new().ok("cnbc.com/id/10001147", feed));
    let news = NewsAggregator::new(fetcher, Duration::from_secs(1), true);

    let narrow = NewsQuery::from_params(None, Some("25"), None, None, Some("3"));
    assert_eq!(news.page("", &narrow).await.total, 3);

    let wide = NewsQuery::from_params(None, Some("25"), None, None, Some("20"));
    assert_eq!(news.page("", &wide).await.total, 8);
}

#[tokio::test]
async fn every_feed_failing_yields_an_empty_page() {
    let fetcher = Arc::new(FakeFetcher::new());
    let news = NewsAggregator::new(fetcher.clone(), Duration::from_secs(1), true);
    let page = news.page("", &NewsQuery::default()).await;

    assert_eq!(page.total, 0);
    assert!(page.items.is_empty());
    assert_eq!(fetcher.calls(), feed_catalog("").len());
    assert_eq!(
        serde_json::to_value(&page).unwrap(),
        serde_json::json!({"items": [], "total": 0})
    );
}

#[tokio::test]
async fn ticker_queries_pull_stocktwits() {
    let fetcher = Arc::new(FakeFetcher::new().ok(
        "streams/symbol/TSLA.json",
        r#"{"messages":[{"id":7,"body":"$TSLA squeeze incoming","created_at":"2024-01-02T12:00:00Z","user":{"username":"bull"}}]}"#,
    ));
    let news = NewsAggregator::new(fetcher.clone(), Duration::from_secs(1), true);
    let query = NewsQuery::from_params(None, None, Some("$TSLA"), None, None);
    let page = news.page("$TSLA", &query).await;

    assert_eq!(fetcher.requested("streams/symbol/TSLA.json"), 1);
    assert_eq!(fetcher.requested("news.google.com"), 1);
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, "st_7");
    assert_eq!(page.items[0].source, "StockTwits");
}

// ----- Charts -----

#[tokio::test]
async fn chart_passes_yahoo_through() {
    let body = rising_chart(5);
    let fetcher = Arc::new(FakeFetcher::new().ok("v8/finance/chart/AAPL", body.clone()));
    let charts = ChartService::new(fetcher, Some("key".into()), Duration::from_secs(1));

    let reply = charts.chart("AAPL", DEFAULT_RANGE, DEFAULT_INTERVAL).await;
    assert!(reply.available);
    assert_eq!(reply.source, "yahoo");
    assert_eq!(reply.body, body);
}

#[tokio::test]
async fn chart_falls_back_to_alpha_vantage() {
    let series = r#"{"Time Series (Daily)":{
        "2024-01-03":{"1. open":"11","2. high":"12","3. low":"10","4. close":"11.5","6. volume":"100"},
        "2024-01-02":{"1. open":"10","2. high":"11","3. low":"9","4. close":"10.5","6. volume":"90"}}}"#;
    let fetcher = Arc::new(
        FakeFetcher::new()
            .err("v8/finance/chart", MarketError::Http { status: 429, url: "x".into() })
            .ok("alphavantage.co", series),
    );
    let charts = ChartService::new(fetcher, Some("key".into()), Duration::from_secs(1));

    let reply = charts.chart("IBM", "5y", "1d").await;
    assert!(reply.available);
    assert_eq!(reply.source, "alphavantage");

    let envelope: ChartEnvelope = serde_json::from_str(&reply.body).unwrap();
    let candles = envelope.candles();
    assert_eq!(candles.len(), 2);
    assert!(candles[0].t < candles[1].t);
    assert_eq!(candles[1].c, 11.5);
}

#[tokio::test]
async fn chart_without_fallback_is_unavailable() {
    let fetcher = Arc::new(FakeFetcher::new());
    let charts = ChartService::new(fetcher.clone(), None, Duration::from_secs(1));

    let reply = charts.chart("AAPL", DEFAULT_RANGE, DEFAULT_INTERVAL).await;
    assert!(!reply.available);
    let json: serde_json::Value = serde_json::from_str(&reply.body).unwrap();
    assert_eq!(json["error"], "upstream_unavailable");
    assert_eq!(json["chart"]["result"], serde_json::json!([]));
    assert_eq!(fetcher.calls(), 1);
}

// ----- Screener -----

fn screener_with(provider: Arc<FakeProvider>, fetcher: Arc<FakeFetcher>) -> Screener {
    screener_over(chain(&[&provider]), 20, fetcher)
}

fn screener_over(providers: Vec<Arc<dyn QuoteProvider>>, symbol_cap: usize, fetcher: Arc<FakeFetcher>) -> Screener {
    let timeout = Duration::from_secs(1);
    Screener::new(
        Arc::new(QuoteAggregator::new(providers, symbol_cap, false)),
        Arc::new(ChartService::new(fetcher.clone(), None, timeout)),
        Arc::new(TrendingService::new(fetcher.clone(), timeout)),
        fetcher,
        timeout,
    )
}

#[tokio::test]
async fn screener_keeps_equities_and_computes_emas() {
    let mut etf = quote("SPY", "yahoo", 500.0);
    etf.quote_type = Some("ETF".into());
    let provider = FakeProvider::ok("yahoo", vec![equity("AAPL", "yahoo", 179.0), etf]);
    let fetcher = Arc::new(FakeFetcher::new().ok("v8/finance/chart/AAPL", rising_chart(80)));
    let screener = screener_with(provider, fetcher.clone());

    let outcome = screener
        .run(&Universe::Symbols(symbols(&["AAPL", "SPY", "CL=F", "BTC-USD"])))
        .await;

    assert!(!outcome.degraded);
    assert_eq!(outcome.universe, 1);
    assert_eq!(outcome.results.len(), 1);
    let aapl = &outcome.results[0];
    assert_eq!(aapl.symbol, "AAPL");
    assert_eq!(aapl.close, 179.0);
    assert_eq!(aapl.high_52w, 179.0);
    assert_eq!(aapl.low_52w, 100.0);
    assert!(aapl.above_50);
    assert!(aapl.above_200);
    assert_eq!(fetcher.requested("chart/SPY"), 0);
}

#[tokio::test]
async fn screener_degrades_to_quote_cards() {
    let provider = FakeProvider::ok("yahoo", vec![equity("AAPL", "yahoo", 190.0), equity("MSFT", "yahoo", 410.0)]);
    let fetcher = Arc::new(FakeFetcher::new().ok("v8/finance/chart/AAPL", rising_chart(10)));
    let screener = screener_with(provider, fetcher);

    let outcome = screener.run(&Universe::Symbols(symbols(&["AAPL", "MSFT"]))).await;

    assert!(outcome.degraded);
    assert_eq!(outcome.results.len(), 2);
    assert_eq!(outcome.results[0].symbol, "AAPL");
    assert_eq!(outcome.results[0].high_52w, 190.0);
    assert!(!outcome.results[0].above_50);
    assert_eq!(outcome.results[1].source.as_deref(), Some("yahoo"));
}

#[tokio::test]
async fn screener_without_quotes_uses_cleaned_list() {
    let provider = FakeProvider::err("yahoo", MarketError::Http { status: 401, url: "x".into() });
    let fetcher = Arc::new(FakeFetcher::new().ok("v8/finance/chart/MSFT", rising_chart(70)));
    let screener = screener_with(provider, fetcher);

    let outcome = screener.run(&Universe::Symbols(symbols(&["msft", "EURUSD=X"]))).await;
    assert_eq!(outcome.universe, 1);
    assert_eq!(outcome.results[0].symbol, "MSFT");
    assert!(!outcome.degraded);
}

#[tokio::test]
async fn untyped_provider_quotes_are_not_equities() {
    let fetcher = Arc::new(
        FakeFetcher::new()
            .ok("/ticker/AAPL/prev", r#"{"results":[{"o":180.0,"c":182.0,"v":1000.0}]}"#)
            .ok("/ticker/SPY/prev", r#"{"results":[{"o":500.0,"c":505.0,"v":2000.0}]}"#),
    );
    let polygon: Arc<dyn QuoteProvider> = Arc::new(PolygonQuoteProvider::new(
        Some("k".into()),
        fetcher.clone(),
        Duration::from_secs(1),
    ));
    let screener = screener_over(vec![polygon], 20, fetcher);

    let (equities, quotes) = screener.equity_filter(&symbols(&["AAPL", "SPY"])).await;
    assert_eq!(quotes.len(), 2);
    assert!(quotes.iter().all(|q| q.quote_type.is_none()));
    assert!(!equities.contains(&"SPY".to_string()));
    assert!(equities.is_empty());
}

#[tokio::test]
async fn equity_lookup_respects_a_small_symbol_cap() {
    let universe: Vec<String> = (0..30).map(|i| format!("EQ{}", i)).collect();
    let provider = FakeProvider::ok("yahoo", universe.iter().map(|s| equity(s, "yahoo", 10.0)).collect());
    let screener = screener_over(chain(&[&provider]), 10, Arc::new(FakeFetcher::new()));

    let (equities, _) = screener.equity_filter(&universe).await;
    assert_eq!(equities.len(), 30);
    assert_eq!(equities, universe);
    assert_eq!(provider.calls(), 3);
    assert!(provider.requested.lock().unwrap().iter().all(|chunk| chunk.len() == 10));
}

#[tokio::test]
async fn trending_universe_drops_funds() {
    let body = r#"{"finance":{"result":[{"quotes":[{"symbol":"SPY"},{"symbol":"NVDA"},{"symbol":"XLF"},{"symbol":"QQQ"},{"symbol":"PLTR"}]}]}}"#;
    let provider = FakeProvider::ok("yahoo", Vec::new());
    let fetcher = Arc::new(FakeFetcher::new().ok("v1/finance/trending/US", body));
    let screener = screener_with(provider, fetcher);

    assert_eq!(screener.universe_symbols(&Universe::Trending).await, symbols(&["NVDA", "PLTR"]));
}

// ----- Trending, reader, context, dashboard -----

#[tokio::test]
async fn trending_sources_combine_live_lists() {
    let fetcher = Arc::new(
        FakeFetcher::new()
            .ok("v1/finance/trending", r#"{"finance":{"result":[{"quotes":[{"symbol":"NVDA"},{"symbol":"AMD"}]}]}}"#)
            .ok("trending/symbols.json", r#"{"symbols":[{"symbol":"GME"}]}"#)
            .ok(
                "cnbc.com/id/10001147",
                rss(&[("https://cnbc.test/1", "TSLA and AAPL lead as CNBC reports", DATE_NEW)]),
            ),
    );
    let trending = TrendingService::new(fetcher, Duration::from_secs(1));

    let snapshot = trending.all_sources("US", 3).await;
    assert_eq!(snapshot.yahoo, symbols(&["NVDA", "AMD"]));
    assert_eq!(snapshot.stocktwits, symbols(&["GME"]));
    assert_eq!(snapshot.cnbc, symbols(&["TSLA", "AAPL"]));
    assert!(snapshot.google.is_empty());

    let dow = trending.from_source(TrendingSource::Dow, "US", 2).await;
    assert_eq!(dow, symbols(&["AAPL", "AMGN"]));
}

#[tokio::test]
async fn reader_falls_back_to_stripped_html() {
    let fetcher = Arc::new(
        FakeFetcher::new()
            .err("r.jina.ai", MarketError::Timeout("reader".into()))
            .ok("example.com/story", "<html><script>x()</script><p>Shares   rose</p></html>"),
    );
    let reader = ArticleReader::new(fetcher.clone(), Duration::from_secs(1));

    assert_eq!(reader.read("https://example.com/story").await, "Shares rose");
    assert_eq!(fetcher.requested("r.jina.ai/http://example.com/story"), 1);
    assert_eq!(reader.read("  ").await, "");
}

#[tokio::test]
async fn reader_refuses_internal_targets() {
    let fetcher = Arc::new(
        FakeFetcher::new()
            .ok("r.jina.ai", "metadata via reader")
            .ok("127.0.0.1", "admin panel")
            .ok("169.254.169.254", "ami-id"),
    );
    let reader = ArticleReader::new(fetcher.clone(), Duration::from_secs(1));

    for target in [
        "http://127.0.0.1:8080/admin",
        "http://169.254.169.254/latest/meta-data/",
        "http://localhost/",
        "file:///etc/passwd",
    ] {
        assert_eq!(reader.read(target).await, "");
    }
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn context_search_is_cached_per_question() {
    let fetcher = Arc::new(FakeFetcher::new().ok(
        "news.google.com",
        rss(&[("https://www.reuters.com/fed", "Fed holds rates steady", DATE_NEW)]),
    ));
    let context = ContextSearchService::new(fetcher.clone(), Duration::from_secs(1));

    let items = context.search("What did Powell say?").await;
    assert_eq!(items.len(), 1);
    let calls = fetcher.calls();

    let again = context.search("  what did powell say?").await;
    assert_eq!(again, items);
    assert_eq!(fetcher.calls(), calls);
}

#[tokio::test]
async fn market_snapshot_never_fabricates() {
    let aggregator = QuoteAggregator::new(
        chain(&[&FakeProvider::err("yahoo", MarketError::Network("down".into()))]),
        20,
        false,
    );
    let snapshot = market_snapshot(&aggregator).await;
    assert!(snapshot.indices.is_empty());
    assert!(snapshot.trending.is_empty());
    assert_eq!(snapshot.error.as_deref(), Some("upstream_unavailable"));

    let mut gspc = quote("^GSPC", "yahoo", 5000.0);
    gspc.short_name = Some("S&P 500 Index".into());
    let aggregator = QuoteAggregator::new(
        chain(&[&FakeProvider::ok("yahoo", vec![gspc, quote("NVDA", "yahoo", 900.0)])]),
        20,
        false,
    );
    let snapshot = market_snapshot(&aggregator).await;
    assert_eq!(snapshot.indices.len(), 1);
    assert_eq!(snapshot.indices[0].name, "S&P 500");
    assert_eq!(snapshot.trending[0].symbol, "NVDA");
    assert_eq!(snapshot.error, None);
}
