use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use scraper::{ElementRef, Html, Selector};

pub const DEFAULT_SOURCE_URL: &str = "https://mig.kz";

const HEADER_SELECTOR: &str = ".informer h4.text-center";
const ROW_SELECTOR: &str = ".informer table tr";
const CURRENCY_CELL_SELECTOR: &str = "td.currency";
const BUY_CELL_SELECTOR: &str = "td.buy";
const SELL_CELL_SELECTOR: &str = "td.sell";

/// Raw response of a single page download.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self) -> Result<FetchedPage>;
}

/// Downloads the rate page with a single plain GET.
pub struct HttpSource {
    client: Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl DocumentSource for HttpSource {
    async fn fetch(&self) -> Result<FetchedPage> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Can't download {}", self.url))?;
        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .with_context(|| format!("Can't read body of {}", self.url))?;

        Ok(FetchedPage {
            status,
            body: body.to_vec(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("page body is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
}

/// Builds a traversable tree from the page body.
///
/// The HTML parser itself is lenient, so only an undecodable body is refused.
pub fn parse_document(body: &[u8]) -> Result<Html, DocumentError> {
    let text = std::str::from_utf8(body)?;
    Ok(Html::parse_document(text))
}

/// Text lookup of descendants matching a selector.
pub trait TextQuery {
    fn select_texts(&self, selector: &Selector) -> Vec<String>;

    /// Text of every match, concatenated in document order.
    fn select_text(&self, selector: &Selector) -> String {
        self.select_texts(selector).concat()
    }
}

impl TextQuery for Html {
    fn select_texts(&self, selector: &Selector) -> Vec<String> {
        self.select(selector).map(|el| el.text().collect()).collect()
    }
}

impl TextQuery for ElementRef<'_> {
    fn select_texts(&self, selector: &Selector) -> Vec<String> {
        self.select(selector).map(|el| el.text().collect()).collect()
    }
}

/// Compiled selectors describing where the rate page keeps its data.
#[derive(Debug, Clone)]
pub struct PageLayout {
    pub header: Selector,
    pub rows: Selector,
    pub currency: Selector,
    pub buy: Selector,
    pub sell: Selector,
}

impl PageLayout {
    pub fn new() -> Result<Self> {
        Ok(Self {
            header: compile(HEADER_SELECTOR)?,
            rows: compile(ROW_SELECTOR)?,
            currency: compile(CURRENCY_CELL_SELECTOR)?,
            buy: compile(BUY_CELL_SELECTOR)?,
            sell: compile(SELL_CELL_SELECTOR)?,
        })
    }
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| anyhow::anyhow!("Invalid selector {selector:?}: {e:?}"))
}
