use std::time::Duration;

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::USER_AGENT;

use crate::config::ALL_LANGUAGES;
use crate::error::{FetchError, FetchErrorKind};

pub const GITHUB_URL: &str = "https://github.com";

const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// One trending repository.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Item {
    /// `owner/name`, unique within a listing.
    pub id: String,
    pub title: String,
    pub description: String,
    pub language: String,
    pub stars: u64,
    /// e.g. "1,024 stars today"
    pub stars_period: Option<String>,
}

impl Item {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        let id = id.into();
        let title = id.rsplit('/').next().unwrap_or_default().to_string();
        Self {
            id,
            title,
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn url(&self) -> String {
        repository_url(&self.id)
    }

    pub fn row_label(&self) -> String {
        if self.description.is_empty() {
            format!("[{}]", self.id)
        } else {
            format!("[{}] {}", self.id, self.description)
        }
    }
}

pub fn repository_url(id: &str) -> String {
    format!("{}/{}", GITHUB_URL, id.trim_matches('/'))
}

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub user_agent: String,
    pub timeout: Option<Duration>,
    /// Defaults to [`GITHUB_URL`].
    pub base_url: Option<String>,
}

pub struct Client {
    http: HttpClient,
    user_agent: String,
    base_url: String,
    timeout: Duration,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.user_agent.trim().is_empty() {
            bail!("trending client user agent required");
        }

        let timeout = config.timeout.unwrap_or(Duration::from_secs(20));
        let http = HttpClient::builder().timeout(timeout).build()?;

        Ok(Client {
            http,
            user_agent: config.user_agent,
            base_url: config
                .base_url
                .unwrap_or_else(|| GITHUB_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout,
        })
    }

    pub fn trending_url(&self, language: &str) -> String {
        let language = language.trim();
        if language.is_empty() || language.eq_ignore_ascii_case(ALL_LANGUAGES) {
            format!("{}/trending", self.base_url)
        } else {
            format!(
                "{}/trending/{}",
                self.base_url,
                utf8_percent_encode(language, PATH_SEGMENT)
            )
        }
    }

    pub fn trending(&self, language: &str) -> Result<Vec<Item>, FetchError> {
        let url = self.trending_url(language);
        let fail = |kind| FetchError::new(language, kind);

        let response = self
            .http
            .get(&url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .map_err(|err| fail(self.classify(err)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fail(FetchErrorKind::Status(status.as_u16())));
        }

        let body = response.text().map_err(|err| fail(self.classify(err)))?;
        parse_listing(&body).map_err(fail)
    }

    fn classify(&self, err: reqwest::Error) -> FetchErrorKind {
        if err.is_timeout() {
            FetchErrorKind::Timeout(self.timeout)
        } else {
            FetchErrorKind::Http(err.to_string())
        }
    }
}

static ARTICLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<article[^>]*class="[^"]*\bBox-row\b[^"]*"[^>]*>(.*?)</article>"#)
        .expect("valid article regex")
});
static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<h[1-3][^>]*>(.*?)</h[1-3]>").expect("valid heading regex"));
static DESCRIPTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<p[^>]*class="[^"]*\bpr-4\b[^"]*"[^>]*>(.*?)</p>"#)
        .expect("valid description regex")
});
static LANGUAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<span[^>]*itemprop="programmingLanguage"[^>]*>(.*?)</span>"#)
        .expect("valid language regex")
});
static STARS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<a[^>]*href="[^"]*/stargazers"[^>]*>(.*?)</a>"#).expect("valid stars regex")
});
static PERIOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([\d,]+)\s+stars?\s+(today|this week|this month)").expect("valid period regex")
});
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));

/// Extracts trending rows in document order.
///
/// Rows without a usable `owner/name` heading are skipped. A page whose rows
/// all fail that way is a parse error; a page with no rows at all is not.
pub fn parse_listing(html: &str) -> Result<Vec<Item>, FetchErrorKind> {
    let mut items = Vec::new();
    let mut skipped = 0usize;
    for (index, article) in ARTICLE_RE.captures_iter(html).enumerate() {
        match parse_row(&article[1]) {
            Ok(item) => items.push(item),
            Err(reason) => {
                skipped += 1;
                tracing::debug!(row = index + 1, reason, "skipping trending row");
            }
        }
    }
    if items.is_empty() && skipped > 0 {
        return Err(FetchErrorKind::Parse(format!(
            "none of {skipped} rows had an owner/name heading"
        )));
    }
    Ok(items)
}

fn parse_row(block: &str) -> Result<Item, &'static str> {
    let heading = HEADING_RE
        .captures(block)
        .map(|caps| text_content(&caps[1]))
        .unwrap_or_default();
    let (owner, name) = heading.split_once('/').ok_or("no owner/name heading")?;
    let (owner, name) = (owner.trim(), name.trim());
    if owner.is_empty() || name.is_empty() {
        return Err("incomplete repository name");
    }

    let description = DESCRIPTION_RE
        .captures(block)
        .map(|caps| text_content(&caps[1]))
        .unwrap_or_default();
    let language = LANGUAGE_RE
        .captures(block)
        .map(|caps| text_content(&caps[1]))
        .unwrap_or_default();
    let stars = STARS_RE
        .captures(block)
        .map(|caps| parse_count(&text_content(&caps[1])))
        .unwrap_or(0);
    let stars_period = PERIOD_RE
        .captures(&text_content(block))
        .map(|caps| format!("{} stars {}", &caps[1], &caps[2]));

    Ok(Item {
        id: format!("{owner}/{name}"),
        title: name.to_string(),
        description,
        language,
        stars,
        stars_period,
    })
}

fn text_content(fragment: &str) -> String {
    let stripped = TAG_RE.replace_all(fragment, " ");
    let decoded = decode_entities(&stripped);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_count(text: &str) -> u64 {
    let digits: String = text.chars().filter(|ch| ch.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

fn decode_entities(raw: &str) -> String {
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    const SAMPLE: &str = r#"
<div>
<article class="Box-row">
  <h2 class="h3 lh-condensed">
    <a href="/tokio-rs/tokio"><span class="text-normal">tokio-rs /</span>
      tokio</a>
  </h2>
  <p class="col-9 color-fg-muted my-1 pr-4">
    A runtime for writing reliable &amp; fast applications
  </p>
  <div class="f6 color-fg-muted mt-2">
    <span class="d-inline-block ml-0 mr-3">
      <span itemprop="programmingLanguage">Rust</span>
    </span>
    <a href="/tokio-rs/tokio/stargazers" class="Link Link--muted d-inline-block mr-3">
      <svg></svg>
      27,512
    </a>
    <a href="/tokio-rs/tokio/forks">2,500</a>
    <span class="d-inline-block float-sm-right">
      <svg></svg>
      120 stars today
    </span>
  </div>
</article>
<article class="Box-row">
  <h1 class="h3"><a href="/a/b">a / b</a></h1>
</article>
</div>
"#;

    #[test]
    fn parses_rows_in_document_order() {
        let items = parse_listing(SAMPLE).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "tokio-rs/tokio");
        assert_eq!(items[0].title, "tokio");
        assert_eq!(
            items[0].description,
            "A runtime for writing reliable & fast applications"
        );
        assert_eq!(items[0].language, "Rust");
        assert_eq!(items[0].stars, 27_512);
        assert_eq!(items[0].stars_period.as_deref(), Some("120 stars today"));

        assert_eq!(items[1].id, "a/b");
        assert_eq!(items[1].description, "");
        assert_eq!(items[1].stars, 0);
        assert_eq!(items[1].stars_period, None);
    }

    #[test]
    fn empty_page_is_not_an_error() {
        assert!(parse_listing("<html><body>nothing</body></html>").unwrap().is_empty());
    }

    #[test]
    fn row_without_name_is_a_parse_error() {
        let html = r#"<article class="Box-row"><h2>broken</h2></article>"#;
        assert!(matches!(parse_listing(html), Err(FetchErrorKind::Parse(_))));
    }

    #[test]
    fn malformed_row_is_skipped() {
        let html = r#"
<article class="Box-row"><h2><a href="/x/first">x / first</a></h2></article>
<article class="Box-row"><h2>sponsored</h2></article>
<article class="Box-row"><h2><a href="/y/">y /</a></h2></article>
<article class="Box-row"><h2><a href="/z/last">z / last</a></h2></article>
"#;
        let ids: Vec<String> = parse_listing(html)
            .unwrap()
            .into_iter()
            .map(|item| item.id)
            .collect();
        assert_eq!(ids, ["x/first", "z/last"]);
    }

    #[test]
    fn trending_urls() {
        let client = Client::new(ClientConfig {
            user_agent: "test".into(),
            ..ClientConfig::default()
        })
        .unwrap();
        assert_eq!(client.trending_url("all"), "https://github.com/trending");
        assert_eq!(client.trending_url("rust"), "https://github.com/trending/rust");
        assert_eq!(client.trending_url("c++"), "https://github.com/trending/c%2B%2B");
        assert_eq!(client.trending_url("c#"), "https://github.com/trending/c%23");
    }

    #[test]
    fn item_locator_and_label() {
        let item = Item::new("a/b", "desc1");
        assert_eq!(item.title, "b");
        assert_eq!(item.url(), "https://github.com/a/b");
        assert_eq!(item.row_label(), "[a/b] desc1");
        assert_eq!(Item::new("a/b", "").row_label(), "[a/b]");
    }

    fn serve(stream: TcpStream) {
        let mut reader = BufReader::new(stream);
        let mut request_line = String::new();
        if reader.read_line(&mut request_line).is_err() {
            return;
        }
        let mut header = String::new();
        while reader.read_line(&mut header).is_ok() && !header.trim_end().is_empty() {
            header.clear();
        }
        let path = request_line.split_whitespace().nth(1).unwrap_or("/").to_string();
        let (status, body) = match path.as_str() {
            "/trending/rust" => ("200 OK", SAMPLE),
            "/trending/slow" => {
                thread::sleep(Duration::from_secs(2));
                ("200 OK", SAMPLE)
            }
            _ => ("502 Bad Gateway", "upstream unavailable"),
        };
        let mut stream = reader.into_inner();
        let _ = write!(
            stream,
            "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = stream.flush();
    }

    fn local_client(timeout: Duration) -> Client {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                thread::spawn(move || serve(stream));
            }
        });
        Client::new(ClientConfig {
            user_agent: "gh-trending-test".into(),
            timeout: Some(timeout),
            base_url: Some(format!("http://{addr}/")),
        })
        .unwrap()
    }

    #[test]
    fn fetches_listing_over_http() {
        let client = local_client(Duration::from_secs(5));
        let ids: Vec<String> = client
            .trending("rust")
            .unwrap()
            .into_iter()
            .map(|item| item.id)
            .collect();
        assert_eq!(ids, ["tokio-rs/tokio", "a/b"]);
    }

    #[test]
    fn error_status_is_reported() {
        let client = local_client(Duration::from_secs(5));
        let err = client.trending("broken").unwrap_err();
        assert_eq!(err.category, "broken");
        assert!(matches!(err.kind, FetchErrorKind::Status(502)));
    }

    #[test]
    fn slow_response_is_a_timeout() {
        let timeout = Duration::from_millis(200);
        let client = local_client(timeout);
        let err = client.trending("slow").unwrap_err();
        assert!(matches!(err.kind, FetchErrorKind::Timeout(t) if t == timeout));
    }
}
