use std::time::Duration;

use anyhow::{Context, Result, bail};
use regex::Regex;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::core::capability::Capability;
use crate::io::config::ToolsConfig;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const NO_RESULTS: &str =
    "No search results found. This might be due to the search query or temporary API limitations.";
const FALLBACK_LINES: usize = 5;

/// Web search against an HTML results page (DuckDuckGo by default).
#[derive(Debug, Clone)]
pub struct Search {
    http: Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct Args {
    query: String,
}

impl Search {
    pub fn new(config: &ToolsConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.command_timeout_secs))
            .build()
            .context("build search http client")?;
        Ok(Self {
            http,
            url: config.search_url.clone(),
        })
    }
}

impl Capability for Search {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search the web and return result titles with short snippets. Argument: 'query'."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "minLength": 1}
            },
            "required": ["query"]
        })
    }

    #[instrument(skip_all, fields(capability = "search"))]
    fn invoke(&self, arguments: &Value) -> Result<String> {
        let args: Args = super::parse_args(&self.schema(), arguments)?;
        debug!(query = %args.query, url = %self.url, "searching");

        let response = self
            .http
            .get(&self.url)
            .query(&[("q", args.query.as_str())])
            .send()
            .context("send search request")?;
        let status = response.status();
        if !status.is_success() {
            bail!("search failed with status code: {}", status.as_u16());
        }
        let body = response.text().context("read search response")?;
        parse_results(&body)
    }
}

/// Pull result titles and snippets out of a results page.
///
/// Falls back to the first few substantial lines of tag-stripped text when no
/// result markup is present.
pub fn parse_results(html: &str) -> Result<String> {
    let tags = Regex::new(r"<[^>]*>").context("compile tag pattern")?;
    let mut results = Vec::new();

    for line in html.lines().map(str::trim) {
        if (line.contains("result__title") || line.contains("result__a"))
            && let Some(title) = text_after_tag(&tags, line)
            && !title.contains("DuckDuckGo")
        {
            results.push(title);
        }
        if line.contains("result__snippet")
            && let Some(snippet) = text_after_tag(&tags, line)
        {
            results.push(format!("  {snippet}"));
        }
    }

    if results.is_empty() {
        let stripped = tags.replace_all(html, "");
        results = stripped
            .lines()
            .map(str::trim)
            .filter(|line| line.len() > 10 && !line.contains("DuckDuckGo"))
            .take(FALLBACK_LINES)
            .map(unescape)
            .collect();
    }

    if results.is_empty() {
        return Ok(NO_RESULTS.to_string());
    }
    Ok(results.join("\n"))
}

fn text_after_tag(tags: &Regex, line: &str) -> Option<String> {
    let start = line.find('>')?;
    let text = tags.replace_all(&line[start + 1..], "");
    let text = unescape(text.trim());
    (!text.is_empty()).then_some(text)
}

fn unescape(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_titles_and_snippets() {
        let html = r#"
<div class="result">
  <h2 class="result__title">
    <a rel="nofollow" class="result__a" href="https://www.rust-lang.org/">Rust Programming Language</a>
  </h2>
  <a class="result__snippet" href="https://www.rust-lang.org/">A language empowering <b>everyone</b> to build reliable &amp; efficient software.</a>
</div>
"#;
        let parsed = parse_results(html).expect("parse");
        assert_eq!(
            parsed,
            "Rust Programming Language\n  A language empowering everyone to build reliable & efficient software."
        );
    }

    #[test]
    fn falls_back_to_plain_text_lines() {
        let html = "<html><body>\n<p>short</p>\n<p>First meaningful line of text</p>\n<p>Second meaningful line here</p>\n</body></html>";
        let parsed = parse_results(html).expect("parse");
        assert_eq!(
            parsed,
            "First meaningful line of text\nSecond meaningful line here"
        );
    }

    #[test]
    fn empty_page_reports_no_results() {
        assert_eq!(parse_results("<html></html>").expect("parse"), NO_RESULTS);
    }

    #[test]
    fn fallback_keeps_at_most_five_lines() {
        let html: String = (0..8)
            .map(|i| format!("<p>result line number {i}</p>\n"))
            .collect();
        let parsed = parse_results(&html).expect("parse");
        assert_eq!(parsed.lines().count(), FALLBACK_LINES);
    }
}
