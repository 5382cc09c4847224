use anyhow::{Context, Result};

/// Retrieve the raw text behind a URL with a single blocking GET.
///
/// Transport failures and non-2xx statuses are surfaced as errors instead of
/// being folded into empty input, so a bad fetch never turns into an empty
/// chunk list downstream.
pub fn fetch_text(url: &str) -> Result<String> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("chunk-runner/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let response = client
        .get(url)
        .send()
        .with_context(|| format!("Could not fetch {url}"))?
        .error_for_status()
        .with_context(|| format!("Fetch failed for {url}"))?;

    response
        .text()
        .with_context(|| format!("Could not read response body from {url}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn test_fetch_returns_body() -> Result<()> {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/doc.txt");
            then.status(200).body("hello world");
        });

        let text = fetch_text(&server.url("/doc.txt"))?;
        mock.assert();
        assert_eq!(text, "hello world");
        Ok(())
    }

    #[test]
    fn test_fetch_empty_body_is_ok() -> Result<()> {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/empty");
            then.status(200).body("");
        });

        let text = fetch_text(&server.url("/empty"))?;
        assert!(text.is_empty());
        Ok(())
    }

    #[test]
    fn test_fetch_error_status_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404).body("not found");
        });

        let result = fetch_text(&server.url("/missing"));
        assert!(result.is_err());
    }

    #[test]
    fn test_fetch_unreachable_host_is_an_error() {
        // Reserved port on localhost with nothing listening
        let result = fetch_text("http://127.0.0.1:1/doc.txt");
        assert!(result.is_err());
    }
}
