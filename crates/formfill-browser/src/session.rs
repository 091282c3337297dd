use crate::{Error, Result};
use chromiumoxide::browser::Browser;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::task::JoinHandle;

const CONNECT_ATTEMPTS: u32 = 5;
const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// DevTools-protocol connection driving one page of a running browser
pub struct DevToolsSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl DevToolsSession {
    /// Connect to the browser listening on `localhost:<port>`
    ///
    /// The browser may still be starting, so the connection is retried.
    pub async fn connect(debugging_port: u16) -> Result<Self> {
        let endpoint = format!("http://localhost:{}", debugging_port);

        let (browser, mut handler) = {
            let mut retries = CONNECT_ATTEMPTS;
            loop {
                tracing::debug!("Attempting DevTools connection to {}...", endpoint);
                match Browser::connect(&endpoint).await {
                    Ok(result) => {
                        tracing::info!("DevTools connection established on port {}", debugging_port);
                        break result;
                    }
                    Err(e) => {
                        retries -= 1;
                        if retries == 0 {
                            return Err(Error::Cdp(format!(
                                "Failed to connect to browser on port {} after {} attempts: {}",
                                debugging_port, CONNECT_ATTEMPTS, e
                            )));
                        }
                        tracing::debug!("Connection attempt failed, retrying... ({} left)", retries);
                        tokio::time::sleep(CONNECT_RETRY_DELAY).await;
                    }
                }
            }
        };

        // Commands only complete while the handler is polled.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("DevTools handler event error (continuing): {}", e);
                }
            }
            tracing::debug!("DevTools handler loop ended");
        });

        // Give a fresh browser a moment to open its first tab.
        tokio::time::sleep(CONNECT_RETRY_DELAY).await;

        let page = match browser.pages().await?.into_iter().next() {
            Some(page) => page,
            None => {
                tracing::debug!("No open pages, creating one");
                browser.new_page("about:blank").await?
            }
        };

        Ok(Self {
            browser,
            page,
            handler_task,
        })
    }

    /// URL of the driven page
    pub async fn current_url(&self) -> Result<Option<String>> {
        Ok(self.page.url().await?)
    }

    /// Evaluate an expression and deserialize its JSON result
    pub async fn evaluate<T: DeserializeOwned>(&self, expression: &str) -> Result<T> {
        let result = self.page.evaluate(expression).await?;
        Ok(result.into_value::<T>()?)
    }

    /// Whether the handler loop is still running, i.e. the browser is reachable
    pub fn is_connected(&self) -> bool {
        !self.handler_task.is_finished()
    }

    /// Close the browser process
    pub async fn close(mut self) -> Result<()> {
        let result = self.browser.close().await;
        self.handler_task.abort();
        result.map(|_| ()).map_err(Error::from)
    }

    /// Drop the connection and leave the browser running
    pub fn disconnect(self) {
        self.handler_task.abort();
    }
}
