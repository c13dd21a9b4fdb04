//! Browser-driven transport backend.
//!
//! Drives the same wizard through a real browser over WebDriver instead
//! of replaying form posts. The server keeps continuation state in the
//! rendered pages and cookies, so this backend only has to click
//! through; the step interface stays identical to [`HttpTransport`].
//!
//! [`HttpTransport`]: crate::transport::HttpTransport

use std::time::{Duration, Instant};

use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use tracing::{debug, info};
use url::Url;

use crate::errors::BookingError;
use crate::page::WizardPage;
use crate::transport::{Step, Transport};

/// Bounded wait per page-ready condition.
const PAGE_WAIT: Duration = Duration::from_secs(30);
/// Shorter wait for the cookie banner, which may not appear at all.
const COOKIE_BANNER_WAIT: Duration = Duration::from_secs(3);
const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct BrowserTransport {
    webdriver_url: String,
    base_url: Url,
    headless: bool,
    client: Option<Client>,
}

impl BrowserTransport {
    pub fn new(
        webdriver_url: impl Into<String>,
        base_url: &str,
        headless: bool,
    ) -> Result<Self, BookingError> {
        let base_url =
            Url::parse(base_url).map_err(|e| BookingError::Transport(e.to_string()))?;
        Ok(BrowserTransport {
            webdriver_url: webdriver_url.into(),
            base_url,
            headless,
            client: None,
        })
    }

    async fn connect(&mut self) -> Result<(), BookingError> {
        if self.client.is_some() {
            return Ok(());
        }
        info!(url = %self.webdriver_url, "connecting to WebDriver");

        let mut caps = serde_json::map::Map::new();
        if self.headless {
            caps.insert(
                "moz:firefoxOptions".to_string(),
                json!({ "args": ["-headless"] }),
            );
            caps.insert(
                "goog:chromeOptions".to_string(),
                json!({ "args": ["--headless", "--disable-gpu", "--lang=en"] }),
            );
        }

        let client = ClientBuilder::rustls()
            .capabilities(caps)
            .connect(&self.webdriver_url)
            .await
            .map_err(|e| BookingError::Transport(format!("WebDriver connection failed: {e}")))?;
        self.client = Some(client);
        Ok(())
    }

    fn client(&self) -> Result<&Client, BookingError> {
        self.client
            .as_ref()
            .ok_or_else(|| BookingError::Transport("no active browser session".to_string()))
    }

    /// Poll for an element until it appears or the bounded wait runs out.
    async fn wait_for(&self, locator: Locator<'_>) -> Result<Element, BookingError> {
        self.wait_up_to(locator, PAGE_WAIT).await
    }

    async fn wait_up_to(
        &self,
        locator: Locator<'_>,
        wait: Duration,
    ) -> Result<Element, BookingError> {
        let client = self.client()?;
        let deadline = Instant::now() + wait;
        loop {
            match client.find(locator).await {
                Ok(element) => return Ok(element),
                Err(_) if Instant::now() < deadline => {
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
                Err(e) => {
                    return Err(BookingError::Transport(format!(
                        "timed out waiting for {locator:?}: {e}"
                    )));
                }
            }
        }
    }

    /// Poll until the CAPTCHA widget has produced a response token.
    async fn wait_for_captcha_response(&self) -> Result<(), BookingError> {
        let client = self.client()?;
        let deadline = Instant::now() + PAGE_WAIT;
        loop {
            let value = client
                .execute(
                    "var el = document.getElementById('g-recaptcha-response'); \
                     return el ? el.value : '';",
                    vec![],
                )
                .await?;
            if value.as_str().is_some_and(|v| !v.is_empty()) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BookingError::AttemptFailed(
                    "no CAPTCHA response produced within the wait window".to_string(),
                ));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn accept_alert(&self) -> Result<(), BookingError> {
        let client = self.client()?;
        let deadline = Instant::now() + PAGE_WAIT;
        loop {
            match client.accept_alert().await {
                Ok(()) => return Ok(()),
                Err(_) if Instant::now() < deadline => {
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
                Err(e) => {
                    return Err(BookingError::Transport(format!(
                        "timed out waiting for confirmation alert: {e}"
                    )));
                }
            }
        }
    }

    async fn rendered_page(&self) -> Result<WizardPage, BookingError> {
        Ok(WizardPage::new(self.client()?.source().await?))
    }
}

fn field<'a>(
    fields: &'a [(String, String)],
    name: &str,
    step: Step,
) -> Result<&'a str, BookingError> {
    fields
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_str())
        .ok_or_else(|| {
            BookingError::Transport(format!("step {step:?} is missing field {name:?}"))
        })
}

impl Transport for BrowserTransport {
    async fn begin(&mut self) -> Result<WizardPage, BookingError> {
        self.connect().await?;
        let client = self.client()?;

        let mut url = self
            .base_url
            .join("icpplustieb/citar")
            .map_err(|e| BookingError::Transport(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("p", "8")
            .append_pair("locale", "es");

        debug!(%url, "opening wizard");
        client.goto(url.as_str()).await?;
        client.delete_all_cookies().await?;
        client.refresh().await?;

        let page = self.rendered_page().await?;
        if page.is_service_unavailable() {
            return Ok(page);
        }

        // cookie banner renders late on fresh sessions and its overlay
        // intercepts clicks until dismissed
        if let Ok(banner) = self
            .wait_up_to(Locator::Id("cookie_action_close_header"), COOKIE_BANNER_WAIT)
            .await
        {
            let _ = banner.click().await;
        }

        self.rendered_page().await
    }

    async fn submit(
        &mut self,
        step: Step,
        fields: &[(String, String)],
    ) -> Result<WizardPage, BookingError> {
        debug!(step = step.path(), "driving step");
        match step {
            Step::SelectProcedure => {
                let procedure = field(fields, "tramiteGrupo[0]", step)?;
                self.wait_for(Locator::Css(r#"[id='tramiteGrupo[0]']"#))
                    .await?
                    .select_by_value(procedure)
                    .await?;
                self.wait_for(Locator::Id("btnAceptar")).await?.click().await?;
            }
            Step::AcknowledgeInfo => {
                self.wait_for(Locator::Id("btnEntrar")).await?.click().await?;
            }
            Step::SubmitIdentity => {
                self.wait_for(Locator::Id("txtIdCitado")).await?;
                // filled through JS: typed input mangles the date field
                self.client()?
                    .execute(
                        "document.getElementById('txtIdCitado').value = arguments[0]; \
                         document.getElementById('txtDesCitado').value = arguments[1]; \
                         document.getElementById('txtPaisNac').value = arguments[2]; \
                         document.getElementById('txtFecha').value = arguments[3]; \
                         envia();",
                        vec![
                            json!(field(fields, "txtIdCitado", step)?),
                            json!(field(fields, "txtDesCitado", step)?),
                            json!(field(fields, "txtPaisNac", step)?),
                            json!(field(fields, "txtFecha", step)?),
                        ],
                    )
                    .await?;
            }
            Step::ValidateEntry => {
                self.wait_for(Locator::Id("btnEnviar")).await?.click().await?;
            }
            Step::ChooseOffice => {
                let office_id = field(fields, "idSede", step)?;
                self.wait_for(Locator::Id("idSede"))
                    .await?
                    .select_by_value(office_id)
                    .await?;
                self.wait_for(Locator::Id("btnSiguiente")).await?.click().await?;
            }
            Step::SubmitContact => {
                self.wait_for(Locator::Id("txtTelefonoCitado")).await?;
                self.client()?
                    .execute(
                        "document.getElementById('txtTelefonoCitado').value = arguments[0]; \
                         document.getElementById('emailUNO').value = arguments[1]; \
                         document.getElementById('emailDOS').value = arguments[1]; \
                         enviar();",
                        vec![
                            json!(field(fields, "txtTelefonoCitado", step)?),
                            json!(field(fields, "txtMailCitado", step)?),
                        ],
                    )
                    .await?;
            }
            Step::ChooseSlot => {
                let slot_id = field(fields, "rdbCita", step)?;
                let selector = format!("input[name='rdbCita'][value='{slot_id}']");
                self.wait_for(Locator::Css(&selector)).await?.click().await?;
                self.wait_for_captcha_response().await?;
                self.wait_for(Locator::Id("btnSiguiente")).await?.click().await?;
                self.accept_alert().await?;
            }
            Step::ConfirmBooking => {
                if let Ok(code) = field(fields, "txtCodigoVerificacion", step) {
                    self.wait_for(Locator::Id("txtCodigoVerificacion"))
                        .await?
                        .send_keys(code)
                        .await?;
                }
                self.wait_for(Locator::Id("chkTotal")).await?.click().await?;
                self.wait_for(Locator::Id("enviarCorreo")).await?.click().await?;
                self.wait_for(Locator::Id("btnConfirmar")).await?.click().await?;
                self.wait_for(Locator::Id("justificanteFinal")).await?;
            }
        }

        self.rendered_page().await
    }

    async fn reset(&mut self) -> Result<(), BookingError> {
        if let Some(client) = self.client.take() {
            // teardown is best-effort; the next begin() reconnects
            let _ = client.close().await;
        }
        Ok(())
    }
}
