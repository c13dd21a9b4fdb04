//! The fixed step interface between the state machine and whatever
//! actually talks to the wizard.
//!
//! Two backends implement it: [`HttpTransport`] here, replaying the
//! wizard's form posts over a raw HTTP session, and
//! [`crate::browser::BrowserTransport`], driving a real browser. The
//! state machine never knows which one it is holding.

use reqwest::header::REFERER;
use tracing::debug;
use url::Url;

use crate::errors::BookingError;
use crate::page::WizardPage;

/// The wizard's posts, in flow order. `begin` covers the initial GET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Select the target procedure.
    SelectProcedure,
    /// Acknowledge the initial info screen.
    AcknowledgeInfo,
    /// Submit the applicant identity fields.
    SubmitIdentity,
    /// Advance past entry validation to the offices page.
    ValidateEntry,
    /// Submit the chosen office.
    ChooseOffice,
    /// Submit contact fields, advancing to the slots page.
    SubmitContact,
    /// Submit the chosen slot.
    ChooseSlot,
    /// Final confirmation post.
    ConfirmBooking,
}

impl Step {
    /// Path segment of this step's endpoint.
    pub fn path(&self) -> &'static str {
        match self {
            Step::SelectProcedure => "acInfo",
            Step::AcknowledgeInfo => "acEntrada",
            Step::SubmitIdentity => "acValidarEntrada",
            Step::ValidateEntry => "acCitar",
            Step::ChooseOffice => "acVerFormulario",
            Step::SubmitContact => "acOfertarCita",
            Step::ChooseSlot => "acVerificarCita",
            Step::ConfirmBooking => "acGrabarCita",
        }
    }

    /// The identity post is the one step the server accepts only as
    /// multipart form data.
    fn uses_multipart(&self) -> bool {
        matches!(self, Step::SubmitIdentity)
    }
}

/// One wizard session. Implementations must preserve server-assigned
/// cookies and tokens across `submit` calls, and `reset` must leave the
/// backend ready to `begin` a completely fresh session.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Open the wizard landing page on a running session.
    async fn begin(&mut self) -> Result<WizardPage, BookingError>;

    /// Submit one step with the given form fields, on top of whatever
    /// continuation state the session carries.
    async fn submit(
        &mut self,
        step: Step,
        fields: &[(String, String)],
    ) -> Result<WizardPage, BookingError>;

    /// Discard all session state (cookies, tokens).
    async fn reset(&mut self) -> Result<(), BookingError>;
}

/// Raw-session backend: replays the wizard's form posts with reqwest,
/// echoing the hidden continuation tokens from each response into the
/// next request.
pub struct HttpTransport {
    base_url: Url,
    http: reqwest::Client,
    tokens: Vec<(String, String)>,
    referer: Option<String>,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self, BookingError> {
        let base_url =
            Url::parse(base_url).map_err(|e| BookingError::Transport(e.to_string()))?;
        Ok(HttpTransport {
            base_url,
            http: Self::build_client()?,
            tokens: Vec::new(),
            referer: None,
        })
    }

    fn build_client() -> Result<reqwest::Client, BookingError> {
        // fresh cookie jar per client; bounded wait per request
        Ok(reqwest::Client::builder()
            .cookie_store(true)
            .timeout(std::time::Duration::from_secs(30))
            .build()?)
    }

    fn step_url(&self, path: &str) -> Result<Url, BookingError> {
        self.base_url
            .join(&format!("icpplustieb/{path}"))
            .map_err(|e| BookingError::Transport(e.to_string()))
    }

    /// Continuation tokens currently carried, for inspection in tests.
    pub fn tokens(&self) -> &[(String, String)] {
        &self.tokens
    }
}

impl Transport for HttpTransport {
    async fn begin(&mut self) -> Result<WizardPage, BookingError> {
        let mut url = self.step_url("citar")?;
        url.query_pairs_mut()
            .append_pair("p", "8")
            .append_pair("locale", "es");

        debug!(%url, "opening wizard");
        let response = self.http.get(url.clone()).send().await?;
        let page = WizardPage::new(response.text().await?);
        if !page.is_service_unavailable() {
            self.tokens = page.continuation_tokens()?;
        }
        self.referer = Some(url.to_string());
        Ok(page)
    }

    async fn submit(
        &mut self,
        step: Step,
        fields: &[(String, String)],
    ) -> Result<WizardPage, BookingError> {
        let url = self.step_url(step.path())?;
        debug!(step = step.path(), "submitting step");

        let mut request = self.http.post(url.clone());
        if let Some(referer) = &self.referer {
            request = request.header(REFERER, referer.clone());
        }

        let pairs: Vec<(String, String)> = self
            .tokens
            .iter()
            .cloned()
            .chain(fields.iter().cloned())
            .collect();
        if step.uses_multipart() {
            let mut form = reqwest::multipart::Form::new();
            for (name, value) in pairs {
                form = form.text(name, value);
            }
            request = request.multipart(form);
        } else {
            request = request.form(&pairs);
        }

        let response = request.send().await?;
        let page = WizardPage::new(response.text().await?);
        // the final page carries the confirmation code, not tokens, and
        // failure pages (no availability, overload, CAPTCHA wall) may
        // carry none at all; those go back to the caller to classify
        if step != Step::ConfirmBooking
            && !page.has_no_availability()
            && !page.is_service_unavailable()
            && !page.has_captcha_wall()
        {
            self.tokens = page.continuation_tokens()?;
        }
        self.referer = Some(url.to_string());
        Ok(page)
    }

    async fn reset(&mut self) -> Result<(), BookingError> {
        self.http = Self::build_client()?;
        self.tokens.clear();
        self.referer = None;
        Ok(())
    }
}
