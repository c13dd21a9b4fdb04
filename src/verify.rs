//! Human-verification gate for the post-slot-selection response.
//!
//! Two interruptions can show up here: a CAPTCHA wall, which the core
//! does not try to bypass (the attempt is abandoned and retried after
//! the cooldown), and an SMS code prompt, which suspends the flow until
//! an operator or upstream caller supplies the code.

use lazy_static::lazy_static;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::errors::{BookingError, ValidationError};
use crate::page::WizardPage;

lazy_static! {
    static ref SMS_CODE_PATTERN: Regex = Regex::new(r"^\d{5}$").unwrap();
}

/// External source of SMS verification codes. Blocks until an operator
/// (or an automated SMS reader) produces one.
#[allow(async_fn_in_trait)]
pub trait VerificationInput {
    async fn request_sms_code(&self) -> Result<String, BookingError>;
}

/// Prompts the operator on the terminal.
pub struct StdinVerification;

impl VerificationInput for StdinVerification {
    async fn request_sms_code(&self) -> Result<String, BookingError> {
        eprint!("SMS verification code: ");
        let mut line = String::new();
        let mut reader = BufReader::new(tokio::io::stdin());
        reader
            .read_line(&mut line)
            .await
            .map_err(|e| BookingError::Transport(format!("failed to read SMS code: {e}")))?;
        Ok(line)
    }
}

/// Validate an SMS verification code: exactly five digits after
/// trimming. Runs before the code is ever submitted.
pub fn validate_sms_code(code: &str) -> Result<String, ValidationError> {
    let code = code.trim();
    if !SMS_CODE_PATTERN.is_match(code) {
        return Err(ValidationError::Format(format!(
            "SMS verification code {code:?} must be exactly 5 digits"
        )));
    }
    Ok(code.to_string())
}

/// The gate itself: inspects the verification page and produces the SMS
/// code to attach to the confirmation post, if one is demanded.
pub struct VerificationGate<I> {
    input: I,
}

impl<I: VerificationInput> VerificationGate<I> {
    pub fn new(input: I) -> Self {
        VerificationGate { input }
    }

    /// Returns `Ok(Some(code))` when the server demanded an SMS code,
    /// `Ok(None)` when no human verification is pending. A CAPTCHA wall
    /// fails the attempt; a malformed code fails validation without
    /// consuming any further network step.
    pub async fn clear(&self, page: &WizardPage) -> Result<Option<String>, BookingError> {
        if page.has_captcha_wall() {
            warn!("server rejected automated verification with a CAPTCHA wall");
            return Err(BookingError::AttemptFailed(
                "CAPTCHA verification rejected".to_string(),
            ));
        }
        if page.wants_sms_code() {
            info!("server demands an SMS verification code");
            let code = self.input.request_sms_code().await?;
            return Ok(Some(validate_sms_code(&code)?));
        }
        Ok(None)
    }
}

#[cfg(test)]
#[path = "verify_test.rs"]
mod verify_test;
