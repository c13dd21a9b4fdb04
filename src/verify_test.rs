// Unit tests for the human-verification gate

use super::*;
use pretty_assertions::assert_eq;

struct CannedCode(&'static str);

impl VerificationInput for CannedCode {
    async fn request_sms_code(&self) -> Result<String, BookingError> {
        Ok(self.0.to_string())
    }
}

#[test]
fn sms_code_must_be_five_digits() {
    assert!(matches!(
        validate_sms_code("1234"),
        Err(ValidationError::Format(_))
    ));
    assert!(matches!(
        validate_sms_code("12a45"),
        Err(ValidationError::Format(_))
    ));
    assert!(matches!(
        validate_sms_code("123456"),
        Err(ValidationError::Format(_))
    ));
    assert_eq!(validate_sms_code("12345").unwrap(), "12345");
    assert_eq!(validate_sms_code(" 12345 \n").unwrap(), "12345");
}

#[tokio::test]
async fn captcha_wall_fails_the_attempt() {
    let gate = VerificationGate::new(CannedCode("12345"));
    let page = WizardPage::new("<div>Captcha</div>".to_string());

    assert!(matches!(
        gate.clear(&page).await,
        Err(BookingError::AttemptFailed(_))
    ));
}

#[tokio::test]
async fn sms_prompt_requests_and_validates_the_code() {
    let page = WizardPage::new(
        "<input id=\"txtCodigoVerificacion\" name=\"txtCodigoVerificacion\">".to_string(),
    );

    let gate = VerificationGate::new(CannedCode(" 12345\n"));
    assert_eq!(gate.clear(&page).await.unwrap(), Some("12345".to_string()));

    let gate = VerificationGate::new(CannedCode("12a45"));
    assert!(matches!(
        gate.clear(&page).await,
        Err(BookingError::Validation(ValidationError::Format(_)))
    ));
}

#[tokio::test]
async fn quiet_page_needs_no_verification() {
    let gate = VerificationGate::new(CannedCode("12345"));
    let page = WizardPage::new("<p>Confirme su cita</p>".to_string());

    assert_eq!(gate.clear(&page).await.unwrap(), None);
}
