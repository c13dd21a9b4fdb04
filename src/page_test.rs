// Unit tests for wizard page parsing

use super::*;
use pretty_assertions::assert_eq;

#[test]
fn extracts_continuation_tokens() {
    let page = WizardPage::new(
        r#"
        <form action="/icpplustieb/acEntrada" method="post">
            <input type="hidden" name="5bf45d4e-8d42" value="a1b2c3">
            <input type="hidden" name="9f0e7c11-331a" value="d4e5f6">
            <input type="text" name="txtIdCitado" value="">
        </form>
        "#
        .to_string(),
    );

    let tokens = page.continuation_tokens().unwrap();
    assert_eq!(
        tokens,
        vec![
            ("5bf45d4e-8d42".to_string(), "a1b2c3".to_string()),
            ("9f0e7c11-331a".to_string(), "d4e5f6".to_string()),
        ]
    );
}

#[test]
fn missing_tokens_is_extraction_error() {
    let page = WizardPage::new("<html><body>plain page</body></html>".to_string());
    assert!(matches!(
        page.continuation_tokens(),
        Err(BookingError::Extraction(_))
    ));
}

#[test]
fn extracts_offices_in_server_order() {
    let page = WizardPage::new(
        r#"
        <select id="idSede" name="idSede">
            <option value="17">CNP MALLORCA GRAN VIA, BARCELONA</option>
            <option value="16">CNP RAMBLA GUIPUSCOA 74, BARCELONA</option>
            <option value="25">CNP COMISARIA MATARO, MATARO</option>
        </select>
        "#
        .to_string(),
    );

    let offices = page.offered_offices().unwrap();
    assert_eq!(offices.len(), 3);
    assert_eq!(offices[0].id, "17");
    assert_eq!(offices[0].name, "CNP MALLORCA GRAN VIA, BARCELONA");
    assert_eq!(offices[2].id, "25");
}

#[test]
fn extracts_slots_with_dates() {
    let page = WizardPage::new(
        r#"
        <input type="radio" name="rdbCita" id="cita1" value="101">
        <label for="cita1">D&iacute;a: 01/09/2021 Hora: 09:30</label>
        <input type="radio" name="rdbCita" id="cita2" value="102">
        <label for="cita2">D&iacute;a: 10/09/2021 Hora: 11:00</label>
        "#
        .to_string(),
    );

    let slots = page.offered_slots().unwrap();
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0].id, "101");
    assert_eq!(slots[0].date, NaiveDate::from_ymd_opt(2021, 9, 1).unwrap());
    assert_eq!(slots[1].id, "102");
    assert_eq!(slots[1].date, NaiveDate::from_ymd_opt(2021, 9, 10).unwrap());
}

#[test]
fn detects_sentinels() {
    let none = WizardPage::new(
        "<p>En este momento no hay citas disponibles.</p>".to_string(),
    );
    assert!(none.has_no_availability());

    let overloaded = WizardPage::new("<h1>503 Service Unavailable</h1>".to_string());
    assert!(overloaded.is_service_unavailable());

    let captcha = WizardPage::new("<div class=\"g-recaptcha\">Captcha</div>".to_string());
    assert!(captcha.has_captcha_wall());

    let sms = WizardPage::new(
        "<input type=\"text\" id=\"txtCodigoVerificacion\" name=\"txtCodigoVerificacion\">"
            .to_string(),
    );
    assert!(sms.wants_sms_code());

    let plain = WizardPage::new("<p>Seleccione una oficina</p>".to_string());
    assert!(!plain.has_no_availability());
    assert!(!plain.is_service_unavailable());
    assert!(!plain.has_captcha_wall());
    assert!(!plain.wants_sms_code());
}

#[test]
fn extracts_confirmation_code() {
    let page = WizardPage::new(
        "<span id=\"justificanteFinal\"> 7KQ2M1 </span>".to_string(),
    );
    assert_eq!(page.confirmation_code().unwrap(), "7KQ2M1");

    let broken = WizardPage::new("<span>done</span>".to_string());
    assert!(matches!(
        broken.confirmation_code(),
        Err(BookingError::Extraction(_))
    ));
}
