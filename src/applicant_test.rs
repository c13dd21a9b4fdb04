// Unit tests for the domain validator

use super::*;
use pretty_assertions::assert_eq;

fn raw() -> RawApplicant {
    RawApplicant {
        full_name: "  John Doe ".to_string(),
        document_number: " y1234567x ".to_string(),
        country_code: "257".to_string(),
        email: " John.Doe@Example.com ".to_string(),
        phone: "657666666".to_string(),
        current_expiry: "09/06/2021".to_string(),
        address: "Passeig de Sant Joan, 189".to_string(),
        procedure_code: "4010".to_string(),
        deadline: "06/09/2021".to_string(),
    }
}

#[test]
fn normalizes_fields() {
    let tables = Tables::builtin();
    let applicant = Applicant::from_raw(&raw(), &tables).unwrap();

    assert_eq!(applicant.full_name, "JOHN DOE");
    assert_eq!(applicant.document_number, "Y1234567X");
    assert_eq!(applicant.email, "john.doe@example.com");
    assert_eq!(
        applicant.deadline,
        NaiveDate::from_ymd_opt(2021, 9, 6).unwrap()
    );
}

#[test]
fn normalization_is_idempotent() {
    let tables = Tables::builtin();
    let first = Applicant::from_raw(&raw(), &tables).unwrap();

    let normalized = RawApplicant {
        full_name: first.full_name.clone(),
        document_number: first.document_number.clone(),
        country_code: first.country_code.clone(),
        email: first.email.clone(),
        phone: first.phone.clone(),
        current_expiry: first.current_expiry.clone(),
        address: first.address.clone(),
        procedure_code: first.procedure_code.clone(),
        deadline: first.deadline.format(DATE_FORMAT).to_string(),
    };
    let second = Applicant::from_raw(&normalized, &tables).unwrap();

    assert_eq!(first, second);
}

#[test]
fn rejects_bad_document_number() {
    let tables = Tables::builtin();

    for bad in ["A1234567X", "Y123456X", "Y12345678", "1234567X", ""] {
        let mut input = raw();
        input.document_number = bad.to_string();
        match Applicant::from_raw(&input, &tables) {
            Err(ValidationError::Format(_)) => {}
            other => panic!("expected format error for {bad:?}, got {other:?}"),
        }
    }
}

#[test]
fn rejects_unknown_country() {
    let tables = Tables::builtin();

    let mut input = raw();
    input.country_code = "999".to_string();
    assert_eq!(
        Applicant::from_raw(&input, &tables),
        Err(ValidationError::CountryNotFound("999".to_string()))
    );

    input.country_code = "abc".to_string();
    assert!(matches!(
        Applicant::from_raw(&input, &tables),
        Err(ValidationError::CountryNotFound(_))
    ));
}

#[test]
fn rejects_unknown_procedure() {
    let tables = Tables::builtin();

    let mut input = raw();
    input.procedure_code = "1".to_string();
    assert_eq!(
        Applicant::from_raw(&input, &tables),
        Err(ValidationError::ProcedureNotFound("1".to_string()))
    );
}

#[test]
fn rejects_bad_phone() {
    let tables = Tables::builtin();

    for bad in ["657 666 666", "+34657666666", "phone", ""] {
        let mut input = raw();
        input.phone = bad.to_string();
        assert!(
            matches!(
                Applicant::from_raw(&input, &tables),
                Err(ValidationError::Format(_))
            ),
            "expected format error for {bad:?}"
        );
    }
}

#[test]
fn rejects_bad_dates() {
    let tables = Tables::builtin();

    let mut input = raw();
    input.current_expiry = "2021-06-09".to_string();
    assert!(matches!(
        Applicant::from_raw(&input, &tables),
        Err(ValidationError::Format(_))
    ));

    let mut input = raw();
    input.deadline = "31/02/2021".to_string();
    assert!(matches!(
        Applicant::from_raw(&input, &tables),
        Err(ValidationError::Format(_))
    ));
}
