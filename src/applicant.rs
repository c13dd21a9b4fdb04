use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use crate::errors::ValidationError;
use crate::tables::Tables;

/// Date format used everywhere in the wizard.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

lazy_static! {
    static ref DOCUMENT_PATTERN: Regex = Regex::new(r"^[XYZ]\d{7}[A-Z]$").unwrap();
}

/// Applicant fields exactly as the operator typed them. Validated and
/// normalized into an [`Applicant`] before anything touches the network.
#[derive(Debug, Clone, Deserialize)]
pub struct RawApplicant {
    pub full_name: String,
    pub document_number: String,
    pub country_code: String,
    pub email: String,
    pub phone: String,
    /// Expiry date of the current document, `DD/MM/YYYY`.
    pub current_expiry: String,
    pub address: String,
    pub procedure_code: String,
    /// Latest acceptable appointment date, `DD/MM/YYYY`.
    pub deadline: String,
}

/// Validated, normalized applicant data. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applicant {
    pub full_name: String,
    pub document_number: String,
    pub country_code: String,
    pub email: String,
    pub phone: String,
    /// Kept as the normalized wire string; the wizard wants it verbatim.
    pub current_expiry: String,
    pub address: String,
    pub procedure_code: String,
    pub deadline: NaiveDate,
}

impl Applicant {
    /// Validate and normalize raw applicant fields.
    ///
    /// Trims every field, upper-cases the name and document number,
    /// lower-cases the email, and checks the document pattern, the
    /// digits-only phone, both dates, and table membership of the
    /// country and procedure codes. Fails before any network call.
    pub fn from_raw(raw: &RawApplicant, tables: &Tables) -> Result<Self, ValidationError> {
        let full_name = raw.full_name.trim().to_uppercase();

        let document_number = raw.document_number.trim().to_uppercase();
        if !DOCUMENT_PATTERN.is_match(&document_number) {
            // check-digit validation deliberately not attempted
            return Err(ValidationError::Format(format!(
                "document number {document_number:?} does not match the N.I.E. pattern"
            )));
        }

        let country_code = raw.country_code.trim().to_string();
        let country: u32 = country_code
            .parse()
            .map_err(|_| ValidationError::CountryNotFound(country_code.clone()))?;
        if !tables.countries.contains_code(country) {
            return Err(ValidationError::CountryNotFound(country_code));
        }

        let email = raw.email.trim().to_lowercase();

        let phone = raw.phone.trim().to_string();
        if phone.is_empty() || !phone.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::Format(format!(
                "phone number {phone:?} must contain digits only"
            )));
        }

        let current_expiry = raw.current_expiry.trim().to_string();
        parse_date(&current_expiry, "current document expiry date")?;

        let address = raw.address.trim().to_string();

        let procedure_code = raw.procedure_code.trim().to_string();
        let procedure: u32 = procedure_code
            .parse()
            .map_err(|_| ValidationError::ProcedureNotFound(procedure_code.clone()))?;
        if !tables.procedures.contains_code(procedure) {
            return Err(ValidationError::ProcedureNotFound(procedure_code));
        }

        let deadline = parse_date(raw.deadline.trim(), "booking deadline date")?;

        Ok(Applicant {
            full_name,
            document_number,
            country_code,
            email,
            phone,
            current_expiry,
            address,
            procedure_code,
            deadline,
        })
    }
}

/// Parse a `DD/MM/YYYY` date, mapping mismatches to a format error.
pub fn parse_date(s: &str, what: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|_| ValidationError::Format(format!("{what} {s:?} is not a DD/MM/YYYY date")))
}

#[cfg(test)]
#[path = "applicant_test.rs"]
mod applicant_test;
