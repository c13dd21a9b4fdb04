//! Parsed view of one wizard response.
//!
//! The wizard is plain server-rendered HTML; each response carries the
//! hidden continuation tokens the next post must echo, plus whatever
//! the current step offers (offices, slots, the final confirmation
//! code). Only the shapes extracted here are part of the core's
//! contract; anything else on the page is ignored.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use crate::applicant::DATE_FORMAT;
use crate::errors::BookingError;

/// Sentinel substring shown when no appointments exist at the current
/// scope (everywhere on the offices page, one office on the slots page).
const NO_AVAILABILITY_SENTINEL: &str = "En este momento no hay citas disponibles";
/// Sentinel substring of the overload error page.
const SERVICE_UNAVAILABLE_SENTINEL: &str = "Service Unavailable";
/// Sentinel substring of the CAPTCHA wall.
const CAPTCHA_SENTINEL: &str = "Captcha";
/// Field id present when the server demands an SMS code.
const SMS_FIELD_SENTINEL: &str = "txtCodigoVerificacion";

lazy_static! {
    static ref HIDDEN_INPUT: Regex = Regex::new(r#"<input[^>]*type="hidden"[^>]*>"#).unwrap();
    static ref NAME_ATTR: Regex = Regex::new(r#"name="([^"]*)""#).unwrap();
    static ref VALUE_ATTR: Regex = Regex::new(r#"value="([^"]*)""#).unwrap();
    static ref OFFICE_SELECT: Regex =
        Regex::new(r#"(?s)<select[^>]*id="idSede"[^>]*>(.*?)</select>"#).unwrap();
    static ref OFFICE_OPTION: Regex =
        Regex::new(r#"(?s)<option[^>]*value="(\d+)"[^>]*>\s*(.*?)\s*</option>"#).unwrap();
    static ref SLOT_RADIO: Regex =
        Regex::new(r#"(?s)name="rdbCita"[^>]*value="([^"]+)"[^>]*>.{0,200}?(\d{2}/\d{2}/\d{4})"#)
            .unwrap();
    static ref CONFIRMATION_CODE: Regex =
        Regex::new(r#"id="justificanteFinal"[^>]*>\s*([A-Za-z0-9]+)\s*<"#).unwrap();
}

/// One physical office as offered by the server. Ephemeral; re-parsed
/// from every offices page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Office {
    pub id: String,
    pub name: String,
}

/// One appointment slot as offered by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub id: String,
    pub date: NaiveDate,
}

/// One rendered wizard response.
#[derive(Debug, Clone)]
pub struct WizardPage {
    html: String,
}

impl WizardPage {
    pub fn new(html: String) -> Self {
        WizardPage { html }
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// Overloaded-server error page.
    pub fn is_service_unavailable(&self) -> bool {
        self.html.contains(SERVICE_UNAVAILABLE_SENTINEL)
    }

    /// "No appointments" message at whatever scope this page covers.
    pub fn has_no_availability(&self) -> bool {
        self.html.contains(NO_AVAILABILITY_SENTINEL)
    }

    /// Server put up a CAPTCHA wall we cannot answer.
    pub fn has_captcha_wall(&self) -> bool {
        self.html.contains(CAPTCHA_SENTINEL)
    }

    /// Server demands an SMS verification code on the next post.
    pub fn wants_sms_code(&self) -> bool {
        self.html.contains(SMS_FIELD_SENTINEL)
    }

    /// Hidden continuation tokens the next step must echo back.
    pub fn continuation_tokens(&self) -> Result<Vec<(String, String)>, BookingError> {
        let mut tokens = Vec::new();
        for tag in HIDDEN_INPUT.find_iter(&self.html) {
            let tag = tag.as_str();
            let name = NAME_ATTR.captures(tag).map(|c| c[1].to_string());
            let value = VALUE_ATTR.captures(tag).map(|c| c[1].to_string());
            if let (Some(name), Some(value)) = (name, value) {
                tokens.push((name, value));
            }
        }
        if tokens.is_empty() {
            return Err(BookingError::Extraction(
                "no hidden continuation tokens on page".to_string(),
            ));
        }
        Ok(tokens)
    }

    /// Offices enumerated on the office-selection page, in server order.
    pub fn offered_offices(&self) -> Result<Vec<Office>, BookingError> {
        let select = OFFICE_SELECT
            .captures(&self.html)
            .ok_or_else(|| BookingError::Extraction("office list not found on page".to_string()))?;
        let offices: Vec<Office> = OFFICE_OPTION
            .captures_iter(&select[1])
            .map(|c| Office {
                id: c[1].to_string(),
                name: c[2].to_string(),
            })
            .collect();
        if offices.is_empty() {
            return Err(BookingError::Extraction(
                "office list on page has no entries".to_string(),
            ));
        }
        Ok(offices)
    }

    /// Slots enumerated on the slot-selection page, in server order.
    /// The server sends them earliest-first; see
    /// [`crate::selection::select_slot`] for where that matters.
    pub fn offered_slots(&self) -> Result<Vec<Slot>, BookingError> {
        let mut slots = Vec::new();
        for c in SLOT_RADIO.captures_iter(&self.html) {
            let date = NaiveDate::parse_from_str(&c[2], DATE_FORMAT).map_err(|_| {
                BookingError::Extraction(format!("slot date {:?} is not parseable", &c[2]))
            })?;
            slots.push(Slot {
                id: c[1].to_string(),
                date,
            });
        }
        if slots.is_empty() {
            return Err(BookingError::Extraction(
                "no appointment slots found on page".to_string(),
            ));
        }
        Ok(slots)
    }

    /// Confirmation code from the final page. Absence is fatal: the
    /// booking may or may not have been recorded server-side.
    pub fn confirmation_code(&self) -> Result<String, BookingError> {
        CONFIRMATION_CODE
            .captures(&self.html)
            .map(|c| c[1].to_string())
            .ok_or_else(|| {
                BookingError::Extraction("confirmation code not found on final page".to_string())
            })
    }
}

#[cfg(test)]
#[path = "page_test.rs"]
mod page_test;
