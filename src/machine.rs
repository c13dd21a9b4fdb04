//! The booking state machine: one sequential flow per applicant.
//!
//! Drives the fixed step sequence over an abstract [`Transport`], holds
//! the per-attempt state, and sorts every failure into exactly one of
//! three classes: office-level (retry immediately against the next
//! office, same session), attempt-level (tear the session down, cool
//! down, start over) or fatal (propagate; the response shape is not one
//! we can retry against safely).

use std::collections::HashSet;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::applicant::{Applicant, DATE_FORMAT};
use crate::distance::{DistanceLookup, DistanceResolver};
use crate::errors::{BookingError, RetryClass};
use crate::page::{Office, Slot};
use crate::selection::{select_office, select_slot};
use crate::tables::Tables;
use crate::transport::{Step, Transport};
use crate::verify::{VerificationGate, VerificationInput};

/// Mutable state of one in-flight attempt. Constructed fresh per
/// engine; never shared between applicants.
#[derive(Debug, Default)]
pub struct SessionContext {
    rejected_offices: HashSet<String>,
    chosen_office: Option<Office>,
    chosen_slot: Option<Slot>,
}

impl SessionContext {
    /// Clear everything; runs when a top-level retry fires.
    fn reset(&mut self) {
        self.rejected_offices.clear();
        self.chosen_office = None;
        self.chosen_slot = None;
    }

    pub fn rejected_offices(&self) -> &HashSet<String> {
        &self.rejected_offices
    }

    pub fn chosen_office(&self) -> Option<&Office> {
        self.chosen_office.as_ref()
    }

    pub fn chosen_slot(&self) -> Option<&Slot> {
        self.chosen_slot.as_ref()
    }
}

pub struct BookingEngine<T, L, V> {
    transport: T,
    resolver: DistanceResolver<L>,
    gate: VerificationGate<V>,
    applicant: Applicant,
    tables: Tables,
    cooldown: Duration,
    ctx: SessionContext,
}

impl<T, L, V> BookingEngine<T, L, V>
where
    T: Transport,
    L: DistanceLookup,
    V: VerificationInput,
{
    pub fn new(
        transport: T,
        resolver: DistanceResolver<L>,
        gate: VerificationGate<V>,
        applicant: Applicant,
        tables: Tables,
        cooldown: Duration,
    ) -> Self {
        BookingEngine {
            transport,
            resolver,
            gate,
            applicant,
            tables,
            cooldown,
            ctx: SessionContext::default(),
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Retry until an appointment is recorded, a fatal failure
    /// propagates, or `shutdown` fires. Returns the server-issued
    /// confirmation code.
    pub async fn run(
        &mut self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<String, BookingError> {
        loop {
            if *shutdown.borrow_and_update() {
                return Err(BookingError::Cancelled);
            }
            info!("starting booking attempt");
            match self.run_attempt().await {
                Ok(code) => {
                    info!(code = %code, "appointment recorded");
                    return Ok(code);
                }
                Err(e) => match e.retry_class() {
                    RetryClass::Office => {
                        // same session, next office; no waiting
                        warn!(error = %e, "office rejected, selecting another");
                    }
                    RetryClass::Attempt => {
                        warn!(
                            error = %e,
                            cooldown_secs = self.cooldown.as_secs(),
                            "attempt failed, restarting after cooldown"
                        );
                        self.ctx.reset();
                        self.transport.reset().await?;
                        self.cooldown_sleep(shutdown).await?;
                    }
                    RetryClass::Fatal => return Err(e),
                },
            }
        }
    }

    /// One full pass through the wizard: from a session start to either
    /// a confirmation code or a classified failure.
    pub async fn run_attempt(&mut self) -> Result<String, BookingError> {
        let applicant = self.applicant.clone();

        let page = self.transport.begin().await?;
        if page.is_service_unavailable() {
            return Err(BookingError::AttemptFailed(
                "service unavailable at session start".to_string(),
            ));
        }

        let fields = vec![
            ("sede".to_string(), "99".to_string()),
            ("tramiteGrupo[0]".to_string(), applicant.procedure_code.clone()),
        ];
        self.transport.submit(Step::SelectProcedure, &fields).await?;

        self.transport.submit(Step::AcknowledgeInfo, &[]).await?;

        let fields = vec![
            ("rdbTipoDoc".to_string(), "N.I.E.".to_string()),
            ("txtIdCitado".to_string(), applicant.document_number.clone()),
            ("txtDesCitado".to_string(), applicant.full_name.clone()),
            ("txtPaisNac".to_string(), applicant.country_code.clone()),
            ("txtFecha".to_string(), applicant.current_expiry.clone()),
        ];
        self.transport.submit(Step::SubmitIdentity, &fields).await?;

        let offices_page = self.transport.submit(Step::ValidateEntry, &[]).await?;
        if offices_page.is_service_unavailable() {
            return Err(BookingError::AttemptFailed(
                "service became unavailable mid-attempt".to_string(),
            ));
        }
        if offices_page.has_no_availability() {
            return Err(BookingError::AttemptFailed(
                "no appointments available anywhere".to_string(),
            ));
        }
        let offered = offices_page.offered_offices()?;
        self.log_new_offices(&offered);

        let candidates: Vec<String> = offered
            .iter()
            .filter(|office| !self.ctx.rejected_offices.contains(&office.id))
            .map(|office| office.name.clone())
            .collect();
        let distances = self
            .resolver
            .resolve(&applicant.address, &candidates)
            .await?;

        let office = match select_office(&offered, &self.ctx.rejected_offices, &distances) {
            Some(office) => office.clone(),
            None => {
                return Err(BookingError::AttemptFailed(
                    "all offered offices exhausted".to_string(),
                ));
            }
        };
        info!(office = %office.name, id = %office.id, "selected nearest office");
        self.ctx.rejected_offices.insert(office.id.clone());
        self.ctx.chosen_office = Some(office.clone());

        let fields = vec![("idSede".to_string(), office.id.clone())];
        self.transport.submit(Step::ChooseOffice, &fields).await?;

        let fields = vec![
            ("txtTelefonoCitado".to_string(), applicant.phone.clone()),
            ("txtMailCitado".to_string(), applicant.email.clone()),
            ("emailDOS".to_string(), applicant.email.clone()),
        ];
        let slots_page = self.transport.submit(Step::SubmitContact, &fields).await?;
        if slots_page.is_service_unavailable() {
            return Err(BookingError::AttemptFailed(
                "service became unavailable mid-attempt".to_string(),
            ));
        }
        if slots_page.has_no_availability() {
            return Err(BookingError::OfficeUnavailable(format!(
                "no slots at {}",
                office.name
            )));
        }
        let slots = slots_page.offered_slots()?;
        let slot = match select_slot(&slots, applicant.deadline) {
            Some(slot) => slot.clone(),
            None => {
                return Err(BookingError::OfficeUnavailable(format!(
                    "no slot at {} on or before {}",
                    office.name,
                    applicant.deadline.format(DATE_FORMAT)
                )));
            }
        };
        info!(slot = %slot.id, date = %slot.date.format(DATE_FORMAT), "selected earliest slot within deadline");
        self.ctx.chosen_slot = Some(slot.clone());

        let fields = vec![("rdbCita".to_string(), slot.id.clone())];
        let verify_page = self.transport.submit(Step::ChooseSlot, &fields).await?;

        let mut fields = vec![
            ("chkTotal".to_string(), "1".to_string()),
            ("enviarCorreo".to_string(), "on".to_string()),
        ];
        if let Some(code) = self.gate.clear(&verify_page).await? {
            fields.push(("txtCodigoVerificacion".to_string(), code));
        }
        let final_page = self.transport.submit(Step::ConfirmBooking, &fields).await?;

        final_page.confirmation_code()
    }

    /// The server occasionally lists offices we have no table entry
    /// for; worth surfacing so the table can be extended.
    fn log_new_offices(&self, offered: &[Office]) {
        for office in offered {
            let known = office
                .id
                .parse::<u32>()
                .is_ok_and(|id| self.tables.offices.contains_code(id));
            if !known {
                info!(id = %office.id, name = %office.name, "server offered an unlisted office");
            }
        }
    }

    /// Cancellable cooldown between attempts. Never a busy loop; fires
    /// `Cancelled` as soon as `shutdown` flips.
    async fn cooldown_sleep(
        &self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), BookingError> {
        tokio::select! {
            _ = tokio::time::sleep(self.cooldown) => Ok(()),
            _ = shutdown.changed() => Err(BookingError::Cancelled),
        }
    }
}

#[cfg(test)]
#[path = "machine_test.rs"]
mod machine_test;
