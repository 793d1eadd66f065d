//! Selection and trip form. Binds the UI selection to a roster index and
//! keeps generation locked until the PIN gate reports success.

use chrono::{Datelike, NaiveDate};
use std::time::{Duration, Instant};

use crate::document::ConsentInput;
use crate::error::{OutingError, Result};
use crate::gate::{PinGate, PinStatus};
use crate::model::StudentRecord;
use crate::roster::RosterManager;
use crate::store::KvBackend;

/// Selection value reserved for the disabled "choose a student" entry.
pub const PLACEHOLDER_SELECTION: usize = 0;

pub fn format_date(date: NaiveDate, separator: &str) -> String {
    format!(
        "{}{sep}{}{sep}{}",
        date.day(),
        date.month(),
        date.year(),
        sep = separator
    )
}

fn parse_form_date(field: &'static str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| OutingError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripForm {
    pub out_date: String,
    pub in_date: String,
    pub outing_type: String,
}

impl TripForm {
    fn require_all(&self) -> Result<()> {
        if self.out_date.trim().is_empty() {
            return Err(OutingError::MissingField("outDate"));
        }
        if self.in_date.trim().is_empty() {
            return Err(OutingError::MissingField("inDate"));
        }
        if self.outing_type.trim().is_empty() {
            return Err(OutingError::MissingField("outingType"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    selected: Option<usize>,
    pin: PinGate,
}

impl SelectionController {
    pub fn new(retry_delay: Duration) -> Self {
        Self {
            selected: None,
            pin: PinGate::new(retry_delay),
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// UI selection value: 0 for the placeholder, index + 1 otherwise.
    pub fn selection_value(&self) -> usize {
        self.selected.map(|i| i + 1).unwrap_or(PLACEHOLDER_SELECTION)
    }

    pub fn pin_gate(&self) -> &PinGate {
        &self.pin
    }

    pub fn set_retry_delay(&mut self, retry_delay: Duration) {
        self.pin.set_retry_delay(retry_delay);
    }

    pub fn fields_enabled(&self) -> bool {
        self.selected.is_some() && self.pin.is_unlocked()
    }

    pub fn select_value<K: KvBackend>(
        &mut self,
        value: usize,
        roster: &RosterManager<K>,
    ) -> Result<Option<usize>> {
        if value == PLACEHOLDER_SELECTION {
            self.clear();
            return Ok(None);
        }
        self.select_index(value - 1, roster).map(Some)
    }

    pub fn select_index<K: KvBackend>(
        &mut self,
        index: usize,
        roster: &RosterManager<K>,
    ) -> Result<usize> {
        roster.get(index)?;
        self.selected = Some(index);
        self.pin.begin();
        Ok(index)
    }

    pub fn clear(&mut self) {
        self.selected = None;
        self.pin.clear();
    }

    /// The selected record changed underneath us; start a fresh challenge.
    pub fn restart_challenge(&mut self) {
        if self.selected.is_some() {
            self.pin.begin();
        }
    }

    pub fn tick(&mut self, now: Instant) -> bool {
        self.pin.tick(now)
    }

    pub fn enter_digit<K: KvBackend>(
        &mut self,
        digit: char,
        roster: &RosterManager<K>,
        now: Instant,
    ) -> Result<PinStatus> {
        let record = self.selected_record(roster)?;
        let expected = record.configured_pin().map(str::to_string);
        self.pin.enter_digit(digit, expected.as_deref(), now)
    }

    pub fn backspace(&mut self) -> PinStatus {
        self.pin.backspace()
    }

    pub fn selected_record<'r, K: KvBackend>(
        &self,
        roster: &'r RosterManager<K>,
    ) -> Result<&'r StudentRecord> {
        let index = self.selected.ok_or(OutingError::NoSelection)?;
        roster.get(index)
    }

    /// Validates the trip form and resolves everything the renderer needs.
    pub fn generate<K: KvBackend>(
        &self,
        form: &TripForm,
        roster: &RosterManager<K>,
        today: NaiveDate,
    ) -> Result<ConsentInput> {
        if self.selected.is_none() {
            return Err(OutingError::NoSelection);
        }
        if !self.pin.is_unlocked() {
            return Err(OutingError::GenerationLocked);
        }
        form.require_all()?;
        let student = self.selected_record(roster)?.clone();
        let out_date = parse_form_date("outDate", &form.out_date)?;
        let in_date = parse_form_date("inDate", &form.in_date)?;

        Ok(ConsentInput {
            student,
            out_date: format_date(out_date, "."),
            in_date: format_date(in_date, "."),
            today: format_date(today, "-"),
            outing_type: form.outing_type.trim().to_string(),
        })
    }
}
