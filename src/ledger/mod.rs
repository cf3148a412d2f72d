//! Seat-capacity bookkeeping for trips and their reservations.
//!
//! Every seat mutation in the application goes through this module: handlers
//! load the trip row, apply one of these pure transitions, and persist the
//! result inside the same database transaction. Keeping the rules here means
//! the status/counter coupling lives in exactly one place instead of being
//! re-derived at each call site.

use thiserror::Error;

use crate::entities::reservation::ReservationStatus;
use crate::entities::trip::{self, TripStatus};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Trip is not available")]
    TripUnavailable,
    #[error("Not enough seats available")]
    InsufficientSeats,
    #[error("Reservation was already cancelled")]
    ReservationClosed,
    #[error("Only pending reservations can be rejected")]
    NotPending,
}

/// Recompute a trip's status from its seat counter.
///
/// The rule is one-directional: `cancelled` and `completed` are terminal and
/// are never overwritten, no matter what the counter says.
pub fn derive_status(seats_available: i32, status: TripStatus) -> TripStatus {
    match status {
        TripStatus::Scheduled if seats_available == 0 => TripStatus::Full,
        TripStatus::Full if seats_available > 0 => TripStatus::Scheduled,
        other => other,
    }
}

/// The capacity view of a trip: total seats, remaining seats, and lifecycle
/// status, kept mutually consistent by the methods below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatLedger {
    pub seats_total: i32,
    pub seats_available: i32,
    pub status: TripStatus,
}

impl SeatLedger {
    pub fn new(seats_total: i32, seats_available: i32, status: TripStatus) -> Self {
        Self {
            seats_total,
            seats_available,
            status,
        }
    }

    pub fn from_trip(trip: &trip::Model) -> Self {
        Self::new(trip.seats_total, trip.seats_available, trip.status.clone())
    }

    /// Take seats for a new reservation. Fails without touching the ledger
    /// when the trip is no longer live or the seats aren't there.
    pub fn reserve(&mut self, seats: i32) -> Result<(), LedgerError> {
        if matches!(self.status, TripStatus::Cancelled | TripStatus::Completed) {
            return Err(LedgerError::TripUnavailable);
        }
        if seats > self.seats_available {
            return Err(LedgerError::InsufficientSeats);
        }
        self.seats_available -= seats;
        self.status = derive_status(self.seats_available, self.status.clone());
        Ok(())
    }

    /// Return seats released by a rejected or cancelled reservation. Capped
    /// at the trip's total so repeated releases can never overflow capacity.
    pub fn release(&mut self, seats: i32) {
        self.seats_available = (self.seats_available + seats).min(self.seats_total);
        self.status = derive_status(self.seats_available, self.status.clone());
    }

    /// Trip cancellation: no seats remain sellable and the status is final.
    pub fn close(&mut self) {
        self.status = TripStatus::Cancelled;
        self.seats_available = 0;
    }
}

/// Outcome of a reservation state transition: either the caller applies the
/// new state (and any seat release), or the reservation is already where the
/// transition would put it and nothing must change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Apply,
    Noop,
}

/// Driver confirms a pending reservation. Confirming twice is a no-op;
/// confirming a reservation that was cancelled or rejected is an error.
pub fn confirm_transition(status: &ReservationStatus) -> Result<Transition, LedgerError> {
    match status {
        ReservationStatus::Pending => Ok(Transition::Apply),
        ReservationStatus::Confirmed => Ok(Transition::Noop),
        ReservationStatus::Cancelled | ReservationStatus::Rejected => {
            Err(LedgerError::ReservationClosed)
        }
    }
}

/// Driver rejects a pending reservation. Rejecting an already-terminal
/// reservation is a no-op; a confirmed reservation can only be cancelled.
pub fn reject_transition(status: &ReservationStatus) -> Result<Transition, LedgerError> {
    match status {
        ReservationStatus::Pending => Ok(Transition::Apply),
        ReservationStatus::Rejected | ReservationStatus::Cancelled => Ok(Transition::Noop),
        ReservationStatus::Confirmed => Err(LedgerError::NotPending),
    }
}

/// Cancellation works from either live state and is idempotent on terminal
/// ones, so it never fails.
pub fn cancel_transition(status: &ReservationStatus) -> Transition {
    match status {
        ReservationStatus::Cancelled | ReservationStatus::Rejected => Transition::Noop,
        ReservationStatus::Pending | ReservationStatus::Confirmed => Transition::Apply,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduled(total: i32, available: i32) -> SeatLedger {
        SeatLedger::new(total, available, TripStatus::Scheduled)
    }

    #[test]
    fn derive_status_flips_between_scheduled_and_full() {
        assert_eq!(derive_status(0, TripStatus::Scheduled), TripStatus::Full);
        assert_eq!(derive_status(2, TripStatus::Full), TripStatus::Scheduled);
        assert_eq!(derive_status(2, TripStatus::Scheduled), TripStatus::Scheduled);
        assert_eq!(derive_status(0, TripStatus::Full), TripStatus::Full);
    }

    #[test]
    fn derive_status_never_revives_terminal_trips() {
        assert_eq!(derive_status(3, TripStatus::Cancelled), TripStatus::Cancelled);
        assert_eq!(derive_status(0, TripStatus::Cancelled), TripStatus::Cancelled);
        assert_eq!(derive_status(3, TripStatus::Completed), TripStatus::Completed);
        assert_eq!(derive_status(0, TripStatus::Completed), TripStatus::Completed);
    }

    #[test]
    fn reserving_exact_capacity_fills_the_trip() {
        let mut ledger = scheduled(3, 3);
        ledger.reserve(3).unwrap();
        assert_eq!(ledger.seats_available, 0);
        assert_eq!(ledger.status, TripStatus::Full);
    }

    #[test]
    fn reserving_part_of_capacity_stays_scheduled() {
        let mut ledger = scheduled(4, 4);
        ledger.reserve(2).unwrap();
        assert_eq!(ledger.seats_available, 2);
        assert_eq!(ledger.status, TripStatus::Scheduled);
    }

    #[test]
    fn reserve_fails_when_seats_are_gone() {
        let mut ledger = scheduled(2, 2);
        ledger.reserve(2).unwrap();
        // The racing second caller sees the decremented counter.
        let err = ledger.reserve(2).unwrap_err();
        assert_eq!(err, LedgerError::InsufficientSeats);
        assert_eq!(ledger.seats_available, 0);
        assert_eq!(ledger.status, TripStatus::Full);
    }

    #[test]
    fn reserve_fails_on_cancelled_or_completed_trips() {
        let mut cancelled = SeatLedger::new(3, 3, TripStatus::Cancelled);
        assert_eq!(cancelled.reserve(1).unwrap_err(), LedgerError::TripUnavailable);

        let mut completed = SeatLedger::new(3, 3, TripStatus::Completed);
        assert_eq!(completed.reserve(1).unwrap_err(), LedgerError::TripUnavailable);
        // Failed reservations leave the ledger untouched.
        assert_eq!(completed.seats_available, 3);
    }

    #[test]
    fn release_reopens_a_full_trip() {
        let mut ledger = scheduled(3, 3);
        ledger.reserve(3).unwrap();
        ledger.release(3);
        assert_eq!(ledger.seats_available, 3);
        assert_eq!(ledger.status, TripStatus::Scheduled);
    }

    #[test]
    fn release_is_capped_at_total_capacity() {
        let mut ledger = scheduled(3, 2);
        ledger.release(5);
        assert_eq!(ledger.seats_available, 3);
    }

    #[test]
    fn release_does_not_reopen_a_cancelled_trip() {
        let mut ledger = SeatLedger::new(3, 0, TripStatus::Cancelled);
        ledger.release(2);
        assert_eq!(ledger.status, TripStatus::Cancelled);
    }

    #[test]
    fn close_zeroes_seats_and_cancels() {
        let mut ledger = scheduled(4, 1);
        ledger.close();
        assert_eq!(ledger.seats_available, 0);
        assert_eq!(ledger.status, TripStatus::Cancelled);
    }

    #[test]
    fn seat_sum_invariant_holds_through_a_booking_sequence() {
        let mut ledger = scheduled(4, 4);
        let mut active_seats = 0;

        ledger.reserve(2).unwrap();
        active_seats += 2;
        ledger.reserve(1).unwrap();
        active_seats += 1;
        assert_eq!(ledger.seats_total - ledger.seats_available, active_seats);

        // Rejecting the two-seat reservation returns its seats exactly once.
        ledger.release(2);
        active_seats -= 2;
        assert_eq!(ledger.seats_total - ledger.seats_available, active_seats);
        assert!(ledger.seats_available <= ledger.seats_total);
        assert!(ledger.seats_available >= 0);
    }

    #[test]
    fn confirm_is_idempotent_and_rejects_terminal_states() {
        assert_eq!(
            confirm_transition(&ReservationStatus::Pending).unwrap(),
            Transition::Apply
        );
        assert_eq!(
            confirm_transition(&ReservationStatus::Confirmed).unwrap(),
            Transition::Noop
        );
        assert_eq!(
            confirm_transition(&ReservationStatus::Cancelled).unwrap_err(),
            LedgerError::ReservationClosed
        );
        assert_eq!(
            confirm_transition(&ReservationStatus::Rejected).unwrap_err(),
            LedgerError::ReservationClosed
        );
    }

    #[test]
    fn reject_only_applies_to_pending_reservations() {
        assert_eq!(
            reject_transition(&ReservationStatus::Pending).unwrap(),
            Transition::Apply
        );
        assert_eq!(
            reject_transition(&ReservationStatus::Rejected).unwrap(),
            Transition::Noop
        );
        assert_eq!(
            reject_transition(&ReservationStatus::Cancelled).unwrap(),
            Transition::Noop
        );
        assert_eq!(
            reject_transition(&ReservationStatus::Confirmed).unwrap_err(),
            LedgerError::NotPending
        );
    }

    #[test]
    fn cancel_applies_to_both_live_states_and_is_idempotent() {
        assert_eq!(
            cancel_transition(&ReservationStatus::Pending),
            Transition::Apply
        );
        assert_eq!(
            cancel_transition(&ReservationStatus::Confirmed),
            Transition::Apply
        );
        assert_eq!(
            cancel_transition(&ReservationStatus::Cancelled),
            Transition::Noop
        );
        assert_eq!(
            cancel_transition(&ReservationStatus::Rejected),
            Transition::Noop
        );
    }

    #[test]
    fn full_trip_reject_then_rebook_round_trip() {
        // Scenario: a three-seat trip is fully booked, the driver rejects the
        // reservation, and a different passenger books the freed seats.
        let mut ledger = scheduled(3, 3);
        ledger.reserve(3).unwrap();
        assert_eq!(ledger.status, TripStatus::Full);

        assert_eq!(
            reject_transition(&ReservationStatus::Pending).unwrap(),
            Transition::Apply
        );
        ledger.release(3);
        assert_eq!(ledger.seats_available, 3);
        assert_eq!(ledger.status, TripStatus::Scheduled);

        ledger.reserve(2).unwrap();
        assert_eq!(ledger.seats_available, 1);
    }
}
