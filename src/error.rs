use crate::schemas::{ExpenseId, PersonId, TripId};

/// An expense that cannot be split. The ledger refuses these instead of
/// producing NaN balances.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum InvalidExpense {
    #[error("expense has no participants")]
    NoParticipants,
    #[error("expense amount must be a positive number, got {0}")]
    NonPositiveAmount(f64),
    #[error("expense description must not be empty")]
    EmptyDescription,
    #[error("payer {0} is not part of this trip")]
    UnknownPayer(PersonId),
    #[error("participant {0} is not part of this trip")]
    UnknownParticipant(PersonId),
    #[error("person {person} belongs to trip {found}, not {expected}")]
    CrossTrip {
        person: PersonId,
        expected: TripId,
        found: TripId,
    },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("trip {0} not found")]
    TripNotFound(TripId),
    #[error("person {0} not found")]
    PersonNotFound(PersonId),
    #[error("expense {0} not found")]
    ExpenseNotFound(ExpenseId),
    #[error("trip name must not be empty")]
    EmptyTripName,
    #[error("person name must not be empty")]
    EmptyPersonName,
    #[error(transparent)]
    InvalidExpense(#[from] InvalidExpense),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::TripNotFound(_)
                | StoreError::PersonNotFound(_)
                | StoreError::ExpenseNotFound(_)
        )
    }
}

/// Errors raised while reading the service configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}
