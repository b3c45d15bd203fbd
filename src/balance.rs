use indexmap::IndexMap;
use tracing::debug;

use crate::error::InvalidExpense;
use crate::schemas::{Expense, Person, PersonId};

/// Net position per person: positive is owed money, negative owes money.
/// Iteration follows the order of the people slice it was built from.
pub type Balances = IndexMap<PersonId, f64>;

/// Checks the preconditions the ledger relies on. `people` must be the
/// people of the expense's trip.
pub fn validate_expense(expense: &Expense, people: &[Person]) -> Result<(), InvalidExpense> {
    if !expense.amount.is_finite() || expense.amount <= 0.0 {
        return Err(InvalidExpense::NonPositiveAmount(expense.amount));
    }
    if expense.participants.is_empty() {
        return Err(InvalidExpense::NoParticipants);
    }
    check_member(expense, people, expense.payer_id).map_err(|err| match err {
        InvalidExpense::UnknownParticipant(id) => InvalidExpense::UnknownPayer(id),
        other => other,
    })?;
    for &participant in &expense.participants {
        check_member(expense, people, participant)?;
    }
    Ok(())
}

fn check_member(expense: &Expense, people: &[Person], id: PersonId) -> Result<(), InvalidExpense> {
    match people.iter().find(|person| person.id == id) {
        None => Err(InvalidExpense::UnknownParticipant(id)),
        Some(person) if person.trip_id != expense.trip_id => Err(InvalidExpense::CrossTrip {
            person: id,
            expected: expense.trip_id,
            found: person.trip_id,
        }),
        Some(_) => Ok(()),
    }
}

pub fn compute_balances(people: &[Person], expenses: &[Expense]) -> Result<Balances, InvalidExpense> {
    let mut balance: Balances = people.iter().map(|person| (person.id, 0.0)).collect();
    for expense in expenses {
        validate_expense(expense, people)?;
        let amount = expense.amount;
        *balance.entry(expense.payer_id).or_insert(0.0) += amount;
        let amount_per_participant = expense.share();
        for participant in &expense.participants {
            *balance.entry(*participant).or_insert(0.0) -= amount_per_participant;
        }
    }
    debug!(
        people = people.len(),
        expenses = expenses.len(),
        "computed balances"
    );
    Ok(balance)
}

/// Largest magnitude in the map, used to scale relative displays.
pub fn max_abs_balance(balances: &Balances) -> f64 {
    balances.values().map(|b| b.abs()).fold(0.0, f64::max)
}
