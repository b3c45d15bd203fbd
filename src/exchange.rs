use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

use crate::balance::Balances;
use crate::schemas::PersonId;

/// Balances and remaining debts at or below this are considered settled.
pub const EPSILON: f64 = 0.01;

#[derive(Clone, Debug)]
pub struct PersonalBalance {
    pub id: PersonId,
    /// Magnitude in cents.
    pub balance: i64,
}

/// A single transfer: `from` pays `amount` to `to`.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Exchange {
    pub from: PersonId,
    pub to: PersonId,
    pub amount: f64,
}

fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

fn from_cents(cents: i64) -> f64 {
    cents as f64 / 100.0
}

pub fn round_to_2_decimals(n: f64) -> f64 {
    from_cents(to_cents(n))
}

// Splits balances into debtors and creditors (both as positive magnitudes in
// cents), largest first. The sort is stable so ties keep the ledger's order.
fn split_debtors_and_creditors(
    balances: &Balances,
) -> (Vec<PersonalBalance>, Vec<PersonalBalance>) {
    let mut debtors = Vec::new();
    let mut creditors = Vec::new();

    for (&id, &balance) in balances {
        if balance < -EPSILON {
            debtors.push(PersonalBalance {
                id,
                balance: to_cents(balance.abs()),
            });
        } else if balance > EPSILON {
            creditors.push(PersonalBalance {
                id,
                balance: to_cents(balance),
            });
        }
    }

    debtors.sort_by(|a, b| b.balance.cmp(&a.balance));
    creditors.sort_by(|a, b| b.balance.cmp(&a.balance));
    (debtors, creditors)
}

/// Greedy settlement: each debtor, largest first, pays the creditor at the
/// front of the queue until their debt is gone. Not minimal in the number of
/// transfers, but never emits more than `debtors + creditors - 1`.
///
/// Balances are rounded to cents once, up front, and matched in whole cents,
/// so nobody is asked to pay or receive more than their rounded balance.
pub fn plan_settlement(balances: &Balances) -> Vec<Exchange> {
    let (debtors, creditors) = split_debtors_and_creditors(balances);
    let mut creditors: VecDeque<PersonalBalance> = creditors.into();
    let mut exchanges = Vec::new();
    let epsilon_cents = to_cents(EPSILON);

    for debtor in debtors {
        let mut remaining_debt = debtor.balance;

        while remaining_debt > epsilon_cents {
            let Some(creditor) = creditors.front_mut() else {
                break;
            };
            let receiver = creditor.id;

            // A creditor left with a single cent stays queued and is paid it
            let paid = if creditor.balance <= remaining_debt {
                let paid = creditor.balance;
                creditors.pop_front();
                paid
            } else {
                let paid = remaining_debt;
                creditor.balance -= paid;
                paid
            };
            remaining_debt -= paid;

            exchanges.push(Exchange {
                from: debtor.id,
                to: receiver,
                amount: from_cents(paid),
            });
        }
    }

    debug!(exchanges = exchanges.len(), "planned settlement");
    exchanges
}

/// Balances after every exchange is carried out: payers move up, receivers
/// move down.
pub fn apply_exchanges(balances: &Balances, exchanges: &[Exchange]) -> Balances {
    let mut settled = balances.clone();
    for exchange in exchanges {
        *settled.entry(exchange.from).or_insert(0.0) += exchange.amount;
        *settled.entry(exchange.to).or_insert(0.0) -= exchange.amount;
    }
    settled
}
