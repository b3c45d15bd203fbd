use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;

use crate::schemas::{Category, Expense, Person, PersonId};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub amount: f64,
    /// Share of the trip total, 0-100.
    pub percentage: f64,
}

/// How much one person has fronted for the group.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    pub person_id: PersonId,
    pub total_paid: f64,
    pub share_of_total: f64,
    pub payments: usize,
    /// Payment count relative to the most frequent payer, 0-100.
    pub relative_frequency: f64,
}

fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

pub fn trip_total(expenses: &[Expense]) -> f64 {
    expenses.iter().map(|expense| expense.amount).sum()
}

/// Sum per category, largest first. Categories with no expenses are left out.
pub fn category_totals(expenses: &[Expense]) -> Vec<CategoryTotal> {
    let mut by_category: IndexMap<Category, f64> = IndexMap::new();
    for expense in expenses {
        *by_category.entry(expense.category).or_insert(0.0) += expense.amount;
    }
    let total = trip_total(expenses);

    let mut totals: Vec<CategoryTotal> = by_category
        .into_iter()
        .map(|(category, amount)| CategoryTotal {
            category,
            amount,
            percentage: percent_of(amount, total),
        })
        .collect();
    totals.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    totals
}

/// Number of expenses each person paid for, zero included.
pub fn payment_frequency(people: &[Person], expenses: &[Expense]) -> IndexMap<PersonId, usize> {
    let mut frequency: IndexMap<PersonId, usize> =
        people.iter().map(|person| (person.id, 0)).collect();
    for expense in expenses {
        *frequency.entry(expense.payer_id).or_insert(0) += 1;
    }
    frequency
}

/// The person with the most payments; the earliest one wins a tie.
pub fn most_active_payer(frequency: &IndexMap<PersonId, usize>) -> Option<PersonId> {
    let mut best: Option<(PersonId, usize)> = None;
    for (&id, &count) in frequency {
        if count > best.map_or(0, |(_, top)| top) {
            best = Some((id, count));
        }
    }
    best.map(|(id, _)| id)
}

pub fn non_payers(people: &[Person], expenses: &[Expense]) -> Vec<Person> {
    let payers: HashSet<PersonId> = expenses.iter().map(|expense| expense.payer_id).collect();
    people
        .iter()
        .filter(|person| !payers.contains(&person.id))
        .cloned()
        .collect()
}

pub fn contributions(people: &[Person], expenses: &[Expense]) -> Vec<Contribution> {
    let total = trip_total(expenses);
    let frequency = payment_frequency(people, expenses);
    let max_frequency = frequency.values().copied().max().unwrap_or(0);

    people
        .iter()
        .map(|person| {
            let total_paid: f64 = expenses
                .iter()
                .filter(|expense| expense.payer_id == person.id)
                .map(|expense| expense.amount)
                .sum();
            let payments = frequency.get(&person.id).copied().unwrap_or(0);
            Contribution {
                person_id: person.id,
                total_paid,
                share_of_total: percent_of(total_paid, total),
                payments,
                relative_frequency: percent_of(payments as f64, max_frequency as f64),
            }
        })
        .collect()
}

/// Expenses newest first.
pub fn timeline(expenses: &[Expense]) -> Vec<&Expense> {
    let mut ordered: Vec<&Expense> = expenses.iter().collect();
    ordered.sort_by(|a, b| b.date.cmp(&a.date));
    ordered
}
