//! In-memory trips, people and expenses; balances are recomputed per snapshot.

use chrono::Utc;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analytics::{self, CategoryTotal, Contribution};
use crate::balance::{compute_balances, max_abs_balance, validate_expense, Balances};
use crate::error::{InvalidExpense, StoreError};
use crate::exchange::{plan_settlement, Exchange};
use crate::schemas::{
    Expense, ExpenseId, NewExpense, NewPerson, NewTrip, Person, PersonId, Trip, TripId,
};

/// Name given to the trip created when the last one is deleted.
pub const DEFAULT_TRIP_NAME: &str = "New Trip";

#[derive(Debug, Default, Clone)]
pub struct TripStore {
    trips: Vec<Trip>,
    people: Vec<Person>,
    expenses: Vec<Expense>,
    active_trip: Option<TripId>,
}

/// What a person deletion took with it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRemoval {
    pub person: Person,
    /// Expenses removed because the person paid for them.
    pub paid_expenses: Vec<ExpenseId>,
    /// Expenses removed because the person was their last participant.
    pub unsplittable_expenses: Vec<ExpenseId>,
    /// Expenses that kept going with one participant fewer.
    pub updated_expenses: Vec<ExpenseId>,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl TripStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn trip(&self, id: TripId) -> Result<&Trip, StoreError> {
        self.trips
            .iter()
            .find(|trip| trip.id == id)
            .ok_or(StoreError::TripNotFound(id))
    }

    pub fn active_trip(&self) -> Option<&Trip> {
        self.active_trip.and_then(|id| self.trip(id).ok())
    }

    pub fn set_active_trip(&mut self, id: TripId) -> Result<&Trip, StoreError> {
        self.trip(id)?;
        self.active_trip = Some(id);
        info!(trip = %id, "switched active trip");
        self.trip(id)
    }

    pub fn people(&self, trip_id: TripId) -> Result<Vec<Person>, StoreError> {
        self.trip(trip_id)?;
        Ok(self
            .people
            .iter()
            .filter(|person| person.trip_id == trip_id)
            .cloned()
            .collect())
    }

    pub fn expenses(&self, trip_id: TripId) -> Result<Vec<Expense>, StoreError> {
        self.trip(trip_id)?;
        Ok(self
            .expenses
            .iter()
            .filter(|expense| expense.trip_id == trip_id)
            .cloned()
            .collect())
    }

    /// Owned copy of one trip's data for the engine to work on.
    pub fn snapshot(&self, trip_id: TripId) -> Result<TripSnapshot, StoreError> {
        Ok(TripSnapshot {
            trip: self.trip(trip_id)?.clone(),
            people: self.people(trip_id)?,
            expenses: self.expenses(trip_id)?,
        })
    }

    /// Adds a trip and makes it the active one.
    pub fn create_trip(&mut self, new_trip: NewTrip) -> Result<Trip, StoreError> {
        let name = non_empty(&new_trip.name).ok_or(StoreError::EmptyTripName)?;
        let trip = Trip {
            id: Uuid::new_v4(),
            name,
            description: new_trip.description.as_deref().and_then(non_empty),
            start_date: new_trip.start_date,
            end_date: new_trip.end_date,
        };
        self.trips.push(trip.clone());
        self.active_trip = Some(trip.id);
        info!(trip = %trip.id, name = %trip.name, "created trip");
        Ok(trip)
    }

    /// Removes a trip with all of its people and expenses. If it was the
    /// active trip the first remaining one takes over; when none remain a
    /// fresh default trip is created.
    pub fn delete_trip(&mut self, id: TripId) -> Result<Trip, StoreError> {
        let position = self
            .trips
            .iter()
            .position(|trip| trip.id == id)
            .ok_or(StoreError::TripNotFound(id))?;
        let trip = self.trips.remove(position);

        let people_before = self.people.len();
        let expenses_before = self.expenses.len();
        self.people.retain(|person| person.trip_id != id);
        self.expenses.retain(|expense| expense.trip_id != id);
        warn!(
            trip = %id,
            people = people_before - self.people.len(),
            expenses = expenses_before - self.expenses.len(),
            "deleted trip and everything in it"
        );

        if self.active_trip == Some(id) {
            self.active_trip = match self.trips.first() {
                Some(next) => Some(next.id),
                None => {
                    let fallback = Trip {
                        id: Uuid::new_v4(),
                        name: DEFAULT_TRIP_NAME.to_string(),
                        description: None,
                        start_date: None,
                        end_date: None,
                    };
                    info!(trip = %fallback.id, "no trips left, created default trip");
                    let fallback_id = fallback.id;
                    self.trips.push(fallback);
                    Some(fallback_id)
                }
            };
        }
        Ok(trip)
    }

    pub fn add_person(&mut self, trip_id: TripId, new_person: NewPerson) -> Result<Person, StoreError> {
        self.trip(trip_id)?;
        let name = non_empty(&new_person.name).ok_or(StoreError::EmptyPersonName)?;
        let person = Person {
            id: Uuid::new_v4(),
            name,
            trip_id,
        };
        self.people.push(person.clone());
        info!(trip = %trip_id, person = %person.id, "added person");
        Ok(person)
    }

    /// Removes a person from the trip. They are dropped from every participant
    /// list and every expense they paid for is deleted outright.
    pub fn delete_person(
        &mut self,
        trip_id: TripId,
        person_id: PersonId,
    ) -> Result<PersonRemoval, StoreError> {
        self.trip(trip_id)?;
        let position = self
            .people
            .iter()
            .position(|person| person.id == person_id && person.trip_id == trip_id)
            .ok_or(StoreError::PersonNotFound(person_id))?;
        let person = self.people.remove(position);

        let mut paid_expenses = Vec::new();
        let mut unsplittable_expenses = Vec::new();
        let mut updated_expenses = Vec::new();
        self.expenses.retain_mut(|expense| {
            if expense.payer_id == person_id {
                paid_expenses.push(expense.id);
                return false;
            }
            let before = expense.participants.len();
            expense.participants.retain(|id| *id != person_id);
            if expense.participants.is_empty() {
                unsplittable_expenses.push(expense.id);
                return false;
            }
            if expense.participants.len() != before {
                updated_expenses.push(expense.id);
            }
            true
        });

        if !paid_expenses.is_empty() {
            warn!(
                person = %person_id,
                expenses = paid_expenses.len(),
                "deleted expenses along with their payer"
            );
        }
        if !unsplittable_expenses.is_empty() {
            warn!(
                person = %person_id,
                expenses = unsplittable_expenses.len(),
                "deleted expenses left without participants"
            );
        }
        info!(
            trip = %trip_id,
            person = %person_id,
            updated = updated_expenses.len(),
            "deleted person"
        );
        Ok(PersonRemoval {
            person,
            paid_expenses,
            unsplittable_expenses,
            updated_expenses,
        })
    }

    pub fn add_expense(
        &mut self,
        trip_id: TripId,
        new_expense: NewExpense,
    ) -> Result<Expense, StoreError> {
        let trip_people = self.people(trip_id)?;
        let description =
            non_empty(&new_expense.description).ok_or(InvalidExpense::EmptyDescription)?;

        let mut participants: Vec<PersonId> = Vec::with_capacity(new_expense.participants.len());
        for id in new_expense.participants {
            if !participants.contains(&id) {
                participants.push(id);
            }
        }

        let expense = Expense {
            id: Uuid::new_v4(),
            trip_id,
            payer_id: new_expense.payer_id,
            description,
            amount: new_expense.amount,
            participants,
            date: new_expense.date.unwrap_or_else(Utc::now),
            category: new_expense.category,
            notes: new_expense.notes.as_deref().and_then(non_empty),
        };
        validate_expense(&expense, &trip_people)?;

        self.expenses.push(expense.clone());
        info!(
            trip = %trip_id,
            expense = %expense.id,
            amount = expense.amount,
            category = %expense.category,
            "added expense"
        );
        Ok(expense)
    }

    pub fn delete_expense(&mut self, trip_id: TripId, id: ExpenseId) -> Result<Expense, StoreError> {
        self.trip(trip_id)?;
        let position = self
            .expenses
            .iter()
            .position(|expense| expense.id == id && expense.trip_id == trip_id)
            .ok_or(StoreError::ExpenseNotFound(id))?;
        let expense = self.expenses.remove(position);
        info!(trip = %trip_id, expense = %id, "deleted expense");
        Ok(expense)
    }
}

/// One trip's people and expenses, detached from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct TripSnapshot {
    pub trip: Trip,
    pub people: Vec<Person>,
    pub expenses: Vec<Expense>,
}

/// Everything the trip overview shows, computed in one pass over a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripReport {
    pub total: f64,
    pub balances: Balances,
    pub max_abs_balance: f64,
    pub settlement: Vec<Exchange>,
    pub category_totals: Vec<CategoryTotal>,
    pub payment_frequency: IndexMap<PersonId, usize>,
    pub most_active_payer: Option<PersonId>,
    pub non_payers: Vec<Person>,
    pub contributions: Vec<Contribution>,
}

impl TripSnapshot {
    pub fn balances(&self) -> Result<Balances, InvalidExpense> {
        compute_balances(&self.people, &self.expenses)
    }

    pub fn settlement(&self) -> Result<Vec<Exchange>, InvalidExpense> {
        Ok(plan_settlement(&self.balances()?))
    }

    pub fn timeline(&self) -> Vec<&Expense> {
        analytics::timeline(&self.expenses)
    }

    pub fn report(&self) -> Result<TripReport, InvalidExpense> {
        let balances = self.balances()?;
        let payment_frequency = analytics::payment_frequency(&self.people, &self.expenses);
        Ok(TripReport {
            total: analytics::trip_total(&self.expenses),
            max_abs_balance: max_abs_balance(&balances),
            settlement: plan_settlement(&balances),
            balances,
            category_totals: analytics::category_totals(&self.expenses),
            most_active_payer: analytics::most_active_payer(&payment_frequency),
            payment_frequency,
            non_payers: analytics::non_payers(&self.people, &self.expenses),
            contributions: analytics::contributions(&self.people, &self.expenses),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::Category;
    use rstest::{fixture, rstest};

    struct Fixture {
        store: TripStore,
        trip: TripId,
        alice: PersonId,
        bob: PersonId,
        carol: PersonId,
    }

    impl Fixture {
        fn expense(&mut self, payer: PersonId, amount: f64, participants: Vec<PersonId>) -> Expense {
            self.store
                .add_expense(
                    self.trip,
                    NewExpense {
                        payer_id: payer,
                        description: "dinner".to_string(),
                        amount,
                        participants,
                        date: None,
                        category: Category::Food,
                        notes: None,
                    },
                )
                .unwrap()
        }
    }

    #[fixture]
    fn fixture() -> Fixture {
        let mut store = TripStore::new();
        let trip = store
            .create_trip(NewTrip {
                name: "Coast".to_string(),
                ..NewTrip::default()
            })
            .unwrap()
            .id;
        let mut add = |name: &str| {
            store
                .add_person(trip, NewPerson { name: name.to_string() })
                .unwrap()
                .id
        };
        let alice = add("Alice");
        let bob = add("Bob");
        let carol = add("Carol");
        Fixture {
            store,
            trip,
            alice,
            bob,
            carol,
        }
    }

    #[rstest]
    fn shared_dinner_settles_to_payer(mut fixture: Fixture) {
        let (alice, bob, carol) = (fixture.alice, fixture.bob, fixture.carol);
        fixture.expense(alice, 300.0, vec![alice, bob, carol]);

        let snapshot = fixture.store.snapshot(fixture.trip).unwrap();
        let balances = snapshot.balances().unwrap();
        assert_eq!(balances[&alice], 200.0);
        assert_eq!(balances[&bob], -100.0);
        assert_eq!(balances[&carol], -100.0);

        let settlement = snapshot.settlement().unwrap();
        assert_eq!(settlement.len(), 2);
        assert!(settlement
            .iter()
            .all(|exchange| exchange.to == alice && exchange.amount == 100.0));
        assert!(settlement.iter().any(|exchange| exchange.from == bob));
        assert!(settlement.iter().any(|exchange| exchange.from == carol));
    }

    #[rstest]
    fn payer_outside_split(mut fixture: Fixture) {
        let (alice, bob, carol) = (fixture.alice, fixture.bob, fixture.carol);
        fixture.expense(alice, 90.0, vec![bob, carol]);

        let snapshot = fixture.store.snapshot(fixture.trip).unwrap();
        let balances = snapshot.balances().unwrap();
        assert_eq!(balances[&alice], 90.0);
        assert_eq!(balances[&bob], -45.0);
        assert_eq!(balances[&carol], -45.0);

        let paid: f64 = snapshot.settlement().unwrap().iter().map(|e| e.amount).sum();
        assert_eq!(paid, 90.0);
    }

    #[rstest]
    fn empty_trip_report(fixture: Fixture) {
        let snapshot = fixture.store.snapshot(fixture.trip).unwrap();
        let report = snapshot.report().unwrap();
        assert!(report.balances.values().all(|b| *b == 0.0));
        assert!(report.settlement.is_empty());
        assert!(report.category_totals.is_empty());
        assert_eq!(report.non_payers, snapshot.people);
        assert_eq!(report.most_active_payer, None);
        assert_eq!(report.total, 0.0);
    }

    #[rstest]
    fn report_is_stable_across_reads(mut fixture: Fixture) {
        let (alice, bob, carol) = (fixture.alice, fixture.bob, fixture.carol);
        fixture.expense(bob, 75.5, vec![alice, bob, carol]);
        fixture.expense(carol, 20.0, vec![alice]);

        let snapshot = fixture.store.snapshot(fixture.trip).unwrap();
        assert_eq!(snapshot.report().unwrap(), snapshot.report().unwrap());
        assert_eq!(snapshot.report().unwrap().most_active_payer, Some(bob));
    }

    #[rstest]
    fn deleting_participant_keeps_expenses(mut fixture: Fixture) {
        let (alice, bob, carol) = (fixture.alice, fixture.bob, fixture.carol);
        let first = fixture.expense(alice, 30.0, vec![alice, bob, carol]);
        let second = fixture.expense(bob, 10.0, vec![carol, bob]);

        let removal = fixture.store.delete_person(fixture.trip, carol).unwrap();
        assert!(removal.paid_expenses.is_empty());
        assert!(removal.unsplittable_expenses.is_empty());
        assert_eq!(removal.updated_expenses, vec![first.id, second.id]);

        let expenses = fixture.store.expenses(fixture.trip).unwrap();
        assert_eq!(expenses.len(), 2);
        assert!(expenses.iter().all(|e| !e.participants.contains(&carol)));

        let total: f64 = fixture
            .store
            .snapshot(fixture.trip)
            .unwrap()
            .balances()
            .unwrap()
            .values()
            .sum();
        assert!(total.abs() < 1e-9);
    }

    #[rstest]
    fn deleting_payer_deletes_their_expenses(mut fixture: Fixture) {
        let (alice, bob, carol) = (fixture.alice, fixture.bob, fixture.carol);
        let paid_one = fixture.expense(alice, 30.0, vec![bob, carol]);
        let paid_two = fixture.expense(alice, 12.0, vec![alice, bob]);
        let kept = fixture.expense(bob, 9.0, vec![alice, bob, carol]);

        let removal = fixture.store.delete_person(fixture.trip, alice).unwrap();
        assert_eq!(removal.paid_expenses, vec![paid_one.id, paid_two.id]);
        assert!(removal.unsplittable_expenses.is_empty());
        assert_eq!(removal.updated_expenses, vec![kept.id]);

        let expenses = fixture.store.expenses(fixture.trip).unwrap();
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].participants, vec![bob, carol]);
    }

    #[rstest]
    fn deleting_sole_participant_drops_expense(mut fixture: Fixture) {
        let (alice, bob) = (fixture.alice, fixture.bob);
        let lonely = fixture.expense(alice, 15.0, vec![bob]);

        let removal = fixture.store.delete_person(fixture.trip, bob).unwrap();
        assert_eq!(removal.unsplittable_expenses, vec![lonely.id]);
        assert!(removal.paid_expenses.is_empty());
        assert!(fixture.store.expenses(fixture.trip).unwrap().is_empty());
    }

    #[rstest]
    fn person_removal_separates_paid_from_unsplittable(mut fixture: Fixture) {
        let (alice, bob, carol) = (fixture.alice, fixture.bob, fixture.carol);
        let paid = fixture.expense(bob, 20.0, vec![alice, carol]);
        let only_bob = fixture.expense(alice, 8.0, vec![bob]);
        let shared = fixture.expense(carol, 6.0, vec![bob, carol]);

        let removal = fixture.store.delete_person(fixture.trip, bob).unwrap();
        assert_eq!(removal.paid_expenses, vec![paid.id]);
        assert_eq!(removal.unsplittable_expenses, vec![only_bob.id]);
        assert_eq!(removal.updated_expenses, vec![shared.id]);
    }

    #[rstest]
    fn add_expense_validates(mut fixture: Fixture) {
        let base = NewExpense {
            payer_id: fixture.alice,
            description: "tickets".to_string(),
            amount: 40.0,
            participants: vec![fixture.bob],
            date: None,
            category: Category::Activities,
            notes: None,
        };
        let trip = fixture.trip;
        let store = &mut fixture.store;

        let err = store
            .add_expense(trip, NewExpense { participants: vec![], ..base.clone() })
            .unwrap_err();
        assert_eq!(err, StoreError::InvalidExpense(InvalidExpense::NoParticipants));

        let err = store
            .add_expense(trip, NewExpense { amount: 0.0, ..base.clone() })
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::InvalidExpense(InvalidExpense::NonPositiveAmount(0.0))
        );

        let err = store
            .add_expense(trip, NewExpense { description: "  ".to_string(), ..base.clone() })
            .unwrap_err();
        assert_eq!(err, StoreError::InvalidExpense(InvalidExpense::EmptyDescription));

        let stranger = Uuid::new_v4();
        let err = store
            .add_expense(trip, NewExpense { participants: vec![stranger], ..base.clone() })
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::InvalidExpense(InvalidExpense::UnknownParticipant(stranger))
        );

        assert!(store.expenses(trip).unwrap().is_empty());
    }

    #[rstest]
    fn add_expense_rejects_people_from_other_trips(mut fixture: Fixture) {
        let other = fixture
            .store
            .create_trip(NewTrip {
                name: "Elsewhere".to_string(),
                ..NewTrip::default()
            })
            .unwrap()
            .id;
        let outsider = fixture
            .store
            .add_person(other, NewPerson { name: "Dave".to_string() })
            .unwrap()
            .id;

        let err = fixture
            .store
            .add_expense(
                fixture.trip,
                NewExpense {
                    payer_id: outsider,
                    description: "fuel".to_string(),
                    amount: 50.0,
                    participants: vec![fixture.alice],
                    date: None,
                    category: Category::Transport,
                    notes: None,
                },
            )
            .unwrap_err();
        assert_eq!(err, StoreError::InvalidExpense(InvalidExpense::UnknownPayer(outsider)));
    }

    #[rstest]
    fn add_expense_deduplicates_participants(mut fixture: Fixture) {
        let (alice, bob) = (fixture.alice, fixture.bob);
        let expense = fixture.expense(alice, 10.0, vec![bob, alice, bob]);
        assert_eq!(expense.participants, vec![bob, alice]);
    }

    #[rstest]
    fn delete_expense_is_scoped_to_trip(mut fixture: Fixture) {
        let (alice, bob) = (fixture.alice, fixture.bob);
        let expense = fixture.expense(alice, 10.0, vec![bob]);
        let other = fixture
            .store
            .create_trip(NewTrip {
                name: "Other".to_string(),
                ..NewTrip::default()
            })
            .unwrap()
            .id;

        assert_eq!(
            fixture.store.delete_expense(other, expense.id),
            Err(StoreError::ExpenseNotFound(expense.id))
        );
        assert_eq!(fixture.store.delete_expense(fixture.trip, expense.id), Ok(expense));
        assert!(fixture.store.expenses(fixture.trip).unwrap().is_empty());
    }

    #[rstest]
    fn delete_trip_cascades(mut fixture: Fixture) {
        let (alice, bob) = (fixture.alice, fixture.bob);
        fixture.expense(alice, 10.0, vec![bob]);
        let keep = fixture
            .store
            .create_trip(NewTrip {
                name: "Keep".to_string(),
                ..NewTrip::default()
            })
            .unwrap()
            .id;
        fixture.store.add_person(keep, NewPerson { name: "Zed".to_string() }).unwrap();

        fixture.store.delete_trip(fixture.trip).unwrap();
        assert_eq!(
            fixture.store.snapshot(fixture.trip),
            Err(StoreError::TripNotFound(fixture.trip))
        );
        assert!(fixture.store.people.iter().all(|p| p.trip_id == keep));
        assert!(fixture.store.expenses.is_empty());
        assert_eq!(fixture.store.active_trip().map(|t| t.id), Some(keep));
    }

    #[rstest]
    fn deleting_active_trip_falls_back_to_first_remaining(mut fixture: Fixture) {
        let second = fixture
            .store
            .create_trip(NewTrip {
                name: "Second".to_string(),
                ..NewTrip::default()
            })
            .unwrap()
            .id;
        assert_eq!(fixture.store.active_trip().map(|t| t.id), Some(second));

        fixture.store.delete_trip(second).unwrap();
        assert_eq!(fixture.store.active_trip().map(|t| t.id), Some(fixture.trip));
    }

    #[rstest]
    fn deleting_last_trip_creates_default(mut fixture: Fixture) {
        fixture.store.delete_trip(fixture.trip).unwrap();
        let trips = fixture.store.trips();
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].name, DEFAULT_TRIP_NAME);
        assert_eq!(fixture.store.active_trip(), Some(&trips[0]));
    }

    #[rstest]
    fn deleting_inactive_trip_keeps_selection(mut fixture: Fixture) {
        let second = fixture
            .store
            .create_trip(NewTrip {
                name: "Second".to_string(),
                ..NewTrip::default()
            })
            .unwrap()
            .id;
        fixture.store.set_active_trip(fixture.trip).unwrap();
        fixture.store.delete_trip(second).unwrap();
        assert_eq!(fixture.store.active_trip().map(|t| t.id), Some(fixture.trip));
        assert_eq!(fixture.store.trips().len(), 1);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_names_are_rejected(mut fixture: Fixture, #[case] name: &str) {
        assert_eq!(
            fixture.store.create_trip(NewTrip {
                name: name.to_string(),
                ..NewTrip::default()
            }),
            Err(StoreError::EmptyTripName)
        );
        assert_eq!(
            fixture
                .store
                .add_person(fixture.trip, NewPerson { name: name.to_string() }),
            Err(StoreError::EmptyPersonName)
        );
    }

    #[test]
    fn names_are_trimmed() {
        let mut store = TripStore::new();
        let trip = store
            .create_trip(NewTrip {
                name: "  Goa  ".to_string(),
                description: Some("   ".to_string()),
                ..NewTrip::default()
            })
            .unwrap();
        assert_eq!(trip.name, "Goa");
        assert_eq!(trip.description, None);
        let person = store
            .add_person(trip.id, NewPerson { name: " Ana ".to_string() })
            .unwrap();
        assert_eq!(person.name, "Ana");
    }

    #[test]
    fn unknown_trip_is_reported() {
        let mut store = TripStore::new();
        let id = Uuid::new_v4();
        assert_eq!(store.snapshot(id), Err(StoreError::TripNotFound(id)));
        assert_eq!(
            store.add_person(id, NewPerson { name: "Ana".to_string() }),
            Err(StoreError::TripNotFound(id))
        );
        assert_eq!(store.set_active_trip(id).map(|t| t.id), Err(StoreError::TripNotFound(id)));
        assert!(store.active_trip().is_none());
    }
}
