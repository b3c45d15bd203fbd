use chrono::NaiveDate;

use crate::error::StoreError;
use crate::schemas::{Category, NewExpense, NewPerson, NewTrip};
use crate::store::TripStore;

impl TripStore {
    /// A store holding the demo weekend trip: three friends and one shared
    /// shopping bill.
    pub fn with_sample_data() -> Result<Self, StoreError> {
        let mut store = TripStore::new();
        let trip = store.create_trip(NewTrip {
            name: "Manali Trip".to_string(),
            description: Some("Weekend getaway to the mountains".to_string()),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 15),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 18),
        })?;

        let mut people = Vec::new();
        for name in ["Raghav", "Harsh", "Hemant"] {
            let person = store.add_person(
                trip.id,
                NewPerson {
                    name: name.to_string(),
                },
            )?;
            people.push(person.id);
        }

        if let Some(&payer) = people.first() {
            store.add_expense(
                trip.id,
                NewExpense {
                    payer_id: payer,
                    description: "Shoes".to_string(),
                    amount: 20000.0,
                    participants: people.clone(),
                    date: None,
                    category: Category::Shopping,
                    notes: None,
                },
            )?;
        }
        Ok(store)
    }
}
