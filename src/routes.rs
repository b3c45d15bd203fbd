use actix_web::{
    delete, get, http::StatusCode, post, put, web, HttpResponse, ResponseError,
};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StoreError;
use crate::schemas::{ExpenseId, NewExpense, NewPerson, NewTrip, PersonId, TripId};
use crate::store::TripStore;

pub type SharedStore = RwLock<TripStore>;

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl ResponseError for StoreError {
    fn status_code(&self) -> StatusCode {
        if self.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::BAD_REQUEST
        }
    }

    fn error_response(&self) -> HttpResponse {
        let code = if self.is_not_found() {
            "not_found"
        } else {
            "invalid_request"
        };
        debug!(error = %self, code, "request rejected");
        HttpResponse::build(self.status_code()).json(ErrorBody {
            code,
            message: self.to_string(),
        })
    }
}

#[get("/trips")]
async fn list_trips(store: web::Data<SharedStore>) -> HttpResponse {
    let store = store.read().await;
    HttpResponse::Ok().json(store.trips())
}

#[post("/trips")]
async fn create_trip(
    store: web::Data<SharedStore>,
    json: web::Json<NewTrip>,
) -> Result<HttpResponse, StoreError> {
    let trip = store.write().await.create_trip(json.into_inner())?;
    Ok(HttpResponse::Created().json(trip))
}

#[delete("/trips/{trip_id}")]
async fn delete_trip(
    store: web::Data<SharedStore>,
    trip_id: web::Path<TripId>,
) -> Result<HttpResponse, StoreError> {
    let trip = store.write().await.delete_trip(trip_id.into_inner())?;
    Ok(HttpResponse::Ok().json(trip))
}

#[get("/active-trip")]
async fn get_active_trip(store: web::Data<SharedStore>) -> HttpResponse {
    let store = store.read().await;
    HttpResponse::Ok().json(store.active_trip())
}

#[put("/active-trip/{trip_id}")]
async fn set_active_trip(
    store: web::Data<SharedStore>,
    trip_id: web::Path<TripId>,
) -> Result<HttpResponse, StoreError> {
    let mut store = store.write().await;
    let trip = store.set_active_trip(trip_id.into_inner())?;
    Ok(HttpResponse::Ok().json(trip))
}

#[get("/trips/{trip_id}/people")]
async fn list_people(
    store: web::Data<SharedStore>,
    trip_id: web::Path<TripId>,
) -> Result<HttpResponse, StoreError> {
    let people = store.read().await.people(trip_id.into_inner())?;
    Ok(HttpResponse::Ok().json(people))
}

#[post("/trips/{trip_id}/people")]
async fn add_person(
    store: web::Data<SharedStore>,
    trip_id: web::Path<TripId>,
    json: web::Json<NewPerson>,
) -> Result<HttpResponse, StoreError> {
    let person = store
        .write()
        .await
        .add_person(trip_id.into_inner(), json.into_inner())?;
    Ok(HttpResponse::Created().json(person))
}

#[delete("/trips/{trip_id}/people/{person_id}")]
async fn delete_person(
    store: web::Data<SharedStore>,
    path: web::Path<(TripId, PersonId)>,
) -> Result<HttpResponse, StoreError> {
    let (trip_id, person_id) = path.into_inner();
    let removal = store.write().await.delete_person(trip_id, person_id)?;
    Ok(HttpResponse::Ok().json(removal))
}

#[get("/trips/{trip_id}/expenses")]
async fn list_expenses(
    store: web::Data<SharedStore>,
    trip_id: web::Path<TripId>,
) -> Result<HttpResponse, StoreError> {
    let snapshot = store.read().await.snapshot(trip_id.into_inner())?;
    Ok(HttpResponse::Ok().json(snapshot.timeline()))
}

#[post("/trips/{trip_id}/expenses")]
async fn add_expense(
    store: web::Data<SharedStore>,
    trip_id: web::Path<TripId>,
    expense: web::Json<NewExpense>,
) -> Result<HttpResponse, StoreError> {
    let expense = store
        .write()
        .await
        .add_expense(trip_id.into_inner(), expense.into_inner())?;
    Ok(HttpResponse::Created().json(expense))
}

#[delete("/trips/{trip_id}/expenses/{expense_id}")]
async fn delete_expense(
    store: web::Data<SharedStore>,
    path: web::Path<(TripId, ExpenseId)>,
) -> Result<HttpResponse, StoreError> {
    let (trip_id, expense_id) = path.into_inner();
    let expense = store.write().await.delete_expense(trip_id, expense_id)?;
    Ok(HttpResponse::Ok().json(expense))
}

#[get("/trips/{trip_id}/balance")]
async fn get_balance(
    store: web::Data<SharedStore>,
    trip_id: web::Path<TripId>,
) -> Result<HttpResponse, StoreError> {
    let snapshot = store.read().await.snapshot(trip_id.into_inner())?;
    let balances = snapshot.balances()?;
    Ok(HttpResponse::Ok().json(balances))
}

#[get("/trips/{trip_id}/settlement")]
async fn get_settlement(
    store: web::Data<SharedStore>,
    trip_id: web::Path<TripId>,
) -> Result<HttpResponse, StoreError> {
    let snapshot = store.read().await.snapshot(trip_id.into_inner())?;
    let exchanges = snapshot.settlement()?;
    Ok(HttpResponse::Ok().json(exchanges))
}

#[get("/trips/{trip_id}/analytics")]
async fn get_analytics(
    store: web::Data<SharedStore>,
    trip_id: web::Path<TripId>,
) -> Result<HttpResponse, StoreError> {
    let snapshot = store.read().await.snapshot(trip_id.into_inner())?;
    let report = snapshot.report()?;
    Ok(HttpResponse::Ok().json(report))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_trips)
        .service(create_trip)
        .service(delete_trip)
        .service(get_active_trip)
        .service(set_active_trip)
        .service(list_people)
        .service(add_person)
        .service(delete_person)
        .service(list_expenses)
        .service(add_expense)
        .service(delete_expense)
        .service(get_balance)
        .service(get_settlement)
        .service(get_analytics);
}
