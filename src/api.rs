use actix_web::{HttpResponse, get, web};
use serde::{Deserialize, Serialize};

use crate::exchange_rate::AverageRate;
use crate::storage::{DateRange, RateStore};

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

fn error_response(mut builder: actix_web::HttpResponseBuilder, message: &str) -> HttpResponse {
    builder.json(ErrorBody { error: message })
}

#[derive(Debug, Deserialize)]
struct AverageQuery {
    #[serde(default)]
    start_date: String,
    #[serde(default)]
    end_date: String,
}

#[derive(Debug, Serialize)]
struct AverageResponse {
    start_date: String,
    end_date: String,
    averages: Vec<AverageRate>,
}

#[get("/currencies/latest")]
async fn latest(store: web::Data<dyn RateStore>) -> HttpResponse {
    match store.latest().await {
        Ok(rates) => HttpResponse::Ok().json(rates),
        Err(e) => {
            log::error!("Failed to retrieve currencies: {e:#}");
            error_response(HttpResponse::InternalServerError(), "Failed to retrieve currencies")
        }
    }
}

#[get("/currencies/average")]
async fn average(store: web::Data<dyn RateStore>, query: web::Query<AverageQuery>) -> HttpResponse {
    let AverageQuery {
        start_date,
        end_date,
    } = query.into_inner();

    let range = match DateRange::from_query(&start_date, &end_date) {
        Ok(range) => range,
        Err(e) => return error_response(HttpResponse::BadRequest(), &e.to_string()),
    };

    match store.averages(&range).await {
        Ok(averages) => HttpResponse::Ok().json(AverageResponse {
            start_date,
            end_date,
            averages,
        }),
        Err(e) => {
            log::error!("Failed to retrieve average rates: {e:#}");
            error_response(HttpResponse::InternalServerError(), "Failed to retrieve average rates")
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(latest).service(average);
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test};
    use chrono::{NaiveDate, NaiveDateTime};
    use rust_decimal::Decimal;
    use serde_json::{Value, json};

    use super::*;
    use crate::exchange_rate::ExchangeRate;
    use crate::storage::memory::MemoryStore;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    async fn seeded() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::default());
        for (code, buy, sell, ts) in [
            ("USD", "450", "455", at(1, 10)),
            ("USD", "460", "465", at(5, 23)),
            ("EUR", "490", "495", at(5, 23)),
            ("USD", "500", "505", at(6, 0)),
        ] {
            store
                .append(&ExchangeRate {
                    currency_code: code.into(),
                    buy_rate: Decimal::from_str(buy).unwrap(),
                    sell_rate: Decimal::from_str(sell).unwrap(),
                    timestamp: ts,
                })
                .await
                .unwrap();
        }
        store
    }

    async fn call(store: Arc<MemoryStore>, uri: &str) -> (StatusCode, Value) {
        let store: Arc<dyn RateStore> = store;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::from(store))
                .configure(configure),
        )
        .await;
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }

    #[actix_web::test]
    async fn test_latest_returns_newest_rate_per_code() {
        let (status, body) = call(seeded().await, "/currencies/latest").await;

        assert_eq!(status, StatusCode::OK);
        let mut newest: Vec<(String, f64)> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| {
                (
                    r["currency_code"].as_str().unwrap().to_owned(),
                    r["buy_rate"].as_f64().unwrap(),
                )
            })
            .collect();
        newest.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(newest, vec![("EUR".into(), 490.0), ("USD".into(), 500.0)]);
    }

    #[actix_web::test]
    async fn test_average_excludes_day_after_end_date() {
        let (status, body) = call(
            seeded().await,
            "/currencies/average?start_date=01-03-2024&end_date=05-03-2024",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "start_date": "01-03-2024",
                "end_date": "05-03-2024",
                "averages": [
                    {"currency_code": "EUR", "average_buy": 490.0, "average_sell": 495.0},
                    {"currency_code": "USD", "average_buy": 455.0, "average_sell": 460.0},
                ]
            })
        );
    }

    #[actix_web::test]
    async fn test_average_requires_both_dates() {
        let (status, body) = call(seeded().await, "/currencies/average?start_date=01-03-2024").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Both start_date and end_date are required"}));
    }

    #[actix_web::test]
    async fn test_average_rejects_iso_dates() {
        let (status, body) = call(
            seeded().await,
            "/currencies/average?start_date=01-03-2024&end_date=2024-03-05",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Invalid end_date format. Use DD-MM-YYYY"}));
    }

    #[actix_web::test]
    async fn test_storage_failure_is_internal_error() {
        let store = Arc::new(MemoryStore {
            broken: true,
            ..Default::default()
        });

        let (status, body) = call(store, "/currencies/latest").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Failed to retrieve currencies"}));
    }
}
