// Integration tests for `InventoryClient` / `ResourceApi` using wiremock.

use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bunker_api::models::{
    AmmunitionStock, Battery, Food, FoodCreate, Fuel, Generator, Medication, StorageLocation,
    StorageLocationCreate, Weapon,
};
use bunker_api::{Error, InventoryClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, InventoryClient) {
    let server = MockServer::start().await;
    let client =
        InventoryClient::with_client(reqwest::Client::new(), &format!("{}/api", server.uri()))
            .unwrap();
    (server, client)
}

fn food_json(id: i64, food_type: &str) -> serde_json::Value {
    json!({
        "id": id,
        "type": food_type,
        "quantity": 4.0,
        "expirationDate": "2027-01-15",
        "storageLocationId": 1,
        "storageLocationName": "Pantry"
    })
}

// ── CRUD ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_food() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/food"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([food_json(1, "Rice"), food_json(2, "Beans")])),
        )
        .mount(&server)
        .await;

    let food = client.resource::<Food>().list().await.unwrap();

    assert_eq!(food.len(), 2);
    assert_eq!(food[0].food_type, "Rice");
    assert_eq!(food[1].id, 2);
    assert_eq!(
        food[0].expiration_date,
        NaiveDate::from_ymd_opt(2027, 1, 15).unwrap()
    );
}

#[tokio::test]
async fn test_get_weapon() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/weapons/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3,
            "type": "Rifle",
            "model": "M1 Garand",
            "quantity": 2,
            "ammunitionTypeId": 5,
            "storageLocationId": 1,
            "ammunitionTypeName": ".30-06"
        })))
        .mount(&server)
        .await;

    let weapon: Weapon = client.resource().get(3).await.unwrap();

    assert_eq!(weapon.model, "M1 Garand");
    assert_eq!(weapon.ammunition_type_name.as_deref(), Some(".30-06"));
    assert_eq!(weapon.storage_location_name, None);
}

#[tokio::test]
async fn test_create_sends_camel_case_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/food"))
        .and(body_json(json!({
            "type": "Oats",
            "quantity": 2.5,
            "expirationDate": "2027-06-01",
            "storageLocationId": 1
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 10,
            "type": "Oats",
            "quantity": 2.5,
            "expirationDate": "2027-06-01",
            "storageLocationId": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = client
        .resource::<Food>()
        .create(&FoodCreate {
            food_type: "Oats".into(),
            quantity: 2.5,
            expiration_date: NaiveDate::from_ymd_opt(2027, 6, 1).unwrap(),
            storage_location_id: 1,
        })
        .await
        .unwrap();

    assert_eq!(created.id, 10);
}

#[tokio::test]
async fn test_update_uses_put_on_item() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/storage-locations/4"))
        .and(body_json(json!({ "name": "Garage" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": 4, "name": "Garage" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let updated: StorageLocation = client
        .resource()
        .update(
            4,
            &StorageLocationCreate {
                name: "Garage".into(),
                description: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Garage");
}

#[tokio::test]
async fn test_delete_accepts_no_content() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/food/1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.resource::<Food>().delete(1).await.unwrap();
}

// ── Kind-specific queries ───────────────────────────────────────────

#[tokio::test]
async fn test_expiring_soon_and_by_location() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/food/expiring-soon"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([food_json(7, "Milk")])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/ammunition-stocks/by-location/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 1,
            "quantity": 500,
            "ammunitionTypeId": 3,
            "storageLocationId": 2
        }])))
        .mount(&server)
        .await;

    let soon = client.resource::<Food>().expiring_soon().await.unwrap();
    assert_eq!(soon[0].food_type, "Milk");

    let stocks: Vec<AmmunitionStock> = client.resource().by_location(2).await.unwrap();
    assert_eq!(stocks[0].quantity, 500);
}

#[tokio::test]
async fn test_aggregate_totals() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/ammunition-stocks/total/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ammunitionTypeId": 3,
            "caliber": "9mm",
            "type": "FMJ",
            "totalQuantity": 1200
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/batteries/total-by-type/AA"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "batteryType": "AA",
            "totalQuantity": 48
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/fuel/total-by-type/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "fuelType": "Diesel",
            "totalQuantity": 120.5
        })))
        .mount(&server)
        .await;

    let ammo = client.resource::<AmmunitionStock>().total(3).await.unwrap();
    assert_eq!(ammo.total_quantity, 1200);
    assert_eq!(ammo.caliber, "9mm");

    let batteries = client.resource::<Battery>().total_by_type("AA").await.unwrap();
    assert_eq!(batteries.total_quantity, 48);

    let fuel = client.resource::<Fuel>().total_by_type(1).await.unwrap();
    assert_eq!(fuel.fuel_type, "Diesel");
}

#[tokio::test]
async fn test_free_text_filters_are_path_encoded() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/medications/by-purpose/pain%20relief"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 1,
            "name": "Ibuprofen",
            "quantity": 30,
            "expirationDate": "2028-01-01",
            "purpose": "pain relief",
            "storageLocationId": 1
        }])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/generators/by-status/Standby"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let meds: Vec<Medication> = client.resource().by_purpose("pain relief").await.unwrap();
    assert_eq!(meds[0].name, "Ibuprofen");

    let generators: Vec<Generator> = client.resource().by_status("Standby").await.unwrap();
    assert!(generators.is_empty());
}

// ── Error handling ──────────────────────────────────────────────────

#[tokio::test]
async fn test_404_uses_backend_error_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/food/99"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({ "error": "Food not found with ID: 99" })),
        )
        .mount(&server)
        .await;

    let err = client.resource::<Food>().get(99).await.unwrap_err();

    assert!(err.is_not_found());
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Food not found with ID: 99");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_500_without_body_falls_back_to_status_text() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/weapons/1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client.resource::<Weapon>().delete(1).await.unwrap_err();

    assert!(err.is_transient());
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/food"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client.resource::<Food>().list().await.unwrap_err();

    match err {
        Error::Deserialization { body, .. } => assert_eq!(body, "<html>oops</html>"),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}
