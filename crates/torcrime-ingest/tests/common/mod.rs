//! Shared fixtures for integration tests

#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

pub const DATASET: &str = "neighbourhood-crime-rates";

pub const CSV_HEADER: &str = "_id,AREA_NAME,HOOD_ID,ASSAULT_2023,ASSAULT_2024,AUTOTHEFT_2024,\
BIKETHEFT_2024,BREAKENTER_2024,HOMICIDE_2024,ROBBERY_2024,SHOOTING_2024,THEFTFROMMV_2024,\
THEFTOVER_2024,POPULATION_2024";

/// One CSV line; `population` empty means missing
pub fn csv_line(id: i32, area: &str, population: &str) -> String {
    format!("{id},{area},{id},9,10,11,12,13,0,14,1,15,16,{population}")
}

/// Three rows: the second duplicates the first, the third lacks a population
pub fn scenario_csv() -> String {
    [
        CSV_HEADER.to_string(),
        csv_line(1, "Yonge-Eglinton", "12000"),
        csv_line(1, "Yonge-Eglinton", "12000"),
        csv_line(2, "Annex", ""),
    ]
    .join("\n")
}

pub fn csv_with_ids(ids: &[i32]) -> String {
    let mut lines = vec![CSV_HEADER.to_string()];
    lines.extend(ids.iter().map(|&id| csv_line(id, &format!("Area {id}"), "1000")));
    lines.join("\n")
}

pub fn resource(id: &str, active: bool, position: u32) -> Value {
    json!({
        "id": id,
        "name": format!("Resource {id}"),
        "format": "CSV",
        "datastore_active": active,
        "position": position
    })
}

pub fn package(resources: Vec<Value>) -> Value {
    json!({
        "help": "https://ckan.example.org/api/3/action/help_show?name=package_show",
        "success": true,
        "result": {
            "name": DATASET,
            "title": "Neighbourhood Crime Rates",
            "num_resources": resources.len(),
            "resources": resources
        }
    })
}

pub async fn mount_package(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path("/api/3/action/package_show"))
        .and(query_param("id", DATASET))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn mount_csv_dump(server: &MockServer, resource_id: &str, csv: String) {
    Mock::given(method("GET"))
        .and(path(format!("/datastore/dump/{resource_id}")))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/csv")
                .set_body_string(csv),
        )
        .expect(1)
        .mount(server)
        .await;
}
