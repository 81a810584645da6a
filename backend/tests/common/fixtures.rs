//! Seed data for integration tests
//!
//! Records are created through the service layer so every fixture starts
//! at version 0 with a CREATE audit entry, exactly as if created over HTTP.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};

use rubber_cert_backend::api::SharedState;
use rubber_cert_backend::models::inspection::{
    Inspection, InspectionChanges, InspectionFields, InspectionItem, InspectionItemFields,
    InspectionResult, InspectionStatus, Requirement, RequirementFields,
};
use rubber_cert_backend::models::profile::{Farmer, FarmerFields};
use rubber_cert_backend::models::rubber_farm::{RubberFarm, RubberFarmFields};
use rubber_cert_backend::services::inspection_service::ScheduleInspectionRequest;

/// A farmer with one farm, one inspection, one item and `requirements`
/// requirements under it.
pub struct InspectionTree {
    pub farmer: Farmer,
    pub farm: RubberFarm,
    pub inspection: Inspection,
    pub item: InspectionItem,
    pub requirements: Vec<Requirement>,
}

pub fn farmer_fields(user_id: i64) -> FarmerFields {
    FarmerFields {
        user_id,
        name_title: "นาย".into(),
        first_name: "Somchai".into(),
        last_name: "Jaidee".into(),
        id_card: format!("11037000{:05}", user_id),
        phone_number: "0812345678".into(),
        email: format!("farmer{}@example.com", user_id),
        house_no: "99/1".into(),
        village_name: "Ban Nong".into(),
        moo: 3,
        road: None,
        alley: None,
        sub_district: "Tha Sala".into(),
        district: "Mueang".into(),
        province_name: "Songkhla".into(),
        zip_code: "90000".into(),
    }
}

pub fn farm_fields(farmer_id: i64) -> RubberFarmFields {
    RubberFarmFields {
        farmer_id,
        village_name: "Ban Khuan".into(),
        moo: 5,
        road: Some("Kanjanavanit".into()),
        alley: None,
        sub_district: "Kho Hong".into(),
        district: "Hat Yai".into(),
        province: "Songkhla".into(),
        location: Some(serde_json::json!({
            "type": "Point",
            "coordinates": [100.47, 7.01]
        })),
        product_distribution_type: "latex".into(),
    }
}

pub async fn seed_farmer(state: &SharedState, user_id: i64) -> Farmer {
    state
        .entity_service::<FarmerFields>()
        .create(farmer_fields(user_id), None)
        .await
        .expect("seed farmer")
}

pub async fn seed_farm(state: &SharedState, farmer_id: i64) -> RubberFarm {
    state
        .entity_service::<RubberFarmFields>()
        .create(farm_fields(farmer_id), None)
        .await
        .expect("seed farm")
}

pub async fn seed_inspection(state: &SharedState, farm_id: i64) -> Inspection {
    state
        .inspection_service()
        .schedule(
            ScheduleInspectionRequest {
                inspection_no: None,
                inspection_date_and_time: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
                inspection_type_id: 1,
                auditor_chief_id: 2,
                rubber_farm_id: farm_id,
            },
            None,
        )
        .await
        .expect("seed inspection")
}

pub async fn seed_item(state: &SharedState, inspection_id: i64, no: i32) -> InspectionItem {
    state
        .entity_service::<InspectionItemFields>()
        .create(
            InspectionItemFields {
                inspection_id,
                inspection_item_master_id: no as i64,
                inspection_item_no: no,
                inspection_item_result: "pending".into(),
                other_conditions: None,
            },
            None,
        )
        .await
        .expect("seed inspection item")
}

pub async fn seed_requirement(state: &SharedState, item_id: i64, no: i32) -> Requirement {
    state
        .entity_service::<RequirementFields>()
        .create(
            RequirementFields {
                inspection_item_id: item_id,
                requirement_master_id: no as i64,
                requirement_no: no,
                evaluation_result: "pending".into(),
                evaluation_method: "observation".into(),
                note: None,
            },
            None,
        )
        .await
        .expect("seed requirement")
}

/// Build a full inspection tree for the farmer account `user_id`.
pub async fn seed_tree(state: &SharedState, user_id: i64, requirements: i32) -> InspectionTree {
    let farmer = seed_farmer(state, user_id).await;
    let farm = seed_farm(state, farmer.id).await;
    let inspection = seed_inspection(state, farm.id).await;
    let item = seed_item(state, inspection.id, 1).await;

    let mut reqs = Vec::new();
    for no in 1..=requirements {
        reqs.push(seed_requirement(state, item.id, no).await);
    }

    InspectionTree {
        farmer,
        farm,
        inspection,
        item,
        requirements: reqs,
    }
}

/// Move an inspection to completed with `result`; returns it at version 1.
pub async fn conclude_inspection(
    state: &SharedState,
    inspection: &Inspection,
    result: InspectionResult,
) -> Inspection {
    state
        .entity_service::<InspectionFields>()
        .update(
            inspection.id,
            &InspectionChanges {
                inspection_status: Some(InspectionStatus::Completed),
                inspection_result: Some(result),
                ..Default::default()
            },
            inspection.version,
            None,
        )
        .await
        .expect("conclude inspection")
}
