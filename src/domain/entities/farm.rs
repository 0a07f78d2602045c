use crate::domain::entities::SyncEntity;
use crate::domain::value_objects::{EntityKey, FieldMapper, KeyStyle};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Farm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityKey>,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub total_area_ha: Option<f64>,
    #[serde(default)]
    pub main_crop: Option<String>,
}

impl Farm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            location: None,
            total_area_ha: None,
            main_crop: None,
        }
    }
}

impl SyncEntity for Farm {
    const COLLECTION: &'static str = "farms";

    fn key(&self) -> Option<EntityKey> {
        self.id.clone()
    }

    fn set_key(&mut self, key: EntityKey) {
        self.id = Some(key);
    }

    fn field_mapper() -> FieldMapper {
        FieldMapper::new(KeyStyle::CamelCase, KeyStyle::SnakeCase)
            .rename("totalAreaHa", "total_area")
    }

    fn demo_dataset() -> Vec<Self> {
        vec![
            Farm {
                id: EntityKey::new("demo-farm-1").ok(),
                name: "Quinta do Vale".to_string(),
                location: Some("Douro Valley".to_string()),
                total_area_ha: Some(42.0),
                main_crop: Some("grapes".to_string()),
            },
            Farm {
                id: EntityKey::new("demo-farm-2").ok(),
                name: "Herdade da Planície".to_string(),
                location: Some("Alentejo".to_string()),
                total_area_ha: Some(120.5),
                main_crop: Some("olives".to_string()),
            },
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrrigationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityKey>,
    pub farm_id: EntityKey,
    pub date: NaiveDate,
    pub volume_liters: f64,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub method: Option<String>,
}

impl SyncEntity for IrrigationRecord {
    const COLLECTION: &'static str = "irrigationRecords";

    fn key(&self) -> Option<EntityKey> {
        self.id.clone()
    }

    fn set_key(&mut self, key: EntityKey) {
        self.id = Some(key);
    }

    fn field_mapper() -> FieldMapper {
        FieldMapper::new(KeyStyle::CamelCase, KeyStyle::SnakeCase)
    }
}
