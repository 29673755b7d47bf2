//! Order payload model consumed by the distribution write path.
//!
//! # Responsibility
//! - Validate loosely-typed JSON order payloads at the system boundary.
//! - Expose line items as tagged variants with a typed chain-of-custody.
//! - Flatten line items into child-table records stamped with a folio.
//!
//! # Invariants
//! - Scalar payload cells accept strings, numbers, booleans or null; null
//!   reads as an empty string.
//! - Every record produced by `LineItem::to_record` carries `FOLIO`.

use crate::model::record::Record;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Payload decoding error.
#[derive(Debug)]
pub enum PayloadError {
    /// Payload is not valid JSON or does not match the order shape.
    Malformed(serde_json::Error),
    /// Top-level payload is not a JSON array of order objects.
    NotAList,
}

impl Display for PayloadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(err) => write!(f, "malformed order payload: {err}"),
            Self::NotAList => write!(f, "order payload must be a JSON array of objects"),
        }
    }
}

impl Error for PayloadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Malformed(err) => Some(err),
            Self::NotAList => None,
        }
    }
}

impl From<serde_json::Error> for PayloadError {
    fn from(value: serde_json::Error) -> Self {
        Self::Malformed(value)
    }
}

/// Decodes a JSON array of order items.
pub fn parse_order_payload(json: &str) -> Result<Vec<OrderItem>, PayloadError> {
    let value: Value = serde_json::from_str(json)?;
    if !value.is_array() {
        return Err(PayloadError::NotAList);
    }
    Ok(serde_json::from_value(value)?)
}

/// One top-level order as submitted by an intake form.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OrderItem {
    #[serde(deserialize_with = "opt_cell")]
    pub id: Option<String>,
    #[serde(rename = "FOLIO", deserialize_with = "opt_cell")]
    pub folio: Option<String>,
    #[serde(deserialize_with = "opt_cell")]
    pub cliente: Option<String>,
    #[serde(deserialize_with = "opt_cell")]
    pub especialidad: Option<String>,
    #[serde(deserialize_with = "opt_cell")]
    pub concepto: Option<String>,
    #[serde(deserialize_with = "opt_cell")]
    pub clasificacion: Option<String>,
    /// Comma-separated responsible parties; list payloads are joined.
    #[serde(deserialize_with = "joined_cell")]
    pub responsable: String,
    #[serde(deserialize_with = "opt_cell")]
    pub horas: Option<String>,
    #[serde(deserialize_with = "opt_cell")]
    pub prioridad: Option<String>,
    #[serde(deserialize_with = "opt_cell")]
    pub prioridades: Option<String>,
    #[serde(deserialize_with = "opt_cell")]
    pub riesgos: Option<String>,
    #[serde(rename = "fechaRespuesta", deserialize_with = "opt_cell")]
    pub fecha_respuesta: Option<String>,
    #[serde(deserialize_with = "opt_cell")]
    pub comentarios: Option<String>,
    #[serde(rename = "archivoUrl", deserialize_with = "opt_cell")]
    pub archivo_url: Option<String>,
    #[serde(deserialize_with = "opt_cell")]
    pub cumplimiento: Option<String>,
    #[serde(rename = "comentariosPrevios", deserialize_with = "opt_cell")]
    pub comentarios_previos: Option<String>,
    #[serde(deserialize_with = "opt_cell")]
    pub requisitor: Option<String>,
    #[serde(deserialize_with = "opt_cell")]
    pub contacto: Option<String>,
    #[serde(deserialize_with = "opt_cell")]
    pub celular: Option<String>,
    #[serde(rename = "fechaCotizacion", deserialize_with = "opt_cell")]
    pub fecha_cotizacion: Option<String>,
    #[serde(rename = "TRABAJO", deserialize_with = "opt_cell")]
    pub trabajo: Option<String>,
    #[serde(rename = "checkList")]
    pub check_list: Option<Value>,
    #[serde(rename = "additionalCosts")]
    pub additional_costs: Option<Value>,
    #[serde(deserialize_with = "list_or_empty")]
    pub materiales: Vec<Material>,
    #[serde(rename = "manoObra", deserialize_with = "list_or_empty")]
    pub mano_obra: Vec<Labor>,
    #[serde(deserialize_with = "list_or_empty")]
    pub herramientas: Vec<Tool>,
    #[serde(deserialize_with = "list_or_empty")]
    pub equipos: Vec<Equipment>,
    #[serde(deserialize_with = "list_or_empty")]
    pub programa: Vec<ScheduleStep>,
}

impl OrderItem {
    /// Returns the caller-supplied folio (`id` first, then `FOLIO`).
    pub fn supplied_folio(&self) -> Option<&str> {
        non_blank(self.id.as_deref()).or_else(|| non_blank(self.folio.as_deref()))
    }

    /// Returns present line-item groups in fixed category order.
    pub fn line_groups(&self) -> Vec<(LineCategory, Vec<LineItem>)> {
        let groups = [
            (
                LineCategory::Materials,
                self.materiales.iter().cloned().map(LineItem::Material).collect::<Vec<_>>(),
            ),
            (
                LineCategory::Labor,
                self.mano_obra.iter().cloned().map(LineItem::Labor).collect(),
            ),
            (
                LineCategory::Tools,
                self.herramientas.iter().cloned().map(LineItem::Tool).collect(),
            ),
            (
                LineCategory::Equipment,
                self.equipos.iter().cloned().map(LineItem::Equipment).collect(),
            ),
            (
                LineCategory::Schedule,
                self.programa.iter().cloned().map(LineItem::ScheduleStep).collect(),
            ),
        ];
        groups
            .into_iter()
            .filter(|(_, items)| !items.is_empty())
            .collect()
    }

    /// Encodes checklist and additional costs as the `DETALLES_EXTRA` cell.
    ///
    /// Empty string when neither is present.
    pub fn extra_details(&self) -> String {
        let check_list = self.check_list.as_ref().filter(|value| is_truthy(value));
        let costs = self.additional_costs.as_ref().filter(|value| is_truthy(value));
        if check_list.is_none() && costs.is_none() {
            return String::new();
        }
        serde_json::json!({
            "checkList": self.check_list.clone().unwrap_or(Value::Null),
            "costs": self.additional_costs.clone().unwrap_or(Value::Null),
        })
        .to_string()
    }
}

/// Line-item category, one child table each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineCategory {
    Materials,
    Labor,
    Tools,
    Equipment,
    Schedule,
}

impl LineCategory {
    pub const ALL: [LineCategory; 5] = [
        LineCategory::Materials,
        LineCategory::Labor,
        LineCategory::Tools,
        LineCategory::Equipment,
        LineCategory::Schedule,
    ];

    /// Stable key used in write-plan idempotency tags.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Materials => "materials",
            Self::Labor => "labor",
            Self::Tools => "tools",
            Self::Equipment => "equipment",
            Self::Schedule => "schedule",
        }
    }

    /// Fixed child-table column set, `FOLIO` first.
    pub fn headers(self) -> &'static [&'static str] {
        match self {
            Self::Materials => &[
                "FOLIO",
                "CANTIDAD",
                "UNIDAD",
                "TIPO",
                "DESCRIPCION",
                "COSTO",
                "ESPECIFICACION",
                "TOTAL",
                "RESIDENTE",
                "COMPRAS",
                "CONTROLLER",
                "ORDEN_COMPRA",
                "PAGOS",
                "ALMACEN",
                "LOGISTICA",
                "RESIDENTE_OBRA",
            ],
            Self::Labor => &[
                "FOLIO",
                "CATEGORIA",
                "SALARIO",
                "PERSONAL",
                "SEMANAS",
                "EXTRAS",
                "NOCTURNO",
                "FIN_SEMANA",
                "OTROS",
                "TOTAL",
            ],
            Self::Tools => &[
                "FOLIO",
                "CANTIDAD",
                "UNIDAD",
                "DESCRIPCION",
                "COSTO",
                "TOTAL",
                "RESIDENTE",
                "CONTROLLER",
                "ALMACEN",
                "LOGISTICA",
                "RESIDENTE_FIN",
            ],
            Self::Equipment => &[
                "FOLIO",
                "CANTIDAD",
                "UNIDAD",
                "TIPO",
                "DESCRIPCION",
                "ESPECIFICACION",
                "DIAS",
                "HORAS",
                "COSTO",
                "TOTAL",
            ],
            Self::Schedule => &[
                "FOLIO",
                "DESCRIPCION",
                "FECHA",
                "DURACION",
                "UNIDAD_DURACION",
                "UNIDAD",
                "CANTIDAD",
                "PRECIO",
                "TOTAL",
                "RESPONSABLE",
                "SECCION",
                "ESTATUS",
            ],
        }
    }
}

/// Chain-of-custody sign-offs attached to materials and tools.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CustodyChain {
    #[serde(deserialize_with = "cell")]
    pub residente: String,
    #[serde(deserialize_with = "cell")]
    pub compras: String,
    #[serde(deserialize_with = "cell")]
    pub controller: String,
    #[serde(rename = "ordenCompra", deserialize_with = "cell")]
    pub orden_compra: String,
    #[serde(deserialize_with = "cell")]
    pub pagos: String,
    #[serde(deserialize_with = "cell")]
    pub almacen: String,
    #[serde(deserialize_with = "cell")]
    pub logistica: String,
    #[serde(rename = "residenteObra", deserialize_with = "cell")]
    pub residente_obra: String,
    #[serde(rename = "residenteFin", deserialize_with = "cell")]
    pub residente_fin: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Material {
    #[serde(deserialize_with = "cell")]
    pub quantity: String,
    #[serde(deserialize_with = "cell")]
    pub unit: String,
    #[serde(rename = "type", deserialize_with = "cell")]
    pub kind: String,
    #[serde(deserialize_with = "cell")]
    pub description: String,
    #[serde(deserialize_with = "cell")]
    pub cost: String,
    #[serde(deserialize_with = "cell")]
    pub spec: String,
    #[serde(deserialize_with = "cell")]
    pub total: String,
    #[serde(rename = "papaCaliente")]
    pub custody: Option<CustodyChain>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Labor {
    #[serde(deserialize_with = "cell")]
    pub category: String,
    #[serde(deserialize_with = "cell")]
    pub salary: String,
    #[serde(deserialize_with = "cell")]
    pub personnel: String,
    #[serde(deserialize_with = "cell")]
    pub weeks: String,
    #[serde(deserialize_with = "cell")]
    pub overtime: String,
    #[serde(deserialize_with = "cell")]
    pub night: String,
    #[serde(deserialize_with = "cell")]
    pub weekend: String,
    #[serde(deserialize_with = "cell")]
    pub others: String,
    #[serde(deserialize_with = "cell")]
    pub total: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Tool {
    #[serde(deserialize_with = "cell")]
    pub quantity: String,
    #[serde(deserialize_with = "cell")]
    pub unit: String,
    #[serde(deserialize_with = "cell")]
    pub description: String,
    #[serde(deserialize_with = "cell")]
    pub cost: String,
    #[serde(deserialize_with = "cell")]
    pub total: String,
    #[serde(rename = "papaCaliente")]
    pub custody: Option<CustodyChain>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Equipment {
    #[serde(deserialize_with = "cell")]
    pub quantity: String,
    #[serde(deserialize_with = "cell")]
    pub unit: String,
    #[serde(rename = "type", deserialize_with = "cell")]
    pub kind: String,
    #[serde(deserialize_with = "cell")]
    pub description: String,
    #[serde(deserialize_with = "cell")]
    pub spec: String,
    #[serde(deserialize_with = "cell")]
    pub days: String,
    #[serde(deserialize_with = "cell")]
    pub hours: String,
    #[serde(deserialize_with = "cell")]
    pub cost: String,
    #[serde(deserialize_with = "cell")]
    pub total: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScheduleStep {
    #[serde(deserialize_with = "cell")]
    pub seccion: String,
    #[serde(rename = "checkStatus", deserialize_with = "opt_cell")]
    pub check_status: Option<String>,
    #[serde(rename = "isActive", deserialize_with = "truthy")]
    pub is_active: bool,
    #[serde(deserialize_with = "cell")]
    pub description: String,
    #[serde(deserialize_with = "cell")]
    pub date: String,
    #[serde(deserialize_with = "cell")]
    pub duration: String,
    #[serde(rename = "durationUnit", deserialize_with = "cell")]
    pub duration_unit: String,
    #[serde(deserialize_with = "cell")]
    pub unit: String,
    #[serde(deserialize_with = "cell")]
    pub quantity: String,
    #[serde(deserialize_with = "cell")]
    pub price: String,
    #[serde(deserialize_with = "cell")]
    pub total: String,
    #[serde(deserialize_with = "joined_cell")]
    pub responsable: String,
}

impl ScheduleStep {
    /// `checkStatus` when set, else `APPLY`/`PENDING` from `isActive`.
    pub fn status(&self) -> &str {
        match non_blank(self.check_status.as_deref()) {
            Some(status) => status,
            None if self.is_active => "APPLY",
            None => "PENDING",
        }
    }
}

/// One line item of any category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineItem {
    Material(Material),
    Labor(Labor),
    Tool(Tool),
    Equipment(Equipment),
    ScheduleStep(ScheduleStep),
}

impl LineItem {
    /// Flattens this item (and its custody chain) into child-table fields.
    pub fn to_record(&self, folio: &str) -> Record {
        let mut record = Record::new();
        record.insert("FOLIO", folio);
        match self {
            Self::Material(item) => {
                record.insert("CANTIDAD", item.quantity.as_str());
                record.insert("UNIDAD", item.unit.as_str());
                record.insert("TIPO", item.kind.as_str());
                record.insert("DESCRIPCION", item.description.as_str());
                record.insert("COSTO", item.cost.as_str());
                record.insert("ESPECIFICACION", item.spec.as_str());
                record.insert("TOTAL", item.total.as_str());
                let custody = item.custody.clone().unwrap_or_default();
                record.insert("RESIDENTE", custody.residente);
                record.insert("COMPRAS", custody.compras);
                record.insert("CONTROLLER", custody.controller);
                record.insert("ORDEN_COMPRA", custody.orden_compra);
                record.insert("PAGOS", custody.pagos);
                record.insert("ALMACEN", custody.almacen);
                record.insert("LOGISTICA", custody.logistica);
                record.insert("RESIDENTE_OBRA", custody.residente_obra);
            }
            Self::Labor(item) => {
                record.insert("CATEGORIA", item.category.as_str());
                record.insert("SALARIO", item.salary.as_str());
                record.insert("PERSONAL", item.personnel.as_str());
                record.insert("SEMANAS", item.weeks.as_str());
                record.insert("EXTRAS", item.overtime.as_str());
                record.insert("NOCTURNO", item.night.as_str());
                record.insert("FIN_SEMANA", item.weekend.as_str());
                record.insert("OTROS", item.others.as_str());
                record.insert("TOTAL", item.total.as_str());
            }
            Self::Tool(item) => {
                record.insert("CANTIDAD", item.quantity.as_str());
                record.insert("UNIDAD", item.unit.as_str());
                record.insert("DESCRIPCION", item.description.as_str());
                record.insert("COSTO", item.cost.as_str());
                record.insert("TOTAL", item.total.as_str());
                let custody = item.custody.clone().unwrap_or_default();
                record.insert("RESIDENTE", custody.residente);
                record.insert("CONTROLLER", custody.controller);
                record.insert("ALMACEN", custody.almacen);
                record.insert("LOGISTICA", custody.logistica);
                record.insert("RESIDENTE_FIN", custody.residente_fin);
            }
            Self::Equipment(item) => {
                record.insert("CANTIDAD", item.quantity.as_str());
                record.insert("UNIDAD", item.unit.as_str());
                record.insert("TIPO", item.kind.as_str());
                record.insert("DESCRIPCION", item.description.as_str());
                record.insert("ESPECIFICACION", item.spec.as_str());
                record.insert("DIAS", item.days.as_str());
                record.insert("HORAS", item.hours.as_str());
                record.insert("COSTO", item.cost.as_str());
                record.insert("TOTAL", item.total.as_str());
            }
            Self::ScheduleStep(item) => {
                record.insert("SECCION", item.seccion.as_str());
                record.insert("ESTATUS", item.status());
                record.insert("DESCRIPCION", item.description.as_str());
                record.insert("FECHA", item.date.as_str());
                record.insert("DURACION", item.duration.as_str());
                record.insert("UNIDAD_DURACION", item.duration_unit.as_str());
                record.insert("UNIDAD", item.unit.as_str());
                record.insert("CANTIDAD", item.quantity.as_str());
                record.insert("PRECIO", item.price.as_str());
                record.insert("TOTAL", item.total.as_str());
                record.insert("RESPONSABLE", item.responsable.as_str());
            }
        }
        record
    }
}

/// Renders one JSON scalar as a sheet cell.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        other => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

fn cell<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(cell_text(&value))
}

fn opt_cell<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        other => Some(cell_text(&other)),
    })
}

fn joined_cell<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items.iter().map(cell_text).collect::<Vec<_>>().join(", "),
        other => cell_text(&other),
    })
}

fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(is_truthy(&value))
}

fn list_or_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::{parse_order_payload, LineCategory, LineItem, PayloadError};

    #[test]
    fn numeric_cells_are_accepted_as_text() {
        let items = parse_order_payload(
            r#"[{"materiales": [{"quantity": 10, "cost": 2.5, "description": null}]}]"#,
        )
        .expect("payload should decode");
        let material = &items[0].materiales[0];
        assert_eq!(material.quantity, "10");
        assert_eq!(material.cost, "2.5");
        assert_eq!(material.description, "");
    }

    #[test]
    fn custody_chain_is_flattened_into_material_record() {
        let items = parse_order_payload(
            r#"[{"materiales": [{"description": "Cable", "papaCaliente": {"residente": "Ana", "ordenCompra": "OC-9"}}]}]"#,
        )
        .expect("payload should decode");
        let record = LineItem::Material(items[0].materiales[0].clone()).to_record("F-1");
        assert_eq!(record.get("FOLIO"), Some("F-1"));
        assert_eq!(record.get("RESIDENTE"), Some("Ana"));
        assert_eq!(record.get("ORDEN_COMPRA"), Some("OC-9"));
        assert_eq!(record.get("LOGISTICA"), Some(""));
    }

    #[test]
    fn schedule_status_prefers_check_status_then_active_flag() {
        let items = parse_order_payload(
            r#"[{"programa": [
                {"checkStatus": "DONE", "isActive": true},
                {"isActive": true, "responsable": ["Ana", "Luis"]},
                {}
            ]}]"#,
        )
        .expect("payload should decode");
        let steps = &items[0].programa;
        assert_eq!(steps[0].status(), "DONE");
        assert_eq!(steps[1].status(), "APPLY");
        assert_eq!(steps[1].responsable, "Ana, Luis");
        assert_eq!(steps[2].status(), "PENDING");
    }

    #[test]
    fn line_groups_skip_absent_categories() {
        let items =
            parse_order_payload(r#"[{"manoObra": [{"category": "Oficial"}], "equipos": []}]"#)
                .expect("payload should decode");
        let groups = items[0].line_groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].0, LineCategory::Labor);
    }

    #[test]
    fn supplied_folio_ignores_blank_id() {
        let items = parse_order_payload(r#"[{"id": " ", "FOLIO": "0042"}]"#)
            .expect("payload should decode");
        assert_eq!(items[0].supplied_folio(), Some("0042"));
    }

    #[test]
    fn extra_details_only_when_checklist_or_costs_present() {
        let items = parse_order_payload(
            r#"[{"checkList": []}, {"checkList": ["casco"], "additionalCosts": null}]"#,
        )
        .expect("payload should decode");
        assert_eq!(items[0].extra_details(), "");
        let encoded: serde_json::Value =
            serde_json::from_str(&items[1].extra_details()).expect("details should be JSON");
        assert_eq!(encoded["checkList"][0], "casco");
        assert!(encoded["costs"].is_null());
    }

    #[test]
    fn non_array_payload_is_rejected() {
        let err = parse_order_payload(r#"{"id": "1"}"#).expect_err("object must be rejected");
        assert!(matches!(err, PayloadError::NotAList));
    }
}
