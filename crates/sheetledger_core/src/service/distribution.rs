//! Order fan-out write path.
//!
//! # Responsibility
//! - Resolve one folio per order item (supplied, generated or fallback).
//! - Build a complete `WritePlan` before touching the store.
//! - Execute the plan with per-step retry and resumable partial failure.
//!
//! # Invariants
//! - Every step carries a unique `WriteKey`; a completed key is never
//!   written again, so re-running a plan cannot duplicate rows.
//! - A target table gets its header row before its first data row.
//! - Completed steps are never rolled back.
//! - Once a step fails, later steps into the same table are deferred, so
//!   rows land in plan order within each table.
//! - Receipt ids follow input order.

use crate::config::LedgerConfig;
use crate::folio::{fallback_folio, Clock, FolioGenerator};
use crate::model::order::{LineCategory, OrderItem};
use crate::model::record::{Record, Row};
use crate::sequence::{SequenceError, SequenceStore};
use crate::service::child_writer::{project_record, ChildTableWriter};
use crate::store::{ensure_table, SheetStore, StoreResult, TableDims};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Column set shared by the ledger, the mirror and every shard table.
pub const PARENT_HEADERS: [&str; 23] = [
    "ID",
    "ESPECIALIDAD",
    "DESCRIPCION",
    "RESPONSABLE",
    "FECHA",
    "RELOJ",
    "CUMPLIMIENTO",
    "ARCHIVO",
    "COMENTARIOS",
    "COMENTARIOS PREVIOS",
    "ESTATUS",
    "AVANCE",
    "CLASIFICACION",
    "PRIORIDAD",
    "RIESGOS",
    "FECHA_RESPUESTA",
    "DETALLES_EXTRA",
    "CLIENTE",
    "TRABAJO",
    "REQUISITOR",
    "CONTACTO",
    "CELULAR",
    "FECHA_COTIZACION",
];

pub const INITIAL_STATUS: &str = "ASIGNADO";
pub const INITIAL_PROGRESS: &str = "0%";
const LEDGER_DATE_FORMAT: &str = "%d/%m/%y";

/// Where a planned row lands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum WriteTarget {
    Child(LineCategory),
    Ledger,
    Mirror,
    /// Per-responsible copy of the parent row.
    Shard(String),
}

impl Display for WriteTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Child(category) => write!(f, "child/{}", category.as_str()),
            Self::Ledger => write!(f, "ledger"),
            Self::Mirror => write!(f, "mirror"),
            Self::Shard(name) => write!(f, "shard/{name}"),
        }
    }
}

/// Idempotency key of one write step.
///
/// `item` is the position of the order item in its payload, so two items
/// sharing a supplied folio still get distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WriteKey {
    pub item: usize,
    pub folio: String,
    pub target: WriteTarget,
    pub ordinal: usize,
}

impl Display for WriteKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}#{}@{}#{}",
            self.folio, self.item, self.target, self.ordinal
        )
    }
}

/// One row append, fully materialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteStep {
    pub key: WriteKey,
    pub table: String,
    /// Header row written when `table` is absent or empty.
    pub headers: Vec<String>,
    pub row: Row,
}

/// Ordered write steps plus the keys already applied.
///
/// Serializable so a partially applied plan can be persisted and resumed
/// by another process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WritePlan {
    id: Uuid,
    folios: Vec<String>,
    steps: Vec<WriteStep>,
    completed: BTreeSet<WriteKey>,
}

impl WritePlan {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Folios assigned by this plan, in input order.
    pub fn folios(&self) -> &[String] {
        &self.folios
    }

    pub fn steps(&self) -> &[WriteStep] {
        &self.steps
    }

    pub fn is_completed(&self, key: &WriteKey) -> bool {
        self.completed.contains(key)
    }

    /// Steps not yet applied, in plan order.
    pub fn pending(&self) -> impl Iterator<Item = &WriteStep> {
        self.steps
            .iter()
            .filter(|step| !self.completed.contains(&step.key))
    }

    pub fn is_complete(&self) -> bool {
        self.pending().next().is_none()
    }
}

/// A step that still failed after its last attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedWrite {
    pub key: WriteKey,
    pub table: String,
    pub attempts: u32,
    pub message: String,
}

/// Successful outcome of a distribution run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReceipt {
    pub plan_id: Uuid,
    /// Assigned folios in input order.
    pub ids: Vec<String>,
    /// Rows appended by this run, header rows excluded.
    pub rows_written: usize,
}

#[derive(Debug)]
pub enum DistributionError {
    /// Folio generation could not allocate a sequence value. Nothing was
    /// written.
    Sequence(SequenceError),
    /// Some steps failed after retries. `plan` keeps the completed keys and
    /// can be passed to `DistributionEngine::resume`.
    PartialWrite {
        ids: Vec<String>,
        failures: Vec<FailedWrite>,
        plan: Box<WritePlan>,
    },
}

impl Display for DistributionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequence(err) => write!(f, "folio allocation failed: {err}"),
            Self::PartialWrite { failures, plan, .. } => {
                write!(
                    f,
                    "partial write: {} of {} steps failed",
                    failures.len(),
                    plan.steps().len()
                )?;
                if let Some(first) = failures.first() {
                    write!(f, "; first failure at `{}`: {}", first.table, first.message)?;
                }
                Ok(())
            }
        }
    }
}

impl Error for DistributionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sequence(err) => Some(err),
            Self::PartialWrite { .. } => None,
        }
    }
}

impl From<SequenceError> for DistributionError {
    fn from(value: SequenceError) -> Self {
        Self::Sequence(value)
    }
}

/// Fan-out engine from order payloads to ledger, mirror, shard and child
/// tables.
pub struct DistributionEngine<S: SheetStore, Q: SequenceStore, C: Clock> {
    store: S,
    folios: FolioGenerator<Q, C>,
    config: LedgerConfig,
}

impl<S: SheetStore, Q: SequenceStore, C: Clock> DistributionEngine<S, Q, C> {
    pub fn new(store: S, sequences: Q, clock: C, config: LedgerConfig) -> Self {
        let folios =
            FolioGenerator::with_sequence_key(sequences, clock, config.sequence_key.clone());
        Self {
            store,
            folios,
            config,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn folios(&self) -> &FolioGenerator<Q, C> {
        &self.folios
    }

    /// Plans and executes the fan-out of `items`.
    pub fn process_order(
        &self,
        items: &[OrderItem],
        active_user: &str,
    ) -> Result<OrderReceipt, DistributionError> {
        let plan = self.plan_order(items, active_user)?;
        self.execute(plan)
    }

    /// Re-runs the pending steps of a previously failed plan.
    pub fn resume(&self, plan: WritePlan) -> Result<OrderReceipt, DistributionError> {
        info!(
            "event=order_resume module=distribution status=start plan_id={} pending={}",
            plan.id,
            plan.pending().count()
        );
        self.execute(plan)
    }

    /// Resolves folios and materializes every row without writing.
    pub fn plan_order(
        &self,
        items: &[OrderItem],
        active_user: &str,
    ) -> Result<WritePlan, DistributionError> {
        let today = self
            .folios
            .clock()
            .today()
            .format(LEDGER_DATE_FORMAT)
            .to_string();
        let parent_headers = PARENT_HEADERS
            .iter()
            .map(|label| label.to_string())
            .collect::<Vec<_>>();

        let mut folios = Vec::with_capacity(items.len());
        let mut steps = Vec::new();
        for (index, item) in items.iter().enumerate() {
            let folio = self.resolve_folio(item, active_user)?;
            let key = |target: WriteTarget, ordinal: usize| WriteKey {
                item: index,
                folio: folio.clone(),
                target,
                ordinal,
            };

            for (category, lines) in item.line_groups() {
                let records = lines
                    .iter()
                    .map(|line| line.to_record(&folio))
                    .collect::<Vec<_>>();
                let headers = category.headers();
                let header_row = headers
                    .iter()
                    .map(|label| label.to_string())
                    .collect::<Vec<_>>();
                let table = self.config.child_tables.table_for(category);
                for (ordinal, row) in ChildTableWriter::<&S>::build_rows(&records, headers)
                    .into_iter()
                    .enumerate()
                {
                    steps.push(WriteStep {
                        key: key(WriteTarget::Child(category), ordinal),
                        table: table.to_string(),
                        headers: header_row.clone(),
                        row,
                    });
                }
            }

            let parent_row = project_record(&parent_record(item, &folio, &today), &PARENT_HEADERS);
            let mut parent_step = |target: WriteTarget, table: &str| {
                steps.push(WriteStep {
                    key: key(target, 0),
                    table: table.to_string(),
                    headers: parent_headers.clone(),
                    row: parent_row.clone(),
                });
            };
            parent_step(WriteTarget::Ledger, self.config.ledger_table.as_str());
            parent_step(WriteTarget::Mirror, self.config.mirror_table.as_str());
            for name in shard_names(&item.responsable, &self.config.sales_marker) {
                parent_step(WriteTarget::Shard(name.clone()), name.as_str());
            }

            folios.push(folio);
        }

        let plan = WritePlan {
            id: Uuid::new_v4(),
            folios,
            steps,
            completed: BTreeSet::new(),
        };
        info!(
            "event=order_plan module=distribution status=ok plan_id={} items={} steps={} user={active_user}",
            plan.id,
            items.len(),
            plan.steps.len()
        );
        Ok(plan)
    }

    fn resolve_folio(&self, item: &OrderItem, active_user: &str) -> Result<String, SequenceError> {
        if let Some(folio) = item.supplied_folio() {
            return Ok(folio.to_string());
        }
        if active_user == self.config.prework_order_user {
            return self.folios.generate(
                item.cliente.as_deref().unwrap_or_default(),
                item.especialidad.as_deref().unwrap_or_default(),
            );
        }
        Ok(fallback_folio(
            &self.config.fallback_prefix,
            &mut rand::rng(),
        ))
    }

    fn execute(&self, mut plan: WritePlan) -> Result<OrderReceipt, DistributionError> {
        let dims = self.config.table_dims();
        let mut ensured = HashSet::new();
        // Tables with a failed step; their later steps wait for resume.
        let mut blocked: HashSet<String> = HashSet::new();
        let mut failures = Vec::new();
        let mut deferred = 0;
        let mut rows_written = 0;

        for index in 0..plan.steps.len() {
            let step = &plan.steps[index];
            if plan.is_completed(&step.key) {
                continue;
            }
            if blocked.contains(&step.table) {
                deferred += 1;
                continue;
            }
            match self.apply_with_retry(step, dims, &mut ensured) {
                Ok(()) => {
                    let key = step.key.clone();
                    plan.completed.insert(key);
                    rows_written += 1;
                }
                Err(failure) => {
                    blocked.insert(step.table.clone());
                    failures.push(failure);
                }
            }
        }

        if failures.is_empty() {
            info!(
                "event=order_write module=distribution status=ok plan_id={} ids={} rows={rows_written}",
                plan.id,
                plan.folios.len()
            );
            return Ok(OrderReceipt {
                plan_id: plan.id,
                ids: plan.folios,
                rows_written,
            });
        }

        error!(
            "event=order_write module=distribution status=error plan_id={} failed={} deferred={deferred} rows={rows_written}",
            plan.id,
            failures.len()
        );
        Err(DistributionError::PartialWrite {
            ids: plan.folios.clone(),
            failures,
            plan: Box::new(plan),
        })
    }

    fn apply_with_retry(
        &self,
        step: &WriteStep,
        dims: TableDims,
        ensured: &mut HashSet<String>,
    ) -> Result<(), FailedWrite> {
        let max_attempts = self.config.max_write_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.apply(step, dims, ensured) {
                Ok(()) => return Ok(()),
                Err(err) if attempt < max_attempts => {
                    warn!(
                        "event=write_step module=distribution status=retry key={} attempt={attempt} error={err}",
                        step.key
                    );
                    attempt += 1;
                }
                Err(err) => {
                    warn!(
                        "event=write_step module=distribution status=error key={} attempts={attempt} error={err}",
                        step.key
                    );
                    return Err(FailedWrite {
                        key: step.key.clone(),
                        table: step.table.clone(),
                        attempts: attempt,
                        message: err.to_string(),
                    });
                }
            }
        }
    }

    fn apply(
        &self,
        step: &WriteStep,
        dims: TableDims,
        ensured: &mut HashSet<String>,
    ) -> StoreResult<()> {
        if !ensured.contains(&step.table) {
            ensure_table(&self.store, &step.table, &step.headers, dims)?;
            ensured.insert(step.table.clone());
        }
        self.store.append_row(&step.table, &step.row)
    }
}

/// Shard table names from a comma-separated responsible list.
///
/// Names are trimmed and deduplicated case-insensitively, keeping the
/// first spelling; blanks and names containing `sales_marker`
/// (case-insensitive) are dropped.
pub fn shard_names(responsable: &str, sales_marker: &str) -> Vec<String> {
    let marker = sales_marker.trim().to_uppercase();
    let mut names: Vec<String> = Vec::new();
    for name in responsable.split(',').map(str::trim) {
        if name.is_empty() || (!marker.is_empty() && name.to_uppercase().contains(&marker)) {
            continue;
        }
        let folded = name.to_lowercase();
        if !names.iter().any(|known| known.to_lowercase() == folded) {
            names.push(name.to_string());
        }
    }
    names
}

fn parent_record(item: &OrderItem, folio: &str, today: &str) -> Record {
    let text = |value: &Option<String>| value.clone().unwrap_or_default();
    let or = |value: &Option<String>, default: &str| {
        value.clone().unwrap_or_else(|| default.to_string())
    };
    let priority = item
        .prioridad
        .as_deref()
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| text(&item.prioridades));

    let mut record = Record::new();
    record.insert("ID", folio);
    record.insert("ESPECIALIDAD", text(&item.especialidad));
    record.insert("DESCRIPCION", text(&item.concepto));
    record.insert("RESPONSABLE", item.responsable.as_str());
    record.insert("FECHA", today);
    record.insert("RELOJ", or(&item.horas, "0"));
    record.insert("CUMPLIMIENTO", or(&item.cumplimiento, "NO"));
    record.insert("ARCHIVO", text(&item.archivo_url));
    record.insert("COMENTARIOS", text(&item.comentarios));
    record.insert("COMENTARIOS PREVIOS", text(&item.comentarios_previos));
    record.insert("ESTATUS", INITIAL_STATUS);
    record.insert("AVANCE", INITIAL_PROGRESS);
    record.insert("CLASIFICACION", or(&item.clasificacion, "Media"));
    record.insert("PRIORIDAD", priority);
    record.insert("RIESGOS", text(&item.riesgos));
    record.insert("FECHA_RESPUESTA", text(&item.fecha_respuesta));
    record.insert("DETALLES_EXTRA", item.extra_details());
    record.insert("CLIENTE", text(&item.cliente));
    record.insert("TRABAJO", text(&item.trabajo));
    record.insert("REQUISITOR", text(&item.requisitor));
    record.insert("CONTACTO", text(&item.contacto));
    record.insert("CELULAR", text(&item.celular));
    record.insert("FECHA_COTIZACION", text(&item.fecha_cotizacion));
    record
}
