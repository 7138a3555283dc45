//! Role-scoped report generation over the inspection store

use crate::csv::{self, ExportHeader, ExportRow};
use crate::dashboard::{CatalogTotals, Dashboard, ReportRange, Summary};
use chrono::Utc;
use inspection_engine::{
    scope_to_caller, EngineResult, InspectionFilter, InspectionStorage, PageRequest, PlantStorage,
    ShippingLineStorage, Storage, UserStorage,
};
use inspection_policy::{AccessGate, Action, Module};
use inspection_types::{Caller, PlantId, ShippingLineId, User, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// A rendered CSV document
#[derive(Debug, Clone)]
pub struct CsvExport {
    pub file_name: String,
    pub body: String,
    pub rows: usize,
}

/// Read-only reporting service
#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn Storage>,
    gate: AccessGate,
}

impl ReportService {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self {
            store,
            gate: AccessGate::new(),
        }
    }

    fn range_filter(caller: &Caller, range: &ReportRange) -> InspectionFilter {
        scope_to_caller(
            caller,
            InspectionFilter {
                from: Some(range.from),
                to: Some(range.to),
                ..InspectionFilter::default()
            },
        )
    }

    /// Dashboard aggregates; inspectors only see their own inspections
    pub async fn dashboard(&self, caller: &Caller, range: ReportRange) -> EngineResult<Dashboard> {
        self.gate.require(caller, Module::Reports, Action::Read)?;

        let inspections = self
            .store
            .find_inspections(&Self::range_filter(caller, &range))
            .await?;
        let plants = self.store.list_plants().await?;
        let users = self.store.list_users(true).await?;
        let lines = self.store.list_shipping_lines().await?;

        let catalog = CatalogTotals {
            users: users.len() as u64,
            plants: plants.len() as u64,
            shipping_lines: lines.len() as u64,
        };

        info!(user_id = %caller.user_id, role = %caller.role, inspections = inspections.len(), "Dashboard generated");
        Ok(Dashboard::compute(range, &inspections, &plants, &users, catalog))
    }

    /// Totals and approval rate for a period
    pub async fn summary(&self, caller: &Caller, range: ReportRange) -> EngineResult<Summary> {
        self.gate.require(caller, Module::Reports, Action::Read)?;
        let inspections = self
            .store
            .find_inspections(&Self::range_filter(caller, &range))
            .await?;
        Ok(Summary::compute(range, &inspections))
    }

    /// CSV export using the listing filters and ordering
    pub async fn export_csv(
        &self,
        caller: &Caller,
        filter: InspectionFilter,
        order: PageRequest,
    ) -> EngineResult<CsvExport> {
        self.gate
            .require(caller, Module::Inspections, Action::Export)?;

        let filter = scope_to_caller(caller, filter);
        let mut inspections = self.store.find_inspections(&filter).await?;
        inspections.sort_by(|a, b| order.compare(a, b));

        let plants: HashMap<PlantId, String> = self
            .store
            .list_plants()
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();
        let lines: HashMap<ShippingLineId, String> = self
            .store
            .list_shipping_lines()
            .await?
            .into_iter()
            .map(|l| (l.id, l.name))
            .collect();
        let users: HashMap<UserId, User> = self
            .store
            .list_users(true)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let rows: Vec<ExportRow> = inspections
            .iter()
            .map(|i| ExportRow {
                inspected_at: i.inspected_at,
                container_number: i.container_number.clone(),
                plant: plants.get(&i.plant_id).cloned().unwrap_or_default(),
                shipping_line: lines.get(&i.shipping_line_id).cloned().unwrap_or_default(),
                inspector: users
                    .get(&i.inspector_id)
                    .map(|u| u.name.clone())
                    .unwrap_or_default(),
                status: i.status,
            })
            .collect();

        let mut described = Vec::new();
        if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            described.push(format!("Búsqueda: {q}"));
        }
        if let Some(id) = filter.plant_id {
            let name = plants.get(&id).cloned().unwrap_or_else(|| id.to_string());
            described.push(format!("Planta: {name}"));
        }
        if let Some(id) = filter.shipping_line_id {
            let name = lines.get(&id).cloned().unwrap_or_else(|| id.to_string());
            described.push(format!("Naviera: {name}"));
        }
        if let Some(status) = filter.status {
            described.push(format!("Estado: {}", status.label_es()));
        }
        if let Some(from) = filter.from {
            described.push(format!("Desde: {}", from.format("%Y-%m-%d")));
        }
        if let Some(to) = filter.to {
            described.push(format!("Hasta: {}", to.format("%Y-%m-%d")));
        }
        if let Some(id) = filter.inspector_id {
            let name = users
                .get(&id)
                .map(|u| u.name.clone())
                .unwrap_or_else(|| id.to_string());
            described.push(format!("Inspector: {name}"));
        }

        let generated_at = Utc::now();
        let (user_name, user_email) = users
            .get(&caller.user_id)
            .map(|u| (u.name.clone(), u.email.clone()))
            .unwrap_or_default();
        let header = ExportHeader {
            generated_at,
            user_name,
            user_email,
            filters: described,
        };

        let body = csv::render(&header, &rows);
        info!(user_id = %caller.user_id, rows = rows.len(), "CSV export generated");

        Ok(CsvExport {
            file_name: csv::file_name(&generated_at),
            body,
            rows: rows.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use inspection_engine::{
        EngineError, InMemoryStorage, InspectionStorage, PlantStorage, ShippingLineStorage,
        UserStorage,
    };
    use inspection_types::{Inspection, InspectionStatus, Plant, Role, ShippingLine};

    struct Seeded {
        reports: ReportService,
        admin: Caller,
        inspector: Caller,
        plant: Plant,
    }

    async fn seeded() -> Seeded {
        let store = Arc::new(InMemoryStorage::new());
        let admin = User::new("Ada".into(), "ada@example.com".into(), Role::Admin);
        let ines = User::new("Ines".into(), "ines@example.com".into(), Role::Inspector);
        let otto = User::new("Otto".into(), "otto@example.com".into(), Role::Inspector);
        let plant = Plant::new("P1".into(), "North".into(), None);
        let line = ShippingLine::new("L1".into(), "Blue Line".into());
        for u in [&admin, &ines, &otto] {
            store.upsert_user(u.clone()).await.unwrap();
        }
        store.upsert_plant(plant.clone()).await.unwrap();
        store.upsert_shipping_line(line.clone()).await.unwrap();

        for (who, status) in [
            (&ines, InspectionStatus::Approved),
            (&ines, InspectionStatus::Pending),
            (&otto, InspectionStatus::Rejected),
        ] {
            let mut i = Inspection::new(
                "MSCU1234567".into(),
                plant.id,
                line.id,
                who.id,
                Utc::now() - Duration::hours(1),
            );
            i.status = status;
            store.insert_inspection(i).await.unwrap();
        }

        Seeded {
            reports: ReportService::new(store),
            admin: Caller::new(admin.id, Role::Admin),
            inspector: Caller::new(ines.id, Role::Inspector),
            plant,
        }
    }

    fn last_month() -> ReportRange {
        ReportRange::resolve(None, None, Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn test_dashboard_scoped_for_inspector() {
        let s = seeded().await;

        let all = s.reports.dashboard(&s.admin, last_month()).await.unwrap();
        assert_eq!(all.totals.total, 3);
        assert_eq!(all.catalog.users, 3);

        let own = s.reports.dashboard(&s.inspector, last_month()).await.unwrap();
        assert_eq!(own.totals.total, 2);
        assert_eq!(own.by_inspector.len(), 1);
        assert_eq!(own.top_plants[0].plant, "North");
    }

    #[tokio::test]
    async fn test_summary() {
        let s = seeded().await;
        let summary = s.reports.summary(&s.admin, last_month()).await.unwrap();
        assert_eq!(summary.totals.total, 3);
        assert_eq!(summary.approval_rate, 33.33);

        let old = ReportRange::resolve(
            Some(Utc::now() - Duration::days(90)),
            Some(Utc::now() - Duration::days(60)),
            Utc::now(),
        )
        .unwrap();
        let summary = s.reports.summary(&s.admin, old).await.unwrap();
        assert_eq!(summary.totals.total, 0);
        assert_eq!(summary.approval_rate, 0.0);
    }

    #[tokio::test]
    async fn test_export_admin_only() {
        let s = seeded().await;
        let err = s
            .reports
            .export_csv(&s.inspector, InspectionFilter::default(), PageRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_export_content() {
        let s = seeded().await;
        let filter = InspectionFilter {
            plant_id: Some(s.plant.id),
            status: Some(InspectionStatus::Approved),
            ..Default::default()
        };
        let export = s
            .reports
            .export_csv(&s.admin, filter, PageRequest::default())
            .await
            .unwrap();

        assert_eq!(export.rows, 1);
        assert!(export.file_name.starts_with("reporte_inspecciones_"));
        assert!(export.body.contains("\"Usuario: Ada (ada@example.com)\""));
        assert!(export
            .body
            .contains("\"Filtros: Planta: North, Estado: Aprobada\""));
        assert!(export
            .body
            .contains("\"MSCU1234567\";\"North\";\"Blue Line\";\"Ines\";\"Aprobada\""));
    }
}
