//! Dashboard and summary aggregates

use chrono::{DateTime, Duration, NaiveDate, Utc};
use inspection_engine::{EngineError, EngineResult};
use inspection_types::{Inspection, InspectionStatus, Plant, PlantId, User, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Window used when the caller gives no lower bound
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Plants listed in the dashboard ranking
pub const TOP_PLANTS: usize = 10;

/// Inclusive reporting window over `inspected_at`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl ReportRange {
    /// Fill missing bounds: `to` defaults to `now`, `from` to 30 days before `to`
    pub fn resolve(
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> EngineResult<Self> {
        let to = to.unwrap_or(now);
        let from = from.unwrap_or(to - Duration::days(DEFAULT_WINDOW_DAYS));
        if from > to {
            return Err(EngineError::validation(
                "fecha_desde must not be after fecha_hasta",
            ));
        }
        Ok(Self { from, to })
    }
}

/// Rounded to two decimals; zero when `total` is zero
pub fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64 * 10_000.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTotals {
    pub total: u64,
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
}

impl StatusTotals {
    pub fn tally<'a>(inspections: impl IntoIterator<Item = &'a Inspection>) -> Self {
        let mut totals = Self::default();
        for inspection in inspections {
            totals.add(inspection.status);
        }
        totals
    }

    fn add(&mut self, status: InspectionStatus) {
        self.total += 1;
        match status {
            InspectionStatus::Pending => self.pending += 1,
            InspectionStatus::Approved => self.approved += 1,
            InspectionStatus::Rejected => self.rejected += 1,
        }
    }

    pub fn count(&self, status: InspectionStatus) -> u64 {
        match status {
            InspectionStatus::Pending => self.pending,
            InspectionStatus::Approved => self.approved,
            InspectionStatus::Rejected => self.rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusShare {
    pub status: InspectionStatus,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantCount {
    pub plant_id: PlantId,
    pub plant: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectorBreakdown {
    pub inspector_id: UserId,
    pub inspector: String,
    #[serde(flatten)]
    pub totals: StatusTotals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogTotals {
    pub users: u64,
    pub plants: u64,
    pub shipping_lines: u64,
}

/// Everything the dashboard screen shows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub range: ReportRange,
    pub totals: StatusTotals,
    pub catalog: CatalogTotals,
    pub by_status: Vec<StatusShare>,
    pub by_day: Vec<DailyCount>,
    pub top_plants: Vec<PlantCount>,
    pub by_inspector: Vec<InspectorBreakdown>,
}

impl Dashboard {
    /// Aggregate `inspections`, which must already be limited to `range`
    pub fn compute(
        range: ReportRange,
        inspections: &[Inspection],
        plants: &[Plant],
        users: &[User],
        catalog: CatalogTotals,
    ) -> Self {
        let totals = StatusTotals::tally(inspections);

        let by_status = InspectionStatus::ALL
            .into_iter()
            .map(|status| {
                let count = totals.count(status);
                StatusShare {
                    status,
                    count,
                    percentage: percentage(count, totals.total),
                }
            })
            .collect();

        let mut days: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        for inspection in inspections {
            *days.entry(inspection.inspected_at.date_naive()).or_default() += 1;
        }
        let by_day = days
            .into_iter()
            .map(|(date, count)| DailyCount { date, count })
            .collect();

        let plant_names: HashMap<PlantId, &str> =
            plants.iter().map(|p| (p.id, p.name.as_str())).collect();
        let mut per_plant: HashMap<PlantId, u64> = HashMap::new();
        for inspection in inspections {
            *per_plant.entry(inspection.plant_id).or_default() += 1;
        }
        let mut top_plants: Vec<PlantCount> = per_plant
            .into_iter()
            .map(|(plant_id, count)| PlantCount {
                plant_id,
                plant: plant_names
                    .get(&plant_id)
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| plant_id.to_string()),
                count,
            })
            .collect();
        top_plants.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.plant.cmp(&b.plant)));
        top_plants.truncate(TOP_PLANTS);

        let user_names: HashMap<UserId, &str> =
            users.iter().map(|u| (u.id, u.name.as_str())).collect();
        let mut per_inspector: HashMap<UserId, StatusTotals> = HashMap::new();
        for inspection in inspections {
            per_inspector
                .entry(inspection.inspector_id)
                .or_default()
                .add(inspection.status);
        }
        let mut by_inspector: Vec<InspectorBreakdown> = per_inspector
            .into_iter()
            .map(|(inspector_id, totals)| InspectorBreakdown {
                inspector_id,
                inspector: user_names
                    .get(&inspector_id)
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| inspector_id.to_string()),
                totals,
            })
            .collect();
        by_inspector.sort_by(|a, b| {
            b.totals
                .total
                .cmp(&a.totals.total)
                .then_with(|| a.inspector.cmp(&b.inspector))
        });

        Self {
            range,
            totals,
            catalog,
            by_status,
            by_day,
            top_plants,
            by_inspector,
        }
    }
}

/// Headline numbers for a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub range: ReportRange,
    #[serde(flatten)]
    pub totals: StatusTotals,
    /// approved / total * 100, two decimals
    pub approval_rate: f64,
}

impl Summary {
    pub fn compute(range: ReportRange, inspections: &[Inspection]) -> Self {
        let totals = StatusTotals::tally(inspections);
        Self {
            range,
            totals,
            approval_rate: percentage(totals.approved, totals.total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use inspection_types::{Role, ShippingLineId};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 10, 0, 0).unwrap()
    }

    fn inspection(plant: PlantId, inspector: UserId, day: u32, status: InspectionStatus) -> Inspection {
        let mut i = Inspection::new(
            "C1".into(),
            plant,
            ShippingLineId::generate(),
            inspector,
            at(day),
        );
        i.status = status;
        i
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(5, 5), 100.0);
    }

    #[test]
    fn test_range_defaults_to_thirty_days() {
        let now = at(31);
        let range = ReportRange::resolve(None, None, now).unwrap();
        assert_eq!(range.to, now);
        assert_eq!(range.from, now - Duration::days(30));

        assert!(ReportRange::resolve(Some(at(5)), Some(at(1)), now).is_err());
    }

    #[test]
    fn test_dashboard_aggregates() {
        let p1 = Plant::new("P1".into(), "North".into(), None);
        let p2 = Plant::new("P2".into(), "South".into(), None);
        let ana = User::new("Ana".into(), "ana@x.io".into(), Role::Inspector);
        let bob = User::new("Bob".into(), "bob@x.io".into(), Role::Inspector);

        let inspections = vec![
            inspection(p1.id, ana.id, 1, InspectionStatus::Approved),
            inspection(p1.id, ana.id, 1, InspectionStatus::Pending),
            inspection(p1.id, bob.id, 2, InspectionStatus::Rejected),
            inspection(p2.id, bob.id, 3, InspectionStatus::Approved),
        ];
        let range = ReportRange { from: at(1), to: at(30) };
        let catalog = CatalogTotals { users: 2, plants: 2, shipping_lines: 0 };
        let dash = Dashboard::compute(
            range,
            &inspections,
            &[p1.clone(), p2],
            &[ana.clone(), bob],
            catalog,
        );

        assert_eq!(dash.totals.total, 4);
        assert_eq!(dash.totals.approved, 2);
        assert_eq!(dash.by_status[1].status, InspectionStatus::Approved);
        assert_eq!(dash.by_status[1].percentage, 50.0);
        assert_eq!(dash.by_day.len(), 3);
        assert_eq!(dash.by_day[0].count, 2);
        assert_eq!(dash.top_plants[0].plant, "North");
        assert_eq!(dash.top_plants[0].count, 3);

        let ana_row = dash
            .by_inspector
            .iter()
            .find(|r| r.inspector_id == ana.id)
            .unwrap();
        assert_eq!(ana_row.inspector, "Ana");
        assert_eq!(ana_row.totals.pending, 1);
        assert_eq!(ana_row.totals.approved, 1);
    }

    #[test]
    fn test_summary_approval_rate() {
        let plant = PlantId::generate();
        let user = UserId::generate();
        let range = ReportRange { from: at(1), to: at(30) };

        let empty = Summary::compute(range, &[]);
        assert_eq!(empty.approval_rate, 0.0);

        let inspections = vec![
            inspection(plant, user, 1, InspectionStatus::Approved),
            inspection(plant, user, 1, InspectionStatus::Rejected),
            inspection(plant, user, 1, InspectionStatus::Pending),
        ];
        let summary = Summary::compute(range, &inspections);
        assert_eq!(summary.totals.total, 3);
        assert_eq!(summary.approval_rate, 33.33);
    }
}
