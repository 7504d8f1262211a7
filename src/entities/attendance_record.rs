use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Check-in/check-out pair for one employee on one work date.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub employee_id: Uuid,
    pub work_date: NaiveDate,
    pub check_in: NaiveTime,
    pub check_out: Option<NaiveTime>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub registered_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::EmployeeId",
        to = "super::employee::Column::Id",
        on_delete = "Cascade"
    )]
    Employee,
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_complete(&self) -> bool {
        self.check_out.is_some()
    }

    /// Worked time; a check-out earlier than the check-in wraps past midnight.
    pub fn shift_duration(&self) -> Option<Duration> {
        let check_out = self.check_out?;
        let start = self.work_date.and_time(self.check_in);
        let mut end = self.work_date.and_time(check_out);
        if end < start {
            end += Duration::days(1);
        }
        Some(end - start)
    }

    /// `"{h}h {m}m"`, or `"pending"` while the shift is open.
    pub fn shift_duration_label(&self) -> String {
        match self.shift_duration() {
            Some(duration) => {
                let minutes = duration.num_minutes();
                format!("{}h {}m", minutes / 60, minutes % 60)
            }
            None => "pending".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(check_in: (u32, u32), check_out: Option<(u32, u32)>) -> Model {
        Model {
            id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            work_date: NaiveDate::from_ymd_opt(2024, 12, 9).unwrap(),
            check_in: NaiveTime::from_hms_opt(check_in.0, check_in.1, 0).unwrap(),
            check_out: check_out.map(|(h, m)| NaiveTime::from_hms_opt(h, m, 0).unwrap()),
            notes: None,
            registered_at: Utc::now(),
        }
    }

    #[test]
    fn open_shift_is_pending() {
        let rec = record((8, 0), None);
        assert!(!rec.is_complete());
        assert_eq!(rec.shift_duration(), None);
        assert_eq!(rec.shift_duration_label(), "pending");
    }

    #[test]
    fn same_day_shift() {
        let rec = record((8, 15), Some((17, 0)));
        assert!(rec.is_complete());
        assert_eq!(rec.shift_duration_label(), "8h 45m");
    }

    #[test]
    fn night_shift_wraps_midnight() {
        let rec = record((22, 0), Some((6, 30)));
        assert_eq!(rec.shift_duration(), Some(Duration::minutes(510)));
        assert_eq!(rec.shift_duration_label(), "8h 30m");
    }
}
