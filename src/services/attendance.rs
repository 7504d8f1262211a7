use crate::{
    entities::{
        attendance_record::{self, Entity as AttendanceRecord},
        employee::{self, Entity as Employee},
    },
    errors::{is_unique_violation, ServiceError},
};
use chrono::{NaiveDate, NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

const CLOCK_FORMAT: &str = "%H:%M";

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct EmployeeInput {
    #[validate(length(min = 1, max = 10))]
    pub national_id: String,
    #[validate(length(min = 1, max = 100))]
    pub first_names: String,
    #[validate(length(min = 1, max = 100))]
    pub last_names: String,
    #[validate(length(min = 1, max = 100))]
    pub position: String,
    #[serde(default)]
    #[validate(length(max = 10))]
    pub phone: String,
    #[validate(email)]
    pub email: Option<String>,
    pub hire_date: NaiveDate,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl EmployeeInput {
    fn normalized(mut self) -> Self {
        self.national_id = self.national_id.trim().to_string();
        self.first_names = self.first_names.trim().to_string();
        self.last_names = self.last_names.trim().to_string();
        self.position = self.position.trim().to_string();
        self.phone = self.phone.trim().to_string();
        self.email = self
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct EmployeeView {
    pub id: Uuid,
    pub national_id: String,
    pub first_names: String,
    pub last_names: String,
    pub full_name: String,
    pub position: String,
    pub phone: String,
    pub email: Option<String>,
    pub hire_date: NaiveDate,
    pub active: bool,
}

impl From<employee::Model> for EmployeeView {
    fn from(model: employee::Model) -> Self {
        Self {
            full_name: model.full_name(),
            id: model.id,
            national_id: model.national_id,
            first_names: model.first_names,
            last_names: model.last_names,
            position: model.position,
            phone: model.phone,
            email: model.email,
            hire_date: model.hire_date,
            active: model.active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct AttendanceView {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub employee: String,
    pub national_id: String,
    pub position: String,
    pub work_date: NaiveDate,
    /// HH:MM
    pub check_in: String,
    /// HH:MM, absent while the shift is open
    pub check_out: Option<String>,
    /// `"{h}h {m}m"` or `"pending"`
    pub duration: String,
    pub complete: bool,
    pub notes: Option<String>,
}

impl AttendanceView {
    fn build(record: attendance_record::Model, employee: &employee::Model) -> Self {
        Self {
            duration: record.shift_duration_label(),
            complete: record.is_complete(),
            id: record.id,
            employee_id: employee.id,
            employee: employee.full_name(),
            national_id: employee.national_id.clone(),
            position: employee.position.clone(),
            work_date: record.work_date,
            check_in: record.check_in.format(CLOCK_FORMAT).to_string(),
            check_out: record
                .check_out
                .map(|t| t.format(CLOCK_FORMAT).to_string()),
            notes: record.notes,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CheckInInput {
    pub employee_ids: Vec<Uuid>,
    /// Defaults to today
    pub work_date: Option<NaiveDate>,
    /// HH:MM; defaults to now
    pub check_in: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CheckOutInput {
    pub employee_id: Uuid,
    pub work_date: Option<NaiveDate>,
    /// HH:MM; defaults to now
    pub check_out: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct CheckInOutcome {
    pub created: usize,
    /// Full names of employees that already had a record for the date
    pub already_registered: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttendanceOverview {
    pub work_date: NaiveDate,
    pub total_employees: usize,
    pub total_present: usize,
    /// Active employees with no record yet
    pub pending: Vec<EmployeeView>,
}

/// Parses an `HH:MM` clock value.
pub fn parse_clock(raw: &str) -> Result<NaiveTime, ServiceError> {
    NaiveTime::parse_from_str(raw.trim(), CLOCK_FORMAT).map_err(|_| {
        ServiceError::ValidationError(format!("Invalid time '{}', expected HH:MM", raw))
    })
}

/// Employees and their daily check-in/check-out records.
#[derive(Clone)]
pub struct AttendanceService {
    db: Arc<DatabaseConnection>,
}

impl AttendanceService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates an employee, or fully replaces one when `id` is given.
    #[instrument(skip(self, input))]
    pub async fn save_employee(
        &self,
        id: Option<Uuid>,
        input: EmployeeInput,
    ) -> Result<employee::Model, ServiceError> {
        let input = input.normalized();
        input.validate()?;

        let holder = Employee::find()
            .filter(employee::Column::NationalId.eq(input.national_id.as_str()))
            .one(&*self.db)
            .await?;
        if let Some(holder) = holder {
            if Some(holder.id) != id {
                return Err(ServiceError::Conflict(format!(
                    "National id {} is already registered",
                    input.national_id
                )));
            }
        }

        let mut model: employee::ActiveModel = match id {
            Some(id) => self.get_employee(id).await?.into(),
            None => employee::ActiveModel {
                id: Set(Uuid::new_v4()),
                registered_at: Set(Utc::now()),
                ..Default::default()
            },
        };
        model.national_id = Set(input.national_id.clone());
        model.first_names = Set(input.first_names);
        model.last_names = Set(input.last_names);
        model.position = Set(input.position);
        model.phone = Set(input.phone);
        model.email = Set(input.email);
        model.hire_date = Set(input.hire_date);
        model.active = Set(input.active);

        let saved = match id {
            Some(_) => model.update(&*self.db).await,
            None => model.insert(&*self.db).await,
        }
        .map_err(|err| {
            if is_unique_violation(&err) {
                ServiceError::Conflict(format!(
                    "National id {} is already registered",
                    input.national_id
                ))
            } else {
                err.into()
            }
        })?;

        info!(employee_id = %saved.id, name = %saved.full_name(), "Employee saved");
        Ok(saved)
    }

    pub async fn get_employee(&self, id: Uuid) -> Result<employee::Model, ServiceError> {
        Employee::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Employee {} not found", id)))
    }

    /// All employees ordered by last names, then first names.
    pub async fn list_employees(&self) -> Result<Vec<employee::Model>, ServiceError> {
        Ok(Employee::find()
            .order_by_asc(employee::Column::LastNames)
            .order_by_asc(employee::Column::FirstNames)
            .all(&*self.db)
            .await?)
    }

    /// Removes the employee together with their attendance history.
    #[instrument(skip(self))]
    pub async fn delete_employee(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let existing = Employee::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Employee {} not found", id)))?;

        AttendanceRecord::delete_many()
            .filter(attendance_record::Column::EmployeeId.eq(id))
            .exec(&txn)
            .await?;
        Employee::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        info!(employee_id = %id, name = %existing.full_name(), "Employee deleted");
        Ok(())
    }

    /// Checks in every listed employee that has no record for `date` yet.
    #[instrument(skip(self, employee_ids), fields(requested = employee_ids.len()))]
    pub async fn check_in(
        &self,
        employee_ids: &[Uuid],
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<CheckInOutcome, ServiceError> {
        if employee_ids.is_empty() {
            return Err(ServiceError::ValidationError(
                "Select at least one employee".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let ids: Vec<Uuid> = employee_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        let txn = self.db.begin().await?;

        let employees: HashMap<Uuid, employee::Model> = Employee::find()
            .filter(employee::Column::Id.is_in(ids.iter().copied()))
            .all(&txn)
            .await?
            .into_iter()
            .map(|e| (e.id, e))
            .collect();
        if let Some(bad) = ids
            .iter()
            .find(|id| !employees.get(id).map_or(false, |e| e.active))
        {
            return Err(ServiceError::InvalidReference(format!(
                "Employee {} does not exist or is inactive",
                bad
            )));
        }

        let registered: HashSet<Uuid> = AttendanceRecord::find()
            .filter(attendance_record::Column::WorkDate.eq(date))
            .filter(attendance_record::Column::EmployeeId.is_in(ids.iter().copied()))
            .all(&txn)
            .await?
            .into_iter()
            .map(|r| r.employee_id)
            .collect();

        let mut outcome = CheckInOutcome::default();
        for id in &ids {
            let Some(employee) = employees.get(id) else {
                continue;
            };
            if registered.contains(id) {
                outcome.already_registered.push(employee.full_name());
                continue;
            }
            attendance_record::ActiveModel {
                id: Set(Uuid::new_v4()),
                employee_id: Set(*id),
                work_date: Set(date),
                check_in: Set(time),
                check_out: Set(None),
                notes: Set(None),
                registered_at: Set(Utc::now()),
            }
            .insert(&txn)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    ServiceError::Conflict(format!(
                        "{} was checked in concurrently",
                        employee.full_name()
                    ))
                } else {
                    err.into()
                }
            })?;
            outcome.created += 1;
        }

        txn.commit().await?;
        info!(
            work_date = %date,
            created = outcome.created,
            already_registered = outcome.already_registered.len(),
            "Check-in batch recorded"
        );
        Ok(outcome)
    }

    /// Stamps the check-out of an active employee's open record for `date`.
    #[instrument(skip(self))]
    pub async fn check_out(
        &self,
        employee_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<AttendanceView, ServiceError> {
        let employee = Employee::find_by_id(employee_id)
            .filter(employee::Column::Active.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Active employee {} not found", employee_id))
            })?;

        let record = AttendanceRecord::find()
            .filter(attendance_record::Column::EmployeeId.eq(employee_id))
            .filter(attendance_record::Column::WorkDate.eq(date))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "{} is not checked in for {}",
                    employee.full_name(),
                    date
                ))
            })?;
        if let Some(out) = record.check_out {
            return Err(ServiceError::Conflict(format!(
                "{} already checked out at {}",
                employee.full_name(),
                out.format(CLOCK_FORMAT)
            )));
        }

        let mut model: attendance_record::ActiveModel = record.into();
        model.check_out = Set(Some(time));
        let updated = model.update(&*self.db).await?;

        let view = AttendanceView::build(updated, &employee);
        info!(
            employee_id = %employee_id,
            work_date = %date,
            duration = %view.duration,
            "Check-out recorded"
        );
        Ok(view)
    }

    /// Records between `from` and `to` inclusive, newest date and latest
    /// check-in first.
    #[instrument(skip(self))]
    pub async fn list_attendance(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceView>, ServiceError> {
        let mut select = AttendanceRecord::find();
        if let Some(from) = from {
            select = select.filter(attendance_record::Column::WorkDate.gte(from));
        }
        if let Some(to) = to {
            select = select.filter(attendance_record::Column::WorkDate.lte(to));
        }

        let rows = select
            .order_by_desc(attendance_record::Column::WorkDate)
            .order_by_desc(attendance_record::Column::CheckIn)
            .find_also_related(Employee)
            .all(&*self.db)
            .await?;

        rows.into_iter()
            .map(|(record, employee)| {
                let employee = employee.ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "Attendance {} has no employee",
                        record.id
                    ))
                })?;
                Ok(AttendanceView::build(record, &employee))
            })
            .collect()
    }

    #[instrument(skip(self))]
    pub async fn delete_attendance(&self, id: Uuid) -> Result<(), ServiceError> {
        let deleted = AttendanceRecord::delete_by_id(id).exec(&*self.db).await?;
        if deleted.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Attendance record {} not found",
                id
            )));
        }
        info!(attendance_id = %id, "Attendance record deleted");
        Ok(())
    }

    /// Head count for `date` and the active employees still to check in.
    #[instrument(skip(self))]
    pub async fn attendance_overview(
        &self,
        date: NaiveDate,
    ) -> Result<AttendanceOverview, ServiceError> {
        let active = Employee::find()
            .filter(employee::Column::Active.eq(true))
            .order_by_asc(employee::Column::LastNames)
            .order_by_asc(employee::Column::FirstNames)
            .all(&*self.db)
            .await?;
        let present: HashSet<Uuid> = AttendanceRecord::find()
            .filter(attendance_record::Column::WorkDate.eq(date))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|r| r.employee_id)
            .collect();

        let total_employees = active.len();
        let pending = active
            .into_iter()
            .filter(|e| !present.contains(&e.id))
            .map(EmployeeView::from)
            .collect();

        Ok(AttendanceOverview {
            work_date: date,
            total_employees,
            total_present: present.len(),
            pending,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn input() -> EmployeeInput {
        EmployeeInput {
            national_id: " 0912345678 ".into(),
            first_names: " Ana ".into(),
            last_names: "Torres".into(),
            position: "Forklift".into(),
            phone: "0991234567".into(),
            email: Some("  ".into()),
            hire_date: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
            active: true,
        }
    }

    #[test]
    fn normalized_input_is_trimmed_and_valid() {
        let normalized = input().normalized();
        assert_eq!(normalized.national_id, "0912345678");
        assert_eq!(normalized.first_names, "Ana");
        assert_eq!(normalized.email, None);
        assert!(normalized.validate().is_ok());
    }

    #[test]
    fn overlong_national_id_fails_validation() {
        let mut bad = input();
        bad.national_id = "09123456789".into();
        assert!(bad.normalized().validate().is_err());
    }

    #[test]
    fn bad_email_fails_validation() {
        let mut bad = input();
        bad.email = Some("not-an-email".into());
        assert!(bad.normalized().validate().is_err());
    }

    #[test]
    fn clock_parsing() {
        assert_eq!(
            parse_clock("07:30").unwrap(),
            NaiveTime::from_hms_opt(7, 30, 0).unwrap()
        );
        assert_matches!(parse_clock("7h30"), Err(ServiceError::ValidationError(_)));
    }
}
