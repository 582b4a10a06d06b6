//! Health records, scheduled health tasks and the health dashboard.
//!
//! ## Business Rules
//!
//! - Records and tasks are stamped with the caller's farm and cache the
//!   animal's name at write time
//! - Withdrawal end dates are computed from the event date of the record
//!   (the completion date when a task is completed)
//! - Completing a task writes the new record, the completed task and an
//!   optional follow-up task in one atomic batch
//! - A completed task cannot be completed again
//! - Bulk actions create one record or task per selected animal, atomically

use chrono::{NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

use crate::backend::domain::clock::Clock;
use crate::backend::domain::commands::health::{
    BulkCreateCommand, CompleteTaskCommand, CreateRecordCommand, DashboardQuery, RecordListQuery,
    ScheduleTaskCommand, TaskListQuery, UpdateRecordCommand, UpdateTaskCommand,
};
use crate::backend::domain::errors::{ServiceError, ServiceResult};
use crate::backend::domain::farm_service::FarmService;
use crate::backend::domain::health_dashboard::HealthSnapshot;
use crate::backend::domain::session::Session;
use crate::backend::domain::withdrawal;
use crate::backend::storage::{Batch, PreconditionFailed, Repositories};
use shared::{
    Animal, BulkActionKind, BulkHealthResponse, CompleteTaskResponse, CreateHealthRecordResponse,
    FollowUpRequest, HealthDashboard, HealthRecord, HealthTask, RecordStatus, TaskListEntry,
    TaskPriority, TaskStatus, WithdrawalCalculationRequest, WithdrawalCalculationResponse,
    WithdrawalCountdown, WithdrawalDays,
};

#[derive(Clone)]
pub struct HealthService {
    repos: Repositories,
    farm_service: FarmService,
    clock: Arc<dyn Clock>,
}

impl HealthService {
    pub fn new(repos: Repositories, farm_service: FarmService, clock: Arc<dyn Clock>) -> Self {
        Self {
            repos,
            farm_service,
            clock,
        }
    }

    async fn require_animal(&self, animal_id: &str) -> ServiceResult<Animal> {
        self.repos
            .animals
            .get(animal_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("animal", animal_id))
    }

    pub async fn get_record(&self, record_id: &str) -> ServiceResult<HealthRecord> {
        self.repos
            .health_records
            .get(record_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("health record", record_id))
    }

    pub async fn get_task(&self, task_id: &str) -> ServiceResult<HealthTask> {
        self.repos
            .health_tasks
            .get(task_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("health task", task_id))
    }

    /// Save a record and, when asked, schedule its follow-up in the same batch
    pub async fn create_record(
        &self,
        session: &Session,
        command: CreateRecordCommand,
    ) -> ServiceResult<CreateHealthRecordResponse> {
        let request = command.request;
        info!(
            "Creating {} record for animal {} ({})",
            request.event_type, request.animal_id, session.user_id
        );
        let farm = self.farm_service.require_farm(session).await?;
        let animal = self.require_animal(&request.animal_id).await?;
        let now = Utc::now().to_rfc3339();

        let record = HealthRecord {
            id: self.repos.health_records.new_id(),
            animal_id: animal.id.clone(),
            animal_name: animal.name.clone(),
            farm_id: farm.id.clone(),
            event_type: request.event_type,
            event_date: request.event_date,
            status: request.status,
            description: request.description,
            medication: request.medication,
            dosage: request.dosage,
            administered_by: request.administered_by,
            lot_number: request.lot_number,
            veterinarian: request.veterinarian,
            cost: request.cost,
            notes: request.notes,
            withdrawal: withdrawal::calculate(request.event_date, &request.withdrawal)?,
            linked_task_id: request.linked_task_id,
            created_at: Some(now.clone()),
            updated_at: Some(now),
        };

        let mut batch = Batch::new();
        self.repos.health_records.stage_replace(&mut batch, &record.id, &record)?;
        let follow_up = match &request.follow_up {
            Some(follow_up) => {
                let task = self.follow_up_task(&record, follow_up, &request.withdrawal);
                self.repos.health_tasks.stage_replace(&mut batch, &task.id, &task)?;
                Some(task)
            }
            None => None,
        };
        self.repos.commit(batch).await?;

        let success_message = if follow_up.is_some() {
            "Health record saved with follow-up task".to_string()
        } else {
            "Health record saved".to_string()
        };
        Ok(CreateHealthRecordResponse {
            record,
            follow_up,
            success_message,
        })
    }

    /// Pending follow-up for `record`, linked back to it
    fn follow_up_task(
        &self,
        record: &HealthRecord,
        follow_up: &FollowUpRequest,
        withdrawal_days: &WithdrawalDays,
    ) -> HealthTask {
        let now = Utc::now().to_rfc3339();
        let description = follow_up
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|notes| !notes.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Follow-up: {}", record.event_type));

        HealthTask {
            id: self.repos.health_tasks.new_id(),
            animal_id: record.animal_id.clone(),
            animal_name: record.animal_name.clone(),
            farm_id: record.farm_id.clone(),
            event_type: record.event_type,
            description,
            priority: TaskPriority::Normal,
            is_undated: false,
            due_date: Some(follow_up.due_date),
            status: TaskStatus::Pending,
            medication: record.medication.clone(),
            dosage: record.dosage.clone(),
            withdrawal: *withdrawal_days,
            notes: String::new(),
            linked_record_id: Some(record.id.clone()),
            is_follow_up: true,
            completed_at: None,
            created_at: Some(now.clone()),
            updated_at: Some(now),
        }
    }

    /// Replace a record's fields; farm, link and creation time are kept
    pub async fn update_record(&self, session: &Session, command: UpdateRecordCommand) -> ServiceResult<HealthRecord> {
        info!("Updating health record {} for {}", command.record_id, session.user_id);
        let existing = self.get_record(&command.record_id).await?;
        let request = command.request;
        if request.follow_up.is_some() {
            warn!("Ignoring follow-up on update of record {}", existing.id);
        }

        let animal_name = if request.animal_id == existing.animal_id {
            existing.animal_name.clone()
        } else {
            self.require_animal(&request.animal_id).await?.name
        };

        let record = HealthRecord {
            id: existing.id.clone(),
            animal_id: request.animal_id,
            animal_name,
            farm_id: existing.farm_id,
            event_type: request.event_type,
            event_date: request.event_date,
            status: request.status,
            description: request.description,
            medication: request.medication,
            dosage: request.dosage,
            administered_by: request.administered_by,
            lot_number: request.lot_number,
            veterinarian: request.veterinarian,
            cost: request.cost,
            notes: request.notes,
            withdrawal: withdrawal::calculate(request.event_date, &request.withdrawal)?,
            linked_task_id: request.linked_task_id.or(existing.linked_task_id),
            created_at: existing.created_at,
            updated_at: Some(Utc::now().to_rfc3339()),
        };
        self.repos.health_records.replace(&record.id, &record).await?;
        Ok(record)
    }

    pub async fn delete_record(&self, session: &Session, record_id: &str) -> ServiceResult<()> {
        info!("Deleting health record {} for {}", record_id, session.user_id);
        if !self.repos.health_records.delete(record_id).await? {
            return Err(ServiceError::not_found("health record", record_id));
        }
        Ok(())
    }

    /// Records in scope matching the query, most recent event first
    pub async fn list_records(&self, session: &Session, query: RecordListQuery) -> ServiceResult<Vec<HealthRecord>> {
        let records = self.repos.health_records.list().await?;
        let animals = self.repos.animals.list().await?;
        let today = self.clock.today();
        let snapshot = HealthSnapshot::new(&records, &[], &animals, &session.user_id, query.scope, today);
        let species_of: HashMap<&str, &str> = animals
            .iter()
            .map(|animal| (animal.id.as_str(), animal.species_id.as_str()))
            .collect();

        let mut matching: Vec<HealthRecord> = records
            .iter()
            .filter(|record| snapshot.in_scope(&record.animal_id))
            .filter(|record| query.animal_id.as_deref().map_or(true, |id| record.animal_id == id))
            .filter(|record| query.event_type.map_or(true, |kind| record.event_type == kind))
            .filter(|record| {
                query.species_id.as_deref().map_or(true, |species_id| {
                    species_of.get(record.animal_id.as_str()) == Some(&species_id)
                })
            })
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            b.event_date
                .cmp(&a.event_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(matching)
    }

    pub async fn schedule_task(&self, session: &Session, command: ScheduleTaskCommand) -> ServiceResult<HealthTask> {
        let request = command.request;
        info!(
            "Scheduling {} task for animal {} ({})",
            request.event_type, request.animal_id, session.user_id
        );
        let farm = self.farm_service.require_farm(session).await?;
        let animal = self.require_animal(&request.animal_id).await?;
        let due_date = task_due_date(request.is_undated, request.due_date)?;
        let now = Utc::now().to_rfc3339();

        let mut task = HealthTask {
            id: String::new(),
            animal_id: animal.id,
            animal_name: animal.name,
            farm_id: farm.id,
            event_type: request.event_type,
            description: request.description,
            priority: request.priority,
            is_undated: request.is_undated,
            due_date,
            status: TaskStatus::Pending,
            medication: request.medication,
            dosage: request.dosage,
            withdrawal: request.withdrawal,
            notes: request.notes,
            is_follow_up: request.linked_record_id.is_some(),
            linked_record_id: request.linked_record_id,
            completed_at: None,
            created_at: Some(now.clone()),
            updated_at: Some(now),
        };
        task.id = self.repos.health_tasks.create(&task).await?;
        Ok(task)
    }

    /// Edit a task; status, completion and creation time are kept
    pub async fn update_task(&self, session: &Session, command: UpdateTaskCommand) -> ServiceResult<HealthTask> {
        info!("Updating health task {} for {}", command.task_id, session.user_id);
        let existing = self.get_task(&command.task_id).await?;
        let request = command.request;
        let due_date = task_due_date(request.is_undated, request.due_date)?;

        let animal_name = if request.animal_id == existing.animal_id {
            existing.animal_name.clone()
        } else {
            self.require_animal(&request.animal_id).await?.name
        };
        let linked_record_id = request.linked_record_id.or(existing.linked_record_id);

        let task = HealthTask {
            id: existing.id,
            animal_id: request.animal_id,
            animal_name,
            farm_id: existing.farm_id,
            event_type: request.event_type,
            description: request.description,
            priority: request.priority,
            is_undated: request.is_undated,
            due_date,
            status: existing.status,
            medication: request.medication,
            dosage: request.dosage,
            withdrawal: request.withdrawal,
            notes: request.notes,
            is_follow_up: existing.is_follow_up || linked_record_id.is_some(),
            linked_record_id,
            completed_at: existing.completed_at,
            created_at: existing.created_at,
            updated_at: Some(Utc::now().to_rfc3339()),
        };
        self.repos.health_tasks.replace(&task.id, &task).await?;
        Ok(task)
    }

    pub async fn delete_task(&self, session: &Session, task_id: &str) -> ServiceResult<()> {
        info!("Deleting health task {} for {}", task_id, session.user_id);
        if !self.repos.health_tasks.delete(task_id).await? {
            return Err(ServiceError::not_found("health task", task_id));
        }
        Ok(())
    }

    /// Pending tasks in scope, filtered and ordered for the task list
    pub async fn list_tasks(&self, session: &Session, query: TaskListQuery) -> ServiceResult<Vec<TaskListEntry>> {
        let tasks = self.repos.health_tasks.list().await?;
        let animals = self.repos.animals.list().await?;
        let snapshot = HealthSnapshot::new(&[], &tasks, &animals, &session.user_id, query.scope, self.clock.today());
        Ok(snapshot.task_list(query.filter))
    }

    /// Turn a pending task into a record, optionally scheduling a follow-up
    pub async fn complete_task(
        &self,
        session: &Session,
        command: CompleteTaskCommand,
    ) -> ServiceResult<CompleteTaskResponse> {
        info!("Completing health task {} for {}", command.task_id, session.user_id);
        let mut task = self.get_task(&command.task_id).await?;
        if task.status == TaskStatus::Completed {
            warn!("Task {} is already completed", task.id);
            return Err(already_completed());
        }

        let request = command.request;
        let now = Utc::now().to_rfc3339();
        let farm_id = if task.farm_id.is_empty() {
            session.user_id.clone()
        } else {
            task.farm_id.clone()
        };

        let record = HealthRecord {
            id: self.repos.health_records.new_id(),
            animal_id: task.animal_id.clone(),
            animal_name: task.animal_name.clone(),
            farm_id,
            event_type: task.event_type,
            event_date: request.completion_date,
            status: RecordStatus::Completed,
            description: task.description.clone(),
            medication: request.medication,
            dosage: request.dosage,
            administered_by: String::new(),
            lot_number: String::new(),
            veterinarian: String::new(),
            cost: None,
            notes: request.notes,
            withdrawal: withdrawal::calculate(request.completion_date, &request.withdrawal)?,
            linked_task_id: Some(task.id.clone()),
            created_at: Some(now.clone()),
            updated_at: Some(now.clone()),
        };

        task.status = TaskStatus::Completed;
        task.completed_at = Some(now.clone());
        task.linked_record_id = Some(record.id.clone());
        task.updated_at = Some(now);

        let mut batch = Batch::new();
        self.repos
            .health_tasks
            .stage_expect(&mut batch, &task.id, "/status", &TaskStatus::Pending)?;
        self.repos.health_records.stage_replace(&mut batch, &record.id, &record)?;
        self.repos.health_tasks.stage_replace(&mut batch, &task.id, &task)?;
        let follow_up = match &request.follow_up {
            Some(follow_up) => {
                let next = self.follow_up_task(&record, follow_up, &request.withdrawal);
                self.repos.health_tasks.stage_replace(&mut batch, &next.id, &next)?;
                Some(next)
            }
            None => None,
        };
        if let Err(e) = self.repos.commit(batch).await {
            if PreconditionFailed::is_cause_of(&e) {
                warn!("Task {} was completed by another request", task.id);
                return Err(already_completed());
            }
            return Err(e.into());
        }

        Ok(CompleteTaskResponse {
            task,
            record,
            follow_up,
            success_message: "Task completed".to_string(),
        })
    }

    /// One record or task per selected animal, written atomically
    pub async fn bulk_create(&self, session: &Session, command: BulkCreateCommand) -> ServiceResult<BulkHealthResponse> {
        let request = command.request;
        let mut seen = HashSet::new();
        let animal_ids: Vec<String> = request
            .animal_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();
        if animal_ids.is_empty() {
            return Err(ServiceError::validation("Please select at least one animal"));
        }

        info!(
            "Bulk {:?} {} for {} animals ({})",
            request.kind,
            request.event_type,
            animal_ids.len(),
            session.user_id
        );
        let farm = self.farm_service.require_farm(session).await?;
        let animals: HashMap<String, Animal> = self
            .repos
            .animals
            .list()
            .await?
            .into_iter()
            .map(|animal| (animal.id.clone(), animal))
            .collect();
        if let Some(missing) = animal_ids.iter().find(|id| !animals.contains_key(id.as_str())) {
            return Err(ServiceError::not_found("animal", missing.clone()));
        }

        let now = Utc::now().to_rfc3339();
        let mut batch = Batch::new();
        let mut records = Vec::new();
        let mut tasks = Vec::new();

        for animal in animal_ids.iter().filter_map(|id| animals.get(id)) {
            match request.kind {
                BulkActionKind::Record => {
                    let record = HealthRecord {
                        id: self.repos.health_records.new_id(),
                        animal_id: animal.id.clone(),
                        animal_name: animal.name.clone(),
                        farm_id: farm.id.clone(),
                        event_type: request.event_type,
                        event_date: request.event_date,
                        status: RecordStatus::Completed,
                        description: request.description.clone(),
                        medication: request.medication.clone(),
                        dosage: request.dosage.clone(),
                        administered_by: String::new(),
                        lot_number: String::new(),
                        veterinarian: String::new(),
                        cost: None,
                        notes: request.notes.clone(),
                        withdrawal: withdrawal::calculate(request.event_date, &request.withdrawal)?,
                        linked_task_id: None,
                        created_at: Some(now.clone()),
                        updated_at: Some(now.clone()),
                    };
                    self.repos.health_records.stage_replace(&mut batch, &record.id, &record)?;
                    if let Some(follow_up) = &request.follow_up {
                        let task = self.follow_up_task(&record, follow_up, &request.withdrawal);
                        self.repos.health_tasks.stage_replace(&mut batch, &task.id, &task)?;
                        tasks.push(task);
                    }
                    records.push(record);
                }
                BulkActionKind::Task => {
                    let task = HealthTask {
                        id: self.repos.health_tasks.new_id(),
                        animal_id: animal.id.clone(),
                        animal_name: animal.name.clone(),
                        farm_id: farm.id.clone(),
                        event_type: request.event_type,
                        description: request.description.clone(),
                        priority: TaskPriority::Normal,
                        is_undated: false,
                        due_date: Some(request.event_date),
                        status: TaskStatus::Pending,
                        medication: request.medication.clone(),
                        dosage: request.dosage.clone(),
                        withdrawal: request.withdrawal,
                        notes: request.notes.clone(),
                        linked_record_id: None,
                        is_follow_up: false,
                        completed_at: None,
                        created_at: Some(now.clone()),
                        updated_at: Some(now.clone()),
                    };
                    self.repos.health_tasks.stage_replace(&mut batch, &task.id, &task)?;
                    tasks.push(task);
                }
            }
        }
        self.repos.commit(batch).await?;

        let success_message = match request.kind {
            BulkActionKind::Record => format!("{} records created successfully", records.len()),
            BulkActionKind::Task => format!("{} tasks created successfully", tasks.len()),
        };
        Ok(BulkHealthResponse {
            records,
            tasks,
            success_message,
        })
    }

    /// Alerts, counters, active withdrawals and the filtered task list
    pub async fn dashboard(&self, session: &Session, query: DashboardQuery) -> ServiceResult<HealthDashboard> {
        let records = self.repos.health_records.list().await?;
        let tasks = self.repos.health_tasks.list().await?;
        let animals = self.repos.animals.list().await?;
        let snapshot = HealthSnapshot::new(
            &records,
            &tasks,
            &animals,
            &session.user_id,
            query.scope,
            self.clock.today(),
        );
        Ok(snapshot.build(query.filter))
    }

    /// End dates and countdowns for a prospective treatment
    pub fn calculate_withdrawal(
        &self,
        request: WithdrawalCalculationRequest,
    ) -> ServiceResult<WithdrawalCalculationResponse> {
        calculate_withdrawal(&request, self.clock.today())
    }
}

fn already_completed() -> ServiceError {
    ServiceError::InvalidTransition("This task has already been completed".to_string())
}

fn task_due_date(is_undated: bool, due_date: Option<NaiveDate>) -> ServiceResult<Option<NaiveDate>> {
    if is_undated {
        return Ok(None);
    }
    match due_date {
        Some(date) => Ok(Some(date)),
        None => Err(ServiceError::validation("A due date is required unless the task is undated")),
    }
}

pub fn calculate_withdrawal(
    request: &WithdrawalCalculationRequest,
    today: NaiveDate,
) -> ServiceResult<WithdrawalCalculationResponse> {
    let result = withdrawal::calculate(request.event_date, &request.withdrawal)?;
    let countdowns = result
        .as_ref()
        .map(|periods| {
            periods
                .periods()
                .map(|(category, period)| WithdrawalCountdown {
                    category,
                    end_date: period.end_date,
                    days_remaining: withdrawal::days_remaining(period.end_date, today),
                    active: withdrawal::is_active(period.end_date, today),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(WithdrawalCalculationResponse {
        withdrawal: result,
        countdowns,
    })
}
