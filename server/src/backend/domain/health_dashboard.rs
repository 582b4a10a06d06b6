//! Health dashboard: alerts, counters, active withdrawals and the task list.
//!
//! Everything here is a pure function of the loaded records, pending tasks,
//! animals and today's date. Scope `mine` keeps only items whose animal is
//! owned by the caller; scope `all` keeps every item.

use chrono::{Duration, NaiveDate};
use std::collections::{HashMap, HashSet};

use crate::backend::domain::withdrawal;
use shared::{
    ActiveWithdrawal, AlertKind, Animal, DashboardScope, HealthAlert, HealthDashboard,
    HealthEventType, HealthRecord, HealthStats, HealthTask, RecordStatus, TaskDisplayStatus,
    TaskFilter, TaskListEntry, TaskStatus,
};

/// Most alerts shown at once
pub const MAX_ALERTS: usize = 6;

/// Tasks due within this many days count as "this week"
pub const WEEK_DAYS: i64 = 7;

/// Snapshot the dashboard is computed from
pub struct HealthSnapshot<'a> {
    pub records: &'a [HealthRecord],
    pub tasks: &'a [HealthTask],
    pub animals: HashMap<&'a str, &'a Animal>,
    pub user_id: &'a str,
    pub scope: DashboardScope,
    pub today: NaiveDate,
}

impl<'a> HealthSnapshot<'a> {
    pub fn new(
        records: &'a [HealthRecord],
        tasks: &'a [HealthTask],
        animals: &'a [Animal],
        user_id: &'a str,
        scope: DashboardScope,
        today: NaiveDate,
    ) -> Self {
        Self {
            records,
            tasks,
            animals: animals.iter().map(|animal| (animal.id.as_str(), animal)).collect(),
            user_id,
            scope,
            today,
        }
    }

    fn animal(&self, animal_id: &str) -> Option<&'a Animal> {
        self.animals.get(animal_id).copied()
    }

    /// Whether an item about `animal_id` belongs to the current scope
    pub fn in_scope(&self, animal_id: &str) -> bool {
        match self.scope {
            DashboardScope::All => true,
            DashboardScope::Mine => self
                .animal(animal_id)
                .is_some_and(|animal| animal.owner_id == self.user_id),
        }
    }

    fn animal_label(&self, animal_id: &str) -> String {
        self.animal(animal_id)
            .map(|animal| animal.name.clone())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    fn scoped_records(&self) -> impl Iterator<Item = &'a HealthRecord> + '_ {
        self.records.iter().filter(move |record| self.in_scope(&record.animal_id))
    }

    /// Pending tasks in scope
    fn scoped_tasks(&self) -> impl Iterator<Item = &'a HealthTask> + '_ {
        self.tasks
            .iter()
            .filter(|task| task.status == TaskStatus::Pending)
            .filter(move |task| self.in_scope(&task.animal_id))
    }

    pub fn build(&self, filter: TaskFilter) -> HealthDashboard {
        HealthDashboard {
            alerts: self.alerts(),
            stats: self.stats(),
            withdrawals: self.active_withdrawals(),
            tasks: self.task_list(filter),
        }
    }

    /// Most urgent alerts first, at most [`MAX_ALERTS`]
    pub fn alerts(&self) -> Vec<HealthAlert> {
        let mut alerts = Vec::new();

        for record in self.scoped_records().filter(|r| is_active_issue(r)) {
            alerts.push(HealthAlert {
                kind: AlertKind::Danger,
                title: "Active Health Issue".to_string(),
                message: format!(
                    "{}: {}",
                    self.animal_label(&record.animal_id),
                    or_event_type(&record.description, record.event_type)
                ),
                date: Some(record.event_date),
                record_id: Some(record.id.clone()),
                task_id: None,
            });
        }

        for record in self.scoped_records() {
            let Some(record_withdrawal) = &record.withdrawal else {
                continue;
            };
            for (category, period, days_left) in withdrawal::active_periods(record_withdrawal, self.today) {
                alerts.push(HealthAlert {
                    kind: AlertKind::Warning,
                    title: format!("{} Withdrawal", category.label()),
                    message: format!(
                        "{}: {} days remaining",
                        self.animal_label(&record.animal_id),
                        days_left
                    ),
                    date: Some(period.end_date),
                    record_id: Some(record.id.clone()),
                    task_id: None,
                });
            }
        }

        for task in self.scoped_tasks() {
            let (kind, title) = match dated_status(task, self.today) {
                Some(TaskDisplayStatus::Overdue) => (AlertKind::Danger, "Overdue Task"),
                Some(TaskDisplayStatus::DueToday) => (AlertKind::Primary, "Due Today"),
                _ => continue,
            };
            alerts.push(HealthAlert {
                kind,
                title: title.to_string(),
                message: format!(
                    "{}: {}",
                    self.animal_label(&task.animal_id),
                    or_event_type(&task.description, task.event_type)
                ),
                date: task.due_date,
                record_id: None,
                task_id: Some(task.id.clone()),
            });
        }

        alerts.sort_by(|a, b| a.kind.cmp(&b.kind).then(a.date.cmp(&b.date)));
        alerts.truncate(MAX_ALERTS);
        alerts
    }

    pub fn stats(&self) -> HealthStats {
        let active_issues = self.scoped_records().filter(|r| is_active_issue(r)).count();

        let in_withdrawal: HashSet<&str> = self
            .scoped_records()
            .filter(|record| {
                record
                    .withdrawal
                    .as_ref()
                    .is_some_and(|w| !withdrawal::active_periods(w, self.today).is_empty())
            })
            .map(|record| record.animal_id.as_str())
            .collect();

        let mut due_today = 0;
        let mut overdue = 0;
        for task in self.scoped_tasks() {
            match dated_status(task, self.today) {
                Some(TaskDisplayStatus::DueToday) => due_today += 1,
                Some(TaskDisplayStatus::Overdue) => overdue += 1,
                _ => {}
            }
        }

        HealthStats {
            active_issues,
            in_withdrawal: in_withdrawal.len(),
            due_today,
            overdue,
        }
    }

    /// One entry per active period, fewest days left first.
    /// Records whose animal no longer exists are skipped.
    pub fn active_withdrawals(&self) -> Vec<ActiveWithdrawal> {
        let mut entries = Vec::new();

        for record in self.scoped_records() {
            let Some(record_withdrawal) = &record.withdrawal else {
                continue;
            };
            let Some(animal) = self.animal(&record.animal_id) else {
                continue;
            };
            for (category, period, days_left) in withdrawal::active_periods(record_withdrawal, self.today) {
                entries.push(ActiveWithdrawal {
                    animal_id: animal.id.clone(),
                    animal_name: animal.name.clone(),
                    is_other_farm: animal.owner_id != self.user_id,
                    category,
                    end_date: period.end_date,
                    days_left,
                    medication: record.medication.clone(),
                    event_type: record.event_type,
                    record_id: record.id.clone(),
                });
            }
        }

        entries.sort_by_key(|entry| entry.days_left);
        entries
    }

    /// Pending tasks matching `filter`, dated by due date, undated last
    pub fn task_list(&self, filter: TaskFilter) -> Vec<TaskListEntry> {
        let mut tasks: Vec<&HealthTask> = self
            .scoped_tasks()
            .filter(|task| matches_filter(task, filter, self.today))
            .collect();
        sort_tasks(&mut tasks);

        tasks
            .into_iter()
            .map(|task| TaskListEntry {
                display_status: display_status(task, self.today),
                task: task.clone(),
            })
            .collect()
    }
}

fn is_active_issue(record: &HealthRecord) -> bool {
    record.event_type == HealthEventType::IllnessInjury && record.status == RecordStatus::Ongoing
}

fn or_event_type(description: &str, event_type: HealthEventType) -> String {
    if description.trim().is_empty() {
        event_type.label().to_string()
    } else {
        description.to_string()
    }
}

fn is_undated(task: &HealthTask) -> bool {
    task.is_undated || task.due_date.is_none()
}

/// Status of a dated task relative to today; `None` for undated tasks
fn dated_status(task: &HealthTask, today: NaiveDate) -> Option<TaskDisplayStatus> {
    if task.is_undated {
        return None;
    }
    let due = task.due_date?;
    Some(if due < today {
        TaskDisplayStatus::Overdue
    } else if due == today {
        TaskDisplayStatus::DueToday
    } else {
        TaskDisplayStatus::Upcoming
    })
}

pub fn display_status(task: &HealthTask, today: NaiveDate) -> TaskDisplayStatus {
    dated_status(task, today).unwrap_or(TaskDisplayStatus::NeedsDone)
}

pub fn matches_filter(task: &HealthTask, filter: TaskFilter, today: NaiveDate) -> bool {
    if task.is_undated {
        return matches!(filter, TaskFilter::All | TaskFilter::Undated);
    }
    let Some(due) = task.due_date else {
        return filter == TaskFilter::All;
    };

    match filter {
        TaskFilter::All => true,
        TaskFilter::Overdue => due < today,
        TaskFilter::Today => due == today,
        TaskFilter::Week => due >= today && due <= today + Duration::days(WEEK_DAYS),
        TaskFilter::Undated => false,
    }
}

/// Dated tasks by due date, then undated tasks by priority
pub fn sort_tasks(tasks: &mut [&HealthTask]) {
    tasks.sort_by(|a, b| match (is_undated(a), is_undated(b)) {
        (false, false) => a.due_date.cmp(&b.due_date),
        (true, true) => a.priority.rank().cmp(&b.priority.rank()),
        (true, false) => std::cmp::Ordering::Greater,
        (false, true) => std::cmp::Ordering::Less,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Gender, AnimalStatus, TaskPriority, Withdrawal, WithdrawalDays, WithdrawalPeriod};
    use std::collections::BTreeMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2024, 1, 5)
    }

    fn animal(id: &str, name: &str, owner_id: &str) -> Animal {
        Animal {
            id: id.to_string(),
            name: name.to_string(),
            species_id: "goat".to_string(),
            gender: Gender::Female,
            color: None,
            birth_date: None,
            acquisition_date: None,
            status: AnimalStatus::Active,
            status_details: None,
            owner: None,
            sire: None,
            dam: None,
            photo: None,
            owner_id: owner_id.to_string(),
            custom_fields: BTreeMap::new(),
            created_at: None,
            updated_at: None,
        }
    }

    fn record(id: &str, animal_id: &str, event_type: HealthEventType, event_date: NaiveDate) -> HealthRecord {
        HealthRecord {
            id: id.to_string(),
            animal_id: animal_id.to_string(),
            animal_name: String::new(),
            farm_id: "user-1".to_string(),
            event_type,
            event_date,
            status: RecordStatus::Completed,
            description: String::new(),
            medication: String::new(),
            dosage: String::new(),
            administered_by: String::new(),
            lot_number: String::new(),
            veterinarian: String::new(),
            cost: None,
            notes: String::new(),
            withdrawal: None,
            linked_task_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn task(id: &str, animal_id: &str, due_date: Option<NaiveDate>, priority: TaskPriority) -> HealthTask {
        HealthTask {
            id: id.to_string(),
            animal_id: animal_id.to_string(),
            animal_name: String::new(),
            farm_id: "user-1".to_string(),
            event_type: HealthEventType::Deworming,
            description: String::new(),
            priority,
            is_undated: due_date.is_none(),
            due_date,
            status: TaskStatus::Pending,
            medication: String::new(),
            dosage: String::new(),
            withdrawal: WithdrawalDays::default(),
            notes: String::new(),
            linked_record_id: None,
            is_follow_up: false,
            completed_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn meat_withdrawal(end_date: NaiveDate) -> Withdrawal {
        Withdrawal {
            meat: Some(WithdrawalPeriod { days: 10, end_date }),
            dairy: None,
            eggs: None,
        }
    }

    #[test]
    fn test_alerts_are_ordered_by_severity_then_date() {
        let animals = vec![animal("a1", "Daisy", "user-1")];
        let mut illness = record("r1", "a1", HealthEventType::IllnessInjury, date(2024, 1, 3));
        illness.status = RecordStatus::Ongoing;
        illness.description = "Limping".to_string();
        let mut dewormed = record("r2", "a1", HealthEventType::Deworming, date(2024, 1, 1));
        dewormed.withdrawal = Some(meat_withdrawal(date(2024, 1, 11)));
        let records = vec![dewormed, illness];
        let tasks = vec![
            task("t1", "a1", Some(today()), TaskPriority::Normal),
            task("t2", "a1", Some(date(2024, 1, 2)), TaskPriority::Normal),
        ];

        let snapshot = HealthSnapshot::new(&records, &tasks, &animals, "user-1", DashboardScope::Mine, today());
        let alerts = snapshot.alerts();

        let titles: Vec<&str> = alerts.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Overdue Task", "Active Health Issue", "Meat Withdrawal", "Due Today"]
        );
        assert_eq!(alerts[1].message, "Daisy: Limping");
        assert_eq!(alerts[2].message, "Daisy: 6 days remaining");
        assert_eq!(alerts[0].message, "Daisy: Deworming");
    }

    #[test]
    fn test_alerts_are_capped() {
        let animals = vec![animal("a1", "Daisy", "user-1")];
        let tasks: Vec<HealthTask> = (0..10)
            .map(|i| task(&format!("t{}", i), "a1", Some(date(2023, 12, 1 + i)), TaskPriority::Normal))
            .collect();

        let snapshot = HealthSnapshot::new(&[], &tasks, &animals, "user-1", DashboardScope::Mine, today());
        assert_eq!(snapshot.alerts().len(), MAX_ALERTS);
    }

    #[test]
    fn test_stats_count_distinct_animals_in_withdrawal() {
        let animals = vec![animal("a1", "Daisy", "user-1"), animal("a2", "Dot", "user-1")];
        let mut first = record("r1", "a1", HealthEventType::Vaccination, date(2024, 1, 1));
        first.withdrawal = Some(meat_withdrawal(date(2024, 1, 11)));
        let mut second = record("r2", "a1", HealthEventType::Deworming, date(2024, 1, 2));
        second.withdrawal = Some(meat_withdrawal(date(2024, 1, 20)));
        let mut expired = record("r3", "a2", HealthEventType::Deworming, date(2023, 12, 1));
        expired.withdrawal = Some(meat_withdrawal(date(2023, 12, 11)));
        let records = vec![first, second, expired];
        let tasks = vec![
            task("t1", "a1", Some(today()), TaskPriority::Normal),
            task("t2", "a2", Some(date(2024, 1, 1)), TaskPriority::Normal),
            task("t3", "a2", None, TaskPriority::High),
        ];

        let snapshot = HealthSnapshot::new(&records, &tasks, &animals, "user-1", DashboardScope::Mine, today());
        let stats = snapshot.stats();
        assert_eq!(stats.in_withdrawal, 1);
        assert_eq!(stats.due_today, 1);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.active_issues, 0);
    }

    #[test]
    fn test_scope_mine_hides_other_users_animals() {
        let animals = vec![animal("a1", "Daisy", "user-1"), animal("b1", "Rex", "user-2")];
        let tasks = vec![
            task("t1", "a1", Some(today()), TaskPriority::Normal),
            task("t2", "b1", Some(today()), TaskPriority::Normal),
        ];

        let mine = HealthSnapshot::new(&[], &tasks, &animals, "user-1", DashboardScope::Mine, today());
        assert_eq!(mine.stats().due_today, 1);

        let all = HealthSnapshot::new(&[], &tasks, &animals, "user-1", DashboardScope::All, today());
        assert_eq!(all.stats().due_today, 2);
    }

    #[test]
    fn test_withdrawals_skip_missing_animals_and_sort_by_days_left() {
        let animals = vec![animal("a1", "Daisy", "user-1"), animal("b1", "Rex", "user-2")];
        let mut long = record("r1", "a1", HealthEventType::Vaccination, date(2024, 1, 1));
        long.withdrawal = Some(meat_withdrawal(date(2024, 1, 30)));
        let mut short = record("r2", "b1", HealthEventType::Vaccination, date(2024, 1, 1));
        short.withdrawal = Some(meat_withdrawal(date(2024, 1, 7)));
        let mut orphan = record("r3", "gone", HealthEventType::Vaccination, date(2024, 1, 1));
        orphan.withdrawal = Some(meat_withdrawal(date(2024, 1, 8)));
        let records = vec![long, short, orphan];

        let snapshot = HealthSnapshot::new(&records, &[], &animals, "user-1", DashboardScope::All, today());
        let withdrawals = snapshot.active_withdrawals();

        assert_eq!(withdrawals.len(), 2);
        assert_eq!(withdrawals[0].animal_name, "Rex");
        assert_eq!(withdrawals[0].days_left, 2);
        assert!(withdrawals[0].is_other_farm);
        assert_eq!(withdrawals[1].days_left, 25);
    }

    #[test]
    fn test_task_filters() {
        let week_out = today() + Duration::days(7);
        let far_out = today() + Duration::days(8);
        let cases = [
            (Some(date(2024, 1, 1)), TaskFilter::Overdue, true),
            (Some(today()), TaskFilter::Today, true),
            (Some(week_out), TaskFilter::Week, true),
            (Some(far_out), TaskFilter::Week, false),
            (Some(date(2024, 1, 1)), TaskFilter::Week, false),
            (None, TaskFilter::Undated, true),
            (None, TaskFilter::Today, false),
            (Some(far_out), TaskFilter::All, true),
        ];

        for (due, filter, expected) in cases {
            let t = task("t", "a1", due, TaskPriority::Normal);
            assert_eq!(matches_filter(&t, filter, today()), expected, "{:?} {:?}", due, filter);
        }
    }

    #[test]
    fn test_task_order_and_display_status() {
        let animals = vec![animal("a1", "Daisy", "user-1")];
        let tasks = vec![
            task("low", "a1", None, TaskPriority::Low),
            task("later", "a1", Some(date(2024, 1, 9)), TaskPriority::Normal),
            task("high", "a1", None, TaskPriority::High),
            task("late", "a1", Some(date(2024, 1, 2)), TaskPriority::Normal),
        ];

        let snapshot = HealthSnapshot::new(&[], &tasks, &animals, "user-1", DashboardScope::Mine, today());
        let list = snapshot.task_list(TaskFilter::All);

        let ids: Vec<&str> = list.iter().map(|entry| entry.task.id.as_str()).collect();
        assert_eq!(ids, vec!["late", "later", "high", "low"]);
        assert_eq!(list[0].display_status, TaskDisplayStatus::Overdue);
        assert_eq!(list[1].display_status, TaskDisplayStatus::Upcoming);
        assert_eq!(list[2].display_status, TaskDisplayStatus::NeedsDone);
    }

    #[test]
    fn test_completed_tasks_are_not_listed() {
        let animals = vec![animal("a1", "Daisy", "user-1")];
        let mut done = task("t1", "a1", Some(today()), TaskPriority::Normal);
        done.status = TaskStatus::Completed;
        let tasks = vec![done];

        let snapshot = HealthSnapshot::new(&[], &tasks, &animals, "user-1", DashboardScope::Mine, today());
        assert!(snapshot.task_list(TaskFilter::All).is_empty());
        assert_eq!(snapshot.stats().due_today, 0);
    }
}
