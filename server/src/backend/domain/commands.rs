// server/src/backend/domain/commands.rs

//! Domain-level command and query types
//! These structs are the inputs of the service command handlers. The REST
//! layer maps the public DTOs defined in the `shared` crate to these types;
//! the caller's identity travels separately as a `Session`.

pub mod accounts {
    use shared::AccountForm;

    /// Replace the stored account list with the submitted rows.
    #[derive(Debug, Clone)]
    pub struct SaveAccountsCommand {
        pub accounts: Vec<AccountForm>,
    }

    /// Compute totals for rows that have not been saved yet.
    #[derive(Debug, Clone)]
    pub struct SummarizeAccountsCommand {
        pub accounts: Vec<AccountForm>,
    }

    /// Project the payment of one promotion being edited.
    #[derive(Debug, Clone)]
    pub struct ProjectPromotionCommand {
        pub balance: String,
        pub end_date: Option<String>,
    }
}

pub mod paycheck {
    use shared::PaycheckForm;

    /// Replace the stored paycheck.
    #[derive(Debug, Clone)]
    pub struct SavePaycheckCommand {
        pub form: PaycheckForm,
    }

    /// Break down a paycheck without saving it.
    #[derive(Debug, Clone)]
    pub struct PreviewPaycheckCommand {
        pub form: PaycheckForm,
    }
}

pub mod farm {
    /// Create or update the caller's farm profile.
    #[derive(Debug, Clone)]
    pub struct SaveFarmCommand {
        pub farm_name: String,
        pub location: String,
    }
}

pub mod species {
    use shared::CustomFieldDefinition;

    #[derive(Debug, Clone)]
    pub struct CreateSpeciesCommand {
        pub name: String,
        pub icon: Option<String>,
        pub custom_fields: Vec<CustomFieldDefinition>,
    }

    #[derive(Debug, Clone)]
    pub struct UpdateSpeciesCommand {
        pub species_id: String,
        pub name: String,
        pub icon: Option<String>,
        pub custom_fields: Vec<CustomFieldDefinition>,
    }

    #[derive(Debug, Clone)]
    pub struct DeleteSpeciesCommand {
        pub species_id: String,
    }
}

pub mod animals {
    use shared::{AnimalFilter, AnimalRequest};

    /// Query parameters for listing animals.
    #[derive(Debug, Clone, Default)]
    pub struct AnimalListQuery {
        pub filter: AnimalFilter,
    }

    #[derive(Debug, Clone)]
    pub struct CreateAnimalCommand {
        pub request: AnimalRequest,
    }

    #[derive(Debug, Clone)]
    pub struct UpdateAnimalCommand {
        pub animal_id: String,
        pub request: AnimalRequest,
    }

    /// Candidate sires and dams for an animal of `species_id`.
    #[derive(Debug, Clone)]
    pub struct ParentOptionsQuery {
        pub species_id: String,
        /// The animal being edited, never offered as its own parent
        pub exclude_animal_id: Option<String>,
    }
}

pub mod health {
    use shared::{
        BulkHealthRequest, CompleteTaskRequest, DashboardScope, HealthEventType,
        HealthRecordRequest, HealthTaskRequest, TaskFilter,
    };

    #[derive(Debug, Clone)]
    pub struct CreateRecordCommand {
        pub request: HealthRecordRequest,
    }

    #[derive(Debug, Clone)]
    pub struct UpdateRecordCommand {
        pub record_id: String,
        pub request: HealthRecordRequest,
    }

    #[derive(Debug, Clone)]
    pub struct ScheduleTaskCommand {
        pub request: HealthTaskRequest,
    }

    #[derive(Debug, Clone)]
    pub struct UpdateTaskCommand {
        pub task_id: String,
        pub request: HealthTaskRequest,
    }

    /// Mark a pending task done and record what was done.
    #[derive(Debug, Clone)]
    pub struct CompleteTaskCommand {
        pub task_id: String,
        pub request: CompleteTaskRequest,
    }

    #[derive(Debug, Clone)]
    pub struct BulkCreateCommand {
        pub request: BulkHealthRequest,
    }

    /// Query parameters for listing health records.
    #[derive(Debug, Clone, Default)]
    pub struct RecordListQuery {
        pub animal_id: Option<String>,
        pub species_id: Option<String>,
        pub event_type: Option<HealthEventType>,
        pub scope: DashboardScope,
    }

    /// Query parameters for listing health tasks.
    #[derive(Debug, Clone, Default)]
    pub struct TaskListQuery {
        pub filter: TaskFilter,
        pub scope: DashboardScope,
    }

    #[derive(Debug, Clone, Default)]
    pub struct DashboardQuery {
        pub scope: DashboardScope,
        pub filter: TaskFilter,
    }
}
