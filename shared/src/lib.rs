use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================
// Budget: accounts and promotions
// ============================================================

/// Kind of debt account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AccountType {
    #[default]
    #[serde(rename = "Credit Card")]
    CreditCard,
    Mortgage,
    Loan,
}

impl AccountType {
    pub const ALL: [AccountType; 3] = [AccountType::CreditCard, AccountType::Mortgage, AccountType::Loan];

    /// Label used as the aggregation category
    pub fn label(&self) -> &'static str {
        match self {
            AccountType::CreditCard => "Credit Card",
            AccountType::Mortgage => "Mortgage",
            AccountType::Loan => "Loan",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A debt account stored in the `accounts` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub balance: f64,
    pub credit_limit: Option<f64>,
    pub apr: Option<f64>,
    pub min_payment: f64,
    /// Promotional balances owned by this account
    #[serde(default)]
    pub promotions: Vec<Promotion>,
}

/// Promotional balance with its own payoff window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promotion {
    #[serde(default)]
    pub id: String,
    pub balance: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Raw account row as typed into the accounts table.
/// Numeric fields stay strings; unparsable values count as zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AccountForm {
    /// `None` for rows that have never been saved
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub account_type: AccountType,
    #[serde(default)]
    pub balance: String,
    #[serde(default)]
    pub credit_limit: String,
    #[serde(default)]
    pub apr: String,
    #[serde(default)]
    pub min_payment: String,
    #[serde(default)]
    pub promotions: Vec<PromotionForm>,
}

/// Raw promotion row inside an account form
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PromotionForm {
    pub id: Option<String>,
    #[serde(default)]
    pub balance: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// A monetary value with its display string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoneyAmount {
    pub raw: f64,
    pub formatted: String,
}

/// Totals shown under the accounts table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountsSummary {
    pub total_debt: MoneyAmount,
    pub total_monthly: MoneyAmount,
    pub credit_card_debt: MoneyAmount,
    pub credit_card_monthly: MoneyAmount,
    pub debt_excluding_vendor: MoneyAmount,
    pub monthly_excluding_vendor: MoneyAmount,
    pub debt_excluding_mortgage: MoneyAmount,
    pub monthly_excluding_mortgage: MoneyAmount,
    /// Name fragment excluded from the `excluding_vendor` totals
    pub excluded_vendor: String,
}

/// Required payment for one promotional balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionProjection {
    pub account_id: Option<String>,
    pub promotion_id: Option<String>,
    pub months_remaining: Option<f64>,
    pub required_payment: Option<f64>,
    pub formatted_payment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountsResponse {
    pub accounts: Vec<Account>,
    pub summary: AccountsSummary,
    pub projections: Vec<PromotionProjection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveAccountsRequest {
    pub accounts: Vec<AccountForm>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveAccountsResponse {
    pub accounts: Vec<Account>,
    pub summary: AccountsSummary,
    pub projections: Vec<PromotionProjection>,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizeAccountsRequest {
    pub accounts: Vec<AccountForm>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizeAccountsResponse {
    pub summary: AccountsSummary,
    pub projections: Vec<PromotionProjection>,
}

/// Live projection for a single promotion being edited
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRequest {
    #[serde(default)]
    pub balance: String,
    pub end_date: Option<String>,
}

// ============================================================
// Budget: paycheck
// ============================================================

/// Document id of the single paycheck in the `income` collection
pub const PAYCHECK_DOCUMENT_ID: &str = "myPaycheck";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaycheckLineItem {
    pub name: String,
    pub biweekly_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Paycheck {
    pub salary_biweekly: f64,
    #[serde(default)]
    pub deductions_pre_tax: Vec<PaycheckLineItem>,
    #[serde(default)]
    pub taxes: Vec<PaycheckLineItem>,
    #[serde(default)]
    pub deductions_post_tax: Vec<PaycheckLineItem>,
}

/// Paycheck section a line item belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaycheckCategory {
    PreTax,
    Taxes,
    PostTax,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PaycheckLineForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub biweekly_amount: String,
}

/// Paycheck table as typed, before numeric coercion
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PaycheckForm {
    #[serde(default)]
    pub salary_biweekly: String,
    #[serde(default)]
    pub deductions_pre_tax: Vec<PaycheckLineForm>,
    #[serde(default)]
    pub taxes: Vec<PaycheckLineForm>,
    #[serde(default)]
    pub deductions_post_tax: Vec<PaycheckLineForm>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodAmounts {
    pub biweekly: MoneyAmount,
    pub monthly: MoneyAmount,
    pub annual: MoneyAmount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaycheckLineBreakdown {
    pub name: String,
    pub amounts: PeriodAmounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaycheckSection {
    pub category: PaycheckCategory,
    pub items: Vec<PaycheckLineBreakdown>,
    pub total: PeriodAmounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaycheckBreakdown {
    pub salary: PeriodAmounts,
    pub pre_tax: PaycheckSection,
    pub taxes: PaycheckSection,
    pub post_tax: PaycheckSection,
    pub net: PeriodAmounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaycheckResponse {
    pub paycheck: Paycheck,
    pub breakdown: PaycheckBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavePaycheckResponse {
    pub paycheck: Paycheck,
    pub breakdown: PaycheckBreakdown,
    pub success_message: String,
}

// ============================================================
// Farm profile
// ============================================================

/// Farm profile; the document id is the owning user's id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Farm {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub farm_name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub owner_id: String,
    pub email: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveFarmRequest {
    pub farm_name: String,
    #[serde(default)]
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmResponse {
    pub farm: Option<Farm>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmStats {
    pub total_animals: usize,
}

// ============================================================
// Species
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomFieldType {
    #[default]
    Text,
    Number,
    Date,
    Boolean,
    Select,
}

/// One species-specific field an animal of that species may carry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldDefinition {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: CustomFieldType,
    /// Allowed values, only meaningful for `select`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub icon: Option<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomFieldDefinition>,
    #[serde(default)]
    pub created_by: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesRequest {
    pub name: String,
    pub icon: Option<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomFieldDefinition>,
}

// ============================================================
// Animals
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimalStatus {
    #[default]
    Active,
    Sold,
    Deceased,
    Transferred,
}

impl AnimalStatus {
    /// Statuses that carry a date and free-text details
    pub fn has_details(&self) -> bool {
        !matches!(self, AnimalStatus::Active)
    }
}

impl fmt::Display for AnimalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AnimalStatus::Active => "active",
            AnimalStatus::Sold => "sold",
            AnimalStatus::Deceased => "deceased",
            AnimalStatus::Transferred => "transferred",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusDetails {
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub details: String,
}

/// Who owns an animal: a registered farm or a free-text owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum AnimalOwner {
    Farm(String),
    Custom(String),
}

/// Typed value of a species custom field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CustomFieldValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Boolean(bool),
    Select(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animal {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub species_id: String,
    #[serde(default)]
    pub gender: Gender,
    pub color: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub acquisition_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: AnimalStatus,
    pub status_details: Option<StatusDetails>,
    pub owner: Option<AnimalOwner>,
    pub sire: Option<String>,
    pub dam: Option<String>,
    pub photo: Option<String>,
    /// User that created the animal
    #[serde(default)]
    pub owner_id: String,
    #[serde(default)]
    pub custom_fields: BTreeMap<String, CustomFieldValue>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Animal form; custom field values arrive as raw strings keyed by field name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalRequest {
    pub name: String,
    pub species_id: String,
    #[serde(default)]
    pub gender: Gender,
    pub color: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub acquisition_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: AnimalStatus,
    pub status_details: Option<StatusDetails>,
    pub owner: Option<AnimalOwner>,
    pub sire: Option<String>,
    pub dam: Option<String>,
    pub photo: Option<String>,
    #[serde(default)]
    pub custom_fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnimalFilter {
    pub species_id: Option<String>,
    pub status: Option<AnimalStatus>,
    pub gender: Option<Gender>,
    pub search: Option<String>,
}

/// Display projection of an animal for the animals grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalCard {
    pub id: String,
    pub name: String,
    pub species_name: String,
    pub gender: Gender,
    pub color: Option<String>,
    pub owner_name: String,
    pub age: Option<String>,
    pub status: AnimalStatus,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalRef {
    pub id: String,
    pub name: String,
}

/// Candidate parents for an animal of a given species
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentOptions {
    pub sires: Vec<AnimalRef>,
    pub dams: Vec<AnimalRef>,
}

// ============================================================
// Health
// ============================================================

/// Kind of health event recorded or scheduled for an animal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HealthEventType {
    Vaccination,
    Deworming,
    HoofTrimming,
    Disbudding,
    Castration,
    Shearing,
    VeterinaryVisit,
    IllnessInjury,
    Surgery,
    DentalCare,
    FecalTest,
    BloodTest,
    Other,
}

impl HealthEventType {
    pub const ALL: [HealthEventType; 13] = [
        HealthEventType::Vaccination,
        HealthEventType::Deworming,
        HealthEventType::HoofTrimming,
        HealthEventType::Disbudding,
        HealthEventType::Castration,
        HealthEventType::Shearing,
        HealthEventType::VeterinaryVisit,
        HealthEventType::IllnessInjury,
        HealthEventType::Surgery,
        HealthEventType::DentalCare,
        HealthEventType::FecalTest,
        HealthEventType::BloodTest,
        HealthEventType::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            HealthEventType::Vaccination => "Vaccination",
            HealthEventType::Deworming => "Deworming",
            HealthEventType::HoofTrimming => "Hoof/Foot Trimming",
            HealthEventType::Disbudding => "Disbudding/Dehorning",
            HealthEventType::Castration => "Banding/Castration",
            HealthEventType::Shearing => "Shearing/Grooming",
            HealthEventType::VeterinaryVisit => "Veterinary Visit",
            HealthEventType::IllnessInjury => "Illness/Injury",
            HealthEventType::Surgery => "Surgery",
            HealthEventType::DentalCare => "Dental Care",
            HealthEventType::FecalTest => "Fecal Test",
            HealthEventType::BloodTest => "Blood Test",
            HealthEventType::Other => "Other",
        }
    }

    /// Whether the event can start a withdrawal period
    pub fn has_withdrawal(&self) -> bool {
        matches!(
            self,
            HealthEventType::Vaccination
                | HealthEventType::Deworming
                | HealthEventType::VeterinaryVisit
                | HealthEventType::IllnessInjury
                | HealthEventType::Surgery
                | HealthEventType::Other
        )
    }

    /// Whether the event usually gets a follow-up task
    pub fn has_followup(&self) -> bool {
        !matches!(self, HealthEventType::Disbudding)
    }
}

impl From<String> for HealthEventType {
    fn from(label: String) -> Self {
        HealthEventType::ALL
            .into_iter()
            .find(|event_type| event_type.label() == label)
            .unwrap_or(HealthEventType::Other)
    }
}

impl From<HealthEventType> for String {
    fn from(event_type: HealthEventType) -> Self {
        event_type.label().to_string()
    }
}

impl fmt::Display for HealthEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Output category restricted during a withdrawal period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalCategory {
    Meat,
    Dairy,
    Eggs,
}

impl WithdrawalCategory {
    pub const ALL: [WithdrawalCategory; 3] = [
        WithdrawalCategory::Meat,
        WithdrawalCategory::Dairy,
        WithdrawalCategory::Eggs,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            WithdrawalCategory::Meat => "Meat",
            WithdrawalCategory::Dairy => "Dairy",
            WithdrawalCategory::Eggs => "Eggs",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalPeriod {
    pub days: u32,
    pub end_date: NaiveDate,
}

/// Withdrawal periods computed for a health record
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Withdrawal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meat: Option<WithdrawalPeriod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dairy: Option<WithdrawalPeriod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eggs: Option<WithdrawalPeriod>,
}

impl Withdrawal {
    pub fn get(&self, category: WithdrawalCategory) -> Option<&WithdrawalPeriod> {
        match category {
            WithdrawalCategory::Meat => self.meat.as_ref(),
            WithdrawalCategory::Dairy => self.dairy.as_ref(),
            WithdrawalCategory::Eggs => self.eggs.as_ref(),
        }
    }

    pub fn set(&mut self, category: WithdrawalCategory, period: Option<WithdrawalPeriod>) {
        match category {
            WithdrawalCategory::Meat => self.meat = period,
            WithdrawalCategory::Dairy => self.dairy = period,
            WithdrawalCategory::Eggs => self.eggs = period,
        }
    }

    /// Periods that are present, in meat, dairy, eggs order
    pub fn periods(&self) -> impl Iterator<Item = (WithdrawalCategory, &WithdrawalPeriod)> + '_ {
        WithdrawalCategory::ALL
            .into_iter()
            .filter_map(move |category| self.get(category).map(|period| (category, period)))
    }

    pub fn is_empty(&self) -> bool {
        self.meat.is_none() && self.dairy.is_none() && self.eggs.is_none()
    }
}

/// Planned withdrawal length per category, in days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WithdrawalDays {
    #[serde(default)]
    pub meat: u32,
    #[serde(default)]
    pub dairy: u32,
    #[serde(default)]
    pub eggs: u32,
}

impl WithdrawalDays {
    pub fn get(&self, category: WithdrawalCategory) -> u32 {
        match category {
            WithdrawalCategory::Meat => self.meat,
            WithdrawalCategory::Dairy => self.dairy,
            WithdrawalCategory::Eggs => self.eggs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    Completed,
    Ongoing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    #[serde(default)]
    pub id: String,
    pub animal_id: String,
    #[serde(default)]
    pub animal_name: String,
    #[serde(default)]
    pub farm_id: String,
    pub event_type: HealthEventType,
    pub event_date: NaiveDate,
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub medication: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub administered_by: String,
    #[serde(default)]
    pub lot_number: String,
    #[serde(default)]
    pub veterinarian: String,
    pub cost: Option<f64>,
    #[serde(default)]
    pub notes: String,
    pub withdrawal: Option<Withdrawal>,
    pub linked_task_id: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    High,
    #[default]
    Normal,
    Low,
}

impl TaskPriority {
    /// Sort rank, most urgent first
    pub fn rank(&self) -> u8 {
        match self {
            TaskPriority::High => 0,
            TaskPriority::Normal => 1,
            TaskPriority::Low => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthTask {
    #[serde(default)]
    pub id: String,
    pub animal_id: String,
    #[serde(default)]
    pub animal_name: String,
    #[serde(default)]
    pub farm_id: String,
    pub event_type: HealthEventType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub is_undated: bool,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub medication: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub withdrawal: WithdrawalDays,
    #[serde(default)]
    pub notes: String,
    pub linked_record_id: Option<String>,
    #[serde(default)]
    pub is_follow_up: bool,
    pub completed_at: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUpRequest {
    pub due_date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecordRequest {
    pub animal_id: String,
    pub event_type: HealthEventType,
    pub event_date: NaiveDate,
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub medication: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub administered_by: String,
    #[serde(default)]
    pub lot_number: String,
    #[serde(default)]
    pub veterinarian: String,
    pub cost: Option<f64>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub withdrawal: WithdrawalDays,
    pub linked_task_id: Option<String>,
    /// Only honoured when creating a record
    pub follow_up: Option<FollowUpRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateHealthRecordResponse {
    pub record: HealthRecord,
    pub follow_up: Option<HealthTask>,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthTaskRequest {
    pub animal_id: String,
    pub event_type: HealthEventType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub is_undated: bool,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub medication: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub withdrawal: WithdrawalDays,
    #[serde(default)]
    pub notes: String,
    pub linked_record_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteTaskRequest {
    pub completion_date: NaiveDate,
    #[serde(default)]
    pub medication: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub withdrawal: WithdrawalDays,
    pub follow_up: Option<FollowUpRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteTaskResponse {
    pub task: HealthTask,
    pub record: HealthRecord,
    pub follow_up: Option<HealthTask>,
    pub success_message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkActionKind {
    Record,
    Task,
}

/// One health event applied to many animals at once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkHealthRequest {
    pub kind: BulkActionKind,
    pub animal_ids: Vec<String>,
    /// Event date for records, due date for tasks
    pub event_date: NaiveDate,
    pub event_type: HealthEventType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub medication: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub withdrawal: WithdrawalDays,
    pub follow_up: Option<FollowUpRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkHealthResponse {
    pub records: Vec<HealthRecord>,
    pub tasks: Vec<HealthTask>,
    pub success_message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DashboardScope {
    /// Only animals owned by the signed-in user
    #[default]
    Mine,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    #[default]
    All,
    Overdue,
    Today,
    Week,
    Undated,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskListQuery {
    #[serde(default)]
    pub filter: TaskFilter,
    #[serde(default)]
    pub scope: DashboardScope,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecordListQuery {
    pub animal_id: Option<String>,
    pub species_id: Option<String>,
    pub event_type: Option<HealthEventType>,
    #[serde(default)]
    pub scope: DashboardScope,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub scope: DashboardScope,
    #[serde(default)]
    pub filter: TaskFilter,
}

/// Severity of a dashboard alert, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Danger,
    Warning,
    Primary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthAlert {
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    pub date: Option<NaiveDate>,
    pub record_id: Option<String>,
    pub task_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HealthStats {
    pub active_issues: usize,
    pub in_withdrawal: usize,
    pub due_today: usize,
    pub overdue: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveWithdrawal {
    pub animal_id: String,
    pub animal_name: String,
    pub is_other_farm: bool,
    pub category: WithdrawalCategory,
    pub end_date: NaiveDate,
    pub days_left: i64,
    pub medication: String,
    pub event_type: HealthEventType,
    pub record_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskDisplayStatus {
    NeedsDone,
    Overdue,
    DueToday,
    Upcoming,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskListEntry {
    pub task: HealthTask,
    pub display_status: TaskDisplayStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthDashboard {
    pub alerts: Vec<HealthAlert>,
    pub stats: HealthStats,
    pub withdrawals: Vec<ActiveWithdrawal>,
    pub tasks: Vec<TaskListEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalCalculationRequest {
    pub event_date: NaiveDate,
    #[serde(default)]
    pub withdrawal: WithdrawalDays,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalCountdown {
    pub category: WithdrawalCategory,
    pub end_date: NaiveDate,
    pub days_remaining: i64,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalCalculationResponse {
    pub withdrawal: Option<Withdrawal>,
    pub countdowns: Vec<WithdrawalCountdown>,
}

// ============================================================
// Errors
// ============================================================

/// Body returned by the REST layer for any failed request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub detail: Option<String>,
}
