//! Debt accounts and promotional balances.
//!
//! Accounts are edited as a table and saved as a whole: rows without an id
//! are created, rows with an id are replaced and stored accounts missing from
//! the submission are deleted, all in one grouped write. Totals are computed
//! with the [`Aggregator`] budget rules, where each account's monthly payment
//! is its minimum payment plus the projected payment of every promotion.

use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use crate::backend::domain::aggregator::{
    Aggregator, LineItem, ALL, CREDIT_CARD, EXCLUDING_MORTGAGE, EXCLUDING_VENDOR,
};
use crate::backend::domain::amortization::{self, Projection};
use crate::backend::domain::clock::Clock;
use crate::backend::domain::commands::accounts::{
    ProjectPromotionCommand, SaveAccountsCommand, SummarizeAccountsCommand,
};
use crate::backend::domain::errors::ServiceResult;
use crate::backend::domain::money::{money, parse_amount, parse_optional_amount};
use crate::backend::domain::session::Session;
use crate::backend::storage::{Batch, Repositories};
use shared::{
    Account, AccountForm, AccountsResponse, AccountsSummary, Promotion, PromotionForm,
    PromotionProjection, SaveAccountsResponse, SummarizeAccountsResponse,
};

/// Service for the accounts table
#[derive(Clone)]
pub struct AccountService {
    repos: Repositories,
    clock: Arc<dyn Clock>,
    excluded_vendor: String,
}

impl AccountService {
    pub fn new(repos: Repositories, clock: Arc<dyn Clock>, excluded_vendor: impl Into<String>) -> Self {
        Self {
            repos,
            clock,
            excluded_vendor: excluded_vendor.into(),
        }
    }

    /// All accounts with totals and promotion projections
    pub async fn load_accounts(&self, session: &Session) -> ServiceResult<AccountsResponse> {
        info!("Loading accounts for {}", session.user_id);
        let accounts = self.repos.accounts.list().await?;
        let today = self.clock.today();

        Ok(AccountsResponse {
            summary: summarize(&accounts, &self.excluded_vendor, today),
            projections: project_all(&accounts, today),
            accounts,
        })
    }

    /// Persist the submitted table as the new account list
    pub async fn save_accounts(
        &self,
        session: &Session,
        command: SaveAccountsCommand,
    ) -> ServiceResult<SaveAccountsResponse> {
        info!("Saving {} accounts for {}", command.accounts.len(), session.user_id);

        let stored = self.repos.accounts.list().await?;
        let mut batch = Batch::new();
        let mut kept_ids = HashSet::new();

        for form in &command.accounts {
            let id = match form.id.as_deref().filter(|id| !id.trim().is_empty()) {
                Some(id) => id.to_string(),
                None => self.repos.accounts.new_id(),
            };
            let mut account = account_from_form(form);
            account.id = id.clone();
            self.repos.accounts.stage_replace(&mut batch, &id, &account)?;
            kept_ids.insert(id);
        }

        for account in stored.iter().filter(|account| !kept_ids.contains(&account.id)) {
            info!("Deleting account {} ({})", account.id, account.name);
            self.repos.accounts.stage_delete(&mut batch, &account.id);
        }

        self.repos.commit(batch).await?;

        let reloaded = self.load_accounts(session).await?;
        Ok(SaveAccountsResponse {
            accounts: reloaded.accounts,
            summary: reloaded.summary,
            projections: reloaded.projections,
            success_message: "Saved successfully!".to_string(),
        })
    }

    /// Totals for unsaved rows
    pub fn summarize_accounts(&self, command: SummarizeAccountsCommand) -> SummarizeAccountsResponse {
        let accounts: Vec<Account> = command.accounts.iter().map(account_from_form).collect();
        let today = self.clock.today();
        SummarizeAccountsResponse {
            summary: summarize(&accounts, &self.excluded_vendor, today),
            projections: project_all(&accounts, today),
        }
    }

    /// Live projection of a single promotion
    pub fn project_promotion(&self, command: ProjectPromotionCommand) -> PromotionProjection {
        let balance = parse_amount(&command.balance);
        let end_date = command.end_date.as_deref().and_then(parse_form_date);
        let projection = amortization::project(balance, end_date, self.clock.today());
        to_projection(None, None, &projection)
    }
}

/// Parse a `YYYY-MM-DD` form value; blanks and garbage mean "no date"
pub fn parse_form_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Coerce a table row into an account; promotions get ids when missing
pub fn account_from_form(form: &AccountForm) -> Account {
    Account {
        id: form.id.clone().unwrap_or_default(),
        name: form.name.clone(),
        account_type: form.account_type,
        balance: parse_amount(&form.balance),
        credit_limit: parse_optional_amount(&form.credit_limit),
        apr: parse_optional_amount(&form.apr),
        min_payment: parse_amount(&form.min_payment),
        promotions: form.promotions.iter().map(promotion_from_form).collect(),
    }
}

fn promotion_from_form(form: &PromotionForm) -> Promotion {
    let id = match form.id.as_deref().filter(|id| !id.trim().is_empty()) {
        Some(id) => id.to_string(),
        None => uuid::Uuid::new_v4().to_string(),
    };
    Promotion {
        id,
        balance: parse_amount(&form.balance),
        start_date: form.start_date.as_deref().and_then(parse_form_date),
        end_date: form.end_date.as_deref().and_then(parse_form_date),
    }
}

/// Minimum payment plus every promotion's required payment
pub fn monthly_payment(account: &Account, today: NaiveDate) -> f64 {
    let promotions: f64 = account
        .promotions
        .iter()
        .map(|promotion| amortization::project(promotion.balance, promotion.end_date, today).payment_or_zero())
        .sum();
    account.min_payment + promotions
}

/// Debt and monthly totals under the budget rules
pub fn summarize(accounts: &[Account], excluded_vendor: &str, today: NaiveDate) -> AccountsSummary {
    let aggregator = Aggregator::budget(excluded_vendor);

    let debt_items: Vec<LineItem> = accounts
        .iter()
        .map(|account| LineItem::new(account.account_type.label(), account.name.clone(), account.balance))
        .collect();
    let monthly_items: Vec<LineItem> = accounts
        .iter()
        .map(|account| {
            LineItem::new(account.account_type.label(), account.name.clone(), monthly_payment(account, today))
        })
        .collect();

    let debt = aggregator.aggregate(&debt_items);
    let monthly = aggregator.aggregate(&monthly_items);
    let total = |totals: &std::collections::BTreeMap<String, f64>, key: &str| {
        money(totals.get(key).copied().unwrap_or(0.0))
    };

    AccountsSummary {
        total_debt: total(&debt, ALL),
        total_monthly: total(&monthly, ALL),
        credit_card_debt: total(&debt, CREDIT_CARD),
        credit_card_monthly: total(&monthly, CREDIT_CARD),
        debt_excluding_vendor: total(&debt, EXCLUDING_VENDOR),
        monthly_excluding_vendor: total(&monthly, EXCLUDING_VENDOR),
        debt_excluding_mortgage: total(&debt, EXCLUDING_MORTGAGE),
        monthly_excluding_mortgage: total(&monthly, EXCLUDING_MORTGAGE),
        excluded_vendor: excluded_vendor.to_string(),
    }
}

/// One projection per promotion, in account order
pub fn project_all(accounts: &[Account], today: NaiveDate) -> Vec<PromotionProjection> {
    accounts
        .iter()
        .flat_map(|account| {
            account.promotions.iter().map(move |promotion| {
                let projection = amortization::project(promotion.balance, promotion.end_date, today);
                to_projection(Some(account.id.clone()), Some(promotion.id.clone()), &projection)
            })
        })
        .collect()
}

fn to_projection(
    account_id: Option<String>,
    promotion_id: Option<String>,
    projection: &Projection,
) -> PromotionProjection {
    PromotionProjection {
        account_id,
        promotion_id,
        months_remaining: projection.months_remaining,
        required_payment: projection.required_payment,
        formatted_payment: projection.formatted(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::clock::FixedClock;
    use crate::backend::storage::SqliteDocumentStore;
    use shared::AccountType;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn session() -> Session {
        Session::new("user-1", Some("owner@example.com".to_string()))
    }

    async fn create_test_service() -> AccountService {
        let store = SqliteDocumentStore::init_test().await.expect("Failed to init test DB");
        AccountService::new(
            Repositories::new(Arc::new(store)),
            Arc::new(FixedClock(today())),
            "discover",
        )
    }

    fn form(name: &str, account_type: AccountType, balance: &str, min_payment: &str) -> AccountForm {
        AccountForm {
            id: None,
            name: name.to_string(),
            account_type,
            balance: balance.to_string(),
            min_payment: min_payment.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_summary_applies_budget_rules() {
        let accounts: Vec<Account> = [
            form("Discover It", AccountType::CreditCard, "500", "25"),
            form("Visa", AccountType::CreditCard, "300", "15"),
            form("House", AccountType::Mortgage, "200000", "1500"),
        ]
        .iter()
        .map(account_from_form)
        .collect();

        let summary = summarize(&accounts, "discover", today());
        assert_eq!(summary.total_debt.formatted, "$200,800.00");
        assert_eq!(summary.total_monthly.raw, 1540.0);
        assert_eq!(summary.credit_card_debt.raw, 800.0);
        assert_eq!(summary.credit_card_monthly.raw, 40.0);
        assert_eq!(summary.debt_excluding_vendor.raw, 200_300.0);
        assert_eq!(summary.monthly_excluding_vendor.raw, 1515.0);
        assert_eq!(summary.debt_excluding_mortgage.raw, 800.0);
        assert_eq!(summary.monthly_excluding_mortgage.raw, 40.0);
    }

    #[test]
    fn test_unparsable_fields_count_as_zero() {
        let account = account_from_form(&form("Card", AccountType::CreditCard, "abc", ""));
        assert_eq!(account.balance, 0.0);
        assert_eq!(account.min_payment, 0.0);
        assert_eq!(account.credit_limit, None);
    }

    #[test]
    fn test_monthly_payment_includes_promotions() {
        let mut card = account_from_form(&form("Card", AccountType::CreditCard, "2000", "35"));
        card.promotions.push(Promotion {
            id: "p1".to_string(),
            balance: 990.0,
            start_date: None,
            end_date: Some(today() + chrono::Duration::days(3044)),
        });
        // Expired promotions contribute nothing
        card.promotions.push(Promotion {
            id: "p2".to_string(),
            balance: 400.0,
            start_date: None,
            end_date: Some(NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()),
        });

        let monthly = monthly_payment(&card, today());
        assert!((monthly - 45.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_save_creates_replaces_and_deletes() {
        let service = create_test_service().await;

        let first = service
            .save_accounts(
                &session(),
                SaveAccountsCommand {
                    accounts: vec![
                        form("Visa", AccountType::CreditCard, "1000", "30"),
                        form("Car", AccountType::Loan, "8000", "250"),
                    ],
                },
            )
            .await
            .unwrap();
        assert_eq!(first.accounts.len(), 2);
        assert_eq!(first.success_message, "Saved successfully!");

        let visa = first.accounts.iter().find(|a| a.name == "Visa").unwrap();
        let mut visa_form = form("Visa Platinum", AccountType::CreditCard, "900", "30");
        visa_form.id = Some(visa.id.clone());

        let second = service
            .save_accounts(&session(), SaveAccountsCommand { accounts: vec![visa_form] })
            .await
            .unwrap();

        assert_eq!(second.accounts.len(), 1);
        assert_eq!(second.accounts[0].id, visa.id);
        assert_eq!(second.accounts[0].name, "Visa Platinum");
        assert_eq!(second.summary.total_debt.raw, 900.0);
    }

    #[tokio::test]
    async fn test_promotion_round_trip() {
        let service = create_test_service().await;
        let mut card = form("Store Card", AccountType::CreditCard, "1500", "40");
        card.promotions.push(PromotionForm {
            id: None,
            balance: "1200".to_string(),
            start_date: Some("2023-06-01".to_string()),
            end_date: Some("2024-12-31".to_string()),
        });

        service
            .save_accounts(&session(), SaveAccountsCommand { accounts: vec![card] })
            .await
            .unwrap();
        let loaded = service.load_accounts(&session()).await.unwrap();

        let promotion = &loaded.accounts[0].promotions[0];
        assert!(!promotion.id.is_empty());
        assert_eq!(promotion.balance, 1200.0);
        assert_eq!(promotion.start_date, NaiveDate::from_ymd_opt(2023, 6, 1));
        assert_eq!(promotion.end_date, NaiveDate::from_ymd_opt(2024, 12, 31));

        assert_eq!(loaded.projections.len(), 1);
        assert_eq!(loaded.projections[0].promotion_id.as_deref(), Some(promotion.id.as_str()));
        assert!(loaded.projections[0].required_payment.is_some());
    }

    #[tokio::test]
    async fn test_project_promotion_without_end_date() {
        let service = create_test_service().await;
        let projection = service.project_promotion(ProjectPromotionCommand {
            balance: "500".to_string(),
            end_date: Some("".to_string()),
        });
        assert_eq!(projection.required_payment, None);
        assert_eq!(projection.formatted_payment, "$0.00");
    }
}
