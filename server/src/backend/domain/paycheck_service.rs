//! Biweekly paycheck breakdown.
//!
//! The paycheck is a single document. Salary and taxes are paid 26 times a
//! year; deductions are only taken from 24 of those paychecks, so the two
//! groups annualize differently.

use tracing::info;

use crate::backend::domain::commands::paycheck::{PreviewPaycheckCommand, SavePaycheckCommand};
use crate::backend::domain::errors::ServiceResult;
use crate::backend::domain::money::{money, parse_amount};
use crate::backend::domain::session::Session;
use crate::backend::storage::Repositories;
use shared::{
    Paycheck, PaycheckBreakdown, PaycheckCategory, PaycheckForm, PaycheckLineBreakdown,
    PaycheckLineForm, PaycheckLineItem, PaycheckResponse, PaycheckSection, PeriodAmounts,
    SavePaycheckResponse, PAYCHECK_DOCUMENT_ID,
};

pub const SALARY_PAY_PERIODS: f64 = 26.0;
pub const TAX_PAY_PERIODS: f64 = 26.0;
pub const DEDUCTION_PAY_PERIODS: f64 = 24.0;
pub const MONTHS_PER_YEAR: f64 = 12.0;

#[derive(Clone)]
pub struct PaycheckService {
    repos: Repositories,
}

impl PaycheckService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Load the paycheck, creating an empty one on first use
    pub async fn load_paycheck(&self, session: &Session) -> ServiceResult<PaycheckResponse> {
        info!("Loading paycheck for {}", session.user_id);

        let paycheck = match self.repos.income.get(PAYCHECK_DOCUMENT_ID).await? {
            Some(paycheck) => paycheck,
            None => {
                info!("No paycheck stored yet, creating an empty one");
                let paycheck = Paycheck::default();
                self.repos.income.replace(PAYCHECK_DOCUMENT_ID, &paycheck).await?;
                paycheck
            }
        };

        Ok(PaycheckResponse {
            breakdown: breakdown(&paycheck),
            paycheck,
        })
    }

    pub async fn save_paycheck(
        &self,
        session: &Session,
        command: SavePaycheckCommand,
    ) -> ServiceResult<SavePaycheckResponse> {
        info!("Saving paycheck for {}", session.user_id);

        let paycheck = paycheck_from_form(&command.form);
        self.repos.income.replace(PAYCHECK_DOCUMENT_ID, &paycheck).await?;

        Ok(SavePaycheckResponse {
            breakdown: breakdown(&paycheck),
            paycheck,
            success_message: "Saved successfully!".to_string(),
        })
    }

    /// Breakdown of an unsaved paycheck
    pub fn preview_paycheck(&self, command: PreviewPaycheckCommand) -> PaycheckResponse {
        let paycheck = paycheck_from_form(&command.form);
        PaycheckResponse {
            breakdown: breakdown(&paycheck),
            paycheck,
        }
    }
}

pub fn paycheck_from_form(form: &PaycheckForm) -> Paycheck {
    let lines = |rows: &[PaycheckLineForm]| -> Vec<PaycheckLineItem> {
        rows.iter()
            .map(|row| PaycheckLineItem {
                name: row.name.clone(),
                biweekly_amount: parse_amount(&row.biweekly_amount),
            })
            .collect()
    };

    Paycheck {
        salary_biweekly: parse_amount(&form.salary_biweekly),
        deductions_pre_tax: lines(&form.deductions_pre_tax),
        taxes: lines(&form.taxes),
        deductions_post_tax: lines(&form.deductions_post_tax),
    }
}

fn period_amounts(biweekly: f64, annual: f64) -> PeriodAmounts {
    PeriodAmounts {
        biweekly: money(biweekly),
        monthly: money(annual / MONTHS_PER_YEAR),
        annual: money(annual),
    }
}

fn section(category: PaycheckCategory, items: &[PaycheckLineItem], periods: f64) -> PaycheckSection {
    let mut biweekly_total = 0.0;
    let mut annual_total = 0.0;
    let items = items
        .iter()
        .map(|item| {
            let annual = item.biweekly_amount * periods;
            biweekly_total += item.biweekly_amount;
            annual_total += annual;
            PaycheckLineBreakdown {
                name: item.name.clone(),
                amounts: period_amounts(item.biweekly_amount, annual),
            }
        })
        .collect();

    PaycheckSection {
        category,
        items,
        total: period_amounts(biweekly_total, annual_total),
    }
}

/// Annual, monthly and biweekly figures for every line, section and net pay
pub fn breakdown(paycheck: &Paycheck) -> PaycheckBreakdown {
    let salary_annual = paycheck.salary_biweekly * SALARY_PAY_PERIODS;

    let pre_tax = section(PaycheckCategory::PreTax, &paycheck.deductions_pre_tax, DEDUCTION_PAY_PERIODS);
    let taxes = section(PaycheckCategory::Taxes, &paycheck.taxes, TAX_PAY_PERIODS);
    let post_tax = section(PaycheckCategory::PostTax, &paycheck.deductions_post_tax, DEDUCTION_PAY_PERIODS);

    let withheld = [&pre_tax, &taxes, &post_tax];
    let net_annual = salary_annual - withheld.iter().map(|s| s.total.annual.raw).sum::<f64>();
    let net_biweekly = paycheck.salary_biweekly - withheld.iter().map(|s| s.total.biweekly.raw).sum::<f64>();

    PaycheckBreakdown {
        salary: period_amounts(paycheck.salary_biweekly, salary_annual),
        net: period_amounts(net_biweekly, net_annual),
        pre_tax,
        taxes,
        post_tax,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::SqliteDocumentStore;
    use std::sync::Arc;

    async fn create_test_service() -> PaycheckService {
        let store = SqliteDocumentStore::init_test().await.expect("Failed to init test DB");
        PaycheckService::new(Repositories::new(Arc::new(store)))
    }

    fn line(name: &str, amount: f64) -> PaycheckLineItem {
        PaycheckLineItem {
            name: name.to_string(),
            biweekly_amount: amount,
        }
    }

    #[test]
    fn test_breakdown_annualizes_by_category() {
        let paycheck = Paycheck {
            salary_biweekly: 2000.0,
            deductions_pre_tax: vec![line("Retirement", 100.0)],
            taxes: vec![line("Federal", 200.0)],
            deductions_post_tax: vec![],
        };

        let result = breakdown(&paycheck);
        assert_eq!(result.salary.annual.raw, 52_000.0);
        assert_eq!(result.pre_tax.total.annual.raw, 2400.0);
        assert_eq!(result.taxes.total.annual.raw, 5200.0);
        assert_eq!(result.post_tax.total.annual.raw, 0.0);

        assert_eq!(result.net.annual.raw, 44_400.0);
        assert_eq!(result.net.biweekly.raw, 1700.0);
        assert_eq!(result.net.monthly.raw, 3700.0);
        assert_eq!(result.net.annual.formatted, "$44,400.00");
    }

    #[test]
    fn test_line_monthly_is_annual_over_twelve() {
        let paycheck = Paycheck {
            salary_biweekly: 0.0,
            deductions_pre_tax: vec![line("HSA", 25.0)],
            taxes: vec![],
            deductions_post_tax: vec![],
        };

        let result = breakdown(&paycheck);
        let hsa = &result.pre_tax.items[0];
        assert_eq!(hsa.amounts.annual.raw, 600.0);
        assert_eq!(hsa.amounts.monthly.raw, 50.0);
    }

    #[test]
    fn test_form_coerces_bad_numbers() {
        let form = PaycheckForm {
            salary_biweekly: "oops".to_string(),
            taxes: vec![PaycheckLineForm {
                name: "State".to_string(),
                biweekly_amount: "56.30".to_string(),
            }],
            ..Default::default()
        };

        let paycheck = paycheck_from_form(&form);
        assert_eq!(paycheck.salary_biweekly, 0.0);
        assert_eq!(paycheck.taxes[0].biweekly_amount, 56.3);
    }

    #[tokio::test]
    async fn test_first_load_creates_empty_paycheck() {
        let service = create_test_service().await;
        let session = Session::new("user-1", None);

        let loaded = service.load_paycheck(&session).await.unwrap();
        assert_eq!(loaded.paycheck, Paycheck::default());
        assert_eq!(loaded.breakdown.net.annual.formatted, "$0.00");

        assert!(service.repos.income.get(PAYCHECK_DOCUMENT_ID).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let service = create_test_service().await;
        let session = Session::new("user-1", None);
        let form = PaycheckForm {
            salary_biweekly: "2190.81".to_string(),
            ..Default::default()
        };

        service
            .save_paycheck(&session, SavePaycheckCommand { form })
            .await
            .unwrap();
        let loaded = service.load_paycheck(&session).await.unwrap();
        assert_eq!(loaded.paycheck.salary_biweekly, 2190.81);
    }
}
