use crate::dataset::normalize_category;
use crate::error::{AppError, Result};
use crate::ml::features::EmployeeFeatures;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Salary bands accepted after normalization
pub const SALARY_LEVELS: [&str; 3] = ["low", "medium", "high"];

/// One employee's input features, as submitted for a prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct EmployeeRecord {
    #[validate(range(min = 0.0, max = 1.0))]
    pub satisfaction_level: f64,

    #[validate(range(min = 0.0, max = 1.0))]
    pub last_evaluation: f64,

    #[validate(range(min = 0))]
    pub number_project: i64,

    #[serde(alias = "average_montly_hours")]
    #[validate(range(min = 0))]
    pub average_monthly_hours: i64,

    /// Years at the company
    #[serde(alias = "time_spend_company")]
    #[validate(range(min = 0))]
    pub tenure: i64,

    #[serde(alias = "Work_accident")]
    #[validate(range(min = 0, max = 1))]
    pub work_accident: i64,

    #[validate(range(min = 0, max = 1))]
    pub promotion_last_5years: i64,

    pub department: String,

    pub salary: String,
}

impl EmployeeRecord {
    /// Check every field domain, reporting all violations at once
    pub fn validate_domains(&self) -> Result<()> {
        let mut problems = Vec::new();

        if let Err(errors) = self.validate() {
            problems.push(errors.to_string());
        }

        if normalize_category(&self.department).is_none() {
            problems.push("department: must not be empty".to_string());
        }

        match normalize_category(&self.salary) {
            Some(salary) if SALARY_LEVELS.contains(&salary.as_str()) => {}
            _ => problems.push(format!(
                "salary: must be one of {} (got '{}')",
                SALARY_LEVELS.join(", "),
                self.salary
            )),
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(problems.join("; ")))
        }
    }

    /// Validate and convert to the normalized feature form the model consumes
    pub fn into_features(self) -> Result<EmployeeFeatures> {
        self.validate_domains()?;

        Ok(EmployeeFeatures {
            numeric: [
                self.satisfaction_level,
                self.last_evaluation,
                self.number_project as f64,
                self.average_monthly_hours as f64,
                self.tenure as f64,
                self.work_accident as f64,
                self.promotion_last_5years as f64,
            ],
            department: normalize_category(&self.department),
            salary: normalize_category(&self.salary),
        })
    }
}
