//! Built-in placeholder examples.
//!
//! Shown (flagged `isDummyData`) while a model type has nothing stored, and
//! persisted on first correction so users can refine what they were shown.

use crate::types::{Example, ModelType};

/// The static sample set for `model`.
#[must_use]
pub fn sample_examples(model: ModelType) -> Vec<Example> {
    let p = model.seed_prefix();
    let rows: &[(&str, &str)] = match model {
        ModelType::Cognos => &[
            (
                "total([Revenue] for [Region])",
                "CALCULATE(SUM(Sales[Revenue]), ALLEXCEPT(Sales, Sales[Region]))",
            ),
            (
                "if ([Quantity] > 100) then ('Bulk') else ('Standard')",
                "IF(Sales[Quantity] > 100, \"Bulk\", \"Standard\")",
            ),
            (
                "running-total([Revenue])",
                "CALCULATE(SUM(Sales[Revenue]), FILTER(ALLSELECTED(Sales[Date]), Sales[Date] <= MAX(Sales[Date])))",
            ),
        ],
        ModelType::Microstrategy => &[
            (
                "Sum(Revenue){~+}",
                "CALCULATE(SUM([Revenue]), ALL())",
            ),
            (
                "Sum(Revenue) / Sum(Units)",
                "DIVIDE(SUM([Revenue]), SUM([Units]))",
            ),
            (
                "RunningSum<SortBy=(Month)>(Revenue)",
                "CALCULATE(SUM([Revenue]), FILTER(ALL('Date'[Month]), 'Date'[Month] <= MAX('Date'[Month])))",
            ),
        ],
        ModelType::Tableau => &[
            (
                "{FIXED [Region] : SUM([Sales])}",
                "CALCULATE(SUM(Orders[Sales]), ALLEXCEPT(Orders, Orders[Region]))",
            ),
            (
                "ZN(SUM([Profit])) / SUM([Sales])",
                "DIVIDE(COALESCE(SUM(Orders[Profit]), 0), SUM(Orders[Sales]))",
            ),
            (
                "WINDOW_AVG(SUM([Sales]), -2, 0)",
                "AVERAGEX(DATESINPERIOD('Date'[Date], MAX('Date'[Date]), -3, MONTH), [Total Sales])",
            ),
        ],
    };

    rows.iter()
        .enumerate()
        .map(|(i, (src, dax))| Example::seed(format!("{p}-{:03}", i + 1), *src, *dax))
        .collect()
}

/// Whether `id` names one of `model`'s built-in samples.
#[must_use]
pub fn is_sample_id(model: ModelType, id: &str) -> bool {
    sample_examples(model).iter().any(|e| e.id == id)
}
