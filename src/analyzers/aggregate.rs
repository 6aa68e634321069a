use tracing::debug;

use crate::analyzers::regression::linear_regression;
use crate::analyzers::types::{
    CategoryReport, ItemAggregate, PropertyRegression, ResponseCount, VariableSummary,
};
use crate::analyzers::utility::summarize;
use crate::dataset::{Dataset, Item, Variable};
use crate::error::{AnalysisError, Result};

/// Counts responses per item of `category`, sorted descending by item code.
///
/// Items without ratings are listed with zero responses, so the sum of
/// `responses` equals the number of ratings that fall in the category.
pub fn count_responses(dataset: &Dataset, category: &str) -> Result<Vec<ResponseCount>> {
    let properties = dataset.property_names().len();
    let mut counts: Vec<ResponseCount> = dataset
        .items_in_category(category)?
        .into_iter()
        .map(|item| {
            let mut count = ResponseCount {
                code: item.code.clone(),
                label: item.label(),
                responses: 0,
                property_counts: vec![0; properties],
                score_count: 0,
            };
            for rating in dataset.ratings_for(&item.code) {
                count.responses += 1;
                for (idx, slot) in count.property_counts.iter_mut().enumerate() {
                    if rating.value(Variable::Property(idx)).is_some() {
                        *slot += 1;
                    }
                }
                if rating.score.is_some() {
                    count.score_count += 1;
                }
            }
            count
        })
        .collect();

    counts.sort_by(|a, b| b.code.cmp(&a.code));
    Ok(counts)
}

fn values_of(dataset: &Dataset, item: &Item, variable: Variable) -> Vec<f64> {
    dataset
        .ratings_for(&item.code)
        .filter_map(|r| r.value(variable))
        .collect()
}

/// Mean and standard error of every property and of the score for each item
/// of `category`, ascending by item code.
///
/// # Errors
///
/// [`AnalysisError::InsufficientData`] if any item has fewer than two values
/// for a variable; the error names the variable and the item.
pub fn aggregate_category(dataset: &Dataset, category: &str) -> Result<Vec<ItemAggregate>> {
    let mut aggregates = Vec::new();

    for item in dataset.items_in_category(category)? {
        let label = item.label();

        let properties = dataset
            .property_names()
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let values = values_of(dataset, item, Variable::Property(idx));
                summarize(&format!("{name} of {label}"), &values)
            })
            .collect::<Result<Vec<VariableSummary>>>()?;

        let scores = values_of(dataset, item, Variable::Score);
        let score = summarize(&format!("{} of {label}", dataset.score_name()), &scores)?;

        debug!(item = %label, responses = dataset.ratings_for(&item.code).count(), score_mean = score.mean, "Item aggregated");

        aggregates.push(ItemAggregate {
            code: item.code.clone(),
            responses: dataset.ratings_for(&item.code).count(),
            label,
            properties,
            score,
        });
    }

    Ok(aggregates)
}

/// Aggregates `category` and regresses item-mean score on each item-mean
/// property.
///
/// # Errors
///
/// Fails when an item lacks data (see [`aggregate_category`]), when the
/// category has fewer than two items, or when all items share the same
/// property mean.
pub fn analyze_category(dataset: &Dataset, category: &str) -> Result<CategoryReport> {
    let items = aggregate_category(dataset, category)?;
    if items.len() < 2 {
        return Err(AnalysisError::InsufficientData {
            subject: format!("regression in category '{category}'"),
            found: items.len(),
            required: 2,
        });
    }

    let y: Vec<f64> = items.iter().map(|item| item.score.mean).collect();
    let regressions = dataset
        .property_names()
        .iter()
        .enumerate()
        .map(|(idx, property)| {
            let x: Vec<f64> = items.iter().map(|item| item.properties[idx].mean).collect();
            let regression = linear_regression(&x, &y).map_err(|e| {
                e.about(format!(
                    "{} on {property} in category '{category}'",
                    dataset.score_name()
                ))
            })?;
            Ok(PropertyRegression {
                property: property.clone(),
                regression,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CategoryReport {
        category: category.to_string(),
        property_names: dataset.property_names().to_vec(),
        score_name: dataset.score_name().to_string(),
        items,
        regressions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{ItemCode, Rating};

    fn props() -> Vec<String> {
        vec!["Flottig".into(), "Knaprig".into(), "Rostad".into(), "Salt".into()]
    }

    fn item(code: &str, category: &str) -> Item {
        Item {
            code: ItemCode::new(code),
            name: format!("Nöt {code}"),
            letter_code: None,
            category: category.to_string(),
        }
    }

    fn rating(tester: &str, code: &str, properties: [f64; 4], score: f64) -> Rating {
        Rating {
            tester: tester.to_string(),
            item: ItemCode::new(code),
            timestamp: None,
            properties: properties.iter().copied().map(Some).collect(),
            score: Some(score),
        }
    }

    fn peanuts() -> Dataset {
        Dataset::new(
            props(),
            "Betyg",
            vec![
                item("101", "Jordnöt"),
                item("102", "Jordnöt"),
                item("103", "Jordnöt"),
                item("201", "Cashew"),
            ],
            vec![
                rating("J1", "101", [5.0, 3.0, 4.0, 2.0], 7.0),
                rating("J2", "101", [3.0, 2.0, 4.0, 3.0], 5.0),
                rating("J1", "102", [2.0, 4.0, 1.0, 1.0], 4.0),
                rating("J2", "102", [2.0, 5.0, 2.0, 2.0], 3.0),
                rating("J3", "102", [1.0, 4.0, 1.0, 1.0], 2.0),
                rating("J1", "103", [4.0, 1.0, 5.0, 4.0], 8.0),
                rating("J2", "103", [6.0, 2.0, 5.0, 5.0], 9.0),
                rating("J1", "201", [3.0, 3.0, 3.0, 3.0], 6.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_counts_sum_to_ratings_in_category() {
        let dataset = peanuts();
        let counts = count_responses(&dataset, "Jordnöt").unwrap();

        let total: usize = counts.iter().map(|c| c.responses).sum();
        assert_eq!(total, 7);
        assert_eq!(count_responses(&dataset, "Cashew").unwrap()[0].responses, 1);
    }

    #[test]
    fn test_counts_sorted_descending_with_labels() {
        let counts = count_responses(&peanuts(), "Jordnöt").unwrap();

        let labels: Vec<&str> = counts.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Nöt 103 (103)", "Nöt 102 (102)", "Nöt 101 (101)"]);
        assert_eq!(counts[1].responses, 3);
        assert_eq!(counts[1].property_counts, vec![3, 3, 3, 3]);
    }

    #[test]
    fn test_counts_skip_missing_values() {
        let mut ratings = vec![rating("J1", "101", [1.0, 2.0, 3.0, 4.0], 5.0)];
        ratings[0].properties[1] = None;
        ratings[0].score = None;
        let dataset = Dataset::new(props(), "Betyg", vec![item("101", "Jordnöt")], ratings).unwrap();

        let counts = count_responses(&dataset, "Jordnöt").unwrap();
        assert_eq!(counts[0].responses, 1);
        assert_eq!(counts[0].property_counts, vec![1, 0, 1, 1]);
        assert_eq!(counts[0].score_count, 0);
    }

    #[test]
    fn test_unrated_item_has_zero_count() {
        let dataset = Dataset::new(props(), "Betyg", vec![item("101", "Jordnöt")], vec![]).unwrap();
        let counts = count_responses(&dataset, "Jordnöt").unwrap();
        assert_eq!(counts[0].responses, 0);
    }

    #[test]
    fn test_mean_across_raters() {
        let aggregates = aggregate_category(&peanuts(), "Jordnöt").unwrap();
        let first = &aggregates[0];

        assert_eq!(first.code.as_str(), "101");
        assert_eq!(first.responses, 2);
        assert_eq!(first.properties[0].mean, 4.0);
        assert_eq!(first.properties[1].mean, 2.5);
        assert_eq!(first.score.mean, 6.0);
        assert!((first.score.stderr - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_rating_is_insufficient() {
        let err = aggregate_category(&peanuts(), "Cashew").unwrap_err();
        assert_eq!(
            err,
            AnalysisError::InsufficientData {
                subject: "Flottig of Nöt 201 (201)".into(),
                found: 1,
                required: 2
            }
        );
    }

    #[test]
    fn test_analyze_category_regressions() {
        let report = analyze_category(&peanuts(), "Jordnöt").unwrap();

        assert_eq!(report.items.len(), 3);
        assert_eq!(report.regressions.len(), 4);
        assert_eq!(report.regressions[0].property, "Flottig");

        let fit = report.regressions[0].regression;
        assert_eq!(fit.n, 3);
        // Flottig means 4, 5/3, 5; Betyg means 6, 3, 8.5
        assert!(fit.slope > 0.0);
        let x = [4.0, 5.0 / 3.0, 5.0];
        let y = [6.0, 3.0, 8.5];
        let direct = linear_regression(&x, &y).unwrap();
        assert!((fit.slope - direct.slope).abs() < 1e-12);
        assert!((fit.pvalue - direct.pvalue).abs() < 1e-12);
    }

    #[test]
    fn test_analyze_category_needs_two_items() {
        let dataset = Dataset::new(
            props(),
            "Betyg",
            vec![item("101", "Jordnöt")],
            vec![
                rating("J1", "101", [5.0, 3.0, 4.0, 2.0], 7.0),
                rating("J2", "101", [3.0, 2.0, 4.0, 3.0], 5.0),
            ],
        )
        .unwrap();

        assert!(matches!(
            analyze_category(&dataset, "Jordnöt"),
            Err(AnalysisError::InsufficientData { found: 1, required: 2, .. })
        ));
    }

    #[test]
    fn test_analyze_category_flags_degenerate_fit() {
        let dataset = Dataset::new(
            props(),
            "Betyg",
            vec![item("101", "Jordnöt"), item("102", "Jordnöt")],
            vec![
                rating("J1", "101", [3.0, 3.0, 4.0, 2.0], 7.0),
                rating("J2", "101", [3.0, 2.0, 4.0, 3.0], 5.0),
                rating("J1", "102", [3.0, 4.0, 1.0, 1.0], 4.0),
                rating("J2", "102", [3.0, 5.0, 2.0, 2.0], 3.0),
            ],
        )
        .unwrap();

        let err = analyze_category(&dataset, "Jordnöt").unwrap_err();
        assert_eq!(
            err,
            AnalysisError::DegenerateRegression("Betyg on Flottig in category 'Jordnöt'".into())
        );
    }
}
