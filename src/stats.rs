use crate::errors::EmptyPeriod;
use crate::models::{AggregateResult, Dataset, GroupTotal, SalesRecord};
use crate::period::PeriodSelector;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

pub fn aggregate(dataset: &Dataset, selector: &PeriodSelector) -> Result<AggregateResult, EmptyPeriod> {
    let selected: Vec<&SalesRecord> = dataset
        .entries()
        .filter(|(record, keys)| selector.matches(record, keys))
        .map(|(record, _)| record)
        .collect();

    if selected.is_empty() {
        debug!("no records for {:?}", selector);
        return Err(EmptyPeriod {
            label: selector.label(),
        });
    }

    let total_quantity_all = saturating_sum(dataset.records().iter().map(|r| r.quantity));
    let total_quantity_selected = saturating_sum(selected.iter().map(|r| r.quantity));
    // Sums every matching row, so a variant sold on several days counts its
    // stock once per row.
    let total_stock = saturating_sum(selected.iter().map(|r| r.stock));

    let distinct_variant_count = selected
        .iter()
        .map(|r| r.variant.as_str())
        .collect::<BTreeSet<_>>()
        .len();

    let (distinct_scent_count, per_scent_totals) = if dataset.has_scent() {
        let scent_totals = group_sum(
            selected
                .iter()
                .filter_map(|r| r.scent.as_deref().map(|scent| (scent, r.quantity))),
        );
        (Some(scent_totals.len()), Some(scent_totals))
    } else {
        (None, None)
    };

    let per_variant_totals = group_sum(selected.iter().map(|r| (r.variant.as_str(), r.quantity)));
    let stock_by_variant = group_sum(selected.iter().map(|r| (r.variant.as_str(), r.stock)));

    debug!(
        "aggregated {} of {} records for {:?}",
        selected.len(),
        dataset.len(),
        selector
    );

    Ok(AggregateResult {
        selector: selector.clone(),
        label: selector.label(),
        total_quantity_selected,
        total_quantity_all,
        distinct_variant_count,
        distinct_scent_count,
        total_stock,
        per_variant_totals,
        per_scent_totals,
        stock_by_variant,
        records: selected.into_iter().cloned().collect(),
    })
}

fn saturating_sum(values: impl Iterator<Item = u64>) -> u64 {
    values.fold(0u64, u64::saturating_add)
}

/// Group-by-sum, ordered by key.
fn group_sum<'a>(pairs: impl Iterator<Item = (&'a str, u64)>) -> Vec<GroupTotal> {
    let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
    for (key, value) in pairs {
        let entry = totals.entry(key).or_default();
        *entry = entry.saturating_add(value);
    }
    totals
        .into_iter()
        .map(|(key, total)| GroupTotal {
            key: key.to_string(),
            total,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sale(on: NaiveDate, variant: &str, scent: Option<&str>, quantity: u64, stock: u64) -> SalesRecord {
        SalesRecord {
            number: String::new(),
            date: on,
            variant: variant.to_string(),
            scent: scent.map(str::to_string),
            quantity,
            unit_price: Some(85000.0),
            unit_cost: Some(40000.0),
            stock,
        }
    }

    fn rose_and_musk() -> Dataset {
        Dataset::new(
            vec![
                sale(date(2024, 10, 5), "Rose", None, 3, 10),
                sale(date(2024, 10, 6), "Rose", None, 2, 10),
                sale(date(2024, 11, 1), "Musk", None, 5, 7),
            ],
            false,
            0,
        )
    }

    fn with_scents() -> Dataset {
        Dataset::new(
            vec![
                sale(date(2024, 3, 4), "Rose", Some("Floral"), 4, 12),
                sale(date(2024, 3, 9), "Jasmine", Some("Floral"), 1, 3),
                sale(date(2024, 3, 20), "Oud", Some("Woody"), 2, 5),
                sale(date(2024, 4, 2), "Oud", None, 6, 5),
            ],
            true,
            0,
        )
    }

    #[test]
    fn monthly_rose_scenario() {
        let result = aggregate(&rose_and_musk(), &PeriodSelector::Monthly("2024-10".into())).unwrap();
        assert_eq!(result.total_quantity_selected, 5);
        assert_eq!(result.total_quantity_all, 10);
        assert_eq!(result.distinct_variant_count, 1);
        assert_eq!(result.total_stock, 20);
        assert_eq!(
            result.per_variant_totals,
            vec![GroupTotal {
                key: "Rose".into(),
                total: 5
            }]
        );
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.label, "2024-10");
    }

    #[test]
    fn empty_month_is_an_error() {
        let err = aggregate(&with_scents(), &PeriodSelector::Monthly("2024-01".into())).unwrap_err();
        assert_eq!(err.label, "2024-01");
    }

    #[test]
    fn missing_scent_column_is_not_applicable() {
        let result = aggregate(&rose_and_musk(), &PeriodSelector::Yearly(2024)).unwrap();
        assert_eq!(result.distinct_scent_count, None);
        assert_eq!(result.per_scent_totals, None);
        assert_eq!(result.distinct_variant_count, 2);
        assert_eq!(result.total_stock, 27);
    }

    #[test]
    fn scent_totals_skip_blank_scents() {
        let result = aggregate(&with_scents(), &PeriodSelector::Yearly(2024)).unwrap();
        assert_eq!(result.distinct_scent_count, Some(2));
        assert_eq!(
            result.per_scent_totals,
            Some(vec![
                GroupTotal {
                    key: "Floral".into(),
                    total: 5
                },
                GroupTotal {
                    key: "Woody".into(),
                    total: 2
                },
            ])
        );

        let april = aggregate(&with_scents(), &PeriodSelector::Monthly("2024-04".into())).unwrap();
        assert_eq!(april.distinct_scent_count, Some(0));
        assert_eq!(april.per_scent_totals, Some(vec![]));
    }

    #[test]
    fn full_span_selection_equals_all_time_total() {
        let dataset = with_scents();
        let result = aggregate(&dataset, &PeriodSelector::Yearly(2024)).unwrap();
        assert_eq!(result.total_quantity_selected, result.total_quantity_all);

        let march = aggregate(&dataset, &PeriodSelector::Monthly("2024-03".into())).unwrap();
        assert!(march.total_quantity_selected < march.total_quantity_all);
    }

    #[test]
    fn variant_totals_sum_to_selected_total() {
        let dataset = with_scents();
        for selector in [
            PeriodSelector::Monthly("2024-03".into()),
            PeriodSelector::Weekly("2024-W10".into()),
            PeriodSelector::Daily(date(2024, 3, 20)),
            PeriodSelector::Yearly(2024),
        ] {
            let result = aggregate(&dataset, &selector).unwrap();
            let sum: u64 = result.per_variant_totals.iter().map(|g| g.total).sum();
            assert_eq!(sum, result.total_quantity_selected, "{selector:?}");
        }
    }

    #[test]
    fn stock_is_summed_per_row() {
        let result = aggregate(&with_scents(), &PeriodSelector::Yearly(2024)).unwrap();
        assert_eq!(result.total_stock, 25);
        let oud = result
            .stock_by_variant
            .iter()
            .find(|g| g.key == "Oud")
            .expect("missing Oud");
        assert_eq!(oud.total, 10);
    }

    #[test]
    fn aggregate_is_idempotent() {
        let dataset = with_scents();
        let selector = PeriodSelector::Weekly("2024-W10".into());
        assert_eq!(
            aggregate(&dataset, &selector).unwrap(),
            aggregate(&dataset, &selector).unwrap()
        );
    }

    #[test]
    fn daily_selection_matches_exact_date() {
        let result = aggregate(&rose_and_musk(), &PeriodSelector::Daily(date(2024, 10, 6))).unwrap();
        assert_eq!(result.total_quantity_selected, 2);
        assert!(aggregate(&rose_and_musk(), &PeriodSelector::Daily(date(2024, 10, 7))).is_err());
    }

    #[test]
    fn huge_totals_saturate_like_grouped_sums() {
        let dataset = Dataset::new(
            vec![
                sale(date(2024, 10, 5), "Rose", None, u64::MAX, u64::MAX),
                sale(date(2024, 10, 6), "Rose", None, 1, 1),
            ],
            false,
            0,
        );
        let result = aggregate(&dataset, &PeriodSelector::Monthly("2024-10".into())).unwrap();
        assert_eq!(result.total_quantity_selected, u64::MAX);
        assert_eq!(result.total_quantity_all, u64::MAX);
        assert_eq!(result.total_stock, u64::MAX);
        assert_eq!(result.per_variant_totals[0].total, result.total_quantity_selected);
        assert_eq!(result.stock_by_variant[0].total, result.total_stock);
    }
}
