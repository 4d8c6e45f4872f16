//! Eligibility rules for index membership.

use std::collections::BTreeSet;

use polars::prelude::*;

use crate::CompositionError;

/// Rules removing entities from the eligible universe.
///
/// An entity is ineligible when it is on the explicit exclusion list or when
/// any of its records carries a restricted industry code. Industry codes are
/// matched as substrings of the exposure string, which concatenates the
/// codes an entity is exposed to; records with no exposure string are
/// treated as unrestricted.
#[derive(Debug, Clone, Default)]
pub struct ExclusionRules {
    excluded_entities: BTreeSet<String>,
    restricted_industries: Vec<String>,
}

impl ExclusionRules {
    /// Create rules from an exclusion list and restricted industry codes.
    #[must_use]
    pub fn new(excluded_entities: Vec<String>, restricted_industries: Vec<String>) -> Self {
        Self { excluded_entities: excluded_entities.into_iter().collect(), restricted_industries }
    }

    /// Whether the entity is on the explicit exclusion list.
    #[must_use]
    pub fn is_excluded(&self, entity: &str) -> bool {
        self.excluded_entities.contains(entity)
    }

    /// Whether an exposure string carries a restricted industry code.
    #[must_use]
    pub fn industry_is_restricted(&self, exposure: Option<&str>) -> bool {
        exposure.is_some_and(|codes| {
            self.restricted_industries.iter().any(|code| codes.contains(code.as_str()))
        })
    }

    /// Collect every ineligible entity in the record table.
    ///
    /// Scans the `industry_exposure` column when present; a table without
    /// the column yields only the explicit exclusions.
    ///
    /// # Errors
    /// Returns `CompositionError` if the entity column is missing.
    pub fn ineligible(&self, records: &DataFrame) -> Result<BTreeSet<String>, CompositionError> {
        let mut ineligible = self.excluded_entities.clone();

        let Ok(exposures) = records.column("industry_exposure") else {
            return Ok(ineligible);
        };
        let exposures = exposures
            .str()
            .map_err(|_| CompositionError::InvalidColumn("industry_exposure".to_string()))?;
        let entities = records
            .column("entity")
            .map_err(|_| CompositionError::MissingColumn("entity".to_string()))?
            .str()
            .map_err(|_| CompositionError::InvalidColumn("entity".to_string()))?;

        for idx in 0..records.height() {
            if self.industry_is_restricted(exposures.get(idx))
                && let Some(entity) = entities.get(idx)
            {
                ineligible.insert(entity.to_string());
            }
        }
        Ok(ineligible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ExclusionRules {
        ExclusionRules::new(
            vec!["X1".to_string()],
            vec!["CW".to_string(), "TC".to_string()],
        )
    }

    fn records(rows: &[(&str, Option<&str>)]) -> DataFrame {
        DataFrame::new(vec![
            Column::new("entity".into(), rows.iter().map(|(e, _)| *e).collect::<Vec<_>>()),
            Column::new("industry_exposure".into(), rows.iter().map(|(_, x)| *x).collect::<Vec<_>>()),
        ])
        .unwrap()
    }

    #[test]
    fn substring_matching_on_exposure_codes() {
        let rules = rules();
        assert!(rules.industry_is_restricted(Some("CW;NP")));
        assert!(rules.industry_is_restricted(Some("TC")));
        assert!(!rules.industry_is_restricted(Some("NP")));
        assert!(!rules.industry_is_restricted(None));
    }

    #[test]
    fn collects_explicit_and_industry_exclusions() {
        let df = records(&[("A", Some("CW")), ("B", None), ("C", Some("NP")), ("X1", None)]);
        let ineligible = rules().ineligible(&df).unwrap();

        assert!(ineligible.contains("A"));
        assert!(ineligible.contains("X1"));
        assert!(!ineligible.contains("B"));
        assert!(!ineligible.contains("C"));
    }

    #[test]
    fn table_without_exposure_column_keeps_explicit_list() {
        let df =
            DataFrame::new(vec![Column::new("entity".into(), vec!["A", "X1"])]).unwrap();
        let ineligible = rules().ineligible(&df).unwrap();

        assert_eq!(ineligible.len(), 1);
        assert!(ineligible.contains("X1"));
    }
}
