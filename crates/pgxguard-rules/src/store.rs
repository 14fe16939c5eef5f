//! Cached rule store with explicit reload.
//!
//! The table is loaded from the persisted document on first use and shared read-only
//! for the life of the store. Reload builds a complete replacement table and swaps it
//! in as a unit; concurrent readers keep the snapshot they already hold and never see
//! a half-populated table.

use crate::model::{DrugRule, RuleTable};
use pgxguard_common::{PgxError, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

pub struct RuleStore {
    path: Option<PathBuf>,
    cache: RwLock<Option<Arc<RuleTable>>>,
}

impl RuleStore {
    /// Store backed by a persisted rule document; nothing is read until first `load`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            cache: RwLock::new(None),
        }
    }

    /// In-memory store, for tests and embedded callers.
    pub fn with_table(table: RuleTable) -> Self {
        Self {
            path: None,
            cache: RwLock::new(Some(Arc::new(table))),
        }
    }

    /// Return the cached table, populating it from the document on first call.
    pub fn load(&self) -> Result<Arc<RuleTable>> {
        // The cache holds no invariant a panicking writer could break mid-update (the
        // table is swapped whole), so a poisoned lock is still readable.
        if let Some(table) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(Arc::clone(table));
        }

        let Some(path) = &self.path else {
            return Err(PgxError::RuleTableUnavailable(
                "no rule document configured".to_string(),
            ));
        };
        let table = Arc::new(read_document(path)?);
        let mut guard = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        // Another loader may have won the race; keep whichever table landed first.
        if let Some(existing) = guard.as_ref() {
            return Ok(Arc::clone(existing));
        }
        info!(drugs = table.len(), "Loaded pharmacogenomic rule table");
        *guard = Some(Arc::clone(&table));
        Ok(table)
    }

    /// Discard the cache and force a fresh load. The replacement table is fully built
    /// before the swap, so readers observe either the old or the new table.
    pub fn reload(&self) -> Result<Arc<RuleTable>> {
        let Some(path) = &self.path else {
            // In-memory stores have no document to re-fetch.
            return self.load();
        };
        let table = Arc::new(read_document(path)?);
        let mut guard = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        info!(drugs = table.len(), "Reloaded pharmacogenomic rule table");
        *guard = Some(Arc::clone(&table));
        Ok(table)
    }

    /// Case-folded drug lookup. `None` means the drug has no rules.
    pub fn lookup_drug(&self, name: &str) -> Result<Option<DrugRule>> {
        let table = self.load()?;
        debug!(drug = %name, "Rule table lookup");
        Ok(table.drug(name).cloned())
    }

    /// All known drug identifiers in lexical order.
    pub fn list_drugs(&self) -> Result<Vec<String>> {
        Ok(self.load()?.drug_names())
    }
}

fn read_document(path: &Path) -> Result<RuleTable> {
    let doc = std::fs::read_to_string(path).map_err(|e| unavailable(path, &e))?;
    RuleTable::from_json_str(&doc).map_err(|e| unavailable(path, &e))
}

fn unavailable(path: &Path, cause: &dyn std::fmt::Display) -> PgxError {
    PgxError::RuleTableUnavailable(format!("{}: {cause}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgxguard_common::profile::{Phenotype, Severity};
    use crate::model::PhenotypeRule;
    use std::collections::HashMap;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("pgxguard-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn single_drug_doc(drug: &str, gene: &str) -> String {
        format!(
            r#"{{"{drug}": {{"primary_gene": "{gene}", "phenotype_rules": {{
                "PM": {{"risk_label": "Ineffective", "severity": "high",
                        "recommendation": "Avoid."}}}}}}}}"#
        )
    }

    #[test]
    fn test_missing_document_is_unavailable() {
        let store = RuleStore::new("/nonexistent/cpic_rules.json");
        let err = store.load().unwrap_err();
        assert!(matches!(err, PgxError::RuleTableUnavailable(_)));
    }

    #[test]
    fn test_malformed_document_is_unavailable() {
        let path = write_temp("malformed.json", "{ definitely not json");
        let store = RuleStore::new(&path);
        let err = store.load().unwrap_err();
        assert!(matches!(err, PgxError::RuleTableUnavailable(_)));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_caches_and_lookup_case_folds() {
        let path = write_temp("codeine.json", &single_drug_doc("CODEINE", "CYP2D6"));
        let store = RuleStore::new(&path);

        let rule = store.lookup_drug("codeine").unwrap().expect("known drug");
        assert_eq!(rule.primary_gene, "CYP2D6");
        assert!(store.lookup_drug("warfarin").unwrap().is_none());

        // Cached: deleting the document must not affect subsequent reads.
        std::fs::remove_file(&path).unwrap();
        assert_eq!(store.list_drugs().unwrap(), vec!["CODEINE"]);
    }

    #[test]
    fn test_reload_swaps_table_as_a_unit() {
        let path = write_temp("reload.json", &single_drug_doc("CODEINE", "CYP2D6"));
        let store = RuleStore::new(&path);
        let before = store.load().unwrap();
        assert!(before.contains("CODEINE"));

        std::fs::write(&path, single_drug_doc("WARFARIN", "CYP2C9")).unwrap();
        let after = store.reload().unwrap();
        assert!(after.contains("WARFARIN"));
        assert!(!after.contains("CODEINE"));
        // The snapshot taken before the reload is untouched.
        assert!(before.contains("CODEINE"));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_failed_reload_keeps_previous_table() {
        let path = write_temp("reload-fail.json", &single_drug_doc("CODEINE", "CYP2D6"));
        let store = RuleStore::new(&path);
        store.load().unwrap();

        std::fs::write(&path, "{ broken").unwrap();
        assert!(store.reload().is_err());
        // The old table still serves lookups.
        assert!(store.lookup_drug("codeine").unwrap().is_some());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_poisoned_cache_still_serves_lookups() {
        let path = write_temp("poison.json", &single_drug_doc("CODEINE", "CYP2D6"));
        let store = Arc::new(RuleStore::new(&path));
        store.load().unwrap();

        // Panic while holding the cache write lock to poison it.
        let poisoner = Arc::clone(&store);
        let handle = std::thread::spawn(move || {
            let _guard = poisoner.cache.write().unwrap();
            panic!("poison the cache lock");
        });
        assert!(handle.join().is_err());

        assert!(store.lookup_drug("codeine").unwrap().is_some());
        assert!(store.reload().is_ok());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_with_table_is_isolated() {
        let mut rules = HashMap::new();
        rules.insert(
            Phenotype::Pm,
            PhenotypeRule {
                risk_label: "Ineffective".to_string(),
                severity: Severity::High,
                recommendation: "Avoid.".to_string(),
            },
        );
        let table = RuleTable::from_drugs([(
            "codeine".to_string(),
            DrugRule {
                primary_gene: "CYP2D6".to_string(),
                phenotype_rules: rules,
            },
        )]);
        let store = RuleStore::with_table(table);
        assert_eq!(store.list_drugs().unwrap(), vec!["CODEINE"]);
        assert!(store.reload().is_ok());
    }
}
