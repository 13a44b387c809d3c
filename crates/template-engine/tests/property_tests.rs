//! Property-based tests for the template engine
//!
//! Covers extraction order, hidden-field removal, render idempotence and the
//! recommender's location dedup, plus the end-to-end report scenarios.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use shared_types::{
    FormValues, NewEntry, NotStoppedReason, RuleOperator, SavedEntry, StopReason,
    TemplateDefinition, VisibilityRule,
};
use template_engine::{
    compose_reason, dedupe_by_location, extract_fields, reason::REASON_PLACEHOLDER, render,
    FieldCatalog, MemoryStore, RecordStore, Recommender, RecommenderConfig, SegmentKind,
};

// ============================================================
// Strategies
// ============================================================

fn field_name() -> impl Strategy<Value = String> {
    "[a-z]{1,6}"
}

/// Literal prose: lowercase words, commas, periods and newlines, no braces
fn literal() -> impl Strategy<Value = String> {
    "[a-z ,.\n]{0,12}"
}

/// A template plus the distinct names it mentions
fn template() -> impl Strategy<Value = (String, Vec<String>)> {
    proptest::collection::vec((literal(), prop::option::of(field_name())), 0..8).prop_map(
        |pieces| {
            let mut text = String::new();
            let mut names = Vec::new();
            for (lit, name) in pieces {
                text.push_str(&lit);
                if let Some(name) = name {
                    text.push_str(&format!("{{{}}}", name));
                    names.push(name);
                }
            }
            (text, names)
        },
    )
}

fn catalog_for(template: &str) -> FieldCatalog {
    let mut catalog = FieldCatalog::new();
    catalog.reconcile(template);
    catalog
}

/// Rule that hides `target` until a switch field that never gets a value says "aan"
fn hidden(target: &str) -> VisibilityRule {
    VisibilityRule::new(target, "schakelaar", RuleOperator::Equals, Some("aan"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // ============================================================
    // Extraction
    // ============================================================

    #[test]
    fn extraction_is_distinct_and_in_first_order((template, names) in template()) {
        let fields = extract_fields(&template);

        let unique: HashSet<&String> = fields.iter().collect();
        prop_assert_eq!(unique.len(), fields.len());

        let mut expected: Vec<String> = Vec::new();
        for name in names {
            if !expected.contains(&name) {
                expected.push(name);
            }
        }
        prop_assert_eq!(fields, expected);
    }

    #[test]
    fn extraction_is_stable((template, _) in template()) {
        prop_assert_eq!(extract_fields(&template), extract_fields(&template));
    }

    // ============================================================
    // Rendering
    // ============================================================

    #[test]
    fn hidden_fields_never_reach_output(
        (template, _) in template(),
        hide_mask in proptest::collection::vec(any::<bool>(), 8),
        filled in proptest::collection::vec("[a-z]{0,5}", 8),
    ) {
        let distinct = extract_fields(&template);
        let mut values = FormValues::new();
        let mut rules = Vec::new();
        let mut hidden_names = Vec::new();

        for (i, name) in distinct.iter().enumerate() {
            if hide_mask[i % hide_mask.len()] {
                rules.push(hidden(name));
                values.set(name.clone(), "GEHEIM");
                hidden_names.push(name.clone());
            } else {
                values.set(name.clone(), filled[i % filled.len()].clone());
            }
        }

        let doc = render(&template, &values, &catalog_for(&template), &rules);
        for name in &hidden_names {
            let placeholder = format!("{{{}}}", name);
            prop_assert!(!doc.text.contains(&placeholder));
        }
        prop_assert!(!doc.text.contains("GEHEIM"));
        prop_assert!(doc
            .segments
            .iter()
            .all(|s| s.field.as_ref().map_or(true, |f| !hidden_names.contains(f))));
    }

    #[test]
    fn render_is_idempotent(
        (template, _) in template(),
        value in "[a-z]{0,5}",
        hide_first in any::<bool>(),
    ) {
        let fields = extract_fields(&template);
        let values: FormValues = fields.iter().map(|f| (f.clone(), value.clone())).collect();
        let rules: Vec<VisibilityRule> = fields
            .first()
            .filter(|_| hide_first)
            .map(|f| vec![hidden(f)])
            .unwrap_or_default();
        let catalog = catalog_for(&template);

        prop_assert_eq!(
            render(&template, &values, &catalog, &rules),
            render(&template, &values, &catalog, &rules)
        );
    }

    #[test]
    fn text_matches_segments((template, _) in template(), value in "[a-z\n ]{0,5}") {
        let values: FormValues = extract_fields(&template)
            .into_iter()
            .map(|f| (f, value.clone()))
            .collect();
        let doc = render(&template, &values, &catalog_for(&template), &[]);

        let joined: String = doc.segments.iter().map(|s| s.content.as_str()).collect();
        prop_assert_eq!(&joined, &doc.text);
        prop_assert_eq!(doc.text.trim(), doc.text.as_str());
        prop_assert!(!doc.text.contains("\n\n\n"));
    }

    // ============================================================
    // Recommender dedup
    // ============================================================

    #[test]
    fn dedup_keeps_one_most_recent_entry_per_location(
        locations in proptest::collection::vec(
            prop_oneof![Just("Dam"), Just("Rokin"), Just("Spui"), Just("Damrak")],
            0..30,
        )
    ) {
        let now = Utc::now();
        // Index doubles as age in minutes, so the input is newest first
        let entries: Vec<SavedEntry> = locations
            .iter()
            .enumerate()
            .map(|(i, loc)| saved(loc, &format!("tekst {}", i), now - Duration::minutes(i as i64)))
            .collect();

        let mut newest: HashMap<&str, &SavedEntry> = HashMap::new();
        for entry in &entries {
            let slot = newest.entry(entry.location_value.as_str()).or_insert(entry);
            if entry.created_at > slot.created_at {
                *slot = entry;
            }
        }

        let deduped = dedupe_by_location(entries.clone());
        prop_assert_eq!(deduped.len(), newest.len());
        for entry in &deduped {
            prop_assert_eq!(&newest[entry.location_value.as_str()].id, &entry.id);
        }
    }
}

fn saved(location: &str, text: &str, at: chrono::DateTime<Utc>) -> SavedEntry {
    let values: FormValues = [("locatie", location)].into_iter().collect();
    NewEntry::new("agent-1", "R397b", location, values, text)
        .unwrap()
        .into_saved(at)
}

// ============================================================
// Scenarios
// ============================================================

const TEMPLATE: &str = "Ik zag {naam} bij {locatie}.";

#[test]
fn scenario_all_fields_filled() {
    let values: FormValues = [("naam", "Jan"), ("locatie", "Dam")].into_iter().collect();
    let doc = render(TEMPLATE, &values, &catalog_for(TEMPLATE), &[]);

    assert_eq!(doc.text, "Ik zag Jan bij Dam.");
    assert!(doc
        .segments
        .iter()
        .all(|s| s.kind != SegmentKind::UnfilledField));
}

#[test]
fn scenario_only_sentence_hidden() {
    let values: FormValues = [("naam", "Jan")].into_iter().collect();
    let doc = render(TEMPLATE, &values, &catalog_for(TEMPLATE), &[hidden("locatie")]);
    assert_eq!(doc.text, "");
}

#[test]
fn scenario_second_sentence_unfilled() {
    let template = "A {x}. B {y}.";
    let doc = render(
        template,
        &FormValues::new(),
        &catalog_for(template),
        &[hidden("x")],
    );

    assert_eq!(doc.text, "B {y}.");
    let unfilled: Vec<_> = doc
        .segments
        .iter()
        .filter(|s| s.kind == SegmentKind::UnfilledField)
        .collect();
    assert_eq!(unfilled.len(), 1);
    assert_eq!(unfilled[0].content, "{y}");
    assert_eq!(unfilled[0].field.as_deref(), Some("y"));
}

#[test]
fn scenario_empty_other_reason() {
    let reason = StopReason::not_stopped(NotStoppedReason::Other(String::new()));
    let clause = compose_reason(&reason, "R397b");
    assert!(!clause.is_empty());
    assert!(clause.contains(REASON_PLACEHOLDER));
}

#[tokio::test]
async fn scenario_same_location_keeps_latest() {
    let store = Arc::new(
        MemoryStore::with_templates([TemplateDefinition {
            factcode: "R397b".into(),
            template: TEMPLATE.into(),
            field_specs: vec![],
            visibility_rules: vec![],
            location_field: Some("locatie".into()),
        }])
        .await,
    );
    let now = Utc::now();
    let t1 = saved("Dam", "eerste", now - Duration::minutes(30));
    let t2 = saved("Dam", "tweede", now);
    store.insert_raw(t1).await;
    store.insert_raw(t2.clone()).await;

    let recommender = Recommender::new(store.clone(), RecommenderConfig::default());
    let recs = recommender.refresh("R397b").await;
    assert_eq!(recs.entries, vec![t2.clone()]);
    assert_eq!(recs.top_picks, vec![t2]);

    assert!(store.get_template("R397b").await.is_ok());
}
