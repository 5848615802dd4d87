//! Natural remedy search: storage seam, model enrichment, and summary.
//!
//! Search runs Atlas Search first and falls back to a regex scan. Each hit
//! is enriched with a model-written description; failures degrade to
//! deterministic fallback text instead of failing the request.

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::db::DatabaseError;
use crate::pipeline::structuring::{
    build_remedy_detail_prompt, build_remedy_summary_prompt, trim_to_json_object, RemedyFacts,
    TextGenerator,
};

/// Model calls in flight per search.
const ENRICH_CONCURRENCY: usize = 4;

/// Names passed to the summary prompt.
const SUMMARY_TOP_N: usize = 5;

pub const SEARCH_METHOD: &str = "Atlas Search with AI Enhancement";
const CONSULT_PROVIDER: &str = "Consult healthcare provider before use";
const NOT_SPECIFIED: &str = "Not specified";
const TRADITIONAL_REMEDY: &str = "Traditional remedy";

#[derive(Error, Debug)]
pub enum RemedyError {
    #[error("Please provide at least one ailment or condition to search for.")]
    NoConditions,
    #[error("Search service temporarily unavailable. Please try again later.")]
    SearchUnavailable(#[source] DatabaseError),
    #[error("Database already contains remedy data. Seed operation aborted.")]
    AlreadySeeded,
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

// ═══════════════════════════════════════════
// Model
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceLink {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

/// A stored remedy. `_id` is read but never written: inserts let the
/// server assign it, and responses render it as hex via [`RemedyView`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Remedy {
    #[serde(rename = "_id", skip_serializing)]
    pub id: Option<ObjectId>,
    pub ailment: String,
    pub remedy: String,
    #[serde(deserialize_with = "one_or_many")]
    pub ingredients: Vec<String>,
    pub preparation: String,
    pub dosage: String,
    pub source: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benefits: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub potential_risks: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scientific_evidence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effectiveness_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_conditions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceLink>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_score: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// Ingredients stored as a single string become a one-element list.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
        None => Vec::new(),
    })
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

impl Remedy {
    pub fn new(
        ailment: &str,
        remedy: &str,
        ingredients: &[&str],
        preparation: &str,
        dosage: &str,
        source: &str,
    ) -> Self {
        Self {
            ailment: ailment.into(),
            remedy: remedy.into(),
            ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
            preparation: preparation.into(),
            dosage: dosage.into(),
            source: source.into(),
            ..Default::default()
        }
    }

    /// `name` when set, else the `remedy` field.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.remedy,
        }
    }

    pub fn ingredients_text(&self) -> String {
        if self.ingredients.is_empty() {
            NOT_SPECIFIED.to_string()
        } else {
            self.ingredients.join(", ")
        }
    }

    fn contains_benefit(&self) -> Vec<String> {
        if self.ingredients.is_empty() {
            Vec::new()
        } else {
            vec![format!("Contains: {}", self.ingredients.join(", "))]
        }
    }

    fn original_data(&self) -> OriginalData {
        OriginalData {
            ailment: self.ailment.clone(),
            ingredients: self.ingredients.clone(),
            preparation: self.preparation.clone(),
            dosage: self.dosage.clone(),
            source: self.source.clone(),
        }
    }

    fn apply(&mut self, details: RemedyDetails) {
        self.name = Some(self.display_name().to_string());
        self.description = Some(details.description);
        self.benefits = Some(details.benefits);
        self.usage_instructions = Some(details.usage_instructions);
        self.potential_risks = Some(details.potential_risks);
        self.scientific_evidence = Some(details.scientific_evidence);
    }
}

/// Patient-facing details written by the model for one remedy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemedyDetails {
    pub description: String,
    pub benefits: Vec<String>,
    pub usage_instructions: String,
    pub potential_risks: Vec<String>,
    pub scientific_evidence: String,
}

impl RemedyDetails {
    /// Details when no model is configured.
    pub fn without_ai(r: &Remedy) -> Self {
        Self {
            description: or_default(&r.preparation, "No description available").to_string(),
            benefits: r.contains_benefit(),
            usage_instructions: or_default(&r.dosage, "Follow preparation instructions")
                .to_string(),
            potential_risks: vec![CONSULT_PROVIDER.into()],
            scientific_evidence: or_default(&r.source, TRADITIONAL_REMEDY).to_string(),
        }
    }

    /// Details when the model replied with something that is not JSON.
    pub fn unparseable_reply(r: &Remedy) -> Self {
        Self {
            description: format!("Natural remedy using {}", r.ingredients_text()),
            benefits: vec![format!("May help with {}", r.ailment)],
            usage_instructions: format!(
                "{}. {}",
                or_default(&r.preparation, NOT_SPECIFIED),
                or_default(&r.dosage, NOT_SPECIFIED)
            ),
            potential_risks: vec![CONSULT_PROVIDER.into()],
            scientific_evidence: or_default(&r.source, TRADITIONAL_REMEDY).to_string(),
        }
    }

    /// Details when the model call itself failed.
    pub fn generation_failed(r: &Remedy) -> Self {
        let fallback_description = format!("Natural remedy for {}", r.ailment);
        Self {
            description: or_default(&r.preparation, &fallback_description).to_string(),
            benefits: r.contains_benefit(),
            usage_instructions: format!(
                "{}. {}",
                or_default(&r.preparation, "Prepare as directed"),
                or_default(&r.dosage, "Use as needed")
            ),
            potential_risks: vec![CONSULT_PROVIDER.into()],
            scientific_evidence: or_default(&r.source, TRADITIONAL_REMEDY).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OriginalData {
    pub ailment: String,
    pub ingredients: Vec<String>,
    pub preparation: String,
    pub dosage: String,
    pub source: String,
}

/// Response shape of a remedy: stored fields plus hex `_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemedyView {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub remedy: Remedy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_data: Option<OriginalData>,
}

impl From<Remedy> for RemedyView {
    fn from(remedy: Remedy) -> Self {
        Self {
            id: remedy.id.map(|id| id.to_hex()),
            remedy,
            original_data: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchInfo {
    pub search_terms: Vec<String>,
    pub total_results: usize,
    pub search_method: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub remedies: Vec<RemedyView>,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_info: Option<SearchInfo>,
}

// ═══════════════════════════════════════════
// Storage seam
// ═══════════════════════════════════════════

/// Remedy persistence (allows mocking).
#[async_trait]
pub trait RemedyStore: Send + Sync {
    /// Ranked full-text search over the search index.
    async fn atlas_search(&self, conditions: &[String]) -> Result<Vec<Remedy>, DatabaseError>;

    /// Case-insensitive regex scan, used when the index is unavailable.
    async fn regex_search(&self, conditions: &[String]) -> Result<Vec<Remedy>, DatabaseError>;

    async fn count(&self) -> Result<u64, DatabaseError>;

    async fn insert_many(&self, remedies: &[Remedy]) -> Result<usize, DatabaseError>;

    async fn delete_all(&self) -> Result<u64, DatabaseError>;

    async fn sample(&self) -> Result<Option<Remedy>, DatabaseError>;

    /// First hit of a basic text search across every field.
    async fn probe_search(&self, term: &str) -> Result<Option<Remedy>, DatabaseError>;
}

// ═══════════════════════════════════════════
// Operations
// ═══════════════════════════════════════════

/// `conditions` must be a non-empty array. Non-string items are stringified.
pub fn parse_conditions(body: &Value) -> Result<Vec<String>, RemedyError> {
    let Some(Value::Array(items)) = body.get("conditions") else {
        return Err(RemedyError::NoConditions);
    };
    if items.is_empty() {
        return Err(RemedyError::NoConditions);
    }
    Ok(items
        .iter()
        .map(|item| match item {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect())
}

async fn find_remedies(
    store: &dyn RemedyStore,
    conditions: &[String],
) -> Result<Vec<Remedy>, RemedyError> {
    match store.atlas_search(conditions).await {
        Ok(found) => {
            tracing::info!(count = found.len(), "Atlas Search returned remedies");
            for r in found.iter().take(3) {
                tracing::debug!(remedy = r.display_name(), ailment = %r.ailment, score = ?r.search_score, "Top result");
            }
            Ok(found)
        }
        Err(e) => {
            tracing::error!(error = %e, "Atlas Search failed, attempting regex fallback");
            let found = store.regex_search(conditions).await.map_err(|e| {
                tracing::error!(error = %e, "Fallback search also failed");
                RemedyError::SearchUnavailable(e)
            })?;
            tracing::info!(count = found.len(), "Fallback search returned remedies");
            Ok(found)
        }
    }
}

async fn enrich(generator: &dyn TextGenerator, mut remedy: Remedy) -> RemedyView {
    let name = remedy.display_name().to_string();
    let ingredients = remedy.ingredients_text();
    let prompt = build_remedy_detail_prompt(&RemedyFacts {
        name: &name,
        ailment: &remedy.ailment,
        ingredients: &ingredients,
        preparation: or_default(&remedy.preparation, NOT_SPECIFIED),
        dosage: or_default(&remedy.dosage, NOT_SPECIFIED),
        source: or_default(&remedy.source, TRADITIONAL_REMEDY),
    });

    let details = match generator.generate(&prompt).await {
        Ok(reply) => match serde_json::from_str::<RemedyDetails>(&trim_to_json_object(&reply)) {
            Ok(details) => details,
            Err(_) => {
                tracing::warn!(remedy = %name, "JSON parse failed for remedy, using fallback");
                RemedyDetails::unparseable_reply(&remedy)
            }
        },
        Err(e) => {
            tracing::error!(remedy = %name, error = %e, "AI processing failed for remedy");
            RemedyDetails::generation_failed(&remedy)
        }
    };

    let original = remedy.original_data();
    remedy.apply(details);
    RemedyView {
        original_data: Some(original),
        ..RemedyView::from(remedy)
    }
}

async fn summarize(generator: &dyn TextGenerator, conditions: &[String], names: &[&str]) -> String {
    let joined = conditions.join(", ");
    let top = &names[..names.len().min(SUMMARY_TOP_N)];
    match generator
        .generate(&build_remedy_summary_prompt(conditions, top))
        .await
    {
        Ok(reply) => reply.trim().to_string(),
        Err(e) => {
            tracing::error!(error = %e, "Error generating AI summary");
            format!(
                "Found {} traditional remedies for {joined}. Please consult with a healthcare provider before trying any new remedies.",
                names.len()
            )
        }
    }
}

/// Search, enrich each hit, and summarize the result set.
pub async fn search_and_summarize(
    store: &dyn RemedyStore,
    generator: Option<&dyn TextGenerator>,
    conditions: &[String],
) -> Result<SearchOutcome, RemedyError> {
    if conditions.is_empty() {
        return Err(RemedyError::NoConditions);
    }
    tracing::info!(conditions = ?conditions, "Searching remedies");
    let joined = conditions.join(", ");

    let found = find_remedies(store, conditions).await?;
    if found.is_empty() {
        return Ok(SearchOutcome {
            remedies: Vec::new(),
            summary: format!(
                "No natural remedies found for {joined}. Try using different or more general terms."
            ),
            search_info: None,
        });
    }

    let Some(generator) = generator else {
        tracing::info!("AI client not available, returning raw search results");
        let summary = format!("Found {} remedies for {joined}.", found.len());
        let remedies = found
            .into_iter()
            .map(|mut r| {
                let details = RemedyDetails::without_ai(&r);
                r.apply(details);
                RemedyView::from(r)
            })
            .collect();
        return Ok(SearchOutcome {
            remedies,
            summary,
            search_info: None,
        });
    };

    let remedies: Vec<RemedyView> = stream::iter(found)
        .map(|r| enrich(generator, r))
        .buffered(ENRICH_CONCURRENCY)
        .collect()
        .await;

    let names: Vec<&str> = remedies.iter().map(|r| r.remedy.display_name()).collect();
    let summary = summarize(generator, conditions, &names).await;

    let total_results = remedies.len();
    Ok(SearchOutcome {
        remedies,
        summary,
        search_info: Some(SearchInfo {
            search_terms: conditions.to_vec(),
            total_results,
            search_method: SEARCH_METHOD,
        }),
    })
}

/// The five remedies loaded by `seed`.
pub fn seed_remedies() -> Vec<Remedy> {
    vec![
        Remedy::new(
            "Eye Strain",
            "Warm Tea Bag Compress",
            &["Chamomile tea bags", "Warm water"],
            "Steep tea bags in hot water for 3-5 minutes, then cool slightly.",
            "Place over closed eyes for 10 minutes.",
            "American Academy of Ophthalmology",
        ),
        Remedy::new(
            "Headache",
            "Peppermint Oil Application",
            &["Peppermint essential oil", "Carrier oil (coconut or jojoba)"],
            "Dilute 2-3 drops of peppermint oil with 1 tablespoon of carrier oil.",
            "Apply small amount to temples and forehead. Avoid eye area.",
            "National Center for Complementary and Integrative Health",
        ),
        Remedy::new(
            "Insomnia",
            "Chamomile Tea",
            &["Chamomile tea bags or dried chamomile flowers", "Hot water"],
            "Steep chamomile in hot water for 5-10 minutes.",
            "Drink 1 cup 30-60 minutes before bedtime.",
            "Sleep Foundation",
        ),
        Remedy::new(
            "Sore Throat",
            "Warm Salt Water Gargle",
            &["Salt", "Warm water"],
            "Mix 1/2 teaspoon salt in 1 cup of warm water.",
            "Gargle for 30 seconds, then spit out. Repeat 2-3 times daily.",
            "Mayo Clinic",
        ),
        Remedy::new(
            "Nausea",
            "Ginger Tea",
            &["Fresh ginger root or ginger tea bags", "Hot water", "Honey (optional)"],
            "Steep fresh ginger slices or tea bag in hot water for 5-10 minutes.",
            "Drink 1-2 cups daily as needed.",
            "National Institutes of Health",
        ),
    ]
}

/// Insert the built-in remedies into an empty collection.
pub async fn seed(store: &dyn RemedyStore) -> Result<usize, RemedyError> {
    if store.count().await? > 0 {
        return Err(RemedyError::AlreadySeeded);
    }
    let inserted = store.insert_many(&seed_remedies()).await?;
    tracing::info!(inserted, "Seeded remedies collection");
    Ok(inserted)
}

/// Replace the collection contents. Returns `(deleted, inserted)`.
pub async fn replace_all(
    store: &dyn RemedyStore,
    remedies: &[Remedy],
) -> Result<(u64, usize), RemedyError> {
    let deleted = store.delete_all().await?;
    let inserted = if remedies.is_empty() {
        0
    } else {
        store.insert_many(remedies).await?
    };
    Ok((deleted, inserted))
}

/// Parse an ingest file: a JSON array of remedies.
pub fn parse_remedy_file(contents: &str) -> Result<Vec<Remedy>, serde_json::Error> {
    serde_json::from_str(contents)
}

pub const PROBE_TERM: &str = "tea";

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub connection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remedy_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_remedy: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atlas_search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atlas_search_result: Option<RemedyView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Collection health: count, a sample document, and a basic index probe.
/// Returns the partial diagnostics alongside the failure on error.
pub async fn diagnose(store: &dyn RemedyStore) -> Result<Diagnostics, Diagnostics> {
    let mut diag = Diagnostics {
        connection: "Attempting to connect...".into(),
        ..Default::default()
    };

    let fail = |mut diag: Diagnostics, e: DatabaseError| {
        tracing::error!(error = %e, "Remedy diagnostics failed");
        diag.error = Some(e.to_string());
        diag
    };

    let count = match store.count().await {
        Ok(n) => n,
        Err(e) => return Err(fail(diag, e)),
    };
    diag.connection = "Success".into();
    diag.remedy_count = Some(count);

    let sample = if count > 0 {
        match store.sample().await {
            Ok(sample) => sample
                .map(RemedyView::from)
                .and_then(|v| serde_json::to_value(v).ok()),
            Err(e) => return Err(fail(diag, e)),
        }
    } else {
        Some(Value::String(
            "Collection is empty, cannot fetch a sample.".into(),
        ))
    };
    diag.sample_remedy = sample;

    diag.atlas_search = Some("Attempting basic search...".into());
    match store.probe_search(PROBE_TERM).await {
        Ok(Some(hit)) => {
            diag.atlas_search = Some(format!(
                "Success: Found at least one result for the basic query '{PROBE_TERM}'."
            ));
            diag.atlas_search_result = Some(RemedyView::from(hit));
        }
        Ok(None) => {
            diag.atlas_search = Some(format!(
                "Failure: Basic search for '{PROBE_TERM}' returned 0 results. The search index is likely misconfigured or not built, or the data does not contain the term."
            ));
        }
        Err(e) => return Err(fail(diag, e)),
    }
    Ok(diag)
}
