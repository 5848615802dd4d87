//! In-memory mocks behind the vendor traits, shared by unit and router tests.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::db::DatabaseError;
use crate::journal::{EntryId, JournalEntry, JournalStore, NewJournalEntry};
use crate::pipeline::extraction::{OcrError, TextDetector};
use crate::pipeline::structuring::{GenerationError, TextGenerator};
use crate::remedies::{Remedy, RemedyStore};

pub const SAMPLE_ANALYSIS_REPLY: &str = r#"```json
{
  "summary": "This prescription is for managing hypertension.",
  "medicines": [{
    "name": "Amlodipine",
    "type": "Calcium channel blocker",
    "description": "Relaxes blood vessels so the heart pumps more easily.",
    "dosage": "5mg",
    "frequency": "Once daily",
    "sideEffects": ["Swelling of ankles", "Flushing", "Headache"],
    "warnings": ["Avoid in severe hypotension"],
    "interactions": ["Simvastatin", "Grapefruit juice"]
  }],
  "overallRiskLevel": "Low",
  "recommendations": ["Take at the same time each day."]
}
```"#;

// ──────────────────────────────────────────────
// MockGenerator
// ──────────────────────────────────────────────

enum Behaviour {
    Reply(String),
    Blocked(String),
    Fail,
}

/// Generator returning a canned reply and recording every prompt.
pub struct MockGenerator {
    behaviour: Behaviour,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    fn with(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(reply: &str) -> Self {
        Self::with(Behaviour::Reply(reply.to_string()))
    }

    pub fn blocked(reason: &str) -> Self {
        Self::with(Behaviour::Blocked(reason.to_string()))
    }

    pub fn failing() -> Self {
        Self::with(Behaviour::Fail)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.behaviour {
            Behaviour::Reply(r) => Ok(r.clone()),
            Behaviour::Blocked(reason) => Err(GenerationError::Blocked(reason.clone())),
            Behaviour::Fail => Err(GenerationError::Api {
                status: 503,
                body: "model overloaded".into(),
            }),
        }
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

// ──────────────────────────────────────────────
// MockOcr
// ──────────────────────────────────────────────

pub struct MockOcr {
    text: Option<String>,
}

impl MockOcr {
    pub fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self { text: None }
    }
}

#[async_trait]
impl TextDetector for MockOcr {
    async fn detect_text(&self, _image_bytes: &[u8]) -> Result<String, OcrError> {
        self.text.clone().ok_or(OcrError::Api {
            status: 403,
            body: "Cloud Vision API has not been used in this project".into(),
        })
    }
}

// ──────────────────────────────────────────────
// MockJournalStore
// ──────────────────────────────────────────────

#[derive(Default)]
pub struct MockJournalStore {
    rows: Mutex<Vec<JournalEntry>>,
    next_id: AtomicI64,
    fail: bool,
}

impl MockJournalStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    fn check(&self) -> Result<(), DatabaseError> {
        if self.fail {
            return Err(DatabaseError::Supabase {
                status: 500,
                message: "relation \"journal_entries\" does not exist".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl JournalStore for MockJournalStore {
    async fn insert(&self, entry: &NewJournalEntry) -> Result<JournalEntry, DatabaseError> {
        self.check()?;
        let row = JournalEntry {
            id: EntryId::Int(self.next_id.fetch_add(1, Ordering::SeqCst)),
            user_id: entry.user_id.clone(),
            date: entry.date.clone(),
            mood: entry.mood.clone(),
            symptoms: entry.symptoms.clone(),
            medications: entry.medications.clone(),
            notes: entry.notes.clone(),
            created_at: None,
            extra: Default::default(),
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<JournalEntry>, DatabaseError> {
        self.check()?;
        let mut rows: Vec<JournalEntry> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(rows)
    }

    async fn delete(&self, id: &str) -> Result<(), DatabaseError> {
        self.check()?;
        self.rows.lock().unwrap().retain(|r| r.id.to_string() != id);
        Ok(())
    }
}

// ──────────────────────────────────────────────
// MockRemedyStore
// ──────────────────────────────────────────────

/// Substring matching stands in for both search paths.
#[derive(Default)]
pub struct MockRemedyStore {
    remedies: Mutex<Vec<Remedy>>,
    atlas_fails: bool,
    regex_fails: bool,
}

impl MockRemedyStore {
    pub fn new(remedies: Vec<Remedy>) -> Self {
        Self {
            remedies: Mutex::new(remedies),
            ..Default::default()
        }
    }

    pub fn with_atlas_failure(mut self) -> Self {
        self.atlas_fails = true;
        self
    }

    pub fn with_regex_failure(mut self) -> Self {
        self.regex_fails = true;
        self
    }

    fn matching(&self, conditions: &[String], limit: usize) -> Vec<Remedy> {
        let needles: Vec<String> = conditions.iter().map(|c| c.to_lowercase()).collect();
        self.remedies
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                let haystack = format!(
                    "{} {} {} {}",
                    r.ailment,
                    r.remedy,
                    r.ingredients.join(" "),
                    r.preparation
                )
                .to_lowercase();
                needles.iter().any(|n| haystack.contains(n.as_str()))
            })
            .take(limit)
            .cloned()
            .collect()
    }
}

fn unavailable(what: &str) -> DatabaseError {
    DatabaseError::Connection(format!("mock {what}"))
}

#[async_trait]
impl RemedyStore for MockRemedyStore {
    async fn atlas_search(&self, conditions: &[String]) -> Result<Vec<Remedy>, DatabaseError> {
        if self.atlas_fails {
            return Err(unavailable("search index"));
        }
        Ok(self.matching(conditions, 15))
    }

    async fn regex_search(&self, conditions: &[String]) -> Result<Vec<Remedy>, DatabaseError> {
        if self.regex_fails {
            return Err(unavailable("collection"));
        }
        Ok(self.matching(conditions, 10))
    }

    async fn count(&self) -> Result<u64, DatabaseError> {
        Ok(self.remedies.lock().unwrap().len() as u64)
    }

    async fn insert_many(&self, remedies: &[Remedy]) -> Result<usize, DatabaseError> {
        self.remedies.lock().unwrap().extend_from_slice(remedies);
        Ok(remedies.len())
    }

    async fn delete_all(&self) -> Result<u64, DatabaseError> {
        let mut all = self.remedies.lock().unwrap();
        let n = all.len() as u64;
        all.clear();
        Ok(n)
    }

    async fn sample(&self) -> Result<Option<Remedy>, DatabaseError> {
        Ok(self.remedies.lock().unwrap().first().cloned())
    }

    async fn probe_search(&self, term: &str) -> Result<Option<Remedy>, DatabaseError> {
        if self.atlas_fails {
            return Err(unavailable("search index"));
        }
        Ok(self.matching(&[term.to_string()], 1).into_iter().next())
    }
}
