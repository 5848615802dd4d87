//! Remedy storage in MongoDB, searched through an Atlas Search index.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::{Client, Collection, Database};

use super::DatabaseError;
use crate::remedies::{Remedy, RemedyStore};

pub const REMEDY_COLLECTION: &str = "remedies";
pub const SEARCH_INDEX: &str = "default";

/// Fields covered by both the ranked search and the regex fallback.
pub const SEARCH_FIELDS: [&str; 4] = ["ailment", "remedy", "ingredients", "preparation"];

const SEARCH_LIMIT: i64 = 15;
const FALLBACK_LIMIT: i64 = 10;

const TEXT_BOOST: f64 = 3.0;
const WILDCARD_BOOST: f64 = 1.5;
const PHRASE_BOOST: f64 = 5.0;

pub struct MongoRemedyStore {
    db: Database,
    remedies: Collection<Remedy>,
}

impl MongoRemedyStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, DatabaseError> {
        let client = Client::with_uri_str(uri).await?;
        Ok(Self::from_database(client.database(database)))
    }

    pub fn from_database(db: Database) -> Self {
        let remedies = db.collection::<Remedy>(REMEDY_COLLECTION);
        Self { db, remedies }
    }

    /// Round-trip to the server; the driver connects lazily.
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn aggregate_remedies(&self, pipeline: Vec<Document>) -> Result<Vec<Remedy>, DatabaseError> {
        let docs: Vec<Document> = self.remedies.aggregate(pipeline).await?.try_collect().await?;
        docs.into_iter()
            .map(|d| mongodb::bson::from_document(d).map_err(DatabaseError::from))
            .collect()
    }
}

fn boost(value: f64) -> Document {
    doc! { "boost": { "value": value } }
}

/// Compound Atlas Search over every condition: fuzzy text and wildcard
/// clauses per condition plus a phrase match of all conditions on
/// `ailment`, ranked by score.
pub fn atlas_search_pipeline(conditions: &[String]) -> Vec<Document> {
    let paths = SEARCH_FIELDS.to_vec();
    let mut should: Vec<Document> = Vec::with_capacity(conditions.len() * 2 + 1);

    for condition in conditions {
        should.push(doc! {
            "text": {
                "query": condition.as_str(),
                "path": paths.clone(),
                "fuzzy": { "maxEdits": 1, "prefixLength": 2 },
                "score": boost(TEXT_BOOST),
            }
        });
    }
    for condition in conditions {
        should.push(doc! {
            "wildcard": {
                "query": format!("*{condition}*"),
                "path": paths.clone(),
                "allowAnalyzedField": true,
                "score": boost(WILDCARD_BOOST),
            }
        });
    }
    should.push(doc! {
        "phrase": {
            "query": conditions.join(" "),
            "path": "ailment",
            "score": boost(PHRASE_BOOST),
        }
    });

    vec![
        doc! {
            "$search": {
                "index": SEARCH_INDEX,
                "compound": { "should": should, "minimumShouldMatch": 1 },
            }
        },
        doc! { "$addFields": { "searchScore": { "$meta": "searchScore" } } },
        doc! { "$sort": { "searchScore": -1 } },
        doc! { "$limit": SEARCH_LIMIT },
        doc! {
            "$project": {
                "_id": 1,
                "ailment": 1,
                "name": "$remedy",
                "remedy": 1,
                "ingredients": 1,
                "preparation": 1,
                "dosage": 1,
                "source": 1,
                "category": 1,
                "description": 1,
                "benefits": 1,
                "usageInstructions": 1,
                "potentialRisks": 1,
                "scientificEvidence": 1,
                "effectivenessScore": 1,
                "userRating": 1,
                "imageUrl": 1,
                "relatedConditions": 1,
                "sources": 1,
                "searchScore": 1,
            }
        },
    ]
}

/// Case-insensitive alternation of the escaped conditions over the search
/// fields. A regex on an array field matches any element.
pub fn regex_filter(conditions: &[String]) -> Document {
    let pattern = conditions
        .iter()
        .map(|c| regex::escape(c))
        .collect::<Vec<_>>()
        .join("|");
    let clauses: Vec<Document> = SEARCH_FIELDS
        .iter()
        .map(|field| doc! { *field: { "$regex": pattern.as_str(), "$options": "i" } })
        .collect();
    doc! { "$or": clauses }
}

pub fn probe_pipeline(term: &str) -> Vec<Document> {
    vec![
        doc! {
            "$search": {
                "index": SEARCH_INDEX,
                "text": { "query": term, "path": { "wildcard": "*" } },
            }
        },
        doc! { "$limit": 1 },
    ]
}

#[async_trait]
impl RemedyStore for MongoRemedyStore {
    async fn atlas_search(&self, conditions: &[String]) -> Result<Vec<Remedy>, DatabaseError> {
        self.aggregate_remedies(atlas_search_pipeline(conditions)).await
    }

    async fn regex_search(&self, conditions: &[String]) -> Result<Vec<Remedy>, DatabaseError> {
        let cursor = self
            .remedies
            .find(regex_filter(conditions))
            .limit(FALLBACK_LIMIT)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count(&self) -> Result<u64, DatabaseError> {
        Ok(self.remedies.count_documents(doc! {}).await?)
    }

    async fn insert_many(&self, remedies: &[Remedy]) -> Result<usize, DatabaseError> {
        let result = self.remedies.insert_many(remedies).await?;
        Ok(result.inserted_ids.len())
    }

    async fn delete_all(&self) -> Result<u64, DatabaseError> {
        Ok(self.remedies.delete_many(doc! {}).await?.deleted_count)
    }

    async fn sample(&self) -> Result<Option<Remedy>, DatabaseError> {
        Ok(self.remedies.find_one(doc! {}).await?)
    }

    async fn probe_search(&self, term: &str) -> Result<Option<Remedy>, DatabaseError> {
        Ok(self
            .aggregate_remedies(probe_pipeline(term))
            .await?
            .into_iter()
            .next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(t: &[&str]) -> Vec<String> {
        t.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn pipeline_has_clauses_per_condition_plus_phrase() {
        let pipeline = atlas_search_pipeline(&terms(&["headache", "nausea"]));
        assert_eq!(pipeline.len(), 5);

        let search = pipeline[0].get_document("$search").unwrap();
        assert_eq!(search.get_str("index").unwrap(), "default");
        let compound = search.get_document("compound").unwrap();
        assert_eq!(compound.get_i32("minimumShouldMatch").unwrap(), 1);
        let should = compound.get_array("should").unwrap();
        assert_eq!(should.len(), 5);

        let first = should[0].as_document().unwrap().get_document("text").unwrap();
        assert_eq!(first.get_str("query").unwrap(), "headache");
        let boost = first.get_document("score").unwrap().get_document("boost").unwrap();
        assert_eq!(boost.get_f64("value").unwrap(), 3.0);

        let wildcard = should[2].as_document().unwrap().get_document("wildcard").unwrap();
        assert_eq!(wildcard.get_str("query").unwrap(), "*headache*");

        let phrase = should[4].as_document().unwrap().get_document("phrase").unwrap();
        assert_eq!(phrase.get_str("query").unwrap(), "headache nausea");
        assert_eq!(phrase.get_str("path").unwrap(), "ailment");
    }

    #[test]
    fn pipeline_ranks_limits_and_maps_name() {
        let pipeline = atlas_search_pipeline(&terms(&["cough"]));
        assert_eq!(pipeline[2].get_document("$sort").unwrap().get_i32("searchScore").unwrap(), -1);
        assert_eq!(pipeline[3].get_i64("$limit").unwrap(), 15);
        let project = pipeline[4].get_document("$project").unwrap();
        assert_eq!(project.get_str("name").unwrap(), "$remedy");
    }

    #[test]
    fn regex_filter_escapes_and_joins() {
        let filter = regex_filter(&terms(&["cold (common)", "flu"]));
        let clauses = filter.get_array("$or").unwrap();
        assert_eq!(clauses.len(), 4);
        let ailment = clauses[0].as_document().unwrap().get_document("ailment").unwrap();
        assert_eq!(ailment.get_str("$regex").unwrap(), r"cold \(common\)|flu");
        assert_eq!(ailment.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn probe_searches_every_field() {
        let pipeline = probe_pipeline("tea");
        let text = pipeline[0]
            .get_document("$search")
            .unwrap()
            .get_document("text")
            .unwrap();
        assert_eq!(text.get_str("query").unwrap(), "tea");
        assert_eq!(text.get_document("path").unwrap().get_str("wildcard").unwrap(), "*");
    }
}
