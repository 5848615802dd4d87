//! Storage backends: Supabase (journal) and MongoDB (remedies).

pub mod mongo;
pub mod supabase;

pub use mongo::MongoRemedyStore;
pub use supabase::SupabaseJournalStore;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Document decode error: {0}")]
    Decode(#[from] mongodb::bson::de::Error),

    /// PostgREST error; `message` is the server's own description.
    #[error("{message}")]
    Supabase { status: u16, message: String },

    #[error("Database is not reachable at {0}")]
    Connection(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Insert returned no row")]
    NoRowReturned,
}
