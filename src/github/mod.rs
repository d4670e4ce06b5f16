//! GitHub Data Access
//!
//! Record types, the data-source trait, the shared query cache, credential
//! handling and the offline fixture backend.

pub mod auth;
pub mod cache;
pub mod fixture;
pub mod source;
pub mod types;

pub use auth::{AuthManager, CredentialStore, FileTokenStore, InMemoryTokenStore};
pub use cache::{QueryCache, QueryKey, QueryKind};
pub use fixture::{FixtureData, FixtureSource, DEFAULT_PAGE_SIZE};
pub use source::{DataSource, FetchPolicy, SourceError, SourceResult};
pub use types::{
    CommitRecord, ForkRecord, IssueRecord, LabelRecord, Page, PageInfo, ReleaseAsset,
    ReleaseRecord, RepoId, RepoIdError, RepoOverview, StargazerRecord,
};
