//! apichain-core: dependency-aware sequential API test execution
//!
//! Orders a batch of endpoints so producers run before consumers, fills
//! path placeholders from identifiers learned along the way, and sorts
//! outcomes into pass, benign warning, or real failure. No network or
//! display code lives here; requests go through an [`Executor`].

pub mod alias;
pub mod classify;
pub mod config;
pub mod context;
pub mod endpoint;
pub mod extract;
pub mod order;
pub mod orchestrator;
pub mod report;
pub mod resolve;
pub mod result;
pub mod schema;
pub mod testdata;

pub use alias::{Aliaser, PluralStripAliaser, alias};
pub use classify::{Classification, Partition, Summary, classify, is_real_failure, partition};
pub use config::{Config, ConfigError};
pub use context::{Identifiers, RunContext, SharedContext};
pub use endpoint::{DEFAULT_SUITE, Endpoint, select_suites, suite_names};
pub use extract::extract;
pub use orchestrator::{
    BatchOutcome, BatchRunner, ExecuteError, Executor, ResolvedEndpoint, RunObserver, run_batch,
};
pub use order::order;
pub use report::BatchReport;
pub use resolve::resolve;
pub use result::{EndpointOutcome, ExecutionResult, RawResult, ResultLog};
pub use testdata::{TestData, TestDataError};
