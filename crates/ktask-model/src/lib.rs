mod error;
pub use error::ModelError;

mod kv;
pub use kv::KeyValue;

mod constants;
pub use constants::*;

mod task_id;
pub use task_id::TaskId;

mod job_kind;
pub use job_kind::JobKind;

mod labels;
pub use labels::{LabelScheme, Labels, is_cancelled};

mod selector;
pub use selector::{Clause, LabelSelector};

mod page;
pub use page::{ListQuery, Page, PageToken};

mod list_response;
pub use list_response::ListTasksResponse;
