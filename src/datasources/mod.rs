//! Read-only lookups against the remote platform. Data sources share the
//! resource schema machinery but have a single callback: resolve the
//! configured query into attributes, or fail.

pub mod user;

use async_trait::async_trait;

use crate::data::ResourceData;
use crate::diag::Diagnostics;
use crate::engine::ProviderMeta;
use crate::schema::ResourceSchema;

#[async_trait]
pub trait DataSourceAdapter: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn schema(&self) -> &ResourceSchema;

    /// Resolve the configured query. Unlike resource `read`, an empty result
    /// is an error: a lookup that matches nothing cannot be planned around.
    async fn read(&self, data: &mut ResourceData, meta: &ProviderMeta) -> Diagnostics;
}
