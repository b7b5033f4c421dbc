//! Paginated retrieval of branch comparison results.

use tracing::{debug, info, instrument};

use crate::api::BranchApi;
use crate::errors::DiffError;
use crate::models::{DiffItem, DiffModule};

/// Follows the comparison endpoint's pagination until it is exhausted.
pub struct DiffPager<'a, A: BranchApi + ?Sized> {
    api: &'a A,
    page_limit: u32,
}

impl<'a, A: BranchApi + ?Sized> DiffPager<'a, A> {
    pub fn new(api: &'a A, page_limit: u32) -> Self {
        Self {
            api,
            page_limit: page_limit.max(1),
        }
    }

    /// Fetch every difference for `module`, pages concatenated in arrival order.
    ///
    /// A failed page aborts the whole comparison; no partial result is
    /// returned.
    #[instrument(skip(self))]
    pub async fn fetch(
        &self,
        module: DiffModule,
        base_branch: &str,
        compare_branch: &str,
    ) -> Result<Vec<DiffItem>, DiffError> {
        let mut items = Vec::new();
        let mut skip = 0u32;
        let mut pages = 0u32;

        loop {
            let page = self
                .api
                .compare_branches(base_branch, compare_branch, module, skip, self.page_limit)
                .await?;
            pages += 1;
            debug!(skip, received = page.diff.len(), "received comparison page");
            items.extend(page.diff);

            if page.next_url.is_none() {
                break;
            }
            skip += self.page_limit;
        }

        info!(%module, pages, total = items.len(), "branch comparison fetched");
        Ok(items)
    }
}
