//! Lazy pagination over the application listing.

use busync_client::{ApiError, PAGE_SIZE, TenantApi};
use busync_types::Application;

/// Restartable, finite producer of application pages.
///
/// Yields pages in tenant order until the tenant returns an empty page, then
/// `None` forever. Retry lives in the client; this type only tracks
/// position, so pagination and retry are testable independently.
#[derive(Debug)]
pub struct ApplicationPager {
    page: u32,
    page_size: u32,
    done: bool,
}

impl Default for ApplicationPager {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationPager {
    #[must_use]
    pub fn new() -> Self {
        Self::with_page_size(PAGE_SIZE)
    }

    #[must_use]
    pub fn with_page_size(page_size: u32) -> Self {
        Self {
            page: 0,
            page_size,
            done: false,
        }
    }

    /// Fetch the next page, or `None` once the listing is exhausted.
    pub async fn next_page<C: TenantApi>(
        &mut self,
        client: &C,
    ) -> Result<Option<Vec<Application>>, ApiError> {
        if self.done {
            return Ok(None);
        }

        let apps = client
            .list_applications_page(self.page, self.page_size)
            .await?;
        if apps.is_empty() {
            self.done = true;
            return Ok(None);
        }
        self.page += 1;
        Ok(Some(apps))
    }
}
