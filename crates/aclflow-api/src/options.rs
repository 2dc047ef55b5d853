// Option catalog and auto-populate endpoints.

use tracing::{debug, warn};

use crate::client::{AclClient, decode};
use crate::error::Error;
use crate::models::{AutoPopulateMatch, AutoPopulateQuery, OptionsResponse};

/// System type offered on top of whatever the backend knows about.
pub const OTHERS_SYSTEM_TYPE: &str = "Others";

impl AclClient {
    /// Fetch the option catalog.
    ///
    /// `GET /api/mysql-options[?sync=true]`. With `sync` the backend
    /// refreshes its cache from the rule database first. `"Others"` is
    /// always present in the returned system types.
    pub async fn fetch_options(&self, sync: bool) -> Result<OptionsResponse, Error> {
        debug!(sync, "fetching option catalog");
        let mut options: OptionsResponse = if sync {
            self.get_with_params("api/mysql-options", &[("sync", "true".into())])
                .await?
        } else {
            self.get("api/mysql-options").await?
        };

        if !options.system_types.iter().any(|s| s == OTHERS_SYSTEM_TYPE) {
            options.system_types.push(OTHERS_SYSTEM_TYPE.to_owned());
        }
        Ok(options)
    }

    /// Ask the backend for a best-effort match on a free-text IP.
    ///
    /// `POST /api/auto-populate`. Any non-2xx status, an `{"error": ...}`
    /// body, or a match with no usable fields yields `Ok(None)`; only
    /// transport failures surface as errors.
    pub async fn auto_populate(
        &self,
        query: &AutoPopulateQuery,
    ) -> Result<Option<AutoPopulateMatch>, Error> {
        let resp = self.send_post("api/auto-populate", query).await?;
        let status = resp.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "auto-populate found nothing");
            if status == reqwest::StatusCode::UNAUTHORIZED {
                self.session().clear();
                return Err(Error::SessionExpired);
            }
            return Ok(None);
        }

        let body = resp.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        match decode::<AutoPopulateMatch>(&body) {
            Ok(found) if !found.is_empty() => Ok(Some(found)),
            Ok(_) => Ok(None),
            Err(e) => {
                warn!(error = %e, "ignoring malformed auto-populate response");
                Ok(None)
            }
        }
    }
}
