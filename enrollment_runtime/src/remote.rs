//! Optional remote submission of single records.
//!
//! Best effort. The session logs and drops any error returned here.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use enrollment_core::RegistrationRecord;

use crate::error::Result;

pub trait RemoteSubmitter {
    fn submit(&self, record: &RegistrationRecord) -> Result<()>;
}

/// POSTs a record as JSON to a fixed endpoint.
pub struct HttpSubmitter {
    client: Client,
    endpoint: String,
}

impl HttpSubmitter {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl RemoteSubmitter for HttpSubmitter {
    fn submit(&self, record: &RegistrationRecord) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(record)
            .send()?
            .error_for_status()?;
        debug!(
            status = %response.status(),
            serial = %record.serial_no,
            "record submitted"
        );
        Ok(())
    }
}
