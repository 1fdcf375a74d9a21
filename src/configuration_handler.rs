use crate::configuration::Configuration;
use clap::Parser;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, Parser)]
#[command(about = "Patient portal appointment booking")]
pub struct ConfigurationHandler {
    /// Base URL of the scheduling service
    #[arg(long, env = "SCHEDULING_URL", default_value = "http://127.0.0.1:3000")]
    scheduling_url: String,

    /// Workspace (pharmacy) the patient books under
    #[arg(
        long,
        env = "WORKSPACE_ID",
        default_value = "00000000-0000-0000-0000-000000000000"
    )]
    workspace_id: Uuid,

    /// Name shown on the booking
    #[arg(long, env = "PATIENT_NAME", default_value = "Patient")]
    patient_name: String,

    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    request_timeout_secs: u64,
}

impl ConfigurationHandler {
    pub fn parse_arguments() -> Self {
        Self::parse()
    }
}

impl Configuration for ConfigurationHandler {
    fn scheduling_url(&self) -> String {
        self.scheduling_url.clone()
    }

    fn workspace_id(&self) -> Uuid {
        self.workspace_id
    }

    fn patient_name(&self) -> String {
        self.patient_name.clone()
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
