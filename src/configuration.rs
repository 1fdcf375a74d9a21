use std::time::Duration;
use uuid::Uuid;

pub trait Configuration: Clone + Send + Sync + 'static {
    fn scheduling_url(&self) -> String;
    fn workspace_id(&self) -> Uuid;
    fn patient_name(&self) -> String;
    fn request_timeout(&self) -> Duration;
}
