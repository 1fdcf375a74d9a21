use crate::booking_flow::BookingFlow;
use crate::configuration::Configuration;
use crate::configuration_handler::ConfigurationHandler;
use crate::rest_backend::RestScheduling;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod backend;
mod booking_flow;
mod configuration;
mod configuration_handler;
mod countdown;
mod error;
mod reservation;
mod rest_backend;
mod slot_board;
#[cfg(test)]
mod testutils;
mod types;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("##################");
    println!("# Patient Portal #");
    println!("##################");

    let configuration = ConfigurationHandler::parse_arguments();
    info!(
        url = %configuration.scheduling_url(),
        workspace = %configuration.workspace_id(),
        "Booking against scheduling service"
    );

    let backend = match RestScheduling::new(
        &configuration.scheduling_url(),
        configuration.request_timeout(),
    ) {
        Ok(backend) => backend,
        Err(err) => {
            error!(?err, "Failed to set up the scheduling client");
            return;
        }
    };

    BookingFlow::new(backend, configuration).run().await;
}
